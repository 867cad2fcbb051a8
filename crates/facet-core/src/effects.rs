//! Effect trait definitions for the external collaborators.
//!
//! The protocol crates never talk to a ledger, renderer, access controller,
//! payment rail, or clock directly. Hosts implement these traits and inject
//! them into the orchestration layer; facet-testkit provides in-memory
//! handlers for tests.
//!
//! Every call here is treated as a fallible external operation. Payment
//! execution in particular is best-effort-irreversible: a completed `pay`
//! is never rolled back by the protocol (see the distributor crate).

use crate::identifiers::{ParticipantId, TokenId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error surfaced by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EffectError {
    /// Token ledger operation failed.
    #[error("ledger error: {message}")]
    Ledger {
        /// What the ledger reported.
        message: String,
    },

    /// Payment execution refused or failed.
    #[error("payment failed: {message}")]
    Payment {
        /// What the payment rail reported.
        message: String,
    },

    /// Metadata rendering failed.
    #[error("renderer error: {message}")]
    Renderer {
        /// What the renderer reported.
        message: String,
    },

    /// Environment (clock / chain salt) unavailable.
    #[error("environment error: {message}")]
    Environment {
        /// What the environment source reported.
        message: String,
    },
}

impl EffectError {
    /// Create a ledger error.
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }

    /// Create a payment error.
    pub fn payment(message: impl Into<String>) -> Self {
        Self::Payment {
            message: message.into(),
        }
    }

    /// Create a renderer error.
    pub fn renderer(message: impl Into<String>) -> Self {
        Self::Renderer {
            message: message.into(),
        }
    }

    /// Create an environment error.
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }
}

/// Token ownership ledger: standard mint / transfer / owner-of semantics.
#[async_trait]
pub trait LedgerEffects: Send + Sync {
    /// Mint a new token to `owner` and return its id.
    async fn mint(&self, owner: ParticipantId) -> Result<TokenId, EffectError>;

    /// Whether `id` has been minted.
    async fn exists(&self, id: TokenId) -> Result<bool, EffectError>;

    /// Current owner of `id`.
    async fn owner_of(&self, id: TokenId) -> Result<ParticipantId, EffectError>;

    /// Transfer `id` from `from` to `to`.
    async fn transfer(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        id: TokenId,
    ) -> Result<(), EffectError>;
}

/// Rendered artwork and attributes for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenArt {
    /// Image bytes (SVG or raster, host's choice).
    pub image: Vec<u8>,
    /// Attribute metadata as a JSON document.
    pub attributes_json: String,
}

/// Visual and metadata rendering.
#[async_trait]
pub trait RendererEffects: Send + Sync {
    /// Render image and attributes for `id`.
    async fn render(&self, id: TokenId) -> Result<TokenArt, EffectError>;
}

/// Administrative capability checks.
#[async_trait]
pub trait AccessControlEffects: Send + Sync {
    /// Whether `caller` may perform administrative operations.
    async fn is_admin(&self, caller: ParticipantId) -> Result<bool, EffectError>;
}

/// Value transfer execution.
#[async_trait]
pub trait PaymentEffects: Send + Sync {
    /// Pay `amount` to `recipient`. A returned error means no value moved
    /// for this leg; an `Ok` leg is irreversible.
    async fn pay(&self, recipient: ParticipantId, amount: u128) -> Result<(), EffectError>;
}

/// Host environment: wall-clock time and chain-state salt material.
#[async_trait]
pub trait EnvironmentEffects: Send + Sync {
    /// Current time in epoch milliseconds.
    async fn now_ms(&self) -> Result<u64, EffectError>;

    /// Unpredictable chain-state salt (latest block hash or equivalent).
    ///
    /// Only partially unpredictable to participants; protocol code must
    /// never rely on it as the sole randomness source.
    async fn chain_salt(&self) -> Result<[u8; 32], EffectError>;
}
