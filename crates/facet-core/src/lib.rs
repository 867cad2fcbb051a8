//! # Facet Core - Foundation Layer
//!
//! Core types shared by every facet protocol crate:
//!
//! - Identifier newtypes (`HandshakeId`, `ParticipantId`, `TokenId`)
//! - Commitment and entropy digests (`Digest32`, `Secret`)
//! - The centralized hash module (domain-separated SHA-256)
//! - Effect traits for the external collaborators: token ledger, renderer,
//!   access control, payment execution, and the chain environment
//! - Collection configuration
//!
//! ## What Does NOT Belong Here
//!
//! - Protocol state machines (facet-handshake, facet-collection)
//! - Fund distribution logic (facet-distributor)
//! - Effect handler implementations (hosts and facet-testkit provide those)
//!
//! The protocol crates keep their state machines pure and synchronous; all
//! interaction with the outside world goes through the effect traits defined
//! here, injected at the orchestration layer.

#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod hash;
pub mod identifiers;

pub use config::{CollectionConfig, ConfigError};
pub use effects::{
    AccessControlEffects, EffectError, EnvironmentEffects, LedgerEffects, PaymentEffects,
    RendererEffects, TokenArt,
};
pub use hash::{commitment_digest, xor_fold, Digest32, Secret};
pub use identifiers::{HandshakeId, ParticipantId, TokenId};
