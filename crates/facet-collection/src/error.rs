//! Collection domain errors.

use crate::phase::Phase;
use facet_core::{ConfigError, EffectError, ParticipantId, TokenId};
use facet_distributor::DistributorError;
use facet_handshake::HandshakeError;

/// Domain conditions surfaced by the collection service and its state
/// machines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// Operation not legal in the current phase.
    #[error("operation not permitted in phase {phase}")]
    WrongPhase {
        /// Phase the collection was in.
        phase: Phase,
    },

    /// Advancing past Public requires the entropy round to be complete.
    #[error("collection entropy handshake is incomplete")]
    HandshakeIncomplete,

    /// The mint ceiling was reached.
    #[error("supply ceiling of {cap} reached")]
    SupplyExhausted {
        /// Configured ceiling.
        cap: u64,
    },

    /// Caller lacks the administrative capability.
    #[error("caller {caller} is not an admin")]
    Unauthorized {
        /// Rejected caller.
        caller: ParticipantId,
    },

    /// The token already has a seed.
    #[error("seed already generated for {token}")]
    AlreadyGenerated {
        /// Offending token.
        token: TokenId,
    },

    /// `min > max`.
    #[error("invalid sample range: {min} > {max}")]
    InvalidRange {
        /// Lower bound.
        min: u64,
        /// Upper bound.
        max: u64,
    },

    /// No seed derived for the token yet.
    #[error("no seed derived for {token}")]
    SeedNotReady {
        /// Offending token.
        token: TokenId,
    },

    /// The ledger does not know this token.
    #[error("{token} does not exist")]
    UnknownToken {
        /// Offending token.
        token: TokenId,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Handshake registry condition.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Fund distributor condition.
    #[error(transparent)]
    Distributor(#[from] DistributorError),

    /// External collaborator failure.
    #[error(transparent)]
    Effect(#[from] EffectError),
}
