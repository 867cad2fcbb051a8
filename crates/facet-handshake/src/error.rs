//! Handshake domain errors.

use facet_core::{HandshakeId, ParticipantId};

/// Domain conditions surfaced by the handshake registry.
///
/// Every failing operation leaves the registry exactly as it was before
/// the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// A handshake with this id was already created.
    #[error("handshake {id} already exists")]
    AlreadyExists {
        /// Offending handshake id.
        id: HandshakeId,
    },

    /// Quorum of zero can never complete.
    #[error("handshake quorum must be greater than zero")]
    InvalidQuorum,

    /// No handshake with this id was created.
    #[error("unknown handshake {id}")]
    UnknownHandshake {
        /// Offending handshake id.
        id: HandshakeId,
    },

    /// Participant already committed to this handshake.
    #[error("participant {participant} already committed to {id}")]
    DuplicateCommitment {
        /// Offending handshake id.
        id: HandshakeId,
        /// Participant that committed twice.
        participant: ParticipantId,
    },

    /// Participant already revealed for this handshake.
    #[error("participant {participant} already revealed for {id}")]
    DuplicateReveal {
        /// Offending handshake id.
        id: HandshakeId,
        /// Participant that revealed twice.
        participant: ParticipantId,
    },

    /// The handshake completed; no further commits or reveals are accepted.
    #[error("handshake {id} is closed")]
    HandshakeClosed {
        /// Offending handshake id.
        id: HandshakeId,
    },

    /// Reveal without a prior commitment.
    #[error("participant {participant} has no commitment in {id}")]
    NoCommitment {
        /// Offending handshake id.
        id: HandshakeId,
        /// Participant without a commitment.
        participant: ParticipantId,
    },

    /// Revealed secret does not hash to the stored commitment.
    #[error("secret from {participant} does not match commitment in {id}")]
    SecretMismatch {
        /// Offending handshake id.
        id: HandshakeId,
        /// Participant whose reveal failed verification.
        participant: ParticipantId,
    },

    /// Entropy requested before the round completed.
    #[error("handshake {id} is not complete")]
    NotComplete {
        /// Offending handshake id.
        id: HandshakeId,
    },
}
