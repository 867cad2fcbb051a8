//! The handshake registry state machine.

use crate::error::HandshakeError;
use facet_core::hash::{self, Hasher, DOMAIN_ENTROPY};
use facet_core::{Digest32, HandshakeId, ParticipantId, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// External salt material mixed into the combined entropy at completion.
///
/// Supplied by the caller of `reveal` from the host environment (latest
/// block hash analog, wall-clock time, per-round nonce). The value used by
/// the completing reveal is the one baked into the cached entropy; later
/// queries never resample it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropySalt {
    /// Chain-state anchor, e.g. a recent block hash.
    pub anchor: [u8; 32],
    /// Epoch-millisecond timestamp at the completing reveal.
    pub timestamp_ms: u64,
    /// Per-round nonce chosen by the orchestrator.
    pub nonce: u64,
}

impl EntropySalt {
    fn absorb(&self, hasher: &mut Hasher) {
        hasher.update(&self.anchor);
        hasher.update(&self.timestamp_ms.to_le_bytes());
        hasher.update(&self.nonce.to_le_bytes());
    }
}

/// One commit-reveal round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handshake {
    required: u32,
    // Insertion order = commitment order. Stays duplicate-free because
    // `commit` rejects a second commitment from the same participant.
    participants: Vec<ParticipantId>,
    commitments: HashMap<ParticipantId, Digest32>,
    reveals: HashMap<ParticipantId, Secret>,
    complete: bool,
    // Cached at completion; never recomputed against a live salt.
    entropy: Option<Digest32>,
}

impl Handshake {
    fn new(required: u32) -> Self {
        Self {
            required,
            participants: Vec::new(),
            commitments: HashMap::new(),
            reveals: HashMap::new(),
            complete: false,
            entropy: None,
        }
    }

    /// Reveals required to finalize the round.
    pub fn required(&self) -> u32 {
        self.required
    }

    /// Participants in commitment order.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// Number of verified reveals among current participants.
    pub fn reveal_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|participant| self.reveals.contains_key(participant))
            .count()
    }

    /// Whether the round finalized. Monotonic: never un-sets.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Entropy cached at completion, if complete.
    pub fn entropy(&self) -> Option<Digest32> {
        self.entropy
    }

    fn derive_entropy(&self, salt: &EntropySalt) -> Digest32 {
        let fold = hash::xor_fold(self.reveals.values());
        let mut hasher = Hasher::with_domain(DOMAIN_ENTROPY);
        hasher.update(&fold);
        salt.absorb(&mut hasher);
        hasher.finalize()
    }
}

/// Key-indexed table of commit-reveal rounds, owned exclusively by its host.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HandshakeRegistry {
    handshakes: HashMap<HandshakeId, Handshake>,
}

impl HandshakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new round requiring `required` reveals to finalize.
    pub fn create(&mut self, id: HandshakeId, required: u32) -> Result<(), HandshakeError> {
        if self.handshakes.contains_key(&id) {
            return Err(HandshakeError::AlreadyExists { id });
        }
        if required == 0 {
            return Err(HandshakeError::InvalidQuorum);
        }
        self.handshakes.insert(id, Handshake::new(required));
        info!(%id, required, "handshake created");
        Ok(())
    }

    /// Record a commitment digest for `participant`.
    pub fn commit(
        &mut self,
        id: HandshakeId,
        participant: ParticipantId,
        commitment: Digest32,
    ) -> Result<(), HandshakeError> {
        let handshake = self
            .handshakes
            .get_mut(&id)
            .ok_or(HandshakeError::UnknownHandshake { id })?;
        if handshake.complete {
            return Err(HandshakeError::HandshakeClosed { id });
        }
        if handshake.commitments.contains_key(&participant) {
            return Err(HandshakeError::DuplicateCommitment { id, participant });
        }
        handshake.participants.push(participant);
        handshake.commitments.insert(participant, commitment);
        debug!(%id, %participant, "commitment recorded");
        Ok(())
    }

    /// Record a verified reveal for `participant`.
    ///
    /// When this reveal reaches the quorum the round completes: the combined
    /// entropy is derived from the XOR-fold of all reveals mixed with `salt`,
    /// cached on the handshake, and returned. Reveals that do not complete
    /// the round return `Ok(None)`; their `salt` is discarded.
    pub fn reveal(
        &mut self,
        id: HandshakeId,
        participant: ParticipantId,
        secret: Secret,
        salt: &EntropySalt,
    ) -> Result<Option<Digest32>, HandshakeError> {
        let handshake = self
            .handshakes
            .get_mut(&id)
            .ok_or(HandshakeError::UnknownHandshake { id })?;
        if handshake.complete {
            return Err(HandshakeError::HandshakeClosed { id });
        }
        let commitment = handshake
            .commitments
            .get(&participant)
            .copied()
            .ok_or(HandshakeError::NoCommitment { id, participant })?;
        if handshake.reveals.contains_key(&participant) {
            return Err(HandshakeError::DuplicateReveal { id, participant });
        }
        if hash::commitment_digest(&secret, &participant) != commitment {
            return Err(HandshakeError::SecretMismatch { id, participant });
        }

        handshake.reveals.insert(participant, secret);
        let revealed = handshake.reveal_count();
        debug!(%id, %participant, revealed, "reveal recorded");

        if revealed >= handshake.required as usize {
            let entropy = handshake.derive_entropy(salt);
            handshake.complete = true;
            handshake.entropy = Some(entropy);
            info!(%id, revealed, %entropy, "handshake complete");
            return Ok(Some(entropy));
        }
        Ok(None)
    }

    /// Whether the round is one verified reveal away from finalizing.
    ///
    /// True only while incomplete, with a quorum of commitments present and
    /// all but the final reveal recorded.
    pub fn is_ready(&self, id: HandshakeId) -> Result<bool, HandshakeError> {
        let handshake = self
            .handshakes
            .get(&id)
            .ok_or(HandshakeError::UnknownHandshake { id })?;
        let required = handshake.required as usize;
        Ok(!handshake.complete
            && handshake.participants.len() >= required
            && handshake.reveal_count() + 1 >= required)
    }

    /// Entropy of a completed round.
    ///
    /// Idempotent: returns the value cached at completion time. The salt
    /// used by the completing reveal is baked in, so repeated queries can
    /// never drift as chain state moves on.
    pub fn entropy_of(&self, id: HandshakeId) -> Result<Digest32, HandshakeError> {
        let handshake = self
            .handshakes
            .get(&id)
            .ok_or(HandshakeError::UnknownHandshake { id })?;
        handshake
            .entropy
            .filter(|_| handshake.complete)
            .ok_or(HandshakeError::NotComplete { id })
    }

    /// Look up a round.
    pub fn get(&self, id: HandshakeId) -> Option<&Handshake> {
        self.handshakes.get(&id)
    }
}
