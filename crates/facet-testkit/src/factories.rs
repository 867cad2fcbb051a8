//! Fixture factories shared across protocol tests.

use facet_core::hash::commitment_digest;
use facet_core::{CollectionConfig, Digest32, ParticipantId, Secret};

/// A participant id filled with `seed`.
pub fn participant(seed: u8) -> ParticipantId {
    ParticipantId::from_bytes([seed; 32])
}

/// A secret filled with `seed`.
pub fn secret(seed: u8) -> Secret {
    Secret([seed; 32])
}

/// The commitment digest a participant would publish for `seed`'s secret.
pub fn commitment_for(secret_seed: u8, participant_id: ParticipantId) -> Digest32 {
    commitment_digest(&secret(secret_seed), &participant_id)
}

/// A small valid config: supply 100, quorum 3, treasury `participant(0xfe)`.
pub fn test_config() -> CollectionConfig {
    CollectionConfig::new("test-collection", 100, 3, participant(0xfe))
}
