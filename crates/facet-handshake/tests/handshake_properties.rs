//! Property tests for commit-reveal round invariants.

use facet_core::hash::commitment_digest;
use facet_core::{HandshakeId, ParticipantId, Secret};
use facet_handshake::{EntropySalt, HandshakeError, HandshakeRegistry};
use proptest::prelude::*;

fn participant(seed: u8) -> ParticipantId {
    ParticipantId::from_bytes([seed; 32])
}

fn salt(nonce: u64) -> EntropySalt {
    EntropySalt {
        anchor: [0x42; 32],
        timestamp_ms: 1_700_000_000_000,
        nonce,
    }
}

proptest! {
    /// Completion happens exactly once, exactly at the quorum reveal, and
    /// entropy queries are deterministic afterwards.
    #[test]
    fn completion_is_monotonic_and_at_quorum(
        committers in 1usize..12,
        quorum_offset in 0usize..12,
        secret_seeds in proptest::collection::vec(any::<[u8; 32]>(), 12),
        reveal_order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let quorum = (1 + quorum_offset % committers) as u32;
        let mut registry = HandshakeRegistry::new();
        let id = HandshakeId::new();
        registry.create(id, quorum).expect("create");

        for index in 0..committers {
            let p = participant(index as u8);
            let s = Secret(secret_seeds[index]);
            registry.commit(id, p, commitment_digest(&s, &p)).expect("commit");
        }

        let mut revealed = 0usize;
        let mut completion_entropy = None;
        for &index in reveal_order.iter().filter(|&&i| i < committers) {
            let p = participant(index as u8);
            let s = Secret(secret_seeds[index]);
            match registry.reveal(id, p, s, &salt(revealed as u64)) {
                Ok(outcome) => {
                    revealed += 1;
                    if revealed == quorum as usize {
                        // Completion at exactly the quorum reveal.
                        prop_assert!(outcome.is_some());
                        completion_entropy = outcome;
                    } else {
                        prop_assert!(outcome.is_none());
                        prop_assert!(revealed < quorum as usize);
                    }
                }
                Err(HandshakeError::HandshakeClosed { .. }) => {
                    // Only after completion.
                    prop_assert!(completion_entropy.is_some());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        let round = registry.get(id).expect("round exists");
        prop_assert_eq!(round.is_complete(), completion_entropy.is_some());
        if let Some(entropy) = completion_entropy {
            prop_assert_eq!(registry.entropy_of(id).expect("entropy"), entropy);
            prop_assert_eq!(registry.entropy_of(id).expect("entropy"), entropy);
        } else {
            prop_assert!(
                matches!(
                    registry.entropy_of(id),
                    Err(HandshakeError::NotComplete { .. })
                ),
                "expected NotComplete from entropy_of"
            );
        }
    }

    /// At most one commitment per participant is ever accepted, and a
    /// mismatched secret is always rejected.
    #[test]
    fn one_commitment_one_reveal(
        secret_bytes in any::<[u8; 32]>(),
        wrong_bytes in any::<[u8; 32]>(),
    ) {
        prop_assume!(secret_bytes != wrong_bytes);
        let mut registry = HandshakeRegistry::new();
        let id = HandshakeId::new();
        registry.create(id, 2).expect("create");

        let p = participant(1);
        let s = Secret(secret_bytes);
        let digest = commitment_digest(&s, &p);
        registry.commit(id, p, digest).expect("first commit");
        prop_assert!(
            matches!(
                registry.commit(id, p, digest),
                Err(HandshakeError::DuplicateCommitment { .. })
            ),
            "expected DuplicateCommitment on second commit"
        );

        prop_assert!(
            matches!(
                registry.reveal(id, p, Secret(wrong_bytes), &salt(0)),
                Err(HandshakeError::SecretMismatch { .. })
            ),
            "expected SecretMismatch on wrong secret"
        );
        registry.reveal(id, p, s, &salt(0)).expect("matching reveal");
        prop_assert!(
            matches!(
                registry.reveal(id, p, s, &salt(0)),
                Err(HandshakeError::DuplicateReveal { .. })
            ),
            "expected DuplicateReveal on second reveal"
        );
    }
}
