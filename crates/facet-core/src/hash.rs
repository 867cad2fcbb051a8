//! Centralized hashing for commitments, entropy, and token seeds.
//!
//! All digests in the protocol come from this module so there is a single
//! source of truth for the algorithm (SHA-256) and for domain separation.
//! Every digest context starts with one of the `DOMAIN_*` labels; two
//! different uses of the hash can never collide on the same input bytes.

use crate::identifiers::ParticipantId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain label for commitment digests (`hash(secret, participant)`).
pub const DOMAIN_COMMITMENT: &[u8] = b"facet.commitment.v1";
/// Domain label for combined round entropy.
pub const DOMAIN_ENTROPY: &[u8] = b"facet.entropy.v1";
/// Domain label for per-token seeds.
pub const DOMAIN_TOKEN_SEED: &[u8] = b"facet.token-seed.v1";
/// Domain label for per-recipient random distribution factors.
pub const DOMAIN_RANDOM_FACTOR: &[u8] = b"facet.random-factor.v1";

/// A 32-byte digest: commitment hash, round entropy, or token seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Interpret the leading 16 bytes as a little-endian integer.
    ///
    /// Used for bounded-range sampling; the remaining bytes are ignored.
    pub fn to_u128(&self) -> u128 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&self.0[..16]);
        u128::from_le_bytes(buf)
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({})", &hex::encode(self.0)[..16])
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A participant's 32-byte secret, disclosed during the reveal step.
///
/// Debug output is redacted; secrets appear in logs only as their
/// commitment digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Secret(pub [u8; 32]);

impl Secret {
    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(..)")
    }
}

/// Incremental SHA-256 hasher.
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    /// Start a hasher seeded with a domain label.
    pub fn with_domain(domain: &[u8]) -> Self {
        let mut inner = Sha256::new();
        inner.update(domain);
        Self { inner }
    }

    /// Absorb bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and produce the digest.
    pub fn finalize(self) -> Digest32 {
        Digest32(self.inner.finalize().into())
    }
}

/// The commitment digest for a secret bound to a participant identity.
///
/// Binding the participant into the preimage stops one participant from
/// replaying another's commitment as their own.
pub fn commitment_digest(secret: &Secret, participant: &ParticipantId) -> Digest32 {
    let mut hasher = Hasher::with_domain(DOMAIN_COMMITMENT);
    hasher.update(secret.as_bytes());
    hasher.update(participant.as_bytes());
    hasher.finalize()
}

/// XOR-fold a set of revealed secrets into a single 32-byte accumulator.
///
/// Order-independent by construction. XOR alone is biasable by the last
/// revealer; callers must mix the fold with an external salt before use
/// (see the handshake registry's entropy derivation).
pub fn xor_fold<'a, I>(secrets: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a Secret>,
{
    let mut acc = [0u8; 32];
    for secret in secrets {
        for (slot, byte) in acc.iter_mut().zip(secret.as_bytes()) {
            *slot ^= byte;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(seed: u8) -> ParticipantId {
        ParticipantId::from_bytes([seed; 32])
    }

    #[test]
    fn commitment_digest_is_deterministic() {
        let secret = Secret([7; 32]);
        let a = commitment_digest(&secret, &participant(1));
        let b = commitment_digest(&secret, &participant(1));
        assert_eq!(a, b);
    }

    #[test]
    fn commitment_digest_binds_participant() {
        let secret = Secret([7; 32]);
        assert_ne!(
            commitment_digest(&secret, &participant(1)),
            commitment_digest(&secret, &participant(2)),
        );
    }

    #[test]
    fn xor_fold_is_order_independent() {
        let a = Secret([1; 32]);
        let b = Secret([2; 32]);
        let c = Secret([3; 32]);
        assert_eq!(xor_fold([&a, &b, &c]), xor_fold([&c, &a, &b]));
    }

    #[test]
    fn xor_fold_of_pair_cancels() {
        let a = Secret([9; 32]);
        assert_eq!(xor_fold([&a, &a]), [0u8; 32]);
    }

    #[test]
    fn domains_separate_digests() {
        let mut a = Hasher::with_domain(DOMAIN_ENTROPY);
        a.update(b"payload");
        let mut b = Hasher::with_domain(DOMAIN_TOKEN_SEED);
        b.update(b"payload");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", Secret([4; 32])), "Secret(..)");
    }
}
