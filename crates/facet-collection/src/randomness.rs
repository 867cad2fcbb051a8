//! Per-token randomness derived from the collection entropy.

use crate::error::CollectionError;
use facet_core::hash::{Hasher, DOMAIN_TOKEN_SEED};
use facet_core::{Digest32, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Derives and stores per-token seeds once the Reveal phase opens.
///
/// Constructed exactly once, at the `Public → Reveal` transition, capturing
/// the completed round entropy and one environment salt at that moment. The
/// salt is deliberately not re-sampled per derivation call: derivation
/// timing is caller-chosen, so a salt observed at call time would hand the
/// caller influence over the seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomnessEngine {
    entropy: Digest32,
    salt: [u8; 32],
    seeds: HashMap<TokenId, Digest32>,
}

impl RandomnessEngine {
    /// Create from the completed collection entropy and a salt fixed at
    /// Reveal entry.
    pub fn new(entropy: Digest32, salt: [u8; 32]) -> Self {
        Self {
            entropy,
            salt,
            seeds: HashMap::new(),
        }
    }

    /// Whether `token` already has a seed.
    pub fn has_seed(&self, token: TokenId) -> bool {
        self.seeds.contains_key(&token)
    }

    /// Number of seeded tokens.
    pub fn seeded_count(&self) -> usize {
        self.seeds.len()
    }

    /// Derive the seed for `token`. At most once per token.
    pub fn derive_token_seed(&mut self, token: TokenId) -> Result<Digest32, CollectionError> {
        if self.seeds.contains_key(&token) {
            return Err(CollectionError::AlreadyGenerated { token });
        }
        let mut hasher = Hasher::with_domain(DOMAIN_TOKEN_SEED);
        hasher.update(self.entropy.as_bytes());
        hasher.update(&token.value().to_le_bytes());
        hasher.update(&self.salt);
        let seed = hasher.finalize();
        self.seeds.insert(token, seed);
        debug!(%token, %seed, "token seed derived");
        Ok(seed)
    }

    /// The seed for `token`, if derived.
    pub fn seed_of(&self, token: TokenId) -> Result<Digest32, CollectionError> {
        self.seeds
            .get(&token)
            .copied()
            .ok_or(CollectionError::SeedNotReady { token })
    }

    /// Sample an integer in `[min, max]` from the token's seed.
    ///
    /// Modulo sampling: non-uniform in the limit, but the 128-bit seed
    /// width dwarfs any practical range, so the bias is negligible.
    pub fn sample_range(
        &self,
        token: TokenId,
        min: u64,
        max: u64,
    ) -> Result<u64, CollectionError> {
        if min > max {
            return Err(CollectionError::InvalidRange { min, max });
        }
        let seed = self.seed_of(token)?;
        let span = (max - min) as u128 + 1;
        let offset = seed.to_u128() % span;
        Ok(min + offset as u64)
    }
}
