//! Collection configuration.

use crate::identifiers::ParticipantId;
use serde::{Deserialize, Serialize};

/// Default maturity window before forced distribution: 30 days.
pub const DEFAULT_MATURITY_WINDOW_MS: u64 = 30 * 24 * 60 * 60 * 1000;

fn default_maturity_window_ms() -> u64 {
    DEFAULT_MATURITY_WINDOW_MS
}

/// Error raised by configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Supply ceiling must allow at least one token.
    #[error("max supply must be greater than zero")]
    InvalidSupply,

    /// Entropy quorum must require at least one reveal.
    #[error("entropy quorum must be greater than zero")]
    InvalidQuorum,

    /// Maturity window must be non-zero or forced distribution is instant.
    #[error("maturity window must be greater than zero")]
    InvalidMaturityWindow,
}

/// Static configuration for one collection, fixed at service construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Human-readable collection name, for logs and metadata.
    pub name: String,
    /// Global mint ceiling.
    pub max_supply: u64,
    /// Reveals required to finalize the collection entropy round.
    pub entropy_quorum: u32,
    /// Address receiving distribution residues.
    pub treasury: ParticipantId,
    /// Delay before an admin may force-distribute unrevealed deposits.
    #[serde(default = "default_maturity_window_ms")]
    pub maturity_window_ms: u64,
}

impl CollectionConfig {
    /// Create a config with the default maturity window.
    pub fn new(
        name: impl Into<String>,
        max_supply: u64,
        entropy_quorum: u32,
        treasury: ParticipantId,
    ) -> Self {
        Self {
            name: name.into(),
            max_supply,
            entropy_quorum,
            treasury,
            maturity_window_ms: DEFAULT_MATURITY_WINDOW_MS,
        }
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_supply == 0 {
            return Err(ConfigError::InvalidSupply);
        }
        if self.entropy_quorum == 0 {
            return Err(ConfigError::InvalidQuorum);
        }
        if self.maturity_window_ms == 0 {
            return Err(ConfigError::InvalidMaturityWindow);
        }
        Ok(())
    }
}
