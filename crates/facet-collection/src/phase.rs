//! The forward-only collection phase machine.

use crate::error::CollectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Collection lifecycle phase. Monotonically advances, never skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing is live yet.
    Closed,
    /// Admin-only minting window.
    Premint,
    /// Open minting window.
    Public,
    /// Entropy finalized; token seeds may be derived.
    Reveal,
}

impl Phase {
    /// The next phase, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Closed => Some(Phase::Premint),
            Phase::Premint => Some(Phase::Public),
            Phase::Public => Some(Phase::Reveal),
            Phase::Reveal => None,
        }
    }

    /// Whether minting is legal in this phase (ceiling checked elsewhere).
    pub fn allows_minting(self) -> bool {
        matches!(self, Phase::Premint | Phase::Public)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Closed => "closed",
            Phase::Premint => "premint",
            Phase::Public => "public",
            Phase::Reveal => "reveal",
        };
        f.write_str(name)
    }
}

/// Owns the current phase and enforces the transition rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseController {
    phase: Phase,
}

impl PhaseController {
    /// Start in `Closed`.
    pub fn new() -> Self {
        Self {
            phase: Phase::Closed,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance one step. `Public → Reveal` additionally requires the
    /// collection entropy round to be complete; the caller passes that
    /// observation in.
    pub fn advance(&mut self, handshake_complete: bool) -> Result<Phase, CollectionError> {
        let next = self
            .phase
            .next()
            .ok_or(CollectionError::WrongPhase { phase: self.phase })?;
        if next == Phase::Reveal && !handshake_complete {
            return Err(CollectionError::HandshakeIncomplete);
        }
        let previous = self.phase;
        self.phase = next;
        info!(%previous, phase = %next, "collection phase advanced");
        Ok(next)
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}
