//! # Facet Testkit
//!
//! In-memory implementations of the facet effect traits plus small fixture
//! factories. Test-only: every handler here trades realism for
//! determinism and inspectability.

#![forbid(unsafe_code)]
// Test support code: panicking on poisoned mutexes is fine here.
#![allow(clippy::expect_used)]

pub mod factories;
pub mod mock_effects;

pub use factories::{commitment_for, participant, secret, test_config};
pub use mock_effects::{
    ManualEnvironment, MemoryLedger, RecordingPayments, StaticAccessControl, StubRenderer,
};
