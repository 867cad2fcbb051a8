//! # Facet Handshake - Commit-Reveal Coordination
//!
//! Generic multi-party commit-reveal rounds ("handshakes"). Participants
//! first publish a commitment digest of a secret, later disclose the secret;
//! once a quorum of verified reveals exists the round completes and combined
//! entropy is derived from the XOR-fold of the secrets mixed with an
//! external chain-state salt.
//!
//! The registry is a pure synchronous state machine: salts arrive as call
//! arguments, never from ambient effects, so completion is deterministic
//! and replayable.
//!
//! ## Known structural weakness
//!
//! Nothing forces every commitment to land before any reveal is observable,
//! so the last revealer sees all prior secrets and can bias the XOR-fold.
//! The salt mixing only partially mitigates this. A hardened scheme
//! (threshold VDF, ZK commitments) is out of scope.

#![forbid(unsafe_code)]

pub mod error;
pub mod registry;

pub use error::HandshakeError;
pub use registry::{EntropySalt, Handshake, HandshakeRegistry};
