//! # Facet Collection - Issuance Orchestration
//!
//! The collection lifecycle: a forward-only phase machine
//! (`Closed → Premint → Public → Reveal`), per-token randomness derived
//! from the completed collection entropy round, and `CollectionService`,
//! which wires the pure state machines to the injected effect handlers
//! (ledger, renderer, access control, payments, environment).
//!
//! Minting is legal only in Premint (admin allowlist phase) and Public,
//! under the supply ceiling. The Reveal phase is unreachable until the
//! collection's commit-reveal entropy round completes; only then can token
//! seeds be derived and sampled.

#![forbid(unsafe_code)]

pub mod error;
pub mod phase;
pub mod randomness;
pub mod service;

pub use error::CollectionError;
pub use phase::{Phase, PhaseController};
pub use randomness::RandomnessEngine;
pub use service::{CollectionService, DepositAttachment};
