//! # Facet Distributor - Hybrid Fund Distribution
//!
//! Per-depositor commit-reveal of a distribution secret, followed by a
//! two-pass split of the accumulated deposit:
//!
//! 1. **Fixed pass** — each fixed-percentage recipient is paid
//!    `amount * bp / 10000`. The fixed allocation across the plan is capped
//!    at 5000 basis points.
//! 2. **Random pass** — each random-weight recipient's base percentage is
//!    perturbed into a 75%..125% band by a factor derived from the revealed
//!    secret, then paid proportionally out of what remains. Random
//!    percentages are relative weights, not absolute shares.
//!
//! Rounding residue (and everything, when there are no random recipients)
//! goes to the treasury, so a completed distribution conserves value
//! exactly.
//!
//! Payment legs are best-effort-irreversible: a failing transfer aborts the
//! rest of the distribution and nothing already paid is rolled back. The
//! depositor's commitment is left re-drivable, and a time-locked
//! `force_distribute` exists so funds can never be stranded by a depositor
//! who never reveals.

#![forbid(unsafe_code)]

pub mod distributor;
pub mod error;
pub mod plan;

pub use distributor::{DistributionReport, FundCommitment, FundDistributor, LegKind, PaymentLeg};
pub use error::DistributorError;
pub use plan::{DistributionEntry, DistributionPlan};
