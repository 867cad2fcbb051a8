//! Distributor domain errors.

use facet_core::ParticipantId;

/// Domain conditions surfaced by the fund distributor.
///
/// Every failing operation leaves distributor state exactly as before the
/// call. The one deliberate exception is `TransferFailed`: payment legs
/// completed before the failure persist (external transfers are
/// irreversible), which is why the variant reports what was paid and what
/// remains instead of discarding that information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistributorError {
    /// Deposits of zero are rejected.
    #[error("deposit amount must be greater than zero")]
    EmptyDeposit,

    /// No commitment exists for this depositor.
    #[error("no fund commitment for depositor {depositor}")]
    NoCommitment {
        /// Depositor without a commitment.
        depositor: ParticipantId,
    },

    /// The depositor already revealed and distributed.
    #[error("depositor {depositor} already revealed")]
    AlreadyRevealed {
        /// Depositor that revealed twice.
        depositor: ParticipantId,
    },

    /// Revealed secret does not hash to the stored commitment.
    #[error("secret from depositor {depositor} does not match commitment")]
    SecretMismatch {
        /// Depositor whose reveal failed verification.
        depositor: ParticipantId,
    },

    /// A payment leg failed; the distribution aborted at that leg.
    #[error(
        "transfer of {amount} to {recipient} failed after {paid_so_far} paid \
         ({remaining} undistributed): {reason}"
    )]
    TransferFailed {
        /// Recipient of the failing leg.
        recipient: ParticipantId,
        /// Amount the failing leg attempted to pay.
        amount: u128,
        /// Sum of legs completed before the failure (irreversible).
        paid_so_far: u128,
        /// Amount left undistributed when the pass aborted.
        remaining: u128,
        /// What the payment rail reported.
        reason: String,
    },

    /// Forced distribution attempted before the maturity window elapsed.
    #[error("deposit matures at {matures_at_ms}ms; too early to force-distribute")]
    TooEarly {
        /// Epoch-millisecond instant at which forcing becomes legal.
        matures_at_ms: u64,
    },

    /// Percentage outside the basis-point range.
    #[error("percentage {bp} exceeds 10000 basis points")]
    InvalidPercentage {
        /// Offending basis-point value.
        bp: u16,
    },

    /// Fixed allocations may never sum past 5000 basis points.
    #[error("fixed allocations would total {total_bp} basis points (cap 5000)")]
    FixedAllocationExceeded {
        /// Fixed total the change would have produced.
        total_bp: u32,
    },

    /// Plan entry index out of range.
    #[error("no distribution entry at index {index}")]
    UnknownDistribution {
        /// Offending index.
        index: usize,
    },
}
