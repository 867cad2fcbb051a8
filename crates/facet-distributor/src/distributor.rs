//! Per-depositor fund commitments and the two-pass distribution.

use crate::error::DistributorError;
use crate::plan::{DistributionPlan, BP_SCALE};
use facet_core::hash::{self, Hasher, DOMAIN_RANDOM_FACTOR};
use facet_core::{Digest32, ParticipantId, PaymentEffects, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Which pass produced a payment leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegKind {
    /// Fixed-percentage pass.
    Fixed,
    /// Random-weight pass.
    Random,
    /// Residue routed to the treasury.
    Treasury,
}

/// One completed payment within a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLeg {
    /// Who was paid.
    pub recipient: ParticipantId,
    /// How much.
    pub amount: u128,
    /// Which pass paid it.
    pub kind: LegKind,
}

/// Record of a completed distribution.
///
/// Invariant: the legs sum exactly to `total` — fixed payments plus random
/// payments plus the treasury residue conserve the deposited amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Depositor whose funds were distributed.
    pub depositor: ParticipantId,
    /// Amount distributed.
    pub total: u128,
    /// Every payment made, in execution order.
    pub legs: Vec<PaymentLeg>,
    /// Portion of `total` that went to the treasury.
    pub treasury_residue: u128,
}

impl DistributionReport {
    /// Sum of all legs.
    pub fn paid_total(&self) -> u128 {
        self.legs.iter().map(|leg| leg.amount).sum()
    }
}

/// A depositor's accumulating commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundCommitment {
    commitment: Digest32,
    revealed_secret: Option<Secret>,
    revealed: bool,
    amount: u128,
    created_at_ms: u64,
}

impl FundCommitment {
    /// The current commitment digest.
    pub fn commitment(&self) -> Digest32 {
        self.commitment
    }

    /// Whether the depositor revealed (or was force-distributed).
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Undistributed accumulated amount.
    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Epoch-millisecond creation time of the first deposit.
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }
}

/// Owns the distribution plan and all per-depositor commitments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundDistributor {
    plan: DistributionPlan,
    commitments: HashMap<ParticipantId, FundCommitment>,
    maturity_window_ms: u64,
}

impl FundDistributor {
    /// Create a distributor over `plan`, with forced distribution legal
    /// `maturity_window_ms` after a commitment's first deposit.
    pub fn new(plan: DistributionPlan, maturity_window_ms: u64) -> Self {
        Self {
            plan,
            commitments: HashMap::new(),
            maturity_window_ms,
        }
    }

    /// The distribution plan.
    pub fn plan(&self) -> &DistributionPlan {
        &self.plan
    }

    /// Mutable access to the plan, for admin-gated management.
    pub fn plan_mut(&mut self) -> &mut DistributionPlan {
        &mut self.plan
    }

    /// Look up a depositor's commitment.
    pub fn commitment_of(&self, depositor: ParticipantId) -> Option<&FundCommitment> {
        self.commitments.get(&depositor)
    }

    /// Accumulate `amount` into the depositor's commitment, creating it on
    /// the first deposit. Later deposits refresh the commitment digest but
    /// keep the original creation timestamp.
    pub fn commit(
        &mut self,
        depositor: ParticipantId,
        commitment: Digest32,
        amount: u128,
        now_ms: u64,
    ) -> Result<(), DistributorError> {
        if amount == 0 {
            return Err(DistributorError::EmptyDeposit);
        }
        match self.commitments.get_mut(&depositor) {
            Some(existing) => {
                if existing.revealed {
                    return Err(DistributorError::AlreadyRevealed { depositor });
                }
                existing.amount = existing.amount.saturating_add(amount);
                existing.commitment = commitment;
            }
            None => {
                self.commitments.insert(
                    depositor,
                    FundCommitment {
                        commitment,
                        revealed_secret: None,
                        revealed: false,
                        amount,
                        created_at_ms: now_ms,
                    },
                );
            }
        }
        debug!(%depositor, amount, "fund commitment recorded");
        Ok(())
    }

    /// Reveal the distribution secret and, if any amount accumulated,
    /// distribute it synchronously and zero the balance.
    ///
    /// On `TransferFailed` the commitment is left un-revealed with its
    /// balance intact so distribution can be re-driven; legs paid before the
    /// failure are not reversed.
    pub async fn reveal(
        &mut self,
        depositor: ParticipantId,
        secret: Secret,
        now_ms: u64,
        payments: &dyn PaymentEffects,
    ) -> Result<DistributionReport, DistributorError> {
        let entry = self
            .commitments
            .get(&depositor)
            .ok_or(DistributorError::NoCommitment { depositor })?;
        if entry.revealed {
            return Err(DistributorError::AlreadyRevealed { depositor });
        }
        if hash::commitment_digest(&secret, &depositor) != entry.commitment {
            return Err(DistributorError::SecretMismatch { depositor });
        }

        let amount = entry.amount;
        let report = self
            .run_distribution(depositor, amount, &secret, now_ms, payments)
            .await?;

        // Distribution fully succeeded: zero the balance so a second payout
        // is impossible, and keep the reveal.
        if let Some(entry) = self.commitments.get_mut(&depositor) {
            entry.revealed = true;
            entry.revealed_secret = Some(secret);
            entry.amount = 0;
        }
        info!(%depositor, amount, "fund commitment revealed and distributed");
        Ok(report)
    }

    /// Admin emergency path: distribute a matured, unrevealed deposit.
    ///
    /// Legal only once `maturity_window_ms` has elapsed since the first
    /// deposit. Uses the revealed secret when one exists, otherwise
    /// `default_seed`. Exists so funds can never be permanently stuck
    /// behind a depositor who never reveals.
    pub async fn force_distribute(
        &mut self,
        depositor: ParticipantId,
        default_seed: Secret,
        now_ms: u64,
        payments: &dyn PaymentEffects,
    ) -> Result<DistributionReport, DistributorError> {
        let entry = self
            .commitments
            .get(&depositor)
            .ok_or(DistributorError::NoCommitment { depositor })?;
        let matures_at_ms = entry.created_at_ms.saturating_add(self.maturity_window_ms);
        if now_ms < matures_at_ms {
            return Err(DistributorError::TooEarly { matures_at_ms });
        }
        if entry.amount == 0 {
            return Err(DistributorError::EmptyDeposit);
        }

        let amount = entry.amount;
        let secret = entry.revealed_secret.unwrap_or(default_seed);
        let report = self
            .run_distribution(depositor, amount, &secret, now_ms, payments)
            .await?;

        if let Some(entry) = self.commitments.get_mut(&depositor) {
            entry.revealed = true;
            entry.amount = 0;
        }
        warn!(%depositor, amount, "deposit force-distributed after maturity");
        Ok(report)
    }

    // Two passes: fixed absolute shares first, then random weights over
    // what remains, then the residue to the treasury. A failing leg aborts
    // the rest; nothing already paid is reversed.
    async fn run_distribution(
        &self,
        depositor: ParticipantId,
        amount: u128,
        secret: &Secret,
        now_ms: u64,
        payments: &dyn PaymentEffects,
    ) -> Result<DistributionReport, DistributorError> {
        let mut legs = Vec::new();
        let mut paid = 0u128;
        let mut remaining = amount;

        if amount == 0 {
            return Ok(DistributionReport {
                depositor,
                total: 0,
                legs,
                treasury_residue: 0,
            });
        }

        for entry in self.plan.fixed_entries() {
            let share = mul_div(amount, entry.percentage_bp as u128, BP_SCALE as u128);
            if share == 0 {
                continue;
            }
            pay_leg(payments, entry.recipient, share, paid, remaining).await?;
            paid += share;
            remaining -= share;
            legs.push(PaymentLeg {
                recipient: entry.recipient,
                amount: share,
                kind: LegKind::Fixed,
            });
            debug!(recipient = %entry.recipient, share, "fixed leg paid");
        }

        let total_random_bp = self.plan.random_total_bp() as u128;
        if total_random_bp > 0 {
            for (index, entry) in self.plan.random_entries().enumerate() {
                if remaining == 0 {
                    break;
                }
                let factor = random_factor(secret, &entry.recipient, now_ms, index as u64);
                // Piecewise-linear band: factor 0 -> 75% of base weight,
                // 50 -> 100%, 99 -> 124.5%.
                let adjusted_bp = entry.percentage_bp as u128 * (7500 + 50 * factor) / 10_000;
                let share = mul_div(remaining, adjusted_bp, total_random_bp).min(remaining);
                if share == 0 {
                    continue;
                }
                pay_leg(payments, entry.recipient, share, paid, remaining).await?;
                paid += share;
                remaining -= share;
                legs.push(PaymentLeg {
                    recipient: entry.recipient,
                    amount: share,
                    kind: LegKind::Random,
                });
                debug!(recipient = %entry.recipient, share, factor, "random leg paid");
            }
        }

        let treasury_residue = remaining;
        if treasury_residue > 0 {
            let treasury = self.plan.treasury();
            pay_leg(payments, treasury, treasury_residue, paid, remaining).await?;
            legs.push(PaymentLeg {
                recipient: treasury,
                amount: treasury_residue,
                kind: LegKind::Treasury,
            });
            debug!(%treasury, treasury_residue, "residue paid to treasury");
        }

        Ok(DistributionReport {
            depositor,
            total: amount,
            legs,
            treasury_residue,
        })
    }
}

async fn pay_leg(
    payments: &dyn PaymentEffects,
    recipient: ParticipantId,
    amount: u128,
    paid_so_far: u128,
    remaining: u128,
) -> Result<(), DistributorError> {
    payments
        .pay(recipient, amount)
        .await
        .map_err(|source| DistributorError::TransferFailed {
            recipient,
            amount,
            paid_so_far,
            remaining,
            reason: source.to_string(),
        })
}

/// Floor of `value * numerator / denominator`.
///
/// Free of intermediate overflow whenever `numerator <= denominator`. The
/// random pass exceeds that ratio by at most 24.5% (adjusted weights top out
/// at 1.245x the base), so overflow there needs `value` in the top quarter
/// of the `u128` range, far beyond any representable deposit.
fn mul_div(value: u128, numerator: u128, denominator: u128) -> u128 {
    (value / denominator) * numerator + (value % denominator) * numerator / denominator
}

/// Per-recipient perturbation factor in `0..100`, derived from the revealed
/// secret, the recipient, the distribution timestamp, and the entry index.
fn random_factor(secret: &Secret, recipient: &ParticipantId, now_ms: u64, index: u64) -> u128 {
    let mut hasher = Hasher::with_domain(DOMAIN_RANDOM_FACTOR);
    hasher.update(secret.as_bytes());
    hasher.update(recipient.as_bytes());
    hasher.update(&now_ms.to_le_bytes());
    hasher.update(&index.to_le_bytes());
    hasher.finalize().to_u128() % 100
}
