//! The distribution plan: recipients, weights, and the treasury.

use crate::error::DistributorError;
use facet_core::ParticipantId;
use serde::{Deserialize, Serialize};

/// Fixed allocations may never sum past half the deposit.
pub const FIXED_ALLOCATION_CAP_BP: u32 = 5000;

/// Full basis-point scale.
pub const BP_SCALE: u16 = 10_000;

/// One recipient in the plan.
///
/// For fixed entries `percentage_bp` is an absolute share of the deposit.
/// For random entries it is only a relative weight among the other random
/// entries; the two must not be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Recipient identity.
    pub recipient: ParticipantId,
    /// Basis points in `0..=10000`.
    pub percentage_bp: u16,
    /// Absolute share (true) or random relative weight (false).
    pub fixed: bool,
}

/// Ordered recipient table plus the treasury address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionPlan {
    entries: Vec<DistributionEntry>,
    treasury: ParticipantId,
}

impl DistributionPlan {
    /// Create an empty plan paying residues to `treasury`.
    pub fn new(treasury: ParticipantId) -> Self {
        Self {
            entries: Vec::new(),
            treasury,
        }
    }

    /// The treasury address.
    pub fn treasury(&self) -> ParticipantId {
        self.treasury
    }

    /// Redirect residues to a new treasury address.
    pub fn set_treasury(&mut self, treasury: ParticipantId) {
        self.treasury = treasury;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DistributionEntry> {
        self.entries.iter()
    }

    /// Fixed entries in insertion order.
    pub fn fixed_entries(&self) -> impl Iterator<Item = &DistributionEntry> {
        self.entries.iter().filter(|entry| entry.fixed)
    }

    /// Random-weight entries in insertion order.
    pub fn random_entries(&self) -> impl Iterator<Item = &DistributionEntry> {
        self.entries.iter().filter(|entry| !entry.fixed)
    }

    /// Sum of fixed allocations in basis points.
    pub fn fixed_total_bp(&self) -> u32 {
        self.fixed_entries()
            .map(|entry| entry.percentage_bp as u32)
            .sum()
    }

    /// Sum of random base weights in basis points. Not capacity-checked.
    pub fn random_total_bp(&self) -> u32 {
        self.random_entries()
            .map(|entry| entry.percentage_bp as u32)
            .sum()
    }

    /// Append a recipient, enforcing the basis-point range and the fixed cap.
    pub fn add_entry(
        &mut self,
        recipient: ParticipantId,
        percentage_bp: u16,
        fixed: bool,
    ) -> Result<(), DistributorError> {
        self.check_change(percentage_bp, fixed, None)?;
        self.entries.push(DistributionEntry {
            recipient,
            percentage_bp,
            fixed,
        });
        Ok(())
    }

    /// Update the entry at `index` in place, under the same checks.
    pub fn update_entry(
        &mut self,
        index: usize,
        percentage_bp: u16,
        fixed: bool,
    ) -> Result<(), DistributorError> {
        if index >= self.entries.len() {
            return Err(DistributorError::UnknownDistribution { index });
        }
        self.check_change(percentage_bp, fixed, Some(index))?;
        let entry = &mut self.entries[index];
        entry.percentage_bp = percentage_bp;
        entry.fixed = fixed;
        Ok(())
    }

    // The fixed cap is enforced on every insert/update, independent of
    // random weights.
    fn check_change(
        &self,
        percentage_bp: u16,
        fixed: bool,
        replacing: Option<usize>,
    ) -> Result<(), DistributorError> {
        if percentage_bp > BP_SCALE {
            return Err(DistributorError::InvalidPercentage { bp: percentage_bp });
        }
        if fixed {
            let current: u32 = self
                .entries
                .iter()
                .enumerate()
                .filter(|(index, entry)| entry.fixed && Some(*index) != replacing)
                .map(|(_, entry)| entry.percentage_bp as u32)
                .sum();
            let total_bp = current + percentage_bp as u32;
            if total_bp > FIXED_ALLOCATION_CAP_BP {
                return Err(DistributorError::FixedAllocationExceeded { total_bp });
            }
        }
        Ok(())
    }
}
