//! Position records and per-owner accounts.

use serde::{Deserialize, Serialize};

use tidelock_core::constants::SECONDS_PER_MONTH;
use tidelock_core::error::{LedgerError, MathError};
use tidelock_core::types::{Address, PositionId, Timestamp};

/// A single time-locked stake.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub id: PositionId,
    /// Staked amount. Always positive while the record exists.
    pub principal: u128,
    pub lock_start: Timestamp,
    pub lock_months: u32,
    /// Start of the current claim interval.
    pub last_claim: Timestamp,
    /// Time up to which rewards have been folded into `accrued_rewards`.
    pub last_accrual: Timestamp,
    /// Stake size used by the size factor.
    pub size_snapshot: u128,
    /// Settled but unpaid rewards.
    pub accrued_rewards: u128,
    /// Patience points. Never decreases.
    pub points: u128,
    /// Start of the current points maturity period.
    pub points_checkpoint: Timestamp,
    /// Boost cohort membership. Sticky once set.
    pub is_boosted: bool,
}

impl Position {
    /// A fresh position with every watermark at `now`.
    pub fn new(id: PositionId, amount: u128, lock_months: u32, now: Timestamp) -> Self {
        Self {
            id,
            principal: amount,
            lock_start: now,
            lock_months,
            last_claim: now,
            last_accrual: now,
            size_snapshot: amount,
            accrued_rewards: 0,
            points: 0,
            points_checkpoint: now,
            is_boosted: false,
        }
    }

    pub fn unlock_time(&self) -> Timestamp {
        self.lock_start
            .saturating_add(u64::from(self.lock_months).saturating_mul(SECONDS_PER_MONTH))
    }

    pub fn is_unlocked(&self, now: Timestamp) -> bool {
        now >= self.unlock_time()
    }

    pub fn next_claim_time(&self, claim_interval: u64) -> Timestamp {
        self.last_claim.saturating_add(claim_interval)
    }

    pub fn is_claimable(&self, now: Timestamp, claim_interval: u64) -> bool {
        now >= self.next_claim_time(claim_interval)
    }
}

/// All positions of one owner.
///
/// The account outlives its positions so the id counter never rewinds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnerAccount {
    /// Open positions in no particular order (removal swaps the last entry in).
    pub positions: Vec<Position>,
    /// Sum of open principals.
    pub total_principal: u128,
    /// Next id to mint.
    pub next_id: u64,
    /// Whether this owner occupies a boost cohort slot.
    pub has_boosted: bool,
}

impl OwnerAccount {
    pub fn mint_id(&mut self) -> Result<PositionId, LedgerError> {
        let id = PositionId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(MathError::Overflow)?;
        Ok(id)
    }

    pub fn ids(&self) -> Vec<PositionId> {
        self.positions.iter().map(|p| p.id).collect()
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| p.id == id)
    }

    /// Remove a position by swapping the last entry into its slot.
    pub fn remove(&mut self, id: PositionId) -> Option<Position> {
        let index = self.positions.iter().position(|p| p.id == id)?;
        Some(self.positions.swap_remove(index))
    }

    pub fn position(&self, owner: &Address, id: PositionId) -> Result<&Position, LedgerError> {
        self.get(id).ok_or(LedgerError::PositionNotFound { owner: *owner, id })
    }

    pub fn position_mut(
        &mut self,
        owner: &Address,
        id: PositionId,
    ) -> Result<&mut Position, LedgerError> {
        self.get_mut(id).ok_or(LedgerError::PositionNotFound { owner: *owner, id })
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
