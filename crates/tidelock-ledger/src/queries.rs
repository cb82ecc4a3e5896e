//! Read-only views, invariant audit and state export.
//!
//! Queries re-run the accrual formulas against the current clock without
//! mutating anything, so they never need the reentrancy guard.

use serde::Serialize;
use tidelock_core::error::{LedgerError, MathError};
use tidelock_core::types::{Address, PositionId, Timestamp};
use tidelock_curves::{boost_window_open, voting_power};
use tracing::info;

use crate::accrual;
use crate::ledger::StakingLedger;
use crate::position::Position;
use crate::state::{LedgerState, rewards_available};

/// Aggregate reward accounting.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardStats {
    pub total_staked: u128,
    pub added: u128,
    pub distributed: u128,
    pub recovered: u128,
    /// Custody surplus over staked principal. Authoritative.
    pub available: u128,
    /// `added - distributed - recovered`. May drift from custody.
    pub remaining_accounted: u128,
}

/// Boost cohort occupancy and window.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostStatus {
    pub boosted_owners: u64,
    pub max_boosted_owners: u64,
    pub window_open: bool,
    pub window_ends_at: Timestamp,
}

impl StakingLedger {
    /// Copy of a position record.
    pub fn position(&self, owner: &Address, id: PositionId) -> Result<Position, LedgerError> {
        self.state.read().position(owner, id).cloned()
    }

    pub fn position_ids(&self, owner: &Address) -> Vec<PositionId> {
        self.state.read().account(owner).map(|a| a.ids()).unwrap_or_default()
    }

    pub fn owner_principal(&self, owner: &Address) -> u128 {
        self.state.read().account(owner).map_or(0, |a| a.total_principal)
    }

    pub fn total_staked(&self) -> u128 {
        self.state.read().totals.total_staked
    }

    pub fn successor(&self) -> Option<Address> {
        self.state.read().successor
    }

    /// Settled plus unsettled rewards as of now.
    pub fn pending_reward(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        self.with_position(owner, id, |p, start, now| {
            accrual::pending_reward(p, &self.params.snapshot(), start, now)
        })
    }

    /// Points balance after a claim made now.
    pub fn projected_points(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        self.with_position(owner, id, |p, start, now| {
            accrual::projected_points(p, &self.params.snapshot(), start, now)
        })
    }

    /// APR the position currently earns.
    pub fn current_apr(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        self.with_position(owner, id, |p, start, now| {
            accrual::current_apr(p, &self.params.snapshot(), start, now)
        })
    }

    pub fn is_claimable(&self, owner: &Address, id: PositionId) -> Result<bool, LedgerError> {
        let interval = self.params.snapshot().claim_interval;
        let now = self.clock.now();
        Ok(self.position(owner, id)?.is_claimable(now, interval))
    }

    pub fn is_unlocked(&self, owner: &Address, id: PositionId) -> Result<bool, LedgerError> {
        let now = self.clock.now();
        Ok(self.position(owner, id)?.is_unlocked(now))
    }

    pub fn unlock_time(&self, owner: &Address, id: PositionId) -> Result<Timestamp, LedgerError> {
        Ok(self.position(owner, id)?.unlock_time())
    }

    pub fn next_claim_time(&self, owner: &Address, id: PositionId) -> Result<Timestamp, LedgerError> {
        let interval = self.params.snapshot().claim_interval;
        Ok(self.position(owner, id)?.next_claim_time(interval))
    }

    pub fn custody_balance(&self) -> u128 {
        self.custody.custody_balance()
    }

    /// Custody surplus over staked principal: the ceiling on payable rewards.
    pub fn rewards_available(&self) -> u128 {
        rewards_available(self.custody.custody_balance(), self.total_staked())
    }

    pub fn rewards_remaining_accounted(&self) -> u128 {
        self.state.read().totals.rewards_remaining()
    }

    pub fn reward_stats(&self) -> RewardStats {
        let balance = self.custody.custody_balance();
        let totals = self.state.read().totals;
        RewardStats {
            total_staked: totals.total_staked,
            added: totals.rewards_added,
            distributed: totals.rewards_distributed,
            recovered: totals.rewards_recovered,
            available: rewards_available(balance, totals.total_staked),
            remaining_accounted: totals.rewards_remaining(),
        }
    }

    pub fn boost_status(&self) -> BoostStatus {
        let params = self.params.snapshot();
        let state = self.state.read();
        BoostStatus {
            boosted_owners: state.totals.boosted_owners,
            max_boosted_owners: params.max_boost_stakers,
            window_open: boost_window_open(
                self.clock.now(),
                state.program_start,
                params.boost_duration,
            ),
            window_ends_at: state.program_start.saturating_add(params.boost_duration),
        }
    }

    pub fn position_voting_power(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        let params = self.params.snapshot();
        let p = self.position(owner, id)?;
        Ok(voting_power(p.principal, p.lock_months, params.voting_floor, params.voting_curvature)?)
    }

    /// Voting power summed across every open position of `owner`.
    pub fn owner_voting_power(&self, owner: &Address) -> Result<u128, LedgerError> {
        let params = self.params.snapshot();
        let state = self.state.read();
        let Some(account) = state.account(owner) else {
            return Ok(0);
        };
        account.positions.iter().try_fold(0u128, |acc, p| {
            let power =
                voting_power(p.principal, p.lock_months, params.voting_floor, params.voting_curvature)?;
            Ok(acc.checked_add(power).ok_or(MathError::Overflow)?)
        })
    }

    /// Audit the cross-record accounting invariants.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        self.state.read().check_invariants()
    }

    /// Full state as pretty-printed JSON.
    pub fn export_state(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(&*self.state.read())
            .map_err(|e| LedgerError::CorruptState(e.to_string()))
    }

    /// Replace the full state with a previously exported one.
    ///
    /// The import is rejected unless it passes [`check_invariants`](Self::check_invariants).
    pub fn import_state(&self, json: &str) -> Result<(), LedgerError> {
        let _entered = self.guard.enter()?;
        let imported: LedgerState =
            serde_json::from_str(json).map_err(|e| LedgerError::CorruptState(e.to_string()))?;
        imported.check_invariants()?;
        info!(
            owners = imported.accounts.len(),
            total_staked = imported.totals.total_staked,
            "state imported"
        );
        *self.state.write() = imported;
        Ok(())
    }

    fn with_position<T>(
        &self,
        owner: &Address,
        id: PositionId,
        f: impl FnOnce(&Position, Timestamp, Timestamp) -> Result<T, MathError>,
    ) -> Result<T, LedgerError> {
        let now = self.clock.now();
        let state = self.state.read();
        let position = state.position(owner, id)?;
        Ok(f(position, state.program_start, now)?)
    }
}
