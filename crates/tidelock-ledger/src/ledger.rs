//! The staking ledger: position lifecycle over a single shared state.
//!
//! Every mutating entry point follows the same shape:
//!
//! 1. enter the reentrancy guard and consult the access gate
//! 2. read a fresh parameter snapshot and the clock
//! 3. mutate state under the write lock, restoring a checkpoint on any error
//! 4. release the lock and move value through custody, restoring the
//!    checkpoint if the transfer fails
//! 5. log and emit the event
//!
//! Reward-bearing fields are cleared in step 3, so a custody callback that
//! queries the ledger during step 4 observes settled state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use tidelock_core::error::{CustodyError, LedgerError, MathError};
use tidelock_core::events::LedgerEvent;
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::traits::{AccessGate, Action, Clock, EventSink, ParameterSource, TokenCustody};
use tidelock_core::types::{Address, PositionId, Timestamp};

use crate::accrual;
use crate::boost;
use crate::events::TracingSink;
use crate::gate::OpenGate;
use crate::guard::{Entered, ReentrancyGuard};
use crate::position::{OwnerAccount, Position};
use crate::state::{Checkpoint, LedgerState, add, rewards_available, sub};

/// Time-locked staking ledger.
pub struct StakingLedger {
    pub(crate) state: RwLock<LedgerState>,
    pub(crate) guard: ReentrancyGuard,
    pub(crate) custody: Arc<dyn TokenCustody>,
    pub(crate) params: Arc<dyn ParameterSource>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) gate: Arc<dyn AccessGate>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl StakingLedger {
    /// Create a ledger whose boost window starts now.
    ///
    /// Defaults to [`OpenGate`] and [`TracingSink`]; see the `with_*` builders.
    pub fn new(
        custody: Arc<dyn TokenCustody>,
        params: Arc<dyn ParameterSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let program_start = clock.now();
        Self {
            state: RwLock::new(LedgerState::new(program_start)),
            guard: ReentrancyGuard::new(),
            custody,
            params,
            clock,
            gate: Arc::new(OpenGate),
            events: Arc::new(TracingSink),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn AccessGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_program_start(self, program_start: Timestamp) -> Self {
        self.state.write().program_start = program_start;
        self
    }

    pub fn program_start(&self) -> Timestamp {
        self.state.read().program_start
    }

    // --- lifecycle ---

    /// Open a new position of `amount` locked for `lock_months`.
    pub fn open(
        &self,
        owner: &Address,
        amount: u128,
        lock_months: u32,
    ) -> Result<PositionId, LedgerError> {
        let _entered = self.begin(owner, Action::Open)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if !params.lock_in_bounds(lock_months) {
            return Err(LedgerError::LockOutOfBounds {
                months: lock_months,
                min: params.min_lock_months,
                max: params.max_lock_months,
            });
        }

        let ((id, boosted, unlock_at), checkpoint) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = state.accounts.entry(*owner).or_default();
            let id = account.mint_id()?;
            let position = Position::new(id, amount, lock_months, now);
            let unlock_at = position.unlock_time();
            account.positions.push(position);
            account.total_principal = add(account.total_principal, amount)?;
            let boosted =
                boost::try_enroll(account, id, &mut state.totals, &params, program_start, now);
            state.totals.total_staked = add(state.totals.total_staked, amount)?;
            Ok((id, boosted, unlock_at))
        })?;

        self.transfer(checkpoint, |custody| custody.transfer_in(owner, amount))?;

        info!(%owner, %id, amount, lock_months, boosted, "position opened");
        self.emit(LedgerEvent::PositionOpened {
            owner: *owner,
            id,
            amount,
            lock_months,
            unlock_at,
            boosted,
        });
        Ok(id)
    }

    /// Add `amount` to an existing position. Settles first; re-runs boost admission.
    pub fn top_up(&self, owner: &Address, id: PositionId, amount: u128) -> Result<u128, LedgerError> {
        let _entered = self.begin(owner, Action::TopUp)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let ((new_principal, boosted), checkpoint) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            accrual::settle(position, &params, program_start, now)?;
            position.principal = add(position.principal, amount)?;
            position.size_snapshot = add(position.size_snapshot, amount)?;
            let new_principal = position.principal;
            account.total_principal = add(account.total_principal, amount)?;
            boost::try_enroll(account, id, &mut state.totals, &params, program_start, now);
            let boosted = account.get(id).is_some_and(|p| p.is_boosted);
            state.totals.total_staked = add(state.totals.total_staked, amount)?;
            Ok((new_principal, boosted))
        })?;

        self.transfer(checkpoint, |custody| custody.transfer_in(owner, amount))?;

        info!(%owner, %id, amount, new_principal, "stake increased");
        self.emit(LedgerEvent::StakeIncreased {
            owner: *owner,
            id,
            amount,
            new_principal,
            boosted,
        });
        Ok(new_principal)
    }

    /// Lengthen a position's lock. The new duration must be strictly longer
    /// and within the maximum.
    pub fn extend_lock(
        &self,
        owner: &Address,
        id: PositionId,
        new_lock_months: u32,
    ) -> Result<Timestamp, LedgerError> {
        let _entered = self.begin(owner, Action::ExtendLock)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        if new_lock_months > params.max_lock_months {
            return Err(LedgerError::LockOutOfBounds {
                months: new_lock_months,
                min: params.min_lock_months,
                max: params.max_lock_months,
            });
        }

        let ((old_months, unlock_at), _) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            if new_lock_months <= position.lock_months {
                return Err(LedgerError::LockNotExtended {
                    current: position.lock_months,
                    requested: new_lock_months,
                });
            }
            accrual::settle(position, &params, program_start, now)?;
            let old_months = position.lock_months;
            position.lock_months = new_lock_months;
            Ok((old_months, position.unlock_time()))
        })?;

        info!(%owner, %id, old_months, new_months = new_lock_months, unlock_at, "lock extended");
        self.emit(LedgerEvent::LockExtended {
            owner: *owner,
            id,
            old_months,
            new_months: new_lock_months,
            unlock_at,
        });
        Ok(unlock_at)
    }

    /// Pay out accrued rewards and award patience points.
    pub fn claim(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        let _entered = self.begin(owner, Action::Claim)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        let balance = self.custody.custody_balance();

        let ((harvest, total_points), checkpoint) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            ensure_claimable(position, &params, now)?;
            accrual::settle(position, &params, program_start, now)?;
            let harvest = accrual::harvest(position, &params, now)?;
            let total_points = position.points;
            ensure_payable(harvest.reward, balance, state.totals.total_staked)?;
            state.totals.rewards_distributed =
                add(state.totals.rewards_distributed, harvest.reward)?;
            Ok((harvest, total_points))
        })?;

        if harvest.reward > 0 {
            self.transfer(checkpoint, |custody| custody.transfer_out(owner, harvest.reward))?;
        }

        info!(%owner, %id, reward = harvest.reward, points = harvest.points_added, "rewards claimed");
        self.emit(LedgerEvent::RewardsClaimed {
            owner: *owner,
            id,
            reward: harvest.reward,
            points_added: harvest.points_added,
            total_points,
        });
        Ok(harvest.reward)
    }

    /// Restake accrued rewards into the position's principal.
    pub fn compound(&self, owner: &Address, id: PositionId) -> Result<u128, LedgerError> {
        let _entered = self.begin(owner, Action::Compound)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        let balance = self.custody.custody_balance();

        let ((harvest, new_principal), _) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            ensure_claimable(position, &params, now)?;
            accrual::settle(position, &params, program_start, now)?;
            let harvest = accrual::harvest(position, &params, now)?;
            if harvest.reward == 0 {
                return Err(LedgerError::NothingToCompound);
            }
            ensure_payable(harvest.reward, balance, state.totals.total_staked)?;
            position.principal = add(position.principal, harvest.reward)?;
            position.size_snapshot = add(position.size_snapshot, harvest.reward)?;
            let new_principal = position.principal;
            account.total_principal = add(account.total_principal, harvest.reward)?;
            state.totals.total_staked = add(state.totals.total_staked, harvest.reward)?;
            state.totals.rewards_distributed =
                add(state.totals.rewards_distributed, harvest.reward)?;
            Ok((harvest, new_principal))
        })?;

        info!(%owner, %id, reward = harvest.reward, new_principal, "rewards compounded");
        self.emit(LedgerEvent::RewardsCompounded {
            owner: *owner,
            id,
            reward: harvest.reward,
            points_added: harvest.points_added,
            new_principal,
        });
        Ok(new_principal)
    }

    /// Close an unlocked position, paying principal plus any claimable rewards.
    ///
    /// Rewards accrued inside an unfinished claim interval are forfeited.
    /// Returns `(principal, reward)`.
    pub fn close(&self, owner: &Address, id: PositionId) -> Result<(u128, u128), LedgerError> {
        let _entered = self.begin(owner, Action::Close)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        let balance = self.custody.custody_balance();

        let ((principal, reward), checkpoint) = self.mutate(Some(owner), |state| {
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            ensure_unlocked(position, now)?;
            accrual::settle(position, &params, program_start, now)?;
            let reward = if position.is_claimable(now, params.claim_interval) {
                accrual::harvest(position, &params, now)?.reward
            } else {
                if position.accrued_rewards > 0 {
                    debug!(%owner, %id, forfeited = position.accrued_rewards, "closing inside claim interval");
                }
                0
            };
            ensure_payable(reward, balance, state.totals.total_staked)?;
            let principal = position.principal;
            account.remove(id);
            account.total_principal = sub(account.total_principal, principal)?;
            state.totals.total_staked = sub(state.totals.total_staked, principal)?;
            state.totals.rewards_distributed = add(state.totals.rewards_distributed, reward)?;
            Ok((principal, reward))
        })?;

        let payout = add(principal, reward)?;
        self.transfer(checkpoint, |custody| custody.transfer_out(owner, payout))?;

        info!(%owner, %id, principal, reward, "position closed");
        self.emit(LedgerEvent::PositionClosed { owner: *owner, id, principal, reward });
        Ok((principal, reward))
    }

    /// Hand an unlocked position's principal and accrued rewards to the
    /// configured successor in a single transfer.
    ///
    /// `target` must be the configured successor. Returns the amount moved.
    pub fn migrate(
        &self,
        owner: &Address,
        id: PositionId,
        target: &Address,
    ) -> Result<u128, LedgerError> {
        let _entered = self.begin(owner, Action::Migrate)?;
        let params = self.snapshot()?;
        let now = self.clock.now();
        let balance = self.custody.custody_balance();

        let ((principal, reward, final_points), checkpoint) = self.mutate(Some(owner), |state| {
            match state.successor {
                None => return Err(LedgerError::NoSuccessor),
                Some(successor) if successor != *target => {
                    return Err(LedgerError::InvalidRecipient(*target));
                }
                Some(_) => {}
            }
            let program_start = state.program_start;
            let account = account_mut(&mut state.accounts, owner, id)?;
            let position = account.position_mut(owner, id)?;
            ensure_unlocked(position, now)?;
            accrual::settle(position, &params, program_start, now)?;
            let reward = position.accrued_rewards;
            let final_points = position
                .points
                .checked_add(accrual::points_for(position, reward, &params, now)?)
                .ok_or(MathError::Overflow)?;
            ensure_payable(reward, balance, state.totals.total_staked)?;
            let principal = position.principal;
            account.remove(id);
            account.total_principal = sub(account.total_principal, principal)?;
            state.totals.total_staked = sub(state.totals.total_staked, principal)?;
            state.totals.rewards_distributed = add(state.totals.rewards_distributed, reward)?;
            Ok((principal, reward, final_points))
        })?;

        let amount = add(principal, reward)?;
        self.transfer(checkpoint, |custody| custody.transfer_out(target, amount))?;

        info!(%owner, %id, %target, principal, reward, final_points, "position migrated");
        self.emit(LedgerEvent::PositionMigrated {
            owner: *owner,
            id,
            target: *target,
            principal,
            reward,
            final_points,
        });
        Ok(amount)
    }

    // --- plumbing shared with the treasury and query modules ---

    pub(crate) fn begin(&self, caller: &Address, action: Action) -> Result<Entered<'_>, LedgerError> {
        let entered = self.guard.enter()?;
        self.gate.check(caller, action)?;
        Ok(entered)
    }

    /// A validated parameter snapshot.
    pub(crate) fn snapshot(&self) -> Result<ParameterSnapshot, LedgerError> {
        let params = self.params.snapshot();
        params.validate().map_err(LedgerError::InvalidParameters)?;
        Ok(params)
    }

    /// Run `f` under the write lock. On error the touched owner account and
    /// the global totals are restored before the lock is released.
    pub(crate) fn mutate<T>(
        &self,
        owner: Option<&Address>,
        f: impl FnOnce(&mut LedgerState) -> Result<T, LedgerError>,
    ) -> Result<(T, Checkpoint), LedgerError> {
        let mut state = self.state.write();
        let checkpoint = state.checkpoint(owner);
        match f(&mut *state) {
            Ok(value) => Ok((value, checkpoint)),
            Err(err) => {
                state.restore(checkpoint);
                Err(err)
            }
        }
    }

    /// Move value through custody with the state lock released; roll back on failure.
    pub(crate) fn transfer(
        &self,
        checkpoint: Checkpoint,
        op: impl FnOnce(&dyn TokenCustody) -> Result<(), CustodyError>,
    ) -> Result<(), LedgerError> {
        if let Err(err) = op(self.custody.as_ref()) {
            warn!(%err, "custody transfer failed, rolling back");
            self.state.write().restore(checkpoint);
            return Err(err.into());
        }
        Ok(())
    }

    pub(crate) fn emit(&self, event: LedgerEvent) {
        self.events.emit(&event);
    }
}

fn account_mut<'a>(
    accounts: &'a mut HashMap<Address, OwnerAccount>,
    owner: &Address,
    id: PositionId,
) -> Result<&'a mut OwnerAccount, LedgerError> {
    accounts
        .get_mut(owner)
        .ok_or(LedgerError::PositionNotFound { owner: *owner, id })
}

fn ensure_claimable(
    position: &Position,
    params: &ParameterSnapshot,
    now: Timestamp,
) -> Result<(), LedgerError> {
    if !position.is_claimable(now, params.claim_interval) {
        return Err(LedgerError::ClaimTooEarly {
            available_at: position.next_claim_time(params.claim_interval),
        });
    }
    Ok(())
}

fn ensure_unlocked(position: &Position, now: Timestamp) -> Result<(), LedgerError> {
    if !position.is_unlocked(now) {
        return Err(LedgerError::StillLocked { unlock_at: position.unlock_time() });
    }
    Ok(())
}

/// Rewards may only come out of custody surplus, never out of staked principal.
fn ensure_payable(reward: u128, custody_balance: u128, total_staked: u128) -> Result<(), LedgerError> {
    let available = rewards_available(custody_balance, total_staked);
    if reward > available {
        return Err(LedgerError::InsufficientSurplus { requested: reward, available });
    }
    Ok(())
}
