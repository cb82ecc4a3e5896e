//! Reward funding, notification, surplus recovery and successor management.
//!
//! All four operations are privileged: the access gate decides who may call them.

use tracing::{info, warn};

use tidelock_core::error::LedgerError;
use tidelock_core::events::LedgerEvent;
use tidelock_core::traits::Action;
use tidelock_core::types::Address;

use crate::ledger::StakingLedger;
use crate::state::{add, rewards_available};

impl StakingLedger {
    /// Pull `amount` of reward funding from `caller`.
    pub fn fund(&self, caller: &Address, amount: u128) -> Result<(), LedgerError> {
        let _entered = self.begin(caller, Action::Fund)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let ((), checkpoint) = self.mutate(None, |state| {
            state.totals.rewards_added = add(state.totals.rewards_added, amount)?;
            Ok(())
        })?;
        self.transfer(checkpoint, |custody| custody.transfer_in(caller, amount))?;

        info!(from = %caller, amount, "rewards funded");
        self.emit(LedgerEvent::FundingAdded { from: *caller, amount });
        Ok(())
    }

    /// Acknowledge `amount` of rewards already sent to custody out of band.
    ///
    /// Rejected if the accounted total would exceed what custody actually holds.
    pub fn notify(&self, caller: &Address, amount: u128) -> Result<(), LedgerError> {
        let _entered = self.begin(caller, Action::Notify)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let custody = self.custody.custody_balance();
        self.mutate(None, |state| {
            let totals = &mut state.totals;
            let accounted = add(add(totals.total_staked, totals.rewards_added)?, amount)?
                .saturating_sub(totals.rewards_distributed)
                .saturating_sub(totals.rewards_recovered);
            if accounted > custody {
                warn!(amount, accounted, custody, "notify exceeds custody balance");
                return Err(LedgerError::NotifyExceedsCustody { accounted, custody });
            }
            totals.rewards_added = add(totals.rewards_added, amount)?;
            Ok(())
        })?;

        info!(amount, "rewards notified");
        self.emit(LedgerEvent::RewardsNotified { amount });
        Ok(())
    }

    /// Send up to the unstaked surplus of custody to `to`.
    pub fn recover(&self, caller: &Address, amount: u128, to: &Address) -> Result<(), LedgerError> {
        let _entered = self.begin(caller, Action::Recover)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_zero() || *to == self.custody.custody_account() {
            return Err(LedgerError::InvalidRecipient(*to));
        }
        let balance = self.custody.custody_balance();
        let ((), checkpoint) = self.mutate(None, |state| {
            let available = rewards_available(balance, state.totals.total_staked);
            if amount > available {
                warn!(amount, available, "recovery exceeds surplus");
                return Err(LedgerError::InsufficientSurplus { requested: amount, available });
            }
            state.totals.rewards_recovered = add(state.totals.rewards_recovered, amount)?;
            Ok(())
        })?;
        self.transfer(checkpoint, |custody| custody.transfer_out(to, amount))?;

        info!(%to, amount, "surplus recovered");
        self.emit(LedgerEvent::FundingRecovered { to: *to, amount });
        Ok(())
    }

    /// Designate the migration target. The zero address clears it.
    pub fn set_successor(&self, caller: &Address, target: Address) -> Result<(), LedgerError> {
        let _entered = self.begin(caller, Action::SetSuccessor)?;
        if target == self.custody.custody_account() {
            return Err(LedgerError::InvalidRecipient(target));
        }
        let successor = (!target.is_zero()).then_some(target);
        self.mutate(None, |state| {
            state.successor = successor;
            Ok(())
        })?;

        match successor {
            Some(next) => info!(successor = %next, "successor set"),
            None => info!("successor cleared"),
        }
        self.emit(LedgerEvent::NextSuccessorSet { successor });
        Ok(())
    }
}
