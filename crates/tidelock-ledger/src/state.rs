//! Ledger state: owner accounts, global counters and rollback checkpoints.
//!
//! A single [`LedgerState`] holds every counter. The ledger keeps it behind
//! one `RwLock`; nothing here is global or static.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tidelock_core::error::{LedgerError, MathError};
use tidelock_core::types::{Address, PositionId, Timestamp};

use crate::position::{OwnerAccount, Position};

/// Global reward and stake counters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalTotals {
    /// Sum of every open principal.
    pub total_staked: u128,
    /// Funding pulled in by `fund` plus amounts acknowledged by `notify`.
    pub rewards_added: u128,
    /// Rewards paid out, compounded or migrated.
    pub rewards_distributed: u128,
    /// Surplus recovered by the treasury.
    pub rewards_recovered: u128,
    /// Distinct owners holding a boost cohort slot.
    pub boosted_owners: u64,
}

impl GlobalTotals {
    /// `added - distributed - recovered`, floored at zero.
    ///
    /// May drift from custody; [`rewards_available`] is authoritative.
    pub fn rewards_remaining(&self) -> u128 {
        self.rewards_added
            .saturating_sub(self.rewards_distributed)
            .saturating_sub(self.rewards_recovered)
    }
}

/// Surplus of custody over staked principal: the ceiling on payable rewards.
pub fn rewards_available(custody_balance: u128, total_staked: u128) -> u128 {
    custody_balance.saturating_sub(total_staked)
}

pub(crate) fn add(a: u128, b: u128) -> Result<u128, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Math(MathError::Overflow))
}

pub(crate) fn sub(a: u128, b: u128) -> Result<u128, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::CounterUnderflow { have: a, take: b })
}

/// Every mutable value the ledger owns.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub accounts: HashMap<Address, OwnerAccount>,
    pub totals: GlobalTotals,
    /// Designated migration target, if any.
    pub successor: Option<Address>,
    /// Start of the boost window.
    pub program_start: Timestamp,
}

/// Pre-mutation copy of the parts of the state one operation may touch.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    owner: Option<(Address, Option<OwnerAccount>)>,
    totals: GlobalTotals,
}

impl LedgerState {
    pub fn new(program_start: Timestamp) -> Self {
        Self { program_start, ..Self::default() }
    }

    pub fn account(&self, owner: &Address) -> Option<&OwnerAccount> {
        self.accounts.get(owner)
    }

    pub fn position(&self, owner: &Address, id: PositionId) -> Result<&Position, LedgerError> {
        self.accounts
            .get(owner)
            .and_then(|account| account.get(id))
            .ok_or(LedgerError::PositionNotFound { owner: *owner, id })
    }

    pub fn checkpoint(&self, owner: Option<&Address>) -> Checkpoint {
        Checkpoint {
            owner: owner.map(|o| (*o, self.accounts.get(o).cloned())),
            totals: self.totals,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        if let Some((owner, saved)) = checkpoint.owner {
            match saved {
                Some(account) => {
                    self.accounts.insert(owner, account);
                }
                None => {
                    self.accounts.remove(&owner);
                }
            }
        }
        self.totals = checkpoint.totals;
    }

    /// Verify the cross-record accounting invariants.
    ///
    /// - `total_staked` equals the sum of owner totals, and each owner total
    ///   equals the sum of that owner's principals
    /// - every open position has non-zero principal and an id below the
    ///   owner's counter, with no duplicates
    /// - the cohort counter equals the number of owners holding a slot, and
    ///   every boosted position belongs to such an owner
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        let mut staked: u128 = 0;
        let mut cohort: u64 = 0;

        for (owner, account) in &self.accounts {
            let mut owner_sum: u128 = 0;
            let mut seen = Vec::with_capacity(account.positions.len());
            for position in &account.positions {
                if position.principal == 0 {
                    return Err(corrupt(format!("{owner} position {} has zero principal", position.id)));
                }
                if position.id.0 >= account.next_id || seen.contains(&position.id) {
                    return Err(corrupt(format!("{owner} position {} has an invalid id", position.id)));
                }
                if position.is_boosted && !account.has_boosted {
                    return Err(corrupt(format!("{owner} holds a boosted position without a slot")));
                }
                seen.push(position.id);
                owner_sum = add(owner_sum, position.principal)?;
            }
            if owner_sum != account.total_principal {
                return Err(corrupt(format!(
                    "{owner} total {} != position sum {owner_sum}",
                    account.total_principal
                )));
            }
            staked = add(staked, owner_sum)?;
            if account.has_boosted {
                cohort += 1;
            }
        }

        if staked != self.totals.total_staked {
            return Err(corrupt(format!(
                "total staked {} != owner sum {staked}",
                self.totals.total_staked
            )));
        }
        if cohort != self.totals.boosted_owners {
            return Err(corrupt(format!(
                "boosted owners {} != accounts with a slot {cohort}",
                self.totals.boosted_owners
            )));
        }
        Ok(())
    }
}

fn corrupt(message: String) -> LedgerError {
    LedgerError::CorruptState(message)
}
