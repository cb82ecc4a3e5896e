//! In-memory token custody.

use std::collections::HashMap;

use parking_lot::Mutex;
use tidelock_core::error::CustodyError;
use tidelock_core::traits::TokenCustody;
use tidelock_core::types::Address;

/// Balance map with atomic transfers between holders and one custody account.
///
/// Suitable for tests, simulation and embedding; nothing is persisted.
pub struct MemoryCustody {
    account: Address,
    balances: Mutex<HashMap<Address, u128>>,
}

impl MemoryCustody {
    pub fn new(account: Address) -> Self {
        Self { account, balances: Mutex::new(HashMap::new()) }
    }

    /// Credit `amount` to `holder` out of thin air.
    pub fn mint(&self, holder: &Address, amount: u128) {
        let mut balances = self.balances.lock();
        let balance = balances.entry(*holder).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Sum of every balance. Transfers never change it.
    pub fn total_supply(&self) -> u128 {
        self.balances.lock().values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    fn move_funds(&self, from: &Address, to: &Address, amount: u128) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock();
        let have = balances.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(CustodyError::InsufficientBalance { holder: *from, have, need: amount });
        }
        if from == to {
            return Ok(());
        }
        let receiver = balances.get(to).copied().unwrap_or(0);
        let credited = receiver
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Rejected(format!("balance overflow for {to}")))?;
        balances.insert(*from, have - amount);
        balances.insert(*to, credited);
        Ok(())
    }
}

impl TokenCustody for MemoryCustody {
    fn transfer_in(&self, from: &Address, amount: u128) -> Result<(), CustodyError> {
        self.move_funds(from, &self.account, amount)
    }

    fn transfer_out(&self, to: &Address, amount: u128) -> Result<(), CustodyError> {
        self.move_funds(&self.account, to, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.lock().get(holder).copied().unwrap_or(0)
    }

    fn custody_account(&self) -> Address {
        self.account
    }
}
