//! Shared fixtures for the integration tests.

use std::sync::Arc;

use tidelock_core::params::ParameterSnapshot;
use tidelock_core::traits::TokenCustody;
use tidelock_core::types::{Address, Timestamp};
use tidelock_ledger::{EventLog, ManualClock, MemoryCustody, StakingLedger, StaticParams, TreasuryGate};

/// Fixed program start used by every fixture.
pub const START: Timestamp = 1_700_000_000;

/// Tokens minted to each user address.
pub const USER_BALANCE: u128 = 100_000_000;

/// Deterministic address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_seed(seed)
}

pub fn treasury() -> Address {
    addr(0xee)
}

pub fn custody_account() -> Address {
    addr(0xcc)
}

/// Reference parameters with the boost cohort disabled, so every position
/// earns the standard window.
pub fn standard_params() -> ParameterSnapshot {
    ParameterSnapshot { max_boost_stakers: 0, ..ParameterSnapshot::default() }
}

/// A ledger wired to in-memory collaborators.
pub struct Fixture {
    pub ledger: Arc<StakingLedger>,
    pub custody: Arc<MemoryCustody>,
    pub clock: Arc<ManualClock>,
    pub gate: Arc<TreasuryGate>,
    pub log: Arc<EventLog>,
}

impl Fixture {
    /// Ledger with `users` funded addresses (seeds `1..=users`) and
    /// `funding` reward tokens already pulled from the treasury.
    pub fn new(params: ParameterSnapshot, users: u8, funding: u128) -> Self {
        let custody = Arc::new(MemoryCustody::new(custody_account()));
        for seed in 1..=users {
            custody.mint(&addr(seed), USER_BALANCE);
        }
        custody.mint(&treasury(), funding);
        Self::with_custody(params, custody, funding)
    }

    pub fn with_custody(params: ParameterSnapshot, custody: Arc<MemoryCustody>, funding: u128) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let gate = Arc::new(TreasuryGate::new(treasury()));
        let log = Arc::new(EventLog::new());
        let ledger = Arc::new(
            StakingLedger::new(custody.clone(), Arc::new(StaticParams(params)), clock.clone())
                .with_gate(gate.clone())
                .with_events(log.clone()),
        );
        if funding > 0 {
            ledger.fund(&treasury(), funding).expect("funding");
        }
        log.take();
        Self { ledger, custody, clock, gate, log }
    }

    /// Custody holds at least the staked principal.
    pub fn is_solvent(&self) -> bool {
        self.custody.custody_balance() >= self.ledger.total_staked()
    }
}
