//! Trait interfaces for the ledger's external collaborators.
//!
//! - [`TokenCustody`]: value transfer and balance queries
//! - [`ParameterSource`]: read-only parameter snapshots
//! - [`Clock`]: the current timestamp
//! - [`AccessGate`]: authorization and pause gating
//! - [`EventSink`]: audit event consumer
//!
//! The ledger crate ships in-memory implementations of each for tests,
//! simulation and embedding.

use crate::error::{AccessError, CustodyError};
use crate::events::LedgerEvent;
use crate::params::ParameterSnapshot;
use crate::types::{Address, Timestamp};

/// Token custody holding staked principal and reward funding.
///
/// All amounts are unscaled token units. Transfers are atomic: a failed
/// transfer must not move any value.
pub trait TokenCustody: Send + Sync {
    /// Pull `amount` from `from` into the ledger's custody account.
    fn transfer_in(&self, from: &Address, amount: u128) -> Result<(), CustodyError>;

    /// Push `amount` from the ledger's custody account to `to`.
    fn transfer_out(&self, to: &Address, amount: u128) -> Result<(), CustodyError>;

    /// Balance held by `holder`.
    fn balance_of(&self, holder: &Address) -> u128;

    /// The account the ledger's own funds live in.
    fn custody_account(&self) -> Address;

    /// Balance of the ledger's custody account.
    ///
    /// Default implementation: `balance_of(custody_account())`.
    fn custody_balance(&self) -> u128 {
        self.balance_of(&self.custody_account())
    }
}

/// Source of parameter snapshots. Read once per operation.
pub trait ParameterSource: Send + Sync {
    fn snapshot(&self) -> ParameterSnapshot;
}

/// Source of the current time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Ledger actions subject to the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Open,
    TopUp,
    ExtendLock,
    Claim,
    Compound,
    Close,
    Migrate,
    Fund,
    Notify,
    Recover,
    SetSuccessor,
}

impl Action {
    /// Treasury-only actions.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Fund | Self::Notify | Self::Recover | Self::SetSuccessor)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::TopUp => "top up",
            Self::ExtendLock => "extend lock",
            Self::Claim => "claim",
            Self::Compound => "compound",
            Self::Close => "close",
            Self::Migrate => "migrate",
            Self::Fund => "fund",
            Self::Notify => "notify",
            Self::Recover => "recover",
            Self::SetSuccessor => "set successor",
        }
    }
}

/// Authorization and pause gate consulted before any core logic runs.
pub trait AccessGate: Send + Sync {
    fn check(&self, caller: &Address, action: Action) -> Result<(), AccessError>;
}

/// Consumer of audit events. Called only after an operation has committed.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}
