//! Error types for the Tidelock ledger.
use thiserror::Error;

use crate::types::{Address, PositionId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("logarithm of zero")] LogOfZero,
    #[error("arithmetic overflow")] Overflow,
    #[error("division by zero")] DivisionByZero,
    #[error("max APR {max} below base APR {base}")] InvertedAprWindow { base: u128, max: u128 },
    #[error("curve weights sum {sum} exceeds 1.0")] WeightsExceedScale { sum: u128 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("insufficient balance for {holder}: have {have}, need {need}")] InsufficientBalance { holder: Address, have: u128, need: u128 },
    #[error("transfer rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("{caller} may not {action}")] Unauthorized { caller: Address, action: &'static str },
    #[error("ledger is paused")] Paused,
}

/// Caller-facing error classes. Every class aborts the whole call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Timing,
    State,
    Accounting,
    Authorization,
    Arithmetic,
    Custody,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")] ZeroAmount,
    #[error("lock of {months} months outside [{min}, {max}]")] LockOutOfBounds { months: u32, min: u32, max: u32 },
    #[error("lock extension must exceed {current} months, got {requested}")] LockNotExtended { current: u32, requested: u32 },
    #[error("position {id} not found for {owner}")] PositionNotFound { owner: Address, id: PositionId },
    #[error("claim not available until {available_at}")] ClaimTooEarly { available_at: u64 },
    #[error("position locked until {unlock_at}")] StillLocked { unlock_at: u64 },
    #[error("no rewards to compound")] NothingToCompound,
    #[error("no successor ledger configured")] NoSuccessor,
    #[error("reentrant call rejected")] Reentrancy,
    #[error("payout of {requested} exceeds available surplus {available}")] InsufficientSurplus { requested: u128, available: u128 },
    #[error("notify would account {accounted} against custody balance {custody}")] NotifyExceedsCustody { accounted: u128, custody: u128 },
    #[error("invalid recipient: {0}")] InvalidRecipient(Address),
    #[error("invalid parameters: {0}")] InvalidParameters(String),
    #[error("corrupt ledger state: {0}")] CorruptState(String),
    #[error("counter underflow: {have} - {take}")] CounterUnderflow { have: u128, take: u128 },
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Custody(#[from] CustodyError),
    #[error(transparent)] Access(#[from] AccessError),
}

impl LedgerError {
    /// Classify the error for audit consumers and batch orchestrators.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::LockOutOfBounds { .. }
            | Self::LockNotExtended { .. }
            | Self::PositionNotFound { .. }
            | Self::InvalidParameters(_)
            | Self::CorruptState(_) => ErrorKind::Validation,
            Self::ClaimTooEarly { .. } | Self::StillLocked { .. } => ErrorKind::Timing,
            Self::NothingToCompound
            | Self::NoSuccessor
            | Self::Reentrancy
            | Self::CounterUnderflow { .. } => ErrorKind::State,
            Self::InsufficientSurplus { .. }
            | Self::NotifyExceedsCustody { .. }
            | Self::InvalidRecipient(_) => ErrorKind::Accounting,
            Self::Access(_) => ErrorKind::Authorization,
            Self::Math(_) => ErrorKind::Arithmetic,
            Self::Custody(_) => ErrorKind::Custody,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(LedgerError::ZeroAmount.kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::ClaimTooEarly { available_at: 1 }.kind(), ErrorKind::Timing);
        assert_eq!(LedgerError::NoSuccessor.kind(), ErrorKind::State);
        assert_eq!(
            LedgerError::InvalidRecipient(Address::ZERO).kind(),
            ErrorKind::Accounting
        );
        assert_eq!(LedgerError::from(AccessError::Paused).kind(), ErrorKind::Authorization);
        assert_eq!(LedgerError::from(MathError::Overflow).kind(), ErrorKind::Arithmetic);
    }

    #[test]
    fn display_is_informative() {
        let err = LedgerError::InsufficientSurplus { requested: 10, available: 3 };
        assert_eq!(err.to_string(), "payout of 10 exceeds available surplus 3");
        let err = LedgerError::from(MathError::LogOfZero);
        assert_eq!(err.to_string(), "logarithm of zero");
    }

    #[test]
    fn underflow_is_a_state_error() {
        let err = LedgerError::CounterUnderflow { have: 5, take: 9 };
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.to_string(), "counter underflow: 5 - 9");
        let err = LedgerError::CorruptState("total staked 1 != owner sum 0".into());
        assert!(!err.to_string().contains("import"));
    }
}
