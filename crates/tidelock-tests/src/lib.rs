//! Adversarial and scenario test suite for Tidelock.
//!
//! The integration tests under `tests/` drive a full [`StakingLedger`]
//! against in-memory collaborators and check accounting invariants under
//! randomized operation sequences, reentrant custody and treasury abuse.
//!
//! [`StakingLedger`]: tidelock_ledger::StakingLedger

pub mod helpers;
