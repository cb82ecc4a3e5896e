//! # tidelock-ledger: Position ledger and treasury accounting.
//!
//! [`StakingLedger`] owns every position and global counter behind one
//! `RwLock`. Lifecycle operations (open, top up, extend, claim, compound,
//! close, migrate) and treasury operations (fund, notify, recover, set
//! successor) are atomic: any failure, including a failed custody transfer,
//! leaves state untouched.
//!
//! External collaborators are trait objects from `tidelock-core`. This crate
//! ships in-memory implementations of each for tests, simulation and
//! embedding: [`MemoryCustody`], [`ManualClock`]/[`SystemClock`],
//! [`StaticParams`]/[`SharedParams`], [`OpenGate`]/[`TreasuryGate`] and
//! [`EventLog`]/[`TracingSink`].

pub mod accrual;
pub mod boost;
pub mod clock;
pub mod config;
pub mod custody;
pub mod events;
pub mod gate;
pub mod guard;
pub mod ledger;
pub mod params;
pub mod position;
pub mod queries;
pub mod state;
pub mod treasury;

pub use clock::{ManualClock, SystemClock};
pub use crate::config::{ConfigError, LedgerConfig};
pub use custody::MemoryCustody;
pub use events::{EventLog, TracingSink};
pub use gate::{OpenGate, TreasuryGate};
pub use ledger::StakingLedger;
pub use params::{SharedParams, StaticParams};
pub use position::{OwnerAccount, Position};
pub use queries::{BoostStatus, RewardStats};
pub use state::{GlobalTotals, LedgerState};
