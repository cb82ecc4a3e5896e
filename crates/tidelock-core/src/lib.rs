//! # tidelock-core
//! Foundation types and traits for the Tidelock staking ledger.
//!
//! Everything here is shared by the curve engine (`tidelock-curves`) and the
//! ledger (`tidelock-ledger`): fixed-point constants, the error taxonomy,
//! owner and position identifiers, the parameter snapshot, audit events, and
//! the traits through which the ledger talks to its external collaborators.

pub mod constants;
pub mod error;
pub mod events;
pub mod params;
pub mod traits;
pub mod types;
