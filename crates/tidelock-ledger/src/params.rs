//! Parameter sources.

use parking_lot::RwLock;
use tidelock_core::error::LedgerError;
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::traits::ParameterSource;
use tracing::info;

/// A fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticParams(pub ParameterSnapshot);

impl ParameterSource for StaticParams {
    fn snapshot(&self) -> ParameterSnapshot {
        self.0.clone()
    }
}

/// A snapshot that can be replaced at runtime.
///
/// Replacements apply from the next operation; time already settled keeps
/// the rates it was settled at.
#[derive(Debug, Default)]
pub struct SharedParams {
    current: RwLock<ParameterSnapshot>,
}

impl SharedParams {
    pub fn new(initial: ParameterSnapshot) -> Self {
        Self { current: RwLock::new(initial) }
    }

    /// Install `next` if it validates.
    pub fn update(&self, next: ParameterSnapshot) -> Result<(), LedgerError> {
        next.validate().map_err(LedgerError::InvalidParameters)?;
        info!(base_apr = next.base_apr, max_apr = next.max_apr, "parameters updated");
        *self.current.write() = next;
        Ok(())
    }
}

impl ParameterSource for SharedParams {
    fn snapshot(&self) -> ParameterSnapshot {
        self.current.read().clone()
    }
}
