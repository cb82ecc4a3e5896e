//! APR window selection.
//!
//! A boosted position earns the boosted `(base, max)` pair only while the
//! boost period that started at program launch is still running. Everything
//! else earns the standard pair. Selection is a pure function of time and
//! the position's sticky flag.

use tidelock_core::error::MathError;
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::types::Timestamp;

use crate::curves::{apr_blend, lock_factor, size_factor};

/// The `(base, max)` APR pair a position's blend interpolates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AprWindow {
    pub base: u128,
    pub max: u128,
}

impl AprWindow {
    pub fn standard(params: &ParameterSnapshot) -> Self {
        Self { base: params.base_apr, max: params.max_apr }
    }

    pub fn boosted(params: &ParameterSnapshot) -> Self {
        Self { base: params.base_apr_boost, max: params.max_apr_boost }
    }
}

/// Whether `now` falls inside `[program_start, program_start + duration)`.
pub fn boost_window_open(now: Timestamp, program_start: Timestamp, duration: u64) -> bool {
    now < program_start.saturating_add(duration)
}

/// Select the APR window for a position at `now`.
pub fn rate_window(
    now: Timestamp,
    program_start: Timestamp,
    boost_duration: u64,
    is_boosted: bool,
    params: &ParameterSnapshot,
) -> AprWindow {
    if is_boosted && boost_window_open(now, program_start, boost_duration) {
        AprWindow::boosted(params)
    } else {
        AprWindow::standard(params)
    }
}

/// Blended APR for a position with the given lock and size inside `window`.
pub fn position_apr(
    params: &ParameterSnapshot,
    window: AprWindow,
    lock_months: u32,
    size: u128,
) -> Result<u128, MathError> {
    let f_lock = lock_factor(lock_months, params.lock_curvature)?;
    let f_size = size_factor(size, params.size_scale)?;
    apr_blend(window.base, window.max, params.w_lock, params.w_size, f_lock, f_size)
}
