//! Projections for a hypothetical position.

use std::fmt;

use anyhow::{Context, Result, bail};
use tidelock_core::constants::{SCALE, SECONDS_PER_DAY};
use tidelock_core::params::ParameterSnapshot;
use tidelock_curves::{AprWindow, linear_reward, points_accrued, position_apr, voting_power};

/// What a position of `principal` locked for `lock_months` would earn over `days`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub principal: u128,
    pub lock_months: u32,
    pub days: u64,
    pub weeks: u64,
    pub apr: u128,
    pub voting_power: u128,
    pub reward: u128,
    /// Points for claiming `reward` after `weeks` whole weeks. Reward units, not a ratio.
    pub points: u128,
}

pub fn quote(
    params: &ParameterSnapshot,
    amount: u128,
    lock_months: u32,
    days: u64,
    boosted: bool,
) -> Result<Quote> {
    if amount == 0 {
        bail!("amount must be non-zero");
    }
    if !params.lock_in_bounds(lock_months) {
        bail!(
            "lock of {lock_months} months outside [{}, {}]",
            params.min_lock_months,
            params.max_lock_months
        );
    }
    let elapsed = days.checked_mul(SECONDS_PER_DAY).context("holding period too long")?;
    let apr = position_apr(params, select_window(params, boosted), lock_months, amount)?;
    let reward = linear_reward(amount, apr, elapsed)?;
    let weeks = days / 7;
    Ok(Quote {
        principal: amount,
        lock_months,
        days,
        weeks,
        apr,
        voting_power: voting_power(amount, lock_months, params.voting_floor, params.voting_curvature)?,
        reward,
        points: points_accrued(reward, weeks, params.points_max, params.points_decay)?,
    })
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== QUOTE ===")?;
        writeln!(f, "Principal:     {}", self.principal)?;
        writeln!(f, "Lock:          {} months", self.lock_months)?;
        writeln!(f, "APR:           {}", pct(self.apr))?;
        writeln!(f, "Voting power:  {}", self.voting_power)?;
        writeln!(f, "Reward ({} d): {}", self.days, self.reward)?;
        write!(f, "Points ({} w): {}", self.weeks, self.points)
    }
}

pub fn select_window(params: &ParameterSnapshot, boosted: bool) -> AprWindow {
    if boosted { AprWindow::boosted(params) } else { AprWindow::standard(params) }
}

/// Fixed-point ratio as a percentage for display.
pub fn pct(value: u128) -> String {
    format!("{:.4}%", value as f64 / SCALE as f64 * 100.0)
}
