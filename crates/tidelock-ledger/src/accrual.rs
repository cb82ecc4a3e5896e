//! Reward accrual and settlement for a single position.
//!
//! `settle` folds elapsed time into `accrued_rewards` and advances only the
//! accrual watermark. `harvest` turns the accrued balance into a payout plus
//! patience points and resets every watermark. Read-only projections run the
//! same formulas without touching the record.

use tidelock_core::constants::SECONDS_PER_WEEK;
use tidelock_core::error::{LedgerError, MathError};
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::types::Timestamp;
use tidelock_curves::{linear_reward, points_accrued, position_apr, rate_window};
use tracing::debug;

use crate::position::Position;

/// Result of harvesting a position's accrued rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Harvest {
    pub reward: u128,
    pub points_added: u128,
}

/// APR the position earns at `now`.
pub fn current_apr(
    position: &Position,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> Result<u128, MathError> {
    let window = rate_window(
        now,
        program_start,
        params.boost_duration,
        position.is_boosted,
        params,
    );
    position_apr(params, window, position.lock_months, position.size_snapshot)
}

/// Reward earned since the accrual watermark, without mutating anything.
pub fn unsettled(
    position: &Position,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> Result<u128, MathError> {
    let elapsed = now.saturating_sub(position.last_accrual);
    if elapsed == 0 {
        return Ok(0);
    }
    let apr = current_apr(position, params, program_start, now)?;
    linear_reward(position.principal, apr, elapsed)
}

/// Fold elapsed time into `accrued_rewards`. Zero elapsed is a no-op.
///
/// Returns the amount added.
pub fn settle(
    position: &mut Position,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> Result<u128, LedgerError> {
    let earned = unsettled(position, params, program_start, now)?;
    position.accrued_rewards = position
        .accrued_rewards
        .checked_add(earned)
        .ok_or(MathError::Overflow)?;
    if now > position.last_accrual {
        debug!(
            id = %position.id,
            earned,
            elapsed = now - position.last_accrual,
            "settled accrual"
        );
        position.last_accrual = now;
    }
    Ok(earned)
}

/// Whole weeks since the points checkpoint, floored.
pub fn weeks_since(checkpoint: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(checkpoint) / SECONDS_PER_WEEK
}

/// Points `reward` would earn if harvested at `now`.
pub fn points_for(
    position: &Position,
    reward: u128,
    params: &ParameterSnapshot,
    now: Timestamp,
) -> Result<u128, MathError> {
    points_accrued(
        reward,
        weeks_since(position.points_checkpoint, now),
        params.points_max,
        params.points_decay,
    )
}

/// Take the settled rewards, award points and restart every watermark at `now`.
///
/// Callers settle first.
pub fn harvest(
    position: &mut Position,
    params: &ParameterSnapshot,
    now: Timestamp,
) -> Result<Harvest, LedgerError> {
    let reward = position.accrued_rewards;
    let points_added = points_for(position, reward, params, now)?;
    position.points = position
        .points
        .checked_add(points_added)
        .ok_or(MathError::Overflow)?;
    position.accrued_rewards = 0;
    position.last_claim = now;
    position.last_accrual = now;
    position.points_checkpoint = now;
    Ok(Harvest { reward, points_added })
}

/// Settled plus unsettled rewards at `now`.
pub fn pending_reward(
    position: &Position,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> Result<u128, MathError> {
    let fresh = unsettled(position, params, program_start, now)?;
    position
        .accrued_rewards
        .checked_add(fresh)
        .ok_or(MathError::Overflow)
}

/// Points balance the position would hold after a harvest at `now`.
pub fn projected_points(
    position: &Position,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> Result<u128, MathError> {
    let pending = pending_reward(position, params, program_start, now)?;
    let extra = points_for(position, pending, params, now)?;
    position.points.checked_add(extra).ok_or(MathError::Overflow)
}
