//! APR, patience-points and voting curves built on the fixed-point kernel.
//!
//! Every function is pure. Factors are fixed-point values in `[0, 1.0]`;
//! amounts are token units.

use tidelock_core::constants::{
    LOCK_FACTOR_CEILING_MONTHS, SCALE, SCALE_SQUARED, SECONDS_PER_YEAR, SIZE_RATIO_CAP,
};
use tidelock_core::error::MathError;

use crate::fixed::{exp_neg, mul_div, one_minus_exp_neg, pow};

/// Curvature-adjusted lock commitment: `(min(months, 48) / 48) ^ exponent`.
///
/// Returns 0 for a zero lock. With exponent 1.0 the ceiling maps to exactly 1.0.
pub fn lock_factor(lock_months: u32, exponent: u128) -> Result<u128, MathError> {
    if lock_months == 0 {
        return Ok(0);
    }
    let months = lock_months.min(LOCK_FACTOR_CEILING_MONTHS) as u128;
    let base = mul_div(months, SCALE, LOCK_FACTOR_CEILING_MONTHS as u128)?;
    let exponent = i128::try_from(exponent).map_err(|_| MathError::Overflow)?;
    pow(base, exponent)
}

/// Saturating stake-size factor `1 - exp(-S/S0)`.
///
/// Once `S/S0` reaches 20 the factor is pinned to `SCALE - 1` instead of
/// evaluating the kernel far outside its accurate range.
pub fn size_factor(size: u128, size_scale: u128) -> Result<u128, MathError> {
    if size == 0 {
        return Ok(0);
    }
    if size_scale == 0 {
        return Err(MathError::DivisionByZero);
    }
    if size >= size_scale.saturating_mul(SIZE_RATIO_CAP) {
        return Ok(SCALE - 1);
    }
    one_minus_exp_neg(size, size_scale)
}

/// Interpolate between `base_apr` and `max_apr` by the blended boost
/// `B = w_lock·f_lock + w_size·f_size`.
///
/// # Errors
///
/// - [`MathError::InvertedAprWindow`] if `max_apr < base_apr`
/// - [`MathError::WeightsExceedScale`] if `w_lock + w_size > 1.0`
pub fn apr_blend(
    base_apr: u128,
    max_apr: u128,
    w_lock: u128,
    w_size: u128,
    f_lock: u128,
    f_size: u128,
) -> Result<u128, MathError> {
    if max_apr < base_apr {
        return Err(MathError::InvertedAprWindow { base: base_apr, max: max_apr });
    }
    let weights = w_lock.checked_add(w_size).ok_or(MathError::Overflow)?;
    if weights > SCALE {
        return Err(MathError::WeightsExceedScale { sum: weights });
    }

    let blend = mul_div(w_lock, f_lock, SCALE)?
        .checked_add(mul_div(w_size, f_size, SCALE)?)
        .ok_or(MathError::Overflow)?;
    let spread = mul_div(max_apr - base_apr, blend, SCALE)?;
    base_apr.checked_add(spread).ok_or(MathError::Overflow)
}

/// Patience points earned by `reward` held for `weeks_elapsed` whole weeks:
/// `reward · Pmax · (1 - exp(-k·weeks)) / SCALE²`.
///
/// The two scale factors are removed by one final division; dividing after
/// each multiplication loses the low digits of small rewards.
pub fn points_accrued(
    reward: u128,
    weeks_elapsed: u64,
    points_max: u128,
    decay_rate: u128,
) -> Result<u128, MathError> {
    if reward == 0 || weeks_elapsed == 0 {
        return Ok(0);
    }
    let arg = decay_rate
        .checked_mul(weeks_elapsed as u128)
        .ok_or(MathError::Overflow)?;
    let maturity = SCALE - exp_neg(arg);
    let factor = points_max.checked_mul(maturity).ok_or(MathError::Overflow)?;
    mul_div(reward, factor, SCALE_SQUARED)
}

/// Governance weight: `principal · (b + (1 - b)·lock_factor(months, gamma))`.
pub fn voting_power(
    principal: u128,
    lock_months: u32,
    floor: u128,
    curvature: u128,
) -> Result<u128, MathError> {
    if principal == 0 {
        return Ok(0);
    }
    let commitment = lock_factor(lock_months, curvature)?;
    let lift = mul_div(SCALE.saturating_sub(floor), commitment, SCALE)?;
    let weight = floor.min(SCALE).checked_add(lift).ok_or(MathError::Overflow)?;
    mul_div(principal, weight, SCALE)
}

/// Simple-interest reward: `principal · apr · elapsed / (SCALE · year)`.
pub fn linear_reward(principal: u128, apr: u128, elapsed_secs: u64) -> Result<u128, MathError> {
    if principal == 0 || apr == 0 || elapsed_secs == 0 {
        return Ok(0);
    }
    let rate_time = apr
        .checked_mul(elapsed_secs as u128)
        .ok_or(MathError::Overflow)?;
    mul_div(principal, rate_time, SCALE * SECONDS_PER_YEAR as u128)
}
