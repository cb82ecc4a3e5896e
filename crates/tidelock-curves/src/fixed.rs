//! Fixed-point exponential, logarithm and power at `SCALE = 10^18`.
//!
//! `exp` reduces `|x| > 2.0` with `exp(x) = exp(x/2)^2` and evaluates
//! `1 + x + x²/2 + x³/6 + x⁴/24 + x⁵/120` on the reduced argument. Negative
//! arguments are evaluated as `SCALE² / exp(|x|)`: the polynomial underestimates
//! `exp` for positive inputs and each extra halving raises the result, so the
//! reciprocal keeps the whole curve monotone across reduction boundaries.
//!
//! `ln` truncates `2·atanh(y)` with `y = (a-1)/(a+1)` after the `y⁹/9` term.

use ethnum::U256;
use tidelock_core::constants::{EXP_CLAMP, EXP_REDUCTION_BOUND, SCALE, SCALE_I, SCALE_SQUARED};
use tidelock_core::error::MathError;

/// `floor(a * b / d)` with a 256-bit intermediate product.
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(d);
    let (high, low) = quotient.into_words();
    if high != 0 {
        return Err(MathError::Overflow);
    }
    Ok(low)
}

/// Natural exponential of a signed fixed-point value.
///
/// Returns 0 for `x <= -60.0` and `u128::MAX` for `x >= 60.0`. Results that
/// overflow during squaring also saturate at `u128::MAX`.
pub fn exp(x: i128) -> u128 {
    if x <= -EXP_CLAMP {
        return 0;
    }
    if x >= EXP_CLAMP {
        return u128::MAX;
    }
    if x < 0 {
        // exp_positive(|x|) >= SCALE, so the quotient is at most SCALE.
        return SCALE_SQUARED / exp_positive(-x);
    }
    exp_positive(x)
}

/// `exp(-x)` for an unsigned fixed-point `x`. Returns 0 for `x >= 60.0`.
pub fn exp_neg(x: u128) -> u128 {
    if x >= EXP_CLAMP as u128 {
        return 0;
    }
    exp(-(x as i128))
}

/// `1 - exp(-s / s0)` in fixed point. Returns 0 when either input is 0.
pub fn one_minus_exp_neg(s: u128, s0: u128) -> Result<u128, MathError> {
    if s == 0 || s0 == 0 {
        return Ok(0);
    }
    let ratio = mul_div(s, SCALE, s0)?;
    Ok(SCALE.saturating_sub(exp_neg(ratio)))
}

/// Natural logarithm of a positive fixed-point value; negative below 1.0.
pub fn ln(a: u128) -> Result<i128, MathError> {
    if a == 0 {
        return Err(MathError::LogOfZero);
    }
    let den = a.checked_add(SCALE).ok_or(MathError::Overflow)?;
    // |y| < 1.0 always, so the cast is lossless.
    let y = if a >= SCALE {
        mul_div(a - SCALE, SCALE, den)? as i128
    } else {
        -(mul_div(SCALE - a, SCALE, den)? as i128)
    };

    let y2 = y * y / SCALE_I;
    let mut term = y;
    let mut sum = y;
    for k in [3i128, 5, 7, 9] {
        term = term * y2 / SCALE_I;
        sum += term / k;
    }
    Ok(2 * sum)
}

/// `a^p = exp(ln(a) · p)` for `a > 0` and a signed fixed-point exponent.
///
/// The Taylor step is clamped at zero rather than failing; mathematically the
/// result is positive and only truncation at the domain edge could say otherwise.
pub fn pow(a: u128, p: i128) -> Result<u128, MathError> {
    let log = ln(a)?;
    let arg = log.checked_mul(p).ok_or(MathError::Overflow)? / SCALE_I;
    Ok(exp(arg))
}

/// `exp(x)` for `0 <= x < 60.0`, by halving until `x <= 2.0`.
fn exp_positive(x: i128) -> u128 {
    if x > EXP_REDUCTION_BOUND {
        let half = exp_positive(x / 2);
        return mul_div(half, half, SCALE).unwrap_or(u128::MAX);
    }
    taylor(x)
}

/// Five-term Taylor polynomial of `exp` around 0. Inputs satisfy `|x| <= 2.0`,
/// which keeps every intermediate product below 4e36.
fn taylor(x: i128) -> u128 {
    let mut term = SCALE_I;
    let mut sum = SCALE_I;
    for n in 1..=5i128 {
        term = term * x / SCALE_I / n;
        sum += term;
    }
    u128::try_from(sum).unwrap_or(0)
}
