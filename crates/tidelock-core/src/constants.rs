//! Protocol constants. Fixed-point values use [`SCALE`] (10^18) as "1.0".
//!
//! Token amounts are unscaled integer units; only ratios, rates and curve
//! exponents carry the fixed-point scale.

/// Fixed-point scale: the integer representation of 1.0.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Signed counterpart of [`SCALE`] for the kernel's signed domain.
pub const SCALE_I: i128 = SCALE as i128;

/// `SCALE * SCALE`, the denominator of double-scaled products.
pub const SCALE_SQUARED: u128 = SCALE * SCALE;

/// Magnitude beyond which `exp` clamps (0 below, saturation above).
pub const EXP_CLAMP: i128 = 60 * SCALE_I;

/// Arguments with `|x|` above this are halved before the Taylor step.
pub const EXP_REDUCTION_BOUND: i128 = 2 * SCALE_I;

/// Lock-duration ceiling used to normalise the lock factor.
pub const LOCK_FACTOR_CEILING_MONTHS: u32 = 48;

/// Size ratio `S / S0` at which the size factor saturates.
pub const SIZE_RATIO_CAP: u128 = 20;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_WEEK: u64 = 7 * SECONDS_PER_DAY;
/// A lock "month" is a flat 30 days.
pub const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Percentage helper for fixed-point literals: `percent(20)` is 0.20.
pub const fn percent(p: u128) -> u128 {
    p * SCALE / 100
}

/// Per-mille helper for fixed-point literals: `permille(1200)` is 1.2.
pub const fn permille(p: u128) -> u128 {
    p * SCALE / 1_000
}
