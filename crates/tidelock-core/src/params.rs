//! Read-only parameter snapshot consumed by the curve models and the ledger.
//!
//! The ledger asks its [`ParameterSource`](crate::traits::ParameterSource) for
//! a fresh snapshot at the start of every operation. A parameter change
//! therefore only affects time elapsed after the next settlement.

use serde::{Deserialize, Serialize};

use crate::constants::{SCALE, SECONDS_PER_DAY, percent, permille};

/// Every value the formulas read. Ratios and exponents are fixed-point
/// ([`SCALE`] = 1.0); amounts are token units; durations are seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ParameterSnapshot {
    /// Standard APR floor.
    pub base_apr: u128,
    /// Standard APR ceiling.
    pub max_apr: u128,
    /// APR floor while a boosted position is inside the boost window.
    pub base_apr_boost: u128,
    /// APR ceiling while a boosted position is inside the boost window.
    pub max_apr_boost: u128,
    /// Weight of the lock factor in the APR blend.
    pub w_lock: u128,
    /// Weight of the size factor in the APR blend.
    pub w_size: u128,
    /// Lock curvature exponent (delta).
    pub lock_curvature: u128,
    /// Reference stake size S0, in token units.
    pub size_scale: u128,
    /// Voting floor b: share of principal that votes regardless of lock.
    pub voting_floor: u128,
    /// Voting curvature exponent (gamma).
    pub voting_curvature: u128,
    /// Points per reward unit at full maturity (Pmax).
    pub points_max: u128,
    /// Points decay rate k, per week.
    pub points_decay: u128,
    pub min_lock_months: u32,
    pub max_lock_months: u32,
    /// Minimum seconds between claims.
    pub claim_interval: u64,
    /// Minimum principal for boost cohort admission.
    pub min_boost_stake: u128,
    /// Maximum number of distinct boosted owners.
    pub max_boost_stakers: u64,
    /// Seconds after program start during which boost admission and boosted rates apply.
    pub boost_duration: u64,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            base_apr: percent(20),
            max_apr: percent(49),
            base_apr_boost: percent(30),
            max_apr_boost: percent(69),
            w_lock: percent(70),
            w_size: percent(30),
            lock_curvature: permille(1_200),
            size_scale: 50_000,
            voting_floor: percent(25),
            voting_curvature: SCALE,
            points_max: SCALE,
            points_decay: percent(10),
            min_lock_months: 1,
            max_lock_months: 48,
            claim_interval: 7 * SECONDS_PER_DAY,
            min_boost_stake: 10_000,
            max_boost_stakers: 100,
            boost_duration: 90 * SECONDS_PER_DAY,
        }
    }
}

impl ParameterSnapshot {
    /// Reject combinations the formulas cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_apr < self.base_apr {
            return Err(format!("max_apr {} < base_apr {}", self.max_apr, self.base_apr));
        }
        if self.max_apr_boost < self.base_apr_boost {
            return Err(format!(
                "max_apr_boost {} < base_apr_boost {}",
                self.max_apr_boost, self.base_apr_boost
            ));
        }
        let weights = self.w_lock.saturating_add(self.w_size);
        if weights > SCALE {
            return Err(format!("w_lock + w_size = {weights} exceeds 1.0"));
        }
        if self.size_scale == 0 {
            return Err("size_scale must be non-zero".into());
        }
        if self.voting_floor > SCALE {
            return Err(format!("voting_floor {} exceeds 1.0", self.voting_floor));
        }
        if self.min_lock_months == 0 || self.min_lock_months > self.max_lock_months {
            return Err(format!(
                "lock bounds [{}, {}] are empty or start at zero",
                self.min_lock_months, self.max_lock_months
            ));
        }
        Ok(())
    }

    /// Whether `months` is an acceptable lock duration.
    pub fn lock_in_bounds(&self, months: u32) -> bool {
        (self.min_lock_months..=self.max_lock_months).contains(&months)
    }
}

/// Parse a non-negative decimal such as `"0.2"` or `"1.25"` into fixed point.
///
/// At most 18 fractional digits are accepted; anything finer is not
/// representable at [`SCALE`].
pub fn parse_fixed(text: &str) -> Result<u128, String> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("empty decimal: {text:?}"));
    }
    if frac.len() > 18 {
        return Err(format!("more than 18 fractional digits: {text:?}"));
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return Err(format!("not a decimal: {text:?}"));
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("{text:?}: {e}"))?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<18}");
        padded.parse().map_err(|e| format!("{text:?}: {e}"))?
    };
    whole
        .checked_mul(SCALE)
        .and_then(|w| w.checked_add(frac_value))
        .ok_or_else(|| format!("decimal out of range: {text:?}"))
}
