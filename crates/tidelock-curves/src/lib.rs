//! # tidelock-curves: Fixed-point kernel and curve models.
//!
//! All calculations use integer arithmetic only, at `SCALE = 10^18`.
//!
//! - **Kernel** ([`fixed`]): `exp` by halving range reduction plus a 5-term
//!   Taylor polynomial, `ln` by a 5-term inverse-hyperbolic-tangent series,
//!   `pow = exp(ln(a)·p)`, and 256-bit `mul_div` for single-division products.
//! - **Curves** ([`curves`]): lock factor, saturating size factor, APR blend,
//!   patience points maturity and voting power.
//! - **Rate windows** ([`window`]): the pure selection of the `(base, max)`
//!   APR pair for a position at a given time.
//!
//! The approximations are sufficient for financial-display precision, not
//! for long chains of composed operations. Clamp thresholds are part of the
//! contract and callers may depend on them.

pub mod curves;
pub mod fixed;
pub mod window;

pub use curves::{apr_blend, linear_reward, lock_factor, points_accrued, size_factor, voting_power};
pub use fixed::{exp, exp_neg, ln, mul_div, one_minus_exp_neg, pow};
pub use window::{AprWindow, boost_window_open, position_apr, rate_window};
