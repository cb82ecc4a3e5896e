//! Ledger configuration.
//!
//! [`LedgerConfig`] is assembled from an optional TOML file plus
//! `TIDELOCK__*` environment overrides (`TIDELOCK__PARAMS__BASE_APR=0.25`).
//! Ratios are written as decimals (`"0.20"`, `1.2`) and parsed into fixed
//! point. Amounts accept integers or digit strings up to `u128`; durations
//! are plain integers. Anything left unset keeps the [`ParameterSnapshot`]
//! default.
//!
//! ```toml
//! treasury = "eeee…ee"
//! program_start = 1700000000
//!
//! [params]
//! base_apr = "0.20"
//! max_apr = "0.49"
//! lock_curvature = "1.2"
//! size_scale = 50000
//! claim_interval = 604800
//! ```

use std::path::Path;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use tidelock_core::params::{ParameterSnapshot, parse_fixed};
use tidelock_core::types::{Address, Timestamp};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config source: {0}")] Source(#[from] ::config::ConfigError),
    #[error("{field}: {reason}")] Field { field: &'static str, reason: String },
    #[error("invalid parameters: {0}")] Invalid(String),
}

/// Resolved ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    pub params: ParameterSnapshot,
    /// Account allowed to perform privileged actions. `None` means no gate.
    pub treasury: Option<Address>,
    /// Boost window start. `None` means "when the ledger is created".
    pub program_start: Option<Timestamp>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawConfig {
    treasury: Option<String>,
    program_start: Option<u64>,
    params: RawParams,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawParams {
    base_apr: Option<String>,
    max_apr: Option<String>,
    base_apr_boost: Option<String>,
    max_apr_boost: Option<String>,
    w_lock: Option<String>,
    w_size: Option<String>,
    lock_curvature: Option<String>,
    size_scale: Option<String>,
    voting_floor: Option<String>,
    voting_curvature: Option<String>,
    points_max: Option<String>,
    points_decay: Option<String>,
    min_lock_months: Option<u32>,
    max_lock_months: Option<u32>,
    claim_interval: Option<u64>,
    min_boost_stake: Option<String>,
    max_boost_stakers: Option<u64>,
    boost_duration: Option<u64>,
}

impl LedgerConfig {
    /// Load from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load from `path` and an explicit environment map instead of the process one.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("TIDELOCK")
                .separator("__")
                .source(env),
        );
        let raw: RawConfig = builder.build()?.try_deserialize()?;
        raw.resolve()
    }
}

impl RawConfig {
    fn resolve(self) -> Result<LedgerConfig, ConfigError> {
        let treasury = self
            .treasury
            .map(|hex| {
                Address::from_hex(hex.trim()).map_err(|e| ConfigError::Field {
                    field: "treasury",
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let params = self.params.resolve()?;
        params.validate().map_err(ConfigError::Invalid)?;
        Ok(LedgerConfig { params, treasury, program_start: self.program_start })
    }
}

fn ratio(field: &'static str, value: Option<String>, default: u128) -> Result<u128, ConfigError> {
    match value {
        Some(text) => parse_fixed(&text).map_err(|reason| ConfigError::Field { field, reason }),
        None => Ok(default),
    }
}

fn amount(field: &'static str, value: Option<String>, default: u128) -> Result<u128, ConfigError> {
    match value {
        Some(text) => text.trim().parse().map_err(|e| ConfigError::Field {
            field,
            reason: format!("{text:?}: {e}"),
        }),
        None => Ok(default),
    }
}

impl RawParams {
    fn resolve(self) -> Result<ParameterSnapshot, ConfigError> {
        let d = ParameterSnapshot::default();
        Ok(ParameterSnapshot {
            base_apr: ratio("base_apr", self.base_apr, d.base_apr)?,
            max_apr: ratio("max_apr", self.max_apr, d.max_apr)?,
            base_apr_boost: ratio("base_apr_boost", self.base_apr_boost, d.base_apr_boost)?,
            max_apr_boost: ratio("max_apr_boost", self.max_apr_boost, d.max_apr_boost)?,
            w_lock: ratio("w_lock", self.w_lock, d.w_lock)?,
            w_size: ratio("w_size", self.w_size, d.w_size)?,
            lock_curvature: ratio("lock_curvature", self.lock_curvature, d.lock_curvature)?,
            size_scale: amount("size_scale", self.size_scale, d.size_scale)?,
            voting_floor: ratio("voting_floor", self.voting_floor, d.voting_floor)?,
            voting_curvature: ratio("voting_curvature", self.voting_curvature, d.voting_curvature)?,
            points_max: ratio("points_max", self.points_max, d.points_max)?,
            points_decay: ratio("points_decay", self.points_decay, d.points_decay)?,
            min_lock_months: self.min_lock_months.unwrap_or(d.min_lock_months),
            max_lock_months: self.max_lock_months.unwrap_or(d.max_lock_months),
            claim_interval: self.claim_interval.unwrap_or(d.claim_interval),
            min_boost_stake: amount("min_boost_stake", self.min_boost_stake, d.min_boost_stake)?,
            max_boost_stakers: self.max_boost_stakers.unwrap_or(d.max_boost_stakers),
            boost_duration: self.boost_duration.unwrap_or(d.boost_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tidelock_core::constants::{percent, permille};

    use super::*;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Option<::config::Map<String, String>> {
        Some(::config::Map::new())
    }

    #[test]
    fn defaults_without_sources() {
        let cfg = LedgerConfig::load_with_env(None, no_env()).unwrap();
        assert_eq!(cfg, LedgerConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let treasury = "ee".repeat(32);
        let file = toml_file(&format!(
            r#"
treasury = "{treasury}"
program_start = 1700000000

[params]
base_apr = "0.10"
max_apr = 0.5
lock_curvature = "1.5"
size_scale = 80000
claim_interval = 86400
"#
        ));
        let cfg = LedgerConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(cfg.treasury, Some(Address::from_seed(0xee)));
        assert_eq!(cfg.program_start, Some(1_700_000_000));
        assert_eq!(cfg.params.base_apr, percent(10));
        assert_eq!(cfg.params.max_apr, percent(50));
        assert_eq!(cfg.params.lock_curvature, permille(1_500));
        assert_eq!(cfg.params.size_scale, 80_000);
        assert_eq!(cfg.params.claim_interval, 86_400);
        assert_eq!(cfg.params.w_lock, percent(70));
    }

    #[test]
    fn env_overrides_file() {
        let file = toml_file("[params]\nbase_apr = \"0.10\"\n");
        let env = ::config::Map::from([
            ("TIDELOCK__PARAMS__BASE_APR".to_string(), "0.15".to_string()),
            ("TIDELOCK__PARAMS__MAX_BOOST_STAKERS".to_string(), "7".to_string()),
        ]);
        let cfg = LedgerConfig::load_with_env(Some(file.path()), Some(env)).unwrap();
        assert_eq!(cfg.params.base_apr, percent(15));
        assert_eq!(cfg.params.max_boost_stakers, 7);
    }

    #[test]
    fn amounts_beyond_u64_accepted() {
        let file = toml_file(
            "[params]\nsize_scale = 80000\nmin_boost_stake = \"100000000000000000000000\"\n",
        );
        let cfg = LedgerConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(cfg.params.size_scale, 80_000);
        assert_eq!(cfg.params.min_boost_stake, 100_000_000_000_000_000_000_000);

        let env = ::config::Map::from([(
            "TIDELOCK__PARAMS__SIZE_SCALE".to_string(),
            "340282366920938463463374607431768211455".to_string(),
        )]);
        let cfg = LedgerConfig::load_with_env(None, Some(env)).unwrap();
        assert_eq!(cfg.params.size_scale, u128::MAX);
    }

    #[test]
    fn fractional_amount_names_field() {
        let file = toml_file("[params]\nmin_boost_stake = \"12.5\"\n");
        assert!(matches!(
            LedgerConfig::load_with_env(Some(file.path()), no_env()),
            Err(ConfigError::Field { field: "min_boost_stake", .. })
        ));
    }

    #[test]
    fn bad_ratio_names_field() {
        let file = toml_file("[params]\nw_lock = \"abc\"\n");
        let err = LedgerConfig::load_with_env(Some(file.path()), no_env()).unwrap_err();
        assert!(err.to_string().starts_with("w_lock:"), "{err}");
    }

    #[test]
    fn invalid_combination_rejected() {
        let file = toml_file("[params]\nbase_apr = \"0.6\"\n");
        assert!(matches!(
            LedgerConfig::load_with_env(Some(file.path()), no_env()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_treasury_rejected() {
        let file = toml_file("treasury = \"zz\"\n");
        assert!(matches!(
            LedgerConfig::load_with_env(Some(file.path()), no_env()),
            Err(ConfigError::Field { field: "treasury", .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new("/nonexistent/tidelock.toml");
        assert!(matches!(
            LedgerConfig::load_with_env(Some(path), no_env()),
            Err(ConfigError::Source(_))
        ));
    }
}
