//! Serializable run configuration.
//!
//! A [`RunConfig`] captures everything needed to reproduce a run: the
//! instrument and date range, the contribution plan and the Monte Carlo
//! settings including the master seed. It loads from TOML and round-trips
//! through JSON; every field has a default.

use std::path::Path;

use chrono::NaiveDate;
use dcalab_core::{CoreError, ParameterScale, SchedulePolicy, SimulationParameters};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] CoreError),
}

/// Configuration for a single DCA + Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Instrument label; only used to look up prices and tag artifacts.
    pub symbol: String,

    /// First day of the contribution window (inclusive).
    pub start_date: NaiveDate,

    /// Last day of the contribution window (inclusive).
    pub end_date: NaiveDate,

    /// Currency amount invested on every scheduled date.
    pub amount_per_period: f64,

    pub schedule: SchedulePolicy,

    pub monte_carlo: MonteCarloConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            amount_per_period: 500.0,
            schedule: SchedulePolicy::Monthly,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check the boundary preconditions before any data is loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(CoreError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            }
            .into());
        }
        if !self.amount_per_period.is_finite() || self.amount_per_period <= 0.0 {
            return Err(CoreError::InvalidParameter {
                name: "amount_per_period",
                value: self.amount_per_period,
                reason: "must be finite and > 0",
            }
            .into());
        }
        if self.monte_carlo.histogram_bins == 0 {
            return Err(CoreError::InvalidParameter {
                name: "histogram_bins",
                value: 0.0,
                reason: "must be > 0",
            }
            .into());
        }
        self.monte_carlo.params().validate()?;
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two runs with identical configs (including the seed) share a run id.
    pub fn run_id(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

/// Monte Carlo section of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub mu: f64,
    pub sigma: f64,
    pub num_paths: usize,
    pub horizon_days: usize,
    pub scale: ParameterScale,

    /// Master seed for the per-path RNG hierarchy.
    pub seed: u64,

    /// Worker threads for path generation. 0 uses the global rayon pool.
    pub threads: usize,

    /// Buckets in the exported terminal-price histogram.
    pub histogram_bins: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        let params = SimulationParameters::default();
        Self {
            mu: params.mu,
            sigma: params.sigma,
            num_paths: params.num_paths,
            horizon_days: params.horizon_days,
            scale: params.scale,
            seed: 42,
            threads: 0,
            histogram_bins: 50,
        }
    }
}

impl MonteCarloConfig {
    pub fn params(&self) -> SimulationParameters {
        SimulationParameters {
            mu: self.mu,
            sigma: self.sigma,
            num_paths: self.num_paths,
            horizon_days: self.horizon_days,
            scale: self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.monte_carlo.params(), SimulationParameters::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_toml() {
        let toml = r#"
symbol = "SPY"
start_date = "2020-01-01"
end_date = "2020-12-31"
amount_per_period = 250.0

[schedule]
type = "WEEKLY"
anchor = "Fri"

[monte_carlo]
mu = 0.0003
sigma = 0.01
num_paths = 200
scale = "ANNUAL"
seed = 7
threads = 2
"#;
        let config = RunConfig::from_toml(toml).unwrap();
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.schedule, SchedulePolicy::Weekly { anchor: Weekday::Fri });
        assert_eq!(config.monte_carlo.num_paths, 200);
        assert_eq!(config.monte_carlo.horizon_days, 252);
        assert_eq!(config.monte_carlo.scale, ParameterScale::Annual);
        assert_eq!(config.monte_carlo.histogram_bins, 50);
    }

    #[test]
    fn parses_custom_dates() {
        let toml = r#"
[schedule]
type = "CUSTOM_DATES"
dates = ["2021-03-15", "2021-01-04", "2021-03-15"]
"#;
        let config = RunConfig::from_toml(toml).unwrap();
        match config.schedule {
            SchedulePolicy::CustomDates { dates } => assert_eq!(dates.len(), 3),
            other => panic!("unexpected schedule {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_schedule_type() {
        assert!(matches!(
            RunConfig::from_toml("[schedule]\ntype = \"DAILY\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validation_catches_bad_inputs() {
        let mut config = RunConfig::default();
        config.end_date = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(CoreError::InvalidRange { .. }))
        ));

        let mut config = RunConfig::default();
        config.amount_per_period = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(CoreError::InvalidParameter { name: "amount_per_period", .. }))
        ));

        let mut config = RunConfig::default();
        config.monte_carlo.sigma = -0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(CoreError::InvalidParameter { name: "sigma", .. }))
        ));

        let mut config = RunConfig::default();
        config.monte_carlo.num_paths = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());

        b.monte_carlo.seed = 43;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn json_roundtrip() {
        let config = RunConfig {
            schedule: SchedulePolicy::weekly(),
            ..RunConfig::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
