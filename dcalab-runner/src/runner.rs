//! Single-run orchestration: schedule → DCA, then Monte Carlo on the last close.
//!
//! Two entry points:
//! - `run_from_source()`: loads prices through a [`PriceSource`], then runs.
//! - `run_simulation()`: takes a pre-loaded series. No I/O.

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use dcalab_core::stats::histogram;
use dcalab_core::{
    expected_terminal_price, generate_schedule, Contribution, CoreError, DcaEngine, DcaResult,
    Histogram, MonteCarloEngine, PriceSeries, RngHierarchy, SimulationOutcome,
};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_series, LoadError, PriceSource};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one DCA + Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub dataset_hash: String,
    pub symbol: String,
    pub config: RunConfig,
    /// Number of scheduled contribution dates.
    pub schedule_len: usize,
    pub dca: DcaResult,
    pub contributions: Vec<Contribution>,
    /// Close the projection started from.
    pub last_price: f64,
    pub monte_carlo: SimulationOutcome,
    /// Analytic mean under the configured scale, for comparison with the sample mean.
    pub expected_terminal_price: f64,
    pub histogram: Histogram,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load prices for `config.symbol` from `source` and run.
pub fn run_from_source(
    config: &RunConfig,
    source: &dyn PriceSource,
    cancel: Option<&AtomicBool>,
) -> Result<SimulationReport, RunError> {
    config.validate()?;
    let loaded = load_series(source, &config.symbol, config.start_date, config.end_date)?;
    run_simulation(config, &loaded.series, &loaded.dataset_hash, cancel)
}

/// Run both pipelines against an already-loaded series.
///
/// A periodic schedule with no anchor date inside the range is an
/// [`CoreError::EmptySchedule`] here; the DCA engine alone would report zeros.
pub fn run_simulation(
    config: &RunConfig,
    prices: &PriceSeries,
    dataset_hash: &str,
    cancel: Option<&AtomicBool>,
) -> Result<SimulationReport, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;

    let schedule = generate_schedule(&config.schedule, config.start_date, config.end_date)?;
    if schedule.is_empty() {
        return Err(CoreError::EmptySchedule.into());
    }

    let (dca, contributions) =
        DcaEngine::new().run_with_ledger(prices, &schedule, config.amount_per_period)?;

    let params = config.monte_carlo.params();
    let last_price = prices.last_price();
    let seeds = RngHierarchy::new(config.monte_carlo.seed);
    let engine = MonteCarloEngine::new();

    let monte_carlo = if config.monte_carlo.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.monte_carlo.threads)
            .build()?;
        pool.install(|| engine.run_parallel(last_price, &params, &seeds, cancel))?
    } else {
        engine.run_parallel(last_price, &params, &seeds, cancel)?
    };

    let histogram = histogram(&monte_carlo.terminal_prices, config.monte_carlo.histogram_bins)
        .ok_or(CoreError::Cancelled {
            requested: params.num_paths,
        })?;

    info!(
        run_id = %run_id,
        symbol = %config.symbol,
        schedule = config.schedule.name(),
        contributions = schedule.len(),
        total_shares = dca.total_shares,
        final_value = dca.final_value,
        mc_mean = monte_carlo.mean(),
        "run complete"
    );

    Ok(SimulationReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: dataset_hash.to_string(),
        symbol: config.symbol.clone(),
        config: config.clone(),
        schedule_len: schedule.len(),
        dca,
        contributions,
        last_price,
        expected_terminal_price: expected_terminal_price(last_price, &params),
        monte_carlo,
        histogram,
    })
}
