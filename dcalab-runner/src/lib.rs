//! DCALab Runner: orchestration around `dcalab-core`.
//!
//! This crate provides:
//! - TOML/JSON run configuration with a content-hash run id
//! - Price loading through the `PriceSource` trait (CSV, in-memory, synthetic)
//! - Single-run orchestration producing a `SimulationReport`
//! - JSON, CSV and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, MonteCarloConfig, RunConfig};
pub use data_loader::{
    compute_dataset_hash, load_series, parse_price_csv, CsvPriceSource, DataError,
    InMemoryPriceSource, LoadError, LoadedSeries, PriceSource, SyntheticPriceSource,
};
pub use export::{
    export_contributions_csv, export_histogram_csv, export_json, export_terminal_prices_csv,
    generate_report, import_json, load_artifacts, save_artifacts,
};
pub use runner::{run_from_source, run_simulation, RunError, SimulationReport, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_is_send_sync() {
        assert_send::<SimulationReport>();
        assert_sync::<SimulationReport>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<CsvPriceSource>();
        assert_sync::<CsvPriceSource>();
        assert_send::<InMemoryPriceSource>();
        assert_sync::<InMemoryPriceSource>();
        assert_send::<Box<dyn PriceSource>>();
    }
}
