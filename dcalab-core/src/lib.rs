//! DCALab Core: price series, investment schedules, DCA accumulation and
//! Monte Carlo price projection.
//!
//! Two independent pipelines share only the historical price series:
//! - schedule generation → DCA engine (sequential, one pass)
//! - Monte Carlo engine, seeded by the last observed price
//!
//! Every engine is a pure function of explicit inputs. Randomness is always
//! injected by the caller, either as a generator or as an [`rng::RngHierarchy`].

pub mod dca;
pub mod domain;
pub mod error;
pub mod monte_carlo;
pub mod rng;
pub mod schedule;
pub mod stats;

pub use dca::{Contribution, DcaEngine, DcaResult};
pub use domain::{PricePoint, PriceSeries, TRADING_DAYS_PER_YEAR};
pub use error::CoreError;
pub use monte_carlo::{
    expected_terminal_price, Completion, MonteCarloEngine, ParameterScale, SimulationOutcome,
    SimulationParameters,
};
pub use rng::RngHierarchy;
pub use schedule::{generate_schedule, SchedulePolicy};
pub use stats::{DistributionSummary, Histogram};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results and inputs can cross worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<DcaResult>();
        require_sync::<DcaResult>();
        require_send::<Contribution>();
        require_sync::<Contribution>();
        require_send::<SimulationParameters>();
        require_sync::<SimulationParameters>();
        require_send::<SimulationOutcome>();
        require_sync::<SimulationOutcome>();
        require_send::<SchedulePolicy>();
        require_sync::<SchedulePolicy>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();
        require_send::<CoreError>();
        require_sync::<CoreError>();
    }
}
