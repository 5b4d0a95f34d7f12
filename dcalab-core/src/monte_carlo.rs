//! Monte Carlo price projection under geometric Brownian motion.
//!
//! Each path starts at the last observed price and takes `horizon_days`
//! multiplicative steps
//!
//! ```text
//! p[t+1] = p[t] * exp((mu - 0.5 * sigma^2) + sigma * z),   z ~ N(0, 1)
//! ```
//!
//! Only the terminal price of each path is kept.
//!
//! # Parameter scale
//!
//! By default (`ParameterScale::PerStep`) `mu` and `sigma` are applied to every
//! step exactly as given, even though callers usually quote them as annual
//! figures and the horizon is 252 daily steps. With annual inputs this
//! compounds a full year of drift and volatility into every day; an annual
//! `mu = 0.07` over 252 steps projects `exp(17.64)` growth. This remains the
//! default so projections match the reference model. Callers who want the
//! daily-rescaled model (`mu / 252`, `sigma / sqrt(252)`) must opt in with
//! `ParameterScale::Annual`.
//!
//! A terminal price that overflows `f64` (for example `mu * horizon_days`
//! above ~709 with zero volatility) fails the run with
//! [`CoreError::NonFiniteTerminalPrice`] instead of producing infinite
//! statistics.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::TRADING_DAYS_PER_YEAR;
use crate::error::CoreError;
use crate::rng::RngHierarchy;
use crate::stats::DistributionSummary;

/// RNG stream name used for per-path generators.
pub const PATH_STREAM: &str = "mc-path";

// ─── Parameters ──────────────────────────────────────────────────────

/// How `mu` and `sigma` map onto a single simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterScale {
    /// Use `mu` and `sigma` unchanged on every step.
    #[default]
    PerStep,
    /// Treat `mu`/`sigma` as annual and rescale to `mu/252`, `sigma/sqrt(252)`.
    Annual,
}

/// Inputs to a Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Drift.
    pub mu: f64,
    /// Volatility, >= 0. Zero gives a deterministic path.
    pub sigma: f64,
    pub num_paths: usize,
    #[serde(default = "default_horizon")]
    pub horizon_days: usize,
    #[serde(default)]
    pub scale: ParameterScale,
}

fn default_horizon() -> usize {
    TRADING_DAYS_PER_YEAR
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mu: 0.07,
            sigma: 0.15,
            num_paths: 1000,
            horizon_days: TRADING_DAYS_PER_YEAR,
            scale: ParameterScale::PerStep,
        }
    }
}

impl SimulationParameters {
    /// Parameters with the one-year horizon and per-step scale.
    pub fn new(mu: f64, sigma: f64, num_paths: usize) -> Self {
        Self {
            mu,
            sigma,
            num_paths,
            ..Self::default()
        }
    }

    pub fn with_horizon(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_scale(mut self, scale: ParameterScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.mu.is_finite() {
            return Err(CoreError::invalid_parameter("mu", self.mu, "must be finite"));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(CoreError::invalid_parameter(
                "sigma",
                self.sigma,
                "must be finite and >= 0",
            ));
        }
        if self.num_paths == 0 {
            return Err(CoreError::invalid_parameter("num_paths", 0.0, "must be > 0"));
        }
        if self.horizon_days == 0 {
            return Err(CoreError::invalid_parameter("horizon_days", 0.0, "must be > 0"));
        }
        Ok(())
    }

    /// Drift applied per step.
    pub fn step_mu(&self) -> f64 {
        match self.scale {
            ParameterScale::PerStep => self.mu,
            ParameterScale::Annual => self.mu / TRADING_DAYS_PER_YEAR as f64,
        }
    }

    /// Volatility applied per step.
    pub fn step_sigma(&self) -> f64 {
        match self.scale {
            ParameterScale::PerStep => self.sigma,
            ParameterScale::Annual => self.sigma / (TRADING_DAYS_PER_YEAR as f64).sqrt(),
        }
    }
}

/// Analytic mean of the terminal price: `last_price * exp(step_mu * horizon_days)`.
pub fn expected_terminal_price(last_price: f64, params: &SimulationParameters) -> f64 {
    last_price * (params.step_mu() * params.horizon_days as f64).exp()
}

// ─── Outcome ─────────────────────────────────────────────────────────

/// Whether every requested path finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Completion {
    Full,
    /// Run was cancelled; statistics cover only `completed` paths.
    Partial { completed: usize, requested: usize },
}

/// Terminal-price distribution of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// One terminal price per completed path, in path-index order.
    pub terminal_prices: Vec<f64>,
    pub summary: DistributionSummary,
    pub completion: Completion,
}

impl SimulationOutcome {
    fn from_terminal_prices(
        terminal_prices: Vec<f64>,
        requested: usize,
    ) -> Result<Self, CoreError> {
        let summary = DistributionSummary::from_values(&terminal_prices)
            .ok_or(CoreError::Cancelled { requested })?;
        let completion = if terminal_prices.len() == requested {
            Completion::Full
        } else {
            Completion::Partial {
                completed: terminal_prices.len(),
                requested,
            }
        };
        Ok(Self {
            terminal_prices,
            summary,
            completion,
        })
    }

    pub fn mean(&self) -> f64 {
        self.summary.mean
    }

    pub fn p5(&self) -> f64 {
        self.summary.p5
    }

    pub fn p95(&self) -> f64 {
        self.summary.p95
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.completion, Completion::Partial { .. })
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Simulate one path and return its terminal price.
///
/// `step_mu`/`step_sigma` are the per-step parameters; intermediate prices
/// are not retained.
pub fn simulate_terminal_price<R: Rng + ?Sized>(
    last_price: f64,
    step_mu: f64,
    step_sigma: f64,
    steps: usize,
    rng: &mut R,
) -> f64 {
    let drift = step_mu - 0.5 * step_sigma * step_sigma;
    let mut price = last_price;
    for _ in 0..steps {
        let z: f64 = StandardNormal.sample(rng);
        price *= (drift + step_sigma * z).exp();
    }
    price
}

/// Monte Carlo engine. Stateless; randomness is always supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloEngine;

impl MonteCarloEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run all paths sequentially on the caller's generator.
    pub fn run<R: Rng + ?Sized>(
        &self,
        last_price: f64,
        params: &SimulationParameters,
        rng: &mut R,
    ) -> Result<SimulationOutcome, CoreError> {
        validate_inputs(last_price, params)?;

        let (mu, sigma) = (params.step_mu(), params.step_sigma());
        let terminal = (0..params.num_paths)
            .map(|i| {
                let price =
                    simulate_terminal_price(last_price, mu, sigma, params.horizon_days, rng);
                ensure_finite(i, price, params)
            })
            .collect::<Result<Vec<f64>, CoreError>>()?;

        let outcome = SimulationOutcome::from_terminal_prices(terminal, params.num_paths)?;
        debug!(
            paths = params.num_paths,
            mean = outcome.mean(),
            p5 = outcome.p5(),
            p95 = outcome.p95(),
            "monte carlo run complete"
        );
        Ok(outcome)
    }

    /// Run paths in parallel on the current rayon pool.
    ///
    /// Path `i` draws from its own generator seeded by
    /// `seeds.sub_seed(PATH_STREAM, i)`, so the outcome is identical for any
    /// thread count. When `cancel` is raised, paths that have not started are
    /// skipped and the outcome is marked [`Completion::Partial`].
    pub fn run_parallel(
        &self,
        last_price: f64,
        params: &SimulationParameters,
        seeds: &RngHierarchy,
        cancel: Option<&AtomicBool>,
    ) -> Result<SimulationOutcome, CoreError> {
        validate_inputs(last_price, params)?;

        info!(
            paths = params.num_paths,
            horizon_days = params.horizon_days,
            master_seed = seeds.master_seed(),
            "starting parallel monte carlo"
        );

        let (mu, sigma) = (params.step_mu(), params.step_sigma());
        let terminal = (0..params.num_paths)
            .into_par_iter()
            .filter_map(|i| {
                if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    return None;
                }
                let mut rng = seeds.rng_for(PATH_STREAM, i as u64);
                let price =
                    simulate_terminal_price(last_price, mu, sigma, params.horizon_days, &mut rng);
                Some(ensure_finite(i, price, params))
            })
            .collect::<Result<Vec<f64>, CoreError>>()?;

        let outcome = SimulationOutcome::from_terminal_prices(terminal, params.num_paths)?;
        if let Completion::Partial {
            completed,
            requested,
        } = outcome.completion
        {
            warn!(completed, requested, "monte carlo cancelled; outcome is partial");
        }
        info!(
            mean = outcome.mean(),
            p5 = outcome.p5(),
            p95 = outcome.p95(),
            "monte carlo finished"
        );
        Ok(outcome)
    }
}

fn ensure_finite(path: usize, value: f64, params: &SimulationParameters) -> Result<f64, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFiniteTerminalPrice {
            path,
            value,
            horizon_days: params.horizon_days,
        })
    }
}

fn validate_inputs(last_price: f64, params: &SimulationParameters) -> Result<(), CoreError> {
    if !last_price.is_finite() || last_price <= 0.0 {
        return Err(CoreError::invalid_parameter(
            "last_price",
            last_price,
            "must be finite and > 0",
        ));
    }
    params.validate()
}
