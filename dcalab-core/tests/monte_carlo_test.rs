//! Distribution-level checks for the Monte Carlo engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dcalab_core::{
    expected_terminal_price, Completion, CoreError, MonteCarloEngine, ParameterScale,
    RngHierarchy, SimulationParameters,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn degenerate_scenario_all_paths_at_last_price() {
    let params = SimulationParameters::new(0.0, 0.0, 5);
    assert_eq!(params.horizon_days, 252);

    let out = MonteCarloEngine::new()
        .run(100.0, &params, &mut StdRng::seed_from_u64(3))
        .unwrap();
    assert_eq!(out.terminal_prices.len(), 5);
    assert!(out.terminal_prices.iter().all(|&p| p == 100.0));
    assert_eq!(out.mean(), 100.0);
    assert_eq!(out.p5(), 100.0);
    assert_eq!(out.p95(), 100.0);
}

#[test]
fn mean_converges_to_lognormal_expectation() {
    // Small per-step parameters so the lognormal tail stays well behaved.
    let params = SimulationParameters::new(0.0004, 0.01, 20_000);
    let out = MonteCarloEngine::new()
        .run_parallel(100.0, &params, &RngHierarchy::new(2024), None)
        .unwrap();

    let expected = expected_terminal_price(100.0, &params);
    // terminal sd ~ 16% of mean; standard error over 20k paths ~ 0.12%
    assert!(
        (out.mean() / expected - 1.0).abs() < 0.01,
        "mean {} expected {}",
        out.mean(),
        expected
    );
    assert!(out.p5() < out.mean() && out.mean() < out.p95());
}

#[test]
fn annual_scale_matches_one_year_lognormal() {
    let params = SimulationParameters::new(0.07, 0.15, 20_000).with_scale(ParameterScale::Annual);
    let out = MonteCarloEngine::new()
        .run_parallel(100.0, &params, &RngHierarchy::new(11), None)
        .unwrap();

    let expected = 100.0 * 0.07_f64.exp();
    assert!((out.mean() / expected - 1.0).abs() < 0.01);
    // 5th percentile of a one-year 15% vol lognormal is well below the start price.
    assert!(out.p5() < 100.0);
}

#[test]
fn unscaled_annual_inputs_explode() {
    // Annual-looking inputs applied per step compound 252 years of drift.
    let params = SimulationParameters::new(0.07, 0.0, 1);
    let out = MonteCarloEngine::new()
        .run(100.0, &params, &mut StdRng::seed_from_u64(0))
        .unwrap();
    let expected = 100.0 * (0.07_f64 * 252.0).exp();
    assert!((out.mean() / expected - 1.0).abs() < 1e-12);
    assert!(out.mean() > 1e9);
}

#[test]
fn parallel_and_seed_reproducibility() {
    let params = SimulationParameters::new(0.0002, 0.02, 500).with_horizon(60);
    let engine = MonteCarloEngine::new();

    let a = engine.run_parallel(42.0, &params, &RngHierarchy::new(5), None).unwrap();
    let b = engine.run_parallel(42.0, &params, &RngHierarchy::new(5), None).unwrap();
    let c = engine.run_parallel(42.0, &params, &RngHierarchy::new(6), None).unwrap();

    assert_eq!(a, b);
    assert_ne!(a.terminal_prices, c.terminal_prices);
    assert_eq!(a.completion, Completion::Full);
    assert!(a.terminal_prices.iter().all(|&p| p > 0.0));
}

#[test]
fn paths_are_not_identical() {
    let params = SimulationParameters::new(0.0, 0.02, 100).with_horizon(10);
    let out = MonteCarloEngine::new()
        .run_parallel(100.0, &params, &RngHierarchy::new(1), None)
        .unwrap();
    let mut sorted = out.terminal_prices.clone();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    assert_eq!(sorted.len(), 100);
}

#[test]
fn cancelling_mid_run_yields_consistent_outcome() {
    let params = SimulationParameters::new(0.0003, 0.01, 200_000);
    let cancel = AtomicBool::new(false);

    let result = std::thread::scope(|scope| {
        scope.spawn(|| {
            std::thread::sleep(Duration::from_millis(5));
            cancel.store(true, Ordering::Relaxed);
        });
        MonteCarloEngine::new().run_parallel(100.0, &params, &RngHierarchy::new(11), Some(&cancel))
    });

    match result {
        Ok(out) => match out.completion {
            Completion::Full => assert_eq!(out.terminal_prices.len(), 200_000),
            Completion::Partial {
                completed,
                requested,
            } => {
                assert_eq!(requested, 200_000);
                assert!(completed < requested);
                assert_eq!(completed, out.terminal_prices.len());
                assert_eq!(completed, out.summary.count);
                assert!(out.is_partial());
                assert!(out.p5() <= out.p95());
            }
        },
        // Flag raised before any worker started.
        Err(err) => assert_eq!(err, CoreError::Cancelled { requested: 200_000 }),
    }
}

#[test]
fn overflowing_per_step_drift_fails_instead_of_returning_infinities() {
    let params = SimulationParameters::new(3.0, 0.0, 5);
    let err = MonteCarloEngine::new()
        .run(100.0, &params, &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, CoreError::NonFiniteTerminalPrice { .. }));
}
