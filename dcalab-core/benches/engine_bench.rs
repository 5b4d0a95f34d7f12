//! Criterion benchmarks for DCALab hot paths.
//!
//! Benchmarks:
//! 1. Monte Carlo path generation (sequential vs rayon, by path count)
//! 2. DCA accumulation over long daily schedules
//! 3. Percentile summary over large terminal-price samples

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dcalab_core::stats::DistributionSummary;
use dcalab_core::{
    DcaEngine, MonteCarloEngine, PricePoint, PriceSeries, RngHierarchy, SimulationParameters,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let points = (0..n)
        .map(|i| {
            let price = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            PricePoint::new(base_date.checked_add_days(Days::new(i as u64)).unwrap(), price)
        })
        .collect();
    PriceSeries::new(points).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");
    let engine = MonteCarloEngine::new();

    for &paths in &[100usize, 1000, 10_000] {
        let params = SimulationParameters::new(0.0003, 0.01, paths);

        group.bench_with_input(BenchmarkId::new("sequential", paths), &paths, |b, _| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                engine.run(black_box(100.0), black_box(&params), &mut rng)
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", paths), &paths, |b, _| {
            let seeds = RngHierarchy::new(42);
            b.iter(|| engine.run_parallel(black_box(100.0), black_box(&params), &seeds, None));
        });
    }

    group.finish();
}

fn bench_dca(c: &mut Criterion) {
    let mut group = c.benchmark_group("dca");
    let engine = DcaEngine::new();

    for &days in &[252usize, 2520, 7560] {
        let series = make_series(days);
        let schedule: Vec<NaiveDate> = series.points().iter().map(|p| p.date).collect();

        group.bench_with_input(BenchmarkId::new("daily_schedule", days), &days, |b, _| {
            b.iter(|| engine.run(black_box(&series), black_box(&schedule), 100.0));
        });
    }

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let values: Vec<f64> = (0..100_000).map(|i| (i as f64 * 0.37).sin() * 50.0 + 100.0).collect();
    c.bench_function("distribution_summary_100k", |b| {
        b.iter(|| DistributionSummary::from_values(black_box(&values)));
    });
}

criterion_group!(benches, bench_monte_carlo, bench_dca, bench_summary);
criterion_main!(benches);
