//! Distribution statistics: pure functions over samples.
//!
//! Percentiles use linear interpolation between order statistics:
//! for a sorted sample `x[0..n]` and percentile `p`, the rank is
//! `r = p/100 * (n - 1)` and the result is
//! `x[floor(r)] + (r - floor(r)) * (x[floor(r) + 1] - x[floor(r)])`.
//! This matches NumPy's default `linear` method.

use serde::{Deserialize, Serialize};

/// Summary of a sample distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// 5th percentile (linear interpolation).
    pub p5: f64,
    /// 95th percentile (linear interpolation).
    pub p95: f64,
}

impl DistributionSummary {
    /// Summarize an unsorted sample. Returns `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted),
            median: percentile_sorted(&sorted, 50.0),
            std_dev: std_dev(&sorted),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p5: percentile_sorted(&sorted, 5.0),
            p95: percentile_sorted(&sorted, 95.0),
        })
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Percentile of a sorted slice using linear interpolation.
///
/// `p` is in `[0, 100]`. Returns 0.0 for an empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    // Equal neighbours short-circuit so infinite samples never form `inf - inf`.
    if frac == 0.0 || a == b {
        return a;
    }
    a + frac * (b - a)
}

/// Percentile of an unsorted sample.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

// ─── Histogram ───────────────────────────────────────────────────────

/// Equal-width histogram. `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin `values` into `bins` equal-width buckets spanning `[min, max]`.
///
/// The last bucket is closed on the right so the maximum is counted. A
/// degenerate sample (all values equal) uses a unit-width range centred on
/// the value, widened relative to the value when 0.5 would be lost to
/// rounding. Returns `None` when `values` is empty, `bins == 0`, or the
/// sample has no finite span (a NaN or infinite value, or a range that
/// overflows `f64`).
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(hi - lo).is_finite() {
        return None;
    }
    if hi - lo <= 0.0 {
        let pad = 0.5_f64.max(lo.abs() * 1e-9);
        lo -= pad;
        hi += pad;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram { edges, counts })
}
