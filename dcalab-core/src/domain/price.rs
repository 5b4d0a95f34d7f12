//! PriceSeries: the historical adjusted-close input shared by both engines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One observed adjusted close for a single trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adj_close: f64) -> Self {
        Self { date, adj_close }
    }
}

/// Immutable, date-ordered price history for one instrument.
///
/// Invariants (checked once in [`PriceSeries::new`]):
/// - at least one point
/// - dates strictly increasing (no duplicates)
/// - every `adj_close` finite and > 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, CoreError> {
        if points.is_empty() {
            return Err(CoreError::EmptyPriceSeries);
        }

        for (i, p) in points.iter().enumerate() {
            if !p.adj_close.is_finite() || p.adj_close <= 0.0 {
                return Err(CoreError::InvalidPriceSeries {
                    date: p.date,
                    reason: format!("adjusted close must be finite and > 0, got {}", p.adj_close),
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                let reason = if points[i - 1].date == p.date {
                    "duplicate date".to_string()
                } else {
                    format!("out of order after {}", points[i - 1].date)
                };
                return Err(CoreError::InvalidPriceSeries {
                    date: p.date,
                    reason,
                });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first().date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last().date
    }

    /// The final adjusted close; seeds the Monte Carlo engine and values DCA holdings.
    pub fn last_price(&self) -> f64 {
        self.last().adj_close
    }

    /// Exact quote for `date`, if the series has one.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|i| self.points[i].adj_close)
    }

    /// Resolve the point used to execute a purchase on `date`.
    ///
    /// Returns the exact-date point when present, otherwise the latest point
    /// strictly before `date` (nearest prior trading day). Dates before the
    /// first point fail with [`CoreError::NoPriorPrice`].
    pub fn price_on_or_before(&self, date: NaiveDate) -> Result<&PricePoint, CoreError> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            return Err(CoreError::NoPriorPrice {
                requested: date,
                first_available: self.first_date(),
            });
        }
        Ok(&self.points[idx - 1])
    }

    /// Simple day-over-day returns: `p[i] / p[i-1] - 1`, dated at `p[i]`.
    pub fn daily_returns(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .windows(2)
            .map(|w| (w[1].date, w[1].adj_close / w[0].adj_close - 1.0))
            .collect()
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = CoreError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}
