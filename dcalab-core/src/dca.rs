//! Dollar-cost averaging engine.
//!
//! Buys a fixed currency amount on every scheduled date and values the
//! accumulated shares at the last close of the series.
//!
//! Dates are processed in the order given (never re-sorted). Each date is
//! resolved independently: an exact quote when the series has one, otherwise
//! the nearest prior trading day. A date before the whole series fails the
//! run; no partial result is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::error::CoreError;

/// Final holdings of a DCA plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcaResult {
    pub total_shares: f64,
    pub total_invested: f64,
    pub final_value: f64,
    pub profit_loss: f64,
}

impl DcaResult {
    /// Average price paid per share, `None` when nothing was bought.
    pub fn average_cost(&self) -> Option<f64> {
        (self.total_shares > 0.0).then(|| self.total_invested / self.total_shares)
    }

    /// Profit/loss as a fraction of invested capital, `None` when nothing was invested.
    pub fn return_pct(&self) -> Option<f64> {
        (self.total_invested > 0.0).then(|| self.profit_loss / self.total_invested)
    }
}

/// One executed contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Date from the schedule.
    pub requested_date: NaiveDate,
    /// Trading day whose close was used (equal to `requested_date` on an exact hit).
    pub execution_date: NaiveDate,
    pub execution_price: f64,
    pub shares_bought: f64,
    /// Running share total after this contribution.
    pub cumulative_shares: f64,
}

/// Stateless DCA engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcaEngine;

impl DcaEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the plan and return the final holdings.
    pub fn run(
        &self,
        prices: &PriceSeries,
        schedule: &[NaiveDate],
        amount_per_period: f64,
    ) -> Result<DcaResult, CoreError> {
        let (result, _) = self.accumulate(prices, schedule, amount_per_period, false)?;
        Ok(result)
    }

    /// Run the plan and also return one ledger row per scheduled date.
    pub fn run_with_ledger(
        &self,
        prices: &PriceSeries,
        schedule: &[NaiveDate],
        amount_per_period: f64,
    ) -> Result<(DcaResult, Vec<Contribution>), CoreError> {
        self.accumulate(prices, schedule, amount_per_period, true)
    }

    fn accumulate(
        &self,
        prices: &PriceSeries,
        schedule: &[NaiveDate],
        amount_per_period: f64,
        keep_ledger: bool,
    ) -> Result<(DcaResult, Vec<Contribution>), CoreError> {
        if !amount_per_period.is_finite() || amount_per_period <= 0.0 {
            return Err(CoreError::invalid_parameter(
                "amount_per_period",
                amount_per_period,
                "must be finite and > 0",
            ));
        }

        let mut ledger = Vec::with_capacity(if keep_ledger { schedule.len() } else { 0 });
        let mut shares = 0.0;

        for &date in schedule {
            let point = prices.price_on_or_before(date)?;
            let bought = amount_per_period / point.adj_close;
            shares += bought;

            if keep_ledger {
                ledger.push(Contribution {
                    requested_date: date,
                    execution_date: point.date,
                    execution_price: point.adj_close,
                    shares_bought: bought,
                    cumulative_shares: shares,
                });
            }
        }

        let total_invested = schedule.len() as f64 * amount_per_period;
        let final_value = shares * prices.last_price();
        let result = DcaResult {
            total_shares: shares,
            total_invested,
            final_value,
            profit_loss: final_value - total_invested,
        };

        debug!(
            contributions = schedule.len(),
            total_shares = result.total_shares,
            final_value = result.final_value,
            profit_loss = result.profit_loss,
            "dca run complete"
        );
        Ok((result, ledger))
    }
}
