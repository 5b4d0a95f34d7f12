//! Typed failures returned by the core engines.
//!
//! Every variant carries the offending date or parameter so a caller can
//! diagnose the failure without re-running.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from schedule generation, DCA accumulation and Monte Carlo simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("investment schedule is empty")]
    EmptySchedule,

    #[error("price series is empty")]
    EmptyPriceSeries,

    #[error("no price on or before {requested} (history starts {first_available})")]
    NoPriorPrice {
        requested: NaiveDate,
        first_available: NaiveDate,
    },

    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid price series at {date}: {reason}")]
    InvalidPriceSeries { date: NaiveDate, reason: String },

    #[error("simulation cancelled before any of {requested} paths completed")]
    Cancelled { requested: usize },

    #[error("path {path} ended at non-finite price {value} after {horizon_days} steps")]
    NonFiniteTerminalPrice {
        path: usize,
        value: f64,
        horizon_days: usize,
    },
}

impl CoreError {
    pub(crate) fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}
