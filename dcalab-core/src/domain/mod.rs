//! Domain types for DCALab

pub mod price;

pub use price::{PricePoint, PriceSeries};

/// Trading days in one year; the default Monte Carlo horizon.
pub const TRADING_DAYS_PER_YEAR: usize = 252;
