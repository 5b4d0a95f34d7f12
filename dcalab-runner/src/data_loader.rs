//! Price loading and canonicalization for the runner.
//!
//! The [`PriceSource`] trait is the boundary to whatever acquires history
//! (a CSV export, an in-memory fixture, a synthetic generator). The loader
//! turns raw rows into a validated [`PriceSeries`]:
//! 1. Drop rows outside `[start, end]`
//! 2. Sort by date
//! 3. Reject duplicate dates and non-positive prices (fail fast)
//! 4. Hash the result for provenance

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use dcalab_core::{CoreError, PricePoint, PriceSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by a [`PriceSource`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },
}

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data source '{source_name}' failed for {symbol}: {error}")]
    Source {
        source_name: String,
        symbol: String,
        #[source]
        error: DataError,
    },

    #[error("no prices for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Where historical prices come from.
///
/// Implementations return raw rows; ordering and validation are the loader's job.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch adjusted closes for `symbol` over `[start, end]`.
    ///
    /// Sources may return rows outside the range; the loader trims them.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError>;
}

/// A loaded price series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub symbol: String,
    pub series: PriceSeries,
    /// BLAKE3 over every date and price, hex encoded.
    pub dataset_hash: String,
    pub source_name: String,
}

/// Load, trim, sort and validate the price history for one symbol.
pub fn load_series(
    source: &dyn PriceSource,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadedSeries, LoadError> {
    if start > end {
        return Err(CoreError::InvalidRange { start, end }.into());
    }

    let raw = source
        .fetch(symbol, start, end)
        .map_err(|error| LoadError::Source {
            source_name: source.name().to_string(),
            symbol: symbol.to_string(),
            error,
        })?;
    let fetched = raw.len();

    let mut points: Vec<PricePoint> = raw
        .into_iter()
        .filter(|p| p.date >= start && p.date <= end)
        .collect();
    if points.len() < fetched {
        debug!(symbol, dropped = fetched - points.len(), "dropped rows outside range");
    }
    if points.is_empty() {
        return Err(LoadError::NoData {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }

    points.sort_by_key(|p| p.date);
    let series = PriceSeries::new(points)?;
    let dataset_hash = compute_dataset_hash(&series);

    info!(
        symbol,
        source = source.name(),
        rows = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        "loaded price series"
    );

    Ok(LoadedSeries {
        symbol: symbol.to_string(),
        series,
        dataset_hash,
        source_name: source.name().to_string(),
    })
}

/// Compute a deterministic BLAKE3 hash over a price series.
pub fn compute_dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for p in series.points() {
        hasher.update(p.date.to_string().as_bytes());
        hasher.update(&p.adj_close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ─── CSV source ──────────────────────────────────────────────────────

/// One CSV row. Accepts `date,adj_close` or Yahoo-style `Date,...,Close,Adj Close`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(
        default,
        alias = "Adj Close",
        alias = "adjclose",
        deserialize_with = "csv::invalid_option"
    )]
    adj_close: Option<f64>,
    #[serde(default, alias = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
}

/// Parse price rows from CSV.
///
/// Uses the adjusted close when present, otherwise the close. Rows with
/// neither (e.g. `null` placeholders) are skipped.
pub fn parse_price_csv<R: Read>(reader: R) -> Result<Vec<PricePoint>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();
    let mut skipped = 0usize;

    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        match row.adj_close.or(row.close) {
            Some(price) => points.push(PricePoint::new(row.date, price)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped CSV rows without a usable price");
    }
    Ok(points)
}

/// Reads `<dir>/<SYMBOL>.csv`.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn read_file(path: &Path) -> Result<Vec<PricePoint>, DataError> {
        let file = std::fs::File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_price_csv(file)
    }
}

impl PriceSource for CsvPriceSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Self::read_file(&path)
    }
}

// ─── In-memory source ────────────────────────────────────────────────

/// Fixed price tables keyed by symbol. Useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    prices: HashMap<String, Vec<PricePoint>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.prices.insert(symbol.to_string(), points);
        self
    }
}

impl PriceSource for InMemoryPriceSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        self.prices
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

// ─── Synthetic source ────────────────────────────────────────────────

/// Deterministic weekday random walk starting at 100.0.
///
/// Developer-only: lets a run execute without real history. The walk is
/// seeded from the symbol name, so the same symbol always gets the same
/// series.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticPriceSource;

impl PriceSource for SyntheticPriceSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut points = Vec::new();
        let mut price = 100.0_f64;
        let mut current = Some(start);

        while let Some(date) = current.filter(|d| *d <= end) {
            let weekday = date.weekday();
            if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
                let daily_return: f64 = rng.gen_range(-0.03..0.03);
                price *= 1.0 + daily_return;
                points.push(PricePoint::new(date, price));
            }
            current = date.succ_opt();
        }

        Ok(points)
    }
}
