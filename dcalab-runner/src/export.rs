//! Reporting and export: JSON, CSV and Markdown artifacts.
//!
//! - **JSON**: full `SimulationReport` round trip with schema versioning
//! - **CSV**: contribution ledger, terminal prices, histogram buckets
//! - **Markdown**: human-readable run summary
//!
//! Newer schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dcalab_core::{Contribution, Histogram};
use tracing::info;

use crate::runner::{SimulationReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SimulationReport` to pretty JSON.
pub fn export_json(report: &SimulationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SimulationReport to JSON")
}

/// Deserialize a `SimulationReport`, rejecting schema versions newer than ours.
pub fn import_json(json: &str) -> Result<SimulationReport> {
    let report: SimulationReport =
        serde_json::from_str(json).context("failed to deserialize SimulationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the contribution ledger.
///
/// Columns: requested_date, execution_date, execution_price, shares_bought,
/// cumulative_shares
pub fn export_contributions_csv(contributions: &[Contribution]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "requested_date",
        "execution_date",
        "execution_price",
        "shares_bought",
        "cumulative_shares",
    ])?;
    for c in contributions {
        wtr.write_record([
            &c.requested_date.to_string(),
            &c.execution_date.to_string(),
            &format!("{:.6}", c.execution_price),
            &format!("{:.8}", c.shares_bought),
            &format!("{:.8}", c.cumulative_shares),
        ])?;
    }
    finish(wtr)
}

/// Export one terminal price per path.
pub fn export_terminal_prices_csv(terminal_prices: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["path", "terminal_price"])?;
    for (i, p) in terminal_prices.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.6}", p)])?;
    }
    finish(wtr)
}

/// Export histogram buckets as `lower,upper,count` rows.
pub fn export_histogram_csv(histogram: &Histogram) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["lower", "upper", "count"])?;
    for (bounds, count) in histogram.edges.windows(2).zip(&histogram.counts) {
        wtr.write_record([
            &format!("{:.6}", bounds[0]),
            &format!("{:.6}", bounds[1]),
            &count.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `{symbol}_{run_id prefix}/` under `output_dir` containing
/// `report.json`, `contributions.csv`, `terminal_prices.csv` and
/// `histogram.csv`. Identical configs overwrite the same directory.
///
/// Returns the path to the run directory.
pub fn save_artifacts(report: &SimulationReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", report.symbol, short_id));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("report.json", export_json(report)?),
        ("contributions.csv", export_contributions_csv(&report.contributions)?),
        (
            "terminal_prices.csv",
            export_terminal_prices_csv(&report.monte_carlo.terminal_prices)?,
        ),
        ("histogram.csv", export_histogram_csv(&report.histogram)?),
    ];
    for (name, content) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(dir = %run_dir.display(), "saved run artifacts");
    Ok(run_dir)
}

/// Load a `SimulationReport` from an artifact directory's `report.json`.
pub fn load_artifacts(dir: &Path) -> Result<SimulationReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown summary of one run.
pub fn generate_report(report: &SimulationReport) -> String {
    let config = &report.config;
    let dca = &report.dca;
    let mc = &report.monte_carlo;
    let mut md = String::with_capacity(1024);

    md.push_str("# DCA Simulation Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        config.start_date, config.end_date
    ));
    md.push_str(&format!("| Schedule | {} |\n", config.schedule.name()));
    md.push_str(&format!("| Contributions | {} |\n", report.schedule_len));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    md.push_str(&format!("| Run ID | {} |\n", report.run_id));
    md.push('\n');

    md.push_str("## Dollar-Cost Averaging\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Shares | {:.4} |\n", dca.total_shares));
    md.push_str(&format!("| Portfolio Value | ${:.2} |\n", dca.final_value));
    md.push_str(&format!("| Total Invested | ${:.2} |\n", dca.total_invested));
    md.push_str(&format!("| Profit/Loss | ${:.2} |\n", dca.profit_loss));
    if let Some(avg) = dca.average_cost() {
        md.push_str(&format!("| Average Cost | ${:.2} |\n", avg));
    }
    if let Some(ret) = dca.return_pct() {
        md.push_str(&format!("| Return | {:.2}% |\n", ret * 100.0));
    }
    md.push('\n');

    md.push_str("## Monte Carlo Projection\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Last Price | ${:.2} |\n", report.last_price));
    md.push_str(&format!(
        "| Paths | {} of {} |\n",
        mc.summary.count, config.monte_carlo.num_paths
    ));
    md.push_str(&format!("| Horizon | {} days |\n", config.monte_carlo.horizon_days));
    md.push_str(&format!("| Mean Final Price | ${:.2} |\n", mc.mean()));
    md.push_str(&format!("| 5% Quantile | ${:.2} |\n", mc.p5()));
    md.push_str(&format!("| 95% Quantile | ${:.2} |\n", mc.p95()));
    md.push_str(&format!(
        "| Analytic Mean | ${:.2} |\n",
        report.expected_terminal_price
    ));
    if mc.is_partial() {
        md.push_str("\n**Cancelled:** statistics cover completed paths only.\n");
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn contributions_csv_has_header_and_rows() {
        let rows = [Contribution {
            requested_date: d(2024, 3, 31),
            execution_date: d(2024, 3, 29),
            execution_price: 50.0,
            shares_bought: 2.0,
            cumulative_shares: 2.0,
        }];
        let csv = export_contributions_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "requested_date,execution_date,execution_price,shares_bought,cumulative_shares"
        );
        assert!(lines[1].starts_with("2024-03-31,2024-03-29,50.000000,"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn terminal_prices_csv_indexes_paths() {
        let csv = export_terminal_prices_csv(&[101.5, 99.25]).unwrap();
        assert_eq!(csv, "path,terminal_price\n0,101.500000\n1,99.250000\n");
    }

    #[test]
    fn histogram_csv_pairs_edges_with_counts() {
        let h = Histogram {
            edges: vec![0.0, 1.0, 2.0],
            counts: vec![3, 4],
        };
        let csv = export_histogram_csv(&h).unwrap();
        assert_eq!(
            csv,
            "lower,upper,count\n0.000000,1.000000,3\n1.000000,2.000000,4\n"
        );
    }
}
