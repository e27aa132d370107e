//! CSV backtest report.
//!
//! One row per strategy date with the benchmark's cumulative value joined on
//! date, so the two curves can be plotted side by side. Benchmark cells are
//! empty on dates the benchmark did not trade.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RsiTraderError;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const HEADER: [&str; 8] = [
    "date",
    "close",
    "rsi",
    "signal",
    "asset_return",
    "strategy_return",
    "strategy_cumulative",
    "benchmark_cumulative",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Renders the report into any writer.
    pub fn write_to<W: std::io::Write>(
        &self,
        result: &BacktestResult,
        out: W,
    ) -> Result<(), RsiTraderError> {
        let report_err = |e: csv::Error| RsiTraderError::Report {
            reason: e.to_string(),
        };

        let benchmark: HashMap<NaiveDate, f64> = result
            .benchmark
            .dates
            .iter()
            .copied()
            .zip(result.benchmark.values.iter().copied())
            .collect();

        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(HEADER).map_err(report_err)?;

        let opt = |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_default();

        for p in &result.points {
            wtr.write_record([
                p.date.format("%Y-%m-%d").to_string(),
                format!("{:.4}", p.close),
                p.rsi.map(|v| format!("{:.2}", v)).unwrap_or_default(),
                p.signal.map(|s| s.to_string()).unwrap_or_default(),
                opt(p.asset_return),
                opt(p.strategy_return),
                format!("{:.6}", p.cumulative),
                opt(benchmark.get(&p.date).copied()),
            ])
            .map_err(report_err)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), RsiTraderError> {
        let file = std::fs::File::create(output_path).map_err(|e| RsiTraderError::Report {
            reason: format!("cannot create {}: {}", output_path, e),
        })?;
        self.write_to(result, file)?;
        tracing::info!(path = output_path, rows = result.points.len(), "report written");
        Ok(())
    }
}
