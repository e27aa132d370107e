//! CSV file market data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv`. The file needs a header row with `date`
//! (YYYY-MM-DD) and `close` columns; any other columns are ignored.
//! A missing file is `DataUnavailable`. A file that does not parse is
//! `InvalidPriceSeries`, which the live loop does not retry.

use crate::domain::error::RsiTraderError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub const SUPPORTED_INTERVAL: &str = "1d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, RsiTraderError> {
        let unavailable = |reason: String| RsiTraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };
        let malformed = |reason: String| RsiTraderError::InvalidPriceSeries {
            reason: format!("{}: {}", symbol, reason),
        };

        if interval != SUPPORTED_INTERVAL {
            return Err(RsiTraderError::ConfigInvalid {
                section: "data".into(),
                key: "interval".into(),
                reason: format!(
                    "unsupported interval '{}', CSV data is {}",
                    interval, SUPPORTED_INTERVAL
                ),
            });
        }

        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| malformed(format!("CSV header error: {}", e)))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| malformed(format!("missing {} column", name)))
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| malformed(format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| malformed(format!("invalid date '{}': {}", date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str
                .parse()
                .map_err(|e| malformed(format!("invalid close '{}': {}", close_str, e)))?;

            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        tracing::debug!(symbol, points = points.len(), %start_date, %end_date, "loaded prices");
        PriceSeries::new(symbol, points)
    }
}
