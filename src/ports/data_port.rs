//! Market data port trait.

use crate::domain::error::RsiTraderError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Closing prices for `symbol` between `start_date` and `end_date`
    /// inclusive. Fails with `DataUnavailable` for an unknown symbol or an
    /// unreachable provider, and `InvalidPriceSeries` for data that cannot be
    /// parsed.
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, RsiTraderError>;
}
