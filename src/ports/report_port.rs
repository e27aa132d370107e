//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RsiTraderError;

/// Port for writing backtest reports: the strategy and benchmark cumulative
/// curves with their dates.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), RsiTraderError>;
}
