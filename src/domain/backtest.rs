//! Signal-driven backtest against a buy-and-hold benchmark.
//!
//! The signal at t-1 sets the exposure for the return realized at t, so no
//! point ever trades on its own close. Both the strategy and the benchmark
//! go through `simple_returns` and `cumulative_returns`.

use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::{IndicatorSeries, Smoothing};
use crate::domain::metrics::PerformanceSummary;
use crate::domain::price::PriceSeries;
use crate::domain::signal::{generate_signals, Signal, Thresholds};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub symbol: String,
    pub benchmark_symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rsi_period: usize,
    pub smoothing: Smoothing,
    pub thresholds: Thresholds,
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub signal: Option<Signal>,
    pub asset_return: Option<f64>,
    pub strategy_return: Option<f64>,
    pub cumulative: f64,
}

/// A cumulative-return curve with its timestamps, ready for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub points: Vec<BacktestPoint>,
    pub benchmark: CumulativeSeries,
    pub strategy_summary: PerformanceSummary,
    pub benchmark_summary: PerformanceSummary,
}

impl BacktestResult {
    /// (buy, sell) signal counts.
    pub fn signal_counts(&self) -> (usize, usize) {
        self.points
            .iter()
            .fold((0, 0), |(buys, sells), p| match p.signal {
                Some(Signal::Buy) => (buys + 1, sells),
                Some(Signal::Sell) => (buys, sells + 1),
                _ => (buys, sells),
            })
    }
}

/// `(price[t] - price[t-1]) / price[t-1]`; `None` at the first point.
pub fn simple_returns(prices: &PriceSeries) -> Vec<Option<f64>> {
    let points = prices.points();
    let mut returns = Vec::with_capacity(points.len());
    if points.is_empty() {
        return returns;
    }
    returns.push(None);
    returns.extend(
        points
            .windows(2)
            .map(|w| Some((w[1].close - w[0].close) / w[0].close)),
    );
    returns
}

/// `return[t] * exposure(signal[t-1])`. A missing previous signal counts as Hold.
pub fn strategy_returns(returns: &[Option<f64>], signals: &[Option<Signal>]) -> Vec<Option<f64>> {
    returns
        .iter()
        .enumerate()
        .map(|(t, r)| {
            let prev_signal = if t == 0 { None } else { signals.get(t - 1).copied().flatten() };
            let exposure = prev_signal.map_or(0.0, Signal::exposure);
            r.map(|r| r * exposure)
        })
        .collect()
}

/// Running product of `(1 + r)` seeded at 1.0. Undefined returns contribute a
/// factor of 1. A factor below zero is floored at zero.
pub fn cumulative_returns(returns: &[Option<f64>]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |acc, r| {
            let factor = (1.0 + r.unwrap_or(0.0)).max(0.0);
            *acc *= factor;
            Some(*acc)
        })
        .collect()
}

pub fn run_backtest(
    prices: &PriceSeries,
    benchmark: &PriceSeries,
    config: &BacktestConfig,
) -> BacktestResult {
    let rsi: IndicatorSeries = calculate_rsi(prices, config.rsi_period, config.smoothing);
    let signals = generate_signals(&rsi, &config.thresholds);
    let returns = simple_returns(prices);
    let strat_returns = strategy_returns(&returns, &signals);
    let cumulative = cumulative_returns(&strat_returns);

    let points: Vec<BacktestPoint> = prices
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| BacktestPoint {
            date: p.date,
            close: p.close,
            rsi: rsi.values[i].value,
            signal: signals[i],
            asset_return: returns[i],
            strategy_return: strat_returns[i],
            cumulative: cumulative[i],
        })
        .collect();

    let benchmark_curve = CumulativeSeries {
        symbol: benchmark.symbol().to_string(),
        dates: benchmark.dates(),
        values: cumulative_returns(&simple_returns(benchmark)),
    };

    let strategy_summary = PerformanceSummary::compute(&cumulative, config.risk_free_rate);
    let benchmark_summary =
        PerformanceSummary::compute(&benchmark_curve.values, config.risk_free_rate);

    tracing::info!(
        symbol = %prices.symbol(),
        benchmark = %benchmark.symbol(),
        points = points.len(),
        rsi_defined = rsi.defined_count(),
        strategy_total = strategy_summary.total_return,
        benchmark_total = benchmark_summary.total_return,
        "backtest complete"
    );

    BacktestResult {
        symbol: prices.symbol().to_string(),
        points,
        benchmark: benchmark_curve,
        strategy_summary,
        benchmark_summary,
    }
}
