#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rsitrader::domain::decision::{DecisionConfig, OrderAck, OrderIntent, OrderSide, Position, TimeInForce};
use rsitrader::domain::error::RsiTraderError;
use rsitrader::domain::indicator::Smoothing;
use rsitrader::domain::live::LiveConfig;
use rsitrader::domain::price::{PricePoint, PriceSeries};
use rsitrader::domain::retry::RetryPolicy;
use rsitrader::domain::signal::Thresholds;
use rsitrader::ports::brokerage_port::BrokeragePort;
use rsitrader::ports::clock_port::ClockPort;
use rsitrader::ports::data_port::MarketDataPort;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily points ending on `end`.
pub fn series_ending(symbol: &str, end: NaiveDate, closes: &[f64]) -> PriceSeries {
    let n = closes.len() as i64;
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: end - chrono::Duration::days(n - 1 - i as i64),
            close,
        })
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

pub fn series_from(symbol: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

/// Closes whose trailing 14-change window gives the requested RSI:
/// `gains` rises of 1.0 followed by `14 - gains` falls of 1.0 at the end.
pub fn closes_with_rsi_window(gains: usize) -> Vec<f64> {
    let mut closes = vec![100.0];
    for _ in 0..gains {
        closes.push(closes.last().unwrap() + 1.0);
    }
    for _ in gains..14 {
        closes.push(closes.last().unwrap() - 1.0);
    }
    closes
}

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    /// Errors returned before data, one per call, front first.
    pub failures: RefCell<VecDeque<RsiTraderError>>,
    pub calls: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures: RefCell::new(VecDeque::new()),
            calls: Cell::new(0),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.symbol().to_string(), series);
        self
    }

    pub fn fail_next(self, count: usize) -> Self {
        for _ in 0..count {
            self.failures
                .borrow_mut()
                .push_back(RsiTraderError::DataUnavailable {
                    symbol: "any".into(),
                    reason: "provider unreachable".into(),
                });
        }
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _interval: &str,
    ) -> Result<PriceSeries, RsiTraderError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(err) = self.failures.borrow_mut().pop_front() {
            return Err(err);
        }
        let series = self
            .data
            .get(symbol)
            .ok_or_else(|| RsiTraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "unknown symbol".into(),
            })?;
        let points = series
            .points()
            .iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .copied()
            .collect();
        PriceSeries::new(symbol, points)
    }
}

/// Serves one close history per fetch, in order, ending on the requested
/// end date. The last history repeats once the script runs out.
pub struct ScriptedDataPort {
    histories: RefCell<VecDeque<Vec<f64>>>,
}

impl ScriptedDataPort {
    pub fn new(histories: Vec<Vec<f64>>) -> Self {
        Self {
            histories: RefCell::new(histories.into()),
        }
    }
}

impl MarketDataPort for ScriptedDataPort {
    fn fetch(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        end_date: NaiveDate,
        _interval: &str,
    ) -> Result<PriceSeries, RsiTraderError> {
        let mut histories = self.histories.borrow_mut();
        let closes = if histories.len() > 1 {
            histories.pop_front()
        } else {
            histories.front().cloned()
        }
        .ok_or_else(|| RsiTraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "script exhausted".into(),
        })?;
        Ok(series_ending(symbol, end_date, &closes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerFailure {
    Unavailable,
    Reject,
}

pub struct MockBroker {
    pub positions: RefCell<Vec<Position>>,
    pub submitted: RefCell<Vec<OrderIntent>>,
    pub position_failures: Cell<usize>,
    pub submit_failures: RefCell<VecDeque<BrokerFailure>>,
    pub position_calls: Cell<usize>,
    pub submit_calls: Cell<usize>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            positions: RefCell::new(Vec::new()),
            submitted: RefCell::new(Vec::new()),
            position_failures: Cell::new(0),
            submit_failures: RefCell::new(VecDeque::new()),
            position_calls: Cell::new(0),
            submit_calls: Cell::new(0),
        }
    }

    pub fn holding(self, symbol: &str, quantity: u64) -> Self {
        self.positions.borrow_mut().push(Position {
            symbol: symbol.to_string(),
            quantity,
        });
        self
    }

    pub fn fail_positions(self, count: usize) -> Self {
        self.position_failures.set(count);
        self
    }

    pub fn fail_submit(self, failure: BrokerFailure) -> Self {
        self.submit_failures.borrow_mut().push_back(failure);
        self
    }
}

impl BrokeragePort for MockBroker {
    fn list_positions(&self) -> Result<Vec<Position>, RsiTraderError> {
        self.position_calls.set(self.position_calls.get() + 1);
        if self.position_failures.get() > 0 {
            self.position_failures.set(self.position_failures.get() - 1);
            return Err(RsiTraderError::BrokerageUnavailable {
                reason: "positions endpoint down".into(),
            });
        }
        Ok(self.positions.borrow().clone())
    }

    fn submit_order(&self, order: &OrderIntent) -> Result<OrderAck, RsiTraderError> {
        self.submit_calls.set(self.submit_calls.get() + 1);
        match self.submit_failures.borrow_mut().pop_front() {
            Some(BrokerFailure::Unavailable) => {
                return Err(RsiTraderError::BrokerageUnavailable {
                    reason: "gateway timeout".into(),
                });
            }
            Some(BrokerFailure::Reject) => {
                return Err(RsiTraderError::OrderRejected {
                    symbol: order.symbol.clone(),
                    reason: "insufficient buying power".into(),
                });
            }
            None => {}
        }
        self.submitted.borrow_mut().push(order.clone());
        Ok(OrderAck {
            order_id: format!("mock-{}", self.submitted.borrow().len()),
            client_order_id: order.client_order_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
        })
    }
}

/// A clock frozen at 09:30 on the given date.
pub struct FixedClock(pub NaiveDate);

impl ClockPort for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.and_hms_opt(9, 30, 0).unwrap()
    }
}

pub fn live_config(symbol: &str, order_quantity: u64) -> LiveConfig {
    LiveConfig {
        decision: DecisionConfig {
            symbol: symbol.to_string(),
            thresholds: Thresholds::default(),
            order_quantity,
            time_in_force: TimeInForce::Day,
        },
        rsi_period: 14,
        smoothing: Smoothing::Simple,
        interval: "1d".into(),
        lookback_days: 60,
        polling_interval: Duration::ZERO,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        },
    }
}

pub fn submitted_sides(broker: &MockBroker) -> Vec<(OrderSide, u64)> {
    broker
        .submitted
        .borrow()
        .iter()
        .map(|o| (o.side, o.quantity))
        .collect()
}
