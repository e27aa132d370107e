//! Live polling decision loop.
//!
//! Each tick re-fetches price history, recomputes RSI, asks the brokerage for
//! the current holding and submits at most one order. Ticks run strictly one
//! after another. Between ticks the loop waits on a [`StopSignal`], so a stop
//! request ends the wait immediately instead of after a full interval.
//!
//! A failed fetch or brokerage call ends the tick without an order and the
//! loop carries on at the next interval.
//!
//! Orders are tagged with the tick's timestamp and sequence number. Retries
//! inside a tick resubmit the same tag; a later tick always gets a new one.

use crate::domain::decision::{decide, Decision, DecisionConfig, HoldReason, OrderAck, OrderStamp};
use crate::domain::error::RsiTraderError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::Smoothing;
use crate::domain::retry::{retry, RetryPolicy};
use crate::ports::brokerage_port::BrokeragePort;
use crate::ports::clock_port::ClockPort;
use crate::ports::data_port::MarketDataPort;
use std::cell::Cell;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 60;
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
/// Extra calendar days on top of the weekend allowance, for market holidays.
pub const LOOKBACK_MARGIN_DAYS: i64 = 10;

/// Calendar days needed to cover `period + 1` daily closes: five trading days
/// per seven calendar days, plus a holiday margin.
pub fn min_lookback_days(period: i64) -> i64 {
    period
        .saturating_add(1)
        .saturating_mul(7)
        / 5
        + LOOKBACK_MARGIN_DAYS
}

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub decision: DecisionConfig,
    pub rsi_period: usize,
    pub smoothing: Smoothing,
    pub interval: String,
    /// Calendar days of history fetched each tick, ending today.
    pub lookback_days: i64,
    pub polling_interval: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug)]
pub enum TickOutcome {
    Submitted(OrderAck),
    Held {
        rsi: Option<f64>,
        reason: HoldReason,
    },
    Rejected {
        reason: String,
    },
    Failed(RsiTraderError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub iterations: usize,
    pub submitted: usize,
    pub held: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl LoopSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.iterations += 1;
        match outcome {
            TickOutcome::Submitted(_) => self.submitted += 1,
            TickOutcome::Held { .. } => self.held += 1,
            TickOutcome::Rejected { .. } => self.rejected += 1,
            TickOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Cloneable stop flag shared between the loop and whoever terminates it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Waits up to `timeout`; returns true if stopped before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (stopped, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *stopped
    }
}

pub struct LiveLoop<'a> {
    data: &'a dyn MarketDataPort,
    broker: &'a dyn BrokeragePort,
    clock: &'a dyn ClockPort,
    config: LiveConfig,
    ticks: Cell<u64>,
}

impl<'a> LiveLoop<'a> {
    pub fn new(
        data: &'a dyn MarketDataPort,
        broker: &'a dyn BrokeragePort,
        clock: &'a dyn ClockPort,
        config: LiveConfig,
    ) -> Self {
        Self {
            data,
            broker,
            clock,
            config,
            ticks: Cell::new(0),
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    /// Runs ticks until `stop` fires or `max_iterations` ticks have completed.
    pub fn run(&self, stop: &StopSignal, max_iterations: Option<usize>) -> LoopSummary {
        let symbol = &self.config.decision.symbol;
        tracing::info!(
            symbol = %symbol,
            polling_secs = self.config.polling_interval.as_secs(),
            max_iterations = ?max_iterations,
            "starting live decision loop"
        );

        let mut summary = LoopSummary::default();
        let limit_reached = |s: &LoopSummary| max_iterations.is_some_and(|m| s.iterations >= m);

        while !stop.is_stopped() && !limit_reached(&summary) {
            let outcome = self.run_iteration();
            summary.record(&outcome);

            if limit_reached(&summary) || stop.wait_timeout(self.config.polling_interval) {
                break;
            }
        }

        tracing::info!(symbol = %symbol, ?summary, "live decision loop stopped");
        summary
    }

    /// One tick: fetch, compute RSI, read position, decide, submit.
    pub fn run_iteration(&self) -> TickOutcome {
        let cfg = &self.config;
        let symbol = cfg.decision.symbol.as_str();
        let tick = self.ticks.get() + 1;
        self.ticks.set(tick);
        let now = self.clock.now();
        let today = now.date();

        let Some(start) = chrono::TimeDelta::try_days(cfg.lookback_days)
            .and_then(|window| today.checked_sub_signed(window))
        else {
            let e = RsiTraderError::ConfigInvalid {
                section: "live".into(),
                key: "lookback_days".into(),
                reason: format!("{} days before {} is out of range", cfg.lookback_days, today),
            };
            tracing::error!(symbol, error = %e, "history window out of range, holding");
            return TickOutcome::Failed(e);
        };

        let prices = match retry(&cfg.retry, "fetch prices", || {
            self.data.fetch(symbol, start, today, &cfg.interval)
        }) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(symbol, error = %e, "price fetch failed, holding");
                return TickOutcome::Failed(e);
            }
        };

        let rsi = calculate_rsi(&prices, cfg.rsi_period, cfg.smoothing).latest();
        let last_close = prices.last().map(|p| p.close);

        let quantity = match retry(&cfg.retry, "list positions", || {
            self.broker.position_quantity(symbol)
        }) {
            Ok(q) => q,
            Err(e) => {
                tracing::error!(symbol, error = %e, "position query failed, holding");
                return TickOutcome::Failed(e);
            }
        };

        match decide(rsi, quantity, &cfg.decision, OrderStamp { at: now, tick }) {
            Decision::Hold(reason) => {
                tracing::info!(symbol, tick, ?rsi, ?last_close, quantity, ?reason, "holding");
                TickOutcome::Held { rsi, reason }
            }
            Decision::Submit(order) => {
                tracing::info!(
                    symbol,
                    tick,
                    ?rsi,
                    ?last_close,
                    quantity,
                    side = %order.side,
                    order_quantity = order.quantity,
                    client_order_id = %order.client_order_id,
                    "submitting order"
                );
                match retry(&cfg.retry, "submit order", || self.broker.submit_order(&order)) {
                    Ok(ack) => {
                        tracing::info!(symbol, order_id = %ack.order_id, "order accepted");
                        TickOutcome::Submitted(ack)
                    }
                    Err(RsiTraderError::OrderRejected { reason, .. }) => {
                        tracing::warn!(symbol, %reason, "order rejected");
                        TickOutcome::Rejected { reason }
                    }
                    Err(e) => {
                        tracing::error!(symbol, error = %e, "order submission failed");
                        TickOutcome::Failed(e)
                    }
                }
            }
        }
    }
}
