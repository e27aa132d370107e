//! Per-tick order decision.
//!
//! `decide` is a pure function of the current RSI and the position size the
//! brokerage reports. Nothing is remembered between ticks; the brokerage is
//! the only source of truth for holdings.

use crate::domain::signal::Thresholds;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// A holding as reported by the brokerage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    NoPosition,
    HasPosition(u64),
}

impl PositionState {
    pub fn from_quantity(quantity: u64) -> Self {
        if quantity == 0 {
            PositionState::NoPosition
        } else {
            PositionState::HasPosition(quantity)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeInForce {
    #[default]
    Day,
    Gtc,
}

impl FromStr for TimeInForce {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimeInForce::Day),
            "gtc" => Ok(TimeInForce::Gtc),
            other => Err(format!("unknown time_in_force '{other}' (expected day or gtc)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub symbol: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    /// Unique per tick. Retries within a tick resubmit the same intent, so
    /// the brokerage can deduplicate them; a later tick never reuses it.
    pub client_order_id: String,
}

/// Brokerage acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// RSI has no value yet (not enough history).
    NoRsi,
    /// RSI between the thresholds, or a signal that does not apply to the
    /// current position.
    NoTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Submit(OrderIntent),
    Hold(HoldReason),
}

/// When, and on which tick of the loop, a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStamp {
    pub at: NaiveDateTime,
    pub tick: u64,
}

#[derive(Debug, Clone)]
pub struct DecisionConfig {
    pub symbol: String,
    pub thresholds: Thresholds,
    pub order_quantity: u64,
    pub time_in_force: TimeInForce,
}

/// NoPosition + RSI < oversold buys the configured quantity; HasPosition +
/// RSI > overbought sells the whole holding; everything else holds.
pub fn decide(
    rsi: Option<f64>,
    position_quantity: u64,
    config: &DecisionConfig,
    stamp: OrderStamp,
) -> Decision {
    let Some(rsi) = rsi else {
        return Decision::Hold(HoldReason::NoRsi);
    };

    let order = match PositionState::from_quantity(position_quantity) {
        PositionState::NoPosition if rsi < config.thresholds.oversold && config.order_quantity > 0 => {
            Some((OrderSide::Buy, config.order_quantity))
        }
        PositionState::HasPosition(held) if rsi > config.thresholds.overbought => {
            Some((OrderSide::Sell, held))
        }
        _ => None,
    };

    match order {
        Some((side, quantity)) => Decision::Submit(OrderIntent {
            symbol: config.symbol.clone(),
            quantity,
            side,
            kind: OrderKind::Market,
            time_in_force: config.time_in_force,
            client_order_id: client_order_id(&config.symbol, side, stamp),
        }),
        None => Decision::Hold(HoldReason::NoTrigger),
    }
}

fn client_order_id(symbol: &str, side: OrderSide, stamp: OrderStamp) -> String {
    format!(
        "rsi-{}-{}-{}-{}",
        symbol.to_lowercase(),
        side,
        stamp.at.format("%Y%m%dT%H%M%S"),
        stamp.tick
    )
}
