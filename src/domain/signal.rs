//! Level-based RSI trading signals.
//!
//! A signal depends only on the RSI value at the same point: below the
//! oversold level is Buy, above the overbought level is Sell, anything else
//! is Hold. This is not a crossing detector; an RSI that stays below the
//! oversold level emits Buy on every point.

use crate::domain::indicator::IndicatorSeries;
use std::fmt;

pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Market exposure the signal implies for the next period.
    pub fn exposure(self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Hold => 0.0,
            Signal::Sell => -1.0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }
}

/// A rejected threshold level and the config key it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdError {
    pub key: &'static str,
    pub reason: String,
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

impl Thresholds {
    /// Levels must satisfy 0 <= oversold < overbought <= 100.
    pub fn new(oversold: f64, overbought: f64) -> Result<Self, ThresholdError> {
        let error = |key, reason: &str| ThresholdError {
            key,
            reason: reason.to_string(),
        };
        if !(0.0..=100.0).contains(&oversold) {
            return Err(error("oversold", "must lie within [0, 100]"));
        }
        if !(0.0..=100.0).contains(&overbought) {
            return Err(error("overbought", "must lie within [0, 100]"));
        }
        if oversold >= overbought {
            return Err(error("oversold", "must be below overbought"));
        }
        Ok(Self {
            oversold,
            overbought,
        })
    }
}

pub fn classify(rsi: f64, thresholds: &Thresholds) -> Signal {
    if rsi < thresholds.oversold {
        Signal::Buy
    } else if rsi > thresholds.overbought {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// One entry per RSI point; `None` wherever the RSI is still warming up.
pub fn generate_signals(rsi: &IndicatorSeries, thresholds: &Thresholds) -> Vec<Option<Signal>> {
    rsi.values
        .iter()
        .map(|p| p.value.map(|v| classify(v, thresholds)))
        .collect()
}
