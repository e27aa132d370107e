//! Technical indicator types.
//!
//! - `IndicatorPoint`: one aligned point; `value` is `None` during warm-up
//! - `Smoothing`: how average gain/loss is formed
//! - `IndicatorSeries`: a series aligned one-to-one with its price series

pub mod rsi;

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// Rolling simple mean over the trailing window.
    #[default]
    Simple,
    /// Wilder's recursive smoothing, seeded with the first simple mean.
    Wilder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub period: usize,
    pub smoothing: Smoothing,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at the final point, if it is past warm-up.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().and_then(|p| p.value)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Smoothing::Simple => write!(f, "simple"),
            Smoothing::Wilder => write!(f, "wilder"),
        }
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "sma" => Ok(Smoothing::Simple),
            "wilder" => Ok(Smoothing::Wilder),
            other => Err(format!("unknown smoothing '{other}' (expected simple or wilder)")),
        }
    }
}
