//! Closing price series.

use crate::domain::error::RsiTraderError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered closing prices for one symbol. Dates strictly increase and every
/// close is positive and finite; the series is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, RsiTraderError> {
        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(RsiTraderError::InvalidPriceSeries {
                    reason: format!("close {} on {} must be positive", point.close, point.date),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(RsiTraderError::InvalidPriceSeries {
                    reason: format!(
                        "dates must strictly increase ({} followed by {})",
                        points[i - 1].date,
                        point.date
                    ),
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}
