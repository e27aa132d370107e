//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain/loss is taken over the trailing `period` price changes:
//! - `Simple`: rolling arithmetic mean of each window
//! - `Wilder`: first average is the simple mean, then
//!   avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If avg_loss == 0 and avg_gain == 0 (flat window): RSI = 50
//!
//! Warmup: the first `period` points have no value (they lack `period` changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, Smoothing};
use crate::domain::price::PriceSeries;

/// Neutral RSI reported for a window with neither gains nor losses.
pub const FLAT_WINDOW_RSI: f64 = 50.0;

pub fn calculate_rsi(prices: &PriceSeries, period: usize, smoothing: Smoothing) -> IndicatorSeries {
    let points = prices.points();
    let mut values: Vec<IndicatorPoint> = points
        .iter()
        .map(|p| IndicatorPoint {
            date: p.date,
            value: None,
        })
        .collect();

    if period == 0 || points.len() <= period {
        return IndicatorSeries {
            period,
            smoothing,
            values,
        };
    }

    // gains[k] / losses[k] hold the change from point k to point k + 1.
    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .closes()
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in period..points.len() {
        let window = i - period..i;
        match smoothing {
            Smoothing::Simple => {
                // Summed per window so a flat window gives exact zeros.
                avg_gain = gains[window.clone()].iter().sum::<f64>() / n;
                avg_loss = losses[window].iter().sum::<f64>() / n;
            }
            Smoothing::Wilder if i == period => {
                avg_gain = gains[window.clone()].iter().sum::<f64>() / n;
                avg_loss = losses[window].iter().sum::<f64>() / n;
            }
            Smoothing::Wilder => {
                avg_gain = (avg_gain * (n - 1.0) + gains[i - 1]) / n;
                avg_loss = (avg_loss * (n - 1.0) + losses[i - 1]) / n;
            }
        }
        values[i].value = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    IndicatorSeries {
        period,
        smoothing,
        values,
    }
}

/// RSI from non-negative average gain and loss. A zero average loss gives 100,
/// or 50 when the average gain is zero too.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            FLAT_WINDOW_RSI
        } else {
            100.0
        }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
