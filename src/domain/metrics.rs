//! Performance statistics over a cumulative-return curve.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
}

impl PerformanceSummary {
    /// `cumulative` is a growth curve seeded at 1.0, one value per period.
    pub fn compute(cumulative: &[f64], risk_free_rate: f64) -> Self {
        let final_value = cumulative.last().copied().unwrap_or(1.0);
        let total_return = final_value - 1.0;

        let years = cumulative.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && final_value > 0.0 {
            final_value.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(cumulative);
        let sharpe_ratio = compute_sharpe(cumulative, risk_free_rate / TRADING_DAYS_PER_YEAR);

        PerformanceSummary {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
        }
    }
}

fn compute_drawdown(curve: &[f64]) -> (f64, usize) {
    let Some(&first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in curve {
        if value > peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 && value < peak {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_sharpe(curve: &[f64], daily_rf: f64) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        ((mean - daily_rf) / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
