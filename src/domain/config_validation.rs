//! Configuration validation.
//!
//! Validates config fields before a backtest or the live loop runs.

use crate::domain::error::RsiTraderError;
use crate::domain::live::{min_lookback_days, DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::domain::signal::Thresholds;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    validate_data_dir(config)?;
    validate_symbol(config, "backtest", "symbol")?;
    validate_symbol(config, "backtest", "benchmark_symbol")?;
    validate_dates(config)?;
    validate_risk_free_rate(config)?;
    validate_rsi(config)?;
    Ok(())
}

pub fn validate_live_config(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    validate_data_dir(config)?;
    validate_symbol(config, "backtest", "symbol")?;
    validate_rsi(config)?;
    validate_order_quantity(config)?;
    validate_polling(config)?;
    validate_time_in_force(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RsiTraderError {
    RsiTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    match config.get_string("data", "csv_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("data", "csv_dir", "csv_dir must not be empty")),
        None => Err(RsiTraderError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), RsiTraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid(section, key, "symbol must not be empty")),
        None => Err(RsiTraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RsiTraderError> {
    match value {
        None => Err(RsiTraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_rsi(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    if config.get_int("rsi", "period", 14) < 1 {
        return Err(invalid("rsi", "period", "period must be positive"));
    }

    let oversold = config.get_double("rsi", "oversold", 30.0);
    let overbought = config.get_double("rsi", "overbought", 70.0);
    Thresholds::new(oversold, overbought).map_err(|e| invalid("rsi", e.key, &e.reason))?;

    if let Some(smoothing) = config.get_string("rsi", "smoothing") {
        smoothing
            .parse::<crate::domain::indicator::Smoothing>()
            .map_err(|reason| invalid("rsi", "smoothing", &reason))?;
    }
    Ok(())
}

fn validate_order_quantity(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    if config.get_string("live", "order_quantity").is_none() {
        return Err(RsiTraderError::ConfigMissing {
            section: "live".to_string(),
            key: "order_quantity".to_string(),
        });
    }
    if config.get_int("live", "order_quantity", 0) < 1 {
        return Err(invalid(
            "live",
            "order_quantity",
            "order_quantity must be a positive integer",
        ));
    }
    Ok(())
}

fn validate_polling(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    if config.get_int("live", "polling_interval_seconds", 86_400) < 1 {
        return Err(invalid(
            "live",
            "polling_interval_seconds",
            "polling_interval_seconds must be positive",
        ));
    }
    let period = config.get_int("rsi", "period", 14);
    let lookback_days = config.get_int("live", "lookback_days", DEFAULT_LOOKBACK_DAYS);
    if lookback_days < min_lookback_days(period) {
        return Err(invalid(
            "live",
            "lookback_days",
            &format!(
                "lookback_days must be at least {} calendar days to cover {} daily closes",
                min_lookback_days(period),
                period.saturating_add(1)
            ),
        ));
    }
    if lookback_days > MAX_LOOKBACK_DAYS {
        return Err(invalid(
            "live",
            "lookback_days",
            &format!("lookback_days must not exceed {}", MAX_LOOKBACK_DAYS),
        ));
    }
    if config.get_int("live", "max_retries", 3) < 0 {
        return Err(invalid("live", "max_retries", "max_retries must be non-negative"));
    }
    Ok(())
}

fn validate_time_in_force(config: &dyn ConfigPort) -> Result<(), RsiTraderError> {
    if let Some(tif) = config.get_string("live", "time_in_force") {
        tif.parse::<crate::domain::decision::TimeInForce>()
            .map_err(|reason| invalid("live", "time_in_force", &reason))?;
    }
    Ok(())
}
