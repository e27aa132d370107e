//! CLI integration tests: config building from INI text and the backtest
//! pipeline run against CSV files on disk.

mod common;

use chrono::NaiveDate;
use common::*;
use rsitrader::adapters::csv_adapter::CsvAdapter;
use rsitrader::adapters::csv_report_adapter::{CsvReportAdapter, HEADER};
use rsitrader::adapters::file_config_adapter::FileConfigAdapter;
use rsitrader::cli;
use rsitrader::domain::config_validation::{validate_backtest_config, validate_live_config};
use rsitrader::domain::decision::TimeInForce;
use rsitrader::domain::error::RsiTraderError;
use rsitrader::domain::indicator::Smoothing;
use std::time::Duration;

const VALID_INI: &str = r#"
[data]
csv_dir = /var/data/prices
interval = 1d

[backtest]
symbol = AAPL
benchmark_symbol = SPY
start_date = 2023-01-01
end_date = 2023-12-31
risk_free_rate = 0.02

[rsi]
period = 10
oversold = 25
overbought = 75
smoothing = wilder

[live]
order_quantity = 5
polling_interval_seconds = 3600
lookback_days = 45
time_in_force = gtc
max_retries = 2
retry_base_delay_ms = 100
retry_max_jitter_ms = 50
"#;

const MINIMAL_INI: &str = r#"
[data]
csv_dir = /var/data/prices

[backtest]
symbol = MSFT
benchmark_symbol = SPY
start_date = 2023-01-01
end_date = 2023-06-30

[live]
order_quantity = 1
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.benchmark_symbol, "SPY");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(config.rsi_period, 10);
        assert_eq!(config.smoothing, Smoothing::Wilder);
        assert!((config.thresholds.oversold - 25.0).abs() < f64::EPSILON);
        assert!((config.thresholds.overbought - 75.0).abs() < f64::EPSILON);
        assert!((config.risk_free_rate - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string(MINIMAL_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.smoothing, Smoothing::Simple);
        assert!((config.thresholds.oversold - 30.0).abs() < f64::EPSILON);
        assert!((config.thresholds.overbought - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.risk_free_rate, 0.0);
    }

    #[test]
    fn symbol_override_wins() {
        let adapter = FileConfigAdapter::from_string(MINIMAL_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, Some("NVDA")).unwrap();
        assert_eq!(config.symbol, "NVDA");

        let blank = cli::build_backtest_config(&adapter, Some("  ")).unwrap();
        assert_eq!(blank.symbol, "MSFT");
    }

    #[test]
    fn missing_benchmark_is_reported() {
        let ini = "[backtest]\nsymbol = AAPL\nstart_date = 2023-01-01\nend_date = 2023-02-01\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter, None).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigMissing { ref key, .. } if key == "benchmark_symbol"
        ));
    }

    #[test]
    fn malformed_date_is_invalid() {
        let ini = "[backtest]\nsymbol = AAPL\nbenchmark_symbol = SPY\n\
                   start_date = 01/01/2023\nend_date = 2023-02-01\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter, None).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "start_date"
        ));
    }

    #[test]
    fn inverted_thresholds_are_invalid() {
        let ini = format!("{}\n[rsi]\noversold = 80\noverbought = 20\n", MINIMAL_INI);
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_backtest_config(&adapter, None).unwrap_err();
        assert!(matches!(err, RsiTraderError::ConfigInvalid { ref section, .. } if section == "rsi"));
    }

    #[test]
    fn bad_overbought_is_reported_under_overbought() {
        let ini = format!("{}\n[rsi]\noverbought = 150\n", MINIMAL_INI);
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_backtest_config(&adapter, None).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "overbought"
        ));
        assert!(matches!(
            validate_backtest_config(&adapter),
            Err(RsiTraderError::ConfigInvalid { ref key, .. }) if key == "overbought"
        ));
    }

    #[test]
    fn oversized_lookback_fails_validation() {
        let ini = MINIMAL_INI.replace("order_quantity = 1", "order_quantity = 1\nlookback_days = 200000000000");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        assert!(matches!(
            validate_live_config(&adapter),
            Err(RsiTraderError::ConfigInvalid { ref key, .. }) if key == "lookback_days"
        ));
    }

    #[test]
    fn unknown_smoothing_is_invalid() {
        let ini = format!("{}\n[rsi]\nsmoothing = exponential\n", MINIMAL_INI);
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_backtest_config(&adapter, None).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "smoothing"
        ));
    }

    #[test]
    fn build_live_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_live_config(&adapter, None).unwrap();

        assert_eq!(config.decision.symbol, "AAPL");
        assert_eq!(config.decision.order_quantity, 5);
        assert_eq!(config.decision.time_in_force, TimeInForce::Gtc);
        assert_eq!(config.rsi_period, 10);
        assert_eq!(config.smoothing, Smoothing::Wilder);
        assert_eq!(config.interval, "1d");
        assert_eq!(config.lookback_days, 45);
        assert_eq!(config.polling_interval, Duration::from_secs(3600));
        // max_retries counts retries, not attempts
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(100));
        assert_eq!(config.retry.max_jitter, Duration::from_millis(50));
    }

    #[test]
    fn build_live_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string(MINIMAL_INI).unwrap();
        let config = cli::build_live_config(&adapter, None).unwrap();

        assert_eq!(config.decision.order_quantity, 1);
        assert_eq!(config.decision.time_in_force, TimeInForce::Day);
        assert_eq!(config.interval, "1d");
        assert_eq!(config.lookback_days, 60);
        assert_eq!(config.polling_interval, Duration::from_secs(86_400));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn live_config_requires_order_quantity() {
        let ini = "[backtest]\nsymbol = AAPL\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_live_config(&adapter, None).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "order_quantity"
        ));
    }

    #[test]
    fn live_config_rejects_unknown_time_in_force() {
        let ini = "[backtest]\nsymbol = AAPL\n[live]\norder_quantity = 3\ntime_in_force = ioc\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_live_config(&adapter, Some("TSLA")).unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "time_in_force"
        ));
    }

    #[test]
    fn validation_accepts_full_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert!(validate_backtest_config(&adapter).is_ok());
        assert!(validate_live_config(&adapter).is_ok());
    }

    #[test]
    fn validation_requires_data_dir() {
        let ini = "[backtest]\nsymbol = AAPL\nbenchmark_symbol = SPY\n\
                   start_date = 2023-01-01\nend_date = 2023-02-01\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        assert!(matches!(
            validate_backtest_config(&adapter),
            Err(RsiTraderError::ConfigMissing { ref section, .. }) if section == "data"
        ));
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rsitrader.ini");
        std::fs::write(&path, VALID_INI).unwrap();

        let adapter = cli::load_config(&path).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();
        assert_eq!(config.symbol, "AAPL");
    }

    #[test]
    fn load_config_missing_file_fails() {
        let path = std::path::PathBuf::from("/nonexistent/rsitrader.ini");
        assert!(cli::load_config(&path).is_err());
    }
}

mod pipeline {
    use super::*;
    use std::fmt::Write;
    use std::path::Path;

    fn write_prices(dir: &Path, symbol: &str, start: NaiveDate, closes: &[f64]) {
        let mut content = String::from("date,close\n");
        for (i, close) in closes.iter().enumerate() {
            let d = start + chrono::Duration::days(i as i64);
            writeln!(content, "{},{}", d.format("%Y-%m-%d"), close).unwrap();
        }
        std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
    }

    fn ini_for(dir: &Path) -> String {
        format!(
            "[data]\ncsv_dir = {}\n\n[backtest]\nsymbol = AAPL\nbenchmark_symbol = SPY\n\
             start_date = 2024-01-01\nend_date = 2024-01-31\n\n[rsi]\nperiod = 3\n",
            dir.display()
        )
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let start = date(2024, 1, 1);
        write_prices(
            dir.path(),
            "AAPL",
            start,
            &[100.0, 98.0, 96.0, 94.0, 95.0, 97.0, 99.0, 101.0, 103.0, 102.0],
        );
        write_prices(
            dir.path(),
            "SPY",
            start,
            &[400.0, 401.0, 402.0, 403.0, 404.0, 405.0, 406.0, 407.0, 408.0, 409.0],
        );
        dir
    }

    #[test]
    fn end_to_end_writes_report() {
        let dir = setup();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path())).unwrap();
        assert!(validate_backtest_config(&adapter).is_ok());
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let report_path = dir.path().join("report.csv");
        let result = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1d",
            Some(report_path.to_str().unwrap()),
        )
        .unwrap();

        assert_eq!(result.points.len(), 10);
        assert_eq!(result.benchmark.values.len(), 10);
        // three straight falls -> RSI 0 -> BUY on day 4
        assert_eq!(result.points[3].rsi, Some(0.0));
        let (buys, _) = result.signal_counts();
        assert!(buys >= 1);

        let report = std::fs::read_to_string(&report_path).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], HEADER.join(","));
        assert!(lines[4].starts_with("2024-01-04,94.0000,0.00,BUY,"));
    }

    #[test]
    fn buy_signal_captures_following_return() {
        let dir = setup();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path())).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let result = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1d",
            None,
        )
        .unwrap();

        // long from the day-4 BUY into day 5: 94 -> 95
        let day5 = &result.points[4];
        let expected = (95.0 - 94.0) / 94.0;
        assert!((day5.strategy_return.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn date_range_filters_rows() {
        let dir = setup();
        let ini = ini_for(dir.path()).replace("end_date = 2024-01-31", "end_date = 2024-01-05");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let result = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1d",
            None,
        )
        .unwrap();
        assert_eq!(result.points.len(), 5);
        assert_eq!(result.points.last().unwrap().date, date(2024, 1, 5));
    }

    #[test]
    fn unsupported_interval_is_a_config_error() {
        let dir = setup();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path())).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let err = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1h",
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::ConfigInvalid { ref key, .. } if key == "interval"
        ));
    }

    #[test]
    fn missing_benchmark_file_fails() {
        let dir = setup();
        std::fs::remove_file(dir.path().join("SPY.csv")).unwrap();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path())).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let err = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1d",
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RsiTraderError::DataUnavailable { ref symbol, .. } if symbol == "SPY"
        ));
    }

    #[test]
    fn unwritable_report_path_fails() {
        let dir = setup();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path())).unwrap();
        let config = cli::build_backtest_config(&adapter, None).unwrap();

        let err = cli::run_backtest_pipeline(
            &CsvAdapter::new(dir.path().to_path_buf()),
            &CsvReportAdapter::new(),
            &config,
            "1d",
            Some("/nonexistent/dir/report.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, RsiTraderError::Report { .. }));
    }
}
