//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::system_clock::SystemClock;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_backtest_config, validate_live_config};
use crate::domain::decision::{DecisionConfig, TimeInForce};
use crate::domain::error::RsiTraderError;
use crate::domain::indicator::Smoothing;
use crate::domain::live::{
    LiveConfig, LiveLoop, StopSignal, DEFAULT_LOOKBACK_DAYS, DEFAULT_POLLING_INTERVAL_SECS,
};
use crate::domain::metrics::PerformanceSummary;
use crate::domain::retry::RetryPolicy;
use crate::domain::signal::{Thresholds, DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_RSI_PERIOD: i64 = 14;
pub const DEFAULT_INTERVAL: &str = "1d";

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "RSI signal backtester and live decision loop")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the RSI strategy against a benchmark
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Run the live decision loop against the paper broker
    Live {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Stop after this many ticks
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::Targets::new().with_target("rsitrader", level));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
        } => run_backtest_command(&config, output.as_ref(), symbol.as_deref()),
        Command::Live {
            config,
            symbol,
            iterations,
        } => run_live_command(&config, symbol.as_deref(), iterations),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RsiTraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest_command(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let bt_config = match build_backtest_config(&adapter, symbol_override) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(csv_dir(&adapter));
    let data_interval = interval(&adapter);
    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output_path"));

    match run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        &bt_config,
        &data_interval,
        output.as_deref(),
    ) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_live_command(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    iterations: Option<usize>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_live_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let live_config = match build_live_config(&adapter, symbol_override) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(csv_dir(&adapter));
    let broker = PaperBroker::new();
    let clock = SystemClock;
    let live = LiveLoop::new(&data_port, &broker, &clock, live_config);
    eprintln!(
        "Trading {} every {}s against the paper broker",
        live.config().decision.symbol,
        live.config().polling_interval.as_secs()
    );

    // Runs until the process is terminated or the iteration limit is reached.
    let stop = StopSignal::new();
    let summary = live.run(&stop, iterations);

    println!(
        "Ticks: {}  submitted: {}  held: {}  rejected: {}  failed: {}",
        summary.iterations, summary.submitted, summary.held, summary.rejected, summary.failed
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let backtest = validate_backtest_config(&adapter);
    let live = validate_live_config(&adapter);

    match (&backtest, &live) {
        (Err(e), _) => {
            eprintln!("error: {e}");
            e.into()
        }
        (Ok(()), Err(e)) => {
            eprintln!("Backtest configuration is valid");
            eprintln!("error: live section invalid: {e}");
            e.into()
        }
        (Ok(()), Ok(())) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
    }
}

fn csv_dir(adapter: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(adapter.get_string("data", "csv_dir").unwrap_or_default())
}

fn interval(adapter: &dyn ConfigPort) -> String {
    adapter
        .get_string("data", "interval")
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string())
}

fn required_string(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, RsiTraderError> {
    adapter
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RsiTraderError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn resolve_symbol(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<String, RsiTraderError> {
    match symbol_override {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => required_string(adapter, "backtest", "symbol"),
    }
}

fn rsi_settings(adapter: &dyn ConfigPort) -> Result<(usize, Smoothing, Thresholds), RsiTraderError> {
    let period = adapter.get_int("rsi", "period", DEFAULT_RSI_PERIOD);
    if period < 1 {
        return Err(RsiTraderError::ConfigInvalid {
            section: "rsi".into(),
            key: "period".into(),
            reason: "period must be positive".into(),
        });
    }

    let smoothing = match adapter.get_string("rsi", "smoothing") {
        Some(s) => s.parse::<Smoothing>().map_err(|reason| RsiTraderError::ConfigInvalid {
            section: "rsi".into(),
            key: "smoothing".into(),
            reason,
        })?,
        None => Smoothing::default(),
    };

    let thresholds = Thresholds::new(
        adapter.get_double("rsi", "oversold", DEFAULT_OVERSOLD),
        adapter.get_double("rsi", "overbought", DEFAULT_OVERBOUGHT),
    )
    .map_err(|e| RsiTraderError::ConfigInvalid {
        section: "rsi".into(),
        key: e.key.into(),
        reason: e.reason,
    })?;

    Ok((period as usize, smoothing, thresholds))
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, RsiTraderError> {
    let symbol = resolve_symbol(adapter, symbol_override)?;
    let benchmark_symbol = required_string(adapter, "backtest", "benchmark_symbol")?;
    let start_date = parse_date(adapter.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string("backtest", "end_date").as_deref(), "end_date")?;
    let (rsi_period, smoothing, thresholds) = rsi_settings(adapter)?;

    Ok(BacktestConfig {
        symbol,
        benchmark_symbol,
        start_date,
        end_date,
        rsi_period,
        smoothing,
        thresholds,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn build_live_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<LiveConfig, RsiTraderError> {
    let symbol = resolve_symbol(adapter, symbol_override)?;
    let (rsi_period, smoothing, thresholds) = rsi_settings(adapter)?;

    let order_quantity = adapter.get_int("live", "order_quantity", 0);
    if order_quantity < 1 {
        return Err(RsiTraderError::ConfigInvalid {
            section: "live".into(),
            key: "order_quantity".into(),
            reason: "order_quantity must be a positive integer".into(),
        });
    }

    let time_in_force = match adapter.get_string("live", "time_in_force") {
        Some(s) => s.parse::<TimeInForce>().map_err(|reason| RsiTraderError::ConfigInvalid {
            section: "live".into(),
            key: "time_in_force".into(),
            reason,
        })?,
        None => TimeInForce::default(),
    };

    let polling_secs = adapter
        .get_int("live", "polling_interval_seconds", DEFAULT_POLLING_INTERVAL_SECS as i64)
        .max(0) as u64;
    let max_retries = adapter.get_int("live", "max_retries", 3).max(0) as u32;

    Ok(LiveConfig {
        decision: DecisionConfig {
            symbol,
            thresholds,
            order_quantity: order_quantity as u64,
            time_in_force,
        },
        rsi_period,
        smoothing,
        interval: interval(adapter),
        lookback_days: adapter.get_int("live", "lookback_days", DEFAULT_LOOKBACK_DAYS),
        polling_interval: Duration::from_secs(polling_secs),
        retry: RetryPolicy {
            max_attempts: max_retries + 1,
            base_delay: Duration::from_millis(
                adapter.get_int("live", "retry_base_delay_ms", 500).max(0) as u64,
            ),
            max_jitter: Duration::from_millis(
                adapter.get_int("live", "retry_max_jitter_ms", 250).max(0) as u64,
            ),
        },
    })
}

/// Fetch both series, backtest, and optionally write the report.
pub fn run_backtest_pipeline(
    data_port: &dyn MarketDataPort,
    report_port: &dyn ReportPort,
    config: &BacktestConfig,
    interval: &str,
    output_path: Option<&str>,
) -> Result<BacktestResult, RsiTraderError> {
    let prices = data_port.fetch(&config.symbol, config.start_date, config.end_date, interval)?;
    let benchmark = data_port.fetch(
        &config.benchmark_symbol,
        config.start_date,
        config.end_date,
        interval,
    )?;

    if prices.len() <= config.rsi_period {
        tracing::warn!(
            symbol = %config.symbol,
            points = prices.len(),
            period = config.rsi_period,
            "not enough history for any RSI value"
        );
    }

    let result = run_backtest(&prices, &benchmark, config);

    if let Some(path) = output_path {
        report_port.write(&result, path)?;
        eprintln!("Report written to {}", path);
    }

    Ok(result)
}

fn print_summary(result: &BacktestResult) {
    let (buys, sells) = result.signal_counts();
    println!("Symbol: {}  ({} points)", result.symbol, result.points.len());
    println!("Signals: {} buy, {} sell", buys, sells);
    print_performance("Strategy", &result.strategy_summary);
    print_performance(&result.benchmark.symbol, &result.benchmark_summary);
}

fn print_performance(label: &str, s: &PerformanceSummary) {
    println!(
        "{:<10} total {:>8.2}%  annualized {:>8.2}%  sharpe {:>6.2}  max drawdown {:>6.2}%",
        label,
        s.total_return * 100.0,
        s.annualized_return * 100.0,
        s.sharpe_ratio,
        s.max_drawdown * 100.0
    );
}
