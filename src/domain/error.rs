//! Domain error types.
//!
//! Insufficient history and flat RSI windows are not errors: the first is an
//! absent indicator value, the second resolves to a neutral 50.

/// Top-level error type for rsitrader.
#[derive(Debug, thiserror::Error)]
pub enum RsiTraderError {
    #[error("price data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidPriceSeries { reason: String },

    #[error("brokerage unavailable: {reason}")]
    BrokerageUnavailable { reason: String },

    #[error("order for {symbol} rejected: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RsiTraderError {
    /// Whether a retry could plausibly succeed. Rejections are final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RsiTraderError::DataUnavailable { .. } | RsiTraderError::BrokerageUnavailable { .. }
        )
    }
}

impl From<&RsiTraderError> for std::process::ExitCode {
    fn from(err: &RsiTraderError) -> Self {
        let code: u8 = match err {
            RsiTraderError::Io(_) => 1,
            RsiTraderError::ConfigParse { .. }
            | RsiTraderError::ConfigMissing { .. }
            | RsiTraderError::ConfigInvalid { .. } => 2,
            RsiTraderError::DataUnavailable { .. } | RsiTraderError::InvalidPriceSeries { .. } => 3,
            RsiTraderError::BrokerageUnavailable { .. } | RsiTraderError::OrderRejected { .. } => 4,
            RsiTraderError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
