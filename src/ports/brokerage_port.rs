//! Brokerage port trait.

use crate::domain::decision::{OrderAck, OrderIntent, Position};
use crate::domain::error::RsiTraderError;

/// The brokerage owns position state; callers only read it.
///
/// Failures to reach the brokerage are `BrokerageUnavailable`; an order the
/// brokerage declines is `OrderRejected`.
pub trait BrokeragePort {
    fn list_positions(&self) -> Result<Vec<Position>, RsiTraderError>;

    fn submit_order(&self, order: &OrderIntent) -> Result<OrderAck, RsiTraderError>;

    /// Quantity held for one symbol; zero when there is no position.
    fn position_quantity(&self, symbol: &str) -> Result<u64, RsiTraderError> {
        Ok(self
            .list_positions()?
            .iter()
            .filter(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .map(|p| p.quantity)
            .sum())
    }
}
