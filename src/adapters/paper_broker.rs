//! In-memory paper brokerage.
//!
//! Fills market orders immediately at no price, tracks holdings per symbol and
//! treats a repeated `client_order_id` as the same order. Sells larger than
//! the holding are rejected.

use crate::domain::decision::{OrderAck, OrderIntent, OrderSide, Position};
use crate::domain::error::RsiTraderError;
use crate::ports::brokerage_port::BrokeragePort;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct BookState {
    positions: BTreeMap<String, u64>,
    acks: HashMap<String, OrderAck>,
    next_order_id: u64,
}

#[derive(Default)]
pub struct PaperBroker {
    state: Mutex<BookState>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(self, symbol: &str, quantity: u64) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.positions.insert(symbol.to_uppercase(), quantity);
        }
        self
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, BookState>, RsiTraderError> {
        self.state
            .lock()
            .map_err(|_| RsiTraderError::BrokerageUnavailable {
                reason: "paper broker state poisoned".into(),
            })
    }
}

impl BrokeragePort for PaperBroker {
    fn list_positions(&self) -> Result<Vec<Position>, RsiTraderError> {
        let state = self.locked()?;
        Ok(state
            .positions
            .iter()
            .filter(|(_, quantity)| **quantity > 0)
            .map(|(symbol, &quantity)| Position {
                symbol: symbol.clone(),
                quantity,
            })
            .collect())
    }

    fn submit_order(&self, order: &OrderIntent) -> Result<OrderAck, RsiTraderError> {
        let mut state = self.locked()?;

        if let Some(ack) = state.acks.get(&order.client_order_id) {
            tracing::debug!(client_order_id = %order.client_order_id, "duplicate order ignored");
            return Ok(ack.clone());
        }

        if order.quantity == 0 {
            return Err(RsiTraderError::OrderRejected {
                symbol: order.symbol.clone(),
                reason: "quantity must be positive".into(),
            });
        }

        let key = order.symbol.to_uppercase();
        let held = state.positions.get(&key).copied().unwrap_or(0);
        let new_quantity = match order.side {
            OrderSide::Buy => held + order.quantity,
            OrderSide::Sell if order.quantity <= held => held - order.quantity,
            OrderSide::Sell => {
                return Err(RsiTraderError::OrderRejected {
                    symbol: order.symbol.clone(),
                    reason: format!("cannot sell {} with {} held", order.quantity, held),
                });
            }
        };
        state.positions.insert(key, new_quantity);

        state.next_order_id += 1;
        let ack = OrderAck {
            order_id: format!("paper-{}", state.next_order_id),
            client_order_id: order.client_order_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
        };
        state.acks.insert(order.client_order_id.clone(), ack.clone());
        Ok(ack)
    }
}
