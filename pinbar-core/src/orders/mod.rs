//! Exchange-facing collaborators
//!
//! The core never talks to an exchange directly. Balances, symbol rules, open
//! orders and positions are read through the source traits below, and
//! take-profit legs are handed to an [`OrderPlacer`]. Nothing here is cached:
//! every cycle reads fresh state.

pub mod placement;
pub mod snapshot;

pub use placement::{place_dual_take_profit, DualTakeProfitOutcome, LegResult, PlacementStatus};
pub use snapshot::{DryRunPlacer, ExchangeSnapshot, PlacedOrder};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SymbolTradingRules;
use crate::position_management::Side;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Exchange unavailable: {0}")]
    Unavailable(String),

    #[error("Order rejected: {0}")]
    Rejected(String),
}

/// Exchange order type as reported by the open-orders endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    StopMarket,
    Stop,
    TakeProfitMarket,
    TakeProfit,
    #[serde(other)]
    Other,
}

impl OrderKind {
    pub fn is_stop(&self) -> bool {
        matches!(self, OrderKind::StopMarket | OrderKind::Stop)
    }

    pub fn is_take_profit(&self) -> bool {
        matches!(self, OrderKind::TakeProfitMarket | OrderKind::TakeProfit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub kind: OrderKind,
    pub stop_price: f64,
    pub order_id: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    /// Signed position amount: positive long, negative short, zero flat.
    pub quantity: f64,
    pub entry_price: f64,
    pub leverage: u32,
    #[serde(default)]
    pub isolated: bool,
}

impl PositionSnapshot {
    pub fn side(&self) -> Option<Side> {
        Side::from_quantity(self.quantity)
    }

    pub fn is_open(&self) -> bool {
        self.quantity != 0.0
    }
}

/// A take-profit leg to submit. `side` is the side of the position being
/// closed, so a long position is reduced by a sell order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub stop_price: f64,
}

// ─── Collaborator traits ────────────────────────────────────────────

pub trait AccountSource {
    fn account_balance(&self) -> Result<f64, ExchangeError>;
}

pub trait ExchangeInfo {
    fn symbol_rules(&self, symbol: &str) -> Result<SymbolTradingRules, ExchangeError>;
}

pub trait OrderSource {
    fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError>;
}

pub trait PositionSource {
    fn position(&self, symbol: &str) -> Result<Option<PositionSnapshot>, ExchangeError>;

    /// Number of non-flat positions held for `symbol`.
    fn open_position_count(&self, symbol: &str) -> Result<usize, ExchangeError> {
        Ok(self
            .position(symbol)?
            .map_or(0, |position| usize::from(position.is_open())))
    }
}

pub trait OrderPlacer {
    /// Submit one take-profit leg and return the exchange order id.
    fn place_take_profit(&mut self, request: &TakeProfitRequest) -> Result<String, ExchangeError>;

    fn cancel_order(&mut self, symbol: &str, order_id: &str) -> Result<(), ExchangeError>;
}

/// Stop level of the first live stop order for `symbol`, if any.
pub fn current_stop_from_orders(orders: &[OpenOrder], symbol: &str) -> Option<f64> {
    orders
        .iter()
        .find(|order| order.symbol == symbol && order.kind.is_stop() && order.stop_price > 0.0)
        .map(|order| order.stop_price)
}
