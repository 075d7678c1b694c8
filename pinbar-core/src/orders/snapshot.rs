//! Offline exchange state
//!
//! `ExchangeSnapshot` is a JSON document holding everything the trading cycle
//! reads from an exchange, so a cycle can be planned without connectivity.
//! `DryRunPlacer` accepts every order and remembers it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    AccountSource, ExchangeError, ExchangeInfo, OpenOrder, OrderPlacer, OrderSource,
    PositionSnapshot, PositionSource, TakeProfitRequest,
};
use crate::domain::SymbolTradingRules;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub balance: f64,
    #[serde(default)]
    pub symbols: BTreeMap<String, SymbolTradingRules>,
    #[serde(default)]
    pub positions: Vec<PositionSnapshot>,
    #[serde(default)]
    pub open_orders: Vec<OpenOrder>,
}

impl ExchangeSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(std::io::Error::from)
    }
}

impl AccountSource for ExchangeSnapshot {
    fn account_balance(&self) -> Result<f64, ExchangeError> {
        Ok(self.balance)
    }
}

impl ExchangeInfo for ExchangeSnapshot {
    fn symbol_rules(&self, symbol: &str) -> Result<SymbolTradingRules, ExchangeError> {
        self.symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }
}

impl OrderSource for ExchangeSnapshot {
    fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError> {
        Ok(self
            .open_orders
            .iter()
            .filter(|order| order.symbol == symbol)
            .cloned()
            .collect())
    }
}

impl PositionSource for ExchangeSnapshot {
    fn position(&self, symbol: &str) -> Result<Option<PositionSnapshot>, ExchangeError> {
        Ok(self
            .positions
            .iter()
            .find(|position| position.symbol == symbol && position.is_open())
            .cloned())
    }

    fn open_position_count(&self, symbol: &str) -> Result<usize, ExchangeError> {
        Ok(self
            .positions
            .iter()
            .filter(|position| position.symbol == symbol && position.is_open())
            .count())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: String,
    #[serde(flatten)]
    pub request: TakeProfitRequest,
}

impl std::ops::Deref for PlacedOrder {
    type Target = TakeProfitRequest;

    fn deref(&self) -> &TakeProfitRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Default)]
pub struct DryRunPlacer {
    placed: Vec<PlacedOrder>,
    cancelled: Vec<String>,
    next_id: u64,
}

impl DryRunPlacer {
    pub fn placed(&self) -> &[PlacedOrder] {
        &self.placed
    }

    pub fn cancelled(&self) -> &[String] {
        &self.cancelled
    }
}

impl OrderPlacer for DryRunPlacer {
    fn place_take_profit(&mut self, request: &TakeProfitRequest) -> Result<String, ExchangeError> {
        self.next_id += 1;
        let order_id = format!("dry-run-{}", self.next_id);
        self.placed.push(PlacedOrder {
            order_id: order_id.clone(),
            request: request.clone(),
        });
        Ok(order_id)
    }

    fn cancel_order(&mut self, _symbol: &str, order_id: &str) -> Result<(), ExchangeError> {
        self.cancelled.push(order_id.to_string());
        Ok(())
    }
}
