/// Dual take-profit planning
///
/// TP1 closes `tp1_size_pct` of the position at `tp1_pct` profit; TP2 closes
/// the remainder up to `tp2_size_pct` at `tp2_pct`. Quantities are rounded to
/// quantity precision and both legs must land on the step grid.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::RiskConfig;
use crate::domain::SymbolTradingRules;
use crate::position_management::Side;

#[derive(Debug, Error, PartialEq)]
pub enum TakeProfitError {
    #[error("Dual take profit is disabled")]
    Disabled,

    #[error("Invalid entry {entry} or quantity {quantity}")]
    InvalidInput { entry: f64, quantity: f64 },

    #[error("Take profit leg is empty: tp1 {tp1_qty}, tp2 {tp2_qty}")]
    EmptyLeg { tp1_qty: f64, tp2_qty: f64 },

    #[error("Take profit quantity {quantity} is not a multiple of step {step_size}")]
    Misaligned { quantity: f64, step_size: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitPlan {
    pub side: Side,
    pub tp1_price: f64,
    pub tp1_qty: f64,
    pub tp2_price: f64,
    pub tp2_qty: f64,
}

impl TakeProfitPlan {
    pub fn total_quantity(&self) -> f64 {
        self.tp1_qty + self.tp2_qty
    }
}

/// Split `quantity` into two take-profit legs priced in the profit direction.
pub fn plan_take_profit(
    side: Side,
    entry: f64,
    quantity: f64,
    rules: &SymbolTradingRules,
    config: &RiskConfig,
) -> Result<TakeProfitPlan, TakeProfitError> {
    if !config.use_take_profit || !config.use_dual_take_profit {
        return Err(TakeProfitError::Disabled);
    }
    if !(entry.is_finite() && entry > 0.0 && quantity.is_finite() && quantity > 0.0) {
        return Err(TakeProfitError::InvalidInput { entry, quantity });
    }

    let tp1_price = rules.round_price(entry * (1.0 + side.sign() * config.tp1_pct));
    let tp2_price = rules.round_price(entry * (1.0 + side.sign() * config.tp2_pct));

    let tp1_qty = rules.round_quantity(quantity * config.tp1_size_pct);
    let tp2_qty = rules
        .round_quantity(rules.round_quantity(quantity * config.tp2_size_pct) - tp1_qty)
        .max(0.0);

    if tp1_qty <= 0.0 || tp2_qty <= 0.0 {
        return Err(TakeProfitError::EmptyLeg { tp1_qty, tp2_qty });
    }
    for leg in [tp1_qty, tp2_qty] {
        if !rules.is_step_aligned(leg) {
            return Err(TakeProfitError::Misaligned {
                quantity: leg,
                step_size: rules.step_size,
            });
        }
    }

    info!(
        symbol = %rules.symbol,
        %side,
        entry,
        tp1_price,
        tp1_qty,
        tp2_price,
        tp2_qty,
        "dual take profit planned"
    );
    Ok(TakeProfitPlan {
        side,
        tp1_price,
        tp1_qty,
        tp2_price,
        tp2_qty,
    })
}
