//! Position Sizers: determine trade quantity
//!
//! Sizers translate an account balance into an exchange-executable quantity.
//! They are account-aware (use balance) but signal-agnostic (direction does
//! not change the size).

pub mod fixed;

pub use fixed::{check_margin_sufficient, size_position, FixedFractionSizer};

use serde::{Deserialize, Serialize};

use crate::domain::SymbolTradingRules;

/// Executable quantity and the margin it ties up.
///
/// A zero quantity is the valid "do not trade" result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub quantity: f64,
    pub margin_required: f64,
}

impl PositionPlan {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_tradeable(&self) -> bool {
        self.quantity > 0.0
    }
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert balance + price + exchange rules → executable quantity
/// - Keep the margin within the configured allocation
/// - Respect step size, quantity bounds and minimum notional
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the signal's job)
/// - Sizers do NOT place orders
pub trait Sizer: Send + Sync {
    /// Calculate position size. Returns the zero plan when no valid size exists.
    fn size(&self, balance: f64, price: f64, rules: &SymbolTradingRules) -> PositionPlan;

    /// Sizer name for logging
    fn name(&self) -> &str;
}
