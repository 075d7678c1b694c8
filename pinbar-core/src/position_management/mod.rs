/// Position management: protective stops and take-profit legs
///
/// **Key Design Principles:**
/// 1. **Ratchet invariant**: a trailing stop may tighten, never loosen
/// 2. Only a strict improvement moves the stop; equal candidates are no-ops
/// 3. Prices are rounded to the symbol's precision before comparison
///
/// **Module Structure:**
/// - `ratchet`: Ratchet state enforcement
/// - `stop_loss`: Initial stop and trailing updates
/// - `take_profit`: Dual take-profit price/quantity plan
pub mod ratchet;
pub mod stop_loss;
pub mod take_profit;

pub use ratchet::RatchetState;
pub use stop_loss::{plan_stop_loss, StopLossPlanner, TrailingUpdate};
pub use take_profit::{plan_take_profit, TakeProfitError, TakeProfitPlan};

use serde::{Deserialize, Serialize};

/// Position side (semantic representation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Long position (positive quantity)
    Long,
    /// Short position (negative quantity)
    Short,
}

impl Side {
    /// Determine side from position quantity
    pub fn from_quantity(qty: f64) -> Option<Self> {
        if qty > 0.0 {
            Some(Side::Long)
        } else if qty < 0.0 {
            Some(Side::Short)
        } else {
            None // Flat
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => f.write_str("LONG"),
            Side::Short => f.write_str("SHORT"),
        }
    }
}
