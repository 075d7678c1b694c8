use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{OpenOrder, OrderPlacer, TakeProfitRequest};
use crate::position_management::TakeProfitPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStatus {
    /// Both legs accepted.
    Placed,
    /// Exactly one leg accepted; the position is only partly covered.
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    pub price: f64,
    pub quantity: f64,
    pub order_id: Option<String>,
    pub error: Option<String>,
}

impl LegResult {
    pub fn is_placed(&self) -> bool {
        self.order_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualTakeProfitOutcome {
    pub status: PlacementStatus,
    pub tp1: LegResult,
    pub tp2: LegResult,
    /// Stale take-profit orders cancelled before placing the new legs.
    pub cancelled: Vec<String>,
}

/// Replace any take-profit orders resting for `symbol` with the two legs of `plan`.
///
/// Cancellation failures are logged and do not stop placement. Each leg is
/// submitted independently; the outcome records which ones went through.
pub fn place_dual_take_profit(
    placer: &mut dyn OrderPlacer,
    symbol: &str,
    existing: &[OpenOrder],
    plan: &TakeProfitPlan,
) -> DualTakeProfitOutcome {
    let mut cancelled = Vec::new();
    for order in existing
        .iter()
        .filter(|order| order.symbol == symbol && order.kind.is_take_profit())
    {
        match placer.cancel_order(symbol, &order.order_id) {
            Ok(()) => {
                info!(symbol, order_id = %order.order_id, "cancelled stale take profit order");
                cancelled.push(order.order_id.clone());
            }
            Err(e) => warn!(
                symbol,
                order_id = %order.order_id,
                error = %e,
                "failed to cancel take profit order"
            ),
        }
    }

    let mut submit = |price: f64, quantity: f64| {
        let request = TakeProfitRequest {
            symbol: symbol.to_string(),
            side: plan.side,
            quantity,
            stop_price: price,
        };
        match placer.place_take_profit(&request) {
            Ok(order_id) => LegResult {
                price,
                quantity,
                order_id: Some(order_id),
                error: None,
            },
            Err(e) => LegResult {
                price,
                quantity,
                order_id: None,
                error: Some(e.to_string()),
            },
        }
    };
    let tp1 = submit(plan.tp1_price, plan.tp1_qty);
    let tp2 = submit(plan.tp2_price, plan.tp2_qty);

    let status = match (tp1.is_placed(), tp2.is_placed()) {
        (true, true) => PlacementStatus::Placed,
        (false, false) => PlacementStatus::Failed,
        _ => PlacementStatus::Partial,
    };
    match status {
        PlacementStatus::Placed => info!(
            symbol,
            quantity = plan.total_quantity(),
            tp1_qty = tp1.quantity,
            tp1_price = tp1.price,
            tp2_qty = tp2.quantity,
            tp2_price = tp2.price,
            "dual take profit placed"
        ),
        PlacementStatus::Partial => warn!(
            symbol,
            tp1_placed = tp1.is_placed(),
            tp2_placed = tp2.is_placed(),
            "dual take profit partially placed"
        ),
        PlacementStatus::Failed => error!(symbol, "dual take profit placement failed"),
    }

    DualTakeProfitOutcome {
        status,
        tp1,
        tp2,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{DryRunPlacer, ExchangeError, OrderKind};
    use crate::position_management::Side;

    fn plan() -> TakeProfitPlan {
        TakeProfitPlan {
            side: Side::Long,
            tp1_price: 100.5,
            tp1_qty: 2.5,
            tp2_price: 101.0,
            tp2_qty: 2.5,
        }
    }

    /// Rejects every n-th submission (1-based).
    struct RejectNth {
        n: usize,
        seen: usize,
    }

    impl OrderPlacer for RejectNth {
        fn place_take_profit(
            &mut self,
            _request: &TakeProfitRequest,
        ) -> Result<String, ExchangeError> {
            self.seen += 1;
            if self.seen == self.n {
                Err(ExchangeError::Rejected("insufficient margin".into()))
            } else {
                Ok(format!("tp-{}", self.seen))
            }
        }

        fn cancel_order(&mut self, _symbol: &str, _order_id: &str) -> Result<(), ExchangeError> {
            Err(ExchangeError::Unavailable("timeout".into()))
        }
    }

    #[test]
    fn both_legs_placed() {
        let mut placer = DryRunPlacer::default();
        let outcome = place_dual_take_profit(&mut placer, "BTCUSDT", &[], &plan());
        assert_eq!(outcome.status, PlacementStatus::Placed);
        assert_eq!(placer.placed().len(), 2);
        assert_eq!(placer.placed()[0].quantity, 2.5);
        assert_eq!(placer.placed()[1].stop_price, 101.0);
    }

    #[test]
    fn one_rejected_leg_is_partial() {
        let mut placer = RejectNth { n: 2, seen: 0 };
        let outcome = place_dual_take_profit(&mut placer, "BTCUSDT", &[], &plan());
        assert_eq!(outcome.status, PlacementStatus::Partial);
        assert!(outcome.tp1.is_placed());
        assert_eq!(outcome.tp2.error.as_deref(), Some("Order rejected: insufficient margin"));
    }

    #[test]
    fn stale_take_profits_are_cancelled_and_failures_tolerated() {
        let existing = vec![
            OpenOrder {
                kind: OrderKind::TakeProfitMarket,
                stop_price: 104.0,
                order_id: "old-tp".into(),
                symbol: "BTCUSDT".into(),
            },
            OpenOrder {
                kind: OrderKind::StopMarket,
                stop_price: 99.5,
                order_id: "sl".into(),
                symbol: "BTCUSDT".into(),
            },
        ];

        let mut placer = DryRunPlacer::default();
        let outcome = place_dual_take_profit(&mut placer, "BTCUSDT", &existing, &plan());
        assert_eq!(outcome.cancelled, vec!["old-tp".to_string()]);

        let mut flaky = RejectNth { n: 0, seen: 0 };
        let outcome = place_dual_take_profit(&mut flaky, "BTCUSDT", &existing, &plan());
        assert!(outcome.cancelled.is_empty());
        assert_eq!(outcome.status, PlacementStatus::Placed);
    }
}
