//! One evaluation cycle for a single instrument.
//!
//! A flat symbol goes through signal → open-position guard → sizing → margin
//! check → initial stop → dual take-profit. A symbol that is already held only
//! gets a trailing-stop update. Exchange state is read fresh through the
//! collaborator traits on every call; placing orders is left to the caller.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, RiskConfig};
use crate::domain::CandleWindow;
use crate::orders::{
    current_stop_from_orders, AccountSource, ExchangeError, ExchangeInfo, OrderSource,
    PositionSource,
};
use crate::position_management::{
    plan_take_profit, Side, StopLossPlanner, TakeProfitError, TakeProfitPlan, TrailingUpdate,
};
use crate::signals::{RegistryError, SignalEngine, SignalResult, StrategyRegistry};
use crate::sizers::{check_margin_sufficient, size_position, PositionPlan};

/// Everything needed to open and protect a new position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPlan {
    pub symbol: String,
    pub side: Side,
    pub signal: SignalResult,
    pub entry_price: f64,
    pub position: PositionPlan,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<TakeProfitPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    NoSignal,
    PositionLimit,
    ZeroQuantity,
    InsufficientMargin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CycleOutcome {
    Opened(EntryPlan),
    Held {
        side: Side,
        trailing: Option<TrailingUpdate>,
    },
    Skipped {
        reason: SkipReason,
        signal: Option<SignalResult>,
    },
}

pub struct TradingCycle {
    engine: SignalEngine,
    risk: RiskConfig,
}

impl TradingCycle {
    pub fn new(engine: SignalEngine, risk: RiskConfig) -> Self {
        Self { engine, risk }
    }

    /// Build the configured strategy through `registry`, falling back to the
    /// default strategy for unknown names.
    pub fn from_config(
        config: &EngineConfig,
        registry: &StrategyRegistry,
    ) -> Result<Self, RegistryError> {
        let strategy = registry.create_or_default(&config.strategy.name, config)?;
        Ok(Self::new(SignalEngine::new(strategy), config.risk.clone()))
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// A new entry is allowed only while the symbol is flat and below its
    /// position limit.
    pub fn should_open_position(
        &self,
        positions: &dyn PositionSource,
        symbol: &str,
    ) -> Result<bool, ExchangeError> {
        if positions.position(symbol)?.is_some_and(|p| p.is_open()) {
            info!(symbol, "already have an open position");
            return Ok(false);
        }
        let open = positions.open_position_count(symbol)?;
        if open >= self.risk.max_positions_per_symbol as usize {
            info!(
                symbol,
                open,
                max = self.risk.max_positions_per_symbol,
                "maximum positions for symbol reached"
            );
            return Ok(false);
        }
        Ok(true)
    }

    pub fn run<X>(
        &mut self,
        exchange: &X,
        symbol: &str,
        window: &CandleWindow,
    ) -> Result<CycleOutcome, ExchangeError>
    where
        X: AccountSource + ExchangeInfo + OrderSource + PositionSource,
    {
        let Some(price) = window.latest().map(|c| c.close) else {
            return Ok(CycleOutcome::Skipped {
                reason: SkipReason::NoData,
                signal: None,
            });
        };

        let signal = self.engine.evaluate(window);

        if let Some(position) = exchange.position(symbol)? {
            if let Some(side) = position.side() {
                return self.hold(exchange, symbol, side, position.entry_price, price);
            }
        }

        let Some(side) = signal.direction.side() else {
            debug!(symbol, "no signal");
            return Ok(skipped(SkipReason::NoSignal, signal));
        };
        if !self.should_open_position(exchange, symbol)? {
            return Ok(skipped(SkipReason::PositionLimit, signal));
        }

        let balance = exchange.account_balance()?;
        let rules = exchange.symbol_rules(symbol)?;
        let position = size_position(
            balance,
            price,
            self.risk.leverage,
            self.risk.fixed_trade_fraction,
            &rules,
        );
        if !position.is_tradeable() {
            warn!(symbol, balance, price, "calculated quantity is zero, skipping trade");
            return Ok(skipped(SkipReason::ZeroQuantity, signal));
        }
        if !check_margin_sufficient(
            balance,
            price,
            position.quantity,
            self.risk.leverage,
            self.risk.fixed_trade_fraction,
        ) {
            return Ok(skipped(SkipReason::InsufficientMargin, signal));
        }

        let stop_loss = StopLossPlanner::new(&self.risk).initial_stop(side, price, &rules);
        let planned = plan_take_profit(side, price, position.quantity, &rules, &self.risk);
        let take_profit = match planned {
            Ok(plan) => Some(plan),
            Err(TakeProfitError::Disabled) => None,
            Err(e) => {
                warn!(symbol, error = %e, "dual take profit not planned");
                None
            }
        };

        info!(
            symbol,
            %side,
            price,
            quantity = position.quantity,
            margin = position.margin_required,
            stop_loss = ?stop_loss,
            "entry planned"
        );
        Ok(CycleOutcome::Opened(EntryPlan {
            symbol: symbol.to_string(),
            side,
            signal,
            entry_price: price,
            position,
            stop_loss,
            take_profit,
        }))
    }

    fn hold<X>(
        &self,
        exchange: &X,
        symbol: &str,
        side: Side,
        entry: f64,
        price: f64,
    ) -> Result<CycleOutcome, ExchangeError>
    where
        X: ExchangeInfo + OrderSource,
    {
        if !self.risk.update_trailing_on_hold {
            return Ok(CycleOutcome::Held {
                side,
                trailing: None,
            });
        }
        let rules = exchange.symbol_rules(symbol)?;
        let orders = exchange.open_orders(symbol)?;
        let current_stop = current_stop_from_orders(&orders, symbol);
        let trailing = StopLossPlanner::new(&self.risk).trailing_update(
            side,
            entry,
            price,
            current_stop,
            &rules,
        );
        Ok(CycleOutcome::Held { side, trailing })
    }
}

fn skipped(reason: SkipReason, signal: SignalResult) -> CycleOutcome {
    CycleOutcome::Skipped {
        reason,
        signal: Some(signal),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::SymbolTradingRules;
    use crate::indicators::make_window;
    use crate::orders::{ExchangeSnapshot, OpenOrder, OrderKind, PositionSnapshot};
    use crate::signals::{Analysis, Direction, Strategy};

    struct Fixed(Direction);

    impl Strategy for Fixed {
        fn analyze(&self, _window: &CandleWindow) -> Analysis {
            let mut analysis = Analysis::hold();
            analysis.signal = SignalResult {
                direction: self.0,
                strength: 5,
                reasons: vec!["fixed".into()],
            };
            analysis
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn min_window(&self) -> usize {
            1
        }
    }

    fn cycle(direction: Direction) -> TradingCycle {
        TradingCycle::new(SignalEngine::new(Box::new(Fixed(direction))), RiskConfig::default())
    }

    fn exchange(positions: Vec<PositionSnapshot>, open_orders: Vec<OpenOrder>) -> ExchangeSnapshot {
        let mut symbols = BTreeMap::new();
        symbols.insert(
            "BTCUSDT".to_string(),
            SymbolTradingRules {
                symbol: "BTCUSDT".into(),
                price_precision: 2,
                quantity_precision: 3,
                min_qty: 0.001,
                max_qty: 1000.0,
                step_size: 0.001,
                min_notional: 5.0,
            },
        );
        ExchangeSnapshot {
            balance: 50.0,
            symbols,
            positions,
            open_orders,
        }
    }

    fn long(entry_price: f64) -> PositionSnapshot {
        PositionSnapshot {
            symbol: "BTCUSDT".into(),
            quantity: 5.0,
            entry_price,
            leverage: 25,
            isolated: true,
        }
    }

    #[test]
    fn flat_symbol_with_buy_signal_opens() {
        let mut cycle = cycle(Direction::Buy);
        let window = make_window(&[99.0, 100.0]);
        let outcome = cycle.run(&exchange(vec![], vec![]), "BTCUSDT", &window).unwrap();

        let plan = match outcome {
            CycleOutcome::Opened(plan) => plan,
            other => panic!("expected an entry, got {other:?}"),
        };
        assert_eq!(plan.side, Side::Long);
        assert_eq!(plan.position.quantity, 5.0);
        assert_eq!(plan.stop_loss, Some(99.5));
        let tp = plan.take_profit.unwrap();
        assert_eq!((tp.tp1_price, tp.tp1_qty), (100.5, 2.5));
        assert_eq!((tp.tp2_price, tp.tp2_qty), (101.0, 2.5));
    }

    #[test]
    fn hold_signal_skips() {
        let mut cycle = cycle(Direction::Hold);
        let window = make_window(&[100.0]);
        let outcome = cycle.run(&exchange(vec![], vec![]), "BTCUSDT", &window).unwrap();
        assert!(matches!(
            outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::NoSignal,
                ..
            }
        ));
    }

    #[test]
    fn held_position_trails_from_exchange_stop() {
        let mut cycle = cycle(Direction::Sell);
        let stop = OpenOrder {
            kind: OrderKind::StopMarket,
            stop_price: 99.5,
            order_id: "1".into(),
            symbol: "BTCUSDT".into(),
        };
        let window = make_window(&[101.0, 102.0]);
        let outcome = cycle
            .run(&exchange(vec![long(100.0)], vec![stop]), "BTCUSDT", &window)
            .unwrap();

        let (side, update) = match outcome {
            CycleOutcome::Held {
                side,
                trailing: Some(update),
            } => (side, update),
            other => panic!("expected a trailing update, got {other:?}"),
        };
        assert_eq!(side, Side::Long);
        assert_eq!(update.previous_stop, 99.5);
        assert_eq!(update.new_stop, 101.49);
    }

    #[test]
    fn trailing_on_hold_can_be_disabled() {
        let mut cycle = cycle(Direction::Buy);
        cycle.risk.update_trailing_on_hold = false;
        let window = make_window(&[102.0]);
        let outcome = cycle.run(&exchange(vec![long(100.0)], vec![]), "BTCUSDT", &window).unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Held {
                side: Side::Long,
                trailing: None
            }
        );
    }

    #[test]
    fn guard_refuses_when_position_limit_reached() {
        let cycle = cycle(Direction::Buy);
        assert!(cycle.should_open_position(&exchange(vec![], vec![]), "BTCUSDT").unwrap());
        assert!(!cycle
            .should_open_position(&exchange(vec![long(100.0)], vec![]), "BTCUSDT")
            .unwrap());

        let mut flat = long(100.0);
        flat.quantity = 0.0;
        assert!(cycle.should_open_position(&exchange(vec![flat], vec![]), "BTCUSDT").unwrap());
    }

    #[test]
    fn unknown_symbol_is_an_exchange_error() {
        let mut cycle = cycle(Direction::Buy);
        let window = make_window(&[100.0]);
        let err = cycle.run(&exchange(vec![], vec![]), "DOGEUSDT", &window).unwrap_err();
        assert_eq!(err, ExchangeError::UnknownSymbol("DOGEUSDT".into()));
    }
}
