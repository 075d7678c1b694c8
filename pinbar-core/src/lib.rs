//! Pinbar Core: price-action signals, position sizing and protective orders.
//!
//! This crate contains the decision logic of a leveraged futures bot:
//! - Domain types (candles, kline records, candle windows, symbol rules)
//! - Candlestick and continuation pattern detection
//! - Momentum/volatility metrics and the weighted signal scorer
//! - Fixed-fraction position sizing on the exchange step grid
//! - Initial/trailing stop-loss and dual take-profit planning
//! - A single-instrument trading cycle over exchange collaborator traits
//!
//! Nothing here performs I/O against an exchange. Exchange state comes in
//! through the traits in [`orders`].

pub mod config;
pub mod cycle;
pub mod domain;
pub mod indicators;
pub mod metrics;
pub mod orders;
pub mod patterns;
pub mod position_management;
pub mod signals;
pub mod sizers;

pub use position_management::{plan_stop_loss, plan_take_profit};
pub use sizers::size_position;

use config::EngineConfig;
use domain::CandleWindow;
use signals::{PriceActionStrategy, SignalEngine, SignalResult, StrategyRegistry};

/// Evaluate the latest candle of `window` with the configured strategy.
///
/// Stateless: each call builds a fresh engine, so no history is kept.
pub fn evaluate_signal(window: &CandleWindow, config: &EngineConfig) -> SignalResult {
    let strategy = StrategyRegistry::with_builtins()
        .create_or_default(&config.strategy.name, config)
        .unwrap_or_else(|_| Box::new(PriceActionStrategy::new(config)));
    SignalEngine::new(strategy).evaluate(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed across threads by `scan` is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleWindow>();
        require_sync::<domain::CandleWindow>();
        require_send::<domain::SymbolTradingRules>();
        require_sync::<domain::SymbolTradingRules>();

        // Config
        require_send::<config::EngineConfig>();
        require_sync::<config::EngineConfig>();

        // Signal pipeline
        require_send::<signals::SignalEngine>();
        require_sync::<signals::SignalEngine>();
        require_send::<signals::StrategyRegistry>();
        require_sync::<signals::StrategyRegistry>();
        require_send::<signals::SignalResult>();
        require_sync::<signals::SignalResult>();
        require_send::<patterns::PatternDetector>();
        require_sync::<patterns::PatternDetector>();

        // Plans
        require_send::<sizers::PositionPlan>();
        require_sync::<sizers::PositionPlan>();
        require_send::<position_management::TakeProfitPlan>();
        require_sync::<position_management::TakeProfitPlan>();
        require_send::<cycle::TradingCycle>();
        require_sync::<cycle::TradingCycle>();
    }

    #[test]
    fn short_window_evaluates_to_hold() {
        let window = indicators::make_window(&[100.0, 101.0, 102.0]);
        let signal = evaluate_signal(&window, &EngineConfig::default());
        assert!(signal.is_hold());
        assert_eq!(signal.strength, 0);
    }

    #[test]
    fn unknown_strategy_name_falls_back_to_default() {
        let mut config = EngineConfig::default();
        config.strategy.name = "does_not_exist".into();
        let closes: Vec<f64> = (0..40).map(|k| 100.0 + 0.05 * (k * k) as f64).collect();
        let window = indicators::make_window(&closes);
        assert_eq!(
            evaluate_signal(&window, &config),
            evaluate_signal(&window, &EngineConfig::default())
        );
    }
}
