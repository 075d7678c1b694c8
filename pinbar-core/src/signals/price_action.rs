//! Pure price-action strategy: pattern detector + momentum analyzer + scorer.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::domain::CandleWindow;
use crate::metrics::MomentumVolatilityAnalyzer;
use crate::patterns::PatternDetector;

use super::scorer::{ScoringConfig, SignalScorer};
use super::{Analysis, Strategy};

#[derive(Debug, Clone)]
pub struct PriceActionStrategy {
    name: String,
    min_window: usize,
    detector: PatternDetector,
    analyzer: MomentumVolatilityAnalyzer,
    scorer: SignalScorer,
}

impl PriceActionStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self::named("price_action", config)
    }

    /// Same strategy registered under a different name.
    pub fn named(name: impl Into<String>, config: &EngineConfig) -> Self {
        let strategy = &config.strategy;
        Self {
            name: name.into(),
            min_window: config.min_window(),
            detector: PatternDetector::new(config.patterns.clone())
                .with_multi_candle(strategy.enable_multi_candle_patterns)
                .with_continuation(strategy.enable_flag_pennant_detection),
            analyzer: MomentumVolatilityAnalyzer::new(strategy),
            scorer: SignalScorer::new(ScoringConfig::from(strategy)),
        }
    }

    fn analyze_latest(&self, window: &CandleWindow, i: usize) -> Analysis {
        let patterns = self.detector.detect(window, i);
        let metrics = self.analyzer.analyze(window, i);
        let signal = self
            .scorer
            .score(&patterns, &metrics, &window[i], &window[i - 1]);
        Analysis {
            signal,
            patterns,
            metrics,
        }
    }
}

impl Strategy for PriceActionStrategy {
    fn analyze(&self, window: &CandleWindow) -> Analysis {
        let Some(i) = window.latest_index() else {
            return Analysis::hold();
        };
        if i == 0 || window.len() < self.min_window {
            return Analysis::hold();
        }

        let analysis = hold_on_fault(&self.name, || self.analyze_latest(window, i));
        debug!(
            strategy = %self.name,
            direction = %analysis.signal.direction,
            strength = analysis.signal.strength,
            "price action evaluated"
        );
        analysis
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn min_window(&self) -> usize {
        self.min_window
    }
}

/// Run `analyze`, turning a panic into a logged Hold with no evidence.
fn hold_on_fault<F>(strategy: &str, analyze: F) -> Analysis
where
    F: FnOnce() -> Analysis,
{
    match catch_unwind(AssertUnwindSafe(analyze)) {
        Ok(analysis) => analysis,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(strategy, %message, "signal evaluation failed; holding");
            Analysis::hold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_window;
    use crate::metrics::MomentumMetrics;
    use crate::signals::Direction;

    #[test]
    fn short_window_holds() {
        let strategy = PriceActionStrategy::new(&EngineConfig::default());
        let window = make_window(&[100.0; 10]);
        assert!(strategy.evaluate(&window).is_hold());
    }

    #[test]
    fn strong_rally_buys() {
        let strategy = PriceActionStrategy::new(&EngineConfig::default());
        // accelerating rally: momentum rises every candle
        let closes: Vec<f64> = (0..40).map(|k| 100.0 + 0.05 * (k * k) as f64).collect();
        let window = make_window(&closes);
        let analysis = strategy.analyze(&window);
        assert_eq!(analysis.signal.direction, Direction::Buy);
        assert!(analysis.signal.strength >= 4);
        assert!(analysis.metrics.trend_bullish);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let strategy = PriceActionStrategy::new(&EngineConfig::default());
        let closes: Vec<f64> = (0..50).map(|k| 100.0 + (k as f64 * 0.9).sin() * 4.0).collect();
        let window = make_window(&closes);
        assert_eq!(strategy.analyze(&window), strategy.analyze(&window));
    }

    #[test]
    fn fault_during_analysis_holds() {
        let closes: Vec<f64> = (0..40).map(|k| 100.0 + 0.05 * (k * k) as f64).collect();
        let window = make_window(&closes);
        let strategy = PriceActionStrategy::new(&EngineConfig::default());
        let analysis = hold_on_fault("price_action", || {
            let live = strategy.analyze(&window);
            panic!("scoring failed after {:?}", live.signal.direction)
        });
        assert_eq!(analysis.signal.direction, Direction::Hold);
        assert_eq!(analysis.signal.strength, 0);
        assert!(analysis.signal.reasons.is_empty());
        assert!(!analysis.patterns.any());
        assert_eq!(analysis.metrics, MomentumMetrics::default());

        let analysis = hold_on_fault("price_action", || panic!("index out of range"));
        assert_eq!(analysis, Analysis::hold());
    }

    #[test]
    fn zero_lookback_evaluates_without_fault() {
        let mut config = EngineConfig::default();
        config.strategy.lookback_period = 0;
        let strategy = PriceActionStrategy::new(&config);
        let closes: Vec<f64> = (0..40).map(|k| 100.0 + (k as f64 * 0.9).sin() * 4.0).collect();
        let analysis = strategy.analyze(&make_window(&closes));
        assert_eq!(analysis.metrics.volume_ratio, None);
        assert_eq!(analysis.metrics.volatility_ratio, None);
        assert!(analysis.metrics.momentum.is_some());
    }
}
