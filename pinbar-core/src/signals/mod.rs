//! Signal generation: market-data-only trade decisions.
//!
//! Strategies never see account or position state. They read a candle window
//! and return a decision for its latest candle.

pub mod engine;
pub mod intent;
pub mod price_action;
pub mod registry;
pub mod scorer;

pub use engine::{SignalEngine, SignalRecord, HISTORY_CAPACITY, WARNING_INTERVAL};
pub use intent::{Direction, SignalResult};
pub use price_action::PriceActionStrategy;
pub use registry::{RegistryError, StrategyRegistry};
pub use scorer::{Scorecard, ScoringConfig, SignalScorer};

use serde::Serialize;

use crate::domain::CandleWindow;
use crate::metrics::MomentumMetrics;
use crate::patterns::PatternFlags;

/// Decision for the latest candle together with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub signal: SignalResult,
    pub patterns: PatternFlags,
    pub metrics: MomentumMetrics,
}

impl Analysis {
    pub fn hold() -> Self {
        Self {
            signal: SignalResult::hold(),
            patterns: PatternFlags::invalid(),
            metrics: MomentumMetrics::default(),
        }
    }
}

/// Market-data-only decision maker.
///
/// # Invariants
/// - `analyze()` MUST be deterministic for the same window
/// - `analyze()` MUST NOT panic outward; faults become Hold
pub trait Strategy: Send + Sync {
    /// Decide on the latest candle of `window`, returning the evidence used.
    fn analyze(&self, window: &CandleWindow) -> Analysis;

    /// Decide on the latest candle of `window`.
    fn evaluate(&self, window: &CandleWindow) -> SignalResult {
        self.analyze(window).signal
    }

    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Candles required before a decision other than Hold is possible.
    fn min_window(&self) -> usize;
}
