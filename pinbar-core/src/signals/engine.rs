//! Signal engine: owns one strategy plus the per-instrument evaluation state.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::CandleWindow;

use super::intent::{Direction, SignalResult};
use super::{Analysis, Strategy};

/// Evaluations kept in the rolling history.
pub const HISTORY_CAPACITY: usize = 100;

/// One insufficient-data warning is logged per this many occurrences.
pub const WARNING_INTERVAL: u64 = 10;

/// One evaluation as kept in the engine history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub price: f64,
    pub momentum: f64,
    pub strength: u32,
    pub reasons: Vec<String>,
}

/// Per-instrument evaluation context.
///
/// Not shared between instruments; each instrument gets its own engine.
pub struct SignalEngine {
    strategy: Box<dyn Strategy>,
    insufficient_data: u64,
    history: VecDeque<SignalRecord>,
}

impl SignalEngine {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        Self {
            strategy,
            insufficient_data: 0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn min_window(&self) -> usize {
        self.strategy.min_window()
    }

    /// Evaluate the latest candle and record the outcome.
    pub fn evaluate(&mut self, window: &CandleWindow) -> SignalResult {
        self.analyze(window).signal
    }

    /// Like `evaluate`, returning the evidence as well.
    pub fn analyze(&mut self, window: &CandleWindow) -> Analysis {
        let required = self.strategy.min_window();
        if !window.has_at_least(required) {
            if self.insufficient_data % WARNING_INTERVAL == 0 {
                warn!(
                    strategy = self.strategy.name(),
                    required,
                    available = window.len(),
                    occurrences = self.insufficient_data + 1,
                    "insufficient data for signal"
                );
            }
            self.insufficient_data += 1;
            return Analysis::hold();
        }

        let analysis = self.strategy.analyze(window);
        self.record(window, &analysis);
        analysis
    }

    fn record(&mut self, window: &CandleWindow, analysis: &Analysis) {
        let signal = &analysis.signal;
        if signal.direction.is_directional() {
            info!(
                strategy = self.strategy.name(),
                direction = %signal.direction,
                strength = signal.strength,
                reasons = %signal.reasons.join(" | "),
                patterns = ?analysis.patterns.detected_names(),
                "signal"
            );
        } else if analysis.patterns.any() {
            info!(
                patterns = ?analysis.patterns.detected_names(),
                "patterns detected but insufficient strength for signal"
            );
        }

        let (Some(candle), Some(momentum)) = (window.latest(), analysis.metrics.momentum) else {
            return;
        };
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(SignalRecord {
            timestamp: candle.timestamp,
            direction: signal.direction,
            price: candle.close,
            momentum,
            strength: signal.strength,
            reasons: signal.reasons.clone(),
        });
    }

    /// Recorded evaluations, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SignalRecord> + '_ {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Count of evaluations refused for lack of candles.
    pub fn insufficient_data_count(&self) -> u64 {
        self.insufficient_data
    }
}
