/// Stop-loss planning: the initial protective stop and trailing updates
///
/// The active stop is whatever the exchange currently holds; when no stop
/// order exists it is the initial stop derived from the entry price. A
/// trailing candidate at `current_price * (1 ∓ trailing_stop_pct)` replaces the
/// active stop only if it strictly tightens it.
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RiskConfig;
use crate::domain::SymbolTradingRules;
use crate::position_management::{RatchetState, Side};

/// An accepted trailing move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingUpdate {
    pub previous_stop: f64,
    pub new_stop: f64,
    /// Distance from entry to the new stop in the profitable direction, in percent.
    /// Negative while the stop is still below (long) or above (short) entry.
    pub profit_locked_pct: f64,
}

#[derive(Debug, Clone)]
pub struct StopLossPlanner {
    use_stop_loss: bool,
    stop_loss_pct: f64,
    trailing_stop: bool,
    trailing_stop_pct: f64,
}

impl StopLossPlanner {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            use_stop_loss: config.use_stop_loss,
            stop_loss_pct: config.stop_loss_pct,
            trailing_stop: config.trailing_stop,
            trailing_stop_pct: config.trailing_stop_pct,
        }
    }

    /// Initial stop for a fresh position, rounded to price precision.
    ///
    /// `None` when stop-losses are disabled or the entry is not a positive price.
    pub fn initial_stop(&self, side: Side, entry: f64, rules: &SymbolTradingRules) -> Option<f64> {
        if !self.use_stop_loss || !(entry.is_finite() && entry > 0.0) {
            return None;
        }
        let raw = entry * (1.0 - side.sign() * self.stop_loss_pct);
        Some(rules.round_price(raw))
    }

    /// Trailing candidate for the current price, rounded to price precision.
    pub fn trailing_candidate(
        &self,
        side: Side,
        current_price: f64,
        rules: &SymbolTradingRules,
    ) -> f64 {
        rules.round_price(current_price * (1.0 - side.sign() * self.trailing_stop_pct))
    }

    /// Propose a trailing move.
    ///
    /// `current_stop` is the stop the exchange holds, if any; otherwise the
    /// initial stop stands in for it. Returns the accepted move, or `None` when
    /// trailing is disabled or the candidate would not strictly tighten the stop.
    pub fn trailing_update(
        &self,
        side: Side,
        entry: f64,
        current_price: f64,
        current_stop: Option<f64>,
        rules: &SymbolTradingRules,
    ) -> Option<TrailingUpdate> {
        if !self.trailing_stop || !(current_price.is_finite() && current_price > 0.0) {
            return None;
        }
        let active = current_stop.or_else(|| self.initial_stop(side, entry, rules));
        let mut ratchet = match active {
            Some(level) => RatchetState::with_initial_level(side, level),
            None => RatchetState::new(side),
        };

        let candidate = self.trailing_candidate(side, current_price, rules);
        let Some(new_stop) = ratchet.propose(candidate) else {
            debug!(
                %side,
                candidate,
                current = ?active,
                "trailing stop not moved: candidate does not tighten"
            );
            return None;
        };

        let profit_locked_pct = if entry > 0.0 {
            side.sign() * (new_stop - entry) / entry * 100.0
        } else {
            0.0
        };
        let previous_stop = active.unwrap_or(new_stop);
        info!(
            symbol = %rules.symbol,
            %side,
            entry,
            current_price,
            previous_stop,
            new_stop,
            profit_locked_pct,
            "trailing stop moved"
        );
        Some(TrailingUpdate {
            previous_stop,
            new_stop,
            profit_locked_pct,
        })
    }
}

/// New stop level for the position, or `None` when the stop stays where it is.
pub fn plan_stop_loss(
    side: Side,
    entry: f64,
    current_price: f64,
    current_stop: Option<f64>,
    config: &RiskConfig,
    rules: &SymbolTradingRules,
) -> Option<f64> {
    StopLossPlanner::new(config)
        .trailing_update(side, entry, current_price, current_stop, rules)
        .map(|update| update.new_stop)
}
