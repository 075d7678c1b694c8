//! Evidence scoring: patterns, momentum, divergence and volatility combined
//! into one directional decision.
//!
//! Each direction is scored independently:
//!
//! 1. Reversal patterns in fixed priority order; only the first match counts.
//! 2. Continuation patterns; every match counts.
//! 3. Momentum beyond the threshold, with acceleration, multi-horizon and volume boosts.
//! 4. Momentum divergence.
//! 5. Volatility expansion in the direction of the candle.
//!
//! A direction wins when its score reaches the minimum strength and beats the
//! other side by at least two points.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::Candle;
use crate::metrics::MomentumMetrics;
use crate::patterns::PatternFlags;

use super::intent::{Direction, SignalResult};

const REVERSAL_VOLUME_BONUS: u32 = 2;
const REVERSAL_VOL_EXPANSION_BONUS: u32 = 1;
const REVERSAL_VOL_EXPANSION_RATIO: f64 = 1.2;
const CONTINUATION_TREND_BONUS: u32 = 2;
const CONTINUATION_VOLUME_BONUS: u32 = 1;
const MOMENTUM_BASE: u32 = 2;
const MOMENTUM_BONUS: u32 = 2;
const DIVERGENCE_SCORE: u32 = 3;
const VOL_EXPANSION_SCORE: u32 = 2;
const VOL_EXPANSION_RATIO: f64 = 1.3;
/// Winner must lead by more than this many points.
const WINNING_MARGIN: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub momentum_threshold: f64,
    pub volume_threshold: f64,
    pub min_signal_strength: u32,
}

impl From<&StrategyConfig> for ScoringConfig {
    fn from(config: &StrategyConfig) -> Self {
        Self {
            momentum_threshold: config.momentum_threshold,
            volume_threshold: config.volume_threshold,
            min_signal_strength: config.min_signal_strength,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::from(&StrategyConfig::default())
    }
}

/// Per-direction totals before the decision rule is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub buy_score: u32,
    pub sell_score: u32,
    pub buy_reasons: Vec<String>,
    pub sell_reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    fn label(self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
        }
    }

    /// Candle colored in this direction.
    fn candle_agrees(self, candle: &Candle) -> bool {
        match self {
            Bias::Bullish => candle.is_bullish(),
            Bias::Bearish => candle.is_bearish(),
        }
    }

    /// Value signed in this direction (strictly).
    fn signed(self, value: f64) -> bool {
        match self {
            Bias::Bullish => value > 0.0,
            Bias::Bearish => value < 0.0,
        }
    }

    fn beyond(self, value: f64, threshold: f64) -> bool {
        match self {
            Bias::Bullish => value > threshold,
            Bias::Bearish => value < -threshold,
        }
    }

    fn reversal_patterns(self, flags: &PatternFlags) -> [(&'static str, bool, u32); 7] {
        match self {
            Bias::Bullish => [
                ("Bullish Pin Bar (Hammer)", flags.pin_bar_bullish, 4),
                ("Bullish Engulfing", flags.engulfing_bullish, 4),
                ("Morning Star", flags.morning_star, 5),
                ("Dragonfly Doji", flags.dragonfly_doji, 3),
                ("Tweezer Bottom", flags.tweezer_bottom, 4),
                ("Three White Soldiers", flags.three_white_soldiers, 5),
                ("Bullish Marubozu", flags.marubozu_bullish, 4),
            ],
            Bias::Bearish => [
                ("Bearish Pin Bar (Shooting Star)", flags.pin_bar_bearish, 4),
                ("Bearish Engulfing", flags.engulfing_bearish, 4),
                ("Evening Star", flags.evening_star, 5),
                ("Gravestone Doji", flags.gravestone_doji, 3),
                ("Tweezer Top", flags.tweezer_top, 4),
                ("Three Black Crows", flags.three_black_crows, 5),
                ("Bearish Marubozu", flags.marubozu_bearish, 4),
            ],
        }
    }

    fn continuation_patterns(
        self,
        flags: &PatternFlags,
        current: &Candle,
        momentum: f64,
    ) -> [(&'static str, bool, u32); 4] {
        let colored = self.candle_agrees(current);
        let inside_breakout = flags.inside_bar && colored && self.signed(momentum);
        let outside = flags.outside_bar && colored;
        match self {
            Bias::Bullish => [
                ("Bullish Flag", flags.bullish_flag, 4),
                ("Bullish Pennant", flags.bullish_pennant, 4),
                ("Inside Bar Bullish Breakout", inside_breakout, 3),
                ("Outside Bar Bullish", outside, 3),
            ],
            Bias::Bearish => [
                ("Bearish Flag", flags.bearish_flag, 4),
                ("Bearish Pennant", flags.bearish_pennant, 4),
                ("Inside Bar Bearish Breakout", inside_breakout, 3),
                ("Outside Bar Bearish", outside, 3),
            ],
        }
    }

    fn trend(self, metrics: &MomentumMetrics) -> bool {
        match self {
            Bias::Bullish => metrics.trend_bullish,
            Bias::Bearish => metrics.trend_bearish,
        }
    }

    fn divergence(self, metrics: &MomentumMetrics) -> bool {
        match self {
            Bias::Bullish => metrics.bullish_divergence,
            Bias::Bearish => metrics.bearish_divergence,
        }
    }
}

/// Pure scoring function over one candle's evidence.
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
}

impl SignalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score and decide. Invalid candles or unknown momentum/volatility give Hold.
    pub fn score(
        &self,
        flags: &PatternFlags,
        metrics: &MomentumMetrics,
        current: &Candle,
        previous: &Candle,
    ) -> SignalResult {
        match self.scorecard(flags, metrics, current, previous) {
            Some(card) => self.decide(card),
            None => SignalResult::hold(),
        }
    }

    /// Per-direction totals, or `None` when the input cannot be scored.
    pub fn scorecard(
        &self,
        flags: &PatternFlags,
        metrics: &MomentumMetrics,
        current: &Candle,
        previous: &Candle,
    ) -> Option<Scorecard> {
        if !current.is_valid() || !previous.is_valid() || !metrics.is_scorable() {
            return None;
        }
        let momentum = metrics.momentum?;

        let (buy_score, buy_reasons) =
            self.score_side(Bias::Bullish, flags, metrics, current, momentum);
        let (sell_score, sell_reasons) =
            self.score_side(Bias::Bearish, flags, metrics, current, momentum);
        Some(Scorecard {
            buy_score,
            sell_score,
            buy_reasons,
            sell_reasons,
        })
    }

    /// Apply the decision rule to a scorecard.
    pub fn decide(&self, card: Scorecard) -> SignalResult {
        let min = self.config.min_signal_strength;
        let (direction, strength) = if card.buy_score >= min
            && card.buy_score > card.sell_score + WINNING_MARGIN
        {
            (Direction::Buy, card.buy_score)
        } else if card.sell_score >= min && card.sell_score > card.buy_score + WINNING_MARGIN {
            (Direction::Sell, card.sell_score)
        } else {
            return SignalResult::hold();
        };

        let mut reasons = card.buy_reasons;
        reasons.extend(card.sell_reasons);
        SignalResult {
            direction,
            strength,
            reasons,
        }
    }

    fn score_side(
        &self,
        bias: Bias,
        flags: &PatternFlags,
        metrics: &MomentumMetrics,
        current: &Candle,
        momentum: f64,
    ) -> (u32, Vec<String>) {
        let mut score = 0;
        let mut reasons = Vec::new();
        let volatility_ratio = metrics.volatility_ratio.unwrap_or(1.0);
        let volume_ratio = metrics.volume_ratio.unwrap_or(1.0);

        if let Some((name, _, base)) = bias
            .reversal_patterns(flags)
            .into_iter()
            .find(|(_, detected, _)| *detected)
        {
            let mut points = base;
            let mut reason = name.to_string();
            if metrics.volume_spike {
                points += REVERSAL_VOLUME_BONUS;
                reason.push_str(" + Volume Spike");
            }
            if volatility_ratio > REVERSAL_VOL_EXPANSION_RATIO {
                points += REVERSAL_VOL_EXPANSION_BONUS;
                reason.push_str(" + Vol Expansion");
            }
            score += points;
            reasons.push(reason);
        }

        for (name, detected, base) in bias.continuation_patterns(flags, current, momentum) {
            if !detected {
                continue;
            }
            let mut points = base;
            let mut reason = name.to_string();
            if bias.trend(metrics) {
                points += CONTINUATION_TREND_BONUS;
                reason.push_str(&format!(" + {} Trend", bias.label()));
            }
            if metrics.volume_spike {
                points += CONTINUATION_VOLUME_BONUS;
                reason.push_str(" + Volume");
            }
            score += points;
            reasons.push(reason);
        }

        if let Some(acceleration) = metrics.acceleration {
            if bias.beyond(momentum, self.config.momentum_threshold) {
                let mut points = MOMENTUM_BASE;
                let mut reason =
                    format!("Strong {} Momentum ({:.2}%)", bias.label(), momentum * 100.0);
                if bias.signed(acceleration) {
                    points += MOMENTUM_BONUS;
                    reason.push_str(" + Acceleration");
                }
                if let (Some(fast), Some(slow)) = (metrics.momentum_fast, metrics.momentum_slow) {
                    if bias.signed(fast) && bias.signed(slow) {
                        points += MOMENTUM_BONUS;
                        reason.push_str(" + Multi-TF Alignment");
                    }
                }
                if volume_ratio > self.config.volume_threshold {
                    points += MOMENTUM_BONUS;
                    reason.push_str(" + Volume Confirmation");
                }
                score += points;
                reasons.push(reason);
            }
        }

        if bias.divergence(metrics) {
            score += DIVERGENCE_SCORE;
            reasons.push(format!("{} Momentum Divergence", bias.label()));
        }

        if volatility_ratio > VOL_EXPANSION_RATIO
            && bias.signed(momentum)
            && bias.candle_agrees(current)
        {
            score += VOL_EXPANSION_SCORE;
            reasons.push(format!(
                "Volatility Expansion on {} Move ({:.1}x)",
                bias.label(),
                volatility_ratio
            ));
        }

        (score, reasons)
    }
}
