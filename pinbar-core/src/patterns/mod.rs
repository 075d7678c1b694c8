//! Price-action pattern detection.
//!
//! `PatternDetector::detect` classifies the candle at one window index against
//! the fixed pattern taxonomy. Flags are computed fresh on every call and
//! depend only on the candles at and before the index.

mod continuation;
mod multi;
mod single;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::PatternConfig;
use crate::domain::CandleWindow;
use crate::indicators::span_is_valid;

/// Candles before the current one that must be valid for any detection.
const REQUIRED_HISTORY: usize = 3;

/// One boolean per named pattern at a single candle index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFlags {
    // Reversal
    pub pin_bar_bullish: bool,
    pub pin_bar_bearish: bool,
    pub engulfing_bullish: bool,
    pub engulfing_bearish: bool,
    pub morning_star: bool,
    pub evening_star: bool,
    pub tweezer_top: bool,
    pub tweezer_bottom: bool,
    pub three_white_soldiers: bool,
    pub three_black_crows: bool,
    pub marubozu_bullish: bool,
    pub marubozu_bearish: bool,
    // Indecision
    pub doji: bool,
    pub gravestone_doji: bool,
    pub dragonfly_doji: bool,
    pub spinning_top: bool,
    pub spinning_bottom: bool,
    // Continuation
    pub inside_bar: bool,
    pub outside_bar: bool,
    pub bullish_flag: bool,
    pub bearish_flag: bool,
    pub bullish_pennant: bool,
    pub bearish_pennant: bool,
}

impl PatternFlags {
    /// All flags false: the result for invalid or insufficient data.
    pub fn invalid() -> Self {
        Self::default()
    }

    fn named(&self) -> [(&'static str, bool); 23] {
        [
            ("Pin Bar Bullish", self.pin_bar_bullish),
            ("Pin Bar Bearish", self.pin_bar_bearish),
            ("Bullish Engulfing", self.engulfing_bullish),
            ("Bearish Engulfing", self.engulfing_bearish),
            ("Morning Star", self.morning_star),
            ("Evening Star", self.evening_star),
            ("Tweezer Top", self.tweezer_top),
            ("Tweezer Bottom", self.tweezer_bottom),
            ("Three White Soldiers", self.three_white_soldiers),
            ("Three Black Crows", self.three_black_crows),
            ("Bullish Marubozu", self.marubozu_bullish),
            ("Bearish Marubozu", self.marubozu_bearish),
            ("Doji", self.doji),
            ("Gravestone Doji", self.gravestone_doji),
            ("Dragonfly Doji", self.dragonfly_doji),
            ("Spinning Top", self.spinning_top),
            ("Spinning Bottom", self.spinning_bottom),
            ("Inside Bar", self.inside_bar),
            ("Outside Bar", self.outside_bar),
            ("Bullish Flag", self.bullish_flag),
            ("Bearish Flag", self.bearish_flag),
            ("Bullish Pennant", self.bullish_pennant),
            ("Bearish Pennant", self.bearish_pennant),
        ]
    }

    /// Names of the patterns present, in taxonomy order.
    pub fn detected_names(&self) -> Vec<&'static str> {
        self.named()
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.named().iter().any(|(_, set)| *set)
    }
}

/// Stateless classifier over a candle window.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    config: PatternConfig,
    multi_candle: bool,
    continuation: bool,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            multi_candle: true,
            continuation: true,
        }
    }

    /// Toggle the two- and three-candle reversal patterns.
    pub fn with_multi_candle(mut self, enabled: bool) -> Self {
        self.multi_candle = enabled;
        self
    }

    /// Toggle flag and pennant detection.
    pub fn with_continuation(mut self, enabled: bool) -> Self {
        self.continuation = enabled;
        self
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Classify the candle at index `i`.
    ///
    /// Returns `PatternFlags::invalid()` when `i < 3`, when any candle in
    /// `i-3..=i` is invalid, or when one of the last three candles has zero range.
    pub fn detect(&self, window: &CandleWindow, i: usize) -> PatternFlags {
        if i < REQUIRED_HISTORY || !span_is_valid(window, i - REQUIRED_HISTORY, i) {
            trace!(index = i, "pattern detection skipped: insufficient or invalid candles");
            return PatternFlags::invalid();
        }

        let current = &window[i];
        let prev = &window[i - 1];
        let prev2 = &window[i - 2];
        if current.range() <= 0.0 || prev.range() <= 0.0 || prev2.range() <= 0.0 {
            return PatternFlags::invalid();
        }

        let mut flags = PatternFlags::default();
        single::detect(current, &self.config, &mut flags);

        // Two-candle structure is always read; the reversal set is optional.
        flags.inside_bar = multi::inside_bar(current, prev);
        flags.outside_bar = multi::outside_bar(current, prev);

        if self.multi_candle {
            multi::detect(current, prev, prev2, &self.config, &mut flags);
        }
        if self.continuation {
            continuation::detect(window, i, &self.config, &mut flags);
        }
        flags
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{Candle, CandleWindow};
    use chrono::TimeZone;

    /// Build a window from explicit (open, high, low, close) tuples.
    pub fn window_from_ohlc(ohlc: &[(f64, f64, f64, f64)]) -> CandleWindow {
        let candles = ohlc.iter().enumerate().map(|(i, &(o, h, l, c))| {
            Candle::new(
                chrono::Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                o,
                h,
                l,
                c,
                Some(1000.0),
            )
        });
        CandleWindow::from_candles(ohlc.len().max(1), candles).unwrap()
    }

    /// Three plain filler candles with non-zero ranges and no pattern relationships.
    pub fn filler() -> Vec<(f64, f64, f64, f64)> {
        vec![
            (100.0, 102.0, 98.0, 101.0),
            (101.0, 103.0, 99.0, 100.0),
            (100.0, 102.5, 98.5, 101.5),
        ]
    }
}
