//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single instrument over one kline interval.
///
/// `timestamp` is the candle's open time. `volume` is `None` when the feed
/// does not carry volume; volume-based metrics then fall back to neutral values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLC field is NaN or infinite (void candle).
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Positive prices and `low <= min(open, close) <= max(open, close) <= high`.
    ///
    /// Invalid candles are excluded from pattern and momentum computation.
    pub fn is_valid(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High-to-low distance.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Midpoint of the open/close body.
    pub fn body_midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    /// Green candle: close strictly above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Red candle: close strictly below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_candle() -> Candle {
        Candle::new(
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            Some(50_000.0),
        )
    }

    #[test]
    fn candle_is_valid() {
        assert!(sample_candle().is_valid());
    }

    #[test]
    fn candle_detects_void() {
        let mut candle = sample_candle();
        candle.open = f64::NAN;
        assert!(candle.is_void());
        assert!(!candle.is_valid());

        let mut candle = sample_candle();
        candle.high = f64::INFINITY;
        assert!(!candle.is_valid());
    }

    #[test]
    fn candle_detects_inverted_high_low() {
        let mut candle = sample_candle();
        candle.high = 97.0;
        assert!(!candle.is_valid());
    }

    #[test]
    fn candle_rejects_body_outside_range() {
        let mut candle = sample_candle();
        candle.close = 106.0;
        assert!(!candle.is_valid());
    }

    #[test]
    fn candle_rejects_non_positive_price() {
        let mut candle = sample_candle();
        candle.low = 0.0;
        assert!(!candle.is_valid());
    }

    #[test]
    fn candle_anatomy() {
        let candle = sample_candle();
        assert_eq!(candle.body(), 3.0);
        assert_eq!(candle.range(), 7.0);
        assert_eq!(candle.upper_shadow(), 2.0);
        assert_eq!(candle.lower_shadow(), 2.0);
        assert_eq!(candle.body_midpoint(), 101.5);
        assert!(candle.is_bullish());
        assert!(!candle.is_bearish());
    }

    #[test]
    fn flat_candle_has_no_color() {
        let mut candle = sample_candle();
        candle.close = candle.open;
        assert!(!candle.is_bullish());
        assert!(!candle.is_bearish());
    }
}
