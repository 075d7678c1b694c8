//! Rolling indicators evaluated at a single window index.
//!
//! Every function looks back from index `i` over a fixed number of candles and
//! returns `None` when the window is too short or any candle it needs is
//! invalid. Nothing is precomputed; each call reads only the candles it needs.

pub mod atr;
pub mod momentum;
pub mod sma;
pub mod volatility;

pub use atr::{average_true_range, true_range};
pub use momentum::pct_change;
pub use sma::{mean, sma_close};
pub use volatility::{return_volatility, sample_std_dev};

use crate::domain::CandleWindow;

/// True when every candle in `start..=end` exists and is valid.
pub fn span_is_valid(window: &CandleWindow, start: usize, end: usize) -> bool {
    window
        .span(start, end)
        .map(|mut candles| candles.all(|c| c.is_valid()))
        .unwrap_or(false)
}

/// Create a window of synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000, one-minute spacing.
#[cfg(test)]
pub fn make_window(closes: &[f64]) -> CandleWindow {
    use crate::domain::Candle;
    use chrono::TimeZone;

    let candles = closes.iter().enumerate().map(|(i, &close)| {
        let open = if i == 0 { close } else { closes[i - 1] };
        Candle::new(
            chrono::Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
            open,
            open.max(close) + 1.0,
            open.min(close) - 1.0,
            close,
            Some(1000.0),
        )
    });
    CandleWindow::from_candles(closes.len().max(1), candles).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
