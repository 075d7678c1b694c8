//! True range and its rolling mean (ATR).
//!
//! TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the simple mean of the last `period` true ranges.
//! Lookback: period (needs period+1 candles).

use crate::domain::CandleWindow;

use super::span_is_valid;

/// True range at `i`. Needs the previous candle for its close.
pub fn true_range(window: &CandleWindow, i: usize) -> Option<f64> {
    if i == 0 || !span_is_valid(window, i - 1, i) {
        return None;
    }
    let curr = &window[i];
    let prev_close = window[i - 1].close;
    Some(
        curr.range()
            .max((curr.high - prev_close).abs())
            .max((curr.low - prev_close).abs()),
    )
}

/// Mean true range over the `period` candles ending at `i`.
pub fn average_true_range(window: &CandleWindow, i: usize, period: usize) -> Option<f64> {
    if period == 0 || i < period {
        return None;
    }
    let mut sum = 0.0;
    for k in (i + 1 - period)..=i {
        sum += true_range(window, k)?;
    }
    Some(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_window, DEFAULT_EPSILON};

    #[test]
    fn true_range_uses_gap() {
        // open = prev close, so range is |close - prev| + 2
        let window = make_window(&[100.0, 105.0]);
        assert_eq!(true_range(&window, 0), None);
        assert_approx(true_range(&window, 1).unwrap(), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_mean_of_true_ranges() {
        let window = make_window(&[100.0, 101.0, 103.0, 102.0]);
        // TRs: 3, 4, 3
        assert_approx(average_true_range(&window, 3, 3).unwrap(), 10.0 / 3.0, DEFAULT_EPSILON);
        assert_eq!(average_true_range(&window, 2, 3), None);
    }

    #[test]
    fn atr_none_when_candle_invalid() {
        use crate::domain::Candle;
        let base = make_window(&[100.0, 101.0, 103.0, 102.0]);
        let mut candles: Vec<Candle> = base.iter().copied().collect();
        candles[2].high = 50.0;
        let window = crate::domain::CandleWindow::from_candles(4, candles).unwrap();
        assert_eq!(average_true_range(&window, 3, 3), None);
    }
}
