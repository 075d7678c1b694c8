//! Momentum: fractional change of close over a lookback.
//!
//! momentum[i] = close[i] / close[i-periods] - 1
//! Lookback: periods.

use crate::domain::CandleWindow;

pub fn pct_change(window: &CandleWindow, i: usize, periods: usize) -> Option<f64> {
    if periods == 0 || i < periods || i >= window.len() {
        return None;
    }
    let prev = &window[i - periods];
    let curr = &window[i];
    if !prev.is_valid() || !curr.is_valid() {
        return None;
    }
    Some(curr.close / prev.close - 1.0)
}
