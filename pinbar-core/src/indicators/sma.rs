//! Simple moving average of close.
//!
//! sma[i] = mean(close[i-period+1..=i]).
//! Lookback: period - 1.

use crate::domain::CandleWindow;

use super::span_is_valid;

pub fn sma_close(window: &CandleWindow, i: usize, period: usize) -> Option<f64> {
    if period == 0 || i + 1 < period || !span_is_valid(window, i + 1 - period, i) {
        return None;
    }
    let sum: f64 = ((i + 1 - period)..=i).map(|k| window[k].close).sum();
    Some(sum / period as f64)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_window, DEFAULT_EPSILON};

    #[test]
    fn sma_basic() {
        let window = make_window(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sma_close(&window, 1, 3), None);
        assert_approx(sma_close(&window, 2, 3).unwrap(), 2.0, DEFAULT_EPSILON);
        assert_approx(sma_close(&window, 4, 3).unwrap(), 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }
}
