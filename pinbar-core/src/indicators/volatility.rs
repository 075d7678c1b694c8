//! Return volatility: sample standard deviation of close-to-close returns.
//!
//! r[k] = close[k] / close[k-1] - 1, volatility[i] = std(r[i-period+1..=i]).
//! Lookback: period (needs period+1 candles).

use crate::domain::CandleWindow;

use super::momentum::pct_change;

pub fn return_volatility(window: &CandleWindow, i: usize, period: usize) -> Option<f64> {
    if period < 2 || i < period {
        return None;
    }
    let returns = ((i + 1 - period)..=i)
        .map(|k| pct_change(window, k, 1))
        .collect::<Option<Vec<f64>>>()?;
    sample_std_dev(&returns)
}

/// Sample (n-1) standard deviation; `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
