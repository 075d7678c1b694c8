//! Momentum, volatility, volume and trend context at a single candle index.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::CandleWindow;
use crate::indicators::{average_true_range, mean, pct_change, return_volatility, sma_close};

/// Evidence read from the trailing window ending at one index.
///
/// Numeric fields are `None` when their window is too short or touches an
/// invalid candle. `None` means unknown; it is never substituted with zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumMetrics {
    pub momentum_fast: Option<f64>,
    pub momentum: Option<f64>,
    pub momentum_slow: Option<f64>,
    pub acceleration: Option<f64>,
    pub atr: Option<f64>,
    pub volatility: Option<f64>,
    pub volatility_ratio: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume_spike: bool,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
    pub trend_bullish: bool,
    pub trend_bearish: bool,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
}

impl MomentumMetrics {
    /// Momentum and volatility are both known; scoring needs at least these.
    pub fn is_scorable(&self) -> bool {
        self.momentum.is_some() && self.volatility.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct MomentumVolatilityAnalyzer {
    lookback: usize,
    volatility_window: usize,
    momentum_window: usize,
    volume_threshold: f64,
}

impl MomentumVolatilityAnalyzer {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            lookback: config.lookback_period,
            volatility_window: config.volatility_window,
            momentum_window: config.momentum_window,
            volume_threshold: config.volume_threshold,
        }
    }

    pub fn analyze(&self, window: &CandleWindow, i: usize) -> MomentumMetrics {
        if i >= window.len() {
            return MomentumMetrics::default();
        }

        let mw = self.momentum_window;
        let momentum = pct_change(window, i, mw);
        let prev_momentum = i.checked_sub(1).and_then(|p| pct_change(window, p, mw));

        let acceleration = match (momentum, prev_momentum) {
            (Some(now), Some(before)) => Some(now - before),
            _ => None,
        };

        let volume_ratio = self.volume_ratio(window, i);
        let volume_spike = volume_ratio.is_some_and(|r| r > self.volume_threshold);

        let ma_fast = sma_close(window, i, mw);
        let ma_slow = sma_close(window, i, mw * 2);
        let close = window[i].close;
        let (trend_bullish, trend_bearish) = match (ma_fast, ma_slow) {
            (Some(fast), Some(slow)) => (
                fast > slow && close > fast,
                fast < slow && close <= fast,
            ),
            _ => (false, false),
        };

        let (bullish_divergence, bearish_divergence) = match (momentum, prev_momentum) {
            (Some(now), Some(before)) => {
                let prev_close = window[i - 1].close;
                (
                    close < prev_close && now > before,
                    close > prev_close && now < before,
                )
            }
            _ => (false, false),
        };

        MomentumMetrics {
            momentum_fast: pct_change(window, i, (mw / 2).max(1)),
            momentum,
            momentum_slow: pct_change(window, i, mw * 2),
            acceleration,
            atr: average_true_range(window, i, self.volatility_window),
            volatility: return_volatility(window, i, self.volatility_window),
            volatility_ratio: self.volatility_ratio(window, i),
            volume_ratio,
            volume_spike,
            ma_fast,
            ma_slow,
            trend_bullish,
            trend_bearish,
            bullish_divergence,
            bearish_divergence,
        }
    }

    /// Current volatility over its mean across the last `lookback` indices.
    fn volatility_ratio(&self, window: &CandleWindow, i: usize) -> Option<f64> {
        let start = (i + 1).checked_sub(self.lookback)?;
        let history = (start..=i)
            .map(|k| return_volatility(window, k, self.volatility_window))
            .collect::<Option<Vec<f64>>>()?;
        let current = *history.last()?;
        let avg = mean(&history)?;
        (avg > 0.0).then(|| current / avg)
    }

    /// Current volume over the mean volume of the last `lookback` candles.
    ///
    /// Neutral 1.0 when volume is not reported or averages zero.
    fn volume_ratio(&self, window: &CandleWindow, i: usize) -> Option<f64> {
        let start = (i + 1).checked_sub(self.lookback)?;
        let volumes = (start..=i)
            .map(|k| window[k].volume)
            .collect::<Option<Vec<f64>>>();
        let Some(volumes) = volumes else {
            return Some(1.0);
        };
        let current = *volumes.last()?;
        match mean(&volumes) {
            Some(avg) if avg > 0.0 && current.is_finite() => Some(current / avg),
            _ => Some(1.0),
        }
    }
}
