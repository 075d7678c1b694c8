//! Flags and pennants: a directional pole, a tight consolidation, a breakout.
//!
//! Layout ending at the breakout candle `i`, for a pole of `p` candles and a
//! consolidation of `k` candles:
//!
//! ```text
//! [ i-k-1-p ......... i-k-1 ][ i-k ... i-1 ][ i ]
//!          pole                consolidation  breakout
//! ```

use crate::config::PatternConfig;
use crate::domain::CandleWindow;
use crate::indicators::span_is_valid;

use super::PatternFlags;

#[derive(Debug, Clone, Copy)]
struct Shape {
    pole: usize,
    consolidation: usize,
    max_range: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakout {
    None,
    Bullish,
    Bearish,
}

pub(super) fn detect(
    window: &CandleWindow,
    i: usize,
    config: &PatternConfig,
    flags: &mut PatternFlags,
) {
    let flag = Shape {
        pole: config.flag_pole,
        consolidation: config.flag_consolidation,
        max_range: config.flag_max_range,
    };
    let pennant = Shape {
        pole: config.pennant_pole,
        consolidation: config.pennant_consolidation,
        max_range: config.pennant_max_range,
    };

    match breakout(window, i, flag, config.min_pole_move) {
        Breakout::Bullish => flags.bullish_flag = true,
        Breakout::Bearish => flags.bearish_flag = true,
        Breakout::None => {}
    }
    match breakout(window, i, pennant, config.min_pole_move) {
        Breakout::Bullish => flags.bullish_pennant = true,
        Breakout::Bearish => flags.bearish_pennant = true,
        Breakout::None => {}
    }
}

fn breakout(window: &CandleWindow, i: usize, shape: Shape, min_move: f64) -> Breakout {
    let Some(pole_start) = i.checked_sub(shape.consolidation + 1 + shape.pole) else {
        return Breakout::None;
    };
    if !span_is_valid(window, pole_start, i) {
        return Breakout::None;
    }

    let pole_end = i - shape.consolidation - 1;
    let start_close = window[pole_start].close;
    let pole_move = window[pole_end].close - start_close;
    if pole_move.abs() / start_close < min_move {
        return Breakout::None;
    }

    let (mut cons_high, mut cons_low) = (f64::MIN, f64::MAX);
    for k in (i - shape.consolidation)..i {
        cons_high = cons_high.max(window[k].high);
        cons_low = cons_low.min(window[k].low);
    }
    if cons_high - cons_low >= shape.max_range * pole_move.abs() {
        return Breakout::None;
    }

    let current = &window[i];
    if pole_move > 0.0 && current.is_bullish() && current.close > cons_high {
        Breakout::Bullish
    } else if pole_move < 0.0 && current.is_bearish() && current.close < cons_low {
        Breakout::Bearish
    } else {
        Breakout::None
    }
}
