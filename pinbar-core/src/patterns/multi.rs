//! Two- and three-candle patterns read from the current candle backwards.

use crate::config::PatternConfig;
use crate::domain::Candle;

use super::PatternFlags;

pub(super) fn detect(
    current: &Candle,
    prev: &Candle,
    prev2: &Candle,
    config: &PatternConfig,
    flags: &mut PatternFlags,
) {
    let (bullish, bearish) = engulfing(current, prev, config);
    flags.engulfing_bullish = bullish;
    flags.engulfing_bearish = bearish;

    let (top, bottom) = tweezer(current, prev, config);
    flags.tweezer_top = top;
    flags.tweezer_bottom = bottom;

    let (morning, evening) = star(current, prev, prev2, config);
    flags.morning_star = morning;
    flags.evening_star = evening;

    let (soldiers, crows) = three_in_a_row(current, prev, prev2, config);
    flags.three_white_soldiers = soldiers;
    flags.three_black_crows = crows;
}

fn engulfing(current: &Candle, prev: &Candle, config: &PatternConfig) -> (bool, bool) {
    if current.body() <= config.engulfing_body_multiple * prev.body() {
        return (false, false);
    }
    let bullish = prev.is_bearish()
        && current.is_bullish()
        && current.close > prev.open
        && current.open < prev.close;
    let bearish = prev.is_bullish()
        && current.is_bearish()
        && current.open > prev.close
        && current.close < prev.open;
    (bullish, bearish)
}

fn tweezer(current: &Candle, prev: &Candle, config: &PatternConfig) -> (bool, bool) {
    let matched = |a: f64, b: f64| (a - b).abs() < (a + b) * config.tweezer_tolerance;

    let top = matched(current.high, prev.high)
        && current.is_bearish()
        && prev.is_bearish()
        && current.high >= current.body_top() * (1.0 + config.tweezer_wick_extension);
    let bottom = matched(current.low, prev.low)
        && current.is_bullish()
        && prev.is_bullish()
        && current.low <= current.body_bottom() * (1.0 - config.tweezer_wick_extension);
    (top, bottom)
}

fn star(current: &Candle, middle: &Candle, first: &Candle, config: &PatternConfig) -> (bool, bool) {
    if middle.body() >= config.star_middle_body * first.body() {
        return (false, false);
    }
    let morning =
        first.is_bearish() && current.is_bullish() && current.close > first.body_midpoint();
    let evening =
        first.is_bullish() && current.is_bearish() && current.close < first.body_midpoint();
    (morning, evening)
}

fn three_in_a_row(
    current: &Candle,
    prev: &Candle,
    prev2: &Candle,
    config: &PatternConfig,
) -> (bool, bool) {
    let run = [prev2, prev, current];
    let solid = run
        .iter()
        .all(|c| c.body() >= config.soldiers_min_body * c.range());
    if !solid {
        return (false, false);
    }
    let opens_near_prior_close = run.windows(2).all(|pair| {
        (pair[1].open - pair[0].close).abs() <= pair[0].close * config.soldiers_open_tolerance
    });
    if !opens_near_prior_close {
        return (false, false);
    }

    let soldiers = run.iter().all(|c| c.is_bullish())
        && run.windows(2).all(|pair| pair[1].close > pair[0].close);
    let crows = run.iter().all(|c| c.is_bearish())
        && run.windows(2).all(|pair| pair[1].close < pair[0].close);
    (soldiers, crows)
}

/// Current range strictly inside the prior range.
pub(super) fn inside_bar(current: &Candle, prev: &Candle) -> bool {
    current.high < prev.high && current.low > prev.low
}

/// Current range strictly outside the prior range, with a larger body.
pub(super) fn outside_bar(current: &Candle, prev: &Candle) -> bool {
    current.high > prev.high && current.low < prev.low && current.body() > prev.body()
}
