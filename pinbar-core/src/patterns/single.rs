//! Single-candle shapes: pin bars, marubozu, the doji family, spinning tops.

use crate::config::PatternConfig;
use crate::domain::Candle;

use super::PatternFlags;

/// Classify `candle` alone. Assumes a valid candle with non-zero range.
pub(super) fn detect(candle: &Candle, config: &PatternConfig, flags: &mut PatternFlags) {
    let body = candle.body();
    let range = candle.range();
    let upper = candle.upper_shadow();
    let lower = candle.lower_shadow();

    if body > config.pin_bar_min_body * range {
        flags.pin_bar_bullish =
            lower > config.pin_bar_long_shadow * body && upper < config.pin_bar_short_shadow * body;
        flags.pin_bar_bearish =
            upper > config.pin_bar_long_shadow * body && lower < config.pin_bar_short_shadow * body;
    }

    if body >= config.marubozu_min_body * range {
        flags.marubozu_bullish = candle.is_bullish();
        flags.marubozu_bearish = candle.is_bearish();
    }

    if body < config.doji_max_body * range {
        if upper > config.doji_long_shadow * range && lower < config.doji_short_shadow * range {
            flags.gravestone_doji = true;
        } else if lower > config.doji_long_shadow * range
            && upper < config.doji_short_shadow * range
        {
            flags.dragonfly_doji = true;
        } else {
            flags.doji = true;
        }
    }

    let spinning_body =
        body >= config.spinning_min_body * range && body <= config.spinning_max_body * range;
    if spinning_body && upper > body && lower > body {
        if candle.is_bullish() {
            flags.spinning_top = true;
        } else {
            flags.spinning_bottom = true;
        }
    }
}
