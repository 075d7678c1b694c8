//! Engine configuration: strategy, pattern ratios and risk settings.
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs the keys it
//! overrides. Configuration is read once at startup and treated as read-only.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extra candles required beyond the longest indicator window.
pub const WINDOW_MARGIN: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: StrategyConfig,
    pub patterns: PatternConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.patterns.validate()?;
        self.risk.validate()
    }

    /// Candles required before any signal can be produced.
    pub fn min_window(&self) -> usize {
        self.strategy.min_window()
    }

    /// Content hash of the configuration, logged with every decision run.
    pub fn fingerprint(&self) -> String {
        // Serializing a struct of plain numbers and strings cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn check_fraction(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in (0, 1], got {value}")))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

// ─── Strategy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    /// Registered strategy name (see `StrategyRegistry`).
    pub name: String,
    pub lookback_period: usize,
    pub momentum_threshold: f64,
    pub volatility_window: usize,
    pub momentum_window: usize,
    pub volume_threshold: f64,
    pub min_signal_strength: u32,
    pub enable_flag_pennant_detection: bool,
    pub enable_multi_candle_patterns: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: "price_action".into(),
            lookback_period: 20,
            momentum_threshold: 0.01,
            volatility_window: 14,
            momentum_window: 10,
            volume_threshold: 1.5,
            min_signal_strength: 4,
            enable_flag_pennant_detection: true,
            enable_multi_candle_patterns: true,
        }
    }
}

impl StrategyConfig {
    pub fn min_window(&self) -> usize {
        self.lookback_period
            .max(self.volatility_window)
            .max(self.momentum_window)
            + WINDOW_MARGIN
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_period == 0 {
            return Err(invalid("lookback_period must be at least 1"));
        }
        if self.volatility_window < 2 {
            return Err(invalid("volatility_window must be at least 2"));
        }
        if self.momentum_window == 0 {
            return Err(invalid("momentum_window must be at least 1"));
        }
        check_positive("momentum_threshold", self.momentum_threshold)?;
        check_positive("volume_threshold", self.volume_threshold)?;
        if self.min_signal_strength == 0 {
            return Err(invalid("min_signal_strength must be at least 1"));
        }
        Ok(())
    }
}

// ─── Patterns ────────────────────────────────────────────────────────

/// Geometry ratios used by the pattern detector. Body and shadow ratios are
/// fractions of the candle range unless noted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    /// Pin bar body must exceed this share of the range.
    pub pin_bar_min_body: f64,
    /// Pin bar long shadow must exceed this multiple of the body.
    pub pin_bar_long_shadow: f64,
    /// Pin bar short shadow must stay below this multiple of the body.
    pub pin_bar_short_shadow: f64,
    pub marubozu_min_body: f64,
    pub doji_max_body: f64,
    pub doji_long_shadow: f64,
    pub doji_short_shadow: f64,
    pub spinning_min_body: f64,
    pub spinning_max_body: f64,
    /// Engulfing body must exceed this multiple of the prior body.
    pub engulfing_body_multiple: f64,
    /// Tweezer extremes match when `|a - b| < (a + b) * tolerance`.
    pub tweezer_tolerance: f64,
    /// Tweezer wick must extend this fraction beyond the body.
    pub tweezer_wick_extension: f64,
    /// Star middle body must stay below this multiple of the first body.
    pub star_middle_body: f64,
    /// Soldier/crow open must sit within this fraction of the prior close.
    pub soldiers_open_tolerance: f64,
    pub soldiers_min_body: f64,
    pub min_pole_move: f64,
    pub flag_pole: usize,
    pub flag_consolidation: usize,
    pub flag_max_range: f64,
    pub pennant_pole: usize,
    pub pennant_consolidation: usize,
    pub pennant_max_range: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            pin_bar_min_body: 0.05,
            pin_bar_long_shadow: 2.5,
            pin_bar_short_shadow: 0.4,
            marubozu_min_body: 0.9,
            doji_max_body: 0.1,
            doji_long_shadow: 0.7,
            doji_short_shadow: 0.1,
            spinning_min_body: 0.1,
            spinning_max_body: 0.3,
            engulfing_body_multiple: 1.1,
            tweezer_tolerance: 0.002,
            tweezer_wick_extension: 0.005,
            star_middle_body: 0.5,
            soldiers_open_tolerance: 0.005,
            soldiers_min_body: 0.6,
            min_pole_move: 0.02,
            flag_pole: 7,
            flag_consolidation: 5,
            flag_max_range: 0.5,
            pennant_pole: 9,
            pennant_consolidation: 6,
            pennant_max_range: 0.7,
        }
    }
}

impl PatternConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("pin_bar_min_body", self.pin_bar_min_body),
            ("marubozu_min_body", self.marubozu_min_body),
            ("doji_max_body", self.doji_max_body),
            ("spinning_max_body", self.spinning_max_body),
            ("soldiers_min_body", self.soldiers_min_body),
        ] {
            check_fraction(name, value)?;
        }
        if self.spinning_min_body > self.spinning_max_body {
            return Err(invalid("spinning_min_body must not exceed spinning_max_body"));
        }
        check_positive("min_pole_move", self.min_pole_move)?;
        if self.flag_pole == 0 || self.flag_consolidation == 0 {
            return Err(invalid("flag pole and consolidation lengths must be at least 1"));
        }
        if self.pennant_pole == 0 || self.pennant_consolidation == 0 {
            return Err(invalid("pennant pole and consolidation lengths must be at least 1"));
        }
        Ok(())
    }
}

// ─── Risk ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    /// Share of the balance committed as margin per trade.
    pub fixed_trade_fraction: f64,
    pub leverage: u32,
    pub max_positions_per_symbol: u32,
    pub use_stop_loss: bool,
    pub stop_loss_pct: f64,
    pub trailing_stop: bool,
    pub trailing_stop_pct: f64,
    /// Re-evaluate the trailing stop on every cycle while a position is held.
    pub update_trailing_on_hold: bool,
    pub use_take_profit: bool,
    pub use_dual_take_profit: bool,
    pub tp1_pct: f64,
    pub tp1_size_pct: f64,
    pub tp2_pct: f64,
    pub tp2_size_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            fixed_trade_fraction: 0.40,
            leverage: 25,
            max_positions_per_symbol: 1,
            use_stop_loss: true,
            stop_loss_pct: 0.005,
            trailing_stop: true,
            trailing_stop_pct: 0.005,
            update_trailing_on_hold: true,
            use_take_profit: true,
            use_dual_take_profit: true,
            tp1_pct: 0.005,
            tp1_size_pct: 0.50,
            tp2_pct: 0.01,
            tp2_size_pct: 1.00,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("fixed_trade_fraction", self.fixed_trade_fraction)?;
        if self.leverage == 0 {
            return Err(invalid("leverage must be at least 1"));
        }
        check_fraction("stop_loss_pct", self.stop_loss_pct)?;
        check_fraction("trailing_stop_pct", self.trailing_stop_pct)?;
        check_positive("tp1_pct", self.tp1_pct)?;
        check_positive("tp2_pct", self.tp2_pct)?;
        check_fraction("tp1_size_pct", self.tp1_size_pct)?;
        check_fraction("tp2_size_pct", self.tp2_size_pct)?;
        if self.tp2_size_pct < self.tp1_size_pct {
            return Err(invalid(format!(
                "tp2_size_pct ({}) must not be below tp1_size_pct ({})",
                self.tp2_size_pct, self.tp1_size_pct
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.min_window(), 25);
        assert_eq!(config.risk.leverage, 25);
        assert_eq!(config.strategy.min_signal_strength, 4);
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [strategy]
            lookback_period = 30

            [risk]
            leverage = 10
            trailing_stop = false
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy.lookback_period, 30);
        assert_eq!(config.strategy.momentum_window, 10);
        assert_eq!(config.risk.leverage, 10);
        assert!(!config.risk.trailing_stop);
        assert_eq!(config.min_window(), 35);
    }

    #[test]
    fn empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn rejects_inverted_take_profit_sizes() {
        let err = EngineConfig::from_toml_str(
            r#"
            [risk]
            tp1_size_pct = 0.8
            tp2_size_pct = 0.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_leverage() {
        let err = EngineConfig::from_toml_str("[risk]\nleverage = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("[risk\nleverage = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = EngineConfig::default();
        let mut b = EngineConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.risk.leverage = 5;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
