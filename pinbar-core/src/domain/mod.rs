//! Domain types: candles, kline rows, the candle window and symbol trading rules.

pub mod candle;
pub mod kline;
pub mod rules;
pub mod window;

pub use candle::Candle;
pub use kline::{parse_klines_csv, parse_klines_json, KlineError, KlineRecord};
pub use rules::{round_to_decimals, SymbolTradingRules};
pub use window::{CandleWindow, WindowError};
