//! Trade decision produced by a strategy for the latest candle.

use serde::{Deserialize, Serialize};

use crate::position_management::Side;

/// Directional decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl Direction {
    pub fn is_directional(&self) -> bool {
        matches!(self, Direction::Buy | Direction::Sell)
    }

    /// Position side a directional decision opens; `None` for Hold.
    pub fn side(&self) -> Option<Side> {
        match self {
            Direction::Buy => Some(Side::Long),
            Direction::Sell => Some(Side::Short),
            Direction::Hold => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Hold => "HOLD",
        };
        f.write_str(label)
    }
}

/// Outcome of one evaluation: direction, winning score and rationale.
///
/// `strength` is 0 and `reasons` is empty whenever the direction is Hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalResult {
    pub direction: Direction,
    pub strength: u32,
    pub reasons: Vec<String>,
}

impl SignalResult {
    /// The fail-safe result for missing, malformed or inconclusive input.
    pub fn hold() -> Self {
        Self {
            direction: Direction::Hold,
            strength: 0,
            reasons: Vec::new(),
        }
    }

    pub fn is_hold(&self) -> bool {
        self.direction == Direction::Hold
    }
}
