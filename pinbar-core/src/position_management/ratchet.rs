/// Ratchet invariant enforcement
///
/// **Core Rule:** Stops may tighten, never loosen.
///
/// A proposed level is adopted only when it strictly improves protection.
/// Equal or looser proposals leave the level untouched.
use crate::position_management::Side;

/// Ratchet state for stop-loss management
///
/// Enforces the invariant that stops can only move in the favorable direction:
/// - Long positions: stop can only rise (tighten)
/// - Short positions: stop can only fall (tighten)
#[derive(Debug, Clone, PartialEq)]
pub struct RatchetState {
    /// Current stop level (high-water mark for longs, low-water mark for shorts)
    current_level: Option<f64>,

    /// Position side
    side: Side,
}

impl RatchetState {
    /// Create a new ratchet state with no level
    pub fn new(side: Side) -> Self {
        Self {
            current_level: None,
            side,
        }
    }

    /// Create a ratchet with an initial level
    pub fn with_initial_level(side: Side, initial_level: f64) -> Self {
        Self {
            current_level: Some(initial_level),
            side,
        }
    }

    /// True if `proposed` strictly tightens the current level.
    ///
    /// With no current level any finite proposal tightens.
    pub fn tightens(&self, proposed: f64) -> bool {
        if !proposed.is_finite() {
            return false;
        }
        match self.current_level {
            None => true,
            Some(current) => match self.side {
                Side::Long => proposed > current,
                Side::Short => proposed < current,
            },
        }
    }

    /// Offer a proposed stop level.
    ///
    /// Returns `Some(proposed)` when adopted, `None` when rejected.
    ///
    /// # Example
    /// ```
    /// use pinbar_core::position_management::{RatchetState, Side};
    ///
    /// let mut ratchet = RatchetState::with_initial_level(Side::Long, 99.50);
    ///
    /// // Tightening: 99.50 → 101.49 (adopted)
    /// assert_eq!(ratchet.propose(101.49), Some(101.49));
    ///
    /// // Loosening: 101.49 → 100.00 (rejected, stays at 101.49)
    /// assert_eq!(ratchet.propose(100.00), None);
    /// assert_eq!(ratchet.current_level(), Some(101.49));
    /// ```
    pub fn propose(&mut self, proposed: f64) -> Option<f64> {
        if !self.tightens(proposed) {
            return None;
        }
        self.current_level = Some(proposed);
        Some(proposed)
    }

    /// Get current ratchet level (if set)
    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }

}
