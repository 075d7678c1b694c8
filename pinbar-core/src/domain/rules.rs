use serde::{Deserialize, Serialize};

/// Tolerance, in steps, when deciding whether a quantity sits on the step grid.
const STEP_TOLERANCE: f64 = 1e-6;

/// Exchange trading rules for one symbol.
///
/// Prices are rounded to `price_precision` decimals. Quantities must be whole
/// multiples of `step_size` within `[min_qty, max_qty]`, and an order's
/// notional value (`quantity * price`) must reach `min_notional`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolTradingRules {
    pub symbol: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub min_qty: f64,
    pub max_qty: f64,
    pub step_size: f64,
    pub min_notional: f64,
}

impl SymbolTradingRules {
    /// True when the step grid and bounds are usable for sizing.
    pub fn is_usable(&self) -> bool {
        self.step_size.is_finite()
            && self.step_size > 0.0
            && self.max_qty.is_finite()
            && self.max_qty >= self.step_size
            && self.min_notional.is_finite()
            && self.min_notional >= 0.0
    }

    /// Round a price to the symbol's price precision.
    pub fn round_price(&self, price: f64) -> f64 {
        round_to_decimals(price, self.price_precision)
    }

    /// Round a quantity to the symbol's quantity precision.
    pub fn round_quantity(&self, quantity: f64) -> f64 {
        round_to_decimals(quantity, self.quantity_precision)
    }

    /// Whole steps contained in `quantity`, rounding down.
    pub fn steps_floor(&self, quantity: f64) -> u64 {
        if quantity <= 0.0 || !quantity.is_finite() {
            return 0;
        }
        (quantity / self.step_size + STEP_TOLERANCE).floor() as u64
    }

    /// Whole steps needed to reach `quantity`, rounding up.
    pub fn steps_ceil(&self, quantity: f64) -> u64 {
        if quantity <= 0.0 || !quantity.is_finite() {
            return 0;
        }
        (quantity / self.step_size - STEP_TOLERANCE).ceil() as u64
    }

    /// Quantity for a whole number of steps, free of accumulated float error.
    pub fn quantity_from_steps(&self, steps: u64) -> f64 {
        round_to_decimals(steps as f64 * self.step_size, self.step_decimals())
    }

    /// Step count of `max_qty`.
    pub fn max_steps(&self) -> u64 {
        self.steps_floor(self.max_qty)
    }

    pub fn is_step_aligned(&self, quantity: f64) -> bool {
        let steps = quantity / self.step_size;
        (steps - steps.round()).abs() < STEP_TOLERANCE
    }

    /// Decimal places needed to represent `step_size` exactly (capped at 12).
    pub fn step_decimals(&self) -> u32 {
        (0..=12)
            .find(|&d| {
                let scaled = self.step_size * 10f64.powi(d as i32);
                (scaled - scaled.round()).abs() < 1e-9 * scaled.max(1.0)
            })
            .unwrap_or(12)
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_rules() -> SymbolTradingRules {
        SymbolTradingRules {
            symbol: "BTCUSDT".into(),
            price_precision: 2,
            quantity_precision: 3,
            min_qty: 0.001,
            max_qty: 1000.0,
            step_size: 0.001,
            min_notional: 5.0,
        }
    }

    #[test]
    fn test_price_rounding() {
        let rules = btc_rules();
        assert_eq!(rules.round_price(99.4999), 99.50);
        assert_eq!(rules.round_price(101.494), 101.49);
    }

    #[test]
    fn test_steps_floor_avoids_drift() {
        let rules = btc_rules();
        // 0.1 + 0.2 style drift must not drop a whole step
        assert_eq!(rules.quantity_from_steps(rules.steps_floor(0.1 + 0.2)), 0.3);
        assert_eq!(rules.quantity_from_steps(rules.steps_floor(5.0009)), 5.0);
        assert_eq!(rules.steps_floor(-1.0), 0);
    }

    #[test]
    fn test_steps_ceil() {
        let rules = btc_rules();
        assert_eq!(rules.steps_ceil(0.0501), 51);
        assert_eq!(rules.steps_ceil(0.05), 50);
    }

    #[test]
    fn test_step_alignment() {
        let rules = btc_rules();
        assert!(rules.is_step_aligned(2.5));
        assert!(rules.is_step_aligned(0.003));
        assert!(!rules.is_step_aligned(0.0035));
    }

    #[test]
    fn test_step_decimals() {
        let mut rules = btc_rules();
        assert_eq!(rules.step_decimals(), 3);
        rules.step_size = 1.0;
        assert_eq!(rules.step_decimals(), 0);
        rules.step_size = 0.5;
        assert_eq!(rules.step_decimals(), 1);
    }

    #[test]
    fn test_usable_rules() {
        let mut rules = btc_rules();
        assert!(rules.is_usable());
        rules.step_size = 0.0;
        assert!(!rules.is_usable());
    }
}
