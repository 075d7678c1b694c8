//! Fixed-fraction sizer
//!
//! Commits `fraction` of the balance as margin and levers it up:
//! `quantity ≈ balance * fraction * leverage / price`, snapped down to the
//! step grid. Margin is always computed from a whole step count so float
//! error cannot push it above the budget.

use tracing::{debug, warn};

use crate::config::RiskConfig;
use crate::domain::SymbolTradingRules;
use crate::sizers::{PositionPlan, Sizer};

#[derive(Debug, Clone)]
pub struct FixedFractionSizer {
    fraction: f64,
    leverage: u32,
}

impl FixedFractionSizer {
    pub fn new(fraction: f64, leverage: u32) -> Self {
        Self { fraction, leverage }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.fixed_trade_fraction, config.leverage)
    }
}

impl Sizer for FixedFractionSizer {
    fn size(&self, balance: f64, price: f64, rules: &SymbolTradingRules) -> PositionPlan {
        size_position(balance, price, self.leverage, self.fraction, rules)
    }

    fn name(&self) -> &str {
        "fixed_fraction"
    }
}

fn margin_for(rules: &SymbolTradingRules, steps: u64, price: f64, leverage: f64) -> f64 {
    rules.quantity_from_steps(steps) * price / leverage
}

/// Largest step-aligned quantity whose margin fits `balance * fraction`.
///
/// Returns the zero plan for non-positive balance or price, zero leverage, a
/// fraction outside (0, 1], unusable rules, or when the minimum notional
/// cannot be met within the budget.
pub fn size_position(
    balance: f64,
    price: f64,
    leverage: u32,
    fraction: f64,
    rules: &SymbolTradingRules,
) -> PositionPlan {
    let inputs_valid = balance.is_finite()
        && balance > 0.0
        && price.is_finite()
        && price > 0.0
        && leverage >= 1
        && fraction.is_finite()
        && fraction > 0.0
        && fraction <= 1.0;
    if !inputs_valid || !rules.is_usable() {
        debug!(balance, price, leverage, fraction, "sizing skipped: invalid inputs");
        return PositionPlan::zero();
    }

    let lev = f64::from(leverage);
    let budget = balance * fraction;
    let max_steps = rules.max_steps();
    let fits = |steps: u64| margin_for(rules, steps, price, lev) <= budget;

    let raw = budget * lev / price;
    let mut steps = rules.steps_floor(raw).min(max_steps);
    // Step back over any float overshoot from the floor tolerance.
    while steps > 0 && !fits(steps) {
        steps -= 1;
    }
    // Climb while another step still fits.
    for _ in 0..max_steps {
        if steps >= max_steps || !fits(steps + 1) {
            break;
        }
        steps += 1;
    }

    let min_steps = rules
        .steps_ceil(rules.min_notional / price)
        .max(rules.steps_ceil(rules.min_qty));
    if steps < min_steps {
        if min_steps <= max_steps && fits(min_steps) {
            steps = min_steps;
        } else {
            warn!(
                symbol = %rules.symbol,
                budget,
                price,
                min_notional = rules.min_notional,
                "budget cannot meet minimum notional; not trading"
            );
            return PositionPlan::zero();
        }
    }

    let quantity = rules.quantity_from_steps(steps);
    let plan = PositionPlan {
        quantity,
        margin_required: quantity * price / lev,
    };
    debug!(
        symbol = %rules.symbol,
        quantity = plan.quantity,
        margin = plan.margin_required,
        budget,
        "position sized"
    );
    plan
}

/// Margin for `quantity` fits within the fixed-fraction allocation.
pub fn check_margin_sufficient(
    balance: f64,
    price: f64,
    quantity: f64,
    leverage: u32,
    fraction: f64,
) -> bool {
    if leverage == 0 {
        return false;
    }
    let required = quantity * price / f64::from(leverage);
    let allowed = balance * fraction;
    if required > allowed {
        warn!(required, allowed, "position exceeds fixed trade allocation");
        return false;
    }
    true
}
