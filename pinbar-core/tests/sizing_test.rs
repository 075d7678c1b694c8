//! Integration tests for fixed-fraction position sizing.
//!
//! Tests:
//! 1. Reference scenarios: budget-bound quantity on the step grid.
//! 2. Constraint handling: min notional, max quantity, invalid inputs → zero plan.
//! 3. Sizer trait and margin check agree with `size_position`.

use pinbar_core::config::RiskConfig;
use pinbar_core::domain::SymbolTradingRules;
use pinbar_core::size_position;
use pinbar_core::sizers::{check_margin_sufficient, FixedFractionSizer, PositionPlan, Sizer};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn rules(step_size: f64, quantity_precision: u32, min_notional: f64) -> SymbolTradingRules {
    SymbolTradingRules {
        symbol: "TESTUSDT".into(),
        price_precision: 2,
        quantity_precision,
        min_qty: step_size,
        max_qty: 1_000_000.0,
        step_size,
        min_notional,
    }
}

// ──────────────────────────────────────────────
// 1. Reference scenarios
// ──────────────────────────────────────────────

#[test]
fn default_fraction_and_leverage() {
    let plan = size_position(50.0, 100.0, 25, 0.40, &rules(0.001, 3, 5.0));
    assert_eq!(plan.quantity, 5.0);
    assert!((plan.margin_required - 20.0).abs() < 1e-9);
}

#[test]
fn quantity_is_floored_to_the_step() {
    // raw quantity 2.142857… floors to 2.142
    let plan = size_position(10.0, 7.0, 3, 0.5, &rules(0.001, 3, 1.0));
    assert_eq!(plan.quantity, 2.142);
    assert!(plan.margin_required <= 5.0);
}

#[test]
fn whole_unit_steps() {
    let plan = size_position(100.0, 30.0, 10, 0.4, &rules(1.0, 0, 5.0));
    assert_eq!(plan.quantity, 13.0);
    assert_eq!(plan.margin_required, 39.0);
}

// ──────────────────────────────────────────────
// 2. Constraint handling
// ──────────────────────────────────────────────

#[test]
fn unreachable_min_notional_gives_zero_plan() {
    let plan = size_position(0.25, 100.0, 1, 0.4, &rules(0.001, 3, 5.0));
    assert_eq!(plan, PositionPlan::zero());
    assert!(!plan.is_tradeable());
}

#[test]
fn max_quantity_caps_the_plan() {
    let mut capped = rules(0.001, 3, 5.0);
    capped.max_qty = 2.0;
    let plan = size_position(1000.0, 100.0, 25, 0.4, &capped);
    assert_eq!(plan.quantity, 2.0);
    assert!((plan.margin_required - 8.0).abs() < 1e-9);
}

#[test]
fn invalid_inputs_give_zero_plan() {
    let r = rules(0.001, 3, 5.0);
    for plan in [
        size_position(0.0, 100.0, 25, 0.4, &r),
        size_position(-10.0, 100.0, 25, 0.4, &r),
        size_position(50.0, 0.0, 25, 0.4, &r),
        size_position(50.0, f64::NAN, 25, 0.4, &r),
        size_position(50.0, 100.0, 0, 0.4, &r),
        size_position(50.0, 100.0, 25, 0.0, &r),
        size_position(50.0, 100.0, 25, 1.5, &r),
    ] {
        assert_eq!(plan, PositionPlan::zero());
    }
}

#[test]
fn unusable_rules_give_zero_plan() {
    let plan = size_position(50.0, 100.0, 25, 0.4, &rules(0.0, 3, 5.0));
    assert_eq!(plan, PositionPlan::zero());
}

// ──────────────────────────────────────────────
// 3. Sizer trait and margin check
// ──────────────────────────────────────────────

#[test]
fn sizer_from_config_matches_free_function() {
    let r = rules(0.001, 3, 5.0);
    let sizer = FixedFractionSizer::from_config(&RiskConfig::default());
    assert_eq!(sizer.size(50.0, 100.0, &r), size_position(50.0, 100.0, 25, 0.4, &r));
    assert_eq!(sizer.name(), "fixed_fraction");
}

#[test]
fn sized_quantity_passes_margin_check() {
    let r = rules(0.001, 3, 5.0);
    for (balance, price) in [(50.0, 100.0), (1234.5, 27_000.0), (75.0, 0.35), (10.0, 7.0)] {
        let plan = size_position(balance, price, 20, 0.4, &r);
        if plan.is_tradeable() {
            assert!(check_margin_sufficient(balance, price, plan.quantity, 20, 0.4));
        }
    }
    assert!(!check_margin_sufficient(50.0, 100.0, 5.1, 25, 0.4));
}
