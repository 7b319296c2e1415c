//! Reference prices for the dividend-paying American call scenario.
//!
//! Spot 100, rate 5 %, volatility 30 %, a 3.0 cash dividend going ex on
//! 2026-04-21, valued on 2025-09-01 for a 2026-09-01 maturity.

use approx::assert_abs_diff_eq;
use trinomial::prelude::*;

const REFERENCE_PRICE: Real = 11.936849;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn market() -> MarketData {
    MarketData::with_dividend(100.0, 0.05, 0.30, 3.0, Some(date(2026, 4, 21))).unwrap()
}

fn american_call() -> OptionContract {
    OptionContract::american(OptionType::Call, 102.0, date(2026, 9, 1))
}

#[test]
fn test_pruned_backward_price_matches_reference() {
    let config = PricingConfig::new(date(2025, 9, 1), 400).with_pruning(1e-7);
    let mut lattice = TrinomialLattice::new(market(), american_call(), config).unwrap();
    let price = lattice.backward_pricing().unwrap();
    assert_abs_diff_eq!(price, REFERENCE_PRICE, epsilon = 3e-2);
}

#[test]
fn test_engine_prices_the_reference_scenario() {
    let config = PricingConfig::new(date(2025, 9, 1), 400).with_pruning(1e-7);
    let engine = TrinomialEngine::new(market(), config);
    let results = engine.calculate(&american_call()).unwrap();
    assert_abs_diff_eq!(results.npv, REFERENCE_PRICE, epsilon = 3e-2);
    assert_eq!(results.result("exercised_at_root"), Some(0.0));
}

#[test]
fn test_recursive_request_above_limit_still_prices() {
    // 400 steps exceed the configured bound, so the engine retries backward.
    let config = PricingConfig::new(date(2025, 9, 1), 400)
        .with_pruning(1e-7)
        .with_max_recursion_steps(200);
    let engine = TrinomialEngine::new(market(), config).with_method(PricingMethod::Recursive);
    let results = engine.calculate(&american_call()).unwrap();
    assert_abs_diff_eq!(results.npv, REFERENCE_PRICE, epsilon = 3e-2);
}

#[test]
fn test_dividend_lowers_the_call_price() {
    let config = PricingConfig::new(date(2025, 9, 1), 200).with_pruning(1e-7);
    let without = MarketData::new(100.0, 0.05, 0.30).unwrap();
    let mut plain = TrinomialLattice::new(without, american_call(), config).unwrap();
    let mut paying = TrinomialLattice::new(market(), american_call(), config).unwrap();
    assert!(paying.backward_pricing().unwrap() < plain.backward_pricing().unwrap());
}

#[test]
fn test_ex_dividend_step_is_reported() {
    let config = PricingConfig::new(date(2025, 9, 1), 365).with_pruning(1e-7);
    let lattice = TrinomialLattice::new(market(), american_call(), config).unwrap();
    assert_eq!(lattice.ex_dividend_date(), Some(date(2026, 4, 21)));
    // One step per day: the ex-date is 232 days after valuation.
    assert!(lattice.is_dividend_step(231));
    assert!(!lattice.is_dividend_step(230));
    assert!(!lattice.is_dividend_step(232));
}

#[test]
fn test_dividend_close_to_node_levels_fails_validation() {
    // Nodes just above the dividend get a forward far below their one-step
    // spread; the general formula then leaves [0, 1] and the build stops.
    let market =
        MarketData::with_dividend(100.0, 0.05, 0.30, 60.0, Some(date(2026, 4, 21))).unwrap();
    let config = PricingConfig::new(date(2025, 9, 1), 200).with_pruning(1e-7);
    for method in [PricingMethod::Backward, PricingMethod::Recursive] {
        let mut lattice = TrinomialLattice::new(market, american_call(), config).unwrap();
        let err = lattice.price(method).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)), "{method}: {err:?}");
    }
}
