//! Structural and pricing invariants across contract types and settings.

use approx::assert_relative_eq;
use trinomial::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn valuation() -> NaiveDate {
    date(2025, 9, 1)
}

fn dividend_market() -> MarketData {
    MarketData::with_dividend(100.0, 0.05, 0.30, 3.0, Some(date(2026, 4, 21))).unwrap()
}

fn contracts() -> Vec<OptionContract> {
    let maturity = date(2026, 9, 1);
    vec![
        OptionContract::european(OptionType::Call, 102.0, maturity),
        OptionContract::european(OptionType::Put, 98.0, maturity),
        OptionContract::american(OptionType::Call, 102.0, maturity),
        OptionContract::american(OptionType::Put, 98.0, maturity),
    ]
}

fn price(
    market: MarketData,
    option: OptionContract,
    config: PricingConfig,
    method: PricingMethod,
) -> Real {
    TrinomialLattice::new(market, option, config)
        .unwrap()
        .price(method)
        .unwrap()
}

#[test]
fn test_recursive_and_backward_pricing_agree() {
    let config = PricingConfig::new(valuation(), 150).with_pruning(1e-7);
    for option in contracts() {
        let recursive = price(dividend_market(), option, config, PricingMethod::Recursive);
        let backward = price(dividend_market(), option, config, PricingMethod::Backward);
        assert_relative_eq!(recursive, backward, max_relative = 1e-9);
    }
}

#[test]
fn test_american_is_worth_at_least_european() {
    let config = PricingConfig::new(valuation(), 200).with_pruning(1e-7);
    for option in contracts().into_iter().filter(|o| !o.is_american()) {
        let european = price(dividend_market(), option, config, PricingMethod::Backward);
        let american = price(
            dividend_market(),
            option.with_exercise(ExerciseStyle::American),
            config,
            PricingMethod::Backward,
        );
        assert!(american >= european - 1e-12, "{option:?}: {american} < {european}");
    }
}

#[test]
fn test_prices_are_bounded_by_intrinsic_and_spot() {
    let config = PricingConfig::new(valuation(), 200).with_pruning(1e-7);
    for option in contracts() {
        let value = price(dividend_market(), option, config, PricingMethod::Backward);
        assert!(value >= 0.0);
        if option.is_american() {
            assert!(value >= option.payoff(100.0));
        }
        if option.is_call() {
            assert!(value <= 100.0);
        } else {
            assert!(value <= option.strike());
        }
    }
}

#[test]
fn test_pricing_twice_gives_the_same_price() {
    let config = PricingConfig::new(valuation(), 120).with_pruning(1e-7);
    for option in contracts() {
        let mut lattice = TrinomialLattice::new(dividend_market(), option, config).unwrap();
        let first = lattice.backward_pricing().unwrap();
        let second = lattice.backward_pricing().unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_pruning_barely_moves_the_price() {
    let market = MarketData::new(100.0, 0.05, 0.30).unwrap();
    let full = PricingConfig::new(valuation(), 150);
    let pruned = full.with_pruning(1e-9);
    for option in contracts() {
        let mut dense = TrinomialLattice::new(market, option, full).unwrap();
        let mut sparse = TrinomialLattice::new(market, option, pruned).unwrap();
        let dense_price = dense.backward_pricing().unwrap();
        let sparse_price = sparse.backward_pricing().unwrap();
        assert!(sparse.node_count() < dense.node_count());
        assert!((dense_price - sparse_price).abs() < 1e-5, "{dense_price} vs {sparse_price}");
    }
}

#[test]
fn test_every_node_carries_valid_probabilities() {
    let config = PricingConfig::new(valuation(), 80).with_pruning(1e-7);
    let option = OptionContract::american(OptionType::Put, 98.0, date(2026, 9, 1));
    let mut lattice = TrinomialLattice::new(dividend_market(), option, config).unwrap();
    lattice.build().unwrap();

    let mut trunk = lattice.terminal_trunk();
    let mut columns = 0;
    while let Some(id) = trunk {
        for (n, node) in lattice.column(id).filter(|(_, node)| !node.is_terminal()) {
            let p = node.probabilities();
            assert!(p.validate().is_ok(), "node {n}: {p:?}");
        }
        trunk = lattice.node(id).previous_trunk();
        columns += 1;
    }
    assert_eq!(columns, 81);
}

#[test]
fn test_parse_contract_enums() {
    assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
    assert_eq!("american".parse::<ExerciseStyle>().unwrap(), ExerciseStyle::American);
    assert!(matches!("straddle".parse::<OptionType>(), Err(Error::Configuration(_))));
    assert!(matches!("recursive".parse::<PricingMethod>(), Ok(PricingMethod::Recursive)));
}
