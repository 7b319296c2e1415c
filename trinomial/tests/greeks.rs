//! Finite-difference Greeks on the lattice against Black-Scholes.
//!
//! One-year at-the-money European call, spot 100, rate 5 %, volatility 20 %.

use approx::assert_relative_eq;
use trinomial::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn calculator(steps: Size) -> GreeksCalculator {
    let market = MarketData::new(100.0, 0.05, 0.20).unwrap();
    let option = OptionContract::european(OptionType::Call, 100.0, date(2026, 1, 1));
    GreeksCalculator::new(market, option, date(2025, 1, 1), steps)
}

fn analytic() -> trinomial::pricingengines::BlackScholesResults {
    black_scholes_merton(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.20, 1.0)
}

#[test]
fn test_first_order_greeks_match_black_scholes() {
    let greeks = calculator(800);
    let bs = analytic();

    let delta = greeks.delta(0.01).unwrap();
    assert!((delta - bs.delta).abs() < 3e-2, "delta {delta} vs {}", bs.delta);

    let vega = greeks.vega(0.02).unwrap();
    assert!((vega - bs.vega).abs() / bs.vega < 0.05, "vega {vega} vs {}", bs.vega);

    let gamma = greeks.gamma(0.01).unwrap();
    assert!((gamma - bs.gamma).abs() / bs.gamma < 0.15, "gamma {gamma} vs {}", bs.gamma);
}

#[test]
fn test_rho_and_theta_match_black_scholes() {
    let greeks = calculator(400);
    let bs = analytic();

    let rho = greeks.rho(1e-4).unwrap();
    assert!((rho - bs.rho).abs() / bs.rho < 0.05, "rho {rho} vs {}", bs.rho);

    let theta = greeks.theta(1).unwrap();
    assert!(theta < 0.0);
    assert!(
        (theta - bs.theta_per_day).abs() / bs.theta_per_day.abs() < 0.25,
        "theta {theta} vs {}",
        bs.theta_per_day
    );
}

#[test]
fn test_greeks_report_is_consistent_with_single_greeks() {
    let greeks = calculator(60);
    let all = greeks.all().unwrap();

    assert_relative_eq!(all.price, greeks.price().unwrap(), max_relative = 1e-12);
    assert_relative_eq!(all.delta, greeks.delta(0.01).unwrap(), max_relative = 1e-12);
    assert_relative_eq!(all.gamma, greeks.gamma(0.01).unwrap(), max_relative = 1e-12);
    assert_relative_eq!(all.vega, greeks.vega(0.01).unwrap(), max_relative = 1e-12);
    assert_relative_eq!(all.vomma, greeks.vomma(0.01).unwrap(), max_relative = 1e-12);
    assert_relative_eq!(all.lambda, greeks.lambda(0.01).unwrap(), max_relative = 1e-12);
    assert_eq!(all.dividend_rho, 0.0);
    assert!(all.vanna.is_finite() && all.charm.is_finite());
    assert!(all.speed.is_finite() && all.zomma.is_finite());
}

#[test]
fn test_recursive_and_backward_greeks_agree() {
    let backward = calculator(80);
    let recursive = calculator(80).with_method(PricingMethod::Recursive);
    assert_relative_eq!(
        backward.delta(0.01).unwrap(),
        recursive.delta(0.01).unwrap(),
        max_relative = 1e-9
    );
}

#[test]
fn test_american_put_greeks_with_dividend() {
    let market =
        MarketData::with_dividend(100.0, 0.05, 0.30, 3.0, Some(date(2026, 4, 21))).unwrap();
    let option = OptionContract::american(OptionType::Put, 100.0, date(2026, 9, 1));
    let greeks = GreeksCalculator::new(market, option, date(2025, 9, 1), 150);

    let delta = greeks.delta(0.01).unwrap();
    assert!(delta < 0.0 && delta > -1.0);
    assert!(greeks.gamma(0.01).unwrap() > 0.0);
    assert!(greeks.vega(0.01).unwrap() > 0.0);
    // A larger cash dividend lowers the forward and raises the put.
    assert!(greeks.dividend_rho(1e-2).unwrap() > 0.0);
}
