//! Trinomial lattice engine.
//!
//! Wraps [`TrinomialLattice`] behind the [`PricingEngine`] interface. A
//! recursive request on a lattice deeper than the configured recursion
//! bound is retried with backward induction.

use tracing::warn;
use tri_core::{Real, Result};
use tri_instruments::{MarketData, OptionContract, PricingEngine, PricingResults};
use tri_methods::{PricingConfig, PricingMethod, TrinomialLattice};

/// Price `option` on a fresh lattice, falling back from recursive to
/// backward pricing when the recursion bound is hit.
///
/// Returns the lattice together with the price so callers can inspect it.
pub fn price_on_lattice(
    market: MarketData,
    option: OptionContract,
    config: PricingConfig,
    method: PricingMethod,
) -> Result<(TrinomialLattice, Real)> {
    let mut lattice = TrinomialLattice::new(market, option, config)?;
    let price = match lattice.price(method) {
        Err(e) if e.is_recursion_limit() => {
            warn!(
                steps = config.steps(),
                limit = config.max_recursion_steps(),
                "recursive pricing refused, retrying with backward induction"
            );
            lattice.backward_pricing()?
        }
        other => other?,
    };
    Ok((lattice, price))
}

/// Lattice pricing engine for vanilla options.
///
/// ```
/// use chrono::NaiveDate;
/// use tri_instruments::{MarketData, OptionContract, OptionType, PricingEngine};
/// use tri_methods::{PricingConfig, PricingMethod};
/// use tri_pricingengines::TrinomialEngine;
///
/// let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let maturity = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
/// let engine = TrinomialEngine::new(
///     MarketData::new(100.0, 0.03, 0.25).unwrap(),
///     PricingConfig::new(today, 50),
/// )
/// .with_method(PricingMethod::Recursive);
///
/// let put = OptionContract::american(OptionType::Put, 100.0, maturity);
/// let results = engine.calculate(&put).unwrap();
/// assert!(results.npv > 0.0);
/// assert_eq!(results.result("node_count"), Some(2601.0));
/// ```
#[derive(Debug, Clone)]
pub struct TrinomialEngine {
    market: MarketData,
    config: PricingConfig,
    method: PricingMethod,
}

impl TrinomialEngine {
    /// Engine pricing by backward induction.
    pub fn new(market: MarketData, config: PricingConfig) -> Self {
        Self {
            market,
            config,
            method: PricingMethod::Backward,
        }
    }

    /// Choose the pricing algorithm.
    pub fn with_method(self, method: PricingMethod) -> Self {
        Self { method, ..self }
    }

    /// Market inputs.
    pub fn market(&self) -> &MarketData {
        &self.market
    }

    /// Run parameters.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Pricing algorithm.
    pub fn method(&self) -> PricingMethod {
        self.method
    }
}

impl PricingEngine<OptionContract> for TrinomialEngine {
    fn calculate(&self, args: &OptionContract) -> Result<PricingResults> {
        let (lattice, npv) = price_on_lattice(self.market, *args, self.config, self.method)?;
        let exercised = lattice.root_exercised().unwrap_or(false);
        Ok(PricingResults::from_npv(npv)
            .with_result("delta_t", lattice.delta_t())
            .with_result("discount_factor", lattice.discount_factor())
            .with_result("alpha", lattice.alpha())
            .with_result("node_count", lattice.node_count() as Real)
            .with_result("exercised_at_root", if exercised { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use tri_core::Error;
    use tri_instruments::OptionType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn maturity() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn recursive_request_falls_back_to_backward() {
        let market = MarketData::new(100.0, 0.05, 0.2).unwrap();
        let option = OptionContract::european(OptionType::Call, 100.0, maturity());
        let config = PricingConfig::new(today(), 80).with_max_recursion_steps(10);

        let (_, fallback) =
            price_on_lattice(market, option, config, PricingMethod::Recursive).unwrap();
        let (_, backward) =
            price_on_lattice(market, option, config, PricingMethod::Backward).unwrap();
        assert_eq!(fallback, backward);
    }

    #[test]
    fn engine_reports_lattice_constants() {
        let market = MarketData::new(100.0, 0.05, 0.2).unwrap();
        let engine = TrinomialEngine::new(market, PricingConfig::new(today(), 10));
        let option = OptionContract::european(OptionType::Call, 100.0, maturity());
        let r = engine.calculate(&option).unwrap();

        assert_relative_eq!(r.result("delta_t").unwrap(), 0.1, max_relative = 1e-12);
        assert_relative_eq!(
            r.result("discount_factor").unwrap(),
            (-0.005f64).exp(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            r.result("alpha").unwrap(),
            (0.2 * 0.3f64.sqrt()).exp(),
            max_relative = 1e-12
        );
        assert_eq!(r.result("node_count"), Some(121.0));
        assert_eq!(r.result("exercised_at_root"), Some(0.0));
    }

    #[test]
    fn configuration_errors_propagate() {
        let market = MarketData::new(100.0, 0.05, 0.2).unwrap();
        let config = PricingConfig::new(today(), 10)
            .with_pruning_enabled(true)
            .with_probability_floor(None);
        let engine = TrinomialEngine::new(market, config);
        let option = OptionContract::european(OptionType::Call, 100.0, maturity());
        assert!(matches!(engine.calculate(&option), Err(Error::Configuration(_))));
    }
}
