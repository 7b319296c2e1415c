//! Convergence studies and spot profiles.
//!
//! Both helpers price a fresh lattice per sample by backward induction.

use tracing::{debug, info};
use tri_core::{Price, Real, Result, Size};
use tri_instruments::{MarketData, OptionContract};
use tri_methods::{PricingConfig, TrinomialLattice};

use crate::analytic_european_engine::AnalyticEuropeanEngine;

/// One row of a convergence study.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergencePoint {
    /// Lattice step count.
    pub steps: Size,
    /// Lattice price.
    pub price: Real,
    /// Closed-form price, for European contracts.
    pub reference: Option<Real>,
    /// `price - reference`.
    pub error: Option<Real>,
    /// Error as a percentage of the reference; `None` when the reference is zero.
    pub error_pct: Option<Real>,
}

/// Price `option` at each step count in `steps`.
///
/// European contracts are compared against the closed-form price from
/// [`AnalyticEuropeanEngine`]; American contracts carry no reference.
/// Every other setting of `config` is kept.
pub fn convergence_study<I>(
    market: MarketData,
    option: OptionContract,
    config: PricingConfig,
    steps: I,
) -> Result<Vec<ConvergencePoint>>
where
    I: IntoIterator<Item = Size>,
{
    let reference = if option.is_american() {
        None
    } else {
        Some(
            AnalyticEuropeanEngine::new(market, config.valuation_date())
                .results(&option)?
                .price,
        )
    };

    let points = steps
        .into_iter()
        .map(|n| -> Result<ConvergencePoint> {
            let mut lattice = TrinomialLattice::new(market, option, config.with_steps(n))?;
            let price = lattice.backward_pricing()?;
            let error = reference.map(|r| price - r);
            let error_pct = reference
                .zip(error)
                .filter(|(r, _)| *r != 0.0)
                .map(|(r, e)| 100.0 * e / r);
            debug!(steps = n, price, ?error, "convergence sample");
            Ok(ConvergencePoint {
                steps: n,
                price,
                reference,
                error,
                error_pct,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(samples = points.len(), ?reference, "convergence study complete");
    Ok(points)
}

/// Price `option` at each spot in `spots`, all other inputs fixed.
pub fn spot_profile<I>(
    market: MarketData,
    option: OptionContract,
    config: PricingConfig,
    spots: I,
) -> Result<Vec<(Price, Real)>>
where
    I: IntoIterator<Item = Price>,
{
    spots
        .into_iter()
        .map(|spot| -> Result<(Price, Real)> {
            let mut lattice = TrinomialLattice::new(market.with_spot(spot)?, option, config)?;
            Ok((spot, lattice.backward_pricing()?))
        })
        .collect()
}
