//! Finite-difference Greeks on the trinomial lattice.
//!
//! Every sensitivity is a central difference of lattice prices. Each sample
//! is priced on its own lattice built from a bumped copy of the market data
//! or a shifted valuation date; nothing is shared between samples.
//!
//! Spot and volatility bumps are relative (`S·(1 ± h)`), rate and dividend
//! bumps absolute, date bumps in whole days. Lattices are pruned with a
//! floor of [`GREEKS_PROBABILITY_FLOOR`] by default, which keeps the
//! differences free of noise from negligible branches.

use chrono::{Duration, NaiveDate};
use tracing::debug;
use tri_core::{ensure, Error, Price, Real, Result, Size, Volatility};
use tri_instruments::{MarketData, OptionContract};
use tri_methods::{PricingConfig, PricingMethod};

use crate::trinomial_engine::price_on_lattice;

/// Pruning floor used for Greeks unless overridden.
pub const GREEKS_PROBABILITY_FLOOR: Real = 1e-7;
/// Default relative spot bump.
pub const DEFAULT_SPOT_BUMP: Real = 0.01;
/// Default relative volatility bump.
pub const DEFAULT_VOLATILITY_BUMP: Real = 0.01;
/// Default absolute rate bump.
pub const DEFAULT_RATE_BUMP: Real = 1e-4;
/// Default absolute dividend bump.
pub const DEFAULT_DIVIDEND_BUMP: Real = 1e-2;
/// Default date bump in days.
pub const DEFAULT_DAY_BUMP: i64 = 1;

/// Every Greek of one contract.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Greeks {
    /// Lattice price at the base inputs.
    pub price: Real,
    /// ∂V/∂S.
    pub delta: Real,
    /// ∂²V/∂S².
    pub gamma: Real,
    /// ∂V/∂σ.
    pub vega: Real,
    /// ∂V/∂t per day.
    pub theta: Real,
    /// ∂V/∂r.
    pub rho: Real,
    /// ∂²V/∂S∂σ.
    pub vanna: Real,
    /// ∂²V/∂σ².
    pub vomma: Real,
    /// ∂Δ/∂t per day.
    pub charm: Real,
    /// ∂Γ/∂S.
    pub speed: Real,
    /// ∂Γ/∂σ.
    pub zomma: Real,
    /// `S·Δ/V`.
    pub lambda: Real,
    /// ∂V/∂D for the cash dividend amount.
    pub dividend_rho: Real,
}

/// Finite-difference Greeks calculator.
///
/// ```
/// use chrono::NaiveDate;
/// use tri_instruments::{MarketData, OptionContract, OptionType};
/// use tri_pricingengines::GreeksCalculator;
///
/// let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let maturity = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
/// let market = MarketData::new(100.0, 0.01, 0.2).unwrap();
/// let option = OptionContract::european(OptionType::Call, 100.0, maturity);
///
/// let greeks = GreeksCalculator::new(market, option, today, 50);
/// let delta = greeks.delta(0.01).unwrap();
/// assert!(delta > 0.4 && delta < 0.7);
/// ```
#[derive(Debug, Clone)]
pub struct GreeksCalculator {
    market: MarketData,
    option: OptionContract,
    config: PricingConfig,
    method: PricingMethod,
}

impl GreeksCalculator {
    /// Calculator pricing with `steps` steps, pruning at
    /// [`GREEKS_PROBABILITY_FLOOR`] and backward induction.
    pub fn new(
        market: MarketData,
        option: OptionContract,
        valuation_date: NaiveDate,
        steps: Size,
    ) -> Self {
        Self {
            market,
            option,
            config: PricingConfig::new(valuation_date, steps).with_pruning(GREEKS_PROBABILITY_FLOOR),
            method: PricingMethod::Backward,
        }
    }

    /// Replace the lattice configuration (valuation date included).
    pub fn with_config(self, config: PricingConfig) -> Self {
        Self { config, ..self }
    }

    /// Choose the pricing algorithm used for every sample.
    pub fn with_method(self, method: PricingMethod) -> Self {
        Self { method, ..self }
    }

    /// Lattice configuration used for every sample.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    // ── Sampling ─────────────────────────────────────────────────────────────

    fn price_with(&self, market: MarketData, valuation_date: NaiveDate) -> Result<Real> {
        let config = self.config.with_valuation_date(valuation_date);
        price_on_lattice(market, self.option, config, self.method).map(|(_, price)| price)
    }

    fn price_at(&self, market: MarketData) -> Result<Real> {
        self.price_with(market, self.config.valuation_date())
    }

    fn shifted_date(&self, days: i64) -> Result<NaiveDate> {
        let valuation = self.config.valuation_date();
        valuation
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| Error::Date(format!("{valuation} shifted by {days} days is out of range")))
    }

    fn check_relative(h: Real) -> Result<()> {
        ensure!(h > 0.0 && h < 1.0, "relative bump must lie in (0, 1), got {h}");
        Ok(())
    }

    fn check_absolute(h: Real) -> Result<()> {
        ensure!(h.is_finite() && h > 0.0, "bump must be positive, got {h}");
        Ok(())
    }

    fn check_days(days: i64) -> Result<()> {
        ensure!(days > 0, "date bump must be at least one day, got {days}");
        Ok(())
    }

    fn spot_stencil(&self, market: MarketData, h: Real) -> Result<(Real, Real)> {
        let spot = market.spot();
        let up = self.price_at(market.with_spot(spot * (1.0 + h))?)?;
        let down = self.price_at(market.with_spot(spot * (1.0 - h))?)?;
        Ok((up, down))
    }

    fn vol_stencil(&self, market: MarketData, h: Real) -> Result<(Real, Real)> {
        let vol = market.volatility();
        let up = self.price_at(market.with_volatility(vol * (1.0 + h))?)?;
        let down = self.price_at(market.with_volatility(vol * (1.0 - h))?)?;
        Ok((up, down))
    }

    fn delta_with(&self, market: MarketData, valuation_date: NaiveDate, h: Real) -> Result<Real> {
        let spot = market.spot();
        let up = self.price_with(market.with_spot(spot * (1.0 + h))?, valuation_date)?;
        let down = self.price_with(market.with_spot(spot * (1.0 - h))?, valuation_date)?;
        Ok((up - down) / (2.0 * spot * h))
    }

    fn gamma_of(&self, market: MarketData, h: Real) -> Result<Real> {
        let spot = market.spot();
        let base = self.price_at(market)?;
        let (up, down) = self.spot_stencil(market, h)?;
        Ok((up - 2.0 * base + down) / (spot * h).powi(2))
    }

    // ── Greeks ───────────────────────────────────────────────────────────────

    /// Lattice price at the base inputs.
    pub fn price(&self) -> Result<Real> {
        self.price_at(self.market)
    }

    /// Delta with relative spot bump `h`.
    pub fn delta(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let value = self.delta_with(self.market, self.config.valuation_date(), h)?;
        debug!(greek = "delta", value, "computed greek");
        Ok(value)
    }

    /// Gamma with relative spot bump `h`.
    pub fn gamma(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let value = self.gamma_of(self.market, h)?;
        debug!(greek = "gamma", value, "computed greek");
        Ok(value)
    }

    /// Vega with relative volatility bump `h`.
    pub fn vega(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let (up, down) = self.vol_stencil(self.market, h)?;
        let value = (up - down) / (2.0 * self.market.volatility() * h);
        debug!(greek = "vega", value, "computed greek");
        Ok(value)
    }

    /// Theta per day, central in the valuation date with a bump of `days`.
    ///
    /// # Errors
    /// `Error::Date` if a shifted date is out of range, and
    /// `Error::Configuration` if the later date reaches maturity.
    pub fn theta(&self, days: i64) -> Result<Real> {
        Self::check_days(days)?;
        let later = self.price_with(self.market, self.shifted_date(days)?)?;
        let earlier = self.price_with(self.market, self.shifted_date(-days)?)?;
        let value = (later - earlier) / (2.0 * days as Real);
        debug!(greek = "theta", value, "computed greek");
        Ok(value)
    }

    /// Rho with absolute rate bump `h`.
    pub fn rho(&self, h: Real) -> Result<Real> {
        Self::check_absolute(h)?;
        let rate = self.market.rate();
        let up = self.price_at(self.market.with_rate(rate + h)?)?;
        let down = self.price_at(self.market.with_rate(rate - h)?)?;
        let value = (up - down) / (2.0 * h);
        debug!(greek = "rho", value, "computed greek");
        Ok(value)
    }

    /// Vanna from the four-point spot/volatility stencil.
    pub fn vanna(&self, h_spot: Real, h_vol: Real) -> Result<Real> {
        Self::check_relative(h_spot)?;
        Self::check_relative(h_vol)?;
        let spot = self.market.spot();
        let vol = self.market.volatility();
        let sample = |s: Real, v: Volatility| -> Result<Real> {
            self.price_at(self.market.with_spot(s)?.with_volatility(v)?)
        };
        let (s_up, s_down) = (spot * (1.0 + h_spot), spot * (1.0 - h_spot));
        let (v_up, v_down) = (vol * (1.0 + h_vol), vol * (1.0 - h_vol));
        let value = (sample(s_up, v_up)? - sample(s_up, v_down)? - sample(s_down, v_up)?
            + sample(s_down, v_down)?)
            / (4.0 * spot * h_spot * vol * h_vol);
        debug!(greek = "vanna", value, "computed greek");
        Ok(value)
    }

    /// Vomma with relative volatility bump `h`.
    pub fn vomma(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let base = self.price()?;
        let (up, down) = self.vol_stencil(self.market, h)?;
        let value = (up - 2.0 * base + down) / (self.market.volatility() * h).powi(2);
        debug!(greek = "vomma", value, "computed greek");
        Ok(value)
    }

    /// Charm per day: delta difference across valuation dates `±days`.
    pub fn charm(&self, days: i64, h: Real) -> Result<Real> {
        Self::check_days(days)?;
        Self::check_relative(h)?;
        let later = self.delta_with(self.market, self.shifted_date(days)?, h)?;
        let earlier = self.delta_with(self.market, self.shifted_date(-days)?, h)?;
        let value = (later - earlier) / (2.0 * days as Real);
        debug!(greek = "charm", value, "computed greek");
        Ok(value)
    }

    /// Speed: gamma difference across spots `S ± ε`, `ε = max(1e-3, S·h)`.
    pub fn speed(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let spot = self.market.spot();
        let eps = (spot * h).max(1e-3);
        let up = self.gamma_of(self.market.with_spot(spot + eps)?, h)?;
        let down = self.gamma_of(self.market.with_spot(spot - eps)?, h)?;
        let value = (up - down) / (2.0 * eps);
        debug!(greek = "speed", value, "computed greek");
        Ok(value)
    }

    /// Zomma: gamma difference across volatilities `σ ± ε`, `ε = max(1e-4, σ·h)`.
    pub fn zomma(&self, h: Real) -> Result<Real> {
        Self::check_relative(h)?;
        let vol = self.market.volatility();
        let eps = (vol * h).max(1e-4);
        let up = self.gamma_of(self.market.with_volatility(vol + eps)?, h)?;
        let down = self.gamma_of(self.market.with_volatility(vol - eps)?, h)?;
        let value = (up - down) / (2.0 * eps);
        debug!(greek = "zomma", value, "computed greek");
        Ok(value)
    }

    /// Elasticity `S·Δ/V`; zero when the price is exactly zero.
    pub fn lambda(&self, h: Real) -> Result<Real> {
        let price = self.price()?;
        let delta = self.delta(h)?;
        Ok(elasticity(self.market.spot(), delta, price))
    }

    /// Sensitivity to the cash dividend amount.
    ///
    /// The lower sample is floored at a zero dividend and the difference is
    /// divided by the actual distance between the two amounts.
    pub fn dividend_rho(&self, h: Real) -> Result<Real> {
        Self::check_absolute(h)?;
        let dividend = self.market.dividend();
        let (high, low) = (dividend + h, (dividend - h).max(0.0));
        let up = self.price_at(self.market.with_dividend_amount(high)?)?;
        let down = self.price_at(self.market.with_dividend_amount(low)?)?;
        let value = (up - down) / (high - low);
        debug!(greek = "dividend_rho", value, "computed greek");
        Ok(value)
    }

    /// Every Greek with the default bumps, sharing samples where stencils
    /// overlap.
    pub fn all(&self) -> Result<Greeks> {
        let spot = self.market.spot();
        let vol = self.market.volatility();
        let price = self.price()?;

        let h = DEFAULT_SPOT_BUMP;
        let (s_up, s_down) = self.spot_stencil(self.market, h)?;
        let delta = (s_up - s_down) / (2.0 * spot * h);
        let gamma = (s_up - 2.0 * price + s_down) / (spot * h).powi(2);

        let hv = DEFAULT_VOLATILITY_BUMP;
        let (v_up, v_down) = self.vol_stencil(self.market, hv)?;
        let vega = (v_up - v_down) / (2.0 * vol * hv);
        let vomma = (v_up - 2.0 * price + v_down) / (vol * hv).powi(2);

        let greeks = Greeks {
            price,
            delta,
            gamma,
            vega,
            theta: self.theta(DEFAULT_DAY_BUMP)?,
            rho: self.rho(DEFAULT_RATE_BUMP)?,
            vanna: self.vanna(h, hv)?,
            vomma,
            charm: self.charm(DEFAULT_DAY_BUMP, h)?,
            speed: self.speed(h)?,
            zomma: self.zomma(hv)?,
            lambda: elasticity(spot, delta, price),
            dividend_rho: self.dividend_rho(DEFAULT_DIVIDEND_BUMP)?,
        };
        debug!(?greeks, "computed all greeks");
        Ok(greeks)
    }
}

fn elasticity(spot: Price, delta: Real, price: Real) -> Real {
    if price == 0.0 {
        0.0
    } else {
        spot * delta / price
    }
}
