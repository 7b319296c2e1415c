//! Analytic European option engine (Black-Scholes-Merton).
//!
//! Closed-form reference prices and Greeks used to check the lattice. A
//! discrete dividend paid before maturity is handled with the escrowed
//! dividend model: the spot is reduced by the dividend's present value.

use chrono::NaiveDate;
use statrs::function::erf::erfc;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use tri_core::{ensure, fail, Real, Result, Time, DAYS_PER_YEAR};
use tri_instruments::{MarketData, OptionContract, OptionType, PricingEngine, PricingResults};

/// Standard normal cumulative distribution function.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal density.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes-Merton price and sensitivities.
///
/// Derivatives are per unit of the bumped quantity (one unit of spot, of
/// volatility, of rate, one year of time) unless the name says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlackScholesResults {
    /// Option value.
    pub price: Real,
    /// ∂V/∂S.
    pub delta: Real,
    /// ∂²V/∂S².
    pub gamma: Real,
    /// ∂V/∂σ.
    pub vega: Real,
    /// ∂V/∂t per year.
    pub theta: Real,
    /// ∂V/∂t per calendar day.
    pub theta_per_day: Real,
    /// ∂V/∂r.
    pub rho: Real,
    /// ∂²V/∂S∂σ.
    pub vanna: Real,
    /// ∂²V/∂σ².
    pub vomma: Real,
    /// ∂Δ/∂t per year.
    pub charm: Real,
    /// ∂³V/∂S³.
    pub speed: Real,
    /// ∂Γ/∂σ.
    pub zomma: Real,
    /// Elasticity `S·Δ/V` (0 when `V == 0`).
    pub lambda: Real,
}

impl BlackScholesResults {
    fn intrinsic(price: Real) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }
}

/// Compute Black-Scholes-Merton price and Greeks for a European option.
///
/// ```
/// use tri_instruments::OptionType;
/// use tri_pricingengines::black_scholes_merton;
///
/// let r = black_scholes_merton(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.20, 1.0);
/// assert!((r.price - 10.4506).abs() < 1e-4);
/// ```
pub fn black_scholes_merton(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    volatility: Real,
    time_to_expiry: Time,
) -> BlackScholesResults {
    let phi = option_type.sign();
    let t = time_to_expiry;

    if t <= 0.0 {
        return BlackScholesResults::intrinsic((phi * (spot - strike)).max(0.0));
    }

    let r = risk_free_rate;
    let q = dividend_yield;
    let sigma = volatility;
    let sqrt_t = t.sqrt();
    let std_dev = sigma * sqrt_t;
    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();

    if std_dev <= 1e-15 {
        // Deterministic forward: the option is either surely exercised or worthless.
        let forward = spot * ((r - q) * t).exp();
        let itm = if phi * (forward - strike) > 0.0 { 1.0 } else { 0.0 };
        let price = itm * phi * (spot * df_q - strike * df_r);
        let delta = itm * phi * df_q;
        return BlackScholesResults {
            price,
            delta,
            theta: itm * phi * (q * spot * df_q - r * strike * df_r),
            theta_per_day: itm * phi * (q * spot * df_q - r * strike * df_r) / DAYS_PER_YEAR,
            rho: itm * phi * strike * t * df_r,
            charm: itm * phi * q * df_q,
            lambda: if price == 0.0 { 0.0 } else { spot * delta / price },
            ..BlackScholesResults::default()
        };
    }

    let d1 = ((spot / strike).ln() + (r - q + 0.5 * sigma * sigma) * t) / std_dev;
    let d2 = d1 - std_dev;

    let nd1 = normal_cdf(phi * d1);
    let nd2 = normal_cdf(phi * d2);
    let npd1 = normal_pdf(d1);

    let price = phi * (spot * df_q * nd1 - strike * df_r * nd2);
    let delta = phi * df_q * nd1;
    let gamma = df_q * npd1 / (spot * std_dev);
    // Per 1.0 absolute vol, not per 1%.
    let vega = spot * df_q * npd1 * sqrt_t;
    let theta = {
        let decay = -(spot * df_q * npd1 * sigma) / (2.0 * sqrt_t);
        let carry_r = -phi * r * strike * df_r * nd2;
        let carry_q = phi * q * spot * df_q * nd1;
        decay + carry_r + carry_q
    };
    let rho = phi * strike * t * df_r * nd2;
    let vanna = -df_q * npd1 * d2 / sigma;
    let vomma = vega * d1 * d2 / sigma;
    let charm = phi * q * df_q * nd1
        - df_q * npd1 * (2.0 * (r - q) * t - d2 * std_dev) / (2.0 * t * std_dev);
    let speed = -gamma / spot * (d1 / std_dev + 1.0);
    let zomma = gamma * (d1 * d2 - 1.0) / sigma;
    let lambda = if price == 0.0 { 0.0 } else { spot * delta / price };

    BlackScholesResults {
        price,
        delta,
        gamma,
        vega,
        theta,
        theta_per_day: theta / DAYS_PER_YEAR,
        rho,
        vanna,
        vomma,
        charm,
        speed,
        zomma,
        lambda,
    }
}

/// Analytic pricing engine for European options on [`MarketData`].
#[derive(Debug, Clone)]
pub struct AnalyticEuropeanEngine {
    market: MarketData,
    valuation_date: NaiveDate,
}

impl AnalyticEuropeanEngine {
    /// Create an engine for the given market and valuation date.
    pub fn new(market: MarketData, valuation_date: NaiveDate) -> Self {
        Self {
            market,
            valuation_date,
        }
    }

    /// Year fraction from the valuation date to `date` (Actual/365).
    pub fn year_fraction(&self, date: NaiveDate) -> Time {
        date.signed_duration_since(self.valuation_date).num_days() as Real / DAYS_PER_YEAR
    }

    /// Spot net of the present value of a dividend paid before `maturity`.
    pub fn escrowed_spot(&self, maturity: NaiveDate) -> Real {
        let ex_date = self.market.ex_dividend_date();
        if self.market.has_dividend() && ex_date > self.valuation_date && ex_date <= maturity {
            let t_div = self.year_fraction(ex_date);
            self.market.spot() - self.market.dividend() * (-self.market.rate() * t_div).exp()
        } else {
            self.market.spot()
        }
    }

    /// Closed-form results for `option`.
    ///
    /// # Errors
    /// `Error::Runtime` for American contracts; `Error::Configuration` when
    /// the escrowed spot is not positive.
    pub fn results(&self, option: &OptionContract) -> Result<BlackScholesResults> {
        if option.is_american() {
            fail!("the analytic engine prices European contracts only");
        }
        let spot = self.escrowed_spot(option.maturity());
        ensure!(
            spot > 0.0,
            "spot net of dividends must be positive, got {spot}"
        );
        Ok(black_scholes_merton(
            option.option_type(),
            spot,
            option.strike(),
            self.market.rate(),
            0.0,
            self.market.volatility(),
            self.year_fraction(option.maturity()),
        ))
    }
}

impl PricingEngine<OptionContract> for AnalyticEuropeanEngine {
    fn calculate(&self, args: &OptionContract) -> Result<PricingResults> {
        let r = self.results(args)?;
        Ok(PricingResults::from_npv(r.price)
            .with_result("delta", r.delta)
            .with_result("gamma", r.gamma)
            .with_result("vega", r.vega)
            .with_result("theta", r.theta)
            .with_result("theta_per_day", r.theta_per_day)
            .with_result("rho", r.rho)
            .with_result("vanna", r.vanna)
            .with_result("vomma", r.vomma)
            .with_result("charm", r.charm)
            .with_result("speed", r.speed)
            .with_result("zomma", r.zomma)
            .with_result("lambda", r.lambda))
    }
}
