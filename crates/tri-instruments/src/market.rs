//! Market inputs for the lattice.
//!
//! [`MarketData`] holds spot, a flat continuously compounded rate, a flat
//! volatility, and a single discrete cash dividend paid on an ex-dividend
//! date. Instances are immutable: every perturbation (a Greek bump, a spot
//! scan) builds a new one through the `with_*` methods, which re-run the
//! validation.

use chrono::NaiveDate;
use tri_core::{ensure, Price, Rate, Real, Result, Volatility};

/// Ex-dividend date used when no dividend can fall inside any pricing horizon.
pub const NO_DIVIDEND_DATE: NaiveDate = NaiveDate::MAX;

/// Normalised market data used by the pricer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketData {
    spot: Price,
    rate: Rate,
    volatility: Volatility,
    dividend: Real,
    ex_dividend_date: NaiveDate,
}

impl MarketData {
    /// Market without dividends.
    ///
    /// # Errors
    /// `Error::Configuration` if `spot` or `volatility` is negative.
    pub fn new(spot: Price, rate: Rate, volatility: Volatility) -> Result<Self> {
        Self::with_dividend(spot, rate, volatility, 0.0, None)
    }

    /// Market with a discrete cash dividend.
    ///
    /// A zero amount or a missing ex-date is normalised to
    /// [`NO_DIVIDEND_DATE`], so the lattice never sees a dividend step.
    ///
    /// # Errors
    /// `Error::Configuration` if `spot` or `volatility` is negative or any
    /// input is not finite.
    pub fn with_dividend(
        spot: Price,
        rate: Rate,
        volatility: Volatility,
        dividend: Real,
        ex_dividend_date: Option<NaiveDate>,
    ) -> Result<Self> {
        ensure!(
            spot.is_finite() && spot >= 0.0,
            "spot must be non-negative, got {spot}"
        );
        ensure!(
            volatility.is_finite() && volatility >= 0.0,
            "volatility must be non-negative, got {volatility}"
        );
        ensure!(rate.is_finite(), "rate must be finite, got {rate}");
        ensure!(
            dividend.is_finite(),
            "dividend amount must be finite, got {dividend}"
        );
        let ex_dividend_date = match ex_dividend_date {
            Some(date) if dividend != 0.0 => date,
            _ => NO_DIVIDEND_DATE,
        };
        Ok(Self {
            spot,
            rate,
            volatility,
            dividend,
            ex_dividend_date,
        })
    }

    /// Spot price of the underlying.
    pub fn spot(&self) -> Price {
        self.spot
    }

    /// Continuously compounded risk-free rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Annual volatility.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }

    /// Cash dividend amount (0 when none).
    pub fn dividend(&self) -> Real {
        self.dividend
    }

    /// Normalised ex-dividend date.
    pub fn ex_dividend_date(&self) -> NaiveDate {
        self.ex_dividend_date
    }

    /// `true` when a dividend with a real ex-date is attached.
    pub fn has_dividend(&self) -> bool {
        self.ex_dividend_date != NO_DIVIDEND_DATE
    }

    fn dividend_date(&self) -> Option<NaiveDate> {
        self.has_dividend().then_some(self.ex_dividend_date)
    }

    /// Copy with a different spot.
    pub fn with_spot(&self, spot: Price) -> Result<Self> {
        Self::with_dividend(
            spot,
            self.rate,
            self.volatility,
            self.dividend,
            self.dividend_date(),
        )
    }

    /// Copy with a different rate.
    pub fn with_rate(&self, rate: Rate) -> Result<Self> {
        Self::with_dividend(
            self.spot,
            rate,
            self.volatility,
            self.dividend,
            self.dividend_date(),
        )
    }

    /// Copy with a different volatility.
    pub fn with_volatility(&self, volatility: Volatility) -> Result<Self> {
        Self::with_dividend(
            self.spot,
            self.rate,
            volatility,
            self.dividend,
            self.dividend_date(),
        )
    }

    /// Copy with a different dividend amount on the same ex-date.
    pub fn with_dividend_amount(&self, dividend: Real) -> Result<Self> {
        Self::with_dividend(
            self.spot,
            self.rate,
            self.volatility,
            dividend,
            self.dividend_date(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tri_core::Error;

    fn ex_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 21).unwrap()
    }

    #[test]
    fn rejects_negative_spot_and_volatility() {
        assert!(matches!(
            MarketData::new(-1.0, 0.01, 0.2),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            MarketData::new(100.0, 0.01, -0.1),
            Err(Error::Configuration(_))
        ));
        assert!(MarketData::new(0.0, -0.01, 0.0).is_ok());
    }

    #[test]
    fn zero_dividend_normalises_ex_date() {
        let m = MarketData::with_dividend(100.0, 0.05, 0.3, 0.0, Some(ex_date())).unwrap();
        assert_eq!(m.ex_dividend_date(), NO_DIVIDEND_DATE);
        assert!(!m.has_dividend());
    }

    #[test]
    fn missing_ex_date_normalises() {
        let m = MarketData::with_dividend(100.0, 0.05, 0.3, 3.0, None).unwrap();
        assert_eq!(m.ex_dividend_date(), NO_DIVIDEND_DATE);
        assert_eq!(m.dividend(), 3.0);
    }

    #[test]
    fn bumps_keep_dividend_schedule() {
        let m = MarketData::with_dividend(100.0, 0.05, 0.3, 3.0, Some(ex_date())).unwrap();
        let up = m.with_spot(101.0).unwrap();
        assert_eq!(up.spot(), 101.0);
        assert_eq!(up.ex_dividend_date(), ex_date());
        assert_eq!(m.spot(), 100.0);

        let v = m.with_volatility(0.31).unwrap();
        assert_eq!(v.volatility(), 0.31);
        assert_eq!(v.dividend(), 3.0);

        let d = m.with_dividend_amount(3.5).unwrap();
        assert_eq!(d.dividend(), 3.5);
        assert_eq!(d.ex_dividend_date(), ex_date());

        assert!(m.with_volatility(-0.01).is_err());
    }
}
