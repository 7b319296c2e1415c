//! # trinomial
//!
//! Recombining trinomial lattice option pricer with a discrete cash
//! dividend, European and American exercise, and finite-difference Greeks.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `tri-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use trinomial::prelude::*;
//!
//! let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
//! let maturity = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
//! let ex_dividend = NaiveDate::from_ymd_opt(2026, 4, 21).unwrap();
//!
//! let market = MarketData::with_dividend(100.0, 0.05, 0.30, 3.0, Some(ex_dividend))?;
//! let option = OptionContract::american(OptionType::Call, 102.0, maturity);
//! let config = PricingConfig::new(today, 100).with_pruning(1e-7);
//!
//! let mut lattice = TrinomialLattice::new(market, option, config)?;
//! let price = lattice.backward_pricing()?;
//! assert!(price > 10.0 && price < 14.0);
//! # Ok::<(), trinomial::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use tri_core as core;

/// Market data, option contracts, payoffs and the engine interface.
pub use tri_instruments as instruments;

/// Pricing configuration and the trinomial lattice.
pub use tri_methods as methods;

/// Pricing engines, Greeks and convergence studies.
pub use tri_pricingengines as pricingengines;

/// The types needed to price a contract, in one import.
pub mod prelude {
    pub use chrono::NaiveDate;
    pub use tri_core::{Error, Price, Rate, Real, Result, Size, Volatility};
    pub use tri_instruments::{
        ExerciseStyle, MarketData, OptionContract, OptionType, PricingEngine, PricingResults,
    };
    pub use tri_methods::{ConvergenceDiagnostics, PricingConfig, PricingMethod, TrinomialLattice};
    pub use tri_pricingengines::{
        black_scholes_merton, convergence_study, spot_profile, AnalyticEuropeanEngine, Greeks,
        GreeksCalculator, TrinomialEngine,
    };
}
