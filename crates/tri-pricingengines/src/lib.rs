//! # tri-pricingengines
//!
//! Pricing engines and the analyses built on them.
//!
//! ## Engines
//!
//! - [`TrinomialEngine`]: recombining trinomial lattice, European or American exercise
//! - [`AnalyticEuropeanEngine`]: Black-Scholes-Merton with an escrowed cash dividend
//!
//! ## Analyses
//!
//! - [`GreeksCalculator`]: central finite-difference Greeks on the lattice
//! - [`convergence_study`]: lattice prices against the closed form by step count
//! - [`spot_profile`]: lattice prices across a range of spots

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod convergence;
pub mod numerical_greeks;
pub mod trinomial_engine;

pub use analytic_european_engine::{
    black_scholes_merton, normal_cdf, normal_pdf, AnalyticEuropeanEngine, BlackScholesResults,
};
pub use convergence::{convergence_study, spot_profile, ConvergencePoint};
pub use numerical_greeks::{Greeks, GreeksCalculator};
pub use trinomial_engine::{price_on_lattice, TrinomialEngine};
