//! # tri-instruments
//!
//! Pricing inputs: market data, vanilla option contracts and their payoffs,
//! plus the [`PricingEngine`] interface implemented by the engines in
//! `tri-pricingengines`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod exercise;
pub mod instrument;
pub mod market;
pub mod option;
pub mod payoff;

pub use exercise::ExerciseStyle;
pub use instrument::{PricingEngine, PricingResults};
pub use market::{MarketData, NO_DIVIDEND_DATE};
pub use option::OptionContract;
pub use payoff::{OptionType, PlainVanillaPayoff};
