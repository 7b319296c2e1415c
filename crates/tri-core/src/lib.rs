//! # tri-core
//!
//! Core types and error definitions for trinomial-rs.
//!
//! This crate provides the building blocks shared by every other crate in
//! the workspace: primitive type aliases, numerical tolerances, and the
//! error hierarchy with its `ensure!` / `ensure_post!` / `fail!` macros.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `ensure_post!` / `fail!` macros.
pub mod errors;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A continuously compounded rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

/// A probability in [0, 1].
pub type Probability = Real;

// ── Tolerances ────────────────────────────────────────────────────────────────

/// Tolerance on transition probabilities: the triple must sum to one and each
/// entry must lie in `[0, 1]` within this bound.
pub const PROBABILITY_TOLERANCE: Real = 1e-10;

/// Distance below which a forward price is treated as sitting on the middle
/// successor.
pub const FORWARD_MATCH_TOLERANCE: Real = 1e-12;

/// Number of calendar days in the year-fraction convention (Actual/365).
pub const DAYS_PER_YEAR: Real = 365.0;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
