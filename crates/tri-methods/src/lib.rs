//! # tri-methods
//!
//! The trinomial lattice engine: run configuration, the node arena, lattice
//! construction with a discrete dividend and optional pruning, the two
//! pricing algorithms, and closed-form convergence diagnostics.
//!
//! # Modules
//!
//! * [`config`]: [`PricingConfig`] and [`PricingMethod`]
//! * [`lattice`]: [`TrinomialLattice`], [`LatticeNode`] and the probability solve

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

pub mod config;
pub mod lattice;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use config::{
    PricingConfig, PricingMethod, DEFAULT_MAX_RECURSION_STEPS, DEFAULT_PROBABILITY_FLOOR,
};
pub use lattice::{
    Branching, Column, ConvergenceDiagnostics, Formula, LatticeNode, NodeId, NodeRole,
    Probabilities, ProbabilitySolution, TrinomialLattice,
};
