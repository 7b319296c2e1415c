//! Closed-form convergence diagnostics.
//!
//! Under a normal approximation of the lattice's terminal distribution, the
//! pricing error of a trinomial lattice is bounded by a gap that shrinks
//! with `Δt`. Inverting the bound gives the number of steps needed to reach
//! a target gap. None of this is used by pricing.

use std::f64::consts::PI;

use tri_core::{ensure, Real, Result, Size};

use super::tree::TrinomialLattice;

/// Spread and discretisation gap of a lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceDiagnostics {
    /// Standard deviation of the underlying at maturity.
    pub std_dev: Real,
    /// Theoretical discretisation gap at the configured step count.
    pub gap: Real,
    /// Steps needed to reach the requested gap, when one was requested.
    pub estimated_steps: Option<Size>,
}

impl TrinomialLattice {
    /// Compute the terminal spread, the gap, and optionally the step count
    /// that would bring the gap down to `target_gap`.
    ///
    /// # Errors
    /// `Error::Configuration` when the total variance `σ²T` is zero or when
    /// `target_gap` is not positive.
    pub fn convergence_diagnostics(&self, target_gap: Option<Real>) -> Result<ConvergenceDiagnostics> {
        let spot = self.market.spot();
        let rate = self.market.rate();
        let vol = self.market.volatility();
        let dt = self.delta_t;
        let horizon = dt * self.config.steps() as Real;

        let total_variance = vol * vol * horizon;
        ensure!(
            total_variance > 0.0,
            "convergence diagnostics need a positive total variance, got {total_variance}"
        );
        let spread = total_variance.exp_m1().sqrt();
        let std_dev = spot * (rate * horizon).exp() * spread;
        let scale = 8.0 * (2.0 * PI).sqrt();
        let gap = (3.0 * spot / scale) * (vol * vol * dt).exp_m1() * (2.0 * rate * dt).exp() / spread;

        let estimated_steps = match target_gap {
            None => None,
            Some(target) => {
                ensure!(
                    target.is_finite() && target > 0.0,
                    "target gap must be positive, got {target}"
                );
                let denominator = (scale * target * spread / (3.0 * spot)).ln_1p();
                Some((total_variance / denominator).round().max(1.0) as Size)
            }
        };

        Ok(ConvergenceDiagnostics {
            std_dev,
            gap,
            estimated_steps,
        })
    }
}
