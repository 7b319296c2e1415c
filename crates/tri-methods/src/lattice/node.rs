//! Lattice nodes and the one-step probability solve.
//!
//! A [`LatticeNode`] is one `(underlying, step)` state. Nodes live in the
//! arena owned by [`TrinomialLattice`](super::TrinomialLattice) and refer to
//! each other through [`NodeId`] handles: three forward links into the next
//! column and two same-column links used to walk the recombining grid.
//!
//! The transition probabilities of a node come from [`Branching::solve`],
//! which picks one of two closed forms:
//!
//! * **simplified**: variance matching only, used when no dividend falls in
//!   the step or when the forward sits on the middle successor;
//! * **general**: the full sum / mean / variance system, used when a dividend
//!   shifts the forward away from the middle successor.

use tri_core::{
    ensure_post, Price, Probability, Real, Result, FORWARD_MATCH_TOLERANCE,
    PROBABILITY_TOLERANCE,
};

use super::NodeId;

// ─── Node ─────────────────────────────────────────────────────────────────────

/// Position of a node in the lattice skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Ordinary node reached through same-column links.
    Branch,
    /// Middle node of a column; keeps a link to the previous column's trunk.
    Trunk {
        /// Trunk of the previous column (`None` for the root).
        previous: Option<NodeId>,
    },
}

/// Transition probabilities towards the up, middle and down successors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Probabilities {
    /// Probability of the up move.
    pub up: Probability,
    /// Probability of the middle move.
    pub mid: Probability,
    /// Probability of the down move.
    pub down: Probability,
}

impl Probabilities {
    /// All mass on the middle successor.
    pub const MIDDLE_ONLY: Self = Self {
        up: 0.0,
        mid: 1.0,
        down: 0.0,
    };

    /// Sum of the three entries.
    pub fn sum(&self) -> Real {
        self.up + self.mid + self.down
    }

    /// Check that the triple is a probability distribution.
    ///
    /// # Errors
    /// `Error::Consistency` when the entries do not sum to one or one of them
    /// leaves `[0, 1]` by more than [`PROBABILITY_TOLERANCE`].
    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        ensure_post!(
            (sum - 1.0).abs() <= PROBABILITY_TOLERANCE,
            "probabilities sum to {sum:.12} (up={:.6e}, mid={:.6e}, down={:.6e})",
            self.up,
            self.mid,
            self.down
        );
        for (name, p) in [("up", self.up), ("mid", self.mid), ("down", self.down)] {
            ensure_post!(
                (-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(&p),
                "probability {name}={p:.12} outside [0, 1]"
            );
        }
        Ok(())
    }
}

/// One state of the trinomial lattice.
#[derive(Debug, Clone)]
pub struct LatticeNode {
    pub(crate) underlying: Price,
    pub(crate) step: u32,
    pub(crate) role: NodeRole,
    pub(crate) probabilities: Probabilities,
    pub(crate) reach: Probability,
    pub(crate) value: Option<Real>,
    pub(crate) exercised: bool,
    pub(crate) next_up: Option<NodeId>,
    pub(crate) next_mid: Option<NodeId>,
    pub(crate) next_down: Option<NodeId>,
    pub(crate) up: Option<NodeId>,
    pub(crate) down: Option<NodeId>,
}

impl LatticeNode {
    pub(crate) fn new(underlying: Price, step: u32, role: NodeRole) -> Self {
        Self {
            underlying,
            step,
            role,
            probabilities: Probabilities::default(),
            reach: 0.0,
            value: None,
            exercised: false,
            next_up: None,
            next_mid: None,
            next_down: None,
            up: None,
            down: None,
        }
    }

    /// Underlying price at this node.
    pub fn underlying(&self) -> Price {
        self.underlying
    }

    /// Column index (0 for the root).
    pub fn step(&self) -> usize {
        self.step as usize
    }

    /// Trunk or branch.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// `true` for column trunks.
    pub fn is_trunk(&self) -> bool {
        matches!(self.role, NodeRole::Trunk { .. })
    }

    /// Trunk of the previous column, for trunk nodes.
    pub fn previous_trunk(&self) -> Option<NodeId> {
        match self.role {
            NodeRole::Trunk { previous } => previous,
            NodeRole::Branch => None,
        }
    }

    /// Transition probabilities (zero until the node's triplet is built).
    pub fn probabilities(&self) -> Probabilities {
        self.probabilities
    }

    /// Probability of reaching this node from the root.
    pub fn reach(&self) -> Probability {
        self.reach
    }

    /// Cached option value, once priced.
    pub fn value(&self) -> Option<Real> {
        self.value
    }

    /// `true` when immediate exercise beat continuation at this node.
    pub fn is_exercised(&self) -> bool {
        self.exercised
    }

    /// `true` when the node has no successors.
    pub fn is_terminal(&self) -> bool {
        self.next_mid.is_none()
    }

    /// Up successor in the next column.
    pub fn next_up(&self) -> Option<NodeId> {
        self.next_up
    }

    /// Middle successor in the next column.
    pub fn next_mid(&self) -> Option<NodeId> {
        self.next_mid
    }

    /// Down successor in the next column.
    pub fn next_down(&self) -> Option<NodeId> {
        self.next_down
    }

    /// Neighbour one level up in the same column.
    pub fn up(&self) -> Option<NodeId> {
        self.up
    }

    /// Neighbour one level down in the same column.
    pub fn down(&self) -> Option<NodeId> {
        self.down
    }
}

// ─── Probability solve ────────────────────────────────────────────────────────

/// Closed form used to solve a node's probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// Variance matching around a forward that sits on the middle node.
    Simplified,
    /// Sum, mean and variance matching around an off-grid forward.
    General,
}

impl Formula {
    /// Pick the formula for a step.
    pub fn select(dividend_step: bool, forward: Price, middle: Price) -> Self {
        if !dividend_step || (forward - middle).abs() < FORWARD_MATCH_TOLERANCE {
            Formula::Simplified
        } else {
            Formula::General
        }
    }
}

/// Outcome of a probability solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbabilitySolution {
    /// The closed form was well defined.
    Computed(Probabilities),
    /// The closed form was not defined for these inputs; the node falls
    /// back to [`Probabilities::MIDDLE_ONLY`].
    Degenerate {
        /// Domain check that failed.
        reason: &'static str,
    },
}

impl ProbabilitySolution {
    /// The probabilities to apply to the node.
    pub fn probabilities(&self) -> Probabilities {
        match self {
            ProbabilitySolution::Computed(p) => *p,
            ProbabilitySolution::Degenerate { .. } => Probabilities::MIDDLE_ONLY,
        }
    }

    /// `true` for the fallback branch.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, ProbabilitySolution::Degenerate { .. })
    }
}

/// Moment targets of one step, as seen from a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branching {
    /// One-step forward, net of a dividend paid in the step.
    pub forward: Price,
    /// One-step variance of the underlying.
    pub variance: Real,
    /// `exp(σ²Δt) − 1`.
    pub variance_factor: Real,
    /// Underlying price of the middle successor.
    pub middle: Price,
    /// Lattice multiplier between neighbouring levels.
    pub alpha: Real,
    /// Whether a dividend falls inside the step.
    pub dividend_step: bool,
}

impl Branching {
    /// Formula selected for these inputs.
    pub fn formula(&self) -> Formula {
        Formula::select(self.dividend_step, self.forward, self.middle)
    }

    /// Solve for the transition probabilities.
    ///
    /// Domain checks run before any arithmetic; a failed check yields
    /// [`ProbabilitySolution::Degenerate`]. The returned probabilities are
    /// not validated; see [`Probabilities::validate`].
    pub fn solve(&self) -> ProbabilitySolution {
        let alpha = self.alpha;
        if !alpha.is_finite() || alpha <= 1.0 {
            return ProbabilitySolution::Degenerate {
                reason: "lattice multiplier is not above one",
            };
        }
        if !(self.forward > 0.0) {
            return ProbabilitySolution::Degenerate {
                reason: "forward is not positive",
            };
        }
        let denominator = (1.0 - alpha) * (alpha.powi(-2) - 1.0);
        if denominator == 0.0 || !denominator.is_finite() {
            return ProbabilitySolution::Degenerate {
                reason: "formula denominator vanishes",
            };
        }

        let (up, down) = match self.formula() {
            Formula::Simplified => {
                let down = self.variance_factor / denominator;
                (down / alpha, down)
            }
            Formula::General => {
                let m = self.middle;
                if !(m > 0.0) {
                    return ProbabilitySolution::Degenerate {
                        reason: "middle successor price is not positive",
                    };
                }
                let f = self.forward;
                let variance_term = (self.variance + (f + m) * (f - m)) / (m * m);
                let expected_term = (f - m) / m;
                let down = (variance_term - (alpha + 1.0) * expected_term) / denominator;
                let up = (expected_term - (alpha.recip() - 1.0) * down) / (alpha - 1.0);
                (up, down)
            }
        };
        let mid = 1.0 - up - down;
        if !(up.is_finite() && mid.is_finite() && down.is_finite()) {
            return ProbabilitySolution::Degenerate {
                reason: "probabilities are not finite",
            };
        }
        ProbabilitySolution::Computed(Probabilities { up, mid, down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use tri_core::Error;

    fn step_inputs(spot: Real, rate: Real, vol: Real, dt: Real) -> Branching {
        let forward = spot * (rate * dt).exp();
        let variance_factor = (vol * vol * dt).exp_m1();
        Branching {
            forward,
            variance: spot * spot * (2.0 * rate * dt).exp() * variance_factor,
            variance_factor,
            middle: forward,
            alpha: (vol * (3.0 * dt).sqrt()).exp(),
            dividend_step: false,
        }
    }

    #[test]
    fn simplified_formula_closed_form() {
        let b = step_inputs(100.0, 0.02, 0.25, 1.0 / 10.0);
        assert_eq!(b.formula(), Formula::Simplified);
        let p = b.solve().probabilities();
        let a = b.alpha;
        let expected_down = b.variance_factor / ((1.0 - a) * (a.powi(-2) - 1.0));
        assert_abs_diff_eq!(p.down, expected_down, epsilon = 1e-15);
        assert_abs_diff_eq!(p.up, expected_down / a, epsilon = 1e-15);
        assert_abs_diff_eq!(p.sum(), 1.0, epsilon = 1e-12);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn general_formula_matches_moments() {
        // Dividend of 2 inside the step: the forward drops below the middle node.
        let mut b = step_inputs(100.0, 0.02, 0.30, 121.0 / 365.0);
        let a = b.alpha;
        b.dividend_step = true;
        b.forward -= 2.0;
        assert_eq!(b.formula(), Formula::General);

        let p = b.solve().probabilities();
        assert!(p.validate().is_ok());
        let m = b.middle;
        let mean = p.up * m * a + p.mid * m + p.down * m / a;
        assert_abs_diff_eq!(mean, b.forward, epsilon = 1e-9);
        let second = p.up * (m * a).powi(2) + p.mid * m * m + p.down * (m / a).powi(2);
        assert_abs_diff_eq!(second - b.forward.powi(2), b.variance, epsilon = 1e-7);
    }

    #[test]
    fn forward_on_middle_uses_simplified_formula() {
        let mut b = step_inputs(100.0, 0.02, 0.30, 0.1);
        b.dividend_step = true;
        assert_eq!(b.formula(), Formula::Simplified);
        b.forward += 1e-6;
        assert_eq!(b.formula(), Formula::General);
    }

    #[test]
    fn zero_volatility_is_degenerate() {
        let b = step_inputs(100.0, 0.02, 0.0, 0.1);
        let solution = b.solve();
        assert!(solution.is_degenerate());
        assert_eq!(solution.probabilities(), Probabilities::MIDDLE_ONLY);
    }

    #[test]
    fn non_positive_forward_is_degenerate() {
        let mut b = step_inputs(1.0, 0.02, 0.3, 0.1);
        b.dividend_step = true;
        b.forward = -0.5;
        assert!(b.solve().is_degenerate());
        b.forward = 0.5;
        b.middle = 0.0;
        assert!(b.solve().is_degenerate());
    }

    #[test]
    fn validation_rejects_bad_triples() {
        let bad_sum = Probabilities {
            up: 0.3,
            mid: 0.3,
            down: 0.3,
        };
        assert!(matches!(bad_sum.validate(), Err(Error::Consistency(_))));
        let negative = Probabilities {
            up: -0.1,
            mid: 0.6,
            down: 0.5,
        };
        assert!(matches!(negative.validate(), Err(Error::Consistency(_))));
        assert!(Probabilities::MIDDLE_ONLY.validate().is_ok());
    }

    proptest! {
        #[test]
        fn simplified_probabilities_are_a_distribution(
            spot in 1.0f64..1000.0,
            rate in -0.05f64..0.15,
            vol in 0.01f64..1.0,
            days in 1u32..1500,
            steps in 10u32..1000,
        ) {
            let dt = days as f64 / (steps as f64 * 365.0);
            let solution = step_inputs(spot, rate, vol, dt).solve();
            prop_assert!(!solution.is_degenerate());
            let p = solution.probabilities();
            prop_assert!(p.validate().is_ok(), "{p:?}");
        }

        #[test]
        fn off_grid_forward_within_half_band_is_a_distribution(
            vol in 0.05f64..0.5,
            steps in 100u32..500,
            shift in -0.45f64..0.45,
        ) {
            let dt = 1.0 / steps as f64;
            let mut b = step_inputs(100.0, 0.03, vol, dt);
            // Forward anywhere in the band closest to the middle node.
            b.dividend_step = true;
            b.forward = b.middle * (shift * (b.alpha - 1.0)).exp();
            let p = b.solve().probabilities();
            prop_assert!(p.validate().is_ok(), "{p:?}");
        }
    }
}
