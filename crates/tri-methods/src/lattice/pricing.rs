//! Pricing on a built lattice.
//!
//! Both algorithms evaluate the same memoized node graph. The recursive path
//! descends from the root and needs one stack frame per step, so it refuses
//! lattices deeper than [`PricingConfig::max_recursion_steps`]. Backward
//! induction visits columns from maturity to the valuation date; every
//! successor is already valued when its parents are reached.
//!
//! [`PricingConfig::max_recursion_steps`]: crate::PricingConfig::max_recursion_steps

use tri_core::{Error, Real, Result};

use super::node::NodeRole;
use super::tree::TrinomialLattice;
use super::NodeId;
use crate::config::PricingMethod;

impl TrinomialLattice {
    /// Value of `id`, computing and caching it on first access.
    ///
    /// Terminal nodes pay the contract's intrinsic value. Interior nodes
    /// discount the probability-weighted successor values; a missing up or
    /// down successor contributes nothing. American contracts take the
    /// larger of continuation and immediate exercise.
    fn evaluate(&mut self, id: NodeId) -> Real {
        let node = self.at(id);
        if let Some(value) = node.value {
            return value;
        }
        let underlying = node.underlying;
        let (next_up, next_mid, next_down) = (node.next_up, node.next_mid, node.next_down);
        let p = node.probabilities;

        let mut exercised = false;
        let value = match next_mid {
            None => self.option.payoff(underlying),
            Some(mid) => {
                let up = next_up.map_or(0.0, |n| self.evaluate(n));
                let down = next_down.map_or(0.0, |n| self.evaluate(n));
                let mid = self.evaluate(mid);
                let continuation = (up * p.up + mid * p.mid + down * p.down) * self.discount_factor;
                let exercise = self.option.payoff(underlying);
                if self.option.is_american() && exercise > continuation {
                    exercised = true;
                    exercise
                } else {
                    continuation
                }
            }
        };

        let node = self.at_mut(id);
        node.value = Some(value);
        node.exercised = exercised;
        value
    }

    /// Build the lattice and value the root by recursion.
    ///
    /// # Errors
    /// * `Error::RecursionLimit` when the step count exceeds the configured
    ///   maximum depth; callers should retry with
    ///   [`backward_pricing`](Self::backward_pricing).
    /// * Any error from [`build`](Self::build).
    pub fn recursive_pricing(&mut self) -> Result<Real> {
        let steps = self.config.steps();
        let limit = self.config.max_recursion_steps();
        if steps > limit {
            return Err(Error::RecursionLimit { steps, limit });
        }
        self.build()?;
        let root = self.linked_root()?;
        Ok(self.evaluate(root))
    }

    /// Build the lattice and value it column by column from maturity.
    ///
    /// Within a column the trunk is valued first, then the nodes above it,
    /// then the nodes below it.
    ///
    /// # Errors
    /// Any error from [`build`](Self::build).
    pub fn backward_pricing(&mut self) -> Result<Real> {
        self.build()?;
        let mut trunk = self
            .last
            .ok_or_else(|| Error::Consistency("lattice has no terminal trunk".into()))?;
        loop {
            self.evaluate(trunk);
            let mut cursor = trunk;
            while let Some(up) = self.at(cursor).up {
                cursor = up;
                self.evaluate(cursor);
            }
            let mut cursor = trunk;
            while let Some(down) = self.at(cursor).down {
                cursor = down;
                self.evaluate(cursor);
            }
            match self.at(trunk).role {
                NodeRole::Trunk {
                    previous: Some(previous),
                } => trunk = previous,
                NodeRole::Trunk { previous: None } => break,
                NodeRole::Branch => {
                    return Err(Error::Consistency(format!(
                        "node {trunk} on the trunk chain is not a trunk"
                    )))
                }
            }
        }
        Ok(self.evaluate(trunk))
    }

    /// Price with the chosen algorithm.
    pub fn price(&mut self, method: PricingMethod) -> Result<Real> {
        match method {
            PricingMethod::Backward => self.backward_pricing(),
            PricingMethod::Recursive => self.recursive_pricing(),
        }
    }

    /// Whether immediate exercise is optimal at the valuation date.
    ///
    /// `None` until the lattice has been priced.
    pub fn root_exercised(&self) -> Option<bool> {
        let root = self.node(self.root?);
        root.value.map(|_| root.exercised)
    }

    fn linked_root(&self) -> Result<NodeId> {
        self.root
            .ok_or_else(|| Error::Consistency("lattice has no root".into()))
    }
}
