//! Recombining trinomial lattice with a discrete dividend.
//!
//! # Overview
//!
//! * [`TrinomialLattice`]: builds the lattice column by column from the
//!   valuation date and prices a contract on it, either recursively from the
//!   root or by backward induction from the terminal column
//! * [`LatticeNode`]: one `(underlying, step)` state with its links, its
//!   reachability and its memoized value
//! * [`Branching`]: the one-step probability solve
//! * [`ConvergenceDiagnostics`]: closed-form spread and discretisation gap
//!
//! Nodes are stored in an arena owned by the lattice and addressed through
//! [`NodeId`]; links between nodes are handles, never references.

mod diagnostics;
mod node;
mod pricing;
mod tree;

pub use diagnostics::ConvergenceDiagnostics;
pub use node::{Branching, Formula, LatticeNode, NodeRole, Probabilities, ProbabilitySolution};
pub use tree::{Column, TrinomialLattice};

use std::fmt;

/// Handle of a node inside a [`TrinomialLattice`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Handle for arena position `index`, or `None` past `u32::MAX`.
    #[inline]
    pub(crate) fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeId;

    #[test]
    fn handles_cover_the_u32_range_only() {
        assert_eq!(NodeId::try_from_index(7).map(NodeId::index), Some(7));
        let last = u32::MAX as usize;
        assert_eq!(NodeId::try_from_index(last).map(NodeId::index), Some(last));
        if let Some(past) = last.checked_add(1) {
            assert_eq!(NodeId::try_from_index(past), None);
        }
    }
}
