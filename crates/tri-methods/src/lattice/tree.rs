//! Lattice construction.
//!
//! Each column is built from its trunk: the trunk's triplet first, then every
//! node above it, then every node below it. Successor nodes are shared
//! between neighbours, so an up-then-down path and a down-then-up path land
//! on the same node. With pruning, nodes whose reachability does not exceed
//! the floor get a middle successor only and are spliced into the next
//! column's chain.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, trace};
use tri_core::{Error, Price, Real, Result, Size, Time, DAYS_PER_YEAR};
use tri_instruments::{MarketData, OptionContract};

use super::node::{Branching, LatticeNode, NodeRole, ProbabilitySolution};
use super::NodeId;
use crate::config::PricingConfig;

/// A recombining trinomial lattice for one `(market, contract, config)`.
///
/// The lattice owns every node it creates. Construction is deferred to
/// [`build`](Self::build), which both pricing methods call, so a lattice can
/// be priced repeatedly and always starts from a fresh arena.
///
/// ```
/// use chrono::NaiveDate;
/// use tri_instruments::{MarketData, OptionContract, OptionType};
/// use tri_methods::{PricingConfig, TrinomialLattice};
///
/// let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let maturity = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let market = MarketData::new(100.0, 0.05, 0.2).unwrap();
/// let option = OptionContract::european(OptionType::Call, 100.0, maturity);
///
/// let mut lattice = TrinomialLattice::new(market, option, PricingConfig::new(today, 200)).unwrap();
/// let price = lattice.backward_pricing().unwrap();
/// assert!((price - 10.45).abs() < 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct TrinomialLattice {
    pub(crate) market: MarketData,
    pub(crate) option: OptionContract,
    pub(crate) config: PricingConfig,
    pub(crate) delta_t: Time,
    pub(crate) discount_factor: Real,
    pub(crate) alpha: Real,
    growth: Real,
    variance_factor: Real,
    step_days: Real,
    ex_dividend_offset: Option<Real>,
    dividend_tolerance: Real,
    pub(crate) nodes: Vec<LatticeNode>,
    pub(crate) root: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
}

impl TrinomialLattice {
    /// Set up a lattice and its per-step constants.
    ///
    /// # Errors
    /// `Error::Configuration` when `config` is invalid for the contract's
    /// maturity (see [`PricingConfig::validate`]).
    pub fn new(market: MarketData, option: OptionContract, config: PricingConfig) -> Result<Self> {
        config.validate(option.maturity())?;
        let valuation = config.valuation_date();
        let days = option.maturity().signed_duration_since(valuation).num_days() as Real;
        let steps = config.steps() as Real;

        let delta_t = days / (steps * DAYS_PER_YEAR);
        let rate = market.rate();
        let vol = market.volatility();
        let ex_dividend_offset = market.has_dividend().then(|| {
            market
                .ex_dividend_date()
                .signed_duration_since(valuation)
                .num_days() as Real
        });

        Ok(Self {
            market,
            option,
            config,
            delta_t,
            discount_factor: (-rate * delta_t).exp(),
            alpha: (vol * (3.0 * delta_t).sqrt()).exp(),
            growth: (rate * delta_t).exp(),
            variance_factor: (vol * vol * delta_t).exp_m1(),
            step_days: delta_t * DAYS_PER_YEAR,
            ex_dividend_offset,
            dividend_tolerance: 1.0 / steps.max(1.0) / 1000.0,
            nodes: Vec::new(),
            root: None,
            last: None,
        })
    }

    // ── Derived constants ────────────────────────────────────────────────────

    /// Length of one step in years.
    pub fn delta_t(&self) -> Time {
        self.delta_t
    }

    /// One-step discount factor `exp(−r·Δt)`.
    pub fn discount_factor(&self) -> Real {
        self.discount_factor
    }

    /// Ratio between neighbouring levels, `exp(σ·√(3Δt))`.
    pub fn alpha(&self) -> Real {
        self.alpha
    }

    /// Market inputs.
    pub fn market(&self) -> &MarketData {
        &self.market
    }

    /// Priced contract.
    pub fn option(&self) -> &OptionContract {
        &self.option
    }

    /// Run parameters.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    /// Number of nodes in the arena (0 before the first build).
    pub fn node_count(&self) -> Size {
        self.nodes.len()
    }

    /// Root node, once built.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Trunk of the terminal column, once built.
    pub fn terminal_trunk(&self) -> Option<NodeId> {
        self.last
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// If `id` does not come from the current build of this lattice.
    pub fn node(&self, id: NodeId) -> &LatticeNode {
        &self.nodes[id.index()]
    }

    /// Nodes of the column containing `id`, from the highest level down.
    pub fn column(&self, id: NodeId) -> Column<'_> {
        let mut top = id;
        while let Some(up) = self.node(top).up {
            top = up;
        }
        Column {
            lattice: self,
            next: Some(top),
        }
    }

    /// Date and time of a node (steps advance by fractional days).
    ///
    /// # Errors
    /// `Error::Date` if the offset leaves chrono's range.
    pub fn node_date(&self, id: NodeId) -> Result<NaiveDateTime> {
        let days = self.node(id).step as Real * self.step_days;
        let micros = (days * 86_400_000_000.0).round() as i64;
        self.config
            .valuation_date()
            .and_time(NaiveTime::default())
            .checked_add_signed(Duration::microseconds(micros))
            .ok_or_else(|| Error::Date(format!("node {id} is {days} days out of range")))
    }

    /// Whether the ex-dividend date falls in the step starting at `step`.
    ///
    /// The step covers `(t, t + Δt]` in days after the valuation date, with
    /// both ends widened by a sub-step tolerance.
    pub fn is_dividend_step(&self, step: usize) -> bool {
        let Some(ex) = self.ex_dividend_offset else {
            return false;
        };
        let start = step as Real * self.step_days;
        let end = start + self.step_days;
        let tol = self.dividend_tolerance;
        let after_start = start < ex && (start - ex).abs() >= tol;
        let by_end = ex < end || (ex - end).abs() < tol;
        after_start && by_end
    }

    /// Ex-dividend date as seen by the lattice, if any.
    pub fn ex_dividend_date(&self) -> Option<NaiveDate> {
        self.market
            .has_dividend()
            .then(|| self.market.ex_dividend_date())
    }

    // ── Construction ─────────────────────────────────────────────────────────

    /// Build the full lattice, discarding any previous build.
    ///
    /// # Errors
    /// `Error::Consistency` if a node's probabilities fail validation or the
    /// arena outgrows the `u32` handle range.
    pub fn build(&mut self) -> Result<()> {
        self.nodes.clear();
        let root = self.push(LatticeNode::new(
            self.market.spot(),
            0,
            NodeRole::Trunk { previous: None },
        ))?;
        self.at_mut(root).reach = 1.0;
        self.root = Some(root);
        self.last = None;

        let mut trunk = root;
        for _ in 0..self.config.steps() {
            trunk = self.build_column(trunk)?;
        }
        self.last = Some(trunk);

        debug!(
            steps = self.config.steps(),
            nodes = self.nodes.len(),
            pruning = self.config.pruning(),
            floor = ?self.config.probability_floor(),
            alpha = self.alpha,
            "built trinomial lattice"
        );
        Ok(())
    }

    /// Build the next column from `trunk` and return the new trunk.
    fn build_column(&mut self, trunk: NodeId) -> Result<NodeId> {
        self.build_triplet(trunk, None)?;

        let mut parent = trunk;
        while let Some(up) = self.at(parent).up {
            parent = up;
            let below = self.linked(parent, self.at(parent).down, "down")?;
            let candidate = self.at(below).next_up;
            if self.keeps_branches(below) {
                self.at_mut(parent).next_mid = candidate;
                self.build_triplet(parent, candidate)?;
            } else {
                self.build_triplet(parent, candidate)?;
                let mid = self.linked(parent, self.at(parent).next_mid, "middle successor")?;
                let below_mid =
                    self.linked(below, self.at(below).next_mid, "middle successor")?;
                self.at_mut(mid).down = Some(below_mid);
                self.at_mut(below_mid).up = Some(mid);
            }
        }

        let mut parent = trunk;
        while let Some(down) = self.at(parent).down {
            parent = down;
            let above = self.linked(parent, self.at(parent).up, "up")?;
            let candidate = self.at(above).next_down;
            if self.keeps_branches(above) {
                self.at_mut(parent).next_mid = candidate;
                self.build_triplet(parent, candidate)?;
            } else {
                self.build_triplet(parent, candidate)?;
                let mid = self.linked(parent, self.at(parent).next_mid, "middle successor")?;
                let above_mid =
                    self.linked(above, self.at(above).next_mid, "middle successor")?;
                self.at_mut(mid).up = Some(above_mid);
                self.at_mut(above_mid).down = Some(mid);
            }
        }

        self.linked(trunk, self.at(trunk).next_mid, "middle successor")
    }

    /// Attach successors to `node`, solve its probabilities and push its
    /// reachability forward.
    fn build_triplet(&mut self, node: NodeId, candidate: Option<NodeId>) -> Result<()> {
        let mid = self.resolve_middle(node, candidate)?;
        self.at_mut(node).next_mid = Some(mid);
        if self.keeps_branches(node) {
            let up = self.resolve_up(mid)?;
            let down = self.resolve_down(mid)?;
            let n = self.at_mut(node);
            n.next_up = Some(up);
            n.next_down = Some(down);
        }
        self.compute_probabilities(node)?;
        self.propagate(node);
        Ok(())
    }

    /// Middle successor of `node`.
    ///
    /// An existing successor is kept unless a dividend falls in the step. In
    /// a dividend step the successor is the level closest to the
    /// dividend-adjusted forward, searched from `candidate` when one is given.
    fn resolve_middle(&mut self, node: NodeId, candidate: Option<NodeId>) -> Result<NodeId> {
        let step = self.at(node).step;
        let dividend = self.is_dividend_step(step as usize);
        if let Some(mid) = self.at(node).next_mid {
            if !dividend {
                return Ok(mid);
            }
        }

        let forward = self.forward(node);
        if let (true, Some(candidate)) = (dividend, candidate) {
            return self.walk_to_forward(candidate, forward);
        }
        let role = match self.at(node).role {
            NodeRole::Trunk { .. } => NodeRole::Trunk {
                previous: Some(node),
            },
            NodeRole::Branch => NodeRole::Branch,
        };
        let fresh = self.push(LatticeNode::new(forward, step + 1, role))?;
        if dividend {
            self.walk_to_forward(fresh, forward)
        } else {
            Ok(fresh)
        }
    }

    /// Walk same-column neighbours from `start` until `forward` lies within
    /// half a level of the current node.
    fn walk_to_forward(&mut self, start: NodeId, forward: Price) -> Result<NodeId> {
        let alpha = self.alpha;
        let mut current = start;
        if !(forward > 0.0 && self.at(current).underlying > 0.0)
            || !(alpha.is_finite() && alpha > 1.0)
        {
            return Ok(current);
        }
        loop {
            let level = self.at(current).underlying;
            if forward >= (level + level * alpha) / 2.0 {
                current = self.resolve_up(current)?;
            } else {
                break;
            }
        }
        loop {
            let level = self.at(current).underlying;
            if forward <= (level + level / alpha) / 2.0 {
                current = self.resolve_down(current)?;
            } else {
                break;
            }
        }
        Ok(current)
    }

    /// Same-column neighbour above `node`, created on first use.
    fn resolve_up(&mut self, node: NodeId) -> Result<NodeId> {
        if let Some(up) = self.at(node).up {
            return Ok(up);
        }
        let current = self.at(node);
        let mut fresh = LatticeNode::new(current.underlying * self.alpha, current.step, NodeRole::Branch);
        fresh.down = Some(node);
        let up = self.push(fresh)?;
        self.at_mut(node).up = Some(up);
        Ok(up)
    }

    /// Same-column neighbour below `node`, created on first use.
    fn resolve_down(&mut self, node: NodeId) -> Result<NodeId> {
        if let Some(down) = self.at(node).down {
            return Ok(down);
        }
        let current = self.at(node);
        let mut fresh = LatticeNode::new(current.underlying / self.alpha, current.step, NodeRole::Branch);
        fresh.up = Some(node);
        let down = self.push(fresh)?;
        self.at_mut(node).down = Some(down);
        Ok(down)
    }

    /// Solve and store the probabilities of `node`.
    fn compute_probabilities(&mut self, node: NodeId) -> Result<()> {
        let current = self.at(node);
        if let Some(floor) = self.config.active_floor() {
            if current.reach < floor {
                self.at_mut(node).probabilities = super::Probabilities::MIDDLE_ONLY;
                return Ok(());
            }
        }

        let mid = self.linked(node, current.next_mid, "middle successor")?;
        let underlying = current.underlying;
        let step = current.step;
        let branching = Branching {
            forward: self.forward(node),
            variance: underlying * underlying * self.growth * self.growth * self.variance_factor,
            variance_factor: self.variance_factor,
            middle: self.at(mid).underlying,
            alpha: self.alpha,
            dividend_step: self.is_dividend_step(step as usize),
        };
        let probabilities = match branching.solve() {
            ProbabilitySolution::Computed(p) => {
                p.validate()
                    .map_err(|e| Error::Consistency(format!("node {node} at step {step}: {e}")))?;
                p
            }
            solution @ ProbabilitySolution::Degenerate { reason } => {
                trace!(step, underlying, reason, "degenerate branching, collapsing to middle");
                solution.probabilities()
            }
        };
        self.at_mut(node).probabilities = probabilities;
        Ok(())
    }

    /// Add this node's reachability to its successors.
    fn propagate(&mut self, node: NodeId) {
        let current = self.at(node);
        let reach = current.reach;
        let p = current.probabilities;
        for (successor, probability) in [
            (current.next_up, p.up),
            (current.next_mid, p.mid),
            (current.next_down, p.down),
        ] {
            if let Some(successor) = successor {
                self.at_mut(successor).reach += reach * probability;
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// One-step forward of `node`, net of a dividend paid in the step.
    pub(crate) fn forward(&self, node: NodeId) -> Price {
        let current = self.at(node);
        let forward = current.underlying * self.growth;
        if self.is_dividend_step(current.step as usize) {
            forward - self.market.dividend()
        } else {
            forward
        }
    }

    /// Whether `node` gets up and down successors.
    fn keeps_branches(&self, node: NodeId) -> bool {
        match self.config.active_floor() {
            Some(floor) => self.at(node).reach > floor,
            None => true,
        }
    }

    fn push(&mut self, node: LatticeNode) -> Result<NodeId> {
        let index = self.nodes.len();
        let id = NodeId::try_from_index(index).ok_or_else(|| {
            Error::Consistency(format!("lattice arena is full at {index} nodes"))
        })?;
        self.nodes.push(node);
        Ok(id)
    }

    #[inline]
    pub(crate) fn at(&self, id: NodeId) -> &LatticeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn at_mut(&mut self, id: NodeId) -> &mut LatticeNode {
        &mut self.nodes[id.index()]
    }

    /// Follow a link that the construction guarantees to exist.
    pub(crate) fn linked(
        &self,
        from: NodeId,
        link: Option<NodeId>,
        what: &str,
    ) -> Result<NodeId> {
        link.ok_or_else(|| Error::Consistency(format!("node {from} has no {what} link")))
    }
}

/// Top-to-bottom iterator over the nodes of one column.
#[derive(Debug, Clone)]
pub struct Column<'a> {
    lattice: &'a TrinomialLattice,
    next: Option<NodeId>,
}

impl<'a> Iterator for Column<'a> {
    type Item = (NodeId, &'a LatticeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.lattice.node(id);
        self.next = node.down;
        Some((id, node))
    }
}
