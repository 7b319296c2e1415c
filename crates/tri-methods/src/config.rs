//! Run parameters of a lattice pricing job.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tri_core::{ensure, Error, Real, Result, Size};

/// Probability floor used when none is configured explicitly.
pub const DEFAULT_PROBABILITY_FLOOR: Real = 1e-9;

/// Deepest lattice the recursive pricing path accepts by default.
pub const DEFAULT_MAX_RECURSION_STEPS: Size = 1000;

/// Algorithm used to price on a built lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PricingMethod {
    /// Column-by-column induction from the terminal column.
    #[default]
    Backward,
    /// Depth-first memoized recursion from the root, bounded by
    /// [`PricingConfig::max_recursion_steps`].
    Recursive,
}

impl fmt::Display for PricingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMethod::Backward => write!(f, "backward"),
            PricingMethod::Recursive => write!(f, "recursive"),
        }
    }
}

impl FromStr for PricingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backward" => Ok(PricingMethod::Backward),
            "recursive" => Ok(PricingMethod::Recursive),
            other => Err(Error::Configuration(format!(
                "unknown pricing method '{other}'"
            ))),
        }
    }
}

/// Parameters controlling one lattice run.
///
/// ```
/// use chrono::NaiveDate;
/// use tri_methods::PricingConfig;
///
/// let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
/// let config = PricingConfig::new(today, 400).with_pruning(1e-7);
/// assert!(config.pruning());
/// assert_eq!(config.probability_floor(), Some(1e-7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingConfig {
    valuation_date: NaiveDate,
    steps: Size,
    pruning: bool,
    probability_floor: Option<Real>,
    max_recursion_steps: Size,
}

impl PricingConfig {
    /// Unpruned run with `steps` time steps starting at `valuation_date`.
    pub fn new(valuation_date: NaiveDate, steps: Size) -> Self {
        Self {
            valuation_date,
            steps,
            pruning: false,
            probability_floor: Some(DEFAULT_PROBABILITY_FLOOR),
            max_recursion_steps: DEFAULT_MAX_RECURSION_STEPS,
        }
    }

    /// Enable pruning with the given reachability floor.
    pub fn with_pruning(self, floor: Real) -> Self {
        Self {
            pruning: true,
            probability_floor: Some(floor),
            ..self
        }
    }

    /// Disable pruning (the floor is kept but unused).
    pub fn without_pruning(self) -> Self {
        Self {
            pruning: false,
            ..self
        }
    }

    /// Toggle pruning without touching the floor.
    pub fn with_pruning_enabled(self, pruning: bool) -> Self {
        Self { pruning, ..self }
    }

    /// Replace the probability floor; `None` is only valid without pruning.
    pub fn with_probability_floor(self, floor: Option<Real>) -> Self {
        Self {
            probability_floor: floor,
            ..self
        }
    }

    /// Bound on the depth of the recursive pricing path.
    pub fn with_max_recursion_steps(self, max_recursion_steps: Size) -> Self {
        Self {
            max_recursion_steps,
            ..self
        }
    }

    /// Copy with a different valuation date.
    pub fn with_valuation_date(self, valuation_date: NaiveDate) -> Self {
        Self {
            valuation_date,
            ..self
        }
    }

    /// Copy with a different step count.
    pub fn with_steps(self, steps: Size) -> Self {
        Self { steps, ..self }
    }

    /// Root date of the lattice.
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Number of time steps.
    pub fn steps(&self) -> Size {
        self.steps
    }

    /// Whether low-probability nodes are collapsed.
    pub fn pruning(&self) -> bool {
        self.pruning
    }

    /// Reachability floor below which a node is pruned.
    pub fn probability_floor(&self) -> Option<Real> {
        self.probability_floor
    }

    /// Maximum depth of the recursive pricing path.
    pub fn max_recursion_steps(&self) -> Size {
        self.max_recursion_steps
    }

    /// The floor that pruning decisions compare against, if pruning is on.
    pub(crate) fn active_floor(&self) -> Option<Real> {
        if self.pruning {
            self.probability_floor
        } else {
            None
        }
    }

    /// Check the run parameters against a contract maturity.
    ///
    /// # Errors
    /// `Error::Configuration` when pruning is requested without a positive
    /// floor, when `steps == 0`, or when the maturity is not after the
    /// valuation date.
    pub fn validate(&self, maturity: NaiveDate) -> Result<()> {
        if self.pruning {
            ensure!(
                self.probability_floor.is_some(),
                "provide a probability floor for pruning"
            );
        }
        if let Some(floor) = self.probability_floor {
            ensure!(
                floor.is_finite() && floor > 0.0,
                "probability floor must be positive, got {floor}"
            );
        }
        ensure!(self.steps >= 1, "step count must be at least 1");
        ensure!(
            maturity > self.valuation_date,
            "valuation date {} must precede maturity {maturity}",
            self.valuation_date
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tri_core::Error;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn maturity() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn defaults() {
        let c = PricingConfig::new(today(), 10);
        assert_eq!(c.steps(), 10);
        assert!(!c.pruning());
        assert_eq!(c.probability_floor(), Some(DEFAULT_PROBABILITY_FLOOR));
        assert_eq!(c.max_recursion_steps(), DEFAULT_MAX_RECURSION_STEPS);
        assert_eq!(c.active_floor(), None);
        assert!(c.validate(maturity()).is_ok());
    }

    #[test]
    fn pruning_builder() {
        let c = PricingConfig::new(today(), 10).with_pruning(1e-6);
        assert!(c.pruning());
        assert_eq!(c.active_floor(), Some(1e-6));
        let off = c.without_pruning();
        assert_eq!(off.active_floor(), None);
        assert_eq!(off.probability_floor(), Some(1e-6));
    }

    #[test]
    fn pruning_without_floor_is_fatal() {
        let c = PricingConfig::new(today(), 10)
            .with_pruning_enabled(true)
            .with_probability_floor(None);
        assert!(matches!(c.validate(maturity()), Err(Error::Configuration(_))));
        // Without pruning a missing floor is fine.
        assert!(c.without_pruning().validate(maturity()).is_ok());
    }

    #[test]
    fn method_parsing() {
        assert_eq!("Backward".parse::<PricingMethod>().unwrap(), PricingMethod::Backward);
        assert_eq!(" recursive ".parse::<PricingMethod>().unwrap(), PricingMethod::Recursive);
        assert!("forward".parse::<PricingMethod>().is_err());
        assert_eq!(PricingMethod::default().to_string(), "backward");
    }

    #[test]
    fn rejects_bad_runs() {
        let c = PricingConfig::new(today(), 0);
        assert!(c.validate(maturity()).is_err());
        let c = PricingConfig::new(maturity(), 10);
        assert!(c.validate(maturity()).is_err());
        let c = PricingConfig::new(today(), 10).with_pruning(0.0);
        assert!(c.validate(maturity()).is_err());
    }
}
