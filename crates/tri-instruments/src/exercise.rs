//! Option exercise styles.
//!
//! An exercise style defines *when* an option can be exercised: only at
//! maturity, or at any lattice date up to maturity.

use std::fmt;
use std::str::FromStr;

use tri_core::Error;

/// Type of exercise right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExerciseStyle {
    /// Can only be exercised at expiry.
    European,
    /// Can be exercised at any time up to expiry.
    American,
}

impl ExerciseStyle {
    /// `true` when early exercise is allowed.
    pub fn allows_early_exercise(self) -> bool {
        matches!(self, ExerciseStyle::American)
    }
}

impl fmt::Display for ExerciseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseStyle::European => write!(f, "european"),
            ExerciseStyle::American => write!(f, "american"),
        }
    }
}

impl FromStr for ExerciseStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "european" | "eu" => Ok(ExerciseStyle::European),
            "american" | "am" => Ok(ExerciseStyle::American),
            other => Err(Error::Configuration(format!(
                "exercise style must be 'european' or 'american', got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_styles() {
        assert_eq!("european".parse(), Ok(ExerciseStyle::European));
        assert_eq!("American".parse(), Ok(ExerciseStyle::American));
        assert_eq!("eu".parse(), Ok(ExerciseStyle::European));
        assert!("bermudan".parse::<ExerciseStyle>().is_err());
    }

    #[test]
    fn early_exercise_flag() {
        assert!(ExerciseStyle::American.allows_early_exercise());
        assert!(!ExerciseStyle::European.allows_early_exercise());
    }
}
