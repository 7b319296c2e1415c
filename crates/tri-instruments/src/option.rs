//! Vanilla option contract.
//!
//! A contract is a strike, a maturity date, a call/put flag and an exercise
//! style. It is immutable; pricing engines read it through `&OptionContract`.

use chrono::NaiveDate;
use tri_core::Real;

use crate::exercise::ExerciseStyle;
use crate::payoff::{OptionType, PlainVanillaPayoff};

/// A plain vanilla option on a single underlying asset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionContract {
    strike: Real,
    maturity: NaiveDate,
    option_type: OptionType,
    exercise: ExerciseStyle,
}

impl OptionContract {
    /// Create a new contract.
    pub fn new(
        strike: Real,
        maturity: NaiveDate,
        option_type: OptionType,
        exercise: ExerciseStyle,
    ) -> Self {
        Self {
            strike,
            maturity,
            option_type,
            exercise,
        }
    }

    /// Convenience: a European call/put.
    pub fn european(option_type: OptionType, strike: Real, maturity: NaiveDate) -> Self {
        Self::new(strike, maturity, option_type, ExerciseStyle::European)
    }

    /// Convenience: an American call/put.
    pub fn american(option_type: OptionType, strike: Real, maturity: NaiveDate) -> Self {
        Self::new(strike, maturity, option_type, ExerciseStyle::American)
    }

    /// The strike price.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// The maturity date.
    pub fn maturity(&self) -> NaiveDate {
        self.maturity
    }

    /// The option type (call/put).
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// The exercise style.
    pub fn exercise(&self) -> ExerciseStyle {
        self.exercise
    }

    /// `true` for calls.
    pub fn is_call(&self) -> bool {
        self.option_type == OptionType::Call
    }

    /// `true` when early exercise is allowed.
    pub fn is_american(&self) -> bool {
        self.exercise.allows_early_exercise()
    }

    /// The payoff function of this contract.
    pub fn vanilla_payoff(&self) -> PlainVanillaPayoff {
        PlainVanillaPayoff::new(self.option_type, self.strike)
    }

    /// Intrinsic value at the given underlying price.
    #[inline]
    pub fn payoff(&self, underlying: Real) -> Real {
        self.vanilla_payoff().value(underlying)
    }

    /// The same contract with a different exercise style.
    pub fn with_exercise(self, exercise: ExerciseStyle) -> Self {
        Self { exercise, ..self }
    }
}
