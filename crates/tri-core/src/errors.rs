//! Error types for trinomial-rs.
//!
//! Every fallible operation in the workspace returns [`Result`]. The
//! variants follow the pricer's failure taxonomy: configuration mistakes and
//! internal-consistency violations are fatal and surface unmodified, while the
//! recursion limit is a recoverable signal (retry with backward induction).
//! Numerical degradation inside a single node is not an error at all; it is
//! handled locally by the lattice.

use thiserror::Error;

/// The top-level error type used throughout trinomial-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime failure (raised by [`fail!`](crate::fail)).
    #[error("{0}")]
    Runtime(String),

    /// Invalid pricing inputs or run parameters (raised by
    /// [`ensure!`](crate::ensure)).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A result violated an invariant that correct formulas always satisfy
    /// (raised by [`ensure_post!`](crate::ensure_post)).
    #[error("internal consistency error: {0}")]
    Consistency(String),

    /// The recursive pricing path was asked to go deeper than its bound.
    #[error("recursive pricing needs {steps} levels but is limited to {limit}; use backward induction")]
    RecursionLimit {
        /// Number of lattice steps requested.
        steps: usize,
        /// Configured maximum depth.
        limit: usize,
    },

    /// Date arithmetic out of range.
    #[error("date error: {0}")]
    Date(String),
}

impl Error {
    /// `true` for the recoverable resource-exhaustion signal.
    pub fn is_recursion_limit(&self) -> bool {
        matches!(self, Error::RecursionLimit { .. })
    }
}

/// Shorthand `Result` type used throughout trinomial-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Check a configuration precondition.
///
/// Returns `Err(Error::Configuration(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tri_core::{ensure, errors::Error};
/// fn positive(x: f64) -> tri_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Configuration(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Configuration(
                format!($($msg)*)
            ));
        }
    };
}

/// Check an internal-consistency postcondition.
///
/// Returns `Err(Error::Consistency(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tri_core::{ensure_post, errors::Error};
/// fn halve(x: f64) -> tri_core::errors::Result<f64> {
///     let result = x / 2.0;
///     ensure_post!(result.is_finite(), "result must be finite, got {result}");
///     Ok(result)
/// }
/// assert!(halve(1.0).is_ok());
/// assert!(matches!(halve(f64::INFINITY), Err(Error::Consistency(_))));
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Consistency(
                format!($($msg)*)
            ));
        }
    };
}

/// Fail immediately with `Err(Error::Runtime(...))`.
///
/// # Example
/// ```
/// use tri_core::{fail, errors::Error};
/// fn always_err() -> tri_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
