//! Solver and configuration error types.
//!
//! Model validation failures are wrapped verbatim. "No threshold found" and
//! "no contour points" are not errors: they are reported through `Option`
//! and empty traces.

use margin_core::types::{MarginVariable, ModelError};
use thiserror::Error;

/// Errors that can occur while configuring a solver.
///
/// # Examples
///
/// ```
/// use margin_solver::ConfigError;
///
/// let err = ConfigError::InvalidTolerance {
///     section: "threshold",
///     value: -1.0,
/// };
/// assert!(format!("{}", err).contains("threshold"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Tolerance is not a positive finite number.
    #[error("{section}: tolerance must be positive and finite, got {value}")]
    InvalidTolerance {
        /// Configuration section
        section: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Iteration limit is zero.
    #[error("{section}: max_iterations must be > 0")]
    InvalidIterations {
        /// Configuration section
        section: &'static str,
    },

    /// A fraction or factor lies outside its allowed range.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// A point or step count is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    TooFewPoints {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: usize,
        /// Minimum accepted value
        min: usize,
    },

    /// TOML text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Errors returned by the solvers and the engine facade.
///
/// # Variants
///
/// - `Model`: the fixed parameters failed model validation
/// - `Config`: the solver configuration is invalid
/// - `DegenerateAxes`: a contour was requested over a single variable
/// - `InvalidRange`: a search range is non-finite or empty
/// - `CacheKey`: a query could not be serialised into a cache key
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Invalid model parameters.
    #[error("Invalid model parameters: {0}")]
    Model(#[from] ModelError),

    /// Invalid solver configuration.
    #[error("Invalid solver configuration: {0}")]
    Config(#[from] ConfigError),

    /// Contour axes name the same variable.
    #[error("Contour axes must be two different variables, got {variable} twice")]
    DegenerateAxes {
        /// The repeated variable
        variable: MarginVariable,
    },

    /// Range bounds are non-finite or not ordered.
    #[error("Invalid range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Cache key serialisation failed.
    #[error("Failed to build cache key: {0}")]
    CacheKey(String),
}

impl SolverError {
    /// Create an invalid range error.
    pub fn invalid_range(min: f64, max: f64) -> Self {
        Self::InvalidRange { min, max }
    }

    /// Check if this error originates from model validation.
    pub fn is_model_error(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Check if this error originates from the configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Reject non-finite or reversed ranges. `allow_empty` accepts `min == max`.
pub(crate) fn check_range(range: (f64, f64), allow_empty: bool) -> Result<(), SolverError> {
    let (min, max) = range;
    let ordered = if allow_empty { min <= max } else { min < max };
    if min.is_finite() && max.is_finite() && ordered {
        Ok(())
    } else {
        Err(SolverError::invalid_range(min, max))
    }
}
