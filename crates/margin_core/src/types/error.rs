//! Error types for margin model validation.
//!
//! The model validates every field before computing anything. A failure is
//! never retried internally: it is surfaced verbatim so the caller can ask
//! the user for a correction.

use thiserror::Error;

/// Validation failures raised by the margin model.
///
/// # Variants
///
/// - `NonFinite`: a numeric field is NaN or infinite
/// - `Negative`: a price, payout or fee amount is below zero
/// - `RateOutOfRange`: a fraction lies outside `[0, 1]`
/// - `PercentOutOfRange`: a percent-form input lies outside `[0, 100]`
/// - `InvalidCohort`: the cohort size is zero
/// - `UnknownVariable`: a variable name could not be parsed
///
/// # Examples
///
/// ```
/// use margin_core::types::ModelError;
///
/// let err = ModelError::rate_out_of_range("pass_rate", 1.5);
/// assert_eq!(format!("{}", err), "pass_rate must be within [0, 1], got 1.5");
/// assert_eq!(err.field(), Some("pass_rate"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A numeric field is NaN or infinite.
    #[error("{field} must be finite")]
    NonFinite {
        /// Name of the offending field
        field: &'static str,
    },

    /// A price, payout or fee amount is negative.
    #[error("{field} must be >= 0, got {value}")]
    Negative {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// A rate-like field is outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    RateOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// A percent-form input is outside `[0, 100]`.
    #[error("{field} must be within [0, 100] percent, got {value}")]
    PercentOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// The cohort size must be at least one account.
    #[error("cohort size must be at least 1 account")]
    InvalidCohort,

    /// A variable name did not match any known margin variable.
    #[error("unknown margin variable: {name}")]
    UnknownVariable {
        /// The name that failed to parse
        name: String,
    },
}

impl ModelError {
    /// Create a non-finite field error.
    pub fn non_finite(field: &'static str) -> Self {
        Self::NonFinite { field }
    }

    /// Create a negative value error.
    pub fn negative(field: &'static str, value: f64) -> Self {
        Self::Negative { field, value }
    }

    /// Create a rate out-of-range error.
    pub fn rate_out_of_range(field: &'static str, value: f64) -> Self {
        Self::RateOutOfRange { field, value }
    }

    /// Create a percent out-of-range error.
    pub fn percent_out_of_range(field: &'static str, value: f64) -> Self {
        Self::PercentOutOfRange { field, value }
    }

    /// Name of the field that failed validation, if the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NonFinite { field }
            | Self::Negative { field, .. }
            | Self::RateOutOfRange { field, .. }
            | Self::PercentOutOfRange { field, .. } => Some(field),
            Self::InvalidCohort | Self::UnknownVariable { .. } => None,
        }
    }
}

/// Reject NaN/infinite values and negatives.
pub(crate) fn check_amount(field: &'static str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::non_finite(field));
    }
    if value < 0.0 {
        return Err(ModelError::negative(field, value));
    }
    Ok(())
}

/// Reject NaN/infinite values and fractions outside `[0, 1]`.
pub(crate) fn check_rate(field: &'static str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::non_finite(field));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ModelError::rate_out_of_range(field, value));
    }
    Ok(())
}

/// Reject NaN/infinite values and percentages outside `[0, 100]`.
pub(crate) fn check_percent(field: &'static str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::non_finite(field));
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(ModelError::percent_out_of_range(field, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_display() {
        let err = ModelError::negative("eval_price", -10.0);
        let display = format!("{}", err);
        assert!(display.contains("eval_price"));
        assert!(display.contains("-10"));
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!(ModelError::non_finite("avg_payout").field(), Some("avg_payout"));
        assert_eq!(ModelError::InvalidCohort.field(), None);
        let unknown = ModelError::UnknownVariable {
            name: "foo".to_string(),
        };
        assert_eq!(unknown.field(), None);
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount("x", 0.0).is_ok());
        assert!(check_amount("x", 12.5).is_ok());
        assert_eq!(check_amount("x", -0.01), Err(ModelError::negative("x", -0.01)));
        assert_eq!(check_amount("x", f64::NAN), Err(ModelError::non_finite("x")));
        assert_eq!(
            check_amount("x", f64::INFINITY),
            Err(ModelError::non_finite("x"))
        );
    }

    #[test]
    fn test_check_rate_bounds_inclusive() {
        assert!(check_rate("r", 0.0).is_ok());
        assert!(check_rate("r", 1.0).is_ok());
        assert!(check_rate("r", 1.0001).is_err());
        assert!(check_rate("r", -0.0001).is_err());
    }

    #[test]
    fn test_check_percent() {
        assert!(check_percent("p", 100.0).is_ok());
        assert_eq!(
            check_percent("p", 150.0),
            Err(ModelError::percent_out_of_range("p", 150.0))
        );
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = ModelError::InvalidCohort;
        let _: &dyn std::error::Error = &err;
    }
}
