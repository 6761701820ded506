//! Margin definitions traced by the solvers.
//!
//! The solvers only ever see a `Fn(f64) -> f64` or `Fn(f64, f64) -> f64`
//! surface. Which margin that surface measures is decided here, once, so the
//! standard and combined views share a single evaluation path.

use serde::{Deserialize, Serialize};

use super::margin::calculate_margins;
use crate::types::{MarginParameters, MarginVariable, ModelError};

/// Which margin a search measures.
///
/// # Examples
///
/// ```
/// use margin_core::model::MarginDefinition;
/// use margin_core::types::MarginParameters;
///
/// let params = MarginParameters::default();
/// let standard = MarginDefinition::Standard.evaluate(&params).unwrap();
/// let combined = MarginDefinition::combined(50.0).evaluate(&params).unwrap();
/// assert!(combined > standard);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginDefinition {
    /// Price margin of the evaluation business alone.
    #[default]
    Standard,
    /// Margin including supplementary revenue streams.
    ///
    /// The supplementary revenue is cost-free and is added, per account, to
    /// both gross and net revenue.
    Combined {
        /// Supplementary revenue per purchased account
        supplementary_revenue_per_account: f64,
    },
}

impl MarginDefinition {
    /// Combined definition with the given supplementary revenue per account.
    pub fn combined(supplementary_revenue_per_account: f64) -> Self {
        Self::Combined {
            supplementary_revenue_per_account,
        }
    }

    /// Validate the definition's own inputs.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Standard => Ok(()),
            Self::Combined {
                supplementary_revenue_per_account,
            } => crate::types::error::check_amount(
                "supplementary_revenue_per_account",
                *supplementary_revenue_per_account,
            ),
        }
    }

    /// Margin of `params` under this definition.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelError`] of an out-of-domain parameter or
    /// supplementary revenue figure.
    pub fn evaluate(&self, params: &MarginParameters) -> Result<f64, ModelError> {
        self.validate()?;
        let result = calculate_margins(params)?;
        match self {
            Self::Standard => Ok(result.price_margin),
            Self::Combined {
                supplementary_revenue_per_account,
            } => {
                let supplementary = supplementary_revenue_per_account * result.cohort_size;
                let gross = result.gross_revenue + supplementary;
                if gross == 0.0 {
                    Ok(0.0)
                } else {
                    Ok((result.net_revenue + supplementary) / gross)
                }
            }
        }
    }

    /// Single-variable margin function over `variable`, others fixed.
    ///
    /// Out-of-domain evaluations map to `NaN`, which the solvers treat as
    /// "unsolvable at this point".
    pub fn margin_fn<'a>(
        &'a self,
        params: &'a MarginParameters,
        variable: MarginVariable,
    ) -> impl Fn(f64) -> f64 + Sync + 'a {
        move |value| {
            self.evaluate(&variable.apply(params, value))
                .unwrap_or(f64::NAN)
        }
    }

    /// Two-variable margin surface over `(x_variable, y_variable)`.
    ///
    /// When both axes name the same variable the y value wins; callers are
    /// expected to reject such queries before tracing.
    pub fn surface_fn<'a>(
        &'a self,
        params: &'a MarginParameters,
        x_variable: MarginVariable,
        y_variable: MarginVariable,
    ) -> impl Fn(f64, f64) -> f64 + Sync + 'a {
        move |x, y| {
            let moved = y_variable.apply(&x_variable.apply(params, x), y);
            self.evaluate(&moved).unwrap_or(f64::NAN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CohortScale;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_matches_price_margin() {
        let params = MarginParameters::default();
        let margin = MarginDefinition::Standard.evaluate(&params).unwrap();
        assert_eq!(margin, calculate_margins(&params).unwrap().price_margin);
    }

    #[test]
    fn test_combined_adds_supplementary_revenue() {
        // gross 100, net -176; +100 supplementary -> -76 / 200
        let params = MarginParameters::default();
        let margin = MarginDefinition::combined(100.0).evaluate(&params).unwrap();
        assert_relative_eq!(margin, -0.38, epsilon = 1e-12);
    }

    #[test]
    fn test_combined_zero_supplement_equals_standard() {
        let params = MarginParameters::new(180.0, 0.03, 3000.0);
        let standard = MarginDefinition::Standard.evaluate(&params).unwrap();
        let combined = MarginDefinition::combined(0.0).evaluate(&params).unwrap();
        assert_relative_eq!(standard, combined, epsilon = 1e-15);
    }

    #[test]
    fn test_combined_is_scale_invariant() {
        let definition = MarginDefinition::combined(25.0);
        let single = definition.evaluate(&MarginParameters::default()).unwrap();
        let cohort = definition
            .evaluate(&MarginParameters::default().with_cohort_scale(CohortScale::Cohort(400)))
            .unwrap();
        assert_relative_eq!(single, cohort, max_relative = 1e-12);
    }

    #[test]
    fn test_combined_rejects_negative_supplement() {
        let err = MarginDefinition::combined(-1.0)
            .evaluate(&MarginParameters::default())
            .unwrap_err();
        assert_eq!(err.field(), Some("supplementary_revenue_per_account"));
    }

    #[test]
    fn test_margin_fn_maps_errors_to_nan() {
        let params = MarginParameters::default();
        let definition = MarginDefinition::Standard;
        let f = definition.margin_fn(&params, MarginVariable::PurchaseToPayoutRate);
        assert!(f(1.5).is_nan());
        assert!(f(0.05).is_finite());
    }

    #[test]
    fn test_surface_fn_moves_both_axes() {
        let params = MarginParameters::default();
        let definition = MarginDefinition::Standard;
        let surface =
            definition.surface_fn(&params, MarginVariable::EvalPrice, MarginVariable::AvgPayout);

        let expected = definition
            .evaluate(&MarginParameters::new(200.0, 0.05, 1000.0))
            .unwrap();
        assert_eq!(surface(200.0, 1000.0), expected);
    }
}
