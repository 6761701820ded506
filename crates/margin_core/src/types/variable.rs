//! Variables the solvers can move while the other parameters stay fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::params::MarginParameters;

/// A single model input that threshold, sampling and contour searches vary.
///
/// # Examples
///
/// ```
/// use margin_core::types::{MarginParameters, MarginVariable};
///
/// let variable: MarginVariable = "Eval Price".parse().unwrap();
/// let params = variable.apply(&MarginParameters::default(), 149.0);
/// assert_eq!(variable.current(&params), 149.0);
/// assert_eq!(variable.to_string(), "Eval Price");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginVariable {
    /// Price of one evaluation
    EvalPrice,
    /// Combined pass × funded-to-payout rate
    PurchaseToPayoutRate,
    /// Average payout per paid-out account
    AvgPayout,
}

impl MarginVariable {
    /// All variables in display order.
    pub const ALL: [MarginVariable; 3] = [
        MarginVariable::EvalPrice,
        MarginVariable::PurchaseToPayoutRate,
        MarginVariable::AvgPayout,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MarginVariable::EvalPrice => "Eval Price",
            MarginVariable::PurchaseToPayoutRate => "Purchase to Payout Rate",
            MarginVariable::AvgPayout => "Avg Payout",
        }
    }

    /// Current value of the variable in `params`.
    pub fn current(&self, params: &MarginParameters) -> f64 {
        match self {
            MarginVariable::EvalPrice => params.eval_price,
            MarginVariable::PurchaseToPayoutRate => params.purchase_to_payout_rate,
            MarginVariable::AvgPayout => params.avg_payout,
        }
    }

    /// Copy of `params` with the variable set to `value`.
    pub fn apply(&self, params: &MarginParameters, value: f64) -> MarginParameters {
        let mut moved = *params;
        match self {
            MarginVariable::EvalPrice => moved.eval_price = value,
            MarginVariable::PurchaseToPayoutRate => moved.purchase_to_payout_rate = value,
            MarginVariable::AvgPayout => moved.avg_payout = value,
        }
        moved
    }
}

impl fmt::Display for MarginVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MarginVariable {
    type Err = ModelError;

    /// Accepts display labels (any case) and snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalised.as_str() {
            "eval price" => Ok(MarginVariable::EvalPrice),
            "purchase to payout rate" => Ok(MarginVariable::PurchaseToPayoutRate),
            "avg payout" | "average payout" => Ok(MarginVariable::AvgPayout),
            _ => Err(ModelError::UnknownVariable {
                name: s.to_string(),
            }),
        }
    }
}
