//! Revenue, cost and margin breakdown of a challenge cohort.

use serde::{Deserialize, Serialize};

use crate::types::{MarginParameters, ModelError};

/// Detailed breakdown produced by [`calculate_margins`].
///
/// Invariants (exact, not approximate):
/// - `net_revenue == gross_revenue - total_cost`
/// - `total_cost == payout_cost + company_costs_total`
/// - `price_margin == net_revenue / gross_revenue`, or 0 when there is no
///   gross revenue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginResult {
    /// Accounts the figures are scaled to
    pub cohort_size: f64,
    /// Revenue from evaluation sales
    pub eval_revenue: f64,
    /// Revenue from activation fees of passing accounts
    pub activation_revenue: f64,
    /// Eval plus activation revenue
    pub gross_revenue: f64,
    /// Expected payouts
    pub payout_cost: f64,
    /// Fixed per-account fees
    pub fixed_costs: f64,
    /// Payment processor fees
    pub processor_fees: f64,
    /// Affiliate commissions
    pub affiliate_fees: f64,
    /// Staffing and live-allocation costs
    pub allocation_fees: f64,
    /// Sum of the company cost components
    pub company_costs_total: f64,
    /// Payouts plus company costs
    pub total_cost: f64,
    /// Gross revenue minus total cost
    pub net_revenue: f64,
    /// Net revenue over gross revenue
    pub price_margin: f64,
}

/// Compute the margin breakdown for `params`.
///
/// With `s` the cohort size:
///
/// ```text
/// eval_revenue       = eval_price × s
/// activation_revenue = activation_fee × pass_rate × s        (if enabled)
/// payout_cost        = purchase_to_payout_rate × avg_payout × s
/// fixed_costs        = (platform + data fee) × s
/// processor_fees     = processor_rate × gross_revenue
/// affiliate_fees     = affiliate_rate × (gross or eval revenue)
/// allocation_fees    = allocation_rate × gross_revenue
/// ```
///
/// # Errors
///
/// Returns the first [`ModelError`] found by
/// [`MarginParameters::validate`]; nothing is computed for invalid input.
///
/// # Examples
///
/// ```
/// use margin_core::model::calculate_margins;
/// use margin_core::types::MarginParameters;
///
/// let result = calculate_margins(&MarginParameters::default()).unwrap();
/// assert_eq!(result.gross_revenue, 100.0);
/// assert!((result.price_margin - (-1.76)).abs() < 1e-12);
/// ```
pub fn calculate_margins(params: &MarginParameters) -> Result<MarginResult, ModelError> {
    params.validate()?;

    let scale = params.cohort_scale.size();
    let costs = &params.company_costs;

    let eval_revenue = params.eval_price * scale;
    let activation_revenue = params.activation_fee.effective_amount() * params.pass_rate * scale;
    let gross_revenue = eval_revenue + activation_revenue;

    let payout_cost = params.purchase_to_payout_rate * params.avg_payout * scale;

    let fixed_costs = costs.fixed_per_account() * scale;
    let processor_fees = costs.processor_fee_rate * gross_revenue;
    let affiliate_base = if costs.affiliate_applies_to_activation {
        gross_revenue
    } else {
        eval_revenue
    };
    let affiliate_fees = costs.affiliate_fee_rate * affiliate_base;
    let allocation_fees = costs.allocation_fee_rate * gross_revenue;
    let company_costs_total = fixed_costs + processor_fees + affiliate_fees + allocation_fees;

    let total_cost = payout_cost + company_costs_total;
    let net_revenue = gross_revenue - total_cost;
    let price_margin = if gross_revenue == 0.0 {
        0.0
    } else {
        net_revenue / gross_revenue
    };

    Ok(MarginResult {
        cohort_size: scale,
        eval_revenue,
        activation_revenue,
        gross_revenue,
        payout_cost,
        fixed_costs,
        processor_fees,
        affiliate_fees,
        allocation_fees,
        company_costs_total,
        total_cost,
        net_revenue,
        price_margin,
    })
}
