//! Percent-form boundary type for parameters collected by input forms.

use serde::{Deserialize, Serialize};

use super::error::{check_percent, ModelError};
use super::params::{ActivationFee, CohortScale, CompanyCosts, MarginParameters};

/// Parameters as an input form collects them: rates in percent.
///
/// Converting into [`MarginParameters`] checks every percentage against
/// `[0, 100]`, divides by 100 and then runs the model validation.
///
/// # Examples
///
/// ```
/// use margin_core::types::{MarginInputs, MarginParameters};
///
/// let inputs = MarginInputs {
///     pass_rate_pct: 20.0,
///     funded_to_payout_pct: 50.0,
///     ..MarginInputs::default()
/// };
/// let params = MarginParameters::try_from(inputs).unwrap();
/// assert!((params.purchase_to_payout_rate - 0.10).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarginInputs {
    /// Price of one evaluation
    pub eval_price: f64,
    /// Pass rate in percent
    pub pass_rate_pct: f64,
    /// Share of passing accounts that reach a payout, in percent
    pub funded_to_payout_pct: f64,
    /// Average payout per paid-out account
    pub avg_payout: f64,
    /// Whether an activation fee is charged
    pub use_activation_fee: bool,
    /// Activation fee amount
    pub activation_fee: f64,
    /// Platform fee per account
    pub platform_fee: f64,
    /// Data fee per account
    pub data_fee: f64,
    /// Processor fee in percent of gross revenue
    pub processor_fee_pct: f64,
    /// Affiliate commission in percent
    pub affiliate_fee_pct: f64,
    /// Staffing and live-allocation cost in percent of gross revenue
    pub allocation_fee_pct: f64,
    /// Whether the affiliate commission also applies to activation revenue
    pub affiliate_on_activation: bool,
    /// Fixed cohort size, per-account figures when absent
    pub cohort_size: Option<u32>,
}

impl Default for MarginInputs {
    fn default() -> Self {
        let costs = CompanyCosts::default();
        Self {
            eval_price: 100.0,
            pass_rate_pct: 10.0,
            funded_to_payout_pct: 50.0,
            avg_payout: 5000.0,
            use_activation_fee: false,
            activation_fee: 0.0,
            platform_fee: costs.platform_fee_per_account,
            data_fee: costs.data_fee_per_account,
            processor_fee_pct: costs.processor_fee_rate * 100.0,
            affiliate_fee_pct: costs.affiliate_fee_rate * 100.0,
            allocation_fee_pct: costs.allocation_fee_rate * 100.0,
            affiliate_on_activation: costs.affiliate_applies_to_activation,
            cohort_size: None,
        }
    }
}

impl TryFrom<MarginInputs> for MarginParameters {
    type Error = ModelError;

    fn try_from(inputs: MarginInputs) -> Result<Self, Self::Error> {
        check_percent("pass_rate_pct", inputs.pass_rate_pct)?;
        check_percent("funded_to_payout_pct", inputs.funded_to_payout_pct)?;
        check_percent("processor_fee_pct", inputs.processor_fee_pct)?;
        check_percent("affiliate_fee_pct", inputs.affiliate_fee_pct)?;
        check_percent("allocation_fee_pct", inputs.allocation_fee_pct)?;

        let activation_fee = ActivationFee {
            enabled: inputs.use_activation_fee,
            amount: inputs.activation_fee,
        };
        let company_costs = CompanyCosts {
            platform_fee_per_account: inputs.platform_fee,
            data_fee_per_account: inputs.data_fee,
            processor_fee_rate: inputs.processor_fee_pct / 100.0,
            affiliate_fee_rate: inputs.affiliate_fee_pct / 100.0,
            allocation_fee_rate: inputs.allocation_fee_pct / 100.0,
            affiliate_applies_to_activation: inputs.affiliate_on_activation,
        };
        let cohort_scale = inputs
            .cohort_size
            .map_or(CohortScale::PerAccount, CohortScale::Cohort);

        let params = MarginParameters {
            eval_price: inputs.eval_price,
            activation_fee,
            company_costs,
            cohort_scale,
            avg_payout: inputs.avg_payout,
            ..MarginParameters::default()
        }
        .with_funnel(
            inputs.pass_rate_pct / 100.0,
            inputs.funded_to_payout_pct / 100.0,
        )?;

        params.validate()?;
        Ok(params)
    }
}
