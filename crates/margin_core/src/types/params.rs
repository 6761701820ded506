//! Margin model parameters.
//!
//! All rate-like fields are fractions in `[0, 1]`. The percent form used by
//! input forms lives in [`MarginInputs`](super::MarginInputs) and is
//! converted here at the boundary.

use serde::{Deserialize, Serialize};

use super::error::{check_amount, check_rate, ModelError};

/// Notional account count used to turn per-account figures into aggregates.
///
/// Every revenue and cost component is linear in the scale, so the price
/// margin does not depend on it. `PerAccount` is the canonical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortScale {
    /// One purchased evaluation (canonical).
    #[default]
    PerAccount,
    /// A fixed sample of purchased evaluations.
    Cohort(u32),
}

impl CohortScale {
    /// Number of accounts the figures are scaled to.
    pub fn size(&self) -> f64 {
        match self {
            CohortScale::PerAccount => 1.0,
            CohortScale::Cohort(n) => f64::from(*n),
        }
    }

    /// Validate the scale (a cohort must hold at least one account).
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            CohortScale::Cohort(0) => Err(ModelError::InvalidCohort),
            _ => Ok(()),
        }
    }
}

/// One-off fee charged to traders who pass the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivationFee {
    /// Whether the fee is charged at all
    pub enabled: bool,
    /// Fee amount per passing account
    pub amount: f64,
}

impl ActivationFee {
    /// No activation fee.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Charge `amount` to every passing account.
    pub fn charged(amount: f64) -> Self {
        Self {
            enabled: true,
            amount,
        }
    }

    /// Amount actually charged (0 when disabled).
    pub fn effective_amount(&self) -> f64 {
        if self.enabled {
            self.amount
        } else {
            0.0
        }
    }
}

/// Company-side costs of selling evaluations.
///
/// Fixed fees are charged per purchased account; percentage fees are
/// fractions of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyCosts {
    /// Trading platform licence per purchased account
    pub platform_fee_per_account: f64,
    /// Market data fee per purchased account
    pub data_fee_per_account: f64,
    /// Payment processor fee on gross revenue
    pub processor_fee_rate: f64,
    /// Affiliate commission (eval revenue unless extended to activation)
    pub affiliate_fee_rate: f64,
    /// Staffing and live-allocation cost on gross revenue
    pub allocation_fee_rate: f64,
    /// Whether the affiliate commission also applies to activation revenue
    pub affiliate_applies_to_activation: bool,
}

impl Default for CompanyCosts {
    /// Default cost schedule:
    /// - platform 5.00 and data 2.50 per account
    /// - processor 3.5 %, affiliate 10 %, allocation 5 %
    /// - affiliate commission on eval revenue only
    fn default() -> Self {
        Self {
            platform_fee_per_account: 5.0,
            data_fee_per_account: 2.5,
            processor_fee_rate: 0.035,
            affiliate_fee_rate: 0.10,
            allocation_fee_rate: 0.05,
            affiliate_applies_to_activation: false,
        }
    }
}

impl CompanyCosts {
    /// Cost schedule with every fee set to zero.
    pub fn zero() -> Self {
        Self {
            platform_fee_per_account: 0.0,
            data_fee_per_account: 0.0,
            processor_fee_rate: 0.0,
            affiliate_fee_rate: 0.0,
            allocation_fee_rate: 0.0,
            affiliate_applies_to_activation: false,
        }
    }

    /// Sum of the fixed per-account fees.
    pub fn fixed_per_account(&self) -> f64 {
        self.platform_fee_per_account + self.data_fee_per_account
    }

    /// Validate every fee against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_amount("platform_fee_per_account", self.platform_fee_per_account)?;
        check_amount("data_fee_per_account", self.data_fee_per_account)?;
        check_rate("processor_fee_rate", self.processor_fee_rate)?;
        check_rate("affiliate_fee_rate", self.affiliate_fee_rate)?;
        check_rate("allocation_fee_rate", self.allocation_fee_rate)?;
        Ok(())
    }
}

/// Inputs of the margin model.
///
/// `Default` is a typical single-account scenario: price 100, pass rate
/// 10 %, purchase-to-payout rate 5 %, average payout 5000, no activation
/// fee and the default cost schedule.
///
/// # Examples
///
/// ```
/// use margin_core::types::MarginParameters;
///
/// let params = MarginParameters::new(150.0, 0.04, 4000.0)
///     .with_funnel(0.2, 0.25)
///     .unwrap();
/// assert!((params.purchase_to_payout_rate - 0.05).abs() < 1e-12);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginParameters {
    /// Price of one evaluation
    pub eval_price: f64,
    /// Fraction of purchased evaluations that pass
    pub pass_rate: f64,
    /// Fraction of purchased evaluations that end in a payout
    pub purchase_to_payout_rate: f64,
    /// Average payout per paid-out account
    pub avg_payout: f64,
    /// Activation fee charged to passing accounts
    pub activation_fee: ActivationFee,
    /// Company-side cost schedule
    pub company_costs: CompanyCosts,
    /// Aggregation scale of the result
    pub cohort_scale: CohortScale,
}

impl Default for MarginParameters {
    fn default() -> Self {
        Self {
            eval_price: 100.0,
            pass_rate: 0.10,
            purchase_to_payout_rate: 0.05,
            avg_payout: 5000.0,
            activation_fee: ActivationFee::disabled(),
            company_costs: CompanyCosts::default(),
            cohort_scale: CohortScale::PerAccount,
        }
    }
}

impl MarginParameters {
    /// Create parameters from the three headline figures, defaults elsewhere.
    pub fn new(eval_price: f64, purchase_to_payout_rate: f64, avg_payout: f64) -> Self {
        Self {
            eval_price,
            purchase_to_payout_rate,
            avg_payout,
            ..Self::default()
        }
    }

    /// Set pass rate and derive the purchase-to-payout rate from the funded
    /// rate (`pass_rate × funded_rate`).
    pub fn with_funnel(mut self, pass_rate: f64, funded_rate: f64) -> Result<Self, ModelError> {
        check_rate("pass_rate", pass_rate)?;
        check_rate("funded_rate", funded_rate)?;
        self.pass_rate = pass_rate;
        self.purchase_to_payout_rate = pass_rate * funded_rate;
        Ok(self)
    }

    /// Set the evaluation price.
    pub fn with_eval_price(mut self, eval_price: f64) -> Self {
        self.eval_price = eval_price;
        self
    }

    /// Set the pass rate without touching the purchase-to-payout rate.
    pub fn with_pass_rate(mut self, pass_rate: f64) -> Self {
        self.pass_rate = pass_rate;
        self
    }

    /// Set the purchase-to-payout rate directly.
    pub fn with_purchase_to_payout_rate(mut self, rate: f64) -> Self {
        self.purchase_to_payout_rate = rate;
        self
    }

    /// Set the average payout.
    pub fn with_avg_payout(mut self, avg_payout: f64) -> Self {
        self.avg_payout = avg_payout;
        self
    }

    /// Set the activation fee.
    pub fn with_activation_fee(mut self, activation_fee: ActivationFee) -> Self {
        self.activation_fee = activation_fee;
        self
    }

    /// Set the company cost schedule.
    pub fn with_company_costs(mut self, company_costs: CompanyCosts) -> Self {
        self.company_costs = company_costs;
        self
    }

    /// Set the cohort scale.
    pub fn with_cohort_scale(mut self, cohort_scale: CohortScale) -> Self {
        self.cohort_scale = cohort_scale;
        self
    }

    /// Validate every field against its documented domain.
    ///
    /// Fields are checked in declaration order and the first failure is
    /// returned.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_amount("eval_price", self.eval_price)?;
        check_rate("pass_rate", self.pass_rate)?;
        check_rate("purchase_to_payout_rate", self.purchase_to_payout_rate)?;
        check_amount("avg_payout", self.avg_payout)?;
        check_amount("activation_fee", self.activation_fee.amount)?;
        self.company_costs.validate()?;
        self.cohort_scale.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // CohortScale Tests
    // ========================================

    #[test]
    fn test_cohort_scale_size() {
        assert_eq!(CohortScale::PerAccount.size(), 1.0);
        assert_eq!(CohortScale::Cohort(1000).size(), 1000.0);
    }

    #[test]
    fn test_empty_cohort_rejected() {
        assert_eq!(
            CohortScale::Cohort(0).validate(),
            Err(ModelError::InvalidCohort)
        );
        assert!(CohortScale::Cohort(1).validate().is_ok());
    }

    // ========================================
    // ActivationFee Tests
    // ========================================

    #[test]
    fn test_activation_fee_effective_amount() {
        assert_eq!(ActivationFee::disabled().effective_amount(), 0.0);
        assert_eq!(ActivationFee::charged(80.0).effective_amount(), 80.0);

        let switched_off = ActivationFee {
            enabled: false,
            amount: 80.0,
        };
        assert_eq!(switched_off.effective_amount(), 0.0);
    }

    // ========================================
    // MarginParameters Tests
    // ========================================

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(MarginParameters::default().validate().is_ok());
        assert!(CompanyCosts::zero().validate().is_ok());
    }

    #[test]
    fn test_with_funnel_derives_rate() {
        let params = MarginParameters::default().with_funnel(0.2, 0.4).unwrap();
        assert_relative_eq!(params.pass_rate, 0.2);
        assert_relative_eq!(params.purchase_to_payout_rate, 0.08);
    }

    #[test]
    fn test_with_funnel_rejects_bad_rates() {
        let err = MarginParameters::default().with_funnel(0.1, 2.0).unwrap_err();
        assert_eq!(err, ModelError::rate_out_of_range("funded_rate", 2.0));
    }

    #[test]
    fn test_validate_reports_first_failure() {
        let params = MarginParameters::default()
            .with_eval_price(-1.0)
            .with_avg_payout(f64::NAN);
        assert_eq!(
            params.validate(),
            Err(ModelError::negative("eval_price", -1.0))
        );
    }

    #[test]
    fn test_validate_rejects_each_domain() {
        let base = MarginParameters::default();

        let bad_rate = base.with_purchase_to_payout_rate(1.2);
        assert_eq!(
            bad_rate.validate().unwrap_err().field(),
            Some("purchase_to_payout_rate")
        );

        let bad_payout = base.with_avg_payout(f64::INFINITY);
        assert_eq!(
            bad_payout.validate(),
            Err(ModelError::non_finite("avg_payout"))
        );

        let bad_fee = base.with_activation_fee(ActivationFee::charged(-5.0));
        assert_eq!(
            bad_fee.validate().unwrap_err().field(),
            Some("activation_fee")
        );

        let costs = CompanyCosts {
            affiliate_fee_rate: 1.5,
            ..CompanyCosts::default()
        };
        assert_eq!(
            base.with_company_costs(costs).validate().unwrap_err().field(),
            Some("affiliate_fee_rate")
        );

        let empty = base.with_cohort_scale(CohortScale::Cohort(0));
        assert_eq!(empty.validate(), Err(ModelError::InvalidCohort));
    }

    #[test]
    fn test_fixed_per_account() {
        assert_relative_eq!(CompanyCosts::default().fixed_per_account(), 7.5);
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let params: MarginParameters =
            serde_json::from_str(r#"{"eval_price": 250.0, "cohort_scale": {"cohort": 500}}"#)
                .unwrap();
        assert_relative_eq!(params.eval_price, 250.0);
        assert_relative_eq!(params.avg_payout, 5000.0);
        assert_eq!(params.cohort_scale, CohortScale::Cohort(500));
    }
}
