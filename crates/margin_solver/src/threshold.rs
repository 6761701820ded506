//! Single-variable threshold search.
//!
//! Finds the value of one [`MarginVariable`] at which margin reaches a
//! target while every other parameter stays fixed. The search:
//!
//! 1. derives bounds from the variable's current value (or takes the
//!    caller's),
//! 2. probes margin at 1 % and 2 % into the bounds to infer a
//!    [`Direction`],
//! 3. bisects, keeping the closest point seen.
//!
//! An unattainable target yields the best in-bounds approximation with
//! `converged = false`; `None` means no finite margin was ever computed.

use margin_core::model::MarginDefinition;
use margin_core::types::{MarginParameters, MarginVariable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bisection::{bisect, Direction};
use crate::config::ThresholdConfig;
use crate::error::{check_range, SolverError};
use crate::sampler::lerp;

/// Heuristic search bounds for `variable` around its current value.
///
/// | Variable | Bounds |
/// |----------|--------|
/// | Eval price | `[0.1 × current, 2 × current]` |
/// | Purchase-to-payout rate | `[0, 1]` |
/// | Avg payout | `[max(500, 0.1 × current), max(5000, 10 × current)]` |
pub fn default_bounds(variable: MarginVariable, current: f64) -> (f64, f64) {
    match variable {
        MarginVariable::EvalPrice => (current * 0.1, current * 2.0),
        MarginVariable::PurchaseToPayoutRate => (0.0, 1.0),
        MarginVariable::AvgPayout => ((current * 0.1).max(500.0), (current * 10.0).max(5000.0)),
    }
}

/// A threshold request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdQuery {
    /// Variable to move
    pub variable: MarginVariable,
    /// Target margin as a fraction
    pub target: f64,
    /// Search bounds, [`default_bounds`] when absent
    pub bounds: Option<(f64, f64)>,
    /// Margin tolerance, the configured one when absent
    pub tolerance: Option<f64>,
}

impl ThresholdQuery {
    /// Query with heuristic bounds and the configured tolerance.
    pub fn new(variable: MarginVariable, target: f64) -> Self {
        Self {
            variable,
            target,
            bounds: None,
            tolerance: None,
        }
    }

    /// Override the search bounds.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Override the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// Outcome of a threshold search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSolution {
    /// Variable value found
    pub value: f64,
    /// Margin at `value`
    pub achieved_margin: f64,
    /// Whether `achieved_margin` is within tolerance of the target
    pub converged: bool,
    /// Bisection midpoints evaluated
    pub iterations: usize,
    /// Inferred response of margin to the variable
    pub direction: Direction,
    /// Bounds that were searched
    pub bounds: (f64, f64),
}

/// Threshold solver.
///
/// # Examples
///
/// ```
/// use margin_core::model::MarginDefinition;
/// use margin_core::types::{MarginParameters, MarginVariable};
/// use margin_solver::threshold::ThresholdSolver;
///
/// let solver = ThresholdSolver::with_defaults();
/// let solution = solver
///     .solve_for(
///         MarginVariable::AvgPayout,
///         &MarginParameters::default(),
///         &MarginDefinition::Standard,
///         0.0,
///     )
///     .unwrap()
///     .unwrap();
/// assert!(solution.converged);
/// assert!((solution.value - 1480.0).abs() < 5.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdSolver {
    config: ThresholdConfig,
}

impl ThresholdSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Create a solver with the default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Solver configuration.
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Search `bounds` for `f(x) == target`.
    ///
    /// Returns `None` only when no finite margin was computed.
    pub fn find_threshold<F>(
        &self,
        f: F,
        target: f64,
        bounds: (f64, f64),
    ) -> Option<ThresholdSolution>
    where
        F: Fn(f64) -> f64,
    {
        let (lo, hi) = bounds;
        let (first, second) = self.config.probe_fractions;
        let direction = Direction::from_probes(f(lerp(lo, hi, first)), f(lerp(lo, hi, second)));

        let outcome = bisect(&f, target, bounds, direction, &self.config.bisection);
        let Some(best) = outcome.best else {
            debug!(target, lo, hi, "threshold search found no finite margin");
            return None;
        };

        debug!(
            target,
            value = best.x,
            margin = best.margin,
            converged = outcome.converged,
            iterations = outcome.iterations,
            "threshold search finished"
        );

        Some(ThresholdSolution {
            value: best.x,
            achieved_margin: best.margin,
            converged: outcome.converged,
            iterations: outcome.iterations,
            direction,
            bounds,
        })
    }

    /// Solve `query` for `params` under `definition`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::Model`] if `params` or `definition` are invalid
    /// - [`SolverError::InvalidRange`] for non-finite or reversed bounds
    /// - [`SolverError::Config`] for a non-positive tolerance override
    pub fn solve(
        &self,
        query: &ThresholdQuery,
        params: &MarginParameters,
        definition: &MarginDefinition,
    ) -> Result<Option<ThresholdSolution>, SolverError> {
        definition.evaluate(params)?;

        let bounds = query
            .bounds
            .unwrap_or_else(|| default_bounds(query.variable, query.variable.current(params)));
        check_range(bounds, true)?;

        let mut config = self.config;
        if let Some(tolerance) = query.tolerance {
            config.bisection = config.bisection.with_tolerance(tolerance);
            config.bisection.validate("threshold")?;
        }

        debug!(variable = %query.variable, target = query.target, ?bounds, "solving threshold");
        let f = definition.margin_fn(params, query.variable);
        Ok(Self::new(config).find_threshold(f, query.target, bounds))
    }

    /// Solve for `variable` with heuristic bounds.
    pub fn solve_for(
        &self,
        variable: MarginVariable,
        params: &MarginParameters,
        definition: &MarginDefinition,
        target: f64,
    ) -> Result<Option<ThresholdSolution>, SolverError> {
        self.solve(&ThresholdQuery::new(variable, target), params, definition)
    }
}

/// Find the value of `variable` at which `margin_fn` reaches `target`.
///
/// Bounds come from [`default_bounds`] around `current_value`.
///
/// # Examples
///
/// ```
/// use margin_core::types::MarginVariable;
/// use margin_solver::config::ThresholdConfig;
/// use margin_solver::threshold::find_threshold_value;
///
/// // Margin falls linearly with the payout rate
/// let solution = find_threshold_value(
///     MarginVariable::PurchaseToPayoutRate,
///     |rate| 0.74 - 50.0 * rate,
///     0.24,
///     0.05,
///     &ThresholdConfig::default(),
/// )
/// .unwrap();
/// assert!((solution.value - 0.01).abs() < 1e-4);
/// ```
pub fn find_threshold_value<F>(
    variable: MarginVariable,
    margin_fn: F,
    target: f64,
    current_value: f64,
    config: &ThresholdConfig,
) -> Option<ThresholdSolution>
where
    F: Fn(f64) -> f64,
{
    let bounds = default_bounds(variable, current_value);
    ThresholdSolver::new(*config).find_threshold(margin_fn, target, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BisectionConfig;
    use approx::assert_abs_diff_eq;
    use margin_core::types::ModelError;

    fn golden() -> MarginParameters {
        MarginParameters::new(100.0, 0.05, 5000.0).with_pass_rate(0.10)
    }

    // ========================================
    // Bounds
    // ========================================

    #[test]
    fn test_default_bounds() {
        assert_eq!(default_bounds(MarginVariable::EvalPrice, 100.0), (10.0, 200.0));
        assert_eq!(
            default_bounds(MarginVariable::PurchaseToPayoutRate, 0.3),
            (0.0, 1.0)
        );
        assert_eq!(default_bounds(MarginVariable::AvgPayout, 5000.0), (500.0, 50000.0));
        assert_eq!(default_bounds(MarginVariable::AvgPayout, 100.0), (500.0, 5000.0));
        assert_eq!(
            default_bounds(MarginVariable::AvgPayout, 20000.0),
            (2000.0, 200000.0)
        );
    }

    // ========================================
    // Golden Searches
    // ========================================

    #[test]
    fn test_eval_price_unattainable_returns_best_approximation() {
        // margin(p) = 0.815 - 257.5 / p stays below 0.5 on [10, 200]
        let solution = ThresholdSolver::with_defaults()
            .solve_for(
                MarginVariable::EvalPrice,
                &golden(),
                &MarginDefinition::Standard,
                0.5,
            )
            .unwrap()
            .expect("best approximation");

        assert!(!solution.converged);
        assert_eq!(solution.direction, Direction::Increasing);
        assert_abs_diff_eq!(solution.value, 200.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.achieved_margin, 0.815 - 257.5 / 200.0, epsilon = 1e-6);
        assert_eq!(solution.iterations, 100);
    }

    #[test]
    fn test_eval_price_attainable() {
        let solution = ThresholdSolver::with_defaults()
            .solve_for(
                MarginVariable::EvalPrice,
                &golden(),
                &MarginDefinition::Standard,
                -1.0,
            )
            .unwrap()
            .unwrap();

        assert!(solution.converged);
        assert_abs_diff_eq!(solution.achieved_margin, -1.0, epsilon = 0.001);
        assert_abs_diff_eq!(solution.value, 257.5 / 1.815, epsilon = 0.1);
    }

    #[test]
    fn test_avg_payout_is_decreasing() {
        let solution = ThresholdSolver::with_defaults()
            .solve_for(
                MarginVariable::AvgPayout,
                &golden(),
                &MarginDefinition::Standard,
                0.0,
            )
            .unwrap()
            .unwrap();

        assert_eq!(solution.direction, Direction::Decreasing);
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.value, 1480.0, epsilon = 2.5);
    }

    #[test]
    fn test_avg_payout_below_bounds() {
        // 0.5 needs a payout of 480, below the 500 floor
        let solution = ThresholdSolver::with_defaults()
            .solve_for(
                MarginVariable::AvgPayout,
                &golden(),
                &MarginDefinition::Standard,
                0.5,
            )
            .unwrap()
            .unwrap();

        assert!(!solution.converged);
        assert_abs_diff_eq!(solution.value, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_combined_definition_shifts_threshold() {
        let solver = ThresholdSolver::with_defaults();
        let standard = solver
            .solve_for(
                MarginVariable::AvgPayout,
                &golden(),
                &MarginDefinition::Standard,
                0.0,
            )
            .unwrap()
            .unwrap();
        let combined = solver
            .solve_for(
                MarginVariable::AvgPayout,
                &golden(),
                &MarginDefinition::combined(50.0),
                0.0,
            )
            .unwrap()
            .unwrap();
        assert!(combined.value > standard.value);
    }

    // ========================================
    // Query Overrides
    // ========================================

    #[test]
    fn test_bounds_and_tolerance_override() {
        let query = ThresholdQuery::new(MarginVariable::EvalPrice, -1.0)
            .with_bounds(100.0, 300.0)
            .with_tolerance(1e-8);
        let solution = ThresholdSolver::with_defaults()
            .solve(&query, &golden(), &MarginDefinition::Standard)
            .unwrap()
            .unwrap();
        assert!(solution.converged);
        assert_eq!(solution.bounds, (100.0, 300.0));
        assert_abs_diff_eq!(solution.achieved_margin, -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_invalid_tolerance_override() {
        let query = ThresholdQuery::new(MarginVariable::EvalPrice, 0.0).with_tolerance(0.0);
        let err = ThresholdSolver::with_defaults()
            .solve(&query, &golden(), &MarginDefinition::Standard)
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_bounds() {
        let query =
            ThresholdQuery::new(MarginVariable::EvalPrice, 0.0).with_bounds(200.0, f64::NAN);
        let err = ThresholdSolver::with_defaults()
            .solve(&query, &golden(), &MarginDefinition::Standard)
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidRange { .. }));
    }

    #[test]
    fn test_invalid_params_are_reported() {
        let params = golden().with_avg_payout(-1.0);
        let err = ThresholdSolver::with_defaults()
            .solve_for(
                MarginVariable::EvalPrice,
                &params,
                &MarginDefinition::Standard,
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, SolverError::Model(ModelError::negative("avg_payout", -1.0)));
    }

    // ========================================
    // Non-finite Handling
    // ========================================

    #[test]
    fn test_no_finite_margin_returns_none() {
        let solver = ThresholdSolver::with_defaults();
        assert!(solver.find_threshold(|_| f64::NAN, 0.0, (0.0, 1.0)).is_none());
    }

    #[test]
    fn test_bounds_wider_than_f64_max() {
        let solver = ThresholdSolver::with_defaults();
        let solution = solver
            .find_threshold(|x| 1.0 - x / 1e308, 0.25, (-1e308, 1e308))
            .unwrap();
        assert_eq!(solution.direction, Direction::Decreasing);
        assert!(solution.converged);
        assert!(solution.value.is_finite());
        assert_abs_diff_eq!(solution.achieved_margin, 0.25, epsilon = 0.001);
    }

    #[test]
    fn test_non_finite_probes_assume_increasing() {
        let solver = ThresholdSolver::new(ThresholdConfig {
            bisection: BisectionConfig::new(1e-6, 100),
            ..ThresholdConfig::default()
        });
        // Probes land below 0.05 and evaluate to NaN
        let f = |x: f64| if x < 0.05 { f64::NAN } else { x };
        let solution = solver.find_threshold(f, 0.7, (0.0, 1.0)).unwrap();
        assert_eq!(solution.direction, Direction::Increasing);
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.value, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_free_function_matches_solver() {
        let params = golden();
        let definition = MarginDefinition::Standard;
        let f = definition.margin_fn(&params, MarginVariable::AvgPayout);
        let config = ThresholdConfig::default();
        let free = find_threshold_value(MarginVariable::AvgPayout, f, 0.2, 5000.0, &config);
        let solved = ThresholdSolver::with_defaults()
            .solve_for(MarginVariable::AvgPayout, &params, &definition, 0.2)
            .unwrap();
        assert_eq!(free, solved);
    }

    // ========================================
    // Property-Based Tests
    // ========================================

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn test_attainable_price_target_is_hit(
                price in 10.0..2000.0f64,
                payout in 500.0..20_000.0f64,
                p2p in 0.0..0.2f64,
                fraction in 0.05..0.95f64,
            ) {
                let params = MarginParameters::new(price, p2p, payout);
                let definition = MarginDefinition::Standard;
                let f = definition.margin_fn(&params, MarginVariable::EvalPrice);
                let (lo, hi) = default_bounds(MarginVariable::EvalPrice, price);
                let target = f(lo + (hi - lo) * fraction);

                let solution = ThresholdSolver::with_defaults()
                    .solve_for(MarginVariable::EvalPrice, &params, &definition, target)
                    .unwrap()
                    .unwrap();
                prop_assert!(solution.converged);
                prop_assert!((f(solution.value) - target).abs() <= 0.001);
                prop_assert!(solution.value >= lo && solution.value <= hi);
            }

            #[test]
            fn test_solution_stays_within_bounds(
                target in -5.0..1.0f64,
                payout in 0.0..50_000.0f64,
            ) {
                let params = MarginParameters::default().with_avg_payout(payout);
                let solution = ThresholdSolver::with_defaults()
                    .solve_for(
                        MarginVariable::AvgPayout,
                        &params,
                        &MarginDefinition::Standard,
                        target,
                    )
                    .unwrap()
                    .unwrap();
                let (lo, hi) = solution.bounds;
                prop_assert!(solution.value >= lo && solution.value <= hi);
                prop_assert!(solution.achieved_margin.is_finite());
            }
        }
    }
}
