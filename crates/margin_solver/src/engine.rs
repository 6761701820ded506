//! Engine facade binding a margin definition to solver configuration.
//!
//! [`MarginEngine`] is what a chart or report layer talks to: it produces the
//! margin breakdown, threshold panels, chart series and contour traces for a
//! [`MarginParameters`] value, optionally through a caller-owned
//! [`SolveCache`].

use margin_core::model::{calculate_margins, MarginDefinition, MarginResult};
use margin_core::types::{MarginParameters, MarginVariable, ModelError};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, SolveCache};
use crate::config::EngineConfig;
use crate::contour::{ContourQuery, ContourSolver, ContourTrace};
use crate::error::SolverError;
use crate::sampler::{AdaptiveSampler, Sample};
use crate::threshold::{ThresholdQuery, ThresholdSolution, ThresholdSolver};

/// One row of a threshold panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    /// Variable solved for
    pub variable: MarginVariable,
    /// Its value in the base parameters
    pub current_value: f64,
    /// Threshold, `None` when no finite margin was found
    pub solution: Option<ThresholdSolution>,
}

#[derive(Serialize)]
struct SeriesQuery {
    variable: MarginVariable,
    range: (f64, f64),
    target: f64,
}

/// Margin engine.
///
/// # Examples
///
/// ```
/// use margin_core::types::{MarginParameters, MarginVariable};
/// use margin_solver::MarginEngine;
///
/// let engine = MarginEngine::standard();
/// let params = MarginParameters::default();
///
/// assert!((engine.margin(&params).unwrap() + 1.76).abs() < 1e-12);
///
/// let panel = engine.threshold_panel(&params, 0.0).unwrap();
/// assert_eq!(panel.len(), 3);
///
/// let series = engine
///     .chart_series(&params, MarginVariable::EvalPrice, (50.0, 500.0), 0.0)
///     .unwrap();
/// assert!(series.windows(2).all(|w| w[0].x < w[1].x));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MarginEngine {
    definition: MarginDefinition,
    config: EngineConfig,
    threshold: ThresholdSolver,
    sampler: AdaptiveSampler,
    contour: ContourSolver,
}

impl MarginEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// - [`SolverError::Config`] if `config` fails validation
    /// - [`SolverError::Model`] if `definition` is invalid
    pub fn new(definition: MarginDefinition, config: EngineConfig) -> Result<Self, SolverError> {
        config.validate()?;
        definition.validate()?;
        Ok(Self {
            definition,
            config,
            threshold: ThresholdSolver::new(config.threshold),
            sampler: AdaptiveSampler::new(config.sampler),
            contour: ContourSolver::new(config.contour),
        })
    }

    /// Standard margin with the default configuration.
    pub fn standard() -> Self {
        let config = EngineConfig::default();
        Self {
            definition: MarginDefinition::Standard,
            config,
            threshold: ThresholdSolver::new(config.threshold),
            sampler: AdaptiveSampler::new(config.sampler),
            contour: ContourSolver::new(config.contour),
        }
    }

    /// Margin definition.
    pub fn definition(&self) -> &MarginDefinition {
        &self.definition
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full margin breakdown.
    pub fn evaluate(&self, params: &MarginParameters) -> Result<MarginResult, ModelError> {
        calculate_margins(params)
    }

    /// Margin under the engine's definition.
    pub fn margin(&self, params: &MarginParameters) -> Result<f64, ModelError> {
        self.definition.evaluate(params)
    }

    /// Threshold of `variable` for `target` with heuristic bounds.
    pub fn threshold(
        &self,
        params: &MarginParameters,
        variable: MarginVariable,
        target: f64,
    ) -> Result<Option<ThresholdSolution>, SolverError> {
        self.solve_threshold(params, &ThresholdQuery::new(variable, target))
    }

    /// Threshold for an explicit query.
    pub fn solve_threshold(
        &self,
        params: &MarginParameters,
        query: &ThresholdQuery,
    ) -> Result<Option<ThresholdSolution>, SolverError> {
        self.threshold.solve(query, params, &self.definition)
    }

    /// Threshold of every [`MarginVariable`] for `target`.
    pub fn threshold_panel(
        &self,
        params: &MarginParameters,
        target: f64,
    ) -> Result<Vec<ThresholdRow>, SolverError> {
        MarginVariable::ALL
            .iter()
            .map(|&variable| {
                Ok(ThresholdRow {
                    variable,
                    current_value: variable.current(params),
                    solution: self.threshold(params, variable, target)?,
                })
            })
            .collect()
    }

    /// Adaptive margin series of `variable` over `range`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::Model`] if `params` are invalid
    /// - [`SolverError::InvalidRange`] if a bound is non-finite
    pub fn chart_series(
        &self,
        params: &MarginParameters,
        variable: MarginVariable,
        range: (f64, f64),
        target: f64,
    ) -> Result<Vec<Sample>, SolverError> {
        self.definition.evaluate(params)?;
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(SolverError::invalid_range(range.0, range.1));
        }
        let f = self.definition.margin_fn(params, variable);
        Ok(self.sampler.sample_series(range.0, range.1, f, target))
    }

    /// Contour of `target` over `(x_variable, y_variable)`.
    pub fn contour(
        &self,
        params: &MarginParameters,
        x_variable: MarginVariable,
        y_variable: MarginVariable,
        target: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Result<ContourTrace, SolverError> {
        let query = ContourQuery {
            x_variable,
            y_variable,
            target,
            x_range,
            y_range,
        };
        self.contour.solve(&query, params, &self.definition)
    }

    /// [`MarginEngine::threshold`] through `cache`.
    ///
    /// The cache is first synchronised to `params`.
    pub fn threshold_cached(
        &self,
        cache: &mut SolveCache,
        params: &MarginParameters,
        variable: MarginVariable,
        target: f64,
    ) -> Result<Option<ThresholdSolution>, SolverError> {
        cache.sync_base(params);
        let query = ThresholdQuery::new(variable, target);
        let key = CacheKey::new(
            "threshold",
            &query,
            params,
            &self.definition,
            &self.config.threshold,
        )?;
        cache.threshold(key, || self.solve_threshold(params, &query))
    }

    /// [`MarginEngine::chart_series`] through `cache`.
    pub fn chart_series_cached(
        &self,
        cache: &mut SolveCache,
        params: &MarginParameters,
        variable: MarginVariable,
        range: (f64, f64),
        target: f64,
    ) -> Result<Vec<Sample>, SolverError> {
        cache.sync_base(params);
        let query = SeriesQuery {
            variable,
            range,
            target,
        };
        let key = CacheKey::new("series", &query, params, &self.definition, &self.config.sampler)?;
        cache.series(key, || self.chart_series(params, variable, range, target))
    }

    /// [`MarginEngine::contour`] through `cache`.
    #[allow(clippy::too_many_arguments)]
    pub fn contour_cached(
        &self,
        cache: &mut SolveCache,
        params: &MarginParameters,
        x_variable: MarginVariable,
        y_variable: MarginVariable,
        target: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Result<ContourTrace, SolverError> {
        cache.sync_base(params);
        let query = ContourQuery {
            x_variable,
            y_variable,
            target,
            x_range,
            y_range,
        };
        let key = CacheKey::new("contour", &query, params, &self.definition, &self.config.contour)?;
        cache.contour(key, || self.contour.solve(&query, params, &self.definition))
    }
}

impl Default for MarginEngine {
    fn default() -> Self {
        Self::standard()
    }
}
