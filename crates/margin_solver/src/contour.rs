//! Iso-margin contour tracing over two variables.
//!
//! ## Column pass
//!
//! For each of `x_steps` columns the margin is evaluated at both ends of the
//! y range. A sign change of `margin - target` (or an exact zero) brackets a
//! root, which is bisected with the shared [`crate::bisection`] discipline.
//! Columns without a bracket contribute nothing: gaps are expected where the
//! surface never crosses the target.
//!
//! ## Grid fallback
//!
//! When fewer than `min_points` columns produce a point, an
//! `grid_resolution × grid_resolution` scan collects every grid point within
//! `grid_tolerance` of the target. Candidates are merged after the column
//! points in order of increasing residual, skipping any that lie within
//! `dedup_fraction` of both axis spans of a kept point.
//!
//! ## Parallelism
//!
//! With the `parallel` feature (default) columns and grid rows are evaluated
//! with rayon. Results are collected in index order, so the trace is the same
//! with or without the feature.

use margin_core::model::MarginDefinition;
use margin_core::types::{MarginParameters, MarginVariable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bisection::{bisect, Direction};
use crate::config::ContourConfig;
use crate::error::{check_range, SolverError};
use crate::sampler::linspace;

/// A point on the contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    /// X-axis value
    pub x: f64,
    /// Y-axis value
    pub y: f64,
    /// Margin at `(x, y)`
    pub margin: f64,
}

impl ContourPoint {
    /// `|margin - target|`
    pub fn residual(&self, target: f64) -> f64 {
        (self.margin - target).abs()
    }
}

/// How the points of a trace were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourMethod {
    /// Column bisection alone
    ColumnBisection,
    /// Column bisection topped up by the grid scan
    GridFallback,
}

/// Result of a contour trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourTrace {
    /// Points sorted by `x`
    pub points: Vec<ContourPoint>,
    /// How the points were found
    pub method: ContourMethod,
    /// Margin tolerance every point satisfies
    pub tolerance: f64,
    /// Points contributed by the column pass
    pub column_points: usize,
}

impl ContourTrace {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point was found.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A contour request over two model variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourQuery {
    /// Variable on the x axis
    pub x_variable: MarginVariable,
    /// Variable on the y axis
    pub y_variable: MarginVariable,
    /// Target margin
    pub target: f64,
    /// X-axis range
    pub x_range: (f64, f64),
    /// Y-axis range
    pub y_range: (f64, f64),
}

/// Contour solver.
///
/// # Examples
///
/// ```
/// use margin_solver::contour::ContourSolver;
///
/// // x + y = 1 on the unit square
/// let trace = ContourSolver::table()
///     .trace(|x, y| x + y, 1.0, (0.0, 1.0), (0.0, 1.0))
///     .unwrap();
/// assert_eq!(trace.len(), 50);
/// assert!(trace.points.iter().all(|p| (p.x + p.y - 1.0).abs() <= trace.tolerance));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourSolver {
    config: ContourConfig,
}

impl ContourSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: ContourConfig) -> Self {
        Self { config }
    }

    /// Solver with the default (chart) configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Solver with [`ContourConfig::table`].
    pub fn table() -> Self {
        Self::new(ContourConfig::table())
    }

    /// Solver with [`ContourConfig::chart`].
    pub fn chart() -> Self {
        Self::new(ContourConfig::chart())
    }

    /// Solver configuration.
    pub fn config(&self) -> &ContourConfig {
        &self.config
    }

    /// Bisect one column for `f(x, y) == target`.
    ///
    /// Returns `None` when the column is not bracketed, an evaluation is
    /// non-finite, or bisection ends outside tolerance.
    pub fn solve_column<F>(
        &self,
        f: &F,
        x: f64,
        target: f64,
        y_range: (f64, f64),
    ) -> Option<ContourPoint>
    where
        F: Fn(f64, f64) -> f64,
    {
        let (y_min, y_max) = y_range;
        let at_min = f(x, y_min);
        let at_max = f(x, y_max);
        if !at_min.is_finite() || !at_max.is_finite() {
            return None;
        }

        let g_min = at_min - target;
        let g_max = at_max - target;
        if g_min == 0.0 {
            return Some(ContourPoint {
                x,
                y: y_min,
                margin: at_min,
            });
        }
        if g_max == 0.0 {
            return Some(ContourPoint {
                x,
                y: y_max,
                margin: at_max,
            });
        }
        if g_min.signum() == g_max.signum() {
            return None;
        }

        let direction = Direction::from_probes(g_min, g_max);
        let outcome = bisect(|y| f(x, y), target, y_range, direction, &self.config.bisection);
        if outcome.aborted {
            return None;
        }
        outcome
            .best
            .filter(|best| best.residual <= self.config.bisection.tolerance)
            .map(|best| ContourPoint {
                x,
                y: best.x,
                margin: best.margin,
            })
    }

    /// Grid points within `grid_tolerance` of `target`, row by row in `x`.
    pub fn grid_scan<F>(
        &self,
        f: &F,
        target: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Vec<ContourPoint>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        let n = self.config.grid_resolution;
        let xs = linspace(x_range.0, x_range.1, n);
        let ys = linspace(y_range.0, y_range.1, n);
        let tolerance = self.config.grid_tolerance;

        let row = |x: f64| -> Vec<ContourPoint> {
            ys.iter()
                .filter_map(|&y| {
                    let margin = f(x, y);
                    (margin.is_finite() && (margin - target).abs() <= tolerance)
                        .then_some(ContourPoint { x, y, margin })
                })
                .collect()
        };

        map_ordered(&xs, row).into_iter().flatten().collect()
    }

    /// Trace the `target` contour of `f` over the two ranges.
    ///
    /// # Errors
    ///
    /// - [`SolverError::InvalidRange`] for non-finite or empty ranges
    /// - [`SolverError::Config`] for an invalid configuration
    pub fn trace<F>(
        &self,
        f: F,
        target: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Result<ContourTrace, SolverError>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        check_range(x_range, false)?;
        check_range(y_range, false)?;
        self.config.validate()?;

        let xs = linspace(x_range.0, x_range.1, self.config.x_steps);
        let column_points: Vec<ContourPoint> =
            map_ordered(&xs, |x| self.solve_column(&f, x, target, y_range))
                .into_iter()
                .flatten()
                .collect();
        let column_count = column_points.len();

        if column_count >= self.config.min_points {
            debug!(target, columns = column_count, fallback = false, "contour traced");
            return Ok(ContourTrace {
                points: column_points,
                method: ContourMethod::ColumnBisection,
                tolerance: self.config.bisection.tolerance,
                column_points: column_count,
            });
        }

        let mut candidates = self.grid_scan(&f, target, x_range, y_range);
        candidates.sort_by(|a, b| a.residual(target).total_cmp(&b.residual(target)));

        let dx = self.config.dedup_fraction * (x_range.1 - x_range.0);
        let dy = self.config.dedup_fraction * (y_range.1 - y_range.0);
        let mut points = column_points;
        for candidate in candidates {
            let crowded = points
                .iter()
                .any(|kept| (kept.x - candidate.x).abs() < dx && (kept.y - candidate.y).abs() < dy);
            if !crowded {
                points.push(candidate);
            }
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

        debug!(
            target,
            columns = column_count,
            points = points.len(),
            fallback = true,
            "contour traced"
        );
        if points.is_empty() {
            warn!(target, ?x_range, ?y_range, "no contour points found");
        }

        Ok(ContourTrace {
            points,
            method: ContourMethod::GridFallback,
            tolerance: self.config.bisection.tolerance.max(self.config.grid_tolerance),
            column_points: column_count,
        })
    }

    /// Trace `query` over the margin surface of `params` under `definition`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::DegenerateAxes`] when both axes name one variable
    /// - [`SolverError::Model`] when `params` or `definition` are invalid
    /// - the errors of [`ContourSolver::trace`]
    pub fn solve(
        &self,
        query: &ContourQuery,
        params: &MarginParameters,
        definition: &MarginDefinition,
    ) -> Result<ContourTrace, SolverError> {
        if query.x_variable == query.y_variable {
            return Err(SolverError::DegenerateAxes {
                variable: query.x_variable,
            });
        }
        definition.evaluate(params)?;

        let surface = definition.surface_fn(params, query.x_variable, query.y_variable);
        self.trace(surface, query.target, query.x_range, query.y_range)
    }
}

/// Trace the standard-margin contour of `target` with the chart preset.
///
/// # Examples
///
/// ```
/// use margin_core::types::{MarginParameters, MarginVariable};
/// use margin_solver::contour::find_contour;
///
/// let trace = find_contour(
///     MarginVariable::EvalPrice,
///     MarginVariable::AvgPayout,
///     &MarginParameters::default(),
///     0.0,
///     (50.0, 300.0),
///     (500.0, 20_000.0),
/// )
/// .unwrap();
/// assert!(!trace.is_empty());
/// ```
pub fn find_contour(
    x_variable: MarginVariable,
    y_variable: MarginVariable,
    fixed_params: &MarginParameters,
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
    ContourSolver::with_defaults().solve(&query, fixed_params, &MarginDefinition::Standard)
}

#[cfg(feature = "parallel")]
fn map_ordered<T, R, M>(items: &[T], map: M) -> Vec<R>
where
    T: Copy + Sync,
    R: Send,
    M: Fn(T) -> R + Sync,
{
    use rayon::prelude::*;
    items.par_iter().map(|&item| map(item)).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_ordered<T, R, M>(items: &[T], map: M) -> Vec<R>
where
    T: Copy,
    M: Fn(T) -> R,
{
    items.iter().map(|&item| map(item)).collect()
}
