//! Direction-aware bisection shared by threshold and contour searches.
//!
//! The margin function is not assumed monotonic. A bracket is narrowed
//! according to an externally inferred [`Direction`], and the best point seen
//! is kept so an unconverged search still yields a usable approximation.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::BisectionConfig;

/// How margin responds when the searched variable increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Margin rises with the variable
    Increasing,
    /// Margin falls with the variable
    Decreasing,
}

impl Direction {
    /// Infer the direction from two evaluations ordered by their argument.
    ///
    /// Non-finite or equal probes are read as [`Direction::Increasing`].
    ///
    /// ```
    /// use margin_solver::bisection::Direction;
    ///
    /// assert_eq!(Direction::from_probes(0.3, 0.1), Direction::Decreasing);
    /// assert_eq!(Direction::from_probes(0.1, 0.1), Direction::Increasing);
    /// assert_eq!(Direction::from_probes(f64::NAN, 0.1), Direction::Increasing);
    /// ```
    pub fn from_probes(first: f64, second: f64) -> Self {
        if first.is_finite() && second.is_finite() && second < first {
            Direction::Decreasing
        } else {
            Direction::Increasing
        }
    }
}

/// A point evaluated during a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Approximation {
    /// Argument
    pub x: f64,
    /// Margin at `x`
    pub margin: f64,
    /// `|margin - target|`
    pub residual: f64,
}

/// Result of [`bisect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionOutcome {
    /// Closest finite point seen, if any
    pub best: Option<Approximation>,
    /// Whether `best` is within tolerance
    pub converged: bool,
    /// Midpoints evaluated
    pub iterations: usize,
    /// Whether a non-finite evaluation stopped the search
    pub aborted: bool,
}

/// Bisect `bracket` for `f(x) == target`.
///
/// At each midpoint the bracket moves towards the side where, given
/// `direction`, the target lies. The search stops on the first midpoint
/// within `config.tolerance`, on a non-finite evaluation, or when the
/// iteration budget is spent.
///
/// # Examples
///
/// ```
/// use margin_solver::bisection::{bisect, Direction};
/// use margin_solver::config::BisectionConfig;
///
/// let outcome = bisect(
///     |x| 1.0 - x,
///     0.25,
///     (0.0, 1.0),
///     Direction::Decreasing,
///     &BisectionConfig::default(),
/// );
/// assert!(outcome.converged);
/// assert!((outcome.best.unwrap().x - 0.75).abs() < 1e-3);
/// ```
pub fn bisect<F>(
    f: F,
    target: f64,
    bracket: (f64, f64),
    direction: Direction,
    config: &BisectionConfig,
) -> BisectionOutcome
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = bracket;
    let mut best: Option<Approximation> = None;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;
        let mid = lo * 0.5 + hi * 0.5;
        let margin = f(mid);

        if !margin.is_finite() {
            trace!(iteration = iterations, x = mid, "non-finite margin, aborting");
            return BisectionOutcome {
                best,
                converged: false,
                iterations,
                aborted: true,
            };
        }

        let residual = (margin - target).abs();
        trace!(iteration = iterations, x = mid, margin, residual, "bisection step");

        if best.map_or(true, |b| residual < b.residual) {
            best = Some(Approximation {
                x: mid,
                margin,
                residual,
            });
        }
        if residual <= config.tolerance {
            return BisectionOutcome {
                best,
                converged: true,
                iterations,
                aborted: false,
            };
        }

        let below = margin < target;
        match (direction, below) {
            (Direction::Increasing, true) | (Direction::Decreasing, false) => lo = mid,
            (Direction::Increasing, false) | (Direction::Decreasing, true) => hi = mid,
        }
    }

    BisectionOutcome {
        best,
        converged: false,
        iterations,
        aborted: false,
    }
}
