//! # margin_solver: Threshold, Sampling and Contour Solvers
//!
//! ## Layer 2 Role
//!
//! margin_solver builds on the margin model of `margin_core` and provides:
//! - Direction-aware bisection shared by every search (`bisection`)
//! - Single-variable threshold search (`threshold`)
//! - Adaptive chart sampling (`sampler`)
//! - Two-variable iso-margin contours (`contour`)
//! - Caller-owned memoisation (`cache`)
//! - Tolerances, presets and TOML overrides (`config`)
//! - The [`MarginEngine`] facade (`engine`)
//!
//! The margin function is not assumed monotonic or continuous. Searches
//! report "no solution" (`None`, empty traces) rather than failing, and never
//! return a NaN.
//!
//! ## Usage Examples
//!
//! ```rust
//! use margin_core::types::{MarginParameters, MarginVariable};
//! use margin_solver::MarginEngine;
//!
//! let engine = MarginEngine::standard();
//! let params = MarginParameters::default();
//!
//! // Average payout at which the business breaks even
//! let solution = engine
//!     .threshold(&params, MarginVariable::AvgPayout, 0.0)
//!     .unwrap()
//!     .unwrap();
//! assert!(solution.converged);
//!
//! // Price/payout combinations with a 20 % margin
//! let trace = engine
//!     .contour(
//!         &params,
//!         MarginVariable::EvalPrice,
//!         MarginVariable::AvgPayout,
//!         0.2,
//!         (50.0, 400.0),
//!         (500.0, 20_000.0),
//!     )
//!     .unwrap();
//! assert!(trace.points.iter().all(|p| (p.margin - 0.2).abs() <= trace.tolerance));
//! ```
//!
//! ## Logging
//!
//! Events are emitted with `tracing` (`debug!` per search, `trace!` per
//! bisection step). No subscriber is installed here.
//!
//! ## Feature Flags
//!
//! - `parallel` (default): evaluate contour columns and grid rows with rayon

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod bisection;
pub mod cache;
pub mod config;
pub mod contour;
pub mod engine;
pub mod error;
pub mod sampler;
pub mod threshold;

pub use cache::{CacheKey, SolveCache};
pub use config::{BisectionConfig, ContourConfig, EngineConfig, SamplerConfig, ThresholdConfig};
pub use contour::{
    find_contour, ContourMethod, ContourPoint, ContourQuery, ContourSolver, ContourTrace,
};
pub use engine::{MarginEngine, ThresholdRow};
pub use error::{ConfigError, SolverError};
pub use sampler::{adaptive_sample_range, AdaptiveSampler, Sample};
pub use threshold::{find_threshold_value, ThresholdQuery, ThresholdSolution, ThresholdSolver};
