//! Solver configuration types.
//!
//! Tolerances differ by call site: threshold searches stop at 0.001 on
//! margin, chart contours at 0.005 and contour tables at 0.0001. Each is a
//! default or preset here, never a constant inside the algorithms.
//!
//! All types deserialise with `#[serde(default)]`, so a TOML document only
//! needs the fields it overrides:
//!
//! ```
//! use margin_solver::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     [threshold.bisection]
//!     tolerance = 0.0005
//!
//!     [contour]
//!     x_steps = 60
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.threshold.bisection.tolerance, 0.0005);
//! assert_eq!(config.threshold.bisection.max_iterations, 100);
//! assert_eq!(config.contour.x_steps, 60);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tolerance and iteration budget of one bisection.
///
/// The search stops once `|margin - target| <= tolerance` or after
/// `max_iterations` midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionConfig {
    /// Absolute tolerance on margin
    pub tolerance: f64,
    /// Maximum number of midpoints evaluated
    pub max_iterations: usize,
}

impl Default for BisectionConfig {
    /// Threshold search defaults: tolerance 0.001, 100 iterations.
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            max_iterations: 100,
        }
    }
}

impl BisectionConfig {
    /// Create a configuration with the given tolerance and budget.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Tight tolerance (1e-6) with a larger budget (200).
    pub fn precise() -> Self {
        Self::new(1e-6, 200)
    }

    /// Relaxed tolerance (0.01) with a small budget (30).
    pub fn fast() -> Self {
        Self::new(0.01, 30)
    }

    /// Copy with a different tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate tolerance and budget, reporting failures under `section`.
    pub fn validate(&self, section: &'static str) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance {
                section,
                value: self.tolerance,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterations { section });
        }
        Ok(())
    }
}

/// Threshold search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Bisection settings
    pub bisection: BisectionConfig,
    /// Fractions into the bound range at which the direction is probed
    pub probe_fractions: (f64, f64),
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            bisection: BisectionConfig::default(),
            probe_fractions: (0.01, 0.02),
        }
    }
}

impl ThresholdConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bisection.validate("threshold")?;
        let (first, second) = self.probe_fractions;
        check_fraction("threshold.probe_fractions.0", first, 0.0, 1.0)?;
        check_fraction("threshold.probe_fractions.1", second, first, 1.0)?;
        if first == second {
            return Err(ConfigError::OutOfRange {
                field: "threshold.probe_fractions.1",
                value: second,
                min: first,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// Adaptive sampler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Evenly spaced samples of the first pass
    pub initial_steps: usize,
    /// Samples wanted within the acceptance band
    pub desired_points: usize,
    /// Refinement passes
    pub passes: usize,
    /// Acceptance band as a fraction of `|target|`
    pub band_fraction: f64,
    /// Lower bound of the acceptance band
    pub min_band: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            initial_steps: 21,
            desired_points: 50,
            passes: 3,
            band_fraction: 0.25,
            min_band: 0.05,
        }
    }
}

impl SamplerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("sampler.initial_steps", self.initial_steps, 2)?;
        check_count("sampler.passes", self.passes, 1)?;
        check_fraction("sampler.band_fraction", self.band_fraction, 0.0, f64::MAX)?;
        check_fraction("sampler.min_band", self.min_band, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// Contour tracing configuration.
///
/// [`ContourConfig::chart`] (the default) suits plotted iso-lines;
/// [`ContourConfig::table`] trades speed for the tight tolerance of
/// tabulated break-even combinations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Columns across the x range
    pub x_steps: usize,
    /// Per-column bisection settings
    pub bisection: BisectionConfig,
    /// Column points below which the grid fallback runs
    pub min_points: usize,
    /// Grid points per axis of the fallback scan
    pub grid_resolution: usize,
    /// Absolute margin tolerance of the fallback scan
    pub grid_tolerance: f64,
    /// Minimum separation of kept points as a fraction of each axis span
    pub dedup_fraction: f64,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self::chart()
    }
}

impl ContourConfig {
    /// Loose preset for charts: 40 columns, tolerance 0.005, 35 iterations.
    pub fn chart() -> Self {
        Self {
            x_steps: 40,
            bisection: BisectionConfig::new(0.005, 35),
            min_points: 5,
            grid_resolution: 50,
            grid_tolerance: 0.01,
            dedup_fraction: 0.02,
        }
    }

    /// Tight preset for tables: 50 columns, tolerance 0.0001, 40 iterations.
    pub fn table() -> Self {
        Self {
            x_steps: 50,
            bisection: BisectionConfig::new(0.0001, 40),
            ..Self::chart()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("contour.x_steps", self.x_steps, 2)?;
        self.bisection.validate("contour")?;
        check_count("contour.grid_resolution", self.grid_resolution, 2)?;
        if !(self.grid_tolerance.is_finite() && self.grid_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance {
                section: "contour.grid",
                value: self.grid_tolerance,
            });
        }
        check_fraction("contour.dedup_fraction", self.dedup_fraction, 0.0, 1.0)?;
        Ok(())
    }
}

/// Configuration of every solver behind [`crate::MarginEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Threshold search
    pub threshold: ThresholdConfig,
    /// Chart sampling
    pub sampler: SamplerConfig,
    /// Contour tracing
    pub contour: ContourConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// Missing sections and fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.threshold.validate()?;
        self.sampler.validate()?;
        self.contour.validate()?;
        Ok(())
    }
}

fn check_count(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooFewPoints { field, value, min });
    }
    Ok(())
}

fn check_fraction(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= min && value <= max) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
