//! Adaptive x-value sampling for margin charts.
//!
//! Uniform sampling wastes points where margin is far from the target line.
//! The sampler starts with an even grid, then repeatedly narrows the window
//! around the sample closest to the target and samples it more densely.
//! Points left over from earlier passes are kept, so the chart still spans
//! the full range.

use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;

/// One sampled point of a margin series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Variable value
    pub x: f64,
    /// Margin at `x`, NaN where the model is undefined
    pub margin: f64,
}

/// Point at fraction `t` of `[lo, hi]`, clamped to the interval.
///
/// The span `hi - lo` is never formed, so windows wider than `f64::MAX`
/// still interpolate to finite values.
pub(crate) fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    (lo * (1.0 - t) + hi * t).max(lo).min(hi)
}

/// `n` evenly spaced points over `[lo, hi]`, ending exactly on `hi`.
pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        hi
                    } else {
                        lerp(lo, hi, i as f64 / last)
                    }
                })
                .collect()
        }
    }
}

/// Samples ordered by `x`, one per distinct value.
struct SampleSet<'a, F> {
    f: &'a F,
    samples: Vec<Sample>,
}

impl<'a, F: Fn(f64) -> f64> SampleSet<'a, F> {
    fn new(f: &'a F) -> Self {
        Self {
            f,
            samples: Vec::new(),
        }
    }

    fn record(&mut self, x: f64) {
        // Fold -0.0 into 0.0
        let x = x + 0.0;
        if let Err(pos) = self.samples.binary_search_by(|s| s.x.total_cmp(&x)) {
            let margin = (self.f)(x);
            self.samples.insert(pos, Sample { x, margin });
        }
    }

    /// Lowest-x sample with the smallest finite distance to `target`.
    fn closest(&self, target: f64) -> Option<Sample> {
        let mut best: Option<(Sample, f64)> = None;
        for sample in &self.samples {
            let distance = (sample.margin - target).abs();
            if !distance.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((*sample, distance));
            }
        }
        best.map(|(sample, _)| sample)
    }

    fn count_within(&self, target: f64, band: f64) -> usize {
        self.samples
            .iter()
            .filter(|s| (s.margin - target).abs() <= band)
            .count()
    }
}

/// Adaptive sampler.
///
/// # Examples
///
/// ```
/// use margin_solver::config::SamplerConfig;
/// use margin_solver::sampler::AdaptiveSampler;
///
/// let sampler = AdaptiveSampler::new(SamplerConfig::default());
/// let xs = sampler.sample_range(0.0, 100.0, |x| x / 100.0, 0.5);
///
/// assert_eq!(xs.first(), Some(&0.0));
/// assert_eq!(xs.last(), Some(&100.0));
/// assert!(xs.windows(2).all(|w| w[0] < w[1]));
/// // Denser around x = 50
/// let near = xs.iter().filter(|x| (**x - 50.0).abs() < 5.0).count();
/// assert!(near > 10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveSampler {
    config: SamplerConfig,
}

impl AdaptiveSampler {
    /// Create a sampler with the given configuration.
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample `f` over `[min, max]`, concentrating points near `target`.
    ///
    /// A reversed window is swapped, `min == max` yields that single point
    /// and a non-finite bound yields nothing. Samples are strictly increasing
    /// in `x` and lie within the window.
    ///
    /// When fewer than `desired_points` samples fall within the acceptance
    /// band, `desired_points - in_band` evenly spaced points are added across
    /// the final window. That is a count of added points: on a steep crossing
    /// most of them can still land outside the band.
    pub fn sample_series<F>(&self, min: f64, max: f64, f: F, target: f64) -> Vec<Sample>
    where
        F: Fn(f64) -> f64,
    {
        if !min.is_finite() || !max.is_finite() {
            return Vec::new();
        }
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };

        let mut set = SampleSet::new(&f);
        if lo == hi {
            set.record(lo);
            return set.samples;
        }

        let desired = self.config.desired_points;
        let mut window = (lo, hi);
        let mut steps = self.config.initial_steps;

        for pass in 0..self.config.passes.max(1) {
            for x in linspace(window.0, window.1, steps) {
                set.record(x);
            }

            let Some(centre) = set.closest(target) else {
                break;
            };
            let half = (window.1 * 0.5 - window.0 * 0.5) / (pass + 1) as f64 / 2.0;
            window = ((centre.x - half).max(lo), (centre.x + half).min(hi));
            steps = steps.max(desired.div_ceil(pass + 1));
        }

        let band = self.config.min_band.max(target.abs() * self.config.band_fraction);
        let in_band = set.count_within(target, band);
        if in_band < desired {
            let needed = desired - in_band;
            let (wlo, whi) = window;
            for i in 1..=needed {
                set.record(lerp(wlo, whi, i as f64 / (needed + 1) as f64));
            }
        }

        set.samples
    }

    /// The x-values of [`AdaptiveSampler::sample_series`].
    pub fn sample_range<F>(&self, min: f64, max: f64, f: F, target: f64) -> Vec<f64>
    where
        F: Fn(f64) -> f64,
    {
        self.sample_series(min, max, f, target)
            .into_iter()
            .map(|s| s.x)
            .collect()
    }
}

/// Sample `margin_fn` over `[min, max]` with explicit density settings.
///
/// Uses 21 initial points and a 0.05 minimum band.
pub fn adaptive_sample_range<F>(
    min: f64,
    max: f64,
    margin_fn: F,
    target: f64,
    desired_points: usize,
    passes: usize,
    band_fraction: f64,
) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    let config = SamplerConfig {
        desired_points,
        passes,
        band_fraction,
        ..SamplerConfig::default()
    };
    AdaptiveSampler::new(config).sample_range(min, max, margin_fn, target)
}
