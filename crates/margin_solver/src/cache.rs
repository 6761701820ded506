//! Caller-owned memoisation of solver results.
//!
//! A [`SolveCache`] is a plain value: the caller creates it, passes it by
//! `&mut` to the `*_cached` methods of [`crate::MarginEngine`] and decides
//! when it is invalidated. There is no global or hidden per-solver state.
//!
//! Keys are the canonical JSON serialisation of everything a result depends
//! on: the kind of query, the query itself, the full fixed parameter set, the
//! margin definition and the solver configuration. Two requests share an
//! entry only when all of these serialise identically.
//!
//! ## Invalidation
//!
//! - [`SolveCache::clear`] drops every entry.
//! - [`SolveCache::sync_base`] clears the cache when the base parameters
//!   differ from the ones it saw last.

use std::collections::HashMap;

use margin_core::model::MarginDefinition;
use margin_core::types::MarginParameters;
use serde::Serialize;
use tracing::debug;

use crate::contour::ContourTrace;
use crate::error::SolverError;
use crate::sampler::Sample;
use crate::threshold::ThresholdSolution;

/// Canonical key of a cached request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyPayload<'a, Q, C> {
    kind: &'static str,
    query: &'a Q,
    params: &'a MarginParameters,
    definition: &'a MarginDefinition,
    config: &'a C,
}

impl CacheKey {
    /// Build the key of a `kind` request.
    ///
    /// # Errors
    ///
    /// [`SolverError::CacheKey`] if serialisation fails.
    pub fn new<Q, C>(
        kind: &'static str,
        query: &Q,
        params: &MarginParameters,
        definition: &MarginDefinition,
        config: &C,
    ) -> Result<Self, SolverError>
    where
        Q: Serialize,
        C: Serialize,
    {
        let payload = KeyPayload {
            kind,
            query,
            params,
            definition,
            config,
        };
        serde_json::to_string(&payload)
            .map(CacheKey)
            .map_err(|e| SolverError::CacheKey(e.to_string()))
    }

    /// The serialised key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Memoised threshold, series and contour results.
///
/// # Examples
///
/// ```
/// use margin_core::types::{MarginParameters, MarginVariable};
/// use margin_solver::{MarginEngine, SolveCache};
///
/// let engine = MarginEngine::standard();
/// let mut cache = SolveCache::new();
/// let params = MarginParameters::default();
///
/// let first = engine
///     .threshold_cached(&mut cache, &params, MarginVariable::AvgPayout, 0.0)
///     .unwrap();
/// let second = engine
///     .threshold_cached(&mut cache, &params, MarginVariable::AvgPayout, 0.0)
///     .unwrap();
/// assert_eq!(first, second);
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
///
/// // Changing the base parameters invalidates everything
/// assert!(cache.sync_base(&params.with_eval_price(120.0)));
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SolveCache {
    thresholds: HashMap<CacheKey, Option<ThresholdSolution>>,
    series: HashMap<CacheKey, Vec<Sample>>,
    contours: HashMap<CacheKey, ContourTrace>,
    base: Option<MarginParameters>,
    hits: u64,
    misses: u64,
}

impl SolveCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry. Hit and miss counters are kept.
    pub fn clear(&mut self) {
        self.thresholds.clear();
        self.series.clear();
        self.contours.clear();
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.thresholds.len() + self.series.len() + self.contours.len()
    }

    /// Whether the cache holds no result.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to compute.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Record `params` as the base parameters, clearing the cache if they
    /// differ from the previous base. Returns whether it cleared.
    pub fn sync_base(&mut self, params: &MarginParameters) -> bool {
        match self.base {
            Some(base) if base == *params => false,
            Some(_) => {
                debug!(entries = self.len(), "base parameters changed, clearing solve cache");
                self.clear();
                self.base = Some(*params);
                true
            }
            None => {
                self.base = Some(*params);
                false
            }
        }
    }

    /// Cached threshold for `key`, computed with `compute` on a miss.
    ///
    /// Errors are returned without being cached.
    pub fn threshold<F>(
        &mut self,
        key: CacheKey,
        compute: F,
    ) -> Result<Option<ThresholdSolution>, SolverError>
    where
        F: FnOnce() -> Result<Option<ThresholdSolution>, SolverError>,
    {
        lookup(&mut self.thresholds, &mut self.hits, &mut self.misses, key, compute)
    }

    /// Cached chart series for `key`, computed with `compute` on a miss.
    pub fn series<F>(&mut self, key: CacheKey, compute: F) -> Result<Vec<Sample>, SolverError>
    where
        F: FnOnce() -> Result<Vec<Sample>, SolverError>,
    {
        lookup(&mut self.series, &mut self.hits, &mut self.misses, key, compute)
    }

    /// Cached contour trace for `key`, computed with `compute` on a miss.
    pub fn contour<F>(&mut self, key: CacheKey, compute: F) -> Result<ContourTrace, SolverError>
    where
        F: FnOnce() -> Result<ContourTrace, SolverError>,
    {
        lookup(&mut self.contours, &mut self.hits, &mut self.misses, key, compute)
    }
}

fn lookup<V, F>(
    store: &mut HashMap<CacheKey, V>,
    hits: &mut u64,
    misses: &mut u64,
    key: CacheKey,
    compute: F,
) -> Result<V, SolverError>
where
    V: Clone,
    F: FnOnce() -> Result<V, SolverError>,
{
    if let Some(value) = store.get(&key) {
        *hits += 1;
        return Ok(value.clone());
    }
    *misses += 1;
    let value = compute()?;
    store.insert(key, value.clone());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisection::Direction;
    use crate::config::ThresholdConfig;
    use margin_core::types::MarginVariable;

    fn key(target: f64, params: &MarginParameters) -> CacheKey {
        CacheKey::new(
            "threshold",
            &(MarginVariable::EvalPrice, target),
            params,
            &MarginDefinition::Standard,
            &ThresholdConfig::default(),
        )
        .unwrap()
    }

    fn solution(value: f64) -> Option<ThresholdSolution> {
        Some(ThresholdSolution {
            value,
            achieved_margin: 0.0,
            converged: true,
            iterations: 1,
            direction: Direction::Increasing,
            bounds: (0.0, 1.0),
        })
    }

    // ========================================
    // Keys
    // ========================================

    #[test]
    fn test_key_is_canonical() {
        let params = MarginParameters::default();
        assert_eq!(key(0.2, &params), key(0.2, &params));
        assert_ne!(key(0.2, &params), key(0.3, &params));
        assert_ne!(key(0.2, &params), key(0.2, &params.with_avg_payout(4000.0)));
    }

    #[test]
    fn test_key_includes_kind_and_definition() {
        let params = MarginParameters::default();
        let config = ThresholdConfig::default();
        let query = (MarginVariable::EvalPrice, 0.2);
        let standard = MarginDefinition::Standard;
        let threshold = CacheKey::new("threshold", &query, &params, &standard, &config).unwrap();
        let series = CacheKey::new("series", &query, &params, &standard, &config).unwrap();
        let combined = CacheKey::new(
            "threshold",
            &query,
            &params,
            &MarginDefinition::combined(10.0),
            &config,
        )
        .unwrap();
        assert_ne!(threshold, series);
        assert_ne!(threshold, combined);
        assert!(threshold.as_str().contains("\"kind\":\"threshold\""));
    }

    // ========================================
    // Lookups
    // ========================================

    #[test]
    fn test_hit_and_miss_counting() {
        let mut cache = SolveCache::new();
        let params = MarginParameters::default();

        let first = cache.threshold(key(0.1, &params), || Ok(solution(1.0))).unwrap();
        let second = cache
            .threshold(key(0.1, &params), || panic!("should be cached"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_none_results_are_cached() {
        let mut cache = SolveCache::new();
        let params = MarginParameters::default();
        cache.threshold(key(0.1, &params), || Ok(None)).unwrap();
        let again = cache.threshold(key(0.1, &params), || Ok(solution(9.0))).unwrap();
        assert_eq!(again, None);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = SolveCache::new();
        let params = MarginParameters::default();
        let err = cache
            .threshold(key(0.1, &params), || Err(SolverError::invalid_range(1.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidRange { .. }));
        assert!(cache.is_empty());

        let ok = cache.threshold(key(0.1, &params), || Ok(solution(2.0))).unwrap();
        assert_eq!(ok, solution(2.0));
    }

    // ========================================
    // Invalidation
    // ========================================

    #[test]
    fn test_sync_base() {
        let mut cache = SolveCache::new();
        let params = MarginParameters::default();

        assert!(!cache.sync_base(&params));
        cache.threshold(key(0.1, &params), || Ok(solution(1.0))).unwrap();
        assert!(!cache.sync_base(&params));
        assert_eq!(cache.len(), 1);

        let moved = params.with_eval_price(150.0);
        assert!(cache.sync_base(&moved));
        assert!(cache.is_empty());
        assert!(!cache.sync_base(&moved));
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut cache = SolveCache::new();
        let params = MarginParameters::default();
        let key = CacheKey::new("series", &1, &params, &MarginDefinition::Standard, &()).unwrap();
        cache
            .series(key, || Ok(vec![Sample { x: 1.0, margin: 0.5 }]))
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }
}
