//! Projection result cache keyed by scenario content and the tables used
//!
//! The engine always recomputes; callers that want reuse go through this
//! cache explicitly. Entries expire after a time-to-live checked on read.

use crate::assumptions::Assumptions;
use crate::error::Result;
use crate::inputs::ScenarioInput;
use crate::projection::RetirementProjectionResult;
use chrono::{DateTime, Duration, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A cached projection and when it was computed
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub key: u64,
    pub result: RetirementProjectionResult,
    pub computed_at: DateTime<Utc>,
}

impl CachedResult {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.computed_at < ttl
    }
}

/// Content hash of a scenario's serialized form and the assumption tables
pub fn scenario_key(scenario: &ScenarioInput, assumptions: &Assumptions) -> Result<u64> {
    let json = serde_json::to_string(scenario)?;
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    assumptions.fingerprint().hash(&mut hasher);
    Ok(hasher.finish())
}

#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<u64, CachedResult>,

    ttl: Duration,

    pub cache_hits: u64,
    pub cache_misses: u64,
    pub expirations: u64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            cache_hits: 0,
            cache_misses: 0,
            expirations: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh entry; expired entries are evicted and count as misses
    pub fn get(&mut self, key: u64, now: DateTime<Utc>) -> Option<&RetirementProjectionResult> {
        let fresh = match self.entries.get(&key) {
            Some(entry) => entry.is_fresh(now, self.ttl),
            None => {
                self.cache_misses += 1;
                return None;
            }
        };

        if !fresh {
            self.entries.remove(&key);
            self.expirations += 1;
            self.cache_misses += 1;
            return None;
        }

        self.cache_hits += 1;
        self.entries.get(&key).map(|e| &e.result)
    }

    pub fn insert(&mut self, key: u64, result: RetirementProjectionResult, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CachedResult {
                key,
                result,
                computed_at: now,
            },
        );
    }

    /// Return the cached projection for `scenario` under `assumptions` or compute and store it
    pub fn get_or_compute<F>(
        &mut self,
        scenario: &ScenarioInput,
        assumptions: &Assumptions,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<RetirementProjectionResult>
    where
        F: FnOnce(&ScenarioInput) -> Result<RetirementProjectionResult>,
    {
        let key = scenario_key(scenario, assumptions)?;
        if let Some(hit) = self.get(key, now) {
            return Ok(hit.clone());
        }

        let result = compute(scenario)?;
        self.insert(key, result.clone(), now);
        Ok(result)
    }

    /// Drop every expired entry
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_fresh(now, ttl));
        let purged = before - self.entries.len();
        self.expirations += purged as u64;
        purged
    }

    pub fn remove(&mut self, key: u64) -> Option<CachedResult> {
        self.entries.remove(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
        self.expirations = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::fixtures::fers_scenario;
    use crate::projection::ProjectionEngine;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_key_tracks_content() {
        let tables = Assumptions::default_tables();
        let a = fers_scenario();
        let mut b = fers_scenario();
        assert_eq!(scenario_key(&a, &tables).unwrap(), scenario_key(&b, &tables).unwrap());

        b.account.expected_return = 0.07;
        assert_ne!(scenario_key(&a, &tables).unwrap(), scenario_key(&b, &tables).unwrap());
    }

    #[test]
    fn test_key_tracks_tables() {
        let scenario = fers_scenario();
        let base = Assumptions::default_tables();
        let mut richer = Assumptions::default_tables();
        richer.pension.fers_enhanced_multiplier = 0.012;

        assert_eq!(
            scenario_key(&scenario, &base).unwrap(),
            scenario_key(&scenario, &Assumptions::default_tables()).unwrap()
        );
        assert_ne!(
            scenario_key(&scenario, &base).unwrap(),
            scenario_key(&scenario, &richer).unwrap()
        );
    }

    #[test]
    fn test_changed_tables_recompute() {
        let base = Assumptions::default_tables();
        let mut richer = Assumptions::default_tables();
        richer.pension.fers_enhanced_multiplier = 0.012;
        let scenario = fers_scenario();
        let mut cache = ResultCache::default();

        let first = cache
            .get_or_compute(&scenario, &base, t0(), |s| ProjectionEngine::new(base.clone()).project(s))
            .unwrap();
        let second = cache
            .get_or_compute(&scenario, &richer, t0(), |s| ProjectionEngine::new(richer.clone()).project(s))
            .unwrap();

        assert_eq!(cache.cache_hits, 0);
        assert_eq!(cache.len(), 2);
        assert!(second.pension.annual_pension > first.pension.annual_pension);
    }

    #[test]
    fn test_get_or_compute_hits_second_time() {
        let tables = Assumptions::default_tables();
        let engine = ProjectionEngine::new(tables.clone());
        let mut cache = ResultCache::default();
        let scenario = fers_scenario();
        let mut computed = 0;

        for _ in 0..2 {
            cache
                .get_or_compute(&scenario, &tables, t0(), |s| {
                    computed += 1;
                    engine.project(s)
                })
                .unwrap();
        }

        assert_eq!(computed, 1);
        assert_eq!(cache.cache_hits, 1);
        assert_eq!(cache.cache_misses, 1);
        assert!((cache.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_entries_expire_on_read() {
        let tables = Assumptions::default_tables();
        let engine = ProjectionEngine::new(tables.clone());
        let mut cache = ResultCache::new(Duration::minutes(10));
        let scenario = fers_scenario();
        let key = scenario_key(&scenario, &tables).unwrap();
        cache.insert(key, engine.project(&scenario).unwrap(), t0());

        assert!(cache.get(key, t0() + Duration::minutes(5)).is_some());
        assert!(cache.get(key, t0() + Duration::minutes(10)).is_none());
        assert_eq!(cache.expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_computation_is_not_cached() {
        let mut cache = ResultCache::default();
        let mut scenario = fers_scenario();
        scenario.pension.high3_salary = 0.0;
        let tables = Assumptions::default_tables();
        let engine = ProjectionEngine::new(tables.clone());

        assert!(cache.get_or_compute(&scenario, &tables, t0(), |s| engine.project(s)).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let engine = ProjectionEngine::new(Assumptions::default_tables());
        let mut cache = ResultCache::new(Duration::minutes(10));
        let result = engine.project(&fers_scenario()).unwrap();
        cache.insert(1, result.clone(), t0());
        cache.insert(2, result, t0() + Duration::minutes(8));

        assert_eq!(cache.purge_expired(t0() + Duration::minutes(12)), 1);
        assert_eq!(cache.len(), 1);
    }
}
