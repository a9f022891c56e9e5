//! Baseline tracker
//!
//! Rolling reference metrics per scope, folded with an exponential moving
//! average. Updates happen on their own cadence (a background collector,
//! a periodic job); the scoring path only takes read-only snapshots, so a
//! slow writer can never stall a detection call. Readers see either the
//! pre- or post-update value of a scope, never a half-applied sample.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::BaselineConfig;

/// Snapshot of the rolling averages for one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub scope_key: String,
    pub metrics: HashMap<String, f64>,
    pub samples: u64,
    pub last_updated: DateTime<Utc>,
}

impl Baseline {
    pub fn new(scope_key: impl Into<String>) -> Self {
        Self {
            scope_key: scope_key.into(),
            metrics: HashMap::new(),
            samples: 0,
            last_updated: Utc::now(),
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Per-scope EWMA tracker. Injected into the engine rather than held as
/// process-global state so tests can run against deterministic baselines.
pub struct BaselineTracker {
    alpha: f64,
    scopes: RwLock<HashMap<String, Baseline>>,
}

impl BaselineTracker {
    pub fn new(config: &BaselineConfig) -> Self {
        Self {
            alpha: config.alpha.clamp(f64::EPSILON, 1.0),
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// Fold a new sample into the scope's rolling averages. The first
    /// sample for a metric seeds the average directly.
    pub fn update(&self, scope_key: &str, sample: &HashMap<String, f64>) {
        let mut scopes = self.scopes.write();
        let entry = scopes
            .entry(scope_key.to_string())
            .or_insert_with(|| Baseline::new(scope_key));

        for (metric, value) in sample {
            if !value.is_finite() {
                log::debug!(
                    "baseline sample for {}.{} is not finite, skipped",
                    scope_key,
                    metric
                );
                continue;
            }
            match entry.metrics.get_mut(metric) {
                Some(avg) => *avg = *avg * (1.0 - self.alpha) + value * self.alpha,
                None => {
                    entry.metrics.insert(metric.clone(), *value);
                }
            }
        }

        entry.samples += 1;
        entry.last_updated = Utc::now();
    }

    /// Cloned snapshot for extractors. `None` until the scope has seen at
    /// least one sample.
    pub fn snapshot(&self, scope_key: &str) -> Option<Baseline> {
        self.scopes.read().get(scope_key).cloned()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().len()
    }

    /// Drop one scope (administrative teardown).
    pub fn remove_scope(&self, scope_key: &str) -> bool {
        self.scopes.write().remove(scope_key).is_some()
    }

    /// Drop all learned baselines.
    pub fn reset(&self) {
        self.scopes.write().clear();
        log::info!("baseline tracker reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f64) -> HashMap<String, f64> {
        let mut map = HashMap::new();
        map.insert("bandwidth".to_string(), value);
        map
    }

    #[test]
    fn test_first_sample_seeds_average() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        tracker.update("zone-a", &sample(100.0));

        let snap = tracker.snapshot("zone-a").unwrap();
        assert_eq!(snap.metric("bandwidth"), Some(100.0));
        assert_eq!(snap.samples, 1);
    }

    #[test]
    fn test_constant_input_is_a_fixed_point() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        for _ in 0..50 {
            tracker.update("zone-a", &sample(100.0));
        }
        let snap = tracker.snapshot("zone-a").unwrap();
        assert!((snap.metric("bandwidth").unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_converges_toward_new_level() {
        let tracker = BaselineTracker::new(&BaselineConfig { alpha: 0.5 });
        tracker.update("zone-a", &sample(100.0));
        for _ in 0..20 {
            tracker.update("zone-a", &sample(200.0));
        }
        let avg = tracker.snapshot("zone-a").unwrap().metric("bandwidth").unwrap();
        assert!((avg - 200.0).abs() < 1.0);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        tracker.update("zone-a", &sample(100.0));
        let snap = tracker.snapshot("zone-a").unwrap();

        tracker.update("zone-a", &sample(500.0));
        assert_eq!(snap.metric("bandwidth"), Some(100.0));
    }

    #[test]
    fn test_unknown_scope_has_no_snapshot() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        assert!(tracker.snapshot("nowhere").is_none());
    }

    #[test]
    fn test_non_finite_sample_values_are_skipped() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        tracker.update("zone-a", &sample(100.0));
        tracker.update("zone-a", &sample(f64::INFINITY));
        assert_eq!(
            tracker.snapshot("zone-a").unwrap().metric("bandwidth"),
            Some(100.0)
        );
    }

    #[test]
    fn test_remove_and_reset() {
        let tracker = BaselineTracker::new(&BaselineConfig::default());
        tracker.update("zone-a", &sample(1.0));
        tracker.update("zone-b", &sample(1.0));
        assert_eq!(tracker.scope_count(), 2);

        assert!(tracker.remove_scope("zone-a"));
        assert_eq!(tracker.scope_count(), 1);

        tracker.reset();
        assert_eq!(tracker.scope_count(), 0);
    }
}
