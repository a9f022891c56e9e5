//! Entity risk records
//!
//! One persisted record per entity, upserted on every detection: previous
//! score, trend, percent change, four-band risk level and a bounded FIFO
//! history of recent results. The history is a working cache for trend and
//! dashboard views, not an audit log. Records are never deleted here;
//! deletion is an external administrative action.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RecordConfig;
use crate::error::StoreError;
use crate::observation::EntityType;
use crate::score::ScoreResult;

pub use store::{EntityStore, MemoryStore};

/// Direction of score change between the two most recent detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Degrading => "degrading",
        }
    }
}

/// Four-band step function of the current score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn from_score(score: u8, config: &RecordConfig) -> Self {
        if score >= config.critical_min {
            RiskLevel::Critical
        } else if score >= config.high_min {
            RiskLevel::High
        } else if score >= config.medium_min {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRiskRecord {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub current_score: u8,
    pub previous_score: Option<u8>,
    pub trend: Trend,
    /// Undefined when the previous score was 0.
    pub percent_change: Option<f64>,
    pub risk_level: RiskLevel,
    pub history: Vec<ScoreResult>,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Upserts risk records through the entity store. Concurrent detections
/// for one entity race last-write-wins; detections are monitoring signals,
/// not ledger entries, so eventual correctness of trend/history is enough.
pub struct RiskRecordManager {
    store: Arc<dyn EntityStore>,
    config: RecordConfig,
}

impl RiskRecordManager {
    pub fn new(store: Arc<dyn EntityStore>, config: RecordConfig) -> Self {
        Self { store, config }
    }

    /// Fold a finalized result into the entity's record and persist it.
    /// A store failure leaves the caller's ScoreResult untouched; the
    /// engine surfaces it as a distinct error.
    pub fn record_detection(&self, result: &ScoreResult) -> Result<EntityRiskRecord, StoreError> {
        let now = Utc::now();

        let mut record = match self.store.get(&result.entity_id)? {
            Some(mut existing) => {
                let old = existing.current_score;
                let delta = result.score as i32 - old as i32;

                existing.previous_score = Some(old);
                existing.percent_change = if old == 0 {
                    None
                } else {
                    Some(delta as f64 / old as f64 * 100.0)
                };
                existing.trend = if delta <= -self.config.trend_delta {
                    Trend::Improving
                } else if delta >= self.config.trend_delta {
                    Trend::Degrading
                } else {
                    Trend::Stable
                };
                existing
            }
            None => EntityRiskRecord {
                entity_id: result.entity_id.clone(),
                entity_type: result.entity_type,
                current_score: result.score,
                previous_score: None,
                trend: Trend::Stable,
                percent_change: None,
                risk_level: RiskLevel::Low,
                history: Vec::new(),
                first_seen: now,
                last_updated: now,
            },
        };

        record.current_score = result.score;
        record.risk_level = RiskLevel::from_score(result.score, &self.config);

        record.history.push(result.clone());
        if record.history.len() > self.config.max_history {
            let excess = record.history.len() - self.config.max_history;
            record.history.drain(0..excess);
        }
        record.last_updated = now;

        self.store.upsert(&record)?;
        Ok(record)
    }

    pub fn get(&self, entity_id: &str) -> Result<Option<EntityRiskRecord>, StoreError> {
        self.store.get(entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Action, ClassType, Classification};

    fn result_with_score(score: u8) -> ScoreResult {
        ScoreResult {
            detection_id: uuid::Uuid::new_v4(),
            entity_id: "entity-1".to_string(),
            entity_type: EntityType::User,
            score,
            signals: vec![],
            classification: Classification {
                kind: ClassType::Unknown,
                category: "anomalous".to_string(),
                confidence: score,
            },
            recommended_action: Action::Monitor,
            computed_at: Utc::now(),
        }
    }

    fn manager() -> RiskRecordManager {
        RiskRecordManager::new(Arc::new(MemoryStore::new()), RecordConfig::default())
    }

    #[test]
    fn test_first_detection_creates_record() {
        let manager = manager();
        let record = manager.record_detection(&result_with_score(55)).unwrap();

        assert_eq!(record.current_score, 55);
        assert_eq!(record.previous_score, None);
        assert_eq!(record.trend, Trend::Stable);
        assert_eq!(record.percent_change, None);
        assert_eq!(record.history.len(), 1);
    }

    #[test]
    fn test_trend_improving_degrading_stable() {
        let manager = manager();

        manager.record_detection(&result_with_score(50)).unwrap();
        let record = manager.record_detection(&result_with_score(40)).unwrap();
        assert_eq!(record.trend, Trend::Improving);
        assert_eq!(record.previous_score, Some(50));

        manager.record_detection(&result_with_score(50)).unwrap();
        let record = manager.record_detection(&result_with_score(60)).unwrap();
        assert_eq!(record.trend, Trend::Degrading);

        manager.record_detection(&result_with_score(50)).unwrap();
        let record = manager.record_detection(&result_with_score(52)).unwrap();
        assert_eq!(record.trend, Trend::Stable);
    }

    #[test]
    fn test_percent_change() {
        let manager = manager();
        manager.record_detection(&result_with_score(50)).unwrap();
        let record = manager.record_detection(&result_with_score(75)).unwrap();
        assert_eq!(record.percent_change, Some(50.0));
    }

    #[test]
    fn test_percent_change_guards_divide_by_zero() {
        let manager = manager();
        manager.record_detection(&result_with_score(0)).unwrap();
        let record = manager.record_detection(&result_with_score(40)).unwrap();
        assert_eq!(record.previous_score, Some(0));
        assert_eq!(record.percent_change, None);
    }

    #[test]
    fn test_risk_level_bands() {
        let config = RecordConfig::default();
        assert_eq!(RiskLevel::from_score(10, &config), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40, &config), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60, &config), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80, &config), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100, &config), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_recomputed_on_every_update() {
        let manager = manager();
        let record = manager.record_detection(&result_with_score(90)).unwrap();
        assert_eq!(record.risk_level, RiskLevel::Critical);

        let record = manager.record_detection(&result_with_score(10)).unwrap();
        assert_eq!(record.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let store = Arc::new(MemoryStore::new());
        let manager = RiskRecordManager::new(
            store,
            RecordConfig {
                max_history: 3,
                ..Default::default()
            },
        );

        for score in [10u8, 20, 30, 40] {
            manager.record_detection(&result_with_score(score)).unwrap();
        }

        let record = manager.get("entity-1").unwrap().unwrap();
        assert_eq!(record.history.len(), 3);
        // Oldest entry (score 10) was evicted.
        let scores: Vec<u8> = record.history.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![20, 30, 40]);
    }

    #[test]
    fn test_store_failure_is_surfaced() {
        struct FailingStore;
        impl EntityStore for FailingStore {
            fn get(&self, _: &str) -> Result<Option<EntityRiskRecord>, StoreError> {
                Ok(None)
            }
            fn upsert(&self, _: &EntityRiskRecord) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("down for maintenance".to_string()))
            }
        }

        let manager = RiskRecordManager::new(Arc::new(FailingStore), RecordConfig::default());
        let err = manager.record_detection(&result_with_score(50)).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
