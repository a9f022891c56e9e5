//! Detection engine
//!
//! Wires the pipeline together: validate -> extract signals (the external
//! model, when configured, is raced alongside under its own timeout) ->
//! aggregate -> classify -> decide -> persist the risk record -> fan the
//! decision out to integrations in the background.
//!
//! Extraction, aggregation, classification and decision are pure
//! computation; the caller gets an immediate allow/block answer. Baseline
//! updates happen elsewhere, on their own cadence, through the tracker
//! handle this engine exposes.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::baseline::BaselineTracker;
use crate::config::EngineConfig;
use crate::dispatch::IntegrationDispatcher;
use crate::error::{EngineError, EngineResult, StoreError};
use crate::model::ModelClient;
use crate::observation::Observation;
use crate::record::{EntityRiskRecord, EntityStore, RiskRecordManager};
use crate::score::{aggregate, classify, decide, ScoreResult};
use crate::signal::{
    BehaviorExtractor, DeviationExtractor, FingerprintExtractor, IdentityExtractor, RateExtractor,
    Signal, SignalExtractor,
};

pub struct DetectionEngine {
    config: EngineConfig,
    extractors: Vec<Box<dyn SignalExtractor>>,
    baselines: Arc<BaselineTracker>,
    records: RiskRecordManager,
    model: Option<ModelClient>,
    dispatcher: IntegrationDispatcher,
}

impl DetectionEngine {
    /// Build an engine with the five built-in extractor families.
    pub fn new(config: EngineConfig, store: Arc<dyn EntityStore>) -> Self {
        let extractors: Vec<Box<dyn SignalExtractor>> = vec![
            Box::new(IdentityExtractor::new(config.identity.clone())),
            Box::new(BehaviorExtractor::new(config.behavior.clone())),
            Box::new(RateExtractor::new(config.rate.clone())),
            Box::new(DeviationExtractor::new(config.deviation.clone())),
            Box::new(FingerprintExtractor::new(config.fingerprint.clone())),
        ];
        let baselines = Arc::new(BaselineTracker::new(&config.baseline));
        let records = RiskRecordManager::new(store, config.record.clone());

        Self {
            config,
            extractors,
            baselines,
            records,
            model: None,
            dispatcher: IntegrationDispatcher::new(),
        }
    }

    pub fn with_model(mut self, model: ModelClient) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: IntegrationDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Add a custom extractor alongside the built-in families.
    ///
    /// Extractors run inline on the scoring path, one after another, so a
    /// slow or blocking extractor stalls the whole rule pass. Anything
    /// I/O-bound belongs behind [`ModelClient`] instead.
    pub fn with_extractor(mut self, extractor: Box<dyn SignalExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Handle for the background process that feeds baseline samples.
    pub fn baselines(&self) -> Arc<BaselineTracker> {
        Arc::clone(&self.baselines)
    }

    /// Score one observation and return the finalized decision.
    ///
    /// A persistence failure comes back as `EngineError::Persistence`
    /// carrying the computed result; integration dispatch runs in the
    /// background and never affects the returned value.
    pub async fn detect(&self, observation: &Observation) -> EngineResult<ScoreResult> {
        observation.validate()?;

        let baseline = self.baselines.snapshot(observation.scope_key());

        let model_fut = async {
            match &self.model {
                Some(model) => model.score(observation).await,
                None => None,
            }
        };
        let rules_fut = async { self.run_extractors(observation, baseline.as_ref()) };
        let (mut signals, model) = tokio::join!(rules_fut, model_fut);

        let external = model.as_ref().map(|m| m.score);
        let score = aggregate(&signals, external);

        // Model-emitted signals ride along as evidence only; the blend
        // above already accounts for the model's contribution.
        if let Some(model) = model {
            signals.extend(model.signals);
        }

        let classification = classify(score, &signals, &self.config.classifier);
        let recommended_action = decide(score, &classification, &self.config.decider);

        let result = ScoreResult {
            detection_id: uuid::Uuid::new_v4(),
            entity_id: observation.entity_id.clone(),
            entity_type: observation.entity_type,
            score,
            signals,
            classification,
            recommended_action,
            computed_at: Utc::now(),
        };

        log::debug!(
            "detection for {} ({}): score={} class={}/{} action={}",
            result.entity_id,
            result.entity_type,
            result.score,
            result.classification.kind,
            result.classification.category,
            result.recommended_action,
        );

        let persisted = self.records.record_detection(&result);

        if self.dispatcher.target_count() > 0 {
            let dispatcher = self.dispatcher.clone();
            let decision = result.clone();
            tokio::spawn(async move {
                dispatcher.dispatch_all(&decision).await;
            });
        }

        match persisted {
            Ok(_) => Ok(result),
            Err(source) => Err(EngineError::Persistence {
                result: Box::new(result),
                source,
            }),
        }
    }

    /// Score many observations with bounded concurrency. One entity's
    /// failure never aborts the batch; results come back in input order.
    pub async fn bulk_detect(
        self: &Arc<Self>,
        observations: Vec<Observation>,
    ) -> Vec<EngineResult<ScoreResult>> {
        let count = observations.len();
        let limit = self.config.bulk_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut set = JoinSet::new();

        for (idx, observation) in observations.into_iter().enumerate() {
            let engine = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            Err(EngineError::TaskFailed(
                                "concurrency limiter closed".to_string(),
                            )),
                        )
                    }
                };
                (idx, engine.detect(&observation).await)
            });
        }

        let mut slots: Vec<Option<EngineResult<ScoreResult>>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => log::error!("bulk detection task lost: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(EngineError::TaskFailed("detection task aborted".to_string()))
                })
            })
            .collect()
    }

    /// Current risk record for an entity, if one exists.
    pub fn risk_record(&self, entity_id: &str) -> Result<Option<EntityRiskRecord>, StoreError> {
        self.records.get(entity_id)
    }

    pub fn dispatcher_stats(&self) -> crate::dispatch::DispatchStats {
        self.dispatcher.stats()
    }

    fn run_extractors(
        &self,
        observation: &Observation,
        baseline: Option<&crate::baseline::Baseline>,
    ) -> Vec<Signal> {
        let mut signals = Vec::new();
        for extractor in &self.extractors {
            match extractor.extract(observation, baseline) {
                Ok(mut extracted) => signals.append(&mut extracted),
                Err(e) => {
                    // A broken extractor contributes nothing; the rest of
                    // the pipeline proceeds on whatever evidence exists.
                    log::warn!("extractor {} skipped: {}", extractor.name(), e);
                }
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordConfig;
    use crate::dispatch::{IntegrationTarget, NotifyFuture, TargetBinding};
    use crate::error::{DispatchError, ExtractError};
    use crate::observation::{EntityType, Fingerprint, RateSample};
    use crate::record::MemoryStore;
    use crate::score::{Action, ClassType};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn engine() -> DetectionEngine {
        DetectionEngine::new(EngineConfig::default(), Arc::new(MemoryStore::new()))
    }

    fn scraper_observation(id: &str) -> Observation {
        // No identity, elevated rate, automation flag: a composite bad
        // actor that trips three extractor families at once.
        let mut obs = Observation::new(id, EntityType::Request);
        obs.rate = Some(RateSample {
            observed_per_min: 120.0,
        });
        obs.fingerprint = Some(Fingerprint {
            automation_flag: Some(true),
            ..Default::default()
        });
        obs
    }

    #[tokio::test]
    async fn test_end_to_end_bad_actor() {
        init_logs();
        let engine = engine();
        let result = engine.detect(&scraper_observation("src-1")).await.unwrap();

        // missing identity (20) + elevated rate (15) + automation flag (40)
        assert!(result.score >= 75);
        assert_eq!(result.classification.kind, ClassType::Bad);
        assert!(matches!(
            result.recommended_action,
            Action::Challenge | Action::Block
        ));

        // Record was persisted.
        let record = engine.risk_record("src-1").unwrap().unwrap();
        assert_eq!(record.current_score, result.score);
        assert_eq!(record.history.len(), 1);
    }

    #[tokio::test]
    async fn test_trusted_actor_is_allowed() {
        let engine = engine();
        let mut obs = Observation::new("crawler-1", EntityType::Request);
        obs.identity = Some("Googlebot/2.1".to_string());

        let result = engine.detect(&obs).await.unwrap();
        // automation "bot" marker (30) + trusted (-25) = 5, under benign_max
        // with the trusted signal present.
        assert_eq!(result.classification.kind, ClassType::Good);
        assert_eq!(result.recommended_action, Action::Allow);
    }

    #[tokio::test]
    async fn test_invalid_observation_fails_before_extraction() {
        let engine = engine();
        let err = engine
            .detect(&Observation::new("", EntityType::Request))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidObservation(_)));
        assert!(engine.risk_record("").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quiet_observation_scores_zero() {
        let engine = engine();
        let mut obs = Observation::new("calm-1", EntityType::User);
        obs.identity = Some("Mozilla/5.0 Chrome/120.0".to_string());

        let result = engine.detect(&obs).await.unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.classification.kind, ClassType::Unknown);
        assert_eq!(result.recommended_action, Action::Allow);
    }

    #[tokio::test]
    async fn test_baseline_deviation_flows_into_score() {
        let engine = engine();
        let mut sample = HashMap::new();
        sample.insert("bandwidth".to_string(), 100.0);
        engine.baselines().update("zone-a", &sample);

        let mut obs = Observation::new("win-1", EntityType::TrafficWindow);
        obs.identity = Some("edge-collector/1.4".to_string());
        obs.scope = Some("zone-a".to_string());
        obs.metrics.insert("bandwidth".to_string(), 1200.0);

        let result = engine.detect(&obs).await.unwrap();
        assert!(result
            .signals
            .iter()
            .any(|s| s.name == "baseline.deviation.bandwidth"));
        // 12x ratio hits the top tier.
        assert_eq!(result.score, 35);
    }

    #[tokio::test]
    async fn test_persistence_failure_still_returns_the_decision() {
        struct DownStore;
        impl EntityStore for DownStore {
            fn get(&self, _: &str) -> Result<Option<EntityRiskRecord>, StoreError> {
                Err(StoreError::Unavailable("no route".to_string()))
            }
            fn upsert(&self, _: &EntityRiskRecord) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("no route".to_string()))
            }
        }

        let engine = DetectionEngine::new(EngineConfig::default(), Arc::new(DownStore));
        let err = engine.detect(&scraper_observation("src-2")).await.unwrap_err();

        match err {
            EngineError::Persistence { result, .. } => {
                assert!(result.score >= 75);
                assert_eq!(result.classification.kind, ClassType::Bad);
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_extractor_is_swallowed() {
        struct BrokenExtractor;
        impl SignalExtractor for BrokenExtractor {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn extract(
                &self,
                _: &Observation,
                _: Option<&crate::baseline::Baseline>,
            ) -> Result<Vec<Signal>, ExtractError> {
                Err(ExtractError::Unavailable("remote fingerprinter down".to_string()))
            }
        }

        init_logs();
        let engine = engine().with_extractor(Box::new(BrokenExtractor));
        let result = engine.detect(&scraper_observation("src-3")).await.unwrap();
        assert!(result.score >= 75);
    }

    #[tokio::test]
    async fn test_bulk_detect_isolates_failures_and_keeps_order() {
        let engine = Arc::new(engine());
        let observations = vec![
            scraper_observation("bulk-1"),
            Observation::new("", EntityType::Request),
            scraper_observation("bulk-3"),
        ];

        let results = engine.bulk_detect(observations).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().entity_id, "bulk-1");
        assert!(matches!(
            results[1],
            Err(EngineError::InvalidObservation(_))
        ));
        assert_eq!(results[2].as_ref().unwrap().entity_id, "bulk-3");
    }

    #[tokio::test]
    async fn test_repeat_detections_evolve_the_record() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            record: RecordConfig {
                max_history: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let engine = DetectionEngine::new(config, store);

        for _ in 0..3 {
            engine.detect(&scraper_observation("rep-1")).await.unwrap();
        }

        let record = engine.risk_record("rep-1").unwrap().unwrap();
        assert_eq!(record.history.len(), 2);
        assert!(record.previous_score.is_some());
    }

    #[tokio::test]
    async fn test_detection_fans_out_to_targets() {
        struct CountingTarget {
            hits: AtomicU32,
        }
        impl IntegrationTarget for CountingTarget {
            fn name(&self) -> &str {
                "counter"
            }
            fn notify<'a>(&'a self, _: &'a ScoreResult) -> NotifyFuture<'a> {
                Box::pin(async move {
                    self.hits.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), DispatchError>(())
                })
            }
        }

        let target = Arc::new(CountingTarget {
            hits: AtomicU32::new(0),
        });
        let mut dispatcher = IntegrationDispatcher::new();
        dispatcher.register(TargetBinding::new(
            target.clone() as Arc<dyn IntegrationTarget>
        ));

        let engine = engine().with_dispatcher(dispatcher);
        engine.detect(&scraper_observation("fan-1")).await.unwrap();

        // Dispatch is fire-and-forget from the caller's point of view;
        // give the spawned task a beat to run.
        for _ in 0..50 {
            if target.hits.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(target.hits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.dispatcher_stats().delivered, 1);
    }
}
