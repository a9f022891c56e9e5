//! Multi-signal risk scoring and mitigation decision engine.
//!
//! Feed the engine an [`Observation`] about an entity (a request source, a
//! traffic window, a URL, a user, an asset) and it runs a pipeline of
//! signal extractors, aggregates the weighted evidence into a 0-100 risk
//! score, classifies the entity, recommends a mitigation action, persists a
//! per-entity risk record and fans the decision out to any registered
//! integrations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use risk_engine::{DetectionEngine, EngineConfig, EntityType, MemoryStore, Observation};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = DetectionEngine::new(EngineConfig::default(), Arc::new(MemoryStore::new()));
//!
//!     let observation = Observation::new("src-203-0-113-7", EntityType::Request);
//!     match engine.detect(&observation).await {
//!         Ok(result) => println!("{} -> {}", result.score, result.recommended_action),
//!         Err(e) => eprintln!("detection failed: {}", e),
//!     }
//! }
//! ```

pub mod baseline;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod model;
pub mod observation;
pub mod record;
pub mod score;
pub mod signal;

pub use baseline::{Baseline, BaselineTracker};
pub use config::{
    BaselineConfig, BehaviorConfig, ClassifierConfig, DeciderConfig, DeviationConfig,
    EngineConfig, FingerprintConfig, IdentityConfig, ModelConfig, RateConfig, RecordConfig,
};
pub use dispatch::{
    DispatchStats, IntegrationDispatcher, IntegrationTarget, TargetBinding, TargetOutcome,
    WebhookFormat, WebhookTarget,
};
pub use engine::DetectionEngine;
pub use error::{DispatchError, EngineError, EngineResult, ExtractError, StoreError};
pub use model::{ModelClient, ModelScore};
pub use observation::{
    EntityType, Fingerprint, Observation, RateSample, SessionSample, SignalValue,
};
pub use record::{EntityRiskRecord, EntityStore, MemoryStore, RiskLevel, RiskRecordManager, Trend};
pub use score::{Action, ClassType, Classification, ScoreResult};
pub use signal::{Signal, SignalExtractor};
