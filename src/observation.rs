//! Observation input types
//!
//! An `Observation` is the raw material of a detection call: everything the
//! caller knows about an entity at one point in time. Extractors read it,
//! never mutate it. Unused sections are simply left empty; each extractor
//! only looks at the part it understands.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Kind of entity being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Request,
    TrafficWindow,
    Url,
    User,
    Asset,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Request => "request",
            EntityType::TrafficWindow => "traffic_window",
            EntityType::Url => "url",
            EntityType::User => "user",
            EntityType::Asset => "asset",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed payload attached to a signal or observation attribute.
///
/// Kept as a closed variant set so downstream consumers can pattern-match
/// instead of poking at untyped blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Map(serde_json::Map<String, serde_json::Value>),
}

/// Interactive-session sample for the behavioral extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSample {
    pub duration_secs: f64,
    pub pointer_events: u32,
    pub key_events: u32,
    /// Pages/resources were accessed in strict mechanical order.
    pub sequential_access: bool,
}

/// Observed event rate for the rate extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSample {
    pub observed_per_min: f64,
}

/// Client fingerprint attributes for the structural-consistency extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hardware_concurrency: Option<u32>,
    pub device_memory_gb: Option<f64>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub platform: Option<String>,
    /// Explicit automation flag exposed by the client runtime.
    pub automation_flag: Option<bool>,
}

/// A raw observation about one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub entity_type: EntityType,

    /// Baseline scope this observation belongs to (network zone, tenant).
    /// Falls back to the entity type when unset.
    pub scope: Option<String>,

    /// Client identity string (user agent, client id). `None` means the
    /// caller looked and found nothing, which is itself a signal.
    pub identity: Option<String>,

    pub session: Option<SessionSample>,
    pub rate: Option<RateSample>,

    /// Raw metric readings compared against the scope baseline
    /// (bandwidth, packet rate, request rate). BTreeMap keeps signal
    /// ordering deterministic.
    pub metrics: BTreeMap<String, f64>,

    pub fingerprint: Option<Fingerprint>,

    /// Free-form extra attributes for custom extractors.
    pub attributes: HashMap<String, SignalValue>,

    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(entity_id: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            scope: None,
            identity: None,
            session: None,
            rate: None,
            metrics: BTreeMap::new(),
            fingerprint: None,
            attributes: HashMap::new(),
            observed_at: Utc::now(),
        }
    }

    /// Baseline scope key for this observation.
    pub fn scope_key(&self) -> &str {
        self.scope.as_deref().unwrap_or_else(|| self.entity_type.as_str())
    }

    /// Structural validation, run before any extractor.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.entity_id.trim().is_empty() {
            return Err(EngineError::InvalidObservation(
                "entity_id must not be empty".to_string(),
            ));
        }
        if let Some(rate) = &self.rate {
            if !rate.observed_per_min.is_finite() || rate.observed_per_min < 0.0 {
                return Err(EngineError::InvalidObservation(format!(
                    "rate sample is not a valid rate: {}",
                    rate.observed_per_min
                )));
            }
        }
        for (name, value) in &self.metrics {
            if !value.is_finite() {
                return Err(EngineError::InvalidObservation(format!(
                    "metric {} is not finite",
                    name
                )));
            }
        }
        Ok(())
    }
}
