//! Signals and signal extractors
//!
//! A `Signal` is one weighted piece of evidence about an entity. Extractors
//! turn a raw observation into zero or more signals. They are pure: no I/O,
//! no mutation, a read-only baseline snapshot at most. A failing extractor
//! is logged by the engine and contributes nothing.

pub mod behavior;
pub mod deviation;
pub mod fingerprint;
pub mod identity;
pub mod rate;

use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;
use crate::error::ExtractError;
use crate::observation::{Observation, SignalValue};

pub use behavior::BehaviorExtractor;
pub use deviation::DeviationExtractor;
pub use fingerprint::FingerprintExtractor;
pub use identity::IdentityExtractor;
pub use rate::RateExtractor;

/// Well-known signal names emitted by the built-in extractors. Classifier
/// category rules match on these by prefix.
pub mod names {
    pub const IDENTITY_MISSING: &str = "identity.missing";
    pub const IDENTITY_AUTOMATION: &str = "identity.automation_marker";
    pub const IDENTITY_TRUSTED: &str = "identity.trusted";

    pub const BEHAVIOR_NO_INTERACTION: &str = "behavior.no_interaction";
    pub const BEHAVIOR_SHORT_SESSION: &str = "behavior.short_session";
    pub const BEHAVIOR_SEQUENTIAL: &str = "behavior.sequential_access";

    pub const RATE_ELEVATED: &str = "rate.elevated";
    pub const RATE_HIGH: &str = "rate.high";

    /// Full name is `baseline.deviation.<metric>`.
    pub const BASELINE_DEVIATION: &str = "baseline.deviation";

    pub const FP_ZERO_HARDWARE: &str = "fingerprint.zero_hardware";
    pub const FP_INVALID_DIMENSIONS: &str = "fingerprint.invalid_dimensions";
    pub const FP_AUTOMATION_FLAG: &str = "fingerprint.automation_flag";
}

/// A single weighted piece of evidence. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    /// May be negative for trust-reducing evidence.
    pub weight: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<SignalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Signal {
    pub fn new(name: impl Into<String>, weight: i32) -> Self {
        Self {
            name: name.into(),
            weight,
            value: None,
            evidence: None,
        }
    }

    pub fn with_value(mut self, value: SignalValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Pluggable analyzer turning an observation into signals.
pub trait SignalExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pure function of the observation and an optional baseline snapshot.
    /// An `Err` is swallowed by the engine loop and contributes zero
    /// signals.
    fn extract(
        &self,
        observation: &Observation,
        baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError>;
}
