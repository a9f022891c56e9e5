//! Scoring pipeline types and the aggregate/classify/decide stages.

pub mod aggregate;
pub mod classify;
pub mod decide;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observation::EntityType;
use crate::signal::Signal;

pub use aggregate::aggregate;
pub use classify::classify;
pub use decide::decide;

/// Classification outcome: good, bad, or not yet decidable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    Good,
    Bad,
    Unknown,
}

impl ClassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Good => "good",
            ClassType::Bad => "bad",
            ClassType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ClassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type + domain category + confidence. Confidence equals the score: the
/// score is the confidence estimate in this design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: ClassType,
    pub category: String,
    pub confidence: u8,
}

/// Recommended mitigation, in strictly increasing severity. The derived
/// ordering is load-bearing: deciders and tests compare actions with `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Monitor,
    RateLimit,
    Challenge,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Monitor => "monitor",
            Action::RateLimit => "rate_limit",
            Action::Challenge => "challenge",
            Action::Block => "block",
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            Action::Allow => 0,
            Action::Monitor => 1,
            Action::RateLimit => 2,
            Action::Challenge => 3,
            Action::Block => 4,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finalized decision for one detection call. Produced fresh per call,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Unique id for this detection, for correlating records, logs and
    /// downstream integrations.
    pub detection_id: Uuid,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub score: u8,
    /// Ordered evidence trail; includes any signals the external model
    /// contributed.
    pub signals: Vec<Signal>,
    pub classification: Classification,
    pub recommended_action: Action,
    pub computed_at: DateTime<Utc>,
}
