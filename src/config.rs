//! Engine configuration
//!
//! All thresholds, weights, breakpoints and bands live here. The shapes
//! (two rate tiers, four risk bands, ordered category rules) are part of
//! the design; the exact cut points are deployment policy and every tool
//! embedding the engine is expected to override them.

use serde::{Deserialize, Serialize};

/// Identity/metadata extractor policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub missing_identity_weight: i32,
    pub automation_marker_weight: i32,
    /// Negative: a recognized trusted identity reduces the score.
    pub trusted_weight: i32,
    /// Lowercase substrings matched against the identity string.
    pub automation_markers: Vec<String>,
    /// Lowercase substrings identifying known-good actors.
    pub trusted_identities: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            missing_identity_weight: 20,
            automation_marker_weight: 30,
            trusted_weight: -25,
            automation_markers: [
                "headless", "phantomjs", "selenium", "puppeteer", "playwright",
                "curl", "wget", "python-requests", "scrapy", "bot",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            trusted_identities: ["googlebot", "bingbot", "applebot"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Behavioral extractor policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub no_interaction_weight: i32,
    pub short_session_weight: i32,
    pub short_session_secs: f64,
    pub sequential_access_weight: i32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            no_interaction_weight: 15,
            short_session_weight: 10,
            short_session_secs: 2.0,
            sequential_access_weight: 15,
        }
    }
}

/// Rate extractor policy. Two tiers: elevated and high.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    pub threshold_per_min: f64,
    pub elevated_factor: f64,
    pub high_factor: f64,
    pub elevated_weight: i32,
    pub high_weight: i32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            threshold_per_min: 100.0,
            elevated_factor: 1.0,
            high_factor: 3.0,
            elevated_weight: 15,
            high_weight: 30,
        }
    }
}

/// One ratio breakpoint for the baseline-deviation extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationTier {
    /// Inclusive lower bound: the tier matches when observed/baseline is
    /// at or above this ratio.
    pub ratio: f64,
    pub weight: i32,
}

/// Baseline-deviation extractor policy. Only the highest matching tier
/// fires per metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationConfig {
    pub tiers: Vec<DeviationTier>,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                DeviationTier { ratio: 3.0, weight: 10 },
                DeviationTier { ratio: 5.0, weight: 20 },
                DeviationTier { ratio: 10.0, weight: 35 },
            ],
        }
    }
}

/// Structural-consistency extractor policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    pub zero_hardware_weight: i32,
    pub invalid_dimensions_weight: i32,
    pub automation_flag_weight: i32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            zero_hardware_weight: 20,
            invalid_dimensions_weight: 20,
            automation_flag_weight: 40,
        }
    }
}

/// Ordered category rule: first rule whose prefix matches any signal name
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub prefix: String,
    pub category: String,
}

/// Classifier policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Scores below this, with a trusted signal present, classify as good.
    pub benign_max: u8,
    /// Scores at or above this classify as bad.
    pub bad_min: u8,
    /// Ordered highest-priority-first.
    pub category_rules: Vec<CategoryRule>,
    pub default_category: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            benign_max: 20,
            bad_min: 60,
            category_rules: vec![
                CategoryRule {
                    prefix: "identity.automation".to_string(),
                    category: "scanner".to_string(),
                },
                CategoryRule {
                    prefix: "fingerprint.".to_string(),
                    category: "emulator".to_string(),
                },
                CategoryRule {
                    prefix: "rate.".to_string(),
                    category: "scraper".to_string(),
                },
                CategoryRule {
                    prefix: "baseline.".to_string(),
                    category: "volumetric".to_string(),
                },
            ],
            default_category: "anomalous".to_string(),
        }
    }
}

/// Mitigation decider breakpoints. Must be ordered
/// monitor <= rate_limit <= challenge <= block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeciderConfig {
    pub monitor_min: u8,
    pub rate_limit_min: u8,
    pub challenge_min: u8,
    pub block_min: u8,
}

impl Default for DeciderConfig {
    fn default() -> Self {
        Self {
            monitor_min: 20,
            rate_limit_min: 40,
            challenge_min: 60,
            block_min: 85,
        }
    }
}

/// Risk record policy: four-band level cut points, trend sensitivity and
/// history bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    pub medium_min: u8,
    pub high_min: u8,
    pub critical_min: u8,
    /// Absolute score delta that flips the trend away from stable.
    pub trend_delta: i32,
    pub max_history: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            medium_min: 40,
            high_min: 60,
            critical_min: 80,
            trend_delta: 5,
            max_history: 50,
        }
    }
}

/// Baseline tracker policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// EWMA smoothing factor in (0, 1].
    pub alpha: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { alpha: 0.2 }
    }
}

/// External scoring model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_ms: 800,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub identity: IdentityConfig,
    pub behavior: BehaviorConfig,
    pub rate: RateConfig,
    pub deviation: DeviationConfig,
    pub fingerprint: FingerprintConfig,
    pub classifier: ClassifierConfig,
    pub decider: DeciderConfig,
    pub record: RecordConfig,
    pub baseline: BaselineConfig,
    pub bulk_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            behavior: BehaviorConfig::default(),
            rate: RateConfig::default(),
            deviation: DeviationConfig::default(),
            fingerprint: FingerprintConfig::default(),
            classifier: ClassifierConfig::default(),
            decider: DeciderConfig::default(),
            record: RecordConfig::default(),
            baseline: BaselineConfig::default(),
            bulk_concurrency: 8,
        }
    }
}
