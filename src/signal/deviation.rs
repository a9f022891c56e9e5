//! Baseline-deviation extractor
//!
//! For each metric on the observation that the scope baseline also tracks,
//! computes the observed/baseline ratio and emits the single highest
//! matching tier. No baseline snapshot means no signals; a missing baseline
//! is the normal state for a scope the tracker has not seen yet.

use super::{names, Signal, SignalExtractor};
use crate::baseline::Baseline;
use crate::config::{DeviationConfig, DeviationTier};
use crate::error::ExtractError;
use crate::observation::{Observation, SignalValue};

/// Baselines below this are treated as empty to avoid ratio blow-ups on
/// barely-initialized scopes.
const MIN_BASELINE: f64 = 1e-6;

pub struct DeviationExtractor {
    config: DeviationConfig,
}

impl DeviationExtractor {
    pub fn new(config: DeviationConfig) -> Self {
        Self { config }
    }

    fn highest_tier(&self, ratio: f64) -> Option<&DeviationTier> {
        self.config
            .tiers
            .iter()
            .filter(|t| ratio >= t.ratio)
            .max_by(|a, b| {
                a.ratio
                    .partial_cmp(&b.ratio)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

impl SignalExtractor for DeviationExtractor {
    fn name(&self) -> &'static str {
        "deviation"
    }

    fn extract(
        &self,
        observation: &Observation,
        baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError> {
        let baseline = match baseline {
            Some(b) => b,
            None => return Ok(Vec::new()),
        };

        let mut signals = Vec::new();

        for (metric, observed) in &observation.metrics {
            let reference = match baseline.metric(metric) {
                Some(v) if v > MIN_BASELINE => v,
                _ => continue,
            };

            let ratio = observed / reference;
            if let Some(tier) = self.highest_tier(ratio) {
                signals.push(
                    Signal::new(
                        format!("{}.{}", names::BASELINE_DEVIATION, metric),
                        tier.weight,
                    )
                    .with_value(SignalValue::Number(ratio))
                    .with_evidence(format!(
                        "{} observed {:.1} vs baseline {:.1} ({:.1}x)",
                        metric, observed, reference, ratio
                    )),
                );
            }
        }

        Ok(signals)
    }
}
