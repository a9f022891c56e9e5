//! Rate extractor
//!
//! Compares an observed event rate against the configured threshold and
//! emits one of two tiers: elevated (above threshold) or high (above the
//! high multiple). Never both; the higher tier subsumes the lower.

use super::{names, Signal, SignalExtractor};
use crate::baseline::Baseline;
use crate::config::RateConfig;
use crate::error::ExtractError;
use crate::observation::{Observation, SignalValue};

pub struct RateExtractor {
    config: RateConfig,
}

impl RateExtractor {
    pub fn new(config: RateConfig) -> Self {
        Self { config }
    }
}

impl SignalExtractor for RateExtractor {
    fn name(&self) -> &'static str {
        "rate"
    }

    fn extract(
        &self,
        observation: &Observation,
        _baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError> {
        let sample = match &observation.rate {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        if self.config.threshold_per_min <= 0.0 {
            return Err(ExtractError::Malformed(format!(
                "rate threshold must be positive, got {}",
                self.config.threshold_per_min
            )));
        }

        let observed = sample.observed_per_min;
        let threshold = self.config.threshold_per_min;
        let mut signals = Vec::new();

        if observed > threshold * self.config.high_factor {
            signals.push(
                Signal::new(names::RATE_HIGH, self.config.high_weight)
                    .with_value(SignalValue::Number(observed / threshold))
                    .with_evidence(format!(
                        "{:.0}/min against threshold {:.0}/min ({}x tier)",
                        observed, threshold, self.config.high_factor
                    )),
            );
        } else if observed > threshold * self.config.elevated_factor {
            signals.push(
                Signal::new(names::RATE_ELEVATED, self.config.elevated_weight)
                    .with_value(SignalValue::Number(observed / threshold))
                    .with_evidence(format!(
                        "{:.0}/min against threshold {:.0}/min",
                        observed, threshold
                    )),
            );
        }

        Ok(signals)
    }
}
