//! Structural-consistency extractor
//!
//! Checks fingerprint-like inputs for internally inconsistent or
//! emulation-typical attribute combinations: zero-value hardware
//! descriptors, impossible screen dimensions, an exposed automation flag.

use super::{names, Signal, SignalExtractor};
use crate::baseline::Baseline;
use crate::config::FingerprintConfig;
use crate::error::ExtractError;
use crate::observation::{Fingerprint, Observation, SignalValue};

pub struct FingerprintExtractor {
    config: FingerprintConfig,
}

impl FingerprintExtractor {
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    fn zero_hardware(fp: &Fingerprint) -> Option<&'static str> {
        if fp.hardware_concurrency == Some(0) {
            return Some("hardware_concurrency is zero");
        }
        if fp.device_memory_gb == Some(0.0) {
            return Some("device_memory is zero");
        }
        None
    }

    fn invalid_dimensions(fp: &Fingerprint) -> bool {
        matches!(fp.screen_width, Some(w) if w <= 0)
            || matches!(fp.screen_height, Some(h) if h <= 0)
    }
}

impl SignalExtractor for FingerprintExtractor {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn extract(
        &self,
        observation: &Observation,
        _baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError> {
        let fp = match &observation.fingerprint {
            Some(f) => f,
            None => return Ok(Vec::new()),
        };

        let mut signals = Vec::new();

        if let Some(reason) = Self::zero_hardware(fp) {
            signals.push(
                Signal::new(names::FP_ZERO_HARDWARE, self.config.zero_hardware_weight)
                    .with_evidence(reason),
            );
        }

        if Self::invalid_dimensions(fp) {
            signals.push(
                Signal::new(
                    names::FP_INVALID_DIMENSIONS,
                    self.config.invalid_dimensions_weight,
                )
                .with_evidence(format!(
                    "reported screen {}x{}",
                    fp.screen_width.unwrap_or(0),
                    fp.screen_height.unwrap_or(0)
                )),
            );
        }

        if fp.automation_flag == Some(true) {
            signals.push(
                Signal::new(
                    names::FP_AUTOMATION_FLAG,
                    self.config.automation_flag_weight,
                )
                .with_value(SignalValue::Flag(true))
                .with_evidence("client runtime exposes an automation flag"),
            );
        }

        Ok(signals)
    }
}
