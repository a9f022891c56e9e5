//! Identity/metadata extractor
//!
//! Flags a missing client identity, known automation-tool markers, and
//! recognized trusted identities (negative weight). Matching is
//! case-insensitive substring, same as the process whitelist checks this
//! grew out of.

use super::{names, Signal, SignalExtractor};
use crate::baseline::Baseline;
use crate::config::IdentityConfig;
use crate::error::ExtractError;
use crate::observation::{Observation, SignalValue};

pub struct IdentityExtractor {
    config: IdentityConfig,
}

impl IdentityExtractor {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }
}

impl SignalExtractor for IdentityExtractor {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn extract(
        &self,
        observation: &Observation,
        _baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError> {
        let mut signals = Vec::new();

        let identity = observation
            .identity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let identity = match identity {
            Some(id) => id,
            None => {
                signals.push(
                    Signal::new(names::IDENTITY_MISSING, self.config.missing_identity_weight)
                        .with_evidence("no client identity presented"),
                );
                return Ok(signals);
            }
        };

        let lower = identity.to_lowercase();

        if let Some(marker) = self
            .config
            .automation_markers
            .iter()
            .find(|m| lower.contains(m.as_str()))
        {
            signals.push(
                Signal::new(
                    names::IDENTITY_AUTOMATION,
                    self.config.automation_marker_weight,
                )
                .with_value(SignalValue::Text(marker.clone()))
                .with_evidence(format!("identity matches automation marker \"{}\"", marker)),
            );
        }

        if let Some(trusted) = self
            .config
            .trusted_identities
            .iter()
            .find(|t| lower.contains(t.as_str()))
        {
            signals.push(
                Signal::new(names::IDENTITY_TRUSTED, self.config.trusted_weight)
                    .with_value(SignalValue::Text(trusted.clone()))
                    .with_evidence(format!("identity matches trusted actor \"{}\"", trusted)),
            );
        }

        Ok(signals)
    }
}
