//! Behavioral extractor
//!
//! Looks at the interactive-session sample: absence of pointer/keyboard
//! activity, abnormally short sessions, mechanical access ordering.
//! Observations without a session sample are out of scope for this
//! extractor and produce nothing.

use super::{names, Signal, SignalExtractor};
use crate::baseline::Baseline;
use crate::config::BehaviorConfig;
use crate::error::ExtractError;
use crate::observation::{Observation, SignalValue};

pub struct BehaviorExtractor {
    config: BehaviorConfig,
}

impl BehaviorExtractor {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }
}

impl SignalExtractor for BehaviorExtractor {
    fn name(&self) -> &'static str {
        "behavior"
    }

    fn extract(
        &self,
        observation: &Observation,
        _baseline: Option<&Baseline>,
    ) -> Result<Vec<Signal>, ExtractError> {
        let session = match &observation.session {
            Some(s) => s,
            None => return Ok(Vec::new()),
        };

        if !session.duration_secs.is_finite() || session.duration_secs < 0.0 {
            return Err(ExtractError::Malformed(format!(
                "session duration is not a valid duration: {}",
                session.duration_secs
            )));
        }

        let mut signals = Vec::new();

        if session.pointer_events == 0 && session.key_events == 0 {
            signals.push(
                Signal::new(
                    names::BEHAVIOR_NO_INTERACTION,
                    self.config.no_interaction_weight,
                )
                .with_evidence("no pointer or keyboard activity in session"),
            );
        }

        if session.duration_secs < self.config.short_session_secs {
            signals.push(
                Signal::new(
                    names::BEHAVIOR_SHORT_SESSION,
                    self.config.short_session_weight,
                )
                .with_value(SignalValue::Number(session.duration_secs))
                .with_evidence(format!(
                    "session lasted {:.2}s, below {:.2}s",
                    session.duration_secs, self.config.short_session_secs
                )),
            );
        }

        if session.sequential_access {
            signals.push(
                Signal::new(
                    names::BEHAVIOR_SEQUENTIAL,
                    self.config.sequential_access_weight,
                )
                .with_evidence("resources accessed in strict mechanical order"),
            );
        }

        Ok(signals)
    }
}
