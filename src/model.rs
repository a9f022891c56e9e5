//! External scoring model client
//!
//! Optional secondary scorer reached over HTTP. The engine must keep
//! serving on the rule-based path alone when the model is slow or down, so
//! timeout, connection failure and non-2xx responses are all treated the
//! same way: no model score this call.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ModelConfig;
use crate::observation::Observation;
use crate::signal::Signal;

/// Score and optional supporting signals returned by the model service.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelScore {
    pub score: i32,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

pub struct ModelClient {
    endpoint: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ModelClient {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            http: reqwest::Client::new(),
        }
    }

    /// Ask the model to score an observation. Degrades to `None` on any
    /// failure; this is the designed fallback path, not an error path.
    pub async fn score(&self, observation: &Observation) -> Option<ModelScore> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(observation)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<ModelScore>().await {
                Ok(model) => Some(model),
                Err(e) => {
                    log::debug!("model response unreadable, falling back to rules: {}", e);
                    None
                }
            },
            Ok(resp) => {
                log::debug!(
                    "model returned status {}, falling back to rules",
                    resp.status()
                );
                None
            }
            Err(e) => {
                log::debug!("model unreachable, falling back to rules: {}", e);
                None
            }
        }
    }
}
