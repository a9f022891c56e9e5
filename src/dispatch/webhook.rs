//! Webhook integration target
//!
//! Generic HTTP target for SIEM ingest endpoints, chat alerts and similar.
//! Supports a raw JSON body and a Slack-style block payload.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{IntegrationTarget, NotifyFuture};
use crate::error::DispatchError;
use crate::score::ScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookFormat {
    /// The serialized ScoreResult as-is.
    Generic,
    /// Slack block kit message.
    Slack,
}

pub struct WebhookTarget {
    name: String,
    url: String,
    format: WebhookFormat,
    http: reqwest::Client,
}

impl WebhookTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>, format: WebhookFormat) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            format,
            http: reqwest::Client::new(),
        }
    }

    fn payload(&self, decision: &ScoreResult) -> serde_json::Value {
        match self.format {
            WebhookFormat::Generic => {
                serde_json::to_value(decision).unwrap_or_else(|_| json!({}))
            }
            WebhookFormat::Slack => {
                let summary = format!(
                    "*{}* `{}` scored *{}* ({}/{}) -> *{}*",
                    decision.entity_type,
                    decision.entity_id,
                    decision.score,
                    decision.classification.kind,
                    decision.classification.category,
                    decision.recommended_action,
                );
                let evidence: Vec<String> = decision
                    .signals
                    .iter()
                    .map(|s| {
                        format!(
                            "• {} ({:+}){}",
                            s.name,
                            s.weight,
                            s.evidence
                                .as_deref()
                                .map(|e| format!(" — {}", e))
                                .unwrap_or_default()
                        )
                    })
                    .collect();

                json!({
                    "blocks": [
                        {
                            "type": "section",
                            "text": { "type": "mrkdwn", "text": summary }
                        },
                        {
                            "type": "section",
                            "text": {
                                "type": "mrkdwn",
                                "text": if evidence.is_empty() {
                                    "_no rule signals fired_".to_string()
                                } else {
                                    evidence.join("\n")
                                }
                            }
                        }
                    ]
                })
            }
        }
    }
}

impl IntegrationTarget for WebhookTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify<'a>(&'a self, decision: &'a ScoreResult) -> NotifyFuture<'a> {
        Box::pin(async move {
            let response = self
                .http
                .post(&self.url)
                .timeout(Duration::from_secs(10))
                .json(&self.payload(decision))
                .send()
                .await
                .map_err(|e| DispatchError::Transport(e.to_string()))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(DispatchError::Rejected(response.status().as_u16()))
            }
        })
    }
}
