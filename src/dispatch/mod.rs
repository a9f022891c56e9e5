//! Integration dispatcher
//!
//! Fans a finalized decision out to the configured external systems. Each
//! target runs in its own task under its own timeout; one target failing
//! or stalling cannot touch another. The dispatcher joins every task and
//! returns one outcome per target so failures are observable instead of
//! silently dropped, but no outcome is ever fatal to the detection that
//! produced the decision.

pub mod webhook;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::DispatchError;
use crate::score::ScoreResult;

pub use webhook::{WebhookFormat, WebhookTarget};

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>>;

/// An external system notified of finalized decisions. The concrete
/// protocol (log ingest, incident creation, firewall push) is the
/// implementation's business.
pub trait IntegrationTarget: Send + Sync {
    fn name(&self) -> &str;
    fn notify<'a>(&'a self, decision: &'a ScoreResult) -> NotifyFuture<'a>;
}

/// A registered target plus its dispatch policy.
#[derive(Clone)]
pub struct TargetBinding {
    pub target: Arc<dyn IntegrationTarget>,
    /// Decisions scoring below this are not sent to the target.
    pub min_score: u8,
    pub timeout: Duration,
    pub enabled: bool,
}

impl TargetBinding {
    pub fn new(target: Arc<dyn IntegrationTarget>) -> Self {
        Self {
            target,
            min_score: 0,
            timeout: Duration::from_secs(3),
            enabled: true,
        }
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// What happened for one target during one dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    pub skipped: bool,
    pub success: bool,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Running totals over past dispatches, for audit views.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Clone, Default)]
pub struct IntegrationDispatcher {
    bindings: Vec<TargetBinding>,
    stats: Arc<RwLock<DispatchStats>>,
}

impl IntegrationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: TargetBinding) {
        self.bindings.push(binding);
    }

    pub fn target_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.read()
    }

    /// Send the decision to every eligible target concurrently and collect
    /// one outcome per target, in registration order. Never errors: a
    /// failed or timed-out target yields a failed outcome alongside the
    /// successful ones.
    pub async fn dispatch_all(&self, decision: &ScoreResult) -> Vec<TargetOutcome> {
        let mut slots: Vec<Option<TargetOutcome>> =
            (0..self.bindings.len()).map(|_| None).collect();
        let mut set = JoinSet::new();

        for (idx, binding) in self.bindings.iter().enumerate() {
            if !binding.enabled || decision.score < binding.min_score {
                slots[idx] = Some(TargetOutcome {
                    target: binding.target.name().to_string(),
                    skipped: true,
                    success: false,
                    error: None,
                    elapsed_ms: 0,
                });
                continue;
            }

            let target = Arc::clone(&binding.target);
            let timeout = binding.timeout;
            let decision = decision.clone();

            set.spawn(async move {
                let started = Instant::now();
                let result = tokio::time::timeout(timeout, target.notify(&decision)).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                let outcome = match result {
                    Ok(Ok(())) => TargetOutcome {
                        target: target.name().to_string(),
                        skipped: false,
                        success: true,
                        error: None,
                        elapsed_ms,
                    },
                    Ok(Err(e)) => TargetOutcome {
                        target: target.name().to_string(),
                        skipped: false,
                        success: false,
                        error: Some(e.to_string()),
                        elapsed_ms,
                    },
                    Err(_) => TargetOutcome {
                        target: target.name().to_string(),
                        skipped: false,
                        success: false,
                        error: Some(
                            DispatchError::Timeout(timeout.as_millis() as u64).to_string(),
                        ),
                        elapsed_ms,
                    },
                };
                (idx, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    if outcome.success {
                        log::debug!(
                            "decision for {} delivered to {} in {}ms",
                            decision.entity_id,
                            outcome.target,
                            outcome.elapsed_ms
                        );
                    } else {
                        log::warn!(
                            "decision for {} not delivered to {}: {}",
                            decision.entity_id,
                            outcome.target,
                            outcome.error.as_deref().unwrap_or("unknown")
                        );
                    }
                    slots[idx] = Some(outcome);
                }
                Err(e) => log::error!("integration task panicked: {}", e),
            }
        }

        // A panicked task never reported back; its slot is still owed an
        // outcome so the result stays one-per-target.
        let outcomes: Vec<TargetOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| TargetOutcome {
                    target: self.bindings[idx].target.name().to_string(),
                    skipped: false,
                    success: false,
                    error: Some("integration task panicked".to_string()),
                    elapsed_ms: 0,
                })
            })
            .collect();

        let mut stats = self.stats.write();
        for outcome in &outcomes {
            if outcome.skipped {
                stats.skipped += 1;
            } else {
                stats.dispatched += 1;
                if outcome.success {
                    stats.delivered += 1;
                } else {
                    stats.failed += 1;
                }
            }
        }

        outcomes
    }
}
