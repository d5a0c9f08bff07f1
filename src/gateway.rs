//! Semantic validator gateway.
//!
//! Wraps a remote [`JudgmentService`] with a per-attempt timeout and a
//! bounded retry policy, and turns every failure mode into an explicit
//! [`GatewayVerdict`]. The gateway never touches session state.
//!
//! # Retry policy
//!
//! - Attempts: `gateway_attempts` (default 2, initial attempt included)
//! - Each attempt bounded by `gateway_timeout_ms`; a timeout is transient
//! - Backoff: `initial * 2^step`, capped, with up to 25% down-jitter
//! - A non-transient service error stops retrying
//! - A remote rejection is a verdict and is never retried

use crate::config::EngineConfig;
use crate::games::shiritori::GameMode;
use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// What the remote service is asked to judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct JudgmentRequest {
    /// The candidate word.
    pub word: String,
    /// The word it follows, if any.
    pub previous: Option<String>,
    /// Game mode (association play judges the link between the two).
    pub mode: GameMode,
}

/// A judgment returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Judgment {
    /// The word is acceptable.
    Approved {
        /// Explanation from the service.
        reason: String,
    },
    /// The word is not acceptable.
    Rejected {
        /// Explanation from the service.
        reason: String,
    },
}

/// Remote service failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Judgment service error: {} at {}:{}", message, file, line)]
pub struct ServiceError {
    /// Error message.
    pub message: String,
    /// Whether retrying may help (network, timeouts, overload).
    pub transient: bool,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ServiceError {
    /// Creates a transient error (worth retrying).
    #[track_caller]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::located(message.into(), true)
    }

    /// Creates a permanent error (not worth retrying).
    #[track_caller]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::located(message.into(), false)
    }

    #[track_caller]
    fn located(message: String, transient: bool) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            transient,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// An external word-judgment capability.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    /// Judges a word once.
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, ServiceError>;
}

/// Outcome of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GatewayVerdict {
    /// The service approved the word.
    Approved {
        /// Explanation from the service.
        reason: String,
    },
    /// The service rejected the word.
    Rejected {
        /// Explanation from the service.
        reason: String,
    },
    /// No judgment could be obtained.
    Unavailable {
        /// Attempts made.
        attempts: u32,
    },
}

/// Timeout and retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Bound on each attempt.
    pub timeout: Duration,
    /// Total attempts, initial one included.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
}

/// Down-jitter applied to backoff delays.
const JITTER_FACTOR: f64 = 0.25;

impl RetryPolicy {
    /// Builds the policy from engine configuration.
    #[instrument(skip(config))]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            timeout: config.gateway_timeout(),
            max_attempts: (*config.gateway_attempts()).max(1),
            initial_backoff: Duration::from_millis(*config.gateway_backoff_ms()),
            max_backoff: Duration::from_millis(*config.gateway_backoff_max_ms()),
        }
    }

    /// Delay before retry number `step` (0 before the first retry).
    pub fn backoff(&self, step: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * 2.0_f64.powi(step as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());
        let jitter = 1.0 - rand::random::<f64>() * JITTER_FACTOR;
        Duration::from_secs_f64(capped * jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        }
    }
}

/// The gateway in front of the judgment service.
#[derive(Clone)]
pub struct SemanticGateway {
    service: Arc<dyn JudgmentService>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for SemanticGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticGateway")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SemanticGateway {
    /// Creates a gateway over `service`.
    #[instrument(skip(service))]
    pub fn new(service: Arc<dyn JudgmentService>, policy: RetryPolicy) -> Self {
        info!("Creating semantic gateway");
        Self { service, policy }
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Obtains a verdict for the request, retrying transient failures.
    #[instrument(skip(self), fields(word = %request.word))]
    pub async fn judge(&self, request: &JudgmentRequest) -> GatewayVerdict {
        let mut attempts = 0;
        while attempts < self.policy.max_attempts {
            if attempts > 0 {
                let delay = self.policy.backoff(attempts - 1);
                debug!(attempt = attempts + 1, ?delay, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            let failure = match tokio::time::timeout(self.policy.timeout, self.service.judge(request)).await {
                Ok(Ok(Judgment::Approved { reason })) => {
                    debug!(attempts, "Word approved");
                    return GatewayVerdict::Approved { reason };
                }
                Ok(Ok(Judgment::Rejected { reason })) => {
                    debug!(attempts, %reason, "Word rejected");
                    return GatewayVerdict::Rejected { reason };
                }
                Ok(Err(e)) => e,
                Err(_) => ServiceError::transient(format!(
                    "no judgment within {:?}",
                    self.policy.timeout
                )),
            };

            warn!(attempt = attempts, transient = failure.transient, error = %failure, "Judgment attempt failed");
            if !failure.transient {
                break;
            }
        }

        warn!(attempts, "Judgment unavailable");
        GatewayVerdict::Unavailable { attempts }
    }
}
