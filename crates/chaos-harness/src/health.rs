//! Bounded health polling.
//!
//! After a disruption the harness needs a yes/no answer to "did the
//! service come back within budget?". [`HealthMonitor`] polls a
//! liveness endpoint up to a fixed number of attempts with a fixed
//! delay; exhausting the budget is a normal, expected outcome, not an
//! error.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a single health probe. Append-only, one per attempt.
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    /// 1-based attempt counter, monotonic within a call.
    pub attempt: u32,

    /// Whether the probe returned a success status.
    pub succeeded: bool,

    /// When the probe completed.
    pub timestamp: DateTime<Utc>,
}

/// Result of a recovery wait: the verdict plus the full attempt log.
#[derive(Debug, Clone)]
pub struct RecoveryProbe {
    /// True if at least one probe succeeded within the budget.
    pub recovered: bool,

    /// Every attempt made, in order.
    pub attempts: Vec<HealthCheckResult>,
}

impl RecoveryProbe {
    /// Number of probes issued.
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Polls a liveness endpoint with bounded attempts and fixed delay.
///
/// Stateless across calls: repeated invocations are independent and
/// each restarts attempt numbering at 1.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    http_client: reqwest::Client,
    probe_timeout: Duration,
}

impl HealthMonitor {
    /// Create a monitor with the given per-probe timeout ceiling.
    ///
    /// The effective per-probe timeout is additionally capped strictly
    /// below the inter-attempt delay, so a hung probe cannot starve the
    /// retry budget.
    #[must_use]
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            probe_timeout,
        }
    }

    /// Poll `endpoint` until it returns a success status or the budget
    /// is exhausted.
    ///
    /// Returns as soon as the first probe succeeds; performs no further
    /// probes afterwards. Returns `recovered = false` only after exactly
    /// `max_attempts` failed probes.
    pub async fn wait_for_healthy(
        &self,
        endpoint: &str,
        max_attempts: u32,
        delay: Duration,
    ) -> RecoveryProbe {
        let probe_timeout = self.probe_timeout_for(delay);
        let mut attempts = Vec::with_capacity(max_attempts as usize);

        for attempt in 1..=max_attempts {
            let succeeded = self.probe(endpoint, probe_timeout).await;
            attempts.push(HealthCheckResult {
                attempt,
                succeeded,
                timestamp: Utc::now(),
            });

            if succeeded {
                info!(
                    target: "harness.health",
                    attempt,
                    "Service healthy"
                );
                return RecoveryProbe {
                    recovered: true,
                    attempts,
                };
            }

            warn!(
                target: "harness.health",
                attempt,
                max_attempts,
                "Health probe failed"
            );

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        warn!(
            target: "harness.health",
            max_attempts,
            "Service did not recover within probe budget"
        );
        RecoveryProbe {
            recovered: false,
            attempts,
        }
    }

    /// A single probe: success status within the timeout, or failure.
    ///
    /// Non-success statuses, connection errors, and timeouts all count
    /// the same; the distinction only matters in the logs.
    async fn probe(&self, endpoint: &str, timeout: Duration) -> bool {
        match self.http_client.get(endpoint).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Cap the probe timeout strictly below the inter-attempt delay.
    fn probe_timeout_for(&self, delay: Duration) -> Duration {
        self.probe_timeout.min(delay.mul_f64(0.9))
    }
}
