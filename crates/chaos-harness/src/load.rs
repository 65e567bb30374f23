//! Concurrent synthetic load generation.
//!
//! [`LoadGenerator`] runs a weighted mix of CRUD operations against the
//! service under test for a fixed duration at a fixed concurrency, and
//! emits a [`LoadReport`] once every worker has drained. Target
//! unavailability is the condition under test, so request failures are
//! counted, never propagated: the generator itself must not abort
//! because the service is down.

use crate::client::{ApiClient, CreateUserRequest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Load generator errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The operation mix carried no positive weight.
    #[error("Operation mix must contain at least one positive weight")]
    EmptyMix,
}

/// A synthetic operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `POST /users/` with a unique email; 201 expected.
    CreateUser,
    /// `GET /users/`; 200 expected.
    ListUsers,
    /// `GET /health`; 200 expected.
    HealthCheck,
}

/// A weighted set of operation kinds; selection is weighted-random per
/// issued request.
#[derive(Debug, Clone)]
pub struct OperationMix {
    entries: Vec<(OperationKind, u32)>,
    total_weight: u32,
}

impl OperationMix {
    /// Build a mix from `(kind, weight)` pairs.
    pub fn new(entries: Vec<(OperationKind, u32)>) -> Result<Self, LoadError> {
        let total_weight = entries.iter().map(|(_, w)| w).sum();
        if total_weight == 0 {
            return Err(LoadError::EmptyMix);
        }
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Pick one operation by weight.
    fn choose(&self, rng: &mut StdRng) -> OperationKind {
        let mut roll = rng.gen_range(0..self.total_weight);
        for (kind, weight) in &self.entries {
            if roll < *weight {
                return *kind;
            }
            roll -= weight;
        }
        // Unreachable while total_weight equals the sum of weights;
        // fall back to the last entry rather than panicking.
        self.entries.last().map_or(OperationKind::HealthCheck, |(kind, _)| *kind)
    }
}

impl Default for OperationMix {
    /// The standard traffic mix: create:3, list:2, health:1.
    fn default() -> Self {
        Self {
            entries: vec![
                (OperationKind::CreateUser, 3),
                (OperationKind::ListUsers, 2),
                (OperationKind::HealthCheck, 1),
            ],
            total_weight: 6,
        }
    }
}

/// Summary of a completed load run. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Requests issued and completed (success or failure).
    pub total_requests: u64,

    /// Requests classified as failures; always `<= total_requests`.
    pub failed_requests: u64,

    /// Wall-clock length of the run.
    pub duration_seconds: f64,
}

impl LoadReport {
    /// `failed / total`; defined as 0 when no requests were issued.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }
}

/// Shared counter pair; the only mutable state workers share.
#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    failed: AtomicU64,
}

/// Runs a weighted operation mix at fixed concurrency for a fixed
/// duration.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    client: ApiClient,
    pacing: Option<(Duration, Duration)>,
}

impl LoadGenerator {
    /// Create a generator with the standard inter-request pacing
    /// (uniform 500ms..2s, the original traffic profile).
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            pacing: Some((Duration::from_millis(500), Duration::from_secs(2))),
        }
    }

    /// Override the inter-request pacing range.
    #[must_use]
    pub fn with_pacing(mut self, min: Duration, max: Duration) -> Self {
        self.pacing = Some((min, max));
        self
    }

    /// Disable pacing entirely (workers issue back to back).
    #[must_use]
    pub fn without_pacing(mut self) -> Self {
        self.pacing = None;
        self
    }

    /// Run the mix for `duration` at `concurrency`, waiting for every
    /// worker to drain before returning the report.
    pub async fn run(
        &self,
        mix: OperationMix,
        concurrency: usize,
        duration: Duration,
    ) -> LoadReport {
        self.run_until(mix, concurrency, duration, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but also stops early when `cancel`
    /// fires.
    ///
    /// Workers exit cooperatively: an in-flight request is finished and
    /// counted, then no new request is issued. The report only returns
    /// after the worker pool is fully drained, so no request leaks past
    /// this call.
    pub async fn run_until(
        &self,
        mix: OperationMix,
        concurrency: usize,
        duration: Duration,
        cancel: CancellationToken,
    ) -> LoadReport {
        let counters = Arc::new(Counters::default());
        let started = Instant::now();
        let deadline = started + duration;

        info!(
            target: "harness.load",
            concurrency,
            duration_secs = duration.as_secs_f64(),
            "Starting load generation"
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            let client = self.client.clone();
            let mix = mix.clone();
            let counters = Arc::clone(&counters);
            let cancel = cancel.clone();
            let pacing = self.pacing;

            workers.spawn(async move {
                let mut rng = StdRng::from_entropy();

                loop {
                    if Instant::now() >= deadline || cancel.is_cancelled() {
                        break;
                    }

                    let kind = mix.choose(&mut rng);
                    let succeeded = issue(&client, kind).await;

                    // Count before the next deadline check so an abrupt
                    // exit can never lose a completed request.
                    counters.total.fetch_add(1, Ordering::Relaxed);
                    if !succeeded {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                    }

                    if let Some((min, max)) = pacing {
                        let pause =
                            Duration::from_millis(rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64));
                        tokio::select! {
                            () = tokio::time::sleep(pause) => {}
                            () = cancel.cancelled() => break,
                        }
                    }
                }

                debug!(target: "harness.load", worker_id, "Load worker drained");
            });
        }

        while workers.join_next().await.is_some() {}

        let report = LoadReport {
            total_requests: counters.total.load(Ordering::Relaxed),
            failed_requests: counters.failed.load(Ordering::Relaxed),
            duration_seconds: started.elapsed().as_secs_f64(),
        };

        info!(
            target: "harness.load",
            total = report.total_requests,
            failed = report.failed_requests,
            error_rate = report.error_rate(),
            "Load generation complete"
        );

        report
    }
}

/// Issue one operation and classify the outcome.
///
/// The expected status (201 for create, 200 otherwise) counts as
/// success; any other status or transport-level error is a failure.
async fn issue(client: &ApiClient, kind: OperationKind) -> bool {
    match kind {
        OperationKind::CreateUser => {
            let id = Uuid::new_v4();
            let request = CreateUserRequest {
                name: format!("Load User {id}"),
                email: format!("load-{id}@test.com"),
                is_active: true,
            };
            client.create_user(&request).await.is_ok()
        }
        OperationKind::ListUsers => client.list_users().await.is_ok(),
        OperationKind::HealthCheck => client.health_check().await.is_ok(),
    }
}
