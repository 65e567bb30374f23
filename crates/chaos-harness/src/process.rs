//! Container lifecycle control.
//!
//! [`ProcessControl`] is the capability seam over whatever runtime is
//! available (the shipped adapter drives the `docker` CLI); tests
//! substitute [`mock::MockProcessControl`] and never touch a real
//! daemon. [`ProcessController`] applies [`ChaosAction`]s on top of an
//! adapter, serializing actions per target while letting distinct
//! targets proceed concurrently.

use crate::target::ChaosAction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lifecycle command errors.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The command could not be spawned at all.
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero.
    #[error("`{command}` exited with code {code:?}: {stderr}")]
    ExecutionFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Capability interface for unit lifecycle control.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Stop the named unit.
    async fn stop(&self, unit: &str) -> Result<(), ControlError>;

    /// Start the named unit.
    async fn start(&self, unit: &str) -> Result<(), ControlError>;

    /// Restart the named unit in a single lifecycle call, so there is
    /// no window where the unit is fully absent.
    async fn restart(&self, unit: &str) -> Result<(), ControlError>;
}

/// Adapter over the `docker` CLI.
#[derive(Debug, Default)]
pub struct DockerControl;

impl DockerControl {
    /// Create a new Docker adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, subcommand: &str, unit: &str) -> Result<(), ControlError> {
        let command = format!("docker {subcommand} {unit}");

        let output = Command::new("docker")
            .arg(subcommand)
            .arg(unit)
            .output()
            .await
            .map_err(|source| ControlError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ControlError::ExecutionFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ProcessControl for DockerControl {
    async fn stop(&self, unit: &str) -> Result<(), ControlError> {
        self.run("stop", unit).await
    }

    async fn start(&self, unit: &str) -> Result<(), ControlError> {
        self.run("start", unit).await
    }

    async fn restart(&self, unit: &str) -> Result<(), ControlError> {
        self.run("restart", unit).await
    }
}

/// Applies chaos actions through a [`ProcessControl`] adapter.
///
/// Actions against the same target are strictly serialized; actions
/// against different targets may run concurrently. No state is retained
/// between calls beyond the lock map and log history.
pub struct ProcessController {
    control: Arc<dyn ProcessControl>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProcessController {
    /// Create a controller over the given adapter.
    #[must_use]
    pub fn new(control: Arc<dyn ProcessControl>) -> Self {
        Self {
            control,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply a chaos action, blocking the calling task until the
    /// underlying command (and any settle delay) completes.
    ///
    /// `Start` and `Restart` sleep for the action's settle delay after
    /// the command returns. That delay is a minimum, not a readiness
    /// guarantee; callers still gate on the health monitor.
    pub async fn apply(&self, action: &ChaosAction) -> Result<(), ControlError> {
        let lock = self.lock_for(action.target().name()).await;
        let _guard = lock.lock().await;

        info!(
            target: "harness.process",
            unit = %action.target(),
            action = action.kind_name(),
            "Applying chaos action"
        );

        let result = match action {
            ChaosAction::Stop(target) => self.control.stop(target.name()).await,
            ChaosAction::Start { target, settle } => {
                self.control.start(target.name()).await?;
                tokio::time::sleep(*settle).await;
                Ok(())
            }
            ChaosAction::Restart { target, settle } => {
                self.control.restart(target.name()).await?;
                tokio::time::sleep(*settle).await;
                Ok(())
            }
        };

        match &result {
            Ok(()) => info!(
                target: "harness.process",
                unit = %action.target(),
                action = action.kind_name(),
                "Chaos action applied"
            ),
            Err(e) => warn!(
                target: "harness.process",
                unit = %action.target(),
                action = action.kind_name(),
                error = %e,
                "Chaos action failed"
            ),
        }

        result
    }

    async fn lock_for(&self, unit: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(unit.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Mock process control for testing.
///
/// Records every call and can be configured to fail or to hold each
/// call for a fixed latency (to exercise the per-target serialization).
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::{ControlError, ProcessControl};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// A recorded lifecycle event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ControlEvent {
        /// Unit the call was made against.
        pub unit: String,
        /// Operation name (`stop`, `start`, `restart`) with a
        /// `:begin` / `:end` suffix.
        pub phase: String,
    }

    /// Mock adapter that records calls instead of touching a runtime.
    #[derive(Debug, Default)]
    pub struct MockProcessControl {
        events: Mutex<Vec<ControlEvent>>,
        latency: Option<Duration>,
        failing: bool,
    }

    impl MockProcessControl {
        /// Create a mock whose calls all succeed immediately.
        #[must_use]
        pub fn succeeding() -> Self {
            Self::default()
        }

        /// Create a mock whose calls all fail with a non-zero exit.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        /// Create a mock that holds each call for `latency`.
        #[must_use]
        pub fn with_latency(latency: Duration) -> Self {
            Self {
                latency: Some(latency),
                ..Self::default()
            }
        }

        /// Snapshot of the recorded events, in call order.
        #[allow(clippy::expect_used)]
        pub fn events(&self) -> Vec<ControlEvent> {
            self.events.lock().expect("event log poisoned").clone()
        }

        /// Number of completed operations.
        pub fn call_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| e.phase.ends_with(":end"))
                .count()
        }

        #[allow(clippy::expect_used)]
        fn record(&self, unit: &str, phase: String) {
            self.events
                .lock()
                .expect("event log poisoned")
                .push(ControlEvent {
                    unit: unit.to_string(),
                    phase,
                });
        }

        async fn call(&self, op: &str, unit: &str) -> Result<(), ControlError> {
            self.record(unit, format!("{op}:begin"));

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let result = if self.failing {
                Err(ControlError::ExecutionFailed {
                    command: format!("mock {op} {unit}"),
                    code: Some(1),
                    stderr: format!("No such container: {unit}"),
                })
            } else {
                Ok(())
            };

            self.record(unit, format!("{op}:end"));
            result
        }
    }

    #[async_trait]
    impl ProcessControl for MockProcessControl {
        async fn stop(&self, unit: &str) -> Result<(), ControlError> {
            self.call("stop", unit).await
        }

        async fn start(&self, unit: &str) -> Result<(), ControlError> {
            self.call("start", unit).await
        }

        async fn restart(&self, unit: &str) -> Result<(), ControlError> {
            self.call("restart", unit).await
        }
    }
}
