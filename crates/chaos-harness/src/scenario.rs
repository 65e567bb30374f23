//! The chaos scenario orchestrator.
//!
//! [`ChaosScenario`] owns the timeline of a resilience test: reset and
//! baseline check, background load, timed chaos injection, recovery
//! gate, load drain, and validation. It always completes with a
//! [`Verdict`] and a specific, inspectable failure reason; it never
//! leaves the test runner in an indeterminate state.
//!
//! The fixed-offset timing (sleep, then inject) is inherently racy
//! against real system load. Validation is therefore keyed on
//! thresholds, not on exact timing: a slightly early or late injection
//! changes the numbers, not the structure of the run.

use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::health::HealthMonitor;
use crate::load::{LoadGenerator, LoadReport, OperationMix};
use crate::process::ProcessController;
use crate::reset::StateReset;
use crate::target::{ChaosAction, Target, TargetKind};
use rand::seq::SliceRandom;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Phases of a scenario run, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Idle,
    BaselineCheck,
    LoadRunning,
    ChaosInjected,
    RecoveryWait,
    LoadDraining,
    Validating,
    Passed,
    Failed,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioState::Idle => "idle",
            ScenarioState::BaselineCheck => "baseline-check",
            ScenarioState::LoadRunning => "load-running",
            ScenarioState::ChaosInjected => "chaos-injected",
            ScenarioState::RecoveryWait => "recovery-wait",
            ScenarioState::LoadDraining => "load-draining",
            ScenarioState::Validating => "validating",
            ScenarioState::Passed => "passed",
            ScenarioState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Terminal failure reasons. Each carries the specific condition that
/// was violated.
#[derive(Debug, Clone, Error)]
pub enum ScenarioFailure {
    /// The pre-scenario reset could not establish an empty store.
    #[error("Baseline check failed: {0}")]
    Baseline(String),

    /// Scenario configuration is unusable (e.g. no targets declared).
    #[error("Scenario configuration error: {0}")]
    Configuration(String),

    /// The chaos injection itself could not be applied.
    #[error("Chaos action failed: {0}")]
    Control(String),

    /// The health monitor exhausted its probe budget.
    #[error("Service did not recover within {attempts} probes")]
    RecoveryTimeout { attempts: u32 },

    /// The scenario exceeded its global wall-clock budget.
    #[error("Scenario exceeded its global wall-clock budget")]
    ScenarioTimeout,

    /// Post-chaos error rate crossed the declared threshold.
    #[error("Error rate {actual:.3} exceeded threshold {threshold:.3}")]
    ErrorRateExceeded { actual: f64, threshold: f64 },

    /// The load run persisted nothing at all.
    #[error("No entities were persisted during the load run")]
    NoWritesObserved,
}

/// Pass/fail verdict of a completed scenario.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// All declared thresholds held.
    Passed,
    /// A threshold or phase failed; carries the violated condition.
    Failed(ScenarioFailure),
}

impl Verdict {
    /// True for [`Verdict::Passed`].
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Everything a test assertion needs from a finished scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Whether the health monitor observed recovery.
    pub recovered: bool,

    /// Load summary; absent when the run failed before the load task
    /// could be drained.
    pub load_report: Option<LoadReport>,

    /// Entity count observed during validation.
    pub final_entity_count: usize,

    /// Pass/fail plus reason.
    pub verdict: Verdict,
}

/// How the target of the chaos injection is picked.
#[derive(Debug, Clone)]
pub enum TargetSelection {
    /// Always disrupt this target.
    Fixed(Target),
    /// Pick uniformly at random among the declared targets.
    RandomOf(Vec<Target>),
}

impl TargetSelection {
    fn select(&self) -> Option<Target> {
        match self {
            TargetSelection::Fixed(target) => Some(target.clone()),
            TargetSelection::RandomOf(targets) => {
                targets.choose(&mut rand::thread_rng()).cloned()
            }
        }
    }
}

/// The disruption applied at the injection point.
#[derive(Debug, Clone)]
pub enum Disruption {
    /// Single restart lifecycle call.
    Restart,
    /// Stop, hold the unit down for `pause`, then start.
    StopStart {
        /// How long the unit stays down.
        pause: Duration,
    },
}

/// Orchestrates one resilience scenario end to end.
pub struct ChaosScenario {
    config: HarnessConfig,
    client: ApiClient,
    controller: Arc<ProcessController>,
    monitor: HealthMonitor,
    generator: LoadGenerator,
    reset: StateReset,
    selection: TargetSelection,
    disruption: Disruption,
    mix: OperationMix,
}

impl ChaosScenario {
    /// Build a scenario from configuration and a process controller.
    ///
    /// Defaults: random choice between the api and database containers,
    /// stop/start disruption with the configured pause, and the
    /// standard operation mix.
    ///
    /// # Errors
    ///
    /// Returns `crate::client::ApiError` if the HTTP client cannot be
    /// built.
    pub fn new(
        config: HarnessConfig,
        controller: ProcessController,
    ) -> Result<Self, crate::client::ApiError> {
        let client = ApiClient::new(config.base_url.clone(), config.http_timeout)?;
        let targets = vec![
            Target::new(config.api_container.clone(), TargetKind::Service),
            Target::new(config.database_container.clone(), TargetKind::Datastore),
        ];

        Ok(Self {
            monitor: HealthMonitor::new(config.probe_timeout),
            generator: LoadGenerator::new(client.clone()),
            reset: StateReset::new(client.clone()),
            selection: TargetSelection::RandomOf(targets),
            disruption: Disruption::StopStart {
                pause: config.chaos_pause,
            },
            mix: OperationMix::default(),
            client,
            controller: Arc::new(controller),
            config,
        })
    }

    /// Override how the chaos target is picked.
    #[must_use]
    pub fn with_target_selection(mut self, selection: TargetSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Override the disruption style.
    #[must_use]
    pub fn with_disruption(mut self, disruption: Disruption) -> Self {
        self.disruption = disruption;
        self
    }

    /// Override the traffic mix.
    #[must_use]
    pub fn with_mix(mut self, mix: OperationMix) -> Self {
        self.mix = mix;
        self
    }

    /// Override the load generator (e.g. to change pacing).
    #[must_use]
    pub fn with_generator(mut self, generator: LoadGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Run the scenario to a terminal verdict.
    ///
    /// Never returns early with load workers still in flight: every
    /// exit path cancels and drains the background load task first.
    pub async fn run(&self) -> ScenarioOutcome {
        let budget = Instant::now() + self.config.scenario_budget;

        self.enter(ScenarioState::Idle);
        self.enter(ScenarioState::BaselineCheck);
        self.reset.reset().await;

        match self.client.list_users().await {
            Ok(users) if users.is_empty() => {}
            Ok(users) => {
                return self.conclude(ScenarioOutcome {
                    recovered: false,
                    load_report: None,
                    final_entity_count: users.len(),
                    verdict: Verdict::Failed(ScenarioFailure::Baseline(format!(
                        "expected empty store, found {} entities",
                        users.len()
                    ))),
                })
                .await;
            }
            Err(e) => {
                return self.conclude(ScenarioOutcome {
                    recovered: false,
                    load_report: None,
                    final_entity_count: 0,
                    verdict: Verdict::Failed(ScenarioFailure::Baseline(e.to_string())),
                })
                .await;
            }
        }

        let Some(target) = self.selection.select() else {
            return self
                .conclude(ScenarioOutcome {
                    recovered: false,
                    load_report: None,
                    final_entity_count: 0,
                    verdict: Verdict::Failed(ScenarioFailure::Configuration(
                        "no chaos targets declared".to_string(),
                    )),
                })
                .await;
        };

        // Background load runs independently of the phases below.
        self.enter(ScenarioState::LoadRunning);
        let cancel = CancellationToken::new();
        let mut load_task: JoinHandle<LoadReport> = {
            let generator = self.generator.clone();
            let mix = self.mix.clone();
            let cancel = cancel.clone();
            let concurrency = self.config.load_concurrency;
            let duration = self.config.load_duration;
            tokio::spawn(async move { generator.run_until(mix, concurrency, duration, cancel).await })
        };

        // Fixed offset before injection, overlapped with the load.
        if timeout_at(budget, tokio::time::sleep(self.config.chaos_offset))
            .await
            .is_err()
        {
            return self.abort_on_budget(cancel, load_task).await;
        }

        self.enter(ScenarioState::ChaosInjected);
        warn!(
            target: "harness.scenario",
            unit = %target,
            "CHAOS INJECTION: disrupting target under load"
        );

        let injection = self.inject(&target);
        match timeout_at(budget, injection).await {
            Err(_) => return self.abort_on_budget(cancel, load_task).await,
            Ok(Err(e)) => {
                let report = drain(&cancel, load_task).await;
                return self
                    .conclude(ScenarioOutcome {
                        recovered: false,
                        load_report: report,
                        final_entity_count: 0,
                        verdict: Verdict::Failed(ScenarioFailure::Control(e.to_string())),
                    })
                    .await;
            }
            Ok(Ok(())) => {}
        }

        // The injection fully completes before polling starts.
        self.enter(ScenarioState::RecoveryWait);
        let health_endpoint = format!("{}/health", self.config.base_url);
        let probe = match timeout_at(
            budget,
            self.monitor.wait_for_healthy(
                &health_endpoint,
                self.config.recovery_max_attempts,
                self.config.recovery_delay,
            ),
        )
        .await
        {
            Err(_) => return self.abort_on_budget(cancel, load_task).await,
            Ok(probe) => probe,
        };

        if !probe.recovered {
            let report = drain(&cancel, load_task).await;
            return self
                .conclude(ScenarioOutcome {
                    recovered: false,
                    load_report: report,
                    final_entity_count: 0,
                    verdict: Verdict::Failed(ScenarioFailure::RecoveryTimeout {
                        attempts: probe.attempts_made(),
                    }),
                })
                .await;
        }

        self.enter(ScenarioState::LoadDraining);
        let drain_deadline = budget.min(Instant::now() + self.config.load_wait_timeout);
        let report = match timeout_at(drain_deadline, &mut load_task).await {
            Ok(Ok(report)) => {
                info!(target: "harness.scenario", "Load task completed cleanly");
                Some(report)
            }
            Ok(Err(e)) => {
                warn!(
                    target: "harness.scenario",
                    error = %e,
                    "Load task panicked or was aborted; proceeding without a report"
                );
                None
            }
            Err(_) => {
                if Instant::now() >= budget {
                    return self.abort_on_budget(cancel, load_task).await;
                }
                // Distinct from a clean completion: the generator was
                // terminated forcibly and the report is partial.
                warn!(
                    target: "harness.scenario",
                    "Load task did not finish within the wait timeout; terminating it"
                );
                drain(&cancel, load_task).await
            }
        };

        self.enter(ScenarioState::Validating);
        let final_entity_count = match self.client.list_users().await {
            Ok(users) => users.len(),
            Err(e) => {
                warn!(
                    target: "harness.scenario",
                    error = %e,
                    "Unable to count entities during validation"
                );
                0
            }
        };

        let verdict = self.validate(report.as_ref(), final_entity_count);
        self.conclude(ScenarioOutcome {
            recovered: true,
            load_report: report,
            final_entity_count,
            verdict,
        })
        .await
    }

    /// Apply the configured disruption to `target`, compensating so the
    /// unit is running again when this returns.
    async fn inject(&self, target: &Target) -> Result<(), crate::process::ControlError> {
        let settle = self.config.settle_delay;
        match &self.disruption {
            Disruption::Restart => {
                self.controller
                    .apply(&ChaosAction::Restart {
                        target: target.clone(),
                        settle,
                    })
                    .await
            }
            Disruption::StopStart { pause } => {
                self.controller
                    .apply(&ChaosAction::Stop(target.clone()))
                    .await?;
                tokio::time::sleep(*pause).await;
                self.controller
                    .apply(&ChaosAction::Start {
                        target: target.clone(),
                        settle,
                    })
                    .await
            }
        }
    }

    /// Threshold checks, in declared order.
    fn validate(&self, report: Option<&LoadReport>, final_entity_count: usize) -> Verdict {
        if let Some(report) = report {
            let actual = report.error_rate();
            if actual >= self.config.error_rate_threshold {
                return Verdict::Failed(ScenarioFailure::ErrorRateExceeded {
                    actual,
                    threshold: self.config.error_rate_threshold,
                });
            }
        }

        if final_entity_count == 0 {
            return Verdict::Failed(ScenarioFailure::NoWritesObserved);
        }

        Verdict::Passed
    }

    /// Global budget exceeded: cancel the load, drain it, fail.
    async fn abort_on_budget(
        &self,
        cancel: CancellationToken,
        load_task: JoinHandle<LoadReport>,
    ) -> ScenarioOutcome {
        warn!(
            target: "harness.scenario",
            budget_secs = self.config.scenario_budget.as_secs_f64(),
            "Scenario exceeded its wall-clock budget; cancelling load"
        );
        let report = drain(&cancel, load_task).await;
        self.conclude(ScenarioOutcome {
            recovered: false,
            load_report: report,
            final_entity_count: 0,
            verdict: Verdict::Failed(ScenarioFailure::ScenarioTimeout),
        })
        .await
    }

    /// Post-scenario bracket: reset state, log the terminal phase.
    async fn conclude(&self, outcome: ScenarioOutcome) -> ScenarioOutcome {
        self.reset.reset().await;

        match &outcome.verdict {
            Verdict::Passed => self.enter(ScenarioState::Passed),
            Verdict::Failed(reason) => {
                warn!(
                    target: "harness.scenario",
                    reason = %reason,
                    "Scenario failed"
                );
                self.enter(ScenarioState::Failed);
            }
        }

        outcome
    }

    fn enter(&self, state: ScenarioState) {
        info!(target: "harness.scenario", state = %state, "Scenario phase");
    }
}

/// Cancel the load task and wait for its worker pool to drain.
///
/// Returns whatever (possibly partial) report the generator produced.
async fn drain(
    cancel: &CancellationToken,
    load_task: JoinHandle<LoadReport>,
) -> Option<LoadReport> {
    cancel.cancel();
    match load_task.await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(
                target: "harness.scenario",
                error = %e,
                "Load task did not shut down cleanly"
            );
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::process::mock::MockProcessControl;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER_JSON: &str =
        r#"{"id": 1, "name": "Load User", "email": "load@test.com", "is_active": true}"#;

    /// Fast timings so a full scenario completes in about a second.
    fn fast_config(base_url: &str) -> HarnessConfig {
        let vars = HashMap::from([
            ("HARNESS_BASE_URL".to_string(), base_url.to_string()),
            ("HARNESS_SETTLE_DELAY_SECONDS".to_string(), "0".to_string()),
            ("HARNESS_CHAOS_PAUSE_SECONDS".to_string(), "0".to_string()),
            ("HARNESS_LOAD_DURATION_SECONDS".to_string(), "1".to_string()),
            ("HARNESS_LOAD_CONCURRENCY".to_string(), "3".to_string()),
            ("HARNESS_CHAOS_OFFSET_SECONDS".to_string(), "0".to_string()),
            ("HARNESS_RECOVERY_MAX_ATTEMPTS".to_string(), "3".to_string()),
            ("HARNESS_RECOVERY_DELAY_MS".to_string(), "50".to_string()),
            ("HARNESS_PROBE_TIMEOUT_MS".to_string(), "200".to_string()),
            (
                "HARNESS_LOAD_WAIT_TIMEOUT_SECONDS".to_string(),
                "10".to_string(),
            ),
            (
                "HARNESS_SCENARIO_BUDGET_SECONDS".to_string(),
                "30".to_string(),
            ),
            ("HARNESS_HTTP_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);
        HarnessConfig::from_vars(&vars).unwrap()
    }

    fn scenario_with(
        config: HarnessConfig,
        control: Arc<MockProcessControl>,
    ) -> ChaosScenario {
        let client =
            ApiClient::new(config.base_url.clone(), config.http_timeout).unwrap();
        let generator = LoadGenerator::new(client)
            .with_pacing(Duration::from_millis(5), Duration::from_millis(15));
        ChaosScenario::new(config, ProcessController::new(control))
            .unwrap()
            .with_generator(generator)
    }

    /// Mount the service mocks: empty store for the pre-run reset and
    /// the baseline check, then a populated store for the rest of the
    /// run.
    async fn mount_crud(server: &MockServer, healthy: bool) {
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .up_to_n_times(2)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([serde_json::from_str::<serde_json::Value>(USER_JSON).unwrap()])),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::from_str::<serde_json::Value>(USER_JSON).unwrap()),
            )
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(if healthy { 200 } else { 503 }))
            .mount(server)
            .await;
    }

    #[test]
    fn test_verdict_is_passed() {
        assert!(Verdict::Passed.is_passed());
        assert!(!Verdict::Failed(ScenarioFailure::ScenarioTimeout).is_passed());
    }

    #[test]
    fn test_fixed_selection_always_picks_its_target() {
        let target = Target::new("recovery_fastapi", TargetKind::Service);
        let selection = TargetSelection::Fixed(target.clone());
        for _ in 0..10 {
            assert_eq!(selection.select(), Some(target.clone()));
        }
    }

    #[test]
    fn test_random_selection_picks_a_declared_target() {
        let targets = vec![
            Target::new("recovery_fastapi", TargetKind::Service),
            Target::new("recovery_postgres", TargetKind::Datastore),
        ];
        let selection = TargetSelection::RandomOf(targets.clone());
        for _ in 0..20 {
            let picked = selection.select().unwrap();
            assert!(targets.contains(&picked));
        }
    }

    #[test]
    fn test_empty_random_selection_yields_none() {
        assert!(TargetSelection::RandomOf(vec![]).select().is_none());
    }

    #[tokio::test]
    async fn test_scenario_passes_when_service_recovers() {
        let server = MockServer::start().await;
        mount_crud(&server, true).await;

        let control = Arc::new(MockProcessControl::succeeding());
        let scenario = scenario_with(fast_config(&server.uri()), control.clone());

        let outcome = scenario.run().await;

        assert!(outcome.verdict.is_passed(), "verdict: {:?}", outcome.verdict);
        assert!(outcome.recovered);
        assert!(outcome.final_entity_count > 0);

        let report = outcome.load_report.expect("clean run produces a report");
        assert!(report.total_requests > 0);
        assert!(report.failed_requests <= report.total_requests);

        // The default disruption is stop-then-start against one target.
        let events = control.events();
        assert!(events.iter().any(|e| e.phase == "stop:begin"));
        assert!(events.iter().any(|e| e.phase == "start:end"));
    }

    #[tokio::test]
    async fn test_scenario_fails_with_recovery_timeout_when_health_stays_down() {
        let server = MockServer::start().await;
        mount_crud(&server, false).await;

        let control = Arc::new(MockProcessControl::succeeding());
        let scenario = scenario_with(fast_config(&server.uri()), control)
            .with_disruption(Disruption::Restart);

        let outcome = tokio::time::timeout(Duration::from_secs(20), scenario.run())
            .await
            .expect("scenario must terminate on its own");

        assert!(!outcome.recovered);
        match outcome.verdict {
            Verdict::Failed(ScenarioFailure::RecoveryTimeout { attempts }) => {
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RecoveryTimeout, got {other:?}"),
        }
        // The load task was drained, so a (partial) report exists.
        assert!(outcome.load_report.is_some());
    }

    #[tokio::test]
    async fn test_scenario_times_out_against_global_budget() {
        let server = MockServer::start().await;
        mount_crud(&server, true).await;

        let mut config = fast_config(&server.uri());
        config.scenario_budget = Duration::from_millis(300);
        config.chaos_offset = Duration::from_secs(5);
        config.load_duration = Duration::from_secs(10);
        config.load_wait_timeout = Duration::from_secs(20);

        let control = Arc::new(MockProcessControl::succeeding());
        let scenario = scenario_with(config, control);

        let outcome = tokio::time::timeout(Duration::from_secs(10), scenario.run())
            .await
            .expect("budget abort must cancel and drain the load promptly");

        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(ScenarioFailure::ScenarioTimeout)
        ));
        assert!(!outcome.recovered);
    }

    #[tokio::test]
    async fn test_scenario_fails_baseline_when_store_is_not_empty() {
        let server = MockServer::start().await;
        // The store stubbornly reports one entity, so neither the reset
        // nor the baseline check can establish emptiness.
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([serde_json::from_str::<serde_json::Value>(USER_JSON).unwrap()])),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let control = Arc::new(MockProcessControl::succeeding());
        let scenario = scenario_with(fast_config(&server.uri()), control.clone());

        let outcome = scenario.run().await;

        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(ScenarioFailure::Baseline(_))
        ));
        // Nothing was ever injected.
        assert_eq!(control.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scenario_fails_when_error_rate_crosses_threshold() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([serde_json::from_str::<serde_json::Value>(USER_JSON).unwrap()])),
            )
            .mount(&server)
            .await;
        // Every create fails: with the 3:2:1 mix roughly half the
        // traffic errors, far above the 30% threshold.
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let control = Arc::new(MockProcessControl::succeeding());
        let scenario = scenario_with(fast_config(&server.uri()), control)
            .with_disruption(Disruption::Restart);

        let outcome = scenario.run().await;

        match outcome.verdict {
            Verdict::Failed(ScenarioFailure::ErrorRateExceeded { actual, threshold }) => {
                assert!(actual >= threshold);
            }
            other => panic!("expected ErrorRateExceeded, got {other:?}"),
        }
        assert!(outcome.recovered);
    }

    #[tokio::test]
    async fn test_chaos_action_failure_fails_the_scenario() {
        let server = MockServer::start().await;
        mount_crud(&server, true).await;

        let control = Arc::new(MockProcessControl::failing());
        let scenario = scenario_with(fast_config(&server.uri()), control);

        let outcome = scenario.run().await;

        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(ScenarioFailure::Control(_))
        ));
        assert!(!outcome.recovered);
    }
}
