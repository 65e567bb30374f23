//! Shared fixtures for the integration suites.
//!
//! Every suite goes through these helpers so configuration, logging,
//! and state cleanup behave identically across test files. All fixtures
//! panic with actionable messages when the environment is missing;
//! "the stack is not running" should read as exactly that, not as an
//! opaque connection error deep inside an assertion.

use chaos_harness::client::ApiClient;
use chaos_harness::config::HarnessConfig;
use chaos_harness::health::HealthMonitor;
use chaos_harness::process::{DockerControl, ProcessController};
use chaos_harness::reset::StateReset;
use std::sync::Arc;
use std::sync::Once;

/// Initialize test logging once per process.
///
/// Controlled by `RUST_LOG`; defaults to quiet. Safe to call from every
/// test.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Load harness configuration from `HARNESS_*` environment variables.
pub fn config() -> HarnessConfig {
    init_logging();
    HarnessConfig::from_env().expect("invalid HARNESS_* configuration")
}

/// HTTP client against the service under test.
pub fn client(config: &HarnessConfig) -> ApiClient {
    ApiClient::new(config.base_url.clone(), config.http_timeout)
        .expect("failed to build HTTP client")
}

/// Process controller over the local Docker daemon.
pub fn controller() -> ProcessController {
    ProcessController::new(Arc::new(DockerControl::new()))
}

/// Block until the service answers its health endpoint, or fail the
/// test with setup guidance.
pub async fn require_healthy(config: &HarnessConfig) {
    let monitor = HealthMonitor::new(config.probe_timeout);
    let endpoint = format!("{}/health", config.base_url);
    let probe = monitor
        .wait_for_healthy(&endpoint, config.recovery_max_attempts, config.recovery_delay)
        .await;

    assert!(
        probe.recovered,
        "Service at {} is not healthy after {} probes - ensure the docker-compose stack is running",
        config.base_url,
        probe.attempts_made(),
    );
}

/// Delete all persisted entities so the test starts from a known state.
pub async fn clean_state(client: &ApiClient) {
    StateReset::new(client.clone()).reset().await;
}

/// A unique email so concurrent and repeated runs never collide on the
/// service's uniqueness constraint.
pub fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@test.com", uuid::Uuid::new_v4())
}
