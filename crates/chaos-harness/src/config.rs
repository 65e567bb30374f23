//! Harness configuration.
//!
//! Configuration is loaded from environment variables with defaults
//! matching the docker-compose stack the suite runs against. Timing
//! offsets are configuration, not constants: chaos injection is
//! inherently racy against real system load, so thresholds carry the
//! validation weight, not exact timing.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default base URL of the CRUD service under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default container name of the HTTP service.
pub const DEFAULT_API_CONTAINER: &str = "recovery_fastapi";

/// Default container name of the datastore.
pub const DEFAULT_DB_CONTAINER: &str = "recovery_postgres";

/// Default settle delay after a start/restart, in seconds.
pub const DEFAULT_SETTLE_DELAY_SECONDS: u64 = 10;

/// Default pause between stop and start in a stop/start disruption.
pub const DEFAULT_CHAOS_PAUSE_SECONDS: u64 = 3;

/// Default sustained load duration, in seconds.
pub const DEFAULT_LOAD_DURATION_SECONDS: u64 = 60;

/// Default number of concurrent load workers.
pub const DEFAULT_LOAD_CONCURRENCY: usize = 10;

/// Default offset from load start to chaos injection, in seconds.
pub const DEFAULT_CHAOS_OFFSET_SECONDS: u64 = 30;

/// Default recovery polling budget (attempts x delay).
pub const DEFAULT_RECOVERY_MAX_ATTEMPTS: u32 = 30;

/// Default delay between recovery probes, in milliseconds.
pub const DEFAULT_RECOVERY_DELAY_MS: u64 = 1000;

/// Default per-probe HTTP timeout, in milliseconds.
///
/// Kept strictly below the recovery delay so a hung probe cannot starve
/// the retry budget.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 500;

/// Default acceptable error rate after a chaos run.
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.30;

/// Default bound on waiting for the background load task to drain.
pub const DEFAULT_LOAD_WAIT_TIMEOUT_SECONDS: u64 = 120;

/// Default global wall-clock budget for a whole scenario.
pub const DEFAULT_SCENARIO_BUDGET_SECONDS: u64 = 300;

/// Default minimum fraction of concurrent creates that must succeed
/// under connection-pool pressure.
pub const DEFAULT_MIN_SUCCESS_FRACTION: f64 = 0.5;

/// Default timeout for ordinary CRUD requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid threshold {key}={value}: must be within (0, 1]")]
    InvalidThreshold { key: String, value: f64 },

    #[error("Load wait timeout ({wait:?}) must exceed load duration ({duration:?})")]
    LoadWaitTooShort { wait: Duration, duration: Duration },

    #[error("{key} must be at least 1")]
    ZeroNotAllowed { key: String },
}

/// Harness configuration, loaded from environment variables.
///
/// All fields have defaults; no variable is required.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the CRUD service under test.
    pub base_url: String,

    /// Container name of the HTTP service.
    pub api_container: String,

    /// Container name of the datastore.
    pub database_container: String,

    /// Minimum wait after a start/restart before the caller proceeds.
    pub settle_delay: Duration,

    /// Pause between stop and start in a stop/start disruption.
    pub chaos_pause: Duration,

    /// Sustained load duration.
    pub load_duration: Duration,

    /// Number of concurrent load workers.
    pub load_concurrency: usize,

    /// Offset from load start to chaos injection.
    pub chaos_offset: Duration,

    /// Maximum health probes before declaring recovery failed.
    pub recovery_max_attempts: u32,

    /// Delay between health probes.
    pub recovery_delay: Duration,

    /// Per-probe HTTP timeout.
    pub probe_timeout: Duration,

    /// Maximum acceptable `failed / total` after a chaos run.
    pub error_rate_threshold: f64,

    /// Bound on waiting for the background load task; must exceed
    /// `load_duration` to absorb the chaos delay.
    pub load_wait_timeout: Duration,

    /// Global wall-clock budget for a whole scenario.
    pub scenario_budget: Duration,

    /// Minimum fraction of concurrent creates that must succeed under
    /// connection-pool pressure.
    pub min_success_fraction: f64,

    /// Timeout for ordinary CRUD requests.
    pub http_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_container: DEFAULT_API_CONTAINER.to_string(),
            database_container: DEFAULT_DB_CONTAINER.to_string(),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECONDS),
            chaos_pause: Duration::from_secs(DEFAULT_CHAOS_PAUSE_SECONDS),
            load_duration: Duration::from_secs(DEFAULT_LOAD_DURATION_SECONDS),
            load_concurrency: DEFAULT_LOAD_CONCURRENCY,
            chaos_offset: Duration::from_secs(DEFAULT_CHAOS_OFFSET_SECONDS),
            recovery_max_attempts: DEFAULT_RECOVERY_MAX_ATTEMPTS,
            recovery_delay: Duration::from_millis(DEFAULT_RECOVERY_DELAY_MS),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD,
            load_wait_timeout: Duration::from_secs(DEFAULT_LOAD_WAIT_TIMEOUT_SECONDS),
            scenario_budget: Duration::from_secs(DEFAULT_SCENARIO_BUDGET_SECONDS),
            min_success_fraction: DEFAULT_MIN_SUCCESS_FRACTION,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            base_url: vars
                .get("HARNESS_BASE_URL")
                .cloned()
                .unwrap_or(defaults.base_url),
            api_container: vars
                .get("HARNESS_API_CONTAINER")
                .cloned()
                .unwrap_or(defaults.api_container),
            database_container: vars
                .get("HARNESS_DB_CONTAINER")
                .cloned()
                .unwrap_or(defaults.database_container),
            settle_delay: secs_var(vars, "HARNESS_SETTLE_DELAY_SECONDS", defaults.settle_delay)?,
            chaos_pause: secs_var(vars, "HARNESS_CHAOS_PAUSE_SECONDS", defaults.chaos_pause)?,
            load_duration: secs_var(
                vars,
                "HARNESS_LOAD_DURATION_SECONDS",
                defaults.load_duration,
            )?,
            load_concurrency: parse_var(
                vars,
                "HARNESS_LOAD_CONCURRENCY",
                defaults.load_concurrency,
            )?,
            chaos_offset: secs_var(vars, "HARNESS_CHAOS_OFFSET_SECONDS", defaults.chaos_offset)?,
            recovery_max_attempts: parse_var(
                vars,
                "HARNESS_RECOVERY_MAX_ATTEMPTS",
                defaults.recovery_max_attempts,
            )?,
            recovery_delay: millis_var(
                vars,
                "HARNESS_RECOVERY_DELAY_MS",
                defaults.recovery_delay,
            )?,
            probe_timeout: millis_var(vars, "HARNESS_PROBE_TIMEOUT_MS", defaults.probe_timeout)?,
            error_rate_threshold: parse_var(
                vars,
                "HARNESS_ERROR_RATE_THRESHOLD",
                defaults.error_rate_threshold,
            )?,
            load_wait_timeout: secs_var(
                vars,
                "HARNESS_LOAD_WAIT_TIMEOUT_SECONDS",
                defaults.load_wait_timeout,
            )?,
            scenario_budget: secs_var(
                vars,
                "HARNESS_SCENARIO_BUDGET_SECONDS",
                defaults.scenario_budget,
            )?,
            min_success_fraction: parse_var(
                vars,
                "HARNESS_MIN_SUCCESS_FRACTION",
                defaults.min_success_fraction,
            )?,
            http_timeout: secs_var(vars, "HARNESS_HTTP_TIMEOUT_SECONDS", defaults.http_timeout)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_rate_threshold <= 0.0 || self.error_rate_threshold > 1.0 {
            return Err(ConfigError::InvalidThreshold {
                key: "HARNESS_ERROR_RATE_THRESHOLD".to_string(),
                value: self.error_rate_threshold,
            });
        }
        if self.min_success_fraction <= 0.0 || self.min_success_fraction > 1.0 {
            return Err(ConfigError::InvalidThreshold {
                key: "HARNESS_MIN_SUCCESS_FRACTION".to_string(),
                value: self.min_success_fraction,
            });
        }
        if self.load_wait_timeout <= self.load_duration {
            return Err(ConfigError::LoadWaitTooShort {
                wait: self.load_wait_timeout,
                duration: self.load_duration,
            });
        }
        if self.load_concurrency == 0 {
            return Err(ConfigError::ZeroNotAllowed {
                key: "HARNESS_LOAD_CONCURRENCY".to_string(),
            });
        }
        if self.recovery_max_attempts == 0 {
            return Err(ConfigError::ZeroNotAllowed {
                key: "HARNESS_RECOVERY_MAX_ATTEMPTS".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse an optional variable, falling back to a default.
fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

/// Parse an optional whole-seconds duration variable.
fn secs_var(
    vars: &HashMap<String, String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parse_var(
        vars,
        key,
        default.as_secs(),
    )?))
}

/// Parse an optional milliseconds duration variable.
fn millis_var(
    vars: &HashMap<String, String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(parse_var(
        vars,
        key,
        default.as_millis() as u64,
    )?))
}
