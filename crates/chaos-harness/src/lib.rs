//! Resilience-test orchestrator for a CRUD service and its datastore.
//!
//! This crate is the core of the recovery test harness: it controls the
//! lifecycle of the containers under test, injects failures at timed
//! points, generates concurrent synthetic traffic, polls for recovery
//! with a bounded budget, and validates post-chaos invariants.
//!
//! The CRUD service itself (users over a relational store) is an
//! external collaborator reached over HTTP; this crate never links
//! against it.
//!
//! # Components
//!
//! - [`process::ProcessController`] — start/stop/restart named units
//! - [`health::HealthMonitor`] — bounded health polling
//! - [`load::LoadGenerator`] — weighted concurrent traffic
//! - [`scenario::ChaosScenario`] — the timed phase orchestrator
//! - [`reset::StateReset`] — idempotent pre/post-scenario cleanup
//!
//! # Usage
//!
//! ```rust,ignore
//! use chaos_harness::config::HarnessConfig;
//! use chaos_harness::process::{DockerControl, ProcessController};
//! use chaos_harness::scenario::ChaosScenario;
//! use std::sync::Arc;
//!
//! let config = HarnessConfig::from_env()?;
//! let controller = ProcessController::new(Arc::new(DockerControl::new()));
//! let scenario = ChaosScenario::new(config, controller)?;
//! let outcome = scenario.run().await;
//! assert!(outcome.verdict.is_passed(), "{:?}", outcome.verdict);
//! ```

/// Module for the HTTP client fixture over the CRUD collaborator
pub mod client;

/// Module for environment-driven harness configuration
pub mod config;

/// Module for bounded health polling
pub mod health;

/// Module for the concurrent synthetic load generator
pub mod load;

/// Module for container lifecycle control
pub mod process;

/// Module for idempotent scenario state cleanup
pub mod reset;

/// Module for the chaos scenario orchestrator
pub mod scenario;

/// Module for chaos targets and actions
pub mod target;
