//! Integration test suites for the chaos harness.
//!
//! These tests run against a live docker-compose stack (a FastAPI CRUD
//! service in front of Postgres) and are gated behind cargo features so
//! a plain `cargo test` never touches the environment:
//!
//! - `smoke`: fast API round trips, no container manipulation
//! - `recovery`: container restarts with recovery polling
//! - `load`: sustained load with a mid-run disruption
//!
//! Run with e.g. `cargo test -p resilience-tests --features smoke`.

pub mod fixtures;
