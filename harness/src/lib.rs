//! statbench — benchmark-orchestration harness
//!
//! Coordinates a two-party load test of the sysstatd server: one
//! invocation runs the *server role* (fixtures, launch, health check,
//! idle), a second invocation on a different host runs the *client
//! role* (drive the load tool across the scenario catalog, aggregate a
//! versioned report). This crate exports the components for use in
//! integration tests and the `statbench` binary.

pub mod catalog;
pub mod config;
pub mod driver;
pub mod fixtures;
pub mod health;
pub mod limits;
pub mod report;
pub mod supervisor;

// Re-export commonly used types
pub use catalog::TestScenario;
pub use config::{HarnessConfig, Role};
pub use report::Report;
