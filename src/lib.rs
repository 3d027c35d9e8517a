//! Capstan - A deployment reconciliation monitor
//!
//! Capstan watches durable deployment state and drives clusters toward it.
//! A single background worker runs reconciliation cycles at a fixed delay,
//! with support for:
//!
//! - Deployment lifecycle driving (start, cancel, monitor)
//! - Per-environment concurrency limits with emergency bypass
//! - Workload group scaling operations
//! - Environment sharding across instances via master/slave ownership
//! - Environment snapshots recorded onto finished deployments
//! - Pluggable cluster backends behind a cached handler abstraction

pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod registry;
pub mod status;
pub mod store;

pub use error::{CapstanError, Result};
