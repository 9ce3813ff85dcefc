//! Service configuration
//!
//! Environment variables, database pool settings and the Hours-of-Service
//! policy used by the planner.

pub mod database;
pub mod environment;
pub mod hos_policy;

pub use database::DatabaseConfig;
pub use environment::{ConfigError, EnvironmentConfig};
pub use hos_policy::{HosPolicy, RestCheckMode};
