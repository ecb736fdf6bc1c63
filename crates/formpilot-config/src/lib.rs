//! # FormPilot Config
//!
//! TOML configuration with environment variable substitution.
//!
//! The safety section fails closed: a missing or unreadable configuration
//! yields an empty domain whitelist, a zero submission quota, and mandatory
//! confirmation.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CompanionConfig, Config, ExecutorConfig, PlannerConfig, SafetyConfig};
