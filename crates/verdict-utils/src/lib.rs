//! Shared utilities for verdict
//!
//! Logging setup for binaries and the layered application configuration.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, ModelConfig};
pub use logging::{LogFormat, init_tracing};
