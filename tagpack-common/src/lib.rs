//! Tagpack Common
//!
//! Shared utilities for the tagpack crates.
//!
//! This crate provides:
//! - Component-based structured logging with an instance name as context
//! - Logging configuration that can be loaded with serde and applied to `env_logger`

pub mod logging;

pub use logging::{Component, ComponentKey, LogLevel, Logger, LoggingConfig};
