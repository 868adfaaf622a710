//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the club sync core:
//! - Logging and tracing infrastructure
//! - Configuration management (builder, environment, validation)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the explicit configuration
//! object that is threaded through the service instead of global state.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, BatchLimits, CoreConfig, CoreConfigBuilder, SyncConfig};
pub use error::{Error, Result};
