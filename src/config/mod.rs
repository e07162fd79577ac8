//! Engine Configuration Module
//!
//! Provides the tunables for ingestion, aggregation, caching and the narrative
//! collaborators, loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `WELLLOG_CONFIG` environment variable (path to TOML file)
//! 2. `welllog.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! The loaded [`EngineConfig`] is handed to `WellLogService::new` at startup;
//! nothing reads configuration from global state.

mod engine_config;
pub mod defaults;

pub use engine_config::*;
