//! Analysis Configuration Module
//!
//! Provides the engine configuration loaded from TOML files, replacing all
//! hardcoded scoring constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `WEATHER_IMPACT_CONFIG` environment variable (path to TOML file)
//! 2. `weather_impact.toml` in the current working directory
//! 3. Built-in defaults (the reference scoring model)
//!
//! The loaded config is passed explicitly to `ImpactEngine::load`; there is
//! no process-wide config state.

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;
