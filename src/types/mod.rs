//! Shared data structures for weather impact analysis
//!
//! - Weather: historical events, query events, the 5-feature vector
//! - Asset: registry entries, criticality tiers, historical incidents
//! - Risk: similarity matches, impact aggregates, per-asset risk results

mod asset;
mod risk;
mod weather;

pub use asset::*;
pub use risk::*;
pub use weather::*;
