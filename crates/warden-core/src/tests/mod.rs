//! Cross-module tests for the world simulation.
//!
//! - `scenarios.rs`: end-to-end movement, collision and container scenarios
//! - `determinism.rs`: same seed and same calls give the same world
//! - `properties.rs`: proptest checks of the movement guarantees
//! - `helpers.rs`: world builders and hook counters

mod helpers;
mod scenarios;

pub use helpers::*;
