//! # Warden Core
//!
//! Server-authoritative 2D world simulation for Warden.
//!
//! This crate owns the agents of a bounded world, moves them on request and
//! decides whether each move is legal. It reports what happened through agent
//! hooks and a serializable event journal. Rendering, assets and networking
//! live elsewhere and read agent state through [`Environment`].
//!
//! ## Architecture
//!
//! - **Environment**: the single owner of every agent, the world boundary and
//!   the [`tessera::SegmentGrid`] used as a broad phase
//! - **Movement**: validate, then commit. Boundary checks run before any
//!   spatial query; solid pairs collide, visible pairs overlap
//! - **Containers**: agents that move a group of members all-or-nothing
//! - **Hooks and events**: optional per-agent closures plus a journal of
//!   [`WorldEvent`]s
//!
//! ## Usage
//!
//! ```
//! use tessera::Vector;
//! use warden_core::{Environment, WorldConfig};
//!
//! let mut env = Environment::new(WorldConfig::with_size(100.0, 100.0)).unwrap();
//! let a = env.create_agent("a.png", 10.0, 10.0, true, 50.0, 50.0).unwrap();
//! env.create_agent("b.png", 10.0, 10.0, true, 65.0, 50.0).unwrap();
//!
//! // Blocked by the solid wall
//! assert!(!env.move_agent(a, Vector::new(20.0, 0.0), false));
//! assert_eq!(env.get(a).unwrap().position(), Vector::new(50.0, 50.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export tessera for geometry
pub use tessera;

pub mod agent;
pub mod config;
pub mod container;
pub mod environment;
pub mod error;
pub mod events;
pub mod movement;
mod overlap;

#[cfg(test)]
mod tests;

pub use agent::{
    Agent, AgentFlags, AgentHooks, AgentId, AgentKind, AgentSpec, ImageRef, SensingState,
    TurnableState,
};
pub use config::WorldConfig;
pub use container::{ContainerState, Layout};
pub use environment::{AgentSnapshot, Environment};
pub use error::WorldError;
pub use events::{EventJournal, WorldEvent};
pub use movement::MoveRejection;
