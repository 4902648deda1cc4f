//! Agent types for the Warden world.
//!
//! This module provides the core agent types:
//! - [`AgentId`]: Unique identifier assigned by the [`Environment`](crate::environment::Environment)
//! - [`AgentFlags`]: Liveness, solidity and visibility bits
//! - [`AgentKind`]: Regular agent, camera pseudo-agent, or container
//! - [`Agent`]: The complete agent record owned by the environment
//! - [`AgentSpec`]: Builder consumed by the agent factory
//!
//! # Ownership
//!
//! Agents live in the environment's registry. Everything else (the segment
//! grid, containers, event hooks) refers to them by [`AgentId`] only. An
//! agent's rectangle can only change through the environment so the grid
//! never goes stale.
//!
//! # Example
//!
//! ```
//! use warden_core::agent::AgentSpec;
//! use warden_core::environment::Environment;
//! use warden_core::config::WorldConfig;
//! use tessera::{Rectangle, Vector};
//!
//! let mut env = Environment::new(WorldConfig::default()).unwrap();
//! let id = env
//!     .create_agent_from_spec(
//!         AgentSpec::new(Rectangle::new(Vector::new(50.0, 50.0), Vector::new(10.0, 10.0)))
//!             .solid(true)
//!             .image("crate.png"),
//!     )
//!     .unwrap();
//!
//! let agent = env.get(id).unwrap();
//! assert!(agent.is_solid());
//! assert_eq!(agent.image().map(|i| i.as_str()), Some("crate.png"));
//! ```

pub mod capabilities;
pub mod hooks;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tessera::{Rectangle, Vector};

use crate::container::ContainerState;

pub use capabilities::{SensingState, TurnableState};
pub use hooks::{AgentHook, AgentHooks, PairHook, SenseHook};

/// Unique identifier for an agent.
///
/// Ids are assigned monotonically by the environment and never reused, so
/// ordering by id is creation order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Creates a new `AgentId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<AgentId> for u64 {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

bitflags! {
    /// State bits carried by every agent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AgentFlags: u8 {
        /// Registered and not yet killed
        const ALIVE = 1;
        /// Blocks other solid agents
        const SOLID = 1 << 1;
        /// Drawn by the presentation layer and eligible for overlap events
        const VISIBLE = 1 << 2;
    }
}

/// Opaque reference to an image asset, resolved by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a new image reference.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of agent this is.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentKind {
    /// Ordinary agent subject to movement validation
    Regular,
    /// Viewport pseudo-agent: always force-moves, never collides or overlaps
    Camera,
    /// Rigid group of member agents
    Container(ContainerState),
}

/// A rectangle-bounded entity in the world.
///
/// Agents are created by the environment's factory methods and are only
/// reachable through it. Rectangle and visibility changes go through the
/// environment so the segment grid and the visibility hooks stay in sync.
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) rectangle: Rectangle,
    pub(crate) flags: AgentFlags,
    pub(crate) kind: AgentKind,
    pub(crate) image: Option<ImageRef>,
    pub(crate) container: Option<AgentId>,
    pub(crate) hooks: AgentHooks,
    pub(crate) turnable: Option<TurnableState>,
    pub(crate) sensing: Option<SensingState>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("rectangle", &self.rectangle)
            .field("flags", &self.flags)
            .field("kind", &self.kind)
            .field("image", &self.image)
            .field("container", &self.container)
            .field("hooks", &self.hooks)
            .field("turnable", &self.turnable)
            .field("sensing", &self.sensing)
            .finish()
    }
}

impl Agent {
    pub(crate) fn from_spec(id: AgentId, spec: AgentSpec) -> Self {
        let mut flags = AgentFlags::ALIVE;
        flags.set(AgentFlags::SOLID, spec.solid);
        flags.set(AgentFlags::VISIBLE, spec.visible);
        Self {
            id,
            rectangle: spec.rectangle,
            flags,
            kind: spec.kind,
            image: spec.image,
            container: None,
            hooks: spec.hooks,
            turnable: spec.turnable,
            sensing: spec.sensing,
        }
    }

    /// The agent's unique identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current bounding rectangle.
    #[must_use]
    pub const fn rectangle(&self) -> &Rectangle {
        &self.rectangle
    }

    /// Center of the bounding rectangle.
    #[must_use]
    pub fn position(&self) -> Vector {
        self.rectangle.center()
    }

    /// Size of the bounding rectangle.
    #[must_use]
    pub fn size(&self) -> Vector {
        self.rectangle.size()
    }

    /// Raw state bits.
    #[must_use]
    pub const fn flags(&self) -> AgentFlags {
        self.flags
    }

    /// Returns `true` until the agent is killed.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.flags.contains(AgentFlags::ALIVE)
    }

    /// Returns `true` if the agent blocks other solid agents.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.flags.contains(AgentFlags::SOLID)
    }

    /// Returns `true` if the agent is visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.flags.contains(AgentFlags::VISIBLE)
    }

    /// Change solidity. Takes effect from the next move check.
    pub fn set_solid(&mut self, solid: bool) {
        self.flags.set(AgentFlags::SOLID, solid);
    }

    /// Agent kind.
    #[must_use]
    pub const fn kind(&self) -> &AgentKind {
        &self.kind
    }

    /// Returns `true` for camera pseudo-agents.
    #[must_use]
    pub const fn is_camera(&self) -> bool {
        matches!(self.kind, AgentKind::Camera)
    }

    /// Returns `true` for containers.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, AgentKind::Container(_))
    }

    /// Container state, if this agent is a container.
    #[must_use]
    pub const fn as_container(&self) -> Option<&ContainerState> {
        match &self.kind {
            AgentKind::Container(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn as_container_mut(&mut self) -> Option<&mut ContainerState> {
        match &mut self.kind {
            AgentKind::Container(state) => Some(state),
            _ => None,
        }
    }

    /// Image reference for the presentation layer.
    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Replace the image reference.
    pub fn set_image(&mut self, image: Option<ImageRef>) {
        self.image = image;
    }

    /// Owning container, if any.
    #[must_use]
    pub const fn container(&self) -> Option<AgentId> {
        self.container
    }

    /// Event hooks.
    #[must_use]
    pub const fn hooks(&self) -> &AgentHooks {
        &self.hooks
    }

    /// Mutable event hooks, for installing or replacing handlers.
    pub fn hooks_mut(&mut self) -> &mut AgentHooks {
        &mut self.hooks
    }

    /// Turnable capability, if present.
    #[must_use]
    pub const fn turnable(&self) -> Option<&TurnableState> {
        self.turnable.as_ref()
    }

    /// Attach or detach the turnable capability.
    pub fn set_turnable(&mut self, turnable: Option<TurnableState>) {
        self.turnable = turnable;
    }

    /// Sensing capability, if present.
    #[must_use]
    pub const fn sensing(&self) -> Option<&SensingState> {
        self.sensing.as_ref()
    }

    /// Mutable sensing capability, if present.
    pub fn sensing_mut(&mut self) -> Option<&mut SensingState> {
        self.sensing.as_mut()
    }

    /// Attach or detach the sensing capability.
    pub fn set_sensing(&mut self, sensing: Option<SensingState>) {
        self.sensing = sensing;
    }
}

/// Description of an agent to be created by the environment.
///
/// Defaults: non-solid, visible, no image, no hooks, no capabilities.
pub struct AgentSpec {
    pub(crate) rectangle: Rectangle,
    pub(crate) solid: bool,
    pub(crate) visible: bool,
    pub(crate) kind: AgentKind,
    pub(crate) image: Option<ImageRef>,
    pub(crate) hooks: AgentHooks,
    pub(crate) turnable: Option<TurnableState>,
    pub(crate) sensing: Option<SensingState>,
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("rectangle", &self.rectangle)
            .field("solid", &self.solid)
            .field("visible", &self.visible)
            .field("kind", &self.kind)
            .field("image", &self.image)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl AgentSpec {
    /// Start a spec for an agent occupying `rectangle`.
    #[must_use]
    pub fn new(rectangle: Rectangle) -> Self {
        Self {
            rectangle,
            solid: false,
            visible: true,
            kind: AgentKind::Regular,
            image: None,
            hooks: AgentHooks::default(),
            turnable: None,
            sensing: None,
        }
    }

    /// Set solidity.
    #[must_use]
    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    /// Set initial visibility.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn image(mut self, image: impl Into<ImageRef>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub(crate) fn kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Install a collision handler, called as `(env, self, other)`.
    #[must_use]
    pub fn on_collision(
        mut self,
        hook: impl FnMut(&mut crate::environment::Environment, AgentId, AgentId) + 'static,
    ) -> Self {
        self.hooks.on_collision = Some(Box::new(hook));
        self
    }

    /// Install an overlap handler, called as `(env, self, other)`.
    #[must_use]
    pub fn on_overlapping(
        mut self,
        hook: impl FnMut(&mut crate::environment::Environment, AgentId, AgentId) + 'static,
    ) -> Self {
        self.hooks.on_overlapping = Some(Box::new(hook));
        self
    }

    /// Install a world-border handler, called as `(env, self)`.
    #[must_use]
    pub fn on_hitting_world_border(
        mut self,
        hook: impl FnMut(&mut crate::environment::Environment, AgentId) + 'static,
    ) -> Self {
        self.hooks.on_hitting_world_border = Some(Box::new(hook));
        self
    }

    /// Install a handler for becoming visible.
    #[must_use]
    pub fn on_visible(
        mut self,
        hook: impl FnMut(&mut crate::environment::Environment, AgentId) + 'static,
    ) -> Self {
        self.hooks.on_visible = Some(Box::new(hook));
        self
    }

    /// Install a handler for becoming invisible.
    #[must_use]
    pub fn on_not_visible(
        mut self,
        hook: impl FnMut(&mut crate::environment::Environment, AgentId) + 'static,
    ) -> Self {
        self.hooks.on_not_visible = Some(Box::new(hook));
        self
    }

    /// Attach the turnable capability.
    #[must_use]
    pub fn turnable(mut self, turnable: TurnableState) -> Self {
        self.turnable = Some(turnable);
        self
    }

    /// Attach the sensing capability.
    #[must_use]
    pub fn sensing(mut self, sensing: SensingState) -> Self {
        self.sensing = Some(sensing);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod agent_id_tests {
        use super::*;

        #[test]
        fn ordering_is_creation_order() {
            let mut ids = vec![AgentId::new(3), AgentId::new(1), AgentId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![AgentId::new(1), AgentId::new(2), AgentId::new(3)]);
        }

        #[test]
        fn debug_and_display_format() {
            let id = AgentId::new(42);
            assert_eq!(format!("{id:?}"), "AgentId(42)");
            assert_eq!(format!("{id}"), "42");
        }

        #[test]
        fn conversions() {
            let id: AgentId = 7u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 7);
        }

        #[test]
        fn serialization_roundtrip() {
            let id = AgentId::new(12345);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(serde_json::from_str::<AgentId>(&json).unwrap(), id);
        }
    }

    mod spec_tests {
        use super::*;

        fn unit_rect() -> Rectangle {
            Rectangle::new(Vector::new(5.0, 5.0), Vector::new(1.0, 1.0))
        }

        #[test]
        fn defaults() {
            let agent = Agent::from_spec(AgentId::new(0), AgentSpec::new(unit_rect()));
            assert!(agent.is_alive());
            assert!(!agent.is_solid());
            assert!(agent.is_visible());
            assert!(!agent.is_camera());
            assert!(!agent.is_container());
            assert!(agent.image().is_none());
            assert!(agent.container().is_none());
            assert!(!agent.hooks().has_any());
        }

        #[test]
        fn builder_sets_flags_and_hooks() {
            let spec = AgentSpec::new(unit_rect())
                .solid(true)
                .visible(false)
                .image("wall.png")
                .on_collision(|_, _, _| {})
                .turnable(TurnableState::new(1.0));
            let agent = Agent::from_spec(AgentId::new(9), spec);

            assert_eq!(agent.flags(), AgentFlags::ALIVE | AgentFlags::SOLID);
            assert_eq!(agent.image(), Some(&ImageRef::new("wall.png")));
            assert!(agent.hooks().on_collision.is_some());
            assert!(agent.hooks().on_overlapping.is_none());
            assert!(agent.turnable().is_some());
        }

        #[test]
        fn set_solid_toggles_flag() {
            let mut agent = Agent::from_spec(AgentId::new(0), AgentSpec::new(unit_rect()));
            agent.set_solid(true);
            assert!(agent.is_solid());
            agent.set_solid(false);
            assert!(!agent.is_solid());
        }

        #[test]
        fn flags_serialization_roundtrip() {
            let flags = AgentFlags::ALIVE | AgentFlags::VISIBLE;
            let json = serde_json::to_string(&flags).unwrap();
            assert_eq!(serde_json::from_str::<AgentFlags>(&json).unwrap(), flags);
        }
    }
}
