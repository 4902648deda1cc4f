//! Containers: agents that move a group of members as one rigid body.
//!
//! A container is an ordinary [`Agent`] whose kind is
//! [`AgentKind::Container`]. It is non-solid and invisible, so it never
//! collides or overlaps with anything itself. Its members are laid out along
//! the container's axis, each taking an equal share of the container's length
//! minus the padding between them.
//!
//! Moving a container validates the container and then every member before
//! anything is committed; if any of them would be blocked, nothing moves.
//!
//! ```
//! use tessera::{Rectangle, Vector};
//! use warden_core::config::WorldConfig;
//! use warden_core::container::Layout;
//! use warden_core::environment::Environment;
//!
//! let mut env = Environment::new(WorldConfig::with_size(200.0, 100.0)).unwrap();
//! let row = env
//!     .create_container(
//!         Rectangle::new(Vector::new(107.5, 50.0), Vector::new(45.0, 20.0)),
//!         Layout::Horizontal,
//!         5.0,
//!     )
//!     .unwrap();
//! let left = env.create_agent("l", 1.0, 1.0, true, 10.0, 10.0).unwrap();
//! let right = env.create_agent("r", 1.0, 1.0, true, 20.0, 10.0).unwrap();
//! env.add_member(row, left).unwrap();
//! env.add_member(row, right).unwrap();
//!
//! assert_eq!(env.get(left).unwrap().position(), Vector::new(95.0, 50.0));
//! assert_eq!(env.get(right).unwrap().position(), Vector::new(120.0, 50.0));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera::{Placement, Rectangle, Side, Vector};
use tracing::{debug, warn};

use crate::agent::{Agent, AgentId, AgentKind, AgentSpec};
use crate::environment::Environment;
use crate::error::WorldError;

/// Axis along which members are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Left to right
    #[default]
    Horizontal,
    /// Top to bottom
    Vertical,
}

impl Layout {
    /// Side of the container the first member is placed against, and the
    /// side of each member the next one follows.
    const fn sides(self) -> (Side, Side) {
        match self {
            Self::Horizontal => (Side::Left, Side::Right),
            Self::Vertical => (Side::Top, Side::Bottom),
        }
    }
}

impl FromStr for Layout {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            _ => Err(WorldError::InvalidLayout(s.to_string())),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Members and layout settings of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerState {
    pub(crate) members: Vec<AgentId>,
    pub(crate) layout: Layout,
    pub(crate) padding: f32,
}

impl ContainerState {
    pub(crate) fn new(layout: Layout, padding: f32) -> Self {
        Self {
            members: Vec::new(),
            layout,
            padding: padding.max(0.0),
        }
    }

    /// Members in layout order.
    #[must_use]
    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    /// Layout axis.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Gap between consecutive members.
    #[must_use]
    pub const fn padding(&self) -> f32 {
        self.padding
    }

    /// Rectangles for `count` members filling `outer`.
    ///
    /// Each member is as long as an equal share of `outer` along the layout
    /// axis once the padding is taken out, and as wide as `outer` across it.
    /// The first sits flush inside the leading edge and each next one
    /// follows the previous, `padding` apart.
    #[must_use]
    pub fn member_rectangles(&self, outer: &Rectangle, count: usize) -> Vec<Rectangle> {
        if count == 0 {
            return Vec::new();
        }
        #[allow(clippy::cast_precision_loss)]
        let n = count as f32;
        let size = outer.size();
        let member_size = match self.layout {
            Layout::Horizontal => {
                Vector::new(((size.x - self.padding * (n - 1.0)) / n).max(0.0), size.y)
            }
            Layout::Vertical => {
                Vector::new(size.x, ((size.y - self.padding * (n - 1.0)) / n).max(0.0))
            }
        };
        let (first, next) = self.layout.sides();
        let template = outer.with_size(member_size);

        let mut placed = Vec::with_capacity(count);
        let mut previous = template.placed_relative_to(outer, first, Placement::Inside, 0.0);
        placed.push(previous);
        for _ in 1..count {
            previous = template.placed_relative_to(&previous, next, Placement::Outside, self.padding);
            placed.push(previous);
        }
        placed
    }
}

impl Environment {
    /// Create an empty container.
    ///
    /// Returns `None` if the rectangle leaves the world.
    pub fn create_container(
        &mut self,
        rectangle: Rectangle,
        layout: Layout,
        padding: f32,
    ) -> Option<AgentId> {
        self.create_agent_from_spec(
            AgentSpec::new(rectangle)
                .visible(false)
                .kind(AgentKind::Container(ContainerState::new(layout, padding))),
        )
    }

    fn container_state(&self, id: AgentId) -> Result<&ContainerState, WorldError> {
        self.get(id)
            .ok_or(WorldError::UnknownAgent(id))?
            .as_container()
            .ok_or(WorldError::NotAContainer(id))
    }

    /// Append an agent to a container and lay the members out again.
    ///
    /// An agent that already belongs to another container leaves it first.
    /// Layout is unchecked: members are placed even onto occupied space.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`], or
    /// [`WorldError::ContainmentCycle`] if `member` is `container` or one of
    /// its ancestors.
    pub fn add_member(&mut self, container: AgentId, member: AgentId) -> Result<(), WorldError> {
        self.container_state(container)?;
        let previous = self
            .get(member)
            .ok_or(WorldError::UnknownAgent(member))?
            .container();
        if self.group_of(member).contains(&container) {
            return Err(WorldError::ContainmentCycle { container, member });
        }
        if previous == Some(container) {
            return Ok(());
        }
        if let Some(previous) = previous {
            self.remove_member(previous, member)?;
        }

        if let Some(state) = self.get_mut(container).and_then(Agent::as_container_mut) {
            state.members.push(member);
        }
        if let Some(agent) = self.get_mut(member) {
            agent.container = Some(container);
        }
        debug!(%container, %member, "member added");
        self.relayout(container);
        Ok(())
    }

    /// Detach an agent from a container and lay the rest out again.
    ///
    /// The detached agent keeps its current rectangle. Returns `Ok(false)` if
    /// it was not a member.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`].
    pub fn remove_member(&mut self, container: AgentId, member: AgentId) -> Result<bool, WorldError> {
        if !self.container_state(container)?.members.contains(&member) {
            return Ok(false);
        }
        if let Some(state) = self.get_mut(container).and_then(Agent::as_container_mut) {
            state.members.retain(|m| *m != member);
        }
        if let Some(agent) = self.get_mut(member) {
            agent.container = None;
        }
        debug!(%container, %member, "member removed");
        self.relayout(container);
        Ok(true)
    }

    /// Members of a container in layout order.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`].
    pub fn members(&self, container: AgentId) -> Result<&[AgentId], WorldError> {
        self.container_state(container).map(ContainerState::members)
    }

    /// Layout axis of a container.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`].
    pub fn layout(&self, container: AgentId) -> Result<Layout, WorldError> {
        self.container_state(container).map(ContainerState::layout)
    }

    /// Change a container's layout axis and lay the members out again.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`].
    pub fn set_layout(&mut self, container: AgentId, layout: Layout) -> Result<(), WorldError> {
        self.container_state(container)?;
        if let Some(state) = self.get_mut(container).and_then(Agent::as_container_mut) {
            state.layout = layout;
        }
        self.relayout(container);
        Ok(())
    }

    /// Resize and reposition every member to fill the container.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::NotAContainer`].
    pub fn layout_members(&mut self, container: AgentId) -> Result<(), WorldError> {
        let state = self.container_state(container)?;
        let members = state.members.clone();
        let outer = self
            .get(container)
            .map(|agent| *agent.rectangle())
            .ok_or(WorldError::UnknownAgent(container))?;
        let placed = state.member_rectangles(&outer, members.len());
        for (member, rectangle) in members.into_iter().zip(placed) {
            self.place_agent(member, rectangle);
        }
        Ok(())
    }

    /// Layout after a membership or geometry change. The container always
    /// exists at the call sites, so failures are only logged.
    pub(crate) fn relayout(&mut self, container: AgentId) {
        if let Err(error) = self.layout_members(container) {
            warn!(%container, %error, "layout skipped");
        }
    }
}
