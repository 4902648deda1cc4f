//! Move validation and commit.
//!
//! Every move runs to completion before returning:
//!
//! 1. Forced moves, and any move of a camera, are applied unconditionally.
//! 2. A zero distance succeeds without touching anything.
//! 3. Otherwise the move is validated: the candidate rectangle must stay
//!    inside the world and must not run into a solid agent. Containers check
//!    themselves and then every member, stopping at the first failure. Only
//!    once the whole group has passed is any new overlap with a visible
//!    agent reported.
//! 4. A valid move is committed with [`Environment::force_move`], which
//!    re-indexes every moved agent and records its overlaps. A rejected move
//!    leaves every rectangle untouched.
//!
//! Hooks run synchronously inside validation and may move or kill any agent.
//! After the hooks have run the group is checked once more, silently, from
//! wherever they left it, so a commit never lands outside the world or on a
//! solid agent. If the mover dies the move fails with
//! [`MoveRejection::MoverDied`].

use std::collections::BTreeSet;

use tessera::{is_finite_vector, Placement, Rectangle, Side, Vector};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::agent::hooks::{AgentSlot, PairSlot};
use crate::agent::{Agent, AgentId};
use crate::environment::{Environment, Interaction};
use crate::events::WorldEvent;

/// Why a move was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// The agent does not exist.
    #[error("agent {0} does not exist")]
    UnknownAgent(AgentId),
    /// The candidate rectangle leaves the world.
    #[error("move would leave the world")]
    WorldBorder,
    /// The candidate rectangle runs into a solid agent.
    #[error("move blocked by solid agent {other}")]
    Collision {
        /// Blocking agent
        other: AgentId,
    },
    /// A hook killed the moving agent.
    #[error("mover died while the move was validated")]
    MoverDied,
}

/// Whether moving `current` by `distance` is blocked by a solid `obstacle`.
///
/// A move that creates a new intersection is always blocked; a move out of
/// an existing intersection is allowed when it does not bring the centers
/// closer.
fn blocks(current: &Rectangle, obstacle: &Rectangle, distance: Vector) -> bool {
    let candidate = current.translated(distance);
    if !candidate.intersects(obstacle) {
        return false;
    }
    let approaching = candidate.center_distance(obstacle) < current.center_distance(obstacle);
    !current.intersects(obstacle) || approaching
}

impl Environment {
    /// Move an agent by `distance`.
    ///
    /// With `force` the move skips every check. Returns `false` if the move
    /// was rejected or the agent does not exist; a rejected move changes no
    /// rectangle.
    pub fn move_agent(&mut self, id: AgentId, distance: Vector, force: bool) -> bool {
        debug_assert!(is_finite_vector(distance), "move distance must be finite");
        let Some(agent) = self.get(id) else {
            warn!(%id, "move of unknown agent");
            return false;
        };
        if force || agent.is_camera() {
            return self.force_move(id, distance);
        }
        if distance == Vector::ZERO {
            return true;
        }
        match self.validate_move(id, distance) {
            Ok(distance) => self.force_move(id, distance),
            Err(rejection) => {
                debug!(%id, %rejection, "move rejected");
                false
            }
        }
    }

    /// Validate a move without committing it.
    ///
    /// Returns the legal distance, or `None` if the move would be rejected.
    /// Hooks fire exactly as they would for [`Environment::move_agent`].
    pub fn check_move(&mut self, id: AgentId, distance: Vector) -> Option<Vector> {
        self.validate_move(id, distance).ok()
    }

    /// Validate a move and report why it would be rejected.
    ///
    /// Overlap pairs entered during validation are not kept: only a committed
    /// move records them, so a check leaves the overlap state as it found it.
    ///
    /// # Errors
    ///
    /// The first [`MoveRejection`] met by the agent or, for containers, any
    /// of its members.
    pub fn validate_move(&mut self, id: AgentId, distance: Vector) -> Result<Vector, MoveRejection> {
        if !self.is_live(id) {
            return Err(MoveRejection::UnknownAgent(id));
        }
        if distance == Vector::ZERO {
            return Ok(distance);
        }
        let group = self.group_of(id);
        let result = self.validate_group(id, distance, &group);

        let mut touched = group;
        touched.extend(self.group_of(id));
        for member in touched {
            self.sync_overlaps(member);
        }
        result
    }

    /// Walks the mover and its members in layout order. Overlaps are only
    /// reported after every member has passed its border and collision
    /// checks. The final pass re-checks the group silently against the world
    /// as the hooks left it. A member killed by a hook drops out of the move;
    /// the mover itself dying rejects it.
    fn validate_group(
        &mut self,
        id: AgentId,
        distance: Vector,
        group: &BTreeSet<AgentId>,
    ) -> Result<Vector, MoveRejection> {
        let order = self.validation_order(id);

        for &member in &order {
            if !self.is_live(member) {
                if member == id {
                    return Err(MoveRejection::MoverDied);
                }
                continue;
            }
            match self.check_path(member, distance, group) {
                Err(MoveRejection::MoverDied) if member != id => {}
                result => result?,
            }
        }

        for &member in &order {
            if !self.is_live(member) {
                if member == id {
                    return Err(MoveRejection::MoverDied);
                }
                continue;
            }
            match self.notify_overlaps(member, distance, group) {
                Err(MoveRejection::MoverDied) if member != id => {}
                result => result?,
            }
        }

        if !self.is_live(id) {
            return Err(MoveRejection::MoverDied);
        }
        // Hooks may have reshaped the group or pushed solids into its path
        let settled = self.group_of(id);
        for &member in &settled {
            self.confirm_path(member, distance, &settled)?;
        }
        Ok(distance)
    }

    /// The mover followed by its members, depth first in layout order.
    fn validation_order(&self, id: AgentId) -> Vec<AgentId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            if let Some(state) = self.get(next).and_then(Agent::as_container) {
                stack.extend(state.members().iter().rev());
            }
        }
        order
    }

    /// Border and collision checks for one agent, firing their hooks.
    /// Members of the moving group never block each other.
    fn check_path(
        &mut self,
        id: AgentId,
        distance: Vector,
        group: &BTreeSet<AgentId>,
    ) -> Result<(), MoveRejection> {
        let agent = self.get(id).ok_or(MoveRejection::MoverDied)?;
        if agent.is_camera() {
            return Ok(());
        }
        let candidate = agent.rectangle().translated(distance);

        if !self.world.contains_rect(&candidate) {
            self.journal.record(WorldEvent::HitWorldBorder { agent: id });
            self.fire_agent_hook(AgentSlot::WorldBorder, id);
            return Err(MoveRejection::WorldBorder);
        }

        let colliding: Vec<AgentId> = self
            .candidates(&candidate, group)
            .into_iter()
            .filter(|other| self.interaction(id, *other) == Some(Interaction::Collision))
            .collect();
        for other in colliding {
            self.resolve_collision(id, other, distance)?;
        }
        Ok(())
    }

    /// Notify both agents of a collision and decide whether it blocks.
    ///
    /// Handlers may move or kill either agent, so both rectangles are re-read
    /// afterwards.
    fn resolve_collision(
        &mut self,
        mover: AgentId,
        other: AgentId,
        distance: Vector,
    ) -> Result<(), MoveRejection> {
        self.journal.record(WorldEvent::Collided { mover, other });
        self.fire_pair_hook(PairSlot::Collision, mover, other);
        self.fire_pair_hook(PairSlot::Collision, other, mover);

        let current = self.rectangle_of(mover).ok_or(MoveRejection::MoverDied)?;
        match self.rectangle_of(other) {
            Some(obstacle) if blocks(&current, &obstacle, distance) => {
                Err(MoveRejection::Collision { other })
            }
            _ => Ok(()),
        }
    }

    /// Report every visible agent the moved rectangle would newly overlap.
    fn notify_overlaps(
        &mut self,
        id: AgentId,
        distance: Vector,
        group: &BTreeSet<AgentId>,
    ) -> Result<(), MoveRejection> {
        let agent = self.get(id).ok_or(MoveRejection::MoverDied)?;
        if agent.is_camera() {
            return Ok(());
        }
        let candidate = agent.rectangle().translated(distance);
        let overlapping: Vec<AgentId> = self
            .candidates(&candidate, group)
            .into_iter()
            .filter(|other| self.interaction(id, *other) == Some(Interaction::Overlap))
            .collect();
        for other in overlapping {
            self.enter_overlap(id, other)?;
        }
        Ok(())
    }

    /// Fire overlap hooks on both agents if this pair was not already
    /// overlapping.
    fn enter_overlap(&mut self, mover: AgentId, other: AgentId) -> Result<(), MoveRejection> {
        if !self.overlaps.link(mover, other) {
            return Ok(());
        }
        self.journal.record(WorldEvent::Overlapped { mover, other });
        self.fire_pair_hook(PairSlot::Overlapping, mover, other);
        self.fire_pair_hook(PairSlot::Overlapping, other, mover);
        if self.is_live(mover) {
            Ok(())
        } else {
            Err(MoveRejection::MoverDied)
        }
    }

    /// Border and collision checks from the agent's current rectangle,
    /// without events or hooks.
    fn confirm_path(
        &self,
        id: AgentId,
        distance: Vector,
        group: &BTreeSet<AgentId>,
    ) -> Result<(), MoveRejection> {
        let Some(agent) = self.get(id).filter(|agent| agent.is_alive()) else {
            return Ok(());
        };
        if agent.is_camera() {
            return Ok(());
        }
        let current = *agent.rectangle();
        let candidate = current.translated(distance);
        if !self.world.contains_rect(&candidate) {
            return Err(MoveRejection::WorldBorder);
        }
        for other in self.candidates(&candidate, group) {
            if self.interaction(id, other) != Some(Interaction::Collision) {
                continue;
            }
            if let Some(obstacle) = self.rectangle_of(other) {
                if blocks(&current, &obstacle, distance) {
                    return Err(MoveRejection::Collision { other });
                }
            }
        }
        Ok(())
    }

    fn rectangle_of(&self, id: AgentId) -> Option<Rectangle> {
        self.get(id)
            .filter(|agent| agent.is_alive())
            .map(|agent| *agent.rectangle())
    }

    /// Translate an agent unconditionally, and every member if it is a
    /// container.
    ///
    /// Returns `false` if the agent does not exist.
    pub fn force_move(&mut self, id: AgentId, distance: Vector) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        agent.rectangle.translate(distance);
        let rectangle = agent.rectangle;
        let members = agent
            .as_container()
            .map(|state| state.members().to_vec())
            .unwrap_or_default();

        self.grid.update(id, &rectangle);
        self.sync_overlaps(id);
        trace!(%id, ?distance, "agent moved");

        for member in members {
            self.force_move(member, distance);
        }
        true
    }

    /// Set an agent's rectangle without any check, re-indexing it and laying
    /// out its members if it is a container.
    pub(crate) fn place_agent(&mut self, id: AgentId, rectangle: Rectangle) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        agent.rectangle = rectangle;
        let is_container = agent.is_container();
        self.grid.update(id, &rectangle);
        self.sync_overlaps(id);
        if is_container {
            self.relayout(id);
        }
    }

    // =========================================================================
    // Directional helpers
    // =========================================================================

    /// Move `step` units towards `-y`.
    pub fn move_up(&mut self, id: AgentId, step: f32) -> bool {
        self.move_agent(id, Vector::new(0.0, -step), false)
    }

    /// Move `step` units towards `+y`.
    pub fn move_down(&mut self, id: AgentId, step: f32) -> bool {
        self.move_agent(id, Vector::new(0.0, step), false)
    }

    /// Move `step` units towards `-x`.
    pub fn move_left(&mut self, id: AgentId, step: f32) -> bool {
        self.move_agent(id, Vector::new(-step, 0.0), false)
    }

    /// Move `step` units towards `+x`.
    pub fn move_right(&mut self, id: AgentId, step: f32) -> bool {
        self.move_agent(id, Vector::new(step, 0.0), false)
    }

    /// Move up to `step` units towards `target`, stopping on it.
    pub fn move_towards_position(&mut self, id: AgentId, target: Vector, step: f32) -> bool {
        let Some(position) = self.get(id).map(Agent::position) else {
            warn!(%id, "move of unknown agent");
            return false;
        };
        let offset = target - position;
        let distance = if offset.length() <= step {
            offset
        } else {
            offset.normalize_or_zero() * step
        };
        self.move_agent(id, distance, false)
    }

    /// Move up to `step` units towards another agent's center.
    pub fn move_towards_agent(&mut self, id: AgentId, other: AgentId, step: f32) -> bool {
        let Some(target) = self.get(other).map(Agent::position) else {
            warn!(%other, "move towards unknown agent");
            return false;
        };
        self.move_towards_position(id, target, step)
    }

    /// Move an agent so its center is at `position`.
    ///
    /// This is an ordinary checked move and fails like one.
    pub fn set_position(&mut self, id: AgentId, position: Vector) -> bool {
        let Some(current) = self.get(id).map(Agent::position) else {
            warn!(%id, "move of unknown agent");
            return false;
        };
        self.move_agent(id, position - current, false)
    }

    /// Coordinate form of [`Environment::set_position`].
    pub fn set_2d_position(&mut self, id: AgentId, x: f32, y: f32) -> bool {
        self.set_position(id, Vector::new(x, y))
    }

    /// Move an agent against a side of another agent, as a checked move.
    pub fn move_relative_to(
        &mut self,
        id: AgentId,
        anchor: AgentId,
        side: Side,
        placement: Placement,
        padding: f32,
    ) -> bool {
        let (Some(agent), Some(anchor_agent)) = (self.get(id), self.get(anchor)) else {
            warn!(%id, %anchor, "relative move with unknown agent");
            return false;
        };
        let target = agent
            .rectangle()
            .placed_relative_to(anchor_agent.rectangle(), side, placement, padding);
        let distance = target.center() - agent.position();
        self.move_agent(id, distance, false)
    }

    /// Change an agent's size, keeping its center. Unchecked.
    ///
    /// Resizing a container lays its members out again. Returns `false` if
    /// the agent does not exist.
    pub fn resize_agent(&mut self, id: AgentId, size: Vector) -> bool {
        let Some(rectangle) = self.get(id).map(|agent| agent.rectangle().with_size(size)) else {
            warn!(%id, "resize of unknown agent");
            return false;
        };
        self.place_agent(id, rectangle);
        true
    }
}
