//! The agent registry.
//!
//! [`Environment`] is the single owner of every live [`Agent`]. It keeps the
//! world boundary, the [`SegmentGrid`] used for proximity queries, the set of
//! overlapping agent pairs, the event journal, and a seeded random number
//! generator. One environment is one world; there are no globals.
//!
//! # Consistency
//!
//! The grid holds ids only. Every path that changes an agent's rectangle
//! (moves, container layout, resizes) goes through the environment and
//! re-indexes the agent before returning, so an agent's cell membership
//! always equals the cells its current rectangle overlaps.
//!
//! # Example
//!
//! ```
//! use warden_core::config::WorldConfig;
//! use warden_core::environment::Environment;
//! use tessera::Vector;
//!
//! let mut env = Environment::new(WorldConfig::with_size(100.0, 100.0)).unwrap();
//! let a = env.create_agent("a.png", 10.0, 10.0, true, 50.0, 50.0).unwrap();
//!
//! // Space taken by a solid agent cannot host another one
//! assert!(env.create_agent("b.png", 10.0, 10.0, true, 52.0, 50.0).is_none());
//!
//! assert!(env.move_agent(a, Vector::new(5.0, 0.0), false));
//! assert_eq!(env.get(a).unwrap().position(), Vector::new(55.0, 50.0));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tessera::{Rectangle, SegmentGrid, Vector};
use tracing::{debug, info, trace, warn};

use crate::agent::hooks::AgentSlot;
use crate::agent::{Agent, AgentFlags, AgentId, AgentKind, AgentSpec, ImageRef};
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::events::{EventJournal, WorldEvent};
use crate::overlap::OverlapIndex;

/// Attempts made by [`Environment::random_free_position`] before giving up.
pub const RANDOM_PLACEMENT_ATTEMPTS: usize = 100;

/// How two intersecting agents affect each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interaction {
    /// Both solid: the mover is blocked
    Collision,
    /// Both visible, not both solid: notified, never blocked
    Overlap,
}

/// Serializable view of an agent for presentation and network layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent id
    pub id: AgentId,
    /// Current rectangle
    pub rectangle: Rectangle,
    /// Solidity
    pub solid: bool,
    /// Visibility
    pub visible: bool,
    /// Image reference, if any
    pub image: Option<ImageRef>,
}

/// Owner of the world and every agent in it.
#[derive(Debug)]
pub struct Environment {
    pub(crate) config: WorldConfig,
    pub(crate) world: Rectangle,
    pub(crate) next_id: u64,
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) grid: SegmentGrid<AgentId>,
    /// Visible pairs currently overlapping, indexed under both agents.
    pub(crate) overlaps: OverlapIndex,
    pub(crate) journal: EventJournal,
    pub(crate) rng: ChaCha8Rng,
}

impl Environment {
    /// Create an empty world.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`WorldConfig::validate`].
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let grid = SegmentGrid::new(config.grid_config())?;
        info!(
            width = config.width,
            height = config.height,
            cell_size = config.cell_size,
            seed = config.seed,
            "environment created"
        );
        Ok(Self {
            world: config.world_rectangle(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            next_id: 0,
            agents: BTreeMap::new(),
            grid,
            overlaps: OverlapIndex::new(),
            journal: EventJournal::new(),
        })
    }

    /// The configuration this world was built with.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world boundary, spanning `(0, 0)` to `(width, height)`.
    #[must_use]
    pub const fn world_rectangle(&self) -> Rectangle {
        self.world
    }

    /// The segment grid, for inspection.
    #[must_use]
    pub const fn grid(&self) -> &SegmentGrid<AgentId> {
        &self.grid
    }

    // =========================================================================
    // Factory
    // =========================================================================

    /// Create an agent centered at `(x, y)`.
    ///
    /// Returns `None` if the rectangle leaves the world or if the agent is
    /// solid and the space is taken by another solid agent.
    pub fn create_agent(
        &mut self,
        image: impl Into<ImageRef>,
        width: f32,
        height: f32,
        is_solid: bool,
        x: f32,
        y: f32,
    ) -> Option<AgentId> {
        let rectangle = Rectangle::new(Vector::new(x, y), Vector::new(width, height));
        self.create_agent_with_rectangle(image, rectangle, is_solid)
    }

    /// Create an agent occupying `rectangle`.
    ///
    /// Same rejection rules as [`Environment::create_agent`].
    pub fn create_agent_with_rectangle(
        &mut self,
        image: impl Into<ImageRef>,
        rectangle: Rectangle,
        is_solid: bool,
    ) -> Option<AgentId> {
        self.create_agent_from_spec(AgentSpec::new(rectangle).solid(is_solid).image(image))
    }

    /// Create an agent from a full description.
    pub fn create_agent_from_spec(&mut self, spec: AgentSpec) -> Option<AgentId> {
        if !self.world.contains_rect(&spec.rectangle) {
            debug!(rectangle = ?spec.rectangle, "agent creation rejected: outside the world");
            return None;
        }
        if spec.solid {
            let blocker = self
                .candidates(&spec.rectangle, &BTreeSet::new())
                .into_iter()
                .find(|other| self.agents.get(other).is_some_and(Agent::is_solid));
            if let Some(blocker) = blocker {
                debug!(%blocker, rectangle = ?spec.rectangle, "agent creation rejected: space occupied");
                return None;
            }
        }
        let id = AgentId::new(self.next_id);
        self.next_id += 1;
        self.add_agent(Agent::from_spec(id, spec));
        Some(id)
    }

    /// Create a camera: a non-solid, invisible viewport that always
    /// force-moves and is never reported by collision queries.
    pub fn create_camera(&mut self, rectangle: Rectangle) -> Option<AgentId> {
        self.create_agent_from_spec(
            AgentSpec::new(rectangle)
                .visible(false)
                .kind(AgentKind::Camera),
        )
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register an agent and index it. Existing overlaps are recorded
    /// without notification.
    pub(crate) fn add_agent(&mut self, agent: Agent) {
        let id = agent.id;
        let rectangle = agent.rectangle;
        self.grid.insert(id, &rectangle);
        self.agents.insert(id, agent);
        self.sync_overlaps(id);
        self.journal.record(WorldEvent::Created {
            agent: id,
            rectangle,
        });
        trace!(%id, ?rectangle, "agent added");
    }

    /// Unregister an agent and drop it from the grid.
    ///
    /// Removing an unknown id is a no-op.
    pub(crate) fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        self.grid.remove(id);
        self.overlaps.unlink_all(id);
        self.agents.remove(&id)
    }

    /// Re-index an agent from its current rectangle.
    ///
    /// Returns `false` if the agent does not exist.
    pub fn update_agent(&mut self, id: AgentId) -> bool {
        let Some(rectangle) = self.agents.get(&id).map(|agent| agent.rectangle) else {
            return false;
        };
        self.grid.update(id, &rectangle);
        self.sync_overlaps(id);
        true
    }

    /// Look up a live agent.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Look up a live agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Returns `true` if the agent exists.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Ids of every live agent in creation order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.keys().copied()
    }

    /// Every live agent in creation order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of live agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub(crate) fn is_live(&self, id: AgentId) -> bool {
        self.agents.get(&id).is_some_and(Agent::is_alive)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub(crate) fn interaction(&self, a: AgentId, b: AgentId) -> Option<Interaction> {
        let (a, b) = (self.agents.get(&a)?, self.agents.get(&b)?);
        if a.is_solid() && b.is_solid() {
            Some(Interaction::Collision)
        } else if a.is_visible() && b.is_visible() {
            Some(Interaction::Overlap)
        } else {
            None
        }
    }

    /// Live, non-camera agents whose rectangle truly intersects `rect`,
    /// nearest center first, ties broken by id.
    pub(crate) fn candidates(&self, rect: &Rectangle, exclude: &BTreeSet<AgentId>) -> Vec<AgentId> {
        let mut found: Vec<(f32, AgentId)> = self
            .grid
            .query_rect(rect)
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .filter_map(|id| self.agents.get(&id))
            .filter(|agent| agent.is_alive() && !agent.is_camera())
            .filter(|agent| agent.rectangle.intersects(rect))
            .map(|agent| (agent.rectangle.center_distance(rect), agent.id))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// The mover itself plus, for containers, every member at any depth.
    pub(crate) fn group_of(&self, id: AgentId) -> BTreeSet<AgentId> {
        let mut group = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if group.insert(next) {
                if let Some(state) = self.agents.get(&next).and_then(Agent::as_container) {
                    stack.extend(state.members());
                }
            }
        }
        group
    }

    /// Nearest agent that would interact with `mover` if `mover` occupied
    /// `rectangle`.
    ///
    /// Cameras, dead agents, the mover's own group, and pairs that neither
    /// collide nor overlap are skipped.
    #[must_use]
    pub fn other_agent_overlapping_with_proposed_rectangle(
        &self,
        mover: AgentId,
        rectangle: &Rectangle,
    ) -> Option<AgentId> {
        self.candidates(rectangle, &self.group_of(mover))
            .into_iter()
            .find(|other| self.interaction(mover, *other).is_some())
    }

    /// Broad-phase neighbours of an agent: everything the grid reports
    /// around it, minus itself. May include agents that do not intersect.
    #[must_use]
    pub fn nearby_agents(&self, id: AgentId) -> Vec<AgentId> {
        let Some(agent) = self.agents.get(&id) else {
            warn!(%id, "nearby_agents on unknown agent");
            return Vec::new();
        };
        self.grid
            .query_rect(&agent.rectangle)
            .into_iter()
            .filter(|other| *other != id && self.is_live(*other))
            .collect()
    }

    /// Agents whose rectangle intersects `rect`, in id order.
    #[must_use]
    pub fn agents_in_rectangle(&self, rect: &Rectangle) -> Vec<AgentId> {
        self.grid
            .query_rect(rect)
            .into_iter()
            .filter(|id| {
                self.agents
                    .get(id)
                    .is_some_and(|agent| agent.is_alive() && agent.rectangle.intersects(rect))
            })
            .collect()
    }

    /// Visible agents intersecting `rect`, in id order. Used for render culling.
    #[must_use]
    pub fn visible_agents_in(&self, rect: &Rectangle) -> Vec<AgentId> {
        self.agents_in_rectangle(rect)
            .into_iter()
            .filter(|id| self.agents.get(id).is_some_and(Agent::is_visible))
            .collect()
    }

    /// Serializable state of every non-camera agent, in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents
            .values()
            .filter(|agent| !agent.is_camera())
            .map(|agent| AgentSnapshot {
                id: agent.id,
                rectangle: agent.rectangle,
                solid: agent.is_solid(),
                visible: agent.is_visible(),
                image: agent.image.clone(),
            })
            .collect()
    }

    /// Returns `true` if the two agents are recorded as overlapping.
    #[must_use]
    pub fn are_overlapping(&self, a: AgentId, b: AgentId) -> bool {
        self.overlaps.contains(a, b)
    }

    /// Agents recorded as overlapping `id`, in id order.
    #[must_use]
    pub fn overlapping_partners(&self, id: AgentId) -> Vec<AgentId> {
        self.overlaps.partners_of(id).collect()
    }

    /// Recompute the recorded overlaps of one agent from its current
    /// rectangle, without notifying anyone.
    pub(crate) fn sync_overlaps(&mut self, id: AgentId) {
        self.overlaps.unlink_all(id);
        let Some(agent) = self.agents.get(&id) else {
            return;
        };
        if !agent.is_alive() || !agent.is_visible() || agent.is_camera() {
            return;
        }
        let exclude = BTreeSet::from([id]);
        let overlapping: Vec<AgentId> = self
            .candidates(&agent.rectangle, &exclude)
            .into_iter()
            .filter(|other| self.interaction(id, *other) == Some(Interaction::Overlap))
            .collect();
        for other in overlapping {
            self.overlaps.link(id, other);
        }
    }

    // =========================================================================
    // Lifecycle and visibility
    // =========================================================================

    /// Kill an agent and remove it from the world.
    ///
    /// Containers kill their members first. A member that dies leaves its
    /// container, and the remaining members are laid out again. Returns
    /// `false` if the agent does not exist or is already dying.
    pub fn kill(&mut self, id: AgentId) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        if !agent.is_alive() {
            return false;
        }
        agent.flags.remove(AgentFlags::ALIVE);
        let owner = agent.container;
        let members: Vec<AgentId> = agent
            .as_container()
            .map(|state| state.members().to_vec())
            .unwrap_or_default();

        for member in members {
            self.kill(member);
        }
        self.remove_agent(id);
        self.journal.record(WorldEvent::Died { agent: id });
        debug!(%id, "agent died");

        if let Some(owner) = owner.filter(|owner| self.is_live(*owner)) {
            if let Some(state) = self.agents.get_mut(&owner).and_then(Agent::as_container_mut) {
                state.members.retain(|member| *member != id);
            }
            self.relayout(owner);
        }
        true
    }

    /// Show or hide an agent.
    ///
    /// `on_visible` / `on_not_visible` fire only when the visibility actually
    /// changes.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] if the agent does not exist.
    pub fn set_visible(&mut self, id: AgentId, visible: bool) -> Result<(), WorldError> {
        let agent = self.agents.get_mut(&id).ok_or_else(|| {
            warn!(%id, "set_visible on unknown agent");
            WorldError::UnknownAgent(id)
        })?;
        if agent.is_visible() == visible {
            return Ok(());
        }
        agent.flags.set(AgentFlags::VISIBLE, visible);
        self.sync_overlaps(id);
        self.journal
            .record(WorldEvent::VisibilityChanged { agent: id, visible });
        let slot = if visible {
            AgentSlot::Visible
        } else {
            AgentSlot::NotVisible
        };
        self.fire_agent_hook(slot, id);
        Ok(())
    }

    /// Drain the event journal.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        self.journal.take_events()
    }

    /// Pending events, without draining them.
    #[must_use]
    pub const fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // =========================================================================
    // Random helpers
    // =========================================================================

    /// A center where a `size` rectangle fits inside the world without
    /// intersecting any solid or visible agent.
    ///
    /// Draws from the environment's seeded generator, so the same seed and
    /// call sequence yield the same positions. Returns `None` after
    /// [`RANDOM_PLACEMENT_ATTEMPTS`] misses or if `size` exceeds the world.
    pub fn random_free_position(&mut self, size: Vector) -> Option<Vector> {
        let size = size.abs();
        let half = size * 0.5;
        let world = self.world;
        if size.x > world.size().x || size.y > world.size().y {
            return None;
        }
        let empty = BTreeSet::new();
        for _ in 0..RANDOM_PLACEMENT_ATTEMPTS {
            let center = Vector::new(
                self.rng.gen_range(world.left() + half.x..=world.right() - half.x),
                self.rng.gen_range(world.top() + half.y..=world.bottom() - half.y),
            );
            let rect = Rectangle::new(center, size);
            let occupied = self.candidates(&rect, &empty).into_iter().any(|other| {
                self.agents
                    .get(&other)
                    .is_some_and(|agent| agent.is_solid() || agent.is_visible())
            });
            if !occupied {
                return Some(center);
            }
        }
        debug!(?size, "no free position found");
        None
    }

    /// Create an agent at a random free position.
    pub fn create_agent_at_random_free_position(
        &mut self,
        image: impl Into<ImageRef>,
        width: f32,
        height: f32,
        is_solid: bool,
    ) -> Option<AgentId> {
        let size = Vector::new(width, height);
        let center = self.random_free_position(size)?;
        self.create_agent_with_rectangle(image, Rectangle::new(center, size), is_solid)
    }

    /// Try to move `step` units in a uniformly random direction.
    pub fn move_in_random_direction(&mut self, id: AgentId, step: f32) -> bool {
        let angle = self.rng.gen_range(0.0..TAU);
        self.move_agent(id, Vector::from_angle(angle) * step, false)
    }
}
