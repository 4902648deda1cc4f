//! Optional capabilities an agent may carry.
//!
//! Capabilities are plain data attached to an [`Agent`](crate::agent::Agent)
//! as `Option<_>` fields. The operations that use them live on the
//! [`Environment`] and return [`WorldError::MissingCapability`] when the
//! agent does not carry the capability.
//!
//! - [`TurnableState`]: an orientation, used by `move_towards_orientation`
//! - [`SensingState`]: a sensing range plus the handler that receives what
//!   was sensed

use std::f32::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};
use tessera::Vector;

use crate::agent::{AgentId, SenseHook};
use crate::environment::Environment;
use crate::error::WorldError;

/// Orientation of a turnable agent.
///
/// The angle is in radians, normalized to `[0, TAU)`. Zero faces `+x`; with
/// screen-style coordinates a quarter turn faces down (`+y`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnableState {
    orientation: f32,
}

impl TurnableState {
    /// Create a state facing `orientation` radians.
    #[must_use]
    pub fn new(orientation: f32) -> Self {
        Self {
            orientation: normalize_angle(orientation),
        }
    }

    /// Current orientation in `[0, TAU)`.
    #[must_use]
    pub const fn orientation(&self) -> f32 {
        self.orientation
    }

    /// Rotate by `delta` radians.
    pub fn turn(&mut self, delta: f32) {
        self.orientation = normalize_angle(self.orientation + delta);
    }

    /// Face an absolute angle.
    pub fn set_orientation(&mut self, angle: f32) {
        self.orientation = normalize_angle(angle);
    }

    /// Unit vector pointing where the agent faces.
    #[must_use]
    pub fn direction(&self) -> Vector {
        Vector::from_angle(self.orientation)
    }
}

fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Sensing range and result handler.
pub struct SensingState {
    range: f32,
    pub(crate) on_sensed: Option<SenseHook>,
}

impl SensingState {
    /// Create a sensing capability with no handler installed.
    #[must_use]
    pub fn new(range: f32) -> Self {
        Self {
            range: range.max(0.0),
            on_sensed: None,
        }
    }

    /// Create a sensing capability with a handler.
    #[must_use]
    pub fn with_handler(
        range: f32,
        hook: impl FnMut(&mut Environment, AgentId, &[AgentId]) + 'static,
    ) -> Self {
        Self {
            range: range.max(0.0),
            on_sensed: Some(Box::new(hook)),
        }
    }

    /// Maximum gap between rectangles for an agent to be sensed.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Change the range.
    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    /// Install or replace the handler.
    pub fn set_handler(
        &mut self,
        hook: impl FnMut(&mut Environment, AgentId, &[AgentId]) + 'static,
    ) {
        self.on_sensed = Some(Box::new(hook));
    }
}

impl fmt::Debug for SensingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensingState")
            .field("range", &self.range)
            .field("on_sensed", &self.on_sensed.is_some())
            .finish()
    }
}

impl Environment {
    fn turnable_mut(&mut self, id: AgentId) -> Result<&mut TurnableState, WorldError> {
        let agent = self
            .get_mut(id)
            .filter(|agent| agent.is_alive())
            .ok_or(WorldError::UnknownAgent(id))?;
        agent
            .turnable
            .as_mut()
            .ok_or(WorldError::MissingCapability {
                agent: id,
                capability: "turnable",
            })
    }

    /// Rotate a turnable agent by `delta` radians and return its new orientation.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::MissingCapability`].
    pub fn turn(&mut self, id: AgentId, delta: f32) -> Result<f32, WorldError> {
        let turnable = self.turnable_mut(id)?;
        turnable.turn(delta);
        Ok(turnable.orientation())
    }

    /// Point a turnable agent at an absolute angle.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::MissingCapability`].
    pub fn set_orientation(&mut self, id: AgentId, angle: f32) -> Result<(), WorldError> {
        self.turnable_mut(id)?.set_orientation(angle);
        Ok(())
    }

    /// Turn an agent to face a world position.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::MissingCapability`].
    pub fn face_position(&mut self, id: AgentId, target: Vector) -> Result<(), WorldError> {
        let position = self
            .get(id)
            .map(crate::agent::Agent::position)
            .ok_or(WorldError::UnknownAgent(id))?;
        let offset = target - position;
        let turnable = self.turnable_mut(id)?;
        if offset != Vector::ZERO {
            turnable.set_orientation(offset.to_angle());
        }
        Ok(())
    }

    /// Unit vector a turnable agent is facing.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::MissingCapability`].
    pub fn orientation_vector(&self, id: AgentId) -> Result<Vector, WorldError> {
        let agent = self.get(id).ok_or(WorldError::UnknownAgent(id))?;
        agent
            .turnable()
            .map(TurnableState::direction)
            .ok_or(WorldError::MissingCapability {
                agent: id,
                capability: "turnable",
            })
    }

    /// Move `step` units in the direction a turnable agent faces.
    ///
    /// Returns `Ok(false)` when the move is rejected.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or [`WorldError::MissingCapability`].
    pub fn move_towards_orientation(&mut self, id: AgentId, step: f32) -> Result<bool, WorldError> {
        let direction = self.orientation_vector(id)?;
        Ok(self.move_agent(id, direction * step, false))
    }

    /// Run a sensing agent's sensor and hand the result to its handler.
    ///
    /// Sensed agents are the live, visible, non-camera agents whose rectangle
    /// lies within `range` of the sensor's rectangle, nearest first. The
    /// sensor's own container and fellow members are included.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`], [`WorldError::MissingCapability`] if the
    /// agent cannot sense, or [`WorldError::MissingHandler`] if it can but has
    /// nowhere to report to.
    pub fn sense(&mut self, id: AgentId) -> Result<Vec<AgentId>, WorldError> {
        let agent = self
            .get(id)
            .filter(|agent| agent.is_alive())
            .ok_or(WorldError::UnknownAgent(id))?;
        let sensing = agent.sensing().ok_or(WorldError::MissingCapability {
            agent: id,
            capability: "sensing",
        })?;
        if sensing.on_sensed.is_none() {
            return Err(WorldError::MissingHandler {
                agent: id,
                handler: "on_sensed",
            });
        }
        let range = sensing.range();
        let rect = *agent.rectangle();

        let mut sensed: Vec<(f32, AgentId)> = self
            .grid
            .query_rect(&rect.expanded(range))
            .into_iter()
            .filter(|other| *other != id)
            .filter_map(|other| self.get(other))
            .filter(|other| other.is_alive() && other.is_visible() && !other.is_camera())
            .map(|other| (rect.gap_to(other.rectangle()), other.id()))
            .filter(|(gap, _)| *gap <= range)
            .collect();
        sensed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let sensed: Vec<AgentId> = sensed.into_iter().map(|(_, other)| other).collect();

        let hook = self
            .get_mut(id)
            .and_then(|agent| agent.sensing.as_mut())
            .and_then(|sensing| sensing.on_sensed.take());
        if let Some(mut hook) = hook {
            hook(self, id, &sensed);
            if let Some(sensing) = self.get_mut(id).and_then(|agent| agent.sensing.as_mut()) {
                if sensing.on_sensed.is_none() {
                    sensing.on_sensed = Some(hook);
                }
            }
        }
        Ok(sensed)
    }
}
