//! World event journal.
//!
//! Every notification the environment delivers to agent hooks is also
//! recorded here as data, in the order it happened. Hosts drain the journal
//! with [`Environment::take_events`](crate::environment::Environment::take_events)
//! and forward it to whatever presentation or network layer they run; the
//! simulation itself performs no I/O.

use serde::{Deserialize, Serialize};
use tessera::Rectangle;

use crate::agent::AgentId;

/// Something that happened in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// An agent was registered.
    Created {
        /// New agent
        agent: AgentId,
        /// Initial rectangle
        rectangle: Rectangle,
    },
    /// An agent was killed and removed.
    Died {
        /// Dead agent
        agent: AgentId,
    },
    /// A solid mover ran into a solid agent.
    Collided {
        /// Agent that was moving
        mover: AgentId,
        /// Agent that was hit
        other: AgentId,
    },
    /// Two agents started overlapping.
    Overlapped {
        /// Agent that was moving or placed
        mover: AgentId,
        /// Agent now overlapped
        other: AgentId,
    },
    /// A move was refused at the world border.
    HitWorldBorder {
        /// Agent that tried to leave
        agent: AgentId,
    },
    /// An agent's visibility changed.
    VisibilityChanged {
        /// Affected agent
        agent: AgentId,
        /// New visibility
        visible: bool,
    },
}

impl WorldEvent {
    /// The agent the event is primarily about.
    #[must_use]
    pub const fn subject(&self) -> AgentId {
        match self {
            Self::Created { agent, .. }
            | Self::Died { agent }
            | Self::HitWorldBorder { agent }
            | Self::VisibilityChanged { agent, .. } => *agent,
            Self::Collided { mover, .. } | Self::Overlapped { mover, .. } => *mover,
        }
    }
}

/// Append-only log of [`WorldEvent`]s awaiting collection.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    events: Vec<WorldEvent>,
}

impl EventJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Take all recorded events, leaving the journal empty.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop pending events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Iterate over pending events without draining them.
    pub fn iter(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.iter()
    }
}
