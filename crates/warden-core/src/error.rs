//! Error types for the Warden world.
//!
//! Only programmer-facing failures are errors: bad configuration, unknown
//! layout names, operations addressed to agents that do not exist or lack a
//! capability. A move that is blocked, or an agent that cannot be created
//! because its space is taken, is an expected outcome and is reported as a
//! plain value (`bool`, `Option`, or
//! [`MoveRejection`](crate::movement::MoveRejection)).

use tessera::GridError;
use thiserror::Error;

use crate::agent::AgentId;

/// Errors returned by environment operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The segment grid rejected its configuration.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A layout orientation string was not recognised.
    #[error("unknown layout orientation `{0}` (expected `horizontal` or `vertical`)")]
    InvalidLayout(String),

    /// No live agent has this id.
    #[error("agent {0} does not exist")]
    UnknownAgent(AgentId),

    /// The agent is not a container.
    #[error("agent {0} is not a container")]
    NotAContainer(AgentId),

    /// Adding the member would make a container contain itself.
    #[error("agent {member} cannot join container {container}: it would contain itself")]
    ContainmentCycle {
        /// Target container
        container: AgentId,
        /// Agent being added
        member: AgentId,
    },

    /// The operation needs a capability the agent does not carry.
    #[error("agent {agent} lacks the {capability} capability")]
    MissingCapability {
        /// Agent addressed
        agent: AgentId,
        /// Capability name
        capability: &'static str,
    },

    /// The capability is present but its handler is not installed.
    #[error("agent {agent} has no {handler} handler")]
    MissingHandler {
        /// Agent addressed
        agent: AgentId,
        /// Handler name
        handler: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            WorldError::UnknownAgent(AgentId::new(4)).to_string(),
            "agent 4 does not exist"
        );
        assert_eq!(
            WorldError::MissingCapability {
                agent: AgentId::new(1),
                capability: "turnable"
            }
            .to_string(),
            "agent 1 lacks the turnable capability"
        );
        assert_eq!(
            WorldError::InvalidLayout("diagonal".into()).to_string(),
            "unknown layout orientation `diagonal` (expected `horizontal` or `vertical`)"
        );
    }

    #[test]
    fn grid_errors_convert() {
        let err: WorldError = GridError::InvalidConfig("cell_size must be positive").into();
        assert_eq!(
            err.to_string(),
            "invalid grid configuration: cell_size must be positive"
        );
    }
}
