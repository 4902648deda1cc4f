//! Optional event handlers attached to agents.
//!
//! A handler that is `None` is simply skipped. Handlers receive the
//! environment mutably, so they may move, create or kill agents (including
//! their own). While a handler runs it is taken out of its slot; it is put
//! back afterwards unless the agent died or the handler installed a
//! replacement.

use std::fmt;

use crate::agent::AgentId;
use crate::environment::Environment;

/// Handler for two-agent events: `(env, self, other)`.
pub type PairHook = Box<dyn FnMut(&mut Environment, AgentId, AgentId)>;

/// Handler for single-agent events: `(env, self)`.
pub type AgentHook = Box<dyn FnMut(&mut Environment, AgentId)>;

/// Handler for sensing results: `(env, self, sensed)`, nearest first.
pub type SenseHook = Box<dyn FnMut(&mut Environment, AgentId, &[AgentId])>;

/// Event handler slots of an agent.
#[derive(Default)]
pub struct AgentHooks {
    /// A solid agent was hit, or hit this agent
    pub on_collision: Option<PairHook>,
    /// A non-solid overlap started
    pub on_overlapping: Option<PairHook>,
    /// A move was refused because it would leave the world
    pub on_hitting_world_border: Option<AgentHook>,
    /// The agent became visible
    pub on_visible: Option<AgentHook>,
    /// The agent became invisible
    pub on_not_visible: Option<AgentHook>,
}

impl AgentHooks {
    /// Returns `true` if any handler is installed.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.on_collision.is_some()
            || self.on_overlapping.is_some()
            || self.on_hitting_world_border.is_some()
            || self.on_visible.is_some()
            || self.on_not_visible.is_some()
    }

    fn pair_slot(&mut self, slot: PairSlot) -> &mut Option<PairHook> {
        match slot {
            PairSlot::Collision => &mut self.on_collision,
            PairSlot::Overlapping => &mut self.on_overlapping,
        }
    }

    fn agent_slot(&mut self, slot: AgentSlot) -> &mut Option<AgentHook> {
        match slot {
            AgentSlot::WorldBorder => &mut self.on_hitting_world_border,
            AgentSlot::Visible => &mut self.on_visible,
            AgentSlot::NotVisible => &mut self.on_not_visible,
        }
    }
}

impl fmt::Debug for AgentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHooks")
            .field("on_collision", &self.on_collision.is_some())
            .field("on_overlapping", &self.on_overlapping.is_some())
            .field(
                "on_hitting_world_border",
                &self.on_hitting_world_border.is_some(),
            )
            .field("on_visible", &self.on_visible.is_some())
            .field("on_not_visible", &self.on_not_visible.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairSlot {
    Collision,
    Overlapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AgentSlot {
    WorldBorder,
    Visible,
    NotVisible,
}

impl Environment {
    /// Invoke `owner`'s two-agent handler, if any.
    pub(crate) fn fire_pair_hook(&mut self, slot: PairSlot, owner: AgentId, other: AgentId) {
        let Some(mut hook) = self
            .get_mut(owner)
            .and_then(|agent| agent.hooks.pair_slot(slot).take())
        else {
            return;
        };
        hook(self, owner, other);
        if let Some(agent) = self.get_mut(owner) {
            let slot = agent.hooks.pair_slot(slot);
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    /// Invoke `owner`'s single-agent handler, if any.
    pub(crate) fn fire_agent_hook(&mut self, slot: AgentSlot, owner: AgentId) {
        let Some(mut hook) = self
            .get_mut(owner)
            .and_then(|agent| agent.hooks.agent_slot(slot).take())
        else {
            return;
        };
        hook(self, owner);
        if let Some(agent) = self.get_mut(owner) {
            let slot = agent.hooks.agent_slot(slot);
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use tessera::{Rectangle, Vector};

    use super::*;
    use crate::agent::AgentSpec;
    use crate::config::WorldConfig;

    fn env() -> Environment {
        Environment::new(WorldConfig::with_size(100.0, 100.0)).unwrap()
    }

    fn rect(x: f32, y: f32) -> Rectangle {
        Rectangle::new(Vector::new(x, y), Vector::new(10.0, 10.0))
    }

    #[test]
    fn missing_hook_is_noop() {
        let mut env = env();
        let a = env.create_agent_from_spec(AgentSpec::new(rect(10.0, 10.0))).unwrap();
        env.fire_pair_hook(PairSlot::Collision, a, a);
        env.fire_agent_hook(AgentSlot::WorldBorder, a);
        assert!(env.get(a).unwrap().is_alive());
    }

    #[test]
    fn hook_is_restored_after_call() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut env = env();
        let a = env
            .create_agent_from_spec(
                AgentSpec::new(rect(10.0, 10.0)).on_hitting_world_border(move |_, _| {
                    seen.set(seen.get() + 1);
                }),
            )
            .unwrap();

        env.fire_agent_hook(AgentSlot::WorldBorder, a);
        env.fire_agent_hook(AgentSlot::WorldBorder, a);

        assert_eq!(calls.get(), 2);
        assert!(env.get(a).unwrap().hooks().on_hitting_world_border.is_some());
    }

    #[test]
    fn hook_may_kill_its_owner() {
        let mut env = env();
        let a = env
            .create_agent_from_spec(AgentSpec::new(rect(10.0, 10.0)).on_collision(
                |env, me, _| {
                    env.kill(me);
                },
            ))
            .unwrap();
        let b = env.create_agent_from_spec(AgentSpec::new(rect(50.0, 50.0))).unwrap();

        env.fire_pair_hook(PairSlot::Collision, a, b);

        assert!(env.get(a).is_none());
        assert!(env.get(b).is_some());
    }

    #[test]
    fn replacement_installed_by_hook_wins() {
        let replaced = Rc::new(Cell::new(false));
        let flag = Rc::clone(&replaced);
        let mut env = env();
        let a = env
            .create_agent_from_spec(AgentSpec::new(rect(10.0, 10.0)).on_overlapping(
                move |env, me, _| {
                    let flag = Rc::clone(&flag);
                    if let Some(agent) = env.get_mut(me) {
                        agent.hooks_mut().on_overlapping =
                            Some(Box::new(move |_, _, _| flag.set(true)));
                    }
                },
            ))
            .unwrap();

        env.fire_pair_hook(PairSlot::Overlapping, a, a);
        assert!(!replaced.get());
        env.fire_pair_hook(PairSlot::Overlapping, a, a);
        assert!(replaced.get());
    }

    #[test]
    fn debug_lists_installed_hooks() {
        let hooks = AgentHooks {
            on_visible: Some(Box::new(|_, _| {})),
            ..AgentHooks::default()
        };
        let debug = format!("{hooks:?}");
        assert!(debug.contains("on_visible: true"));
        assert!(debug.contains("on_collision: false"));
    }
}
