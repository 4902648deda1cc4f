//! Test helper functions for building worlds and observing hooks.

use std::cell::Cell;
use std::rc::Rc;

use tessera::{Rectangle, Vector};

use crate::agent::{AgentId, AgentSpec};
use crate::config::WorldConfig;
use crate::container::Layout;
use crate::environment::Environment;

// =============================================================================
// Setup
// =============================================================================

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A 100 x 100 world.
pub fn small_world() -> Environment {
    init_tracing();
    Environment::new(WorldConfig::with_size(100.0, 100.0)).unwrap()
}

/// A 200 x 100 world with the given seed.
pub fn wide_world(seed: u64) -> Environment {
    init_tracing();
    Environment::new(WorldConfig {
        seed,
        ..WorldConfig::with_size(200.0, 100.0)
    })
    .unwrap()
}

/// Rectangle centered at `(x, y)`.
pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Rectangle {
    Rectangle::new(Vector::new(x, y), Vector::new(w, h))
}

/// Spawn a solid 10 x 10 agent.
pub fn spawn_solid(env: &mut Environment, x: f32, y: f32) -> AgentId {
    env.create_agent("solid", 10.0, 10.0, true, x, y).unwrap()
}

/// Horizontal container of two solid 20 x 20 members, 5 apart, with the
/// second member centered at `x = 120`.
///
/// Returns `(container, first, second)`.
pub fn spawn_pair_container(env: &mut Environment) -> (AgentId, AgentId, AgentId) {
    let container = env
        .create_container(rect(107.5, 50.0, 45.0, 20.0), Layout::Horizontal, 5.0)
        .unwrap();
    let first = env.create_agent("first", 20.0, 20.0, true, 15.0, 15.0).unwrap();
    let second = env.create_agent("second", 20.0, 20.0, true, 15.0, 85.0).unwrap();
    env.add_member(container, first).unwrap();
    env.add_member(container, second).unwrap();
    (container, first, second)
}

// =============================================================================
// Hook observation
// =============================================================================

/// Shared call counter for hook closures.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<u32>>);

impl Counter {
    pub fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// 10 x 10 agent whose every collision, overlap and border hook bumps
/// `counter`.
pub fn counted_spec(x: f32, y: f32, solid: bool, counter: &Counter) -> AgentSpec {
    let (c1, c2, c3) = (counter.clone(), counter.clone(), counter.clone());
    AgentSpec::new(rect(x, y, 10.0, 10.0))
        .solid(solid)
        .on_collision(move |_, _, _| c1.bump())
        .on_overlapping(move |_, _, _| c2.bump())
        .on_hitting_world_border(move |_, _| c3.bump())
}
