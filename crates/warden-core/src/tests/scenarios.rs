//! End-to-end scenarios through the public environment API.

use std::cell::RefCell;
use std::rc::Rc;

use tessera::Vector;

use crate::agent::AgentSpec;
use crate::events::WorldEvent;
use crate::movement::MoveRejection;

use super::helpers::{
    counted_spec, rect, small_world, spawn_pair_container, spawn_solid, wide_world, Counter,
};

// =============================================================================
// Movement
// =============================================================================

#[test]
fn straight_wall_collision() {
    let mut env = small_world();
    let a = spawn_solid(&mut env, 50.0, 50.0);
    let b = spawn_solid(&mut env, 65.0, 50.0);

    assert!(!env.move_agent(a, Vector::new(20.0, 0.0), false));
    assert_eq!(env.get(a).unwrap().position(), Vector::new(50.0, 50.0));
    assert_eq!(env.get(b).unwrap().position(), Vector::new(65.0, 50.0));
}

#[test]
fn boundary_rejection_fires_hook_exactly_once() {
    let mut env = small_world();
    let hits = Counter::default();
    let a = env
        .create_agent_from_spec(counted_spec(95.0, 50.0, false, &hits))
        .unwrap();

    assert!(!env.move_agent(a, Vector::new(10.0, 0.0), false));
    assert_eq!(hits.get(), 1);
    assert_eq!(env.get(a).unwrap().position(), Vector::new(95.0, 50.0));
    assert!(env
        .take_events()
        .contains(&WorldEvent::HitWorldBorder { agent: a }));
}

#[test]
fn zero_move_never_notifies() {
    let mut env = small_world();
    let hits = Counter::default();
    let a = env
        .create_agent_from_spec(counted_spec(50.0, 50.0, false, &hits))
        .unwrap();
    // Overlapping visible neighbours on both sides
    env.create_agent("left", 10.0, 10.0, true, 45.0, 50.0).unwrap();
    env.create_agent("right", 10.0, 10.0, false, 55.0, 50.0).unwrap();

    for _ in 0..3 {
        assert!(env.move_agent(a, Vector::ZERO, false));
    }
    assert_eq!(hits.get(), 0);
}

#[test]
fn non_solid_agents_pass_through_each_other() {
    let mut env = small_world();
    let ghost_hits = Counter::default();
    let other_hits = Counter::default();
    let ghost = env
        .create_agent_from_spec(counted_spec(20.0, 50.0, false, &ghost_hits))
        .unwrap();
    env.create_agent_from_spec(counted_spec(50.0, 50.0, true, &other_hits))
        .unwrap();

    // Walk right through the solid agent and out the other side
    for _ in 0..6 {
        assert!(env.move_right(ghost, 10.0));
    }
    assert_eq!(env.get(ghost).unwrap().position(), Vector::new(80.0, 50.0));
    assert_eq!(ghost_hits.get(), 1);
    assert_eq!(other_hits.get(), 1);
}

#[test]
fn collision_handler_can_destroy_both() {
    let mut env = small_world();
    let a = env
        .create_agent_from_spec(AgentSpec::new(rect(50.0, 50.0, 10.0, 10.0)).solid(true).on_collision(
            |env, me, other| {
                env.kill(other);
                env.kill(me);
            },
        ))
        .unwrap();
    let b = spawn_solid(&mut env, 65.0, 50.0);

    assert_eq!(
        env.validate_move(a, Vector::new(10.0, 0.0)),
        Err(MoveRejection::MoverDied)
    );
    assert!(!env.contains(a));
    assert!(!env.contains(b));
    assert_eq!(env.agent_count(), 0);
    assert!(env.grid().is_empty());
}

#[test]
fn event_journal_records_in_order() {
    let mut env = small_world();
    let a = spawn_solid(&mut env, 50.0, 50.0);
    let b = spawn_solid(&mut env, 65.0, 50.0);
    let ghost = env.create_agent("ghost", 10.0, 10.0, false, 20.0, 50.0).unwrap();
    env.take_events();

    assert!(!env.move_right(a, 10.0));
    assert!(env.move_right(ghost, 25.0));
    env.kill(b);

    assert_eq!(
        env.take_events(),
        vec![
            WorldEvent::Collided { mover: a, other: b },
            WorldEvent::Overlapped {
                mover: ghost,
                other: a
            },
            WorldEvent::Died { agent: b },
        ]
    );
}

#[test]
fn sensing_reports_neighbours_to_handler() {
    let mut env = small_world();
    let sensed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&sensed);
    let sensor = env
        .create_agent_from_spec(AgentSpec::new(rect(50.0, 50.0, 10.0, 10.0)).sensing(
            crate::agent::SensingState::with_handler(15.0, move |_, _, found| {
                sink.borrow_mut().push(found.to_vec());
            }),
        ))
        .unwrap();
    let near = spawn_solid(&mut env, 65.0, 50.0);
    spawn_solid(&mut env, 90.0, 90.0);

    env.sense(sensor).unwrap();
    assert_eq!(*sensed.borrow(), vec![vec![near]]);
}

#[test]
fn handler_relocating_its_own_agent_is_checked_again() {
    let mut env = small_world();
    let jumper = env
        .create_agent_from_spec(AgentSpec::new(rect(50.0, 50.0, 10.0, 10.0)).solid(true).on_collision(
            |env, me, _| {
                env.set_position(me, Vector::new(92.0, 50.0));
            },
        ))
        .unwrap();
    spawn_solid(&mut env, 65.0, 50.0);

    // The handler's own jump is legal; adding the original step is not
    assert_eq!(
        env.validate_move(jumper, Vector::new(10.0, 0.0)),
        Err(MoveRejection::WorldBorder)
    );
    assert_eq!(env.get(jumper).unwrap().rectangle().right(), 97.0);

    let mut env = small_world();
    let jumper = env
        .create_agent_from_spec(AgentSpec::new(rect(50.0, 50.0, 10.0, 10.0)).solid(true).on_collision(
            |env, me, _| {
                env.set_position(me, Vector::new(20.0, 50.0));
            },
        ))
        .unwrap();
    spawn_solid(&mut env, 65.0, 50.0);
    let beside = spawn_solid(&mut env, 35.0, 50.0);

    assert!(!env.move_right(jumper, 10.0));
    assert_eq!(env.get(jumper).unwrap().position(), Vector::new(20.0, 50.0));
    assert!(!env
        .get(jumper)
        .unwrap()
        .rectangle()
        .intersects(env.get(beside).unwrap().rectangle()));
}

#[test]
fn overlap_entered_by_the_other_agent_after_a_check() {
    let mut env = small_world();
    let ghost_hits = Counter::default();
    let wall_hits = Counter::default();
    let ghost = env
        .create_agent_from_spec(counted_spec(20.0, 50.0, false, &ghost_hits))
        .unwrap();
    let wall = env
        .create_agent_from_spec(counted_spec(40.0, 50.0, true, &wall_hits))
        .unwrap();

    assert!(env.check_move(ghost, Vector::new(12.0, 0.0)).is_some());
    assert_eq!((ghost_hits.get(), wall_hits.get()), (1, 1));
    assert!(!env.are_overlapping(ghost, wall));
    assert_eq!(env.get(ghost).unwrap().position(), Vector::new(20.0, 50.0));

    assert!(env.move_left(wall, 12.0));
    assert_eq!((ghost_hits.get(), wall_hits.get()), (2, 2));
    assert!(env.are_overlapping(ghost, wall));
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn container_rigid_move() {
    let mut env = wide_world(0);
    let (container, first, second) = spawn_pair_container(&mut env);
    assert_eq!(env.get(second).unwrap().position(), Vector::new(120.0, 50.0));
    env.create_agent("obstacle", 10.0, 20.0, true, 140.0, 50.0).unwrap();

    assert!(!env.move_agent(container, Vector::new(10.0, 0.0), false));
    assert_eq!(env.get(container).unwrap().position(), Vector::new(107.5, 50.0));
    assert_eq!(env.get(first).unwrap().position(), Vector::new(95.0, 50.0));
    assert_eq!(env.get(second).unwrap().position(), Vector::new(120.0, 50.0));

    // The first member on its own could have moved
    assert!(env.check_move(first, Vector::new(0.0, 10.0)).is_some());
}

#[test]
fn container_border_rejection_moves_nothing() {
    let mut env = wide_world(0);
    let (container, first, second) = spawn_pair_container(&mut env);

    assert!(!env.move_agent(container, Vector::new(0.0, 45.0), false));
    assert_eq!(env.get(first).unwrap().position(), Vector::new(95.0, 50.0));
    assert_eq!(env.get(second).unwrap().position(), Vector::new(120.0, 50.0));
}

#[test]
fn forced_container_move_carries_members() {
    let mut env = wide_world(0);
    let (container, first, second) = spawn_pair_container(&mut env);
    env.create_agent("obstacle", 10.0, 20.0, true, 140.0, 50.0).unwrap();

    assert!(env.move_agent(container, Vector::new(10.0, 0.0), true));
    assert_eq!(env.get(first).unwrap().position(), Vector::new(105.0, 50.0));
    assert_eq!(env.get(second).unwrap().position(), Vector::new(130.0, 50.0));
    for id in [container, first, second] {
        let agent = env.get(id).unwrap();
        let expected = env.grid().cells_overlapping(agent.rectangle());
        assert_eq!(env.grid().cells_of(id).unwrap(), expected.as_slice());
    }
}

#[test]
fn nested_containers_move_as_one() {
    let mut env = wide_world(0);
    let outer = env
        .create_container(rect(100.0, 50.0, 80.0, 20.0), crate::container::Layout::Horizontal, 0.0)
        .unwrap();
    let inner = env
        .create_container(rect(100.0, 50.0, 10.0, 10.0), crate::container::Layout::Vertical, 0.0)
        .unwrap();
    let leaf = env.create_agent("leaf", 5.0, 5.0, true, 10.0, 10.0).unwrap();
    let other = env.create_agent("other", 5.0, 5.0, true, 20.0, 10.0).unwrap();
    env.add_member(inner, leaf).unwrap();
    env.add_member(outer, inner).unwrap();
    env.add_member(outer, other).unwrap();

    // inner fills the left half of outer, leaf fills inner
    assert_eq!(env.get(leaf).unwrap().rectangle(), &rect(80.0, 50.0, 40.0, 20.0));

    let obstacle = spawn_solid(&mut env, 80.0, 75.0);
    assert!(!env.move_down(outer, 15.0));
    assert_eq!(env.get(leaf).unwrap().position(), Vector::new(80.0, 50.0));

    env.kill(obstacle);
    assert!(env.move_down(outer, 10.0));
    assert_eq!(env.get(leaf).unwrap().position(), Vector::new(80.0, 60.0));
    assert_eq!(env.get(other).unwrap().position(), Vector::new(120.0, 60.0));
}

#[test]
fn cascade_death_cleans_the_grid() {
    let mut env = wide_world(0);
    let (container, first, second) = spawn_pair_container(&mut env);
    env.take_events();

    assert!(env.kill(container));
    let died: Vec<_> = env
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            WorldEvent::Died { agent } => Some(agent),
            _ => None,
        })
        .collect();
    assert_eq!(died, vec![first, second, container]);
    assert!(env.grid().is_empty());
    assert_eq!(env.agent_count(), 0);
}
