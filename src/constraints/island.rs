//! Island partitioning and per-island solving.
//!
//! An island is a set of bodies linked by solvable contacts. Islands never
//! share a non-static body, so each one is solved on its own copy of the
//! body state and the results are committed afterwards.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use super::contact_solver::{ContactImpulse, ContactSolver, SolverBody};
use super::{Position, TimeStep, Velocity};
use crate::contacts::{Contact, ContactHandle, ContactRegistry};
use crate::integration::{integrate_position, integrate_velocity};
use crate::objects::{BodyHandle, RigidBody};

/// Bodies and contacts solved together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Island {
    /// Non-static bodies in discovery order, followed by any static bodies
    /// they touch. A static body can appear in several islands.
    pub bodies: Vec<BodyHandle>,
    /// Contacts in slot order.
    pub contacts: Vec<ContactHandle>,
}

/// Solved state of one island, ready to be committed.
#[derive(Debug, Clone, Default)]
pub struct IslandSolution {
    pub bodies: Vec<(BodyHandle, Position, Velocity)>,
    pub impulses: Vec<(ContactHandle, ContactImpulse)>,
    /// Whether position correction converged within its iterations.
    pub position_solved: bool,
}

/// Splits the world into islands.
///
/// Only touching, enabled, non-sensor contacts link bodies, and static bodies
/// never link further. Every non-static body ends up in exactly one island,
/// including bodies with no contacts.
pub fn build_islands(bodies: &[RigidBody], registry: &ContactRegistry) -> Vec<Island> {
    let mut adjacency: Vec<Vec<(ContactHandle, usize)>> = vec![Vec::new(); bodies.len()];
    for (handle, contact) in registry.iter() {
        if !contact.is_solvable() {
            continue;
        }
        let (a, b) = contact.bodies();
        if a.0 >= bodies.len() || b.0 >= bodies.len() {
            continue;
        }
        adjacency[a.0].push((handle, b.0));
        adjacency[b.0].push((handle, a.0));
    }

    let mut body_seen = vec![false; bodies.len()];
    let mut contact_seen = vec![false; registry.capacity()];
    let mut islands = Vec::new();
    let mut stack = Vec::new();

    for seed in 0..bodies.len() {
        if body_seen[seed] || bodies[seed].is_static() {
            continue;
        }

        let mut island = Island::default();
        let mut statics = Vec::new();
        body_seen[seed] = true;
        stack.push(seed);

        while let Some(index) = stack.pop() {
            if bodies[index].is_static() {
                // Statics join but do not propagate.
                statics.push(BodyHandle(index));
                continue;
            }
            island.bodies.push(BodyHandle(index));

            for &(handle, other) in &adjacency[index] {
                let seen = &mut contact_seen[handle.index() as usize];
                if *seen {
                    continue;
                }
                *seen = true;
                island.contacts.push(handle);

                if !body_seen[other] {
                    body_seen[other] = true;
                    stack.push(other);
                }
            }
        }

        // Let other islands pick up the same static bodies.
        for handle in &statics {
            body_seen[handle.0] = false;
        }
        island.bodies.extend(statics);
        island.contacts.sort_unstable();
        islands.push(island);
    }

    trace!(islands = islands.len(), "islands built");
    islands
}

/// Integrates and solves a single island on local copies of its bodies.
pub fn solve_island(
    island: &Island,
    bodies: &[RigidBody],
    registry: &ContactRegistry,
    step: &TimeStep,
) -> IslandSolution {
    let settings = &step.settings;
    let h = step.dt;

    let local: HashMap<BodyHandle, usize> = island
        .bodies
        .iter()
        .enumerate()
        .map(|(i, &handle)| (handle, i))
        .collect();

    let mut solver_bodies = Vec::with_capacity(island.bodies.len());
    let mut positions = Vec::with_capacity(island.bodies.len());
    let mut velocities = Vec::with_capacity(island.bodies.len());
    for handle in &island.bodies {
        let body = &bodies[handle.0];
        let mut velocity = Velocity {
            v: body.linear_velocity,
            w: body.angular_velocity,
        };
        integrate_velocity(body, &mut velocity, step.gravity, h);

        solver_bodies.push(SolverBody {
            inv_mass: body.inv_mass,
            inv_inertia: body.inv_inertia,
            local_center: body.local_center_of_mass,
        });
        positions.push(Position {
            c: body.position,
            a: body.rotation,
        });
        velocities.push(velocity);
    }

    let contacts: Vec<(ContactHandle, &Contact)> = island
        .contacts
        .iter()
        .filter_map(|&handle| registry.get(handle).map(|contact| (handle, contact)))
        .collect();

    let mut solver = ContactSolver::new(*step, &contacts, &solver_bodies, |b| local.get(&b).copied());
    solver.initialize_velocity_constraints(&positions, &velocities);
    solver.warm_start(&mut velocities);
    for _ in 0..settings.velocity_iterations {
        solver.solve_velocity_constraints(&mut velocities);
    }

    for (position, velocity) in positions.iter_mut().zip(velocities.iter_mut()) {
        integrate_position(position, velocity, h, settings);
    }

    let mut position_solved = false;
    for _ in 0..settings.position_iterations {
        if solver.solve_position_constraints(&mut positions) {
            position_solved = true;
            break;
        }
    }

    IslandSolution {
        bodies: island
            .bodies
            .iter()
            .zip(positions.into_iter().zip(velocities))
            .filter(|(handle, _)| !bodies[handle.0].is_static())
            .map(|(&handle, (position, velocity))| (handle, position, velocity))
            .collect(),
        impulses: solver.impulses(),
        position_solved,
    }
}

/// Solves every island. With the `parallel` feature islands run on the rayon
/// pool; results come back in island order either way.
#[cfg(feature = "parallel")]
pub fn solve_islands(
    islands: &[Island],
    bodies: &[RigidBody],
    registry: &ContactRegistry,
    step: &TimeStep,
) -> Vec<IslandSolution> {
    islands
        .par_iter()
        .map(|island| solve_island(island, bodies, registry, step))
        .collect()
}

/// Solves every island. With the `parallel` feature islands run on the rayon
/// pool; results come back in island order either way.
#[cfg(not(feature = "parallel"))]
pub fn solve_islands(
    islands: &[Island],
    bodies: &[RigidBody],
    registry: &ContactRegistry,
    step: &TimeStep,
) -> Vec<IslandSolution> {
    islands
        .iter()
        .map(|island| solve_island(island, bodies, registry, step))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SolverSettings;
    use crate::math::Vec2;
    use crate::objects::{Collider, ColliderHandle};
    use crate::shapes::{Circle, Shape};
    const EPSILON: f64 = 1e-9;

    struct Fixture {
        bodies: Vec<RigidBody>,
        colliders: Vec<Collider>,
        registry: ContactRegistry,
    }

    impl Fixture {
        fn new(bodies: Vec<RigidBody>) -> Self {
            let colliders = (0..bodies.len())
                .map(|i| {
                    let mut c = Collider::new(Shape::Circle(Circle::new(0.5)));
                    c.body = Some(BodyHandle(i));
                    c
                })
                .collect();
            Self { bodies, colliders, registry: ContactRegistry::default() }
        }

        /// Creates and updates the contact between bodies `a` and `b`.
        fn link(&mut self, a: usize, b: usize) -> ContactHandle {
            let handle = self
                .registry
                .create((ColliderHandle(a), &self.colliders[a]), (ColliderHandle(b), &self.colliders[b]))
                .unwrap();
            let contact = self.registry.get_mut(handle).unwrap();
            let (ca, cb) = contact.colliders();
            let xf_a = self.bodies[ca.0].transform();
            let xf_b = self.bodies[cb.0].transform();
            contact.update(&self.colliders[ca.0].shape, &xf_a, &self.colliders[cb.0].shape, &xf_b);
            handle
        }
    }

    fn step() -> TimeStep {
        TimeStep::new(1.0 / 60.0, 1.0 / 60.0, Vec2::ZERO, SolverSettings::default())
    }

    #[test]
    fn test_chains_and_singletons() {
        let mut f = Fixture::new(vec![
            RigidBody::dynamic(Vec2::new(0.0, 0.0)),
            RigidBody::dynamic(Vec2::new(0.9, 0.0)),
            RigidBody::dynamic(Vec2::new(1.8, 0.0)),
            RigidBody::dynamic(Vec2::new(10.0, 0.0)),
        ]);
        let c01 = f.link(0, 1);
        let c12 = f.link(1, 2);

        let islands = build_islands(&f.bodies, &f.registry);
        assert_eq!(islands.len(), 2);
        let mut first = islands[0].bodies.clone();
        first.sort();
        assert_eq!(first, vec![BodyHandle(0), BodyHandle(1), BodyHandle(2)]);
        assert_eq!(islands[0].contacts, vec![c01, c12]);
        assert_eq!(islands[1].bodies, vec![BodyHandle(3)]);
        assert!(islands[1].contacts.is_empty());
    }

    #[test]
    fn test_static_body_does_not_merge_islands() {
        let mut f = Fixture::new(vec![
            RigidBody::new_static(Vec2::new(0.0, 0.0), 0.0),
            RigidBody::dynamic(Vec2::new(-0.9, 0.0)),
            RigidBody::dynamic(Vec2::new(0.9, 0.0)),
        ]);
        f.link(0, 1);
        f.link(0, 2);

        let islands = build_islands(&f.bodies, &f.registry);
        assert_eq!(islands.len(), 2);
        for island in &islands {
            assert_eq!(island.bodies.len(), 2);
            assert_eq!(island.contacts.len(), 1);
            assert_eq!(island.bodies[1], BodyHandle(0));
        }
    }

    #[test]
    fn test_non_touching_contacts_do_not_link() {
        let mut f = Fixture::new(vec![
            RigidBody::dynamic(Vec2::new(0.0, 0.0)),
            RigidBody::dynamic(Vec2::new(1.05, 0.0)),
        ]);
        f.link(0, 1);
        assert_eq!(build_islands(&f.bodies, &f.registry).len(), 2);
    }

    #[test]
    fn test_disabled_contacts_do_not_link() {
        let mut f = Fixture::new(vec![
            RigidBody::dynamic(Vec2::new(0.0, 0.0)),
            RigidBody::dynamic(Vec2::new(0.9, 0.0)),
        ]);
        let handle = f.link(0, 1);
        f.registry.get_mut(handle).unwrap().set_enabled(false);
        assert_eq!(build_islands(&f.bodies, &f.registry).len(), 2);
    }

    #[test]
    fn test_solve_island_separates_and_reports_impulses() {
        let mut f = Fixture::new(vec![
            RigidBody::new_static(Vec2::new(0.0, 0.0), 0.0),
            RigidBody::dynamic(Vec2::new(0.0, 0.9)).with_linear_velocity(Vec2::new(0.0, -2.0)),
        ]);
        let handle = f.link(0, 1);
        let islands = build_islands(&f.bodies, &f.registry);
        assert_eq!(islands.len(), 1);

        let solution = solve_island(&islands[0], &f.bodies, &f.registry, &step());
        // Only the dynamic body is written back.
        assert_eq!(solution.bodies.len(), 1);
        let (body, position, velocity) = solution.bodies[0];
        assert_eq!(body, BodyHandle(1));
        assert!(velocity.v.y > -EPSILON);
        assert!(position.c.y >= 0.9 - EPSILON);

        assert_eq!(solution.impulses.len(), 1);
        assert_eq!(solution.impulses[0].0, handle);
        assert!(solution.impulses[0].1.normal_impulses[0] > 0.0);
    }

    #[test]
    fn test_solve_islands_matches_sequential() {
        let mut f = Fixture::new(vec![
            RigidBody::new_static(Vec2::new(0.0, 0.0), 0.0),
            RigidBody::dynamic(Vec2::new(-0.9, 0.0)),
            RigidBody::dynamic(Vec2::new(0.9, 0.0)),
            RigidBody::dynamic(Vec2::new(5.0, 5.0)).with_angular_velocity(1.0),
        ]);
        f.link(0, 1);
        f.link(0, 2);
        let islands = build_islands(&f.bodies, &f.registry);
        let all = solve_islands(&islands, &f.bodies, &f.registry, &step());
        assert_eq!(all.len(), islands.len());
        for (island, solution) in islands.iter().zip(&all) {
            let single = solve_island(island, &f.bodies, &f.registry, &step());
            assert_eq!(single.bodies, solution.bodies);
        }
    }
}
