use tracing::{debug, trace, trace_span, warn};

use super::listener::ContactListener;
use crate::collision::{PairEvent, SpatialGrid};
use crate::common::{Material, PhysicsError, Result, WorldSettings};
use crate::constraints::{build_islands, solve_islands, IslandSolution, TimeStep};
use crate::contacts::{ContactHandle, ContactRegistry, TouchTransition};
use crate::integration::wrap_angle;
use crate::math::Vec2;
use crate::objects::{BodyHandle, BodyType, Collider, ColliderHandle, Filter, RigidBody};
use crate::shapes::MassData;

/// Owns bodies, colliders and contacts and advances them in fixed steps.
pub struct PhysicsWorld {
    bodies: Vec<RigidBody>,
    colliders: Vec<Collider>,
    contacts: ContactRegistry,
    broad_phase: SpatialGrid,
    settings: WorldSettings,
    listener: Option<Box<dyn ContactListener>>,
    // Zero until the first step; feeds the warm-start dt ratio.
    previous_dt: f64,
}

impl PhysicsWorld {
    /// Creates an empty world. Mixing rules and broad-phase sizing are fixed
    /// here; gravity and solver settings may change between steps.
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            bodies: Vec::new(),
            colliders: Vec::new(),
            contacts: ContactRegistry::from_settings(&settings),
            broad_phase: SpatialGrid::new(settings.grid_cell_size, settings.aabb_margin),
            settings,
            listener: None,
            previous_dt: 0.0,
        }
    }

    /// Adds a rigid body to the world and returns its handle. Colliders are
    /// attached afterwards with [`add_collider`](Self::add_collider).
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyHandle {
        body.colliders.clear();
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(body);
        handle
    }

    /// Attaches a collider to `body` and recomputes the body's mass.
    pub fn add_collider(&mut self, body: BodyHandle, mut collider: Collider) -> Result<ColliderHandle> {
        if body.0 >= self.bodies.len() {
            return Err(PhysicsError::InvalidBody(body.0));
        }

        let handle = ColliderHandle(self.colliders.len());
        collider.body = Some(body);
        sync_proxy(&mut self.broad_phase, &self.bodies, handle, &collider);
        self.colliders.push(collider);

        self.bodies[body.0].colliders.push(handle);
        self.refresh_mass(body);

        debug!(body = body.0, collider = handle.0, shape = ?self.colliders[handle.0].shape_type(), "collider added");
        Ok(handle)
    }

    /// Replaces a collider's filter. Existing contacts are re-checked on the
    /// next step, and overlapping pairs that were filtered out get another
    /// chance to begin.
    pub fn set_collider_filter(&mut self, handle: ColliderHandle, filter: Filter) -> Result<()> {
        let collider = self
            .colliders
            .get_mut(handle.0)
            .ok_or(PhysicsError::InvalidCollider(handle.0))?;
        collider.filter = filter;

        for contact in self.contacts.contacts_of(handle) {
            if let Some(contact) = self.contacts.get_mut(contact) {
                contact.flag_for_filtering();
            }
        }
        self.broad_phase.touch_proxy(handle);
        Ok(())
    }

    /// Replaces a collider's material. The owning body's mass is recomputed
    /// from the new density, and contacts that already exist re-mix their
    /// friction and restitution right away.
    pub fn set_collider_material(&mut self, handle: ColliderHandle, material: Material) -> Result<()> {
        let collider = self
            .colliders
            .get_mut(handle.0)
            .ok_or(PhysicsError::InvalidCollider(handle.0))?;
        collider.material = material;
        let owner = collider.body;

        for contact in self.contacts.contacts_of(handle) {
            self.contacts.remix(contact, &self.colliders)?;
        }
        if let Some(body) = owner {
            self.refresh_mass(body);
        }
        Ok(())
    }

    /// Changes how a body takes part in the simulation. Mass is recomputed
    /// from the attached colliders, and every pair involving the body is
    /// re-checked on the next step: contacts the new type rules out are
    /// destroyed, and overlaps it now allows begin.
    pub fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType) -> Result<()> {
        let body = self
            .bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::InvalidBody(handle.0))?;
        if body.body_type == body_type {
            return Ok(());
        }
        body.body_type = body_type;
        if body_type == BodyType::Static {
            body.linear_velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
        }
        body.force = Vec2::ZERO;
        body.torque = 0.0;
        self.refresh_mass(handle);

        for &collider in &self.bodies[handle.0].colliders {
            for contact in self.contacts.contacts_of(collider) {
                if let Some(contact) = self.contacts.get_mut(contact) {
                    contact.flag_for_filtering();
                }
            }
            self.broad_phase.touch_proxy(collider);
        }
        debug!(body = handle.0, ?body_type, "body type changed");
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    /// Mutable access to a body. Moving it is picked up by the broad phase on
    /// the next step.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.0)
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn contacts(&self) -> &ContactRegistry {
        &self.contacts
    }

    pub fn set_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn ContactListener>> {
        self.listener.take()
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Gravity and solver settings apply from the next step. Mixing rules
    /// and broad-phase sizing were fixed when the world was created.
    pub fn settings_mut(&mut self) -> &mut WorldSettings {
        &mut self.settings
    }

    pub fn gravity(&self) -> Vec2 {
        self.settings.gravity
    }

    /// Advances the simulation by one time step `dt`. Steps that are not
    /// strictly positive and finite do nothing.
    pub fn step(&mut self, dt: f64) {
        if !(dt > 0.0 && dt.is_finite()) {
            debug!(dt, "ignoring time step");
            return;
        }
        let span = trace_span!("step", dt);
        let _enter = span.enter();

        // 1. Broad phase: refresh proxies and turn pair changes into contacts
        let events = self.update_broad_phase();
        self.process_pair_events(&events);

        // 2. Narrow phase: new manifolds and touch callbacks
        self.update_contacts();

        // 3. Islands: integrate and solve each one on local copies
        let step = TimeStep::new(dt, self.previous_dt, self.settings.gravity, self.settings.solver);
        let islands = build_islands(&self.bodies, &self.contacts);
        let solutions = solve_islands(&islands, &self.bodies, &self.contacts, &step);

        // 4. Commit solved state and report impulses
        self.commit(solutions);

        // 5. Forces only last for one step
        for body in &mut self.bodies {
            body.clear_accumulators();
        }
        self.previous_dt = dt;
    }

    fn update_broad_phase(&mut self) -> Vec<PairEvent> {
        for (index, collider) in self.colliders.iter().enumerate() {
            sync_proxy(&mut self.broad_phase, &self.bodies, ColliderHandle(index), collider);
        }
        self.broad_phase.update_pairs()
    }

    fn refresh_mass(&mut self, body: BodyHandle) {
        let owner = &mut self.bodies[body.0];
        let mass_data: Vec<MassData> = owner
            .colliders
            .iter()
            .map(|c| {
                let attached = &self.colliders[c.0];
                attached.shape.compute_mass(attached.material.density)
            })
            .collect();
        owner.reset_mass_data(mass_data);
    }

    fn process_pair_events(&mut self, events: &[PairEvent]) {
        for event in events {
            match *event {
                PairEvent::End(key) => {
                    if let Some(handle) = self.contacts.find(key.a, key.b) {
                        self.destroy_contact(handle);
                    }
                }
                PairEvent::Begin(key) => {
                    if !should_collide(&self.bodies, &self.colliders, key.a, key.b) {
                        continue;
                    }
                    let a = (key.a, &self.colliders[key.a.0]);
                    let b = (key.b, &self.colliders[key.b.0]);
                    if let Err(err) = self.contacts.create(a, b) {
                        warn!(a = key.a.0, b = key.b.0, %err, "skipping collider pair");
                    }
                }
            }
        }
    }

    fn update_contacts(&mut self) {
        let mut filtered_out = Vec::new();
        let listener = &mut self.listener;

        for (handle, contact) in self.contacts.iter_mut() {
            let (a, b) = contact.colliders();
            if contact.needs_filtering {
                if !should_collide(&self.bodies, &self.colliders, a, b) {
                    filtered_out.push(handle);
                    continue;
                }
                contact.needs_filtering = false;
            }

            let (body_a, body_b) = contact.bodies();
            let xf_a = self.bodies[body_a.0].transform();
            let xf_b = self.bodies[body_b.0].transform();
            let old_manifold = *contact.manifold();
            let transition = contact.update(&self.colliders[a.0].shape, &xf_a, &self.colliders[b.0].shape, &xf_b);

            match transition {
                TouchTransition::Began => debug!(a = a.0, b = b.0, "contact began touching"),
                TouchTransition::Ended => debug!(a = a.0, b = b.0, "contact stopped touching"),
                TouchTransition::Persisted | TouchTransition::Idle => {}
            }

            let Some(listener) = listener.as_deref_mut() else {
                continue;
            };
            match transition {
                TouchTransition::Began => listener.begin_contact(handle, contact),
                TouchTransition::Ended => listener.end_contact(handle, contact),
                TouchTransition::Persisted | TouchTransition::Idle => {}
            }
            if contact.is_touching() {
                listener.stay_contact(handle, contact);
                if !contact.is_sensor() && !listener.pre_solve(handle, contact, &old_manifold) {
                    contact.set_enabled(false);
                }
            }
        }

        for handle in filtered_out {
            self.destroy_contact(handle);
        }
    }

    fn destroy_contact(&mut self, handle: ContactHandle) {
        match self.contacts.destroy(handle) {
            Ok(contact) => {
                if contact.is_touching() {
                    if let Some(listener) = self.listener.as_deref_mut() {
                        listener.end_contact(handle, &contact);
                    }
                }
            }
            Err(err) => warn!(%err, "failed to destroy contact"),
        }
    }

    fn commit(&mut self, solutions: Vec<IslandSolution>) {
        let mut unsolved = 0;
        for solution in solutions {
            if !solution.position_solved && !solution.impulses.is_empty() {
                unsolved += 1;
            }

            for (handle, position, velocity) in solution.bodies {
                let body = &mut self.bodies[handle.0];
                body.position = position.c;
                body.rotation = wrap_angle(position.a);
                body.linear_velocity = velocity.v;
                body.angular_velocity = velocity.w;
            }

            for (handle, impulse) in solution.impulses {
                let Some(contact) = self.contacts.get_mut(handle) else {
                    continue;
                };
                for (j, point) in contact.manifold.points_mut().iter_mut().take(impulse.count).enumerate() {
                    point.normal_impulse = impulse.normal_impulses[j];
                    point.tangent_impulse = impulse.tangent_impulses[j];
                }
                if let Some(listener) = self.listener.as_deref_mut() {
                    listener.post_solve(handle, contact, &impulse);
                }
            }
        }
        if unsolved > 0 {
            trace!(islands = unsolved, "position error above tolerance after iterations");
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldSettings::default())
    }
}

/// Moves a collider's proxy to its body's current bounds. Colliders with
/// non-finite bounds leave the broad phase until they become finite again.
fn sync_proxy(grid: &mut SpatialGrid, bodies: &[RigidBody], handle: ColliderHandle, collider: &Collider) {
    let Some(body) = collider.body.and_then(|b| bodies.get(b.0)) else {
        grid.remove_proxy(handle);
        return;
    };
    let aabb = collider.compute_aabb(&body.transform());
    if aabb.min.is_finite() && aabb.max.is_finite() {
        grid.update_proxy(handle, &aabb);
    } else {
        warn!(collider = handle.0, "non-finite bounds; collider removed from the broad phase");
        grid.remove_proxy(handle);
    }
}

/// Pair filtering: distinct bodies, at least one of them dynamic, and
/// compatible collision filters.
fn should_collide(bodies: &[RigidBody], colliders: &[Collider], a: ColliderHandle, b: ColliderHandle) -> bool {
    let (Some(collider_a), Some(collider_b)) = (colliders.get(a.0), colliders.get(b.0)) else {
        return false;
    };
    let (Some(body_a), Some(body_b)) = (collider_a.body, collider_b.body) else {
        return false;
    };
    if body_a == body_b {
        return false;
    }
    let (Some(body_a), Some(body_b)) = (bodies.get(body_a.0), bodies.get(body_b.0)) else {
        return false;
    };
    if !body_a.is_dynamic() && !body_b.is_dynamic() {
        return false;
    }
    collider_a.filter.should_collide(&collider_b.filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Manifold;
    use crate::contacts::Contact;
    use crate::shapes::{Circle, Edge, Polygon, Shape};
    use crate::world::{ContactEvent, ContactEventLog};
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-9;
    const DT: f64 = 1.0 / 60.0;

    fn circle(radius: f64) -> Collider {
        Collider::new(Shape::Circle(Circle::new(radius)))
    }

    fn rectangle(half_width: f64, half_height: f64) -> Collider {
        Collider::new(Shape::Polygon(Polygon::rectangle(half_width, half_height).unwrap()))
    }

    fn zero_gravity() -> PhysicsWorld {
        PhysicsWorld::new(WorldSettings {
            gravity: Vec2::ZERO,
            ..WorldSettings::default()
        })
    }

    /// Static 10x1 box whose top face lies on y = 0.
    fn add_ground(world: &mut PhysicsWorld) -> ColliderHandle {
        let ground = world.add_body(RigidBody::new_static(Vec2::new(0.0, -0.5), 0.0));
        world.add_collider(ground, rectangle(5.0, 0.5)).unwrap()
    }

    fn with_log(world: &mut PhysicsWorld) -> ContactEventLog {
        let log = ContactEventLog::new();
        world.set_listener(Box::new(log.clone()));
        log
    }

    #[test]
    fn test_world_new() {
        let world = PhysicsWorld::default();
        assert!(world.bodies().is_empty());
        assert!(world.colliders().is_empty());
        assert!(world.contacts().is_empty());
        assert_eq!(world.gravity(), Vec2::new(0.0, -10.0));
    }

    #[test]
    fn test_add_collider_to_missing_body_fails() {
        let mut world = PhysicsWorld::default();
        let err = world.add_collider(BodyHandle(3), circle(1.0)).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidBody(3));
        assert!(world.colliders().is_empty());
    }

    #[test]
    fn test_add_collider_recomputes_mass() {
        let mut world = PhysicsWorld::default();
        let body = world.add_body(RigidBody::dynamic(Vec2::ZERO));
        let collider = world.add_collider(body, circle(1.0)).unwrap();

        let body_ref = world.body(body).unwrap();
        assert!((body_ref.mass - PI).abs() < EPSILON);
        assert!((body_ref.inv_mass - 1.0 / PI).abs() < EPSILON);
        assert_eq!(body_ref.colliders(), &[collider]);
        assert_eq!(world.collider(collider).unwrap().body(), Some(body));
    }

    #[test]
    fn test_step_gravity() {
        let mut world = PhysicsWorld::default();
        let body = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 10.0)));
        world.add_collider(body, circle(0.5)).unwrap();

        world.step(0.1);

        let body = world.body(body).unwrap();
        // Semi-implicit Euler: velocity first, then position.
        assert!((body.linear_velocity.y + 1.0).abs() < EPSILON);
        assert!((body.position.y - 9.9).abs() < EPSILON);
        assert!(body.position.x.abs() < EPSILON);
    }

    #[test]
    fn test_step_ignores_non_positive_dt() {
        let mut world = PhysicsWorld::default();
        let body = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 10.0)));
        world.add_collider(body, circle(0.5)).unwrap();

        world.step(0.0);
        world.step(-1.0);
        world.step(f64::NAN);

        let body = world.body(body).unwrap();
        assert_eq!(body.position, Vec2::new(0.0, 10.0));
        assert_eq!(body.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut world = PhysicsWorld::default();
        let body = world.add_body(RigidBody::new_static(Vec2::new(1.0, 2.0), 0.0));
        world.add_collider(body, circle(0.5)).unwrap();

        for _ in 0..10 {
            world.step(DT);
        }
        assert_eq!(world.body(body).unwrap().position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_kinematic_body_moves_at_set_velocity() {
        let mut world = PhysicsWorld::default();
        let body = world.add_body(RigidBody::kinematic(Vec2::ZERO).with_linear_velocity(Vec2::new(1.0, 0.0)));
        world.add_collider(body, circle(0.5)).unwrap();

        world.step(0.5);

        let body = world.body(body).unwrap();
        assert!((body.position.x - 0.5).abs() < EPSILON);
        assert!(body.position.y.abs() < EPSILON);
    }

    #[test]
    fn test_overlapping_circles_touch() {
        let mut world = zero_gravity();
        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(1.0)).unwrap();
        let b = world.add_body(RigidBody::dynamic(Vec2::new(1.5, 0.0)));
        world.add_collider(b, circle(1.0)).unwrap();

        world.step(DT);

        assert_eq!(world.contacts().len(), 1);
        let (_, contact) = world.contacts().iter().next().unwrap();
        assert!(contact.is_touching());
        assert_eq!(contact.manifold().point_count, 1);

        let xf_a = world.body(a).unwrap().transform();
        let xf_b = world.body(b).unwrap().transform();
        let wm = contact.world_manifold(&xf_a, &xf_b);
        assert!((wm.normal.x - 1.0).abs() < EPSILON);
        assert!(wm.normal.y.abs() < EPSILON);
        assert!(wm.separations[0] < 0.0);
    }

    #[test]
    fn test_stay_fires_every_touching_step() {
        let mut world = zero_gravity();
        let log = with_log(&mut world);
        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(1.0)).unwrap();
        let b = world.add_body(RigidBody::dynamic(Vec2::new(1.5, 0.0)));
        world.add_collider(b, circle(1.0)).unwrap();

        for _ in 0..3 {
            world.step(DT);
        }

        let stays = log
            .events()
            .iter()
            .filter(|event| matches!(event, ContactEvent::Stay(..)))
            .count();
        assert_eq!(log.count_begins(), 1);
        assert_eq!(stays, 3);
        assert_eq!(log.count_ends(), 0);
    }

    #[test]
    fn test_separated_circles_have_no_contact() {
        let mut world = zero_gravity();
        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(1.0)).unwrap();
        let b = world.add_body(RigidBody::dynamic(Vec2::new(3.0, 0.0)));
        world.add_collider(b, circle(1.0)).unwrap();

        world.step(DT);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_static_pairs_never_make_contacts() {
        let mut world = zero_gravity();
        for x in [0.0, 0.5] {
            let body = world.add_body(RigidBody::new_static(Vec2::new(x, 0.0), 0.0));
            world.add_collider(body, circle(1.0)).unwrap();
        }
        world.step(DT);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_penetration_decreases_monotonically() {
        let mut world = zero_gravity();
        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(1.0)).unwrap();
        let b = world.add_body(RigidBody::dynamic(Vec2::new(1.5, 0.0)));
        world.add_collider(b, circle(1.0)).unwrap();

        let mut penetration = 2.0 - world.body(b).unwrap().position.x;
        for _ in 0..30 {
            world.step(DT);
            let next = 2.0 - world.body(b).unwrap().position.x;
            assert!(next <= penetration + EPSILON, "penetration grew: {} -> {}", penetration, next);
            penetration = next;
        }
        assert!(penetration < 0.01, "final penetration {}", penetration);
        assert!(world.body(b).unwrap().linear_velocity.magnitude() < EPSILON);
    }

    #[test]
    fn test_bounce_reports_one_begin_and_one_end() {
        let mut world = zero_gravity();
        let log = with_log(&mut world);
        let bouncy = Material::new(1.0, 0.0);

        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(0.5).with_material(bouncy)).unwrap();
        let b = world.add_body(RigidBody::dynamic(Vec2::new(3.0, 0.0)).with_linear_velocity(Vec2::new(-3.0, 0.0)));
        world.add_collider(b, circle(0.5).with_material(bouncy)).unwrap();

        for _ in 0..120 {
            world.step(DT);
        }

        assert_eq!(log.count_begins(), 1);
        assert_eq!(log.count_ends(), 1);
        assert!(world.contacts().is_empty());
        let body = world.body(b).unwrap();
        assert!(body.linear_velocity.x > 2.5);
        assert!(body.position.x > 3.0);
    }

    #[test]
    fn test_circle_comes_to_rest_on_ground() {
        let mut world = PhysicsWorld::default();
        let log = with_log(&mut world);
        add_ground(&mut world);
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 1.0)));
        world.add_collider(ball, circle(0.5)).unwrap();

        for _ in 0..120 {
            world.step(DT);
        }

        let body = world.body(ball).unwrap();
        assert!((body.position.y - 0.5).abs() < 0.02, "y = {}", body.position.y);
        assert!(body.linear_velocity.magnitude() < 0.05);

        // At rest the contact carries the ball's weight each step.
        let last_impulse = log
            .events()
            .iter()
            .rev()
            .find_map(|event| match event {
                ContactEvent::PostSolve { normal_impulse, .. } => Some(*normal_impulse),
                _ => None,
            })
            .unwrap();
        let weight_impulse = body.mass * 10.0 * DT;
        assert!((last_impulse - weight_impulse).abs() < 0.1 * weight_impulse);
    }

    #[test]
    fn test_circle_rests_on_edge() {
        let mut world = PhysicsWorld::default();
        let ground = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        let edge = Edge::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        world.add_collider(ground, Collider::new(Shape::Edge(edge))).unwrap();
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 1.0)));
        world.add_collider(ball, circle(0.5)).unwrap();

        for _ in 0..120 {
            world.step(DT);
        }

        let body = world.body(ball).unwrap();
        assert!((body.position.y - 0.5).abs() < 0.02, "y = {}", body.position.y);
    }

    #[test]
    fn test_box_stack_is_stable() {
        let mut world = PhysicsWorld::default();
        add_ground(&mut world);
        let boxes: Vec<BodyHandle> = (0..3)
            .map(|i| {
                let body = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.5 + i as f64)));
                world.add_collider(body, rectangle(0.5, 0.5)).unwrap();
                body
            })
            .collect();

        for _ in 0..180 {
            world.step(DT);
        }

        for (i, &handle) in boxes.iter().enumerate() {
            let body = world.body(handle).unwrap();
            let expected_y = 0.5 + i as f64;
            assert!((body.position.y - expected_y).abs() < 0.05, "box {} y = {}", i, body.position.y);
            assert!(body.position.x.abs() < 0.05, "box {} x = {}", i, body.position.x);
            assert!(body.rotation.abs() < 0.05, "box {} rotation = {}", i, body.rotation);
            assert!(body.linear_velocity.magnitude() < 0.1);
        }
    }

    #[test]
    fn test_friction_stays_inside_cone() {
        let mut world = PhysicsWorld::default();
        add_ground(&mut world);
        let block = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.5)).with_linear_velocity(Vec2::new(4.0, 0.0)));
        world.add_collider(block, rectangle(0.5, 0.5)).unwrap();

        for _ in 0..60 {
            world.step(DT);
            for (_, contact) in world.contacts().iter() {
                for point in contact.manifold().points() {
                    assert!(point.normal_impulse >= 0.0);
                    assert!(point.tangent_impulse.abs() <= contact.friction() * point.normal_impulse + EPSILON);
                }
            }
        }

        let body = world.body(block).unwrap();
        assert!(body.linear_velocity.x < 4.0);
        assert!(body.linear_velocity.x > -0.01);
    }

    #[test]
    fn test_sensor_reports_overlap_without_response() {
        let mut world = PhysicsWorld::default();
        let log = with_log(&mut world);
        let holder = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(holder, rectangle(1.0, 0.25).sensor(true)).unwrap();
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 2.0)));
        world.add_collider(ball, circle(0.25)).unwrap();

        for _ in 0..90 {
            world.step(DT);
        }

        assert!(world.body(ball).unwrap().position.y < -5.0);
        assert_eq!(log.count_begins(), 1);
        assert_eq!(log.count_ends(), 1);
        assert!(!log
            .events()
            .iter()
            .any(|event| matches!(event, ContactEvent::PostSolve { .. })));
    }

    struct PassThrough;

    impl ContactListener for PassThrough {
        fn pre_solve(&mut self, _handle: ContactHandle, _contact: &Contact, _old: &Manifold) -> bool {
            false
        }
    }

    #[test]
    fn test_pre_solve_can_disable_contact() {
        let mut world = PhysicsWorld::default();
        world.set_listener(Box::new(PassThrough));
        add_ground(&mut world);
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 1.0)));
        world.add_collider(ball, circle(0.5)).unwrap();

        for _ in 0..90 {
            world.step(DT);
        }
        assert!(world.body(ball).unwrap().position.y < -2.0);
        assert!(world.take_listener().is_some());
    }

    #[test]
    fn test_filter_change_destroys_and_restores_contact() {
        let mut world = PhysicsWorld::default();
        let log = with_log(&mut world);
        add_ground(&mut world);
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.5)));
        let collider = world.add_collider(ball, circle(0.5)).unwrap();

        world.step(DT);
        assert_eq!(world.contacts().len(), 1);
        assert_eq!(log.count_begins(), 1);

        let blocked = Filter {
            mask_bits: 0,
            ..Filter::default()
        };
        world.set_collider_filter(collider, blocked).unwrap();
        world.step(DT);
        assert!(world.contacts().is_empty());
        assert_eq!(log.count_ends(), 1);

        world.set_collider_filter(collider, Filter::default()).unwrap();
        world.step(DT);
        assert_eq!(world.contacts().len(), 1);
    }

    #[test]
    fn test_set_filter_on_missing_collider_fails() {
        let mut world = PhysicsWorld::default();
        let err = world.set_collider_filter(ColliderHandle(0), Filter::default()).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidCollider(0));
    }

    #[test]
    fn test_static_body_turned_dynamic_starts_colliding() {
        let mut world = zero_gravity();
        let log = with_log(&mut world);
        let a = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(a, circle(1.0)).unwrap();
        let b = world.add_body(RigidBody::new_static(Vec2::new(1.5, 0.0), 0.0));
        world.add_collider(b, circle(1.0)).unwrap();

        world.step(DT);
        assert!(world.contacts().is_empty());

        world.set_body_type(b, BodyType::Dynamic).unwrap();
        let body = world.body(b).unwrap();
        assert_eq!(body.body_type(), BodyType::Dynamic);
        assert!((body.mass - PI).abs() < EPSILON);

        world.step(DT);
        assert_eq!(world.contacts().len(), 1);
        assert_eq!(log.count_begins(), 1);

        for _ in 0..30 {
            world.step(DT);
        }
        assert!(world.body(b).unwrap().position.x > 1.5);
        assert_eq!(log.count_begins(), 1);
    }

    #[test]
    fn test_dynamic_body_turned_static_drops_contact() {
        let mut world = PhysicsWorld::default();
        let log = with_log(&mut world);
        add_ground(&mut world);
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.5)));
        world.add_collider(ball, circle(0.5)).unwrap();

        world.step(DT);
        assert_eq!(world.contacts().len(), 1);

        world.set_body_type(ball, BodyType::Static).unwrap();
        let body = world.body(ball).unwrap();
        assert_eq!(body.inv_mass, 0.0);
        assert_eq!(body.linear_velocity, Vec2::ZERO);

        world.step(DT);
        assert!(world.contacts().is_empty());
        assert_eq!(log.count_ends(), 1);
    }

    #[test]
    fn test_set_body_type_on_missing_body_fails() {
        let mut world = PhysicsWorld::default();
        let err = world.set_body_type(BodyHandle(3), BodyType::Dynamic).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidBody(3));
    }

    #[test]
    fn test_material_change_remixes_existing_contact() {
        let mut world = PhysicsWorld::default();
        add_ground(&mut world);
        let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.5)));
        let collider = world.add_collider(ball, circle(0.5)).unwrap();

        world.step(DT);
        let (_, contact) = world.contacts().iter().next().unwrap();
        assert!((contact.friction() - 0.5).abs() < EPSILON);
        let mass = world.body(ball).unwrap().mass;

        let ice = Material::new(0.0, 0.0).with_density(2.0);
        world.set_collider_material(collider, ice).unwrap();
        assert_eq!(world.collider(collider).unwrap().material, ice);
        let (_, contact) = world.contacts().iter().next().unwrap();
        assert!(contact.friction().abs() < EPSILON);
        assert!((contact.restitution() - 0.2).abs() < EPSILON);
        assert!((world.body(ball).unwrap().mass - 2.0 * mass).abs() < EPSILON);
    }

    #[test]
    fn test_set_material_on_missing_collider_fails() {
        let mut world = PhysicsWorld::default();
        let err = world.set_collider_material(ColliderHandle(0), Material::default()).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidCollider(0));
    }

    #[test]
    fn test_edge_pairs_are_skipped() {
        let mut world = PhysicsWorld::default();
        let segment = || Collider::new(Shape::Edge(Edge::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0))));
        let ground = world.add_body(RigidBody::new_static(Vec2::ZERO, 0.0));
        world.add_collider(ground, segment()).unwrap();
        let falling = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 0.01)));
        world.add_collider(falling, segment()).unwrap();

        world.step(DT);

        assert!(world.contacts().is_empty());
        let body = world.body(falling).unwrap();
        assert!((body.linear_velocity.y + 10.0 * DT).abs() < EPSILON);
    }

    #[test]
    fn test_identical_worlds_stay_identical() {
        fn build() -> PhysicsWorld {
            let mut world = PhysicsWorld::default();
            add_ground(&mut world);
            for i in 0..6 {
                let x = -1.0 + 0.37 * i as f64;
                let y = 1.0 + 0.8 * i as f64;
                let body = world.add_body(RigidBody::dynamic(Vec2::new(x, y)));
                if i % 2 == 0 {
                    world.add_collider(body, circle(0.4)).unwrap();
                } else {
                    world.add_collider(body, rectangle(0.4, 0.3)).unwrap();
                }
            }
            world
        }

        let mut first = build();
        let mut second = build();
        for _ in 0..90 {
            first.step(DT);
            second.step(DT);
        }

        for (a, b) in first.bodies().iter().zip(second.bodies()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.rotation, b.rotation);
            assert_eq!(a.linear_velocity, b.linear_velocity);
        }
        assert_eq!(first.contacts().len(), second.contacts().len());
    }
}
