use super::collider::ColliderHandle;
use crate::math::{Transform, Vec2};
use crate::shapes::MassData;

/// Stable index of a body inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub usize);

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves; infinite mass.
    Static,
    /// Moves with its set velocity; infinite mass, unaffected by contacts.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Changed after insertion only through `PhysicsWorld::set_body_type`.
    pub(crate) body_type: BodyType,
    pub local_center_of_mass: Vec2, // Offset from the body origin to the center of mass

    // Primary state
    pub position: Vec2, // World position of the center of mass
    pub rotation: f64,  // Radians
    pub linear_velocity: Vec2,
    pub angular_velocity: f64, // Radians per second

    // Accumulators for forces/torques applied during a time step
    pub force: Vec2,
    pub torque: f64,

    // Physical properties, derived from the attached colliders
    pub mass: f64,
    pub inv_mass: f64,    // 0.0 for static and kinematic bodies
    pub inertia: f64,     // About the center of mass
    pub inv_inertia: f64, // 0.0 when rotation is locked by infinite inertia

    pub linear_damping: f64,
    pub angular_damping: f64,
    pub gravity_scale: f64,

    pub(crate) colliders: Vec<ColliderHandle>,
}

impl RigidBody {
    /// Creates a body of the given type whose origin sits at `position`.
    /// Dynamic bodies start with unit mass until colliders are attached.
    pub fn new(body_type: BodyType, position: Vec2) -> Self {
        let (mass, inv_mass) = match body_type {
            BodyType::Dynamic => (1.0, 1.0),
            BodyType::Static | BodyType::Kinematic => (0.0, 0.0),
        };
        Self {
            body_type,
            local_center_of_mass: Vec2::ZERO,
            position,
            rotation: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            colliders: Vec::new(),
        }
    }

    pub fn dynamic(position: Vec2) -> Self {
        Self::new(BodyType::Dynamic, position)
    }

    pub fn new_static(position: Vec2, rotation: f64) -> Self {
        Self::new(BodyType::Static, position).with_rotation(rotation)
    }

    pub fn kinematic(position: Vec2) -> Self {
        Self::new(BodyType::Kinematic, position)
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        // Rotate about the body origin, keeping it in place.
        let origin = self.transform().position;
        self.rotation = rotation;
        self.position = origin + self.local_center_of_mass.rotate(rotation);
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, omega: f64) -> Self {
        self.angular_velocity = omega;
        self
    }

    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
        self
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Colliders attached to this body, in attachment order.
    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }

    /// Transform of the body origin (where collider geometry is anchored).
    pub fn transform(&self) -> Transform {
        Transform::from_center(self.position, self.rotation, self.local_center_of_mass)
    }

    /// Velocity of a world point rigidly attached to the body.
    pub fn velocity_at_point(&self, point_world: Vec2) -> Vec2 {
        self.linear_velocity + Vec2::scalar_cross(self.angular_velocity, point_world - self.position)
    }

    /// Recomputes mass, center of mass and inertia from collider mass data.
    ///
    /// The body origin stays fixed; the world center of mass moves with the
    /// new local center, and the linear velocity is adjusted so points on the
    /// body keep their velocity.
    pub fn reset_mass_data<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = MassData>,
    {
        let origin = self.transform().position;
        let old_center = self.position;

        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.local_center_of_mass = Vec2::ZERO;

        if !self.is_dynamic() {
            self.position = origin;
            return;
        }

        let mut local_center = Vec2::ZERO;
        let mut inertia = 0.0;
        for md in shapes {
            self.mass += md.mass;
            local_center += md.center * md.mass;
            inertia += md.inertia;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            local_center = local_center * self.inv_mass;
        } else {
            // Massless dynamic bodies (e.g. only edges attached) still need to move.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if inertia > 0.0 {
            // Shift inertia from the body origin to the center of mass.
            self.inertia = inertia - self.mass * local_center.magnitude_squared();
            if self.inertia > 0.0 {
                self.inv_inertia = 1.0 / self.inertia;
            } else {
                self.inertia = 0.0;
            }
        }

        self.local_center_of_mass = local_center;
        self.position = origin + local_center.rotate(self.rotation);
        self.linear_velocity += Vec2::scalar_cross(self.angular_velocity, self.position - old_center);
    }

    /// Applies a force at the center of mass.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Applies a force at a specific point (in world coordinates).
    /// This generates both linear force and torque.
    pub fn apply_force_at_point(&mut self, force: Vec2, point_world: Vec2) {
        self.force += force;
        let radius_vector = point_world - self.position;
        self.torque += radius_vector.cross(force);
    }

    /// Applies an instantaneous impulse at a world point.
    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point_world: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * (point_world - self.position).cross(impulse);
    }

    /// Should typically be called after integration in each simulation step.
    pub fn clear_accumulators(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}
