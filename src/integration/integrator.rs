use crate::common::SolverSettings;
use crate::constraints::{Position, Velocity};
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// Semi-implicit Euler velocity update for one island body: gravity, applied
/// forces and damping. Static and kinematic bodies keep their velocity.
pub fn integrate_velocity(body: &RigidBody, velocity: &mut Velocity, gravity: Vec2, dt: f64) {
    if !body.is_dynamic() {
        return;
    }

    // v = v + (g + F/m) * dt
    let linear_acceleration = gravity * body.gravity_scale + body.force * body.inv_mass;
    velocity.v += linear_acceleration * dt;
    // w = w + (T/I) * dt
    velocity.w += body.torque * body.inv_inertia * dt;

    // Pade approximation of exp(-c * dt), stable for any damping.
    velocity.v *= 1.0 / (1.0 + dt * body.linear_damping);
    velocity.w *= 1.0 / (1.0 + dt * body.angular_damping);
}

/// Moves an island body along its velocity, limiting the per-step motion.
/// The velocity is scaled down with the motion so the two stay consistent.
pub fn integrate_position(
    position: &mut Position,
    velocity: &mut Velocity,
    dt: f64,
    settings: &SolverSettings,
) {
    let translation = velocity.v * dt;
    let max_translation = settings.max_translation;
    if translation.magnitude_squared() > max_translation * max_translation {
        velocity.v *= max_translation / translation.magnitude();
    }

    let rotation = velocity.w * dt;
    let max_rotation = settings.max_rotation;
    if rotation * rotation > max_rotation * max_rotation {
        velocity.w *= max_rotation / rotation.abs();
    }

    position.c += velocity.v * dt;
    position.a += velocity.w * dt;
}

/// Wraps an angle in radians to the range [-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}
