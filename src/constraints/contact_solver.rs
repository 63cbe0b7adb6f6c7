//! Sequential impulse contact solver with warm starting and non-linear
//! Gauss-Seidel position correction.

use tracing::{debug, error, warn};

use super::{get_mutable_pair, Position, TimeStep, Velocity};
use crate::collision::{Manifold, ManifoldKind, WorldManifold};
use crate::common::MAX_MANIFOLD_POINTS;
use crate::contacts::{Contact, ContactHandle};
use crate::math::{Transform, Vec2};
use crate::objects::BodyHandle;

/// Mass properties of an island body as seen by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverBody {
    pub inv_mass: f64,
    pub inv_inertia: f64,
    pub local_center: Vec2,
}

/// Accumulated impulses applied to a contact during one step, reported to
/// listeners after solving.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactImpulse {
    pub normal_impulses: [f64; MAX_MANIFOLD_POINTS],
    pub tangent_impulses: [f64; MAX_MANIFOLD_POINTS],
    pub count: usize,
}

impl ContactImpulse {
    /// Sum of the normal impulses over all points.
    pub fn total_normal(&self) -> f64 {
        self.normal_impulses[..self.count].iter().sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f64,
    tangent_impulse: f64,
    normal_mass: f64,
    tangent_mass: f64,
    velocity_bias: f64,
}

#[derive(Debug, Clone)]
struct VelocityConstraint {
    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],
    point_count: usize,
    normal: Vec2,
    friction: f64,
    restitution: f64,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f64,
    inv_mass_b: f64,
    inv_i_a: f64,
    inv_i_b: f64,
    contact: ContactHandle,
}

#[derive(Debug, Clone)]
struct PositionConstraint {
    /// Local-form geometry copied from the contact; impulses unused.
    manifold: Manifold,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f64,
    inv_mass_b: f64,
    inv_i_a: f64,
    inv_i_b: f64,
    local_center_a: Vec2,
    local_center_b: Vec2,
    radius_a: f64,
    radius_b: f64,
}

/// Solves the contacts of one island against island-local body state.
///
/// Constraints are built in the order the contacts are given and every
/// iteration visits them, and their points, in that same order.
#[derive(Debug)]
pub struct ContactSolver {
    step: TimeStep,
    velocity_constraints: Vec<VelocityConstraint>,
    position_constraints: Vec<PositionConstraint>,
}

impl ContactSolver {
    /// Copies the manifolds of `contacts` into constraints. `local_index`
    /// maps a body to its slot in the island arrays; contacts whose bodies
    /// are not in the island are skipped.
    pub fn new<F>(
        step: TimeStep,
        contacts: &[(ContactHandle, &Contact)],
        bodies: &[SolverBody],
        local_index: F,
    ) -> Self
    where
        F: Fn(BodyHandle) -> Option<usize>,
    {
        let mut velocity_constraints = Vec::with_capacity(contacts.len());
        let mut position_constraints = Vec::with_capacity(contacts.len());

        let warm_scale = if step.settings.warm_starting {
            step.settings.warm_start_factor * step.dt_ratio
        } else {
            0.0
        };

        for &(handle, contact) in contacts {
            let (body_a, body_b) = contact.bodies();
            let (Some(index_a), Some(index_b)) = (local_index(body_a), local_index(body_b)) else {
                error!(?handle, "contact references a body outside its island");
                continue;
            };
            let (Some(sa), Some(sb)) = (bodies.get(index_a), bodies.get(index_b)) else {
                error!(?handle, "island body index out of range");
                continue;
            };

            let manifold = contact.manifold();
            let point_count = manifold.point_count.min(MAX_MANIFOLD_POINTS);
            if point_count == 0 {
                continue;
            }

            let mut vc = VelocityConstraint {
                points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                point_count,
                normal: Vec2::ZERO,
                friction: contact.friction(),
                restitution: contact.restitution(),
                index_a,
                index_b,
                inv_mass_a: sa.inv_mass,
                inv_mass_b: sb.inv_mass,
                inv_i_a: sa.inv_inertia,
                inv_i_b: sb.inv_inertia,
                contact: handle,
            };
            let pc = PositionConstraint {
                manifold: *manifold,
                index_a,
                index_b,
                inv_mass_a: sa.inv_mass,
                inv_mass_b: sb.inv_mass,
                inv_i_a: sa.inv_inertia,
                inv_i_b: sb.inv_inertia,
                local_center_a: sa.local_center,
                local_center_b: sb.local_center,
                radius_a: contact.radius_a,
                radius_b: contact.radius_b,
            };

            for (vcp, mp) in vc.points.iter_mut().zip(manifold.points()) {
                vcp.normal_impulse = warm_scale * mp.normal_impulse;
                vcp.tangent_impulse = warm_scale * mp.tangent_impulse;
            }

            velocity_constraints.push(vc);
            position_constraints.push(pc);
        }

        Self {
            step,
            velocity_constraints,
            position_constraints,
        }
    }

    pub fn constraint_count(&self) -> usize {
        self.velocity_constraints.len()
    }

    /// Computes anchors, effective masses and restitution bias from the
    /// current positions and velocities.
    pub fn initialize_velocity_constraints(&mut self, positions: &[Position], velocities: &[Velocity]) {
        let threshold = self.step.settings.restitution_threshold;

        for (vc, pc) in self.velocity_constraints.iter_mut().zip(&self.position_constraints) {
            let pos_a = positions[vc.index_a];
            let pos_b = positions[vc.index_b];
            let vel_a = velocities[vc.index_a];
            let vel_b = velocities[vc.index_b];

            let xf_a = Transform::from_center(pos_a.c, pos_a.a, pc.local_center_a);
            let xf_b = Transform::from_center(pos_b.c, pos_b.a, pc.local_center_b);

            let world = WorldManifold::new(&pc.manifold, &xf_a, pc.radius_a, &xf_b, pc.radius_b);
            if !world.is_finite() {
                warn!(contact = ?vc.contact, "non-finite contact geometry; constraint disabled");
                vc.point_count = 0;
                continue;
            }

            vc.normal = world.normal;
            let tangent = vc.normal.cross_scalar(1.0);
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);

            for (j, vcp) in vc.points[..vc.point_count].iter_mut().enumerate() {
                vcp.r_a = world.points[j] - pos_a.c;
                vcp.r_b = world.points[j] - pos_b.c;

                let rn_a = vcp.r_a.cross(vc.normal);
                let rn_b = vcp.r_b.cross(vc.normal);
                let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = vcp.r_a.cross(tangent);
                let rt_b = vcp.r_b.cross(tangent);
                let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                // Restitution only for impacts faster than the threshold.
                vcp.velocity_bias = 0.0;
                let dv = vel_b.v + Vec2::scalar_cross(vel_b.w, vcp.r_b)
                    - vel_a.v
                    - Vec2::scalar_cross(vel_a.w, vcp.r_a);
                let v_rel = vc.normal.dot(dv);
                if v_rel < -threshold {
                    vcp.velocity_bias = -vc.restitution * v_rel;
                }
            }
        }
    }

    /// Applies the carried-over impulses before iterating.
    pub fn warm_start(&self, velocities: &mut [Velocity]) {
        for vc in &self.velocity_constraints {
            let Some((vel_a, vel_b)) = get_mutable_pair(velocities, vc.index_a, vc.index_b) else {
                continue;
            };
            let tangent = vc.normal.cross_scalar(1.0);
            for vcp in &vc.points[..vc.point_count] {
                let p = vc.normal * vcp.normal_impulse + tangent * vcp.tangent_impulse;
                vel_a.w -= vc.inv_i_a * vcp.r_a.cross(p);
                vel_a.v -= p * vc.inv_mass_a;
                vel_b.w += vc.inv_i_b * vcp.r_b.cross(p);
                vel_b.v += p * vc.inv_mass_b;
            }
        }
    }

    /// One sequential impulse pass. Each point solves its normal row, then
    /// its friction row against the freshly updated normal impulse.
    pub fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        for vc in &mut self.velocity_constraints {
            let Some((vel_a, vel_b)) = get_mutable_pair(velocities, vc.index_a, vc.index_b) else {
                continue;
            };
            let normal = vc.normal;
            let tangent = normal.cross_scalar(1.0);
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);

            for vcp in &mut vc.points[..vc.point_count] {
                // Normal: never pull.
                let dv = vel_b.v + Vec2::scalar_cross(vel_b.w, vcp.r_b)
                    - vel_a.v
                    - Vec2::scalar_cross(vel_a.w, vcp.r_a);
                let vn = dv.dot(normal);
                let lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);
                let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                let lambda = new_impulse - vcp.normal_impulse;
                vcp.normal_impulse = new_impulse;

                let p = normal * lambda;
                vel_a.v -= p * m_a;
                vel_a.w -= i_a * vcp.r_a.cross(p);
                vel_b.v += p * m_b;
                vel_b.w += i_b * vcp.r_b.cross(p);

                // Friction: clamp to the cone given by the current normal impulse.
                let dv = vel_b.v + Vec2::scalar_cross(vel_b.w, vcp.r_b)
                    - vel_a.v
                    - Vec2::scalar_cross(vel_a.w, vcp.r_a);
                let vt = dv.dot(tangent);
                let lambda = -vcp.tangent_mass * vt;
                let max_friction = vc.friction * vcp.normal_impulse;
                let new_impulse = (vcp.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                let p = tangent * lambda;
                vel_a.v -= p * m_a;
                vel_a.w -= i_a * vcp.r_a.cross(p);
                vel_b.v += p * m_b;
                vel_b.w += i_b * vcp.r_b.cross(p);
            }
        }
    }

    /// Accumulated impulses per contact, for writing back to the manifolds.
    pub fn impulses(&self) -> Vec<(ContactHandle, ContactImpulse)> {
        self.velocity_constraints
            .iter()
            .map(|vc| {
                let mut impulse = ContactImpulse {
                    count: vc.point_count,
                    ..Default::default()
                };
                for (j, vcp) in vc.points[..vc.point_count].iter().enumerate() {
                    impulse.normal_impulses[j] = vcp.normal_impulse;
                    impulse.tangent_impulses[j] = vcp.tangent_impulse;
                }
                (vc.contact, impulse)
            })
            .collect()
    }

    /// One NGS pass. Returns true when the deepest penetration left is
    /// within three times the linear slop.
    pub fn solve_position_constraints(&self, positions: &mut [Position]) -> bool {
        let settings = &self.step.settings;
        let mut min_separation: f64 = 0.0;

        for pc in &self.position_constraints {
            let Some((pos_a, pos_b)) = get_mutable_pair(positions, pc.index_a, pc.index_b) else {
                continue;
            };
            let (m_a, m_b, i_a, i_b) = (pc.inv_mass_a, pc.inv_mass_b, pc.inv_i_a, pc.inv_i_b);

            for j in 0..pc.manifold.point_count {
                let xf_a = Transform::from_center(pos_a.c, pos_a.a, pc.local_center_a);
                let xf_b = Transform::from_center(pos_b.c, pos_b.a, pc.local_center_b);
                let (normal, point, separation) = position_manifold(pc, &xf_a, &xf_b, j);
                if !(normal.is_finite() && point.is_finite() && separation.is_finite()) {
                    continue;
                }

                let r_a = point - pos_a.c;
                let r_b = point - pos_b.c;
                min_separation = min_separation.min(separation);

                // Prevent large corrections and allow slop.
                let c = (settings.baumgarte * (separation + settings.linear_slop))
                    .clamp(-settings.max_linear_correction, 0.0);

                let rn_a = r_a.cross(normal);
                let rn_b = r_b.cross(normal);
                let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };

                let p = normal * impulse;
                pos_a.c -= p * m_a;
                pos_a.a -= i_a * r_a.cross(p);
                pos_b.c += p * m_b;
                pos_b.a += i_b * r_b.cross(p);
            }
        }

        min_separation >= -3.0 * settings.linear_slop
    }
}

/// Normal (A to B), contact point and separation of one point of a
/// position constraint under the given transforms.
fn position_manifold(pc: &PositionConstraint, xf_a: &Transform, xf_b: &Transform, index: usize) -> (Vec2, Vec2, f64) {
    let m = &pc.manifold;
    match m.kind {
        ManifoldKind::Circles => {
            let point_a = xf_a.apply(m.local_point);
            let point_b = xf_b.apply(m.points[0].local_point);
            let normal = (point_b - point_a).try_normalize().unwrap_or_else(|| {
                debug!(?point_a, "coincident circle centers; using canonical normal");
                Vec2::RIGHT
            });
            let point = (point_a + point_b) * 0.5;
            let separation = (point_b - point_a).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, point, separation)
        }
        ManifoldKind::FaceA => {
            let normal = xf_a.rotate(m.local_normal);
            let plane_point = xf_a.apply(m.local_point);
            let clip_point = xf_b.apply(m.points[index].local_point);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldKind::FaceB => {
            let normal = xf_b.rotate(m.local_normal);
            let plane_point = xf_b.apply(m.local_point);
            let clip_point = xf_a.apply(m.points[index].local_point);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            // Ensure normal points from A to B
            (-normal, clip_point, separation)
        }
    }
}
