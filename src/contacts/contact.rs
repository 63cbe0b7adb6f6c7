//! A persistent contact between two colliders.

use tracing::{debug, warn};

use super::dispatch::{CollideFn, ContactKind, Handler};
use crate::collision::{Manifold, WorldManifold};
use crate::common::{PhysicsError, Result};
use crate::math::Transform;
use crate::objects::{BodyHandle, Collider, ColliderHandle};
use crate::shapes::Shape;

/// Result of a [`Contact::update`]: how the touching state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchTransition {
    /// Not touching before, touching now.
    Began,
    /// Touching before, not touching now.
    Ended,
    /// Touching before and now.
    Persisted,
    /// Not touching before or now.
    Idle,
}

impl TouchTransition {
    fn from_states(was_touching: bool, touching: bool) -> Self {
        match (was_touching, touching) {
            (false, true) => TouchTransition::Began,
            (true, false) => TouchTransition::Ended,
            (true, true) => TouchTransition::Persisted,
            (false, false) => TouchTransition::Idle,
        }
    }
}

/// One contact per overlapping collider pair.
///
/// A contact lives from the broad phase's pair-begin until its pair-end, so it
/// can exist with an empty manifold. The manifold is recomputed every step by
/// [`Contact::update`], which carries accumulated impulses over to points
/// whose feature ids persist.
#[derive(Clone)]
pub struct Contact {
    pub(crate) collider_a: ColliderHandle,
    pub(crate) collider_b: ColliderHandle,
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,
    kind: ContactKind,
    collide: CollideFn,
    pub(crate) manifold: Manifold,
    pub(crate) radius_a: f64,
    pub(crate) radius_b: f64,
    pub(crate) friction: f64,
    pub(crate) restitution: f64,
    touching: bool,
    enabled: bool,
    sensor: bool,
    pub(crate) needs_filtering: bool,
}

impl std::fmt::Debug for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contact")
            .field("collider_a", &self.collider_a)
            .field("collider_b", &self.collider_b)
            .field("kind", &self.kind)
            .field("touching", &self.touching)
            .field("enabled", &self.enabled)
            .field("sensor", &self.sensor)
            .field("manifold", &self.manifold)
            .finish()
    }
}

impl Contact {
    /// Builds a contact for colliders already in the handler's order.
    pub(crate) fn new(
        handler: &Handler,
        (collider_a, fixture_a): (ColliderHandle, &Collider),
        (collider_b, fixture_b): (ColliderHandle, &Collider),
        friction: f64,
        restitution: f64,
    ) -> Result<Self> {
        let body_a = fixture_a.body().ok_or(PhysicsError::InvalidCollider(collider_a.0))?;
        let body_b = fixture_b.body().ok_or(PhysicsError::InvalidCollider(collider_b.0))?;
        Ok(Contact {
            collider_a,
            collider_b,
            body_a,
            body_b,
            kind: handler.kind,
            collide: handler.collide,
            manifold: Manifold::default(),
            radius_a: fixture_a.shape.radius(),
            radius_b: fixture_b.shape.radius(),
            friction,
            restitution,
            touching: false,
            enabled: true,
            sensor: fixture_a.is_sensor || fixture_b.is_sensor,
            needs_filtering: false,
        })
    }

    pub fn kind(&self) -> ContactKind {
        self.kind
    }

    pub fn colliders(&self) -> (ColliderHandle, ColliderHandle) {
        (self.collider_a, self.collider_b)
    }

    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.body_a, self.body_b)
    }

    pub fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    /// World-space view of the current manifold.
    pub fn world_manifold(&self, xf_a: &Transform, xf_b: &Transform) -> WorldManifold {
        WorldManifold::new(&self.manifold, xf_a, self.radius_a, xf_b, self.radius_b)
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Enabled contacts are solved. Reset to true on every update.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Marks the contact so the owner re-checks its collision filter.
    pub fn flag_for_filtering(&mut self) {
        self.needs_filtering = true;
    }

    /// Touching, enabled and not a sensor.
    pub fn is_solvable(&self) -> bool {
        self.touching && self.enabled && !self.sensor
    }

    /// Computes a fresh manifold for the current transforms. Shapes must be
    /// passed in this contact's A/B order. Leaves the contact untouched; the
    /// returned points carry no impulses.
    pub fn evaluate(
        &self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
    ) -> Manifold {
        (self.collide)(shape_a, xf_a, shape_b, xf_b)
    }

    /// Re-evaluates the manifold in place, carrying impulses over to points
    /// with matching ids, and reports the change in touching state.
    pub fn update(
        &mut self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
    ) -> TouchTransition {
        let was_touching = self.touching;
        self.enabled = true;

        let manifold = self.evaluate(shape_a, xf_a, shape_b, xf_b);
        let manifold = if manifold.is_empty() || self.is_finite(&manifold, xf_a, xf_b) {
            manifold
        } else {
            warn!(
                a = self.collider_a.0,
                b = self.collider_b.0,
                "discarding non-finite manifold"
            );
            Manifold::default()
        };

        let touching = if self.sensor {
            // Sensors only report overlap.
            self.manifold = Manifold::default();
            !manifold.is_empty()
        } else {
            let old = std::mem::replace(&mut self.manifold, manifold);
            let matched = self.manifold.carry_impulses_from(&old);
            if matched < old.point_count && old.point_count > 0 {
                debug!(
                    a = self.collider_a.0,
                    b = self.collider_b.0,
                    matched,
                    previous = old.point_count,
                    "contact points changed features"
                );
            }
            !self.manifold.is_empty()
        };

        self.touching = touching;
        TouchTransition::from_states(was_touching, touching)
    }

    fn is_finite(&self, manifold: &Manifold, xf_a: &Transform, xf_b: &Transform) -> bool {
        manifold.local_normal.is_finite()
            && manifold.local_point.is_finite()
            && manifold.points().iter().all(|p| p.local_point.is_finite())
            && WorldManifold::new(manifold, xf_a, self.radius_a, xf_b, self.radius_b).is_finite()
    }

    /// Forgets the touching state and all impulse history.
    pub(crate) fn clear_history(&mut self) {
        self.manifold = Manifold::default();
        self.touching = false;
        self.enabled = true;
        self.needs_filtering = false;
    }
}
