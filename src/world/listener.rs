//! Observer hooks for contact events.

use std::sync::{Arc, Mutex};

use crate::collision::Manifold;
use crate::constraints::ContactImpulse;
use crate::contacts::{Contact, ContactHandle};
use crate::objects::ColliderHandle;

/// Callbacks fired by [`PhysicsWorld::step`](super::PhysicsWorld::step).
///
/// All methods have empty defaults. Callbacks observe the simulation; none of
/// them is needed for it to make progress.
pub trait ContactListener: Send {
    /// The contact started touching this step.
    fn begin_contact(&mut self, _handle: ContactHandle, _contact: &Contact) {}

    /// The contact stopped touching, or was destroyed while touching.
    fn end_contact(&mut self, _handle: ContactHandle, _contact: &Contact) {}

    /// The contact is touching after this step's update, including the step
    /// it began.
    fn stay_contact(&mut self, _handle: ContactHandle, _contact: &Contact) {}

    /// Called for touching non-sensor contacts before solving, with the
    /// manifold from the previous step. Returning false disables the contact
    /// for this step only.
    fn pre_solve(&mut self, _handle: ContactHandle, _contact: &Contact, _old_manifold: &Manifold) -> bool {
        true
    }

    /// Impulses the solver applied to the contact this step.
    fn post_solve(&mut self, _handle: ContactHandle, _contact: &Contact, _impulse: &ContactImpulse) {}
}

/// A recorded contact event, keyed by the contact's (A, B) colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    Begin(ColliderHandle, ColliderHandle),
    End(ColliderHandle, ColliderHandle),
    Stay(ColliderHandle, ColliderHandle),
    PostSolve {
        a: ColliderHandle,
        b: ColliderHandle,
        normal_impulse: f64,
    },
}

/// A listener that appends every event to a shared buffer. Clones share the
/// same buffer, so a clone can be handed to the world and the original read
/// back afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContactEventLog {
    events: Arc<Mutex<Vec<ContactEvent>>>,
}

impl ContactEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ContactEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    /// A snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ContactEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn drain(&self) -> Vec<ContactEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    pub fn count_begins(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ContactEvent::Begin(..)))
            .count()
    }

    pub fn count_ends(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ContactEvent::End(..)))
            .count()
    }
}

impl ContactListener for ContactEventLog {
    fn begin_contact(&mut self, _handle: ContactHandle, contact: &Contact) {
        let (a, b) = contact.colliders();
        self.push(ContactEvent::Begin(a, b));
    }

    fn end_contact(&mut self, _handle: ContactHandle, contact: &Contact) {
        let (a, b) = contact.colliders();
        self.push(ContactEvent::End(a, b));
    }

    fn stay_contact(&mut self, _handle: ContactHandle, contact: &Contact) {
        let (a, b) = contact.colliders();
        self.push(ContactEvent::Stay(a, b));
    }

    fn post_solve(&mut self, _handle: ContactHandle, contact: &Contact, impulse: &ContactImpulse) {
        let (a, b) = contact.colliders();
        self.push(ContactEvent::PostSolve {
            a,
            b,
            normal_impulse: impulse.total_normal(),
        });
    }
}
