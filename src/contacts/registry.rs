//! Arena of contacts keyed by collider pair.

use std::collections::HashMap;

use tracing::debug;

use super::contact::Contact;
use super::dispatch::DispatchTable;
use crate::collision::PairKey;
use crate::common::{MixingRule, PhysicsError, Result, WorldSettings};
use crate::objects::{Collider, ColliderHandle};

/// Stable reference to a contact slot. A handle goes stale when its contact
/// is destroyed, even if the slot is later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactHandle {
    index: u32,
    generation: u32,
}

impl ContactHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn stale(self) -> PhysicsError {
        PhysicsError::StaleContact {
            index: self.index,
            generation: self.generation,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied { generation: u32, contact: Contact },
    Vacant { generation: u32 },
}

/// Owns every live [`Contact`].
///
/// Each unordered collider pair maps to at most one contact. Slots are
/// recycled through a LIFO free list, and iteration runs in slot order, so a
/// fixed sequence of create/destroy calls always produces the same order.
#[derive(Debug, Clone)]
pub struct ContactRegistry {
    table: DispatchTable,
    friction_mixing: MixingRule,
    restitution_mixing: MixingRule,
    slots: Vec<Slot>,
    free: Vec<u32>,
    pairs: HashMap<PairKey, ContactHandle>,
}

impl ContactRegistry {
    pub fn new(table: DispatchTable, friction_mixing: MixingRule, restitution_mixing: MixingRule) -> Self {
        Self {
            table,
            friction_mixing,
            restitution_mixing,
            slots: Vec::new(),
            free: Vec::new(),
            pairs: HashMap::new(),
        }
    }

    /// The standard table with the world's mixing rules.
    pub fn from_settings(settings: &WorldSettings) -> Self {
        Self::new(
            DispatchTable::standard(),
            settings.friction_mixing,
            settings.restitution_mixing,
        )
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    /// Creates the contact for a collider pair, or returns the existing one.
    ///
    /// The pair is reordered as the shape-type handler expects, so the
    /// contact's A may be either argument.
    pub fn create(
        &mut self,
        a: (ColliderHandle, &Collider),
        b: (ColliderHandle, &Collider),
    ) -> Result<ContactHandle> {
        if a.0 == b.0 {
            return Err(PhysicsError::SameCollider(a.0 .0));
        }
        let key = PairKey::new(a.0, b.0);
        if let Some(&existing) = self.pairs.get(&key) {
            return Ok(existing);
        }

        let contact = self.build(a, b)?;
        let handle = self.allocate(contact);
        self.pairs.insert(key, handle);
        debug!(
            a = key.a.0,
            b = key.b.0,
            slot = handle.index,
            "contact created"
        );
        Ok(handle)
    }

    /// Removes a contact and returns it with its final manifold.
    pub fn destroy(&mut self, handle: ContactHandle) -> Result<Contact> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or_else(|| handle.stale())?;
        match &*slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return Err(handle.stale()),
        }
        let vacant = Slot::Vacant {
            generation: handle.generation.wrapping_add(1),
        };
        let Slot::Occupied { contact, .. } = std::mem::replace(slot, vacant) else {
            return Err(handle.stale());
        };

        self.pairs.remove(&PairKey::new(contact.collider_a, contact.collider_b));
        self.free.push(handle.index);
        debug!(
            a = contact.collider_a.0,
            b = contact.collider_b.0,
            slot = handle.index,
            "contact destroyed"
        );
        Ok(contact)
    }

    /// Rebinds an existing contact slot to a (possibly different) collider
    /// pair, re-dispatching on the new shape types. All impulse history and
    /// touching state is cleared. The handle stays valid.
    pub fn reset(
        &mut self,
        handle: ContactHandle,
        a: (ColliderHandle, &Collider),
        b: (ColliderHandle, &Collider),
    ) -> Result<()> {
        if a.0 == b.0 {
            return Err(PhysicsError::SameCollider(a.0 .0));
        }
        let old_key = {
            let contact = self.get(handle).ok_or_else(|| handle.stale())?;
            PairKey::new(contact.collider_a, contact.collider_b)
        };
        let new_key = PairKey::new(a.0, b.0);
        if new_key != old_key && self.pairs.contains_key(&new_key) {
            return Err(PhysicsError::InvariantViolation(format!(
                "collider pair ({}, {}) already has a contact",
                new_key.a.0, new_key.b.0
            )));
        }

        let rebuilt = self.build(a, b)?;
        let contact = self.get_mut(handle).ok_or_else(|| handle.stale())?;
        *contact = rebuilt;
        contact.clear_history();

        self.pairs.remove(&old_key);
        self.pairs.insert(new_key, handle);
        debug!(a = new_key.a.0, b = new_key.b.0, slot = handle.index, "contact reset");
        Ok(())
    }

    pub fn find(&self, a: ColliderHandle, b: ColliderHandle) -> Option<ContactHandle> {
        self.pairs.get(&PairKey::new(a, b)).copied()
    }

    pub fn get(&self, handle: ContactHandle) -> Option<&Contact> {
        match self.slots.get(handle.index as usize)? {
            Slot::Occupied { generation, contact } if *generation == handle.generation => Some(contact),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: ContactHandle) -> Option<&mut Contact> {
        match self.slots.get_mut(handle.index as usize)? {
            Slot::Occupied { generation, contact } if *generation == handle.generation => Some(contact),
            _ => None,
        }
    }

    /// Live contacts in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ContactHandle, &Contact)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied { generation, contact } => Some((
                ContactHandle {
                    index: index as u32,
                    generation: *generation,
                },
                contact,
            )),
            Slot::Vacant { .. } => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ContactHandle, &mut Contact)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied { generation, contact } => Some((
                ContactHandle {
                    index: index as u32,
                    generation: *generation,
                },
                contact,
            )),
            Slot::Vacant { .. } => None,
        })
    }

    /// Handles of every contact involving `collider`, in slot order.
    pub fn contacts_of(&self, collider: ColliderHandle) -> Vec<ContactHandle> {
        self.iter()
            .filter(|(_, c)| c.collider_a == collider || c.collider_b == collider)
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Re-combines a live contact's friction and restitution from the current
    /// materials of its colliders. Accumulated impulses are kept.
    pub fn remix(&mut self, handle: ContactHandle, colliders: &[Collider]) -> Result<()> {
        let (friction_mixing, restitution_mixing) = (self.friction_mixing, self.restitution_mixing);
        let contact = self.get_mut(handle).ok_or_else(|| handle.stale())?;
        let a = colliders
            .get(contact.collider_a.0)
            .ok_or(PhysicsError::InvalidCollider(contact.collider_a.0))?;
        let b = colliders
            .get(contact.collider_b.0)
            .ok_or(PhysicsError::InvalidCollider(contact.collider_b.0))?;
        contact.friction = friction_mixing.mix(a.material.friction, b.material.friction);
        contact.restitution = restitution_mixing.mix(a.material.restitution, b.material.restitution);
        debug!(index = handle.index, friction = contact.friction, restitution = contact.restitution, "contact remixed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of slots allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn build(&self, a: (ColliderHandle, &Collider), b: (ColliderHandle, &Collider)) -> Result<Contact> {
        let handler = self.table.lookup(a.1.shape_type(), b.1.shape_type())?;
        let (a, b) = if handler.primary { (a, b) } else { (b, a) };
        let friction = self
            .friction_mixing
            .mix(a.1.material.friction, b.1.material.friction);
        let restitution = self
            .restitution_mixing
            .mix(a.1.material.restitution, b.1.material.restitution);
        Contact::new(&handler, a, b, friction, restitution)
    }

    fn allocate(&mut self, contact: Contact) -> ContactHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let generation = match slot {
                Slot::Vacant { generation } => *generation,
                Slot::Occupied { generation, .. } => generation.wrapping_add(1),
            };
            *slot = Slot::Occupied { generation, contact };
            ContactHandle { index, generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied { generation: 0, contact });
            ContactHandle { index, generation: 0 }
        }
    }
}

impl Default for ContactRegistry {
    fn default() -> Self {
        Self::new(DispatchTable::standard(), MixingRule::GeometricMean, MixingRule::Max)
    }
}
