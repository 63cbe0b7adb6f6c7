//! The simulation world and its contact observers.

pub mod listener;
pub mod physics_world;

pub use listener::{ContactEvent, ContactEventLog, ContactListener};
pub use physics_world::PhysicsWorld;
