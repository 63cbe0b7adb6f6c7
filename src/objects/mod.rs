pub mod collider;
pub mod rigid_body;

pub use collider::{Collider, ColliderHandle, Filter};
pub use rigid_body::{BodyHandle, BodyType, RigidBody};
