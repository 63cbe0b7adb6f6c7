//! 2D rigid-body contact management and a sequential impulse solver.
//!
//! Colliders are paired by a grid broad phase, turned into persistent
//! [`Contact`]s by a shape-pair dispatch table, and solved island by island
//! with warm-started velocity iterations followed by position correction.

pub mod collision;
pub mod common;
pub mod constraints;
pub mod contacts;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

pub use collision::{Manifold, WorldManifold};
pub use common::{Material, MixingRule, PhysicsError, Result, SolverSettings, WorldSettings};
pub use constraints::ContactImpulse;
pub use contacts::{Contact, ContactHandle, ContactRegistry, DispatchTable};
pub use math::{Transform, Vec2};
pub use objects::{BodyHandle, BodyType, Collider, ColliderHandle, Filter, RigidBody};
pub use shapes::{Circle, Edge, Polygon, Shape, ShapeType};
pub use world::{ContactEvent, ContactEventLog, ContactListener, PhysicsWorld};
