//! Error type shared by the registry, shapes and world.

use thiserror::Error;

use crate::shapes::ShapeType;

/// Errors reported by the contact subsystem.
///
/// None of these abort a simulation step: the offending pair, shape or
/// contact is skipped and the rest of the world keeps progressing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("no contact handler registered for {a:?} vs {b:?}")]
    UnsupportedShapePair { a: ShapeType, b: ShapeType },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("a collider cannot be in contact with itself (collider {0})")]
    SameCollider(usize),

    #[error("contact handle {index}:{generation} is stale or was never issued")]
    StaleContact { index: u32, generation: u32 },

    #[error("body {0} does not exist")]
    InvalidBody(usize),

    #[error("collider {0} does not exist")]
    InvalidCollider(usize),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
