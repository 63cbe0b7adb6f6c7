//! Shared physical properties, tuning constants, settings and errors.

pub mod error;
pub mod material;
pub mod settings;

pub use error::{PhysicsError, Result};
pub use material::{Material, MixingRule};
pub use settings::{SolverSettings, WorldSettings};

/// Maximum number of contact points per manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices on a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Collision and constraint tolerance (meters). Overlap below this is allowed
/// so contacts stay alive between steps.
pub const LINEAR_SLOP: f64 = 0.005;

/// Tolerance used when choosing the polygon reference face.
pub const REFERENCE_FACE_TOLERANCE: f64 = 0.1 * LINEAR_SLOP;
