pub mod aabb;
pub mod manifold;
pub mod narrow_phase;
pub mod spatial_grid;

pub use aabb::AABB;
pub use manifold::{ContactId, FeatureType, Manifold, ManifoldKind, ManifoldPoint, WorldManifold};
pub use narrow_phase::*;
pub use spatial_grid::{PairEvent, PairKey, SpatialGrid};
