//! Narrow-phase collision functions.
//!
//! Each function takes two concrete shapes with the transforms of their
//! owning bodies and returns a [`Manifold`](super::Manifold) in local form.
//! They are pure: no allocation, no shared state, and the same inputs give
//! the same manifold (including contact ids) on every call.

mod circles;
mod edges;
mod polygons;

pub use circles::{collide_circles, collide_polygon_and_circle};
pub use edges::{collide_edge_and_circle, collide_edge_and_polygon};
pub use polygons::collide_polygons;
