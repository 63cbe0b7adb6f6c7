//! Shape geometry: the per-type support, bounds and mass functions the
//! narrow phase and the bodies are built on.

pub mod circle;
pub mod edge;
pub mod polygon;

pub use circle::Circle;
pub use edge::Edge;
pub use polygon::Polygon;

use crate::collision::AABB;
use crate::math::{Transform, Vec2};

/// Number of distinct shape types; sizes the contact dispatch table.
pub const SHAPE_TYPE_COUNT: usize = 3;

/// Discriminant of a [`Shape`], used to key contact dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    Circle = 0,
    Polygon = 1,
    Edge = 2,
}

impl ShapeType {
    /// Row/column of this type in the dispatch table.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Mass properties of a shape for a given density.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassData {
    pub mass: f64,
    /// Center of mass in shape-local coordinates.
    pub center: Vec2,
    /// Rotational inertia about the shape origin.
    pub inertia: f64,
}

/// Enum representing the geometric shape of a collider.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
    Edge(Edge),
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Polygon(_) => ShapeType::Polygon,
            Shape::Edge(_) => ShapeType::Edge,
        }
    }

    /// Rounding radius added around the core geometry. Only circles have one.
    pub fn radius(&self) -> f64 {
        match self {
            Shape::Circle(circle) => circle.radius,
            Shape::Polygon(polygon) => polygon.radius,
            Shape::Edge(_) => 0.0,
        }
    }

    /// Furthest point of the shape along `direction`, in local coordinates.
    pub fn support(&self, direction: Vec2) -> Vec2 {
        match self {
            Shape::Circle(circle) => circle.support(direction),
            Shape::Polygon(polygon) => polygon.support(direction),
            Shape::Edge(edge) => edge.support(direction),
        }
    }

    /// World-space bounds of the shape under `xf`, from the support point
    /// along each world axis.
    pub fn compute_aabb(&self, xf: &Transform) -> AABB {
        let extreme = |axis: Vec2| xf.apply(self.support(xf.inverse_rotate(axis)));
        let max_x = extreme(Vec2::new(1.0, 0.0)).x;
        let min_x = extreme(Vec2::new(-1.0, 0.0)).x;
        let max_y = extreme(Vec2::new(0.0, 1.0)).y;
        let min_y = extreme(Vec2::new(0.0, -1.0)).y;
        AABB::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    /// Mass properties for the given density. Edges are massless.
    pub fn compute_mass(&self, density: f64) -> MassData {
        match self {
            Shape::Circle(circle) => circle.compute_mass(density),
            Shape::Polygon(polygon) => polygon.compute_mass(density),
            Shape::Edge(edge) => MassData {
                mass: 0.0,
                center: (edge.v1 + edge.v2) * 0.5,
                inertia: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_circle_aabb_translated() {
        let shape = Shape::Circle(Circle::new(2.0));
        let aabb = shape.compute_aabb(&Transform::new(Vec2::new(1.0, 1.0), 0.7));
        assert!((aabb.min.x - -1.0).abs() < EPSILON);
        assert!((aabb.min.y - -1.0).abs() < EPSILON);
        assert!((aabb.max.x - 3.0).abs() < EPSILON);
        assert!((aabb.max.y - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_aabb_rotated() {
        let shape = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let aabb = shape.compute_aabb(&Transform::new(Vec2::ZERO, std::f64::consts::FRAC_PI_4));
        let half_diag = 2.0_f64.sqrt();
        assert!((aabb.max.x - half_diag).abs() < EPSILON);
        assert!((aabb.min.y + half_diag).abs() < EPSILON);
    }

    #[test]
    fn test_edge_aabb() {
        let shape = Shape::Edge(Edge::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 1.0)));
        let aabb = shape.compute_aabb(&Transform::identity());
        assert_eq!(aabb.min, Vec2::new(-3.0, 0.0));
        assert_eq!(aabb.max, Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_shape_type_indices_are_dense() {
        assert_eq!(ShapeType::Circle.index(), 0);
        assert_eq!(ShapeType::Polygon.index(), 1);
        assert_eq!(ShapeType::Edge.index(), 2);
        assert!(ShapeType::Edge.index() < SHAPE_TYPE_COUNT);
    }

    #[test]
    fn test_edge_is_massless() {
        let shape = Shape::Edge(Edge::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)));
        let mass = shape.compute_mass(5.0);
        assert_eq!(mass.mass, 0.0);
        assert_eq!(mass.center, Vec2::new(1.0, 0.0));
    }
}
