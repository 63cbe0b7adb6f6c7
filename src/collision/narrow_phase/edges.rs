use tracing::debug;

use super::polygons::{collide_convex, ConvexView};
use crate::collision::manifold::{ContactId, FeatureType, Manifold, ManifoldKind, ManifoldPoint};
use crate::math::{Transform, Vec2};
use crate::shapes::{Circle, Edge, Polygon};

/// Edge (A) against circle (B). The edge is two-sided: the normal faces
/// whichever side the circle is on.
pub fn collide_edge_and_circle(
    edge_a: &Edge,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let q = xf_a.apply_inverse(xf_b.apply(circle_b.center));
    let a = edge_a.v1;
    let b = edge_a.v2;
    let e = b - a;
    let radius = circle_b.radius;

    // Barycentric coordinates of the projection of q onto the edge.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    // Region A
    if v <= 0.0 {
        if q.distance_squared(a) > radius * radius {
            return Manifold::default();
        }
        let mut manifold = Manifold::new(ManifoldKind::Circles, Vec2::ZERO, a);
        manifold.push_point(ManifoldPoint::new(
            circle_b.center,
            ContactId::new(0, FeatureType::Vertex, 0, FeatureType::Vertex),
        ));
        return manifold;
    }

    // Region B
    if u <= 0.0 {
        if q.distance_squared(b) > radius * radius {
            return Manifold::default();
        }
        let mut manifold = Manifold::new(ManifoldKind::Circles, Vec2::ZERO, b);
        manifold.push_point(ManifoldPoint::new(
            circle_b.center,
            ContactId::new(1, FeatureType::Vertex, 0, FeatureType::Vertex),
        ));
        return manifold;
    }

    // Region AB
    let den = e.dot(e);
    let p = (a * u + b * v) * (1.0 / den);
    if q.distance_squared(p) > radius * radius {
        return Manifold::default();
    }

    let mut n = e.cross_scalar(1.0);
    let face = if n.dot(q - a) < 0.0 {
        n = -n;
        1
    } else {
        0
    };

    let mut manifold = Manifold::new(ManifoldKind::FaceA, n.normalize(), a);
    manifold.push_point(ManifoldPoint::new(
        circle_b.center,
        ContactId::new(face, FeatureType::Face, 0, FeatureType::Vertex),
    ));
    manifold
}

/// Edge (A) against convex polygon (B). The edge is treated as a
/// zero-thickness two-vertex outline with a normal on each side.
pub fn collide_edge_and_polygon(
    edge_a: &Edge,
    xf_a: &Transform,
    polygon_b: &Polygon,
    xf_b: &Transform,
) -> Manifold {
    let Some(normal) = edge_a.normal() else {
        debug!(v1 = ?edge_a.v1, "zero-length edge produces no contact");
        return Manifold::default();
    };

    let vertices = [edge_a.v1, edge_a.v2];
    let normals = [normal, -normal];
    let edge_view = ConvexView {
        vertices: &vertices,
        normals: &normals,
        radius: 0.0,
    };
    collide_convex(edge_view, xf_a, polygon_b.into(), xf_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::WorldManifold;
    const EPSILON: f64 = 1e-6;

    fn at(x: f64, y: f64) -> Transform {
        Transform::new(Vec2::new(x, y), 0.0)
    }

    fn ground() -> Edge {
        Edge::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0))
    }

    #[test]
    fn test_circle_above_edge() {
        let circle = Circle::new(0.5);
        let xf_b = at(1.0, 0.4);
        let m = collide_edge_and_circle(&ground(), &at(0.0, 0.0), &circle, &xf_b);
        assert_eq!(m.point_count, 1);
        let wm = WorldManifold::new(&m, &at(0.0, 0.0), 0.0, &xf_b, 0.5);
        assert!((wm.normal.y - 1.0).abs() < EPSILON);
        assert!((wm.separations[0] - -0.1).abs() < EPSILON);
    }

    #[test]
    fn test_circle_below_edge_is_two_sided() {
        let circle = Circle::new(0.5);
        let xf_b = at(-2.0, -0.3);
        let m = collide_edge_and_circle(&ground(), &at(0.0, 0.0), &circle, &xf_b);
        assert_eq!(m.point_count, 1);
        let wm = WorldManifold::new(&m, &at(0.0, 0.0), 0.0, &xf_b, 0.5);
        assert!((wm.normal.y + 1.0).abs() < EPSILON);
        assert!((wm.separations[0] - -0.2).abs() < EPSILON);
    }

    #[test]
    fn test_circle_near_endpoint() {
        let circle = Circle::new(0.5);
        let xf_b = at(5.3, 0.3);
        let m = collide_edge_and_circle(&ground(), &at(0.0, 0.0), &circle, &xf_b);
        assert_eq!(m.point_count, 1);
        assert_eq!(m.kind, ManifoldKind::Circles);
        assert_eq!(m.points[0].id.index_a, 1);

        let far = collide_edge_and_circle(&ground(), &at(0.0, 0.0), &circle, &at(5.4, 0.4));
        assert!(far.is_empty());
    }

    #[test]
    fn test_box_on_edge() {
        let boxed = Polygon::rectangle(0.5, 0.5).unwrap();
        let xf_b = at(0.0, 0.48);
        let m = collide_edge_and_polygon(&ground(), &at(0.0, 0.0), &boxed, &xf_b);
        assert_eq!(m.point_count, 2);
        let wm = WorldManifold::new(&m, &at(0.0, 0.0), 0.0, &xf_b, 0.0);
        assert!((wm.normal.y - 1.0).abs() < EPSILON);
        for i in 0..2 {
            assert!((wm.separations[i] - -0.02).abs() < EPSILON);
        }
    }

    #[test]
    fn test_box_under_edge() {
        let boxed = Polygon::rectangle(0.5, 0.5).unwrap();
        let xf_b = at(1.0, -0.45);
        let m = collide_edge_and_polygon(&ground(), &at(0.0, 0.0), &boxed, &xf_b);
        assert_eq!(m.point_count, 2);
        let wm = WorldManifold::new(&m, &at(0.0, 0.0), 0.0, &xf_b, 0.0);
        assert!((wm.normal.y + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_degenerate_edge() {
        let point = Edge::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
        let boxed = Polygon::rectangle(0.5, 0.5).unwrap();
        let m = collide_edge_and_polygon(&point, &at(0.0, 0.0), &boxed, &at(1.0, 1.0));
        assert!(m.is_empty());
    }
}
