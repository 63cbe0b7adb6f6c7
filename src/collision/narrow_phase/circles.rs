use tracing::debug;

use crate::collision::manifold::{ContactId, FeatureType, Manifold, ManifoldKind, ManifoldPoint};
use crate::math::{Transform, Vec2};
use crate::shapes::{Circle, Polygon};

/// Circle against circle. Touching circles (distance equal to the radius sum)
/// still produce a point, with zero separation.
pub fn collide_circles(
    circle_a: &Circle,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let p_a = xf_a.apply(circle_a.center);
    let p_b = xf_b.apply(circle_b.center);

    let dist_sq = p_a.distance_squared(p_b);
    let radii_sum = circle_a.radius + circle_b.radius;
    if dist_sq > radii_sum * radii_sum {
        return Manifold::default();
    }

    // The normal is resolved in world space by WorldManifold; coincident
    // centers fall back to the canonical axis there.
    let mut manifold = Manifold::new(ManifoldKind::Circles, Vec2::ZERO, circle_a.center);
    manifold.push_point(ManifoldPoint::new(circle_b.center, ContactId::default()));
    manifold
}

/// Convex polygon (A) against circle (B).
pub fn collide_polygon_and_circle(
    polygon_a: &Polygon,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    // Circle center in the polygon's frame.
    let c_local = xf_a.apply_inverse(xf_b.apply(circle_b.center));
    let radius = polygon_a.radius + circle_b.radius;
    let vertices = &polygon_a.vertices;
    let normals = &polygon_a.normals;
    let n = vertices.len();

    // Face of minimum penetration.
    let mut normal_index = 0;
    let mut separation = f64::NEG_INFINITY;
    for i in 0..n {
        let s = normals[i].dot(c_local - vertices[i]);
        if s > radius {
            return Manifold::default();
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let i1 = normal_index;
    let i2 = (i1 + 1) % n;
    let v1 = vertices[i1];
    let v2 = vertices[i2];
    let face_id = ContactId::new(i1 as u8, FeatureType::Face, 0, FeatureType::Vertex);

    // Center inside the polygon.
    if separation < f64::EPSILON {
        let mut manifold = Manifold::new(ManifoldKind::FaceA, normals[i1], (v1 + v2) * 0.5);
        manifold.push_point(ManifoldPoint::new(circle_b.center, face_id));
        return manifold;
    }

    // Voronoi region of the face: vertex v1, vertex v2 or the face itself.
    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    let (local_normal, local_point, id) = if u1 <= 0.0 {
        if c_local.distance_squared(v1) > radius * radius {
            return Manifold::default();
        }
        let normal = vertex_normal(c_local - v1, normals[i1]);
        (normal, v1, ContactId::new(i1 as u8, FeatureType::Vertex, 0, FeatureType::Vertex))
    } else if u2 <= 0.0 {
        if c_local.distance_squared(v2) > radius * radius {
            return Manifold::default();
        }
        let normal = vertex_normal(c_local - v2, normals[i1]);
        (normal, v2, ContactId::new(i2 as u8, FeatureType::Vertex, 0, FeatureType::Vertex))
    } else {
        let face_center = (v1 + v2) * 0.5;
        if (c_local - face_center).dot(normals[i1]) > radius {
            return Manifold::default();
        }
        (normals[i1], face_center, face_id)
    };

    let mut manifold = Manifold::new(ManifoldKind::FaceA, local_normal, local_point);
    manifold.push_point(ManifoldPoint::new(circle_b.center, id));
    manifold
}

/// Direction from a polygon vertex to the circle center, or the face normal
/// when the center sits on the vertex.
fn vertex_normal(offset: Vec2, face_normal: Vec2) -> Vec2 {
    offset.try_normalize().unwrap_or_else(|| {
        debug!(?face_normal, "circle center on a polygon vertex; using the face normal");
        face_normal
    })
}
