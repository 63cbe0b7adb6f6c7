use crate::collision::manifold::{ContactId, FeatureType, Manifold, ManifoldKind, ManifoldPoint};
use crate::common::REFERENCE_FACE_TOLERANCE;
use crate::math::{Transform, Vec2};
use crate::shapes::Polygon;

/// Borrowed view of a convex outline: CCW vertices and their outward face
/// normals. Polygons and edges (as two-vertex outlines) both clip through it.
#[derive(Debug, Clone, Copy)]
pub(super) struct ConvexView<'a> {
    pub vertices: &'a [Vec2],
    pub normals: &'a [Vec2],
    pub radius: f64,
}

impl<'a> From<&'a Polygon> for ConvexView<'a> {
    fn from(polygon: &'a Polygon) -> Self {
        ConvexView {
            vertices: &polygon.vertices,
            normals: &polygon.normals,
            radius: polygon.radius,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ClipVertex {
    v: Vec2,
    id: ContactId,
}

/// Convex polygon against convex polygon, using the separating axis test to
/// choose a reference face and clipping the incident face against it.
pub fn collide_polygons(
    polygon_a: &Polygon,
    xf_a: &Transform,
    polygon_b: &Polygon,
    xf_b: &Transform,
) -> Manifold {
    collide_convex(polygon_a.into(), xf_a, polygon_b.into(), xf_b)
}

pub(super) fn collide_convex(
    poly_a: ConvexView<'_>,
    xf_a: &Transform,
    poly_b: ConvexView<'_>,
    xf_b: &Transform,
) -> Manifold {
    let total_radius = poly_a.radius + poly_b.radius;

    let (edge_a, separation_a) = find_max_separation(&poly_a, xf_a, &poly_b, xf_b);
    if separation_a > total_radius {
        return Manifold::default();
    }

    let (edge_b, separation_b) = find_max_separation(&poly_b, xf_b, &poly_a, xf_a);
    if separation_b > total_radius {
        return Manifold::default();
    }

    // Prefer A's face unless B's is clearly better, so the reference face
    // does not flicker between near-equal candidates.
    let (poly1, xf1, poly2, xf2, edge1, kind, flip) =
        if separation_b > separation_a + REFERENCE_FACE_TOLERANCE {
            (poly_b, xf_b, poly_a, xf_a, edge_b, ManifoldKind::FaceB, true)
        } else {
            (poly_a, xf_a, poly_b, xf_b, edge_a, ManifoldKind::FaceA, false)
        };

    let incident = find_incident_edge(&poly1, xf1, edge1, &poly2, xf2);

    let count1 = poly1.vertices.len();
    let iv1 = edge1;
    let iv2 = (edge1 + 1) % count1;
    let v11 = poly1.vertices[iv1];
    let v12 = poly1.vertices[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = local_tangent.cross_scalar(1.0);
    let plane_point = (v11 + v12) * 0.5;

    let tangent = xf1.rotate(local_tangent);
    let normal = tangent.cross_scalar(1.0);

    let v11 = xf1.apply(v11);
    let v12 = xf1.apply(v12);

    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    // Clip the incident edge against the sides of the reference face.
    let (clip1, count) = clip_segment_to_line(&incident, -tangent, side_offset1, iv1);
    if count < 2 {
        return Manifold::default();
    }
    let (clip2, count) = clip_segment_to_line(&clip1, tangent, side_offset2, iv2);
    if count < 2 {
        return Manifold::default();
    }

    let mut manifold = Manifold::new(kind, local_normal, plane_point);
    for cv in &clip2 {
        let separation = normal.dot(cv.v) - front_offset;
        if separation <= total_radius {
            let id = if flip { cv.id.swapped() } else { cv.id };
            manifold.push_point(ManifoldPoint::new(xf2.apply_inverse(cv.v), id));
        }
    }
    manifold
}

/// Face of `poly1` with the largest separation from `poly2`.
fn find_max_separation(
    poly1: &ConvexView<'_>,
    xf1: &Transform,
    poly2: &ConvexView<'_>,
    xf2: &Transform,
) -> (usize, f64) {
    // Work in poly2's frame.
    let xf = xf2.inverse_mul(*xf1);

    let mut best_index = 0;
    let mut max_separation = f64::NEG_INFINITY;
    for (i, (&n, &v)) in poly1.normals.iter().zip(poly1.vertices).enumerate() {
        let n = xf.rotate(n);
        let v1 = xf.apply(v);

        let si = poly2
            .vertices
            .iter()
            .map(|&v2| n.dot(v2 - v1))
            .fold(f64::INFINITY, f64::min);

        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (best_index, max_separation)
}

/// Edge of `poly2` most anti-parallel to the reference normal, in world space.
fn find_incident_edge(
    poly1: &ConvexView<'_>,
    xf1: &Transform,
    edge1: usize,
    poly2: &ConvexView<'_>,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    let normal1 = xf2.inverse_rotate(xf1.rotate(poly1.normals[edge1]));

    let mut index = 0;
    let mut min_dot = f64::INFINITY;
    for (i, &n) in poly2.normals.iter().enumerate() {
        let dot = normal1.dot(n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (i1 + 1) % poly2.vertices.len();
    [
        ClipVertex {
            v: xf2.apply(poly2.vertices[i1]),
            id: ContactId::new(edge1 as u8, FeatureType::Face, i1 as u8, FeatureType::Vertex),
        },
        ClipVertex {
            v: xf2.apply(poly2.vertices[i2]),
            id: ContactId::new(edge1 as u8, FeatureType::Face, i2 as u8, FeatureType::Vertex),
        },
    ]
}

/// Sutherland-Hodgman clipping of a segment against the half-plane
/// `normal . x <= offset`. Returns the clipped vertices and their count.
fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f64,
    vertex_index_a: usize,
) -> ([ClipVertex; 2], usize) {
    let mut v_out = [ClipVertex::default(); 2];
    let mut count = 0;

    let distance0 = normal.dot(v_in[0].v) - offset;
    let distance1 = normal.dot(v_in[1].v) - offset;

    if distance0 <= 0.0 {
        v_out[count] = v_in[0];
        count += 1;
    }
    if distance1 <= 0.0 {
        v_out[count] = v_in[1];
        count += 1;
    }

    // Endpoints on opposite sides: keep the intersection, which now lies on
    // a vertex of the reference face.
    if distance0 * distance1 < 0.0 {
        let t = distance0 / (distance0 - distance1);
        v_out[count] = ClipVertex {
            v: v_in[0].v + (v_in[1].v - v_in[0].v) * t,
            id: ContactId::new(
                vertex_index_a as u8,
                FeatureType::Vertex,
                v_in[0].id.index_b,
                FeatureType::Face,
            ),
        };
        count += 1;
    }

    (v_out, count)
}
