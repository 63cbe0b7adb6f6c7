use super::MassData;
use crate::common::{PhysicsError, Result, MAX_POLYGON_VERTICES};
use crate::math::vec2::Vec2;

/// Represents a convex polygon shape defined by its vertices in local space.
/// Vertices are stored counter-clockwise with one outward unit normal per edge;
/// edge `i` runs from `vertices[i]` to `vertices[i + 1]`.
///
/// The geometry can only be built through [`Polygon::new`], so every polygon
/// the narrow phase sees has been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(crate) vertices: Vec<Vec2>,
    pub(crate) normals: Vec<Vec2>,
    /// Skin radius around the core polygon. Zero for sharp corners.
    pub(crate) radius: f64,
}

impl Polygon {
    /// Creates a new convex polygon from its vertices.
    ///
    /// Clockwise input is reversed into counter-clockwise order. Fails with
    /// `DegenerateGeometry` for fewer than 3 or more than `MAX_POLYGON_VERTICES`
    /// vertices, zero-length edges, collinear vertices or non-convex outlines.
    pub fn new(mut vertices: Vec<Vec2>) -> Result<Self> {
        let n = vertices.len();
        if !(3..=MAX_POLYGON_VERTICES).contains(&n) {
            return Err(PhysicsError::DegenerateGeometry(format!(
                "polygon needs 3..={} vertices, got {}",
                MAX_POLYGON_VERTICES, n
            )));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::DegenerateGeometry("polygon vertex is not finite".into()));
        }

        let signed_area = signed_area(&vertices);
        if signed_area.abs() < 1e-10 {
            return Err(PhysicsError::DegenerateGeometry("polygon has no area".into()));
        }
        if signed_area < 0.0 {
            vertices.reverse();
        }

        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            let normal = edge
                .cross_scalar(1.0)
                .try_normalize()
                .ok_or_else(|| PhysicsError::DegenerateGeometry(format!("polygon edge {} has zero length", i)))?;
            normals.push(normal);
        }

        // Every turn must be a strict left turn.
        for i in 0..n {
            let e1 = vertices[(i + 1) % n] - vertices[i];
            let e2 = vertices[(i + 2) % n] - vertices[(i + 1) % n];
            if e1.cross(e2) <= 1e-12 * e1.magnitude() * e2.magnitude() {
                return Err(PhysicsError::DegenerateGeometry(format!(
                    "polygon is not strictly convex at vertex {}",
                    (i + 1) % n
                )));
            }
        }

        Ok(Polygon { vertices, normals, radius: 0.0 })
    }

    /// Axis-aligned box centered on the local origin.
    pub fn rectangle(half_width: f64, half_height: f64) -> Result<Self> {
        Self::new(vec![
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward unit normal of each edge, in vertex order.
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Calculates the area of the polygon using the Shoelace formula.
    pub fn calculate_area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Calculates the centroid (center of mass for uniform density) of the polygon.
    pub fn calculate_centroid(&self) -> Vec2 {
        let n = self.vertices.len();
        let mut centroid = Vec2::ZERO;
        let mut signed_area_sum = 0.0;
        let origin = self.vertices[0];

        // Triangle fan from the first vertex.
        for i in 1..(n - 1) {
            let v1 = origin;
            let v2 = self.vertices[i];
            let v3 = self.vertices[i + 1];

            let triangle_signed_area = (v2 - v1).cross(v3 - v1) / 2.0;
            signed_area_sum += triangle_signed_area;

            let triangle_centroid = (v1 + v2 + v3) / 3.0;
            centroid += triangle_centroid * triangle_signed_area;
        }

        // Construction rejects zero-area polygons, so the sum is non-zero.
        centroid / signed_area_sum
    }

    /// Calculates the polar moment of area about the local origin (density = 1).
    fn calculate_inertia_about_origin(&self) -> f64 {
        let n = self.vertices.len();
        let mut inertia_sum = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            let cross_prod = v1.cross(v2);
            let dot_prod = v1.dot(v2);
            inertia_sum += cross_prod * (v1.magnitude_squared() + dot_prod + v2.magnitude_squared());
        }
        inertia_sum / 12.0
    }

    /// Calculates the moment of inertia about the polygon's centroid.
    pub fn calculate_inertia(&self, density: f64) -> f64 {
        let md = self.compute_mass(density);
        (md.inertia - md.mass * md.center.magnitude_squared()).max(0.0)
    }

    /// Mass, centroid and inertia about the local origin for the given density.
    pub fn compute_mass(&self, density: f64) -> MassData {
        MassData {
            mass: self.calculate_area() * density,
            center: self.calculate_centroid(),
            inertia: self.calculate_inertia_about_origin() * density,
        }
    }

    /// Vertex furthest along `direction`, pushed out by the skin radius.
    pub fn support(&self, direction: Vec2) -> Vec2 {
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(direction);
        for &v in self.vertices.iter().skip(1) {
            let d = v.dot(direction);
            if d > best_dot {
                best = v;
                best_dot = d;
            }
        }
        if self.radius > 0.0 {
            best + direction.normalize_or(Vec2::RIGHT) * self.radius
        } else {
            best
        }
    }
}

fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    let mut area = 0.0;
    for i in 0..n {
        area += vertices[i].cross(vertices[(i + 1) % n]);
    }
    area / 2.0
}
