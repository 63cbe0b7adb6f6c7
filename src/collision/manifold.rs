//! Contact manifolds: the narrow-phase output that persists on a contact
//! between steps, plus its world-space resolution.

use tracing::{debug, error};

use crate::common::MAX_MANIFOLD_POINTS;
use crate::math::{Transform, Vec2};

/// Which kind of feature a contact point was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureType {
    #[default]
    Vertex = 0,
    Face = 1,
}

/// Persistent identity of a contact point: the pair of features (one on each
/// shape) that produced it. The same feature pair yields the same id on every
/// step, which is what lets accumulated impulses survive re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContactId {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: FeatureType,
    pub type_b: FeatureType,
}

impl ContactId {
    pub fn new(index_a: u8, type_a: FeatureType, index_b: u8, type_b: FeatureType) -> Self {
        Self { index_a, index_b, type_a, type_b }
    }

    /// Packs the id into a single comparable key.
    pub fn key(&self) -> u32 {
        u32::from(self.index_a)
            | u32::from(self.index_b) << 8
            | (self.type_a as u32) << 16
            | (self.type_b as u32) << 24
    }

    /// The same id seen from the other shape's side.
    pub fn swapped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// How the local data of a manifold is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldKind {
    /// `local_point` is circle A's center; each point holds circle B's center.
    #[default]
    Circles,
    /// Reference face on shape A: `local_normal`/`local_point` in A's frame,
    /// point `local_point`s are clip points in B's frame.
    FaceA,
    /// Reference face on shape B, mirrored.
    FaceB,
}

/// A contact point in local form, with the impulses accumulated for it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifoldPoint {
    pub local_point: Vec2,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
    pub id: ContactId,
}

impl ManifoldPoint {
    pub fn new(local_point: Vec2, id: ContactId) -> Self {
        Self { local_point, id, ..Default::default() }
    }
}

/// Up to `MAX_MANIFOLD_POINTS` contact points sharing one normal.
/// `point_count == 0` means the shapes are not touching.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Manifold {
    pub kind: ManifoldKind,
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl Manifold {
    pub fn new(kind: ManifoldKind, local_normal: Vec2, local_point: Vec2) -> Self {
        Self { kind, local_normal, local_point, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// The active points.
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.point_count.min(MAX_MANIFOLD_POINTS)]
    }

    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        let count = self.point_count.min(MAX_MANIFOLD_POINTS);
        &mut self.points[..count]
    }

    /// Appends a point. Overflowing the fixed capacity is an invariant
    /// violation: it asserts in debug builds and drops the point otherwise.
    pub fn push_point(&mut self, point: ManifoldPoint) -> bool {
        if self.point_count >= MAX_MANIFOLD_POINTS {
            debug_assert!(false, "manifold point count exceeds {}", MAX_MANIFOLD_POINTS);
            error!(count = self.point_count, "manifold overflow; dropping contact point");
            return false;
        }
        self.points[self.point_count] = point;
        self.point_count += 1;
        true
    }

    pub fn find_point(&self, id: ContactId) -> Option<&ManifoldPoint> {
        let key = id.key();
        self.points().iter().find(|p| p.id.key() == key)
    }

    /// Copies accumulated impulses from `old` into points with matching ids.
    /// Points with no match keep zero impulses. Returns how many matched.
    pub fn carry_impulses_from(&mut self, old: &Manifold) -> usize {
        let mut matched = 0;
        for point in self.points_mut() {
            point.normal_impulse = 0.0;
            point.tangent_impulse = 0.0;
            if let Some(previous) = old.find_point(point.id) {
                point.normal_impulse = previous.normal_impulse;
                point.tangent_impulse = previous.tangent_impulse;
                matched += 1;
            }
        }
        matched
    }

    pub fn clear_impulses(&mut self) {
        for point in self.points_mut() {
            point.normal_impulse = 0.0;
            point.tangent_impulse = 0.0;
        }
    }

    /// Exchanges the roles of shape A and shape B, so a manifold computed
    /// for (B, A) describes (A, B).
    pub(crate) fn swap_roles(&mut self) {
        match self.kind {
            ManifoldKind::Circles => {
                if self.point_count > 0 {
                    std::mem::swap(&mut self.local_point, &mut self.points[0].local_point);
                }
            }
            ManifoldKind::FaceA => self.kind = ManifoldKind::FaceB,
            ManifoldKind::FaceB => self.kind = ManifoldKind::FaceA,
        }
        for point in self.points_mut() {
            point.id = point.id.swapped();
        }
    }
}

/// A manifold resolved into world space for the current transforms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldManifold {
    /// Unit normal pointing from shape A to shape B.
    pub normal: Vec2,
    /// Contact points, midway between the two surfaces.
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Signed distance between the surfaces; negative when penetrating.
    pub separations: [f64; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl WorldManifold {
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f64,
        xf_b: &Transform,
        radius_b: f64,
    ) -> Self {
        let mut world = WorldManifold {
            point_count: manifold.point_count.min(MAX_MANIFOLD_POINTS),
            ..Default::default()
        };
        if world.point_count == 0 {
            return world;
        }

        match manifold.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                world.normal = match (point_b - point_a).try_normalize() {
                    Some(n) => n,
                    None => {
                        debug!(?point_a, "coincident circle centers; using canonical normal");
                        Vec2::RIGHT
                    }
                };
                let c_a = point_a + world.normal * radius_a;
                let c_b = point_b - world.normal * radius_b;
                world.points[0] = (c_a + c_b) * 0.5;
                world.separations[0] = (c_b - c_a).dot(world.normal);
            }
            ManifoldKind::FaceA => {
                world.normal = xf_a.rotate(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for i in 0..world.point_count {
                    let clip_point = xf_b.apply(manifold.points[i].local_point);
                    let depth = radius_a - (clip_point - plane_point).dot(world.normal);
                    let c_a = clip_point + world.normal * depth;
                    let c_b = clip_point - world.normal * radius_b;
                    world.points[i] = (c_a + c_b) * 0.5;
                    world.separations[i] = (c_b - c_a).dot(world.normal);
                }
            }
            ManifoldKind::FaceB => {
                let normal_b = xf_b.rotate(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for i in 0..world.point_count {
                    let clip_point = xf_a.apply(manifold.points[i].local_point);
                    let depth = radius_b - (clip_point - plane_point).dot(normal_b);
                    let c_b = clip_point + normal_b * depth;
                    let c_a = clip_point - normal_b * radius_a;
                    world.points[i] = (c_a + c_b) * 0.5;
                    world.separations[i] = (c_a - c_b).dot(normal_b);
                }
                // Report the normal from A to B.
                world.normal = -normal_b;
            }
        }
        world
    }

    /// True when the normal, points and separations are all finite.
    pub fn is_finite(&self) -> bool {
        self.normal.is_finite()
            && self.points[..self.point_count].iter().all(|p| p.is_finite())
            && self.separations[..self.point_count].iter().all(|s| s.is_finite())
    }
}
