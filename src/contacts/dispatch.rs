//! Shape-pair dispatch: which narrow-phase function handles which pair of
//! shape types, and in which argument order.

use std::fmt;

use tracing::error;

use crate::collision::{
    collide_circles, collide_edge_and_circle, collide_edge_and_polygon, collide_polygon_and_circle,
    collide_polygons, Manifold,
};
use crate::common::{PhysicsError, Result};
use crate::math::Transform;
use crate::shapes::{Shape, ShapeType, SHAPE_TYPE_COUNT};

/// Signature shared by every contact handler. Shapes arrive in the handler's
/// primary order.
pub type CollideFn = fn(&Shape, &Transform, &Shape, &Transform) -> Manifold;

/// Closed set of contact variants, one per supported shape-type pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Circle,
    PolygonAndCircle,
    Polygon,
    EdgeAndCircle,
    EdgeAndPolygon,
}

/// A dispatch table entry.
#[derive(Clone, Copy)]
pub struct Handler {
    pub kind: ContactKind,
    pub collide: CollideFn,
    /// False when the looked-up order is the reverse of the handler's
    /// argument order, so the caller must swap the shapes.
    pub primary: bool,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind)
            .field("primary", &self.primary)
            .finish()
    }
}

/// Fixed table keyed by {circle, polygon, edge} x {circle, polygon, edge}.
///
/// Registering (A, B) fills both cells: `[A][B]` as primary and `[B][A]` as
/// the swapped entry, so (circle, polygon) and (polygon, circle) reach the
/// same handler. The table is a plain value handed to the registry when it
/// is built; there is no global registration.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    entries: [[Option<Handler>; SHAPE_TYPE_COUNT]; SHAPE_TYPE_COUNT],
}

impl DispatchTable {
    /// A table with no handlers.
    pub fn empty() -> Self {
        Self {
            entries: [[None; SHAPE_TYPE_COUNT]; SHAPE_TYPE_COUNT],
        }
    }

    /// The built-in handlers. Edge vs edge has none.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(ContactKind::Circle, circle_contact, ShapeType::Circle, ShapeType::Circle);
        table.register(
            ContactKind::PolygonAndCircle,
            polygon_and_circle_contact,
            ShapeType::Polygon,
            ShapeType::Circle,
        );
        table.register(ContactKind::Polygon, polygon_contact, ShapeType::Polygon, ShapeType::Polygon);
        table.register(
            ContactKind::EdgeAndCircle,
            edge_and_circle_contact,
            ShapeType::Edge,
            ShapeType::Circle,
        );
        table.register(
            ContactKind::EdgeAndPolygon,
            edge_and_polygon_contact,
            ShapeType::Edge,
            ShapeType::Polygon,
        );
        table
    }

    pub fn register(
        &mut self,
        kind: ContactKind,
        collide: CollideFn,
        type_a: ShapeType,
        type_b: ShapeType,
    ) {
        self.entries[type_a.index()][type_b.index()] = Some(Handler { kind, collide, primary: true });
        if type_a != type_b {
            self.entries[type_b.index()][type_a.index()] =
                Some(Handler { kind, collide, primary: false });
        }
    }

    pub fn lookup(&self, type_a: ShapeType, type_b: ShapeType) -> Result<Handler> {
        self.entries[type_a.index()][type_b.index()]
            .ok_or(PhysicsError::UnsupportedShapePair { a: type_a, b: type_b })
    }

    /// Collides two shapes in the given order, swapping into the handler's
    /// order and back as needed. The returned manifold always describes
    /// `shape_a` as A.
    pub fn collide(
        &self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
    ) -> Result<Manifold> {
        let handler = self.lookup(shape_a.shape_type(), shape_b.shape_type())?;
        if handler.primary {
            Ok((handler.collide)(shape_a, xf_a, shape_b, xf_b))
        } else {
            let mut manifold = (handler.collide)(shape_b, xf_b, shape_a, xf_a);
            manifold.swap_roles();
            Ok(manifold)
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn mismatched(shape_a: &Shape, shape_b: &Shape) -> Manifold {
    error!(
        a = ?shape_a.shape_type(),
        b = ?shape_b.shape_type(),
        "contact handler called with the wrong shape types"
    );
    debug_assert!(false, "contact handler called with the wrong shape types");
    Manifold::default()
}

fn circle_contact(a: &Shape, xf_a: &Transform, b: &Shape, xf_b: &Transform) -> Manifold {
    match (a, b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
        _ => mismatched(a, b),
    }
}

fn polygon_and_circle_contact(a: &Shape, xf_a: &Transform, b: &Shape, xf_b: &Transform) -> Manifold {
    match (a, b) {
        (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_and_circle(a, xf_a, b, xf_b),
        _ => mismatched(a, b),
    }
}

fn polygon_contact(a: &Shape, xf_a: &Transform, b: &Shape, xf_b: &Transform) -> Manifold {
    match (a, b) {
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
        _ => mismatched(a, b),
    }
}

fn edge_and_circle_contact(a: &Shape, xf_a: &Transform, b: &Shape, xf_b: &Transform) -> Manifold {
    match (a, b) {
        (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(a, xf_a, b, xf_b),
        _ => mismatched(a, b),
    }
}

fn edge_and_polygon_contact(a: &Shape, xf_a: &Transform, b: &Shape, xf_b: &Transform) -> Manifold {
    match (a, b) {
        (Shape::Edge(a), Shape::Polygon(b)) => collide_edge_and_polygon(a, xf_a, b, xf_b),
        _ => mismatched(a, b),
    }
}
