//! Colliders attach a shape and its surface properties to a body.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::rigid_body::BodyHandle;
use crate::collision::AABB;
use crate::common::Material;
use crate::math::Transform;
use crate::shapes::{Shape, ShapeType};

/// Stable index of a collider inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle(pub usize);

/// Category/mask/group collision filtering.
///
/// Two colliders in the same non-zero group always collide (positive group)
/// or never collide (negative group). Otherwise each one's mask must accept
/// the other's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Filter {
    pub category_bits: u16,
    pub mask_bits: u16,
    pub group_index: i16,
}

impl Filter {
    pub fn should_collide(&self, other: &Filter) -> bool {
        if self.group_index == other.group_index && self.group_index != 0 {
            return self.group_index > 0;
        }
        (self.mask_bits & other.category_bits) != 0 && (self.category_bits & other.mask_bits) != 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

/// A shape attached to a body. The geometry is fixed once attached. Change
/// the material or filter of an attached collider through
/// [`PhysicsWorld::set_collider_material`] and
/// [`PhysicsWorld::set_collider_filter`], which keep the owning body's mass
/// and the existing contacts in sync.
///
/// [`PhysicsWorld::set_collider_material`]: crate::world::PhysicsWorld::set_collider_material
/// [`PhysicsWorld::set_collider_filter`]: crate::world::PhysicsWorld::set_collider_filter
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    pub material: Material,
    pub filter: Filter,
    /// Sensors report overlap but never generate a collision response.
    pub is_sensor: bool,
    pub(crate) body: Option<BodyHandle>,
}

impl Collider {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            material: Material::default(),
            filter: Filter::default(),
            is_sensor: false,
            body: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    /// The body this collider is attached to, once added to a world.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    /// World bounds of the shape for the owning body's transform.
    pub fn compute_aabb(&self, body_transform: &Transform) -> AABB {
        self.shape.compute_aabb(body_transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Circle;

    #[test]
    fn test_default_filters_collide() {
        assert!(Filter::default().should_collide(&Filter::default()));
    }

    #[test]
    fn test_filter_groups_override_masks() {
        let positive = Filter { group_index: 3, mask_bits: 0, ..Filter::default() };
        assert!(positive.should_collide(&positive));

        let negative = Filter { group_index: -2, ..Filter::default() };
        assert!(!negative.should_collide(&negative));
    }

    #[test]
    fn test_filter_masks() {
        let player = Filter { category_bits: 0x0002, mask_bits: 0x0001, group_index: 0 };
        let ghost = Filter { category_bits: 0x0004, mask_bits: 0xFFFF, group_index: 0 };
        let wall = Filter::default();
        assert!(player.should_collide(&wall));
        // The player's mask rejects ghosts even though ghosts accept everything.
        assert!(!player.should_collide(&ghost));
        assert!(!ghost.should_collide(&player));
    }

    #[test]
    fn test_collider_builder() {
        let collider = Collider::new(Shape::Circle(Circle::new(1.0)))
            .with_material(Material::new(0.0, 0.9))
            .sensor(true);
        assert!(collider.is_sensor);
        assert_eq!(collider.material.friction, 0.9);
        assert_eq!(collider.body(), None);
        assert_eq!(collider.shape_type(), ShapeType::Circle);
    }
}
