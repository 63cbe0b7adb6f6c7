use super::vec2::Vec2;

/// Rigid transform of a body origin: rotation about the origin, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f64, // Angle in radians
}

impl Transform {
    /// Creates a new transform.
    pub fn new(position: Vec2, rotation: f64) -> Self {
        Self { position, rotation }
    }

    /// Creates an identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self {
            position: Vec2::new(0.0, 0.0),
            rotation: 0.0,
        }
    }

    /// Builds the body-origin transform from a world center of mass, the
    /// body angle and the center of mass expressed in body-local coordinates.
    pub fn from_center(world_center: Vec2, rotation: f64, local_center: Vec2) -> Self {
        Self {
            position: world_center - local_center.rotate(rotation),
            rotation,
        }
    }

    /// Rotates a direction by this transform's angle (no translation).
    pub fn rotate(self, v: Vec2) -> Vec2 {
        v.rotate(self.rotation)
    }

    /// Rotates a direction by the inverse of this transform's angle.
    pub fn inverse_rotate(self, v: Vec2) -> Vec2 {
        v.rotate(-self.rotation)
    }

    /// Applies the transform (rotation then translation) to a point.
    pub fn apply(self, point: Vec2) -> Vec2 {
        let cos_a = self.rotation.cos();
        let sin_a = self.rotation.sin();
        let rotated_x = point.x * cos_a - point.y * sin_a;
        let rotated_y = point.x * sin_a + point.y * cos_a;
        Vec2::new(rotated_x, rotated_y) + self.position
    }

    /// Applies the inverse transform (inverse translation then inverse rotation) to a point.
    pub fn apply_inverse(self, point: Vec2) -> Vec2 {
        let translated_point = point - self.position;
        // cos(-a) = cos(a), sin(-a) = -sin(a)
        let cos_a = self.rotation.cos();
        let sin_a = self.rotation.sin();
        let rotated_x = translated_point.x * cos_a + translated_point.y * sin_a;
        let rotated_y = -translated_point.x * sin_a + translated_point.y * cos_a;
        Vec2::new(rotated_x, rotated_y)
    }

    /// Returns the transform that maps `other`'s local frame into this
    /// transform's local frame (`self^-1 * other`).
    pub fn inverse_mul(self, other: Transform) -> Transform {
        Transform {
            position: self.apply_inverse(other.position),
            rotation: other.rotation - self.rotation,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
