use std::f64::consts::PI;

use super::MassData;
use crate::math::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: f64,
    /// Offset of the circle center from the body origin.
    pub center: Vec2,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        assert!(radius >= 0.0, "Circle radius cannot be negative");
        Self { radius, center: Vec2::ZERO }
    }

    /// Circle whose center sits at `center` in body-local coordinates.
    pub fn with_center(radius: f64, center: Vec2) -> Self {
        Self { center, ..Self::new(radius) }
    }

    pub fn support(&self, direction: Vec2) -> Vec2 {
        self.center + direction.normalize_or(Vec2::RIGHT) * self.radius
    }

    pub fn compute_mass(&self, density: f64) -> MassData {
        let mass = density * PI * self.radius * self.radius;
        MassData {
            mass,
            center: self.center,
            // Disc inertia about its center, shifted to the shape origin.
            inertia: mass * (0.5 * self.radius * self.radius + self.center.magnitude_squared()),
        }
    }
}
