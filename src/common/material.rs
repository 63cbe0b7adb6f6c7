//! Defines physical material properties and how two materials combine at a contact.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents the physical properties of a collider affecting collisions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    /// 0 = perfectly inelastic (no bounce), 1 = perfectly elastic.
    pub restitution: f64,
    /// Coefficient of friction. Range [0, infinity).
    pub friction: f64,
    /// Mass per unit area, used when the owning body computes its mass.
    pub density: f64,
}

impl Material {
    /// Creates a new material with the given restitution and friction and unit density.
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
            density: 1.0,
        }
    }

    /// Returns a copy with the given density (negative values clamp to zero).
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density.max(0.0);
        self
    }
}

impl Default for Material {
    /// Default material properties (moderate restitution, moderate friction).
    fn default() -> Self {
        Material {
            restitution: 0.2,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// How the coefficients of two touching materials are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MixingRule {
    /// `sqrt(a * b)`: a zero-friction surface stays frictionless against anything.
    #[default]
    GeometricMean,
    Average,
    Min,
    Max,
    Multiply,
}

impl MixingRule {
    /// Combines two coefficients.
    pub fn mix(self, a: f64, b: f64) -> f64 {
        match self {
            MixingRule::GeometricMean => (a * b).max(0.0).sqrt(),
            MixingRule::Average => 0.5 * (a + b),
            MixingRule::Min => a.min(b),
            MixingRule::Max => a.max(b),
            MixingRule::Multiply => a * b,
        }
    }
}
