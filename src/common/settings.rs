//! Tunable world and solver settings. All fields are public and every
//! struct has a `Default`, so callers tweak only what they need.

use std::f64::consts::FRAC_PI_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::material::MixingRule;
use super::LINEAR_SLOP;
use crate::math::vec2::Vec2;

/// Parameters of the sequential impulse contact solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverSettings {
    /// Sequential impulse passes over all velocity constraints.
    pub velocity_iterations: usize,
    /// Non-linear Gauss-Seidel passes over all position constraints.
    pub position_iterations: usize,
    /// Seed impulses from the previous step for matching contact ids.
    pub warm_starting: bool,
    /// Scale applied to carried-over impulses when warm starting.
    pub warm_start_factor: f64,
    /// Fraction of the position error removed per position iteration.
    pub baumgarte: f64,
    /// Penetration allowed before position correction kicks in.
    pub linear_slop: f64,
    /// Largest position correction applied to one contact point per iteration.
    pub max_linear_correction: f64,
    /// Approach speed below which collisions are treated as inelastic.
    pub restitution_threshold: f64,
    /// Largest distance a body may travel in a single step.
    pub max_translation: f64,
    /// Largest angle a body may turn in a single step.
    pub max_rotation: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            warm_start_factor: 1.0,
            baumgarte: 0.2,
            linear_slop: LINEAR_SLOP,
            max_linear_correction: 0.2,
            restitution_threshold: 1.0,
            max_translation: 2.0,
            max_rotation: FRAC_PI_2,
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSettings {
    pub gravity: Vec2,
    pub solver: SolverSettings,
    /// Fattening applied to collider AABBs in the broad phase.
    pub aabb_margin: f64,
    /// Cell size of the broad-phase grid.
    pub grid_cell_size: f64,
    pub friction_mixing: MixingRule,
    pub restitution_mixing: MixingRule,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            solver: SolverSettings::default(),
            aabb_margin: 0.1,
            grid_cell_size: 4.0,
            friction_mixing: MixingRule::GeometricMean,
            restitution_mixing: MixingRule::Max,
        }
    }
}
