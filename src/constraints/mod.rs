//! Contact constraints: the sequential impulse solver and the island
//! partitioning that feeds it.

pub mod contact_solver;
pub mod island;

pub use contact_solver::{ContactImpulse, ContactSolver, SolverBody};
pub use island::{build_islands, solve_island, solve_islands, Island, IslandSolution};

use crate::common::SolverSettings;
use crate::math::vec2::Vec2;

/// Everything the solver needs to know about the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    pub dt: f64,
    pub inv_dt: f64,
    /// `dt` of this step over `dt` of the previous one, scales warm starting.
    pub dt_ratio: f64,
    pub gravity: Vec2,
    pub settings: SolverSettings,
}

impl TimeStep {
    pub fn new(dt: f64, previous_dt: f64, gravity: Vec2, settings: SolverSettings) -> Self {
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        let dt_ratio = if previous_dt > 0.0 { dt / previous_dt } else { 1.0 };
        Self { dt, inv_dt, dt_ratio, gravity, settings }
    }
}

/// Island-local position state: center of mass and angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub c: Vec2,
    pub a: f64,
}

/// Island-local velocity state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub v: Vec2,
    pub w: f64,
}

/// Mutable references to two distinct elements of a slice, or `None` when
/// the indices coincide or are out of bounds.
pub(crate) fn get_mutable_pair<T>(items: &mut [T], idx_a: usize, idx_b: usize) -> Option<(&mut T, &mut T)> {
    if idx_a == idx_b || idx_a >= items.len() || idx_b >= items.len() {
        return None;
    }

    // Ensure a < b for split_at_mut
    if idx_a < idx_b {
        let (slice_a, slice_b) = items.split_at_mut(idx_b);
        Some((&mut slice_a[idx_a], &mut slice_b[0]))
    } else {
        let (slice_b, slice_a) = items.split_at_mut(idx_a);
        Some((&mut slice_a[0], &mut slice_b[idx_b]))
    }
}
