use crate::math::vec2::Vec2;

/// A two-sided line segment, used for static ground and walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub v1: Vec2,
    pub v2: Vec2,
}

impl Edge {
    pub fn new(v1: Vec2, v2: Vec2) -> Self {
        Self { v1, v2 }
    }

    /// Calculates the length of the edge.
    pub fn length(&self) -> f64 {
        self.v1.distance(self.v2)
    }

    /// Returns the direction vector of the edge (from v1 to v2).
    pub fn direction(&self) -> Vec2 {
        self.v2 - self.v1
    }

    /// Unit normal on the right of v1 -> v2, or `None` for a zero-length edge.
    pub fn normal(&self) -> Option<Vec2> {
        self.direction().cross_scalar(1.0).try_normalize()
    }

    pub fn support(&self, direction: Vec2) -> Vec2 {
        if self.v1.dot(direction) >= self.v2.dot(direction) {
            self.v1
        } else {
            self.v2
        }
    }
}
