// Defines an Axis-Aligned Bounding Box

use crate::math::vec2::Vec2;

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec2,
    pub max: Vec2,
}

impl AABB {
    /// Creates a new AABB.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        // Ensure min coordinates are <= max coordinates
        AABB {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Checks if this AABB overlaps with another AABB. Touching boxes overlap.
    pub fn overlaps(&self, other: &AABB) -> bool {
        let x_overlap = self.max.x >= other.min.x && self.min.x <= other.max.x;
        let y_overlap = self.max.y >= other.min.y && self.min.y <= other.max.y;
        x_overlap && y_overlap
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns a copy grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> AABB {
        let m = Vec2::new(margin, margin);
        AABB { min: self.min - m, max: self.max + m }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Merges another AABB into this one, expanding this AABB to contain both.
    pub fn merge(&mut self, other: &AABB) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Creates an AABB that encompasses a set of points.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = AABB { min: *first, max: *first };
        for point in rest {
            aabb.min = aabb.min.min(*point);
            aabb.max = aabb.max.max(*point);
        }
        Some(aabb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_new_orders_corners() {
        let aabb = AABB::new(Vec2::new(2.0, -1.0), Vec2::new(0.0, 3.0));
        assert_eq!(aabb.min, Vec2::new(0.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_aabb_overlaps() {
        let a = AABB::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let b = AABB::new(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0));
        let c = AABB::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let d = AABB::new(Vec2::new(1.5, 1.5), Vec2::new(2.0, 2.0));
        assert!(a.overlaps(&b));
        assert!(a.overlaps(&c)); // shared edge
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_aabb_contains_and_expanded() {
        let tight = AABB::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let fat = tight.expanded(0.1);
        assert!(fat.contains(&tight));
        assert!(!tight.contains(&fat));
        assert_eq!(fat.center(), tight.center());
    }

    #[test]
    fn test_aabb_merge_and_from_points() {
        let mut a = AABB::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        a.merge(&AABB::new(Vec2::new(-1.0, 0.5), Vec2::new(0.5, 3.0)));
        assert_eq!(a.min, Vec2::new(-1.0, 0.0));
        assert_eq!(a.max, Vec2::new(1.0, 3.0));

        assert!(AABB::from_points(&[]).is_none());
        let b = AABB::from_points(&[Vec2::new(1.0, 5.0), Vec2::new(-2.0, 0.0)]).unwrap();
        assert_eq!(b.min, Vec2::new(-2.0, 0.0));
        assert_eq!(b.max, Vec2::new(1.0, 5.0));
    }
}
