//! Axis-aligned bounding boxes.

use glam::Vec3;

/// An axis-aligned bounding box, stored as its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a box from explicit corners.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Computes the tightest box around a set of points.
    ///
    /// Returns `None` when the iterator is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the side lengths of the box.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f32 {
        self.extent().length()
    }

    /// Returns the smallest box containing both `self` and `other`.
    ///
    /// Used to frame an upper and a lower cast together.
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Returns whether `point` lies inside the box (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_from_points() {
        let bb = BoundingBox::from_points([
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.5, 0.0, 5.0),
        ])
        .unwrap();
        assert_eq!(bb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bb.max, Vec3::new(1.0, 4.0, 5.0));
        assert_eq!(bb.center(), Vec3::new(0.0, 1.0, 2.5));
        assert_eq!(bb.extent(), Vec3::new(2.0, 6.0, 5.0));
    }

    #[test]
    fn test_union_matches_combined_extents() {
        let upper = BoundingBox::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(5.0, 5.0, 15.0));
        let lower = BoundingBox::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(4.0, 6.0, 8.0));
        let both = upper.union(&lower);
        assert_eq!(both.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(both.max, Vec3::new(5.0, 6.0, 15.0));
        assert_eq!(both, lower.union(&upper));
    }

    #[test]
    fn test_corners_are_contained() {
        let bb = BoundingBox::new(Vec3::splat(-1.0), Vec3::new(2.0, 3.0, 4.0));
        let corners = bb.corners();
        assert!(corners.iter().all(|&c| bb.contains(c)));
        assert_eq!(BoundingBox::from_points(corners).unwrap(), bb);
    }

    #[test]
    fn test_diagonal() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0));
        assert!((bb.diagonal() - 5.0).abs() < 1e-6);
    }
}
