use glam::Vec2;

/// Axis-aligned 2D bounding box, the host-side mirror of the boxes stored in
/// BVH nodes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Box2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Box2D {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// A box that contains nothing and is the identity element of `union`.
    pub fn empty() -> Self {
        Self {
            min: Vec2::splat(f32::MAX),
            max: Vec2::splat(f32::MIN),
        }
    }

    pub fn around_point(center: Vec2, half_extent: f32) -> Self {
        Self {
            min: center - Vec2::splat(half_extent),
            max: center + Vec2::splat(half_extent),
        }
    }

    pub fn from_segment(p1: Vec2, p2: Vec2) -> Self {
        Self {
            min: p1.min(p2),
            max: p1.max(p2),
        }
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Box2D::new(Vec2::new(-1.0, -1.0), Vec2::new(0.5, 0.5));
        let b = Box2D::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let c = Box2D::new(Vec2::new(0.6, 0.6), Vec2::new(1.0, 1.0));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_overlap() {
        let a = Box2D::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let b = Box2D::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_union_covers_both() {
        let a = Box2D::around_point(Vec2::new(-0.5, 0.0), 0.1);
        let b = Box2D::around_point(Vec2::new(0.5, 0.0), 0.1);
        let u = a.union(&b);
        assert!(u.contains(Vec2::new(-0.6, 0.0)));
        assert!(u.contains(Vec2::new(0.6, 0.0)));
        assert_eq!(u, Box2D::empty().union(&a).union(&b));
    }

    #[test]
    fn test_segment_box_is_ordered() {
        let b = Box2D::from_segment(Vec2::new(0.5, -1.0), Vec2::new(-0.5, 1.0));
        assert_eq!(b.min, Vec2::new(-0.5, -1.0));
        assert_eq!(b.max, Vec2::new(0.5, 1.0));
    }
}
