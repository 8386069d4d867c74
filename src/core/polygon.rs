use glam::Vec2;
use vulkano::buffer::BufferContents;

/// A 2D line segment with an outward surface normal at each endpoint.  The
/// collidable geometry is a flat list of these; they never move after load.
/// Matches the `PolygonFace` struct in the compute shaders (64 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct PolygonFace {
    pub p1: [f32; 4],
    pub n1: [f32; 4],
    pub p2: [f32; 4],
    pub n2: [f32; 4],
}

impl PolygonFace {
    pub fn new(p1: Vec2, n1: Vec2, p2: Vec2, n2: Vec2) -> Self {
        Self {
            p1: [p1.x, p1.y, 0.0, 1.0],
            n1: [n1.x, n1.y, 0.0, 0.0],
            p2: [p2.x, p2.y, 0.0, 1.0],
            n2: [n2.x, n2.y, 0.0, 0.0],
        }
    }

    pub fn p1(&self) -> Vec2 {
        Vec2::new(self.p1[0], self.p1[1])
    }

    pub fn p2(&self) -> Vec2 {
        Vec2::new(self.p2[0], self.p2[1])
    }

    pub fn n1(&self) -> Vec2 {
        Vec2::new(self.n1[0], self.n1[1])
    }

    pub fn n2(&self) -> Vec2 {
        Vec2::new(self.n2[0], self.n2[1])
    }

    pub fn centroid(&self) -> Vec2 {
        (self.p1() + self.p2()) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_face_stride_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<PolygonFace>(), 64);
    }

    #[test]
    fn test_centroid_is_segment_midpoint() {
        let face = PolygonFace::new(
            Vec2::new(0.0, -1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        );
        assert_eq!(face.centroid(), Vec2::new(0.0, 0.0));
    }
}
