use glam::Vec2;
use vulkano::buffer::BufferContents;

use super::Box2D;

/// Cap on the candidate list a single entity can accumulate during BVH
/// traversal.  Overflowing candidates are dropped and counted in the frame
/// diagnostics.  Must match `MAX_NUM_POTENTIAL_COLLISIONS` in the shaders.
pub const MAX_POTENTIAL_COLLISIONS: usize = 10;

/// Sorting key handed to inactive entities.  The top two bits are set so
/// that, under unsigned ordering, inactive entries always sort behind every
/// 30-bit Morton code.  Sorting therefore runs over all 32 bits.
pub const INACTIVE_SORTING_KEY: u32 = 0xC000_0000;

/// Marker for "no parent" / "no child" in the BVH node arena.
pub const NO_NODE_INDEX: i32 = -1;

/// One entry of the radix-sort working buffer: the key being sorted and the
/// index of the entity it was generated from, so that the reorder pass can
/// fish the unsorted entity out of the copy buffer.  The buffer holds 2N of
/// these; the per-bit passes ping-pong between the two halves.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, BufferContents)]
pub struct SortingRecord {
    pub sorting_data: u32,
    pub pre_sorted_index: i32,
}

/// One node of a bounding volume hierarchy, stored in an index-addressed
/// arena of 2L-1 nodes: leaves at [0, L), internal nodes at [L, 2L-1), the
/// root at index L.  `visit_counter` is only used during the upward
/// bounding-box merge.  Matches the shader-side `BvhNode` (64 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, BufferContents)]
pub struct BvhNode {
    pub is_leaf: u32,
    pub visit_counter: u32,
    pub parent_index: i32,
    pub left_child_index: i32,
    pub right_child_index: i32,
    pub data_index: i32,
    _padding0: u32,
    _padding1: u32,
    pub box_min: [f32; 4],
    pub box_max: [f32; 4],
}

impl BvhNode {
    pub fn bounding_box(&self) -> Box2D {
        Box2D::new(
            Vec2::new(self.box_min[0], self.box_min[1]),
            Vec2::new(self.box_max[0], self.box_max[1]),
        )
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf != 0
    }
}

/// Per-entity candidate list filled by a detection kernel and drained (and
/// zeroed) by the matching resolution kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct PotentialCollisions {
    pub count: i32,
    pub object_indexes: [i32; MAX_POTENTIAL_COLLISIONS],
    _padding: i32,
}

impl Default for PotentialCollisions {
    fn default() -> Self {
        Self {
            count: 0,
            object_indexes: [NO_NODE_INDEX; MAX_POTENTIAL_COLLISIONS],
            _padding: 0,
        }
    }
}

/// Counters for the per-frame anomalies that are clamped instead of
/// propagated.  Lives in a small host-visible buffer that the collision
/// kernels bump atomically; never resets a frame, readable at any time.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, BufferContents)]
pub struct FrameDiagnostics {
    pub dropped_pair_candidates: u32,
    pub zeroed_velocities: u32,
    pub degenerate_polygons: u32,
    _padding: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_struct_strides_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<SortingRecord>(), 8);
        assert_eq!(std::mem::size_of::<BvhNode>(), 64);
        assert_eq!(std::mem::size_of::<PotentialCollisions>(), 48);
        assert_eq!(std::mem::size_of::<FrameDiagnostics>(), 16);
    }

    #[test]
    fn test_inactive_key_sorts_behind_any_morton_code() {
        let largest_morton = (1u32 << 30) - 1;
        assert!(INACTIVE_SORTING_KEY > largest_morton);
    }
}
