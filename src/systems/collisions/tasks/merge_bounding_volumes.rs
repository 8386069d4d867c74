use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Merges the leaf boxes upward through the tree; the atomic visit counter
/// in each node guarantees exactly one write per internal node.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct MergeBoundingVolumesConstants {
    num_leaves: u32,
}

impl MergeBoundingVolumesConstants {
    pub fn new(num_leaves: u32) -> Self {
        Self { num_leaves }
    }
}

impl ComputeTaskConstants for MergeBoundingVolumesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/merge_bounding_volumes.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load merge_bounding_volumes kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        // one upward-walking thread per leaf
        self.num_leaves
    }
}

pub(crate) type MergeBoundingVolumesTask = ComputeGpuTask<MergeBoundingVolumesConstants>;
