use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Builds the internal nodes of the binary radix tree in one parallel pass
/// over the sorted, de-duplicated keys.  Only meaningful for two or more
/// leaves; callers skip the dispatch otherwise.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GenerateBinaryRadixTreeConstants {
    num_leaves: u32,
    read_offset: u32,
}

impl GenerateBinaryRadixTreeConstants {
    pub fn new(num_leaves: u32, read_offset: u32) -> Self {
        Self {
            num_leaves,
            read_offset,
        }
    }
}

impl ComputeTaskConstants for GenerateBinaryRadixTreeConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/generate_binary_radix_tree.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load generate_binary_radix_tree kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        // one thread per internal node
        self.num_leaves - 1
    }
}

pub(crate) type GenerateBinaryRadixTreeTask = ComputeGpuTask<GenerateBinaryRadixTreeConstants>;
