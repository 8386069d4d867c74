use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Patches the sorted keys so no two are equal before tree construction;
/// see guarantee_uniqueness.comp for why key += index is safe.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GuaranteeUniquenessConstants {
    entity_count: u32,
    read_offset: u32,
}

impl GuaranteeUniquenessConstants {
    pub fn new(entity_count: u32, read_offset: u32) -> Self {
        Self {
            entity_count,
            read_offset,
        }
    }
}

impl ComputeTaskConstants for GuaranteeUniquenessConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/guarantee_uniqueness.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load guarantee_uniqueness kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.entity_count
    }
}

pub(crate) type GuaranteeUniquenessTask = ComputeGpuTask<GuaranteeUniquenessConstants>;
