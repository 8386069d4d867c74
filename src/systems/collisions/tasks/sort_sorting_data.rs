use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// The scatter half of one radix sort pass: records move from the read
/// half of the sorting buffer to their stable destinations in the write
/// half, zeros first.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct SortSortingDataConstants {
    entity_count: u32,
    read_offset: u32,
    write_offset: u32,
    bit_number: u32,
}

impl SortSortingDataConstants {
    pub fn new(entity_count: u32, read_offset: u32, write_offset: u32, bit_number: u32) -> Self {
        Self {
            entity_count,
            read_offset,
            write_offset,
            bit_number,
        }
    }
}

impl ComputeTaskConstants for SortSortingDataConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/sort_sorting_data.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load sort_sorting_data kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.entity_count
    }
}

pub(crate) type SortSortingDataTask = ComputeGpuTask<SortSortingDataConstants>;
