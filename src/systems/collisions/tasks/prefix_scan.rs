use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::{
    compute_task::{ComputeGpuTask, ComputeTaskConstants},
    PREFIX_SCAN_ITEMS_PER_WORK_GROUP, WORK_GROUP_SIZE,
};

/// Stage 1: per-work-group exclusive scan of the current sort bit, two
/// items per thread, group totals into the work group sums.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct PrefixScanStage1Constants {
    entity_count: u32,
    read_offset: u32,
    bit_number: u32,
}

impl PrefixScanStage1Constants {
    pub fn new(entity_count: u32, read_offset: u32, bit_number: u32) -> Self {
        Self {
            entity_count,
            read_offset,
            bit_number,
        }
    }
}

impl ComputeTaskConstants for PrefixScanStage1Constants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/prefix_scan_stage1.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load prefix_scan_stage1 kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        // one work group per 512 scan items, one thread per 2 items
        self.entity_count.div_ceil(PREFIX_SCAN_ITEMS_PER_WORK_GROUP) * WORK_GROUP_SIZE
    }
}

pub(crate) type PrefixScanStage1Task = ComputeGpuTask<PrefixScanStage1Constants>;

/// Stage 2: a single work group scans the per-group totals and records the
/// grand total of one-bits.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct PrefixScanStage2Constants {
    num_work_group_sums: u32,
}

impl PrefixScanStage2Constants {
    pub fn new(num_work_group_sums: u32) -> Self {
        Self {
            num_work_group_sums,
        }
    }
}

impl ComputeTaskConstants for PrefixScanStage2Constants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/prefix_scan_stage2.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load prefix_scan_stage2 kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        WORK_GROUP_SIZE
    }
}

pub(crate) type PrefixScanStage2Task = ComputeGpuTask<PrefixScanStage2Constants>;

/// Stage 3: folds the scanned group offsets back into the per-item
/// prefixes, producing one global exclusive scan.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct PrefixScanStage3Constants {
    total_scan_items: u32,
}

impl PrefixScanStage3Constants {
    pub fn new(total_scan_items: u32) -> Self {
        Self { total_scan_items }
    }
}

impl ComputeTaskConstants for PrefixScanStage3Constants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/prefix_scan_stage3.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load prefix_scan_stage3 kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.total_scan_items
    }
}

pub(crate) type PrefixScanStage3Task = ComputeGpuTask<PrefixScanStage3Constants>;

#[cfg(test)]
mod tests {
    use vulkano::{
        buffer::{Buffer, BufferCreateInfo, BufferUsage},
        command_buffer::BufferCopy,
        descriptor_set::WriteDescriptorSet,
        memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
    };

    use super::*;
    use crate::core::SortingRecord;
    use crate::systems::collisions::CollisionScratchBuffers;
    use crate::utils::{
        download_buffer, BufferCopyTask, GpuTaskExecutor, VulkanoHeadlessBackend,
    };

    #[test]
    fn test_three_stage_scan_is_an_exclusive_scan_of_the_bit() {
        let backend = VulkanoHeadlessBackend::new().unwrap();

        // 700 records spans two scan work groups; key = index makes bit 1
        // follow the pattern 0 0 1 1 0 0 1 1 ...
        let entity_count = 700u32;
        let scratch = CollisionScratchBuffers::new(&backend, entity_count, 1).unwrap();

        let records: Vec<SortingRecord> = (0..entity_count)
            .map(|i| SortingRecord {
                sorting_data: i,
                pre_sorted_index: i as i32,
            })
            .collect();
        let staging = Buffer::from_iter(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            records.iter().copied(),
        )
        .unwrap();
        let mut upload = BufferCopyTask::new(
            staging,
            scratch.sorting_data.clone(),
            vec![BufferCopy {
                src_offset: 0,
                dst_offset: 0,
                size: entity_count as u64,
                ..Default::default()
            }],
        );
        backend.execute(&mut upload);

        let bit_number = 1u32;
        let mut stage1 = PrefixScanStage1Task::new(
            backend.device(),
            backend.descriptor_set_allocator(),
            [
                WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
                WriteDescriptorSet::buffer(1, scratch.prefix_scan.clone()),
            ],
        )
        .unwrap();
        stage1.set_constants(PrefixScanStage1Constants::new(entity_count, 0, bit_number));
        backend.execute(&mut stage1);

        let num_groups = entity_count.div_ceil(PREFIX_SCAN_ITEMS_PER_WORK_GROUP);
        let mut stage2 = PrefixScanStage2Task::new(
            backend.device(),
            backend.descriptor_set_allocator(),
            [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
        )
        .unwrap();
        stage2.set_constants(PrefixScanStage2Constants::new(num_groups));
        backend.execute(&mut stage2);

        let padded = super::super::padded_scan_item_count(entity_count);
        let mut stage3 = PrefixScanStage3Task::new(
            backend.device(),
            backend.descriptor_set_allocator(),
            [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
        )
        .unwrap();
        stage3.set_constants(PrefixScanStage3Constants::new(padded));
        backend.execute(&mut stage3);

        let scan_buffer: Vec<u32> = download_buffer(
            &backend,
            &scratch.prefix_scan,
            0,
            super::super::PREFIX_SCAN_HEADER_SLOTS + padded as u64,
        )
        .unwrap();
        let total_ones = scan_buffer[0];
        let prefixes = &scan_buffer[super::super::PREFIX_SCAN_HEADER_SLOTS as usize..];

        // exclusive scan: starts at zero, steps by the scanned bit
        assert_eq!(prefixes[0], 0);
        let mut expected = 0u32;
        for i in 0..entity_count as usize {
            assert_eq!(prefixes[i], expected, "prefix mismatch at {}", i);
            expected += (records[i].sorting_data >> bit_number) & 1;
        }
        assert_eq!(total_ones, expected);
    }
}
