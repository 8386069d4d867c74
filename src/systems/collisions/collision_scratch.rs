use anyhow::{Context, Result};
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
};

use crate::core::{BvhNode, PotentialCollisions, SortingRecord};
use crate::utils::VulkanoHeadlessBackend;

use super::tasks::{padded_scan_item_count, PREFIX_SCAN_HEADER_SLOTS};

/// The working buffers one collision pipeline needs: sorting records (2x the
/// entity count for the radix ping-pong), the prefix scan buffer (header +
/// group sums + padded per-item area), the BVH node arena (2L-1 slots), and
/// one potential-collision record per querying entity.
pub(crate) struct CollisionScratchBuffers {
    pub sorting_data: Subbuffer<[SortingRecord]>,
    pub prefix_scan: Subbuffer<[u32]>,
    pub bvh_nodes: Subbuffer<[BvhNode]>,
    pub potential_collisions: Subbuffer<[PotentialCollisions]>,
}

impl CollisionScratchBuffers {
    pub fn new(
        backend: &VulkanoHeadlessBackend,
        entity_count: u32,
        query_count: u32,
    ) -> Result<Self> {
        let buffer_create_info = BufferCreateInfo {
            usage: BufferUsage::STORAGE_BUFFER
                | BufferUsage::TRANSFER_SRC
                | BufferUsage::TRANSFER_DST,
            ..Default::default()
        };
        let allocation_create_info = AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        };

        let sorting_data = Buffer::new_slice(
            backend.memory_allocator().clone(),
            buffer_create_info.clone(),
            allocation_create_info.clone(),
            entity_count as u64 * 2,
        )
        .context("failed to allocate sorting data buffer")?;

        let prefix_scan = Buffer::from_iter(
            backend.memory_allocator().clone(),
            buffer_create_info.clone(),
            allocation_create_info.clone(),
            std::iter::repeat(0u32).take(
                (PREFIX_SCAN_HEADER_SLOTS + padded_scan_item_count(entity_count) as u64) as usize,
            ),
        )
        .context("failed to allocate prefix scan buffer")?;

        let bvh_nodes = Buffer::new_slice(
            backend.memory_allocator().clone(),
            buffer_create_info.clone(),
            allocation_create_info.clone(),
            (entity_count as u64 * 2 - 1).max(1),
        )
        .context("failed to allocate BVH node buffer")?;

        let potential_collisions = Buffer::from_iter(
            backend.memory_allocator().clone(),
            buffer_create_info,
            allocation_create_info,
            std::iter::repeat(PotentialCollisions::default()).take(query_count as usize),
        )
        .context("failed to allocate potential collisions buffer")?;

        Ok(Self {
            sorting_data,
            prefix_scan,
            bvh_nodes,
            potential_collisions,
        })
    }
}
