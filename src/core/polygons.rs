use anyhow::{Context, Result};
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::BufferCopy,
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
};

use crate::utils::{BufferCopyTask, GpuTaskExecutor, VulkanoHeadlessBackend};

use super::PolygonFace;

/// Owns the static collidable geometry.  Like the particle buffer, the face
/// buffer is twice the polygon count so that the one-time sort can gather
/// from the copy half.  Immutable once the startup BVH has been built.
pub(crate) struct CollidablePolygons {
    count: u32,
    buffer: Subbuffer<[PolygonFace]>,
}

impl CollidablePolygons {
    pub fn new(backend: &VulkanoHeadlessBackend, faces: &[PolygonFace]) -> Result<Self> {
        // an empty scene still gets a one-slot buffer; zero-length buffer
        // allocations are invalid
        let slots = (faces.len() as u64 * 2).max(1);

        let buffer = Buffer::new_slice(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER
                    | BufferUsage::TRANSFER_SRC
                    | BufferUsage::TRANSFER_DST,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            slots,
        )
        .context("failed to allocate collidable polygon buffer")?;

        let polygons = Self {
            count: faces.len() as u32,
            buffer,
        };

        if !faces.is_empty() {
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
                faces.iter().copied(),
            )
            .context("failed to allocate polygon staging buffer")?;

            let regions = vec![BufferCopy {
                src_offset: 0,
                dst_offset: 0,
                size: faces.len() as u64,
                ..Default::default()
            }];
            let mut task = BufferCopyTask::new(staging, polygons.buffer.clone(), regions);
            backend.execute(&mut task);
        }

        Ok(polygons)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn buffer(&self) -> &Subbuffer<[PolygonFace]> {
        &self.buffer
    }
}
