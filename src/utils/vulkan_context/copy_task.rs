use std::sync::Arc;

use anyhow::{Context, Result};
use vulkano::{
    buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::{
        AutoCommandBufferBuilder, BufferCopy, CopyBufferInfoTyped, PrimaryAutoCommandBuffer,
    },
    device::{Device, Queue},
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
    sync::{self, GpuFuture},
};

use super::{GpuTask, GpuTaskExecutor, VulkanoHeadlessBackend};

/// Copies regions between two typed buffers.  Used for staging uploads
/// (spawning particles, loading geometry) and for snapshot readbacks; the
/// copy regions are in elements, not bytes.
pub(crate) struct BufferCopyTask<T: BufferContents> {
    src: Subbuffer<[T]>,
    dst: Subbuffer<[T]>,
    regions: Vec<BufferCopy>,
}

impl<T: BufferContents> BufferCopyTask<T> {
    pub fn new(src: Subbuffer<[T]>, dst: Subbuffer<[T]>, regions: Vec<BufferCopy>) -> Self {
        Self { src, dst, regions }
    }
}

impl<T: BufferContents> GpuTask for BufferCopyTask<T> {
    fn record(&self, builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>) {
        let mut copy_info = CopyBufferInfoTyped::buffers(self.src.clone(), self.dst.clone());
        copy_info.regions = self.regions.clone().into();
        builder.copy_buffer(copy_info).expect("buffer copy failed to record");
    }

    fn submit(
        &mut self,
        command_buffer: Arc<PrimaryAutoCommandBuffer>,
        queue: &Arc<Queue>,
        device: &Arc<Device>,
    ) {
        let future = sync::now(device.clone())
            .then_execute(queue.clone(), command_buffer)
            .expect("failed to submit buffer copy")
            .then_signal_fence_and_flush()
            .expect("failed to flush buffer copy");
        future.wait(None).expect("buffer copy did not finish");
    }
}

/// Reads `count` elements starting at `first` out of a device buffer through
/// a host-visible staging buffer.  This is the only way the host looks at
/// simulation state mid-run; the copy's fence doubles as the storage barrier
/// that makes prior kernel writes visible.
pub(crate) fn download_buffer<T: BufferContents + Clone>(
    backend: &VulkanoHeadlessBackend,
    src: &Subbuffer<[T]>,
    first: u64,
    count: u64,
) -> Result<Vec<T>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let staging: Subbuffer<[T]> = Buffer::new_slice(
        backend.memory_allocator().clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_DST,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_RANDOM_ACCESS,
            ..Default::default()
        },
        count,
    )
    .context("failed to allocate staging buffer for readback")?;

    let regions = vec![BufferCopy {
        src_offset: first,
        dst_offset: 0,
        size: count,
        ..Default::default()
    }];
    let mut task = BufferCopyTask::new(src.clone(), staging.clone(), regions);
    backend.execute(&mut task);

    let guard = staging.read().context("failed to map staging buffer")?;
    Ok(guard.to_vec())
}
