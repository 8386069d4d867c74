use std::sync::Arc;

use vulkano::{
    command_buffer::{AutoCommandBufferBuilder, PrimaryAutoCommandBuffer},
    device::{self, Queue},
};

pub trait GpuTask {
    fn record(&self, builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>);
    fn submit(
        &mut self,
        command_buffer: Arc<PrimaryAutoCommandBuffer>,
        queue: &Arc<Queue>,
        device: &Arc<device::Device>,
    );
}

/// Submits one task at a time and waits for its fence before returning.
/// That wait is the device-wide storage barrier between pipeline stages: a
/// kernel never starts until every write of the previous kernel is visible.
pub trait GpuTaskExecutor {
    fn execute(&self, task: &mut dyn GpuTask);
}
