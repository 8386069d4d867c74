mod approx_eq;
mod vulkan_context;

pub use vulkan_context::VulkanoHeadlessBackend;
pub(crate) use vulkan_context::{download_buffer, BufferCopyTask, GpuTask, GpuTaskExecutor};

#[cfg(test)]
pub(crate) use approx_eq::{approx_eq, approx_eq_vec2};
