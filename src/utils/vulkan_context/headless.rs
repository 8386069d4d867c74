use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use vulkano::{
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage,
        PrimaryAutoCommandBuffer,
    },
    descriptor_set::allocator::StandardDescriptorSetAllocator,
    device::{
        physical::PhysicalDeviceType, Device, DeviceCreateInfo, DeviceExtensions, Queue,
        QueueCreateInfo,
    },
    instance::{Instance, InstanceCreateFlags, InstanceCreateInfo},
    memory::allocator::StandardMemoryAllocator,
    VulkanLibrary,
};

use super::{traits::GpuTaskExecutor, GpuTask};

/// A windowless Vulkan context: instance, one compute-capable device and
/// queue, plus the allocators every buffer and descriptor set comes from.
/// The simulator and the tests share this backend.
pub struct VulkanoHeadlessBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
}

impl VulkanoHeadlessBackend {
    pub fn new() -> Result<Self> {
        let instance = get_vulkan_instance()?;
        let (device, queue) = get_device_and_queue(&instance)?;
        let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            Default::default(),
        ));
        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
            device.clone(),
            Default::default(),
        ));
        Ok(Self {
            device,
            queue,
            memory_allocator,
            command_buffer_allocator,
            descriptor_set_allocator,
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub fn memory_allocator(&self) -> &Arc<StandardMemoryAllocator> {
        &self.memory_allocator
    }

    pub fn descriptor_set_allocator(&self) -> &Arc<StandardDescriptorSetAllocator> {
        &self.descriptor_set_allocator
    }

    pub fn command_buffer_builder(&self) -> AutoCommandBufferBuilder<PrimaryAutoCommandBuffer> {
        AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .expect("failed to allocate command buffer")
    }
}

impl GpuTaskExecutor for VulkanoHeadlessBackend {
    fn execute(&self, task: &mut dyn GpuTask) {
        let mut builder = self.command_buffer_builder();
        task.record(&mut builder);
        let command_buffer = builder.build().expect("failed to build command buffer");
        task.submit(command_buffer, &self.queue, &self.device);
    }
}

fn get_vulkan_instance() -> Result<Arc<Instance>> {
    let library = VulkanLibrary::new().context("no Vulkan library on this system")?;

    // the validation layer is useful while debugging kernels but not present
    // on every machine, so only enable it when it is actually installed
    let layers: Vec<String> = library
        .layer_properties()
        .map(|layers| {
            layers
                .map(|l| l.name().to_owned())
                .filter(|name| name == "VK_LAYER_KHRONOS_validation")
                .collect()
        })
        .unwrap_or_default();

    Instance::new(
        library,
        InstanceCreateInfo {
            flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
            enabled_layers: layers,
            ..Default::default()
        },
    )
    .context("failed to create Vulkan instance")
}

fn get_device_and_queue(instance: &Arc<Instance>) -> Result<(Arc<Device>, Arc<Queue>)> {
    let device_extensions = DeviceExtensions::empty();
    let (physical_device, queue_family_index) = instance
        .enumerate_physical_devices()
        .context("failed to enumerate physical devices")?
        .filter(|p| p.supported_extensions().contains(&device_extensions))
        .filter_map(|p| {
            p.queue_family_properties()
                .iter()
                .position(|q| q.queue_flags.contains(vulkano::device::QueueFlags::COMPUTE))
                .map(|index| (p, index as u32))
        })
        .min_by_key(|(p, _)| match p.properties().device_type {
            PhysicalDeviceType::DiscreteGpu => 0,
            PhysicalDeviceType::IntegratedGpu => 1,
            PhysicalDeviceType::VirtualGpu => 2,
            PhysicalDeviceType::Cpu => 3,
            PhysicalDeviceType::Other => 4,
            _ => 5,
        })
        .ok_or_else(|| anyhow!("no Vulkan device with a compute queue available"))?;

    log::info!(
        "using device: {} (type: {:?})",
        physical_device.properties().device_name,
        physical_device.properties().device_type,
    );

    let (device, mut queues) = Device::new(
        physical_device,
        DeviceCreateInfo {
            enabled_extensions: device_extensions,
            queue_create_infos: vec![QueueCreateInfo {
                queue_family_index,
                ..Default::default()
            }],
            ..Default::default()
        },
    )
    .context("failed to create device")?;
    let queue = queues.next().ok_or_else(|| anyhow!("device has no queue"))?;

    Ok((device, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_backend_creation() {
        let backend = VulkanoHeadlessBackend::new().unwrap();

        assert!(Arc::strong_count(backend.device()) > 0);
        assert!(Arc::strong_count(backend.memory_allocator()) > 0);
        assert!(Arc::strong_count(backend.descriptor_set_allocator()) > 0);
    }
}
