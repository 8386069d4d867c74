use std::sync::Arc;

use anyhow::{Context, Result};
use vulkano::{
    buffer::BufferContents,
    command_buffer::{AutoCommandBufferBuilder, PrimaryAutoCommandBuffer},
    descriptor_set::{
        allocator::StandardDescriptorSetAllocator, DescriptorSet, WriteDescriptorSet,
    },
    device::{Device, Queue},
    pipeline::{
        compute::ComputePipelineCreateInfo, layout::PipelineDescriptorSetLayoutCreateInfo,
        ComputePipeline, Pipeline, PipelineBindPoint, PipelineLayout,
        PipelineShaderStageCreateInfo,
    },
    shader::EntryPoint,
    sync::{self, GpuFuture},
};

use crate::utils::GpuTask;

use super::WORK_GROUP_SIZE;

/// Push constants of one compute kernel.  The implementing struct must
/// mirror the kernel's push constant block exactly; `work_item_count` tells
/// the dispatch how many threads the grid has to cover.
pub(crate) trait ComputeTaskConstants: BufferContents + Copy {
    fn entry_point(device: &Arc<Device>) -> EntryPoint;
    fn work_item_count(&self) -> u32;
}

/// One kernel of the pipeline: compute pipeline, the fixed set of buffers
/// it reads and writes, and the push constants of the next dispatch.  The
/// buffers never reallocate, so the descriptor set is built once when the
/// owning system wires itself up; per-dispatch values (bit number, buffer
/// half offsets, entity counts) travel as push constants.
pub(crate) struct ComputeGpuTask<C>
where
    C: ComputeTaskConstants,
{
    pipeline: Arc<ComputePipeline>,
    descriptor_set: Arc<DescriptorSet>,
    constants: Option<C>,
}

impl<C> ComputeGpuTask<C>
where
    C: ComputeTaskConstants,
{
    pub fn new(
        device: &Arc<Device>,
        descriptor_set_allocator: &Arc<StandardDescriptorSetAllocator>,
        descriptor_writes: impl IntoIterator<Item = WriteDescriptorSet>,
    ) -> Result<Self> {
        let entry_point = C::entry_point(device);
        let stage = PipelineShaderStageCreateInfo::new(entry_point);
        let layout = PipelineLayout::new(
            device.clone(),
            PipelineDescriptorSetLayoutCreateInfo::from_stages([&stage])
                .into_pipeline_layout_create_info(device.clone())
                .map_err(|err| anyhow::anyhow!("unusable pipeline layout: {err:?}"))?,
        )
        .context("failed to create pipeline layout")?;
        let pipeline = ComputePipeline::new(
            device.clone(),
            None,
            ComputePipelineCreateInfo::stage_layout(stage, layout),
        )
        .context("failed to create compute pipeline")?;

        let set_layout = pipeline.layout().set_layouts()[0].clone();
        let descriptor_set = DescriptorSet::new(
            descriptor_set_allocator.clone(),
            set_layout,
            descriptor_writes,
            [],
        )
        .context("failed to create descriptor set")?;

        Ok(Self {
            pipeline,
            descriptor_set,
            constants: None,
        })
    }

    pub fn set_constants(&mut self, constants: C) {
        self.constants = Some(constants);
    }
}

impl<C> GpuTask for ComputeGpuTask<C>
where
    C: ComputeTaskConstants,
{
    fn record(&self, builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>) {
        let constants = self
            .constants
            .as_ref()
            .expect("task recorded before set_constants");

        builder
            .bind_pipeline_compute(self.pipeline.clone())
            .unwrap();
        builder
            .bind_descriptor_sets(
                PipelineBindPoint::Compute,
                self.pipeline.layout().clone(),
                0,
                self.descriptor_set.clone(),
            )
            .unwrap();
        builder
            .push_constants(self.pipeline.layout().clone(), 0, *constants)
            .unwrap();

        let work_group_num = constants.work_item_count().div_ceil(WORK_GROUP_SIZE);
        unsafe {
            builder.dispatch([work_group_num, 1, 1]).unwrap();
        }
    }

    fn submit(
        &mut self,
        command_buffer: Arc<PrimaryAutoCommandBuffer>,
        queue: &Arc<Queue>,
        device: &Arc<Device>,
    ) {
        let future = sync::now(device.clone())
            .then_execute(queue.clone(), command_buffer)
            .unwrap()
            .then_signal_fence_and_flush()
            .unwrap();
        future.wait(None).unwrap();
    }
}
