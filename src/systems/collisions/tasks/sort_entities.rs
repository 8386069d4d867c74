use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// The end of a sort: gathers whole particles from the copy half into
/// Morton order using the sorted records' source indexes.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct SortParticlesConstants {
    max_particles: u32,
    read_offset: u32,
}

impl SortParticlesConstants {
    pub fn new(max_particles: u32, read_offset: u32) -> Self {
        Self {
            max_particles,
            read_offset,
        }
    }
}

impl ComputeTaskConstants for SortParticlesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/sort_particles.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load sort_particles kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_particles
    }
}

pub(crate) type SortParticlesTask = ComputeGpuTask<SortParticlesConstants>;

#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct SortPolygonsConstants {
    max_polygons: u32,
    read_offset: u32,
}

impl SortPolygonsConstants {
    pub fn new(max_polygons: u32, read_offset: u32) -> Self {
        Self {
            max_polygons,
            read_offset,
        }
    }
}

impl ComputeTaskConstants for SortPolygonsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/sort_polygons.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load sort_polygons kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_polygons
    }
}

pub(crate) type SortPolygonsTask = ComputeGpuTask<SortPolygonsConstants>;
