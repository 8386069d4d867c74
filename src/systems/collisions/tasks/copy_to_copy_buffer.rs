use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Refreshes the copy half of the particle buffer before a sort.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct CopyParticlesConstants {
    max_particles: u32,
}

impl CopyParticlesConstants {
    pub fn new(max_particles: u32) -> Self {
        Self { max_particles }
    }
}

impl ComputeTaskConstants for CopyParticlesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/copy_particles.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load copy_particles kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_particles
    }
}

pub(crate) type CopyParticlesTask = ComputeGpuTask<CopyParticlesConstants>;

#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct CopyPolygonsConstants {
    max_polygons: u32,
}

impl CopyPolygonsConstants {
    pub fn new(max_polygons: u32) -> Self {
        Self { max_polygons }
    }
}

impl ComputeTaskConstants for CopyPolygonsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/copy_polygons.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load copy_polygons kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_polygons
    }
}

pub(crate) type CopyPolygonsTask = ComputeGpuTask<CopyPolygonsConstants>;
