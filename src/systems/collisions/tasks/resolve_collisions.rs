use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Elastic particle-particle resolution; partners are read from the copy
/// half so every thread sees pre-resolution state.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct ResolveParticleCollisionsConstants {
    num_active_particles: u32,
    max_particles: u32,
    read_offset: u32,
}

impl ResolveParticleCollisionsConstants {
    pub fn new(num_active_particles: u32, max_particles: u32, read_offset: u32) -> Self {
        Self {
            num_active_particles,
            max_particles,
            read_offset,
        }
    }
}

impl ComputeTaskConstants for ResolveParticleCollisionsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/resolve_particle_collisions.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load resolve_particle_collisions kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_active_particles
    }
}

pub(crate) type ResolveParticleCollisionsTask =
    ComputeGpuTask<ResolveParticleCollisionsConstants>;

/// First-hit reflection of particles off the static geometry.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct ResolvePolygonCollisionsConstants {
    num_active_particles: u32,
    delta_time_sec: f32,
}

impl ResolvePolygonCollisionsConstants {
    pub fn new(num_active_particles: u32, delta_time_sec: f32) -> Self {
        Self {
            num_active_particles,
            delta_time_sec,
        }
    }
}

impl ComputeTaskConstants for ResolvePolygonCollisionsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/resolve_polygon_collisions.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load resolve_polygon_collisions kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_active_particles
    }
}

pub(crate) type ResolvePolygonCollisionsTask =
    ComputeGpuTask<ResolvePolygonCollisionsConstants>;
