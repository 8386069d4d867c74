use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Per-particle BVH traversal that fills the potential collision lists
/// with nearby particles.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct DetectParticleCollisionsConstants {
    num_active_particles: u32,
    root_node_index: u32,
}

impl DetectParticleCollisionsConstants {
    pub fn new(num_active_particles: u32, root_node_index: u32) -> Self {
        Self {
            num_active_particles,
            root_node_index,
        }
    }
}

impl ComputeTaskConstants for DetectParticleCollisionsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/detect_particle_collisions.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load detect_particle_collisions kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_active_particles
    }
}

pub(crate) type DetectParticleCollisionsTask =
    ComputeGpuTask<DetectParticleCollisionsConstants>;

/// Per-particle query of the static polygon BVH with the motion segment's
/// box.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct DetectPolygonCollisionsConstants {
    num_active_particles: u32,
    root_node_index: u32,
}

impl DetectPolygonCollisionsConstants {
    pub fn new(num_active_particles: u32, root_node_index: u32) -> Self {
        Self {
            num_active_particles,
            root_node_index,
        }
    }
}

impl ComputeTaskConstants for DetectPolygonCollisionsConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/detect_polygon_collisions.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load detect_polygon_collisions kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_active_particles
    }
}

pub(crate) type DetectPolygonCollisionsTask = ComputeGpuTask<DetectPolygonCollisionsConstants>;
