use std::sync::Arc;

use glam::Vec2;
use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use crate::systems::collisions::tasks::{ComputeGpuTask, ComputeTaskConstants};

/// Integrates every active particle and counts the survivors through the
/// atomic active-particle counter.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct UpdateParticlesConstants {
    max_particles: u32,
    delta_time_sec: f32,
    region_center_x: f32,
    region_center_y: f32,
    region_radius: f32,
}

impl UpdateParticlesConstants {
    pub fn new(
        max_particles: u32,
        delta_time_sec: f32,
        region_center: Vec2,
        region_radius: f32,
    ) -> Self {
        Self {
            max_particles,
            delta_time_sec,
            region_center_x: region_center.x,
            region_center_y: region_center.y,
            region_radius,
        }
    }
}

impl ComputeTaskConstants for UpdateParticlesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/simulation/update_particles.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load update_particles kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_particles
    }
}

pub(crate) type UpdateParticlesTask = ComputeGpuTask<UpdateParticlesConstants>;
