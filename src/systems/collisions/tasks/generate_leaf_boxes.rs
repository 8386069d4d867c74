use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Initializes one BVH leaf per sorted active particle: position inflated
/// by the type's collision radius.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GenerateParticleLeafBoxesConstants {
    num_leaves: u32,
}

impl GenerateParticleLeafBoxesConstants {
    pub fn new(num_leaves: u32) -> Self {
        Self { num_leaves }
    }
}

impl ComputeTaskConstants for GenerateParticleLeafBoxesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/generate_particle_leaf_boxes.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load generate_particle_leaf_boxes kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_leaves
    }
}

pub(crate) type GenerateParticleLeafBoxesTask =
    ComputeGpuTask<GenerateParticleLeafBoxesConstants>;

/// Initializes one BVH leaf per sorted polygon: the segment endpoints'
/// box, slightly padded.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GeneratePolygonLeafBoxesConstants {
    num_leaves: u32,
}

impl GeneratePolygonLeafBoxesConstants {
    pub fn new(num_leaves: u32) -> Self {
        Self { num_leaves }
    }
}

impl ComputeTaskConstants for GeneratePolygonLeafBoxesConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/generate_polygon_leaf_boxes.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load generate_polygon_leaf_boxes kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.num_leaves
    }
}

pub(crate) type GeneratePolygonLeafBoxesTask = ComputeGpuTask<GeneratePolygonLeafBoxesConstants>;
