use std::sync::Arc;

use vulkano::{buffer::BufferContents, device::Device, shader::EntryPoint};

use super::compute_task::{ComputeGpuTask, ComputeTaskConstants};

/// Writes a {Morton key, source index} record per particle slot into the
/// read half of the sorting buffer; inactive slots get the sentinel key.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GenerateParticleSortingDataConstants {
    max_particles: u32,
}

impl GenerateParticleSortingDataConstants {
    pub fn new(max_particles: u32) -> Self {
        Self { max_particles }
    }
}

impl ComputeTaskConstants for GenerateParticleSortingDataConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/generate_particle_sorting_data.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load generate_particle_sorting_data kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_particles
    }
}

pub(crate) type GenerateParticleSortingDataTask =
    ComputeGpuTask<GenerateParticleSortingDataConstants>;

/// Same as the particle variant, keyed by polygon centroids.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct GeneratePolygonSortingDataConstants {
    max_polygons: u32,
}

impl GeneratePolygonSortingDataConstants {
    pub fn new(max_polygons: u32) -> Self {
        Self { max_polygons }
    }
}

impl ComputeTaskConstants for GeneratePolygonSortingDataConstants {
    fn entry_point(device: &Arc<Device>) -> EntryPoint {
        mod cs {
            vulkano_shaders::shader! {
                ty: "compute",
                path: "src/shaders/collisions/generate_polygon_sorting_data.comp",
            }
        }
        cs::load(device.clone())
            .expect("failed to load generate_polygon_sorting_data kernel")
            .entry_point("main")
            .unwrap()
    }

    fn work_item_count(&self) -> u32 {
        self.max_polygons
    }
}

pub(crate) type GeneratePolygonSortingDataTask =
    ComputeGpuTask<GeneratePolygonSortingDataConstants>;
