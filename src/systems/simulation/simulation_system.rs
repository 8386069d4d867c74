use std::{rc::Rc, time::Instant};

use anyhow::{Context, Result};
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    descriptor_set::WriteDescriptorSet,
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
};

use crate::core::{
    BvhNode, CollidablePolygons, FrameDiagnostics, Particle, ParticleInitData, Particles,
    PolygonFace,
};
use crate::systems::collisions::{ParticleCollisions, PolygonCollisions};
use crate::utils::{download_buffer, GpuTaskExecutor, VulkanoHeadlessBackend};

use super::{
    update_particles::{UpdateParticlesConstants, UpdateParticlesTask},
    SimulationConfig, StageTimings,
};

/// The simulator instance: owner of every device buffer and of the three
/// systems that make up a frame (particle update, particle-particle
/// collisions, particle-polygon collisions).  The host only ever sees
/// simulation state through the snapshot methods, each of which goes
/// through a fenced staging copy.
pub struct Simulator {
    backend: Rc<VulkanoHeadlessBackend>,
    config: SimulationConfig,

    particles: Particles,
    // referenced by the polygon system's descriptor sets; kept alive here
    #[allow(dead_code)]
    polygons: CollidablePolygons,
    diagnostics: Subbuffer<[FrameDiagnostics]>,

    update_task: UpdateParticlesTask,
    particle_collisions: ParticleCollisions,
    polygon_collisions: Option<PolygonCollisions>,

    with_profiling: bool,
    timings: StageTimings,
    last_num_active: u32,
}

impl Simulator {
    /// Fatal-error surface of the whole system: buffer allocation, kernel
    /// compilation and pipeline creation failures all end up here.
    pub fn new(
        backend: &Rc<VulkanoHeadlessBackend>,
        config: SimulationConfig,
        polygon_faces: &[PolygonFace],
    ) -> Result<Self> {
        let properties = config.particle_properties();
        let particles = Particles::new(backend, config.max_particles, &properties)
            .context("particle buffers")?;
        let polygons =
            CollidablePolygons::new(backend, polygon_faces).context("polygon buffers")?;

        let diagnostics = Buffer::from_iter(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST
                    | MemoryTypeFilter::HOST_RANDOM_ACCESS,
                ..Default::default()
            },
            [FrameDiagnostics::default()],
        )
        .context("failed to allocate diagnostics buffer")?;

        let update_task = UpdateParticlesTask::new(
            backend.device(),
            backend.descriptor_set_allocator(),
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, particles.active_counter().clone()),
            ],
        )
        .context("particle update task")?;

        let particle_collisions = ParticleCollisions::new(backend, &particles, &diagnostics)
            .context("particle collision system")?;

        let polygon_collisions = if polygons.count() > 0 {
            let system = PolygonCollisions::new(backend, &polygons, &particles, &diagnostics)
                .context("polygon collision system")?;
            log::info!(
                "built the static BVH over {} collidable polygons",
                system.num_polygons()
            );
            Some(system)
        } else {
            None
        };

        Ok(Self {
            backend: backend.clone(),
            config,
            particles,
            polygons,
            diagnostics,
            update_task,
            particle_collisions,
            polygon_collisions,
            with_profiling: false,
            timings: StageTimings::default(),
            last_num_active: 0,
        })
    }

    pub fn spawn_particles(&mut self, init_data: &[ParticleInitData]) -> Result<()> {
        let backend = self.backend.clone();
        self.particles.spawn(&backend, init_data)
    }

    /// Advances the simulation by one frame: update, particle-particle
    /// collisions, then particle-polygon collisions so the static geometry
    /// has the final say on positions.
    pub fn simulate_step(&mut self, delta_time: f32) -> Result<()> {
        let backend = self.backend.clone();

        self.particles.reset_active_counter()?;
        self.update_task.set_constants(UpdateParticlesConstants::new(
            self.particles.max_particles(),
            delta_time,
            self.config.region_center,
            self.config.region_radius,
        ));
        let update_start = Instant::now();
        backend.execute(&mut self.update_task);
        if self.with_profiling {
            self.timings.update_us = update_start.elapsed().as_micros();
        }

        let num_active = self.particles.read_active_count()?;
        self.last_num_active = num_active;

        self.particle_collisions.detect_and_resolve(
            &backend,
            num_active,
            self.with_profiling,
            &mut self.timings,
        )?;

        if let Some(polygon_collisions) = self.polygon_collisions.as_mut() {
            polygon_collisions.detect_and_resolve(
                &backend,
                num_active,
                delta_time,
                self.with_profiling,
                &mut self.timings,
            )?;
        }

        if self.with_profiling {
            log::debug!(
                "frame: {} active, timings {:?} ({} us total)",
                num_active,
                self.timings,
                self.timings.total_us()
            );
        }

        Ok(())
    }

    /// Read-only copy of every particle slot.  After a frame the active
    /// particles occupy the front of the array in Morton order.
    pub fn snapshot_particles(&self) -> Result<Vec<Particle>> {
        download_buffer(
            &self.backend,
            self.particles.buffer(),
            0,
            self.particles.max_particles() as u64,
        )
    }

    /// Diagnostic copy of the particle BVH built in the last frame; empty
    /// when fewer than two particles were active.
    pub fn snapshot_bvh(&self) -> Result<Vec<BvhNode>> {
        let num_leaves = self.last_num_active as u64;
        if num_leaves < 2 {
            return Ok(Vec::new());
        }
        download_buffer(
            &self.backend,
            self.particle_collisions.bvh_nodes(),
            0,
            num_leaves * 2 - 1,
        )
    }

    /// Counters of the per-frame anomalies that are clamped instead of
    /// aborting (dropped candidates, zeroed velocities, degenerate
    /// polygons).  Cumulative over the run.
    pub fn diagnostics(&self) -> Result<FrameDiagnostics> {
        let guard = self
            .diagnostics
            .read()
            .context("failed to map diagnostics buffer")?;
        Ok(guard[0])
    }

    /// When enabled, each stage is timed (the executor already waits on
    /// every kernel) and the sort/tree invariants are verified on readbacks
    /// after each frame's build.
    pub fn set_profiling(&mut self, enabled: bool) {
        self.with_profiling = enabled;
    }

    pub fn timings(&self) -> StageTimings {
        self.timings
    }

    pub fn num_active_particles(&self) -> u32 {
        self.last_num_active
    }
}
