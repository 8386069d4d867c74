use anyhow::{bail, Context, Result};
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::BufferCopy,
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter},
};

use crate::utils::{BufferCopyTask, GpuTaskExecutor, VulkanoHeadlessBackend};

use super::{Particle, ParticleInitData, ParticleProperties};

/// Owns the device-resident particle state.  The particle buffer is twice
/// the particle capacity: [0, N) is the live half that the kernels mutate,
/// [N, 2N) is the copy half that the sort gathers from each frame.
pub(crate) struct Particles {
    max_particles: u32,
    spawned: u32,
    buffer: Subbuffer<[Particle]>,
    properties: Subbuffer<[ParticleProperties]>,
    active_counter: Subbuffer<[u32]>,
}

impl Particles {
    pub fn new(
        backend: &VulkanoHeadlessBackend,
        max_particles: u32,
        properties: &[ParticleProperties],
    ) -> Result<Self> {
        if max_particles == 0 {
            bail!("particle capacity must be nonzero");
        }
        if properties.is_empty() {
            bail!("at least one particle type must be configured");
        }

        let buffer = Buffer::new_slice(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER
                    | BufferUsage::TRANSFER_SRC
                    | BufferUsage::TRANSFER_DST,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: storage_memory_filter(),
                ..Default::default()
            },
            max_particles as u64 * 2,
        )
        .context("failed to allocate particle buffer")?;

        let properties = Buffer::from_iter(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            properties.iter().copied(),
        )
        .context("failed to allocate particle properties buffer")?;

        let active_counter = Buffer::from_iter(
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
            [0u32],
        )
        .context("failed to allocate active particle counter")?;

        let particles = Self {
            max_particles,
            spawned: 0,
            buffer,
            properties,
            active_counter,
        };

        // device memory is not zeroed; every slot starts as an inactive
        // particle so the sort parks it behind the live ones
        particles.upload(
            backend,
            &vec![Particle::inactive(); max_particles as usize * 2],
            0,
        )?;

        Ok(particles)
    }

    pub fn max_particles(&self) -> u32 {
        self.max_particles
    }

    pub fn buffer(&self) -> &Subbuffer<[Particle]> {
        &self.buffer
    }

    pub fn properties(&self) -> &Subbuffer<[ParticleProperties]> {
        &self.properties
    }

    pub fn active_counter(&self) -> &Subbuffer<[u32]> {
        &self.active_counter
    }

    /// Activates `init_data.len()` particles in the first free slots.
    pub fn spawn(
        &mut self,
        backend: &VulkanoHeadlessBackend,
        init_data: &[ParticleInitData],
    ) -> Result<()> {
        if init_data.is_empty() {
            return Ok(());
        }
        if self.spawned + init_data.len() as u32 > self.max_particles {
            bail!(
                "cannot spawn {} particles: {} of {} slots already used",
                init_data.len(),
                self.spawned,
                self.max_particles
            );
        }

        let staged: Vec<Particle> = init_data.iter().map(Particle::from).collect();
        self.upload(backend, &staged, self.spawned as u64)?;
        self.spawned += init_data.len() as u32;
        Ok(())
    }

    pub fn reset_active_counter(&self) -> Result<()> {
        let mut guard = self
            .active_counter
            .write()
            .context("failed to map active particle counter")?;
        guard[0] = 0;
        Ok(())
    }

    pub fn read_active_count(&self) -> Result<u32> {
        let guard = self
            .active_counter
            .read()
            .context("failed to map active particle counter")?;
        Ok(guard[0])
    }

    fn upload(
        &self,
        backend: &VulkanoHeadlessBackend,
        particles: &[Particle],
        first_slot: u64,
    ) -> Result<()> {
        let staging = Buffer::from_iter(
            backend.memory_allocator().clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            particles.iter().copied(),
        )
        .context("failed to allocate particle staging buffer")?;

        let regions = vec![BufferCopy {
            src_offset: 0,
            dst_offset: first_slot,
            size: particles.len() as u64,
            ..Default::default()
        }];
        let mut task = BufferCopyTask::new(staging, self.buffer.clone(), regions);
        backend.execute(&mut task);
        Ok(())
    }
}

fn storage_memory_filter() -> MemoryTypeFilter {
    #[cfg(test)]
    {
        MemoryTypeFilter::PREFER_HOST | MemoryTypeFilter::HOST_RANDOM_ACCESS
    }

    #[cfg(not(test))]
    {
        MemoryTypeFilter::PREFER_DEVICE
    }
}
