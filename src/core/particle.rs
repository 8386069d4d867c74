use glam::Vec2;
use vulkano::buffer::BufferContents;

/// One simulated particle.  The layout must match the `Particle` struct in
/// every compute shader byte for byte, so the 2D members are stored in vec4
/// slots and the struct is padded out to a 128-byte stride.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct Particle {
    pub curr_pos: [f32; 4],
    pub prev_pos: [f32; 4],
    pub velocity: [f32; 4],
    pub particle_type_index: i32,
    pub num_nearby_particles: i32,
    pub is_active: u32,
    _padding0: u32,
    _extra: [[f32; 4]; 4],
}

impl Particle {
    pub fn inactive() -> Self {
        Self {
            curr_pos: [0.0; 4],
            prev_pos: [0.0; 4],
            velocity: [0.0; 4],
            particle_type_index: 0,
            num_nearby_particles: 0,
            is_active: 0,
            _padding0: 0,
            _extra: [[0.0; 4]; 4],
        }
    }

    pub fn curr_pos(&self) -> Vec2 {
        Vec2::new(self.curr_pos[0], self.curr_pos[1])
    }

    pub fn prev_pos(&self) -> Vec2 {
        Vec2::new(self.prev_pos[0], self.prev_pos[1])
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.velocity[0], self.velocity[1])
    }

    pub fn is_active(&self) -> bool {
        self.is_active != 0
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Host-side description of a particle to spawn.
pub struct ParticleInitData {
    pub position: Vec2,
    pub velocity: Vec2,
    pub particle_type_index: i32,
}

impl From<&ParticleInitData> for Particle {
    fn from(init: &ParticleInitData) -> Self {
        Self {
            curr_pos: [init.position.x, init.position.y, 0.0, 0.0],
            prev_pos: [init.position.x, init.position.y, 0.0, 0.0],
            velocity: [init.velocity.x, init.velocity.y, 0.0, 0.0],
            particle_type_index: init.particle_type_index,
            is_active: 1,
            ..Self::inactive()
        }
    }
}

/// Per-type lookup values, indexed by `Particle::particle_type_index`.
/// Read-only after startup.
#[repr(C)]
#[derive(Copy, Clone, Debug, BufferContents)]
pub struct ParticleProperties {
    pub mass: f32,
    pub collision_radius: f32,
    _padding: [f32; 2],
}

impl ParticleProperties {
    pub fn new(mass: f32, collision_radius: f32) -> Self {
        Self {
            mass,
            collision_radius,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_stride_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<Particle>(), 128);
        assert_eq!(std::mem::size_of::<ParticleProperties>(), 16);
    }

    #[test]
    fn test_spawned_particle_starts_where_it_was_placed() {
        let init = ParticleInitData {
            position: Vec2::new(0.25, -0.5),
            velocity: Vec2::new(1.0, 0.0),
            particle_type_index: 0,
        };
        let particle = Particle::from(&init);
        assert!(particle.is_active());
        assert_eq!(particle.curr_pos(), particle.prev_pos());
        assert_eq!(particle.velocity(), Vec2::new(1.0, 0.0));
    }
}
