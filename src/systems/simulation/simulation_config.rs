use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::ParticleProperties;

/// One entry of the particle type table.  The collision radius is a tuning
/// knob, not a physical constant; the default matches the tiny particles
/// the simulation was designed around.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ParticleTypeConfig {
    pub mass: f32,
    pub collision_radius: f32,
}

/// Startup configuration of a simulator instance.  Positions are expected
/// inside the unit square [-1, +1]^2 (the Morton mapping clamps anything
/// outside); particles leaving the region circle are deactivated by the
/// update kernel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub max_particles: u32,
    pub region_center: Vec2,
    pub region_radius: f32,
    pub particle_types: Vec<ParticleTypeConfig>,
}

impl SimulationConfig {
    pub(crate) fn particle_properties(&self) -> Vec<ParticleProperties> {
        self.particle_types
            .iter()
            .map(|t| ParticleProperties::new(t.mass, t.collision_radius))
            .collect()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_particles: 0x10000,
            region_center: Vec2::ZERO,
            // covers the whole unit square with some slack
            region_radius: 1.5,
            particle_types: vec![ParticleTypeConfig {
                mass: 1.0,
                collision_radius: 0.002,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_usable() {
        let config = SimulationConfig::default();
        assert!(config.max_particles > 0);
        assert!(!config.particle_types.is_empty());
        assert!(config.region_radius > 1.0);
        assert_eq!(config.particle_properties().len(), 1);
    }
}
