mod frame_profile;
mod simulation_config;
mod simulation_system;
mod update_particles;

pub use frame_profile::StageTimings;
pub use simulation_config::{ParticleTypeConfig, SimulationConfig};
pub use simulation_system::Simulator;
pub(crate) use update_particles::{UpdateParticlesConstants, UpdateParticlesTask};
