mod core;
mod geometry;
mod systems;
mod utils;

pub use crate::core::{
    Box2D, BvhNode, FrameDiagnostics, Particle, ParticleInitData, ParticleProperties,
    PolygonFace, PotentialCollisions, SortingRecord, INACTIVE_SORTING_KEY,
    MAX_POTENTIAL_COLLISIONS, NO_NODE_INDEX,
};
pub use geometry::BlenderLoad;
pub use systems::simulation::{ParticleTypeConfig, SimulationConfig, Simulator, StageTimings};
pub use utils::VulkanoHeadlessBackend;
