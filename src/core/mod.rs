mod box2d;
mod collision_data;
mod particle;
mod particles;
mod polygon;
mod polygons;

pub use box2d::Box2D;
pub use collision_data::{
    BvhNode, FrameDiagnostics, PotentialCollisions, SortingRecord, INACTIVE_SORTING_KEY,
    MAX_POTENTIAL_COLLISIONS, NO_NODE_INDEX,
};
pub use particle::{Particle, ParticleInitData, ParticleProperties};
pub(crate) use particles::Particles;
pub use polygon::PolygonFace;
pub(crate) use polygons::CollidablePolygons;
