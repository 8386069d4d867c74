use std::rc::Rc;

use anyhow::Result;
use glam::Vec2;
use rand::Rng;

use bounce_gpu::{
    BlenderLoad, ParticleInitData, SimulationConfig, Simulator, VulkanoHeadlessBackend,
};

const NUM_PARTICLES: usize = 10_000;
const NUM_FRAMES: usize = 300;
const DELTA_TIME: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::init();

    let backend = Rc::new(VulkanoHeadlessBackend::new()?);
    let geometry = BlenderLoad::from_file("demos/arena.obj");
    log::info!("loaded {} collidable polygons", geometry.polygons().len());

    let config = SimulationConfig {
        max_particles: NUM_PARTICLES as u32,
        ..SimulationConfig::default()
    };
    let mut simulator = Simulator::new(&backend, config, geometry.polygons())?;

    let mut rng = rand::rng();
    let particles: Vec<ParticleInitData> = (0..NUM_PARTICLES)
        .map(|_| ParticleInitData {
            position: Vec2::new(rng.random_range(-0.7..0.7), rng.random_range(-0.7..0.7)),
            velocity: Vec2::new(rng.random_range(-0.5..0.5), rng.random_range(-0.5..0.5)),
            particle_type_index: 0,
        })
        .collect();
    simulator.spawn_particles(&particles)?;
    simulator.set_profiling(true);

    for frame in 0..NUM_FRAMES {
        simulator.simulate_step(DELTA_TIME)?;
        if frame % 60 == 0 {
            let timings = simulator.timings();
            log::info!(
                "frame {:3}: {} active, {} us (sort {}, bvh {}, collide {}, polygons {})",
                frame,
                simulator.num_active_particles(),
                timings.total_us(),
                timings.particle_sort_us,
                timings.particle_bvh_us,
                timings.particle_collisions_us,
                timings.polygon_collisions_us,
            );
        }
    }

    let diagnostics = simulator.diagnostics()?;
    log::info!("run finished: {:?}", diagnostics);

    Ok(())
}
