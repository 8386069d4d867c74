/// Microsecond timings of the last profiled frame.  Only filled while
/// profiling is enabled; the executor's fence waits make each stage's
/// wall-clock time an honest measurement of the kernels inside it.
#[derive(Copy, Clone, Debug, Default)]
pub struct StageTimings {
    pub update_us: u128,
    pub particle_sort_us: u128,
    pub particle_bvh_us: u128,
    pub particle_collisions_us: u128,
    pub polygon_collisions_us: u128,
}

impl StageTimings {
    pub fn total_us(&self) -> u128 {
        self.update_us
            + self.particle_sort_us
            + self.particle_bvh_us
            + self.particle_collisions_us
            + self.polygon_collisions_us
    }
}
