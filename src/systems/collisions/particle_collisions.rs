use std::time::Instant;

use anyhow::{bail, Result};
use vulkano::{buffer::Subbuffer, descriptor_set::WriteDescriptorSet};

use crate::core::{BvhNode, FrameDiagnostics, Particles, SortingRecord, NO_NODE_INDEX};
use crate::systems::simulation::StageTimings;
use crate::utils::{download_buffer, GpuTaskExecutor, VulkanoHeadlessBackend};

use super::{
    tasks::{
        padded_scan_item_count, CopyParticlesConstants, CopyParticlesTask,
        DetectParticleCollisionsConstants, DetectParticleCollisionsTask,
        GenerateBinaryRadixTreeConstants, GenerateBinaryRadixTreeTask,
        GenerateParticleLeafBoxesConstants, GenerateParticleLeafBoxesTask,
        GenerateParticleSortingDataConstants, GenerateParticleSortingDataTask,
        GuaranteeUniquenessConstants, GuaranteeUniquenessTask, MergeBoundingVolumesConstants,
        MergeBoundingVolumesTask, PrefixScanStage1Constants, PrefixScanStage1Task,
        PrefixScanStage2Constants, PrefixScanStage2Task, PrefixScanStage3Constants,
        PrefixScanStage3Task, ResolveParticleCollisionsConstants, ResolveParticleCollisionsTask,
        SortParticlesConstants, SortParticlesTask, SortSortingDataConstants, SortSortingDataTask,
        MAX_SORTABLE_ENTITIES, PREFIX_SCAN_ITEMS_PER_WORK_GROUP, TOTAL_SORTING_BITS,
    },
    CollisionScratchBuffers,
};

/// Per-frame particle-particle collision pipeline: sort the particles along
/// the Z-order curve, build a BVH over the active prefix, traverse it for
/// candidate pairs, and resolve the real overlaps elastically.
///
/// Working through the problem backwards: an O(N^2) pairwise test is out of
/// the question, so detection traverses a tree; the only tree that can be
/// built entirely in uniform parallel passes is a binary radix tree over
/// sorted keys; and sorted Morton keys conveniently put spatial neighbours
/// next to each other, which is exactly what leaf boxes need.
pub(crate) struct ParticleCollisions {
    max_particles: u32,
    scratch: CollisionScratchBuffers,

    copy_task: CopyParticlesTask,
    generate_sorting_data_task: GenerateParticleSortingDataTask,
    prefix_scan_stage1_task: PrefixScanStage1Task,
    prefix_scan_stage2_task: PrefixScanStage2Task,
    prefix_scan_stage3_task: PrefixScanStage3Task,
    sort_sorting_data_task: SortSortingDataTask,
    sort_particles_task: SortParticlesTask,

    guarantee_uniqueness_task: GuaranteeUniquenessTask,
    generate_leaf_boxes_task: GenerateParticleLeafBoxesTask,
    generate_tree_task: GenerateBinaryRadixTreeTask,
    merge_volumes_task: MergeBoundingVolumesTask,

    detect_task: DetectParticleCollisionsTask,
    resolve_task: ResolveParticleCollisionsTask,
}

impl ParticleCollisions {
    pub fn new(
        backend: &VulkanoHeadlessBackend,
        particles: &Particles,
        diagnostics: &Subbuffer<[FrameDiagnostics]>,
    ) -> Result<Self> {
        let max_particles = particles.max_particles();
        if max_particles > MAX_SORTABLE_ENTITIES {
            bail!(
                "particle capacity {} exceeds the sortable maximum {}",
                max_particles,
                MAX_SORTABLE_ENTITIES
            );
        }

        let scratch = CollisionScratchBuffers::new(backend, max_particles, max_particles)?;
        let device = backend.device();
        let dsa = backend.descriptor_set_allocator();

        let copy_task = CopyParticlesTask::new(
            device,
            dsa,
            [WriteDescriptorSet::buffer(0, particles.buffer().clone())],
        )?;
        let generate_sorting_data_task = GenerateParticleSortingDataTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, scratch.sorting_data.clone()),
            ],
        )?;
        let prefix_scan_stage1_task = PrefixScanStage1Task::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
                WriteDescriptorSet::buffer(1, scratch.prefix_scan.clone()),
            ],
        )?;
        let prefix_scan_stage2_task = PrefixScanStage2Task::new(
            device,
            dsa,
            [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
        )?;
        let prefix_scan_stage3_task = PrefixScanStage3Task::new(
            device,
            dsa,
            [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
        )?;
        let sort_sorting_data_task = SortSortingDataTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
                WriteDescriptorSet::buffer(1, scratch.prefix_scan.clone()),
            ],
        )?;
        let sort_particles_task = SortParticlesTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, scratch.sorting_data.clone()),
            ],
        )?;

        let guarantee_uniqueness_task = GuaranteeUniquenessTask::new(
            device,
            dsa,
            [WriteDescriptorSet::buffer(0, scratch.sorting_data.clone())],
        )?;
        let generate_leaf_boxes_task = GenerateParticleLeafBoxesTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, particles.properties().clone()),
                WriteDescriptorSet::buffer(2, scratch.bvh_nodes.clone()),
            ],
        )?;
        let generate_tree_task = GenerateBinaryRadixTreeTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
                WriteDescriptorSet::buffer(1, scratch.bvh_nodes.clone()),
            ],
        )?;
        let merge_volumes_task = MergeBoundingVolumesTask::new(
            device,
            dsa,
            [WriteDescriptorSet::buffer(0, scratch.bvh_nodes.clone())],
        )?;

        let detect_task = DetectParticleCollisionsTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, particles.properties().clone()),
                WriteDescriptorSet::buffer(2, scratch.bvh_nodes.clone()),
                WriteDescriptorSet::buffer(3, scratch.potential_collisions.clone()),
                WriteDescriptorSet::buffer(4, diagnostics.clone()),
            ],
        )?;
        let resolve_task = ResolveParticleCollisionsTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, particles.properties().clone()),
                WriteDescriptorSet::buffer(2, scratch.sorting_data.clone()),
                WriteDescriptorSet::buffer(3, scratch.potential_collisions.clone()),
                WriteDescriptorSet::buffer(4, diagnostics.clone()),
            ],
        )?;

        Ok(Self {
            max_particles,
            scratch,
            copy_task,
            generate_sorting_data_task,
            prefix_scan_stage1_task,
            prefix_scan_stage2_task,
            prefix_scan_stage3_task,
            sort_sorting_data_task,
            sort_particles_task,
            guarantee_uniqueness_task,
            generate_leaf_boxes_task,
            generate_tree_task,
            merge_volumes_task,
            detect_task,
            resolve_task,
        })
    }

    pub fn bvh_nodes(&self) -> &Subbuffer<[BvhNode]> {
        &self.scratch.bvh_nodes
    }

    /// Runs the whole per-frame pipeline.  With fewer than two active
    /// particles there is nothing to collide and the frame is skipped.
    pub fn detect_and_resolve(
        &mut self,
        backend: &VulkanoHeadlessBackend,
        num_active: u32,
        with_profiling: bool,
        timings: &mut StageTimings,
    ) -> Result<()> {
        if num_active < 2 {
            return Ok(());
        }

        if with_profiling {
            let start = Instant::now();
            self.sort_particles(backend);
            timings.particle_sort_us = start.elapsed().as_micros();

            let start = Instant::now();
            self.generate_bvh(backend, num_active);
            timings.particle_bvh_us = start.elapsed().as_micros();

            self.verify_sort_invariants(backend)?;
            self.verify_tree_invariants(backend, num_active)?;

            let start = Instant::now();
            self.detect_collisions(backend, num_active);
            self.resolve_collisions(backend, num_active);
            timings.particle_collisions_us = start.elapsed().as_micros();
        } else {
            self.sort_particles(backend);
            self.generate_bvh(backend, num_active);
            self.detect_collisions(backend, num_active);
            self.resolve_collisions(backend, num_active);
        }

        Ok(())
    }

    /// Sorts the particle array along the Z-order curve: copy, key
    /// generation, 32 scan+scatter passes over the key bits, then one
    /// gather of the full particles into sorted order.
    fn sort_particles(&mut self, backend: &VulkanoHeadlessBackend) {
        let n = self.max_particles;

        self.copy_task.set_constants(CopyParticlesConstants::new(n));
        backend.execute(&mut self.copy_task);
        self.generate_sorting_data_task
            .set_constants(GenerateParticleSortingDataConstants::new(n));
        backend.execute(&mut self.generate_sorting_data_task);

        let mut read_offset = 0;
        let mut write_offset = n;
        for bit_number in 0..TOTAL_SORTING_BITS {
            self.prefix_scan(backend, n, read_offset, bit_number);
            self.sort_sorting_data_task
                .set_constants(SortSortingDataConstants::new(
                    n,
                    read_offset,
                    write_offset,
                    bit_number,
                ));
            backend.execute(&mut self.sort_sorting_data_task);
            std::mem::swap(&mut read_offset, &mut write_offset);
        }

        // an even number of passes leaves the final records in the first
        // half, which is where read_offset points again
        self.sort_particles_task
            .set_constants(SortParticlesConstants::new(n, read_offset));
        backend.execute(&mut self.sort_particles_task);
    }

    fn prefix_scan(
        &mut self,
        backend: &VulkanoHeadlessBackend,
        entity_count: u32,
        read_offset: u32,
        bit_number: u32,
    ) {
        self.prefix_scan_stage1_task
            .set_constants(PrefixScanStage1Constants::new(
                entity_count,
                read_offset,
                bit_number,
            ));
        backend.execute(&mut self.prefix_scan_stage1_task);

        let num_scan_groups = entity_count.div_ceil(PREFIX_SCAN_ITEMS_PER_WORK_GROUP);
        self.prefix_scan_stage2_task
            .set_constants(PrefixScanStage2Constants::new(num_scan_groups));
        backend.execute(&mut self.prefix_scan_stage2_task);

        self.prefix_scan_stage3_task
            .set_constants(PrefixScanStage3Constants::new(padded_scan_item_count(
                entity_count,
            )));
        backend.execute(&mut self.prefix_scan_stage3_task);
    }

    /// Disambiguates the sorted keys and builds the BVH over the active
    /// prefix of the sorted array.
    fn generate_bvh(&mut self, backend: &VulkanoHeadlessBackend, num_active: u32) {
        self.guarantee_uniqueness_task
            .set_constants(GuaranteeUniquenessConstants::new(self.max_particles, 0));
        backend.execute(&mut self.guarantee_uniqueness_task);

        self.generate_leaf_boxes_task
            .set_constants(GenerateParticleLeafBoxesConstants::new(num_active));
        backend.execute(&mut self.generate_leaf_boxes_task);

        self.generate_tree_task
            .set_constants(GenerateBinaryRadixTreeConstants::new(num_active, 0));
        backend.execute(&mut self.generate_tree_task);

        self.merge_volumes_task
            .set_constants(MergeBoundingVolumesConstants::new(num_active));
        backend.execute(&mut self.merge_volumes_task);
    }

    fn detect_collisions(&mut self, backend: &VulkanoHeadlessBackend, num_active: u32) {
        // the root of a tree with L leaves sits at arena index L
        self.detect_task
            .set_constants(DetectParticleCollisionsConstants::new(num_active, num_active));
        backend.execute(&mut self.detect_task);
    }

    fn resolve_collisions(&mut self, backend: &VulkanoHeadlessBackend, num_active: u32) {
        self.resolve_task
            .set_constants(ResolveParticleCollisionsConstants::new(
                num_active,
                self.max_particles,
                0,
            ));
        backend.execute(&mut self.resolve_task);
    }

    /// Profiling-mode check of the sort invariants: after disambiguation
    /// the whole key array must be strictly increasing.
    fn verify_sort_invariants(&self, backend: &VulkanoHeadlessBackend) -> Result<()> {
        let records: Vec<SortingRecord> =
            download_buffer(backend, &self.scratch.sorting_data, 0, self.max_particles as u64)?;
        for i in 1..records.len() {
            if records[i].sorting_data <= records[i - 1].sorting_data {
                log::warn!(
                    "sort invariant violated at index {}: key {:#010x} follows {:#010x}",
                    i,
                    records[i].sorting_data,
                    records[i - 1].sorting_data
                );
                break;
            }
        }
        Ok(())
    }

    /// Profiling-mode check of the tree invariants: the root has no parent,
    /// every other node is referenced by its parent exactly once, and every
    /// internal box is the union of its children's boxes.
    fn verify_tree_invariants(
        &self,
        backend: &VulkanoHeadlessBackend,
        num_leaves: u32,
    ) -> Result<()> {
        let node_count = num_leaves as u64 * 2 - 1;
        let nodes: Vec<BvhNode> = download_buffer(backend, &self.scratch.bvh_nodes, 0, node_count)?;
        let root = num_leaves as usize;

        if nodes[root].parent_index != NO_NODE_INDEX {
            log::warn!("BVH root claims a parent ({})", nodes[root].parent_index);
        }

        for (index, node) in nodes.iter().enumerate() {
            if index == root {
                continue;
            }
            if node.parent_index < 0 || node.parent_index as usize >= nodes.len() {
                log::warn!("BVH node {} has no valid parent", index);
                continue;
            }
            let parent = &nodes[node.parent_index as usize];
            let references = (parent.left_child_index == index as i32) as u32
                + (parent.right_child_index == index as i32) as u32;
            if references != 1 {
                log::warn!(
                    "BVH parent-child link not reciprocated between {} and {}",
                    node.parent_index,
                    index
                );
            }
        }

        for (index, node) in nodes.iter().enumerate().skip(root) {
            let left = &nodes[node.left_child_index as usize];
            let right = &nodes[node.right_child_index as usize];
            let union = left.bounding_box().union(&right.bounding_box());
            let own = node.bounding_box();
            if (own.min - union.min).abs().max_element() > 1.0e-5
                || (own.max - union.max).abs().max_element() > 1.0e-5
            {
                log::warn!("BVH node {} box is not the union of its children", index);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::Rng;
    use vulkano::buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer};
    use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter};

    use super::*;
    use crate::core::{
        Particle, ParticleInitData, ParticleProperties, PotentialCollisions, INACTIVE_SORTING_KEY,
    };
    use crate::utils::approx_eq;

    fn make_diagnostics(backend: &VulkanoHeadlessBackend) -> Subbuffer<[FrameDiagnostics]> {
        Buffer::from_iter(
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
        .unwrap()
    }

    fn spawn_at(positions: &[Vec2]) -> Vec<ParticleInitData> {
        positions
            .iter()
            .map(|&position| ParticleInitData {
                position,
                velocity: Vec2::ZERO,
                particle_type_index: 0,
            })
            .collect()
    }

    #[test]
    fn test_sort_orders_keys_and_parks_inactive_tail() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let properties = [ParticleProperties::new(1.0, 0.02)];
        let mut particles = Particles::new(&backend, 1000, &properties).unwrap();

        let mut rng = rand::rng();
        let positions: Vec<Vec2> = (0..400)
            .map(|_| Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
            .collect();
        particles.spawn(&backend, &spawn_at(&positions)).unwrap();

        let diagnostics = make_diagnostics(&backend);
        let mut system = ParticleCollisions::new(&backend, &particles, &diagnostics).unwrap();
        system.sort_particles(&backend);

        let records: Vec<SortingRecord> =
            download_buffer(&backend, &system.scratch.sorting_data, 0, 1000).unwrap();

        // non-decreasing keys over the whole array
        for i in 1..records.len() {
            assert!(
                records[i - 1].sorting_data <= records[i].sorting_data,
                "keys out of order at index {}",
                i
            );
        }

        // the 600 unspawned slots hold sentinel keys at the back
        for record in &records[400..] {
            assert_eq!(record.sorting_data, INACTIVE_SORTING_KEY);
        }
        for record in &records[..400] {
            assert!(record.sorting_data < INACTIVE_SORTING_KEY);
        }

        // every source index appears exactly once
        let mut seen = vec![false; 1000];
        for record in &records {
            assert!(!seen[record.pre_sorted_index as usize]);
            seen[record.pre_sorted_index as usize] = true;
        }

        // the gathered particles are the sorted ones: all actives in front
        let gathered: Vec<Particle> =
            download_buffer(&backend, particles.buffer(), 0, 1000).unwrap();
        assert!(gathered[..400].iter().all(|p| p.is_active()));
        assert!(gathered[400..].iter().all(|p| !p.is_active()));

        // sorting an already-sorted array changes nothing
        system.sort_particles(&backend);
        let records_again: Vec<SortingRecord> =
            download_buffer(&backend, &system.scratch.sorting_data, 0, 1000).unwrap();
        let keys: Vec<u32> = records.iter().map(|r| r.sorting_data).collect();
        let keys_again: Vec<u32> = records_again.iter().map(|r| r.sorting_data).collect();
        assert_eq!(keys, keys_again);
    }

    #[test]
    fn test_duplicate_positions_get_unique_keys_and_a_finite_tree() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let properties = [ParticleProperties::new(1.0, 0.02)];
        let mut particles = Particles::new(&backend, 8, &properties).unwrap();

        // two particles on the same spot, one elsewhere
        let same_spot = Vec2::new(0.25, 0.25);
        particles
            .spawn(
                &backend,
                &spawn_at(&[same_spot, same_spot, Vec2::new(-0.5, -0.5)]),
            )
            .unwrap();

        let diagnostics = make_diagnostics(&backend);
        let mut system = ParticleCollisions::new(&backend, &particles, &diagnostics).unwrap();
        system.sort_particles(&backend);
        system.generate_bvh(&backend, 3);

        let records: Vec<SortingRecord> =
            download_buffer(&backend, &system.scratch.sorting_data, 0, 8).unwrap();
        for i in 1..records.len() {
            assert!(
                records[i - 1].sorting_data < records[i].sorting_data,
                "keys not strictly increasing at index {}",
                i
            );
        }
        // the two former duplicates sit next to each other and differ by 1
        assert_eq!(records[2].sorting_data, records[1].sorting_data + 1);

        // the tree finished and its links are reciprocal
        let nodes: Vec<BvhNode> =
            download_buffer(&backend, &system.scratch.bvh_nodes, 0, 5).unwrap();
        let root = 3usize;
        assert_eq!(nodes[root].parent_index, NO_NODE_INDEX);
        for (index, node) in nodes.iter().enumerate() {
            if index == root {
                continue;
            }
            let parent = &nodes[node.parent_index as usize];
            assert!(
                parent.left_child_index == index as i32
                    || parent.right_child_index == index as i32,
                "node {} not referenced by its parent",
                index
            );
        }

        // the duplicate leaves overlap but traversal terminated with both
        // finding the other
        let candidates: Vec<PotentialCollisions> = {
            system.detect_collisions(&backend, 3);
            download_buffer(&backend, &system.scratch.potential_collisions, 0, 3).unwrap()
        };
        let total: i32 = candidates.iter().map(|c| c.count).sum();
        assert!(total >= 2, "coincident particles should see each other");
    }

    #[test]
    fn test_bvh_over_collinear_particles_has_the_expected_root_box() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let radius = 0.02;
        let properties = [ParticleProperties::new(1.0, radius)];
        let mut particles = Particles::new(&backend, 4, &properties).unwrap();

        // already in Morton order along the x axis
        let positions = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.1, 0.0),
            Vec2::new(0.2, 0.0),
            Vec2::new(0.3, 0.0),
        ];
        particles.spawn(&backend, &spawn_at(&positions)).unwrap();

        let diagnostics = make_diagnostics(&backend);
        let mut system = ParticleCollisions::new(&backend, &particles, &diagnostics).unwrap();
        system.sort_particles(&backend);

        // ascending Morton keys means the input order survives the sort
        let records: Vec<SortingRecord> =
            download_buffer(&backend, &system.scratch.sorting_data, 0, 4).unwrap();
        let order: Vec<i32> = records.iter().map(|r| r.pre_sorted_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);

        system.generate_bvh(&backend, 4);

        let nodes: Vec<BvhNode> =
            download_buffer(&backend, &system.scratch.bvh_nodes, 0, 7).unwrap();

        // every leaf box is position +- radius
        for leaf in 0..4 {
            let expected = positions[leaf];
            assert!(approx_eq(nodes[leaf].box_min[0], expected.x - radius, 1.0e-6));
            assert!(approx_eq(nodes[leaf].box_max[0], expected.x + radius, 1.0e-6));
        }

        // the root spans all four particles
        let root_box = nodes[4].bounding_box();
        assert!(approx_eq(root_box.min.x, -radius, 1.0e-6));
        assert!(approx_eq(root_box.max.x, 0.3 + radius, 1.0e-6));
        assert!(approx_eq(root_box.min.y, -radius, 1.0e-6));
        assert!(approx_eq(root_box.max.y, radius, 1.0e-6));

        // every internal box is the union of its children's boxes
        for node in nodes.iter().skip(4) {
            let left = nodes[node.left_child_index as usize].bounding_box();
            let right = nodes[node.right_child_index as usize].bounding_box();
            assert_eq!(node.bounding_box(), left.union(&right));
        }
    }

    #[test]
    fn test_head_on_equal_mass_collision_swaps_velocities() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let properties = [ParticleProperties::new(1.0, 0.02)];
        let mut particles = Particles::new(&backend, 2, &properties).unwrap();

        // touching and moving toward each other
        particles
            .spawn(
                &backend,
                &[
                    ParticleInitData {
                        position: Vec2::new(-0.01, 0.0),
                        velocity: Vec2::new(1.0, 0.0),
                        particle_type_index: 0,
                    },
                    ParticleInitData {
                        position: Vec2::new(0.01, 0.0),
                        velocity: Vec2::new(-1.0, 0.0),
                        particle_type_index: 0,
                    },
                ],
            )
            .unwrap();

        let diagnostics = make_diagnostics(&backend);
        let mut system = ParticleCollisions::new(&backend, &particles, &diagnostics).unwrap();
        let mut timings = StageTimings::default();
        system
            .detect_and_resolve(&backend, 2, false, &mut timings)
            .unwrap();

        let resolved: Vec<Particle> = download_buffer(&backend, particles.buffer(), 0, 2).unwrap();
        let left = resolved.iter().find(|p| p.curr_pos().x < 0.0).unwrap();
        let right = resolved.iter().find(|p| p.curr_pos().x > 0.0).unwrap();

        // equal masses head-on: the velocities swap
        assert!(approx_eq(left.velocity().x, -1.0, 1.0e-4));
        assert!(approx_eq(left.velocity().y, 0.0, 1.0e-4));
        assert!(approx_eq(right.velocity().x, 1.0, 1.0e-4));
        assert!(approx_eq(right.velocity().y, 0.0, 1.0e-4));

        // kinetic energy is preserved
        let energy: f32 = resolved.iter().map(|p| p.velocity().length_squared()).sum();
        assert!(approx_eq(energy, 2.0, 1.0e-4));
    }
}
