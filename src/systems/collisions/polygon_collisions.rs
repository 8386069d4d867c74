use std::time::Instant;

use anyhow::{bail, Result};
use vulkano::{buffer::Subbuffer, descriptor_set::WriteDescriptorSet};

use crate::core::{BvhNode, CollidablePolygons, FrameDiagnostics, Particles};
use crate::systems::simulation::StageTimings;
use crate::utils::{GpuTaskExecutor, VulkanoHeadlessBackend};

use super::{
    tasks::{
        padded_scan_item_count, CopyPolygonsConstants, CopyPolygonsTask,
        DetectPolygonCollisionsConstants, DetectPolygonCollisionsTask,
        GenerateBinaryRadixTreeConstants, GenerateBinaryRadixTreeTask,
        GeneratePolygonLeafBoxesConstants, GeneratePolygonLeafBoxesTask,
        GeneratePolygonSortingDataConstants, GeneratePolygonSortingDataTask,
        GuaranteeUniquenessConstants, GuaranteeUniquenessTask, MergeBoundingVolumesConstants,
        MergeBoundingVolumesTask, PrefixScanStage1Constants, PrefixScanStage1Task,
        PrefixScanStage2Constants, PrefixScanStage2Task, PrefixScanStage3Constants,
        PrefixScanStage3Task, ResolvePolygonCollisionsConstants, ResolvePolygonCollisionsTask,
        SortPolygonsConstants, SortPolygonsTask, SortSortingDataConstants, SortSortingDataTask,
        MAX_SORTABLE_ENTITIES, PREFIX_SCAN_ITEMS_PER_WORK_GROUP, TOTAL_SORTING_BITS,
    },
    CollisionScratchBuffers,
};

/// Particle-polygon collision pipeline.  Structurally the same machinery as
/// the particle pipeline, but the geometry never moves, so the sort and the
/// BVH build run exactly once in the constructor; per frame only the
/// detection query and the first-hit reflection remain.
pub(crate) struct PolygonCollisions {
    num_polygons: u32,
    root_node_index: u32,
    scratch: CollisionScratchBuffers,

    detect_task: DetectPolygonCollisionsTask,
    resolve_task: ResolvePolygonCollisionsTask,
}

impl PolygonCollisions {
    pub fn new(
        backend: &VulkanoHeadlessBackend,
        polygons: &CollidablePolygons,
        particles: &Particles,
        diagnostics: &Subbuffer<[FrameDiagnostics]>,
    ) -> Result<Self> {
        let num_polygons = polygons.count();
        if num_polygons == 0 {
            bail!("the polygon collision system needs at least one polygon");
        }
        if num_polygons > MAX_SORTABLE_ENTITIES {
            bail!(
                "polygon count {} exceeds the sortable maximum {}",
                num_polygons,
                MAX_SORTABLE_ENTITIES
            );
        }

        let scratch =
            CollisionScratchBuffers::new(backend, num_polygons, particles.max_particles())?;
        build_static_bvh(backend, polygons, &scratch)?;

        let root_node_index = if num_polygons > 1 { num_polygons } else { 0 };

        let device = backend.device();
        let dsa = backend.descriptor_set_allocator();
        let detect_task = DetectPolygonCollisionsTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, scratch.bvh_nodes.clone()),
                WriteDescriptorSet::buffer(2, scratch.potential_collisions.clone()),
                WriteDescriptorSet::buffer(3, diagnostics.clone()),
            ],
        )?;
        let resolve_task = ResolvePolygonCollisionsTask::new(
            device,
            dsa,
            [
                WriteDescriptorSet::buffer(0, particles.buffer().clone()),
                WriteDescriptorSet::buffer(1, polygons.buffer().clone()),
                WriteDescriptorSet::buffer(2, scratch.potential_collisions.clone()),
                WriteDescriptorSet::buffer(3, diagnostics.clone()),
            ],
        )?;

        Ok(Self {
            num_polygons,
            root_node_index,
            scratch,
            detect_task,
            resolve_task,
        })
    }

    pub fn num_polygons(&self) -> u32 {
        self.num_polygons
    }

    pub fn bvh_nodes(&self) -> &Subbuffer<[BvhNode]> {
        &self.scratch.bvh_nodes
    }

    /// Per-frame query: every active particle sweeps its motion segment
    /// against the static BVH, then reflects at its first hit.  Runs after
    /// particle-particle resolution so the geometry has the final say on
    /// positions.
    pub fn detect_and_resolve(
        &mut self,
        backend: &VulkanoHeadlessBackend,
        num_active: u32,
        delta_time: f32,
        with_profiling: bool,
        timings: &mut StageTimings,
    ) -> Result<()> {
        if num_active == 0 {
            return Ok(());
        }

        let start = Instant::now();

        self.detect_task
            .set_constants(DetectPolygonCollisionsConstants::new(
                num_active,
                self.root_node_index,
            ));
        backend.execute(&mut self.detect_task);

        self.resolve_task
            .set_constants(ResolvePolygonCollisionsConstants::new(num_active, delta_time));
        backend.execute(&mut self.resolve_task);

        if with_profiling {
            timings.polygon_collisions_us = start.elapsed().as_micros();
        }

        Ok(())
    }
}

/// One-time construction of the static geometry BVH: the same
/// copy/key/sort/uniqueness/leaf/tree/merge sequence the particles run per
/// frame, executed once over the polygon centroids.  The tasks only live
/// for the duration of the build.
fn build_static_bvh(
    backend: &VulkanoHeadlessBackend,
    polygons: &CollidablePolygons,
    scratch: &CollisionScratchBuffers,
) -> Result<()> {
    let m = polygons.count();
    let device = backend.device();
    let dsa = backend.descriptor_set_allocator();

    let mut copy_task = CopyPolygonsTask::new(
        device,
        dsa,
        [WriteDescriptorSet::buffer(0, polygons.buffer().clone())],
    )?;
    let mut generate_sorting_data_task = GeneratePolygonSortingDataTask::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, polygons.buffer().clone()),
            WriteDescriptorSet::buffer(1, scratch.sorting_data.clone()),
        ],
    )?;
    let mut prefix_scan_stage1_task = PrefixScanStage1Task::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
            WriteDescriptorSet::buffer(1, scratch.prefix_scan.clone()),
        ],
    )?;
    let mut prefix_scan_stage2_task = PrefixScanStage2Task::new(
        device,
        dsa,
        [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
    )?;
    let mut prefix_scan_stage3_task = PrefixScanStage3Task::new(
        device,
        dsa,
        [WriteDescriptorSet::buffer(0, scratch.prefix_scan.clone())],
    )?;
    let mut sort_sorting_data_task = SortSortingDataTask::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
            WriteDescriptorSet::buffer(1, scratch.prefix_scan.clone()),
        ],
    )?;
    let mut sort_polygons_task = SortPolygonsTask::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, polygons.buffer().clone()),
            WriteDescriptorSet::buffer(1, scratch.sorting_data.clone()),
        ],
    )?;
    let mut guarantee_uniqueness_task = GuaranteeUniquenessTask::new(
        device,
        dsa,
        [WriteDescriptorSet::buffer(0, scratch.sorting_data.clone())],
    )?;
    let mut generate_leaf_boxes_task = GeneratePolygonLeafBoxesTask::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, polygons.buffer().clone()),
            WriteDescriptorSet::buffer(1, scratch.bvh_nodes.clone()),
        ],
    )?;
    let mut generate_tree_task = GenerateBinaryRadixTreeTask::new(
        device,
        dsa,
        [
            WriteDescriptorSet::buffer(0, scratch.sorting_data.clone()),
            WriteDescriptorSet::buffer(1, scratch.bvh_nodes.clone()),
        ],
    )?;
    let mut merge_volumes_task = MergeBoundingVolumesTask::new(
        device,
        dsa,
        [WriteDescriptorSet::buffer(0, scratch.bvh_nodes.clone())],
    )?;

    copy_task.set_constants(CopyPolygonsConstants::new(m));
    backend.execute(&mut copy_task);
    generate_sorting_data_task.set_constants(GeneratePolygonSortingDataConstants::new(m));
    backend.execute(&mut generate_sorting_data_task);

    let mut read_offset = 0;
    let mut write_offset = m;
    for bit_number in 0..TOTAL_SORTING_BITS {
        prefix_scan_stage1_task.set_constants(PrefixScanStage1Constants::new(
            m,
            read_offset,
            bit_number,
        ));
        backend.execute(&mut prefix_scan_stage1_task);

        let num_scan_groups = m.div_ceil(PREFIX_SCAN_ITEMS_PER_WORK_GROUP);
        prefix_scan_stage2_task.set_constants(PrefixScanStage2Constants::new(num_scan_groups));
        backend.execute(&mut prefix_scan_stage2_task);

        prefix_scan_stage3_task
            .set_constants(PrefixScanStage3Constants::new(padded_scan_item_count(m)));
        backend.execute(&mut prefix_scan_stage3_task);

        sort_sorting_data_task.set_constants(SortSortingDataConstants::new(
            m,
            read_offset,
            write_offset,
            bit_number,
        ));
        backend.execute(&mut sort_sorting_data_task);
        std::mem::swap(&mut read_offset, &mut write_offset);
    }

    sort_polygons_task.set_constants(SortPolygonsConstants::new(m, read_offset));
    backend.execute(&mut sort_polygons_task);

    guarantee_uniqueness_task.set_constants(GuaranteeUniquenessConstants::new(m, 0));
    backend.execute(&mut guarantee_uniqueness_task);

    generate_leaf_boxes_task.set_constants(GeneratePolygonLeafBoxesConstants::new(m));
    backend.execute(&mut generate_leaf_boxes_task);

    // a single polygon is its own (leaf) root; there is no tree to build
    if m > 1 {
        generate_tree_task.set_constants(GenerateBinaryRadixTreeConstants::new(m, 0));
        backend.execute(&mut generate_tree_task);

        merge_volumes_task.set_constants(MergeBoundingVolumesConstants::new(m));
        backend.execute(&mut merge_volumes_task);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use vulkano::buffer::{Buffer, BufferCreateInfo, BufferUsage};
    use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter};

    use super::*;
    use crate::core::{ParticleProperties, PolygonFace, NO_NODE_INDEX};
    use crate::utils::download_buffer;

    fn wall(x: f32) -> PolygonFace {
        PolygonFace::new(
            Vec2::new(x, -1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(x, 1.0),
            Vec2::new(-1.0, 0.0),
        )
    }

    #[test]
    fn test_static_bvh_covers_all_polygons() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let properties = [ParticleProperties::new(1.0, 0.02)];
        let particles = Particles::new(&backend, 16, &properties).unwrap();
        let faces = [wall(-0.5), wall(0.0), wall(0.5)];
        let polygons = CollidablePolygons::new(&backend, &faces).unwrap();
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
        .unwrap();

        let system = PolygonCollisions::new(&backend, &polygons, &particles, &diagnostics).unwrap();
        assert_eq!(system.num_polygons(), 3);
        assert_eq!(system.root_node_index, 3);

        let nodes: Vec<BvhNode> = download_buffer(&backend, system.bvh_nodes(), 0, 5).unwrap();

        // root box spans every wall
        let root = nodes[3].bounding_box();
        assert!(root.min.x <= -0.5 && root.max.x >= 0.5);
        assert!(root.min.y <= -1.0 && root.max.y >= 1.0);
        assert_eq!(nodes[3].parent_index, NO_NODE_INDEX);

        // reciprocal links everywhere else
        for (index, node) in nodes.iter().enumerate() {
            if index == 3 {
                continue;
            }
            let parent = &nodes[node.parent_index as usize];
            assert!(
                parent.left_child_index == index as i32
                    || parent.right_child_index == index as i32
            );
        }

        // each leaf carries a usable polygon index
        for leaf in nodes.iter().take(3) {
            assert_eq!(leaf.is_leaf, 1);
            assert!(leaf.data_index >= 0 && leaf.data_index < 3);
        }
    }

    #[test]
    fn test_single_polygon_scene_skips_the_tree() {
        let backend = VulkanoHeadlessBackend::new().unwrap();
        let properties = [ParticleProperties::new(1.0, 0.02)];
        let particles = Particles::new(&backend, 4, &properties).unwrap();
        let polygons = CollidablePolygons::new(&backend, &[wall(0.0)]).unwrap();
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
        .unwrap();

        let system = PolygonCollisions::new(&backend, &polygons, &particles, &diagnostics).unwrap();

        // the lone leaf doubles as the traversal root
        assert_eq!(system.root_node_index, 0);
        let nodes: Vec<BvhNode> = download_buffer(&backend, system.bvh_nodes(), 0, 1).unwrap();
        assert_eq!(nodes[0].is_leaf, 1);
        assert_eq!(nodes[0].data_index, 0);
    }
}
