/// CullableBatch: per-frame visibility, LOD and draw-order for one batch.
///
/// Owns the registry, the candidate strategy, the pooled render list and the
/// flat draw arrays. Every registry mutation goes through the batch so the
/// strategy (and its BVH, once computed) stays in sync.
///
/// `perform_culling` picks one of four paths:
///
/// ```text
/// nothing changed, no culling, no sorting → skip (arrays stay valid)
/// no culling, no sorting                 → update_index_array
/// no culling, sorting                    → every drawable instance, sorted
/// culling                                → strategy candidates → LOD → filter
///                                          → occlusion → sorted or direct
/// ```

use glam::{Mat4, Vec3};
use crate::bvh::{BatchBvh, BvhConfig, BvhItem};
use crate::camera::Camera;
use crate::error::Result;
use crate::math::Ray;
use crate::registry::{BatchDesc, BatchRegistry, GeometryDesc};
use crate::render_list::{RenderList, SortStrategy};
use super::draw_list::MultiDrawList;
use super::occlusion::{Occluder, OcclusionConfig, OcclusionState};
use super::strategy::{BvhStrategy, CullingStrategy, LinearStrategy};

const SOURCE: &str = "galaxy3d::Culling";

/// Per-instance visibility predicate: `(instance, camera, lod_camera, lod_index)`.
///
/// `lod_index` is only given when the geometry has LOD levels and sorting
/// is off. Returning `false` drops the instance for this frame.
pub type FrustumFilter = Box<dyn FnMut(u32, &Camera, &Camera, Option<usize>) -> bool + Send + Sync>;

/// Culling and ordering options.
#[derive(Debug)]
pub struct CullingConfig {
    /// Test each instance against the frustum
    pub per_object_culling: bool,
    /// Order draws by view depth
    pub sort_objects: bool,
    /// Back-to-front instead of front-to-back
    pub transparent: bool,
    pub sort_strategy: SortStrategy,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            per_object_culling: true,
            sort_objects: true,
            transparent: false,
            sort_strategy: SortStrategy::Comparison,
        }
    }
}

/// Counters of the last culling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullingStats {
    /// Instances handed to LOD resolution
    pub candidates: u32,
    /// Rejected by the filter
    pub filtered: u32,
    /// Rejected by occlusion
    pub occluded: u32,
    /// Draws written
    pub drawn: u32,
}

/// One instance hit by `CullableBatch::raycast`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub instance_id: u32,
    pub geometry_id: u32,
    /// Ray parameter where the instance's box is entered
    pub distance: f32,
}

/// Camera data expressed in the batch's local space, rebuilt every pass.
struct FrameState {
    camera_position: Vec3,
    camera_lod_position: Vec3,
    forward: Vec3,
}

impl FrameState {
    fn new(world: &Mat4, camera: &Camera, camera_lod: &Camera) -> Self {
        let inverse_world = world.inverse();
        Self {
            camera_position: inverse_world.transform_point3(camera.position()),
            camera_lod_position: inverse_world.transform_point3(camera_lod.position()),
            forward: inverse_world.transform_vector3(camera.forward()).normalize_or_zero(),
        }
    }

    #[inline]
    fn depth(&self, point: Vec3) -> f32 {
        (point - self.camera_position).dot(self.forward)
    }
}

pub struct CullableBatch {
    registry: BatchRegistry,
    world_matrix: Mat4,
    config: CullingConfig,
    strategy: Box<dyn CullingStrategy>,
    render_list: RenderList,
    draw_list: MultiDrawList,
    filter: Option<FrustumFilter>,
    occlusion: Option<OcclusionState>,
    stats: CullingStats,
}

impl CullableBatch {
    pub fn new(desc: BatchDesc) -> Self {
        Self::with_config(desc, CullingConfig::default())
    }

    pub fn with_config(desc: BatchDesc, config: CullingConfig) -> Self {
        let capacity = desc.max_instance_count as usize;
        Self {
            registry: BatchRegistry::new(desc),
            world_matrix: Mat4::IDENTITY,
            config,
            strategy: Box::new(LinearStrategy::new()),
            render_list: RenderList::new(),
            draw_list: MultiDrawList::with_capacity(capacity),
            filter: None,
            occlusion: None,
            stats: CullingStats::default(),
        }
    }

    // ============================================================================
    // GETTERS
    // ============================================================================

    pub fn registry(&self) -> &BatchRegistry {
        &self.registry
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Output of the last culling pass
    pub fn draw_list(&self) -> &MultiDrawList {
        &self.draw_list
    }

    pub fn stats(&self) -> &CullingStats {
        &self.stats
    }

    pub fn bvh(&self) -> Option<&BatchBvh> {
        self.strategy.bvh()
    }

    /// Name of the active candidate strategy ("linear" or "bvh")
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    // ============================================================================
    // CONFIGURATION
    // ============================================================================

    pub fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
    }

    pub fn set_per_object_culling(&mut self, enabled: bool) {
        self.config.per_object_culling = enabled;
        self.registry.mark_visibility_changed();
    }

    pub fn set_sort_objects(&mut self, enabled: bool) {
        self.config.sort_objects = enabled;
        self.registry.mark_visibility_changed();
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.config.transparent = transparent;
    }

    pub fn set_sort_strategy(&mut self, strategy: SortStrategy) {
        self.config.sort_strategy = strategy;
    }

    pub fn set_filter(&mut self, filter: Option<FrustumFilter>) {
        self.filter = filter;
    }

    /// Enable occlusion rejection. Only occludable instances are tested.
    pub fn set_occlusion(&mut self, config: OcclusionConfig, occluder: Option<Box<dyn Occluder>>) {
        self.occlusion = Some(OcclusionState::new(config, occluder));
    }

    pub fn clear_occlusion(&mut self) {
        self.occlusion = None;
    }

    pub fn occlusion_config(&self) -> Option<&OcclusionConfig> {
        self.occlusion.as_ref().map(|o| o.config())
    }

    /// Build a BVH over every active instance and switch to BVH culling.
    ///
    /// Later instance changes are applied to the tree incrementally.
    pub fn compute_bvh(&mut self, config: BvhConfig) {
        let strategy = BvhStrategy::new(&self.registry, config);
        crate::engine_info!(
            SOURCE,
            "BVH culling enabled: {} instances, margin {}",
            strategy.bvh().map_or(0, |bvh| bvh.len()),
            config.margin
        );
        self.strategy = Box::new(strategy);
    }

    /// Drop the BVH and go back to linear culling.
    pub fn remove_bvh(&mut self) {
        if self.strategy.bvh().is_some() {
            crate::engine_info!(SOURCE, "BVH culling disabled");
        }
        self.strategy = Box::new(LinearStrategy::new());
    }

    // ============================================================================
    // REGISTRY MUTATIONS
    // ============================================================================

    pub fn add_geometry(&mut self, desc: &GeometryDesc) -> Result<u32> {
        self.registry.add_geometry(desc)
    }

    pub fn add_geometry_lod(
        &mut self,
        geometry_id: u32,
        indices: &[u32],
        distance: f32,
        hysteresis: f32,
    ) -> Result<usize> {
        self.registry.add_geometry_lod(geometry_id, indices, distance, hysteresis)
    }

    pub fn add_instance(&mut self, geometry_id: u32) -> Result<u32> {
        let id = self.registry.add_instance(geometry_id)?;
        if let Some(occlusion) = &mut self.occlusion {
            occlusion.forget(id);
        }
        if let Some(aabb) = self.registry.bounding_box_at(id) {
            self.strategy.instance_added(id, aabb);
        }
        Ok(id)
    }

    /// Add one instance per matrix, all of `geometry_id`.
    ///
    /// Fails without adding anything if the batch cannot hold them all.
    pub fn add_instances(&mut self, geometry_id: u32, matrices: &[Mat4]) -> Result<Vec<u32>> {
        if self.registry.geometry(geometry_id).is_none() {
            crate::engine_bail!(SOURCE, "Unknown geometry id {}", geometry_id);
        }
        let free = self.registry.max_instance_count() - self.registry.instance_count();
        if matrices.len() > free as usize {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "{} instances requested, {} free",
                matrices.len(),
                free
            ));
        }

        let mut ids = Vec::with_capacity(matrices.len());
        let mut items = Vec::with_capacity(matrices.len());
        for matrix in matrices {
            let id = self.registry.add_instance(geometry_id)?;
            self.registry.set_matrix_at(id, *matrix)?;
            if let Some(occlusion) = &mut self.occlusion {
                occlusion.forget(id);
            }
            if let Some(aabb) = self.registry.bounding_box_at(id) {
                items.push(BvhItem::new(id, aabb));
            }
            ids.push(id);
        }
        self.strategy.instances_added(&items);
        Ok(ids)
    }

    pub fn delete_instance(&mut self, instance_id: u32) -> Result<()> {
        self.registry.delete_instance(instance_id)?;
        self.strategy.instance_removed(instance_id);
        Ok(())
    }

    pub fn set_matrix_at(&mut self, instance_id: u32, matrix: Mat4) -> Result<()> {
        self.registry.set_matrix_at(instance_id, matrix)?;
        if let Some(aabb) = self.registry.bounding_box_at(instance_id) {
            self.strategy.instance_moved(instance_id, aabb);
        }
        Ok(())
    }

    pub fn set_visible_at(&mut self, instance_id: u32, visible: bool) -> Result<()> {
        self.registry.set_visible_at(instance_id, visible)
    }

    pub fn set_occludable_at(&mut self, instance_id: u32, occludable: bool) -> Result<()> {
        self.registry.set_occludable_at(instance_id, occludable)
    }

    pub fn init_skinning(&mut self, bone_count: usize, bind_matrix: Mat4) -> Result<()> {
        self.registry.init_skinning(bone_count, bind_matrix)
    }

    pub fn set_bones_at(
        &mut self,
        instance_id: u32,
        bone_world: &[Mat4],
        bone_inverse: &[Mat4],
    ) -> Result<()> {
        self.registry.set_bones_at(instance_id, bone_world, bone_inverse)
    }

    // ============================================================================
    // CULLING
    // ============================================================================

    /// Rebuild the draw list for `camera`.
    ///
    /// `camera_lod` is the reference for LOD distances (default: `camera`).
    pub fn perform_culling(&mut self, camera: &Camera, camera_lod: Option<&Camera>) {
        let culling = self.config.per_object_culling;
        let sorting = self.config.sort_objects;

        if !self.registry.visibility_changed() && !culling && !sorting {
            return;
        }
        self.registry.clear_visibility_changed();

        if !culling && !sorting {
            self.update_index_array();
            return;
        }

        self.stats = CullingStats::default();
        let camera_lod = camera_lod.unwrap_or(camera);
        let frame = FrameState::new(&self.world_matrix, camera, camera_lod);

        if culling {
            self.draw_list.clear();
            self.cull(&frame, camera, camera_lod);
        } else {
            self.update_render_list(&frame);
        }

        if sorting {
            let bytes_per_element = self.registry.index_format().bytes_per_element();
            self.render_list.sort(&self.config.sort_strategy, self.config.transparent);
            self.draw_list.fill_from(self.render_list.items(), bytes_per_element);
            self.render_list.reset();
        }

        self.stats.drawn = self.draw_list.count() as u32;
        crate::engine_trace!(
            SOURCE,
            "Culling ({}): {} candidates, {} filtered, {} occluded, {} drawn",
            if culling { self.strategy.name() } else { "none" },
            self.stats.candidates,
            self.stats.filtered,
            self.stats.occluded,
            self.stats.drawn
        );
    }

    /// Fill the draw list with every drawable instance in slot order, base
    /// draw ranges, no culling.
    pub fn update_index_array(&mut self) {
        let bytes_per_element = self.registry.index_format().bytes_per_element();
        let geometries = self.registry.geometries();

        self.draw_list.clear();
        for (i, instance) in self.registry.instances().iter().enumerate() {
            if !instance.is_drawable() {
                continue;
            }
            let Some(geometry) = geometries.get(instance.geometry_index as usize) else {
                continue;
            };
            self.draw_list.push(
                geometry.draw_start() * bytes_per_element,
                geometry.draw_count(),
                i as u32,
            );
        }

        let drawn = self.draw_list.count() as u32;
        self.stats = CullingStats { candidates: drawn, drawn, ..Default::default() };
    }

    /// Push every drawable instance with its depth, base draw ranges.
    fn update_render_list(&mut self, frame: &FrameState) {
        let geometries = self.registry.geometries();

        for (i, instance) in self.registry.instances().iter().enumerate() {
            if !instance.is_drawable() {
                continue;
            }
            let id = i as u32;
            let (Some(geometry), Some(position)) = (
                geometries.get(instance.geometry_index as usize),
                self.registry.position_at(id),
            ) else {
                continue;
            };
            self.stats.candidates += 1;
            self.render_list.push(
                id,
                frame.depth(position),
                geometry.draw_start(),
                geometry.draw_count(),
            );
        }
    }

    fn cull(&mut self, frame: &FrameState, camera: &Camera, camera_lod: &Camera) {
        let matrix = *camera.projection_matrix() * *camera.view_matrix() * self.world_matrix;
        let sorting = self.config.sort_objects;
        let bytes_per_element = self.registry.index_format().bytes_per_element();
        let camera_world_position = camera.position();

        let Self {
            registry,
            world_matrix,
            strategy,
            render_list,
            draw_list,
            filter,
            occlusion,
            stats,
            ..
        } = self;

        if let Some(occlusion) = occlusion.as_mut() {
            occlusion.begin_frame();
        }

        let registry: &BatchRegistry = registry;
        let instances = registry.instances();
        let geometries = registry.geometries();

        strategy.cull(registry, &matrix, &mut |id, reference| {
            let Some(instance) = instances.get(id as usize) else {
                return;
            };
            let Some(geometry) = geometries.get(instance.geometry_index as usize) else {
                return;
            };
            stats.candidates += 1;

            let (start, count, lod_index) = match geometry.lod() {
                Some(lod) => {
                    let index = lod.resolve(reference.distance_squared(frame.camera_lod_position));
                    let level = lod.levels()[index];
                    (level.start, level.count, Some(index))
                }
                None => (geometry.draw_start(), geometry.draw_count(), None),
            };

            if let Some(filter) = filter.as_mut() {
                let lod_arg = if sorting { None } else { lod_index };
                if !filter(id, camera, camera_lod, lod_arg) {
                    stats.filtered += 1;
                    return;
                }
            }

            if let Some(occlusion) = occlusion.as_mut() {
                if instance.is_occludable() {
                    let occluded = registry.bounding_sphere_at(id).is_some_and(|sphere| {
                        let world_sphere = sphere.transformed(world_matrix);
                        occlusion.is_occluded(id, camera_world_position, &world_sphere)
                    });
                    if occluded {
                        stats.occluded += 1;
                        return;
                    }
                }
            }

            if sorting {
                render_list.push(id, frame.depth(reference), start, count);
            } else {
                draw_list.push(start * bytes_per_element, count, id);
            }
        });
    }

    // ============================================================================
    // RAYCAST
    // ============================================================================

    /// Instances whose bounding box the world-space ray crosses within
    /// `[near, far]`, nearest first.
    pub fn raycast(&self, ray: &Ray, near: f32, far: f32) -> Vec<RaycastHit> {
        let mut hits = Vec::new();
        if self.registry.instance_count() == 0 {
            return hits;
        }

        let local_ray = ray.transformed(&self.world_matrix.inverse());
        let registry = &self.registry;

        self.strategy.raycast(registry, &local_ray, near, far, &mut |id| {
            let Some(instance) = registry.instance(id) else {
                return;
            };
            if !instance.is_drawable() {
                return;
            }
            let Some(aabb) = registry.bounding_box_at(id) else {
                return;
            };
            if let Some(distance) = local_ray.intersect_aabb(&aabb, near, far) {
                hits.push(RaycastHit {
                    instance_id: id,
                    geometry_id: instance.geometry_index,
                    distance,
                });
            }
        });

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
