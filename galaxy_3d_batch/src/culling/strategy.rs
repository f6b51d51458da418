/// Candidate producers for the culled path.
///
/// A strategy turns the registry and a clip matrix into the list of
/// instances that may be visible, and a local-space ray into the instances
/// it may hit. `LinearStrategy` scans every instance; `BvhStrategy` queries
/// a `BatchBvh` that it keeps in sync through the instance hooks.

use glam::{Mat4, Vec3};
use crate::bvh::{BatchBvh, BvhConfig, BvhItem};
use crate::camera::Frustum;
use crate::math::{AABB, BoundingSphere, Ray};
use crate::registry::BatchRegistry;

/// Visibility candidate producer.
///
/// Instance ids are batch slots. The point handed to the cull visitor is
/// the one used for LOD distance and depth sorting, in batch-local space.
pub trait CullingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Visit every visible instance that may intersect the frustum of
    /// `matrix` (projection * view * batch world).
    fn cull(&self, registry: &BatchRegistry, matrix: &Mat4, visitor: &mut dyn FnMut(u32, Vec3));

    /// Visit every active instance the local-space ray may hit within
    /// `[near, far]`.
    fn raycast(
        &self,
        registry: &BatchRegistry,
        ray: &Ray,
        near: f32,
        far: f32,
        visitor: &mut dyn FnMut(u32),
    );

    fn instance_added(&mut self, _id: u32, _aabb: AABB) {}

    fn instances_added(&mut self, _items: &[BvhItem]) {}

    fn instance_moved(&mut self, _id: u32, _aabb: AABB) {}

    fn instance_removed(&mut self, _id: u32) {}

    fn bvh(&self) -> Option<&BatchBvh> {
        None
    }
}

// ============================================================================
// LINEAR
// ============================================================================

/// Per-instance sphere test against the frustum.
pub struct LinearStrategy;

impl LinearStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Batch-local bounding sphere of an instance.
    ///
    /// Geometry spheres centered on the origin only need the instance
    /// position and largest scale; others are fully transformed.
    fn instance_sphere(registry: &BatchRegistry, id: u32, geometry: &BoundingSphere) -> Option<BoundingSphere> {
        if geometry.is_centered() {
            let (position, max_scale) = registry.position_and_max_scale_at(id)?;
            Some(BoundingSphere::new(position, geometry.radius * max_scale))
        } else {
            registry.matrix_at(id).map(|matrix| geometry.transformed(matrix))
        }
    }
}

impl Default for LinearStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CullingStrategy for LinearStrategy {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn cull(&self, registry: &BatchRegistry, matrix: &Mat4, visitor: &mut dyn FnMut(u32, Vec3)) {
        let frustum = Frustum::from_view_projection(matrix);
        let geometries = registry.geometries();

        for (i, instance) in registry.instances().iter().enumerate() {
            if !instance.is_drawable() {
                continue;
            }
            let id = i as u32;
            let Some(geometry) = geometries.get(instance.geometry_index as usize) else {
                continue;
            };
            let Some(sphere) = Self::instance_sphere(registry, id, geometry.bounding_sphere()) else {
                continue;
            };
            if frustum.intersects_sphere(&sphere) {
                visitor(id, sphere.center);
            }
        }
    }

    fn raycast(
        &self,
        registry: &BatchRegistry,
        ray: &Ray,
        _near: f32,
        _far: f32,
        visitor: &mut dyn FnMut(u32),
    ) {
        for (i, instance) in registry.instances().iter().enumerate() {
            if !instance.is_active() {
                continue;
            }
            let id = i as u32;
            let hit = registry
                .bounding_sphere_at(id)
                .is_some_and(|sphere| ray.intersect_sphere(&sphere).is_some() || sphere.contains_point(ray.origin));
            if hit {
                visitor(id);
            }
        }
    }
}

// ============================================================================
// BVH
// ============================================================================

/// Frustum and ray queries through a `BatchBvh` over all active instances.
pub struct BvhStrategy {
    bvh: BatchBvh,
}

impl BvhStrategy {
    /// Build the tree from every active instance of `registry`.
    pub fn new(registry: &BatchRegistry, config: BvhConfig) -> Self {
        let items: Vec<BvhItem> = registry
            .instances()
            .iter()
            .enumerate()
            .filter(|(_, instance)| instance.is_active())
            .filter_map(|(i, _)| {
                let id = i as u32;
                registry.bounding_box_at(id).map(|aabb| BvhItem::new(id, aabb))
            })
            .collect();

        let mut bvh = BatchBvh::new(config);
        bvh.build(&items);
        Self { bvh }
    }
}

impl CullingStrategy for BvhStrategy {
    fn name(&self) -> &'static str {
        "bvh"
    }

    fn cull(&self, registry: &BatchRegistry, matrix: &Mat4, visitor: &mut dyn FnMut(u32, Vec3)) {
        let instances = registry.instances();
        self.bvh.frustum_culling(matrix, |id| {
            // Inactive instances are never in the tree
            let visible = instances.get(id as usize).is_some_and(|i| i.is_visible());
            if !visible {
                return;
            }
            if let Some(position) = registry.position_at(id) {
                visitor(id, position);
            }
        });
    }

    fn raycast(
        &self,
        _registry: &BatchRegistry,
        ray: &Ray,
        near: f32,
        far: f32,
        visitor: &mut dyn FnMut(u32),
    ) {
        self.bvh.raycast(ray, near, far, |id| visitor(id));
    }

    fn instance_added(&mut self, id: u32, aabb: AABB) {
        self.bvh.insert(id, aabb);
    }

    fn instances_added(&mut self, items: &[BvhItem]) {
        self.bvh.insert_range(items);
    }

    fn instance_moved(&mut self, id: u32, aabb: AABB) {
        self.bvh.update(id, aabb);
    }

    fn instance_removed(&mut self, id: u32) {
        self.bvh.remove(id);
    }

    fn bvh(&self) -> Option<&BatchBvh> {
        Some(&self.bvh)
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
