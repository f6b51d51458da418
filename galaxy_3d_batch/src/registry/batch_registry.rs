/// BatchRegistry: instance and geometry storage of one batch.
///
/// Owns the per-instance records and matrices, the per-geometry records,
/// the shared index buffer, and the bone store. Instance ids are dense
/// slots: deleting an instance leaves an inactive tombstone and the slot is
/// recycled by a later `add_instance`.
///
/// The registry knows nothing about culling. `CullableBatch` wraps it and
/// mirrors every mutation into its spatial index.

use glam::{Mat4, Vec3};
use crate::error::Result;
use crate::lod::LodLevels;
use crate::math::{AABB, BoundingSphere, max_scale_on_axis};
use crate::utils::SlotAllocator;
use super::geometry::{GeometryDesc, GeometryInfo};
use super::instance::{InstanceFlags, InstanceInfo};
use super::skeleton::BoneStore;

const SOURCE: &str = "galaxy3d::Registry";

/// Element type of the shared index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    U16,
    #[default]
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes
    pub fn bytes_per_element(&self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    /// Largest vertex count addressable by this format
    pub fn max_vertex_count(&self) -> u64 {
        match self {
            IndexFormat::U16 => u16::MAX as u64 + 1,
            IndexFormat::U32 => u32::MAX as u64 + 1,
        }
    }
}

/// Capacities of a batch, fixed at creation.
#[derive(Debug, Clone)]
pub struct BatchDesc {
    pub max_instance_count: u32,
    pub max_vertex_count: u32,
    pub max_index_count: u32,
    pub index_format: IndexFormat,
}

impl Default for BatchDesc {
    fn default() -> Self {
        Self {
            max_instance_count: 1024,
            max_vertex_count: 65_536,
            max_index_count: 262_144,
            index_format: IndexFormat::U32,
        }
    }
}

pub struct BatchRegistry {
    desc: BatchDesc,

    instances: Vec<InstanceInfo>,
    matrices: Vec<Mat4>,
    instance_ids: SlotAllocator,

    geometries: Vec<GeometryInfo>,
    indices: Vec<u32>,
    next_vertex_start: u32,
    next_index_start: u32,

    bones: BoneStore,

    /// Set by any change of the drawable set, cleared by the culling pass
    visibility_changed: bool,
}

impl BatchRegistry {
    pub fn new(desc: BatchDesc) -> Self {
        Self {
            instances: Vec::new(),
            matrices: Vec::new(),
            instance_ids: SlotAllocator::with_capacity(desc.max_instance_count),
            geometries: Vec::new(),
            indices: Vec::new(),
            next_vertex_start: 0,
            next_index_start: 0,
            bones: BoneStore::new(desc.max_instance_count),
            visibility_changed: false,
            desc,
        }
    }

    // ============================================================================
    // GEOMETRIES
    // ============================================================================

    /// Register a geometry and copy its indices into the shared index buffer.
    ///
    /// Indices are rebased by the geometry's vertex start. Returns the
    /// geometry id.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` for empty data, out-of-range indices or reserves
    ///   smaller than the data
    /// - `CapacityExceeded` when the batch's vertex or index capacity, or the
    ///   index format's addressable range, would be exceeded
    pub fn add_geometry(&mut self, desc: &GeometryDesc) -> Result<u32> {
        let vertex_count = desc.positions.len() as u32;
        let index_count = desc.indices.len() as u32;

        if vertex_count == 0 || index_count == 0 {
            crate::engine_bail!(
                SOURCE,
                "Geometry needs vertices and indices ({} vertices, {} indices)",
                vertex_count,
                index_count
            );
        }
        if let Some(&bad) = desc.indices.iter().find(|&&i| i >= vertex_count) {
            crate::engine_bail!(
                SOURCE,
                "Geometry index {} out of range for {} vertices",
                bad,
                vertex_count
            );
        }

        let reserved_vertex_count = desc.reserved_vertex_count.unwrap_or(vertex_count);
        let reserved_index_count = desc.reserved_index_count.unwrap_or(index_count);
        if reserved_vertex_count < vertex_count || reserved_index_count < index_count {
            crate::engine_bail!(
                SOURCE,
                "Reserved range [{} vertices, {} indices] smaller than geometry [{} vertices, {} indices]",
                reserved_vertex_count,
                reserved_index_count,
                vertex_count,
                index_count
            );
        }

        let vertex_end = self.next_vertex_start as u64 + reserved_vertex_count as u64;
        let index_end = self.next_index_start as u64 + reserved_index_count as u64;
        if vertex_end > self.desc.max_vertex_count as u64 {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "Vertex range [{}, {}) exceeds max_vertex_count {}",
                self.next_vertex_start,
                vertex_end,
                self.desc.max_vertex_count
            ));
        }
        if vertex_end > self.desc.index_format.max_vertex_count() {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "Vertex range [{}, {}) not addressable with {:?} indices",
                self.next_vertex_start,
                vertex_end,
                self.desc.index_format
            ));
        }
        if index_end > self.desc.max_index_count as u64 {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "Index range [{}, {}) exceeds max_index_count {}",
                self.next_index_start,
                index_end,
                self.desc.max_index_count
            ));
        }

        let vertex_start = self.next_vertex_start;
        let index_start = self.next_index_start;

        self.indices.resize(index_end as usize, 0);
        let dst = &mut self.indices[index_start as usize..(index_start + index_count) as usize];
        for (slot, &index) in dst.iter_mut().zip(desc.indices) {
            *slot = index + vertex_start;
        }

        let bounding_box = desc
            .bounding_box
            .unwrap_or_else(|| AABB::from_points(desc.positions));
        let bounding_sphere = desc
            .bounding_sphere
            .unwrap_or_else(|| BoundingSphere::from_points(desc.positions));

        self.geometries.push(GeometryInfo::new(
            vertex_start,
            vertex_count,
            reserved_vertex_count,
            index_start,
            index_count,
            reserved_index_count,
            bounding_box,
            bounding_sphere,
        ));
        self.next_vertex_start += reserved_vertex_count;
        self.next_index_start += reserved_index_count;

        let id = (self.geometries.len() - 1) as u32;
        crate::engine_debug!(
            SOURCE,
            "Geometry {} added: {} vertices, {} indices (reserved {})",
            id,
            vertex_count,
            index_count,
            reserved_index_count
        );
        Ok(id)
    }

    /// Append a LOD level to a geometry and copy its indices behind the
    /// previous level. Returns the new level's index.
    ///
    /// `indices` are local to the geometry, like in `add_geometry`.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the level does not fit in the geometry's
    ///   reserved index range; existing levels stay untouched
    /// - `InvalidResource` for an unknown geometry, out-of-range indices,
    ///   or a distance not beyond the previous level's
    pub fn add_geometry_lod(
        &mut self,
        geometry_id: u32,
        indices: &[u32],
        distance: f32,
        hysteresis: f32,
    ) -> Result<usize> {
        let geometry = self
            .geometries
            .get_mut(geometry_id as usize)
            .ok_or_else(|| crate::engine_err!(SOURCE, "Unknown geometry id {}", geometry_id))?;

        let vertex_count = geometry.vertex_count();
        if let Some(&bad) = indices.iter().find(|&&i| i >= vertex_count) {
            crate::engine_bail!(
                SOURCE,
                "LOD index {} out of range for geometry {} with {} vertices",
                bad,
                geometry_id,
                vertex_count
            );
        }

        let mut lod = geometry.lod().cloned().unwrap_or_else(|| {
            LodLevels::new(
                geometry.draw_start(),
                geometry.draw_count(),
                geometry.reserved_index_count(),
            )
        });
        let level = lod.push(indices.len() as u32, distance, hysteresis)?;

        let vertex_start = geometry.vertex_start();
        let start = level.start as usize;
        for (slot, &index) in self.indices[start..start + indices.len()].iter_mut().zip(indices) {
            *slot = index + vertex_start;
        }

        let level_index = lod.len() - 1;
        geometry.set_lod(lod);
        Ok(level_index)
    }

    pub fn geometry(&self, geometry_id: u32) -> Option<&GeometryInfo> {
        self.geometries.get(geometry_id as usize)
    }

    pub fn geometries(&self) -> &[GeometryInfo] {
        &self.geometries
    }

    /// Shared index buffer (indices already rebased by vertex start)
    pub fn index_buffer(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_format(&self) -> IndexFormat {
        self.desc.index_format
    }

    // ============================================================================
    // INSTANCES
    // ============================================================================

    /// Add an active, visible instance of `geometry_id` with an identity matrix.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` for an unknown geometry
    /// - `CapacityExceeded` when `max_instance_count` instances are live
    pub fn add_instance(&mut self, geometry_id: u32) -> Result<u32> {
        if geometry_id as usize >= self.geometries.len() {
            crate::engine_bail!(SOURCE, "Unknown geometry id {}", geometry_id);
        }

        let id = self.instance_ids.alloc().ok_or_else(|| {
            crate::engine_capacity_err!(
                SOURCE,
                "Instance capacity {} reached",
                self.desc.max_instance_count
            )
        })?;

        let info = InstanceInfo::new(geometry_id);
        let slot = id as usize;
        if slot == self.instances.len() {
            self.instances.push(info);
            self.matrices.push(Mat4::IDENTITY);
        } else {
            self.instances[slot] = info;
            self.matrices[slot] = Mat4::IDENTITY;
        }

        self.visibility_changed = true;
        Ok(id)
    }

    /// Mark an instance inactive and recycle its id.
    pub fn delete_instance(&mut self, instance_id: u32) -> Result<()> {
        let info = self.active_mut(instance_id)?;
        info.flags.remove(InstanceFlags::ACTIVE);
        self.instance_ids.free(instance_id);
        self.visibility_changed = true;
        Ok(())
    }

    pub fn set_matrix_at(&mut self, instance_id: u32, matrix: Mat4) -> Result<()> {
        self.active_mut(instance_id)?;
        self.matrices[instance_id as usize] = matrix;
        Ok(())
    }

    pub fn set_visible_at(&mut self, instance_id: u32, visible: bool) -> Result<()> {
        let info = self.active_mut(instance_id)?;
        if info.is_visible() != visible {
            info.flags.set(InstanceFlags::VISIBLE, visible);
            self.visibility_changed = true;
        }
        Ok(())
    }

    /// Opt an instance in or out of occlusion tests.
    pub fn set_occludable_at(&mut self, instance_id: u32, occludable: bool) -> Result<()> {
        let info = self.active_mut(instance_id)?;
        info.flags.set(InstanceFlags::OCCLUDABLE, occludable);
        Ok(())
    }

    fn active_mut(&mut self, instance_id: u32) -> Result<&mut InstanceInfo> {
        match self.instances.get_mut(instance_id as usize) {
            Some(info) if info.is_active() => Ok(info),
            _ => Err(crate::engine_err!(SOURCE, "Instance {} is not active", instance_id)),
        }
    }

    /// All instance slots, inactive tombstones included
    pub fn instances(&self) -> &[InstanceInfo] {
        &self.instances
    }

    pub fn instance(&self, instance_id: u32) -> Option<&InstanceInfo> {
        self.instances.get(instance_id as usize)
    }

    /// Number of live instances
    pub fn instance_count(&self) -> u32 {
        self.instance_ids.len()
    }

    pub fn max_instance_count(&self) -> u32 {
        self.desc.max_instance_count
    }

    /// Per-instance matrices, indexed by instance id
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    pub fn matrix_at(&self, instance_id: u32) -> Option<&Mat4> {
        self.matrices.get(instance_id as usize)
    }

    /// Translation of the instance matrix
    pub fn position_at(&self, instance_id: u32) -> Option<Vec3> {
        self.matrix_at(instance_id).map(|m| m.col(3).truncate())
    }

    /// Translation and largest axis scale of the instance matrix
    pub fn position_and_max_scale_at(&self, instance_id: u32) -> Option<(Vec3, f32)> {
        self.matrix_at(instance_id)
            .map(|m| (m.col(3).truncate(), max_scale_on_axis(m)))
    }

    /// Geometry bounding box carried by the instance matrix (batch-local space)
    pub fn bounding_box_at(&self, instance_id: u32) -> Option<AABB> {
        let info = self.instances.get(instance_id as usize)?;
        let geometry = self.geometries.get(info.geometry_index as usize)?;
        Some(geometry.bounding_box().transformed(&self.matrices[instance_id as usize]))
    }

    /// Geometry bounding sphere carried by the instance matrix (batch-local space)
    pub fn bounding_sphere_at(&self, instance_id: u32) -> Option<BoundingSphere> {
        let info = self.instances.get(instance_id as usize)?;
        let geometry = self.geometries.get(info.geometry_index as usize)?;
        Some(geometry.bounding_sphere().transformed(&self.matrices[instance_id as usize]))
    }

    // ============================================================================
    // SKINNING
    // ============================================================================

    pub fn init_skinning(&mut self, bone_count: usize, bind_matrix: Mat4) -> Result<()> {
        self.bones.init_skinning(bone_count, bind_matrix)
    }

    pub fn set_bones_at(
        &mut self,
        instance_id: u32,
        bone_world: &[Mat4],
        bone_inverse: &[Mat4],
    ) -> Result<()> {
        self.active_mut(instance_id)?;
        self.bones.set_bones_at(instance_id, bone_world, bone_inverse)
    }

    pub fn bones(&self) -> &BoneStore {
        &self.bones
    }

    // ============================================================================
    // CHANGE TRACKING
    // ============================================================================

    /// Whether the drawable set changed since the last culling pass
    pub fn visibility_changed(&self) -> bool {
        self.visibility_changed
    }

    pub(crate) fn mark_visibility_changed(&mut self) {
        self.visibility_changed = true;
    }

    pub(crate) fn clear_visibility_changed(&mut self) {
        self.visibility_changed = false;
    }
}

#[cfg(test)]
#[path = "batch_registry_tests.rs"]
mod tests;
