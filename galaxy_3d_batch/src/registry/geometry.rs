//! Per-geometry records of a batch.
//!
//! Every geometry owns a reserved slice of the batch's shared vertex range
//! and index buffer. The base draw range sits at the front of its index
//! reserve; LOD levels are packed behind it.
//!
//! ```text
//! index buffer
//! ├── geometry 0 reserve ─┬─ LOD 0 (base draw range)
//! │                       ├─ LOD 1
//! │                       └─ (free)
//! └── geometry 1 reserve ─── LOD 0
//! ```

use glam::Vec3;
use crate::lod::LodLevels;
use crate::math::{AABB, BoundingSphere};

// ============================================================================
// GEOMETRY DESCRIPTOR
// ============================================================================

/// Input of `BatchRegistry::add_geometry`.
///
/// `indices` are local to the geometry (0 = its first vertex). Bounds are
/// computed from `positions` unless given explicitly.
#[derive(Debug, Clone, Default)]
pub struct GeometryDesc<'a> {
    pub positions: &'a [Vec3],
    pub indices: &'a [u32],
    /// Vertices to reserve (default: `positions.len()`)
    pub reserved_vertex_count: Option<u32>,
    /// Indices to reserve, room for LOD levels included (default: `indices.len()`)
    pub reserved_index_count: Option<u32>,
    pub bounding_box: Option<AABB>,
    pub bounding_sphere: Option<BoundingSphere>,
}

// ============================================================================
// GEOMETRY INFO
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeometryInfo {
    vertex_start: u32,
    vertex_count: u32,
    reserved_vertex_count: u32,

    draw_start: u32,
    draw_count: u32,
    reserved_index_count: u32,

    bounding_box: AABB,
    bounding_sphere: BoundingSphere,

    lod: Option<LodLevels>,
}

impl GeometryInfo {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        vertex_start: u32,
        vertex_count: u32,
        reserved_vertex_count: u32,
        draw_start: u32,
        draw_count: u32,
        reserved_index_count: u32,
        bounding_box: AABB,
        bounding_sphere: BoundingSphere,
    ) -> Self {
        Self {
            vertex_start,
            vertex_count,
            reserved_vertex_count,
            draw_start,
            draw_count,
            reserved_index_count,
            bounding_box,
            bounding_sphere,
            lod: None,
        }
    }

    // ===== GETTERS =====

    /// First vertex of the geometry in the shared vertex range
    pub fn vertex_start(&self) -> u32 {
        self.vertex_start
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn reserved_vertex_count(&self) -> u32 {
        self.reserved_vertex_count
    }

    /// First index of the base draw range
    pub fn draw_start(&self) -> u32 {
        self.draw_start
    }

    /// Index count of the base draw range
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    pub fn reserved_index_count(&self) -> u32 {
        self.reserved_index_count
    }

    /// Object-space bounding box
    pub fn bounding_box(&self) -> &AABB {
        &self.bounding_box
    }

    /// Object-space bounding sphere
    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    /// LOD levels, if any were added beyond the base range
    pub fn lod(&self) -> Option<&LodLevels> {
        self.lod.as_ref()
    }

    pub(crate) fn set_lod(&mut self, lod: LodLevels) {
        self.lod = Some(lod);
    }
}
