use glam::{Mat4, Vec3};
use super::*;
use crate::error::Error;

// ============================================================================
// Helpers
// ============================================================================

const QUAD_POSITIONS: [Vec3; 4] = [
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn quad_desc() -> GeometryDesc<'static> {
    GeometryDesc {
        positions: &QUAD_POSITIONS,
        indices: &QUAD_INDICES,
        ..Default::default()
    }
}

fn registry(max_instances: u32) -> BatchRegistry {
    BatchRegistry::new(BatchDesc {
        max_instance_count: max_instances,
        max_vertex_count: 64,
        max_index_count: 128,
        index_format: IndexFormat::U32,
    })
}

// ============================================================================
// Geometries
// ============================================================================

#[test]
fn test_add_geometry_computes_bounds() {
    let mut reg = registry(4);
    let id = reg.add_geometry(&quad_desc()).unwrap();
    assert_eq!(id, 0);

    let geometry = reg.geometry(id).unwrap();
    assert_eq!(geometry.vertex_count(), 4);
    assert_eq!(geometry.draw_start(), 0);
    assert_eq!(geometry.draw_count(), 6);
    assert_eq!(geometry.bounding_box().min, Vec3::new(-1.0, -1.0, 0.0));
    assert_eq!(geometry.bounding_box().max, Vec3::new(1.0, 1.0, 0.0));
    assert!(geometry.bounding_sphere().radius > 0.0);
    assert!(geometry.lod().is_none());
}

#[test]
fn test_add_geometry_rebases_indices() {
    let mut reg = registry(4);
    reg.add_geometry(&quad_desc()).unwrap();
    let second = reg.add_geometry(&quad_desc()).unwrap();

    let geometry = reg.geometry(second).unwrap();
    assert_eq!(geometry.vertex_start(), 4);
    assert_eq!(geometry.draw_start(), 6);

    let range = &reg.index_buffer()[6..12];
    assert_eq!(range, &[4, 5, 6, 4, 6, 7]);
}

#[test]
fn test_add_geometry_reserves_space() {
    let mut reg = registry(4);
    let desc = GeometryDesc {
        reserved_vertex_count: Some(10),
        reserved_index_count: Some(20),
        ..quad_desc()
    };
    reg.add_geometry(&desc).unwrap();
    let second = reg.add_geometry(&quad_desc()).unwrap();

    assert_eq!(reg.geometry(second).unwrap().vertex_start(), 10);
    assert_eq!(reg.geometry(second).unwrap().draw_start(), 20);
    assert_eq!(reg.index_buffer().len(), 26);
}

#[test]
fn test_add_geometry_explicit_bounds_win() {
    let mut reg = registry(4);
    let bounds = AABB::new(Vec3::splat(-5.0), Vec3::splat(5.0));
    let desc = GeometryDesc {
        bounding_box: Some(bounds),
        ..quad_desc()
    };
    let id = reg.add_geometry(&desc).unwrap();
    assert_eq!(*reg.geometry(id).unwrap().bounding_box(), bounds);
}

#[test]
fn test_add_geometry_rejects_invalid_data() {
    let mut reg = registry(4);

    let empty = GeometryDesc { positions: &[], indices: &[], ..Default::default() };
    assert!(matches!(reg.add_geometry(&empty), Err(Error::InvalidResource(_))));

    let bad_index = GeometryDesc { indices: &[0, 1, 9], ..quad_desc() };
    assert!(matches!(reg.add_geometry(&bad_index), Err(Error::InvalidResource(_))));

    let short_reserve = GeometryDesc { reserved_index_count: Some(3), ..quad_desc() };
    assert!(matches!(reg.add_geometry(&short_reserve), Err(Error::InvalidResource(_))));

    assert!(reg.geometries().is_empty());
}

#[test]
fn test_add_geometry_capacity_exceeded() {
    let mut reg = registry(4);
    let desc = GeometryDesc { reserved_index_count: Some(125), ..quad_desc() };
    reg.add_geometry(&desc).unwrap();

    let err = reg.add_geometry(&quad_desc()).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));
    assert_eq!(reg.geometries().len(), 1);
}

#[test]
fn test_u16_format_limits_vertex_range() {
    let mut reg = BatchRegistry::new(BatchDesc {
        max_instance_count: 1,
        max_vertex_count: 100_000,
        max_index_count: 128,
        index_format: IndexFormat::U16,
    });
    let desc = GeometryDesc { reserved_vertex_count: Some(70_000), ..quad_desc() };
    assert!(matches!(reg.add_geometry(&desc), Err(Error::CapacityExceeded(_))));
    assert_eq!(IndexFormat::U16.bytes_per_element(), 2);
    assert_eq!(IndexFormat::U32.bytes_per_element(), 4);
}

// ============================================================================
// LOD
// ============================================================================

#[test]
fn test_add_geometry_lod_packs_levels() {
    let mut reg = registry(4);
    let desc = GeometryDesc { reserved_index_count: Some(12), ..quad_desc() };
    let id = reg.add_geometry(&desc).unwrap();

    assert_eq!(reg.add_geometry_lod(id, &[0, 1, 2], 10.0, 0.0).unwrap(), 1);
    assert_eq!(reg.add_geometry_lod(id, &[0, 2, 3], 20.0, 0.1).unwrap(), 2);

    let lod = reg.geometry(id).unwrap().lod().unwrap();
    assert_eq!(lod.len(), 3);
    assert_eq!(lod.get(0).unwrap().start, 0);
    assert_eq!(lod.get(1).unwrap().start, 6);
    assert_eq!(lod.get(2).unwrap().start, 9);
    assert_eq!(lod.get(2).unwrap().distance_sq, 400.0);
    assert_eq!(&reg.index_buffer()[6..12], &[0, 1, 2, 0, 2, 3]);
}

#[test]
fn test_add_geometry_lod_rebases_indices() {
    let mut reg = registry(4);
    reg.add_geometry(&quad_desc()).unwrap();
    let desc = GeometryDesc { reserved_index_count: Some(9), ..quad_desc() };
    let id = reg.add_geometry(&desc).unwrap();

    reg.add_geometry_lod(id, &[0, 1, 2], 5.0, 0.0).unwrap();
    assert_eq!(&reg.index_buffer()[12..15], &[4, 5, 6]);
}

#[test]
fn test_add_geometry_lod_overflow_keeps_levels() {
    let mut reg = registry(4);
    let desc = GeometryDesc { reserved_index_count: Some(9), ..quad_desc() };
    let id = reg.add_geometry(&desc).unwrap();
    reg.add_geometry_lod(id, &[0, 1, 2], 10.0, 0.0).unwrap();

    let err = reg.add_geometry_lod(id, &[0, 1, 2], 20.0, 0.0).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));
    assert_eq!(reg.geometry(id).unwrap().lod().unwrap().len(), 2);
}

#[test]
fn test_add_geometry_lod_rejects_bad_input() {
    let mut reg = registry(4);
    let desc = GeometryDesc { reserved_index_count: Some(12), ..quad_desc() };
    let id = reg.add_geometry(&desc).unwrap();

    assert!(matches!(reg.add_geometry_lod(7, &[0, 1, 2], 10.0, 0.0), Err(Error::InvalidResource(_))));
    assert!(matches!(reg.add_geometry_lod(id, &[0, 1, 4], 10.0, 0.0), Err(Error::InvalidResource(_))));
    assert!(reg.geometry(id).unwrap().lod().is_none());
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn test_add_instance_defaults() {
    let mut reg = registry(4);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let id = reg.add_instance(geometry).unwrap();

    let info = reg.instance(id).unwrap();
    assert!(info.is_active());
    assert!(info.is_visible());
    assert!(!info.is_occludable());
    assert_eq!(info.geometry_index, geometry);
    assert_eq!(*reg.matrix_at(id).unwrap(), Mat4::IDENTITY);
    assert!(reg.visibility_changed());
}

#[test]
fn test_add_instance_unknown_geometry() {
    let mut reg = registry(4);
    assert!(matches!(reg.add_instance(0), Err(Error::InvalidResource(_))));
}

#[test]
fn test_add_instance_capacity() {
    let mut reg = registry(2);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    reg.add_instance(geometry).unwrap();
    reg.add_instance(geometry).unwrap();

    let err = reg.add_instance(geometry).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));
    assert_eq!(reg.instance_count(), 2);
}

#[test]
fn test_delete_instance_leaves_tombstone_and_recycles() {
    let mut reg = registry(4);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let a = reg.add_instance(geometry).unwrap();
    let b = reg.add_instance(geometry).unwrap();
    reg.set_matrix_at(a, Mat4::from_translation(Vec3::X)).unwrap();

    reg.clear_visibility_changed();
    reg.delete_instance(a).unwrap();
    assert!(reg.visibility_changed());
    assert!(!reg.instance(a).unwrap().is_active());
    assert_eq!(reg.instances().len(), 2);
    assert_eq!(reg.instance_count(), 1);

    let c = reg.add_instance(geometry).unwrap();
    assert_eq!(c, a);
    assert_ne!(c, b);
    assert_eq!(*reg.matrix_at(c).unwrap(), Mat4::IDENTITY);
}

#[test]
fn test_mutating_inactive_instance_fails() {
    let mut reg = registry(4);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let id = reg.add_instance(geometry).unwrap();
    reg.delete_instance(id).unwrap();

    assert!(reg.delete_instance(id).is_err());
    assert!(reg.set_matrix_at(id, Mat4::IDENTITY).is_err());
    assert!(reg.set_visible_at(id, false).is_err());
    assert!(reg.set_occludable_at(99, true).is_err());
}

#[test]
fn test_set_visible_tracks_changes() {
    let mut reg = registry(4);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let id = reg.add_instance(geometry).unwrap();
    reg.clear_visibility_changed();

    reg.set_visible_at(id, true).unwrap();
    assert!(!reg.visibility_changed());

    reg.set_visible_at(id, false).unwrap();
    assert!(reg.visibility_changed());
    assert!(!reg.instance(id).unwrap().is_drawable());
}

#[test]
fn test_instance_transform_accessors() {
    let mut reg = registry(4);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let id = reg.add_instance(geometry).unwrap();
    let matrix = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 3.0, 2.0),
        glam::Quat::IDENTITY,
        Vec3::new(10.0, 0.0, -4.0),
    );
    reg.set_matrix_at(id, matrix).unwrap();

    assert_eq!(reg.position_at(id), Some(Vec3::new(10.0, 0.0, -4.0)));
    let (position, scale) = reg.position_and_max_scale_at(id).unwrap();
    assert_eq!(position, Vec3::new(10.0, 0.0, -4.0));
    assert!((scale - 3.0).abs() < 1e-6);

    let aabb = reg.bounding_box_at(id).unwrap();
    assert!(aabb.min.abs_diff_eq(Vec3::new(9.0, -3.0, -4.0), 1e-5));
    assert!(aabb.max.abs_diff_eq(Vec3::new(11.0, 3.0, -4.0), 1e-5));

    let sphere = reg.bounding_sphere_at(id).unwrap();
    assert!(sphere.center.abs_diff_eq(Vec3::new(10.0, 0.0, -4.0), 1e-5));
    assert!(reg.position_at(42).is_none());
}

// ============================================================================
// Skinning
// ============================================================================

#[test]
fn test_set_bones_requires_active_instance() {
    let mut reg = registry(2);
    let geometry = reg.add_geometry(&quad_desc()).unwrap();
    let id = reg.add_instance(geometry).unwrap();
    reg.init_skinning(2, Mat4::IDENTITY).unwrap();

    reg.set_bones_at(id, &[Mat4::IDENTITY], &[Mat4::IDENTITY]).unwrap();
    assert!(reg.set_bones_at(1, &[Mat4::IDENTITY], &[Mat4::IDENTITY]).is_err());
    assert_eq!(reg.bones().max_bones(), 2);
}
