use glam::{Mat4, Quat, Vec3};
use super::*;

fn unit_box() -> AABB {
    AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_empty_is_empty() {
    assert!(AABB::EMPTY.is_empty());
    assert!(AABB::default().is_empty());
    assert_eq!(AABB::EMPTY.surface_area(), 0.0);
}

#[test]
fn test_from_points() {
    let aabb = AABB::from_points(&[
        Vec3::new(1.0, -2.0, 0.5),
        Vec3::new(-3.0, 4.0, 0.0),
        Vec3::new(0.0, 0.0, 2.0),
    ]);
    assert_eq!(aabb.min, Vec3::new(-3.0, -2.0, 0.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 2.0));
}

#[test]
fn test_from_points_empty_slice() {
    assert!(AABB::from_points(&[]).is_empty());
}

#[test]
fn test_from_center() {
    let aabb = AABB::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(0.5));
    assert_eq!(aabb.min, Vec3::new(4.5, -0.5, -0.5));
    assert_eq!(aabb.max, Vec3::new(5.5, 0.5, 0.5));
}

// ============================================================================
// Measures
// ============================================================================

#[test]
fn test_surface_area_of_unit_cube() {
    let aabb = AABB::new(Vec3::ZERO, Vec3::ONE);
    assert!((aabb.surface_area() - 6.0).abs() < 1e-6);
}

#[test]
fn test_longest_axis() {
    assert_eq!(AABB::new(Vec3::ZERO, Vec3::new(3.0, 1.0, 1.0)).longest_axis(), 0);
    assert_eq!(AABB::new(Vec3::ZERO, Vec3::new(1.0, 3.0, 1.0)).longest_axis(), 1);
    assert_eq!(AABB::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 3.0)).longest_axis(), 2);
}

#[test]
fn test_union_and_grow_agree() {
    let a = unit_box();
    let b = AABB::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 3.0, 3.0));
    let mut grown = a;
    grown.grow(&b);
    assert_eq!(a.union(&b), grown);
    assert_eq!(grown.min, Vec3::splat(-1.0));
    assert_eq!(grown.max, Vec3::splat(3.0));
}

#[test]
fn test_expanded() {
    let aabb = unit_box().expanded(0.5);
    assert_eq!(aabb.min, Vec3::splat(-1.5));
    assert_eq!(aabb.max, Vec3::splat(1.5));
    assert!(aabb.contains(&unit_box()));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transformed_translation() {
    let m = Mat4::from_translation(Vec3::new(10.0, 0.0, -5.0));
    let aabb = unit_box().transformed(&m);
    assert_eq!(aabb.min, Vec3::new(9.0, -1.0, -6.0));
    assert_eq!(aabb.max, Vec3::new(11.0, 1.0, -4.0));
}

#[test]
fn test_transformed_rotation_encloses_corners() {
    let m = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
    let aabb = unit_box().transformed(&m);
    let sqrt2 = std::f32::consts::SQRT_2;
    assert!((aabb.max.x - sqrt2).abs() < 1e-5);
    assert!((aabb.max.z - sqrt2).abs() < 1e-5);
    assert!((aabb.max.y - 1.0).abs() < 1e-5);
}

#[test]
fn test_transformed_scale() {
    let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
    let aabb = unit_box().transformed(&m);
    assert_eq!(aabb.max, Vec3::new(2.0, 3.0, 4.0));
    assert_eq!(aabb.min, Vec3::new(-2.0, -3.0, -4.0));
}

// ============================================================================
// Containment and intersection
// ============================================================================

#[test]
fn test_contains() {
    let outer = AABB::new(Vec3::splat(-2.0), Vec3::splat(2.0));
    assert!(outer.contains(&unit_box()));
    assert!(!unit_box().contains(&outer));
    assert!(unit_box().contains(&unit_box()));
}

#[test]
fn test_contains_point() {
    assert!(unit_box().contains_point(Vec3::ZERO));
    assert!(unit_box().contains_point(Vec3::ONE));
    assert!(!unit_box().contains_point(Vec3::new(1.1, 0.0, 0.0)));
}

#[test]
fn test_intersects_overlapping_and_touching() {
    let a = unit_box();
    let overlapping = AABB::new(Vec3::splat(0.5), Vec3::splat(2.0));
    let touching = AABB::new(Vec3::new(1.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
    let apart = AABB::new(Vec3::splat(5.0), Vec3::splat(6.0));
    assert!(a.intersects(&overlapping));
    assert!(a.intersects(&touching));
    assert!(!a.intersects(&apart));
}
