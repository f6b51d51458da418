/// Bounding sphere and the matrix helpers used to carry it into an
/// instance's space.

use glam::{Mat4, Vec3};
use super::aabb::AABB;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    #[inline]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centered on the box center, reaching the farthest point.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::new(Vec3::ZERO, 0.0);
        }
        let center = AABB::from_points(points).center();
        let radius_sq = points
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0f32, f32::max);
        Self { center, radius: radius_sq.sqrt() }
    }

    /// Whether the sphere is centered on the object-space origin.
    ///
    /// Culling uses this to skip the full transform and scale the radius only.
    #[inline]
    pub fn is_centered(&self) -> bool {
        self.center == Vec3::ZERO
    }

    /// Sphere enclosing this one after `matrix` is applied.
    ///
    /// The radius is scaled by the largest axis scale, so the result is
    /// conservative for non-uniform scale.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingSphere {
        BoundingSphere {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale_on_axis(matrix),
        }
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn to_aabb(&self) -> AABB {
        AABB::from_center(self.center, Vec3::splat(self.radius))
    }
}

/// Largest scale factor of the matrix's three basis axes.
#[inline]
pub fn max_scale_on_axis(matrix: &Mat4) -> f32 {
    let sx = matrix.x_axis.truncate().length_squared();
    let sy = matrix.y_axis.truncate().length_squared();
    let sz = matrix.z_axis.truncate().length_squared();
    sx.max(sy).max(sz).sqrt()
}

#[cfg(test)]
#[path = "sphere_tests.rs"]
mod tests;
