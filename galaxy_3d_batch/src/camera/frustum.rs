/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is a Vec4 (A, B, C, D) with an inward-pointing unit normal
/// (A, B, C). A point P is inside if `dot(plane, (P, 1)) >= 0` for all six.
///
/// The culling pipeline extracts the frustum from
/// `projection * view * batch_world`, so the planes live in the batch's
/// local space and instance bounds never have to be moved to world space.

use glam::{Mat4, Vec3, Vec4};
use crate::math::{AABB, BoundingSphere};

/// Result of a 3-way frustum/AABB classification.
///
/// - `Outside` → skip the entire subtree
/// - `Inside` → every leaf below is visible, no further tests
/// - `Partial` → recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    Outside,
    Inside,
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

#[inline]
fn positive_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
    Vec3::new(
        if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
        if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
        if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
    )
}

#[inline]
fn negative_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
    Vec3::new(
        if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
        if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
        if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
    )
}

impl Frustum {
    /// Extract frustum planes from a (view-)projection matrix.
    ///
    /// Gribb & Hartmann. Works for perspective and orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0,
            row3 - row0,
            row3 + row1,
            row3 - row1,
            row3 + row2,
            row3 - row2,
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from a point to one plane (positive = inside).
    #[inline]
    pub fn distance_to_plane(&self, plane: usize, point: Vec3) -> f32 {
        let p = self.planes[plane];
        p.truncate().dot(point) + p.w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance_to_plane(i, point) >= 0.0)
    }

    /// Conservative AABB test: never rejects a visible box.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            normal.dot(positive_vertex(normal, aabb)) + plane.w >= 0.0
        })
    }

    /// Sphere test used by the linear culling path.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        let neg_radius = -sphere.radius;
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(sphere.center) + plane.w >= neg_radius)
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// p-vertex outside any plane → `Outside`; n-vertex outside any plane
    /// → at least `Partial`; otherwise `Inside`.
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            if normal.dot(positive_vertex(normal, aabb)) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            if normal.dot(negative_vertex(normal, aabb)) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
