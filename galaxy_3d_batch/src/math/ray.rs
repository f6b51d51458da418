/// Ray type for BVH and occlusion queries.

use glam::{Mat4, Vec3};
use super::aabb::AABB;
use super::sphere::BoundingSphere;

/// A ray `origin + t * direction`.
///
/// `direction` does not have to be unit length. Transforming a ray by a
/// matrix keeps the direction unnormalized, so a parameter `t` names the
/// same point in both spaces and `[near, far]` intervals carry over
/// without rescaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction, inv_direction: direction.recip() }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed in the space mapped by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Slab test. Returns the entry parameter if the ray crosses the box
    /// within `[near, far]`.
    pub fn intersect_aabb(&self, aabb: &AABB, near: f32, far: f32) -> Option<f32> {
        let mut t_enter = near;
        let mut t_exit = far;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            // Parallel to this slab: inside it for every t, or never
            if self.direction[axis] == 0.0 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let t1 = (min - origin) * self.inv_direction[axis];
            let t2 = (max - origin) * self.inv_direction[axis];
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_enter <= t_exit { Some(t_enter) } else { None }
    }

    /// Nearest non-negative parameter where the ray meets the sphere.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let oc = self.origin - sphere.center;
        let a = self.direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;

        let discriminant = b * b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t1 = (-b - sqrt_d) / a;
        let t2 = (-b + sqrt_d) / a;

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
