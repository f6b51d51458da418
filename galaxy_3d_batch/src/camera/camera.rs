/// Camera: passive data container.
///
/// Holds the camera's world transform and projection. The view matrix is
/// derived from the world transform when it is set; everything else is
/// computed on demand. The batch never stores cameras, it only reads the
/// one passed to `perform_culling`.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

#[derive(Debug, Clone)]
pub struct Camera {
    world_matrix: Mat4,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a camera from its world transform and projection.
    pub fn new(world_matrix: Mat4, projection_matrix: Mat4) -> Self {
        Self {
            world_matrix,
            view_matrix: world_matrix.inverse(),
            projection_matrix,
        }
    }

    /// Right-handed camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, projection_matrix: Mat4) -> Self {
        let view_matrix = Mat4::look_at_rh(eye, target, up);
        Self {
            world_matrix: view_matrix.inverse(),
            view_matrix,
            projection_matrix,
        }
    }

    // ===== GETTERS =====

    /// Camera-to-world transform.
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// View matrix (inverse of the world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// World-space frustum.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.world_matrix.col(3).truncate()
    }

    /// World-space viewing direction (local -Z), unit length.
    pub fn forward(&self) -> Vec3 {
        self.world_matrix.transform_vector3(Vec3::NEG_Z).normalize_or_zero()
    }

    // ===== SETTERS =====

    /// Set the world transform and refresh the view matrix.
    pub fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
        self.view_matrix = matrix.inverse();
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
