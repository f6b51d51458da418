//! Camera module: camera and frustum.
//!
//! Passive data containers. Cameras are owned and driven by the caller;
//! the batch only reads them during `perform_culling`.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
