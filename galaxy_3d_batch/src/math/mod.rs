//! Math module: bounding volumes and rays.
//!
//! Thin value types on top of `glam`, shared by the registry, the BVH and
//! the culling pipeline.

mod aabb;
mod ray;
mod sphere;

pub use aabb::AABB;
pub use ray::Ray;
pub use sphere::{BoundingSphere, max_scale_on_axis};
