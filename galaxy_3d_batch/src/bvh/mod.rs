//! BVH module: spatial index of a batch's instances.
//!
//! Dynamic binary AABB tree: top-down SAH build, incremental insert / update
//! / remove, frustum, ray and box queries.

mod builder;
mod bvh;

pub use bvh::{BatchBvh, BvhConfig, BvhItem};
