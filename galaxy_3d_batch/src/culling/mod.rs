//! Culling module: per-frame visibility, LOD and draw ordering.
//!
//! `CullableBatch` is the entry point. It wraps a `BatchRegistry`, keeps the
//! candidate strategy (linear scan or BVH) in sync with it, and writes the
//! multi-draw arrays consumed by the draw call.

mod batch;
mod draw_list;
mod occlusion;
mod strategy;

pub use batch::{CullableBatch, CullingConfig, CullingStats, FrustumFilter, RaycastHit};
pub use draw_list::MultiDrawList;
pub use occlusion::{Occluder, OcclusionConfig, Planet, SphereOccluder, horizon_occluded};
pub use strategy::{BvhStrategy, CullingStrategy, LinearStrategy};
