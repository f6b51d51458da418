//! Level-of-detail module
//!
//! Per-geometry LOD lists and the distance → level resolver used by the
//! culling pipeline.

mod resolver;

pub use resolver::{LodLevel, LodLevels, lod_index};
