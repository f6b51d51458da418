/*!
# Galaxy 3D Batch

Visibility and draw ordering for large instanced batches.

A batch shares one index buffer and one draw call between many geometries
and up to hundreds of thousands of instances. This crate decides, every
frame, which instances are drawn, with which level of detail and in which
order, and writes the result as flat multi-draw arrays.

## Architecture

- **BatchRegistry**: geometries, instances, LOD lists and bone matrices
- **BatchBvh**: dynamic AABB tree over the batch's instances
- **CullableBatch**: per-frame culling pipeline (linear or BVH candidates,
  LOD, user filter, occlusion, sorting)
- **RenderList**: pooled render items and their comparison / radix ordering
- **MultiDrawList**: the `starts / counts / instances` arrays of the draw call

GPU submission is left to the caller.
*/

// Internal modules
mod error;
pub mod log;
pub mod math;
pub mod camera;
pub mod utils;
pub mod lod;
pub mod registry;
pub mod bvh;
pub mod render_list;
pub mod culling;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Culling entry point
    pub use crate::culling::{CullableBatch, CullingConfig, CullingStats, RaycastHit};

    // Logging sub-module (types and configuration, NOT macros)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger,
            set_logger, reset_logger, set_min_severity, min_severity,
        };
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Registry sub-module
    pub mod registry {
        pub use crate::registry::*;
        pub use crate::lod::*;
    }

    // Spatial index sub-module
    pub mod bvh {
        pub use crate::bvh::*;
    }

    // Culling sub-module
    pub mod culling {
        pub use crate::culling::*;
        pub use crate::render_list::*;
    }
}

// Re-export math library at crate root
pub use glam;
