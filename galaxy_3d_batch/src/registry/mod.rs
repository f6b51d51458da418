//! Registry module: instances, geometries and bones of a batch.

mod batch_registry;
mod geometry;
mod instance;
mod skeleton;

pub use batch_registry::{BatchDesc, BatchRegistry, IndexFormat};
pub use geometry::{GeometryDesc, GeometryInfo};
pub use instance::{InstanceFlags, InstanceInfo};
pub use skeleton::BoneStore;
