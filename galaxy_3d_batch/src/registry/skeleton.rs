/// Per-instance bone matrices for skinned batches.
///
/// The bone count per instance is fixed by the first `init_skinning` call.
/// Later skeletons may have fewer bones (padded with identity) but never
/// more. Storage is `instance_capacity * max_bones` matrices, laid out
/// instance-major.

use glam::Mat4;
use crate::error::Result;

const SOURCE: &str = "galaxy3d::Skeleton";

pub struct BoneStore {
    instance_capacity: u32,
    max_bones: usize,
    bind_matrix: Mat4,
    bind_matrix_inverse: Mat4,
    matrices: Vec<Mat4>,
}

impl BoneStore {
    pub fn new(instance_capacity: u32) -> Self {
        Self {
            instance_capacity,
            max_bones: 0,
            bind_matrix: Mat4::IDENTITY,
            bind_matrix_inverse: Mat4::IDENTITY,
            matrices: Vec::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.max_bones > 0
    }

    /// Bones per instance (0 before initialization)
    pub fn max_bones(&self) -> usize {
        self.max_bones
    }

    pub fn bind_matrix(&self) -> &Mat4 {
        &self.bind_matrix
    }

    pub fn bind_matrix_inverse(&self) -> &Mat4 {
        &self.bind_matrix_inverse
    }

    /// Fix the bone count and bind matrix, filling every slot with identity.
    ///
    /// Calling again with `bone_count <= max_bones` is a no-op, so the
    /// skeleton with the most bones must be registered first.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if `bone_count` is 0
    /// - `CapacityExceeded` if `bone_count` exceeds the fixed maximum
    pub fn init_skinning(&mut self, bone_count: usize, bind_matrix: Mat4) -> Result<()> {
        if bone_count == 0 {
            crate::engine_bail!(SOURCE, "Skinning needs at least one bone");
        }

        if self.is_initialized() {
            if bone_count > self.max_bones {
                return Err(crate::engine_capacity_err!(
                    SOURCE,
                    "Skeleton with {} bones exceeds the initial maximum of {}. Initialize with the skeleton that has the most bones first.",
                    bone_count,
                    self.max_bones
                ));
            }
            return Ok(());
        }

        self.max_bones = bone_count;
        self.bind_matrix = bind_matrix;
        self.bind_matrix_inverse = bind_matrix.inverse();
        self.matrices = vec![Mat4::IDENTITY; self.instance_capacity as usize * bone_count];

        crate::engine_debug!(
            SOURCE,
            "Skinning initialized: {} bones x {} instances",
            bone_count,
            self.instance_capacity
        );
        Ok(())
    }

    /// Write `bone_world[i] * bone_inverse[i]` for each bone of `instance_id`,
    /// padding the remaining slots with identity.
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` before `init_skinning`
    /// - `InvalidResource` on mismatched slices or an out-of-range instance
    /// - `CapacityExceeded` if more bones than `max_bones` are given
    pub fn set_bones_at(
        &mut self,
        instance_id: u32,
        bone_world: &[Mat4],
        bone_inverse: &[Mat4],
    ) -> Result<()> {
        if !self.is_initialized() {
            return Err(crate::engine_init_err!(
                SOURCE,
                "set_bones_at called before init_skinning"
            ));
        }
        if bone_world.len() != bone_inverse.len() {
            crate::engine_bail!(
                SOURCE,
                "{} bone matrices but {} inverse matrices",
                bone_world.len(),
                bone_inverse.len()
            );
        }
        if bone_world.len() > self.max_bones {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "{} bones given, at most {} per instance",
                bone_world.len(),
                self.max_bones
            ));
        }
        if instance_id >= self.instance_capacity {
            crate::engine_bail!(SOURCE, "Instance id {} out of range", instance_id);
        }

        let offset = instance_id as usize * self.max_bones;
        let slots = &mut self.matrices[offset..offset + self.max_bones];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = match (bone_world.get(i), bone_inverse.get(i)) {
                (Some(world), Some(inverse)) => *world * *inverse,
                _ => Mat4::IDENTITY,
            };
        }
        Ok(())
    }

    /// Bone matrices of one instance
    pub fn bones_at(&self, instance_id: u32) -> Option<&[Mat4]> {
        if !self.is_initialized() || instance_id >= self.instance_capacity {
            return None;
        }
        let offset = instance_id as usize * self.max_bones;
        Some(&self.matrices[offset..offset + self.max_bones])
    }

    /// Raw matrix data for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

#[cfg(test)]
#[path = "skeleton_tests.rs"]
mod tests;
