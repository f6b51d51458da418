/// Per-instance record of a batch.

use bitflags::bitflags;

bitflags! {
    /// Instance state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u8 {
        /// Slot holds a live instance (cleared on delete, slot kept as a tombstone)
        const ACTIVE = 1 << 0;
        /// Instance should be drawn
        const VISIBLE = 1 << 1;
        /// Instance takes part in occlusion tests
        const OCCLUDABLE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceInfo {
    pub flags: InstanceFlags,
    /// Geometry drawn by this instance
    pub geometry_index: u32,
}

impl InstanceInfo {
    /// Fresh instance: active and visible, not occludable.
    pub fn new(geometry_index: u32) -> Self {
        Self {
            flags: InstanceFlags::ACTIVE | InstanceFlags::VISIBLE,
            geometry_index,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.flags.contains(InstanceFlags::ACTIVE)
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(InstanceFlags::VISIBLE)
    }

    #[inline]
    pub fn is_occludable(&self) -> bool {
        self.flags.contains(InstanceFlags::OCCLUDABLE)
    }

    /// Active and visible.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.flags.contains(InstanceFlags::ACTIVE | InstanceFlags::VISIBLE)
    }
}
