/// Pooled list of render items produced by a culling pass.
///
/// Item slots are kept across frames; `reset` only drops the logical length,
/// so a steady-state frame does not allocate.

use rdst::RadixKey;
use super::sorting::SortStrategy;

/// One accepted instance with its draw range and view depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderItem {
    pub instance_index: u32,
    /// Distance along the camera forward axis
    pub depth: f32,
    /// First index of the draw range
    pub start: u32,
    /// Index count of the draw range
    pub count: u32,
    /// Quantized depth, filled by the radix sort
    pub sort_key: u32,
}

impl RadixKey for RenderItem {
    const LEVELS: usize = 4;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.sort_key >> (level * 8)) as u8
    }
}

#[derive(Debug, Default)]
pub struct RenderList {
    items: Vec<RenderItem>,
    len: usize,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance_index: u32, depth: f32, start: u32, count: u32) {
        let item = RenderItem { instance_index, depth, start, count, sort_key: 0 };
        if self.len < self.items.len() {
            self.items[self.len] = item;
        } else {
            self.items.push(item);
        }
        self.len += 1;
    }

    /// Items pushed since the last reset
    pub fn items(&self) -> &[RenderItem] {
        &self.items[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots allocated so far
    pub fn pool_size(&self) -> usize {
        self.items.len()
    }

    pub fn sort(&mut self, strategy: &SortStrategy, transparent: bool) {
        strategy.sort(&mut self.items[..self.len], transparent);
    }

    /// Drop the logical length, keep the slots.
    pub fn reset(&mut self) {
        self.len = 0;
    }
}

#[cfg(test)]
#[path = "render_list_tests.rs"]
mod tests;
