/// Flat multi-draw arrays consumed by the draw call.
///
/// Three parallel arrays: byte offset of each draw range in the index
/// buffer, index count, and the instance drawn. Slots are kept across
/// frames.

use crate::render_list::RenderItem;

#[derive(Debug, Default)]
pub struct MultiDrawList {
    starts: Vec<u32>,
    counts: Vec<u32>,
    instances: Vec<u32>,
}

impl MultiDrawList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            starts: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.starts.clear();
        self.counts.clear();
        self.instances.clear();
    }

    /// Append one draw. `start` is already in bytes.
    #[inline]
    pub fn push(&mut self, start: u32, count: u32, instance_index: u32) {
        self.starts.push(start);
        self.counts.push(count);
        self.instances.push(instance_index);
    }

    /// Replace the content with `items` in order, converting starts to bytes.
    pub fn fill_from(&mut self, items: &[RenderItem], bytes_per_element: u32) {
        self.clear();
        for item in items {
            self.push(item.start * bytes_per_element, item.count, item.instance_index);
        }
    }

    /// Number of draws
    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Byte offsets into the index buffer
    pub fn starts(&self) -> &[u32] {
        &self.starts
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn instances(&self) -> &[u32] {
        &self.instances
    }

    // ===== UPLOAD VIEWS =====

    pub fn starts_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.starts)
    }

    pub fn counts_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.counts)
    }

    pub fn instances_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

#[cfg(test)]
#[path = "draw_list_tests.rs"]
mod tests;
