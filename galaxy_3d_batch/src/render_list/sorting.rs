/// Render item ordering.
///
/// Opaque items are drawn front to back, transparent ones back to front.
/// The radix path quantizes depth to a 32-bit key:
/// `key = (depth - min) * (2^32 - 1) / (max - min)`, reversed for
/// transparent items. When every depth is equal the factor is 0 and all
/// keys collapse to the same value.

use std::fmt;
use rdst::RadixSort;
use super::render_list::RenderItem;

/// User sort: `(items, transparent)`
pub type SortCallback = Box<dyn Fn(&mut [RenderItem], bool) + Send + Sync>;

/// How a sorted culling pass orders its render items.
#[derive(Default)]
pub enum SortStrategy {
    /// Stable comparison sort on depth
    #[default]
    Comparison,
    /// LSD radix sort on the quantized depth, O(n)
    Radix,
    /// Caller-provided ordering
    Custom(SortCallback),
}

impl fmt::Debug for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortStrategy::Comparison => write!(f, "Comparison"),
            SortStrategy::Radix => write!(f, "Radix"),
            SortStrategy::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl SortStrategy {
    pub fn sort(&self, items: &mut [RenderItem], transparent: bool) {
        match self {
            SortStrategy::Comparison if transparent => sort_transparent(items),
            SortStrategy::Comparison => sort_opaque(items),
            SortStrategy::Radix => radix_sort(items, transparent),
            SortStrategy::Custom(callback) => callback(items, transparent),
        }
    }
}

/// Front to back
pub fn sort_opaque(items: &mut [RenderItem]) {
    items.sort_by(|a, b| a.depth.total_cmp(&b.depth));
}

/// Back to front
pub fn sort_transparent(items: &mut [RenderItem]) {
    items.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// Fill `sort_key` from the depth range of `items`.
pub fn quantize_depths(items: &mut [RenderItem], transparent: bool) {
    let mut min_depth = f32::INFINITY;
    let mut max_depth = f32::NEG_INFINITY;
    for item in items.iter() {
        min_depth = min_depth.min(item.depth);
        max_depth = max_depth.max(item.depth);
    }

    let delta = max_depth as f64 - min_depth as f64;
    let factor = if delta > 0.0 { u32::MAX as f64 / delta } else { 0.0 };

    for item in items.iter_mut() {
        let key = ((item.depth as f64 - min_depth as f64) * factor) as u32;
        item.sort_key = if transparent { u32::MAX - key } else { key };
    }
}

pub fn radix_sort(items: &mut [RenderItem], transparent: bool) {
    if items.len() < 2 {
        return;
    }
    quantize_depths(items, transparent);
    items.radix_sort_unstable();
}

#[cfg(test)]
#[path = "sorting_tests.rs"]
mod tests;
