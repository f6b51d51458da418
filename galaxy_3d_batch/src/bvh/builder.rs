/// Top-down split selection for BVH construction.
///
/// Binned SAH over the three axes; a centroid-median split is used when the
/// centroids are degenerate or SAH cannot separate them.

use glam::Vec3;
use crate::math::AABB;

const SAH_BINS: usize = 16;

/// Below this centroid extent an axis is considered flat.
const MIN_EXTENT: f32 = 1e-7;

/// One object to place during a build.
#[derive(Debug, Clone, Copy)]
pub(super) struct BuildPrimitive {
    pub id: u32,
    /// Exact bounds
    pub tight: AABB,
    /// Bounds stored in the tree (tight + margin)
    pub aabb: AABB,
    pub centroid: Vec3,
}

impl BuildPrimitive {
    pub fn new(id: u32, tight: AABB, margin: f32) -> Self {
        let aabb = if margin > 0.0 { tight.expanded(margin) } else { tight };
        Self { id, tight, aabb, centroid: aabb.center() }
    }
}

#[derive(Clone, Copy)]
struct Bin {
    bounds: AABB,
    count: u32,
}

impl Default for Bin {
    fn default() -> Self {
        Self { bounds: AABB::EMPTY, count: 0 }
    }
}

/// Best SAH split as `(axis, position)`, or `None` if no axis separates the
/// primitives.
fn find_best_split(
    primitives: &[BuildPrimitive],
    centroid_bounds: &AABB,
) -> Option<(usize, f32)> {
    let extent = centroid_bounds.extent();
    let mut best: Option<(usize, f32)> = None;
    let mut best_cost = f32::INFINITY;

    for axis in 0..3 {
        if extent[axis] < MIN_EXTENT {
            continue;
        }

        let scale = SAH_BINS as f32 / extent[axis];
        let base = centroid_bounds.min[axis];
        let mut bins = [Bin::default(); SAH_BINS];

        for prim in primitives {
            let bin = ((prim.centroid[axis] - base) * scale)
                .clamp(0.0, (SAH_BINS - 1) as f32) as usize;
            bins[bin].bounds.grow(&prim.aabb);
            bins[bin].count += 1;
        }

        let mut left_bounds = [AABB::EMPTY; SAH_BINS - 1];
        let mut left_counts = [0u32; SAH_BINS - 1];
        let mut running = (AABB::EMPTY, 0u32);

        for i in 0..(SAH_BINS - 1) {
            running.0.grow(&bins[i].bounds);
            running.1 += bins[i].count;
            left_bounds[i] = running.0;
            left_counts[i] = running.1;
        }

        running = (AABB::EMPTY, 0);
        for i in (0..(SAH_BINS - 1)).rev() {
            running.0.grow(&bins[i + 1].bounds);
            running.1 += bins[i + 1].count;

            if left_counts[i] == 0 || running.1 == 0 {
                continue;
            }

            let cost = left_counts[i] as f32 * left_bounds[i].surface_area()
                + running.1 as f32 * running.0.surface_area();

            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, base + (i + 1) as f32 * extent[axis] / SAH_BINS as f32));
            }
        }
    }

    best
}

/// Move primitives with centroid below `split_pos` to the front. Returns the
/// size of the front part.
fn partition(primitives: &mut [BuildPrimitive], axis: usize, split_pos: f32) -> usize {
    let mut left = 0;
    let mut right = primitives.len();

    while left < right {
        if primitives[left].centroid[axis] < split_pos {
            left += 1;
        } else {
            right -= 1;
            primitives.swap(left, right);
        }
    }

    left
}

/// Reorder `primitives` into two non-empty halves and return the split index.
///
/// Requires at least two primitives.
pub(super) fn split(primitives: &mut [BuildPrimitive]) -> usize {
    debug_assert!(primitives.len() >= 2);

    let mut centroid_bounds = AABB::EMPTY;
    for prim in primitives.iter() {
        centroid_bounds.grow_point(prim.centroid);
    }

    if let Some((axis, pos)) = find_best_split(primitives, &centroid_bounds) {
        let mid = partition(primitives, axis, pos);
        if mid > 0 && mid < primitives.len() {
            return mid;
        }
    }

    // Median fallback
    let axis = centroid_bounds.longest_axis();
    let mid = primitives.len() / 2;
    primitives.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    mid
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
