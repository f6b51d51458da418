/// LOD levels of one geometry and the distance → level resolver.
///
/// Level 0 is always the geometry's base draw range at distance 0. Later
/// levels are appended with strictly increasing distances; their index
/// ranges are packed one after the other inside the geometry's reserved
/// index range, which never grows.

use crate::error::Result;

const SOURCE: &str = "galaxy3d::Lod";

/// One detail level: a draw range and the squared distance where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodLevel {
    /// First index of the level's draw range
    pub start: u32,
    /// Number of indices
    pub count: u32,
    /// Squared camera distance at which this level starts
    pub distance_sq: f32,
    /// Fraction in [0, 1) pulling the switch distance towards the camera
    pub hysteresis: f32,
}

impl LodLevel {
    /// Squared distance at and beyond which this level is selected.
    #[inline]
    pub fn threshold_sq(&self) -> f32 {
        self.distance_sq - self.distance_sq * self.hysteresis
    }
}

/// Index of the level to draw at `distance_sq` from the LOD camera.
///
/// Scans from the farthest level down to level 1 and returns the first one
/// whose hysteresis-adjusted threshold is reached; 0 otherwise.
pub fn lod_index(levels: &[LodLevel], distance_sq: f32) -> usize {
    for i in (1..levels.len()).rev() {
        if distance_sq >= levels[i].threshold_sq() {
            return i;
        }
    }
    0
}

/// Append-only LOD list bound to a reserved index range.
#[derive(Debug, Clone)]
pub struct LodLevels {
    levels: Vec<LodLevel>,
    reserved_start: u32,
    reserved_count: u32,
}

impl LodLevels {
    /// Create the list with its base level `{start, count, 0, 0}`.
    ///
    /// The reserved range begins at `start` and spans `reserved_count` indices.
    pub fn new(start: u32, count: u32, reserved_count: u32) -> Self {
        Self {
            levels: vec![LodLevel { start, count, distance_sq: 0.0, hysteresis: 0.0 }],
            reserved_start: start,
            reserved_count,
        }
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: the base level is never removed.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LodLevel> {
        self.levels.get(index)
    }

    /// Index where the next level's range would begin.
    pub fn next_start(&self) -> u32 {
        self.levels
            .last()
            .map(|last| last.start + last.count)
            .unwrap_or(self.reserved_start)
    }

    /// Indices still free in the reserved range.
    pub fn remaining(&self) -> u32 {
        let used = self.next_start() - self.reserved_start;
        self.reserved_count.saturating_sub(used)
    }

    /// Append a level of `count` indices starting at camera `distance`.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the level does not fit in the reserved range
    /// - `InvalidResource` if `distance` does not exceed the previous level's
    ///   or `hysteresis` is outside [0, 1)
    ///
    /// Existing levels are left untouched on error.
    pub fn push(&mut self, count: u32, distance: f32, hysteresis: f32) -> Result<LodLevel> {
        let distance_sq = distance * distance;
        let last_distance_sq = self.levels.last().map_or(0.0, |l| l.distance_sq);

        if !distance.is_finite() || distance <= 0.0 || distance_sq <= last_distance_sq {
            crate::engine_bail!(
                SOURCE,
                "LOD distance {} must be greater than the previous level's {}",
                distance,
                last_distance_sq.sqrt()
            );
        }
        if !(0.0..1.0).contains(&hysteresis) {
            crate::engine_bail!(SOURCE, "LOD hysteresis {} outside [0, 1)", hysteresis);
        }

        let start = self.next_start();
        let used = (start - self.reserved_start) as u64;
        if used + count as u64 > self.reserved_count as u64 {
            return Err(crate::engine_capacity_err!(
                SOURCE,
                "LOD level of {} indices does not fit in the reserved space: {} of {} already used",
                count,
                used,
                self.reserved_count
            ));
        }

        let level = LodLevel { start, count, distance_sq, hysteresis };
        self.levels.push(level);
        Ok(level)
    }

    /// Index of the level to draw at `distance_sq`.
    #[inline]
    pub fn resolve(&self, distance_sq: f32) -> usize {
        lod_index(&self.levels, distance_sq)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
