/// Allocates and recycles instance ids within a fixed capacity.
///
/// Ids index straight into the registry's per-instance arrays, so they stay
/// dense: freed ids are handed out again before any fresh id is minted, and
/// no id at or above `capacity` is ever produced.
///
/// # Example
///
/// ```ignore
/// let mut ids = SlotAllocator::with_capacity(2);
/// let a = ids.alloc();   // Some(0)
/// let b = ids.alloc();   // Some(1)
/// ids.alloc();           // None, capacity reached
/// ids.free(0);
/// ids.alloc();           // Some(0), recycled
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    next_id: u32,
    len: u32,
    capacity: u32,
}

impl SlotAllocator {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            free_list: Vec::new(),
            next_id: 0,
            len: 0,
            capacity,
        }
    }

    /// Allocate the next available id, or `None` when all `capacity` ids are live.
    pub fn alloc(&mut self) -> Option<u32> {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None if self.next_id < self.capacity => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
            None => return None,
        };
        self.len += 1;
        Some(id)
    }

    /// Return an id to the pool
    pub fn free(&mut self, id: u32) {
        debug_assert!(id < self.next_id, "freeing an unallocated id: {}", id);
        debug_assert!(!self.free_list.contains(&id), "double free of id: {}", id);
        self.len -= 1;
        self.free_list.push(id);
    }

    /// Highest id ever allocated + 1.
    ///
    /// Length the per-instance arrays must have to hold every live id.
    pub fn high_water_mark(&self) -> u32 {
        self.next_id
    }

    /// Number of live ids
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
