/// BatchBvh: dynamic AABB tree over the instances of one batch.
///
/// Binary tree stored in a node arena with a free list. Every leaf holds a
/// single instance id; an id → leaf map gives O(1) access for `update` and
/// `remove`. Boxes are in the batch's local space.
///
/// With `margin > 0` each leaf stores its exact box enlarged by the margin,
/// so small moves only update the exact box and leave the tree untouched.
/// Frustum culling then runs one more exact test per partially visible leaf
/// when `accurate_culling` is set.
///
/// Incremental inserts and removals rebalance on the way up with tree
/// rotations, so instances arriving in spatial order keep the depth
/// logarithmic.

use rustc_hash::FxHashMap;
use glam::Mat4;
use crate::camera::{Frustum, FrustumTest};
use crate::math::{AABB, Ray};
use super::builder::{self, BuildPrimitive};

const SOURCE: &str = "galaxy3d::Bvh";

/// Null node / object index
const NONE: u32 = u32::MAX;

/// BVH construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhConfig {
    /// Enlargement of every leaf box, in batch-local units
    pub margin: f32,
    /// Test the exact box of partially visible leaves (only when `margin > 0`)
    pub accurate_culling: bool,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self { margin: 0.0, accurate_culling: true }
    }
}

/// An instance id with its exact batch-local box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhItem {
    pub id: u32,
    pub aabb: AABB,
}

impl BvhItem {
    pub fn new(id: u32, aabb: AABB) -> Self {
        Self { id, aabb }
    }
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    /// Stored box (exact box + margin for leaves, union of children otherwise)
    aabb: AABB,
    /// Exact box (leaves only)
    tight: AABB,
    parent: u32,
    left: u32,
    right: u32,
    /// Instance id (leaves only)
    object: u32,
    /// 0 for leaves
    height: u32,
}

impl BvhNode {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.left == NONE
    }
}

pub struct BatchBvh {
    nodes: Vec<BvhNode>,
    free_nodes: Vec<u32>,
    root: u32,
    /// Instance id → leaf node index
    leaves: FxHashMap<u32, u32>,
    config: BvhConfig,
}

impl BatchBvh {
    pub fn new(config: BvhConfig) -> Self {
        Self {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: NONE,
            leaves: FxHashMap::default(),
            config,
        }
    }

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root == NONE
    }

    pub fn contains(&self, id: u32) -> bool {
        self.leaves.contains_key(&id)
    }

    /// Stored (margin-enlarged) box of an instance
    pub fn leaf_aabb(&self, id: u32) -> Option<&AABB> {
        self.leaves.get(&id).map(|&leaf| &self.nodes[leaf as usize].aabb)
    }

    /// Box enclosing the whole tree
    pub fn root_aabb(&self) -> Option<&AABB> {
        if self.root == NONE {
            None
        } else {
            Some(&self.nodes[self.root as usize].aabb)
        }
    }

    // ============================================================================
    // CONSTRUCTION
    // ============================================================================

    /// Discard the tree and build it top-down from `items`.
    pub fn build(&mut self, items: &[BvhItem]) {
        self.clear();
        if items.is_empty() {
            return;
        }

        let mut prims = self.build_primitives(items);
        self.nodes.reserve(prims.len() * 2 - 1);
        self.root = self.build_recursive(&mut prims, NONE);

        crate::engine_debug!(
            SOURCE,
            "BVH built: {} instances, {} nodes",
            self.leaves.len(),
            self.nodes.len()
        );
    }

    /// Drop every node and id.
    pub fn clear(&mut self) {
        let count = self.leaves.len();
        self.nodes.clear();
        self.free_nodes.clear();
        self.leaves.clear();
        self.root = NONE;
        if count > 0 {
            crate::engine_debug!(SOURCE, "BVH cleared ({} instances)", count);
        }
    }

    fn build_primitives(&self, items: &[BvhItem]) -> Vec<BuildPrimitive> {
        items
            .iter()
            .map(|item| BuildPrimitive::new(item.id, item.aabb, self.config.margin))
            .collect()
    }

    fn build_recursive(&mut self, prims: &mut [BuildPrimitive], parent: u32) -> u32 {
        if prims.len() == 1 {
            let prim = prims[0];
            let leaf = self.alloc_leaf(prim.id, prim.tight, prim.aabb);
            self.nodes[leaf as usize].parent = parent;
            return leaf;
        }

        let mid = builder::split(prims);
        let (left_prims, right_prims) = prims.split_at_mut(mid);

        let node = self.alloc_node(BvhNode {
            aabb: AABB::EMPTY,
            tight: AABB::EMPTY,
            parent,
            left: NONE,
            right: NONE,
            object: NONE,
            height: 0,
        });
        let left = self.build_recursive(left_prims, node);
        let right = self.build_recursive(right_prims, node);

        let n = &mut self.nodes[node as usize];
        n.left = left;
        n.right = right;
        self.update_node(node);
        node
    }

    // ============================================================================
    // INCREMENTAL UPDATES
    // ============================================================================

    /// Index one instance. An id already present is moved instead.
    pub fn insert(&mut self, id: u32, aabb: AABB) {
        if self.contains(id) {
            self.update(id, aabb);
            return;
        }
        let fat = self.fat(&aabb);
        let leaf = self.alloc_leaf(id, aabb, fat);
        self.insert_leaf(leaf);
    }

    /// Index many instances at once.
    ///
    /// New ids are built into a subtree that is then inserted as a single
    /// node. Ids already present are moved.
    pub fn insert_range(&mut self, items: &[BvhItem]) {
        if self.is_empty() {
            self.build(items);
            return;
        }

        let mut fresh = Vec::with_capacity(items.len());
        for item in items {
            if self.contains(item.id) {
                self.update(item.id, item.aabb);
            } else {
                fresh.push(*item);
            }
        }
        if fresh.is_empty() {
            return;
        }

        let mut prims = self.build_primitives(&fresh);
        let subtree = self.build_recursive(&mut prims, NONE);
        self.insert_leaf(subtree);
    }

    /// Move an instance to a new exact box.
    ///
    /// The tree is only restructured when the new box leaves the stored
    /// (margin-enlarged) box. Unknown ids are ignored.
    pub fn update(&mut self, id: u32, aabb: AABB) {
        let Some(&leaf) = self.leaves.get(&id) else {
            return;
        };

        let node = &mut self.nodes[leaf as usize];
        node.tight = aabb;
        if node.aabb.contains(&aabb) {
            if self.config.margin > 0.0 {
                return;
            }
            // No margin: shrink in place
            node.aabb = aabb;
            let mut index = node.parent;
            while index != NONE {
                self.update_node(index);
                index = self.nodes[index as usize].parent;
            }
            return;
        }

        self.remove_leaf(leaf);
        self.nodes[leaf as usize].aabb = self.fat(&aabb);
        self.insert_leaf(leaf);
    }

    /// Remove an instance. Unknown ids are ignored.
    pub fn remove(&mut self, id: u32) {
        let Some(leaf) = self.leaves.remove(&id) else {
            return;
        };
        self.remove_leaf(leaf);
        self.free_node(leaf);
    }

    fn fat(&self, aabb: &AABB) -> AABB {
        if self.config.margin > 0.0 {
            aabb.expanded(self.config.margin)
        } else {
            *aabb
        }
    }

    /// Attach a detached node (leaf or subtree root) next to the sibling with
    /// the lowest surface-area cost.
    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NONE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NONE;
            return;
        }

        let leaf_box = self.nodes[leaf as usize].aabb;
        let sibling = self.find_sibling(&leaf_box);

        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.alloc_node(BvhNode {
            aabb: AABB::EMPTY,
            tight: AABB::EMPTY,
            parent: old_parent,
            left: sibling,
            right: leaf,
            object: NONE,
            height: 0,
        });
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent == NONE {
            self.root = new_parent;
        } else {
            self.replace_child(old_parent, sibling, new_parent);
        }
        self.refit(new_parent);
    }

    /// Greedy descent: stop where creating a parent here is cheaper than
    /// pushing the box further down.
    fn find_sibling(&self, leaf_box: &AABB) -> u32 {
        let mut index = self.root;

        loop {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                return index;
            }

            let area = node.aabb.surface_area();
            let combined_area = node.aabb.union(leaf_box).surface_area();

            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let child_cost = |child: u32| {
                let child = &self.nodes[child as usize];
                let union_area = child.aabb.union(leaf_box).surface_area();
                if child.is_leaf() {
                    union_area + inheritance_cost
                } else {
                    union_area - child.aabb.surface_area() + inheritance_cost
                }
            };
            let cost_left = child_cost(node.left);
            let cost_right = child_cost(node.right);

            if cost < cost_left && cost < cost_right {
                return index;
            }
            index = if cost_left <= cost_right { node.left } else { node.right };
        }
    }

    /// Detach a node from the tree, collapsing its parent. The node itself
    /// is kept.
    fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NONE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let p = &self.nodes[parent as usize];
        let sibling = if p.left == leaf { p.right } else { p.left };

        if grand_parent == NONE {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NONE;
        } else {
            self.replace_child(grand_parent, parent, sibling);
            self.nodes[sibling as usize].parent = grand_parent;
            self.refit(grand_parent);
        }
        self.free_node(parent);
        self.nodes[leaf as usize].parent = NONE;
    }

    fn replace_child(&mut self, parent: u32, old_child: u32, new_child: u32) {
        let p = &mut self.nodes[parent as usize];
        if p.left == old_child {
            p.left = new_child;
        } else {
            p.right = new_child;
        }
    }

    /// Recompute boxes and heights from `index` up to the root, rotating
    /// unbalanced nodes on the way.
    fn refit(&mut self, mut index: u32) {
        while index != NONE {
            self.update_node(index);
            index = self.balance(index);
            index = self.nodes[index as usize].parent;
        }
    }

    /// Box and height of an internal node from its children.
    fn update_node(&mut self, index: u32) {
        let node = self.nodes[index as usize];
        let left = &self.nodes[node.left as usize];
        let right = &self.nodes[node.right as usize];
        let aabb = left.aabb.union(&right.aabb);
        let height = 1 + left.height.max(right.height);

        let n = &mut self.nodes[index as usize];
        n.aabb = aabb;
        n.tight = aabb;
        n.height = height;
    }

    /// Rotate the taller child of `index` up when the child heights differ
    /// by more than one. Returns the node now at that position.
    fn balance(&mut self, index: u32) -> u32 {
        let node = self.nodes[index as usize];
        if node.is_leaf() || node.height < 2 {
            return index;
        }

        let left_height = self.nodes[node.left as usize].height as i64;
        let right_height = self.nodes[node.right as usize].height as i64;
        let diff = right_height - left_height;
        if diff > 1 {
            self.rotate_up(index, node.right, false)
        } else if diff < -1 {
            self.rotate_up(index, node.left, true)
        } else {
            index
        }
    }

    /// Promote `child` into the place of its parent `index`.
    ///
    /// `child` keeps its taller child and adopts `index`, which takes the
    /// shorter one in place of `child`.
    ///
    /// ```text
    ///       index             child
    ///      /     \           /     \
    ///   other   child  →  index   taller
    ///           /   \      /   \
    ///      taller shorter other shorter
    /// ```
    fn rotate_up(&mut self, index: u32, child: u32, child_is_left: bool) -> u32 {
        let parent = self.nodes[index as usize].parent;
        let c = self.nodes[child as usize];
        let (taller, shorter) = if self.nodes[c.left as usize].height > self.nodes[c.right as usize].height {
            (c.left, c.right)
        } else {
            (c.right, c.left)
        };

        self.nodes[child as usize].parent = parent;
        if parent == NONE {
            self.root = child;
        } else {
            self.replace_child(parent, index, child);
        }

        let n = &mut self.nodes[index as usize];
        if child_is_left {
            n.left = shorter;
        } else {
            n.right = shorter;
        }
        n.parent = child;
        self.nodes[shorter as usize].parent = index;

        let c = &mut self.nodes[child as usize];
        c.left = index;
        c.right = taller;

        self.update_node(index);
        // The demoted node may still lean to one side
        self.balance(index);
        self.update_node(child);
        child
    }

    // ============================================================================
    // NODE ARENA
    // ============================================================================

    fn alloc_node(&mut self, node: BvhNode) -> u32 {
        match self.free_nodes.pop() {
            Some(index) => {
                self.nodes[index as usize] = node;
                index
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn alloc_leaf(&mut self, id: u32, tight: AABB, aabb: AABB) -> u32 {
        let leaf = self.alloc_node(BvhNode {
            aabb,
            tight,
            parent: NONE,
            left: NONE,
            right: NONE,
            object: id,
            height: 0,
        });
        self.leaves.insert(id, leaf);
        leaf
    }

    fn free_node(&mut self, index: u32) {
        self.nodes[index as usize].object = NONE;
        self.free_nodes.push(index);
    }

    // ============================================================================
    // QUERIES
    // ============================================================================

    /// Visit every instance whose box may intersect the frustum of `matrix`
    /// (projection * view * batch world).
    ///
    /// 3-way classification at each node:
    /// - `Outside` → skip the subtree
    /// - `Inside` → collect every leaf below without further tests
    /// - `Partial` → test children, or the exact box of a leaf
    pub fn frustum_culling<F: FnMut(u32)>(&self, matrix: &Mat4, mut visitor: F) {
        if self.root == NONE {
            return;
        }
        let frustum = Frustum::from_view_projection(matrix);
        let accurate = self.config.accurate_culling && self.config.margin > 0.0;

        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            match frustum.classify_aabb(&node.aabb) {
                FrustumTest::Outside => {}

                FrustumTest::Inside => self.collect_all(index, &mut visitor),

                FrustumTest::Partial => {
                    if node.is_leaf() {
                        if !accurate || frustum.intersects_aabb(&node.tight) {
                            visitor(node.object);
                        }
                    } else {
                        stack.push(node.left);
                        stack.push(node.right);
                    }
                }
            }
        }
    }

    fn collect_all<F: FnMut(u32)>(&self, index: u32, visitor: &mut F) {
        let mut stack = vec![index];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                visitor(node.object);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    /// Number of node levels (0 when empty, 1 for a single leaf)
    pub fn depth(&self) -> u32 {
        if self.root == NONE {
            0
        } else {
            self.nodes[self.root as usize].height + 1
        }
    }

    /// Visit every instance whose exact box the ray crosses within
    /// `[near, far]`.
    pub fn raycast<F: FnMut(u32)>(&self, ray: &Ray, near: f32, far: f32, mut visitor: F) {
        if self.root == NONE {
            return;
        }

        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                if ray.intersect_aabb(&node.tight, near, far).is_some() {
                    visitor(node.object);
                }
                continue;
            }
            if ray.intersect_aabb(&node.aabb, near, far).is_some() {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    /// Visit every instance whose exact box intersects `aabb`. Returns
    /// whether any was found.
    pub fn intersect_box<F: FnMut(u32)>(&self, aabb: &AABB, mut visitor: F) -> bool {
        if self.root == NONE {
            return false;
        }

        let mut found = false;
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                if node.tight.intersects(aabb) {
                    visitor(node.object);
                    found = true;
                }
                continue;
            }
            if node.aabb.intersects(aabb) {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        found
    }
}

#[cfg(test)]
#[path = "bvh_tests.rs"]
mod tests;
