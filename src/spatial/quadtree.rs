//! Layered quadtree index over axis-aligned boxes
//!
//! Partitions world x/z into a quadtree while storing full 3D boxes.
//! Each stored box lives on exactly one streaming layer; queries filter
//! by a [`LayerMask`]. Items are addressed through generation-checked
//! handles so removal of a stale handle is a cheap no-op instead of a
//! corruption hazard.

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::spatial::layer_mask::LayerMask;

/// Maximum depth for quadtree subdivision
const MAX_DEPTH: u8 = 10;
/// Maximum items per leaf before subdivision
const MAX_ITEMS_PER_NODE: usize = 8;
/// Minimum node size in x/z to prevent infinite subdivision
const MIN_NODE_SIZE: f32 = 1.0;

/// Handle to a stored box.
///
/// Becomes stale once the item is removed or the tree is reset; stale
/// handles are rejected by generation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    index: u32,
    generation: u32,
}

/// A box stored in the tree
#[derive(Clone, Debug)]
struct Item {
    aabb: Aabb,
    layer: usize,
    value: u32,
    /// Owning node, for O(1) removal
    node: u32,
}

/// Slot in the item arena; generation bumps on free
#[derive(Clone, Debug, Default)]
struct ItemSlot {
    generation: u32,
    item: Option<Item>,
}

/// A node in the tree; leaf until `children` is set
#[derive(Clone, Debug)]
struct Node {
    bounds: Aabb,
    depth: u8,
    /// Child node indices (quadrant bit 0 = +x, bit 1 = +z), None if leaf
    children: Option<[u32; 4]>,
    /// Item slot indices held directly by this node
    items: Vec<u32>,
}

impl Node {
    fn new(bounds: Aabb, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            items: Vec::new(),
        }
    }

    /// Whether this node is large enough in x/z to split
    fn can_subdivide(&self) -> bool {
        let size = self.bounds.size();
        size.x > MIN_NODE_SIZE && size.z > MIN_NODE_SIZE
    }

    /// Bounds of a child quadrant (y span is inherited unchanged)
    fn child_bounds(&self, quadrant: usize) -> Aabb {
        let center = self.bounds.center();
        let (min, max) = (self.bounds.min, self.bounds.max);
        let x = if quadrant & 1 != 0 {
            (center.x, max.x)
        } else {
            (min.x, center.x)
        };
        let z = if quadrant & 2 != 0 {
            (center.z, max.z)
        } else {
            (min.z, center.z)
        };
        Aabb::new(Vec3::new(x.0, min.y, z.0), Vec3::new(x.1, max.y, z.1))
    }
}

/// Tree structure statistics
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadTreeStats {
    /// Total nodes, leaves included
    pub node_count: usize,
    /// Stored items
    pub item_count: usize,
    /// Deepest node depth
    pub max_depth: u8,
}

/// Layered quadtree spatial index.
///
/// Boxes sink to the deepest node that fully contains them; boxes outside
/// the tree bounds stay on the root so they remain queryable.
pub struct LayerQuadTree {
    nodes: Vec<Node>,
    slots: Vec<ItemSlot>,
    free_slots: Vec<u32>,
    layer_count: usize,
    item_count: usize,
}

impl LayerQuadTree {
    /// Create an empty tree over the given world bounds
    pub fn new(layer_count: usize, min: Vec3, max: Vec3) -> Self {
        debug_assert!(layer_count <= crate::spatial::MAX_LAYERS);
        Self {
            nodes: vec![Node::new(Aabb::new(min, max), 0)],
            slots: Vec::new(),
            free_slots: Vec::new(),
            layer_count,
            item_count: 0,
        }
    }

    /// Reinitialize to empty with new bounds and layer count.
    ///
    /// All outstanding handles become stale.
    pub fn reset(&mut self, layer_count: usize, min: Vec3, max: Vec3) {
        debug_assert!(layer_count <= crate::spatial::MAX_LAYERS);
        self.nodes.clear();
        self.nodes.push(Node::new(Aabb::new(min, max), 0));
        self.free_slots.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_slots.push(idx as u32);
        }
        self.layer_count = layer_count;
        self.item_count = 0;
    }

    /// Number of configured layers
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.item_count
    }

    /// True when no items are stored
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Insert a box on a layer, returning its handle.
    ///
    /// Degenerate (zero-volume) boxes are legal. Layer indices must be in
    /// `0..layer_count`.
    pub fn insert(&mut self, layer: usize, aabb: Aabb, value: u32) -> ItemHandle {
        debug_assert!(
            layer < self.layer_count,
            "layer {} out of range ({} layers)",
            layer,
            self.layer_count
        );

        let node = self.find_target_node(&aabb);
        let slot_idx = self.allocate_slot(Item {
            aabb,
            layer,
            value,
            node,
        });
        self.nodes[node as usize].items.push(slot_idx);
        self.item_count += 1;

        let handle = ItemHandle {
            index: slot_idx,
            generation: self.slots[slot_idx as usize].generation,
        };
        self.maybe_subdivide(node);
        handle
    }

    /// Remove a box by handle.
    ///
    /// Returns false for stale or already-removed handles.
    pub fn remove(&mut self, handle: ItemHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation {
            return false;
        }
        let Some(item) = slot.item.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);

        let items = &mut self.nodes[item.node as usize].items;
        if let Some(pos) = items.iter().position(|&s| s == handle.index) {
            items.swap_remove(pos);
        }
        self.free_slots.push(handle.index);
        self.item_count -= 1;
        true
    }

    /// Visit every stored box overlapping `query` whose layer is in `mask`.
    ///
    /// Full overlap scan: the visitor is called for every match, with the
    /// stored value and its layer. No early termination.
    pub fn search<F: FnMut(u32, usize)>(&self, query: &Aabb, mask: LayerMask, mut visitor: F) {
        let mut stack = vec![0u32];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx as usize];
            for &slot_idx in &node.items {
                if let Some(item) = &self.slots[slot_idx as usize].item {
                    if mask.contains(item.layer) && item.aabb.intersects(query) {
                        visitor(item.value, item.layer);
                    }
                }
            }
            if let Some(children) = node.children {
                for child in children {
                    if self.nodes[child as usize].bounds.intersects(query) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    /// Gather tree structure statistics
    pub fn stats(&self) -> QuadTreeStats {
        QuadTreeStats {
            node_count: self.nodes.len(),
            item_count: self.item_count,
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }

    /// Deepest existing node that fully contains `aabb`.
    ///
    /// Boxes not contained by the root (outside world bounds) stay on the
    /// root so they remain queryable.
    fn find_target_node(&self, aabb: &Aabb) -> u32 {
        let mut node_idx = 0u32;
        loop {
            let node = &self.nodes[node_idx as usize];
            let Some(children) = node.children else {
                return node_idx;
            };
            let mut descended = false;
            for child in children {
                if self.nodes[child as usize].bounds.contains_aabb(aabb) {
                    node_idx = child;
                    descended = true;
                    break;
                }
            }
            if !descended {
                return node_idx;
            }
        }
    }

    fn allocate_slot(&mut self, item: Item) -> u32 {
        if let Some(idx) = self.free_slots.pop() {
            self.slots[idx as usize].item = Some(item);
            idx
        } else {
            self.slots.push(ItemSlot {
                generation: 0,
                item: Some(item),
            });
            (self.slots.len() - 1) as u32
        }
    }

    /// Split a leaf over capacity and sink contained items into children
    fn maybe_subdivide(&mut self, node_idx: u32) {
        let node = &self.nodes[node_idx as usize];
        if node.children.is_some()
            || node.items.len() <= MAX_ITEMS_PER_NODE
            || node.depth >= MAX_DEPTH
            || !node.can_subdivide()
        {
            return;
        }

        let child_depth = node.depth + 1;
        let child_bounds: Vec<Aabb> = (0..4).map(|q| node.child_bounds(q)).collect();
        let first_child = self.nodes.len() as u32;
        for bounds in child_bounds {
            self.nodes.push(Node::new(bounds, child_depth));
        }
        let children = [first_child, first_child + 1, first_child + 2, first_child + 3];
        self.nodes[node_idx as usize].children = Some(children);

        // Redistribute items into the child that fully contains each box;
        // straddling boxes stay on this node.
        let items = std::mem::take(&mut self.nodes[node_idx as usize].items);
        for slot_idx in items {
            let aabb = self.slots[slot_idx as usize]
                .item
                .as_ref()
                .map(|item| item.aabb);
            let Some(aabb) = aabb else { continue };

            let mut target = node_idx;
            for child in children {
                if self.nodes[child as usize].bounds.contains_aabb(&aabb) {
                    target = child;
                    break;
                }
            }
            self.nodes[target as usize].items.push(slot_idx);
            if let Some(item) = self.slots[slot_idx as usize].item.as_mut() {
                item.node = target;
            }
        }
    }
}
