//! Typed layer bitmask

use serde::{Deserialize, Serialize};

/// Maximum number of streaming layers a mask can represent
pub const MAX_LAYERS: usize = 32;

/// Set of streaming layers packed as a bitmask.
///
/// Actors live on exactly one layer; observer boxes carry a mask of the
/// layers they drive. Named operations keep raw bit arithmetic out of
/// call sites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Mask containing no layers
    pub const EMPTY: LayerMask = LayerMask(0);
    /// Mask containing every layer
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Mask containing a single layer
    pub fn from_layer(layer: usize) -> Self {
        debug_assert!(layer < MAX_LAYERS, "layer {} out of range", layer);
        LayerMask(1 << layer)
    }

    /// Mask covering layers `0..count`
    pub fn first_layers(count: usize) -> Self {
        debug_assert!(count <= MAX_LAYERS);
        if count >= MAX_LAYERS {
            LayerMask::ALL
        } else {
            LayerMask((1u32 << count) - 1)
        }
    }

    /// Raw bit pattern
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Add a layer to the mask
    pub fn set(&mut self, layer: usize) {
        debug_assert!(layer < MAX_LAYERS);
        self.0 |= 1 << layer;
    }

    /// Remove a layer from the mask
    pub fn clear(&mut self, layer: usize) {
        debug_assert!(layer < MAX_LAYERS);
        self.0 &= !(1 << layer);
    }

    /// Check whether a layer is in the mask
    pub fn contains(&self, layer: usize) -> bool {
        layer < MAX_LAYERS && self.0 & (1 << layer) != 0
    }

    /// Union of two masks
    pub fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }

    /// True if no layer is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Lowest set layer, if any
    pub fn lowest_layer(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Highest set layer, if any
    pub fn highest_layer(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some((31 - self.0.leading_zeros()) as usize)
        }
    }
}
