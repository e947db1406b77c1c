//! Layered spatial index for streaming queries

pub mod layer_mask;
pub mod quadtree;

pub use layer_mask::{LayerMask, MAX_LAYERS};
pub use quadtree::{ItemHandle, LayerQuadTree, QuadTreeStats};
