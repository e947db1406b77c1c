//! Per-layer load/unload queues and transition state machine
//!
//! Each layer tracks, per actor: idle (unloaded), idle (loaded), pending
//! load, or pending unload. Candidate queues are rebuilt from scan results
//! every tick; pending actors are locked out of recomputation until the
//! loader commits the transition with `complete`. Load candidates are
//! served nearest-first, unload candidates farthest-first.

use crate::core::types::ActorIndex;
use crate::streaming::observer::Candidate;
use std::collections::HashSet;

/// Outcome of committing a pending transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompleteResult {
    /// The actor is now loaded
    Loaded,
    /// The actor is now unloaded
    Unloaded,
    /// The actor was no longer a valid pending entry (removed or reset
    /// mid-flight); safe to ignore
    Stale,
}

/// Queue state for one layer
#[derive(Default)]
struct LayerQueues {
    /// Load candidates, ascending squared distance
    to_load: Vec<(f32, ActorIndex)>,
    /// Unload candidates, descending squared distance
    to_unload: Vec<(f32, ActorIndex)>,
    /// Actors claimed by a load, awaiting complete
    pending_load: HashSet<ActorIndex>,
    /// Actors claimed by an unload, awaiting complete
    pending_unload: HashSet<ActorIndex>,
    /// Actors currently loaded on this layer
    loaded: HashSet<ActorIndex>,
}

/// Load/unload queues for every layer of a world
pub struct StreamQueues {
    layers: Vec<LayerQueues>,
}

impl StreamQueues {
    /// Create queues for `layer_count` layers
    pub fn new(layer_count: usize) -> Self {
        let mut layers = Vec::with_capacity(layer_count);
        layers.resize_with(layer_count, LayerQueues::default);
        Self { layers }
    }

    /// Drop all state and reconfigure the layer count
    pub fn reset(&mut self, layer_count: usize) {
        self.layers.clear();
        self.layers.resize_with(layer_count, LayerQueues::default);
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Clear every layer's candidate queues ahead of a tick's rebuild.
    ///
    /// Pending and loaded bookkeeping survives; only candidacy is
    /// recomputed per tick.
    pub fn begin_tick(&mut self) {
        for layer in &mut self.layers {
            layer.to_load.clear();
            layer.to_unload.clear();
        }
    }

    /// Rebuild one layer's candidate queues from this tick's scan view.
    ///
    /// An unloaded actor in range becomes a load candidate; a loaded actor
    /// out of range becomes an unload candidate. Pending actors are
    /// skipped. Sorting is stable, so equal distances keep the view's
    /// evaluation order.
    pub fn apply_layer(&mut self, layer: usize, view: &[Candidate]) {
        debug_assert!(layer < self.layers.len(), "layer {} out of range", layer);
        let Some(queues) = self.layers.get_mut(layer) else {
            return;
        };

        for candidate in view {
            let actor = candidate.actor;
            if queues.pending_load.contains(&actor) || queues.pending_unload.contains(&actor) {
                continue;
            }
            let is_loaded = queues.loaded.contains(&actor);
            if candidate.in_range && !is_loaded {
                queues.to_load.push((candidate.distance_sq, actor));
            } else if !candidate.in_range && is_loaded {
                queues.to_unload.push((candidate.distance_sq, actor));
            }
        }

        queues.to_load.sort_by(|a, b| a.0.total_cmp(&b.0));
        queues.to_unload.sort_by(|a, b| b.0.total_cmp(&a.0));
    }

    /// Number of load candidates on a layer
    pub fn count_to_load(&self, layer: usize) -> usize {
        self.layers.get(layer).map_or(0, |q| q.to_load.len())
    }

    /// Number of unload candidates on a layer
    pub fn count_to_unload(&self, layer: usize) -> usize {
        self.layers.get(layer).map_or(0, |q| q.to_unload.len())
    }

    /// Peek the nearest load candidate without mutating state
    pub fn min_distance_to_load(&self, layer: usize) -> Option<(f32, ActorIndex)> {
        self.layers.get(layer)?.to_load.first().copied()
    }

    /// Peek the farthest unload candidate without mutating state
    pub fn max_distance_to_unload(&self, layer: usize) -> Option<(f32, ActorIndex)> {
        self.layers.get(layer)?.to_unload.first().copied()
    }

    /// Pop the nearest load candidate within `bound_sq` and mark it
    /// pending. Returns `None` when no candidate qualifies.
    pub fn load(&mut self, layer: usize, bound_sq: f32) -> Option<ActorIndex> {
        let queues = self.layers.get_mut(layer)?;
        let &(distance_sq, actor) = queues.to_load.first()?;
        if distance_sq > bound_sq {
            return None;
        }
        queues.to_load.remove(0);
        queues.pending_load.insert(actor);
        Some(actor)
    }

    /// Pop the farthest unload candidate at or beyond `bound_sq` and mark
    /// it pending. Returns `None` when no candidate qualifies.
    pub fn unload(&mut self, layer: usize, bound_sq: f32) -> Option<ActorIndex> {
        let queues = self.layers.get_mut(layer)?;
        let &(distance_sq, actor) = queues.to_unload.first()?;
        if distance_sq < bound_sq {
            return None;
        }
        queues.to_unload.remove(0);
        queues.pending_unload.insert(actor);
        Some(actor)
    }

    /// Commit a pending transition back to idle.
    ///
    /// A completion for an actor that is not pending (already committed,
    /// or removed mid-flight) reports `Stale` instead of failing.
    pub fn complete(&mut self, is_loading: bool, layer: usize, actor: ActorIndex) -> CompleteResult {
        let Some(queues) = self.layers.get_mut(layer) else {
            return CompleteResult::Stale;
        };
        if is_loading {
            if queues.pending_load.remove(&actor) {
                queues.loaded.insert(actor);
                CompleteResult::Loaded
            } else {
                CompleteResult::Stale
            }
        } else if queues.pending_unload.remove(&actor) {
            queues.loaded.remove(&actor);
            CompleteResult::Unloaded
        } else {
            CompleteResult::Stale
        }
    }

    /// Whether an actor is loaded on a layer
    pub fn is_loaded(&self, layer: usize, actor: ActorIndex) -> bool {
        self.layers.get(layer).is_some_and(|q| q.loaded.contains(&actor))
    }

    /// Whether an actor has a pending transition on a layer
    pub fn is_pending(&self, layer: usize, actor: ActorIndex) -> bool {
        self.layers.get(layer).is_some_and(|q| {
            q.pending_load.contains(&actor) || q.pending_unload.contains(&actor)
        })
    }

    /// Purge every trace of an actor across all layers.
    ///
    /// Called when the actor's record is overwritten or removed; a later
    /// completion for it then reports stale.
    pub fn forget(&mut self, actor: ActorIndex) {
        for queues in &mut self.layers {
            queues.to_load.retain(|&(_, a)| a != actor);
            queues.to_unload.retain(|&(_, a)| a != actor);
            queues.pending_load.remove(&actor);
            queues.pending_unload.remove(&actor);
            queues.loaded.remove(&actor);
        }
    }
}
