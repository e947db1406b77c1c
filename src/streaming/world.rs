//! Streaming world facade
//!
//! Owns the spatial index, actor pool, active set, and per-layer queues,
//! and exposes the whole per-tick contract: spatial maintenance (`set`,
//! `move_actor`, `activate`, `deactivate`, `reset`), the observer scan
//! (`apply`), and the loader interface (`load`/`unload`/`complete` plus
//! count and distance peeks).

use crate::actor::{ActiveSet, ActorPool, ActorRecord};
use crate::core::types::{ActorIndex, Quat, Vec3};
use crate::math::Aabb;
use crate::spatial::{LayerQuadTree, QuadTreeStats};
use crate::streaming::config::WorldConfig;
use crate::streaming::observer::{self, ObserverBox};
use crate::streaming::queues::{CompleteResult, StreamQueues};
use crate::streaming::stats::StreamStats;

/// Default cap on transitions drained per tick by `drain_loads`
pub const DEFAULT_MAX_TRANSITIONS_PER_TICK: usize = 64;

/// A streaming world: one spatial index, one actor population, one set of
/// per-layer load/unload queues.
pub struct StreamingWorld {
    index: LayerQuadTree,
    pool: ActorPool,
    active: ActiveSet,
    queues: StreamQueues,
    stats: StreamStats,
    layer_count: usize,
    max_transitions_per_tick: usize,
}

impl StreamingWorld {
    /// Create a world over the given bounds
    pub fn new(layer_count: usize, min: Vec3, max: Vec3) -> Self {
        Self {
            index: LayerQuadTree::new(layer_count, min, max),
            pool: ActorPool::new(),
            active: ActiveSet::new(),
            queues: StreamQueues::new(layer_count),
            stats: StreamStats::default(),
            layer_count,
            max_transitions_per_tick: DEFAULT_MAX_TRANSITIONS_PER_TICK,
        }
    }

    /// Create a world from a configuration
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut world = Self::new(config.layer_count, config.min(), config.max());
        world.max_transitions_per_tick = config.max_transitions_per_tick;
        log::info!(
            "streaming world: {} layers, bounds {:?}..{:?}",
            config.layer_count,
            config.world_min,
            config.world_max
        );
        world
    }

    /// Drop all actors and queues and re-partition over new bounds.
    ///
    /// All spatial handles and pending transitions are invalidated; a
    /// `complete` for a pre-reset transition reports stale.
    pub fn reset(&mut self, layer_count: usize, min: Vec3, max: Vec3) {
        self.index.reset(layer_count, min, max);
        self.pool.clear();
        self.active.clear();
        self.queues.reset(layer_count);
        self.stats = StreamStats::default();
        self.layer_count = layer_count;
        log::info!("streaming world reset: {} layers", layer_count);
    }

    // --- Spatial maintenance ---

    /// Create or replace the actor at `actor`.
    ///
    /// Replacing a live actor removes its old spatial entry and purges its
    /// queue bookkeeping; active-set membership is left as-is.
    pub fn set(
        &mut self,
        actor: ActorIndex,
        stage_index: i32,
        layer: usize,
        rotation: Quat,
        position: Vec3,
        bounds_min: Vec3,
        bounds_max: Vec3,
    ) {
        debug_assert!(layer < self.layer_count, "layer {} out of range", layer);

        if let Some(old) = self.pool.get(actor) {
            let old_spatial = old.spatial;
            self.index.remove(old_spatial);
            self.queues.forget(actor);
        }

        let aabb = Aabb::new(position + bounds_min, position + bounds_max);
        let spatial = self.index.insert(layer, aabb, actor);
        self.pool.insert(
            actor,
            ActorRecord {
                stage_index,
                position,
                rotation,
                layer,
                bounds_min,
                bounds_max,
                spatial,
            },
        );
        log::trace!("set actor {} on layer {} at {:?}", actor, layer, position);
    }

    /// Move an actor, replacing its spatial entry.
    ///
    /// Returns the previous stage index so the caller can detect stage
    /// transitions, or `None` when the actor is unknown.
    pub fn move_actor(
        &mut self,
        actor: ActorIndex,
        stage_index: i32,
        rotation: Quat,
        position: Vec3,
    ) -> Option<i32> {
        let record = self.pool.get(actor)?;
        let prev_stage = record.stage_index;
        let layer = record.layer;
        let bounds_min = record.bounds_min;
        let bounds_max = record.bounds_max;
        let old_spatial = record.spatial;

        self.index.remove(old_spatial);
        let aabb = Aabb::new(position + bounds_min, position + bounds_max);
        let spatial = self.index.insert(layer, aabb, actor);

        if let Some(record) = self.pool.get_mut(actor) {
            record.stage_index = stage_index;
            record.rotation = rotation;
            record.position = position;
            record.spatial = spatial;
        }
        Some(prev_stage)
    }

    /// Make an actor eligible for streaming evaluation.
    ///
    /// Returns true when membership changed; false when already active or
    /// when no record exists at `actor`.
    pub fn activate(&mut self, actor: ActorIndex) -> bool {
        if !self.pool.contains(actor) {
            return false;
        }
        self.active.activate(actor)
    }

    /// Remove an actor from streaming evaluation; idempotent
    pub fn deactivate(&mut self, actor: ActorIndex) -> bool {
        self.active.deactivate(actor)
    }

    // --- Per-tick scan ---

    /// Recompute every layer's candidate queues from this tick's
    /// observers.
    ///
    /// Layers between the lowest and highest occupied layer are
    /// re-evaluated even when no candidate currently sits on them.
    pub fn apply(&mut self, observers: &[ObserverBox]) {
        let result = observer::scan(
            &self.index,
            &self.pool,
            &self.active,
            observers,
            self.layer_count,
        );

        self.queues.begin_tick();
        if let (Some(lo), Some(hi)) = (
            result.occupied.lowest_layer(),
            result.occupied.highest_layer(),
        ) {
            for layer in lo..=hi {
                self.queues.apply_layer(layer, &result.by_layer[layer]);
            }
        }

        self.stats.ticks += 1;
        self.stats.candidates_last_tick = result.candidate_count;
        log::debug!(
            "tick {}: {} observers, {} candidates",
            self.stats.ticks,
            observers.len(),
            result.candidate_count
        );
    }

    // --- Loader interface ---

    /// Number of load candidates on a layer
    pub fn count_to_load(&self, layer: usize) -> usize {
        self.queues.count_to_load(layer)
    }

    /// Number of unload candidates on a layer
    pub fn count_to_unload(&self, layer: usize) -> usize {
        self.queues.count_to_unload(layer)
    }

    /// Peek the nearest load candidate without mutating state
    pub fn min_distance_to_load(&self, layer: usize) -> Option<(f32, ActorIndex)> {
        self.queues.min_distance_to_load(layer)
    }

    /// Peek the farthest unload candidate without mutating state
    pub fn max_distance_to_unload(&self, layer: usize) -> Option<(f32, ActorIndex)> {
        self.queues.max_distance_to_unload(layer)
    }

    /// Claim the nearest load candidate within `bound_sq`
    pub fn load(&mut self, layer: usize, bound_sq: f32) -> Option<ActorIndex> {
        let actor = self.queues.load(layer, bound_sq)?;
        log::trace!("load claimed: actor {} on layer {}", actor, layer);
        Some(actor)
    }

    /// Claim the farthest unload candidate at or beyond `bound_sq`
    pub fn unload(&mut self, layer: usize, bound_sq: f32) -> Option<ActorIndex> {
        let actor = self.queues.unload(layer, bound_sq)?;
        log::trace!("unload claimed: actor {} on layer {}", actor, layer);
        Some(actor)
    }

    /// Claim load candidates within `bound_sq`, up to the per-tick
    /// transition cap, nearest first
    pub fn drain_loads(&mut self, layer: usize, bound_sq: f32) -> Vec<ActorIndex> {
        let mut claimed = Vec::new();
        while claimed.len() < self.max_transitions_per_tick {
            match self.queues.load(layer, bound_sq) {
                Some(actor) => claimed.push(actor),
                None => break,
            }
        }
        claimed
    }

    /// Commit a pending transition claimed by `load` or `unload`
    pub fn complete(
        &mut self,
        is_loading: bool,
        layer: usize,
        actor: ActorIndex,
    ) -> CompleteResult {
        let result = self.queues.complete(is_loading, layer, actor);
        match result {
            CompleteResult::Loaded => self.stats.loads_committed += 1,
            CompleteResult::Unloaded => self.stats.unloads_committed += 1,
            CompleteResult::Stale => {
                self.stats.stale_completions += 1;
                log::trace!(
                    "stale completion: actor {} on layer {} (is_loading={})",
                    actor,
                    layer,
                    is_loading
                );
            }
        }
        result
    }

    // --- Read-only queries ---

    /// Whether a record exists at `actor`
    pub fn contains(&self, actor: ActorIndex) -> bool {
        self.pool.contains(actor)
    }

    /// World position of an actor
    pub fn position(&self, actor: ActorIndex) -> Option<Vec3> {
        self.pool.get(actor).map(|r| r.position)
    }

    /// Stage index of an actor
    pub fn stage_index(&self, actor: ActorIndex) -> Option<i32> {
        self.pool.get(actor).map(|r| r.stage_index)
    }

    /// Streaming layer of an actor
    pub fn layer(&self, actor: ActorIndex) -> Option<usize> {
        self.pool.get(actor).map(|r| r.layer)
    }

    /// Active actor indices, ascending
    pub fn active_indices(&self) -> Vec<ActorIndex> {
        let mut indices: Vec<_> = self.active.iter().collect();
        indices.sort_unstable();
        indices
    }

    /// Number of configured layers
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Streaming counters
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Spatial index structure statistics
    pub fn spatial_stats(&self) -> QuadTreeStats {
        self.index.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::LayerMask;

    fn test_world() -> StreamingWorld {
        StreamingWorld::new(1, Vec3::ZERO, Vec3::splat(100.0))
    }

    fn spawn(world: &mut StreamingWorld, actor: ActorIndex, layer: usize, position: Vec3) {
        world.set(
            actor,
            0,
            layer,
            Quat::IDENTITY,
            position,
            -Vec3::ONE,
            Vec3::ONE,
        );
        assert!(world.activate(actor));
    }

    fn observer_at(position: Vec3, half: f32, mask: LayerMask) -> ObserverBox {
        ObserverBox::new(position, Vec3::splat(-half), Vec3::splat(half), mask)
    }

    #[test]
    fn test_single_actor_enters_range() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);

        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);

        assert_eq!(world.count_to_load(0), 1);
        assert_eq!(world.count_to_unload(0), 0);
        assert_eq!(world.min_distance_to_load(0), Some((0.0, 0)));
    }

    #[test]
    fn test_load_complete_round_trip() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);
        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);

        assert_eq!(world.load(0, f32::MAX), Some(0));
        // Candidate is already pending
        assert_eq!(world.load(0, f32::MAX), None);

        assert_eq!(world.complete(true, 0, 0), CompleteResult::Loaded);
        assert_eq!(world.complete(true, 0, 0), CompleteResult::Stale);

        let stats = world.stats();
        assert_eq!(stats.loads_committed, 1);
        assert_eq!(stats.stale_completions, 1);
    }

    #[test]
    fn test_loaded_actor_leaves_range_and_unloads() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);
        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);
        world.load(0, f32::MAX).unwrap();
        world.complete(true, 0, 0);

        // Observer moves away: the loaded actor becomes an unload candidate
        world.apply(&[observer_at(
            Vec3::new(5.0, 0.0, 5.0),
            2.0,
            LayerMask::from_layer(0),
        )]);
        assert_eq!(world.count_to_load(0), 0);
        assert_eq!(world.count_to_unload(0), 1);

        assert_eq!(world.unload(0, 0.0), Some(0));
        assert_eq!(world.complete(false, 0, 0), CompleteResult::Unloaded);
        assert_eq!(world.stats().unloads_committed, 1);
    }

    #[test]
    fn test_move_preserves_identity() {
        let mut world = test_world();
        world.set(
            3,
            11,
            0,
            Quat::IDENTITY,
            Vec3::new(10.0, 0.0, 10.0),
            -Vec3::ONE,
            Vec3::ONE,
        );

        let prev = world.move_actor(3, 12, Quat::IDENTITY, Vec3::new(20.0, 0.0, 20.0));
        assert_eq!(prev, Some(11));
        assert_eq!(world.stage_index(3), Some(12));
        assert_eq!(world.position(3), Some(Vec3::new(20.0, 0.0, 20.0)));
    }

    #[test]
    fn test_move_unknown_actor() {
        let mut world = test_world();
        assert_eq!(
            world.move_actor(9, 0, Quat::IDENTITY, Vec3::ZERO),
            None
        );
    }

    #[test]
    fn test_moved_actor_tracked_at_new_position() {
        let mut world = test_world();
        spawn(&mut world, 0, 0, Vec3::new(10.0, 0.0, 10.0));

        // Out of range at first
        let far = observer_at(Vec3::new(90.0, 0.0, 90.0), 5.0, LayerMask::from_layer(0));
        world.apply(&[far]);
        assert_eq!(world.count_to_load(0), 0);

        // Move into the observer, same stage
        world.move_actor(0, 0, Quat::IDENTITY, Vec3::new(90.0, 0.0, 90.0));
        world.apply(&[far]);
        assert_eq!(world.count_to_load(0), 1);
    }

    #[test]
    fn test_activate_requires_record() {
        let mut world = test_world();
        assert!(!world.activate(5));

        spawn(&mut world, 5, 0, Vec3::new(10.0, 0.0, 10.0));
        // spawn() already activated; second activation is a no-op
        assert!(!world.activate(5));
        assert!(world.deactivate(5));
        assert!(!world.deactivate(5));
    }

    #[test]
    fn test_inactive_actor_not_evaluated() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);
        world.deactivate(0);

        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);
        assert_eq!(world.count_to_load(0), 0);
    }

    #[test]
    fn test_layer_mask_exclusion() {
        let mut world = StreamingWorld::new(3, Vec3::ZERO, Vec3::splat(100.0));
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 2, p);

        // Observer overlaps the actor but only drives layers 0 and 1
        world.apply(&[observer_at(p, 5.0, LayerMask::first_layers(2))]);
        assert_eq!(world.count_to_load(2), 0);
        assert_eq!(world.count_to_unload(2), 0);
    }

    #[test]
    fn test_distance_monotonicity() {
        let mut world = test_world();
        spawn(&mut world, 0, 0, Vec3::new(50.0, 0.0, 50.0));

        // Observer grazing the actor's box edge: in range, distance 1
        let grazing = observer_at(Vec3::new(54.0, 0.0, 50.0), 3.0, LayerMask::from_layer(0));
        world.apply(&[grazing]);
        let (d_far, _) = world.min_distance_to_load(0).unwrap();
        assert!((d_far - 1.0).abs() < 1e-5);

        // Adding a closer observer can only decrease the distance
        let containing = observer_at(Vec3::new(52.0, 0.0, 50.0), 3.0, LayerMask::from_layer(0));
        world.apply(&[grazing, containing]);
        let (d_near, _) = world.min_distance_to_load(0).unwrap();
        assert!(d_near <= d_far);
        assert_eq!(d_near, 0.0);
    }

    #[test]
    fn test_set_overwrite_purges_pending() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);
        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);
        world.load(0, f32::MAX).unwrap();

        // Overwriting the record invalidates the in-flight transition
        world.set(
            0,
            99,
            0,
            Quat::IDENTITY,
            Vec3::new(10.0, 0.0, 10.0),
            -Vec3::ONE,
            Vec3::ONE,
        );
        assert_eq!(world.complete(true, 0, 0), CompleteResult::Stale);
        assert_eq!(world.stage_index(0), Some(99));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut world = test_world();
        let p = Vec3::new(50.0, 0.0, 50.0);
        spawn(&mut world, 0, 0, p);
        world.apply(&[observer_at(p, 5.0, LayerMask::from_layer(0))]);
        world.load(0, f32::MAX).unwrap();

        world.reset(2, Vec3::ZERO, Vec3::splat(200.0));
        assert!(!world.contains(0));
        assert!(world.active_indices().is_empty());
        assert_eq!(world.layer_count(), 2);
        assert_eq!(world.count_to_load(0), 0);
        assert_eq!(world.complete(true, 0, 0), CompleteResult::Stale);
    }

    #[test]
    fn test_drain_loads() {
        let mut world = test_world();
        for i in 0..5 {
            spawn(
                &mut world,
                i,
                0,
                Vec3::new(45.0 + i as f32 * 2.0, 0.0, 50.0),
            );
        }
        world.apply(&[observer_at(
            Vec3::new(50.0, 0.0, 50.0),
            20.0,
            LayerMask::from_layer(0),
        )]);

        let claimed = world.drain_loads(0, f32::MAX);
        assert_eq!(claimed.len(), 5);
        assert_eq!(world.count_to_load(0), 0);
        for actor in claimed {
            assert_eq!(world.complete(true, 0, actor), CompleteResult::Loaded);
        }
    }

    #[test]
    fn test_multiple_observers_multiple_layers() {
        let mut world = StreamingWorld::new(2, Vec3::ZERO, Vec3::splat(100.0));
        spawn(&mut world, 0, 0, Vec3::new(20.0, 0.0, 20.0));
        spawn(&mut world, 1, 1, Vec3::new(80.0, 0.0, 80.0));

        let near_cam = observer_at(Vec3::new(20.0, 0.0, 20.0), 5.0, LayerMask::from_layer(0));
        let far_cam = observer_at(Vec3::new(80.0, 0.0, 80.0), 5.0, LayerMask::from_layer(1));
        world.apply(&[near_cam, far_cam]);

        assert_eq!(world.count_to_load(0), 1);
        assert_eq!(world.count_to_load(1), 1);
        assert_eq!(world.load(0, f32::MAX), Some(0));
        assert_eq!(world.load(1, f32::MAX), Some(1));
    }
}
