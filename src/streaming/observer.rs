//! Observer regions and the per-tick scan
//!
//! Observers are moving world-space boxes (camera or player bounds) with a
//! mask of the layers they drive. The scan phase is read-only over the
//! spatial index and actor pool: observer queries fan out across rayon
//! workers, matches are deduplicated into one overlap set, and every active
//! actor is bucketed by layer with its minimum squared distance to a
//! qualifying observer.

use crate::actor::{ActiveSet, ActorPool};
use crate::core::types::{ActorIndex, Vec3};
use crate::math::Aabb;
use crate::spatial::{LayerMask, LayerQuadTree};
use rayon::prelude::*;
use std::collections::HashSet;

/// A moving observer region for one tick.
///
/// `min`/`max` are relative to `position`; the caller has already
/// transformed them into world orientation. Not retained between ticks.
#[derive(Clone, Copy, Debug)]
pub struct ObserverBox {
    /// World position of the region's origin
    pub position: Vec3,
    /// Bounds min corner, relative to position
    pub min: Vec3,
    /// Bounds max corner, relative to position
    pub max: Vec3,
    /// Layers this observer drives
    pub mask: LayerMask,
}

impl ObserverBox {
    /// Create an observer box
    pub fn new(position: Vec3, min: Vec3, max: Vec3, mask: LayerMask) -> Self {
        Self {
            position,
            min,
            max,
            mask,
        }
    }

    /// The region in world space
    pub fn world_aabb(&self) -> Aabb {
        Aabb::new(self.position + self.min, self.position + self.max)
    }

    /// Squared distance from the region to a point (zero when inside)
    pub fn distance_sq_to(&self, p: Vec3) -> f32 {
        self.world_aabb().distance_sq_to_point(p)
    }
}

/// One actor's streaming inputs for its layer this tick
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    /// Actor index
    pub actor: ActorIndex,
    /// Minimum squared distance to any observer box whose mask includes
    /// the actor's layer; `f32::MAX` when no observer qualifies
    pub distance_sq: f32,
    /// Whether the actor overlaps at least one qualifying observer box
    pub in_range: bool,
}

/// Result of scanning one tick's observers
pub(crate) struct ScanResult {
    /// Union of the layer bit of every evaluated candidate
    pub occupied: LayerMask,
    /// Candidates bucketed by layer, ascending actor index within a bucket
    pub by_layer: Vec<Vec<Candidate>>,
    /// Total candidates evaluated
    pub candidate_count: usize,
}

/// Scan all observers against the index, restricted to the active set.
///
/// Distances are computed only against observers whose mask includes the
/// actor's layer; a geometrically closer observer with the layer masked
/// out never shortens an actor's distance.
pub(crate) fn scan(
    index: &LayerQuadTree,
    pool: &ActorPool,
    active: &ActiveSet,
    observers: &[ObserverBox],
    layer_count: usize,
) -> ScanResult {
    // Parallel overlap queries, one per observer box. Workers only read
    // the index and append to their own hit list; the union dedups.
    let overlaps: HashSet<ActorIndex> = observers
        .par_iter()
        .map(|observer| {
            let mut hits = Vec::new();
            index.search(&observer.world_aabb(), observer.mask, |value, _layer| {
                if active.contains(value) {
                    hits.push(value);
                }
            });
            hits
        })
        .reduce(Vec::new, |mut acc, mut hits| {
            acc.append(&mut hits);
            acc
        })
        .into_iter()
        .collect();

    // Candidate superset is the active set; evaluation order is made
    // deterministic by sorting, so distance ties resolve by actor index.
    let mut candidates: Vec<ActorIndex> = active.iter().collect();
    candidates.sort_unstable();

    let mut occupied = LayerMask::EMPTY;
    let mut by_layer: Vec<Vec<Candidate>> = vec![Vec::new(); layer_count];
    let mut candidate_count = 0;

    for actor in candidates {
        let Some(record) = pool.get(actor) else {
            continue;
        };
        if record.layer >= layer_count {
            continue;
        }

        let mut distance_sq = f32::MAX;
        for observer in observers {
            if observer.mask.contains(record.layer) {
                distance_sq = distance_sq.min(observer.distance_sq_to(record.position));
            }
        }

        occupied.set(record.layer);
        by_layer[record.layer].push(Candidate {
            actor,
            distance_sq,
            in_range: overlaps.contains(&actor),
        });
        candidate_count += 1;
    }

    ScanResult {
        occupied,
        by_layer,
        candidate_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorRecord;
    use crate::core::types::Quat;

    fn build_world(
        layer_count: usize,
        actors: &[(ActorIndex, usize, Vec3)],
    ) -> (LayerQuadTree, ActorPool, ActiveSet) {
        let mut index = LayerQuadTree::new(layer_count, Vec3::ZERO, Vec3::splat(100.0));
        let mut pool = ActorPool::new();
        let mut active = ActiveSet::new();

        for &(actor, layer, position) in actors {
            let aabb = Aabb::from_center_half_extent(position, Vec3::ONE);
            let spatial = index.insert(layer, aabb, actor);
            pool.insert(
                actor,
                ActorRecord {
                    stage_index: 0,
                    position,
                    rotation: Quat::IDENTITY,
                    layer,
                    bounds_min: -Vec3::ONE,
                    bounds_max: Vec3::ONE,
                    spatial,
                },
            );
            active.activate(actor);
        }
        (index, pool, active)
    }

    fn observer(position: Vec3, half: f32, mask: LayerMask) -> ObserverBox {
        ObserverBox::new(position, Vec3::splat(-half), Vec3::splat(half), mask)
    }

    #[test]
    fn test_scan_actor_in_range() {
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, active) = build_world(1, &[(0, 0, p)]);
        let observers = [observer(p, 5.0, LayerMask::from_layer(0))];

        let result = scan(&index, &pool, &active, &observers, 1);
        assert_eq!(result.candidate_count, 1);
        assert_eq!(result.occupied.lowest_layer(), Some(0));

        let candidate = result.by_layer[0][0];
        assert_eq!(candidate.actor, 0);
        assert!(candidate.in_range);
        assert_eq!(candidate.distance_sq, 0.0);
    }

    #[test]
    fn test_scan_actor_out_of_range() {
        let (index, pool, active) =
            build_world(1, &[(0, 0, Vec3::new(90.0, 0.0, 90.0))]);
        let observers = [observer(
            Vec3::new(10.0, 0.0, 10.0),
            5.0,
            LayerMask::from_layer(0),
        )];

        let result = scan(&index, &pool, &active, &observers, 1);
        let candidate = result.by_layer[0][0];
        assert!(!candidate.in_range);
        assert!(candidate.distance_sq > 0.0);
        assert!(candidate.distance_sq < f32::MAX);
    }

    #[test]
    fn test_scan_inactive_actor_ignored() {
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, mut active) = build_world(1, &[(0, 0, p)]);
        active.deactivate(0);
        let observers = [observer(p, 5.0, LayerMask::from_layer(0))];

        let result = scan(&index, &pool, &active, &observers, 1);
        assert_eq!(result.candidate_count, 0);
        assert!(result.occupied.is_empty());
        assert!(result.by_layer[0].is_empty());
    }

    #[test]
    fn test_scan_mask_excludes_layer() {
        // Actor on layer 2, observer only drives layers 0 and 1
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, active) = build_world(3, &[(0, 2, p)]);
        let observers = [observer(p, 5.0, LayerMask::first_layers(2))];

        let result = scan(&index, &pool, &active, &observers, 3);
        let candidate = result.by_layer[2][0];
        assert!(!candidate.in_range);
        assert_eq!(candidate.distance_sq, f32::MAX);
    }

    #[test]
    fn test_scan_min_distance_over_observers() {
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, active) = build_world(1, &[(0, 0, p)]);
        let far = observer(Vec3::new(80.0, 0.0, 50.0), 1.0, LayerMask::from_layer(0));
        let near = observer(Vec3::new(60.0, 0.0, 50.0), 1.0, LayerMask::from_layer(0));

        let result = scan(&index, &pool, &active, &[far, near], 1);
        let candidate = result.by_layer[0][0];
        // Nearest qualifying observer wins: 60-1=59 edge, distance 9, squared 81
        assert!((candidate.distance_sq - 81.0).abs() < 1e-3);
    }

    #[test]
    fn test_scan_masked_closer_observer_ignored() {
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, active) = build_world(2, &[(0, 1, p)]);
        // Closer observer does not drive layer 1; farther one does
        let close = observer(Vec3::new(55.0, 0.0, 50.0), 1.0, LayerMask::from_layer(0));
        let far = observer(Vec3::new(70.0, 0.0, 50.0), 1.0, LayerMask::from_layer(1));

        let result = scan(&index, &pool, &active, &[close, far], 2);
        let candidate = result.by_layer[1][0];
        // Distance comes from the far observer: 70-1=69 edge, 19^2
        assert!((candidate.distance_sq - 361.0).abs() < 1e-3);
    }

    #[test]
    fn test_scan_occupied_layers() {
        let (index, pool, active) = build_world(
            5,
            &[
                (0, 1, Vec3::new(20.0, 0.0, 20.0)),
                (1, 4, Vec3::new(80.0, 0.0, 80.0)),
            ],
        );
        let observers = [observer(Vec3::splat(50.0), 5.0, LayerMask::ALL)];

        let result = scan(&index, &pool, &active, &observers, 5);
        assert_eq!(result.occupied.lowest_layer(), Some(1));
        assert_eq!(result.occupied.highest_layer(), Some(4));
        assert!(result.by_layer[2].is_empty());
    }

    #[test]
    fn test_scan_duplicate_overlaps_deduplicated() {
        // Two overlapping observers both cover the actor; it must appear
        // once in the layer bucket
        let p = Vec3::new(50.0, 0.0, 50.0);
        let (index, pool, active) = build_world(1, &[(0, 0, p)]);
        let observers = [
            observer(p, 5.0, LayerMask::from_layer(0)),
            observer(p, 8.0, LayerMask::from_layer(0)),
        ];

        let result = scan(&index, &pool, &active, &observers, 1);
        assert_eq!(result.by_layer[0].len(), 1);
        assert!(result.by_layer[0][0].in_range);
    }
}
