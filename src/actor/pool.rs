//! Stable-index pool of tracked actors

use crate::core::types::{ActorIndex, Quat, Vec3};
use crate::spatial::ItemHandle;

/// Everything the scheduler tracks for one actor.
///
/// `stage_index` is an externally meaningful slot identifier, opaque here.
/// The local bounds are kept so a move can recompute the world box for
/// reinsertion into the spatial index.
#[derive(Clone, Debug)]
pub struct ActorRecord {
    /// Opaque caller-defined slot identifier
    pub stage_index: i32,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Streaming layer this actor lives on
    pub layer: usize,
    /// Bounds min corner, relative to position
    pub bounds_min: Vec3,
    /// Bounds max corner, relative to position
    pub bounds_max: Vec3,
    /// Current entry in the spatial index
    pub spatial: ItemHandle,
}

/// Dense pool mapping caller-assigned actor indices to records.
///
/// Indices are small non-negative integers reused across an actor's
/// lifetime. Inserting at an occupied index replaces the prior record.
/// The pool grows on demand and never shrinks implicitly.
#[derive(Default)]
pub struct ActorPool {
    records: Vec<Option<ActorRecord>>,
    count: usize,
}

impl ActorPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record at `index`.
    ///
    /// Returns the replaced record when the index was occupied.
    pub fn insert(&mut self, index: ActorIndex, record: ActorRecord) -> Option<ActorRecord> {
        let idx = index as usize;
        if idx >= self.records.len() {
            self.records.resize_with(idx + 1, || None);
        }
        let replaced = self.records[idx].replace(record);
        if replaced.is_none() {
            self.count += 1;
        }
        replaced
    }

    /// Get the record at `index`
    pub fn get(&self, index: ActorIndex) -> Option<&ActorRecord> {
        self.records.get(index as usize)?.as_ref()
    }

    /// Get the record at `index` mutably
    pub fn get_mut(&mut self, index: ActorIndex) -> Option<&mut ActorRecord> {
        self.records.get_mut(index as usize)?.as_mut()
    }

    /// Whether a record exists at `index`
    pub fn contains(&self, index: ActorIndex) -> bool {
        self.records
            .get(index as usize)
            .is_some_and(|r| r.is_some())
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no records are stored
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop all records; capacity is retained
    pub fn clear(&mut self) {
        for slot in &mut self.records {
            *slot = None;
        }
        self.count = 0;
    }
}
