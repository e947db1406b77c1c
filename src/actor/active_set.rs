//! Set of actors eligible for streaming evaluation

use crate::core::types::ActorIndex;
use std::collections::HashSet;

/// Unordered set of actor indices the scheduler evaluates each tick.
///
/// Actors outside the set are ignored even while present in the spatial
/// index. Membership changes are idempotent.
#[derive(Default)]
pub struct ActiveSet {
    indices: HashSet<ActorIndex>,
}

impl ActiveSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor; returns true when membership changed
    pub fn activate(&mut self, index: ActorIndex) -> bool {
        self.indices.insert(index)
    }

    /// Remove an actor; returns true when membership changed
    pub fn deactivate(&mut self, index: ActorIndex) -> bool {
        self.indices.remove(&index)
    }

    /// Whether an actor is active
    pub fn contains(&self, index: ActorIndex) -> bool {
        self.indices.contains(&index)
    }

    /// Iterate over active actor indices (unordered)
    pub fn iter(&self) -> impl Iterator<Item = ActorIndex> + '_ {
        self.indices.iter().copied()
    }

    /// Number of active actors
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no actors are active
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Remove all actors
    pub fn clear(&mut self) {
        self.indices.clear();
    }
}
