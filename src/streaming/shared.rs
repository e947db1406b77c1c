//! Shared world handle with read/write gating

use crate::streaming::world::StreamingWorld;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to a world behind a reader-writer gate.
///
/// Reads run concurrently with each other; mutators are exclusive and
/// ordered after all outstanding reads, which is the whole concurrency
/// contract of the scheduler: query phases share the world, mutation
/// phases own it. The scan inside `apply` keeps its own rayon
/// parallelism while the write guard is held.
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<RwLock<StreamingWorld>>,
}

impl SharedWorld {
    /// Wrap a world in a shared handle
    pub fn new(world: StreamingWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Acquire shared read access.
    ///
    /// Blocks until the most recent writer releases; concurrent readers
    /// do not block each other.
    pub fn read(&self) -> RwLockReadGuard<'_, StreamingWorld> {
        self.inner.read().unwrap()
    }

    /// Acquire exclusive write access.
    ///
    /// Blocks until all outstanding readers and the previous writer
    /// release.
    pub fn write(&self) -> RwLockWriteGuard<'_, StreamingWorld> {
        self.inner.write().unwrap()
    }
}
