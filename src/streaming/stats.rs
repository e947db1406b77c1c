//! Streaming counters

/// Counters maintained by the world across its lifetime
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamStats {
    /// Ticks applied since creation or reset
    pub ticks: u64,
    /// Candidates evaluated by the most recent tick
    pub candidates_last_tick: usize,
    /// Load transitions committed via complete
    pub loads_committed: u64,
    /// Unload transitions committed via complete
    pub unloads_committed: u64,
    /// Completions that arrived for an actor no longer pending
    pub stale_completions: u64,
}
