//! Distance-driven load/unload scheduling
//!
//! Per tick: observer boxes are scanned against the spatial index, every
//! active actor gets a per-layer distance, and the per-layer queues are
//! rebuilt. A loader drains the queues with `load`/`unload`, performs the
//! actual instantiate/destroy work, and commits each transition back with
//! `complete`.

pub mod config;
pub mod observer;
pub mod queues;
pub mod shared;
pub mod stats;
pub mod world;

pub use config::WorldConfig;
pub use observer::{Candidate, ObserverBox};
pub use queues::{CompleteResult, StreamQueues};
pub use shared::SharedWorld;
pub use stats::StreamStats;
pub use world::StreamingWorld;
