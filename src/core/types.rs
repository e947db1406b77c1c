//! Core type aliases and re-exports

pub use glam::{Quat, Vec3};

/// Stable actor index assigned by the caller
pub type ActorIndex = u32;

/// Standard Result type for the scheduler
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
