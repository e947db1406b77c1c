//! World configuration

use crate::core::types::{Result, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a streaming world
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of streaming layers (distance bands)
    pub layer_count: usize,
    /// World bounds min corner
    pub world_min: [f32; 3],
    /// World bounds max corner
    pub world_max: [f32; 3],
    /// Cap on transitions drained per tick by batching callers
    pub max_transitions_per_tick: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            layer_count: 4,
            world_min: [-1024.0, -256.0, -1024.0],
            world_max: [1024.0, 256.0, 1024.0],
            max_transitions_per_tick: 64,
        }
    }
}

impl WorldConfig {
    /// World bounds min corner as a vector
    pub fn min(&self) -> Vec3 {
        Vec3::from_array(self.world_min)
    }

    /// World bounds max corner as a vector
    pub fn max(&self) -> Vec3 {
        Vec3::from_array(self.world_max)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| {
            crate::core::Error::Config(format!("{}: {}", path.display(), e))
        })
    }
}
