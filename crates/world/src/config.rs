use serde::{Deserialize, Serialize};

use crate::TerrainThresholds;

/// Simulation settings supplied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World seed for terrain and gameplay rolls.
    pub seed: u64,
    /// Real seconds per in-game day.
    pub day_length_secs: f64,
    /// Where the player starts and respawns.
    pub spawn: (f64, f64),
    /// Seconds between player death and respawn.
    pub player_respawn_secs: f64,
    /// Chunks generated around the player, in each direction.
    pub generation_radius: i32,
    /// Resident chunk limit; 0 keeps every chunk.
    pub chunk_capacity: usize,
    pub terrain: TerrainThresholds,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            day_length_secs: 120.0,
            spawn: (5.0, 5.0),
            player_respawn_secs: 3.0,
            generation_radius: 2,
            chunk_capacity: 0,
            terrain: TerrainThresholds::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
