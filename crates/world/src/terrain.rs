//! Terrain generation from seeded noise plus the authored starting area.
//!
//! Each tile is classified from two noise channels: a smooth terrain channel
//! that carves lakes and tree bands, and a finer detail channel that breaks
//! the bands up into copses, outcrops and dirt paths. Inside the starting
//! area the authored layout always wins. Every tree, stone, water or bridge
//! tile produced registers a resource node.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::spawn_area::authored_tile;
use crate::{
    ChunkPos, NoiseConfig, NoiseShaping, ResourceRegistry, Tile, TilePos, ValueNoise, World,
    CHUNK_SIZE,
};

/// Noise cut-offs used to classify tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainThresholds {
    /// Terrain below this is water
    pub water_below: f64,
    /// Terrain band where trees may grow
    pub tree_band: (f64, f64),
    /// Detail needed for a tree inside the band
    pub tree_detail_above: f64,
    /// Terrain needed for a stone outcrop
    pub stone_above: f64,
    /// Detail needed for a stone outcrop
    pub stone_detail_above: f64,
    /// Detail below this is a dirt path
    pub dirt_detail_below: f64,
    /// Mapping of both channels' octave sums into `[0, 1]`
    pub shaping: NoiseShaping,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            water_below: 0.4,
            tree_band: (0.5, 0.65),
            tree_detail_above: 0.6,
            stone_above: 0.8,
            stone_detail_above: 0.85,
            dirt_detail_below: 0.2,
            shaping: NoiseShaping::default(),
        }
    }
}

impl TerrainThresholds {
    /// Classify a tile from its two noise samples.
    pub fn classify(&self, terrain: f64, detail: f64) -> Tile {
        let (tree_low, tree_high) = self.tree_band;
        if terrain < self.water_below {
            Tile::Water
        } else if terrain > tree_low && terrain < tree_high && detail > self.tree_detail_above {
            Tile::Tree
        } else if terrain > self.stone_above && detail > self.stone_detail_above {
            Tile::Stone
        } else if detail < self.dirt_detail_below {
            Tile::Dirt
        } else {
            Tile::Grass
        }
    }
}

/// Terrain generator bound to one world seed.
pub struct TerrainGenerator {
    world_seed: u32,
    terrain: ValueNoise,
    detail: ValueNoise,
    thresholds: TerrainThresholds,
}

impl TerrainGenerator {
    /// Create a generator. Only the low 32 bits of the seed are used.
    pub fn new(world_seed: u64) -> Self {
        let world_seed = world_seed as u32;
        Self {
            world_seed,
            terrain: ValueNoise::new(NoiseConfig::terrain(world_seed)),
            detail: ValueNoise::new(NoiseConfig::detail(world_seed)),
            thresholds: TerrainThresholds::default(),
        }
    }

    /// Replace the cut-offs and rebuild both noise channels with their shaping.
    pub fn with_thresholds(mut self, thresholds: TerrainThresholds) -> Self {
        let seed = self.world_seed;
        self.terrain = ValueNoise::new(NoiseConfig::terrain(seed).with_shaping(thresholds.shaping));
        self.detail = ValueNoise::new(NoiseConfig::detail(seed).with_shaping(thresholds.shaping));
        self.thresholds = thresholds;
        self
    }

    pub fn world_seed(&self) -> u32 {
        self.world_seed
    }

    pub fn thresholds(&self) -> &TerrainThresholds {
        &self.thresholds
    }

    /// Noise-only tile, ignoring the authored area.
    pub fn noise_tile(&self, x: i32, y: i32) -> Tile {
        let (fx, fy) = (f64::from(x), f64::from(y));
        self.thresholds
            .classify(self.terrain.sample(fx, fy), self.detail.sample(fx, fy))
    }

    /// Tile at an absolute coordinate.
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        authored_tile(x, y).unwrap_or_else(|| self.noise_tile(x, y))
    }

    /// Fill one chunk and register its resource nodes.
    ///
    /// Safe to call repeatedly: an already generated chunk is left alone, and
    /// node registration is idempotent, so a chunk regenerated after eviction
    /// does not duplicate nodes. Returns the number of newly registered nodes.
    #[instrument(skip(self, world, nodes), fields(chunk = %pos, world_seed = self.world_seed))]
    pub fn generate_chunk(
        &self,
        world: &mut World,
        nodes: &mut ResourceRegistry,
        pos: ChunkPos,
    ) -> usize {
        let origin = pos.origin();
        let chunk = world.ensure_chunk(pos);
        if chunk.is_generated() {
            return 0;
        }

        let mut registered = 0;
        for ly in 0..CHUNK_SIZE as i32 {
            for lx in 0..CHUNK_SIZE as i32 {
                let tile_pos = TilePos::new(origin.x + lx, origin.y + ly);
                let tile = self.tile_at(tile_pos.x, tile_pos.y);
                chunk.set_tile(tile_pos.local(), tile);
                if let Some(kind) = tile.resource_kind() {
                    if nodes.register(tile_pos, kind, tile) {
                        registered += 1;
                    }
                }
            }
        }
        chunk.mark_generated();
        debug!(registered, "chunk generated");
        registered
    }

    /// Generate every chunk within `radius` chunks of `center`.
    pub fn generate_around(
        &self,
        world: &mut World,
        nodes: &mut ResourceRegistry,
        center: TilePos,
        radius: i32,
    ) -> usize {
        let middle = center.chunk();
        let mut registered = 0;
        for cy in middle.y - radius..=middle.y + radius {
            for cx in middle.x - radius..=middle.x + radius {
                registered += self.generate_chunk(world, nodes, ChunkPos::new(cx, cy));
            }
        }
        registered
    }
}
