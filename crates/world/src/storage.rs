use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

use crate::{Chunk, ChunkPos, Tile, TilePos};

/// Sparse, unbounded tile map backed by lazily materialized chunks.
/// Uses BTreeMap so iteration order never depends on insertion history.
pub struct World {
    chunks: BTreeMap<ChunkPos, Chunk>,
    /// Present only when a residency cap is configured.
    lru: Option<LruCache<ChunkPos, ()>>,
    capacity: usize,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Unbounded world: chunks are never evicted implicitly.
    pub fn new() -> Self {
        Self {
            chunks: BTreeMap::new(),
            lru: None,
            capacity: 0,
        }
    }

    /// World that keeps at most `capacity` chunks resident, dropping the
    /// least recently touched one when full. A capacity of zero is unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chunks: BTreeMap::new(),
            lru: NonZeroUsize::new(capacity).map(LruCache::new),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Mutable access to a chunk, materializing a blank one if necessary.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        if !self.chunks.contains_key(&pos) {
            self.evict_if_needed();
            trace!(chunk = %pos, "materializing chunk");
        }
        self.touch(pos);
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Whether terrain generation has already run for `pos`.
    pub fn is_generated(&self, pos: ChunkPos) -> bool {
        self.chunks.get(&pos).is_some_and(Chunk::is_generated)
    }

    /// Tile at an absolute coordinate. Materializes the owning chunk.
    pub fn tile(&mut self, x: i32, y: i32) -> Tile {
        let pos = TilePos::new(x, y);
        self.ensure_chunk(pos.chunk()).tile(pos.local())
    }

    /// Tile at an absolute coordinate without materializing anything.
    /// Absent chunks read as grass, the same as a fresh blank chunk.
    pub fn peek_tile(&self, x: i32, y: i32) -> Tile {
        let pos = TilePos::new(x, y);
        self.chunks
            .get(&pos.chunk())
            .map(|chunk| chunk.tile(pos.local()))
            .unwrap_or_default()
    }

    /// Overwrite a tile at an absolute coordinate.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        let pos = TilePos::new(x, y);
        self.ensure_chunk(pos.chunk()).set_tile(pos.local(), tile);
    }

    /// Whether an entity may stand on the tile.
    pub fn is_walkable(&mut self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_walkable()
    }

    /// Resident chunk positions in sorted order.
    pub fn positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Drop every chunk farther than `radius` (Chebyshev, in chunks) from
    /// `center`. Returns how many were dropped.
    pub fn evict_outside(&mut self, center: ChunkPos, radius: i32) -> usize {
        let doomed: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|pos| pos.chebyshev(center) > radius)
            .collect();
        for pos in &doomed {
            self.chunks.remove(pos);
            if let Some(lru) = self.lru.as_mut() {
                lru.pop(pos);
            }
        }
        doomed.len()
    }

    fn touch(&mut self, pos: ChunkPos) {
        if let Some(lru) = self.lru.as_mut() {
            lru.put(pos, ());
        }
    }

    fn evict_if_needed(&mut self) {
        let Some(lru) = self.lru.as_mut() else {
            return;
        };
        while self.chunks.len() >= self.capacity {
            if let Some((oldest, _)) = lru.pop_lru() {
                trace!(chunk = %oldest, "evicting least recently used chunk");
                self.chunks.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
