use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ResourceKind;

/// Chunk edge length in tiles.
pub const CHUNK_SIZE: usize = 32;
/// Total tile count per chunk.
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Terrain tile. The discriminants are the stable on-disk codes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Grass = 0,
    Dirt = 1,
    Water = 2,
    Stone = 3,
    Tree = 4,
    Bridge = 5,
}

impl Tile {
    /// Every tile kind in code order.
    pub const ALL: [Tile; 6] = [
        Tile::Grass,
        Tile::Dirt,
        Tile::Water,
        Tile::Stone,
        Tile::Tree,
        Tile::Bridge,
    ];

    /// Stable integer code.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Decode a stable integer code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Only water blocks movement.
    #[inline]
    pub fn is_walkable(self) -> bool {
        self != Tile::Water
    }

    /// Harvestable node kind backed by this tile, if any.
    pub fn resource_kind(self) -> Option<ResourceKind> {
        match self {
            Tile::Tree => Some(ResourceKind::Tree),
            Tile::Stone => Some(ResourceKind::Rock),
            Tile::Water | Tile::Bridge => Some(ResourceKind::FishingSpot),
            Tile::Grass | Tile::Dirt => None,
        }
    }
}

/// Absolute tile coordinate.
/// Implements Ord for deterministic iteration in BTreeMap (sorts by x, then y).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile under a continuous world position.
    pub fn containing(x: f64, y: f64) -> Self {
        Self::new(x.floor() as i32, y.floor() as i32)
    }

    /// Chunk this tile belongs to.
    pub fn chunk(self) -> ChunkPos {
        ChunkPos::containing(self)
    }

    /// Position inside the owning chunk.
    pub fn local(self) -> LocalPos {
        let size = CHUNK_SIZE as i32;
        LocalPos {
            x: self.x.rem_euclid(size) as usize,
            y: self.y.rem_euclid(size) as usize,
        }
    }

    /// Euclidean distance from a continuous position to this tile's origin.
    pub fn distance_from(self, x: f64, y: f64) -> f64 {
        let dx = self.x as f64 - x;
        let dy = self.y as f64 - y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chunk-local position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
}

impl LocalPos {
    /// Row-major index into the chunk tile array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE);
        debug_assert!(self.y < CHUNK_SIZE);
        self.y * CHUNK_SIZE + self.x
    }
}

/// Chunk coordinate in chunk space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk owning the given tile. Floors toward negative infinity.
    pub fn containing(tile: TilePos) -> Self {
        let size = CHUNK_SIZE as i32;
        Self::new(tile.x.div_euclid(size), tile.y.div_euclid(size))
    }

    /// Absolute coordinate of the chunk's (0, 0) tile.
    pub fn origin(self) -> TilePos {
        let size = CHUNK_SIZE as i32;
        TilePos::new(self.x * size, self.y * size)
    }

    /// Chebyshev distance in chunks.
    pub fn chebyshev(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

bitflags::bitflags! {
    /// Per-chunk bookkeeping bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChunkFlags: u8 {
        /// Terrain generation has run for this chunk.
        const GENERATED = 0b0000_0001;
    }
}

impl Default for ChunkFlags {
    fn default() -> Self {
        ChunkFlags::empty()
    }
}

/// A 32x32 block of tiles.
#[derive(Debug, Clone)]
pub struct Chunk {
    position: ChunkPos,
    tiles: Box<[Tile; CHUNK_AREA]>,
    flags: ChunkFlags,
}

impl Chunk {
    /// Blank (all grass) chunk.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            tiles: Box::new([Tile::Grass; CHUNK_AREA]),
            flags: ChunkFlags::empty(),
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Read a tile using chunk-local coordinates.
    pub fn tile(&self, local: LocalPos) -> Tile {
        self.tiles[local.index()]
    }

    /// Write a tile using chunk-local coordinates.
    pub fn set_tile(&mut self, local: LocalPos, tile: Tile) {
        self.tiles[local.index()] = tile;
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles[..]
    }

    pub fn is_generated(&self) -> bool {
        self.flags.contains(ChunkFlags::GENERATED)
    }

    pub fn mark_generated(&mut self) {
        self.flags.insert(ChunkFlags::GENERATED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_codes_are_stable() {
        assert_eq!(Tile::Grass.code(), 0);
        assert_eq!(Tile::Dirt.code(), 1);
        assert_eq!(Tile::Water.code(), 2);
        assert_eq!(Tile::Stone.code(), 3);
        assert_eq!(Tile::Tree.code(), 4);
        assert_eq!(Tile::Bridge.code(), 5);
        for tile in Tile::ALL {
            assert_eq!(Tile::from_code(tile.code()), Some(tile));
        }
        assert_eq!(Tile::from_code(6), None);
    }

    #[test]
    fn only_water_blocks() {
        for tile in Tile::ALL {
            assert_eq!(tile.is_walkable(), tile != Tile::Water, "{tile:?}");
        }
    }

    #[test]
    fn resource_kind_mapping() {
        assert_eq!(Tile::Tree.resource_kind(), Some(ResourceKind::Tree));
        assert_eq!(Tile::Stone.resource_kind(), Some(ResourceKind::Rock));
        assert_eq!(Tile::Water.resource_kind(), Some(ResourceKind::FishingSpot));
        assert_eq!(Tile::Bridge.resource_kind(), Some(ResourceKind::FishingSpot));
        assert_eq!(Tile::Grass.resource_kind(), None);
        assert_eq!(Tile::Dirt.resource_kind(), None);
    }

    #[test]
    fn negative_coordinates_floor_into_previous_chunk() {
        let tile = TilePos::new(-1, -33);
        assert_eq!(tile.chunk(), ChunkPos::new(-1, -2));
        assert_eq!(tile.local(), LocalPos { x: 31, y: 31 });

        let tile = TilePos::new(-32, 0);
        assert_eq!(tile.chunk(), ChunkPos::new(-1, 0));
        assert_eq!(tile.local(), LocalPos { x: 0, y: 0 });
    }

    #[test]
    fn chunk_origin_round_trips() {
        let pos = ChunkPos::new(-3, 2);
        let origin = pos.origin();
        assert_eq!(origin, TilePos::new(-96, 64));
        assert_eq!(origin.chunk(), pos);
    }

    #[test]
    fn containing_floors_fractional_positions() {
        assert_eq!(TilePos::containing(-0.5, 3.99), TilePos::new(-1, 3));
    }

    #[test]
    fn set_tile_writes_one_cell() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        let local = LocalPos { x: 4, y: 7 };
        chunk.set_tile(local, Tile::Water);
        assert_eq!(chunk.tile(local), Tile::Water);
        assert_eq!(chunk.tiles().iter().filter(|t| **t == Tile::Water).count(), 1);
    }

    #[test]
    fn generated_flag_survives_tile_edits() {
        let mut chunk = Chunk::new(ChunkPos::new(1, 1));
        assert!(!chunk.is_generated());
        chunk.mark_generated();
        chunk.set_tile(LocalPos { x: 0, y: 0 }, Tile::Dirt);
        assert!(chunk.is_generated());
    }

    #[test]
    fn chebyshev_distance() {
        let a = ChunkPos::new(0, 0);
        assert_eq!(a.chebyshev(ChunkPos::new(3, -1)), 3);
        assert_eq!(a.chebyshev(a), 0);
    }
}
