//! Hand-authored onboarding area in the corner of the origin chunk.
//!
//! Tiles inside [`SPAWN_AREA_SIZE`] x [`SPAWN_AREA_SIZE`] never come from noise.
//! The layout holds a lake with a bridge over it, a few trees and rocks near
//! the spawn point, dirt paths that route around the water, and a cave mouth
//! in the far corner.

use crate::{Tile, TilePos};

/// Edge length of the authored square starting at (0, 0).
pub const SPAWN_AREA_SIZE: i32 = 20;

const TREES: [(i32, i32); 4] = [(3, 3), (5, 2), (2, 6), (7, 4)];
const STONES: [(i32, i32); 3] = [(8, 8), (9, 9), (10, 7)];
/// Cave mouth at the end of the southern path.
pub const CAVE_ENTRANCE: TilePos = TilePos::new(18, 18);

/// Whether the coordinate lies inside the authored square.
pub fn in_spawn_area(x: i32, y: i32) -> bool {
    (0..SPAWN_AREA_SIZE).contains(&x) && (0..SPAWN_AREA_SIZE).contains(&y)
}

/// Authored tile for a coordinate, or `None` outside the square.
pub fn authored_tile(x: i32, y: i32) -> Option<Tile> {
    if !in_spawn_area(x, y) {
        return None;
    }
    if (x, y) == (CAVE_ENTRANCE.x, CAVE_ENTRANCE.y) {
        return Some(Tile::Stone);
    }

    let mut tile = Tile::Grass;
    if (12..=18).contains(&x) && (8..=15).contains(&y) {
        tile = Tile::Water;
    }
    if x == 15 && (7..=16).contains(&y) {
        tile = Tile::Bridge;
    }
    if TREES.contains(&(x, y)) {
        tile = Tile::Tree;
    }
    if STONES.contains(&(x, y)) {
        tile = Tile::Stone;
    }
    // Paths only ever replace open ground.
    if tile == Tile::Grass && on_path(x, y) {
        tile = Tile::Dirt;
    }
    Some(tile)
}

/// Segments: spawn to the guide, guide north around the lake to the bridge,
/// bridge exit south-east to the cave.
fn on_path(x: i32, y: i32) -> bool {
    let spawn_to_guide = (y == 0 && (0..=10).contains(&x)) || (x == 10 && (0..=10).contains(&y));
    let guide_to_bridge = (x == 10 && (10..=11).contains(&y))
        || (y == 11 && (10..=11).contains(&x))
        || (x == 11 && (6..=11).contains(&y))
        || (y == 6 && (11..=15).contains(&x));
    let bridge_to_cave = (x == 15 && (16..=17).contains(&y))
        || (y == 17 && (15..=18).contains(&x))
        || (x == 18 && (17..=18).contains(&y));
    spawn_to_guide || guide_to_bridge || bridge_to_cave
}
