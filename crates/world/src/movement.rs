//! Player intent and straight-line movement against the tile grid.
//!
//! Movement has no pathfinding. A step is applied only when the tile under
//! the destination is walkable; otherwise the mover stays put.

use serde::{Deserialize, Serialize};

use crate::{Body, EntityId, TilePos, World};

/// Ground targets count as reached within this distance.
pub const GROUND_ARRIVAL_EPSILON: f64 = 0.1;
/// Creature and resource targets count as reached within this distance.
pub const INTERACT_RANGE: f64 = 2.0;
/// Float slack on arrival checks.
const ARRIVAL_SLACK: f64 = 1e-6;

/// Where an auto-move is heading and what happens on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Walk to a point
    Ground { x: f64, y: f64 },
    /// Walk into range, then fight
    Creature(EntityId),
    /// Walk into range, then gather once
    Resource(TilePos),
}

impl MoveTarget {
    /// Distance at which the target counts as reached.
    pub fn arrival_distance(&self) -> f64 {
        match self {
            MoveTarget::Ground { .. } => GROUND_ARRIVAL_EPSILON,
            MoveTarget::Creature(_) | MoveTarget::Resource(_) => INTERACT_RANGE,
        }
    }
}

/// Input for one tick. Directional movement wins over a target and cancels
/// any pending one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    /// Movement direction; need not be normalized
    pub dx: f64,
    pub dy: f64,
    /// Replace the pending auto-move target
    pub target: Option<MoveTarget>,
    /// Gather from the closest node around the player
    pub harvest_nearest: bool,
    /// Loot a nearby corpse, or talk to a nearby NPC
    pub interact: bool,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn walk(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            ..Self::default()
        }
    }

    pub fn go_to(target: MoveTarget) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn harvest() -> Self {
        Self {
            harvest_nearest: true,
            ..Self::default()
        }
    }

    pub fn interact() -> Self {
        Self {
            interact: true,
            ..Self::default()
        }
    }

    pub fn has_direction(&self) -> bool {
        self.dx != 0.0 || self.dy != 0.0
    }
}

/// Outcome of one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// Destination tile is not walkable
    Blocked,
    /// Already within the arrival distance
    Arrived,
}

/// Move `body` by `(dx, dy)` unless the destination tile blocks.
pub fn try_move(world: &mut World, body: &mut Body, dx: f64, dy: f64) -> Step {
    let nx = body.x + dx;
    let ny = body.y + dy;
    let dest = TilePos::containing(nx, ny);
    if !world.is_walkable(dest.x, dest.y) {
        return Step::Blocked;
    }
    body.x = nx;
    body.y = ny;
    Step::Moved
}

/// Walk in a direction for `dt` seconds at the body's speed.
pub fn walk(world: &mut World, body: &mut Body, dir_x: f64, dir_y: f64, dt: f64) -> Step {
    let len = (dir_x * dir_x + dir_y * dir_y).sqrt();
    if len == 0.0 {
        return Step::Arrived;
    }
    let scale = body.speed * dt / len;
    try_move(world, body, dir_x * scale, dir_y * scale)
}

/// Close in on `(tx, ty)` for `dt` seconds, stopping at `stop_distance`.
pub fn step_toward(
    world: &mut World,
    body: &mut Body,
    tx: f64,
    ty: f64,
    stop_distance: f64,
    dt: f64,
) -> Step {
    let dx = tx - body.x;
    let dy = ty - body.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= stop_distance + ARRIVAL_SLACK {
        return Step::Arrived;
    }
    let travel = (body.speed * dt).min(distance - stop_distance);
    try_move(world, body, dx / distance * travel, dy / distance * travel)
}
