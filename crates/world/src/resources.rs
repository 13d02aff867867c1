//! Harvestable resource nodes and their registry.
//!
//! A node is `Available` until a successful gather depletes it; it becomes
//! available again once its respawn delay has elapsed. Failed rolls leave the
//! node untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tileworld_core::item::ids;
use tileworld_core::TileRng;
use tracing::{debug, trace};

use crate::{ItemStack, PlayerProfile, SkillKind, Tile, TilePos};

/// Seconds a depleted node waits before becoming available again.
pub const NODE_RESPAWN_SECS: f64 = 30.0;
/// Skill level every node currently asks for.
pub const DEFAULT_REQUIRED_LEVEL: u8 = 1;
/// Ceiling on the per-attempt success chance.
pub const MAX_GATHER_CHANCE: f64 = 0.9;

/// What a node yields and which skill it trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tree,
    Rock,
    FishingSpot,
}

impl ResourceKind {
    pub fn skill(self) -> SkillKind {
        match self {
            ResourceKind::Tree => SkillKind::Woodcutting,
            ResourceKind::Rock => SkillKind::Mining,
            ResourceKind::FishingSpot => SkillKind::Fishing,
        }
    }

    /// Item id granted by one successful gather.
    pub fn drop_item(self) -> &'static str {
        match self {
            ResourceKind::Tree => ids::TIMBER,
            ResourceKind::Rock => ids::STONE,
            ResourceKind::FishingSpot => ids::RAW_TUNA,
        }
    }

    /// Skill XP granted by one successful gather.
    pub fn xp(self) -> u64 {
        match self {
            ResourceKind::Tree => 25,
            ResourceKind::Rock => 30,
            ResourceKind::FishingSpot => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Tree => "tree",
            ResourceKind::Rock => "rock",
            ResourceKind::FishingSpot => "fishing spot",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success chance for a skill level: `min(0.9, 0.3 + level / 100 * 0.6)`.
pub fn gather_chance(level: u8) -> f64 {
    (0.3 + f64::from(level) / 100.0 * 0.6).min(MAX_GATHER_CHANCE)
}

/// Why a gather attempt produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GatherError {
    #[error("requires {skill} level {required} (current {current})")]
    SkillTooLow {
        skill: SkillKind,
        required: u8,
        current: u8,
    },
    #[error("resource depleted, respawning...")]
    AlreadyDepleted,
    #[error("you failed to gather the resource")]
    RandomFailure,
    #[error("no room in inventory")]
    InventoryFull,
    #[error("nothing to gather at {0}")]
    NoNode(TilePos),
}

/// Result of a successful gather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gathered {
    pub pos: TilePos,
    pub kind: ResourceKind,
    pub item: ItemStack,
    pub skill: SkillKind,
    pub xp: u64,
    /// Skill level after the XP was applied.
    pub level: u8,
    pub levels_gained: u8,
}

/// Harvestable state attached to a single tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub pos: TilePos,
    pub kind: ResourceKind,
    /// Tile the node was registered for.
    pub tile: Tile,
    pub required_level: u8,
    pub respawn_delay: f64,
    /// Simulation time of the last depletion; `None` while available.
    pub depleted_at: Option<f64>,
}

impl ResourceNode {
    pub fn new(pos: TilePos, kind: ResourceKind, tile: Tile) -> Self {
        Self {
            pos,
            kind,
            tile,
            required_level: DEFAULT_REQUIRED_LEVEL,
            respawn_delay: NODE_RESPAWN_SECS,
            depleted_at: None,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted_at.is_some()
    }

    /// Checks depletion first, then the skill requirement.
    pub fn can_gather(&self, profile: &PlayerProfile) -> Result<(), GatherError> {
        if self.is_depleted() {
            return Err(GatherError::AlreadyDepleted);
        }
        let skill = self.kind.skill();
        let current = profile.skills.get(skill).level;
        if current < self.required_level {
            return Err(GatherError::SkillTooLow {
                skill,
                required: self.required_level,
                current,
            });
        }
        Ok(())
    }

    /// Roll a gather attempt. A success adds the drop to the inventory, grants
    /// skill XP and depletes the node, level-up or not.
    pub fn gather(
        &mut self,
        profile: &mut PlayerProfile,
        rng: &mut TileRng,
        now: f64,
    ) -> Result<Gathered, GatherError> {
        self.can_gather(profile)?;

        let item_id = self.kind.drop_item();
        if !profile.inventory.can_accept(item_id) {
            return Err(GatherError::InventoryFull);
        }

        let skill = self.kind.skill();
        let chance = gather_chance(profile.skills.get(skill).level);
        if !rng.chance(chance) {
            trace!(pos = %self.pos, chance, "gather roll failed");
            return Err(GatherError::RandomFailure);
        }

        let item = ItemStack::of(item_id, 1);
        if profile.add_item(item.clone()).is_err() {
            return Err(GatherError::InventoryFull);
        }
        let xp = self.kind.xp();
        let levels_gained = profile.skills.get_mut(skill).add_xp(xp);
        self.depleted_at = Some(now);

        Ok(Gathered {
            pos: self.pos,
            kind: self.kind,
            item,
            skill,
            xp,
            level: profile.skills.get(skill).level,
            levels_gained,
        })
    }

    /// Flip back to available once the delay has passed. Returns true on the
    /// transition.
    pub fn update(&mut self, now: f64) -> bool {
        match self.depleted_at {
            Some(at) if now - at >= self.respawn_delay => {
                self.depleted_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Every known node, keyed by tile.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    nodes: BTreeMap<TilePos, ResourceNode>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a node unless one already exists at `pos`. Returns true when
    /// a new node was created.
    pub fn register(&mut self, pos: TilePos, kind: ResourceKind, tile: Tile) -> bool {
        if self.nodes.contains_key(&pos) {
            return false;
        }
        self.nodes.insert(pos, ResourceNode::new(pos, kind, tile));
        true
    }

    pub fn get(&self, pos: TilePos) -> Option<&ResourceNode> {
        self.nodes.get(&pos)
    }

    pub fn get_mut(&mut self, pos: TilePos) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.nodes.values()
    }

    /// Attempt a gather on the node at `pos`.
    pub fn gather(
        &mut self,
        pos: TilePos,
        profile: &mut PlayerProfile,
        rng: &mut TileRng,
        now: f64,
    ) -> Result<Gathered, GatherError> {
        let node = self.nodes.get_mut(&pos).ok_or(GatherError::NoNode(pos))?;
        let result = node.gather(profile, rng, now);
        if let Ok(gathered) = &result {
            debug!(
                pos = %pos,
                item = %gathered.item.id,
                xp = gathered.xp,
                "node depleted"
            );
        }
        result
    }

    /// Respawn every node whose delay has elapsed. Returns the respawned tiles.
    pub fn update(&mut self, now: f64) -> Vec<TilePos> {
        self.nodes
            .values_mut()
            .filter_map(|node| node.update(now).then_some(node.pos))
            .collect()
    }

    /// Closest node in the square of `radius` tiles around `center`, not
    /// counting `center` itself. Available nodes win over depleted ones; ties
    /// resolve in tile order.
    pub fn nearest_around(&self, center: TilePos, radius: i32) -> Option<&ResourceNode> {
        (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
            .filter(|&offset| offset != (0, 0))
            .filter_map(|(dx, dy)| {
                let node = self.nodes.get(&TilePos::new(center.x + dx, center.y + dy))?;
                Some(((node.is_depleted(), dx * dx + dy * dy, node.pos), node))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PlayerProfile {
        PlayerProfile::new(0.0, 0.0)
    }

    /// Find a seed whose first roll succeeds (or fails) at the given chance.
    fn rng_with_outcome(chance: f64, succeed: bool) -> TileRng {
        (0u32..)
            .map(TileRng::new)
            .find(|rng| rng.clone().chance(chance) == succeed)
            .unwrap()
    }

    #[test]
    fn chance_curve() {
        assert!((gather_chance(1) - 0.306).abs() < 1e-9);
        assert!((gather_chance(50) - 0.6).abs() < 1e-9);
        assert_eq!(gather_chance(99), MAX_GATHER_CHANCE);
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = ResourceRegistry::new();
        let pos = TilePos::new(3, 3);
        assert!(registry.register(pos, ResourceKind::Tree, Tile::Tree));
        assert!(!registry.register(pos, ResourceKind::Rock, Tile::Stone));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(pos).unwrap().kind, ResourceKind::Tree);
    }

    #[test]
    fn successful_gather_depletes_and_rewards() {
        let mut registry = ResourceRegistry::new();
        let pos = TilePos::new(3, 3);
        registry.register(pos, ResourceKind::Tree, Tile::Tree);
        let mut profile = profile();
        let mut rng = rng_with_outcome(gather_chance(1), true);

        let gathered = registry.gather(pos, &mut profile, &mut rng, 10.0).unwrap();
        assert_eq!(gathered.item.id, ids::TIMBER);
        assert_eq!(gathered.xp, 25);
        assert_eq!(profile.inventory.count_item(ids::TIMBER), 1);
        assert_eq!(profile.skills.get(SkillKind::Woodcutting).experience, 25);
        assert!(registry.get(pos).unwrap().is_depleted());

        assert_eq!(
            registry.gather(pos, &mut profile, &mut rng, 11.0),
            Err(GatherError::AlreadyDepleted)
        );
    }

    #[test]
    fn failed_roll_leaves_node_available() {
        let mut registry = ResourceRegistry::new();
        let pos = TilePos::new(8, 8);
        registry.register(pos, ResourceKind::Rock, Tile::Stone);
        let mut profile = profile();
        let mut rng = rng_with_outcome(gather_chance(1), false);

        assert_eq!(
            registry.gather(pos, &mut profile, &mut rng, 0.0),
            Err(GatherError::RandomFailure)
        );
        assert!(!registry.get(pos).unwrap().is_depleted());
        assert_eq!(profile.inventory.count_item(ids::STONE), 0);
    }

    #[test]
    fn level_up_still_depletes() {
        let mut node =
            ResourceNode::new(TilePos::new(1, 1), ResourceKind::FishingSpot, Tile::Water);
        let mut profile = profile();
        profile.skills.get_mut(SkillKind::Fishing).add_xp(80);
        let mut rng = rng_with_outcome(gather_chance(1), true);

        let gathered = node.gather(&mut profile, &mut rng, 0.0).unwrap();
        assert_eq!(gathered.levels_gained, 1);
        assert_eq!(gathered.level, 2);
        assert!(node.is_depleted());
    }

    #[test]
    fn skill_requirement_is_enforced() {
        let mut node = ResourceNode::new(TilePos::new(1, 1), ResourceKind::Rock, Tile::Stone);
        node.required_level = 10;
        let err = node.can_gather(&profile()).unwrap_err();
        assert_eq!(
            err,
            GatherError::SkillTooLow {
                skill: SkillKind::Mining,
                required: 10,
                current: 1
            }
        );
    }

    #[test]
    fn depleted_wins_over_skill_check() {
        let mut node = ResourceNode::new(TilePos::new(1, 1), ResourceKind::Rock, Tile::Stone);
        node.required_level = 10;
        node.depleted_at = Some(0.0);
        assert_eq!(node.can_gather(&profile()), Err(GatherError::AlreadyDepleted));
    }

    #[test]
    fn respawn_after_delay() {
        let mut registry = ResourceRegistry::new();
        let pos = TilePos::new(0, 5);
        registry.register(pos, ResourceKind::Tree, Tile::Tree);
        registry.get_mut(pos).unwrap().depleted_at = Some(100.0);

        assert!(registry.update(129.9).is_empty());
        assert_eq!(registry.update(130.0), vec![pos]);
        assert!(!registry.get(pos).unwrap().is_depleted());
    }

    #[test]
    fn unknown_tile_is_no_node() {
        let mut registry = ResourceRegistry::new();
        let mut rng = TileRng::new(1);
        let pos = TilePos::new(42, 42);
        assert_eq!(
            registry.gather(pos, &mut profile(), &mut rng, 0.0),
            Err(GatherError::NoNode(pos))
        );
    }

    #[test]
    fn nearest_prefers_available_nodes() {
        let mut registry = ResourceRegistry::new();
        registry.register(TilePos::new(0, 0), ResourceKind::Tree, Tile::Tree);
        registry.register(TilePos::new(1, 0), ResourceKind::Tree, Tile::Tree);
        registry.register(TilePos::new(2, 2), ResourceKind::Rock, Tile::Stone);
        registry.register(TilePos::new(9, 9), ResourceKind::Rock, Tile::Stone);

        let center = TilePos::new(0, 0);
        let nearest = registry.nearest_around(center, 2).unwrap();
        assert_eq!(nearest.pos, TilePos::new(1, 0), "own tile is skipped");

        registry.get_mut(TilePos::new(1, 0)).unwrap().depleted_at = Some(0.0);
        let nearest = registry.nearest_around(center, 2).unwrap();
        assert_eq!(nearest.pos, TilePos::new(2, 2));

        assert!(registry.nearest_around(TilePos::new(20, 20), 2).is_none());
    }
}
