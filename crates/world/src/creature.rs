//! Hostile creatures: stats, loot tables, and the per-tick combat AI.
//!
//! A creature idles at its spawn point until the player comes within
//! [`AGGRO_RADIUS`]. It then chases to [`STRIKE_RANGE`] and swings on its
//! cadence, gives up beyond [`LEASH_RANGE`], and walks home once disengaged.
//! Dead creatures come back at full health on their spawn point after
//! `respawn_delay` seconds.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tileworld_core::item::ids;

use crate::{Body, CombatState, EntityId, ItemStack, AGGRO_RADIUS, LEASH_RANGE, STRIKE_RANGE};

/// Seconds a dead creature stays down.
pub const CREATURE_RESPAWN_SECS: f64 = 60.0;
/// Creatures closer than this to their spawn point count as home.
pub const HOME_EPSILON: f64 = 0.1;

/// One independent drop roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item_id: String,
    /// Drop probability in `[0, 1]`.
    pub chance: f64,
}

/// Loot rolled on death. Each entry is rolled on its own, so a kill can
/// drop nothing, one item, or several.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn new(entries: Vec<LootEntry>) -> Self {
        Self { entries }
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ItemStack> {
        self.entries
            .iter()
            .filter(|entry| rng.gen::<f64>() < entry.chance)
            .map(|entry| ItemStack::of(&entry.item_id, 1))
            .collect()
    }
}

/// Stat block a creature is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub name: String,
    pub level: u32,
    pub max_health: f32,
    pub attack: u32,
    pub defense: u32,
    pub xp_reward: u64,
    pub gold_reward: u64,
    pub loot: LootTable,
}

impl CreatureTemplate {
    /// The level 1 goblin that guards the cave entrance.
    pub fn goblin() -> Self {
        Self {
            name: "Goblin".to_string(),
            level: 1,
            max_health: 10.0,
            attack: 2,
            defense: 1,
            xp_reward: 10,
            gold_reward: 2,
            loot: LootTable::new(vec![LootEntry {
                item_id: ids::CLOTH.to_string(),
                chance: 0.5,
            }]),
        }
    }
}

/// What a creature wants to do this tick. The simulation applies movement
/// and damage so terrain and the player's state stay in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatureAction {
    /// Nothing to do (dead and waiting, at home, or waiting on cadence)
    Idle,
    /// Move toward the target's position
    Chase { x: f64, y: f64 },
    /// Swing at the target
    Strike { target: EntityId },
    /// Walk back to the spawn point
    ReturnHome { x: f64, y: f64 },
    /// Death timer elapsed; put the creature back on its spawn point
    Respawn,
}

/// Where the player is, as seen by creature AI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Display name
    pub name: String,
    /// Creature level
    pub level: u32,
    /// Current health
    pub health: f32,
    /// Health restored on respawn
    pub max_health: f32,
    /// XP credited to the player on a kill
    pub xp_reward: u64,
    /// Gold credited to the player on a kill
    pub gold_reward: u64,
    /// Rolled once per kill
    pub loot: LootTable,
    /// Seconds between death and respawn
    pub respawn_delay: f64,
    /// Spawn point X
    pub spawn_x: f64,
    /// Spawn point Y
    pub spawn_y: f64,
    /// Time of death, while dead
    pub died_at: Option<f64>,
    /// Engagement and stats
    pub combat: CombatState,
}

impl Creature {
    pub fn from_template(template: &CreatureTemplate, spawn_x: f64, spawn_y: f64) -> Self {
        Self {
            name: template.name.clone(),
            level: template.level,
            health: template.max_health,
            max_health: template.max_health,
            xp_reward: template.xp_reward,
            gold_reward: template.gold_reward,
            loot: template.loot.clone(),
            respawn_delay: CREATURE_RESPAWN_SECS,
            spawn_x,
            spawn_y,
            died_at: None,
            combat: CombatState::new(template.attack, template.defense),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.died_at.is_some()
    }

    /// Take damage and return true if this hit killed the creature.
    /// Hits on a dead creature are ignored.
    pub fn take_damage(&mut self, amount: f32, now: f64) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.died_at = Some(now);
            self.combat.disengage();
            true
        } else {
            false
        }
    }

    pub fn respawn_due(&self, now: f64) -> bool {
        self.died_at
            .is_some_and(|died_at| now - died_at >= self.respawn_delay)
    }

    /// Back to full health on the spawn point, disengaged.
    pub fn respawn(&mut self, body: &mut Body) {
        self.health = self.max_health;
        self.died_at = None;
        self.reset_to_spawn(body);
    }

    /// Teleport home and drop any engagement. Health is left alone.
    pub fn reset_to_spawn(&mut self, body: &mut Body) {
        body.x = self.spawn_x;
        body.y = self.spawn_y;
        self.combat.disengage();
    }

    fn at_home(&self, body: &Body) -> bool {
        body.distance_to(self.spawn_x, self.spawn_y) <= HOME_EPSILON
    }

    fn home_or_idle(&self, body: &Body) -> CreatureAction {
        if self.at_home(body) {
            CreatureAction::Idle
        } else {
            CreatureAction::ReturnHome {
                x: self.spawn_x,
                y: self.spawn_y,
            }
        }
    }

    /// Decide this tick's action.
    ///
    /// `player` is `None` while the player is dead or respawning.
    pub fn think(&mut self, body: &Body, player: Option<TargetView>, now: f64) -> CreatureAction {
        if self.is_dead() {
            return if self.respawn_due(now) {
                CreatureAction::Respawn
            } else {
                CreatureAction::Idle
            };
        }

        let Some(player) = player else {
            self.combat.disengage();
            return self.home_or_idle(body);
        };

        let distance = body.distance_to(player.x, player.y);
        if self.combat.is_targeting(player.id) {
            if distance > LEASH_RANGE {
                self.combat.disengage();
                return self.home_or_idle(body);
            }
        } else if distance <= AGGRO_RADIUS {
            self.combat.engage(player.id);
        } else {
            return self.home_or_idle(body);
        }

        if distance > STRIKE_RANGE {
            CreatureAction::Chase {
                x: player.x,
                y: player.y,
            }
        } else if self.combat.ready(now) {
            self.combat.record_attack(now);
            CreatureAction::Strike { target: player.id }
        } else {
            CreatureAction::Idle
        }
    }
}
