//! Per-combatant engagement state and damage rolls.
//!
//! A combatant is either idle or engaged against one target. Engaged
//! combatants close to [`STRIKE_RANGE`] and swing once per cadence interval;
//! the first swing after engaging is immediate.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Seconds between two swings of the same combatant.
pub const ATTACK_CADENCE_SECS: f64 = 2.4;
/// Creatures notice the player within this many tiles.
pub const AGGRO_RADIUS: f64 = 4.0;
/// Swings only land within this many tiles.
pub const STRIKE_RANGE: f64 = 1.5;
/// Creatures give up the chase beyond this many tiles.
pub const LEASH_RANGE: f64 = 8.0;
/// Top of the unarmed player damage roll.
pub const PLAYER_BASE_MAX_DAMAGE: u32 = 3;

pub const PLAYER_ATTACK: u32 = 10;
pub const PLAYER_DEFENSE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatPhase {
    Idle,
    Engaged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    target: Option<EntityId>,
    /// `None` means the next swing may happen right away.
    last_attack_at: Option<f64>,
    pub cadence: f64,
    pub attack: u32,
    pub defense: u32,
}

impl CombatState {
    pub fn new(attack: u32, defense: u32) -> Self {
        Self {
            target: None,
            last_attack_at: None,
            cadence: ATTACK_CADENCE_SECS,
            attack,
            defense,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        if self.target.is_some() {
            CombatPhase::Engaged
        } else {
            CombatPhase::Idle
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn is_targeting(&self, id: EntityId) -> bool {
        self.target == Some(id)
    }

    /// Lock onto `target`. Re-engaging the current target keeps the cadence.
    pub fn engage(&mut self, target: EntityId) {
        if self.target != Some(target) {
            self.target = Some(target);
            self.last_attack_at = None;
        }
    }

    pub fn disengage(&mut self) {
        self.target = None;
        self.last_attack_at = None;
    }

    /// Whether the cadence interval has passed since the last swing.
    pub fn ready(&self, now: f64) -> bool {
        self.last_attack_at
            .map_or(true, |last| now - last >= self.cadence)
    }

    pub fn record_attack(&mut self, now: f64) {
        self.last_attack_at = Some(now);
    }
}

/// Player swing: uniform in `1..=3 + weapon_bonus`.
pub fn roll_player_damage<R: Rng + ?Sized>(rng: &mut R, weapon_bonus: u32) -> u32 {
    rng.gen_range(1..=PLAYER_BASE_MAX_DAMAGE + weapon_bonus)
}

/// Creature swing: uniform in `1..=max(1, attack - defense)`.
pub fn roll_creature_damage<R: Rng + ?Sized>(rng: &mut R, attack: u32, defense: u32) -> u32 {
    let ceiling = attack.saturating_sub(defense).max(1);
    rng.gen_range(1..=ceiling)
}
