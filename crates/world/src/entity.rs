//! Entities: anything with a position that lives in the simulation.
//!
//! Every entity shares a [`Body`] (position, footprint, speed) and carries a
//! kind-specific payload in [`EntityKind`]. Systems dispatch on the kind with
//! exhaustive matches.

use serde::{Deserialize, Serialize};

use crate::{
    CombatPhase, CombatState, Creature, Inventory, ItemStack, PLAYER_ATTACK, PLAYER_DEFENSE,
};

/// Tiles per second for every walking entity.
pub const BASE_SPEED: f64 = 3.0;
/// Seconds an unlooted corpse stays in the world.
pub const CORPSE_LIFETIME_SECS: f64 = 300.0;
/// NPCs answer within this Chebyshev distance (exclusive).
pub const TALK_RANGE: f64 = 2.0;

/// Stable entity handle. Ids are never reused within a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Direction an avatar is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Facing for a movement vector, picked from the dominant axis.
    /// Returns `None` for a zero vector.
    pub fn from_delta(dx: f64, dy: f64) -> Option<Self> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if dy > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        })
    }
}

/// Position and footprint shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World X (tiles)
    pub x: f64,
    /// World Y (tiles)
    pub y: f64,
    /// Footprint width (tiles)
    pub width: f64,
    /// Footprint height (tiles)
    pub height: f64,
    /// Tiles per second
    pub speed: f64,
}

impl Body {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: 1.0,
            height: 1.0,
            speed: BASE_SPEED,
        }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance_to_body(&self, other: &Body) -> f64 {
        self.distance_to(other.x, other.y)
    }
}

/// The player's in-world avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub facing: Facing,
    pub health: f32,
    pub max_health: f32,
    pub combat: CombatState,
}

impl Avatar {
    pub fn new(health: f32, max_health: f32) -> Self {
        Self {
            facing: Facing::default(),
            health,
            max_health,
            combat: CombatState::new(PLAYER_ATTACK, PLAYER_DEFENSE),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Subtract `amount`, flooring at zero. Returns true if this killed the avatar.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.is_dead()
    }
}

/// A talking non-player character with a linear script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    pub dialogue: Vec<String>,
    cursor: usize,
    pub has_quest: bool,
    pub quest_completed: bool,
    /// Quest offered by this NPC, if any.
    pub quest_id: Option<String>,
}

/// One line of conversation returned by [`Npc::talk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueLine {
    pub line: String,
    /// True when this was the script's last line; the cursor has been reset.
    pub finished: bool,
}

impl Npc {
    pub fn new(name: impl Into<String>, dialogue: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dialogue,
            cursor: 0,
            has_quest: false,
            quest_completed: false,
            quest_id: None,
        }
    }

    pub fn with_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.has_quest = true;
        self.quest_id = Some(quest_id.into());
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Line under the cursor, or `"..."` for an empty script.
    pub fn current_line(&self) -> &str {
        self.dialogue.get(self.cursor).map_or("...", String::as_str)
    }

    /// Move to the next line. Returns false when already on the last one.
    pub fn next_line(&mut self) -> bool {
        if self.cursor + 1 < self.dialogue.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn reset_dialogue(&mut self) {
        self.cursor = 0;
    }

    /// Speak the current line and advance; wraps to the start after the last line.
    pub fn talk(&mut self) -> DialogueLine {
        let line = self.current_line().to_string();
        let finished = !self.next_line();
        if finished {
            self.reset_dialogue();
        }
        DialogueLine { line, finished }
    }
}

/// Items dropped where the player died.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpse {
    pub items: Vec<ItemStack>,
    pub created_at: f64,
    pub lifetime: f64,
}

impl Corpse {
    pub fn new(items: Vec<ItemStack>, created_at: f64) -> Self {
        Self {
            items,
            created_at,
            lifetime: CORPSE_LIFETIME_SECS,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at >= self.lifetime
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move as many stacks as fit into `inventory`. Returns what moved;
    /// stacks that do not fit stay on the corpse.
    pub fn loot_into(&mut self, inventory: &mut Inventory) -> Vec<ItemStack> {
        let mut moved = Vec::new();
        let mut kept = Vec::new();
        for stack in self.items.drain(..) {
            match inventory.add(stack.clone()) {
                Ok(_) => moved.push(stack),
                Err(rejected) => kept.push(rejected),
            }
        }
        self.items = kept;
        moved
    }
}

/// Kind-specific entity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Player(Avatar),
    Npc(Npc),
    Creature(Creature),
    Corpse(Corpse),
}

/// Result of routing damage to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The entity kind cannot take damage, or was already dead.
    Ignored,
    Hit,
    Killed,
}

/// Read-only per-tick view for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: &'static str,
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub health: f32,
    pub max_health: f32,
    pub engaged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, body: Body, kind: EntityKind) -> Self {
        Self { id, body, kind }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Npc(_) => "npc",
            EntityKind::Creature(_) => "creature",
            EntityKind::Corpse(_) => "corpse",
        }
    }

    pub fn as_creature(&self) -> Option<&Creature> {
        match &self.kind {
            EntityKind::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn as_creature_mut(&mut self) -> Option<&mut Creature> {
        match &mut self.kind {
            EntityKind::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn as_avatar_mut(&mut self) -> Option<&mut Avatar> {
        match &mut self.kind {
            EntityKind::Player(avatar) => Some(avatar),
            _ => None,
        }
    }

    /// Whether the entity can currently be fought.
    pub fn is_alive_combatant(&self) -> bool {
        match &self.kind {
            EntityKind::Player(avatar) => !avatar.is_dead(),
            EntityKind::Creature(creature) => !creature.is_dead(),
            EntityKind::Npc(_) | EntityKind::Corpse(_) => false,
        }
    }

    pub fn combat(&self) -> Option<&CombatState> {
        match &self.kind {
            EntityKind::Player(avatar) => Some(&avatar.combat),
            EntityKind::Creature(creature) => Some(&creature.combat),
            EntityKind::Npc(_) | EntityKind::Corpse(_) => None,
        }
    }

    pub fn combat_mut(&mut self) -> Option<&mut CombatState> {
        match &mut self.kind {
            EntityKind::Player(avatar) => Some(&mut avatar.combat),
            EntityKind::Creature(creature) => Some(&mut creature.combat),
            EntityKind::Npc(_) | EntityKind::Corpse(_) => None,
        }
    }

    /// Route damage to whichever health pool the kind has. NPCs and corpses
    /// ignore it.
    pub fn apply_damage(&mut self, amount: f32, now: f64) -> DamageOutcome {
        let killed = match &mut self.kind {
            EntityKind::Player(avatar) => {
                if avatar.is_dead() {
                    return DamageOutcome::Ignored;
                }
                avatar.take_damage(amount)
            }
            EntityKind::Creature(creature) => {
                if creature.is_dead() {
                    return DamageOutcome::Ignored;
                }
                creature.take_damage(amount, now)
            }
            EntityKind::Npc(_) | EntityKind::Corpse(_) => return DamageOutcome::Ignored,
        };
        if killed {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hit
        }
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        let (name, facing, health, max_health, engaged) = match &self.kind {
            EntityKind::Player(avatar) => (
                None,
                avatar.facing,
                avatar.health,
                avatar.max_health,
                avatar.combat.phase() == CombatPhase::Engaged,
            ),
            EntityKind::Creature(creature) => (
                Some(creature.name.clone()),
                Facing::default(),
                creature.health,
                creature.max_health,
                creature.combat.is_engaged(),
            ),
            EntityKind::Npc(npc) => (Some(npc.name.clone()), Facing::default(), 0.0, 0.0, false),
            EntityKind::Corpse(_) => (None, Facing::default(), 0.0, 0.0, false),
        };
        EntitySnapshot {
            id: self.id,
            kind: self.kind_name(),
            name,
            x: self.body.x,
            y: self.body.y,
            facing,
            health,
            max_health,
            engaged,
        }
    }
}
