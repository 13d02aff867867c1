//! Persistent player profile: stats, skills, inventory, equipment, gold and
//! quest progress.
//!
//! Mutations go through the methods here so the invariants hold everywhere:
//! pools stay inside `[0, max]`, gold never goes negative, and equipping moves
//! items between inventory and equipment without duplicating or losing them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tileworld_core::item::ids;
use tileworld_core::{item_def, EquipSlot};
use tracing::{debug, info};

use crate::{ItemStack, Inventory, QuestError, QuestLog, QuestReward, SkillKind, Skills};

/// Save format written by [`PlayerProfile::to_save_string`].
pub const PROFILE_SAVE_VERSION: u32 = 1;
/// Mana restored every simulation tick.
pub const MANA_REGEN_PER_TICK: f32 = 0.05;

const BASE_HEALTH: f32 = 100.0;
const BASE_MANA: f32 = 50.0;
const BASE_ATTRIBUTE: u32 = 10;
const FIRST_LEVEL_XP: u64 = 100;
/// Items every new profile starts with.
pub const STARTER_KIT: [(&str, u32); 3] = [(ids::WOOD, 10), (ids::STONE, 5), (ids::SWORD, 1)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("inventory slot {0} is empty")]
    EmptySlot(usize),
    #[error("{0} cannot be equipped")]
    NotEquippable(String),
    #[error("nothing equipped in the {0} slot")]
    NothingEquipped(EquipSlot),
    #[error("no room in inventory")]
    InventoryFull,
}

/// Reasons a profile save could not be restored.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile load failed: malformed save: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("profile load failed: save has no format version")]
    MissingVersion,
    #[error("profile load failed: unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },
    #[error("profile load failed: corrupt save file: {0}")]
    Corrupt(String),
    #[error("profile load failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Items currently worn, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, ItemStack>,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<&ItemStack> {
        self.slots.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &ItemStack)> + '_ {
        self.slots.iter().map(|(slot, stack)| (*slot, stack))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Extra damage ceiling granted by the equipped weapon.
    pub fn weapon_bonus(&self) -> u32 {
        self.get(EquipSlot::Weapon)
            .and_then(|stack| item_def(&stack.id))
            .map_or(0, |def| def.attack_bonus)
    }
}

/// What finishing a quest paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub quest: String,
    pub reward: QuestReward,
    /// Skills that levelled, with their new level.
    pub level_ups: Vec<(SkillKind, u8)>,
    /// Reward items that did not fit in the inventory.
    pub dropped: Vec<ItemStack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub x: f64,
    pub y: f64,
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub level: u32,
    pub experience: u64,
    pub experience_to_level: u64,
    pub strength: u32,
    pub agility: u32,
    pub intelligence: u32,
    pub skills: Skills,
    pub gold: u64,
    pub inventory: Inventory,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub quests: QuestLog,
}

impl PlayerProfile {
    /// Fresh profile at a position, carrying the starter kit.
    pub fn new(x: f64, y: f64) -> Self {
        let mut profile = Self {
            x,
            y,
            health: BASE_HEALTH,
            max_health: BASE_HEALTH,
            mana: BASE_MANA,
            max_mana: BASE_MANA,
            level: 1,
            experience: 0,
            experience_to_level: FIRST_LEVEL_XP,
            strength: BASE_ATTRIBUTE,
            agility: BASE_ATTRIBUTE,
            intelligence: BASE_ATTRIBUTE,
            skills: Skills::default(),
            gold: 0,
            inventory: Inventory::new(),
            equipment: Equipment::default(),
            quests: QuestLog::new(),
        };
        for (id, quantity) in STARTER_KIT {
            let added = profile.inventory.add(ItemStack::of(id, quantity));
            debug_assert!(added.is_ok(), "starter kit overflowed an empty inventory");
        }
        profile
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }

    /// Spend mana if enough is available.
    pub fn use_mana(&mut self, amount: f32) -> bool {
        if self.mana >= amount {
            self.mana -= amount;
            return true;
        }
        false
    }

    pub fn restore_mana(&mut self, amount: f32) {
        self.mana = (self.mana + amount.max(0.0)).min(self.max_mana);
    }

    /// Character XP (separate from skill XP). Returns levels gained.
    pub fn gain_experience(&mut self, amount: u64) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        self.experience_to_level = self.experience_to_level.max(1);
        let mut gained = 0;
        while self.experience >= self.experience_to_level {
            self.level_up();
            gained += 1;
        }
        gained
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.experience -= self.experience_to_level;
        self.experience_to_level = (self.experience_to_level * 3 / 2).max(1);
        self.max_health += 10.0;
        self.max_mana += 5.0;
        self.health = self.max_health;
        self.mana = self.max_mana;
        self.strength += 2;
        self.agility += 2;
        self.intelligence += 2;
        info!(level = self.level, "player levelled up");
    }

    pub fn add_item(&mut self, stack: ItemStack) -> Result<usize, ItemStack> {
        self.inventory.add(stack)
    }

    pub fn remove_item(&mut self, slot: usize, quantity: u32) -> bool {
        self.inventory.remove(slot, quantity)
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Spend gold if the balance covers it.
    pub fn remove_gold(&mut self, amount: u64) -> bool {
        if self.gold >= amount {
            self.gold -= amount;
            return true;
        }
        false
    }

    pub fn weapon_bonus(&self) -> u32 {
        self.equipment.weapon_bonus()
    }

    /// Move one unit from an inventory slot into its equipment slot. Whatever
    /// was equipped there goes back to the inventory; if it cannot, nothing
    /// changes.
    pub fn equip(&mut self, slot_index: usize) -> Result<EquipSlot, EquipError> {
        let original = self
            .inventory
            .get(slot_index)
            .cloned()
            .ok_or(EquipError::EmptySlot(slot_index))?;
        let equip_slot = item_def(&original.id)
            .and_then(|def| def.equip_slot)
            .ok_or_else(|| EquipError::NotEquippable(original.name.clone()))?;

        self.inventory.remove(slot_index, 1);
        let mut item = original.clone();
        item.quantity = 1;

        if let Some(previous) = self.equipment.slots.remove(&equip_slot) {
            if let Err(previous) = self.inventory.add(previous) {
                self.inventory.replace(slot_index, Some(original));
                self.equipment.slots.insert(equip_slot, previous);
                return Err(EquipError::InventoryFull);
            }
        }
        debug!(item = %item.id, slot = %equip_slot, "equipped");
        self.equipment.slots.insert(equip_slot, item);
        Ok(equip_slot)
    }

    /// Move the item in `slot` back into the inventory.
    pub fn unequip(&mut self, slot: EquipSlot) -> Result<usize, EquipError> {
        let item = self
            .equipment
            .slots
            .remove(&slot)
            .ok_or(EquipError::NothingEquipped(slot))?;
        match self.inventory.add(item) {
            Ok(idx) => Ok(idx),
            Err(item) => {
                self.equipment.slots.insert(slot, item);
                Err(EquipError::InventoryFull)
            }
        }
    }

    /// Close out a finished quest and pay its rewards into this profile.
    pub fn complete_quest(&mut self, id: &str) -> Result<QuestCompletion, QuestError> {
        let reward = self.quests.finish(id)?;
        let mut level_ups = Vec::new();
        for xp in &reward.xp {
            let skill = self.skills.get_mut(xp.skill);
            if skill.add_xp(xp.amount) > 0 {
                level_ups.push((xp.skill, skill.level));
            }
        }
        let dropped = reward
            .items
            .iter()
            .cloned()
            .filter_map(|item| self.inventory.add(item).err())
            .collect();
        self.add_gold(reward.gold);
        info!(quest = id, gold = reward.gold, "quest completed");
        Ok(QuestCompletion {
            quest: id.to_string(),
            reward,
            level_ups,
            dropped,
        })
    }

    /// Serialize as a versioned JSON record.
    pub fn to_save_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&SaveRecordRef {
            version: PROFILE_SAVE_VERSION,
            profile: self,
        })
    }

    /// Restore from a versioned JSON record.
    pub fn from_save_str(data: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(data)?;
        let version = value
            .get("version")
            .ok_or(ProfileError::MissingVersion)?
            .as_u64()
            .ok_or(ProfileError::MissingVersion)?;
        if version != u64::from(PROFILE_SAVE_VERSION) {
            return Err(ProfileError::UnsupportedVersion {
                found: version,
                expected: PROFILE_SAVE_VERSION,
            });
        }
        let record: SaveRecord = serde_json::from_value(value)?;
        let profile = record.profile;
        if profile.max_health <= 0.0 || !(0.0..=profile.max_health).contains(&profile.health) {
            return Err(ProfileError::Corrupt(format!(
                "health {} outside 0..={}",
                profile.health, profile.max_health
            )));
        }
        if profile.mana < 0.0 || profile.mana > profile.max_mana {
            return Err(ProfileError::Corrupt(format!(
                "mana {} outside 0..={}",
                profile.mana, profile.max_mana
            )));
        }
        if profile.experience_to_level == 0 {
            return Err(ProfileError::Corrupt(
                "experience_to_level must be positive".to_string(),
            ));
        }
        Ok(profile)
    }
}

#[derive(Serialize)]
struct SaveRecordRef<'a> {
    version: u32,
    #[serde(flatten)]
    profile: &'a PlayerProfile,
}

#[derive(Deserialize)]
struct SaveRecord {
    #[allow(dead_code)]
    version: u32,
    #[serde(flatten)]
    profile: PlayerProfile,
}
