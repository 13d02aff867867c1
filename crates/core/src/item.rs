//! Item catalog - every item the world can hand out, and where it can be worn.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable string ids for catalog items.
#[allow(missing_docs)]
pub mod ids {
    pub const TIMBER: &str = "timber";
    pub const STONE: &str = "stone";
    pub const RAW_TUNA: &str = "raw_tuna";
    pub const CLOTH: &str = "cloth";
    pub const WOOD: &str = "wood";
    pub const SWORD: &str = "sword";
    pub const WOODEN_SWORD: &str = "wooden_sword";
    pub const BOW: &str = "bow";
    pub const ARROWS: &str = "arrows";
    pub const CAMPFIRE: &str = "campfire";
    pub const COOKED_FISH: &str = "cooked_fish";
}

/// Named equipment slots on the player profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    /// Head armour
    Helm,
    /// Body armour
    Chest,
    /// Leg armour
    Legs,
    /// Hand armour
    Gloves,
    /// Foot armour
    Boots,
    /// Main-hand weapon
    Weapon,
    /// Shield or off-hand item
    Offhand,
}

impl EquipSlot {
    /// All slots in display order.
    pub const ALL: [EquipSlot; 7] = [
        EquipSlot::Helm,
        EquipSlot::Chest,
        EquipSlot::Legs,
        EquipSlot::Gloves,
        EquipSlot::Boots,
        EquipSlot::Weapon,
        EquipSlot::Offhand,
    ];

    /// Canonical lowercase key.
    pub const fn as_str(self) -> &'static str {
        match self {
            EquipSlot::Helm => "helm",
            EquipSlot::Chest => "chest",
            EquipSlot::Legs => "legs",
            EquipSlot::Gloves => "gloves",
            EquipSlot::Boots => "boots",
            EquipSlot::Weapon => "weapon",
            EquipSlot::Offhand => "offhand",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDef {
    /// Stable id used in inventories and saves
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Icon glyph consumed by the HUD
    pub icon: &'static str,
    /// Slot this item can be equipped into, if any
    pub equip_slot: Option<EquipSlot>,
    /// Added to the top of the player's damage roll while equipped
    pub attack_bonus: u32,
}

impl ItemDef {
    const fn material(id: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self {
            id,
            name,
            icon,
            equip_slot: None,
            attack_bonus: 0,
        }
    }

    const fn weapon(
        id: &'static str,
        name: &'static str,
        icon: &'static str,
        attack_bonus: u32,
    ) -> Self {
        Self {
            id,
            name,
            icon,
            equip_slot: Some(EquipSlot::Weapon),
            attack_bonus,
        }
    }

    /// Whether the item can be equipped at all.
    pub fn is_equippable(&self) -> bool {
        self.equip_slot.is_some()
    }
}

/// Every item known to the world.
pub const ITEMS: &[ItemDef] = &[
    ItemDef::material(ids::TIMBER, "Timber", "🪵"),
    ItemDef::material(ids::STONE, "Stone", "🪨"),
    ItemDef::material(ids::RAW_TUNA, "Raw Tuna", "🐟"),
    ItemDef::material(ids::CLOTH, "Cloth", "🧵"),
    ItemDef::material(ids::WOOD, "Wood", "🪵"),
    ItemDef::weapon(ids::SWORD, "Sword", "⚔️", 2),
    ItemDef::weapon(ids::WOODEN_SWORD, "Wooden Sword", "🗡️", 1),
    ItemDef::weapon(ids::BOW, "Bow", "🏹", 1),
    ItemDef::material(ids::ARROWS, "Arrows", "➶"),
    ItemDef::material(ids::CAMPFIRE, "Campfire", "🔥"),
    ItemDef::material(ids::COOKED_FISH, "Cooked Fish", "🍖"),
];

/// Look up a catalog entry by id.
pub fn item_def(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|def| def.id == id)
}
