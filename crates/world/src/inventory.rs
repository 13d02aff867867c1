//! Fixed-size player inventory.
//!
//! Thirty ordered slots. Adding an item first tops up an existing stack with
//! the same id, then falls back to the first empty slot; a full inventory
//! rejects the item and hands it back untouched.

use serde::{Deserialize, Serialize};
use tileworld_core::item_def;

/// Number of slots in the player inventory.
pub const INVENTORY_SIZE: usize = 30;

/// A quantity of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub icon: String,
}

impl ItemStack {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            icon: icon.into(),
        }
    }

    /// Stack for a catalog id. Unknown ids use the id as the display name.
    pub fn of(id: &str, quantity: u32) -> Self {
        match item_def(id) {
            Some(def) => Self::new(def.id, def.name, quantity, def.icon),
            None => Self::new(id, id, quantity, "?"),
        }
    }

    /// Check if this stack can merge with another stack.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.id == other.id
    }
}

/// Player inventory with a fixed number of ordered slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<ItemStack>; INVENTORY_SIZE],
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Inventory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(INVENTORY_SIZE))?;
        for slot in &self.slots {
            seq.serialize_element(slot)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let slots: Vec<Option<ItemStack>> = Vec::deserialize(deserializer)?;
        if slots.len() != INVENTORY_SIZE {
            return Err(serde::de::Error::custom(format!(
                "expected {} slots, got {}",
                INVENTORY_SIZE,
                slots.len()
            )));
        }
        if slots.iter().flatten().any(|stack| stack.quantity == 0) {
            return Err(serde::de::Error::custom("empty stack stored in a slot"));
        }

        let slots: [Option<ItemStack>; INVENTORY_SIZE] = slots
            .try_into()
            .map_err(|_| serde::de::Error::custom("failed to convert to array"))?;

        Ok(Inventory { slots })
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Occupied slots with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ItemStack)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|stack| (idx, stack)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Whether `add` would succeed for this id.
    pub fn can_accept(&self, id: &str) -> bool {
        self.empty_slots() > 0 || self.iter().any(|(_, stack)| stack.id == id)
    }

    /// Add a stack. Returns the slot that received it, or the stack itself
    /// when there is no room.
    pub fn add(&mut self, stack: ItemStack) -> Result<usize, ItemStack> {
        if stack.quantity == 0 {
            return Err(stack);
        }
        let existing = self.slots.iter().position(|slot| {
            slot.as_ref().is_some_and(|held| {
                held.can_merge(&stack) && held.quantity.checked_add(stack.quantity).is_some()
            })
        });
        if let Some(idx) = existing {
            if let Some(held) = self.slots[idx].as_mut() {
                held.quantity += stack.quantity;
            }
            return Ok(idx);
        }
        match self.slots.iter().position(Option::is_none) {
            Some(idx) => {
                self.slots[idx] = Some(stack);
                Ok(idx)
            }
            None => Err(stack),
        }
    }

    /// Remove up to `quantity` from a slot, clearing it when it runs out.
    /// Returns false for an empty or out-of-range slot.
    pub fn remove(&mut self, slot: usize, quantity: u32) -> bool {
        let Some(entry) = self.slots.get_mut(slot) else {
            return false;
        };
        let Some(stack) = entry.as_mut() else {
            return false;
        };
        if quantity >= stack.quantity {
            *entry = None;
        } else {
            stack.quantity -= quantity;
        }
        true
    }

    /// Take a whole slot.
    pub fn take(&mut self, slot: usize) -> Option<ItemStack> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Overwrite a slot, returning whatever was there.
    pub fn replace(&mut self, slot: usize, stack: Option<ItemStack>) -> Option<ItemStack> {
        match self.slots.get_mut(slot) {
            Some(entry) => std::mem::replace(entry, stack),
            None => stack,
        }
    }

    /// Empty every slot, returning the stacks in slot order.
    pub fn take_all(&mut self) -> Vec<ItemStack> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Total quantity of an item across all slots.
    pub fn count_item(&self, id: &str) -> u32 {
        self.iter()
            .filter(|(_, stack)| stack.id == id)
            .map(|(_, stack)| stack.quantity)
            .sum()
    }

    pub fn find_item(&self, id: &str) -> Option<usize> {
        self.iter().find(|(_, stack)| stack.id == id).map(|(idx, _)| idx)
    }

    /// Remove `quantity` of an item across slots, lowest slot first. Nothing
    /// is removed unless the full amount is present.
    pub fn remove_item(&mut self, id: &str, quantity: u32) -> bool {
        if self.count_item(id) < quantity {
            return false;
        }
        let mut remaining = quantity;
        for entry in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            let Some(stack) = entry.as_mut() else {
                continue;
            };
            if stack.id != id {
                continue;
            }
            if stack.quantity <= remaining {
                remaining -= stack.quantity;
                *entry = None;
            } else {
                stack.quantity -= remaining;
                remaining = 0;
            }
        }
        true
    }
}
