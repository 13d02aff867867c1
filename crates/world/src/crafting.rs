//! Crafting recipes and the atomic craft operation.
//!
//! Recipes are plain data and can be loaded from JSON. A craft either fully
//! succeeds (inputs consumed, output added, XP granted) or leaves the profile
//! untouched.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tileworld_core::item::ids;
use tracing::debug;

use crate::{ItemStack, PlayerProfile, SkillKind};

/// Crafting recipe input requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeInput {
    /// Item consumed by the craft.
    pub item_id: String,
    /// Amount consumed.
    pub count: u32,
}

impl RecipeInput {
    pub fn new(item_id: &str, count: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            count,
        }
    }
}

/// Crafting recipe definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier (e.g., "wooden_sword").
    pub id: String,
    /// Items consumed.
    pub inputs: Vec<RecipeInput>,
    /// Items that must be held but are not consumed (a campfire to cook on).
    #[serde(default)]
    pub catalysts: Vec<String>,
    /// Item produced.
    pub output_item: String,
    /// Amount produced.
    pub output_count: u32,
    /// Skill credited, if any.
    #[serde(default)]
    pub skill: Option<SkillKind>,
    /// XP credited to `skill`.
    #[serde(default)]
    pub xp: u64,
}

impl Recipe {
    /// Check that every input and catalyst is present in the profile.
    pub fn missing_input(&self, profile: &PlayerProfile) -> Option<String> {
        self.inputs
            .iter()
            .find(|input| profile.inventory.count_item(&input.item_id) < input.count)
            .map(|input| input.item_id.clone())
            .or_else(|| {
                self.catalysts
                    .iter()
                    .find(|id| profile.inventory.count_item(id) == 0)
                    .cloned()
            })
    }

    pub fn can_craft(&self, profile: &PlayerProfile) -> bool {
        self.missing_input(profile).is_none()
    }

    /// Whether this recipe cooks rather than crafts.
    pub fn is_cooking(&self) -> bool {
        self.skill == Some(SkillKind::Cooking)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CraftError {
    #[error("unknown recipe {id}")]
    UnknownRecipe { id: String },
    #[error("missing {item}")]
    MissingInput { item: String },
    #[error("no room in inventory")]
    InventoryFull,
}

/// Result of a successful craft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crafted {
    pub recipe: String,
    pub item: ItemStack,
    pub skill: Option<SkillKind>,
    pub xp: u64,
    pub levels_gained: u8,
}

/// Craft `recipe` against the profile.
pub fn craft(profile: &mut PlayerProfile, recipe: &Recipe) -> Result<Crafted, CraftError> {
    if let Some(item) = recipe.missing_input(profile) {
        return Err(CraftError::MissingInput { item });
    }

    // Work on a copy so a full inventory leaves nothing half-consumed.
    let mut inventory = profile.inventory.clone();
    for input in &recipe.inputs {
        if !inventory.remove_item(&input.item_id, input.count) {
            return Err(CraftError::MissingInput {
                item: input.item_id.clone(),
            });
        }
    }
    let item = ItemStack::of(&recipe.output_item, recipe.output_count);
    if inventory.add(item.clone()).is_err() {
        return Err(CraftError::InventoryFull);
    }
    profile.inventory = inventory;

    let levels_gained = match recipe.skill {
        Some(skill) if recipe.xp > 0 => profile.skills.get_mut(skill).add_xp(recipe.xp),
        _ => 0,
    };
    debug!(recipe = %recipe.id, item = %item.id, qty = item.quantity, "crafted");
    Ok(Crafted {
        recipe: recipe.id.clone(),
        item,
        skill: recipe.skill,
        xp: recipe.xp,
        levels_gained,
    })
}

/// Recipe registry managing all loaded recipes.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load recipes from a JSON array.
    pub fn load_from_str(content: &str) -> Result<Self> {
        let recipes: Vec<Recipe> =
            serde_json::from_str(content).context("Failed to parse recipe JSON")?;
        let mut registry = Self::new();
        for recipe in recipes {
            registry.add_recipe(recipe);
        }
        Ok(registry)
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipes the profile can make right now.
    pub fn craftable<'a>(
        &'a self,
        profile: &'a PlayerProfile,
    ) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes.values().filter(move |recipe| recipe.can_craft(profile))
    }

    /// Look up and craft in one step.
    pub fn craft(&self, profile: &mut PlayerProfile, id: &str) -> Result<Crafted, CraftError> {
        let recipe = self
            .get(id)
            .ok_or_else(|| CraftError::UnknownRecipe { id: id.to_string() })?;
        craft(profile, recipe)
    }

    /// The built-in recipe book.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let recipe = |id: &str, inputs: Vec<RecipeInput>, output_count: u32| Recipe {
            id: id.to_string(),
            inputs,
            catalysts: Vec::new(),
            output_item: id.to_string(),
            output_count,
            skill: None,
            xp: 0,
        };

        registry.add_recipe(recipe(ids::WOODEN_SWORD, vec![RecipeInput::new(ids::TIMBER, 2)], 1));
        registry.add_recipe(recipe(
            ids::BOW,
            vec![RecipeInput::new(ids::TIMBER, 2), RecipeInput::new(ids::CLOTH, 1)],
            1,
        ));
        registry.add_recipe(recipe(
            ids::ARROWS,
            vec![RecipeInput::new(ids::STONE, 1), RecipeInput::new(ids::TIMBER, 1)],
            10,
        ));
        registry.add_recipe(recipe(
            ids::CAMPFIRE,
            vec![RecipeInput::new(ids::TIMBER, 5), RecipeInput::new(ids::STONE, 2)],
            1,
        ));
        registry.add_recipe(Recipe {
            catalysts: vec![ids::CAMPFIRE.to_string()],
            skill: Some(SkillKind::Cooking),
            xp: 30,
            ..recipe(ids::COOKED_FISH, vec![RecipeInput::new(ids::RAW_TUNA, 1)], 1)
        });
        registry
    }
}
