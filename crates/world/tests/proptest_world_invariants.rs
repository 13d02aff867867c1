//! Property-based tests for world and progression invariants
//!
//! Validates:
//! - Every tile maps to exactly one chunk and back, including negative coordinates
//! - The skill XP curve is monotonic and levels never go backwards
//! - Inventory adds and removals conserve item counts
//! - Gathering never changes anything but the gathered node on failure

use proptest::prelude::*;
use tileworld_core::item::ids;
use tileworld_core::TileRng;
use tileworld_world::{
    xp_for_level, ChunkPos, Inventory, ItemStack, PlayerProfile, ResourceKind, ResourceRegistry,
    Skill, SkillKind, Tile, TilePos, CHUNK_SIZE, INVENTORY_SIZE, MAX_SKILL_LEVEL,
};

const ITEM_IDS: [&str; 4] = [ids::TIMBER, ids::STONE, ids::RAW_TUNA, ids::CLOTH];

proptest! {
    /// Property: a tile's chunk origin plus its local offset is the tile itself.
    #[test]
    fn tile_chunk_decomposition(x in -100_000i32..100_000, y in -100_000i32..100_000) {
        let tile = TilePos::new(x, y);
        let chunk = tile.chunk();
        let local = tile.local();
        let origin = chunk.origin();

        prop_assert!(local.x < CHUNK_SIZE && local.y < CHUNK_SIZE);
        prop_assert_eq!(origin.x + local.x as i32, x);
        prop_assert_eq!(origin.y + local.y as i32, y);
        prop_assert_eq!(ChunkPos::containing(tile), chunk);
    }

    /// Property: continuous positions floor into the tile that contains them.
    #[test]
    fn containing_floors(x in -5_000.0f64..5_000.0, y in -5_000.0f64..5_000.0) {
        let tile = TilePos::containing(x, y);
        prop_assert!(f64::from(tile.x) <= x && x < f64::from(tile.x) + 1.0);
        prop_assert!(f64::from(tile.y) <= y && y < f64::from(tile.y) + 1.0);
    }

    /// Property: the XP table is non-decreasing and add_xp lands on the
    /// highest level the accumulated XP pays for.
    #[test]
    fn skill_curve_is_monotonic(grants in prop::collection::vec(0u64..50_000, 1..20)) {
        for level in 1..MAX_SKILL_LEVEL {
            prop_assert!(xp_for_level(level) < xp_for_level(level + 1));
        }

        let mut skill = Skill::new(SkillKind::Mining);
        let mut total = 0u64;
        for amount in grants {
            let before = skill.level;
            let gained = skill.add_xp(amount);
            total += amount;
            prop_assert_eq!(skill.level, before + gained);
            prop_assert_eq!(skill.experience, total);
            prop_assert!(xp_for_level(skill.level) <= total);
            if skill.level < MAX_SKILL_LEVEL {
                prop_assert!(xp_for_level(skill.level + 1) > total);
            }
        }
    }

    /// Property: items are never created or destroyed by add/remove.
    #[test]
    fn inventory_conserves_items(
        ops in prop::collection::vec((0usize..ITEM_IDS.len(), 1u32..50, any::<bool>()), 1..80),
    ) {
        let mut inventory = Inventory::new();
        let mut expected = [0u32; ITEM_IDS.len()];

        for (which, qty, is_add) in ops {
            let id = ITEM_IDS[which];
            if is_add {
                match inventory.add(ItemStack::of(id, qty)) {
                    Ok(_) => expected[which] += qty,
                    Err(rejected) => prop_assert_eq!(rejected.quantity, qty),
                }
            } else if inventory.remove_item(id, qty) {
                expected[which] -= qty;
            }
            for (i, id) in ITEM_IDS.iter().enumerate() {
                prop_assert_eq!(inventory.count_item(id), expected[i]);
            }
            prop_assert!(inventory.iter().count() <= INVENTORY_SIZE);
        }
    }

    /// Property: a failed gather leaves the profile and the node untouched;
    /// a successful one depletes only that node.
    #[test]
    fn gather_touches_only_its_node(seed in any::<u32>(), attempts in 1usize..30) {
        let mut nodes = ResourceRegistry::new();
        let target = TilePos::new(3, 3);
        let other = TilePos::new(4, 3);
        nodes.register(target, ResourceKind::Tree, Tile::Tree);
        nodes.register(other, ResourceKind::Rock, Tile::Stone);

        let mut profile = PlayerProfile::new(3.0, 4.0);
        let mut rng = TileRng::new(seed);
        for attempt in 0..attempts {
            let before = profile.clone();
            let was_depleted = nodes.get(target).unwrap().is_depleted();
            match nodes.gather(target, &mut profile, &mut rng, attempt as f64) {
                Ok(gathered) => {
                    prop_assert!(!was_depleted);
                    prop_assert_eq!(gathered.item.id.as_str(), ids::TIMBER);
                    prop_assert_eq!(
                        profile.inventory.count_item(ids::TIMBER),
                        before.inventory.count_item(ids::TIMBER) + 1
                    );
                }
                Err(_) => prop_assert_eq!(&profile, &before),
            }
            prop_assert!(!nodes.get(other).unwrap().is_depleted());
        }
    }
}
