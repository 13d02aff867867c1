//! Persistence Round-Trip Worldtest
//!
//! A profile played for a while must survive a save/load cycle unchanged,
//! and a simulation rebuilt from the loaded profile must pick up where the
//! old one stopped. Damaged files are rejected, never half-loaded.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use tileworld_core::item::ids;
use tileworld_world::{
    decode_save, encode_save, Intent, ProfileError, SaveStore, SimConfig, Simulation,
};

fn temp_store(tag: &str) -> SaveStore {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tileworld_{tag}_{timestamp}"));
    SaveStore::new(dir).expect("create save dir")
}

fn played_simulation() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default().with_seed(31337));
    for _ in 0..30 {
        sim.tick(0.05, &Intent::walk(1.0, 0.2));
    }
    for _ in 0..200 {
        sim.tick(0.05, &Intent::harvest());
    }
    sim.profile_mut().add_gold(40);
    sim.profile_mut().take_damage(12.5);
    sim.tick(0.05, &Intent::idle());
    sim
}

#[test]
fn played_profile_survives_save_and_load() {
    let store = temp_store("roundtrip");
    let sim = played_simulation();
    let profile = sim.profile().clone();

    let path = store.save("hero", &profile).expect("save");
    assert!(path.exists());
    assert!(store.exists("hero"));

    let loaded = store.load("hero").expect("load");
    assert_eq!(loaded, profile);

    let resumed = Simulation::with_profile(SimConfig::default().with_seed(31337), loaded);
    let body = resumed.player_body().unwrap();
    assert_eq!((body.x, body.y), (profile.x, profile.y));
    assert_eq!(resumed.profile().gold, profile.gold);
    assert_eq!(
        resumed.profile().inventory.count_item(ids::WOOD),
        profile.inventory.count_item(ids::WOOD)
    );
    assert_eq!(resumed.entity_snapshots()[0].health, profile.health);

    fs::remove_dir_all(store.dir()).ok();
}

#[test]
fn damaged_saves_are_rejected() {
    let profile = played_simulation().profile().clone();
    let bytes = encode_save(&profile).expect("encode");

    // Flip one payload byte: the CRC catches it.
    let mut flipped = bytes.clone();
    let last = flipped.len() - 2;
    flipped[last] ^= 0x20;
    assert!(matches!(decode_save(&flipped), Err(ProfileError::Corrupt(_))));

    // Truncated file.
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(decode_save(truncated), Err(ProfileError::Corrupt(_))));

    // Missing file surfaces as an IO error.
    let store = temp_store("missing");
    assert!(matches!(store.load("nobody"), Err(ProfileError::Io(_))));
    fs::remove_dir_all(store.dir()).ok();
}
