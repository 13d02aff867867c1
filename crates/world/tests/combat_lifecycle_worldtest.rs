//! Combat Lifecycle Worldtest
//!
//! Walks a fight from aggro to kill to creature respawn, then a player death
//! through corpse, respawn and corpse recovery.

use tileworld_core::item::ids;
use tileworld_world::{
    CreatureTemplate, EntityId, EntityKind, Intent, MoveTarget, SimConfig, SimEvent, Simulation,
    CREATURE_RESPAWN_SECS,
};

const DT: f64 = 0.05;

/// Step until `found` matches an event, returning every event seen.
fn run_until(
    sim: &mut Simulation,
    intent: &Intent,
    max_ticks: usize,
    found: impl Fn(&SimEvent) -> bool,
) -> Vec<SimEvent> {
    let mut seen = Vec::new();
    for _ in 0..max_ticks {
        sim.tick(DT, intent);
        let events = sim.drain_events();
        let done = events.iter().any(&found);
        seen.extend(events);
        if done {
            return seen;
        }
    }
    panic!("condition not reached after {max_ticks} ticks; events: {seen:?}");
}

fn goblin_next_to_player(sim: &mut Simulation) -> EntityId {
    let body = sim.player_body().unwrap();
    sim.spawn_creature(&CreatureTemplate::goblin(), body.x + 2.0, body.y)
}

#[test]
fn goblin_fight_from_aggro_to_respawn() {
    let mut sim = Simulation::new(SimConfig::default());
    let goblin = goblin_next_to_player(&mut sim);

    let events = run_until(&mut sim, &Intent::idle(), 1, |e| {
        matches!(e, SimEvent::Engaged { target } if *target == goblin)
    });
    assert!(!events.is_empty());
    assert_eq!(sim.player_combat().unwrap().target(), Some(goblin));

    let gold_before = sim.profile().gold;
    let events = run_until(&mut sim, &Intent::idle(), 1200, |e| {
        matches!(e, SimEvent::CreatureKilled { .. })
    });
    let hits = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PlayerHit { target, .. } if *target == goblin))
        .count();
    assert!(hits >= 4, "a 10 HP goblin takes at least four hits, saw {hits}");

    let Some(SimEvent::CreatureKilled { id, name, xp, gold, loot, lost }) =
        events.iter().find(|e| matches!(e, SimEvent::CreatureKilled { .. }))
    else {
        unreachable!()
    };
    assert_eq!(*id, goblin);
    assert_eq!(name, "Goblin");
    assert_eq!((*xp, *gold), (10, 2));
    assert!(lost.is_empty());
    assert!(loot.iter().all(|stack| stack.id == ids::CLOTH));

    // Kill XP trains the combat skill and feeds the character level.
    assert_eq!(sim.profile().skills.combat.experience, 10);
    assert_eq!(sim.profile().experience, 10);
    assert_eq!(sim.profile().level, 1);
    assert!(!events.iter().any(|e| matches!(e, SimEvent::LevelUp { .. })));
    assert_eq!(sim.profile().gold, gold_before + 2);
    assert!(!sim.player_combat().unwrap().is_engaged());

    let ticks = (CREATURE_RESPAWN_SECS / DT) as usize + 10;
    run_until(&mut sim, &Intent::idle(), ticks, |e| {
        matches!(e, SimEvent::CreatureRespawned { id } if *id == goblin)
    });
    let entity = sim.entity(goblin).unwrap();
    let creature = entity.as_creature().unwrap();
    assert_eq!(creature.health, creature.max_health);
    assert_eq!((entity.body.x, entity.body.y), (creature.spawn_x, creature.spawn_y));
    assert!(!creature.combat.is_engaged());
}

#[test]
fn player_death_drops_corpse_and_respawns() {
    let mut sim = Simulation::new(SimConfig::default());
    let carried = sim.profile().inventory.iter().count();
    assert!(carried > 0);
    sim.profile_mut().health = 1.0;
    goblin_next_to_player(&mut sim);

    let events = run_until(&mut sim, &Intent::idle(), 400, |e| {
        matches!(e, SimEvent::PlayerDied { .. })
    });
    let corpse = events
        .iter()
        .find_map(|e| match e {
            SimEvent::PlayerDied { corpse, .. } => *corpse,
            _ => None,
        })
        .expect("a non-empty inventory leaves a corpse");

    assert!(sim.is_player_dead());
    assert!(sim.profile().inventory.is_empty());
    assert_eq!(sim.profile().health, 0.0);
    match &sim.entity(corpse).unwrap().kind {
        EntityKind::Corpse(dropped) => assert_eq!(dropped.items.len(), carried),
        other => panic!("expected a corpse, got {other:?}"),
    }
    // Nobody keeps fighting a dead player.
    assert!(sim
        .entities()
        .filter_map(|e| e.as_creature())
        .all(|c| !c.combat.is_targeting(sim.player_id())));

    // Input is ignored while dead.
    sim.tick(DT, &Intent::walk(1.0, 0.0));
    assert!(sim.is_player_dead());

    let events = run_until(&mut sim, &Intent::idle(), 80, |e| {
        matches!(e, SimEvent::PlayerRespawned { .. })
    });
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::PlayerRespawned { x, y } if (*x, *y) == (5.0, 5.0))));
    assert!(!sim.is_player_dead());
    assert_eq!(sim.profile().health, sim.profile().max_health);

    // The corpse lies where the player fell, within reach of the spawn point.
    let events = run_until(&mut sim, &Intent::interact(), 1, |e| {
        matches!(e, SimEvent::CorpseLooted { .. })
    });
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::CorpseLooted { remaining: 0, .. })));
    assert_eq!(sim.profile().inventory.iter().count(), carried);
    assert!(sim.entity(corpse).is_none(), "emptied corpse is removed");
}

#[test]
fn clicking_a_creature_walks_over_and_fights() {
    let mut sim = Simulation::new(SimConfig::default());
    let goblin = sim.spawn_creature(&CreatureTemplate::goblin(), 5.0, 0.5);

    sim.tick(DT, &Intent::go_to(MoveTarget::Creature(goblin)));
    assert_eq!(sim.move_target(), Some(MoveTarget::Creature(goblin)));

    run_until(&mut sim, &Intent::idle(), 100, |e| {
        matches!(e, SimEvent::Engaged { target } if *target == goblin)
    });
    for _ in 0..20 {
        sim.tick(DT, &Intent::idle());
    }
    assert_eq!(sim.move_target(), None);
    assert_eq!(sim.player_combat().unwrap().target(), Some(goblin));
    let creature = sim.entity(goblin).and_then(|e| e.as_creature()).unwrap();
    assert!(creature.combat.is_targeting(sim.player_id()));
}
