//! The simulation loop.
//!
//! [`Simulation`] owns the world, the resource registry, every entity and the
//! player profile, and advances them in a fixed order each tick:
//!
//! 1. clock and node respawns
//! 2. player intent (directional move, else auto-move target, else closing
//!    on the combat target), the player's swing, and action triggers
//! 3. creature AI, including dragging the player into combat
//! 4. player death, respawn countdown and corpse cleanup
//! 5. profile sync, mana regeneration, chunk generation around the player,
//!    and quest completion
//!
//! Gameplay messages are queued as [`SimEvent`]s and drained by the caller.

use std::collections::BTreeMap;

use serde::Serialize;
use tileworld_core::{SimTick, TileRng};
use tracing::{debug, info, warn};

use crate::movement::{step_toward, walk, Step};
use crate::{
    quest_by_id, roll_creature_damage, roll_player_damage, Avatar, Body, CombatState, Corpse,
    CraftError, Crafted, Creature, CreatureAction, CreatureTemplate, DamageOutcome, DayClock,
    Entity, EntityId, EntityKind, EntitySnapshot, Facing, GatherError, Gathered, Intent,
    ItemStack, MoveTarget, Npc, ObjectiveKind, ObjectiveProgress, PlayerProfile,
    QuestCompletion, RecipeRegistry, ResourceRegistry, SimConfig, TargetView, TerrainGenerator,
    Tile, TilePos, World, CHUNK_SIZE, FIRST_STEPS, HOME_EPSILON, LEASH_RANGE,
    MANA_REGEN_PER_TICK, STRIKE_RANGE, TALK_RANGE,
};

/// Tiles scanned around the player by "harvest nearest".
pub const HARVEST_RADIUS: i32 = 2;
/// Where the tutorial guide stands.
pub const GUIDE_SPAWN: (f64, f64) = (10.0, 10.0);
/// Goblin camp around the cave entrance.
pub const GOBLIN_SPAWNS: [(f64, f64); 3] = [(16.0, 17.0), (17.0, 19.0), (19.0, 17.0)];

const GUIDE_NAME: &str = "Guide";
const GUIDE_LINES: [&str; 6] = [
    "Welcome to Cypherpunk Sandbox, adventurer!",
    "I'm here to teach you the basics of survival in this world.",
    "You can gather resources by clicking on tiles around you.",
    "Look for dark green trees for Timber, grey stones for Stone, and blue water for Fish!",
    "As you gather, you'll gain experience in your skills. Check your skills by pressing P!",
    "Good luck on your journey! Talk to me anytime for tips.",
];

/// Something the player should hear about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Gathered(Gathered),
    GatherFailed {
        pos: TilePos,
        error: GatherError,
    },
    NodeRespawned {
        pos: TilePos,
    },
    Engaged {
        target: EntityId,
    },
    PlayerHit {
        target: EntityId,
        damage: u32,
    },
    PlayerStruck {
        by: EntityId,
        damage: u32,
    },
    CreatureKilled {
        id: EntityId,
        name: String,
        xp: u64,
        gold: u64,
        loot: Vec<ItemStack>,
        /// Loot that did not fit in the inventory.
        lost: Vec<ItemStack>,
    },
    CreatureRespawned {
        id: EntityId,
    },
    /// Character level reached after a grant of profile XP.
    LevelUp {
        level: u32,
        levels: u32,
    },
    /// Auto-move gave up because terrain blocks the path.
    MoveBlocked {
        target: MoveTarget,
    },
    PlayerDied {
        x: f64,
        y: f64,
        corpse: Option<EntityId>,
    },
    PlayerRespawned {
        x: f64,
        y: f64,
    },
    CorpseLooted {
        items: u32,
        remaining: usize,
    },
    Dialogue {
        npc: String,
        line: String,
    },
    Farewell {
        npc: String,
    },
    QuestStarted {
        quest: String,
    },
    QuestProgress(ObjectiveProgress),
    QuestCompleted(QuestCompletion),
    Crafted(Crafted),
    CraftFailed {
        recipe: String,
        error: CraftError,
    },
}

impl SimEvent {
    /// Stable label used when events are written to a log.
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::Gathered(_) => "gathered",
            SimEvent::GatherFailed { .. } => "gather_failed",
            SimEvent::NodeRespawned { .. } => "node_respawned",
            SimEvent::Engaged { .. } => "engaged",
            SimEvent::PlayerHit { .. } => "player_hit",
            SimEvent::PlayerStruck { .. } => "player_struck",
            SimEvent::CreatureKilled { .. } => "creature_killed",
            SimEvent::CreatureRespawned { .. } => "creature_respawned",
            SimEvent::LevelUp { .. } => "level_up",
            SimEvent::MoveBlocked { .. } => "move_blocked",
            SimEvent::PlayerDied { .. } => "player_died",
            SimEvent::PlayerRespawned { .. } => "player_respawned",
            SimEvent::CorpseLooted { .. } => "corpse_looted",
            SimEvent::Dialogue { .. } => "dialogue",
            SimEvent::Farewell { .. } => "farewell",
            SimEvent::QuestStarted { .. } => "quest_started",
            SimEvent::QuestProgress(_) => "quest_progress",
            SimEvent::QuestCompleted(_) => "quest_completed",
            SimEvent::Crafted(_) => "crafted",
            SimEvent::CraftFailed { .. } => "craft_failed",
        }
    }
}

pub struct Simulation {
    config: SimConfig,
    world: World,
    terrain: TerrainGenerator,
    nodes: ResourceRegistry,
    recipes: RecipeRegistry,
    clock: DayClock,
    rng: TileRng,
    profile: PlayerProfile,
    entities: BTreeMap<EntityId, Entity>,
    player_id: EntityId,
    next_id: u64,
    move_target: Option<MoveTarget>,
    /// Seconds left until the player respawns; `Some` while dead.
    respawn_timer: Option<f64>,
    now: f64,
    tick: SimTick,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// New world with a fresh profile at the configured spawn point.
    pub fn new(config: SimConfig) -> Self {
        let (x, y) = config.spawn;
        Self::with_profile(config, PlayerProfile::new(x, y))
    }

    /// New world around an existing (e.g. loaded) profile.
    pub fn with_profile(config: SimConfig, profile: PlayerProfile) -> Self {
        let window = (2 * config.generation_radius.max(0) as usize + 1).pow(2);
        let capacity = if config.chunk_capacity > 0 && config.chunk_capacity <= window {
            warn!(
                configured = config.chunk_capacity,
                window, "chunk capacity smaller than the generation window; raising it"
            );
            window + 1
        } else {
            config.chunk_capacity
        };

        let terrain = TerrainGenerator::new(config.seed).with_thresholds(config.terrain.clone());
        let mut sim = Self {
            world: World::with_capacity(capacity),
            terrain,
            nodes: ResourceRegistry::new(),
            recipes: RecipeRegistry::with_defaults(),
            clock: DayClock::new(config.day_length_secs),
            rng: TileRng::new(config.seed as u32),
            player_id: EntityId(0),
            next_id: 0,
            entities: BTreeMap::new(),
            move_target: None,
            respawn_timer: None,
            now: 0.0,
            tick: SimTick::ZERO,
            events: Vec::new(),
            profile,
            config,
        };

        let body = Body::new(sim.profile.x, sim.profile.y);
        let avatar = Avatar::new(sim.profile.health, sim.profile.max_health);
        sim.player_id = sim.spawn(body, EntityKind::Player(avatar));
        sim.populate();
        sim.generate_around_player();
        if !sim.profile.is_alive() {
            sim.respawn_timer = Some(sim.config.player_respawn_secs);
        }
        sim
    }

    /// The tutorial guide and the goblin camp.
    fn populate(&mut self) {
        let guide = Npc::new(
            GUIDE_NAME,
            GUIDE_LINES.iter().map(|line| line.to_string()).collect(),
        )
        .with_quest(FIRST_STEPS);
        let guide_done = self.profile.quests.completed().any(|q| q.id == FIRST_STEPS);
        let guide_id = self.spawn_npc(guide, GUIDE_SPAWN.0, GUIDE_SPAWN.1);
        if guide_done {
            if let Some(EntityKind::Npc(npc)) =
                self.entities.get_mut(&guide_id).map(|e| &mut e.kind)
            {
                npc.quest_completed = true;
            }
        }

        let goblin = CreatureTemplate::goblin();
        for (x, y) in GOBLIN_SPAWNS {
            self.spawn_creature(&goblin, x, y);
        }
    }

    fn spawn(&mut self, body: Body, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, body, kind));
        id
    }

    pub fn spawn_creature(&mut self, template: &CreatureTemplate, x: f64, y: f64) -> EntityId {
        let creature = Creature::from_template(template, x, y);
        self.spawn(Body::new(x, y), EntityKind::Creature(creature))
    }

    pub fn spawn_npc(&mut self, npc: Npc, x: f64, y: f64) -> EntityId {
        self.spawn(Body::new(x, y), EntityKind::Npc(npc))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tick_count(&self) -> SimTick {
        self.tick
    }

    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Tile lookup. Materializes the chunk (as open ground) if it was never
    /// generated.
    pub fn tile(&mut self, x: i32, y: i32) -> Tile {
        self.world.tile(x, y)
    }

    pub fn nodes(&self) -> &ResourceRegistry {
        &self.nodes
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    /// Profile mutators (heal, equip, add gold...) go through here. Health
    /// changes are picked up by the avatar at the start of the next tick.
    pub fn profile_mut(&mut self) -> &mut PlayerProfile {
        &mut self.profile
    }

    pub fn player_id(&self) -> EntityId {
        self.player_id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn player_body(&self) -> Option<Body> {
        self.entities.get(&self.player_id).map(|e| e.body)
    }

    fn avatar(&self) -> Option<&Avatar> {
        match self.entities.get(&self.player_id).map(|e| &e.kind) {
            Some(EntityKind::Player(avatar)) => Some(avatar),
            _ => None,
        }
    }

    fn avatar_mut(&mut self) -> Option<&mut Avatar> {
        self.entities
            .get_mut(&self.player_id)
            .and_then(Entity::as_avatar_mut)
    }

    pub fn player_combat(&self) -> Option<&CombatState> {
        self.avatar().map(|avatar| &avatar.combat)
    }

    pub fn move_target(&self) -> Option<MoveTarget> {
        self.move_target
    }

    pub fn is_player_dead(&self) -> bool {
        self.respawn_timer.is_some()
    }

    /// Read-only view of every entity, in id order.
    pub fn entity_snapshots(&self) -> Vec<EntitySnapshot> {
        self.entities.values().map(Entity::snapshot).collect()
    }

    /// Take the queued events.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Generate every chunk inside the window around the player.
    pub fn generate_around_player(&mut self) -> usize {
        let Some(body) = self.player_body() else {
            return 0;
        };
        self.terrain.generate_around(
            &mut self.world,
            &mut self.nodes,
            TilePos::containing(body.x, body.y),
            self.config.generation_radius,
        )
    }

    /// Craft a recipe from the book.
    pub fn craft(&mut self, recipe_id: &str) -> Result<Crafted, CraftError> {
        let result = self.recipes.craft(&mut self.profile, recipe_id);
        match &result {
            Ok(crafted) => {
                let kind = if self.recipes.get(recipe_id).is_some_and(|r| r.is_cooking()) {
                    ObjectiveKind::Cook
                } else {
                    ObjectiveKind::Craft
                };
                self.events.push(SimEvent::Crafted(crafted.clone()));
                self.record_quest(kind, &crafted.item.id, crafted.item.quantity);
                self.complete_ready_quests();
            }
            Err(error) => self.events.push(SimEvent::CraftFailed {
                recipe: recipe_id.to_string(),
                error: error.clone(),
            }),
        }
        result
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64, intent: &Intent) {
        let dt = dt.max(0.0);
        self.tick = self.tick.advance(1);
        self.now += dt;
        self.clock.advance(dt);

        self.sync_avatar_from_profile();
        for pos in self.nodes.update(self.now) {
            debug!(pos = %pos, "node respawned");
            self.events.push(SimEvent::NodeRespawned { pos });
        }

        if self.respawn_timer.is_none() {
            self.apply_intent(intent, dt);
        }
        self.update_creatures(dt);
        self.check_player_death();
        self.update_respawn(dt);
        self.cleanup_corpses();

        self.sync_profile_from_avatar();
        self.profile.restore_mana(MANA_REGEN_PER_TICK);
        self.generate_around_player();
        self.complete_ready_quests();

        debug!(
            tick = self.tick.0,
            x = self.profile.x,
            y = self.profile.y,
            health = self.profile.health,
            hour = self.clock.hour(),
            "tick"
        );
    }

    fn sync_avatar_from_profile(&mut self) {
        let (health, max_health) = (self.profile.health, self.profile.max_health);
        if let Some(avatar) = self.avatar_mut() {
            avatar.health = health;
            avatar.max_health = max_health;
        }
    }

    fn sync_profile_from_avatar(&mut self) {
        let Some(player) = self.entities.get(&self.player_id) else {
            return;
        };
        let (x, y) = (player.body.x, player.body.y);
        if let EntityKind::Player(avatar) = &player.kind {
            self.profile.health = avatar.health;
        }
        self.profile.move_to(x, y);
    }

    fn apply_intent(&mut self, intent: &Intent, dt: f64) {
        if let Some(target) = intent.target {
            self.move_target = Some(target);
        }

        if intent.has_direction() {
            self.move_target = None;
            self.walk_player(intent.dx, intent.dy, dt);
        } else if let Some(target) = self.move_target {
            self.progress_target(target, dt);
        } else {
            self.close_on_combat_target(dt);
        }

        self.player_swing();

        if intent.harvest_nearest {
            self.harvest_nearest();
        }
        if intent.interact {
            self.interact();
        }
    }

    fn walk_player(&mut self, dx: f64, dy: f64, dt: f64) {
        let Some(player) = self.entities.get_mut(&self.player_id) else {
            return;
        };
        if let (Some(facing), EntityKind::Player(avatar)) =
            (Facing::from_delta(dx, dy), &mut player.kind)
        {
            avatar.facing = facing;
        }
        walk(&mut self.world, &mut player.body, dx, dy, dt);
    }

    /// Step the player toward `(tx, ty)`, turning to face the direction of travel.
    fn step_player_toward(&mut self, tx: f64, ty: f64, stop_distance: f64, dt: f64) -> Step {
        let Some(player) = self.entities.get_mut(&self.player_id) else {
            return Step::Blocked;
        };
        let (dx, dy) = (tx - player.body.x, ty - player.body.y);
        let step = step_toward(&mut self.world, &mut player.body, tx, ty, stop_distance, dt);
        if step == Step::Moved {
            if let (Some(facing), EntityKind::Player(avatar)) =
                (Facing::from_delta(dx, dy), &mut player.kind)
            {
                avatar.facing = facing;
            }
        }
        step
    }

    fn progress_target(&mut self, target: MoveTarget, dt: f64) {
        let (tx, ty) = match target {
            MoveTarget::Ground { x, y } => (x, y),
            MoveTarget::Resource(pos) => (f64::from(pos.x), f64::from(pos.y)),
            MoveTarget::Creature(id) => match self.entities.get(&id) {
                Some(entity) if entity.is_alive_combatant() && entity.as_creature().is_some() => {
                    (entity.body.x, entity.body.y)
                }
                _ => {
                    self.move_target = None;
                    return;
                }
            },
        };

        match self.step_player_toward(tx, ty, target.arrival_distance(), dt) {
            Step::Moved => {}
            Step::Blocked => {
                debug!(?target, "auto-move blocked");
                self.move_target = None;
                self.events.push(SimEvent::MoveBlocked { target });
            }
            Step::Arrived => {
                self.move_target = None;
                match target {
                    MoveTarget::Ground { .. } => {}
                    MoveTarget::Resource(pos) => self.gather_at(pos),
                    MoveTarget::Creature(id) => self.engage(id),
                }
            }
        }
    }

    /// Put the player and the creature into combat with each other.
    fn engage(&mut self, creature_id: EntityId) {
        let player_id = self.player_id;
        if let Some(creature) = self
            .entities
            .get_mut(&creature_id)
            .and_then(Entity::as_creature_mut)
        {
            creature.combat.engage(player_id);
        }
        if let Some(avatar) = self.avatar_mut() {
            if !avatar.combat.is_targeting(creature_id) {
                avatar.combat.engage(creature_id);
                self.events.push(SimEvent::Engaged {
                    target: creature_id,
                });
            }
        }
    }

    /// Live creature the player is fighting, with its position.
    fn combat_target(&self) -> Option<(EntityId, Body)> {
        let target = self.player_combat()?.target()?;
        self.entities
            .get(&target)
            .filter(|entity| entity.is_alive_combatant())
            .map(|entity| (target, entity.body))
    }

    fn close_on_combat_target(&mut self, dt: f64) {
        if let Some((_, body)) = self.combat_target() {
            self.step_player_toward(body.x, body.y, STRIKE_RANGE, dt);
        }
    }

    fn player_swing(&mut self) {
        let Some(avatar) = self.avatar() else {
            return;
        };
        if !avatar.combat.is_engaged() {
            return;
        }
        let ready = avatar.combat.ready(self.now);
        let Some(player_body) = self.player_body() else {
            return;
        };
        let Some((target, body)) = self.combat_target() else {
            if let Some(avatar) = self.avatar_mut() {
                avatar.combat.disengage();
            }
            return;
        };

        let distance = player_body.distance_to_body(&body);
        if distance > LEASH_RANGE {
            if let Some(avatar) = self.avatar_mut() {
                avatar.combat.disengage();
            }
            return;
        }
        if distance > STRIKE_RANGE || !ready {
            return;
        }

        let now = self.now;
        if let Some(avatar) = self.avatar_mut() {
            avatar.combat.record_attack(now);
        }
        let damage = roll_player_damage(&mut self.rng, self.profile.weapon_bonus());
        let outcome = self
            .entities
            .get_mut(&target)
            .map_or(DamageOutcome::Ignored, |entity| entity.apply_damage(damage as f32, now));
        if outcome == DamageOutcome::Ignored {
            return;
        }
        self.events.push(SimEvent::PlayerHit { target, damage });
        if outcome == DamageOutcome::Killed {
            self.on_creature_killed(target);
        }
    }

    fn on_creature_killed(&mut self, id: EntityId) {
        if let Some(avatar) = self.avatar_mut() {
            avatar.combat.disengage();
        }
        let Some(creature) = self.entities.get(&id).and_then(Entity::as_creature) else {
            return;
        };
        let name = creature.name.clone();
        let (xp, gold) = (creature.xp_reward, creature.gold_reward);
        let loot = creature.loot.roll(&mut self.rng);

        self.profile.skills.combat.add_xp(xp);
        let levels = self.profile.gain_experience(xp);
        self.profile.add_gold(gold);
        let lost: Vec<ItemStack> = loot
            .iter()
            .cloned()
            .filter_map(|stack| self.profile.add_item(stack).err())
            .collect();
        info!(creature = %name, id = id.0, xp, gold, drops = loot.len(), "creature killed");
        self.events.push(SimEvent::CreatureKilled {
            id,
            name: name.clone(),
            xp,
            gold,
            loot,
            lost,
        });
        if levels > 0 {
            self.sync_avatar_from_profile();
            self.events.push(SimEvent::LevelUp {
                level: self.profile.level,
                levels,
            });
        }
        self.record_quest(ObjectiveKind::Kill, &name, 1);
    }

    fn gather_at(&mut self, pos: TilePos) {
        match self.nodes.gather(pos, &mut self.profile, &mut self.rng, self.now) {
            Ok(gathered) => {
                let (item, qty) = (gathered.item.id.clone(), gathered.item.quantity);
                self.events.push(SimEvent::Gathered(gathered));
                self.record_quest(ObjectiveKind::Gather, &item, qty);
            }
            Err(error) => self.events.push(SimEvent::GatherFailed { pos, error }),
        }
    }

    fn harvest_nearest(&mut self) {
        let Some(body) = self.player_body() else {
            return;
        };
        let center = TilePos::containing(body.x, body.y);
        match self.nodes.nearest_around(center, HARVEST_RADIUS).map(|node| node.pos) {
            Some(pos) => self.gather_at(pos),
            None => self.events.push(SimEvent::GatherFailed {
                pos: center,
                error: GatherError::NoNode(center),
            }),
        }
    }

    /// Entity of a given kind within talking range, lowest id first.
    fn nearby(&self, player: Body, pick: impl Fn(&EntityKind) -> bool) -> Option<EntityId> {
        self.entities
            .values()
            .filter(|entity| pick(&entity.kind))
            .find(|entity| {
                (entity.body.x - player.x).abs() < TALK_RANGE
                    && (entity.body.y - player.y).abs() < TALK_RANGE
            })
            .map(|entity| entity.id)
    }

    fn interact(&mut self) {
        let Some(player) = self.player_body() else {
            return;
        };

        let corpse = self.nearby(player, |kind| {
            matches!(kind, EntityKind::Corpse(c) if !c.is_empty())
        });
        if let Some(id) = corpse {
            if let Some(EntityKind::Corpse(corpse)) =
                self.entities.get_mut(&id).map(|e| &mut e.kind)
            {
                let moved = corpse.loot_into(&mut self.profile.inventory);
                let items = moved.iter().map(|stack| stack.quantity).sum();
                let remaining = corpse.items.len();
                self.events.push(SimEvent::CorpseLooted { items, remaining });
            }
            return;
        }

        let npc = self.nearby(player, |kind| matches!(kind, EntityKind::Npc(_)));
        let Some(id) = npc else {
            return;
        };
        let Some(EntityKind::Npc(npc)) = self.entities.get_mut(&id).map(|e| &mut e.kind) else {
            return;
        };
        let spoken = npc.talk();
        let name = npc.name.clone();
        let offered = npc
            .quest_id
            .clone()
            .filter(|_| npc.has_quest && !npc.quest_completed);

        self.events.push(SimEvent::Dialogue {
            npc: name.clone(),
            line: spoken.line,
        });
        if spoken.finished {
            self.events.push(SimEvent::Farewell { npc: name.clone() });
        }
        if let Some(quest) = offered {
            self.offer_quest(&quest);
        }
        self.record_quest(ObjectiveKind::Talk, &name, 1);
    }

    fn offer_quest(&mut self, id: &str) {
        if self.profile.quests.get(id).is_none() {
            match quest_by_id(id) {
                Some(quest) => self.profile.quests.register(quest),
                None => {
                    warn!(quest = id, "npc offers an unknown quest");
                    return;
                }
            }
        }
        if self.profile.quests.start(id).is_ok() {
            info!(quest = id, "quest started");
            self.events.push(SimEvent::QuestStarted {
                quest: id.to_string(),
            });
        }
    }

    fn record_quest(&mut self, kind: ObjectiveKind, target: &str, amount: u32) {
        for progress in self.profile.quests.record(kind, target, amount) {
            self.events.push(SimEvent::QuestProgress(progress));
        }
    }

    fn complete_ready_quests(&mut self) {
        for id in self.profile.quests.ready_to_complete() {
            match self.profile.complete_quest(&id) {
                Ok(completion) => {
                    for entity in self.entities.values_mut() {
                        if let EntityKind::Npc(npc) = &mut entity.kind {
                            if npc.quest_id.as_deref() == Some(id.as_str()) {
                                npc.quest_completed = true;
                            }
                        }
                    }
                    self.events.push(SimEvent::QuestCompleted(completion));
                }
                Err(err) => warn!(quest = %id, error = %err, "quest could not be completed"),
            }
        }
    }

    fn update_creatures(&mut self, dt: f64) {
        let player_id = self.player_id;
        let player_view = if self.respawn_timer.is_none() {
            self.entities
                .get(&player_id)
                .filter(|entity| entity.is_alive_combatant())
                .map(|entity| TargetView {
                    id: player_id,
                    x: entity.body.x,
                    y: entity.body.y,
                })
        } else {
            None
        };

        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.as_creature().is_some())
            .map(|entity| entity.id)
            .collect();

        let mut strikes = Vec::new();
        let mut aggressors = Vec::new();
        for id in ids {
            let Some(Entity { body, kind, .. }) = self.entities.get_mut(&id) else {
                continue;
            };
            let EntityKind::Creature(creature) = kind else {
                continue;
            };

            let action = creature.think(body, player_view, self.now);
            match action {
                CreatureAction::Idle => {}
                CreatureAction::Chase { x, y } => {
                    step_toward(&mut self.world, body, x, y, STRIKE_RANGE, dt);
                }
                CreatureAction::ReturnHome { x, y } => {
                    if step_toward(&mut self.world, body, x, y, HOME_EPSILON, dt) == Step::Blocked {
                        creature.reset_to_spawn(body);
                    }
                }
                CreatureAction::Strike { target } => {
                    strikes.push((id, target, creature.combat.attack));
                }
                CreatureAction::Respawn => {
                    creature.respawn(body);
                    info!(creature = %creature.name, id = id.0, "creature respawned");
                    self.events.push(SimEvent::CreatureRespawned { id });
                }
            }
            if creature.combat.is_targeting(player_id) {
                aggressors.push(id);
            }
        }

        if let Some(&first) = aggressors.first() {
            let already = self.player_combat().is_some_and(CombatState::is_engaged);
            if !already {
                self.engage(first);
            }
        }

        for (attacker, target, attack) in strikes {
            if target != player_id || self.respawn_timer.is_some() {
                continue;
            }
            let Some(player) = self.entities.get_mut(&player_id) else {
                continue;
            };
            let defense = player.combat().map_or(0, |combat| combat.defense);
            let damage = roll_creature_damage(&mut self.rng, attack, defense);
            match player.apply_damage(damage as f32, self.now) {
                DamageOutcome::Ignored => {}
                DamageOutcome::Hit => {
                    self.events.push(SimEvent::PlayerStruck { by: attacker, damage })
                }
                DamageOutcome::Killed => {
                    self.events.push(SimEvent::PlayerStruck { by: attacker, damage });
                    break;
                }
            }
        }
    }

    fn check_player_death(&mut self) {
        if self.respawn_timer.is_some() {
            return;
        }
        let player_id = self.player_id;
        let Some(player) = self.entities.get_mut(&player_id) else {
            return;
        };
        let EntityKind::Player(avatar) = &mut player.kind else {
            return;
        };
        if !avatar.is_dead() {
            return;
        }
        avatar.health = 0.0;
        avatar.combat.disengage();
        let (x, y) = (player.body.x, player.body.y);

        for entity in self.entities.values_mut() {
            if let EntityKind::Creature(creature) = &mut entity.kind {
                if creature.combat.is_targeting(player_id) {
                    creature.combat.disengage();
                }
            }
        }

        self.move_target = None;
        self.respawn_timer = Some(self.config.player_respawn_secs);
        let items = self.profile.inventory.take_all();
        let corpse = if items.is_empty() {
            None
        } else {
            let corpse = Corpse::new(items, self.now);
            Some(self.spawn(Body::new(x, y), EntityKind::Corpse(corpse)))
        };
        info!(x, y, corpse = corpse.map(|id| id.0), "player died");
        self.events.push(SimEvent::PlayerDied { x, y, corpse });
    }

    fn update_respawn(&mut self, dt: f64) {
        let Some(remaining) = self.respawn_timer else {
            return;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.respawn_timer = Some(remaining);
            return;
        }
        self.respawn_timer = None;

        let (x, y) = self.config.spawn;
        if let Some(player) = self.entities.get_mut(&self.player_id) {
            player.body.x = x;
            player.body.y = y;
            if let EntityKind::Player(avatar) = &mut player.kind {
                avatar.health = avatar.max_health;
                avatar.combat.disengage();
            }
        }
        self.profile.health = self.profile.max_health;
        self.profile.move_to(x, y);

        for entity in self.entities.values_mut() {
            let Entity { body, kind, .. } = entity;
            if let EntityKind::Creature(creature) = kind {
                creature.reset_to_spawn(body);
            }
        }
        info!(x, y, "player respawned");
        self.events.push(SimEvent::PlayerRespawned { x, y });
    }

    fn cleanup_corpses(&mut self) {
        let now = self.now;
        self.entities.retain(|id, entity| match &entity.kind {
            EntityKind::Corpse(corpse) if corpse.is_empty() || corpse.is_expired(now) => {
                debug!(id = id.0, expired = corpse.is_expired(now), "corpse removed");
                false
            }
            _ => true,
        });
    }

    /// Number of chunks resident in the store.
    pub fn resident_chunks(&self) -> usize {
        self.world.len()
    }

    /// Tiles per chunk edge, for callers sizing their view.
    pub fn chunk_size(&self) -> usize {
        CHUNK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_core::item::ids;

    fn sim() -> Simulation {
        Simulation::new(SimConfig::default())
    }

    fn step(sim: &mut Simulation, intent: &Intent) {
        sim.tick(0.05, intent);
    }

    #[test]
    fn new_world_has_default_population() {
        let sim = sim();
        let snaps = sim.entity_snapshots();
        assert_eq!(snaps.len(), 5);
        assert_eq!(snaps[0].kind, "player");
        assert_eq!((snaps[0].x, snaps[0].y), (5.0, 5.0));
        assert_eq!(snaps.iter().filter(|s| s.kind == "creature").count(), 3);
        assert_eq!(snaps.iter().filter(|s| s.kind == "npc").count(), 1);
        assert_eq!(sim.resident_chunks(), 25);
    }

    #[test]
    fn directional_move_cancels_target() {
        let mut sim = sim();
        step(&mut sim, &Intent::go_to(MoveTarget::Ground { x: 5.0, y: 9.0 }));
        assert!(sim.move_target().is_some());
        step(&mut sim, &Intent::walk(1.0, 0.0));
        assert!(sim.move_target().is_none());
        let body = sim.player_body().unwrap();
        assert!(body.x > 5.0);
        assert_eq!(sim.entity_snapshots()[0].facing, Facing::Right);
    }

    #[test]
    fn ground_target_is_reached() {
        let mut sim = sim();
        sim.tick(0.05, &Intent::go_to(MoveTarget::Ground { x: 6.0, y: 5.0 }));
        for _ in 0..40 {
            step(&mut sim, &Intent::idle());
        }
        let body = sim.player_body().unwrap();
        assert!((body.x - 5.9).abs() < 1e-6);
        assert!(sim.move_target().is_none());
        assert_eq!(sim.profile().x, body.x);
    }

    #[test]
    fn water_blocks_directional_movement() {
        let mut sim = sim();
        // Lake spans x 12..=18 at y 8..=15, the bridge is at x = 15.
        sim.entities.get_mut(&sim.player_id).unwrap().body = Body::new(11.9, 10.5);
        step(&mut sim, &Intent::walk(1.0, 0.0));
        assert_eq!(sim.player_body().unwrap().x, 11.9);
    }

    #[test]
    fn unreachable_fishing_spot_reports_blocked_move() {
        let mut sim = sim();
        sim.entities.get_mut(&sim.player_id).unwrap().body = Body::new(11.9, 10.5);
        let target = MoveTarget::Resource(TilePos::new(17, 10));
        step(&mut sim, &Intent::go_to(target));

        let events = sim.drain_events();
        assert!(
            events.contains(&SimEvent::MoveBlocked { target }),
            "events: {events:?}"
        );
        assert_eq!(sim.move_target(), None);
        assert_eq!(sim.player_body().unwrap().x, 11.9);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::Gathered(_))));
        assert_eq!(SimEvent::MoveBlocked { target }.kind(), "move_blocked");
    }

    #[test]
    fn talking_to_guide_starts_first_steps() {
        let mut sim = sim();
        sim.entities.get_mut(&sim.player_id).unwrap().body = Body::new(10.0, 11.0);
        step(&mut sim, &Intent::interact());
        let events = sim.drain_events();
        assert!(events.iter().any(
            |e| matches!(e, SimEvent::Dialogue { line, .. } if line.starts_with("Welcome"))
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::QuestStarted { quest } if quest == FIRST_STEPS)));
        let quest = sim.profile().quests.get(FIRST_STEPS).unwrap();
        assert!(quest.objectives[0].completed);
    }

    #[test]
    fn crafting_records_quest_progress() {
        let mut sim = sim();
        sim.profile_mut().add_item(ItemStack::of(ids::TIMBER, 2)).unwrap();
        let crafted = sim.craft(ids::WOODEN_SWORD).unwrap();
        assert_eq!(crafted.item.id, ids::WOODEN_SWORD);
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::Crafted(_))));
        assert!(matches!(
            sim.craft(ids::BOW),
            Err(CraftError::MissingInput { .. })
        ));
    }

    #[test]
    fn mana_regenerates_each_tick() {
        let mut sim = sim();
        sim.profile_mut().use_mana(10.0);
        let before = sim.profile().mana;
        for _ in 0..20 {
            step(&mut sim, &Intent::idle());
        }
        assert!((sim.profile().mana - before - 1.0).abs() < 1e-3);
    }

    #[test]
    fn goblin_aggro_engages_player() {
        let mut sim = sim();
        sim.entities.get_mut(&sim.player_id).unwrap().body = Body::new(14.0, 18.0);
        step(&mut sim, &Intent::idle());
        let combat = sim.player_combat().unwrap();
        assert!(combat.is_engaged());
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::Engaged { .. })));
    }

    #[test]
    fn profile_heal_reaches_avatar() {
        let mut sim = sim();
        sim.profile_mut().take_damage(30.0);
        step(&mut sim, &Intent::idle());
        assert_eq!(sim.entity_snapshots()[0].health, 70.0);
        sim.profile_mut().heal(10.0);
        step(&mut sim, &Intent::idle());
        assert_eq!(sim.entity_snapshots()[0].health, 80.0);
    }
}
