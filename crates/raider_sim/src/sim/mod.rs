//! Simulation: one object owning the world and every system, advanced by
//! [`Simulation::tick`]
//!
//! A tick runs a fixed pipeline. Gameplay updates run with the frame delta,
//! the physics world advances in fixed steps with the [`ContactRouter`]
//! listening, and every creation or destruction happens outside a step.

pub mod contact_router;
pub mod strict;

pub use contact_router::ContactRouter;
pub use strict::{StrictMode, StrictValidator};

use crate::combat::{
    ActorId, CombatModifiers, CombatSystem, Damageable, Faction, MeleeRequest, ProjectileSpawn, ProjectileSystem,
    WeaponRuntime, WeaponTargets, Wielder,
};
use crate::config::{Config, SimConfig};
use crate::debug::DebugShape;
use crate::entities::{Actors, EnemyView, Player, PlayerView};
use crate::events::{FeedbackCounters, FeedbackKind};
use crate::foundation::math::{px_to_meters, to_meters, AimY, Vec2};
use crate::foundation::time::tick_down;
use crate::input::{Action, InputState};
use crate::physics::{BodyMotion, DestroyQueue, FixedTimestep, PhysicsWorld};
use crate::relics::{DropRoller, DropRules, PickupSet, RelicInventory, RelicKind};
use crate::world::spawn::player_x_px;
use crate::world::{Encounter, LevelLayout, RoomKind, RoomSpawn, RunManager, SpawnManager};
use crate::SimError;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Physics steps taken
    pub steps: u32,
    /// Delta handed to gameplay updates (zero under hitstop or a strict halt)
    pub dt: f32,
    /// Feedback events raised during the tick, already consumed
    pub feedback: FeedbackCounters,
    /// Relics picked up during the tick
    pub relics_gained: Vec<RelicKind>,
}

/// The whole simulation
pub struct Simulation {
    config: SimConfig,
    world: PhysicsWorld,
    clock: FixedTimestep,
    destroy_queue: DestroyQueue,
    actors: Actors,
    combat: CombatSystem,
    projectiles: ProjectileSystem,
    pickups: PickupSet,
    weapons: WeaponRuntime,
    relics: RelicInventory,
    modifiers: CombatModifiers,
    drops: DropRoller,
    encounter: Encounter,
    strict: StrictValidator,
    room_kind: RoomKind,
    choice_pending: bool,

    shoot_cooldown: f32,
    hitstop: f32,
    melee_hits: u32,
    kills: u64,
}

impl Simulation {
    /// Build the level, place the player and populate the first room
    pub fn new(config: SimConfig, level: &LevelLayout, room: &RoomSpawn) -> Result<Self, SimError> {
        config.validate()?;

        let mut world = PhysicsWorld::from_tuning(&config.physics);
        level.build(&mut world)?;
        let (sx, sy) = room.player_start;
        let player = Player::spawn(&mut world, px_to_meters(sx, sy), &config.player)?;

        let muzzle = (config.player.projectile_offset_x_px, config.player.projectile_offset_y_px);
        let mut sim = Self {
            clock: FixedTimestep::new(&config.physics),
            destroy_queue: DestroyQueue::new(),
            actors: Actors::new(player),
            combat: CombatSystem::new(&config.combat),
            projectiles: ProjectileSystem::new(&config.projectile),
            pickups: PickupSet::new(&config.relics),
            weapons: WeaponRuntime::new(&config.weapons, config.combat.player_hitbox, muzzle),
            relics: RelicInventory::new(),
            modifiers: CombatModifiers::default(),
            drops: DropRoller::new(DropRules::new(&config.relics), room.relic_drop_chance, room.seed),
            encounter: Encounter::new(),
            strict: StrictValidator::default(),
            room_kind: room.kind,
            choice_pending: false,
            shoot_cooldown: 0.0,
            hitstop: 0.0,
            melee_hits: 0,
            kills: 0,
            world,
            config,
        };
        sim.populate(room)?;
        log::info!(
            "Simulation ready: {} bodies, {} enemies",
            sim.world.body_count(),
            sim.actors.alive_enemy_count()
        );
        Ok(sim)
    }

    /// Tear down the current room and load `room`, moving the player to its
    /// start point
    ///
    /// Enemies, projectiles and pickups of the old room are destroyed; the
    /// shot cooldown and hitstop restart from zero. Relics and player health
    /// carry over.
    pub fn load_room(&mut self, room: &RoomSpawn) -> Result<(), SimError> {
        let bodies: Vec<_> = self
            .actors
            .melee
            .values()
            .map(|e| e.body())
            .chain(self.actors.ranged.values().map(|e| e.body()))
            .collect();
        for body in bodies {
            self.destroy_queue.queue_body(body);
        }
        self.actors.melee.clear();
        self.actors.ranged.clear();
        self.projectiles.clear(&mut self.destroy_queue);
        self.pickups.clear(&mut self.destroy_queue);
        self.destroy_queue.flush(&mut self.world, &mut self.combat);
        self.shoot_cooldown = 0.0;
        self.hitstop = 0.0;

        let (sx, sy) = room.player_start;
        let player_body = self.actors.player.body();
        self.world.set_transform(player_body, px_to_meters(sx, sy))?;
        self.world.set_linear_velocity(player_body, Vec2::zeros());

        self.drops = DropRoller::new(DropRules::new(&self.config.relics), room.relic_drop_chance, room.seed);
        self.kills = 0;
        self.room_kind = room.kind;
        self.choice_pending = false;
        self.encounter.reset();
        self.populate(room)
    }

    /// Move to the run's next room once the current one allows exit
    ///
    /// Returns whether a new room was loaded.
    pub fn advance_room(&mut self, run: &mut RunManager) -> Result<bool, SimError> {
        if !self.encounter.can_exit() || !run.advance() {
            return Ok(false);
        }
        let Some(room) = run.current() else {
            return Ok(false);
        };
        log::info!(
            "Entering room {} ({:?}, template {})",
            room.index,
            room.kind,
            room.template.id
        );
        self.load_room(&room.spawn())?;
        Ok(true)
    }

    fn populate(&mut self, room: &RoomSpawn) -> Result<(), SimError> {
        match room.kind {
            RoomKind::Combat => {
                let player_x = player_x_px(&self.world, &self.actors);
                let mut spawns = SpawnManager::new(&room.points);
                spawns.populate(
                    &mut self.world,
                    &mut self.actors,
                    room,
                    player_x,
                    &self.config.melee,
                    &self.config.ranged,
                )?;
            }
            RoomKind::Choice => self.spawn_choice_relics(room)?,
        }
        Ok(())
    }

    fn spawn_choice_relics(&mut self, room: &RoomSpawn) -> Result<(), SimError> {
        let (a, b) = DropRules::new(&self.config.relics).roll_choice_pair(room.seed);
        if room.reward_points.len() < 2 {
            log::warn!("Choice room has {} reward points, needs 2", room.reward_points.len());
        }
        for (&kind, &(x, y)) in [a, b].iter().zip(&room.reward_points) {
            self.pickups.spawn(&mut self.world, kind, px_to_meters(x, y))?;
        }
        self.choice_pending = !self.pickups.is_empty();
        log::info!("Choice room offers {a:?} or {b:?}");
        Ok(())
    }

    /// Turn collected pickups into relics; in a pending choice room the
    /// first pick removes every other offer
    fn collect_pickups(&mut self) -> Vec<RelicKind> {
        let gained = self.pickups.process(&mut self.destroy_queue);
        if !self.choice_pending {
            return gained;
        }
        let Some(&chosen) = gained.first() else {
            return gained;
        };
        self.pickups.clear(&mut self.destroy_queue);
        self.choice_pending = false;
        log::info!("Chose {chosen:?}");
        vec![chosen]
    }

    /// Advance by a wall-clock `delta` (seconds)
    pub fn tick(&mut self, input: &InputState, delta: f32) -> Result<TickReport, SimError> {
        let dt = if self.hitstop > 0.0 {
            tick_down(&mut self.hitstop, delta);
            0.0
        } else if self.strict.is_halted() {
            0.0
        } else {
            delta
        };

        tick_down(&mut self.shoot_cooldown, dt);
        self.combat.begin_frame();

        self.update_player(dt, input)?;
        self.update_enemies(dt)?;

        self.combat.update(dt, &mut self.destroy_queue);

        let mut events = FeedbackCounters::new();
        let steps = {
            let mut router = ContactRouter {
                actors: &mut self.actors,
                combat: &mut self.combat,
                projectiles: &mut self.projectiles,
                pickups: &mut self.pickups,
                events: &mut events,
                one_way_margin: to_meters(self.config.physics.one_way_margin_px),
            };
            self.clock.advance(dt, &mut self.world, &mut router)
        };

        self.projectiles.flush_impacts(&self.world, &mut self.destroy_queue);
        self.destroy_queue.flush(&mut self.world, &mut self.combat);
        self.projectiles.update(dt, &self.world, &mut self.destroy_queue);

        let relics_gained = self.collect_pickups();
        for &kind in &relics_gained {
            self.relics.add(kind);
        }
        if !relics_gained.is_empty() {
            self.modifiers = self.relics.modifiers(&self.config.relics);
        }

        events.add(FeedbackKind::ProjectileEnemy, self.projectiles.consume_impacts_enemy());
        events.add(FeedbackKind::ProjectileWorld, self.projectiles.consume_impacts_world());
        self.apply_feedback(&events);
        // An unclaimed choice holds the room like a living enemy.
        self.encounter
            .update(self.actors.alive_enemy_count() + usize::from(self.choice_pending));

        self.strict
            .validate(&self.world, &mut self.actors, &mut self.combat, &mut self.projectiles);

        Ok(TickReport {
            steps,
            dt,
            feedback: events,
            relics_gained,
        })
    }

    fn update_player(&mut self, dt: f32, input: &InputState) -> Result<(), SimError> {
        let player = &mut self.actors.player;
        player.update(dt, input, &mut self.world);
        if !player.is_alive() {
            return Ok(());
        }

        let wielder = Wielder {
            actor: ActorId::Player,
            body: player.body(),
            faction: Faction::Player,
            facing: player.facing(),
            aim: Player::aim(input),
            position: self.world.position(player.body()).unwrap_or_default(),
        };
        let tuning = player.tuning();
        let (melee, ranged) = (tuning.melee_weapon, tuning.ranged_weapon);

        if player.spawn_hitbox_this_frame() {
            self.weapons.use_primary(
                melee,
                &wielder,
                &self.modifiers,
                WeaponTargets {
                    world: &mut self.world,
                    combat: &mut self.combat,
                    projectiles: &mut self.projectiles,
                },
            )?;
        }

        if input.is_just_pressed(Action::Shoot) && self.shoot_cooldown <= 0.0 {
            self.weapons.use_primary(
                ranged,
                &wielder,
                &self.modifiers,
                WeaponTargets {
                    world: &mut self.world,
                    combat: &mut self.combat,
                    projectiles: &mut self.projectiles,
                },
            )?;
            self.shoot_cooldown = self.weapons.cooldown_for(ranged, &self.modifiers);
        }
        Ok(())
    }

    fn update_enemies(&mut self, dt: f32) -> Result<(), SimError> {
        let target = self.world.position(self.actors.player.body()).unwrap_or_default();

        let mut dead = Vec::new();
        for (key, enemy) in self.actors.melee.iter_mut() {
            enemy.update(dt, target, &mut self.world);
            if enemy.attack_started_this_frame() {
                self.combat.spawn_melee_hitbox(
                    &mut self.world,
                    MeleeRequest {
                        owner_body: enemy.body(),
                        owner: ActorId::Melee(key),
                        faction: Faction::Enemy,
                        facing: enemy.facing(),
                        aim: AimY::Neutral,
                        damage: enemy.damage(),
                        geometry: self.config.combat.enemy_hitbox,
                    },
                )?;
            }
            if !enemy.is_alive() {
                dead.push(key);
            }
        }
        for key in dead.drain(..) {
            let Some(enemy) = self.actors.melee.remove(key) else {
                continue;
            };
            let body = enemy.body();
            let corpse = self.world.position(body);
            self.destroy_queue.queue_body(body);
            log::debug!("Melee enemy {key:?} died");

            let index = self.kills;
            self.kills += 1;
            let drop = match self.room_kind {
                RoomKind::Combat => self.drops.roll(index),
                RoomKind::Choice => None,
            };
            if let (Some(kind), Some(position)) = (drop, corpse) {
                self.pickups.spawn(&mut self.world, kind, position)?;
                log::info!("Relic {kind:?} dropped");
            }
        }

        let muzzle = px_to_meters(
            self.config.player.projectile_offset_x_px,
            self.config.player.projectile_offset_y_px,
        );
        for (key, enemy) in self.actors.ranged.iter_mut() {
            enemy.update(dt, target, &mut self.world);
            if enemy.shot_this_frame() {
                if let Some(position) = self.world.position(enemy.body()) {
                    let sign = enemy.facing().sign();
                    let p = enemy.profile();
                    self.projectiles.spawn(
                        &mut self.world,
                        ProjectileSpawn {
                            position: position + Vec2::new(muzzle.x * sign, muzzle.y),
                            velocity: Vec2::new(p.projectile_speed * sign, 0.0),
                            faction: Faction::Enemy,
                            damage: p.projectile_damage,
                            lifetime: p.projectile_lifetime,
                            pierce: 0,
                        },
                    )?;
                }
            }
            if !enemy.is_alive() {
                dead.push(key);
            }
        }
        for key in dead {
            if let Some(enemy) = self.actors.ranged.remove(key) {
                self.destroy_queue.queue_body(enemy.body());
                log::debug!("Ranged enemy {key:?} died");
            }
        }
        Ok(())
    }

    fn apply_feedback(&mut self, events: &FeedbackCounters) {
        let every = self.modifiers.heal_every_hits;
        if every > 0 && self.actors.player.is_alive() {
            for _ in 0..events.enemy_hurt() {
                self.melee_hits += 1;
                if self.melee_hits % every == 0 {
                    self.actors.player.health_mut().heal(1);
                    log::debug!("Lifesteal: player at {} hp", self.actors.player.health().hp());
                }
            }
        }

        let feedback = &self.config.feedback;
        if events.enemy_hurt() > 0 {
            self.hitstop = self.hitstop.max(feedback.hitstop_melee);
        }
        if events.projectile_enemy() > 0 {
            self.hitstop = self.hitstop.max(feedback.hitstop_projectile);
        }
    }

    /// Grant a relic directly (rewards, debug hosts)
    pub fn grant_relic(&mut self, kind: RelicKind) {
        self.relics.add(kind);
        self.modifiers = self.relics.modifiers(&self.config.relics);
    }

    /// Immutable configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Physics world
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Every actor
    pub fn actors(&self) -> &Actors {
        &self.actors
    }

    /// Melee resolver
    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    /// Projectiles in flight or impacting
    pub fn projectiles(&self) -> &ProjectileSystem {
        &self.projectiles
    }

    /// Relic pickups lying in the room
    pub fn pickups(&self) -> &PickupSet {
        &self.pickups
    }

    /// Relics owned
    pub fn relics(&self) -> &RelicInventory {
        &self.relics
    }

    /// Modifiers derived from owned relics
    pub fn modifiers(&self) -> &CombatModifiers {
        &self.modifiers
    }

    /// Room progress
    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Kind of the loaded room
    pub fn room_kind(&self) -> RoomKind {
        self.room_kind
    }

    /// A choice room still waits for its pick
    pub fn choice_pending(&self) -> bool {
        self.choice_pending
    }

    /// Remaining hitstop (seconds)
    pub fn hitstop_remaining(&self) -> f32 {
        self.hitstop
    }

    /// Player snapshot
    pub fn player_view(&self) -> PlayerView {
        self.actors.player.view(&self.world)
    }

    /// Enemy snapshots
    pub fn enemy_views(&self) -> Vec<EnemyView> {
        self.actors.enemy_views(&self.world)
    }

    /// Every fixture in world space
    pub fn debug_shapes(&self) -> Vec<DebugShape> {
        self.world.debug_shapes()
    }

    /// Invariant checker
    pub fn strict(&self) -> &StrictValidator {
        &self.strict
    }

    /// Change the invariant checking mode
    pub fn set_strict_mode(&mut self, mode: StrictMode) {
        self.strict.set_mode(mode);
    }

    /// Resume after a strict halt
    pub fn unfreeze(&mut self) {
        self.strict.unfreeze();
    }
}
