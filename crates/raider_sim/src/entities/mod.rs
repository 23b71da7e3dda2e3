//! Actors: the player and the two enemy archetypes
//!
//! Enemies live in slotmaps keyed by [`EnemyKey`]; their hurtbox fixtures are
//! tagged with the matching [`ActorId`], so the contact router can resolve a
//! fixture back to its actor without any lookup tables.

pub mod melee_enemy;
pub mod player;
pub mod ranged_enemy;

pub use melee_enemy::{MeleeEnemy, MeleeState};
pub use player::{AttackPhase, Player, PlayerState, PlayerView};
pub use ranged_enemy::{RangedEnemy, RangedState};

use crate::combat::damageable::{ActorId, Damageable};
use crate::combat::system::ActorRegistry;
use crate::config::{MeleeAiProfile, RangedAiProfile};
use crate::foundation::collections::{BodyKey, EnemyKey, SlotMap};
use crate::foundation::math::{to_meters, Facing, Vec2};
use crate::physics::{BodyDef, BodyMotion, CollisionFilter, FixtureDef, FixtureTag, PhysicsError, PhysicsWorld, Shape};

/// Number of ground-like fixtures a foot sensor overlaps
///
/// Counting instead of a flag keeps the actor grounded while it straddles
/// two surfaces and only one of them ends contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundContacts(u32);

impl GroundContacts {
    /// A ground contact began
    pub fn begin(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// A ground contact ended
    pub fn end(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// Touching at least one surface
    pub fn is_grounded(self) -> bool {
        self.0 > 0
    }

    /// Raw count
    pub fn count(self) -> u32 {
        self.0
    }
}

/// Overwrite horizontal velocity, keeping vertical
pub(crate) fn set_vx(bodies: &mut dyn BodyMotion, body: BodyKey, vx: f32) {
    if let Some(v) = bodies.linear_velocity(body) {
        bodies.set_linear_velocity(body, Vec2::new(vx, v.y));
    }
}

/// Enemy state, per archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyStateView {
    /// Melee enemy state
    Melee(MeleeState),
    /// Ranged enemy state
    Ranged(RangedState),
}

/// Enemy snapshot for collaborators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyView {
    /// Discrete state
    pub state: EnemyStateView,
    /// Body center in pixels
    pub position_px: Vec2,
    /// Facing
    pub facing: Facing,
    /// Hit points
    pub hp: i32,
    /// Maximum hit points
    pub max_hp: i32,
    /// Damage flash active
    pub flashing: bool,
    /// Windup progress in [0, 1]
    pub telegraph_progress: f32,
}

/// Every actor in the room
#[derive(Debug)]
pub struct Actors {
    /// The player
    pub player: Player,
    /// Melee enemies
    pub melee: SlotMap<EnemyKey, MeleeEnemy>,
    /// Ranged enemies
    pub ranged: SlotMap<EnemyKey, RangedEnemy>,
}

impl Actors {
    /// Room with only the player
    pub fn new(player: Player) -> Self {
        Self {
            player,
            melee: SlotMap::with_key(),
            ranged: SlotMap::with_key(),
        }
    }

    /// Spawn a melee enemy standing at `position`
    pub fn spawn_melee(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vec2,
        profile: &MeleeAiProfile,
    ) -> Result<EnemyKey, PhysicsError> {
        let body = world.create_body(BodyDef::dynamic(position))?;
        let key = self.melee.insert(MeleeEnemy::new(body, profile));
        let shape = Shape::rect(to_meters(profile.half_width_px), to_meters(profile.half_height_px));
        attach_hurtbox(world, body, shape, ActorId::Melee(key)).inspect_err(|_| {
            self.melee.remove(key);
        })?;
        log::debug!("Melee enemy {key:?} spawned");
        Ok(key)
    }

    /// Spawn a ranged enemy standing at `position`
    pub fn spawn_ranged(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vec2,
        profile: &RangedAiProfile,
    ) -> Result<EnemyKey, PhysicsError> {
        let body = world.create_body(BodyDef::dynamic(position))?;
        let key = self.ranged.insert(RangedEnemy::new(body, profile));
        let shape = Shape::rect(to_meters(profile.half_width_px), to_meters(profile.half_height_px));
        attach_hurtbox(world, body, shape, ActorId::Ranged(key)).inspect_err(|_| {
            self.ranged.remove(key);
        })?;
        log::debug!("Ranged enemy {key:?} spawned");
        Ok(key)
    }

    /// Enemies currently registered and alive
    pub fn alive_enemy_count(&self) -> usize {
        self.melee.values().filter(|e| e.is_alive()).count() + self.ranged.values().filter(|e| e.is_alive()).count()
    }

    /// Ground counter for the actor owning a foot sensor
    pub(crate) fn ground_contacts_mut(&mut self, id: ActorId) -> Option<&mut GroundContacts> {
        match id {
            ActorId::Player => Some(self.player.ground_contacts_mut()),
            // Enemies carry no foot sensor.
            ActorId::Melee(_) | ActorId::Ranged(_) => None,
        }
    }

    /// Immutable access by id
    pub fn damageable(&self, id: ActorId) -> Option<&dyn Damageable> {
        match id {
            ActorId::Player => Some(&self.player),
            ActorId::Melee(key) => self.melee.get(key).map(|e| e as &dyn Damageable),
            ActorId::Ranged(key) => self.ranged.get(key).map(|e| e as &dyn Damageable),
        }
    }

    /// Snapshots of every enemy, melee first, in key order
    pub fn enemy_views(&self, bodies: &dyn BodyMotion) -> Vec<EnemyView> {
        self.melee
            .values()
            .map(|e| e.view(bodies))
            .chain(self.ranged.values().map(|e| e.view(bodies)))
            .collect()
    }
}

fn attach_hurtbox(world: &mut PhysicsWorld, body: BodyKey, shape: Shape, id: ActorId) -> Result<(), PhysicsError> {
    let def = FixtureDef::solid(shape, CollisionFilter::enemy(), FixtureTag::Actor(id));
    if let Err(e) = world.create_fixture(body, def) {
        if let Err(cleanup) = world.destroy_body(body) {
            log::warn!("Enemy body {body:?} leaked after failed spawn: {cleanup}");
        }
        return Err(e);
    }
    Ok(())
}

impl ActorRegistry for Actors {
    fn damageable_mut(&mut self, id: ActorId) -> Option<&mut dyn Damageable> {
        match id {
            ActorId::Player => Some(&mut self.player),
            ActorId::Melee(key) => self.melee.get_mut(key).map(|e| e as &mut dyn Damageable),
            ActorId::Ranged(key) => self.ranged.get_mut(key).map(|e| e as &mut dyn Damageable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerTuning;

    fn actors(world: &mut PhysicsWorld) -> Actors {
        let player = Player::spawn(world, Vec2::new(1.0, 1.0), &PlayerTuning::default()).unwrap();
        Actors::new(player)
    }

    #[test]
    fn test_ground_contacts_saturate() {
        let mut contacts = GroundContacts::default();
        contacts.end();
        assert_eq!(contacts.count(), 0);
        contacts.begin();
        contacts.begin();
        contacts.end();
        assert!(contacts.is_grounded());
        contacts.end();
        assert!(!contacts.is_grounded());
    }

    #[test]
    fn test_registry_resolves_tagged_hurtboxes() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut actors = actors(&mut world);
        let melee = actors
            .spawn_melee(&mut world, Vec2::new(2.0, 1.0), &MeleeAiProfile::default())
            .unwrap();
        let ranged = actors
            .spawn_ranged(&mut world, Vec2::new(3.0, 1.0), &RangedAiProfile::default())
            .unwrap();

        let body = actors.damageable(ActorId::Melee(melee)).unwrap().body();
        let fixture = world.body(body).unwrap().fixtures()[0];
        assert_eq!(world.fixture(fixture).unwrap().tag(), FixtureTag::Actor(ActorId::Melee(melee)));

        assert!(actors.damageable_mut(ActorId::Ranged(ranged)).is_some());
        assert_eq!(actors.alive_enemy_count(), 2);
        assert_eq!(actors.enemy_views(&world).len(), 2);
    }
}
