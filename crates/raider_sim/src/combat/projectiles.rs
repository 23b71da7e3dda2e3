//! Projectile system
//!
//! Contact callbacks never destroy a projectile body. They mark an impact as
//! queued; [`ProjectileSystem::flush_impacts`] runs after the step returns,
//! hands the body to the destroy queue and switches the projectile into its
//! short impact state.

use super::damageable::{ActorId, Faction};
use super::projectile::{Projectile, ProjectileSpawn, ProjectileState};
use super::system::ActorRegistry;
use crate::config::ProjectileTuning;
use crate::foundation::collections::{ProjectileKey, SlotMap};
use crate::foundation::math::{to_meters, Vec2};
use crate::physics::{
    BodyDef, BodyMotion, CollisionFilter, ContactSide, DestroyQueue, FixtureDef, FixtureTag, PhysicsError,
    PhysicsWorld, Shape,
};

/// What a projectile contact amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileHit {
    /// Struck level geometry
    World,
    /// Struck an opposing actor
    Actor {
        /// Actor struck
        target: ActorId,
        /// Allegiance of the actor struck
        target_faction: Faction,
        /// Whether hp was actually removed
        landed: bool,
    },
}

/// Owner of every projectile in flight or playing its impact
#[derive(Debug)]
pub struct ProjectileSystem {
    projectiles: SlotMap<ProjectileKey, Projectile>,
    tuning: ProjectileTuning,
    impacts_enemy: u32,
    impacts_world: u32,
}

impl ProjectileSystem {
    /// Create an empty system
    pub fn new(tuning: &ProjectileTuning) -> Self {
        Self {
            projectiles: SlotMap::with_key(),
            tuning: tuning.clone(),
            impacts_enemy: 0,
            impacts_world: 0,
        }
    }

    /// Create a moving sensor body and start tracking it
    pub fn spawn(&mut self, world: &mut PhysicsWorld, spawn: ProjectileSpawn) -> Result<ProjectileKey, PhysicsError> {
        let body = world.create_body(
            BodyDef::kinematic(spawn.position)
                .with_velocity(spawn.velocity)
                .with_gravity_scale(0.0),
        )?;
        let key = self.projectiles.insert(Projectile::new(body, &spawn));
        let def = FixtureDef::sensor(
            Shape::circle(to_meters(self.tuning.radius_px)),
            CollisionFilter::projectile(),
            FixtureTag::Projectile(key),
        );
        if let Err(e) = world.create_fixture(body, def) {
            self.projectiles.remove(key);
            if let Err(cleanup) = world.destroy_body(body) {
                log::warn!("Projectile body {body:?} leaked after failed spawn: {cleanup}");
            }
            return Err(e);
        }
        Ok(key)
    }

    /// Request an impact; ignored unless the projectile is alive and not
    /// already queued
    pub fn queue_impact(&mut self, key: ProjectileKey) {
        if let Some(p) = self.projectiles.get_mut(key) {
            if p.state == ProjectileState::Alive {
                p.impact_queued = true;
            }
        }
    }

    /// Count an impact against an actor
    pub fn notify_impact_enemy(&mut self) {
        self.impacts_enemy += 1;
    }

    /// Count an impact against level geometry
    pub fn notify_impact_world(&mut self) {
        self.impacts_world += 1;
    }

    /// Read and reset the actor impact counter
    pub fn consume_impacts_enemy(&mut self) -> u32 {
        std::mem::take(&mut self.impacts_enemy)
    }

    /// Read and reset the world impact counter
    pub fn consume_impacts_world(&mut self) -> u32 {
        std::mem::take(&mut self.impacts_world)
    }

    /// Resolve a projectile touching another fixture (inside a step)
    ///
    /// World hits queue an impact. Actor hits of the opposing faction apply
    /// damage right away; a projectile with pierces left keeps flying under a
    /// fresh hit-lock instead of queuing its impact.
    pub fn handle_contact(
        &mut self,
        key: ProjectileKey,
        other: ContactSide,
        actors: &mut dyn ActorRegistry,
        bodies: &mut dyn BodyMotion,
    ) -> Option<ProjectileHit> {
        let hit_lock = self.tuning.hit_lock_time;
        let p = self.projectiles.get_mut(key)?;
        if !p.accepts_contact() {
            return None;
        }

        if other.tag.is_ground_like() {
            p.hit_lock = hit_lock;
            p.impact_queued = true;
            self.impacts_world += 1;
            return Some(ProjectileHit::World);
        }

        let FixtureTag::Actor(target_id) = other.tag else {
            return None;
        };
        let target = actors.damageable_mut(target_id)?;
        if target.faction() == p.faction {
            return None;
        }
        let target_faction = target.faction();
        let landed = target.apply_damage(p.damage, Vec2::zeros(), bodies);

        p.hit_lock = hit_lock;
        if p.pierces_left > 0 {
            p.pierces_left -= 1;
        } else {
            p.impact_queued = true;
        }
        self.impacts_enemy += 1;
        Some(ProjectileHit::Actor {
            target: target_id,
            target_faction,
            landed,
        })
    }

    /// Apply queued impacts (call after the step returns)
    pub fn flush_impacts(&mut self, bodies: &dyn BodyMotion, queue: &mut DestroyQueue) {
        let fx_time = self.tuning.impact_fx_time;
        for p in self.projectiles.values_mut() {
            if p.state == ProjectileState::Alive && p.impact_queued {
                if let Some(position) = bodies.position(p.body) {
                    p.last_position = position;
                    queue.queue_body(p.body);
                }
                p.begin_impact(fx_time);
            }
        }
    }

    /// Age projectiles: expired ones are queued for destruction and dropped,
    /// finished impact effects are dropped
    pub fn update(&mut self, delta: f32, bodies: &dyn BodyMotion, queue: &mut DestroyQueue) {
        self.projectiles.retain(|_, p| match p.state {
            ProjectileState::Alive => {
                p.tick_alive(delta, bodies.position(p.body));
                if p.time_left <= 0.0 {
                    queue.queue_body(p.body);
                    false
                } else {
                    true
                }
            }
            ProjectileState::Impact => {
                p.tick_impact(delta);
                !p.impact_done()
            }
        });
    }

    /// Drop every projectile and reset the impact counters (room change)
    ///
    /// Bodies of projectiles still in flight are queued; impacting ones
    /// already handed theirs over.
    pub fn clear(&mut self, queue: &mut DestroyQueue) {
        for p in self.projectiles.values() {
            if p.state == ProjectileState::Alive {
                queue.queue_body(p.body);
            }
        }
        self.projectiles.clear();
        self.impacts_enemy = 0;
        self.impacts_world = 0;
    }

    /// Look up a projectile
    pub fn get(&self, key: ProjectileKey) -> Option<&Projectile> {
        self.projectiles.get(key)
    }

    /// Every tracked projectile
    pub fn iter(&self) -> impl Iterator<Item = (ProjectileKey, &Projectile)> {
        self.projectiles.iter()
    }

    /// Number of tracked projectiles (alive or impacting)
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Forget a projectile without touching the world (strict-mode repair)
    pub(crate) fn forget(&mut self, key: ProjectileKey) -> Option<Projectile> {
        self.projectiles.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damageable::Damageable;
    use crate::combat::health::HealthComponent;
    use crate::foundation::collections::{BodyKey, EnemyKey, FixtureKey, Key};

    struct Target {
        body: BodyKey,
        health: HealthComponent,
    }

    impl Damageable for Target {
        fn faction(&self) -> Faction {
            Faction::Enemy
        }

        fn body(&self) -> BodyKey {
            self.body
        }

        fn health(&self) -> &HealthComponent {
            &self.health
        }

        fn health_mut(&mut self) -> &mut HealthComponent {
            &mut self.health
        }

        fn apply_damage(&mut self, amount: i32, _knockback: Vec2, _bodies: &mut dyn BodyMotion) -> bool {
            self.health.try_damage(amount, 0.0, 0.0, 0.0)
        }
    }

    struct One(ActorId, Target);

    impl ActorRegistry for One {
        fn damageable_mut(&mut self, id: ActorId) -> Option<&mut dyn Damageable> {
            (id == self.0).then_some(&mut self.1 as &mut dyn Damageable)
        }
    }

    fn bolt(faction: Faction, pierce: u32) -> ProjectileSpawn {
        ProjectileSpawn {
            position: Vec2::zeros(),
            velocity: Vec2::new(8.5, 0.0),
            faction,
            damage: 1,
            lifetime: 1.2,
            pierce,
        }
    }

    fn side(tag: FixtureTag) -> ContactSide {
        ContactSide {
            fixture: FixtureKey::null(),
            body: BodyKey::null(),
            tag,
        }
    }

    fn enemy_registry() -> One {
        let mut keys: SlotMap<EnemyKey, ()> = SlotMap::with_key();
        One(
            ActorId::Ranged(keys.insert(())),
            Target {
                body: BodyKey::null(),
                health: HealthComponent::new(3),
            },
        )
    }

    #[test]
    fn test_world_hit_is_deferred_until_flush() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut queue = DestroyQueue::new();
        let mut actors = enemy_registry();
        let key = system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();

        let hit = system.handle_contact(key, side(FixtureTag::Ground), &mut actors, &mut world);
        assert_eq!(hit, Some(ProjectileHit::World));
        assert_eq!(system.get(key).unwrap().state(), ProjectileState::Alive);
        assert!(queue.is_empty());

        system.flush_impacts(&world, &mut queue);
        assert_eq!(system.get(key).unwrap().state(), ProjectileState::Impact);
        assert_eq!(queue.pending_bodies(), 1);
        assert_eq!(system.consume_impacts_world(), 1);
        assert_eq!(system.consume_impacts_world(), 0);
    }

    #[test]
    fn test_repeat_contacts_in_one_burst_count_once() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut actors = enemy_registry();
        let target = actors.0;
        let key = system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();

        assert!(system
            .handle_contact(key, side(FixtureTag::Actor(target)), &mut actors, &mut world)
            .is_some());
        assert!(system
            .handle_contact(key, side(FixtureTag::Actor(target)), &mut actors, &mut world)
            .is_none());
        assert!(system
            .handle_contact(key, side(FixtureTag::Ground), &mut actors, &mut world)
            .is_none());
        assert_eq!(actors.1.health.hp(), 2);
        assert_eq!(system.consume_impacts_enemy(), 1);
    }

    #[test]
    fn test_same_faction_is_ignored() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut actors = enemy_registry();
        let target = actors.0;
        let key = system.spawn(&mut world, bolt(Faction::Enemy, 0)).unwrap();

        assert!(system
            .handle_contact(key, side(FixtureTag::Actor(target)), &mut actors, &mut world)
            .is_none());
        assert!(!system.get(key).unwrap().is_impact_queued());
    }

    #[test]
    fn test_pierce_keeps_projectile_alive() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut queue = DestroyQueue::new();
        let mut actors = enemy_registry();
        let target = actors.0;
        let key = system.spawn(&mut world, bolt(Faction::Player, 1)).unwrap();

        system.handle_contact(key, side(FixtureTag::Actor(target)), &mut actors, &mut world);
        let p = system.get(key).unwrap();
        assert_eq!(p.pierces_left(), 0);
        assert!(!p.is_impact_queued());

        system.flush_impacts(&world, &mut queue);
        assert_eq!(system.get(key).unwrap().state(), ProjectileState::Alive);

        // Hit-lock expires, the next contact ends the flight.
        system.update(0.06, &world, &mut queue);
        system.handle_contact(key, side(FixtureTag::Actor(target)), &mut actors, &mut world);
        assert!(system.get(key).unwrap().is_impact_queued());
    }

    #[test]
    fn test_impact_effect_runs_out() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut queue = DestroyQueue::new();
        let key = system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();

        system.queue_impact(key);
        system.queue_impact(key);
        system.flush_impacts(&world, &mut queue);
        assert_eq!(queue.pending_bodies(), 1);

        system.update(0.05, &world, &mut queue);
        assert!(system.get(key).is_some());
        system.update(0.06, &world, &mut queue);
        assert!(system.get(key).is_none());

        // Queuing against a finished projectile does nothing.
        system.queue_impact(key);
        assert!(system.is_empty());
    }

    #[test]
    fn test_lifetime_expiry_queues_body() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut queue = DestroyQueue::new();
        let key = system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();

        system.update(1.0, &world, &mut queue);
        assert!(system.get(key).is_some());
        system.update(0.25, &world, &mut queue);
        assert!(system.get(key).is_none());
        assert_eq!(queue.pending_bodies(), 1);
    }

    #[test]
    fn test_clear_queues_only_bodies_still_in_flight() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut system = ProjectileSystem::new(&ProjectileTuning::default());
        let mut queue = DestroyQueue::new();
        let mut actors = enemy_registry();
        let hit = system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();
        system.spawn(&mut world, bolt(Faction::Player, 0)).unwrap();
        system.handle_contact(hit, side(FixtureTag::Ground), &mut actors, &mut world);
        system.flush_impacts(&world, &mut queue);
        queue.clear();

        system.clear(&mut queue);
        assert!(system.is_empty());
        assert_eq!(queue.pending_bodies(), 1);
        assert_eq!(system.consume_impacts_world(), 0);
    }
}
