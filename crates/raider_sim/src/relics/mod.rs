//! Relics: run-long combat modifiers, their pickups and drop rolls
//!
//! Pickups are static sensor circles. The contact router only flips their
//! `collected` flag; [`PickupSet::process`] runs after the step, queues the
//! body for destruction and hands the relic over.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::combat::CombatModifiers;
use crate::config::RelicTuning;
use crate::foundation::collections::{BodyKey, PickupKey, SlotMap};
use crate::foundation::math::{to_meters, Vec2};
use crate::physics::{BodyDef, CollisionFilter, DestroyQueue, FixtureDef, FixtureTag, PhysicsError, PhysicsWorld, Shape};

/// Multiplier spreading a base seed by an index (enemies killed, rooms)
pub(crate) const SEED_SPREAD: u64 = 1_315_423_911;

/// Mixed into a room seed before rolling its choice relics
const CHOICE_SEED_SALT: u64 = 0x1234_ABCD;

/// Relic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelicKind {
    /// +1 projectile damage per stack
    BonusProjectileDamage,
    /// Ranged cooldowns shrink per stack
    FireRateUp,
    /// Heal on melee hits
    MeleeLifesteal,
    /// Projectiles pass through one more target per stack
    PiercingShots,
}

/// Relics collected this run
#[derive(Debug, Clone, Default)]
pub struct RelicInventory {
    owned: Vec<RelicKind>,
}

impl RelicInventory {
    /// No relics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relic
    pub fn add(&mut self, kind: RelicKind) {
        log::debug!("Relic acquired: {kind:?}");
        self.owned.push(kind);
    }

    /// Owned relics in acquisition order
    pub fn owned(&self) -> &[RelicKind] {
        &self.owned
    }

    /// Stacks of one relic kind
    pub fn count(&self, kind: RelicKind) -> u32 {
        let n = self.owned.iter().filter(|&&k| k == kind).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Modifiers granted by every owned relic
    pub fn modifiers(&self, tuning: &RelicTuning) -> CombatModifiers {
        let bonus = self.count(RelicKind::BonusProjectileDamage);
        let fire_rate = self.count(RelicKind::FireRateUp);
        let lifesteal = self.count(RelicKind::MeleeLifesteal);

        // Each extra lifesteal stack shortens the interval by one hit.
        let heal_every_hits = if lifesteal == 0 {
            0
        } else {
            tuning.lifesteal_every_hits.saturating_sub(lifesteal - 1).max(1)
        };

        CombatModifiers {
            bonus_projectile_damage: i32::try_from(bonus).unwrap_or(i32::MAX),
            fire_rate_multiplier: (0..fire_rate).fold(1.0, |m, _| m * tuning.fire_rate_step),
            pierce: self.count(RelicKind::PiercingShots),
            heal_every_hits,
        }
    }
}

/// Weighted relic table
#[derive(Debug, Clone, PartialEq)]
pub struct DropRules {
    damage_weight: f32,
    fire_rate_weight: f32,
}

impl DropRules {
    /// Build from tuning
    pub fn new(tuning: &RelicTuning) -> Self {
        Self {
            damage_weight: tuning.damage_weight,
            fire_rate_weight: tuning.fire_rate_weight,
        }
    }

    /// Pick a relic kind; deterministic for a given RNG state
    pub fn roll_relic(&self, rng: &mut impl Rng) -> RelicKind {
        let r: f32 = rng.gen();
        if r < self.damage_weight {
            RelicKind::BonusProjectileDamage
        } else if r < self.fire_rate_weight {
            RelicKind::FireRateUp
        } else {
            RelicKind::MeleeLifesteal
        }
    }

    /// Two distinct relics offered by a choice room
    pub fn roll_choice_pair(&self, room_seed: u64) -> (RelicKind, RelicKind) {
        let mut rng = StdRng::seed_from_u64(room_seed ^ CHOICE_SEED_SALT);
        let first = self.roll_relic(&mut rng);
        let mut second = self.roll_relic(&mut rng);
        if second == first {
            second = if first == RelicKind::BonusProjectileDamage {
                RelicKind::FireRateUp
            } else {
                RelicKind::BonusProjectileDamage
            };
        }
        (first, second)
    }
}

/// Per-room drop state: at most one relic drops per room
#[derive(Debug, Clone)]
pub struct DropRoller {
    rules: DropRules,
    chance: f32,
    seed: u64,
    rng: StdRng,
    dropped: bool,
}

impl DropRoller {
    /// Fresh roller for a room
    pub fn new(rules: DropRules, chance: f32, seed: u64) -> Self {
        Self {
            rules,
            chance,
            seed,
            rng: StdRng::seed_from_u64(seed),
            dropped: false,
        }
    }

    /// Roll for the `index`-th enemy killed; `Some` at most once per room
    pub fn roll(&mut self, index: u64) -> Option<RelicKind> {
        if self.dropped {
            return None;
        }
        let r: f32 = self.rng.gen();
        if r >= self.chance {
            return None;
        }
        let mut kind_rng = StdRng::seed_from_u64(self.seed ^ index.wrapping_mul(SEED_SPREAD));
        self.dropped = true;
        Some(self.rules.roll_relic(&mut kind_rng))
    }

    /// Whether this room already dropped its relic
    pub fn has_dropped(&self) -> bool {
        self.dropped
    }
}

/// A relic lying in the room
#[derive(Debug, Clone, PartialEq)]
pub struct RelicPickup {
    body: BodyKey,
    kind: RelicKind,
    position: Vec2,
    collected: bool,
}

impl RelicPickup {
    /// Sensor body
    pub fn body(&self) -> BodyKey {
        self.body
    }

    /// Relic granted on collection
    pub fn kind(&self) -> RelicKind {
        self.kind
    }

    /// Position (meters)
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Touched by the player, awaiting processing
    pub fn is_collected(&self) -> bool {
        self.collected
    }
}

/// Owner of every pickup in the room
#[derive(Debug)]
pub struct PickupSet {
    pickups: SlotMap<PickupKey, RelicPickup>,
    radius: f32,
}

impl PickupSet {
    /// Empty set
    pub fn new(tuning: &RelicTuning) -> Self {
        Self {
            pickups: SlotMap::with_key(),
            radius: to_meters(tuning.pickup_radius_px),
        }
    }

    /// Place a pickup sensor at `position`
    pub fn spawn(&mut self, world: &mut PhysicsWorld, kind: RelicKind, position: Vec2) -> Result<PickupKey, PhysicsError> {
        let body = world.create_body(BodyDef::fixed(position))?;
        let key = self.pickups.insert(RelicPickup {
            body,
            kind,
            position,
            collected: false,
        });
        let def = FixtureDef::sensor(Shape::circle(self.radius), CollisionFilter::pickup(), FixtureTag::Pickup(key));
        if let Err(e) = world.create_fixture(body, def) {
            self.pickups.remove(key);
            if let Err(cleanup) = world.destroy_body(body) {
                log::warn!("Pickup body {body:?} leaked after failed spawn: {cleanup}");
            }
            return Err(e);
        }
        Ok(key)
    }

    /// Flag a pickup as collected (safe inside a step)
    pub fn mark_collected(&mut self, key: PickupKey) {
        if let Some(p) = self.pickups.get_mut(key) {
            p.collected = true;
        }
    }

    /// Remove collected pickups, queueing their bodies; returns the relics
    /// gained in key order
    pub fn process(&mut self, queue: &mut DestroyQueue) -> Vec<RelicKind> {
        let mut gained = Vec::new();
        self.pickups.retain(|_, p| {
            if p.collected {
                queue.queue_body(p.body);
                gained.push(p.kind);
                false
            } else {
                true
            }
        });
        gained
    }

    /// Drop every pickup, queueing its body (room change)
    pub fn clear(&mut self, queue: &mut DestroyQueue) {
        for p in self.pickups.values() {
            queue.queue_body(p.body);
        }
        self.pickups.clear();
    }

    /// Look up a pickup
    pub fn get(&self, key: PickupKey) -> Option<&RelicPickup> {
        self.pickups.get(key)
    }

    /// Every pickup
    pub fn iter(&self) -> impl Iterator<Item = (PickupKey, &RelicPickup)> {
        self.pickups.iter()
    }

    /// Number of pickups in the room
    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    /// True when the room holds no pickups
    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_modifiers_stack() {
        let tuning = RelicTuning::default();
        let mut inventory = RelicInventory::new();
        assert_eq!(inventory.modifiers(&tuning), CombatModifiers::default());

        inventory.add(RelicKind::BonusProjectileDamage);
        inventory.add(RelicKind::BonusProjectileDamage);
        inventory.add(RelicKind::FireRateUp);
        inventory.add(RelicKind::FireRateUp);
        inventory.add(RelicKind::MeleeLifesteal);
        inventory.add(RelicKind::PiercingShots);

        let m = inventory.modifiers(&tuning);
        assert_eq!(m.bonus_projectile_damage, 2);
        assert_relative_eq!(m.fire_rate_multiplier, 0.85 * 0.85);
        assert_eq!(m.heal_every_hits, 5);
        assert_eq!(m.pierce, 1);

        inventory.add(RelicKind::MeleeLifesteal);
        assert_eq!(inventory.modifiers(&tuning).heal_every_hits, 4);
    }

    #[test]
    fn test_drop_rules_are_deterministic() {
        let rules = DropRules::new(&RelicTuning::default());
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| rules.roll_relic(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| rules.roll_relic(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_choice_pair_is_distinct_and_seeded() {
        let rules = DropRules::new(&RelicTuning::default());
        for seed in 0..64 {
            let (a, b) = rules.roll_choice_pair(seed);
            assert_ne!(a, b);
            assert_eq!(rules.roll_choice_pair(seed), (a, b));
        }
    }

    #[test]
    fn test_roller_drops_at_most_once() {
        let rules = DropRules::new(&RelicTuning::default());
        let mut roller = DropRoller::new(rules.clone(), 1.0, 7);
        assert!(roller.roll(0).is_some());
        assert!(roller.has_dropped());
        assert!(roller.roll(1).is_none());

        let mut never = DropRoller::new(rules, 0.0, 7);
        assert!((0..20).all(|i| never.roll(i).is_none()));
    }

    #[test]
    fn test_collected_pickup_is_processed_once() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut pickups = PickupSet::new(&RelicTuning::default());
        let mut queue = DestroyQueue::new();
        let key = pickups
            .spawn(&mut world, RelicKind::FireRateUp, Vec2::new(1.0, 1.0))
            .unwrap();

        assert!(pickups.process(&mut queue).is_empty());
        pickups.mark_collected(key);
        assert_eq!(pickups.process(&mut queue), vec![RelicKind::FireRateUp]);
        assert_eq!(queue.pending_bodies(), 1);
        assert!(pickups.is_empty());
        assert!(pickups.process(&mut queue).is_empty());
    }

    #[test]
    fn test_clear_queues_every_pickup_body() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut pickups = PickupSet::new(&RelicTuning::default());
        let mut queue = DestroyQueue::new();
        pickups.spawn(&mut world, RelicKind::FireRateUp, Vec2::new(1.0, 1.0)).unwrap();
        pickups.spawn(&mut world, RelicKind::PiercingShots, Vec2::new(2.0, 1.0)).unwrap();

        pickups.clear(&mut queue);
        assert!(pickups.is_empty());
        assert_eq!(queue.pending_bodies(), 2);
    }

    #[test]
    fn test_failed_spawn_tracks_nothing() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut pickups = PickupSet::new(&RelicTuning::default());
        world.set_locked(true);
        let result = pickups.spawn(&mut world, RelicKind::FireRateUp, Vec2::new(1.0, 1.0));
        assert_eq!(result, Err(PhysicsError::WorldLocked));
        assert!(pickups.is_empty());
        assert_eq!(world.body_count(), 0);
    }
}
