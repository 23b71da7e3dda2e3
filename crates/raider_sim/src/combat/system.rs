//! Melee combat resolver
//!
//! Owns every active hitbox for its lifetime. Hitboxes are sensor fixtures
//! attached to the attacker's body; they age out after a fixed time-to-live
//! and their fixtures are handed to the destroy queue rather than removed
//! in place.

use super::damageable::{ActorId, Damageable, Faction};
use super::hitbox::{Hitbox, MeleeRequest};
use crate::config::CombatTuning;
use crate::foundation::collections::{BodyKey, FixtureKey, HitboxKey, Key, SlotMap};
use crate::foundation::math::Vec2;
use crate::foundation::time::tick_down;
use crate::physics::{
    BodyMotion, BodyPurge, CollisionFilter, ContactSide, DestroyQueue, FixtureDef, FixtureTag, PhysicsError,
    PhysicsWorld, Shape,
};

/// Resolves actor ids to damageable actors
pub trait ActorRegistry {
    /// The actor behind `id`, if it still exists
    fn damageable_mut(&mut self, id: ActorId) -> Option<&mut dyn Damageable>;
}

/// Result of a hitbox touching a valid target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeHit {
    /// Actor struck
    pub target: ActorId,
    /// Allegiance of the actor struck
    pub target_faction: Faction,
    /// Whether damage went through (false while the target was invulnerable)
    pub landed: bool,
    /// Knockback direction (-1 or +1)
    pub direction: f32,
}

/// Melee hitbox owner and resolver
#[derive(Debug)]
pub struct CombatSystem {
    hitboxes: SlotMap<HitboxKey, Hitbox>,
    tuning: CombatTuning,
    hit_this_frame: bool,
}

impl CombatSystem {
    /// Create a resolver with no active hitboxes
    pub fn new(tuning: &CombatTuning) -> Self {
        Self {
            hitboxes: SlotMap::with_key(),
            tuning: tuning.clone(),
            hit_this_frame: false,
        }
    }

    /// Reset per-frame flags
    pub fn begin_frame(&mut self) {
        self.hit_this_frame = false;
    }

    /// Whether any hitbox struck a target since `begin_frame`
    pub fn hit_this_frame(&self) -> bool {
        self.hit_this_frame
    }

    /// Whether `body` already carries an active hitbox
    pub fn has_hitbox_for(&self, body: BodyKey) -> bool {
        self.hitboxes.values().any(|h| h.owner_body == body)
    }

    /// Open a melee hitbox on the attacker's body
    ///
    /// Ignored (returns `Ok(None)`) while that body already has an active
    /// hitbox: one concurrent hitbox per attacker.
    pub fn spawn_melee_hitbox(
        &mut self,
        world: &mut PhysicsWorld,
        request: MeleeRequest,
    ) -> Result<Option<HitboxKey>, PhysicsError> {
        if self.has_hitbox_for(request.owner_body) {
            return Ok(None);
        }

        let half = request.geometry.half_extents();
        let offset = request.geometry.offset(request.facing, request.aim);

        let key = self
            .hitboxes
            .insert(Hitbox::new(&request, FixtureKey::null(), self.tuning.hitbox_ttl));
        let def = FixtureDef::sensor(
            Shape::rect_at(half.x, half.y, offset),
            CollisionFilter::hitbox(),
            FixtureTag::Hitbox(key),
        );
        match world.create_fixture(request.owner_body, def) {
            Ok(fixture) => {
                self.hitboxes[key].fixture = fixture;
                log::trace!("Hitbox {key:?} opened for {:?}", request.owner);
                Ok(Some(key))
            }
            Err(e) => {
                self.hitboxes.remove(key);
                Err(e)
            }
        }
    }

    /// Age every hitbox; expired ones are queued for destruction and
    /// forgotten immediately so they can never deal damage again
    pub fn update(&mut self, delta: f32, queue: &mut DestroyQueue) {
        for hitbox in self.hitboxes.values_mut() {
            tick_down(&mut hitbox.time_left, delta);
        }
        self.hitboxes.retain(|_, hitbox| {
            if hitbox.time_left <= 0.0 {
                queue.queue_fixture(hitbox.owner_body, hitbox.fixture);
                false
            } else {
                true
            }
        });
    }

    /// Resolve a hitbox touching another fixture
    ///
    /// Returns `None` when the contact is not a valid hit: unknown or expired
    /// hitbox, non-damageable or dead target, same faction, or already struck.
    pub fn handle_hitbox_contact(
        &mut self,
        hitbox_key: HitboxKey,
        hitbox_body: BodyKey,
        other: ContactSide,
        actors: &mut dyn ActorRegistry,
        bodies: &mut dyn BodyMotion,
    ) -> Option<MeleeHit> {
        let FixtureTag::Actor(target_id) = other.tag else {
            return None;
        };
        let hitbox = self.hitboxes.get_mut(hitbox_key)?;
        if !hitbox.can_hit(target_id) {
            return None;
        }

        let target = actors.damageable_mut(target_id)?;
        if !target.is_alive() || target.faction() == hitbox.faction {
            return None;
        }
        let target_faction = target.faction();

        let hitbox_x = bodies.position(hitbox_body)?.x;
        let target_x = bodies.position(other.body)?.x;
        let direction = if target_x >= hitbox_x { 1.0 } else { -1.0 };

        let knockback = Vec2::new(direction * self.tuning.knockback_x, self.tuning.knockback_y);
        let landed = target.apply_damage(hitbox.damage, knockback, bodies);
        hitbox.mark_hit(target_id);

        let owner_alive = actors
            .damageable_mut(hitbox.owner)
            .is_some_and(|owner| owner.is_alive());
        if owner_alive {
            if let Some(v) = bodies.linear_velocity(hitbox_body) {
                let recoiled = Vec2::new(v.x - direction * self.tuning.recoil_x, v.y + self.tuning.recoil_y);
                bodies.set_linear_velocity(hitbox_body, recoiled);
            }
        }

        self.hit_this_frame = true;
        Some(MeleeHit {
            target: target_id,
            target_faction,
            landed,
            direction,
        })
    }

    /// Look up an active hitbox
    pub fn hitbox(&self, key: HitboxKey) -> Option<&Hitbox> {
        self.hitboxes.get(key)
    }

    /// Every active hitbox
    pub fn active_hitboxes(&self) -> impl Iterator<Item = (HitboxKey, &Hitbox)> {
        self.hitboxes.iter()
    }

    /// Number of active hitboxes
    pub fn active_count(&self) -> usize {
        self.hitboxes.len()
    }

    /// Forget a hitbox without touching the world (strict-mode repair)
    pub(crate) fn forget(&mut self, key: HitboxKey) -> Option<Hitbox> {
        self.hitboxes.remove(key)
    }

    /// Drop every hitbox (room reset)
    pub fn clear(&mut self) {
        self.hitboxes.clear();
    }
}

impl BodyPurge for CombatSystem {
    fn purge_for_body(&mut self, body: BodyKey) -> Vec<FixtureKey> {
        let mut fixtures = Vec::new();
        self.hitboxes.retain(|_, hitbox| {
            if hitbox.owner_body == body {
                fixtures.push(hitbox.fixture);
                false
            } else {
                true
            }
        });
        fixtures
    }
}
