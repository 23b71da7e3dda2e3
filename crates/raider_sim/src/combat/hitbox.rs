//! Melee hitbox records

use std::collections::HashSet;

use super::damageable::{ActorId, Faction};
use crate::config::HitboxGeometry;
use crate::foundation::collections::{BodyKey, FixtureKey};
use crate::foundation::math::{AimY, Facing};

/// Everything needed to open a melee hitbox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeRequest {
    /// Body the sensor attaches to
    pub owner_body: BodyKey,
    /// Actor swinging
    pub owner: ActorId,
    /// Attacker allegiance
    pub faction: Faction,
    /// Horizontal facing of the swing
    pub facing: Facing,
    /// Vertical aim of the swing
    pub aim: AimY,
    /// Damage per target
    pub damage: i32,
    /// Size and offset preset
    pub geometry: HitboxGeometry,
}

/// A live melee hitbox
///
/// Applies its damage to any one target at most once.
#[derive(Debug, Clone)]
pub struct Hitbox {
    pub(crate) owner_body: BodyKey,
    pub(crate) fixture: FixtureKey,
    pub(crate) time_left: f32,
    pub(crate) damage: i32,
    pub(crate) faction: Faction,
    pub(crate) owner: ActorId,
    struck: HashSet<ActorId>,
}

impl Hitbox {
    pub(crate) fn new(request: &MeleeRequest, fixture: FixtureKey, ttl: f32) -> Self {
        Self {
            owner_body: request.owner_body,
            fixture,
            time_left: ttl,
            damage: request.damage,
            faction: request.faction,
            owner: request.owner,
            struck: HashSet::new(),
        }
    }

    /// Body the sensor is attached to
    pub fn owner_body(&self) -> BodyKey {
        self.owner_body
    }

    /// Sensor fixture
    pub fn fixture(&self) -> FixtureKey {
        self.fixture
    }

    /// Remaining lifetime
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// Damage per target
    pub fn damage(&self) -> i32 {
        self.damage
    }

    /// Attacker allegiance
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Actor that swung
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Whether `target` may still be struck
    pub fn can_hit(&self, target: ActorId) -> bool {
        target != self.owner && !self.struck.contains(&target)
    }

    /// Record a struck target
    pub fn mark_hit(&mut self, target: ActorId) {
        self.struck.insert(target);
    }

    /// Number of distinct targets struck
    pub fn struck_count(&self) -> usize {
        self.struck.len()
    }
}
