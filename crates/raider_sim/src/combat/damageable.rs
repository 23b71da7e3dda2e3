//! Damage capability shared by the player and enemies

use super::health::HealthComponent;
use crate::foundation::collections::{BodyKey, EnemyKey};
use crate::foundation::math::Vec2;
use crate::physics::BodyMotion;

/// Coarse allegiance used to suppress friendly fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    /// Player-aligned
    Player,
    /// Enemy-aligned
    Enemy,
}

/// Identity of a damageable actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorId {
    /// The player
    Player,
    /// A melee enemy
    Melee(EnemyKey),
    /// A ranged enemy
    Ranged(EnemyKey),
}

/// Something that can take hits
pub trait Damageable {
    /// Allegiance
    fn faction(&self) -> Faction;

    /// Physics body carrying the hurtbox
    fn body(&self) -> BodyKey;

    /// Health component
    fn health(&self) -> &HealthComponent;

    /// Mutable health component
    fn health_mut(&mut self) -> &mut HealthComponent;

    /// Above zero hit points
    fn is_alive(&self) -> bool {
        self.health().is_alive()
    }

    /// Apply damage and knockback; returns whether the hit landed
    ///
    /// Knockback is only applied when the underlying `try_damage` succeeds.
    fn apply_damage(&mut self, amount: i32, knockback: Vec2, bodies: &mut dyn BodyMotion) -> bool;
}

/// Add `knockback` to a body's current velocity
pub(crate) fn push_body(bodies: &mut dyn BodyMotion, body: BodyKey, knockback: Vec2) {
    if let Some(v) = bodies.linear_velocity(body) {
        bodies.set_linear_velocity(body, v + knockback);
    }
}
