//! Generational handles for simulation objects
//!
//! Every body, fixture and simulation object is addressed through a slotmap
//! key. A key whose slot was freed (and possibly reused) no longer resolves,
//! which is what lets destruction paths detect already-removed objects.

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Handle to a rigid body in the physics world
    pub struct BodyKey;

    /// Handle to a fixture (shape) attached to a body
    pub struct FixtureKey;

    /// Handle to an active melee hitbox owned by the combat system
    pub struct HitboxKey;

    /// Handle to a projectile owned by the projectile system
    pub struct ProjectileKey;

    /// Handle to a relic pickup lying in the room
    pub struct PickupKey;

    /// Handle to a melee or ranged enemy
    pub struct EnemyKey;
}
