//! Collision layer system for filtering contacts
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."
//!
//! Every fixture carries one category bit and a mask of the categories it
//! wants to touch. A pair is tested only when each side accepts the other.

use bitflags::bitflags;

bitflags! {
    /// Collision categories
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionLayers: u16 {
        /// Static level geometry (ground, one-way platforms, walls)
        const WORLD = 0x0001;
        /// Player hurtbox
        const PLAYER = 0x0002;
        /// Enemy hurtbox
        const ENEMY = 0x0004;
        /// Melee hitbox sensors
        const HITBOX = 0x0008;
        /// Projectile sensors
        const PROJECTILE = 0x0010;
        /// Relic pickup sensors
        const PICKUP = 0x0020;
        /// Foot sensors and generic triggers
        const SENSOR = 0x0040;
    }
}

impl CollisionLayers {
    /// What level geometry touches
    pub const MASK_WORLD: Self = Self::PLAYER
        .union(Self::ENEMY)
        .union(Self::PROJECTILE)
        .union(Self::SENSOR)
        .union(Self::HITBOX);

    /// What the player body touches
    pub const MASK_PLAYER: Self = Self::WORLD
        .union(Self::ENEMY)
        .union(Self::HITBOX)
        .union(Self::PROJECTILE)
        .union(Self::PICKUP);

    /// What enemy bodies touch
    pub const MASK_ENEMY: Self = Self::WORLD
        .union(Self::PLAYER)
        .union(Self::HITBOX)
        .union(Self::PROJECTILE);

    /// What melee hitboxes touch
    pub const MASK_HITBOX: Self = Self::PLAYER.union(Self::ENEMY).union(Self::WORLD);

    /// What projectiles touch
    pub const MASK_PROJECTILE: Self = Self::WORLD.union(Self::PLAYER).union(Self::ENEMY);

    /// What pickups touch
    pub const MASK_PICKUP: Self = Self::PLAYER;

    /// What foot sensors and triggers touch
    pub const MASK_SENSOR: Self = Self::WORLD;
}

/// Category/mask pair attached to a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    /// The single category this fixture belongs to
    pub category: CollisionLayers,
    /// Categories this fixture accepts contacts with
    pub mask: CollisionLayers,
}

impl CollisionFilter {
    /// Create a filter from a category and mask
    pub const fn new(category: CollisionLayers, mask: CollisionLayers) -> Self {
        Self { category, mask }
    }

    /// Level geometry
    pub const fn world() -> Self {
        Self::new(CollisionLayers::WORLD, CollisionLayers::MASK_WORLD)
    }

    /// Player body
    pub const fn player() -> Self {
        Self::new(CollisionLayers::PLAYER, CollisionLayers::MASK_PLAYER)
    }

    /// Enemy body
    pub const fn enemy() -> Self {
        Self::new(CollisionLayers::ENEMY, CollisionLayers::MASK_ENEMY)
    }

    /// Melee hitbox sensor
    pub const fn hitbox() -> Self {
        Self::new(CollisionLayers::HITBOX, CollisionLayers::MASK_HITBOX)
    }

    /// Projectile sensor
    pub const fn projectile() -> Self {
        Self::new(CollisionLayers::PROJECTILE, CollisionLayers::MASK_PROJECTILE)
    }

    /// Pickup sensor
    pub const fn pickup() -> Self {
        Self::new(CollisionLayers::PICKUP, CollisionLayers::MASK_PICKUP)
    }

    /// Foot sensor or trigger
    pub const fn sensor() -> Self {
        Self::new(CollisionLayers::SENSOR, CollisionLayers::MASK_SENSOR)
    }

    /// Check whether two filters accept each other
    ///
    /// A's category must be in B's mask AND B's category must be in A's mask.
    pub fn should_collide(self, other: Self) -> bool {
        self.category.intersects(other.mask) && other.category.intersects(self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_are_mutual() {
        let all = [
            CollisionFilter::world(),
            CollisionFilter::player(),
            CollisionFilter::enemy(),
            CollisionFilter::hitbox(),
            CollisionFilter::projectile(),
            CollisionFilter::pickup(),
            CollisionFilter::sensor(),
        ];
        for a in all {
            for b in all {
                let one_way = a.mask.contains(b.category) != b.mask.contains(a.category);
                assert!(!one_way, "{:?} vs {:?} is not symmetric", a.category, b.category);
            }
        }
    }

    #[test]
    fn test_pickup_only_sees_player() {
        let pickup = CollisionFilter::pickup();
        assert!(pickup.should_collide(CollisionFilter::player()));
        assert!(!pickup.should_collide(CollisionFilter::enemy()));
        assert!(!pickup.should_collide(CollisionFilter::world()));
    }

    #[test]
    fn test_hitbox_sees_world_but_not_projectiles() {
        let hitbox = CollisionFilter::hitbox();
        assert!(hitbox.should_collide(CollisionFilter::world()));
        assert!(!hitbox.should_collide(CollisionFilter::projectile()));
        assert!(!hitbox.should_collide(CollisionFilter::hitbox()));
    }

    #[test]
    fn test_foot_sensor_ignores_actors() {
        let sensor = CollisionFilter::sensor();
        assert!(sensor.should_collide(CollisionFilter::world()));
        assert!(!sensor.should_collide(CollisionFilter::enemy()));
        assert!(!sensor.should_collide(CollisionFilter::projectile()));
    }
}
