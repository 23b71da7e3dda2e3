//! Debug visualization data
//!
//! Based on Game Engine Architecture 3rd Edition, Section 10.2:
//! "Debug drawing for collision detection typically includes visualizations
//! of bounding volumes, collision shapes, and query results."
//!
//! The core never draws. It exposes read-only world-space shapes with a
//! suggested color; the host renders them however it likes.

use crate::physics::{CollisionLayers, FixtureTag, WorldShape};

/// RGBA color, components in [0, 1]
pub type Rgba = [f32; 4];

/// One fixture in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugShape {
    /// World-space geometry
    pub shape: WorldShape,
    /// Collision category of the fixture
    pub category: CollisionLayers,
    /// Sensor fixtures produce no collision response
    pub is_sensor: bool,
    /// Fixture role
    pub tag: FixtureTag,
}

impl DebugShape {
    /// Melee hitbox
    pub fn is_hitbox(&self) -> bool {
        matches!(self.tag, FixtureTag::Hitbox(_))
    }

    /// Actor hurtbox
    pub fn is_hurtbox(&self) -> bool {
        matches!(self.tag, FixtureTag::Actor(_))
    }
}

/// Color scheme for collision visualization
#[derive(Debug, Clone, PartialEq)]
pub struct DebugColors {
    /// Ground and one-way platforms
    pub world: Rgba,
    /// Actor hurtboxes
    pub hurtbox: Rgba,
    /// Melee hitboxes
    pub hitbox: Rgba,
    /// Projectiles
    pub projectile: Rgba,
    /// Everything else (foot sensors, pickups, triggers)
    pub sensor: Rgba,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            world: [0.6, 0.6, 0.6, 0.3],
            hurtbox: [0.0, 1.0, 0.0, 0.3],
            hitbox: [1.0, 0.0, 0.0, 0.5],
            projectile: [1.0, 0.8, 0.0, 0.6],
            sensor: [0.0, 1.0, 1.0, 0.2],
        }
    }
}

impl DebugColors {
    /// Suggested color for a shape
    pub fn color_for(&self, shape: &DebugShape) -> Rgba {
        match shape.tag {
            FixtureTag::Ground | FixtureTag::OneWay => self.world,
            FixtureTag::Actor(_) => self.hurtbox,
            FixtureTag::Hitbox(_) => self.hitbox,
            FixtureTag::Projectile(_) => self.projectile,
            FixtureTag::GroundSensor(_) | FixtureTag::Pickup(_) | FixtureTag::Trigger => self.sensor,
        }
    }
}

/// Active hitboxes and hurtboxes only, the combat overlay
pub fn combat_shapes(shapes: &[DebugShape]) -> Vec<DebugShape> {
    shapes
        .iter()
        .filter(|s| s.is_hitbox() || s.is_hurtbox())
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damageable::ActorId;
    use crate::foundation::math::Vec2;
    use crate::physics::Aabb;

    fn shape(tag: FixtureTag) -> DebugShape {
        DebugShape {
            shape: WorldShape::Rect(Aabb::from_center(Vec2::zeros(), Vec2::new(0.1, 0.1))),
            category: CollisionLayers::WORLD,
            is_sensor: false,
            tag,
        }
    }

    #[test]
    fn test_combat_overlay_filters_roles() {
        let shapes = [
            shape(FixtureTag::Ground),
            shape(FixtureTag::Actor(ActorId::Player)),
            shape(FixtureTag::GroundSensor(ActorId::Player)),
        ];
        let overlay = combat_shapes(&shapes);
        assert_eq!(overlay.len(), 1);
        assert!(overlay[0].is_hurtbox());

        let colors = DebugColors::default();
        assert_eq!(colors.color_for(&shapes[0]), colors.world);
    }
}
