//! Static level geometry
//!
//! A level is plain data (serde-friendly, so it can live in a RON file next
//! to the tuning) that [`LevelLayout::build`] turns into static bodies.

use serde::{Deserialize, Serialize};

use crate::foundation::collections::BodyKey;
use crate::foundation::math::{px_to_meters, to_meters};
use crate::physics::{BodyDef, CollisionFilter, FixtureDef, FixtureTag, PhysicsError, PhysicsWorld, Shape};

/// How a platform collides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Solid from every side
    Ground,
    /// Solid only when landed on from above
    OneWay,
}

/// Axis-aligned platform, authored in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformRect {
    /// Center x
    pub center_x_px: f32,
    /// Center y
    pub center_y_px: f32,
    /// Full width
    pub width_px: f32,
    /// Full height
    pub height_px: f32,
    /// Collision behaviour
    pub kind: PlatformKind,
}

impl PlatformRect {
    /// Solid box
    pub fn ground(center_x_px: f32, center_y_px: f32, width_px: f32, height_px: f32) -> Self {
        Self {
            center_x_px,
            center_y_px,
            width_px,
            height_px,
            kind: PlatformKind::Ground,
        }
    }

    /// One-way platform
    pub fn one_way(center_x_px: f32, center_y_px: f32, width_px: f32, height_px: f32) -> Self {
        Self {
            kind: PlatformKind::OneWay,
            ..Self::ground(center_x_px, center_y_px, width_px, height_px)
        }
    }

    /// Top surface y in pixels
    pub fn top_px(&self) -> f32 {
        self.center_y_px + self.height_px / 2.0
    }
}

/// Every platform of a room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Platforms in creation order
    pub platforms: Vec<PlatformRect>,
}

impl LevelLayout {
    /// The sandbox room: a long floor, three ledges, a wall and one
    /// one-way platform
    pub fn test_level() -> Self {
        Self {
            platforms: vec![
                PlatformRect::ground(0.0, 48.0, 10_000.0, 16.0),
                PlatformRect::ground(220.0, 120.0, 180.0, 16.0),
                PlatformRect::ground(520.0, 170.0, 140.0, 16.0),
                PlatformRect::ground(820.0, 140.0, 220.0, 16.0),
                PlatformRect::ground(1000.0, 120.0, 16.0, 200.0),
                PlatformRect::one_way(650.0, 230.0, 220.0, 12.0),
            ],
        }
    }

    /// Add a platform (builder style)
    pub fn with(mut self, platform: PlatformRect) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Create one static body per platform
    pub fn build(&self, world: &mut PhysicsWorld) -> Result<Vec<BodyKey>, PhysicsError> {
        let bodies = self
            .platforms
            .iter()
            .map(|p| create_static_box(world, p))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Level built: {} platforms", bodies.len());
        Ok(bodies)
    }
}

fn create_static_box(world: &mut PhysicsWorld, rect: &PlatformRect) -> Result<BodyKey, PhysicsError> {
    let body = world.create_body(BodyDef::fixed(px_to_meters(rect.center_x_px, rect.center_y_px)))?;
    let tag = match rect.kind {
        PlatformKind::Ground => FixtureTag::Ground,
        PlatformKind::OneWay => FixtureTag::OneWay,
    };
    let shape = Shape::rect(to_meters(rect.width_px / 2.0), to_meters(rect.height_px / 2.0));
    world.create_fixture(body, FixtureDef::solid(shape, CollisionFilter::world(), tag))?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    #[test]
    fn test_test_level_builds_tagged_geometry() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let layout = LevelLayout::test_level();
        let bodies = layout.build(&mut world).unwrap();
        assert_eq!(bodies.len(), 6);

        let one_way = world.body(bodies[5]).unwrap().fixtures()[0];
        assert_eq!(world.fixture(one_way).unwrap().tag(), FixtureTag::OneWay);
        assert_eq!(layout.platforms[0].top_px(), 56.0);
    }

    #[test]
    fn test_layout_roundtrips_through_ron() {
        let layout = LevelLayout::default().with(PlatformRect::one_way(10.0, 20.0, 30.0, 4.0));
        let text = ron::to_string(&layout).unwrap();
        let back: LevelLayout = ron::from_str(&text).unwrap();
        assert_eq!(back, layout);
    }
}
