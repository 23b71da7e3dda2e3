//! Collision shapes
//!
//! Shapes are stored in body-local space (an offset from the body origin)
//! and moved to world space on demand during tests (GEA 13.3.4).

use crate::foundation::math::Vec2;

/// Contact tolerance in meters; resting bodies count as touching within it
pub const LINEAR_SLOP: f32 = 0.002;

/// Fixture shape in body-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned box
    Rect {
        /// Half width and half height
        half_extents: Vec2,
        /// Center relative to the body origin
        offset: Vec2,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f32,
        /// Center relative to the body origin
        offset: Vec2,
    },
}

impl Shape {
    /// Box centered on the body
    pub fn rect(half_width: f32, half_height: f32) -> Self {
        Self::rect_at(half_width, half_height, Vec2::zeros())
    }

    /// Box with a local offset
    pub fn rect_at(half_width: f32, half_height: f32, offset: Vec2) -> Self {
        Self::Rect {
            half_extents: Vec2::new(half_width, half_height),
            offset,
        }
    }

    /// Circle centered on the body
    pub fn circle(radius: f32) -> Self {
        Self::Circle {
            radius,
            offset: Vec2::zeros(),
        }
    }

    /// Local offset of the shape center
    pub fn offset(&self) -> Vec2 {
        match *self {
            Self::Rect { offset, .. } | Self::Circle { offset, .. } => offset,
        }
    }

    /// Place the shape at a body position
    pub fn to_world(&self, body_position: Vec2) -> WorldShape {
        match *self {
            Self::Rect { half_extents, offset } => WorldShape::Rect(Aabb::from_center(
                body_position + offset,
                half_extents,
            )),
            Self::Circle { radius, offset } => WorldShape::Circle {
                center: body_position + offset,
                radius,
            },
        }
    }
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Build from center and half extents
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Box center
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half width and half height
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Overlap test, inclusive of `slop`
    pub fn overlaps(&self, other: &Self, slop: f32) -> bool {
        self.min.x <= other.max.x + slop
            && other.min.x <= self.max.x + slop
            && self.min.y <= other.max.y + slop
            && other.min.y <= self.max.y + slop
    }

    /// Signed overlap along each axis (positive when penetrating)
    pub fn overlap_depths(&self, other: &Self) -> Vec2 {
        Vec2::new(
            (self.max.x - other.min.x).min(other.max.x - self.min.x),
            (self.max.y - other.min.y).min(other.max.y - self.min.y),
        )
    }
}

/// A shape placed in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    /// Axis-aligned box
    Rect(Aabb),
    /// Circle
    Circle {
        /// Center in world space
        center: Vec2,
        /// Radius
        radius: f32,
    },
}

impl WorldShape {
    /// Bounding box
    pub fn aabb(&self) -> Aabb {
        match *self {
            Self::Rect(aabb) => aabb,
            Self::Circle { center, radius } => Aabb::from_center(center, Vec2::new(radius, radius)),
        }
    }

    /// Center in world space
    pub fn center(&self) -> Vec2 {
        match *self {
            Self::Rect(aabb) => aabb.center(),
            Self::Circle { center, .. } => center,
        }
    }

    /// Exact overlap test, inclusive of `slop`
    pub fn intersects(&self, other: &Self, slop: f32) -> bool {
        match (*self, *other) {
            (Self::Rect(a), Self::Rect(b)) => a.overlaps(&b, slop),
            (Self::Circle { center: ca, radius: ra }, Self::Circle { center: cb, radius: rb }) => {
                let reach = ra + rb + slop;
                (ca - cb).norm_squared() <= reach * reach
            }
            (Self::Rect(aabb), Self::Circle { center, radius })
            | (Self::Circle { center, radius }, Self::Rect(aabb)) => {
                let closest = Vec2::new(
                    center.x.clamp(aabb.min.x, aabb.max.x),
                    center.y.clamp(aabb.min.y, aabb.max.y),
                );
                let reach = radius + slop;
                (center - closest).norm_squared() <= reach * reach
            }
        }
    }
}

/// Penetration of a solid pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold {
    /// Unit normal pointing from B toward A
    pub normal: Vec2,
    /// Penetration depth along the normal (negative while separated within slop)
    pub depth: f32,
}

/// Box-box manifold along the axis of least overlap
///
/// Solid response treats every shape as its bounding box, which is exact for
/// the boxes used by level geometry and actor bodies.
pub fn manifold(a: &Aabb, b: &Aabb) -> Option<Manifold> {
    if !a.overlaps(b, LINEAR_SLOP) {
        return None;
    }
    let depths = a.overlap_depths(b);
    let delta = a.center() - b.center();
    if depths.y <= depths.x {
        let sign = if delta.y >= 0.0 { 1.0 } else { -1.0 };
        Some(Manifold {
            normal: Vec2::new(0.0, sign),
            depth: depths.y,
        })
    } else {
        let sign = if delta.x >= 0.0 { 1.0 } else { -1.0 };
        Some(Manifold {
            normal: Vec2::new(sign, 0.0),
            depth: depths.x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_offset_moves_with_body() {
        let shape = Shape::rect_at(0.1, 0.1, Vec2::new(0.2, 0.0));
        let placed = shape.to_world(Vec2::new(1.0, 1.0));
        assert_relative_eq!(placed.center().x, 1.2);
        assert_relative_eq!(placed.center().y, 1.0);
    }

    #[test]
    fn test_circle_rect_intersection_uses_closest_point() {
        let rect = WorldShape::Rect(Aabb::from_center(Vec2::zeros(), Vec2::new(1.0, 1.0)));
        let near_corner = WorldShape::Circle {
            center: Vec2::new(1.5, 1.5),
            radius: 0.5,
        };
        // The bounding boxes touch but the circle misses the corner.
        assert!(!rect.intersects(&near_corner, 0.0));

        let on_edge = WorldShape::Circle {
            center: Vec2::new(1.4, 0.0),
            radius: 0.5,
        };
        assert!(rect.intersects(&on_edge, 0.0));
    }

    #[test]
    fn test_manifold_prefers_shallow_axis() {
        let ground = Aabb::from_center(Vec2::zeros(), Vec2::new(5.0, 0.5));
        let body = Aabb::from_center(Vec2::new(0.3, 0.6), Vec2::new(0.1, 0.16));
        let m = manifold(&body, &ground).unwrap();
        assert_relative_eq!(m.normal.y, 1.0);
        assert_relative_eq!(m.depth, 0.06, epsilon = 1e-5);
    }

    #[test]
    fn test_separated_boxes_have_no_manifold() {
        let a = Aabb::from_center(Vec2::zeros(), Vec2::new(0.1, 0.1));
        let b = Aabb::from_center(Vec2::new(1.0, 0.0), Vec2::new(0.1, 0.1));
        assert!(manifold(&a, &b).is_none());
    }
}
