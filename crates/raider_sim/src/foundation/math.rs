//! Math utilities and types
//!
//! The simulation runs in meters; every tuning value is authored in pixels
//! and converted at the boundary.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Pixels per physics meter
pub const PIXELS_PER_METER: f32 = 100.0;

/// Convert a pixel distance to meters
#[inline]
pub fn to_meters(pixels: f32) -> f32 {
    pixels / PIXELS_PER_METER
}

/// Convert a meter distance to pixels
#[inline]
pub fn to_pixels(meters: f32) -> f32 {
    meters * PIXELS_PER_METER
}

/// Build a meter-space vector from pixel coordinates
#[inline]
pub fn px_to_meters(x_px: f32, y_px: f32) -> Vec2 {
    Vec2::new(to_meters(x_px), to_meters(y_px))
}

/// Horizontal facing of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Facing -x
    Left,
    /// Facing +x
    #[default]
    Right,
}

impl Facing {
    /// Signed direction (-1 or +1)
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Facing that points along `dx`, or `None` inside the dead zone
    pub fn from_delta(dx: f32, dead_zone: f32) -> Option<Self> {
        if dx < -dead_zone {
            Some(Self::Left)
        } else if dx > dead_zone {
            Some(Self::Right)
        } else {
            None
        }
    }

    /// The opposite facing
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Vertical aim of a melee swing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AimY {
    /// Swing below the attacker
    Down,
    /// Straight ahead
    #[default]
    Neutral,
    /// Swing above the attacker
    Up,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_meter_roundtrip() {
        assert_relative_eq!(to_meters(240.0), 2.4);
        assert_relative_eq!(to_pixels(to_meters(48.0)), 48.0, epsilon = 1e-4);
    }

    #[test]
    fn test_facing_dead_zone() {
        assert_eq!(Facing::from_delta(0.5, 1.0), None);
        assert_eq!(Facing::from_delta(-3.0, 1.0), Some(Facing::Left));
        assert_eq!(Facing::from_delta(3.0, 1.0), Some(Facing::Right));
        assert_relative_eq!(Facing::Left.flipped().sign(), 1.0);
    }
}
