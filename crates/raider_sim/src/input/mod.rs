//! Input state consumed by the simulation
//!
//! The host maps devices onto [`Action`]s and feeds press/release edges in;
//! the simulation polls held and just-pressed state once per tick. Per-frame
//! edge flags are cleared by [`InputState::end_frame`] after the tick.

use std::collections::HashSet;

/// Discrete player actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move left
    MoveLeft,
    /// Move right
    MoveRight,
    /// Jump (held for full height)
    Jump,
    /// Melee swing
    Attack,
    /// Fire the ranged weapon
    Shoot,
    /// Dash in the facing direction
    Dash,
    /// Aim melee upward
    AimUp,
    /// Aim melee downward
    AimDown,
}

/// Held and just-pressed state for every action
#[derive(Debug, Clone, Default)]
pub struct InputState {
    down: HashSet<Action>,
    pressed_this_frame: HashSet<Action>,
    released_this_frame: HashSet<Action>,
}

impl InputState {
    /// Nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press; only the first press while up counts as "just pressed"
    pub fn press(&mut self, action: Action) {
        if self.down.insert(action) {
            self.pressed_this_frame.insert(action);
        }
    }

    /// Register a release
    pub fn release(&mut self, action: Action) {
        if self.down.remove(&action) {
            self.released_this_frame.insert(action);
        }
    }

    /// Set held state directly, generating edges as needed
    pub fn set(&mut self, action: Action, held: bool) {
        if held {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    /// Action currently held
    pub fn is_down(&self, action: Action) -> bool {
        self.down.contains(&action)
    }

    /// Action went down since the last `end_frame`
    pub fn is_just_pressed(&self, action: Action) -> bool {
        self.pressed_this_frame.contains(&action)
    }

    /// Action went up since the last `end_frame`
    pub fn is_just_released(&self, action: Action) -> bool {
        self.released_this_frame.contains(&action)
    }

    /// Horizontal axis in [-1, 1]
    pub fn move_x(&self) -> f32 {
        let mut x = 0.0;
        if self.is_down(Action::MoveLeft) {
            x -= 1.0;
        }
        if self.is_down(Action::MoveRight) {
            x += 1.0;
        }
        x
    }

    /// Clear per-frame edges (call after the tick consumed them)
    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.released_this_frame.clear();
    }

    /// Release everything (room transitions)
    pub fn clear(&mut self) {
        self.down.clear();
        self.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut input = InputState::new();
        input.press(Action::Jump);
        assert!(input.is_just_pressed(Action::Jump));
        input.end_frame();
        assert!(input.is_down(Action::Jump));
        assert!(!input.is_just_pressed(Action::Jump));

        // Repeated press while held is not a new edge
        input.press(Action::Jump);
        assert!(!input.is_just_pressed(Action::Jump));

        input.release(Action::Jump);
        assert!(input.is_just_released(Action::Jump));
    }

    #[test]
    fn test_move_axis_cancels() {
        let mut input = InputState::new();
        input.press(Action::MoveLeft);
        assert_eq!(input.move_x(), -1.0);
        input.press(Action::MoveRight);
        assert_eq!(input.move_x(), 0.0);
    }
}
