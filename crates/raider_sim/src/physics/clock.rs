//! Fixed-timestep accumulator
//!
//! Wall-clock deltas are clamped, accumulated and consumed in constant-size
//! physics steps; whatever is left over carries into the next call.

use super::contact::ContactListener;
use super::world::PhysicsWorld;
use crate::config::PhysicsTuning;

/// Advances a [`PhysicsWorld`] in equal increments
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    time_step: f32,
    velocity_iterations: u32,
    position_iterations: u32,
    max_frame_delta: f32,
    accumulator: f32,
}

impl FixedTimestep {
    /// Create a clock from physics tuning
    pub fn new(tuning: &PhysicsTuning) -> Self {
        Self {
            time_step: tuning.time_step,
            velocity_iterations: tuning.velocity_iterations,
            position_iterations: tuning.position_iterations,
            max_frame_delta: tuning.max_frame_delta,
            accumulator: 0.0,
        }
    }

    /// Constant step size in seconds
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Unconsumed time carried to the next call
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Accumulate `delta` and step the world as many times as it covers
    ///
    /// Returns the number of steps taken (possibly zero).
    pub fn advance(&mut self, delta: f32, world: &mut PhysicsWorld, listener: &mut dyn ContactListener) -> u32 {
        self.accumulator += delta.clamp(0.0, self.max_frame_delta);

        let mut steps = 0;
        while self.accumulator >= self.time_step {
            world.step(
                self.time_step,
                self.velocity_iterations,
                self.position_iterations,
                listener,
            );
            self.accumulator -= self.time_step;
            steps += 1;
        }
        steps
    }
}
