//! # Raider Sim
//!
//! Fixed-timestep core of a 2D action-combat game: a collision world with
//! category/mask filtering and one-way platforms, deferred destruction,
//! melee hitboxes, projectiles, a player controller and two enemy state
//! machines, strung into seeded runs of combat and choice rooms. Rendering,
//! audio and input devices live in the host.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use raider_sim::prelude::*;
//!
//! fn main() -> Result<(), SimError> {
//!     let mut sim = Simulation::new(SimConfig::default(), &LevelLayout::test_level(), &RoomSpawn::default())?;
//!     let mut input = InputState::new();
//!     input.press(Action::MoveRight);
//!     let report = sim.tick(&input, 1.0 / 60.0)?;
//!     println!("{} steps, player at {:?}", report.steps, sim.player_view().position_px);
//!     Ok(())
//! }
//! ```

pub mod foundation;
pub mod config;
pub mod physics;
pub mod combat;
pub mod entities;
pub mod events;
pub mod input;
pub mod relics;
pub mod world;
pub mod sim;
pub mod debug;

pub use sim::{Simulation, TickReport};

/// Errors surfaced by simulation setup and ticking
#[derive(thiserror::Error, Debug)]
pub enum SimError {
    /// Body or fixture creation failed
    #[error("Physics error: {0}")]
    Physics(#[from] physics::PhysicsError),

    /// Configuration failed to load or validate
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Run generation failed
    #[error("Run error: {0}")]
    Run(#[from] world::RunError),
}

/// Common imports for simulation hosts
pub mod prelude {
    pub use crate::{
        SimError, Simulation, TickReport,
        combat::{ActorId, CombatModifiers, Damageable, Faction, HealthComponent},
        config::{Config, SimConfig, WeaponKind},
        debug::{DebugColors, DebugShape},
        entities::{EnemyView, PlayerState, PlayerView},
        events::{FeedbackCounters, FeedbackKind},
        foundation::math::{AimY, Facing, Vec2, PIXELS_PER_METER},
        input::{Action, InputState},
        relics::RelicKind,
        sim::StrictMode,
        world::{EncounterState, LevelLayout, RoomKind, RoomSpawn, RoomTemplateRegistry, RunManager},
    };
}
