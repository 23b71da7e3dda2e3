//! Rooms: level geometry, enemy placement, encounter flow and the run that
//! strings rooms together

pub mod encounter;
pub mod level;
pub mod run;
pub mod spawn;

pub use encounter::{Encounter, EncounterState};
pub use level::{LevelLayout, PlatformKind, PlatformRect};
pub use run::{
    RoomInstance, RoomInstanceGenerator, RoomKind, RoomTemplate, RoomTemplateRegistry, RunError, RunManager,
};
pub use spawn::{RoomSpawn, SpawnManager};
