//! Physics module: collision world, filtering, contact events and stepping
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13. The world owns
//! every body and fixture; gameplay code holds only generational keys.

pub mod clock;
pub mod collision_layers;
pub mod contact;
pub mod destroy_queue;
pub mod shape;
pub mod world;

pub use clock::FixedTimestep;
pub use collision_layers::{CollisionFilter, CollisionLayers};
pub use contact::{BodyMotion, Contact, ContactListener, ContactSide, ContactView, FixtureTag, NullListener};
pub use destroy_queue::{BodyPurge, DestroyQueue, DestroyTarget};
pub use shape::{Aabb, Shape, WorldShape};
pub use world::{Body, BodyDef, BodyKind, Fixture, FixtureDef, PhysicsWorld};

/// Errors raised by world mutation
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsError {
    /// Creation or destruction attempted during a step
    #[error("world is locked while stepping")]
    WorldLocked,

    /// Body key no longer resolves
    #[error("unknown body")]
    UnknownBody,

    /// Fixture key no longer resolves
    #[error("unknown fixture")]
    UnknownFixture,

    /// Fixture exists but is not attached to the given body
    #[error("fixture is not attached to the given body")]
    FixtureNotOwned,
}
