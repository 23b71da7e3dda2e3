//! Contact events and the listener surface
//!
//! Listeners run synchronously inside [`PhysicsWorld::step`]. They receive a
//! [`ContactView`] which can read body positions and adjust velocities but
//! has no way to create or destroy bodies or fixtures, so the topology of the
//! world cannot change while a step is in progress.
//!
//! [`PhysicsWorld::step`]: super::world::PhysicsWorld::step

use super::world::Body;
use crate::combat::damageable::ActorId;
use crate::foundation::collections::{BodyKey, FixtureKey, HitboxKey, PickupKey, ProjectileKey, SlotMap};
use crate::foundation::math::Vec2;

/// Role of a fixture, attached at creation time
///
/// Contact routing switches on this tag; nothing is identified by string
/// comparison or downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureTag {
    /// Solid level geometry
    Ground,
    /// Platform that can be jumped through from below
    OneWay,
    /// Foot sensor counting ground contacts for an actor
    GroundSensor(ActorId),
    /// Hurtbox of a damageable actor
    Actor(ActorId),
    /// Melee hitbox owned by the combat resolver
    Hitbox(HitboxKey),
    /// Projectile owned by the projectile system
    Projectile(ProjectileKey),
    /// Relic pickup
    Pickup(PickupKey),
    /// Generic trigger volume with no built-in behaviour
    Trigger,
}

impl FixtureTag {
    /// Ground or one-way geometry
    pub fn is_ground_like(self) -> bool {
        matches!(self, Self::Ground | Self::OneWay)
    }
}

/// One participant of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactSide {
    /// Fixture involved
    pub fixture: FixtureKey,
    /// Body owning the fixture
    pub body: BodyKey,
    /// Role tag of the fixture
    pub tag: FixtureTag,
}

/// A pair of touching fixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Side with the lower fixture key
    pub a: ContactSide,
    /// Side with the higher fixture key
    pub b: ContactSide,
}

impl Contact {
    /// Both orderings of the pair, for symmetric dispatch
    pub fn both_ways(&self) -> [(ContactSide, ContactSide); 2] {
        [(self.a, self.b), (self.b, self.a)]
    }
}

/// Read and steer body motion without touching world topology
pub trait BodyMotion {
    /// Body position, `None` once the body is gone
    fn position(&self, body: BodyKey) -> Option<Vec2>;

    /// Body velocity, `None` once the body is gone
    fn linear_velocity(&self, body: BodyKey) -> Option<Vec2>;

    /// Overwrite a body velocity; ignored for missing bodies
    fn set_linear_velocity(&mut self, body: BodyKey, velocity: Vec2);
}

/// Restricted world access handed to contact listeners
pub struct ContactView<'w> {
    bodies: &'w mut SlotMap<BodyKey, Body>,
}

impl<'w> ContactView<'w> {
    pub(super) fn new(bodies: &'w mut SlotMap<BodyKey, Body>) -> Self {
        Self { bodies }
    }
}

impl BodyMotion for ContactView<'_> {
    fn position(&self, body: BodyKey) -> Option<Vec2> {
        self.bodies.get(body).map(|b| b.position)
    }

    fn linear_velocity(&self, body: BodyKey) -> Option<Vec2> {
        self.bodies.get(body).map(|b| b.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyKey, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.linear_velocity = velocity;
        }
    }
}

/// Receiver of contact callbacks during a step
pub trait ContactListener {
    /// Two fixtures started touching
    fn begin_contact(&mut self, _contact: &Contact, _view: &mut ContactView<'_>) {}

    /// Two fixtures stopped touching (or one of them was destroyed)
    fn end_contact(&mut self, _contact: &Contact, _view: &mut ContactView<'_>) {}

    /// Consulted for every solid pair before it is resolved; `false` disables
    /// the collision response for this step only
    fn pre_solve(&mut self, _contact: &Contact, _view: &ContactView<'_>) -> bool {
        true
    }
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl ContactListener for NullListener {}
