//! Deferred destruction of bodies and fixtures
//!
//! Gameplay code and contact callbacks never destroy physics objects
//! directly. They queue the request here and [`DestroyQueue::flush`] applies
//! every request in one pass after the step returns.
//!
//! Flushing is best-effort: an entry whose target is already gone is logged
//! and dropped, so the queue can never grow without bound.

use super::world::PhysicsWorld;
use super::PhysicsError;
use crate::foundation::collections::{BodyKey, FixtureKey};

/// World operations the queue needs
pub trait DestroyTarget {
    /// True while a step is in progress
    fn is_locked(&self) -> bool;

    /// Destroy `fixture`, verifying it is still attached to `body`
    fn destroy_fixture(&mut self, body: BodyKey, fixture: FixtureKey) -> Result<(), PhysicsError>;

    /// Destroy `body` and its fixtures
    fn destroy_body(&mut self, body: BodyKey) -> Result<(), PhysicsError>;
}

impl DestroyTarget for PhysicsWorld {
    fn is_locked(&self) -> bool {
        Self::is_locked(self)
    }

    fn destroy_fixture(&mut self, body: BodyKey, fixture: FixtureKey) -> Result<(), PhysicsError> {
        Self::destroy_fixture(self, body, fixture)
    }

    fn destroy_body(&mut self, body: BodyKey) -> Result<(), PhysicsError> {
        Self::destroy_body(self, body)
    }
}

/// Detaches bookkeeping that still references a body about to be destroyed
pub trait BodyPurge {
    /// Forget every hitbox on `body`, returning the fixtures to destroy
    fn purge_for_body(&mut self, body: BodyKey) -> Vec<FixtureKey>;
}

/// Pending removals
#[derive(Debug, Default)]
pub struct DestroyQueue {
    bodies: Vec<BodyKey>,
    fixtures: Vec<(BodyKey, FixtureKey)>,
}

impl DestroyQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body removal (duplicates ignored)
    pub fn queue_body(&mut self, body: BodyKey) {
        if !self.bodies.contains(&body) {
            self.bodies.push(body);
        }
    }

    /// Queue a fixture removal (duplicates ignored)
    pub fn queue_fixture(&mut self, body: BodyKey, fixture: FixtureKey) {
        if !self.fixtures.contains(&(body, fixture)) {
            self.fixtures.push((body, fixture));
        }
    }

    /// Pending body removals
    pub fn pending_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Pending fixture removals
    pub fn pending_fixtures(&self) -> usize {
        self.fixtures.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.fixtures.is_empty()
    }

    /// Drop every pending entry without applying it
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.fixtures.clear();
    }

    /// Apply every queued removal: fixtures first, then bodies
    ///
    /// Does nothing (and keeps every entry) while the world is mid-step.
    /// Returns whether the flush ran.
    pub fn flush(&mut self, world: &mut dyn DestroyTarget, purge: &mut dyn BodyPurge) -> bool {
        if world.is_locked() {
            log::trace!(
                "Destroy flush deferred: world locked ({} bodies, {} fixtures pending)",
                self.bodies.len(),
                self.fixtures.len()
            );
            return false;
        }

        for (body, fixture) in self.fixtures.drain(..) {
            if let Err(e) = world.destroy_fixture(body, fixture) {
                log::debug!("Skipping fixture destroy for {fixture:?}: {e}");
            }
        }

        for body in self.bodies.drain(..) {
            for fixture in purge.purge_for_body(body) {
                if let Err(e) = world.destroy_fixture(body, fixture) {
                    log::debug!("Skipping purged hitbox {fixture:?}: {e}");
                }
            }
            if let Err(e) = world.destroy_body(body) {
                log::debug!("Skipping body destroy for {body:?}: {e}");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;

    /// Stand-in world recording what was destroyed
    #[derive(Default)]
    struct FakeWorld {
        locked: bool,
        bodies: SlotMap<BodyKey, Vec<FixtureKey>>,
        fixtures: SlotMap<FixtureKey, BodyKey>,
        log: Vec<String>,
    }

    impl FakeWorld {
        fn body_with_fixture(&mut self) -> (BodyKey, FixtureKey) {
            let body = self.bodies.insert(Vec::new());
            let fixture = self.fixtures.insert(body);
            self.bodies[body].push(fixture);
            (body, fixture)
        }
    }

    impl DestroyTarget for FakeWorld {
        fn is_locked(&self) -> bool {
            self.locked
        }

        fn destroy_fixture(&mut self, body: BodyKey, fixture: FixtureKey) -> Result<(), PhysicsError> {
            let list = self.bodies.get_mut(body).ok_or(PhysicsError::UnknownBody)?;
            if !list.contains(&fixture) {
                return Err(PhysicsError::FixtureNotOwned);
            }
            list.retain(|&f| f != fixture);
            self.fixtures.remove(fixture);
            self.log.push("fixture".to_string());
            Ok(())
        }

        fn destroy_body(&mut self, body: BodyKey) -> Result<(), PhysicsError> {
            let list = self.bodies.remove(body).ok_or(PhysicsError::UnknownBody)?;
            for f in list {
                self.fixtures.remove(f);
            }
            self.log.push("body".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct PurgeLog {
        purged: Vec<BodyKey>,
        give_back: Vec<FixtureKey>,
    }

    impl BodyPurge for PurgeLog {
        fn purge_for_body(&mut self, body: BodyKey) -> Vec<FixtureKey> {
            self.purged.push(body);
            std::mem::take(&mut self.give_back)
        }
    }

    #[test]
    fn test_flush_while_locked_keeps_entries() {
        let mut world = FakeWorld::default();
        let (body, fixture) = world.body_with_fixture();
        let mut queue = DestroyQueue::new();
        queue.queue_fixture(body, fixture);
        queue.queue_body(body);

        world.locked = true;
        assert!(!queue.flush(&mut world, &mut PurgeLog::default()));
        assert_eq!(queue.pending_bodies(), 1);
        assert_eq!(queue.pending_fixtures(), 1);
        assert!(world.log.is_empty());

        world.locked = false;
        assert!(queue.flush(&mut world, &mut PurgeLog::default()));
        assert!(queue.is_empty());
        assert_eq!(world.log, vec!["fixture", "body"]);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut world = FakeWorld::default();
        let (body, fixture) = world.body_with_fixture();
        let mut queue = DestroyQueue::new();
        queue.queue_body(body);
        queue.queue_body(body);
        queue.queue_fixture(body, fixture);
        queue.queue_fixture(body, fixture);
        assert_eq!(queue.pending_bodies(), 1);
        assert_eq!(queue.pending_fixtures(), 1);
    }

    #[test]
    fn test_stale_entries_are_dropped_without_error() {
        let mut world = FakeWorld::default();
        let (body, fixture) = world.body_with_fixture();
        let mut queue = DestroyQueue::new();
        queue.queue_body(body);
        queue.flush(&mut world, &mut PurgeLog::default());

        // Both now point at a removed body.
        queue.queue_fixture(body, fixture);
        queue.queue_body(body);
        assert!(queue.flush(&mut world, &mut PurgeLog::default()));
        assert!(queue.is_empty());
        assert_eq!(world.log, vec!["body"]);

        // Flushing again is a no-op.
        assert!(queue.flush(&mut world, &mut PurgeLog::default()));
        assert_eq!(world.log.len(), 1);
    }

    #[test]
    fn test_bodies_are_purged_before_destruction() {
        let mut world = FakeWorld::default();
        let (body, hitbox_fixture) = world.body_with_fixture();
        let mut purge = PurgeLog {
            give_back: vec![hitbox_fixture],
            ..PurgeLog::default()
        };
        let mut queue = DestroyQueue::new();
        queue.queue_body(body);
        queue.flush(&mut world, &mut purge);

        assert_eq!(purge.purged, vec![body]);
        assert_eq!(world.log, vec!["fixture", "body"]);
    }

    #[test]
    fn test_real_world_fixture_flush() {
        use crate::combat::damageable::ActorId;
        use crate::foundation::math::Vec2;
        use crate::physics::{BodyDef, CollisionFilter, FixtureDef, FixtureTag, Shape};

        let mut world = PhysicsWorld::new(Vec2::zeros());
        let body = world.create_body(BodyDef::dynamic(Vec2::zeros())).unwrap();
        let fixture = world
            .create_fixture(
                body,
                FixtureDef::sensor(Shape::rect(0.1, 0.1), CollisionFilter::hitbox(), FixtureTag::Actor(ActorId::Player)),
            )
            .unwrap();

        let mut queue = DestroyQueue::new();
        queue.queue_fixture(body, fixture);
        queue.flush(&mut world, &mut PurgeLog::default());
        assert!(!world.contains_fixture(fixture));
        assert!(world.contains_body(body));
    }
}
