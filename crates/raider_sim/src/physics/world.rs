//! Rigid-body world with sensor fixtures and contact events
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13. Detection is a
//! brute-force pair sweep (rooms hold a few dozen fixtures); response is a
//! simple impulse + positional correction between axis-aligned solids.
//!
//! Each step:
//! 1. gravity is applied to dynamic bodies
//! 2. solid pairs are gathered and passed through `pre_solve`
//! 3. velocity passes remove approaching normal velocity
//! 4. positions are integrated
//! 5. position passes push overlapping solids apart
//! 6. the touching set is diffed against the previous step and
//!    begin/end events are delivered in fixture-key order

use std::collections::BTreeSet;

use super::collision_layers::CollisionFilter;
use super::contact::{BodyMotion, Contact, ContactListener, ContactSide, ContactView, FixtureTag};
use super::shape::{manifold, Manifold, Shape, WorldShape, LINEAR_SLOP};
use super::PhysicsError;
use crate::config::PhysicsTuning;
use crate::debug::DebugShape;
use crate::foundation::collections::{BodyKey, FixtureKey, SlotMap};
use crate::foundation::math::Vec2;

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Never moves (level geometry)
    Static,
    /// Integrated with gravity and collision response
    Dynamic,
    /// Moves at its set velocity, ignores gravity and pushes
    Kinematic,
}

/// Body creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    /// Body kind
    pub kind: BodyKind,
    /// Initial position (meters)
    pub position: Vec2,
    /// Initial velocity (m/s)
    pub linear_velocity: Vec2,
    /// Multiplier on world gravity (dynamic bodies only)
    pub gravity_scale: f32,
}

impl BodyDef {
    /// Static body at a position
    pub fn fixed(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            position,
            linear_velocity: Vec2::zeros(),
            gravity_scale: 1.0,
        }
    }

    /// Dynamic body at a position
    pub fn dynamic(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Self::fixed(position)
        }
    }

    /// Kinematic body at a position
    pub fn kinematic(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            ..Self::fixed(position)
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the gravity multiplier
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }
}

/// Fixture creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDef {
    /// Local shape
    pub shape: Shape,
    /// Sensors report contacts but get no collision response
    pub is_sensor: bool,
    /// Category and mask
    pub filter: CollisionFilter,
    /// Role tag used by contact routing
    pub tag: FixtureTag,
}

impl FixtureDef {
    /// Solid fixture
    pub fn solid(shape: Shape, filter: CollisionFilter, tag: FixtureTag) -> Self {
        Self {
            shape,
            is_sensor: false,
            filter,
            tag,
        }
    }

    /// Sensor fixture
    pub fn sensor(shape: Shape, filter: CollisionFilter, tag: FixtureTag) -> Self {
        Self {
            shape,
            is_sensor: true,
            filter,
            tag,
        }
    }
}

/// A rigid body
#[derive(Debug, Clone)]
pub struct Body {
    kind: BodyKind,
    pub(super) position: Vec2,
    pub(super) linear_velocity: Vec2,
    gravity_scale: f32,
    fixtures: Vec<FixtureKey>,
}

impl Body {
    /// Body kind
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Position in meters
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity in m/s
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Fixtures attached to this body
    pub fn fixtures(&self) -> &[FixtureKey] {
        &self.fixtures
    }

    fn inverse_mass(&self) -> f32 {
        if self.kind == BodyKind::Dynamic {
            1.0
        } else {
            0.0
        }
    }
}

/// A shape attached to a body
#[derive(Debug, Clone)]
pub struct Fixture {
    body: BodyKey,
    shape: Shape,
    is_sensor: bool,
    filter: CollisionFilter,
    tag: FixtureTag,
}

impl Fixture {
    /// Owning body
    pub fn body(&self) -> BodyKey {
        self.body
    }

    /// Local shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this is a sensor
    pub fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    /// Category and mask
    pub fn filter(&self) -> CollisionFilter {
        self.filter
    }

    /// Role tag
    pub fn tag(&self) -> FixtureTag {
        self.tag
    }

    fn side(&self, key: FixtureKey) -> ContactSide {
        ContactSide {
            fixture: key,
            body: self.body,
            tag: self.tag,
        }
    }
}

/// Fixture pair stored lower key first
type PairKey = (FixtureKey, FixtureKey);

fn pair_key(a: FixtureKey, b: FixtureKey) -> PairKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Solid pair accepted for response this step
struct SolidContact {
    body_a: BodyKey,
    body_b: BodyKey,
    fixture_a: FixtureKey,
    fixture_b: FixtureKey,
    manifold: Manifold,
}

/// Physics world
pub struct PhysicsWorld {
    gravity: Vec2,
    bodies: SlotMap<BodyKey, Body>,
    fixtures: SlotMap<FixtureKey, Fixture>,
    touching: BTreeSet<PairKey>,
    pending_end: Vec<Contact>,
    locked: bool,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: SlotMap::with_key(),
            fixtures: SlotMap::with_key(),
            touching: BTreeSet::new(),
            pending_end: Vec::new(),
            locked: false,
        }
    }

    /// Create an empty world with tuned gravity
    pub fn from_tuning(tuning: &PhysicsTuning) -> Self {
        log::info!("Creating physics world (gravity {:.1} m/s^2)", tuning.gravity_y);
        Self::new(Vec2::new(0.0, tuning.gravity_y))
    }

    /// World gravity
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// True while a step is in progress
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[cfg(test)]
    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live fixtures
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    /// Look up a body
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Look up a fixture
    pub fn fixture(&self, key: FixtureKey) -> Option<&Fixture> {
        self.fixtures.get(key)
    }

    /// Whether the body still exists in this world
    pub fn contains_body(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    /// Whether the fixture still exists in this world
    pub fn contains_fixture(&self, key: FixtureKey) -> bool {
        self.fixtures.contains_key(key)
    }

    /// Whether `fixture` is still in `body`'s fixture list
    pub fn body_has_fixture(&self, body: BodyKey, fixture: FixtureKey) -> bool {
        self.bodies
            .get(body)
            .is_some_and(|b| b.fixtures.contains(&fixture))
    }

    /// Fixture placed in world space
    pub fn world_shape(&self, fixture: FixtureKey) -> Option<WorldShape> {
        world_shape(&self.bodies, &self.fixtures, fixture)
    }

    /// Add a body
    pub fn create_body(&mut self, def: BodyDef) -> Result<BodyKey, PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        Ok(self.bodies.insert(Body {
            kind: def.kind,
            position: def.position,
            linear_velocity: if def.kind == BodyKind::Static {
                Vec2::zeros()
            } else {
                def.linear_velocity
            },
            gravity_scale: def.gravity_scale,
            fixtures: Vec::new(),
        }))
    }

    /// Attach a fixture to a body
    pub fn create_fixture(&mut self, body: BodyKey, def: FixtureDef) -> Result<FixtureKey, PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        if !self.bodies.contains_key(body) {
            return Err(PhysicsError::UnknownBody);
        }
        let key = self.fixtures.insert(Fixture {
            body,
            shape: def.shape,
            is_sensor: def.is_sensor,
            filter: def.filter,
            tag: def.tag,
        });
        if let Some(b) = self.bodies.get_mut(body) {
            b.fixtures.push(key);
        }
        Ok(key)
    }

    /// Remove a fixture, verifying it still belongs to `body`
    pub fn destroy_fixture(&mut self, body: BodyKey, fixture: FixtureKey) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        if !self.bodies.contains_key(body) {
            return Err(PhysicsError::UnknownBody);
        }
        if !self.fixtures.contains_key(fixture) {
            return Err(PhysicsError::UnknownFixture);
        }
        if !self.body_has_fixture(body, fixture) {
            return Err(PhysicsError::FixtureNotOwned);
        }
        self.remove_fixture(fixture);
        Ok(())
    }

    /// Remove a body and every fixture on it
    pub fn destroy_body(&mut self, body: BodyKey) -> Result<(), PhysicsError> {
        if self.locked {
            return Err(PhysicsError::WorldLocked);
        }
        let fixtures = self
            .bodies
            .get(body)
            .ok_or(PhysicsError::UnknownBody)?
            .fixtures
            .clone();
        for fixture in fixtures {
            self.remove_fixture(fixture);
        }
        self.bodies.remove(body);
        Ok(())
    }

    /// Teleport a body
    pub fn set_transform(&mut self, body: BodyKey, position: Vec2) -> Result<(), PhysicsError> {
        let b = self.bodies.get_mut(body).ok_or(PhysicsError::UnknownBody)?;
        b.position = position;
        Ok(())
    }

    fn remove_fixture(&mut self, key: FixtureKey) {
        let Some(removed) = self.fixtures.remove(key) else {
            return;
        };
        if let Some(b) = self.bodies.get_mut(removed.body) {
            b.fixtures.retain(|&f| f != key);
        }

        // Touching pairs end now; listeners hear about it next step.
        let ended: Vec<PairKey> = self
            .touching
            .iter()
            .copied()
            .filter(|&(a, b)| a == key || b == key)
            .collect();
        for pair in ended {
            self.touching.remove(&pair);
            let other_key = if pair.0 == key { pair.1 } else { pair.0 };
            let removed_side = removed.side(key);
            let other_side = match self.fixtures.get(other_key) {
                Some(other) => other.side(other_key),
                None => continue,
            };
            let contact = if key < other_key {
                Contact { a: removed_side, b: other_side }
            } else {
                Contact { a: other_side, b: removed_side }
            };
            self.pending_end.push(contact);
        }
    }

    /// Advance the world by `dt` seconds
    pub fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        self.locked = true;

        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.kind == BodyKind::Dynamic {
                body.linear_velocity += gravity * body.gravity_scale * dt;
            }
        }

        let contacts = self.collect_solid_contacts(listener);

        for _ in 0..velocity_iterations {
            for contact in &contacts {
                self.solve_velocity(contact);
            }
        }

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Static {
                body.position += body.linear_velocity * dt;
            }
        }

        for _ in 0..position_iterations {
            for contact in &contacts {
                self.solve_position(contact);
            }
        }

        self.dispatch_events(listener);
        self.locked = false;
    }

    fn sorted_fixture_keys(&self) -> Vec<FixtureKey> {
        let mut keys: Vec<FixtureKey> = self.fixtures.keys().collect();
        keys.sort_unstable();
        keys
    }

    /// Pairs that may produce contacts: filtered, on different bodies, and
    /// not both static
    fn candidate_pairs(&self, solids_only: bool) -> Vec<PairKey> {
        let keys = self.sorted_fixture_keys();
        let mut pairs = Vec::new();
        for (i, &ka) in keys.iter().enumerate() {
            let fa = &self.fixtures[ka];
            if solids_only && fa.is_sensor {
                continue;
            }
            for &kb in &keys[i + 1..] {
                let fb = &self.fixtures[kb];
                if fa.body == fb.body || (solids_only && fb.is_sensor) {
                    continue;
                }
                if !fa.filter.should_collide(fb.filter) {
                    continue;
                }
                let (Some(ba), Some(bb)) = (self.bodies.get(fa.body), self.bodies.get(fb.body)) else {
                    continue;
                };
                if ba.kind == BodyKind::Static && bb.kind == BodyKind::Static {
                    continue;
                }
                if solids_only && ba.kind != BodyKind::Dynamic && bb.kind != BodyKind::Dynamic {
                    continue;
                }
                pairs.push((ka, kb));
            }
        }
        pairs
    }

    fn contact_for(&self, (ka, kb): PairKey) -> Contact {
        Contact {
            a: self.fixtures[ka].side(ka),
            b: self.fixtures[kb].side(kb),
        }
    }

    fn collect_solid_contacts(&mut self, listener: &mut dyn ContactListener) -> Vec<(SolidContact, Contact)> {
        let mut found = Vec::new();
        for pair in self.candidate_pairs(true) {
            let (Some(sa), Some(sb)) = (self.world_shape(pair.0), self.world_shape(pair.1)) else {
                continue;
            };
            let Some(m) = manifold(&sa.aabb(), &sb.aabb()) else {
                continue;
            };
            let contact = self.contact_for(pair);
            found.push((
                SolidContact {
                    body_a: contact.a.body,
                    body_b: contact.b.body,
                    fixture_a: pair.0,
                    fixture_b: pair.1,
                    manifold: m,
                },
                contact,
            ));
        }

        let view = ContactView::new(&mut self.bodies);
        found.retain(|(_, contact)| listener.pre_solve(contact, &view));
        found
    }

    fn solve_velocity(&mut self, (contact, _): &(SolidContact, Contact)) {
        let (Some(a), Some(b)) = (self.bodies.get(contact.body_a), self.bodies.get(contact.body_b)) else {
            return;
        };
        let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
        let total = inv_a + inv_b;
        if total <= 0.0 {
            return;
        }
        let normal = contact.manifold.normal;
        let approach = (a.linear_velocity - b.linear_velocity).dot(&normal);
        if approach >= 0.0 {
            return;
        }
        let impulse = normal * (-approach / total);
        if let Some(a) = self.bodies.get_mut(contact.body_a) {
            a.linear_velocity += impulse * inv_a;
        }
        if let Some(b) = self.bodies.get_mut(contact.body_b) {
            b.linear_velocity -= impulse * inv_b;
        }
    }

    fn solve_position(&mut self, (contact, _): &(SolidContact, Contact)) {
        let (Some(sa), Some(sb)) = (self.world_shape(contact.fixture_a), self.world_shape(contact.fixture_b)) else {
            return;
        };
        let Some(m) = manifold(&sa.aabb(), &sb.aabb()) else {
            return;
        };
        if m.depth <= 0.0 {
            return;
        }
        let (inv_a, inv_b) = match (self.bodies.get(contact.body_a), self.bodies.get(contact.body_b)) {
            (Some(a), Some(b)) => (a.inverse_mass(), b.inverse_mass()),
            _ => return,
        };
        let total = inv_a + inv_b;
        if total <= 0.0 {
            return;
        }
        let correction = m.normal * (m.depth / total);
        if let Some(a) = self.bodies.get_mut(contact.body_a) {
            a.position += correction * inv_a;
        }
        if let Some(b) = self.bodies.get_mut(contact.body_b) {
            b.position -= correction * inv_b;
        }
    }

    fn dispatch_events(&mut self, listener: &mut dyn ContactListener) {
        let mut now_touching = BTreeSet::new();
        for pair in self.candidate_pairs(false) {
            let (Some(sa), Some(sb)) = (self.world_shape(pair.0), self.world_shape(pair.1)) else {
                continue;
            };
            if sa.intersects(&sb, LINEAR_SLOP) {
                now_touching.insert(pair);
            }
        }

        let mut ended = std::mem::take(&mut self.pending_end);
        ended.extend(
            self.touching
                .difference(&now_touching)
                .map(|&pair| self.contact_for(pair)),
        );
        let began: Vec<Contact> = now_touching
            .difference(&self.touching)
            .map(|&pair| self.contact_for(pair))
            .collect();
        self.touching = now_touching;

        let mut view = ContactView::new(&mut self.bodies);
        for contact in &ended {
            listener.end_contact(contact, &mut view);
        }
        for contact in &began {
            listener.begin_contact(contact, &mut view);
        }
    }

    /// Whether two fixtures are currently touching
    pub fn is_touching(&self, a: FixtureKey, b: FixtureKey) -> bool {
        self.touching.contains(&pair_key(a, b))
    }

    /// Every fixture in world space, for debug drawing
    pub fn debug_shapes(&self) -> Vec<DebugShape> {
        self.sorted_fixture_keys()
            .into_iter()
            .filter_map(|key| {
                let fixture = &self.fixtures[key];
                self.world_shape(key).map(|shape| DebugShape {
                    shape,
                    category: fixture.filter.category,
                    is_sensor: fixture.is_sensor,
                    tag: fixture.tag,
                })
            })
            .collect()
    }
}

fn world_shape(
    bodies: &SlotMap<BodyKey, Body>,
    fixtures: &SlotMap<FixtureKey, Fixture>,
    key: FixtureKey,
) -> Option<WorldShape> {
    let fixture = fixtures.get(key)?;
    let body = bodies.get(fixture.body)?;
    Some(fixture.shape.to_world(body.position))
}

impl BodyMotion for PhysicsWorld {
    fn position(&self, body: BodyKey) -> Option<Vec2> {
        self.bodies.get(body).map(|b| b.position)
    }

    fn linear_velocity(&self, body: BodyKey) -> Option<Vec2> {
        self.bodies.get(body).map(|b| b.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyKey, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            if b.kind != BodyKind::Static {
                b.linear_velocity = velocity;
            }
        }
    }
}
