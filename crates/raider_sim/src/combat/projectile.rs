//! Projectile record

use super::damageable::Faction;
use crate::foundation::collections::BodyKey;
use crate::foundation::math::Vec2;
use crate::foundation::time::tick_down;

/// Projectile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectileState {
    /// In flight with a live body
    Alive,
    /// Body handed off for destruction; playing the impact effect
    Impact,
}

/// Parameters for a new projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    /// Spawn position (meters)
    pub position: Vec2,
    /// Constant velocity (m/s)
    pub velocity: Vec2,
    /// Shooter allegiance
    pub faction: Faction,
    /// Damage on hit
    pub damage: i32,
    /// Seconds before it expires in flight
    pub lifetime: f32,
    /// Number of damageable targets it passes through
    pub pierce: u32,
}

/// A projectile owned by the projectile system
#[derive(Debug, Clone)]
pub struct Projectile {
    pub(crate) body: BodyKey,
    pub(crate) faction: Faction,
    pub(crate) damage: i32,
    pub(crate) state: ProjectileState,
    pub(crate) time_left: f32,
    pub(crate) hit_lock: f32,
    pub(crate) impact_fx_left: f32,
    pub(crate) impact_queued: bool,
    pub(crate) pierces_left: u32,
    pub(crate) last_position: Vec2,
}

impl Projectile {
    pub(crate) fn new(body: BodyKey, spawn: &ProjectileSpawn) -> Self {
        Self {
            body,
            faction: spawn.faction,
            damage: spawn.damage,
            state: ProjectileState::Alive,
            time_left: spawn.lifetime,
            hit_lock: 0.0,
            impact_fx_left: 0.0,
            impact_queued: false,
            pierces_left: spawn.pierce,
            last_position: spawn.position,
        }
    }

    /// Physics body (gone once the projectile entered `Impact`)
    pub fn body(&self) -> BodyKey {
        self.body
    }

    /// Shooter allegiance
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Damage on hit
    pub fn damage(&self) -> i32 {
        self.damage
    }

    /// Lifecycle state
    pub fn state(&self) -> ProjectileState {
        self.state
    }

    /// Remaining flight time
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// Remaining pierces
    pub fn pierces_left(&self) -> u32 {
        self.pierces_left
    }

    /// Last known position (meters); where the impact effect plays
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    /// Impact waiting for the post-step flush
    pub fn is_impact_queued(&self) -> bool {
        self.impact_queued
    }

    /// Whether a contact right now may register
    pub fn accepts_contact(&self) -> bool {
        self.state == ProjectileState::Alive && self.hit_lock <= 0.0 && !self.impact_queued
    }

    pub(crate) fn tick_alive(&mut self, delta: f32, position: Option<Vec2>) {
        tick_down(&mut self.hit_lock, delta);
        if let Some(p) = position {
            self.last_position = p;
        }
        self.time_left -= delta;
    }

    pub(crate) fn begin_impact(&mut self, fx_time: f32) {
        self.state = ProjectileState::Impact;
        self.impact_fx_left = fx_time;
        self.impact_queued = false;
    }

    pub(crate) fn tick_impact(&mut self, delta: f32) {
        tick_down(&mut self.impact_fx_left, delta);
    }

    pub(crate) fn impact_done(&self) -> bool {
        self.impact_fx_left <= 0.0
    }
}
