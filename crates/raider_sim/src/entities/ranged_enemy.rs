//! Ranged enemy: keeps its distance, aims, fires

use super::{set_vx, EnemyStateView, EnemyView};
use crate::combat::damageable::{push_body, Damageable, Faction};
use crate::combat::health::HealthComponent;
use crate::config::RangedAiProfile;
use crate::foundation::collections::BodyKey;
use crate::foundation::math::{to_pixels, Facing, Vec2, PIXELS_PER_METER};
use crate::physics::BodyMotion;

const FACING_DEAD_ZONE_PX: f32 = 1.0;

/// Ranged AI states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RangedState {
    /// Target out of aggro range
    #[default]
    Idle,
    /// Backing off or holding position
    Kite,
    /// Aiming
    Telegraph,
    /// Firing (lasts one tick)
    Shoot,
    /// Reloading
    Cooldown,
    /// Stunned
    Stagger,
    /// Terminal
    Dead,
}

/// A ranged enemy
#[derive(Debug)]
pub struct RangedEnemy {
    body: BodyKey,
    profile: RangedAiProfile,
    health: HealthComponent,
    state: RangedState,
    facing: Facing,
    telegraph_timer: f32,
    cooldown_timer: f32,
    shot: bool,
}

impl RangedEnemy {
    pub(crate) fn new(body: BodyKey, profile: &RangedAiProfile) -> Self {
        Self {
            body,
            profile: profile.clone(),
            health: HealthComponent::new(profile.max_hp),
            state: RangedState::Idle,
            facing: Facing::Right,
            telegraph_timer: 0.0,
            cooldown_timer: 0.0,
            shot: false,
        }
    }

    /// Advance one tick against a target position (meters)
    pub fn update(&mut self, delta: f32, target: Vec2, bodies: &mut dyn BodyMotion) {
        self.shot = false;

        self.health.update(delta);
        if !self.health.is_alive() {
            self.state = RangedState::Dead;
            set_vx(bodies, self.body, 0.0);
            return;
        }

        if self.health.is_stunned() {
            self.state = RangedState::Stagger;
            set_vx(bodies, self.body, 0.0);
            return;
        } else if self.state == RangedState::Stagger {
            self.state = RangedState::Kite;
        }

        let Some(position) = bodies.position(self.body) else {
            return;
        };
        let dx_px = to_pixels(target.x - position.x);
        let dist_px = dx_px.abs();
        if let Some(facing) = Facing::from_delta(dx_px, FACING_DEAD_ZONE_PX) {
            self.facing = facing;
        }

        let p = &self.profile;
        match self.state {
            RangedState::Idle => {
                set_vx(bodies, self.body, 0.0);
                if dist_px <= p.aggro_range_px {
                    self.state = RangedState::Kite;
                }
            }
            RangedState::Kite => {
                if dist_px > p.aggro_range_px {
                    self.state = RangedState::Idle;
                } else if dist_px < p.keep_distance_px {
                    set_vx(bodies, self.body, -self.facing.sign() * p.kite_speed);
                } else {
                    set_vx(bodies, self.body, 0.0);
                    self.state = RangedState::Telegraph;
                    self.telegraph_timer = p.telegraph_time;
                }
            }
            RangedState::Telegraph => {
                self.telegraph_timer -= delta;
                set_vx(bodies, self.body, 0.0);
                if self.telegraph_timer <= 0.0 {
                    self.state = RangedState::Shoot;
                    self.shot = true;
                }
            }
            RangedState::Shoot => {
                self.state = RangedState::Cooldown;
                self.cooldown_timer = p.cooldown_time;
            }
            RangedState::Cooldown => {
                self.cooldown_timer -= delta;
                set_vx(bodies, self.body, 0.0);
                if self.cooldown_timer <= 0.0 {
                    self.state = RangedState::Kite;
                }
            }
            RangedState::Stagger | RangedState::Dead => {}
        }
    }

    /// True only on the tick SHOOT was entered
    pub fn shot_this_frame(&self) -> bool {
        self.shot
    }

    /// Aim progress in [0, 1]; 0 outside TELEGRAPH
    pub fn telegraph_progress(&self) -> f32 {
        if self.state != RangedState::Telegraph || self.profile.telegraph_time <= 0.0 {
            return 0.0;
        }
        1.0 - self.telegraph_timer.max(0.0) / self.profile.telegraph_time
    }

    /// Current state
    pub fn state(&self) -> RangedState {
        self.state
    }

    /// Facing
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// AI profile
    pub fn profile(&self) -> &RangedAiProfile {
        &self.profile
    }

    /// Data snapshot for collaborators
    pub fn view(&self, bodies: &dyn BodyMotion) -> EnemyView {
        EnemyView {
            state: EnemyStateView::Ranged(self.state),
            position_px: bodies.position(self.body).unwrap_or_default() * PIXELS_PER_METER,
            facing: self.facing,
            hp: self.health.hp(),
            max_hp: self.health.max_hp(),
            flashing: self.health.is_flashing(),
            telegraph_progress: self.telegraph_progress(),
        }
    }
}

impl Damageable for RangedEnemy {
    fn faction(&self) -> Faction {
        Faction::Enemy
    }

    fn body(&self) -> BodyKey {
        self.body
    }

    fn health(&self) -> &HealthComponent {
        &self.health
    }

    fn health_mut(&mut self) -> &mut HealthComponent {
        &mut self.health
    }

    fn apply_damage(&mut self, amount: i32, knockback: Vec2, bodies: &mut dyn BodyMotion) -> bool {
        let p = &self.profile;
        if !self.health.try_damage(amount, p.invuln_time, p.flash_time, p.stun_time) {
            return false;
        }
        push_body(bodies, self.body, knockback);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::px_to_meters;
    use crate::physics::{BodyDef, PhysicsWorld};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (PhysicsWorld, RangedEnemy) {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let body = world.create_body(BodyDef::dynamic(Vec2::zeros())).unwrap();
        (world, RangedEnemy::new(body, &RangedAiProfile::default()))
    }

    #[test]
    fn test_kites_away_when_too_close() {
        let (mut world, mut enemy) = setup();
        let target = px_to_meters(100.0, 0.0);
        enemy.update(DT, target, &mut world);
        assert_eq!(enemy.state(), RangedState::Kite);
        enemy.update(DT, target, &mut world);
        assert_eq!(enemy.state(), RangedState::Kite);
        assert_relative_eq!(world.linear_velocity(enemy.body()).unwrap().x, -1.6);
    }

    #[test]
    fn test_shoot_is_single_tick_edge() {
        let (mut world, mut enemy) = setup();
        let target = px_to_meters(-200.0, 0.0);
        let mut shots = 0;
        let mut states = Vec::new();
        // Long enough for one full cycle but not a second shot
        for _ in 0..40 {
            enemy.update(DT, target, &mut world);
            if enemy.shot_this_frame() {
                shots += 1;
                assert_eq!(enemy.state(), RangedState::Shoot);
            }
            states.push(enemy.state());
        }
        assert_eq!(shots, 1);
        assert_eq!(states.iter().filter(|&&s| s == RangedState::Shoot).count(), 1);
        assert_eq!(enemy.facing(), Facing::Left);
    }

    #[test]
    fn test_stagger_resolves_to_kite() {
        let (mut world, mut enemy) = setup();
        let target = px_to_meters(200.0, 0.0);
        enemy.update(DT, target, &mut world);
        assert!(enemy.apply_damage(1, Vec2::zeros(), &mut world));
        enemy.update(DT, target, &mut world);
        assert_eq!(enemy.state(), RangedState::Stagger);
        for _ in 0..7 {
            enemy.update(DT, target, &mut world);
        }
        // Back in the kite loop, which holds position and starts aiming
        assert_eq!(enemy.state(), RangedState::Telegraph);
    }
}
