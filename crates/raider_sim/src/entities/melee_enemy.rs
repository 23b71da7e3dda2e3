//! Melee enemy: chase, telegraph, swing, cool down

use super::{set_vx, EnemyStateView, EnemyView};
use crate::combat::damageable::{push_body, Damageable, Faction};
use crate::combat::health::HealthComponent;
use crate::config::MeleeAiProfile;
use crate::foundation::collections::BodyKey;
use crate::foundation::math::{to_pixels, Facing, Vec2, PIXELS_PER_METER};
use crate::physics::BodyMotion;

/// Facing only flips once the target is more than this far aside (px)
const FACING_DEAD_ZONE_PX: f32 = 1.0;

/// Melee AI states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeleeState {
    /// Target out of aggro range
    #[default]
    Idle,
    /// Closing distance
    Chase,
    /// Immobile windup
    Telegraph,
    /// Swing in progress
    Attack,
    /// Recovery after a swing
    Cooldown,
    /// Stunned
    Stagger,
    /// Terminal
    Dead,
}

/// A melee enemy
#[derive(Debug)]
pub struct MeleeEnemy {
    body: BodyKey,
    profile: MeleeAiProfile,
    health: HealthComponent,
    state: MeleeState,
    facing: Facing,
    telegraph_timer: f32,
    attack_timer: f32,
    cooldown_timer: f32,
    attack_started: bool,
}

impl MeleeEnemy {
    pub(crate) fn new(body: BodyKey, profile: &MeleeAiProfile) -> Self {
        Self {
            body,
            profile: profile.clone(),
            health: HealthComponent::new(profile.max_hp),
            state: MeleeState::Idle,
            facing: Facing::Right,
            telegraph_timer: 0.0,
            attack_timer: 0.0,
            cooldown_timer: 0.0,
            attack_started: false,
        }
    }

    /// Advance one tick against a target position (meters)
    pub fn update(&mut self, delta: f32, target: Vec2, bodies: &mut dyn BodyMotion) {
        self.attack_started = false;

        self.health.update(delta);
        if !self.health.is_alive() {
            self.state = MeleeState::Dead;
            set_vx(bodies, self.body, 0.0);
            return;
        }

        if self.health.is_stunned() {
            self.state = MeleeState::Stagger;
            set_vx(bodies, self.body, 0.0);
            return;
        } else if self.state == MeleeState::Stagger {
            self.state = MeleeState::Chase;
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
            MeleeState::Idle => {
                set_vx(bodies, self.body, 0.0);
                if dist_px <= p.aggro_range_px {
                    self.state = MeleeState::Chase;
                }
            }
            MeleeState::Chase => {
                if dist_px > p.aggro_range_px {
                    self.state = MeleeState::Idle;
                } else if dist_px <= p.attack_range_px {
                    self.state = MeleeState::Telegraph;
                    self.telegraph_timer = p.telegraph_time;
                    set_vx(bodies, self.body, 0.0);
                } else {
                    set_vx(bodies, self.body, self.facing.sign() * p.chase_speed);
                }
            }
            MeleeState::Telegraph => {
                self.telegraph_timer -= delta;
                set_vx(bodies, self.body, 0.0);
                if self.telegraph_timer <= 0.0 {
                    self.state = MeleeState::Attack;
                    self.attack_timer = p.attack_time;
                    self.attack_started = true;
                }
            }
            MeleeState::Attack => {
                self.attack_timer -= delta;
                set_vx(bodies, self.body, 0.0);
                if self.attack_timer <= 0.0 {
                    self.state = MeleeState::Cooldown;
                    self.cooldown_timer = p.cooldown_time;
                }
            }
            MeleeState::Cooldown => {
                self.cooldown_timer -= delta;
                set_vx(bodies, self.body, 0.0);
                if self.cooldown_timer <= 0.0 {
                    self.state = MeleeState::Chase;
                }
            }
            MeleeState::Stagger | MeleeState::Dead => {}
        }
    }

    /// True only on the tick ATTACK was entered
    pub fn attack_started_this_frame(&self) -> bool {
        self.attack_started
    }

    /// Windup progress in [0, 1]; 0 outside TELEGRAPH
    pub fn telegraph_progress(&self) -> f32 {
        if self.state != MeleeState::Telegraph || self.profile.telegraph_time <= 0.0 {
            return 0.0;
        }
        1.0 - self.telegraph_timer.max(0.0) / self.profile.telegraph_time
    }

    /// Current state
    pub fn state(&self) -> MeleeState {
        self.state
    }

    /// Facing
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Damage per swing
    pub fn damage(&self) -> i32 {
        self.profile.damage
    }

    /// AI profile
    pub fn profile(&self) -> &MeleeAiProfile {
        &self.profile
    }

    /// Data snapshot for collaborators
    pub fn view(&self, bodies: &dyn BodyMotion) -> EnemyView {
        EnemyView {
            state: EnemyStateView::Melee(self.state),
            position_px: bodies.position(self.body).unwrap_or_default() * PIXELS_PER_METER,
            facing: self.facing,
            hp: self.health.hp(),
            max_hp: self.health.max_hp(),
            flashing: self.health.is_flashing(),
            telegraph_progress: self.telegraph_progress(),
        }
    }
}

impl Damageable for MeleeEnemy {
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
