//! Player controller
//!
//! A discrete state machine over a dynamic body. Horizontal velocity is set
//! directly from input; gravity and collisions own the vertical axis apart
//! from jumps, jump cuts and the fall clamp.

use super::GroundContacts;
use crate::combat::damageable::{ActorId, Damageable, Faction};
use crate::combat::health::HealthComponent;
use crate::config::PlayerTuning;
use crate::foundation::collections::{BodyKey, FixtureKey};
use crate::foundation::math::{px_to_meters, to_meters, to_pixels, AimY, Facing, Vec2, PIXELS_PER_METER};
use crate::foundation::time::tick_down;
use crate::input::{Action, InputState};
use crate::physics::{BodyDef, BodyMotion, CollisionFilter, FixtureDef, FixtureTag, PhysicsError, PhysicsWorld, Shape};

/// Facing only changes outside this input dead zone
const FACING_DEAD_ZONE: f32 = 0.01;
/// Rising faster than this reads as JUMP rather than FALL
const RISING_THRESHOLD: f32 = 0.2;
/// Grounded speed above which the player reads as running
const RUN_THRESHOLD: f32 = 0.05;

/// Foot sensor half extents and offset below the body center (px)
const FOOT_HALF_WIDTH_PX: f32 = 8.0;
const FOOT_HALF_HEIGHT_PX: f32 = 2.0;

/// Player states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    /// Grounded, not moving
    #[default]
    Idle,
    /// Grounded, moving
    Run,
    /// Airborne, rising
    Jump,
    /// Airborne, falling
    Fall,
    /// Dashing
    Dash,
    /// Swinging (see [`AttackPhase`])
    Attack,
    /// Hit, control locked
    Hurt,
    /// Terminal
    Dead,
}

/// Sub-phase of a melee swing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttackPhase {
    /// Not swinging
    #[default]
    None,
    /// Windup
    Startup,
    /// Hitbox live
    Active,
    /// Follow-through
    Recovery,
}

/// The player character
#[derive(Debug)]
pub struct Player {
    body: BodyKey,
    hurtbox: FixtureKey,
    foot_sensor: FixtureKey,
    tuning: PlayerTuning,
    health: HealthComponent,
    state: PlayerState,
    facing: Facing,
    ground: GroundContacts,

    coyote_timer: f32,
    jump_buffer_timer: f32,
    was_jump_down: bool,

    dash_timer: f32,
    dash_cooldown_timer: f32,

    attack_phase: AttackPhase,
    attack_phase_timer: f32,
    attack_cooldown_timer: f32,
    spawn_hitbox_this_frame: bool,

    hurt_timer: f32,
}

impl Player {
    /// Create the player body, hurtbox and foot sensor at `position`
    pub fn spawn(world: &mut PhysicsWorld, position: Vec2, tuning: &PlayerTuning) -> Result<Self, PhysicsError> {
        let body = world.create_body(BodyDef::dynamic(position))?;

        let hurtbox = world.create_fixture(
            body,
            FixtureDef::solid(
                Shape::rect(to_meters(tuning.half_width_px), to_meters(tuning.half_height_px)),
                CollisionFilter::player(),
                FixtureTag::Actor(ActorId::Player),
            ),
        )?;
        let foot_sensor = world.create_fixture(
            body,
            FixtureDef::sensor(
                Shape::rect_at(
                    to_meters(FOOT_HALF_WIDTH_PX),
                    to_meters(FOOT_HALF_HEIGHT_PX),
                    px_to_meters(0.0, -tuning.half_height_px),
                ),
                CollisionFilter::sensor(),
                FixtureTag::GroundSensor(ActorId::Player),
            ),
        )?;

        log::debug!("Player spawned at ({:.0}, {:.0}) px", to_pixels(position.x), to_pixels(position.y));
        Ok(Self {
            body,
            hurtbox,
            foot_sensor,
            tuning: tuning.clone(),
            health: HealthComponent::new(tuning.max_hp),
            state: PlayerState::Idle,
            facing: Facing::Right,
            ground: GroundContacts::default(),
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            was_jump_down: false,
            dash_timer: 0.0,
            dash_cooldown_timer: 0.0,
            attack_phase: AttackPhase::None,
            attack_phase_timer: 0.0,
            attack_cooldown_timer: 0.0,
            spawn_hitbox_this_frame: false,
            hurt_timer: 0.0,
        })
    }

    /// Advance one tick
    pub fn update(&mut self, delta: f32, input: &InputState, bodies: &mut dyn BodyMotion) {
        self.spawn_hitbox_this_frame = false;

        self.health.update(delta);
        if !self.health.is_alive() {
            self.state = PlayerState::Dead;
            self.set_vx(bodies, 0.0);
            return;
        }

        if self.is_grounded() {
            self.coyote_timer = self.tuning.coyote_time;
        } else {
            tick_down(&mut self.coyote_timer, delta);
        }
        if input.is_just_pressed(Action::Jump) {
            self.jump_buffer_timer = self.tuning.jump_buffer_time;
        } else {
            tick_down(&mut self.jump_buffer_timer, delta);
        }
        tick_down(&mut self.dash_cooldown_timer, delta);
        tick_down(&mut self.dash_timer, delta);
        tick_down(&mut self.attack_cooldown_timer, delta);
        tick_down(&mut self.hurt_timer, delta);

        let move_x = input.move_x();
        if let Some(facing) = Facing::from_delta(move_x, FACING_DEAD_ZONE) {
            self.facing = facing;
        }

        if self.state == PlayerState::Hurt {
            self.set_vx(bodies, 0.0);
            if self.hurt_timer <= 0.0 && !self.health.is_stunned() {
                self.state = PlayerState::Idle;
            }
            return;
        }

        self.advance_attack_phase(delta);

        let can_dash = self.dash_cooldown_timer <= 0.0 && self.dash_timer <= 0.0;
        let cancels_recovery = self.tuning.dash_cancels_recovery && self.attack_phase == AttackPhase::Recovery;
        if input.is_just_pressed(Action::Dash)
            && can_dash
            && (self.attack_phase == AttackPhase::None || cancels_recovery)
        {
            self.attack_phase = AttackPhase::None;
            self.attack_phase_timer = 0.0;
            self.state = PlayerState::Dash;
            self.dash_timer = self.tuning.dash_time;
            self.dash_cooldown_timer = self.tuning.dash_cooldown;
            self.set_vx(bodies, self.facing.sign() * self.tuning.dash_speed);
            return;
        }

        if input.is_just_pressed(Action::Attack)
            && self.attack_phase == AttackPhase::None
            && self.attack_cooldown_timer <= 0.0
            && self.dash_timer <= 0.0
        {
            self.state = PlayerState::Attack;
            self.attack_phase = AttackPhase::Startup;
            self.attack_phase_timer = self.tuning.attack_startup;
            self.attack_cooldown_timer = self.tuning.attack_cooldown;
        }

        if self.state == PlayerState::Dash {
            if self.dash_timer > 0.0 {
                self.set_vx(bodies, self.facing.sign() * self.tuning.dash_speed);
                return;
            }
            self.state = PlayerState::Idle;
        }

        let movement_locked = self.attack_phase != AttackPhase::None;
        self.set_vx(bodies, if movement_locked { 0.0 } else { move_x * self.tuning.move_speed });

        if !movement_locked {
            self.jump(input, bodies);
        }

        if let Some(v) = bodies.linear_velocity(self.body) {
            if v.y < self.tuning.max_fall_speed {
                bodies.set_linear_velocity(self.body, Vec2::new(v.x, self.tuning.max_fall_speed));
            }
        }

        self.update_state(bodies);
    }

    fn advance_attack_phase(&mut self, delta: f32) {
        if self.attack_phase == AttackPhase::None {
            return;
        }
        tick_down(&mut self.attack_phase_timer, delta);
        if self.attack_phase_timer > 0.0 {
            return;
        }
        match self.attack_phase {
            AttackPhase::Startup => {
                self.attack_phase = AttackPhase::Active;
                self.attack_phase_timer = self.tuning.attack_active;
                self.spawn_hitbox_this_frame = true;
            }
            AttackPhase::Active => {
                self.attack_phase = AttackPhase::Recovery;
                self.attack_phase_timer = self.tuning.attack_recovery;
            }
            AttackPhase::Recovery => {
                self.attack_phase = AttackPhase::None;
                self.state = PlayerState::Idle;
            }
            AttackPhase::None => {}
        }
    }

    /// Buffered + coyote jump, then the variable-height cut
    fn jump(&mut self, input: &InputState, bodies: &mut dyn BodyMotion) {
        let Some(v) = bodies.linear_velocity(self.body) else {
            return;
        };
        if self.jump_buffer_timer > 0.0 && self.coyote_timer > 0.0 {
            bodies.set_linear_velocity(self.body, Vec2::new(v.x, self.tuning.jump_velocity));
            self.jump_buffer_timer = 0.0;
            self.coyote_timer = 0.0;
            self.was_jump_down = true;
        }

        let jump_down = input.is_down(Action::Jump);
        let released = self.was_jump_down && !jump_down;
        self.was_jump_down = jump_down;

        if released {
            if let Some(v) = bodies.linear_velocity(self.body) {
                if v.y > self.tuning.min_cut_velocity {
                    bodies.set_linear_velocity(self.body, Vec2::new(v.x, v.y * self.tuning.jump_cut_multiplier));
                }
            }
        }
    }

    fn update_state(&mut self, bodies: &dyn BodyMotion) {
        if (self.state == PlayerState::Dash && self.dash_timer > 0.0)
            || self.attack_phase != AttackPhase::None
            || matches!(self.state, PlayerState::Hurt | PlayerState::Dead)
        {
            return;
        }
        let v = bodies.linear_velocity(self.body).unwrap_or_default();
        self.state = if !self.is_grounded() {
            if v.y > RISING_THRESHOLD {
                PlayerState::Jump
            } else {
                PlayerState::Fall
            }
        } else if v.x.abs() > RUN_THRESHOLD {
            PlayerState::Run
        } else {
            PlayerState::Idle
        };
    }

    fn set_vx(&self, bodies: &mut dyn BodyMotion, vx: f32) {
        if let Some(v) = bodies.linear_velocity(self.body) {
            bodies.set_linear_velocity(self.body, Vec2::new(vx, v.y));
        }
    }

    /// Vertical aim from the held aim actions (up wins)
    pub fn aim(input: &InputState) -> AimY {
        if input.is_down(Action::AimUp) {
            AimY::Up
        } else if input.is_down(Action::AimDown) {
            AimY::Down
        } else {
            AimY::Neutral
        }
    }

    /// True only on the tick the swing enters ACTIVE
    pub fn spawn_hitbox_this_frame(&self) -> bool {
        self.spawn_hitbox_this_frame
    }

    /// Current state
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Current attack sub-phase
    pub fn attack_phase(&self) -> AttackPhase {
        self.attack_phase
    }

    /// Facing
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Foot sensor touching ground-like geometry
    pub fn is_grounded(&self) -> bool {
        self.ground.is_grounded()
    }

    /// Foot sensor contact counter
    pub fn ground_contacts(&self) -> &GroundContacts {
        &self.ground
    }

    pub(crate) fn ground_contacts_mut(&mut self) -> &mut GroundContacts {
        &mut self.ground
    }

    /// Hurtbox fixture
    pub fn hurtbox(&self) -> FixtureKey {
        self.hurtbox
    }

    /// Foot sensor fixture
    pub fn foot_sensor(&self) -> FixtureKey {
        self.foot_sensor
    }

    /// Tuning this player was built with
    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning
    }

    /// Drop a desynced swing (strict-mode repair)
    pub(crate) fn reset_attack(&mut self) {
        self.attack_phase = AttackPhase::None;
        self.attack_phase_timer = 0.0;
        self.spawn_hitbox_this_frame = false;
        if self.state == PlayerState::Attack {
            self.state = PlayerState::Idle;
        }
    }

    /// Data snapshot for HUD and animation selection
    pub fn view(&self, bodies: &dyn BodyMotion) -> PlayerView {
        let position = bodies.position(self.body).unwrap_or_default();
        PlayerView {
            state: self.state,
            attack_phase: self.attack_phase,
            position_px: position * PIXELS_PER_METER,
            facing: self.facing,
            hp: self.health.hp(),
            max_hp: self.health.max_hp(),
            flashing: self.health.is_flashing(),
            grounded: self.is_grounded(),
        }
    }
}

impl Damageable for Player {
    fn faction(&self) -> Faction {
        Faction::Player
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
        let t = &self.tuning;
        if !self.health.try_damage(amount, t.invuln_time, t.flash_time, t.stun_time) {
            return false;
        }

        // A hit interrupts swings and dashes.
        self.state = PlayerState::Hurt;
        self.hurt_timer = t.hurt_lock_time;
        self.attack_phase = AttackPhase::None;
        self.attack_phase_timer = 0.0;
        self.dash_timer = 0.0;

        if let Some(v) = bodies.linear_velocity(self.body) {
            bodies.set_linear_velocity(self.body, Vec2::new(knockback.x, v.y + knockback.y));
        }
        true
    }
}

/// Player snapshot for collaborators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    /// Discrete state
    pub state: PlayerState,
    /// Swing sub-phase
    pub attack_phase: AttackPhase,
    /// Body center in pixels
    pub position_px: Vec2,
    /// Facing
    pub facing: Facing,
    /// Hit points
    pub hp: i32,
    /// Maximum hit points
    pub max_hp: i32,
    /// Damage flash active
    pub flashing: bool,
    /// Foot sensor touching ground
    pub grounded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (PhysicsWorld, Player) {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let player = Player::spawn(&mut world, Vec2::new(1.0, 1.0), &PlayerTuning::default()).unwrap();
        (world, player)
    }

    fn velocity(world: &PhysicsWorld, player: &Player) -> Vec2 {
        world.linear_velocity(player.body()).unwrap()
    }

    fn tick(world: &mut PhysicsWorld, player: &mut Player, input: &mut InputState) {
        player.update(DT, input, world);
        input.end_frame();
    }

    #[test]
    fn test_grounded_jump_and_cut() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();

        input.press(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 9.0);

        player.ground_contacts_mut().end();
        input.release(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 9.0 * 0.45);
        assert_eq!(player.state(), PlayerState::Jump);
    }

    #[test]
    fn test_jump_cut_ignored_near_apex() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();
        input.press(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        player.ground_contacts_mut().end();

        world.set_linear_velocity(player.body(), Vec2::new(0.0, 1.0));
        input.release(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 1.0);
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();

        input.press(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 0.0);

        for _ in 0..3 {
            tick(&mut world, &mut player, &mut input);
        }
        player.ground_contacts_mut().begin();
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 9.0);
    }

    #[test]
    fn test_coyote_window_expires() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();
        tick(&mut world, &mut player, &mut input);
        player.ground_contacts_mut().end();

        // 0.1 s of coyote time is gone after 7 airborne ticks
        for _ in 0..7 {
            tick(&mut world, &mut player, &mut input);
        }
        input.press(Action::Jump);
        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).y, 0.0);
    }

    #[test]
    fn test_attack_locks_movement_and_spawns_once() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();
        input.press(Action::MoveRight);
        input.press(Action::Attack);

        let mut spawns = 0;
        let mut ticks = 0;
        loop {
            tick(&mut world, &mut player, &mut input);
            ticks += 1;
            if player.spawn_hitbox_this_frame() {
                spawns += 1;
            }
            if player.attack_phase() == AttackPhase::None {
                break;
            }
            assert_eq!(player.state(), PlayerState::Attack);
            assert_relative_eq!(velocity(&world, &player).x, 0.0);
        }
        assert_eq!(spawns, 1);
        assert!(ticks > 15);

        tick(&mut world, &mut player, &mut input);
        assert_relative_eq!(velocity(&world, &player).x, 2.6);
        assert_eq!(player.state(), PlayerState::Run);
    }

    #[test]
    fn test_dash_cancels_recovery() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();
        input.press(Action::Attack);
        tick(&mut world, &mut player, &mut input);

        // Refused during startup
        input.press(Action::Dash);
        tick(&mut world, &mut player, &mut input);
        input.release(Action::Dash);
        assert_eq!(player.state(), PlayerState::Attack);
        assert_eq!(player.attack_phase(), AttackPhase::Startup);

        while player.attack_phase() != AttackPhase::Recovery {
            tick(&mut world, &mut player, &mut input);
        }

        input.press(Action::Dash);
        tick(&mut world, &mut player, &mut input);
        assert_eq!(player.state(), PlayerState::Dash);
        assert_eq!(player.attack_phase(), AttackPhase::None);
        assert_relative_eq!(velocity(&world, &player).x, 7.5);
    }

    #[test]
    fn test_hurt_locks_until_timers_clear() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        player.ground_contacts_mut().begin();
        input.press(Action::Attack);
        tick(&mut world, &mut player, &mut input);

        assert!(player.apply_damage(2, Vec2::new(3.0, 2.0), &mut world));
        assert_eq!(player.state(), PlayerState::Hurt);
        assert_eq!(player.attack_phase(), AttackPhase::None);
        assert_relative_eq!(velocity(&world, &player).x, 3.0);
        assert_relative_eq!(velocity(&world, &player).y, 2.0);

        input.press(Action::MoveLeft);
        tick(&mut world, &mut player, &mut input);
        assert_eq!(player.state(), PlayerState::Hurt);
        assert_relative_eq!(velocity(&world, &player).x, 0.0);

        for _ in 0..10 {
            tick(&mut world, &mut player, &mut input);
        }
        assert_ne!(player.state(), PlayerState::Hurt);
    }

    #[test]
    fn test_death_is_terminal() {
        let (mut world, mut player) = setup();
        let mut input = InputState::new();
        assert!(player.apply_damage(100, Vec2::zeros(), &mut world));
        input.press(Action::MoveRight);
        input.press(Action::Jump);
        for _ in 0..3 {
            tick(&mut world, &mut player, &mut input);
            assert_eq!(player.state(), PlayerState::Dead);
            assert_relative_eq!(velocity(&world, &player).x, 0.0);
        }
    }
}
