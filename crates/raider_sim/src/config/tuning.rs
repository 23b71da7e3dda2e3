//! # Simulation Tuning Tables
//!
//! Every feel-related constant of the simulation, grouped per subsystem.
//! Distances are authored in pixels (`*_px`), speeds in meters per second,
//! durations in seconds.
//!
//! ## Categories
//!
//! - **Physics**: gravity, fixed step, solver iterations, stall clamp
//! - **Player**: movement, jump forgiveness windows, dash, attack phases, damage feel
//! - **Combat**: melee hitbox geometry presets, knockback and recoil
//! - **Enemies**: melee and ranged AI profiles
//! - **Projectiles / Relics / Feedback**: impact fx, pickups, hitstop
//! - **Run**: room count, choice-room cadence, enemy budget and drop ramps

use serde::{Deserialize, Serialize};

use super::weapons::{WeaponKind, WeaponTable};
use super::{Config, ConfigError};
use crate::foundation::math::{to_meters, AimY, Facing, Vec2};

/// Fixed-step physics parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// World gravity along y (m/s^2)
    pub gravity_y: f32,
    /// Constant step size in seconds
    pub time_step: f32,
    /// Velocity solver passes per step
    pub velocity_iterations: u32,
    /// Position solver passes per step
    pub position_iterations: u32,
    /// Largest wall-clock delta accepted per call (stall clamp)
    pub max_frame_delta: f32,
    /// Player must be this far above a one-way platform to land on it
    pub one_way_margin_px: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity_y: -25.0,
            time_step: 1.0 / 60.0,
            velocity_iterations: 6,
            position_iterations: 2,
            max_frame_delta: 0.25,
            one_way_margin_px: 18.0,
        }
    }
}

/// Player movement, attack and damage feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Maximum hit points
    pub max_hp: i32,
    /// Collider half width
    pub half_width_px: f32,
    /// Collider half height
    pub half_height_px: f32,

    /// Run speed (m/s)
    pub move_speed: f32,
    /// Launch velocity of a jump (m/s)
    pub jump_velocity: f32,
    /// Grace window after leaving ground
    pub coyote_time: f32,
    /// Tolerance for an early jump press
    pub jump_buffer_time: f32,
    /// Upward velocity multiplier applied on early release
    pub jump_cut_multiplier: f32,
    /// Jump cut only applies above this upward speed
    pub min_cut_velocity: f32,
    /// Terminal fall speed (negative, m/s)
    pub max_fall_speed: f32,

    /// Dash speed (m/s)
    pub dash_speed: f32,
    /// Dash duration
    pub dash_time: f32,
    /// Time between dashes
    pub dash_cooldown: f32,
    /// Whether a dash may cancel attack RECOVERY
    pub dash_cancels_recovery: bool,

    /// Attack STARTUP duration
    pub attack_startup: f32,
    /// Attack ACTIVE duration
    pub attack_active: f32,
    /// Attack RECOVERY duration
    pub attack_recovery: f32,
    /// Minimum time between swings
    pub attack_cooldown: f32,

    /// HURT lock duration
    pub hurt_lock_time: f32,
    /// Invulnerability granted by a hit
    pub invuln_time: f32,
    /// Damage flash duration
    pub flash_time: f32,
    /// Stun applied by a hit
    pub stun_time: f32,

    /// Weapon used for melee swings
    pub melee_weapon: WeaponKind,
    /// Weapon fired with SHOOT
    pub ranged_weapon: WeaponKind,
    /// Projectile spawn offset ahead of the shooter (px, mirrored by facing)
    pub projectile_offset_x_px: f32,
    /// Projectile spawn offset above the shooter center (px)
    pub projectile_offset_y_px: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_hp: 10,
            half_width_px: 10.0,
            half_height_px: 16.0,
            move_speed: 2.6,
            jump_velocity: 9.0,
            coyote_time: 0.10,
            jump_buffer_time: 0.12,
            jump_cut_multiplier: 0.45,
            min_cut_velocity: 1.5,
            max_fall_speed: -12.0,
            dash_speed: 7.5,
            dash_time: 0.12,
            dash_cooldown: 0.25,
            dash_cancels_recovery: true,
            attack_startup: 0.06,
            attack_active: 0.10,
            attack_recovery: 0.14,
            attack_cooldown: 0.10,
            hurt_lock_time: 0.10,
            invuln_time: 0.25,
            flash_time: 0.10,
            stun_time: 0.10,
            melee_weapon: WeaponKind::Chainsword,
            ranged_weapon: WeaponKind::Laspistol,
            projectile_offset_x_px: 14.0,
            projectile_offset_y_px: 10.0,
        }
    }
}

/// Size and placement of a melee hitbox relative to its owner body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxGeometry {
    /// Half width
    pub half_width_px: f32,
    /// Half height
    pub half_height_px: f32,
    /// Forward offset for a neutral swing
    pub offset_x_px: f32,
    /// Vertical offset for a neutral swing
    pub offset_y_px: f32,
    /// Forward offset when aiming up or down
    pub aim_offset_x_px: f32,
    /// Vertical offset when aiming up
    pub aim_up_offset_y_px: f32,
    /// Vertical offset when aiming down
    pub aim_down_offset_y_px: f32,
}

impl HitboxGeometry {
    /// Half extents in meters
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(to_meters(self.half_width_px), to_meters(self.half_height_px))
    }

    /// Local offset in meters for the given facing and aim
    pub fn offset(&self, facing: Facing, aim: AimY) -> Vec2 {
        let (x_px, y_px) = match aim {
            AimY::Neutral => (self.offset_x_px, self.offset_y_px),
            AimY::Up => (self.aim_offset_x_px, self.aim_up_offset_y_px),
            AimY::Down => (self.aim_offset_x_px, self.aim_down_offset_y_px),
        };
        Vec2::new(to_meters(x_px) * facing.sign(), to_meters(y_px))
    }
}

/// Melee resolution constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Time-to-live of every melee hitbox
    pub hitbox_ttl: f32,
    /// Horizontal knockback given to the target (m/s)
    pub knockback_x: f32,
    /// Vertical knockback given to the target (m/s)
    pub knockback_y: f32,
    /// Horizontal recoil given to the attacker (m/s)
    pub recoil_x: f32,
    /// Vertical recoil given to the attacker (m/s)
    pub recoil_y: f32,
    // Tables last so the TOML form stays valid.
    /// Hitbox preset for player swings
    pub player_hitbox: HitboxGeometry,
    /// Hitbox preset for enemy swings
    pub enemy_hitbox: HitboxGeometry,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            hitbox_ttl: 0.10,
            player_hitbox: HitboxGeometry {
                half_width_px: 13.0,
                half_height_px: 9.0,
                offset_x_px: 16.0,
                offset_y_px: 0.0,
                aim_offset_x_px: 10.0,
                aim_up_offset_y_px: 16.0,
                aim_down_offset_y_px: -14.0,
            },
            enemy_hitbox: HitboxGeometry {
                half_width_px: 12.0,
                half_height_px: 8.0,
                offset_x_px: 16.0,
                offset_y_px: 0.0,
                aim_offset_x_px: 10.0,
                aim_up_offset_y_px: 14.0,
                aim_down_offset_y_px: -12.0,
            },
            knockback_x: 3.0,
            knockback_y: 2.0,
            recoil_x: 1.2,
            recoil_y: 0.2,
        }
    }
}

/// Melee enemy AI profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeAiProfile {
    /// Maximum hit points
    pub max_hp: i32,
    /// Damage per swing
    pub damage: i32,
    /// Chase speed (m/s)
    pub chase_speed: f32,
    /// Distance at which the enemy notices the target
    pub aggro_range_px: f32,
    /// Distance at which the enemy starts its windup
    pub attack_range_px: f32,
    /// Windup duration
    pub telegraph_time: f32,
    /// Attack state duration
    pub attack_time: f32,
    /// Recovery after attacking
    pub cooldown_time: f32,
    /// Invulnerability granted by a hit
    pub invuln_time: f32,
    /// Damage flash duration
    pub flash_time: f32,
    /// Stun applied by a hit
    pub stun_time: f32,
    /// Collider half width
    pub half_width_px: f32,
    /// Collider half height
    pub half_height_px: f32,
}

impl Default for MeleeAiProfile {
    fn default() -> Self {
        Self {
            max_hp: 4,
            damage: 1,
            chase_speed: 1.8,
            aggro_range_px: 240.0,
            attack_range_px: 48.0,
            telegraph_time: 0.18,
            attack_time: 0.06,
            cooldown_time: 0.35,
            invuln_time: 0.12,
            flash_time: 0.08,
            stun_time: 0.10,
            half_width_px: 10.0,
            half_height_px: 14.0,
        }
    }
}

impl MeleeAiProfile {
    /// Fast harasser
    pub fn blade() -> Self {
        Self {
            chase_speed: 2.3,
            aggro_range_px: 260.0,
            attack_range_px: 52.0,
            telegraph_time: 0.14,
            attack_time: 0.06,
            cooldown_time: 0.28,
            ..Self::default()
        }
    }

    /// Slow, heavy guard
    pub fn guard() -> Self {
        Self {
            chase_speed: 1.4,
            aggro_range_px: 280.0,
            attack_range_px: 62.0,
            telegraph_time: 0.22,
            attack_time: 0.08,
            cooldown_time: 0.42,
            ..Self::default()
        }
    }
}

/// Ranged enemy AI profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedAiProfile {
    /// Maximum hit points
    pub max_hp: i32,
    /// Distance at which the enemy notices the target
    pub aggro_range_px: f32,
    /// Closer than this the enemy backs off
    pub keep_distance_px: f32,
    /// Retreat speed (m/s)
    pub kite_speed: f32,
    /// Aim windup duration
    pub telegraph_time: f32,
    /// Time between shots
    pub cooldown_time: f32,
    /// Invulnerability granted by a hit
    pub invuln_time: f32,
    /// Damage flash duration
    pub flash_time: f32,
    /// Stun applied by a hit
    pub stun_time: f32,
    /// Projectile damage
    pub projectile_damage: i32,
    /// Projectile speed (m/s)
    pub projectile_speed: f32,
    /// Projectile lifetime
    pub projectile_lifetime: f32,
    /// Collider half width
    pub half_width_px: f32,
    /// Collider half height
    pub half_height_px: f32,
}

impl Default for RangedAiProfile {
    fn default() -> Self {
        Self {
            max_hp: 3,
            aggro_range_px: 340.0,
            keep_distance_px: 160.0,
            kite_speed: 1.6,
            telegraph_time: 0.20,
            cooldown_time: 0.55,
            invuln_time: 0.12,
            flash_time: 0.08,
            stun_time: 0.10,
            projectile_damage: 1,
            projectile_speed: 7.5,
            projectile_lifetime: 1.4,
            half_width_px: 10.0,
            half_height_px: 14.0,
        }
    }
}

/// Projectile flight and impact constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Sensor radius
    pub radius_px: f32,
    /// Duration of the post-impact state
    pub impact_fx_time: f32,
    /// Cooldown suppressing repeat impacts within one contact burst
    pub hit_lock_time: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            radius_px: 3.0,
            impact_fx_time: 0.10,
            hit_lock_time: 0.05,
        }
    }
}

/// Relic pickup and drop constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelicTuning {
    /// Pickup sensor radius
    pub pickup_radius_px: f32,
    /// Roll below this grants bonus projectile damage
    pub damage_weight: f32,
    /// Roll below this (and above the damage weight) grants fire rate
    pub fire_rate_weight: f32,
    /// Fire-rate multiplier per fire-rate relic (applied to cooldowns)
    pub fire_rate_step: f32,
    /// Heal every N enemy hits per lifesteal relic stack
    pub lifesteal_every_hits: u32,
}

impl Default for RelicTuning {
    fn default() -> Self {
        Self {
            pickup_radius_px: 6.0,
            damage_weight: 0.45,
            fire_rate_weight: 0.75,
            fire_rate_step: 0.85,
            lifesteal_every_hits: 5,
        }
    }
}

/// Hit feedback timing owned by the core (camera shake itself is external)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTuning {
    /// Freeze after a projectile hits an enemy
    pub hitstop_projectile: f32,
    /// Freeze after a melee hit lands
    pub hitstop_melee: f32,
}

impl Default for FeedbackTuning {
    fn default() -> Self {
        Self {
            hitstop_projectile: 0.02,
            hitstop_melee: 0.05,
        }
    }
}

/// Run generation: how rooms ramp up over a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTuning {
    /// Rooms per run
    pub total_rooms: usize,
    /// Every N-th room (never the first) is a choice room; 0 disables them
    pub choice_every: usize,
    /// Enemy budget of the first room
    pub base_budget: usize,
    /// Rooms per extra point of budget
    pub budget_ramp_rooms: usize,
    /// Relic drop chance of the first room
    pub base_drop_chance: f32,
    /// Drop chance added per room
    pub drop_chance_step: f32,
    /// Cap on the drop chance added over a run
    pub max_drop_bonus: f32,
    /// Spawn points closer than this to the player are skipped
    pub min_player_distance_px: f32,
}

impl Default for RunTuning {
    fn default() -> Self {
        Self {
            total_rooms: 12,
            choice_every: 4,
            base_budget: 2,
            budget_ramp_rooms: 2,
            base_drop_chance: 0.25,
            drop_chance_step: 0.02,
            max_drop_bonus: 0.25,
            min_player_distance_px: 120.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Physics stepping
    pub physics: PhysicsTuning,
    /// Player controller
    pub player: PlayerTuning,
    /// Melee resolution
    pub combat: CombatTuning,
    /// Default melee enemy profile
    pub melee: MeleeAiProfile,
    /// Default ranged enemy profile
    pub ranged: RangedAiProfile,
    /// Projectile behaviour
    pub projectile: ProjectileTuning,
    /// Relics and pickups
    pub relics: RelicTuning,
    /// Hitstop
    pub feedback: FeedbackTuning,
    /// Room sequence generation
    pub run: RunTuning,
    /// Weapon definitions
    pub weapons: WeaponTable,
}

impl Config for SimConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        if p.time_step <= 0.0 {
            return Err(ConfigError::Invalid("physics.time_step must be positive".to_string()));
        }
        if p.max_frame_delta < p.time_step {
            return Err(ConfigError::Invalid(
                "physics.max_frame_delta must be at least one time_step".to_string(),
            ));
        }
        if self.player.max_hp <= 0 || self.melee.max_hp <= 0 || self.ranged.max_hp <= 0 {
            return Err(ConfigError::Invalid("max_hp values must be positive".to_string()));
        }
        if self.combat.hitbox_ttl <= 0.0 {
            return Err(ConfigError::Invalid("combat.hitbox_ttl must be positive".to_string()));
        }
        if self.melee.attack_range_px > self.melee.aggro_range_px {
            return Err(ConfigError::Invalid(
                "melee.attack_range_px cannot exceed aggro_range_px".to_string(),
            ));
        }
        if self.run.total_rooms == 0 || self.run.budget_ramp_rooms == 0 {
            return Err(ConfigError::Invalid(
                "run.total_rooms and run.budget_ramp_rooms must be positive".to_string(),
            ));
        }
        for (kind, want_melee) in [(self.player.melee_weapon, true), (self.player.ranged_weapon, false)] {
            match self.weapons.get(kind) {
                Some(def) if def.melee == want_melee => {}
                Some(_) => {
                    return Err(ConfigError::Invalid(format!("player weapon {kind:?} is in the wrong slot")));
                }
                None => {
                    return Err(ConfigError::Invalid(format!("player weapon {kind:?} missing from weapon table")));
                }
            }
        }
        self.weapons.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_run_without_rooms_rejected() {
        let mut config = SimConfig::default();
        config.run.total_rooms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_time_step_rejected() {
        let mut config = SimConfig::default();
        config.physics.time_step = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_hitbox_offsets_mirror_with_facing() {
        let geometry = CombatTuning::default().player_hitbox;
        let right = geometry.offset(Facing::Right, AimY::Neutral);
        let left = geometry.offset(Facing::Left, AimY::Neutral);
        assert_relative_eq!(right.x, -left.x);
        assert_relative_eq!(right.x, 0.16);

        let up = geometry.offset(Facing::Right, AimY::Up);
        let down = geometry.offset(Facing::Right, AimY::Down);
        assert_relative_eq!(up.y, 0.16);
        assert_relative_eq!(down.y, -0.14);
        assert_relative_eq!(up.x, 0.10);
    }

    #[test]
    fn test_named_melee_profiles_differ() {
        assert!(MeleeAiProfile::blade().chase_speed > MeleeAiProfile::guard().chase_speed);
        assert_eq!(MeleeAiProfile::guard().max_hp, MeleeAiProfile::default().max_hp);
    }
}
