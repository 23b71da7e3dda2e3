//! Optional invariant checking after each tick
//!
//! Disabled by default. When enabled, the checks look for state that the
//! deferred destruction rules should make impossible: hitboxes whose fixture
//! vanished, live projectiles without a body, dead enemies still registered,
//! an attack sub-phase outside ATTACK and hit points out of range.

use serde::{Deserialize, Serialize};

use crate::combat::{CombatSystem, Damageable, ProjectileState, ProjectileSystem};
use crate::entities::{Actors, AttackPhase, MeleeState, PlayerState, RangedState};
use crate::physics::PhysicsWorld;

/// What happens when a check fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrictMode {
    /// No checks
    #[default]
    Off,
    /// Fix the desync and keep running
    Repair,
    /// Freeze the simulation until [`StrictValidator::unfreeze`]
    Halt,
}

/// Post-tick invariant checker
#[derive(Debug, Clone, Default)]
pub struct StrictValidator {
    mode: StrictMode,
    halted: bool,
    last_error: Option<String>,
}

impl StrictValidator {
    /// Checker in the given mode
    pub fn new(mode: StrictMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Current mode
    pub fn mode(&self) -> StrictMode {
        self.mode
    }

    /// Switch mode; turning checks off also lifts a halt
    pub fn set_mode(&mut self, mode: StrictMode) {
        self.mode = mode;
        if mode == StrictMode::Off {
            self.halted = false;
        }
    }

    /// Whether a failed check froze the simulation
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Resume after a halt and forget the failure
    pub fn unfreeze(&mut self) {
        self.halted = false;
        self.last_error = None;
    }

    /// Run every check; returns false when any failed
    pub fn validate(
        &mut self,
        world: &PhysicsWorld,
        actors: &mut Actors,
        combat: &mut CombatSystem,
        projectiles: &mut ProjectileSystem,
    ) -> bool {
        if self.mode == StrictMode::Off {
            return true;
        }
        let repair = self.mode == StrictMode::Repair;
        let mut failures = Vec::new();

        let dangling: Vec<_> = combat
            .active_hitboxes()
            .filter(|(_, h)| !world.body_has_fixture(h.owner_body(), h.fixture()))
            .map(|(key, _)| key)
            .collect();
        for key in dangling {
            failures.push(format!("hitbox {key:?} lost its fixture"));
            if repair {
                combat.forget(key);
            }
        }

        let orphaned: Vec<_> = projectiles
            .iter()
            .filter(|(_, p)| p.state() == ProjectileState::Alive && !world.contains_body(p.body()))
            .map(|(key, _)| key)
            .collect();
        for key in orphaned {
            failures.push(format!("projectile {key:?} is alive without a body"));
            if repair {
                projectiles.forget(key);
            }
        }

        let dead_melee: Vec<_> = actors
            .melee
            .iter()
            .filter(|(_, e)| e.state() == MeleeState::Dead)
            .map(|(key, _)| key)
            .collect();
        for key in dead_melee {
            failures.push(format!("dead melee enemy {key:?} still registered"));
            if repair {
                actors.melee.remove(key);
            }
        }
        let dead_ranged: Vec<_> = actors
            .ranged
            .iter()
            .filter(|(_, e)| e.state() == RangedState::Dead)
            .map(|(key, _)| key)
            .collect();
        for key in dead_ranged {
            failures.push(format!("dead ranged enemy {key:?} still registered"));
            if repair {
                actors.ranged.remove(key);
            }
        }

        let player = &mut actors.player;
        if player.attack_phase() != AttackPhase::None && player.state() != PlayerState::Attack {
            failures.push(format!(
                "attack phase {:?} outside ATTACK (state {:?})",
                player.attack_phase(),
                player.state()
            ));
            if repair {
                player.reset_attack();
            }
        }

        let mut check_hp = |name: &str, actor: &mut dyn Damageable| {
            let health = actor.health();
            if health.hp() < 0 || health.hp() > health.max_hp() {
                failures.push(format!("{name} hp {} outside 0..={}", health.hp(), health.max_hp()));
                if repair {
                    actor.health_mut().clamp_hp();
                }
            }
        };
        check_hp("player", &mut actors.player);
        for enemy in actors.melee.values_mut() {
            check_hp("melee enemy", enemy);
        }
        for enemy in actors.ranged.values_mut() {
            check_hp("ranged enemy", enemy);
        }

        if failures.is_empty() {
            return true;
        }
        let message = failures.join("; ");
        if repair {
            log::warn!("Strict check repaired: {message}");
        } else {
            log::error!("Strict check failed, halting: {message}");
            self.halted = true;
        }
        self.last_error = Some(message);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatTuning, MeleeAiProfile, PlayerTuning, ProjectileTuning};
    use crate::entities::Player;
    use crate::foundation::math::Vec2;

    fn setup() -> (PhysicsWorld, Actors, CombatSystem, ProjectileSystem) {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let player = Player::spawn(&mut world, Vec2::new(1.0, 1.0), &PlayerTuning::default()).unwrap();
        (
            world,
            Actors::new(player),
            CombatSystem::new(&CombatTuning::default()),
            ProjectileSystem::new(&ProjectileTuning::default()),
        )
    }

    #[test]
    fn test_off_never_fails() {
        let (world, mut actors, mut combat, mut projectiles) = setup();
        actors.player.health_mut().set_hp_unchecked(99);
        let mut strict = StrictValidator::default();
        assert!(strict.validate(&world, &mut actors, &mut combat, &mut projectiles));
    }

    #[test]
    fn test_repair_clamps_hp() {
        let (world, mut actors, mut combat, mut projectiles) = setup();
        actors.player.health_mut().set_hp_unchecked(99);
        let mut strict = StrictValidator::new(StrictMode::Repair);
        assert!(!strict.validate(&world, &mut actors, &mut combat, &mut projectiles));
        assert_eq!(actors.player.health().hp(), 10);
        assert!(!strict.is_halted());
        assert!(strict.last_error().unwrap().contains("player hp"));
        assert!(strict.validate(&world, &mut actors, &mut combat, &mut projectiles));
    }

    #[test]
    fn test_halt_freezes_until_unfreeze() {
        let (mut world, mut actors, mut combat, mut projectiles) = setup();
        let key = actors
            .spawn_melee(&mut world, Vec2::new(3.0, 1.0), &MeleeAiProfile::default())
            .unwrap();
        actors.melee[key].health_mut().set_hp_unchecked(0);
        actors.melee[key].update(1.0 / 60.0, Vec2::new(1.0, 1.0), &mut world);

        let mut strict = StrictValidator::new(StrictMode::Halt);
        assert!(!strict.validate(&world, &mut actors, &mut combat, &mut projectiles));
        assert!(strict.is_halted());
        // Halt leaves the state untouched for inspection
        assert_eq!(actors.melee.len(), 1);

        strict.unfreeze();
        assert!(!strict.is_halted());
        assert!(strict.last_error().is_none());
    }
}
