//! Weapon use
//!
//! Bridges static [`WeaponDefinition`]s to the systems that realise them:
//! melee weapons open a hitbox through the combat resolver, ranged weapons
//! spawn a projectile. Relic modifiers are applied here and nowhere else.

use super::damageable::{ActorId, Faction};
use super::hitbox::MeleeRequest;
use super::projectile::ProjectileSpawn;
use super::projectiles::ProjectileSystem;
use super::system::CombatSystem;
use crate::config::{HitboxGeometry, WeaponDefinition, WeaponKind, WeaponTable};
use crate::foundation::collections::{BodyKey, HitboxKey, ProjectileKey};
use crate::foundation::math::{px_to_meters, AimY, Facing, Vec2};
use crate::physics::{PhysicsError, PhysicsWorld};

/// Bonuses read by weapon use (owned by the relic inventory)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatModifiers {
    /// Added to ranged damage
    pub bonus_projectile_damage: i32,
    /// Multiplies ranged cooldowns (below 1 fires faster)
    pub fire_rate_multiplier: f32,
    /// Extra targets each projectile passes through
    pub pierce: u32,
    /// Heal 1 hp every N melee hits (0 disables)
    pub heal_every_hits: u32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            bonus_projectile_damage: 0,
            fire_rate_multiplier: 1.0,
            pierce: 0,
            heal_every_hits: 0,
        }
    }
}

/// The actor using a weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wielder {
    /// Actor identity
    pub actor: ActorId,
    /// Physics body
    pub body: BodyKey,
    /// Allegiance
    pub faction: Faction,
    /// Facing at the moment of use
    pub facing: Facing,
    /// Vertical aim (melee)
    pub aim: AimY,
    /// Body position (meters)
    pub position: Vec2,
}

/// What a weapon use produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponUse {
    /// Hitbox opened; `None` when the wielder already had one active
    Melee(Option<HitboxKey>),
    /// Projectile fired
    Ranged(ProjectileKey),
}

/// Mutable systems a weapon acts on
pub struct WeaponTargets<'a> {
    /// Physics world
    pub world: &'a mut PhysicsWorld,
    /// Melee resolver
    pub combat: &'a mut CombatSystem,
    /// Projectile owner
    pub projectiles: &'a mut ProjectileSystem,
}

/// Weapon behaviour over an immutable definition table
#[derive(Debug, Clone)]
pub struct WeaponRuntime {
    table: WeaponTable,
    hitbox: HitboxGeometry,
    muzzle_offset: Vec2,
}

impl WeaponRuntime {
    /// Create a runtime
    ///
    /// `muzzle_offset_px` is where projectiles appear relative to the
    /// wielder, for a wielder facing right.
    pub fn new(table: &WeaponTable, hitbox: HitboxGeometry, muzzle_offset_px: (f32, f32)) -> Self {
        Self {
            table: table.clone(),
            hitbox,
            muzzle_offset: px_to_meters(muzzle_offset_px.0, muzzle_offset_px.1),
        }
    }

    /// Definition lookup
    pub fn definition(&self, kind: WeaponKind) -> Option<&WeaponDefinition> {
        self.table.get(kind)
    }

    /// Execute a weapon's primary action
    ///
    /// Returns `Ok(None)` for weapons missing from the table.
    pub fn use_primary(
        &self,
        kind: WeaponKind,
        wielder: &Wielder,
        modifiers: &CombatModifiers,
        targets: WeaponTargets<'_>,
    ) -> Result<Option<WeaponUse>, PhysicsError> {
        let Some(def) = self.table.get(kind) else {
            log::warn!("Weapon {kind:?} is not in the weapon table");
            return Ok(None);
        };

        if def.melee {
            let hitbox = targets.combat.spawn_melee_hitbox(
                targets.world,
                MeleeRequest {
                    owner_body: wielder.body,
                    owner: wielder.actor,
                    faction: wielder.faction,
                    facing: wielder.facing,
                    aim: wielder.aim,
                    damage: def.base_damage,
                    geometry: self.hitbox,
                },
            )?;
            return Ok(Some(WeaponUse::Melee(hitbox)));
        }

        let sign = wielder.facing.sign();
        let spawn = ProjectileSpawn {
            position: wielder.position + Vec2::new(self.muzzle_offset.x * sign, self.muzzle_offset.y),
            velocity: Vec2::new(def.projectile_speed * sign, 0.0),
            faction: wielder.faction,
            damage: def.base_damage + modifiers.bonus_projectile_damage,
            lifetime: def.projectile_lifetime,
            pierce: def.base_pierce + modifiers.pierce,
        };
        let key = targets.projectiles.spawn(targets.world, spawn)?;
        Ok(Some(WeaponUse::Ranged(key)))
    }

    /// Cooldown after using `kind`, with fire-rate modifiers applied to
    /// ranged weapons
    pub fn cooldown_for(&self, kind: WeaponKind, modifiers: &CombatModifiers) -> f32 {
        let base = self.table.cooldown(kind);
        match self.table.get(kind) {
            Some(def) if def.melee => base,
            _ => base * modifiers.fire_rate_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatTuning, ProjectileTuning};
    use crate::physics::{BodyDef, BodyMotion};
    use approx::assert_relative_eq;

    struct Rig {
        world: PhysicsWorld,
        combat: CombatSystem,
        projectiles: ProjectileSystem,
        runtime: WeaponRuntime,
        wielder: Wielder,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = PhysicsWorld::new(Vec2::zeros());
            let body = world.create_body(BodyDef::dynamic(Vec2::new(1.0, 1.0))).unwrap();
            Self {
                world,
                combat: CombatSystem::new(&CombatTuning::default()),
                projectiles: ProjectileSystem::new(&ProjectileTuning::default()),
                runtime: WeaponRuntime::new(&WeaponTable::default(), CombatTuning::default().player_hitbox, (14.0, 10.0)),
                wielder: Wielder {
                    actor: ActorId::Player,
                    body,
                    faction: Faction::Player,
                    facing: Facing::Left,
                    aim: AimY::Neutral,
                    position: Vec2::new(1.0, 1.0),
                },
            }
        }

        fn fire(&mut self, kind: WeaponKind, modifiers: &CombatModifiers) -> Option<WeaponUse> {
            self.runtime
                .use_primary(
                    kind,
                    &self.wielder,
                    modifiers,
                    WeaponTargets {
                        world: &mut self.world,
                        combat: &mut self.combat,
                        projectiles: &mut self.projectiles,
                    },
                )
                .unwrap()
        }
    }

    #[test]
    fn test_ranged_use_applies_modifiers() {
        let mut rig = Rig::new();
        let modifiers = CombatModifiers {
            bonus_projectile_damage: 2,
            pierce: 1,
            ..CombatModifiers::default()
        };
        let Some(WeaponUse::Ranged(key)) = rig.fire(WeaponKind::Bolter, &modifiers) else {
            panic!("bolter should fire a projectile");
        };

        let projectile = rig.projectiles.get(key).unwrap();
        assert_eq!(projectile.damage(), 3);
        assert_eq!(projectile.pierces_left(), 1);

        let body = projectile.body();
        let position = rig.world.position(body).unwrap();
        assert_relative_eq!(position.x, 0.86, epsilon = 1e-5);
        assert_relative_eq!(position.y, 1.10, epsilon = 1e-5);
        assert_relative_eq!(rig.world.linear_velocity(body).unwrap().x, -8.5);
    }

    #[test]
    fn test_melee_use_opens_one_hitbox() {
        let mut rig = Rig::new();
        let modifiers = CombatModifiers::default();
        assert!(matches!(
            rig.fire(WeaponKind::ThunderHammer, &modifiers),
            Some(WeaponUse::Melee(Some(_)))
        ));
        assert_eq!(rig.fire(WeaponKind::ThunderHammer, &modifiers), Some(WeaponUse::Melee(None)));
        let (_, hitbox) = rig.combat.active_hitboxes().next().unwrap();
        assert_eq!(hitbox.damage(), 2);
    }

    #[test]
    fn test_fire_rate_only_scales_ranged_cooldowns() {
        let rig = Rig::new();
        let modifiers = CombatModifiers {
            fire_rate_multiplier: 0.5,
            ..CombatModifiers::default()
        };
        assert_relative_eq!(rig.runtime.cooldown_for(WeaponKind::Bolter, &modifiers), 0.09);
        assert_relative_eq!(rig.runtime.cooldown_for(WeaponKind::ThunderHammer, &modifiers), 0.25);
    }

    #[test]
    fn test_unknown_weapon_cools_down_by_table_fallback() {
        let mut table = WeaponTable::default();
        table.definitions.retain(|d| d.kind != WeaponKind::Laspistol);
        table.fallback_cooldown = 0.4;
        let runtime = WeaponRuntime::new(&table, CombatTuning::default().player_hitbox, (14.0, 10.0));
        let modifiers = CombatModifiers {
            fire_rate_multiplier: 0.5,
            ..CombatModifiers::default()
        };
        assert_relative_eq!(runtime.cooldown_for(WeaponKind::Laspistol, &modifiers), 0.2);
    }
}
