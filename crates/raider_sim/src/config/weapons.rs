//! Weapon definitions
//!
//! One immutable table built at startup; systems receive it by reference.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Known weapons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Standard-issue melee blade
    Chainsword,
    /// Heavy melee hammer
    ThunderHammer,
    /// Standard-issue sidearm
    Laspistol,
    /// Rapid-fire ranged weapon
    Bolter,
}

/// Static weapon data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Which weapon this describes
    pub kind: WeaponKind,
    /// Melee weapons open a hitbox, ranged ones fire a projectile
    pub melee: bool,
    /// Damage before modifiers
    pub base_damage: i32,
    /// Seconds between uses before modifiers
    pub cooldown: f32,
    /// Projectile speed (m/s, ranged only)
    pub projectile_speed: f32,
    /// Projectile lifetime (ranged only)
    pub projectile_lifetime: f32,
    /// Targets passed through before modifiers (ranged only)
    pub base_pierce: u32,
}

impl WeaponDefinition {
    fn melee(kind: WeaponKind, base_damage: i32, cooldown: f32) -> Self {
        Self {
            kind,
            melee: true,
            base_damage,
            cooldown,
            projectile_speed: 0.0,
            projectile_lifetime: 0.0,
            base_pierce: 0,
        }
    }

    fn ranged(kind: WeaponKind, base_damage: i32, cooldown: f32, speed: f32, lifetime: f32) -> Self {
        Self {
            kind,
            melee: false,
            base_damage,
            cooldown,
            projectile_speed: speed,
            projectile_lifetime: lifetime,
            base_pierce: 0,
        }
    }
}

/// Every weapon the simulation knows about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTable {
    /// Cooldown for a kind missing from `definitions`
    pub fallback_cooldown: f32,
    /// Definitions, one per kind
    pub definitions: Vec<WeaponDefinition>,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            fallback_cooldown: 0.25,
            definitions: vec![
                WeaponDefinition::melee(WeaponKind::Chainsword, 1, 0.10),
                WeaponDefinition::melee(WeaponKind::ThunderHammer, 2, 0.25),
                WeaponDefinition::ranged(WeaponKind::Laspistol, 1, 0.28, 8.5, 1.2),
                WeaponDefinition::ranged(WeaponKind::Bolter, 1, 0.18, 8.5, 1.2),
            ],
        }
    }
}

impl WeaponTable {
    /// Definition for `kind`
    pub fn get(&self, kind: WeaponKind) -> Option<&WeaponDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    /// Seconds between uses of `kind` before modifiers
    pub fn cooldown(&self, kind: WeaponKind) -> f32 {
        self.get(kind).map_or(self.fallback_cooldown, |d| d.cooldown)
    }

    /// Reject duplicate kinds and non-positive timings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_cooldown <= 0.0 {
            return Err(ConfigError::Invalid("weapons.fallback_cooldown must be positive".to_string()));
        }
        for (i, def) in self.definitions.iter().enumerate() {
            if self.definitions[..i].iter().any(|d| d.kind == def.kind) {
                return Err(ConfigError::Invalid(format!("weapon {:?} defined twice", def.kind)));
            }
            if def.cooldown <= 0.0 {
                return Err(ConfigError::Invalid(format!("weapon {:?} needs a positive cooldown", def.kind)));
            }
            if !def.melee && (def.projectile_speed <= 0.0 || def.projectile_lifetime <= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "ranged weapon {:?} needs positive projectile speed and lifetime",
                    def.kind
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_table_is_valid_and_complete() {
        let table = WeaponTable::default();
        assert!(table.validate().is_ok());
        let hammer = table.get(WeaponKind::ThunderHammer).unwrap();
        assert!(hammer.melee);
        assert_eq!(hammer.base_damage, 2);
        assert!(!table.get(WeaponKind::Bolter).unwrap().melee);
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let mut table = WeaponTable::default();
        table.definitions.push(table.definitions[0].clone());
        assert!(matches!(table.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_kind_uses_table_fallback() {
        let mut table = WeaponTable::default();
        table.definitions.retain(|d| d.kind != WeaponKind::Bolter);
        table.fallback_cooldown = 0.6;
        assert_relative_eq!(table.cooldown(WeaponKind::Bolter), 0.6);
        assert_relative_eq!(table.cooldown(WeaponKind::Laspistol), 0.28);

        table.fallback_cooldown = 0.0;
        assert!(matches!(table.validate(), Err(ConfigError::Invalid(_))));
    }
}
