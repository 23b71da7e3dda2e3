//! Combat: health, melee hitboxes, projectiles and weapons

pub mod damageable;
pub mod health;
pub mod hitbox;
pub mod projectile;
pub mod projectiles;
pub mod system;
pub mod weapons;

pub use damageable::{ActorId, Damageable, Faction};
pub use health::HealthComponent;
pub use hitbox::{Hitbox, MeleeRequest};
pub use projectile::{Projectile, ProjectileSpawn, ProjectileState};
pub use projectiles::{ProjectileHit, ProjectileSystem};
pub use system::{ActorRegistry, CombatSystem, MeleeHit};
pub use weapons::{CombatModifiers, WeaponRuntime, WeaponTargets, WeaponUse, Wielder};
