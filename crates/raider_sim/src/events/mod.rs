//! Feedback events for collaborators
//!
//! Contact callbacks and the tick pipeline bump plain counters; a single
//! consumer (HUD, camera shake, audio) reads each counter once and resets it.

/// Kind of a consumable feedback counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    /// The player lost hp
    PlayerHurt,
    /// An enemy lost hp to a melee hit
    EnemyHurt,
    /// A melee hitbox touched level geometry
    MeleeWorld,
    /// A projectile struck an actor
    ProjectileEnemy,
    /// A projectile struck level geometry
    ProjectileWorld,
}

/// Read-and-reset event counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackCounters {
    player_hurt: u32,
    enemy_hurt: u32,
    melee_world: u32,
    projectile_enemy: u32,
    projectile_world: u32,
}

impl FeedbackCounters {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: FeedbackKind) -> &mut u32 {
        match kind {
            FeedbackKind::PlayerHurt => &mut self.player_hurt,
            FeedbackKind::EnemyHurt => &mut self.enemy_hurt,
            FeedbackKind::MeleeWorld => &mut self.melee_world,
            FeedbackKind::ProjectileEnemy => &mut self.projectile_enemy,
            FeedbackKind::ProjectileWorld => &mut self.projectile_world,
        }
    }

    /// Count one event
    pub fn notify(&mut self, kind: FeedbackKind) {
        self.add(kind, 1);
    }

    /// Count several events
    pub fn add(&mut self, kind: FeedbackKind, count: u32) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(count);
    }

    /// Current value without resetting
    pub fn peek(&self, kind: FeedbackKind) -> u32 {
        match kind {
            FeedbackKind::PlayerHurt => self.player_hurt,
            FeedbackKind::EnemyHurt => self.enemy_hurt,
            FeedbackKind::MeleeWorld => self.melee_world,
            FeedbackKind::ProjectileEnemy => self.projectile_enemy,
            FeedbackKind::ProjectileWorld => self.projectile_world,
        }
    }

    /// Read a counter and reset it to zero
    pub fn consume(&mut self, kind: FeedbackKind) -> u32 {
        std::mem::take(self.slot(kind))
    }

    /// Read every counter and reset them all
    pub fn consume_all(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Player hurt count
    pub fn player_hurt(&self) -> u32 {
        self.player_hurt
    }

    /// Enemy hurt count
    pub fn enemy_hurt(&self) -> u32 {
        self.enemy_hurt
    }

    /// Melee-vs-world count
    pub fn melee_world(&self) -> u32 {
        self.melee_world
    }

    /// Projectile-vs-actor count
    pub fn projectile_enemy(&self) -> u32 {
        self.projectile_enemy
    }

    /// Projectile-vs-world count
    pub fn projectile_world(&self) -> u32 {
        self.projectile_world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_resets_single_counter() {
        let mut counters = FeedbackCounters::new();
        counters.notify(FeedbackKind::EnemyHurt);
        counters.notify(FeedbackKind::EnemyHurt);
        counters.notify(FeedbackKind::PlayerHurt);

        assert_eq!(counters.consume(FeedbackKind::EnemyHurt), 2);
        assert_eq!(counters.consume(FeedbackKind::EnemyHurt), 0);
        assert_eq!(counters.peek(FeedbackKind::PlayerHurt), 1);
    }

    #[test]
    fn test_consume_all_snapshot() {
        let mut counters = FeedbackCounters::new();
        counters.add(FeedbackKind::ProjectileWorld, 3);
        let snapshot = counters.consume_all();
        assert_eq!(snapshot.projectile_world(), 3);
        assert_eq!(counters, FeedbackCounters::default());
    }
}
