//! Hit points and damage-feel timers

use crate::foundation::time::tick_down;

/// Per-entity health with invulnerability, flash and stun timers
///
/// All three timers decay linearly toward zero in [`update`](Self::update).
#[derive(Debug, Clone, PartialEq)]
pub struct HealthComponent {
    max_hp: i32,
    hp: i32,
    invuln_timer: f32,
    flash_timer: f32,
    stun_timer: f32,
}

impl HealthComponent {
    /// Full health
    pub fn new(max_hp: i32) -> Self {
        Self {
            max_hp,
            hp: max_hp,
            invuln_timer: 0.0,
            flash_timer: 0.0,
            stun_timer: 0.0,
        }
    }

    /// Decay every timer
    pub fn update(&mut self, delta: f32) {
        tick_down(&mut self.invuln_timer, delta);
        tick_down(&mut self.flash_timer, delta);
        tick_down(&mut self.stun_timer, delta);
    }

    /// Apply damage unless dead or invulnerable
    ///
    /// Negative amounts count as zero; damage never heals. On success the invulnerability and flash timers are set outright while
    /// the stun timer only ever grows: overlapping stuns extend, never shorten.
    /// Returns whether the damage was applied; callers gate side effects such
    /// as knockback on it.
    pub fn try_damage(&mut self, amount: i32, invuln_seconds: f32, flash_seconds: f32, stun_seconds: f32) -> bool {
        if !self.is_alive() || self.is_invulnerable() {
            return false;
        }

        self.hp = self.hp.saturating_sub(amount.max(0)).clamp(0, self.max_hp);
        self.invuln_timer = invuln_seconds;
        self.flash_timer = flash_seconds;
        self.stun_timer = self.stun_timer.max(stun_seconds);
        true
    }

    /// Restore hit points, clamped at max; negative amounts do nothing
    pub fn heal(&mut self, amount: i32) {
        if self.is_alive() {
            self.hp = self.hp.saturating_add(amount.max(0)).min(self.max_hp);
        }
    }

    /// Current hit points
    pub fn hp(&self) -> i32 {
        self.hp
    }

    /// Maximum hit points
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Above zero hit points
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Inside an invulnerability window
    pub fn is_invulnerable(&self) -> bool {
        self.invuln_timer > 0.0
    }

    /// Damage flash active
    pub fn is_flashing(&self) -> bool {
        self.flash_timer > 0.0
    }

    /// Stun active
    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    /// Remaining stun
    pub fn stun_timer(&self) -> f32 {
        self.stun_timer
    }

    /// Remaining invulnerability
    pub fn invuln_timer(&self) -> f32 {
        self.invuln_timer
    }

    /// Force hp back into `0..=max_hp`; returns whether anything changed
    pub(crate) fn clamp_hp(&mut self) -> bool {
        let clamped = self.hp.clamp(0, self.max_hp);
        let changed = clamped != self.hp;
        self.hp = clamped;
        changed
    }

    #[cfg(test)]
    pub(crate) fn set_hp_unchecked(&mut self, hp: i32) {
        self.hp = hp;
    }
}
