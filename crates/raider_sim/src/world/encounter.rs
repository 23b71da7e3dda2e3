//! Room encounter state

/// Encounter phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncounterState {
    /// Enemies remain
    #[default]
    Fight,
    /// Every enemy is down
    Clear,
}

/// Tracks whether the room's fight is over
#[derive(Debug, Clone, Default)]
pub struct Encounter {
    state: EncounterState,
}

impl Encounter {
    /// Start in FIGHT
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to FIGHT (room load)
    pub fn reset(&mut self) {
        self.state = EncounterState::Fight;
    }

    /// CLEAR once no enemy is alive; CLEAR is sticky
    pub fn update(&mut self, alive_enemies: usize) {
        if self.state == EncounterState::Fight && alive_enemies == 0 {
            log::info!("Encounter cleared");
            self.state = EncounterState::Clear;
        }
    }

    /// Current state
    pub fn state(&self) -> EncounterState {
        self.state
    }

    /// The exit may open
    pub fn can_exit(&self) -> bool {
        self.state == EncounterState::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_is_sticky_until_reset() {
        let mut encounter = Encounter::new();
        encounter.update(2);
        assert!(!encounter.can_exit());
        encounter.update(0);
        assert!(encounter.can_exit());
        encounter.update(3);
        assert_eq!(encounter.state(), EncounterState::Clear);
        encounter.reset();
        assert_eq!(encounter.state(), EncounterState::Fight);
    }
}
