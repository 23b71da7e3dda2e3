//! Runs: a seeded sequence of rooms built from templates
//!
//! [`RoomInstanceGenerator`] turns a seed and a [`RoomTemplateRegistry`] into
//! a fixed list of [`RoomInstance`]s; [`RunManager`] walks that list. Each
//! instance produces the [`RoomSpawn`] the simulation loads.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::spawn::RoomSpawn;
use crate::config::RunTuning;
use crate::relics::SEED_SPREAD;

/// Errors raised while building a run
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Nothing to pick rooms from
    #[error("room template registry is empty")]
    NoTemplates,
}

/// What a room asks of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomKind {
    /// Enemies to defeat
    #[default]
    Combat,
    /// Two relics on offer, one may be taken
    Choice,
}

/// Static room layout (px)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Name for logs
    pub id: String,
    /// Where the player enters
    pub entry: (f32, f32),
    /// Enemy spawn points
    pub spawns: Vec<(f32, f32)>,
    /// Where a choice room lays out its two relics
    pub reward_points: Vec<(f32, f32)>,
}

impl RoomTemplate {
    /// Template with no spawn points
    pub fn new(id: impl Into<String>, entry: (f32, f32)) -> Self {
        Self {
            id: id.into(),
            entry,
            spawns: Vec::new(),
            reward_points: Vec::new(),
        }
    }

    /// Add an enemy spawn point (builder style)
    pub fn with_spawn(mut self, x: f32, y: f32) -> Self {
        self.spawns.push((x, y));
        self
    }

    /// Add a choice relic slot (builder style)
    pub fn with_reward(mut self, x: f32, y: f32) -> Self {
        self.reward_points.push((x, y));
        self
    }
}

/// Templates a run draws from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplateRegistry {
    templates: Vec<RoomTemplate>,
}

impl Default for RoomTemplateRegistry {
    /// Three layouts fitted to [`LevelLayout::test_level`](super::LevelLayout::test_level)
    fn default() -> Self {
        let rewards = |t: RoomTemplate| t.with_reward(520.0, 72.0).with_reward(820.0, 72.0);
        let mut registry = Self::new();
        registry.add(rewards(
            RoomTemplate::new("arena", (120.0, 90.0))
                .with_spawn(420.0, 80.0)
                .with_spawn(560.0, 80.0)
                .with_spawn(700.0, 80.0)
                .with_spawn(840.0, 80.0)
                .with_spawn(940.0, 80.0),
        ));
        registry.add(rewards(
            RoomTemplate::new("platforms", (120.0, 90.0))
                .with_spawn(520.0, 200.0)
                .with_spawn(880.0, 170.0)
                .with_spawn(700.0, 80.0)
                .with_spawn(420.0, 80.0)
                .with_spawn(940.0, 80.0),
        ));
        registry.add(rewards(
            RoomTemplate::new("hall", (120.0, 90.0))
                .with_spawn(460.0, 80.0)
                .with_spawn(580.0, 80.0)
                .with_spawn(700.0, 80.0)
                .with_spawn(820.0, 80.0)
                .with_spawn(940.0, 80.0),
        ));
        registry
    }
}

impl RoomTemplateRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self { templates: Vec::new() }
    }

    /// Register a template
    pub fn add(&mut self, template: RoomTemplate) {
        self.templates.push(template);
    }

    /// Remove every template
    pub fn clear(&mut self) {
        self.templates.clear();
    }

    /// Template at `index`
    pub fn get(&self, index: usize) -> Option<&RoomTemplate> {
        self.templates.get(index)
    }

    /// Every template in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RoomTemplate> {
        self.templates.iter()
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// One generated room of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInstance {
    /// Position in the run
    pub index: usize,
    /// Combat or choice
    pub kind: RoomKind,
    /// Seed for drops and choice relics
    pub seed: u64,
    /// Layout the room was built from
    pub template: RoomTemplate,
    /// Enemy budget before the melee/ranged split
    pub budget: usize,
    /// Melee enemies (zero in choice rooms)
    pub melee_count: usize,
    /// Ranged enemies (zero in choice rooms)
    pub ranged_count: usize,
    /// Template spawn points in this room's shuffled order
    pub spawn_order: Vec<(f32, f32)>,
    /// Chance a kill drops a relic
    pub relic_drop_chance: f32,
    /// Spawn points closer than this to the player are skipped
    pub min_player_distance_px: f32,
}

impl RoomInstance {
    /// Spawn data for [`Simulation::load_room`](crate::Simulation::load_room)
    pub fn spawn(&self) -> RoomSpawn {
        RoomSpawn {
            kind: self.kind,
            player_start: self.template.entry,
            points: self.spawn_order.clone(),
            reward_points: self.template.reward_points.clone(),
            melee_count: self.melee_count,
            ranged_count: self.ranged_count,
            relic_drop_chance: self.relic_drop_chance,
            seed: self.seed,
            min_player_distance_px: self.min_player_distance_px,
        }
    }
}

/// Builds the room sequence of a run
#[derive(Debug, Clone, Default)]
pub struct RoomInstanceGenerator {
    tuning: RunTuning,
}

impl RoomInstanceGenerator {
    /// Generator following `tuning`
    pub fn new(tuning: &RunTuning) -> Self {
        Self { tuning: tuning.clone() }
    }

    /// Kind of the `index`-th room
    pub fn kind_at(&self, index: usize) -> RoomKind {
        let every = self.tuning.choice_every;
        if every > 0 && index > 0 && index % every == 0 {
            RoomKind::Choice
        } else {
            RoomKind::Combat
        }
    }

    /// Enemy budget of the `index`-th room
    pub fn budget_at(&self, index: usize) -> usize {
        self.tuning.base_budget + index / self.tuning.budget_ramp_rooms.max(1)
    }

    /// Melee and ranged counts for a combat room with `budget`
    ///
    /// At least one melee enemy; one point of budget is held back from the
    /// ranged share.
    pub fn split(budget: usize) -> (usize, usize) {
        let melee = (budget / 2).max(1);
        let ranged = budget.saturating_sub(melee + 1);
        (melee, ranged)
    }

    /// Relic drop chance of the `index`-th room
    #[allow(clippy::cast_precision_loss)]
    pub fn drop_chance_at(&self, index: usize) -> f32 {
        let t = &self.tuning;
        t.base_drop_chance + (index as f32 * t.drop_chance_step).min(t.max_drop_bonus)
    }

    /// Seed of the `index`-th room of the run seeded with `run_seed`
    pub fn room_seed(run_seed: u64, index: usize) -> u64 {
        run_seed ^ (index as u64).wrapping_mul(SEED_SPREAD)
    }

    /// Generate `total_rooms` rooms; the same seed and registry always give
    /// the same run
    pub fn generate(
        &self,
        seed: u64,
        total_rooms: usize,
        templates: &RoomTemplateRegistry,
    ) -> Result<Vec<RoomInstance>, RunError> {
        if templates.is_empty() {
            return Err(RunError::NoTemplates);
        }
        let mut rng = StdRng::seed_from_u64(seed);

        let rooms = (0..total_rooms)
            .map(|index| {
                let kind = self.kind_at(index);
                let template = &templates.templates[rng.gen_range(0..templates.len())];
                let budget = self.budget_at(index);
                let (melee_count, ranged_count) = match kind {
                    RoomKind::Combat => Self::split(budget),
                    RoomKind::Choice => (0, 0),
                };
                let room_seed = Self::room_seed(seed, index);

                let mut spawn_order = template.spawns.clone();
                spawn_order.shuffle(&mut StdRng::seed_from_u64(room_seed));

                RoomInstance {
                    index,
                    kind,
                    seed: room_seed,
                    template: template.clone(),
                    budget,
                    melee_count,
                    ranged_count,
                    spawn_order,
                    relic_drop_chance: self.drop_chance_at(index),
                    min_player_distance_px: self.tuning.min_player_distance_px,
                }
            })
            .collect();
        Ok(rooms)
    }
}

/// Position within a generated run
#[derive(Debug, Clone, Default)]
pub struct RunManager {
    seed: u64,
    rooms: Vec<RoomInstance>,
    index: usize,
}

impl RunManager {
    /// Generate a run of `tuning.total_rooms` rooms and stand in the first
    pub fn start(seed: u64, tuning: &RunTuning, templates: &RoomTemplateRegistry) -> Result<Self, RunError> {
        let rooms = RoomInstanceGenerator::new(tuning).generate(seed, tuning.total_rooms, templates)?;
        log::info!("Run {seed:#x} started: {} rooms", rooms.len());
        Ok(Self::from_rooms(seed, rooms))
    }

    /// Walk an already generated room list
    pub fn from_rooms(seed: u64, rooms: Vec<RoomInstance>) -> Self {
        Self { seed, rooms, index: 0 }
    }

    /// Room the player is in
    pub fn current(&self) -> Option<&RoomInstance> {
        self.rooms.get(self.index)
    }

    /// Whether another room follows
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.rooms.len()
    }

    /// Move to the next room; false on the last one
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        log::debug!("Run advanced to room {}/{}", self.index + 1, self.rooms.len());
        true
    }

    /// Back to the first room
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Index of the current room
    pub fn index(&self) -> usize {
        self.index
    }

    /// Seed the run was generated from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Every room of the run
    pub fn rooms(&self) -> &[RoomInstance] {
        &self.rooms
    }

    /// Number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// True for a run without rooms
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn generate(seed: u64) -> Vec<RoomInstance> {
        RoomInstanceGenerator::default()
            .generate(seed, 12, &RoomTemplateRegistry::default())
            .unwrap()
    }

    #[test]
    fn test_same_seed_same_run() {
        assert_eq!(generate(99), generate(99));
        assert_ne!(generate(99), generate(100));
    }

    #[test]
    fn test_every_fourth_room_is_a_choice() {
        let rooms = generate(7);
        let choices: Vec<_> = rooms
            .iter()
            .filter(|r| r.kind == RoomKind::Choice)
            .map(|r| r.index)
            .collect();
        assert_eq!(choices, vec![4, 8]);
        assert!(rooms
            .iter()
            .filter(|r| r.kind == RoomKind::Choice)
            .all(|r| r.melee_count == 0 && r.ranged_count == 0));
    }

    #[test]
    fn test_budget_ramps_and_splits() {
        let rooms = generate(7);
        assert_eq!((rooms[0].budget, rooms[0].melee_count, rooms[0].ranged_count), (2, 1, 0));
        assert_eq!((rooms[2].budget, rooms[2].melee_count, rooms[2].ranged_count), (3, 1, 1));
        assert_eq!((rooms[6].budget, rooms[6].melee_count, rooms[6].ranged_count), (5, 2, 2));
        assert_eq!(rooms[11].budget, 7);
    }

    #[test]
    fn test_drop_chance_ramp_is_capped() {
        let generator = RoomInstanceGenerator::default();
        assert_relative_eq!(generator.drop_chance_at(0), 0.25);
        assert_relative_eq!(generator.drop_chance_at(5), 0.35);
        assert_relative_eq!(generator.drop_chance_at(40), 0.50);
    }

    #[test]
    fn test_room_seeds_spread_by_index() {
        let rooms = generate(0xABCD);
        assert_eq!(rooms[0].seed, 0xABCD);
        assert_eq!(rooms[3].seed, 0xABCD ^ (3 * 1_315_423_911));
    }

    #[test]
    fn test_spawn_order_is_a_permutation_of_the_template() {
        for room in generate(3) {
            let mut order = room.spawn_order.clone();
            let mut spawns = room.template.spawns.clone();
            order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            spawns.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            assert_eq!(order, spawns);
        }
    }

    #[test]
    fn test_empty_registry_is_an_error() {
        let result = RoomInstanceGenerator::default().generate(1, 3, &RoomTemplateRegistry::new());
        assert_eq!(result, Err(RunError::NoTemplates));
    }

    #[test]
    fn test_manager_walks_the_run() {
        let mut run = RunManager::start(5, &RunTuning::default(), &RoomTemplateRegistry::default()).unwrap();
        assert_eq!(run.len(), 12);
        assert_eq!(run.current().unwrap().index, 0);
        while run.advance() {}
        assert_eq!(run.index(), 11);
        assert!(!run.has_next());
        assert!(!run.advance());
        run.reset();
        assert_eq!(run.current().unwrap().kind, RoomKind::Combat);

        let spawn = run.current().unwrap().spawn();
        assert_eq!(spawn.kind, RoomKind::Combat);
        assert_eq!(spawn.player_start, (120.0, 90.0));
        assert_eq!(spawn.reward_points.len(), 2);
    }
}
