//! Headless arena runner
//!
//! Drives a seeded run of rooms with a scripted bot at a fixed 60 Hz frame
//! rate and logs a summary once per simulated second. Usage:
//!
//! ```text
//! raider_arena [config.toml|config.ron] [seconds]
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use raider_sim::foundation::logging;
use raider_sim::foundation::math::to_pixels;
use raider_sim::foundation::time::FrameTimer;
use raider_sim::prelude::*;
use raider_sim::world::{RoomInstance, RunError};

const FRAME_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_SECONDS: u32 = 60;
const RUN_SEED: u64 = 0x5EED;

#[derive(thiserror::Error, Debug)]
enum ArenaError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Config error: {0}")]
    Config(#[from] raider_sim::config::ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Run has no rooms")]
    EmptyRun,

    #[error("Invalid duration '{0}'")]
    Duration(String),
}

/// Scripted player: walks toward the nearest enemy, swings when close,
/// shoots from range and jumps now and then; with no enemy left it walks to
/// the nearest relic
struct Bot {
    rng: StdRng,
}

impl Bot {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn drive(&mut self, sim: &Simulation, input: &mut InputState) {
        let me = sim.player_view().position_px;
        let nearest = sim
            .enemy_views()
            .into_iter()
            .map(|e| e.position_px.x - me.x)
            .min_by(|a, b| a.abs().total_cmp(&b.abs()));

        let relic = sim
            .pickups()
            .iter()
            .map(|(_, p)| to_pixels(p.position().x) - me.x)
            .min_by(|a, b| a.abs().total_cmp(&b.abs()));

        let (left, right, attack, shoot) = match (nearest, relic) {
            (Some(dx), _) if dx.abs() < 40.0 => (false, false, true, false),
            (Some(dx), _) => (dx < 0.0, dx > 0.0, false, dx.abs() < 300.0 && self.rng.gen_bool(0.2)),
            (None, Some(dx)) => (dx < 0.0, dx > 0.0, false, false),
            (None, None) => (false, false, false, false),
        };
        input.set(Action::MoveLeft, left);
        input.set(Action::MoveRight, right);
        input.set(Action::Attack, attack && !input.is_down(Action::Attack));
        input.set(Action::Shoot, shoot);
        input.set(Action::Jump, self.rng.gen_bool(0.02));
    }
}

fn main() -> Result<(), ArenaError> {
    logging::init("info");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    let seconds = match args.next() {
        Some(s) => s.parse().map_err(|_| ArenaError::Duration(s))?,
        None => DEFAULT_SECONDS,
    };

    let mut run = RunManager::start(RUN_SEED, &config.run, &RoomTemplateRegistry::default())?;
    let room = run.current().map(RoomInstance::spawn).ok_or(ArenaError::EmptyRun)?;
    let mut sim = Simulation::new(config, &LevelLayout::test_level(), &room)?;
    sim.set_strict_mode(StrictMode::Repair);

    let mut bot = Bot::new(RUN_SEED);
    let mut finished = false;
    let mut input = InputState::new();
    let mut totals = FeedbackCounters::new();
    let mut timer = FrameTimer::new();

    for second in 1..=seconds {
        for _ in 0..60 {
            bot.drive(&sim, &mut input);
            let report = sim.tick(&input, FRAME_DELTA)?;
            input.end_frame();
            timer.update();

            for kind in [
                FeedbackKind::PlayerHurt,
                FeedbackKind::EnemyHurt,
                FeedbackKind::MeleeWorld,
                FeedbackKind::ProjectileEnemy,
                FeedbackKind::ProjectileWorld,
            ] {
                totals.add(kind, report.feedback.peek(kind));
            }
            for relic in &report.relics_gained {
                log::info!("Picked up {relic:?}");
            }

            if sim.encounter().can_exit() {
                if sim.advance_room(&mut run)? {
                    input.clear();
                } else {
                    finished = true;
                    break;
                }
            }
        }

        let player = sim.player_view();
        log::info!(
            "t={second}s room {}/{} {:?} | player {:?} hp {}/{} at ({:.0}, {:.0}) | enemies {} | projectiles {} | {:?}",
            run.index() + 1,
            run.len(),
            sim.room_kind(),
            player.state,
            player.hp,
            player.max_hp,
            player.position_px.x,
            player.position_px.y,
            sim.actors().alive_enemy_count(),
            sim.projectiles().len(),
            sim.encounter().state(),
        );
        if let Some(err) = sim.strict().last_error() {
            log::warn!("Strict: {err}");
        }
        if player.state == PlayerState::Dead || finished {
            break;
        }
    }

    log::info!(
        "Ran {} ticks at {:.0} ticks/s wall clock",
        timer.frame_count(),
        timer.average_fps()
    );
    log::info!(
        "Done: reached room {}/{}, {} player hits, {} enemy hits, {} projectile hits, relics {:?}",
        run.index() + 1,
        run.len(),
        totals.player_hurt(),
        totals.enemy_hurt(),
        totals.projectile_enemy(),
        sim.relics().owned()
    );
    Ok(())
}
