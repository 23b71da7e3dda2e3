//! Room spawn data and round-robin enemy placement

use serde::{Deserialize, Serialize};

use super::run::RoomKind;
use crate::combat::Damageable;
use crate::config::{MeleeAiProfile, RangedAiProfile};
use crate::entities::Actors;
use crate::foundation::collections::EnemyKey;
use crate::foundation::math::{px_to_meters, to_pixels};
use crate::physics::{BodyMotion, PhysicsError, PhysicsWorld};

/// Attempts made per requested enemy before giving up on a crowded room
const ATTEMPTS_PER_ENEMY: usize = 8;

/// Spawn data supplied once per room load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSpawn {
    /// Combat rooms spawn enemies, choice rooms offer two relics
    pub kind: RoomKind,
    /// Where the player enters the room (px)
    pub player_start: (f32, f32),
    /// Candidate spawn points (px)
    pub points: Vec<(f32, f32)>,
    /// Choice relic slots (px)
    pub reward_points: Vec<(f32, f32)>,
    /// Melee enemies to place
    pub melee_count: usize,
    /// Ranged enemies to place
    pub ranged_count: usize,
    /// Chance that one killed melee enemy drops a relic
    pub relic_drop_chance: f32,
    /// Seed for drop rolls
    pub seed: u64,
    /// Points closer than this to the player (horizontally, px) are skipped
    pub min_player_distance_px: f32,
}

impl Default for RoomSpawn {
    fn default() -> Self {
        Self {
            kind: RoomKind::Combat,
            player_start: (120.0, 90.0),
            points: vec![(420.0, 80.0), (700.0, 80.0), (880.0, 170.0)],
            reward_points: vec![(520.0, 72.0), (820.0, 72.0)],
            melee_count: 2,
            ranged_count: 1,
            relic_drop_chance: 0.35,
            seed: 0x5EED,
            min_player_distance_px: 120.0,
        }
    }
}

/// Cycles through spawn points so enemies spread across the room
#[derive(Debug, Clone, Default)]
pub struct SpawnManager {
    points: Vec<(f32, f32)>,
    cursor: usize,
}

impl SpawnManager {
    /// Round-robin over `points`
    pub fn new(points: &[(f32, f32)]) -> Self {
        Self {
            points: points.to_vec(),
            cursor: 0,
        }
    }

    /// Next point at least `min_distance_px` from `player_x_px`, or `None`
    /// once every point has been tried without success
    pub fn next_point(&mut self, player_x_px: f32, min_distance_px: f32) -> Option<(f32, f32)> {
        for _ in 0..self.points.len() {
            let point = self.points[self.cursor % self.points.len()];
            self.cursor += 1;
            if (point.0 - player_x_px).abs() >= min_distance_px {
                return Some(point);
            }
        }
        None
    }

    /// Place the room's enemies, melee first, then ranged
    ///
    /// Returns the keys placed; a room whose every point is too close to the
    /// player places fewer than requested. On error every enemy placed by
    /// this call is removed again, so the room is either fully populated or
    /// untouched.
    pub fn populate(
        &mut self,
        world: &mut PhysicsWorld,
        actors: &mut Actors,
        room: &RoomSpawn,
        player_x_px: f32,
        melee: &MeleeAiProfile,
        ranged: &RangedAiProfile,
    ) -> Result<(Vec<EnemyKey>, Vec<EnemyKey>), PhysicsError> {
        let melee_points = self.take_points(room.melee_count, player_x_px, room.min_player_distance_px);
        let ranged_points = self.take_points(room.ranged_count, player_x_px, room.min_player_distance_px);

        let mut melee_keys = Vec::with_capacity(melee_points.len());
        let mut ranged_keys = Vec::with_capacity(ranged_points.len());
        let placed = melee_points
            .iter()
            .try_for_each(|&(x, y)| {
                melee_keys.push(actors.spawn_melee(world, px_to_meters(x, y), melee)?);
                Ok::<_, PhysicsError>(())
            })
            .and_then(|()| {
                ranged_points.iter().try_for_each(|&(x, y)| {
                    ranged_keys.push(actors.spawn_ranged(world, px_to_meters(x, y), ranged)?);
                    Ok::<_, PhysicsError>(())
                })
            });
        if let Err(e) = placed {
            log::error!(
                "Room population failed, removing {} placed enemies: {e}",
                melee_keys.len() + ranged_keys.len()
            );
            remove_enemies(world, actors, &melee_keys, &ranged_keys);
            return Err(e);
        }

        if melee_keys.len() < room.melee_count || ranged_keys.len() < room.ranged_count {
            log::warn!(
                "Room placed {}/{} melee and {}/{} ranged enemies",
                melee_keys.len(),
                room.melee_count,
                ranged_keys.len(),
                room.ranged_count
            );
        }
        Ok((melee_keys, ranged_keys))
    }

    fn take_points(&mut self, count: usize, player_x_px: f32, min_distance_px: f32) -> Vec<(f32, f32)> {
        let mut points = Vec::with_capacity(count);
        for _ in 0..count * ATTEMPTS_PER_ENEMY {
            if points.len() == count {
                break;
            }
            let Some(point) = self.next_point(player_x_px, min_distance_px) else {
                break;
            };
            points.push(point);
        }
        points
    }
}

/// Drop enemies from the room and destroy their bodies (world unlocked)
fn remove_enemies(world: &mut PhysicsWorld, actors: &mut Actors, melee: &[EnemyKey], ranged: &[EnemyKey]) {
    let mut bodies = Vec::with_capacity(melee.len() + ranged.len());
    bodies.extend(melee.iter().filter_map(|&k| actors.melee.remove(k)).map(|e| e.body()));
    bodies.extend(ranged.iter().filter_map(|&k| actors.ranged.remove(k)).map(|e| e.body()));
    for body in bodies {
        if let Err(e) = world.destroy_body(body) {
            log::warn!("Enemy body {body:?} not destroyed: {e}");
        }
    }
}

/// Player x in pixels, for spawn distance checks
pub(crate) fn player_x_px(world: &PhysicsWorld, actors: &Actors) -> f32 {
    world
        .position(actors.player.body())
        .map_or(0.0, |p| to_pixels(p.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerTuning;
    use crate::entities::Player;
    use crate::foundation::math::Vec2;

    fn actors(world: &mut PhysicsWorld) -> Actors {
        let player = Player::spawn(world, Vec2::new(1.0, 1.0), &PlayerTuning::default()).unwrap();
        Actors::new(player)
    }

    #[test]
    fn test_round_robin_skips_points_near_player() {
        let mut spawns = SpawnManager::new(&[(100.0, 0.0), (500.0, 0.0), (900.0, 0.0)]);
        assert_eq!(spawns.next_point(120.0, 100.0), Some((500.0, 0.0)));
        assert_eq!(spawns.next_point(120.0, 100.0), Some((900.0, 0.0)));
        assert_eq!(spawns.next_point(120.0, 100.0), Some((500.0, 0.0)));
    }

    #[test]
    fn test_no_valid_point() {
        let mut spawns = SpawnManager::new(&[(100.0, 0.0)]);
        assert_eq!(spawns.next_point(100.0, 50.0), None);
        assert_eq!(SpawnManager::new(&[]).next_point(0.0, 0.0), None);
    }

    #[test]
    fn test_populate_places_melee_then_ranged() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut actors = actors(&mut world);
        let room = RoomSpawn::default();
        let (melee, ranged) = SpawnManager::new(&room.points)
            .populate(&mut world, &mut actors, &room, 120.0, &MeleeAiProfile::default(), &RangedAiProfile::default())
            .unwrap();
        assert_eq!((melee.len(), ranged.len()), (2, 1));
        assert_eq!(actors.alive_enemy_count(), 3);
        assert_eq!(world.body_count(), 4);
    }

    #[test]
    fn test_failed_populate_leaves_room_untouched() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut actors = actors(&mut world);
        world.set_locked(true);
        let room = RoomSpawn::default();
        let result = SpawnManager::new(&room.points).populate(
            &mut world,
            &mut actors,
            &room,
            120.0,
            &MeleeAiProfile::default(),
            &RangedAiProfile::default(),
        );
        assert_eq!(result, Err(PhysicsError::WorldLocked));
        assert_eq!(actors.alive_enemy_count(), 0);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_remove_enemies_undoes_partial_placement() {
        let mut world = PhysicsWorld::new(Vec2::zeros());
        let mut actors = actors(&mut world);
        let melee = actors
            .spawn_melee(&mut world, Vec2::new(4.0, 1.0), &MeleeAiProfile::default())
            .unwrap();
        let ranged = actors
            .spawn_ranged(&mut world, Vec2::new(6.0, 1.0), &RangedAiProfile::default())
            .unwrap();
        assert_eq!(world.body_count(), 3);

        remove_enemies(&mut world, &mut actors, &[melee], &[ranged]);
        assert!(actors.melee.is_empty());
        assert!(actors.ranged.is_empty());
        assert_eq!(world.body_count(), 1);
    }
}
