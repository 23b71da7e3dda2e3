//! Contact routing
//!
//! The single [`ContactListener`] of the simulation. It dispatches on the
//! [`FixtureTag`] of each side of a contact and only ever bumps counters,
//! flips flags or queues impacts: nothing is created or destroyed here.

use crate::combat::{ActorId, CombatSystem, Faction, ProjectileHit, ProjectileSystem};
use crate::entities::Actors;
use crate::events::{FeedbackCounters, FeedbackKind};
use crate::physics::{BodyMotion, Contact, ContactListener, ContactSide, ContactView, FixtureTag};
use crate::relics::PickupSet;

/// Borrowed simulation state visible to contact callbacks
pub struct ContactRouter<'a> {
    /// Every actor (hurtboxes and ground counters)
    pub actors: &'a mut Actors,
    /// Melee resolver
    pub combat: &'a mut CombatSystem,
    /// Projectile owner
    pub projectiles: &'a mut ProjectileSystem,
    /// Relic pickups
    pub pickups: &'a mut PickupSet,
    /// Events raised during this tick
    pub events: &'a mut FeedbackCounters,
    /// The player passes up through one-way platforms while its center is
    /// below platform center + this margin (meters)
    pub one_way_margin: f32,
}

impl ContactRouter<'_> {
    fn begin_side(&mut self, me: ContactSide, other: ContactSide, view: &mut ContactView<'_>) {
        match me.tag {
            FixtureTag::GroundSensor(id) if other.tag.is_ground_like() => {
                if let Some(ground) = self.actors.ground_contacts_mut(id) {
                    ground.begin();
                }
            }
            FixtureTag::Hitbox(key) => {
                if other.tag.is_ground_like() {
                    self.events.notify(FeedbackKind::MeleeWorld);
                }
                let hit = self
                    .combat
                    .handle_hitbox_contact(key, me.body, other, &mut *self.actors, view);
                if let Some(hit) = hit.filter(|h| h.landed) {
                    self.events.notify(hurt_kind(hit.target_faction));
                }
            }
            FixtureTag::Projectile(key) => {
                let hit = self.projectiles.handle_contact(key, other, &mut *self.actors, view);
                if let Some(ProjectileHit::Actor {
                    target_faction: Faction::Player,
                    landed: true,
                    ..
                }) = hit
                {
                    self.events.notify(FeedbackKind::PlayerHurt);
                }
            }
            FixtureTag::Pickup(key) if other.tag == FixtureTag::Actor(ActorId::Player) => {
                self.pickups.mark_collected(key);
            }
            _ => {}
        }
    }
}

fn hurt_kind(faction: Faction) -> FeedbackKind {
    match faction {
        Faction::Player => FeedbackKind::PlayerHurt,
        Faction::Enemy => FeedbackKind::EnemyHurt,
    }
}

impl ContactListener for ContactRouter<'_> {
    fn begin_contact(&mut self, contact: &Contact, view: &mut ContactView<'_>) {
        for (me, other) in contact.both_ways() {
            self.begin_side(me, other, view);
        }
    }

    fn end_contact(&mut self, contact: &Contact, _view: &mut ContactView<'_>) {
        for (me, other) in contact.both_ways() {
            if let FixtureTag::GroundSensor(id) = me.tag {
                if other.tag.is_ground_like() {
                    if let Some(ground) = self.actors.ground_contacts_mut(id) {
                        ground.end();
                    }
                }
            }
        }
    }

    fn pre_solve(&mut self, contact: &Contact, view: &ContactView<'_>) -> bool {
        for (me, other) in contact.both_ways() {
            if me.tag == FixtureTag::OneWay && other.tag == FixtureTag::Actor(ActorId::Player) {
                let (Some(platform), Some(player)) = (view.position(me.body), view.position(other.body)) else {
                    continue;
                };
                if player.y < platform.y + self.one_way_margin {
                    return false;
                }
            }
        }
        true
    }
}
