//! Scripted arena: layout, movement and per-frame driving.
//!
//! Stands in for the scene, physics and AI collaborators. Positions live in
//! a [`MockSpatial`]; everything combat-related goes through [`Skirmish`].

use glam::Vec3;
use skirmish_combat::prelude::*;
use std::f32::consts::TAU;
use tracing::debug;

/// Radius of the enemy spawn ring around the player.
const ENEMY_RING: f32 = 12.0;
/// Radius of the ally spawn ring around the player.
const ALLY_RING: f32 = 3.0;
/// Health of spawned enemies and allies.
const SPAWN_HEALTH: f32 = 100.0;
/// Actors stop chasing at this fraction of their reach.
const APPROACH: f32 = 0.8;
/// Blink distance.
const BLINK_DISTANCE: f32 = 10.0;
/// Charge stops this far from the target.
const CHARGE_STOP: f32 = 1.5;

const ENEMY_CLASSES: [ClassId; 2] = [ClassId::Warrior, ClassId::Paladin];
const ALLY_CLASSES: [ClassId; 4] = [ClassId::Mage, ClassId::Paladin, ClassId::Warlock, ClassId::Warrior];

/// A running headless arena.
#[derive(Debug)]
pub struct Arena {
    skirmish: Skirmish,
    spatial: MockSpatial,
}

impl Arena {
    /// Spawns the player at the origin, enemies on an outer ring and allies
    /// on an inner ring.
    pub fn new(config: SkirmishConfig, enemies: u32, allies: u32) -> Result<Self, CombatError> {
        let mut skirmish = Skirmish::new(config);
        let mut spatial = MockSpatial::new();
        spatial.set_position(ActorId::PLAYER, Vec3::ZERO);

        for i in 0..enemies {
            let id = ActorId::new();
            let class = ENEMY_CLASSES[i as usize % ENEMY_CLASSES.len()];
            skirmish.register_entity(ActorKind::Enemy, id, class, SPAWN_HEALTH)?;
            spatial.set_position(id, ring(i, enemies, ENEMY_RING));
        }
        for i in 0..allies {
            let id = ActorId::new();
            let class = ALLY_CLASSES[i as usize % ALLY_CLASSES.len()];
            skirmish.register_entity(ActorKind::Ally, id, class, SPAWN_HEALTH)?;
            spatial.set_position(id, ring(i, allies, ALLY_RING));
        }

        Ok(Self { skirmish, spatial })
    }

    /// Runs frames of `dt` seconds until the match resolves or
    /// `max_seconds` of simulated time pass.
    pub fn run(&mut self, max_seconds: f32, dt: f32) -> MatchState {
        let limit = secs_to_ms(max_seconds);
        while self.skirmish.match_state() == MatchState::Active && self.skirmish.now_ms() < limit {
            self.step(dt);
        }
        self.skirmish.match_state()
    }

    /// One frame: intents, projectile impacts, timers, then event fallout.
    pub fn step(&mut self, dt: f32) {
        self.drive_player(dt);

        let others = self
            .skirmish
            .ids_of(ActorKind::Ally)
            .into_iter()
            .chain(self.skirmish.ids_of(ActorKind::Enemy));
        for id in others.collect::<Vec<_>>() {
            self.drive_npc(id, dt);
        }

        self.resolve_projectiles();
        self.skirmish.tick(dt, &self.spatial);
        self.apply_events();
    }

    fn drive_player(&mut self, dt: f32) {
        let target = self.skirmish.nearest_hostile(ActorId::PLAYER, &self.spatial);
        if self.skirmish.set_target(target).is_err() {
            return;
        }
        let Some(target) = target else {
            return;
        };

        let Ok(slot) = AbilitySlot::new(1) else {
            return;
        };
        let config = self.skirmish.config();
        let reach = self.skirmish.player().class.ability(slot).range.unwrap_or(config.melee_range);
        self.chase(ActorId::PLAYER, target, reach, dt);

        self.skirmish
            .request_ability(ActorId::PLAYER, slot, Some(target), &self.spatial);
        self.skirmish
            .request_auto_attack(ActorId::PLAYER, target, &self.spatial);
    }

    fn drive_npc(&mut self, id: ActorId, dt: f32) {
        let Some(actor) = self.skirmish.actor(id) else {
            return;
        };
        let ranged = actor.kind != ActorKind::Enemy && actor.class.is_ranged();
        let Some(target) = self.skirmish.nearest_hostile(id, &self.spatial) else {
            return;
        };

        let config = self.skirmish.config();
        let reach = if ranged { config.ranged_range } else { config.melee_range };
        self.chase(id, target, reach, dt);
        self.skirmish.request_auto_attack(id, target, &self.spatial);
    }

    /// Moves `id` toward `target` (or away when feared) at chase speed.
    fn chase(&mut self, id: ActorId, target: ActorId, reach: f32, dt: f32) {
        if self.skirmish.is_casting(id) {
            return;
        }
        let (Some(here), Some(goal)) = (self.spatial.position(id), self.spatial.position(target)) else {
            return;
        };
        let step = self.skirmish.config().chase_speed * dt;

        match self.skirmish.statuses().movement(id) {
            MovementMode::Halted => {},
            MovementMode::Fleeing => {
                let away = here + (here - goal).normalize_or_zero() * step;
                self.spatial.step_toward(id, away, step, 0.0);
            },
            mode => {
                self.spatial
                    .step_toward(id, goal, step * mode.speed_multiplier(), reach * APPROACH);
            },
        }
    }

    fn resolve_projectiles(&mut self) {
        let now = self.skirmish.now_ms();
        let arrived: Vec<(ProjectileId, Option<ActorId>)> = self
            .skirmish
            .projectiles()
            .iter()
            .filter(|p| p.has_arrived(now, &self.spatial))
            .map(|p| (p.id, p.target.filter(|t| self.spatial.position(*t).is_some())))
            .collect();

        for (id, hit) in arrived {
            self.skirmish.projectile_impact(id, hit);
        }
    }

    fn apply_events(&mut self) {
        for event in self.skirmish.drain_events() {
            debug!(?event, "combat");
            match event {
                CombatEvent::EntityRemoved { actor, .. } => self.spatial.remove(actor),
                CombatEvent::MovementRequested {
                    actor,
                    movement,
                    toward,
                } => self.reposition(actor, movement, toward),
                _ => {},
            }
        }
    }

    fn reposition(&mut self, actor: ActorId, movement: Reposition, toward: Option<ActorId>) {
        let Some(here) = self.spatial.position(actor) else {
            return;
        };
        let goal = toward.and_then(|t| self.spatial.position(t));

        match movement {
            Reposition::Charge => {
                if let Some(goal) = goal {
                    self.spatial.step_toward(actor, goal, f32::MAX, CHARGE_STOP);
                }
            },
            Reposition::Blink => {
                let away = goal.map_or(Vec3::Z, |g| (here - g).normalize_or_zero());
                self.spatial.set_position(actor, here + away * BLINK_DISTANCE);
            },
        }
    }

    /// Final (or current) snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CombatSnapshot {
        self.skirmish.snapshot(&self.spatial)
    }

    /// The combat core being driven.
    #[must_use]
    pub fn skirmish(&self) -> &Skirmish {
        &self.skirmish
    }
}

fn ring(index: u32, count: u32, radius: f32) -> Vec3 {
    let angle = TAU * index as f32 / count.max(1) as f32;
    Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
}
