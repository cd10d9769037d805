//! Projectiles in flight.
//!
//! Flight itself belongs to the physics collaborator. The tracker only keeps
//! what is needed to resolve an impact: who fired, at whom, for how much, and
//! where the target was last seen.

use ahash::AHashMap;
use glam::Vec3;
use serde::Serialize;
use skirmish_common::{ActorId, ProjectileId};

use crate::clock::TimerId;
use crate::spatial::SpatialQuery;
use crate::timer::{CombatClock, CombatTimer};

/// Launch parameters for a projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    /// Shooter.
    pub source: ActorId,
    /// Homing target, if any.
    pub target: Option<ActorId>,
    /// Ability (or auto-attack) ID that fired it.
    pub ability: &'static str,
    /// Damage on impact.
    pub damage: f32,
    /// Travel speed in units per second.
    pub speed: f32,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projectile {
    /// Instance ID.
    pub id: ProjectileId,
    /// Shooter.
    pub source: ActorId,
    /// Homing target.
    pub target: Option<ActorId>,
    /// Ability that fired it.
    pub ability: &'static str,
    /// Damage on impact.
    pub damage: f32,
    /// Travel speed.
    pub speed: f32,
    /// Launch position, if known.
    pub origin: Option<Vec3>,
    /// Last position the target was seen at.
    pub last_known_target: Option<Vec3>,
    /// Launch time in milliseconds.
    pub launched_at_ms: u64,
    #[serde(skip)]
    expiry: Option<TimerId>,
}

impl Projectile {
    /// Where the projectile is heading: the target's live position, or the
    /// last known one once the target is gone.
    #[must_use]
    pub fn aim_point(&self, spatial: &dyn SpatialQuery) -> Option<Vec3> {
        self.target
            .and_then(|target| spatial.position(target))
            .or(self.last_known_target)
    }

    /// Distance covered since launch.
    #[must_use]
    pub fn travelled(&self, now_ms: u64) -> f32 {
        now_ms.saturating_sub(self.launched_at_ms) as f32 / 1000.0 * self.speed
    }

    /// Estimated position along the straight line from origin to aim point.
    #[must_use]
    pub fn position(&self, now_ms: u64, spatial: &dyn SpatialQuery) -> Option<Vec3> {
        let origin = self.origin?;
        let Some(aim) = self.aim_point(spatial) else {
            return Some(origin);
        };
        let total = origin.distance(aim);
        if total <= f32::EPSILON {
            return Some(aim);
        }
        Some(origin.lerp(aim, (self.travelled(now_ms) / total).min(1.0)))
    }

    /// Checks if the projectile has covered the distance to its aim point.
    /// Projectiles with no geometry arrive immediately.
    #[must_use]
    pub fn has_arrived(&self, now_ms: u64, spatial: &dyn SpatialQuery) -> bool {
        match (self.origin, self.aim_point(spatial)) {
            (Some(origin), Some(aim)) => self.travelled(now_ms) >= origin.distance(aim),
            _ => true,
        }
    }
}

/// All projectiles in flight.
#[derive(Debug, Clone, Default)]
pub struct ProjectileTracker {
    projectiles: AHashMap<ProjectileId, Projectile>,
    next_id: u64,
}

impl ProjectileTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projectile and schedules its expiry after `lifetime`
    /// seconds.
    pub fn launch(
        &mut self,
        clock: &mut CombatClock,
        launch: ProjectileLaunch,
        spatial: &dyn SpatialQuery,
        lifetime: f32,
    ) -> ProjectileId {
        self.next_id += 1;
        let id = ProjectileId::new(self.next_id);
        let expiry = clock.schedule(lifetime, CombatTimer::ProjectileExpiry { projectile: id });

        self.projectiles.insert(
            id,
            Projectile {
                id,
                source: launch.source,
                target: launch.target,
                ability: launch.ability,
                damage: launch.damage,
                speed: launch.speed,
                origin: spatial.position(launch.source),
                last_known_target: launch.target.and_then(|t| spatial.position(t)),
                launched_at_ms: clock.now_ms(),
                expiry: Some(expiry),
            },
        );
        id
    }

    /// Refreshes the last known position of every live target.
    pub fn track(&mut self, spatial: &dyn SpatialQuery) {
        for projectile in self.projectiles.values_mut() {
            if let Some(position) = projectile.target.and_then(|t| spatial.position(t)) {
                projectile.last_known_target = Some(position);
            }
        }
    }

    /// Removes a projectile on impact and cancels its expiry.
    pub fn resolve(&mut self, clock: &mut CombatClock, id: ProjectileId) -> Option<Projectile> {
        let projectile = self.projectiles.remove(&id)?;
        if let Some(timer) = projectile.expiry {
            clock.cancel(timer);
        }
        Some(projectile)
    }

    /// Handles a fired expiry timer.
    pub fn expire(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    /// Looks up a projectile.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Iterates projectiles in flight.
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Number in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    /// Checks if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Drops everything. Timers are expected to be cleared with the clock.
    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}
