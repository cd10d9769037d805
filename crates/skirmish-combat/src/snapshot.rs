//! Read-only snapshots for rendering.

use glam::Vec3;
use serde::Serialize;
use skirmish_common::{ActorId, ProjectileId};

use crate::actor::ActorKind;
use crate::casting::CastProgress;
use crate::catalog::ClassId;
use crate::resolver::MatchState;
use crate::status::{MovementMode, StatusKind};

/// Per-actor view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    /// Identity
    pub id: ActorId,
    /// Side
    pub kind: ActorKind,
    /// Class
    pub class: ClassId,
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Current resource
    pub resource: f32,
    /// Maximum resource
    pub max_resource: f32,
    /// Health above zero
    pub alive: bool,
    /// Distinct active status kinds
    pub effects: Vec<StatusKind>,
    /// How the movement controller should behave
    pub movement: MovementMode,
    /// Cast bar, if casting
    pub cast: Option<CastProgress>,
}

/// Player cooldown for one ability slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownSnapshot {
    /// Slot number (1-5)
    pub slot: u8,
    /// Ability ID
    pub ability: &'static str,
    /// Ability display name
    pub name: &'static str,
    /// Seconds until ready
    pub remaining: f32,
}

/// Projectile view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectileSnapshot {
    /// Instance
    pub id: ProjectileId,
    /// Shooter
    pub source: ActorId,
    /// Homing target
    pub target: Option<ActorId>,
    /// Ability that fired it
    pub ability: &'static str,
    /// Estimated position, if geometry is known
    pub position: Option<Vec3>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatSnapshot {
    /// Simulated time in seconds
    pub time: f64,
    /// Match outcome
    pub match_state: MatchState,
    /// Player class
    pub player_class: ClassId,
    /// Player's current target
    pub target: Option<ActorId>,
    /// Player first, then others in ID order
    pub actors: Vec<ActorSnapshot>,
    /// Player cooldowns by slot
    pub cooldowns: Vec<CooldownSnapshot>,
    /// Projectiles in flight
    pub projectiles: Vec<ProjectileSnapshot>,
}

impl CombatSnapshot {
    /// Looks up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// The player entry.
    #[must_use]
    pub fn player(&self) -> Option<&ActorSnapshot> {
        self.actor(ActorId::PLAYER)
    }

    /// Actors of one side.
    pub fn of_kind(&self, kind: ActorKind) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter().filter(move |a| a.kind == kind)
    }

    /// Pretty JSON for logs and tooling.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
