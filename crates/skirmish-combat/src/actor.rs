//! Actors and their health/resource pools.

use serde::{Deserialize, Serialize};
use skirmish_common::ActorId;

use crate::catalog::ClassId;

/// Side an actor fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// The controlled character.
    Player,
    /// Hostile to the player and allies.
    Enemy,
    /// Fights alongside the player.
    Ally,
}

impl ActorKind {
    /// Checks if two kinds are on opposing sides.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        (self == Self::Enemy) != (other == Self::Enemy)
    }
}

/// Health and resource state of one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Identity.
    pub id: ActorId,
    /// Side.
    pub kind: ActorKind,
    /// Class, selecting the ability catalog entry.
    pub class: ClassId,
    health: f32,
    max_health: f32,
    resource: f32,
    max_resource: f32,
}

impl Actor {
    /// Creates an actor at full health and resource.
    #[must_use]
    pub fn new(id: ActorId, kind: ActorKind, class: ClassId, max_health: f32) -> Self {
        let max_health = max_health.max(0.0);
        let max_resource = class.definition().max_resource;
        Self {
            id,
            kind,
            class,
            health: max_health,
            max_health,
            resource: max_resource,
            max_resource,
        }
    }

    /// Creates the player for `class` with that class's maximums.
    #[must_use]
    pub fn player(class: ClassId) -> Self {
        Self::new(ActorId::PLAYER, ActorKind::Player, class, class.definition().max_health)
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Current resource.
    #[must_use]
    pub fn resource(&self) -> f32 {
        self.resource
    }

    /// Maximum resource.
    #[must_use]
    pub fn max_resource(&self) -> f32 {
        self.max_resource
    }

    /// Alive while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Removes health, clamped at zero. Returns the amount actually lost;
    /// excess damage is discarded.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.max_health);
        before - self.health
    }

    /// Signed health adjustment clamped to `[0, max_health]`. Returns the
    /// applied delta.
    pub fn adjust_health(&mut self, delta: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + delta).clamp(0.0, self.max_health);
        self.health - before
    }

    /// Spends resource if enough is available.
    pub fn spend_resource(&mut self, amount: f32) -> bool {
        let amount = amount.max(0.0);
        if self.resource < amount {
            return false;
        }
        self.resource -= amount;
        true
    }

    /// Checks if `amount` resource is available.
    #[must_use]
    pub fn has_resource(&self, amount: f32) -> bool {
        self.resource >= amount.max(0.0)
    }

    /// Restores health and resource to their maximums.
    pub fn restore(&mut self) {
        self.health = self.max_health;
        self.resource = self.max_resource;
    }
}
