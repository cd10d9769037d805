//! Combat event bus.
//!
//! Discrete outcomes are published on a bounded channel and drained by the
//! rendering/audio collaborators once per frame.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use skirmish_common::{ActorId, EffectId, ProjectileId};
use tracing::warn;

use crate::actor::ActorKind;
use crate::catalog::Reposition;
use crate::resolver::MatchState;
use crate::skirmish::RejectReason;
use crate::status::StatusKind;

/// How a projectile left the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileFate {
    /// Hit a tracked actor.
    Hit,
    /// Hit nothing, or its target was gone.
    Missed,
    /// Ran out of lifetime.
    Expired,
}

/// Event types published by the combat core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CombatEvent {
    /// An ability passed every gate and was activated
    AbilityUsed {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
        /// Target at activation
        target: Option<ActorId>,
    },
    /// An ability request was turned down
    AbilityRejected {
        /// Requester
        actor: ActorId,
        /// Requested slot
        slot: u8,
        /// Why
        reason: RejectReason,
    },
    /// An ability resolved without a valid target in range
    AbilityMissed {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
        /// Intended target
        target: Option<ActorId>,
    },
    /// A cast or channel began
    CastStarted {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
        /// Seconds until resolution
        duration: f32,
        /// Whether it is a channel
        channel: bool,
    },
    /// A cast or channel was interrupted or replaced
    CastCancelled {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
    },
    /// A cast or channel ran to completion
    CastCompleted {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
    },
    /// A channel ticked
    ChannelTicked {
        /// Caster
        actor: ActorId,
        /// Ability ID
        ability: &'static str,
        /// Tick number, starting at 1
        tick: u32,
    },
    /// Damage was applied
    DamageApplied {
        /// Source, if any
        source: Option<ActorId>,
        /// Damaged actor
        target: ActorId,
        /// Health lost
        amount: f32,
        /// Health left
        remaining: f32,
    },
    /// Health was restored
    Healed {
        /// Source, if any
        source: Option<ActorId>,
        /// Healed actor
        target: ActorId,
        /// Health gained
        amount: f32,
    },
    /// A status effect was applied
    EffectApplied {
        /// Holder
        target: ActorId,
        /// Instance
        effect: EffectId,
        /// Kind
        kind: StatusKind,
        /// Seconds
        duration: f32,
    },
    /// A status effect ran out
    EffectExpired {
        /// Holder
        target: ActorId,
        /// Instance
        effect: EffectId,
        /// Kind
        kind: StatusKind,
    },
    /// A projectile was fired
    ProjectileLaunched {
        /// Projectile
        projectile: ProjectileId,
        /// Shooter
        source: ActorId,
        /// Homing target
        target: Option<ActorId>,
    },
    /// A projectile hit, missed or expired
    ProjectileResolved {
        /// Projectile
        projectile: ProjectileId,
        /// What happened
        fate: ProjectileFate,
        /// Actor hit
        hit: Option<ActorId>,
    },
    /// The caster should be moved by the physics collaborator
    MovementRequested {
        /// Actor to move
        actor: ActorId,
        /// Movement type
        movement: Reposition,
        /// Actor to move toward
        toward: Option<ActorId>,
    },
    /// An enemy or ally was removed
    EntityRemoved {
        /// Removed actor
        actor: ActorId,
        /// Its side
        kind: ActorKind,
    },
    /// Match state changed
    MatchStateChanged {
        /// Previous state
        from: MatchState,
        /// New state
        to: MatchState,
    },
}

/// Event bus for broadcasting combat events to collaborators.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. Never blocks; if the bus is full the event is
    /// dropped.
    pub fn publish(&self, event: CombatEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Combat event dropped: {:?}", e.into_inner());
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
