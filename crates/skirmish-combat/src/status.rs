//! Status effect registry.
//!
//! Every application creates an independent, timed instance. Instances of
//! the same kind are never merged or refreshed: two fears on one target are
//! two timers, and the kind stays active until the last of them expires.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, EffectId};
use tracing::debug;

use crate::clock::TimerId;
use crate::timer::{CombatClock, CombatTimer};

/// Kind of timed modifier attached to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Cannot move or act.
    Stun,
    /// Cannot move.
    Root,
    /// Moves at reduced speed.
    Slow,
    /// Flees instead of chasing, cannot act.
    Fear,
    /// Turned into a critter, cannot act.
    Polymorph,
    /// Tag for an attached damage-over-time.
    Corruption,
}

impl StatusKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 6] = [
        Self::Stun,
        Self::Root,
        Self::Slow,
        Self::Fear,
        Self::Polymorph,
        Self::Corruption,
    ];

    /// Check if this kind prevents the holder from using abilities.
    #[must_use]
    pub fn prevents_actions(&self) -> bool {
        matches!(self, Self::Stun | Self::Fear | Self::Polymorph)
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stun => "stun",
            Self::Root => "root",
            Self::Slow => "slow",
            Self::Fear => "fear",
            Self::Polymorph => "polymorph",
            Self::Corruption => "corruption",
        }
    }
}

/// How an actor's movement controller should behave given its effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementMode {
    /// Unaffected.
    Normal,
    /// Velocity scaled by the multiplier.
    Slowed(f32),
    /// Run away from the threat instead of chasing.
    Fleeing,
    /// Zero velocity.
    Halted,
}

impl MovementMode {
    /// Velocity multiplier to apply to the chase vector.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Self::Normal | Self::Fleeing => 1.0,
            Self::Slowed(multiplier) => *multiplier,
            Self::Halted => 0.0,
        }
    }
}

/// A single active status effect instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Unique instance ID.
    pub id: EffectId,
    /// Holder.
    pub target: ActorId,
    /// Effect kind.
    pub kind: StatusKind,
    /// Total duration in seconds.
    pub duration: f32,
    /// Time the effect was applied, in milliseconds.
    pub started_at_ms: u64,
    /// Expiry timer on the combat clock.
    #[serde(skip)]
    expiry: Option<TimerId>,
}

impl StatusEffect {
    /// Seconds left before this instance expires.
    #[must_use]
    pub fn remaining_secs(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.started_at_ms) as f32 / 1000.0;
        (self.duration - elapsed).max(0.0)
    }
}

/// Active status effects per target.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    effects: AHashMap<ActorId, Vec<StatusEffect>>,
    next_id: u64,
    slow_multiplier: f32,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl StatusRegistry {
    /// Creates an empty registry. `slow_multiplier` is the velocity factor
    /// reported for slowed actors.
    #[must_use]
    pub fn new(slow_multiplier: f32) -> Self {
        Self {
            effects: AHashMap::new(),
            next_id: 1,
            slow_multiplier,
        }
    }

    /// Appends a new effect instance to `target` and schedules its expiry.
    pub fn apply(
        &mut self,
        clock: &mut CombatClock,
        target: ActorId,
        kind: StatusKind,
        duration: f32,
    ) -> EffectId {
        let id = EffectId::new(self.next_id);
        self.next_id += 1;

        let expiry = clock.schedule(duration, CombatTimer::EffectExpiry { target, effect: id });
        self.effects.entry(target).or_default().push(StatusEffect {
            id,
            target,
            kind,
            duration,
            started_at_ms: clock.now_ms(),
            expiry: Some(expiry),
        });
        debug!("Applied {} to {target} for {duration}s ({id:?})", kind.name());
        id
    }

    /// Removes an effect by ID and cancels its expiry. Safe to call more
    /// than once; later calls return `None`.
    pub fn remove(
        &mut self,
        clock: &mut CombatClock,
        target: ActorId,
        effect: EffectId,
    ) -> Option<StatusEffect> {
        let removed = self.take(target, effect)?;
        if let Some(timer) = removed.expiry {
            clock.cancel(timer);
        }
        Some(removed)
    }

    /// Handles a fired expiry timer. Returns `None` if the instance is
    /// already gone (removed manually or with its target).
    pub fn expire(&mut self, target: ActorId, effect: EffectId) -> Option<StatusEffect> {
        let expired = self.take(target, effect)?;
        debug!("{} expired on {target} ({effect:?})", expired.kind.name());
        Some(expired)
    }

    fn take(&mut self, target: ActorId, effect: EffectId) -> Option<StatusEffect> {
        let list = self.effects.get_mut(&target)?;
        let index = list.iter().position(|e| e.id == effect)?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.effects.remove(&target);
        }
        Some(removed)
    }

    /// Discards every effect on `target` and cancels their expiry timers.
    pub fn clear_target(&mut self, clock: &mut CombatClock, target: ActorId) -> Vec<StatusEffect> {
        let removed = self.effects.remove(&target).unwrap_or_default();
        for effect in &removed {
            if let Some(timer) = effect.expiry {
                clock.cancel(timer);
            }
        }
        removed
    }

    /// Drops everything. Timers are expected to be cleared with the clock.
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Checks whether any instance of `kind` is active on `target`.
    #[must_use]
    pub fn has(&self, target: ActorId, kind: StatusKind) -> bool {
        self.list(target).iter().any(|e| e.kind == kind)
    }

    /// Number of active instances of `kind` on `target`.
    #[must_use]
    pub fn count(&self, target: ActorId, kind: StatusKind) -> usize {
        self.list(target).iter().filter(|e| e.kind == kind).count()
    }

    /// All active effects on `target`, in application order.
    #[must_use]
    pub fn list(&self, target: ActorId) -> &[StatusEffect] {
        self.effects.get(&target).map_or(&[], Vec::as_slice)
    }

    /// Distinct active kinds on `target`, in [`StatusKind::ALL`] order.
    #[must_use]
    pub fn kinds(&self, target: ActorId) -> Vec<StatusKind> {
        StatusKind::ALL
            .into_iter()
            .filter(|kind| self.has(target, *kind))
            .collect()
    }

    /// Checks if `target` is prevented from acting.
    #[must_use]
    pub fn is_incapacitated(&self, target: ActorId) -> bool {
        self.list(target).iter().any(|e| e.kind.prevents_actions())
    }

    /// Movement behavior for `target`. Stun and root win over fear, fear
    /// over slow.
    #[must_use]
    pub fn movement(&self, target: ActorId) -> MovementMode {
        if self.has(target, StatusKind::Stun) || self.has(target, StatusKind::Root) {
            MovementMode::Halted
        } else if self.has(target, StatusKind::Fear) {
            MovementMode::Fleeing
        } else if self.has(target, StatusKind::Slow) {
            MovementMode::Slowed(self.slow_multiplier)
        } else {
            MovementMode::Normal
        }
    }

    /// Total number of active instances across all targets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.effects.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expire_due(clock: &mut CombatClock, registry: &mut StatusRegistry, dt: f32) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        for timer in clock.advance(dt) {
            if let CombatTimer::EffectExpiry { target, effect } = timer {
                expired.extend(registry.expire(target, effect));
            }
        }
        expired
    }

    #[test]
    fn test_stun_active_until_duration_elapses() {
        let mut clock = CombatClock::new();
        let mut registry = StatusRegistry::default();
        let target = ActorId::from_raw(5);

        registry.apply(&mut clock, target, StatusKind::Stun, 3.0);
        registry.apply(&mut clock, target, StatusKind::Slow, 10.0);
        assert!(registry.has(target, StatusKind::Stun));
        assert_eq!(registry.movement(target), MovementMode::Halted);

        expire_due(&mut clock, &mut registry, 2.9);
        assert!(registry.has(target, StatusKind::Stun));

        let expired = expire_due(&mut clock, &mut registry, 0.1);
        assert_eq!(expired.len(), 1);
        assert!(!registry.has(target, StatusKind::Stun));
        assert!(registry.has(target, StatusKind::Slow));
        assert_eq!(registry.movement(target), MovementMode::Slowed(0.5));
    }

    #[test]
    fn test_duplicate_kinds_stack_independently() {
        let mut clock = CombatClock::new();
        let mut registry = StatusRegistry::default();
        let target = ActorId::from_raw(6);

        let first = registry.apply(&mut clock, target, StatusKind::Fear, 5.0);
        expire_due(&mut clock, &mut registry, 2.0);
        let second = registry.apply(&mut clock, target, StatusKind::Fear, 5.0);
        assert_ne!(first, second);
        assert_eq!(registry.count(target, StatusKind::Fear), 2);

        // First instance expires at 5s, second keeps the kind active
        let expired = expire_due(&mut clock, &mut registry, 3.0);
        assert_eq!(expired.iter().map(|e| e.id).collect::<Vec<_>>(), vec![first]);
        assert!(registry.has(target, StatusKind::Fear));
        assert!((registry.list(target)[0].remaining_secs(clock.now_ms()) - 2.0).abs() < 1e-4);

        expire_due(&mut clock, &mut registry, 2.0);
        assert!(!registry.has(target, StatusKind::Fear));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut clock = CombatClock::new();
        let mut registry = StatusRegistry::default();
        let target = ActorId::from_raw(7);
        let id = registry.apply(&mut clock, target, StatusKind::Root, 4.0);

        assert!(registry.remove(&mut clock, target, id).is_some());
        assert!(registry.remove(&mut clock, target, id).is_none());
        assert!(registry.expire(target, id).is_none());
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn test_clear_target_cancels_expiry() {
        let mut clock = CombatClock::new();
        let mut registry = StatusRegistry::default();
        let target = ActorId::from_raw(8);
        let other = ActorId::from_raw(9);
        registry.apply(&mut clock, target, StatusKind::Polymorph, 5.0);
        registry.apply(&mut clock, target, StatusKind::Corruption, 12.0);
        registry.apply(&mut clock, other, StatusKind::Root, 4.0);

        let removed = registry.clear_target(&mut clock, target);
        assert_eq!(removed.len(), 2);
        assert!(registry.list(target).is_empty());
        assert_eq!(clock.pending_count(), 1);
        assert!(registry.has(other, StatusKind::Root));
    }

    #[test]
    fn test_incapacitation_and_movement_priority() {
        let mut clock = CombatClock::new();
        let mut registry = StatusRegistry::new(0.25);
        let target = ActorId::from_raw(10);

        registry.apply(&mut clock, target, StatusKind::Slow, 5.0);
        assert!(!registry.is_incapacitated(target));
        assert_eq!(registry.movement(target).speed_multiplier(), 0.25);

        registry.apply(&mut clock, target, StatusKind::Fear, 5.0);
        assert!(registry.is_incapacitated(target));
        assert_eq!(registry.movement(target), MovementMode::Fleeing);

        registry.apply(&mut clock, target, StatusKind::Root, 5.0);
        assert_eq!(registry.movement(target), MovementMode::Halted);
        assert_eq!(
            registry.kinds(target),
            vec![StatusKind::Root, StatusKind::Slow, StatusKind::Fear]
        );
    }
}
