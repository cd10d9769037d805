//! Damage-over-time instances.
//!
//! A DOT runs on its own one-second repeating timer once applied. It does
//! not belong to any cast: cancelling the caster's cast or removing the
//! caster leaves it running. Only the target's removal stops it early.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, DotId, EffectId};

use crate::clock::TimerId;
use crate::timer::{CombatClock, CombatTimer};

/// Seconds between DOT ticks.
pub const DOT_TICK_INTERVAL: f32 = 1.0;

/// A running damage-over-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotInstance {
    /// Instance ID.
    pub id: DotId,
    /// Actor that applied it (may no longer exist).
    pub source: ActorId,
    /// Actor taking the damage.
    pub target: ActorId,
    /// Damage dealt on each tick.
    pub damage_per_tick: f32,
    /// Ticks still to come.
    pub remaining_ticks: u32,
    /// Status effect tagging this DOT for visuals/behavior.
    pub linked_effect: Option<EffectId>,
    #[serde(skip)]
    next_tick: Option<TimerId>,
}

/// One DOT tick ready to be applied by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotTick {
    /// Instance that ticked.
    pub dot: DotId,
    /// Who applied it.
    pub source: ActorId,
    /// Actor to damage.
    pub target: ActorId,
    /// Damage for this tick.
    pub damage: f32,
    /// Ticks left after this one.
    pub remaining_ticks: u32,
}

/// All running DOTs.
#[derive(Debug, Clone, Default)]
pub struct DotTracker {
    dots: AHashMap<DotId, DotInstance>,
    next_id: u64,
}

impl DotTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a DOT with `ticks` ticks, the first one a second from now.
    /// Zero ticks is a no-op and returns `None`.
    pub fn apply(
        &mut self,
        clock: &mut CombatClock,
        source: ActorId,
        target: ActorId,
        damage_per_tick: f32,
        ticks: u32,
        linked_effect: Option<EffectId>,
    ) -> Option<DotId> {
        if ticks == 0 {
            return None;
        }
        self.next_id += 1;
        let id = DotId::new(self.next_id);
        let next_tick = clock.schedule(DOT_TICK_INTERVAL, CombatTimer::DotTick { dot: id });
        self.dots.insert(
            id,
            DotInstance {
                id,
                source,
                target,
                damage_per_tick,
                remaining_ticks: ticks,
                linked_effect,
                next_tick: Some(next_tick),
            },
        );
        Some(id)
    }

    /// Handles a fired tick timer: consumes one tick and reschedules the
    /// next one, or retires the DOT after its last tick.
    pub fn tick(&mut self, clock: &mut CombatClock, id: DotId) -> Option<DotTick> {
        let dot = self.dots.get_mut(&id)?;
        dot.remaining_ticks = dot.remaining_ticks.saturating_sub(1);
        let tick = DotTick {
            dot: id,
            source: dot.source,
            target: dot.target,
            damage: dot.damage_per_tick,
            remaining_ticks: dot.remaining_ticks,
        };

        if dot.remaining_ticks == 0 {
            self.dots.remove(&id);
        } else {
            dot.next_tick = Some(clock.schedule(DOT_TICK_INTERVAL, CombatTimer::DotTick { dot: id }));
        }
        Some(tick)
    }

    /// Stops every DOT on `target` and cancels their pending ticks.
    pub fn clear_target(&mut self, clock: &mut CombatClock, target: ActorId) -> Vec<DotInstance> {
        let ids: Vec<DotId> = self
            .dots
            .values()
            .filter(|d| d.target == target)
            .map(|d| d.id)
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(dot) = self.dots.remove(&id) {
                if let Some(timer) = dot.next_tick {
                    clock.cancel(timer);
                }
                removed.push(dot);
            }
        }
        removed
    }

    /// Drops everything. Timers are expected to be cleared with the clock.
    pub fn clear(&mut self) {
        self.dots.clear();
    }

    /// Looks up a running DOT.
    #[must_use]
    pub fn get(&self, id: DotId) -> Option<&DotInstance> {
        self.dots.get(&id)
    }

    /// Running DOTs on `target`.
    pub fn on_target(&self, target: ActorId) -> impl Iterator<Item = &DotInstance> {
        self.dots.values().filter(move |d| d.target == target)
    }

    /// Number of running DOTs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dots.len()
    }

    /// Checks if no DOT is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }
}
