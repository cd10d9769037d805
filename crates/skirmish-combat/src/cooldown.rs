//! Cooldown ledger.
//!
//! Maps (actor, ability id) to the timestamp at which the ability is ready
//! again. Absence means ready. Entries only move forward; the only way to
//! bring one back is clearing the actor or the whole ledger on match reset.

use ahash::AHashMap;
use skirmish_common::ActorId;

use crate::clock::secs_to_ms;

/// Per-actor, per-ability ready timestamps in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    ready_at: AHashMap<(ActorId, &'static str), u64>,
}

impl CooldownLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the ability if it is ready at `now_ms`.
    ///
    /// Returns true and records `now + cooldown` as the new ready time when
    /// the ability is ready (or has never been used). Returns false without
    /// touching the ledger otherwise.
    pub fn try_consume(
        &mut self,
        now_ms: u64,
        actor: ActorId,
        ability: &'static str,
        cooldown_secs: f32,
    ) -> bool {
        let ready_at = self.ready_at.entry((actor, ability)).or_insert(0);
        if now_ms < *ready_at {
            return false;
        }
        *ready_at = (*ready_at).max(now_ms.saturating_add(secs_to_ms(cooldown_secs)));
        true
    }

    /// Checks readiness without consuming.
    #[must_use]
    pub fn is_ready(&self, now_ms: u64, actor: ActorId, ability: &'static str) -> bool {
        self.ready_at
            .get(&(actor, ability))
            .map_or(true, |&ready_at| now_ms >= ready_at)
    }

    /// Seconds until the ability is ready again (0.0 when ready).
    #[must_use]
    pub fn remaining_secs(&self, now_ms: u64, actor: ActorId, ability: &'static str) -> f32 {
        self.ready_at
            .get(&(actor, ability))
            .map_or(0.0, |&ready_at| ready_at.saturating_sub(now_ms) as f32 / 1000.0)
    }

    /// Timestamp at which the ability becomes ready, if it was ever used.
    #[must_use]
    pub fn ready_at(&self, actor: ActorId, ability: &'static str) -> Option<u64> {
        self.ready_at.get(&(actor, ability)).copied()
    }

    /// Clears every entry for one actor.
    pub fn reset(&mut self, actor: ActorId) {
        self.ready_at.retain(|(owner, _), _| *owner != actor);
    }

    /// Clears the whole ledger.
    pub fn clear(&mut self) {
        self.ready_at.clear();
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ready_at.len()
    }

    /// Checks if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ready_at.is_empty()
    }
}
