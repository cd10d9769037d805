//! Cast and channel controller.
//!
//! Single-slot state machine per actor:
//! - `Idle -> Casting -> (Resolving | Cancelled) -> Idle`
//! - `Idle -> Channeling -> {tick* -> Completed | Cancelled} -> Idle`
//!
//! Starting a new cast or channel for an actor first cancels whatever that
//! actor had in progress; the cancelled instance's timers are disarmed so its
//! completion never fires. The controller owns no movement or cooldown
//! logic; callers gate on cooldowns before starting and poll
//! [`CastController::is_casting`] to suppress movement.

use ahash::AHashMap;
use serde::Serialize;
use skirmish_common::{ActorId, CastId};
use tracing::debug;

use crate::catalog::Ability;
use crate::clock::TimerId;
use crate::timer::{CombatClock, CombatTimer};

/// Current phase of an actor's cast slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastPhase {
    /// Nothing in progress.
    Idle,
    /// Single-resolution cast in progress.
    Casting,
    /// Ticking channel in progress.
    Channeling,
}

/// Tick bookkeeping for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelTicks {
    /// Ticks scheduled in total (one per second).
    pub total: u32,
    /// Ticks that already fired.
    pub fired: u32,
}

/// A cast or channel in progress.
#[derive(Debug, Clone)]
pub struct ActiveCast {
    /// Instance ID, used to recognise stale timers.
    pub id: CastId,
    /// Caster.
    pub caster: ActorId,
    /// Ability being cast.
    pub ability: &'static Ability,
    /// Target chosen when the cast started.
    pub target: Option<ActorId>,
    /// Start time in milliseconds.
    pub started_at_ms: u64,
    /// Total duration in seconds.
    pub duration: f32,
    /// Present for channels.
    pub channel: Option<ChannelTicks>,
    timers: Vec<TimerId>,
}

impl ActiveCast {
    /// Phase this cast represents.
    #[must_use]
    pub fn phase(&self) -> CastPhase {
        if self.channel.is_some() {
            CastPhase::Channeling
        } else {
            CastPhase::Casting
        }
    }

    /// Progress snapshot at `now_ms`.
    #[must_use]
    pub fn progress(&self, now_ms: u64) -> CastProgress {
        let elapsed = (now_ms.saturating_sub(self.started_at_ms) as f32 / 1000.0).min(self.duration);
        CastProgress {
            ability: self.ability.id,
            ability_name: self.ability.name,
            phase: self.phase(),
            elapsed,
            duration: self.duration,
            fraction: if self.duration > 0.0 {
                (elapsed / self.duration).clamp(0.0, 1.0)
            } else {
                1.0
            },
        }
    }
}

/// Read-only cast bar data for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CastProgress {
    /// Ability ID.
    pub ability: &'static str,
    /// Ability display name.
    pub ability_name: &'static str,
    /// Casting or channeling.
    pub phase: CastPhase,
    /// Seconds elapsed.
    pub elapsed: f32,
    /// Total seconds.
    pub duration: f32,
    /// Elapsed fraction (0.0 to 1.0).
    pub fraction: f32,
}

/// Result of asking the controller to start something.
#[derive(Debug, Clone)]
pub enum CastStart {
    /// Zero duration: nothing was scheduled, resolve synchronously.
    Instant,
    /// Scheduled. `replaced` holds the cast it cancelled, if any.
    Started {
        /// New cast instance.
        id: CastId,
        /// Previous cast that was discarded.
        replaced: Option<ActiveCast>,
    },
}

/// Cast slots for all actors.
#[derive(Debug, Clone, Default)]
pub struct CastController {
    active: AHashMap<ActorId, ActiveCast>,
    next_id: u64,
}

impl CastController {
    /// Creates a controller with every actor idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_cast_id(&mut self) -> CastId {
        self.next_id += 1;
        CastId::new(self.next_id)
    }

    /// Starts a single-resolution cast of `duration` seconds.
    pub fn start_cast(
        &mut self,
        clock: &mut CombatClock,
        caster: ActorId,
        ability: &'static Ability,
        target: Option<ActorId>,
        duration: f32,
    ) -> CastStart {
        if !(duration > 0.0) {
            return CastStart::Instant;
        }
        let replaced = self.cancel(clock, caster);
        let id = self.next_cast_id();
        let complete = clock.schedule(duration, CombatTimer::CastComplete { actor: caster, cast: id });

        debug!("{caster} casting {} for {duration}s", ability.id);
        self.active.insert(
            caster,
            ActiveCast {
                id,
                caster,
                ability,
                target,
                started_at_ms: clock.now_ms(),
                duration,
                channel: None,
                timers: vec![complete],
            },
        );
        CastStart::Started { id, replaced }
    }

    /// Starts a channel lasting `seconds` whole seconds with one tick per
    /// elapsed second, followed by completion.
    pub fn start_channel(
        &mut self,
        clock: &mut CombatClock,
        caster: ActorId,
        ability: &'static Ability,
        target: Option<ActorId>,
        seconds: u32,
    ) -> CastStart {
        if seconds == 0 {
            return CastStart::Instant;
        }
        let replaced = self.cancel(clock, caster);
        let id = self.next_cast_id();

        // Ticks are scheduled before completion so the last tick runs first
        // when they share a fire time.
        let mut timers: Vec<TimerId> = (1..=seconds)
            .map(|s| clock.schedule(s as f32, CombatTimer::ChannelTick { actor: caster, cast: id }))
            .collect();
        timers.push(clock.schedule(
            seconds as f32,
            CombatTimer::CastComplete { actor: caster, cast: id },
        ));

        debug!("{caster} channeling {} for {seconds}s", ability.id);
        self.active.insert(
            caster,
            ActiveCast {
                id,
                caster,
                ability,
                target,
                started_at_ms: clock.now_ms(),
                duration: seconds as f32,
                channel: Some(ChannelTicks {
                    total: seconds,
                    fired: 0,
                }),
                timers,
            },
        );
        CastStart::Started { id, replaced }
    }

    /// Cancels the actor's cast or channel. Pending ticks and completion are
    /// disarmed; nothing already resolved is undone.
    pub fn cancel(&mut self, clock: &mut CombatClock, caster: ActorId) -> Option<ActiveCast> {
        let cast = self.active.remove(&caster)?;
        for timer in &cast.timers {
            clock.cancel(*timer);
        }
        debug!("{caster} cancelled {}", cast.ability.id);
        Some(cast)
    }

    /// Handles a fired channel tick. Returns the channel if `cast` is still
    /// the actor's current instance.
    pub fn channel_tick(&mut self, caster: ActorId, cast: CastId) -> Option<&ActiveCast> {
        let active = self.active.get_mut(&caster).filter(|a| a.id == cast)?;
        if let Some(ticks) = active.channel.as_mut() {
            ticks.fired = (ticks.fired + 1).min(ticks.total);
        }
        Some(active)
    }

    /// Handles a fired completion timer. Returns the finished cast and
    /// returns the actor to idle, or `None` for a stale timer.
    pub fn complete(&mut self, caster: ActorId, cast: CastId) -> Option<ActiveCast> {
        if self.active.get(&caster)?.id != cast {
            return None;
        }
        self.active.remove(&caster)
    }

    /// Checks if the actor has a cast or channel in progress.
    #[must_use]
    pub fn is_casting(&self, caster: ActorId) -> bool {
        self.active.contains_key(&caster)
    }

    /// Current phase for the actor.
    #[must_use]
    pub fn phase(&self, caster: ActorId) -> CastPhase {
        self.active.get(&caster).map_or(CastPhase::Idle, ActiveCast::phase)
    }

    /// The actor's cast in progress.
    #[must_use]
    pub fn active(&self, caster: ActorId) -> Option<&ActiveCast> {
        self.active.get(&caster)
    }

    /// Cast bar data for the actor.
    #[must_use]
    pub fn progress(&self, now_ms: u64, caster: ActorId) -> Option<CastProgress> {
        self.active.get(&caster).map(|cast| cast.progress(now_ms))
    }

    /// Drops every cast. Timers are expected to be cleared with the clock.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
