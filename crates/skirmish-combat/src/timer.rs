//! Timer tasks scheduled on the combat clock.

use skirmish_common::{ActorId, CastId, DotId, EffectId, ProjectileId};

use crate::clock::Clock;

/// Work the combat clock hands back to the skirmish when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatTimer {
    /// A cast or channel reached its end.
    CastComplete {
        /// Caster
        actor: ActorId,
        /// Cast instance that scheduled this timer
        cast: CastId,
    },
    /// One second of a channel elapsed.
    ChannelTick {
        /// Caster
        actor: ActorId,
        /// Channel instance that scheduled this timer
        cast: CastId,
    },
    /// A status effect ran out.
    EffectExpiry {
        /// Effect holder
        target: ActorId,
        /// Effect instance
        effect: EffectId,
    },
    /// A damage-over-time instance ticks.
    DotTick {
        /// DOT instance
        dot: DotId,
    },
    /// A projectile exceeded its lifetime without hitting anything.
    ProjectileExpiry {
        /// Projectile
        projectile: ProjectileId,
    },
}

/// The clock type every combat component schedules on.
pub type CombatClock = Clock<CombatTimer>;
