//! # Skirmish Combat
//!
//! Combat resolution core for the arena skirmish.
//!
//! This crate owns all authoritative combat state:
//! - Simulated clock with cancellable timers
//! - Cooldown ledger
//! - Status effects (stun, root, slow, fear, polymorph, corruption)
//! - Damage-over-time tracker
//! - Cast and channel controller
//! - Combat resolver (damage, healing, death, match outcome)
//! - Static ability catalog
//! - Projectiles, auto-attacks and nearest-target lookup
//! - Event bus and render snapshots
//!
//! Rendering, physics and input live outside; they talk to [`Skirmish`]
//! through inbound calls, a [`SpatialQuery`] implementation, drained
//! [`CombatEvent`]s and [`CombatSnapshot`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod casting;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod dot;
pub mod events;
pub mod projectile;
pub mod resolver;
pub mod skirmish;
pub mod snapshot;
pub mod spatial;
pub mod status;
pub mod timer;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::casting::*;
    pub use crate::catalog::*;
    pub use crate::clock::*;
    pub use crate::config::*;
    pub use crate::cooldown::*;
    pub use crate::dot::*;
    pub use crate::events::*;
    pub use crate::projectile::*;
    pub use crate::resolver::*;
    pub use crate::skirmish::*;
    pub use crate::snapshot::*;
    pub use crate::spatial::*;
    pub use crate::status::*;
    pub use crate::timer::*;
    pub use skirmish_common::prelude::*;
}

pub use prelude::*;
