//! # Skirmish Common
//!
//! Common types shared by every Skirmish crate:
//! - ID types (ActorId, EffectId, ProjectileId, ...)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_generation() {
        let id1 = ActorId::new();
        let id2 = ActorId::new();
        assert_ne!(id1, id2);
        assert!(!id1.is_player());
    }

    #[test]
    fn test_player_id_is_reserved() {
        assert!(ActorId::PLAYER.is_player());
        assert_eq!(ActorId::PLAYER.to_string(), "player");
        assert_eq!(ActorId::from_raw(7).to_string(), "actor#7");
    }

    #[test]
    fn test_error_conversion() {
        let err: SkirmishError = CatalogError::InvalidSlot(9).into();
        assert_eq!(err.to_string(), "Catalog error: ability slot 9 out of range (1-5)");

        let err: SkirmishError = CombatError::UnknownActor(ActorId::from_raw(3)).into();
        assert!(err.to_string().contains("actor#3"));
    }
}
