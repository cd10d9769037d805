//! Error types for Skirmish.

use thiserror::Error;

use crate::ids::ActorId;

/// Top-level error type for Skirmish operations.
#[derive(Debug, Error)]
pub enum SkirmishError {
    /// Ability catalog lookups
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Combat registration and lookup errors
    #[error("Combat error: {0}")]
    Combat(#[from] CombatError),

    /// Configuration could not be parsed or serialized
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid static data. These are programmer or data errors and are raised
/// when a class or slot is named, never mid-combat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Class name does not exist in the catalog
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// Ability slot outside 1..=5
    #[error("ability slot {0} out of range (1-5)")]
    InvalidSlot(u8),
}

/// Errors for operations that need a registered actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// Actor is not tracked by this skirmish
    #[error("actor not found: {0}")]
    UnknownActor(ActorId),

    /// Actor ID is already registered
    #[error("actor already registered: {0}")]
    DuplicateActor(ActorId),

    /// The player ID cannot be registered as an enemy or ally
    #[error("the player id is reserved")]
    PlayerReserved,

    /// Max health must be positive and finite
    #[error("actor {0} registered without health")]
    InvalidHealth(ActorId),
}

/// Result type alias for Skirmish operations.
pub type SkirmishResult<T> = Result<T, SkirmishError>;
