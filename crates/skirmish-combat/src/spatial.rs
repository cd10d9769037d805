//! Spatial queries supplied by the physics collaborator.
//!
//! The core never simulates movement. It asks where actors are when it needs
//! a range check, a homing point or the nearest target.

use ahash::AHashMap;
use glam::Vec3;
use skirmish_common::ActorId;

/// Trait for querying actor positions.
pub trait SpatialQuery {
    /// Current position of `actor`, or `None` if unknown.
    fn position(&self, actor: ActorId) -> Option<Vec3>;

    /// Distance between two actors, or `None` if either position is unknown.
    fn distance(&self, a: ActorId, b: ActorId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    /// Closest of `candidates` to `from`. Candidates with unknown positions
    /// are skipped.
    fn nearest(&self, from: ActorId, candidates: &[ActorId]) -> Option<ActorId> {
        candidates
            .iter()
            .filter(|c| **c != from)
            .filter_map(|c| self.distance(from, *c).map(|d| (*c, d)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }
}

/// Spatial query with no geometry. Every position is unknown, so range
/// checks pass and nearest-target lookups find nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpatial;

impl SpatialQuery for NoSpatial {
    fn position(&self, _actor: ActorId) -> Option<Vec3> {
        None
    }
}

/// Position table for tests and headless simulation.
#[derive(Debug, Clone, Default)]
pub struct MockSpatial {
    positions: AHashMap<ActorId, Vec3>,
}

impl MockSpatial {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places (or moves) an actor.
    pub fn set_position(&mut self, actor: ActorId, position: Vec3) {
        self.positions.insert(actor, position);
    }

    /// Forgets an actor.
    pub fn remove(&mut self, actor: ActorId) {
        self.positions.remove(&actor);
    }

    /// Moves `actor` toward `goal` by at most `max_step`, stopping `stop_at`
    /// units short of it. Returns the new position.
    pub fn step_toward(&mut self, actor: ActorId, goal: Vec3, max_step: f32, stop_at: f32) -> Option<Vec3> {
        let current = self.positions.get_mut(&actor)?;
        let offset = goal - *current;
        let travel = (offset.length() - stop_at).clamp(0.0, max_step.max(0.0));
        *current += offset.normalize_or_zero() * travel;
        Some(*current)
    }
}

impl SpatialQuery for MockSpatial {
    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.positions.get(&actor).copied()
    }
}
