//! Combat resolver: health, death and match outcome.
//!
//! Owns every actor. Damage is the only path to death; healing is a
//! separate signed adjustment. Enemies and allies that reach zero health
//! are removed on the spot, while the player stays present at zero and the
//! match flips to [`MatchState::Defeat`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, CombatError};
use tracing::info;

use crate::actor::{Actor, ActorKind};
use crate::catalog::ClassId;

/// Overall outcome of a combat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Fight in progress.
    #[default]
    Active,
    /// Every tracked enemy was removed.
    Victory,
    /// The player's health reached zero.
    Defeat,
}

impl MatchState {
    /// Checks if the match is over.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

/// Change of match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTransition {
    /// State before.
    pub from: MatchState,
    /// State after.
    pub to: MatchState,
}

/// Result of applying damage to a tracked actor.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageOutcome {
    /// Damaged actor.
    pub target: ActorId,
    /// Health actually lost.
    pub applied: f32,
    /// Health left.
    pub remaining: f32,
    /// Actor that was removed because it died (never the player).
    pub removed: Option<Actor>,
    /// Match state change caused by this damage.
    pub transition: Option<MatchTransition>,
}

/// Actor removed from the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// The removed actor.
    pub actor: Actor,
    /// Match state change caused by the removal.
    pub transition: Option<MatchTransition>,
}

/// Authoritative health, resource and match state.
#[derive(Debug, Clone)]
pub struct CombatResolver {
    player: Actor,
    others: AHashMap<ActorId, Actor>,
    match_state: MatchState,
}

impl CombatResolver {
    /// Creates a resolver with a fresh player of `class` and no other actors.
    #[must_use]
    pub fn new(class: ClassId) -> Self {
        Self {
            player: Actor::player(class),
            others: AHashMap::new(),
            match_state: MatchState::Active,
        }
    }

    /// Tracks a new enemy or ally.
    pub fn register(&mut self, actor: Actor) -> Result<(), CombatError> {
        if actor.id.is_player() || actor.kind == ActorKind::Player {
            return Err(CombatError::PlayerReserved);
        }
        if self.others.contains_key(&actor.id) {
            return Err(CombatError::DuplicateActor(actor.id));
        }
        info!("Registered {:?} {} ({}, {} hp)", actor.kind, actor.id, actor.class, actor.max_health());
        self.others.insert(actor.id, actor);
        Ok(())
    }

    /// Applies non-negative damage.
    ///
    /// Returns `None` if the target is not tracked, which callers treat as a
    /// miss.
    pub fn damage(&mut self, target: ActorId, amount: f32) -> Option<DamageOutcome> {
        let actor = self.actor_mut(target)?;
        let applied = actor.take_damage(amount);
        let remaining = actor.health();
        let dead = !actor.is_alive();

        let mut outcome = DamageOutcome {
            target,
            applied,
            remaining,
            removed: None,
            transition: None,
        };
        if !dead {
            return Some(outcome);
        }

        if target.is_player() {
            outcome.transition = self.transition(MatchState::Defeat);
        } else if let Some(removal) = self.remove(target) {
            outcome.removed = Some(removal.actor);
            outcome.transition = removal.transition;
        }
        Some(outcome)
    }

    /// Signed health adjustment clamped to `[0, max]`. Dead actors are not
    /// revived. Returns the applied delta, or `None` for an untracked actor.
    pub fn heal(&mut self, target: ActorId, amount: f32) -> Option<f32> {
        let actor = self.actor_mut(target)?;
        if !actor.is_alive() {
            return Some(0.0);
        }
        Some(actor.adjust_health(amount))
    }

    /// Removes an enemy or ally. Removing the last enemy wins the match.
    /// The player is never removed.
    pub fn remove(&mut self, id: ActorId) -> Option<Removal> {
        let actor = self.others.remove(&id)?;
        info!("Removed {:?} {id}", actor.kind);
        let transition = if actor.kind == ActorKind::Enemy {
            self.victory_check()
        } else {
            None
        };
        Some(Removal { actor, transition })
    }

    /// Declares victory if no enemy remains.
    pub fn victory_check(&mut self) -> Option<MatchTransition> {
        if self.enemy_count() == 0 {
            self.transition(MatchState::Victory)
        } else {
            None
        }
    }

    fn transition(&mut self, to: MatchState) -> Option<MatchTransition> {
        if self.match_state != MatchState::Active || to == MatchState::Active {
            return None;
        }
        let from = self.match_state;
        self.match_state = to;
        info!("Match state {from:?} -> {to:?}");
        Some(MatchTransition { from, to })
    }

    /// Restores the player to the class maximums, drops every other actor
    /// and reactivates the match.
    pub fn reset(&mut self) -> Option<MatchTransition> {
        self.player.restore();
        self.others.clear();
        let from = std::mem::replace(&mut self.match_state, MatchState::Active);
        (from != MatchState::Active).then_some(MatchTransition {
            from,
            to: MatchState::Active,
        })
    }

    /// Replaces the player with a fresh one of `class`.
    pub fn set_player_class(&mut self, class: ClassId) {
        self.player = Actor::player(class);
    }

    /// Current match state.
    #[must_use]
    pub fn match_state(&self) -> MatchState {
        self.match_state
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Actor {
        &self.player
    }

    /// Looks up any tracked actor, player included.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        if id.is_player() {
            Some(&self.player)
        } else {
            self.others.get(&id)
        }
    }

    /// Mutable lookup of any tracked actor.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        if id.is_player() {
            Some(&mut self.player)
        } else {
            self.others.get_mut(&id)
        }
    }

    /// Every tracked actor, player first, others in ID order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        let mut others: Vec<&Actor> = self.others.values().collect();
        others.sort_by_key(|a| a.id);
        std::iter::once(&self.player).chain(others)
    }

    /// IDs of tracked actors of `kind`, in ID order.
    #[must_use]
    pub fn ids_of(&self, kind: ActorKind) -> Vec<ActorId> {
        self.actors().filter(|a| a.kind == kind).map(|a| a.id).collect()
    }

    /// Number of tracked enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.others.values().filter(|a| a.kind == ActorKind::Enemy).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(raw: u64) -> Actor {
        Actor::new(ActorId::from_raw(raw), ActorKind::Enemy, ClassId::Warrior, 100.0)
    }

    #[test]
    fn test_lethal_damage_removes_once() {
        let mut resolver = CombatResolver::new(ClassId::Warrior);
        resolver.register(enemy(1)).expect("register");
        resolver.register(enemy(2)).expect("register");

        let outcome = resolver.damage(ActorId::from_raw(1), 1000.0).expect("tracked");
        assert_eq!(outcome.applied, 100.0);
        assert_eq!(outcome.remaining, 0.0);
        assert!(outcome.removed.is_some());
        assert!(outcome.transition.is_none());

        assert!(resolver.damage(ActorId::from_raw(1), 10.0).is_none());
        assert_eq!(resolver.match_state(), MatchState::Active);
    }

    #[test]
    fn test_last_enemy_removed_is_victory() {
        let mut resolver = CombatResolver::new(ClassId::Mage);
        resolver.register(enemy(1)).expect("register");
        let ally = Actor::new(ActorId::from_raw(2), ActorKind::Ally, ClassId::Paladin, 100.0);
        resolver.register(ally).expect("register");

        assert!(resolver.remove(ActorId::from_raw(2)).is_some_and(|r| r.transition.is_none()));
        let removal = resolver.remove(ActorId::from_raw(1)).expect("tracked");
        assert_eq!(
            removal.transition,
            Some(MatchTransition {
                from: MatchState::Active,
                to: MatchState::Victory
            })
        );
    }

    #[test]
    fn test_player_death_is_defeat_and_stays_present() {
        let mut resolver = CombatResolver::new(ClassId::Mage);
        resolver.register(enemy(1)).expect("register");

        let outcome = resolver.damage(ActorId::PLAYER, 500.0).expect("player");
        assert_eq!(outcome.transition.map(|t| t.to), Some(MatchState::Defeat));
        assert!(outcome.removed.is_none());
        assert_eq!(resolver.player().health(), 0.0);

        // Terminal: later victory does not override.
        resolver.remove(ActorId::from_raw(1));
        assert_eq!(resolver.match_state(), MatchState::Defeat);
        assert_eq!(resolver.heal(ActorId::PLAYER, 50.0), Some(0.0));
    }

    #[test]
    fn test_reset_restores_class_maximums() {
        let mut resolver = CombatResolver::new(ClassId::Paladin);
        resolver.register(enemy(1)).expect("register");
        resolver.damage(ActorId::PLAYER, 1000.0);
        resolver.player.spend_resource(40.0);

        let transition = resolver.reset();
        assert_eq!(transition.map(|t| t.from), Some(MatchState::Defeat));
        assert_eq!(resolver.match_state(), MatchState::Active);
        assert_eq!(resolver.player().health(), 140.0);
        assert_eq!(resolver.player().resource(), 100.0);
        assert_eq!(resolver.enemy_count(), 0);
    }

    #[test]
    fn test_registration_errors() {
        let mut resolver = CombatResolver::new(ClassId::Warrior);
        resolver.register(enemy(1)).expect("register");
        assert_eq!(
            resolver.register(enemy(1)),
            Err(CombatError::DuplicateActor(ActorId::from_raw(1)))
        );
        assert_eq!(
            resolver.register(Actor::player(ClassId::Mage)),
            Err(CombatError::PlayerReserved)
        );
    }

    #[test]
    fn test_zero_damage_is_noop() {
        let mut resolver = CombatResolver::new(ClassId::Warrior);
        resolver.register(enemy(3)).expect("register");
        let outcome = resolver.damage(ActorId::from_raw(3), 0.0).expect("tracked");
        assert_eq!(outcome.applied, 0.0);
        assert_eq!(outcome.remaining, 100.0);
    }
}
