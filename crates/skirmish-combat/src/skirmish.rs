//! The skirmish aggregate.
//!
//! [`Skirmish`] owns every piece of authoritative combat state and is the
//! only entry point for inbound calls. All mutation happens on one timeline:
//! inbound calls and [`Skirmish::tick`], which fires due timers in order.

use parking_lot::RwLock;
use serde::Serialize;
use skirmish_common::{ActorId, CastId, CombatError, EffectId, ProjectileId};
use std::sync::Arc;
use tracing::{debug, info};

use crate::actor::{Actor, ActorKind};
use crate::casting::{CastController, CastStart};
use crate::catalog::{Ability, AbilityEffect, AbilitySlot, ClassId};
use crate::config::SkirmishConfig;
use crate::cooldown::CooldownLedger;
use crate::dot::DotTracker;
use crate::events::{CombatEvent, EventBus, ProjectileFate};
use crate::projectile::{ProjectileLaunch, ProjectileTracker};
use crate::resolver::{CombatResolver, DamageOutcome, MatchState, MatchTransition};
use crate::snapshot::{ActorSnapshot, CombatSnapshot, CooldownSnapshot, ProjectileSnapshot};
use crate::spatial::SpatialQuery;
use crate::status::{StatusKind, StatusRegistry};
use crate::timer::{CombatClock, CombatTimer};

/// Cooldown ledger key for auto-attack swings.
pub const AUTO_ATTACK: &str = "auto_attack";

/// Skirmish handle shared between threads.
pub type SharedSkirmish = Arc<RwLock<Skirmish>>;

/// Why an action was turned down. Rejections consume nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The match is already won or lost.
    MatchOver,
    /// The requester is not tracked.
    UnknownActor,
    /// The requester has no health left.
    Dead,
    /// The requester is casting or channeling.
    AlreadyCasting,
    /// Stunned, feared or polymorphed.
    Incapacitated,
    /// Still cooling down.
    OnCooldown {
        /// Seconds until ready
        remaining: f32,
    },
    /// Not enough resource.
    InsufficientResource {
        /// Cost
        needed: f32,
        /// Available
        available: f32,
    },
    /// Auto-attack target is missing, dead or friendly.
    InvalidTarget,
    /// Auto-attack target is beyond reach.
    OutOfRange,
}

/// Result of an ability or auto-attack request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AbilityOutcome {
    /// Resolved synchronously. `landed` is false for a miss.
    Resolved {
        /// Whether it found its target
        landed: bool,
    },
    /// A cast began and will resolve later.
    CastStarted(CastId),
    /// A channel began and will tick every second.
    ChannelStarted(CastId),
    /// Turned down; nothing was consumed.
    Rejected(RejectReason),
}

impl AbilityOutcome {
    /// Checks if the request went through.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Authoritative combat state for one match.
#[derive(Debug)]
pub struct Skirmish {
    config: SkirmishConfig,
    clock: CombatClock,
    cooldowns: CooldownLedger,
    statuses: StatusRegistry,
    dots: DotTracker,
    casts: CastController,
    resolver: CombatResolver,
    projectiles: ProjectileTracker,
    events: EventBus,
    target: Option<ActorId>,
}

impl Default for Skirmish {
    fn default() -> Self {
        Self::new(SkirmishConfig::default())
    }
}

impl Skirmish {
    /// Creates a match with the configured player class and no other actors.
    #[must_use]
    pub fn new(config: SkirmishConfig) -> Self {
        info!("Starting skirmish as {}", config.player_class);
        Self {
            clock: CombatClock::new(),
            cooldowns: CooldownLedger::new(),
            statuses: StatusRegistry::new(config.slow_multiplier),
            dots: DotTracker::new(),
            casts: CastController::new(),
            resolver: CombatResolver::new(config.player_class),
            projectiles: ProjectileTracker::new(),
            events: EventBus::new(config.event_capacity),
            target: None,
            config,
        }
    }

    /// Wraps the skirmish for sharing between threads.
    #[must_use]
    pub fn into_shared(self) -> SharedSkirmish {
        Arc::new(RwLock::new(self))
    }

    // ========================================================================
    // Inbound: entities
    // ========================================================================

    /// Tracks an enemy or ally spawned by the scene.
    pub fn register_entity(
        &mut self,
        kind: ActorKind,
        id: ActorId,
        class: ClassId,
        max_health: f32,
    ) -> Result<(), CombatError> {
        if kind == ActorKind::Player {
            return Err(CombatError::PlayerReserved);
        }
        if !max_health.is_finite() || max_health <= 0.0 {
            return Err(CombatError::InvalidHealth(id));
        }
        self.resolver.register(Actor::new(id, kind, class, max_health))
    }

    /// Removes an enemy or ally, discarding its effects, DOTs and cast.
    pub fn remove_entity(&mut self, id: ActorId) -> Result<(), CombatError> {
        if id.is_player() {
            return Err(CombatError::PlayerReserved);
        }
        let removal = self.resolver.remove(id).ok_or(CombatError::UnknownActor(id))?;
        self.cascade_removal(&removal.actor, removal.transition);
        Ok(())
    }

    fn cascade_removal(&mut self, actor: &Actor, transition: Option<MatchTransition>) {
        let id = actor.id;
        let effects = self.statuses.clear_target(&mut self.clock, id);
        let dots = self.dots.clear_target(&mut self.clock, id);
        self.cancel_cast(id);
        self.cooldowns.reset(id);
        if self.target == Some(id) {
            self.target = None;
        }
        debug!("Discarded {} effects and {} DOTs with {id}", effects.len(), dots.len());

        self.events.publish(CombatEvent::EntityRemoved {
            actor: id,
            kind: actor.kind,
        });
        self.publish_transition(transition);
    }

    fn publish_transition(&mut self, transition: Option<MatchTransition>) {
        let Some(MatchTransition { from, to }) = transition else {
            return;
        };
        if to == MatchState::Defeat {
            self.cancel_cast(ActorId::PLAYER);
            self.statuses.clear_target(&mut self.clock, ActorId::PLAYER);
            self.dots.clear_target(&mut self.clock, ActorId::PLAYER);
        }
        self.events.publish(CombatEvent::MatchStateChanged { from, to });
    }

    /// Sets the player's current target. `None` clears it.
    pub fn set_target(&mut self, target: Option<ActorId>) -> Result<(), CombatError> {
        if let Some(id) = target {
            if self.resolver.actor(id).is_none() {
                return Err(CombatError::UnknownActor(id));
            }
        }
        self.target = target;
        Ok(())
    }

    /// Switches the player class, restoring health and resource to the new
    /// class maximums.
    pub fn set_class(&mut self, class: ClassId) {
        self.cancel_cast(ActorId::PLAYER);
        self.cooldowns.reset(ActorId::PLAYER);
        self.resolver.set_player_class(class);
        self.config.player_class = class;
        info!("Player class set to {class}");
    }

    /// Resets the match: player restored, every other actor dropped, all
    /// timers, cooldowns, effects, DOTs, casts and projectiles cleared.
    pub fn request_match_reset(&mut self) {
        self.clock.clear();
        self.cooldowns.clear();
        self.statuses.clear();
        self.dots.clear();
        self.casts.clear();
        self.projectiles.clear();
        self.target = None;

        if let Some(MatchTransition { from, to }) = self.resolver.reset() {
            self.events.publish(CombatEvent::MatchStateChanged { from, to });
        }
        info!("Match reset");
    }

    // ========================================================================
    // Inbound: actions
    // ========================================================================

    /// Requests the ability in `slot` for `actor`.
    ///
    /// The player falls back to its current target when `target` is `None`.
    /// Gates, in order: match active, actor tracked, alive, not casting, not
    /// incapacitated, off cooldown, enough resource. Only a request passing
    /// every gate consumes the cooldown.
    pub fn request_ability(
        &mut self,
        actor: ActorId,
        slot: AbilitySlot,
        target: Option<ActorId>,
        spatial: &dyn SpatialQuery,
    ) -> AbilityOutcome {
        let target = if actor.is_player() { target.or(self.target) } else { target };

        let ability = match self.gate_ability(actor, slot) {
            Ok(ability) => ability,
            Err(reason) => {
                debug!("{actor} slot {} rejected: {reason:?}", slot.number());
                self.events.publish(CombatEvent::AbilityRejected {
                    actor,
                    slot: slot.number(),
                    reason,
                });
                return AbilityOutcome::Rejected(reason);
            },
        };

        let now = self.clock.now_ms();
        if !self.cooldowns.try_consume(now, actor, ability.id, ability.cooldown) {
            let remaining = self.cooldowns.remaining_secs(now, actor, ability.id);
            return AbilityOutcome::Rejected(RejectReason::OnCooldown { remaining });
        }
        if let Some(actor) = self.resolver.actor_mut(actor) {
            actor.spend_resource(ability.cost.unwrap_or(0.0));
        }

        info!("{actor} uses {}", ability.name);
        self.events.publish(CombatEvent::AbilityUsed {
            actor,
            ability: ability.id,
            target,
        });

        if let Some(seconds) = ability.channel_time.filter(|s| *s > 0) {
            if self.valid_target(actor, target).is_none() {
                self.publish_miss(actor, ability, target);
                return AbilityOutcome::Resolved { landed: false };
            }
            let start = self.casts.start_channel(&mut self.clock, actor, ability, target, seconds);
            return self.started(actor, ability, target, start, spatial);
        }
        if let Some(seconds) = ability.cast_time.filter(|s| *s > 0.0) {
            let start = self.casts.start_cast(&mut self.clock, actor, ability, target, seconds);
            return self.started(actor, ability, target, start, spatial);
        }

        let landed = self.resolve(actor, ability, target, spatial);
        AbilityOutcome::Resolved { landed }
    }

    fn gate_ability(&self, actor: ActorId, slot: AbilitySlot) -> Result<&'static Ability, RejectReason> {
        if self.resolver.match_state().is_terminal() {
            return Err(RejectReason::MatchOver);
        }
        let caster = self.resolver.actor(actor).ok_or(RejectReason::UnknownActor)?;
        if !caster.is_alive() {
            return Err(RejectReason::Dead);
        }
        if self.casts.is_casting(actor) {
            return Err(RejectReason::AlreadyCasting);
        }
        if self.statuses.is_incapacitated(actor) {
            return Err(RejectReason::Incapacitated);
        }

        let ability = caster.class.ability(slot);
        let now = self.clock.now_ms();
        if !self.cooldowns.is_ready(now, actor, ability.id) {
            return Err(RejectReason::OnCooldown {
                remaining: self.cooldowns.remaining_secs(now, actor, ability.id),
            });
        }
        let cost = ability.cost.unwrap_or(0.0);
        if !caster.has_resource(cost) {
            return Err(RejectReason::InsufficientResource {
                needed: cost,
                available: caster.resource(),
            });
        }
        Ok(ability)
    }

    fn started(
        &mut self,
        actor: ActorId,
        ability: &'static Ability,
        target: Option<ActorId>,
        start: CastStart,
        spatial: &dyn SpatialQuery,
    ) -> AbilityOutcome {
        match start {
            CastStart::Instant => AbilityOutcome::Resolved {
                landed: self.resolve(actor, ability, target, spatial),
            },
            CastStart::Started { id, replaced } => {
                if let Some(old) = replaced {
                    self.events.publish(CombatEvent::CastCancelled {
                        actor,
                        ability: old.ability.id,
                    });
                }
                let (duration, channel) = self
                    .casts
                    .active(actor)
                    .map_or((0.0, false), |c| (c.duration, c.channel.is_some()));
                self.events.publish(CombatEvent::CastStarted {
                    actor,
                    ability: ability.id,
                    duration,
                    channel,
                });
                if channel {
                    AbilityOutcome::ChannelStarted(id)
                } else {
                    AbilityOutcome::CastStarted(id)
                }
            },
        }
    }

    /// Interrupts the actor's cast or channel. Nothing already resolved is
    /// undone. Returns false if nothing was in progress.
    pub fn cancel_cast(&mut self, actor: ActorId) -> bool {
        let Some(cast) = self.casts.cancel(&mut self.clock, actor) else {
            return false;
        };
        self.events.publish(CombatEvent::CastCancelled {
            actor,
            ability: cast.ability.id,
        });
        true
    }

    /// Swings (melee) or fires (ranged) an auto-attack at `target`.
    ///
    /// Enemies always swing in melee. Warriors and Paladins swing, Mages and
    /// Warlocks fire a projectile. Gated by the swing interval.
    pub fn request_auto_attack(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        spatial: &dyn SpatialQuery,
    ) -> AbilityOutcome {
        match self.gate_auto_attack(attacker, target, spatial) {
            Ok(ranged) => {
                self.events.publish(CombatEvent::AbilityUsed {
                    actor: attacker,
                    ability: AUTO_ATTACK,
                    target: Some(target),
                });
                if ranged {
                    let launch = ProjectileLaunch {
                        source: attacker,
                        target: Some(target),
                        ability: AUTO_ATTACK,
                        damage: self.config.ranged_damage,
                        speed: self.config.ranged_projectile_speed,
                    };
                    self.launch_projectile(launch, spatial);
                } else {
                    let damage = if self.kind_of(attacker) == Some(ActorKind::Enemy) {
                        self.config.enemy_melee_damage
                    } else {
                        self.config.melee_damage
                    };
                    self.damage(Some(attacker), target, damage);
                }
                AbilityOutcome::Resolved { landed: true }
            },
            Err(reason) => AbilityOutcome::Rejected(reason),
        }
    }

    /// Returns whether the swing is ranged.
    fn gate_auto_attack(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        spatial: &dyn SpatialQuery,
    ) -> Result<bool, RejectReason> {
        if self.resolver.match_state().is_terminal() {
            return Err(RejectReason::MatchOver);
        }
        let source = self.resolver.actor(attacker).ok_or(RejectReason::UnknownActor)?;
        if !source.is_alive() {
            return Err(RejectReason::Dead);
        }
        let victim = self
            .resolver
            .actor(target)
            .filter(|t| t.is_alive() && t.kind.is_hostile_to(source.kind))
            .ok_or(RejectReason::InvalidTarget)?;
        if self.casts.is_casting(attacker) {
            return Err(RejectReason::AlreadyCasting);
        }
        if self.statuses.is_incapacitated(attacker) {
            return Err(RejectReason::Incapacitated);
        }

        let ranged = source.kind != ActorKind::Enemy && source.class.is_ranged();
        let reach = if ranged {
            self.config.ranged_range
        } else {
            self.config.melee_range
        };
        if !in_range(spatial, attacker, victim.id, Some(reach)) {
            return Err(RejectReason::OutOfRange);
        }

        let now = self.clock.now_ms();
        if !self
            .cooldowns
            .try_consume(now, attacker, AUTO_ATTACK, self.config.auto_attack_interval)
        {
            return Err(RejectReason::OnCooldown {
                remaining: self.cooldowns.remaining_secs(now, attacker, AUTO_ATTACK),
            });
        }
        Ok(ranged)
    }

    /// Reports that a projectile hit `hit`, or nothing. A hit on an actor
    /// that no longer exists counts as a miss. Returns `None` for an unknown
    /// projectile.
    pub fn projectile_impact(&mut self, id: ProjectileId, hit: Option<ActorId>) -> Option<ProjectileFate> {
        let projectile = self.projectiles.resolve(&mut self.clock, id)?;
        let victim = hit.filter(|t| self.resolver.actor(*t).is_some_and(Actor::is_alive));

        let fate = match victim {
            Some(target) => {
                self.damage(Some(projectile.source), target, projectile.damage);
                ProjectileFate::Hit
            },
            None => ProjectileFate::Missed,
        };
        self.events.publish(CombatEvent::ProjectileResolved {
            projectile: id,
            fate,
            hit: victim,
        });
        Some(fate)
    }

    /// Nearest living actor hostile to `from`.
    pub fn nearest_hostile(&self, from: ActorId, spatial: &dyn SpatialQuery) -> Option<ActorId> {
        let kind = self.kind_of(from)?;
        let candidates: Vec<ActorId> = self
            .resolver
            .actors()
            .filter(|a| a.is_alive() && a.kind.is_hostile_to(kind))
            .map(|a| a.id)
            .collect();
        spatial.nearest(from, &candidates)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Applies non-negative damage and handles death. Returns `None` if the
    /// target is not tracked.
    pub fn damage(&mut self, source: Option<ActorId>, target: ActorId, amount: f32) -> Option<DamageOutcome> {
        let outcome = self.resolver.damage(target, amount.max(0.0))?;
        self.events.publish(CombatEvent::DamageApplied {
            source,
            target,
            amount: outcome.applied,
            remaining: outcome.remaining,
        });
        match &outcome.removed {
            Some(actor) => self.cascade_removal(actor, outcome.transition),
            None => self.publish_transition(outcome.transition),
        }
        Some(outcome)
    }

    /// Restores health. Dead actors stay dead. Returns the amount restored.
    pub fn heal(&mut self, source: Option<ActorId>, target: ActorId, amount: f32) -> Option<f32> {
        let healed = self.resolver.heal(target, amount.max(0.0))?;
        if healed > 0.0 {
            self.events.publish(CombatEvent::Healed {
                source,
                target,
                amount: healed,
            });
        }
        Some(healed)
    }

    /// Applies a status effect to a living tracked actor.
    pub fn apply_status(&mut self, target: ActorId, kind: StatusKind, duration: f32) -> Option<EffectId> {
        if !self.resolver.actor(target).is_some_and(Actor::is_alive) {
            return None;
        }
        let effect = self.statuses.apply(&mut self.clock, target, kind, duration);
        self.events.publish(CombatEvent::EffectApplied {
            target,
            effect,
            kind,
            duration,
        });
        Some(effect)
    }

    /// A living target on the other side from `caster`.
    fn valid_target(&self, caster: ActorId, target: Option<ActorId>) -> Option<ActorId> {
        let side = self.kind_of(caster)?;
        target.filter(|t| {
            self.resolver
                .actor(*t)
                .is_some_and(|a| a.is_alive() && a.kind.is_hostile_to(side))
        })
    }

    fn publish_miss(&mut self, actor: ActorId, ability: &'static Ability, target: Option<ActorId>) {
        debug!("{actor} {} missed", ability.id);
        self.events.publish(CombatEvent::AbilityMissed {
            actor,
            ability: ability.id,
            target,
        });
    }

    fn launch_projectile(&mut self, launch: ProjectileLaunch, spatial: &dyn SpatialQuery) -> ProjectileId {
        let id = self
            .projectiles
            .launch(&mut self.clock, launch, spatial, self.config.projectile_lifetime);
        self.events.publish(CombatEvent::ProjectileLaunched {
            projectile: id,
            source: launch.source,
            target: launch.target,
        });
        id
    }

    /// Runs an ability's resolution effects. Returns false on a miss.
    fn resolve(
        &mut self,
        caster: ActorId,
        ability: &'static Ability,
        target: Option<ActorId>,
        spatial: &dyn SpatialQuery,
    ) -> bool {
        let Some(caster_kind) = self.kind_of(caster) else {
            return false;
        };
        let victim = self.valid_target(caster, target);
        let reach = victim.filter(|t| in_range(spatial, caster, *t, ability.range));
        if ability.needs_target() && reach.is_none() {
            self.publish_miss(caster, ability, target);
            return false;
        }

        for effect in ability.effects {
            match *effect {
                AbilityEffect::Strike => {
                    if let Some(t) = reach {
                        self.damage(Some(caster), t, ability.damage_amount());
                    }
                },
                AbilityEffect::Projectile { speed } => {
                    let launch = ProjectileLaunch {
                        source: caster,
                        target: victim,
                        ability: ability.id,
                        damage: ability.damage_amount(),
                        speed,
                    };
                    self.launch_projectile(launch, spatial);
                },
                AbilityEffect::Status { kind, duration } => {
                    if let Some(t) = reach {
                        self.apply_status(t, kind, duration);
                    }
                },
                AbilityEffect::AreaStatus { kind, duration } => {
                    let caught: Vec<ActorId> = self
                        .resolver
                        .actors()
                        .filter(|a| a.is_alive() && a.kind.is_hostile_to(caster_kind))
                        .map(|a| a.id)
                        .filter(|id| in_range(spatial, caster, *id, ability.range))
                        .collect();
                    for id in caught {
                        self.apply_status(id, kind, duration);
                    }
                },
                AbilityEffect::DamageOverTime { seconds } => {
                    if let Some(t) = reach {
                        let tag = self.apply_status(t, StatusKind::Corruption, seconds as f32);
                        self.dots
                            .apply(&mut self.clock, caster, t, ability.damage_amount(), seconds, tag);
                    }
                },
                // Applied per channel tick.
                AbilityEffect::Drain { .. } => {},
                AbilityEffect::SelfHeal => {
                    self.heal(Some(caster), caster, ability.heal_amount());
                },
                AbilityEffect::Reposition(movement) => {
                    self.events.publish(CombatEvent::MovementRequested {
                        actor: caster,
                        movement,
                        toward: victim,
                    });
                },
            }
        }
        true
    }

    fn channel_tick(&mut self, caster: ActorId, ability: &'static Ability, target: Option<ActorId>) {
        for effect in ability.effects {
            if let AbilityEffect::Drain { heal_per_tick } = *effect {
                match self.valid_target(caster, target) {
                    Some(t) => {
                        self.damage(Some(caster), t, ability.damage_amount());
                        self.heal(Some(caster), caster, heal_per_tick);
                    },
                    None => self.publish_miss(caster, ability, target),
                }
            }
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Advances the simulation by `dt` seconds, firing every due timer in
    /// order on this thread.
    pub fn tick(&mut self, dt: f32, spatial: &dyn SpatialQuery) {
        self.projectiles.track(spatial);
        let deadline = self.clock.deadline_after(dt);
        while let Some((_, timer)) = self.clock.pop_due(deadline) {
            self.dispatch(timer, spatial);
        }
        self.clock.advance_to(deadline);
    }

    fn dispatch(&mut self, timer: CombatTimer, spatial: &dyn SpatialQuery) {
        match timer {
            CombatTimer::CastComplete { actor, cast } => {
                let Some(done) = self.casts.complete(actor, cast) else {
                    return;
                };
                debug!("{actor} finished {}", done.ability.id);
                self.events.publish(CombatEvent::CastCompleted {
                    actor,
                    ability: done.ability.id,
                });
                if done.channel.is_none() {
                    self.resolve(actor, done.ability, done.target, spatial);
                }
            },
            CombatTimer::ChannelTick { actor, cast } => {
                let Some(active) = self.casts.channel_tick(actor, cast) else {
                    return;
                };
                let (ability, target) = (active.ability, active.target);
                let tick = active.channel.map_or(0, |t| t.fired);
                self.events.publish(CombatEvent::ChannelTicked {
                    actor,
                    ability: ability.id,
                    tick,
                });
                self.channel_tick(actor, ability, target);
            },
            CombatTimer::EffectExpiry { target, effect } => {
                if let Some(expired) = self.statuses.expire(target, effect) {
                    self.events.publish(CombatEvent::EffectExpired {
                        target,
                        effect,
                        kind: expired.kind,
                    });
                }
            },
            CombatTimer::DotTick { dot } => {
                if let Some(tick) = self.dots.tick(&mut self.clock, dot) {
                    self.damage(Some(tick.source), tick.target, tick.damage);
                }
            },
            CombatTimer::ProjectileExpiry { projectile } => {
                if self.projectiles.expire(projectile).is_some() {
                    debug!("Projectile {projectile:?} expired");
                    self.events.publish(CombatEvent::ProjectileResolved {
                        projectile,
                        fate: ProjectileFate::Expired,
                        hit: None,
                    });
                }
            },
        }
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Takes every event published since the last drain.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// The event bus, for handing receivers to other threads.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Builds a render snapshot.
    #[must_use]
    pub fn snapshot(&self, spatial: &dyn SpatialQuery) -> CombatSnapshot {
        let now = self.clock.now_ms();
        let player = self.resolver.player();

        let actors = self
            .resolver
            .actors()
            .map(|a| ActorSnapshot {
                id: a.id,
                kind: a.kind,
                class: a.class,
                health: a.health(),
                max_health: a.max_health(),
                resource: a.resource(),
                max_resource: a.max_resource(),
                alive: a.is_alive(),
                effects: self.statuses.kinds(a.id),
                movement: self.statuses.movement(a.id),
                cast: self.casts.progress(now, a.id),
            })
            .collect();

        let cooldowns = AbilitySlot::all()
            .map(|slot| {
                let ability = player.class.ability(slot);
                CooldownSnapshot {
                    slot: slot.number(),
                    ability: ability.id,
                    name: ability.name,
                    remaining: self.cooldowns.remaining_secs(now, ActorId::PLAYER, ability.id),
                }
            })
            .collect();

        let mut projectiles: Vec<ProjectileSnapshot> = self
            .projectiles
            .iter()
            .map(|p| ProjectileSnapshot {
                id: p.id,
                source: p.source,
                target: p.target,
                ability: p.ability,
                position: p.position(now, spatial),
            })
            .collect();
        projectiles.sort_by_key(|p| p.id);

        CombatSnapshot {
            time: self.clock.now_secs(),
            match_state: self.resolver.match_state(),
            player_class: player.class,
            target: self.target,
            actors,
            cooldowns,
            projectiles,
        }
    }

    /// Current match state.
    #[must_use]
    pub fn match_state(&self) -> MatchState {
        self.resolver.match_state()
    }

    /// Looks up a tracked actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.resolver.actor(id)
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Actor {
        self.resolver.player()
    }

    /// IDs of tracked actors on one side.
    #[must_use]
    pub fn ids_of(&self, kind: ActorKind) -> Vec<ActorId> {
        self.resolver.ids_of(kind)
    }

    fn kind_of(&self, id: ActorId) -> Option<ActorKind> {
        self.resolver.actor(id).map(|a| a.kind)
    }

    /// The player's current target.
    #[must_use]
    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Checks if the actor is casting or channeling.
    #[must_use]
    pub fn is_casting(&self, actor: ActorId) -> bool {
        self.casts.is_casting(actor)
    }

    /// Seconds until the ability in `slot` is ready for `actor`.
    #[must_use]
    pub fn cooldown_remaining(&self, actor: ActorId, slot: AbilitySlot) -> f32 {
        let Some(class) = self.resolver.actor(actor).map(|a| a.class) else {
            return 0.0;
        };
        self.cooldowns
            .remaining_secs(self.clock.now_ms(), actor, class.ability(slot).id)
    }

    /// Status effects on every actor.
    #[must_use]
    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    /// Running DOTs.
    #[must_use]
    pub fn dots(&self) -> &DotTracker {
        &self.dots
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &ProjectileTracker {
        &self.projectiles
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SkirmishConfig {
        &self.config
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.clock.pending_count()
    }
}

/// Range check between two actors. Unknown geometry counts as in range.
fn in_range(spatial: &dyn SpatialQuery, from: ActorId, to: ActorId, range: Option<f32>) -> bool {
    match (range, spatial.distance(from, to)) {
        (Some(range), Some(distance)) => distance <= range,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{MockSpatial, NoSpatial};
    use glam::Vec3;

    fn slot(n: u8) -> AbilitySlot {
        AbilitySlot::new(n).expect("valid slot")
    }

    fn with_enemy(class: ClassId) -> (Skirmish, ActorId) {
        let mut skirmish = Skirmish::new(SkirmishConfig {
            player_class: class,
            ..SkirmishConfig::default()
        });
        let enemy = ActorId::from_raw(100);
        skirmish
            .register_entity(ActorKind::Enemy, enemy, ClassId::Warrior, 100.0)
            .expect("register");
        skirmish.set_target(Some(enemy)).expect("target");
        (skirmish, enemy)
    }

    #[test]
    fn test_cooldown_gate() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        assert!(skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial).is_accepted());
        assert!(matches!(
            skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial),
            AbilityOutcome::Rejected(RejectReason::OnCooldown { .. })
        ));
        skirmish.tick(1.5, &NoSpatial);
        assert!(skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial).is_accepted());
        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(70.0));
    }

    #[test]
    fn test_casting_blocks_other_abilities() {
        let (mut skirmish, _) = with_enemy(ClassId::Mage);
        let outcome = skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial);
        assert!(matches!(outcome, AbilityOutcome::CastStarted(_)));
        assert_eq!(
            skirmish.request_ability(ActorId::PLAYER, slot(2), None, &NoSpatial),
            AbilityOutcome::Rejected(RejectReason::AlreadyCasting)
        );
        // The frost nova request was turned down without touching its cooldown.
        assert_eq!(skirmish.cooldown_remaining(ActorId::PLAYER, slot(2)), 0.0);
    }

    #[test]
    fn test_cast_resolves_into_projectile() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Mage);
        skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial);
        skirmish.tick(1.0, &NoSpatial);
        assert!(skirmish.projectiles().is_empty());
        skirmish.tick(0.5, &NoSpatial);
        assert!(!skirmish.is_casting(ActorId::PLAYER));

        let projectile = skirmish.projectiles().iter().next().map(|p| p.id).expect("launched");
        assert_eq!(skirmish.projectile_impact(projectile, Some(enemy)), Some(ProjectileFate::Hit));
        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(80.0));
    }

    #[test]
    fn test_strike_out_of_range_misses_but_spends_cooldown() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        let mut spatial = MockSpatial::new();
        spatial.set_position(ActorId::PLAYER, Vec3::ZERO);
        spatial.set_position(enemy, Vec3::new(10.0, 0.0, 0.0));

        let outcome = skirmish.request_ability(ActorId::PLAYER, slot(1), None, &spatial);
        assert_eq!(outcome, AbilityOutcome::Resolved { landed: false });
        assert!(skirmish.cooldown_remaining(ActorId::PLAYER, slot(1)) > 0.0);
        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(100.0));
        assert!(skirmish
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::AbilityMissed { .. })));
    }

    #[test]
    fn test_stunned_actor_cannot_act() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        skirmish.apply_status(ActorId::PLAYER, StatusKind::Stun, 3.0);
        assert_eq!(
            skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial),
            AbilityOutcome::Rejected(RejectReason::Incapacitated)
        );
        skirmish.tick(3.0, &NoSpatial);
        assert!(skirmish.request_ability(ActorId::PLAYER, slot(1), Some(enemy), &NoSpatial).is_accepted());
    }

    #[test]
    fn test_hammer_stuns_then_strikes() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Paladin);
        skirmish.request_ability(ActorId::PLAYER, slot(4), None, &NoSpatial);
        assert!(skirmish.statuses().has(enemy, StatusKind::Stun));
        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(95.0));
        assert_eq!(
            skirmish.request_ability(enemy, slot(1), Some(ActorId::PLAYER), &NoSpatial),
            AbilityOutcome::Rejected(RejectReason::Incapacitated)
        );
    }

    #[test]
    fn test_frost_nova_roots_hostiles_in_radius() {
        let (mut skirmish, near) = with_enemy(ClassId::Mage);
        let far = ActorId::from_raw(101);
        let ally = ActorId::from_raw(102);
        skirmish
            .register_entity(ActorKind::Enemy, far, ClassId::Warrior, 100.0)
            .expect("register");
        skirmish
            .register_entity(ActorKind::Ally, ally, ClassId::Paladin, 100.0)
            .expect("register");

        let mut spatial = MockSpatial::new();
        spatial.set_position(ActorId::PLAYER, Vec3::ZERO);
        spatial.set_position(near, Vec3::new(5.0, 0.0, 0.0));
        spatial.set_position(far, Vec3::new(30.0, 0.0, 0.0));
        spatial.set_position(ally, Vec3::new(1.0, 0.0, 0.0));

        skirmish.request_ability(ActorId::PLAYER, slot(2), None, &spatial);
        assert!(skirmish.statuses().has(near, StatusKind::Root));
        assert!(!skirmish.statuses().has(far, StatusKind::Root));
        assert!(!skirmish.statuses().has(ally, StatusKind::Root));

        skirmish.tick(4.0, &spatial);
        assert!(!skirmish.statuses().has(near, StatusKind::Root));
    }

    #[test]
    fn test_holy_light_heals_self() {
        let (mut skirmish, _) = with_enemy(ClassId::Paladin);
        skirmish.damage(None, ActorId::PLAYER, 50.0);
        skirmish.request_ability(ActorId::PLAYER, slot(3), None, &NoSpatial);
        skirmish.tick(2.0, &NoSpatial);
        assert_eq!(skirmish.player().health(), 120.0);
    }

    #[test]
    fn test_life_drain_ticks_and_heals() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warlock);
        skirmish.damage(None, ActorId::PLAYER, 60.0);
        let outcome = skirmish.request_ability(ActorId::PLAYER, slot(4), None, &NoSpatial);
        assert!(matches!(outcome, AbilityOutcome::ChannelStarted(_)));

        skirmish.tick(4.0, &NoSpatial);
        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(60.0));
        assert_eq!(skirmish.player().health(), 80.0);
        assert!(!skirmish.is_casting(ActorId::PLAYER));
    }

    #[test]
    fn test_cancelled_drain_keeps_fired_ticks() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warlock);
        skirmish.damage(None, ActorId::PLAYER, 60.0);
        skirmish.request_ability(ActorId::PLAYER, slot(4), None, &NoSpatial);

        skirmish.tick(2.5, &NoSpatial);
        assert!(skirmish.cancel_cast(ActorId::PLAYER));
        skirmish.tick(5.0, &NoSpatial);

        assert_eq!(skirmish.actor(enemy).map(Actor::health), Some(80.0));
        assert_eq!(skirmish.player().health(), 60.0);
        let ticks = skirmish
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::ChannelTicked { .. }))
            .count();
        assert_eq!(ticks, 2);
    }

    #[test]
    fn test_life_drain_without_target_misses() {
        let (mut skirmish, _) = with_enemy(ClassId::Warlock);
        skirmish.set_target(None).expect("clear");
        assert_eq!(
            skirmish.request_ability(ActorId::PLAYER, slot(4), None, &NoSpatial),
            AbilityOutcome::Resolved { landed: false }
        );
        assert!(!skirmish.is_casting(ActorId::PLAYER));
    }

    #[test]
    fn test_abilities_only_land_on_hostiles() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        let ally = ActorId::from_raw(7);
        let warlock = ActorId::from_raw(101);
        skirmish
            .register_entity(ActorKind::Ally, ally, ClassId::Paladin, 100.0)
            .expect("register");
        skirmish
            .register_entity(ActorKind::Enemy, warlock, ClassId::Warlock, 100.0)
            .expect("register");

        skirmish.set_target(Some(ally)).expect("target");
        assert_eq!(
            skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial),
            AbilityOutcome::Resolved { landed: false }
        );
        assert_eq!(skirmish.actor(ally).map(Actor::health), Some(100.0));

        assert!(matches!(
            skirmish.request_ability(warlock, slot(3), Some(enemy), &NoSpatial),
            AbilityOutcome::CastStarted(_)
        ));
        skirmish.tick(1.5, &NoSpatial);
        assert!(!skirmish.statuses().has(enemy, StatusKind::Fear));
    }

    #[test]
    fn test_defeat_stops_timers_on_player() {
        let (mut skirmish, _) = with_enemy(ClassId::Warrior);
        let warlock = ActorId::from_raw(101);
        skirmish
            .register_entity(ActorKind::Enemy, warlock, ClassId::Warlock, 100.0)
            .expect("register");
        skirmish.request_ability(warlock, slot(2), Some(ActorId::PLAYER), &NoSpatial);
        assert_eq!(skirmish.player().health(), 145.0);
        assert_eq!(skirmish.dots().on_target(ActorId::PLAYER).count(), 1);

        skirmish.damage(None, ActorId::PLAYER, 500.0);
        assert_eq!(skirmish.match_state(), MatchState::Defeat);
        assert_eq!(skirmish.dots().on_target(ActorId::PLAYER).count(), 0);
        assert!(skirmish.statuses().list(ActorId::PLAYER).is_empty());
        skirmish.drain_events();

        skirmish.tick(15.0, &NoSpatial);
        assert!(!skirmish
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::DamageApplied { .. } | CombatEvent::EffectExpired { .. })));
    }

    #[test]
    fn test_charge_requests_movement() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        skirmish.request_ability(ActorId::PLAYER, slot(2), None, &NoSpatial);
        assert!(skirmish.drain_events().contains(&CombatEvent::MovementRequested {
            actor: ActorId::PLAYER,
            movement: crate::catalog::Reposition::Charge,
            toward: Some(enemy),
        }));
    }

    #[test]
    fn test_auto_attacks() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        let mut spatial = MockSpatial::new();
        spatial.set_position(ActorId::PLAYER, Vec3::ZERO);
        spatial.set_position(enemy, Vec3::new(1.5, 0.0, 0.0));

        assert!(skirmish.request_auto_attack(enemy, ActorId::PLAYER, &spatial).is_accepted());
        assert_eq!(skirmish.player().health(), 140.0);
        assert!(matches!(
            skirmish.request_auto_attack(enemy, ActorId::PLAYER, &spatial),
            AbilityOutcome::Rejected(RejectReason::OnCooldown { .. })
        ));
        assert_eq!(
            skirmish.request_auto_attack(enemy, enemy, &spatial),
            AbilityOutcome::Rejected(RejectReason::InvalidTarget)
        );

        spatial.set_position(enemy, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(
            skirmish.request_auto_attack(ActorId::PLAYER, enemy, &spatial),
            AbilityOutcome::Rejected(RejectReason::OutOfRange)
        );
    }

    #[test]
    fn test_ranged_ally_fires_projectile() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        let ally = ActorId::from_raw(7);
        skirmish
            .register_entity(ActorKind::Ally, ally, ClassId::Mage, 100.0)
            .expect("register");
        assert!(skirmish.request_auto_attack(ally, enemy, &NoSpatial).is_accepted());
        assert_eq!(skirmish.projectiles().len(), 1);

        skirmish.remove_entity(enemy).expect("remove");
        let id = skirmish.projectiles().iter().next().map(|p| p.id).expect("in flight");
        assert_eq!(skirmish.projectile_impact(id, Some(enemy)), Some(ProjectileFate::Missed));
        assert_eq!(skirmish.projectile_impact(id, Some(enemy)), None);
    }

    #[test]
    fn test_projectile_expires_after_lifetime() {
        let (mut skirmish, _) = with_enemy(ClassId::Mage);
        skirmish.set_target(None).expect("clear");
        skirmish.request_ability(ActorId::PLAYER, slot(1), None, &NoSpatial);
        skirmish.tick(1.5, &NoSpatial);
        assert_eq!(skirmish.projectiles().len(), 1);
        skirmish.tick(5.0, &NoSpatial);
        assert!(skirmish.projectiles().is_empty());
    }

    #[test]
    fn test_nearest_hostile() {
        let (mut skirmish, near) = with_enemy(ClassId::Warrior);
        let far = ActorId::from_raw(101);
        skirmish
            .register_entity(ActorKind::Enemy, far, ClassId::Warrior, 100.0)
            .expect("register");
        let mut spatial = MockSpatial::new();
        spatial.set_position(ActorId::PLAYER, Vec3::ZERO);
        spatial.set_position(near, Vec3::new(3.0, 0.0, 0.0));
        spatial.set_position(far, Vec3::new(9.0, 0.0, 0.0));

        assert_eq!(skirmish.nearest_hostile(ActorId::PLAYER, &spatial), Some(near));
        assert_eq!(skirmish.nearest_hostile(far, &spatial), Some(ActorId::PLAYER));
    }

    #[test]
    fn test_set_class_restores_maximums() {
        let (mut skirmish, _) = with_enemy(ClassId::Warrior);
        skirmish.damage(None, ActorId::PLAYER, 100.0);
        skirmish.set_class(ClassId::Mage);
        assert_eq!(skirmish.player().class, ClassId::Mage);
        assert_eq!(skirmish.player().health(), 80.0);
        assert_eq!(skirmish.player().resource(), 200.0);
        assert_eq!(skirmish.snapshot(&NoSpatial).cooldowns[0].ability, "frostbolt");
    }

    #[test]
    fn test_registration_errors() {
        let (mut skirmish, enemy) = with_enemy(ClassId::Warrior);
        assert_eq!(
            skirmish.register_entity(ActorKind::Enemy, enemy, ClassId::Mage, 50.0),
            Err(CombatError::DuplicateActor(enemy))
        );
        assert_eq!(
            skirmish.register_entity(ActorKind::Player, ActorId::from_raw(5), ClassId::Mage, 50.0),
            Err(CombatError::PlayerReserved)
        );
        assert_eq!(skirmish.remove_entity(ActorId::PLAYER), Err(CombatError::PlayerReserved));

        let ghost = ActorId::from_raw(6);
        for health in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                skirmish.register_entity(ActorKind::Enemy, ghost, ClassId::Warrior, health),
                Err(CombatError::InvalidHealth(ghost))
            );
        }
        assert!(skirmish.actor(ghost).is_none());
        skirmish.damage(None, enemy, 1000.0);
        assert_eq!(skirmish.match_state(), MatchState::Victory);
        assert_eq!(
            skirmish.set_target(Some(ActorId::from_raw(999))),
            Err(CombatError::UnknownActor(ActorId::from_raw(999)))
        );
    }

    #[test]
    fn test_shared_handle() {
        let shared = Skirmish::default().into_shared();
        shared.write().set_class(ClassId::Warlock);
        assert_eq!(shared.read().player().class, ClassId::Warlock);
    }
}
