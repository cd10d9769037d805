//! Ability catalog.
//!
//! Static, read-only class and ability definitions. Every actor of a class
//! shares the same `&'static` definitions; nothing here is mutated at
//! runtime.

use serde::{Deserialize, Serialize};
use skirmish_common::CatalogError;
use std::fmt;
use std::str::FromStr;

use crate::status::StatusKind;

/// Number of ability slots per class.
pub const SLOT_COUNT: u8 = 5;

/// Playable class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassId {
    /// Melee, rage.
    #[default]
    Warrior,
    /// Frost caster.
    Mage,
    /// Shadow caster with DOTs and a drain channel.
    Warlock,
    /// Melee hybrid with heals and a stun.
    Paladin,
}

impl ClassId {
    /// All classes.
    pub const ALL: [Self; 4] = [Self::Warrior, Self::Mage, Self::Warlock, Self::Paladin];

    /// Full class definition.
    #[must_use]
    pub fn definition(self) -> &'static ClassDef {
        match self {
            Self::Warrior => &WARRIOR,
            Self::Mage => &MAGE,
            Self::Warlock => &WARLOCK,
            Self::Paladin => &PALADIN,
        }
    }

    /// Ability in `slot`.
    #[must_use]
    pub fn ability(self, slot: AbilitySlot) -> &'static Ability {
        &self.definition().abilities[slot.index()]
    }

    /// Finds an ability of this class by its ID.
    #[must_use]
    pub fn find_ability(self, id: &str) -> Option<&'static Ability> {
        self.definition().abilities.iter().find(|a| a.id == id)
    }

    /// Checks if auto-attacks of this class are ranged projectiles.
    #[must_use]
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::Mage | Self::Warlock)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for ClassId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.definition().name.eq_ignore_ascii_case(s))
            .ok_or_else(|| CatalogError::UnknownClass(s.to_string()))
    }
}

/// Validated ability slot (1..=5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilitySlot(u8);

impl AbilitySlot {
    /// Creates a slot, rejecting anything outside 1..=5.
    pub fn new(slot: u8) -> Result<Self, CatalogError> {
        if (1..=SLOT_COUNT).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(CatalogError::InvalidSlot(slot))
        }
    }

    /// All five slots in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=SLOT_COUNT).map(Self)
    }

    /// Slot number (1-based).
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Index into a class's ability array.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

/// Movement requested from the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reposition {
    /// Dash toward the current target.
    Charge,
    /// Teleport forward.
    Blink,
}

/// What resolving an ability does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Direct damage to the target if within range.
    Strike,
    /// Launch a homing projectile carrying the ability damage.
    Projectile {
        /// Travel speed in units per second.
        speed: f32,
    },
    /// Apply a status effect to the target.
    Status {
        /// Effect kind.
        kind: StatusKind,
        /// Duration in seconds.
        duration: f32,
    },
    /// Apply a status effect to every hostile actor within range of the caster.
    AreaStatus {
        /// Effect kind.
        kind: StatusKind,
        /// Duration in seconds.
        duration: f32,
    },
    /// Start a DOT dealing the ability damage once per second.
    DamageOverTime {
        /// Number of one-second ticks.
        seconds: u32,
    },
    /// Channel tick: damage the target and heal the caster.
    Drain {
        /// Health restored to the caster per tick.
        heal_per_tick: f32,
    },
    /// Heal the caster by the negated ability damage.
    SelfHeal,
    /// Move the caster.
    Reposition(Reposition),
}

/// Immutable ability definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ability {
    /// Stable ID, also the cooldown ledger key.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Cooldown in seconds.
    pub cooldown: f32,
    /// Damage dealt; negative heals.
    pub damage: Option<f32>,
    /// Maximum range.
    pub range: Option<f32>,
    /// Resource spent on use.
    pub cost: Option<f32>,
    /// Cast time in seconds.
    pub cast_time: Option<f32>,
    /// Channel time in whole seconds (one tick per second).
    pub channel_time: Option<u32>,
    /// Whether the ability applies a damage-over-time.
    pub dot: bool,
    /// Effects applied on resolution (or on each tick for channels).
    pub effects: &'static [AbilityEffect],
}

impl Ability {
    const fn new(id: &'static str, name: &'static str, cooldown: f32) -> Self {
        Self {
            id,
            name,
            cooldown,
            damage: None,
            range: None,
            cost: None,
            cast_time: None,
            channel_time: None,
            dot: false,
            effects: STRIKE,
        }
    }

    const fn damage(mut self, damage: f32) -> Self {
        self.damage = Some(damage);
        self
    }

    const fn range(mut self, range: f32) -> Self {
        self.range = Some(range);
        self
    }

    const fn cast(mut self, seconds: f32) -> Self {
        self.cast_time = Some(seconds);
        self
    }

    const fn channel(mut self, seconds: u32) -> Self {
        self.channel_time = Some(seconds);
        self
    }

    const fn effects(mut self, effects: &'static [AbilityEffect]) -> Self {
        self.effects = effects;
        self
    }

    const fn with_dot(mut self) -> Self {
        self.dot = true;
        self
    }

    /// Damage as a non-negative amount (0 for heals and utility).
    #[must_use]
    pub fn damage_amount(&self) -> f32 {
        self.damage.unwrap_or(0.0).max(0.0)
    }

    /// Healing as a non-negative amount (from negative damage).
    #[must_use]
    pub fn heal_amount(&self) -> f32 {
        (-self.damage.unwrap_or(0.0)).max(0.0)
    }

    /// Checks if this ability misses without a target in range.
    /// Projectiles fly without one.
    #[must_use]
    pub fn needs_target(&self) -> bool {
        self.effects.iter().any(|e| {
            matches!(
                e,
                AbilityEffect::Strike
                    | AbilityEffect::Status { .. }
                    | AbilityEffect::DamageOverTime { .. }
                    | AbilityEffect::Drain { .. }
            )
        })
    }
}

/// Class definition: stats plus five abilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    /// Display name.
    pub name: &'static str,
    /// Maximum health.
    pub max_health: f32,
    /// Maximum resource.
    pub max_resource: f32,
    /// Resource display name.
    pub resource_name: &'static str,
    /// Abilities for slots 1 through 5.
    pub abilities: [Ability; SLOT_COUNT as usize],
}

// ============================================================================
// Class data
// ============================================================================

const STRIKE: &[AbilityEffect] = &[AbilityEffect::Strike];
const CHARGE: &[AbilityEffect] = &[AbilityEffect::Reposition(Reposition::Charge)];
const BLINK: &[AbilityEffect] = &[AbilityEffect::Reposition(Reposition::Blink)];
const BOLT: &[AbilityEffect] = &[AbilityEffect::Projectile { speed: 15.0 }];
const SPIKE: &[AbilityEffect] = &[AbilityEffect::Projectile { speed: 25.0 }];
const FROST_NOVA: &[AbilityEffect] = &[AbilityEffect::AreaStatus {
    kind: StatusKind::Root,
    duration: 4.0,
}];
const POLYMORPH: &[AbilityEffect] = &[AbilityEffect::Status {
    kind: StatusKind::Polymorph,
    duration: 5.0,
}];
const CORRUPTION: &[AbilityEffect] = &[
    AbilityEffect::DamageOverTime { seconds: 12 },
    AbilityEffect::Strike,
];
const FEAR: &[AbilityEffect] = &[AbilityEffect::Status {
    kind: StatusKind::Fear,
    duration: 5.0,
}];
const LIFE_DRAIN: &[AbilityEffect] = &[AbilityEffect::Drain {
    heal_per_tick: 10.0,
}];
const SELF_HEAL: &[AbilityEffect] = &[AbilityEffect::SelfHeal];
const HAMMER: &[AbilityEffect] = &[
    AbilityEffect::Status {
        kind: StatusKind::Stun,
        duration: 3.0,
    },
    AbilityEffect::Strike,
];

/// Warrior: melee, rage.
pub static WARRIOR: ClassDef = ClassDef {
    name: "Warrior",
    max_health: 150.0,
    max_resource: 100.0,
    resource_name: "Rage",
    abilities: [
        Ability::new("strike", "Strike", 1.5).damage(15.0).range(3.0),
        Ability::new("charge", "Charge", 12.0)
            .damage(5.0)
            .range(20.0)
            .effects(CHARGE),
        Ability::new("whirlwind", "Whirlwind", 8.0).damage(10.0).range(5.0),
        Ability::new("shield_bash", "Shield Bash", 10.0).damage(5.0).range(3.0),
        Ability::new("execute", "Execute", 20.0).damage(50.0).range(3.0),
    ],
};

/// Mage: frost caster, mana.
pub static MAGE: ClassDef = ClassDef {
    name: "Mage",
    max_health: 80.0,
    max_resource: 200.0,
    resource_name: "Mana",
    abilities: [
        Ability::new("frostbolt", "Frostbolt", 2.0)
            .damage(20.0)
            .range(30.0)
            .cast(1.5)
            .effects(BOLT),
        Ability::new("frost_nova", "Frost Nova", 15.0)
            .damage(5.0)
            .range(8.0)
            .effects(FROST_NOVA),
        Ability::new("blink", "Blink", 10.0)
            .range(20.0)
            .effects(BLINK),
        Ability::new("polymorph", "Polymorph", 20.0)
            .range(20.0)
            .cast(1.5)
            .effects(POLYMORPH),
        Ability::new("glacial_spike", "Glacial Spike", 6.0)
            .damage(60.0)
            .range(30.0)
            .cast(3.0)
            .effects(SPIKE),
    ],
};

/// Warlock: shadow caster, mana.
pub static WARLOCK: ClassDef = ClassDef {
    name: "Warlock",
    max_health: 100.0,
    max_resource: 100.0,
    resource_name: "Mana",
    abilities: [
        Ability::new("shadow_bolt", "Shadow Bolt", 2.5)
            .damage(20.0)
            .range(30.0)
            .cast(1.5)
            .effects(BOLT),
        Ability::new("corruption", "Corruption", 0.0)
            .damage(5.0)
            .range(30.0)
            .with_dot()
            .effects(CORRUPTION),
        Ability::new("fear", "Fear", 15.0)
            .range(20.0)
            .cast(1.5)
            .effects(FEAR),
        Ability::new("life_drain", "Life Drain", 10.0)
            .damage(10.0)
            .range(20.0)
            .channel(4)
            .effects(LIFE_DRAIN),
        Ability::new("chaos_bolt", "Chaos Bolt", 12.0)
            .damage(45.0)
            .range(30.0)
            .cast(2.5)
            .effects(BOLT),
    ],
};

/// Paladin: melee hybrid, mana.
pub static PALADIN: ClassDef = ClassDef {
    name: "Paladin",
    max_health: 140.0,
    max_resource: 100.0,
    resource_name: "Mana",
    abilities: [
        Ability::new("crusader_strike", "Crusader Strike", 4.0)
            .damage(20.0)
            .range(3.0),
        Ability::new("judgment", "Judgment", 8.0).damage(15.0).range(20.0),
        Ability::new("holy_light", "Holy Light", 2.5)
            .damage(-30.0)
            .range(30.0)
            .cast(2.0)
            .effects(SELF_HEAL),
        Ability::new("hammer_of_justice", "Hammer of Justice", 30.0)
            .damage(5.0)
            .range(10.0)
            .effects(HAMMER),
        Ability::new("divine_storm", "Divine Storm", 10.0)
            .damage(25.0)
            .range(8.0),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_validation() {
        assert!(AbilitySlot::new(0).is_err());
        assert_eq!(AbilitySlot::new(6), Err(CatalogError::InvalidSlot(6)));
        assert_eq!(AbilitySlot::new(1).map(AbilitySlot::index), Ok(0));
        assert_eq!(AbilitySlot::all().count(), 5);
    }

    #[test]
    fn test_class_lookup() {
        assert_eq!("warlock".parse::<ClassId>(), Ok(ClassId::Warlock));
        assert_eq!(
            "Necromancer".parse::<ClassId>(),
            Err(CatalogError::UnknownClass("Necromancer".to_string()))
        );
        assert_eq!(ClassId::Paladin.to_string(), "Paladin");
    }

    #[test]
    fn test_warrior_strike() {
        let strike = ClassId::Warrior.ability(AbilitySlot::new(1).expect("slot 1 is valid"));
        assert_eq!(strike.id, "strike");
        assert_eq!(strike.cooldown, 1.5);
        assert_eq!(strike.damage, Some(15.0));
        assert_eq!(strike.cast_time, None);
        assert_eq!(ClassId::Warrior.definition().max_health, 150.0);
    }

    #[test]
    fn test_heal_uses_negative_damage() {
        let holy_light = ClassId::Paladin.find_ability("holy_light");
        assert!(holy_light.is_some_and(|a| a.heal_amount() == 30.0 && a.damage_amount() == 0.0));
        assert_eq!(holy_light.and_then(|a| a.cast_time), Some(2.0));
    }

    #[test]
    fn test_channel_and_dot_flags() {
        let drain = ClassId::Warlock.find_ability("life_drain");
        assert_eq!(drain.and_then(|a| a.channel_time), Some(4));
        assert!(ClassId::Warlock
            .find_ability("corruption")
            .is_some_and(|a| a.dot && a.cooldown == 0.0));
    }

    #[test]
    fn test_target_requirements() {
        let needs = |class: ClassId, id: &str| class.find_ability(id).is_some_and(Ability::needs_target);
        assert!(needs(ClassId::Warrior, "strike"));
        assert!(needs(ClassId::Paladin, "hammer_of_justice"));
        assert!(needs(ClassId::Warlock, "life_drain"));
        assert!(!needs(ClassId::Mage, "frostbolt"));
        assert!(!needs(ClassId::Mage, "frost_nova"));
        assert!(!needs(ClassId::Paladin, "holy_light"));
        assert!(!needs(ClassId::Warrior, "charge"));
    }

    #[test]
    fn test_ability_ids_unique_per_class() {
        for class in ClassId::ALL {
            let abilities = &class.definition().abilities;
            for (i, a) in abilities.iter().enumerate() {
                assert!(abilities[i + 1..].iter().all(|b| b.id != a.id), "{class}: {}", a.id);
            }
        }
    }
}
