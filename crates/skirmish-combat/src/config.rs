//! Skirmish configuration.
//!
//! Tunables for auto-attacks, projectiles and status effects. Loaded from a
//! TOML file; missing or broken files fall back to defaults.

use serde::{Deserialize, Serialize};
use skirmish_common::{SkirmishError, SkirmishResult};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::catalog::ClassId;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// Skirmish configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkirmishConfig {
    // === Player ===
    /// Class the player starts as
    pub player_class: ClassId,

    // === Auto-attacks ===
    /// Seconds between auto-attacks of one actor
    pub auto_attack_interval: f32,
    /// Reach of melee auto-attacks
    pub melee_range: f32,
    /// Damage of melee auto-attacks
    pub melee_damage: f32,
    /// Reach of ranged auto-attacks
    pub ranged_range: f32,
    /// Damage of ranged auto-attack projectiles
    pub ranged_damage: f32,
    /// Speed of ranged auto-attack projectiles
    pub ranged_projectile_speed: f32,
    /// Damage of enemy melee swings
    pub enemy_melee_damage: f32,
    /// Movement speed used when chasing a target
    pub chase_speed: f32,

    // === Effects ===
    /// Seconds before an unresolved projectile is discarded
    pub projectile_lifetime: f32,
    /// Velocity multiplier reported for slowed actors
    pub slow_multiplier: f32,

    // === Plumbing ===
    /// Capacity of the combat event bus
    pub event_capacity: usize,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            player_class: ClassId::Warrior,

            auto_attack_interval: 2.0,
            melee_range: 2.0,
            melee_damage: 10.0,
            ranged_range: 10.0,
            ranged_damage: 15.0,
            ranged_projectile_speed: 10.0,
            enemy_melee_damage: 10.0,
            chase_speed: 3.0,

            projectile_lifetime: 5.0,
            slow_multiplier: 0.5,

            event_capacity: 1024,
        }
    }
}

impl SkirmishConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::read_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Reads and validates a config file, reporting why it could not be used.
    pub fn read_from<P: AsRef<Path>>(path: P) -> SkirmishResult<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config =
            toml::from_str::<Self>(&contents).map_err(|e| SkirmishError::Config(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SkirmishResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| SkirmishError::Config(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.auto_attack_interval = self.auto_attack_interval.clamp(0.1, 60.0);
        self.melee_range = self.melee_range.clamp(0.5, 50.0);
        self.melee_damage = self.melee_damage.clamp(0.0, 10_000.0);
        self.ranged_range = self.ranged_range.clamp(0.5, 100.0);
        self.ranged_damage = self.ranged_damage.clamp(0.0, 10_000.0);
        self.ranged_projectile_speed = self.ranged_projectile_speed.clamp(0.1, 200.0);
        self.enemy_melee_damage = self.enemy_melee_damage.clamp(0.0, 10_000.0);
        self.chase_speed = self.chase_speed.clamp(0.0, 50.0);

        self.projectile_lifetime = self.projectile_lifetime.clamp(0.1, 60.0);
        self.slow_multiplier = self.slow_multiplier.clamp(0.0, 1.0);

        self.event_capacity = self.event_capacity.clamp(16, 1 << 16);
    }
}
