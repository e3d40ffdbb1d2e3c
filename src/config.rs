//! # Engine Configuration
//!
//! Gameplay constants and the tunable [`EngineConfig`] built from them.

use crate::GravewalkResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default screen width in tiles
pub const SCREEN_WIDTH: u32 = 20;

/// Default screen height in tiles
pub const SCREEN_HEIGHT: u32 = 12;

/// Turns between placing a bomb and its detonation
pub const BOMB_FUSE: u32 = 6;

/// Blast arm length in tiles
pub const BOMB_RANGE: u32 = 2;

/// Damage dealt by every blast before the player's bomb bonus
pub const BOMB_BASE_DAMAGE: u32 = 12;

/// Poisoned turns between two poison ticks
pub const POISON_INTERVAL: u32 = 4;

/// Damage dealt by one poison tick
pub const POISON_DAMAGE: u32 = 5;

/// Multiplier applied to attack for arrow damage
pub const ARROW_DAMAGE_FACTOR: f64 = 0.8;

/// Hit points restored by a healing potion
pub const POTION_HEAL: u32 = 20;

/// Default carry cap for potions and antidotes
pub const CONSUMABLE_CAP: u32 = 3;

/// Base of the XP threshold curve
pub const XP_BASE: f64 = 20.0;

/// Exponent of the XP threshold curve
pub const XP_GROWTH_FACTOR: f64 = 1.5;

/// Upper bound of the corruption meter
pub const MAX_CORRUPTION: u32 = 100;

/// Tunable rules of the turn engine.
///
/// Every field defaults to the constants above. Tests zero the random
/// variances to make damage exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bomb_fuse: u32,
    pub bomb_range: u32,
    pub bomb_base_damage: u32,
    pub poison_interval: u32,
    pub poison_damage: u32,
    /// Probability that a poisonous enemy's hit poisons the player
    pub poison_chance: f64,
    pub arrow_damage_factor: f64,
    /// Inclusive upper bound of the random bonus on player melee hits
    pub melee_variance: u32,
    /// Inclusive upper bound of the random bonus on arrow hits
    pub arrow_variance: u32,
    /// Inclusive upper bound of the random bonus on enemy hits
    pub enemy_variance: u32,
    pub potion_heal: u32,
    pub potion_cap: u32,
    pub antidote_cap: u32,
    pub xp_base: f64,
    pub xp_growth_factor: f64,
    /// Adds `corruption / corruption_divisor` to every enemy hit when enabled
    pub corruption_scaling: bool,
    pub corruption_divisor: u32,
    pub hit_flash_ms: u64,
    pub damage_number_ms: u64,
    pub blast_ms: u64,
    pub arrow_step_ms: u64,
    pub screen_transition_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bomb_fuse: BOMB_FUSE,
            bomb_range: BOMB_RANGE,
            bomb_base_damage: BOMB_BASE_DAMAGE,
            poison_interval: POISON_INTERVAL,
            poison_damage: POISON_DAMAGE,
            poison_chance: 0.3,
            arrow_damage_factor: ARROW_DAMAGE_FACTOR,
            melee_variance: 2,
            arrow_variance: 1,
            enemy_variance: 1,
            potion_heal: POTION_HEAL,
            potion_cap: CONSUMABLE_CAP,
            antidote_cap: CONSUMABLE_CAP,
            xp_base: XP_BASE,
            xp_growth_factor: XP_GROWTH_FACTOR,
            corruption_scaling: false,
            corruption_divisor: 25,
            hit_flash_ms: 150,
            damage_number_ms: 600,
            blast_ms: 250,
            arrow_step_ms: 60,
            screen_transition_ms: 200,
        }
    }
}

impl EngineConfig {
    /// A configuration with every random roll removed.
    ///
    /// Poison still lands on every hit from a poisonous enemy.
    pub fn deterministic() -> Self {
        Self {
            melee_variance: 0,
            arrow_variance: 0,
            enemy_variance: 0,
            poison_chance: 1.0,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields use defaults.
    pub fn load(path: impl AsRef<Path>) -> GravewalkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// XP needed to leave `level`: `floor(xp_base * level ^ xp_growth_factor)`.
    pub fn xp_threshold(&self, level: u32) -> u32 {
        (self.xp_base * f64::from(level).powf(self.xp_growth_factor)).floor() as u32
    }
}
