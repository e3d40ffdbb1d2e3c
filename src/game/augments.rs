//! # Augments and Altar Boons
//!
//! Augments are run-scoped passive modifiers. Altars grant them, or plain stat
//! boosts, in exchange for corruption.

use crate::config::MAX_CORRUPTION;
use crate::game::Player;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Passive modifiers an altar can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Augment {
    /// +2 melee damage
    Bloodthirst,
    /// +2 arrow damage
    Marksman,
    /// +5 bomb damage
    Demolitionist,
    /// Arrows pass through enemies
    Piercing,
    /// Enemy hits deal 1 less damage, never below 1
    Ironhide,
}

impl Augment {
    pub fn melee_bonus(self) -> u32 {
        match self {
            Augment::Bloodthirst => 2,
            _ => 0,
        }
    }

    pub fn arrow_bonus(self) -> u32 {
        match self {
            Augment::Marksman => 2,
            _ => 0,
        }
    }

    pub fn bomb_bonus(self) -> u32 {
        match self {
            Augment::Demolitionist => 5,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Augment::Bloodthirst => "Bloodthirst",
            Augment::Marksman => "Marksman",
            Augment::Demolitionist => "Demolitionist",
            Augment::Piercing => "Piercing Shot",
            Augment::Ironhide => "Ironhide",
        }
    }
}

/// Player stats an altar may raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatField {
    MaxHp,
    Attack,
    MaxArrows,
    MaxBombs,
}

/// The closed set of altar outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltarEffect {
    StatDelta { stat: StatField, amount: u32 },
    GrantAugment { augment: Augment },
}

impl AltarEffect {
    pub fn describe(&self) -> String {
        match self {
            AltarEffect::StatDelta { stat, amount } => {
                let stat = match stat {
                    StatField::MaxHp => "maximum health",
                    StatField::Attack => "attack",
                    StatField::MaxArrows => "quiver size",
                    StatField::MaxBombs => "bomb satchel size",
                };
                format!("+{} {}", amount, stat)
            }
            AltarEffect::GrantAugment { augment } => format!("the {} augment", augment.name()),
        }
    }
}

/// One row of the altar table: effect, corruption cost, weight.
const ALTAR_TABLE: [(AltarEffect, u32, u32); 9] = [
    (AltarEffect::StatDelta { stat: StatField::MaxHp, amount: 10 }, 5, 4),
    (AltarEffect::StatDelta { stat: StatField::Attack, amount: 2 }, 8, 4),
    (AltarEffect::StatDelta { stat: StatField::MaxArrows, amount: 5 }, 3, 2),
    (AltarEffect::StatDelta { stat: StatField::MaxBombs, amount: 2 }, 3, 2),
    (AltarEffect::GrantAugment { augment: Augment::Bloodthirst }, 15, 1),
    (AltarEffect::GrantAugment { augment: Augment::Marksman }, 15, 1),
    (AltarEffect::GrantAugment { augment: Augment::Demolitionist }, 15, 1),
    (AltarEffect::GrantAugment { augment: Augment::Piercing }, 20, 1),
    (AltarEffect::GrantAugment { augment: Augment::Ironhide }, 20, 1),
];

const ALTAR_REROLLS: u32 = 3;

/// Fallback when every roll lands on an augment the player already holds.
const SOFTENED_EFFECT: AltarEffect = AltarEffect::StatDelta {
    stat: StatField::MaxHp,
    amount: 5,
};

fn roll_table(rng: &mut impl Rng) -> (AltarEffect, u32) {
    let total: u32 = ALTAR_TABLE.iter().map(|(_, _, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (effect, cost, weight) in ALTAR_TABLE {
        if roll < weight {
            return (effect, cost);
        }
        roll -= weight;
    }
    (SOFTENED_EFFECT, 0)
}

fn already_held(player: &Player, effect: &AltarEffect) -> bool {
    matches!(effect, AltarEffect::GrantAugment { augment } if player.has_augment(*augment))
}

/// Rolls an altar effect and its corruption cost for this player.
///
/// Held augments are re-rolled a few times and then softened into a small
/// health boost at half the cost.
pub fn roll_altar_effect(player: &Player, rng: &mut impl Rng) -> (AltarEffect, u32) {
    let mut rolled = roll_table(rng);
    for _ in 0..ALTAR_REROLLS {
        if !already_held(player, &rolled.0) {
            return rolled;
        }
        rolled = roll_table(rng);
    }
    if already_held(player, &rolled.0) {
        (SOFTENED_EFFECT, rolled.1 / 2)
    } else {
        rolled
    }
}

/// Applies an effect and its corruption cost to the player.
pub fn apply_altar_effect(player: &mut Player, effect: AltarEffect, corruption: u32) {
    match effect {
        AltarEffect::StatDelta { stat, amount } => match stat {
            StatField::MaxHp => {
                player.max_hp += amount;
                player.hp = (player.hp + amount).min(player.max_hp);
            }
            StatField::Attack => player.attack += amount,
            StatField::MaxArrows => player.max_arrows += amount,
            StatField::MaxBombs => player.max_bombs += amount,
        },
        AltarEffect::GrantAugment { augment } => {
            player.augments.insert(augment);
        }
    }
    player.corruption = player.corruption.saturating_add(corruption).min(MAX_CORRUPTION);
}
