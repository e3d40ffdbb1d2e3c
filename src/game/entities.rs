//! # Entities
//!
//! The player, enemies, and the position-tagged decorations of a level.

use crate::config::{CONSUMABLE_CAP, XP_BASE};
use crate::game::augments::Augment;
use crate::game::{new_entity_id, Direction, EntityId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Player classes, each with its own stat profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    /// Sturdy melee fighter
    Warrior,
    /// Bow specialist with a deep quiver
    Ranger,
    /// Explosives expert
    Sapper,
}

/// Base stats and damage modifiers of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassProfile {
    pub max_hp: u32,
    pub attack: u32,
    pub arrows: u32,
    pub max_arrows: u32,
    pub bombs: u32,
    pub max_bombs: u32,
    pub melee_bonus: u32,
    pub arrow_bonus: u32,
    pub bomb_bonus: u32,
}

impl PlayerClass {
    pub fn all() -> [PlayerClass; 3] {
        [PlayerClass::Warrior, PlayerClass::Ranger, PlayerClass::Sapper]
    }

    pub fn profile(self) -> ClassProfile {
        match self {
            PlayerClass::Warrior => ClassProfile {
                max_hp: 40,
                attack: 6,
                arrows: 3,
                max_arrows: 10,
                bombs: 1,
                max_bombs: 3,
                melee_bonus: 2,
                arrow_bonus: 0,
                bomb_bonus: 0,
            },
            PlayerClass::Ranger => ClassProfile {
                max_hp: 30,
                attack: 5,
                arrows: 10,
                max_arrows: 20,
                bombs: 1,
                max_bombs: 3,
                melee_bonus: 0,
                arrow_bonus: 3,
                bomb_bonus: 0,
            },
            PlayerClass::Sapper => ClassProfile {
                max_hp: 32,
                attack: 5,
                arrows: 3,
                max_arrows: 10,
                bombs: 4,
                max_bombs: 8,
                melee_bonus: 0,
                arrow_bonus: 0,
                bomb_bonus: 6,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayerClass::Warrior => "Warrior",
            PlayerClass::Ranger => "Ranger",
            PlayerClass::Sapper => "Sapper",
        }
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub arrows: u32,
    pub max_arrows: u32,
    pub bombs: u32,
    pub max_bombs: u32,
    pub potions: u32,
    pub max_potions: u32,
    pub antidotes: u32,
    pub max_antidotes: u32,
    pub gold: u32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub class: PlayerClass,
    pub is_poisoned: bool,
    /// Poisoned turns since the last tick
    pub poison_steps: u32,
    /// Direction of the last committed move; arrows fly this way
    pub last_direction: Option<Direction>,
    /// Never decreases during a run
    pub corruption: u32,
    pub augments: BTreeSet<Augment>,
}

impl Player {
    /// Creates a fresh level-1 character of the given class.
    pub fn new(class: PlayerClass, position: Position) -> Self {
        let profile = class.profile();
        Self {
            position,
            hp: profile.max_hp,
            max_hp: profile.max_hp,
            attack: profile.attack,
            arrows: profile.arrows,
            max_arrows: profile.max_arrows,
            bombs: profile.bombs,
            max_bombs: profile.max_bombs,
            potions: 0,
            max_potions: CONSUMABLE_CAP,
            antidotes: 0,
            max_antidotes: CONSUMABLE_CAP,
            gold: 0,
            level: 1,
            xp: 0,
            xp_to_next_level: XP_BASE as u32,
            class,
            is_poisoned: false,
            poison_steps: 0,
            last_direction: None,
            corruption: 0,
            augments: BTreeSet::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn has_augment(&self, augment: Augment) -> bool {
        self.augments.contains(&augment)
    }

    /// Flat melee bonus from class and augments.
    pub fn melee_bonus(&self) -> u32 {
        self.class.profile().melee_bonus + self.augments.iter().map(|a| a.melee_bonus()).sum::<u32>()
    }

    /// Flat arrow bonus from class and augments.
    pub fn arrow_bonus(&self) -> u32 {
        self.class.profile().arrow_bonus + self.augments.iter().map(|a| a.arrow_bonus()).sum::<u32>()
    }

    /// Flat bomb bonus from class and augments.
    pub fn bomb_bonus(&self) -> u32 {
        self.class.profile().bomb_bonus + self.augments.iter().map(|a| a.bomb_bonus()).sum::<u32>()
    }

    /// Restores hit points without exceeding the maximum; returns the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }
}

/// Enemy types with fixed base stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Rat,
    Bat,
    Spider,
    Skeleton,
    Slime,
    Slimeling,
    Orc,
}

/// Base stats and behaviour flags of an enemy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyStats {
    pub hp: u32,
    pub attack: u32,
    pub xp: u32,
    pub can_poison: bool,
    pub splits_on_death: bool,
}

impl EnemyKind {
    pub fn stats(self) -> EnemyStats {
        let (hp, attack, xp) = match self {
            EnemyKind::Rat => (6, 2, 3),
            EnemyKind::Bat => (4, 2, 2),
            EnemyKind::Spider => (8, 3, 6),
            EnemyKind::Skeleton => (14, 4, 8),
            EnemyKind::Slime => (12, 3, 6),
            EnemyKind::Slimeling => (5, 2, 2),
            EnemyKind::Orc => (20, 6, 14),
        };
        EnemyStats {
            hp,
            attack,
            xp,
            can_poison: self == EnemyKind::Spider,
            splits_on_death: self == EnemyKind::Slime,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Rat => "rat",
            EnemyKind::Bat => "bat",
            EnemyKind::Spider => "spider",
            EnemyKind::Skeleton => "skeleton",
            EnemyKind::Slime => "slime",
            EnemyKind::Slimeling => "slimeling",
            EnemyKind::Orc => "orc",
        }
    }

    /// Kinds that may be generated on a dungeon level.
    pub fn spawnable_at(level: u32) -> Vec<EnemyKind> {
        let mut kinds = vec![EnemyKind::Rat, EnemyKind::Bat];
        if level >= 2 {
            kinds.extend([EnemyKind::Spider, EnemyKind::Slime]);
        }
        if level >= 3 {
            kinds.push(EnemyKind::Skeleton);
        }
        if level >= 5 {
            kinds.push(EnemyKind::Orc);
        }
        kinds
    }
}

/// A hostile creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub position: Position,
    pub hp: u32,
    /// Presentation only; cleared at the start of every resolution cycle
    pub just_hit: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, position: Position) -> Self {
        Self {
            id: new_entity_id(),
            kind,
            position,
            hp: kind.stats().hp,
            just_hit: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Collectable item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    HealthPotion,
    Gold,
    Arrows,
    Bombs,
    Antidote,
}

impl ItemKind {
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::HealthPotion => "healing potion",
            ItemKind::Gold => "gold",
            ItemKind::Arrows => "arrows",
            ItemKind::Bombs => "bomb",
            ItemKind::Antidote => "antidote",
        }
    }
}

/// An item lying on the floor. Whether it is still there is derived from the
/// level's picked-up set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Bottomless; falling in ends the run
    Pit,
    Spikes,
    Fire,
}

impl HazardKind {
    /// Damage dealt on arrival; `None` means instant death.
    pub fn damage(self, dungeon_level: u32) -> Option<u32> {
        match self {
            HazardKind::Pit => None,
            HazardKind::Spikes => Some(2 + dungeon_level),
            HazardKind::Fire => Some(3 + dungeon_level),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HazardKind::Pit => "pit",
            HazardKind::Spikes => "spikes",
            HazardKind::Fire => "fire",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub kind: HazardKind,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoodadKind {
    Bones,
    Torch,
    Moss,
    Rubble,
}

/// Purely decorative scenery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doodad {
    pub kind: DoodadKind,
    pub position: Position,
}

/// The shopkeeper; stepping onto him opens the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wizard {
    pub position: Position,
}

/// A shrine that trades a boon for corruption. Each altar answers once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Altar {
    pub position: Position,
}

/// An armed bomb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: EntityId,
    pub position: Position,
    /// Player turns left until detonation
    pub fuse: u32,
}

impl Bomb {
    pub fn new(position: Position, fuse: u32) -> Self {
        Self {
            id: new_entity_id(),
            position,
            fuse,
        }
    }
}

/// The single arrow that may be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub position: Position,
    pub direction: Direction,
    /// Enemies already struck by a piercing arrow
    pub struck: Vec<EntityId>,
}

impl Projectile {
    pub fn new(position: Position, direction: Direction) -> Self {
        Self {
            id: new_entity_id(),
            position,
            direction,
            struck: Vec::new(),
        }
    }
}

/// Tiles covered by one detonation, shown briefly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blast {
    pub id: EntityId,
    pub tiles: BTreeSet<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    Harm,
    Heal,
    Poison,
}

/// A floating number shown for a few hundred milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageNumber {
    pub id: EntityId,
    pub position: Position,
    pub amount: u32,
    pub kind: DamageKind,
}

impl DamageNumber {
    pub fn new(position: Position, amount: u32, kind: DamageKind) -> Self {
        Self {
            id: new_entity_id(),
            position,
            amount,
            kind,
        }
    }
}
