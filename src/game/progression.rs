//! # Progression
//!
//! Experience and level-ups, the wizard's shop, and the carry-over rules of a
//! run restart.

use crate::config::EngineConfig;
use crate::game::turn::TurnContext;
use crate::game::{EnemyKind, GameEvent, GameMode, GameState, Player};
use crate::{GravewalkResult, Rejection};
use log::info;
use serde::{Deserialize, Serialize};

/// The two rewards offered on level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelUpChoice {
    /// +20 maximum health and a full heal
    Vitality,
    /// +5 attack
    Might,
}

impl LevelUpChoice {
    pub fn all() -> [LevelUpChoice; 2] {
        [LevelUpChoice::Vitality, LevelUpChoice::Might]
    }

    pub fn describe(self) -> &'static str {
        match self {
            LevelUpChoice::Vitality => "+20 max health, fully healed",
            LevelUpChoice::Might => "+5 attack",
        }
    }
}

/// Wares sold by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    Potion,
    Antidote,
    /// Five arrows
    ArrowBundle,
    Bomb,
}

impl ShopItem {
    pub fn all() -> [ShopItem; 4] {
        [
            ShopItem::Potion,
            ShopItem::Antidote,
            ShopItem::ArrowBundle,
            ShopItem::Bomb,
        ]
    }

    pub fn price(self) -> u32 {
        match self {
            ShopItem::Potion => 15,
            ShopItem::Antidote => 10,
            ShopItem::ArrowBundle => 10,
            ShopItem::Bomb => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShopItem::Potion => "Healing potion",
            ShopItem::Antidote => "Antidote",
            ShopItem::ArrowBundle => "Bundle of 5 arrows",
            ShopItem::Bomb => "Bomb",
        }
    }
}

const ARROW_BUNDLE: u32 = 5;

/// XP granted for defeating an enemy: `floor(base_xp * (1 + level / 10))`.
///
/// # Examples
///
/// ```
/// use gravewalk::game::progression::xp_for_defeat;
/// use gravewalk::EnemyKind;
///
/// assert_eq!(xp_for_defeat(EnemyKind::Orc, 1), 15);
/// assert_eq!(xp_for_defeat(EnemyKind::Rat, 10), 6);
/// ```
pub fn xp_for_defeat(kind: EnemyKind, dungeon_level: u32) -> u32 {
    kind.stats().xp * (10 + dungeon_level) / 10
}

/// Adds XP and raises the level-up prompt if a threshold was crossed.
pub fn grant_xp(state: &mut GameState, ctx: &mut TurnContext<'_>, xp: u32) {
    state.player.xp += xp;
    check_level_up(state, ctx);
}

/// Enters the level-up mode when the player has enough XP.
///
/// One XP grant opens at most one prompt. XP left over past the next
/// threshold is kept and only checked again on the following grant.
pub fn check_level_up(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    if state.mode != GameMode::Playing || !state.player.is_alive() {
        return;
    }
    if state.player.xp >= state.player.xp_to_next_level {
        state.mode = GameMode::LevelUp;
        ctx.emit(GameEvent::LevelUpReady);
    }
}

/// Applies a level-up reward and moves to the next threshold without
/// prompting again.
pub fn choose_level_up(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    choice: LevelUpChoice,
) -> GravewalkResult<()> {
    if state.mode != GameMode::LevelUp {
        return Err(Rejection::NoLevelUpPending.into());
    }

    let player = &mut state.player;
    match choice {
        LevelUpChoice::Vitality => {
            player.max_hp += 20;
            player.hp = player.max_hp;
        }
        LevelUpChoice::Might => player.attack += 5,
    }
    player.xp = player.xp.saturating_sub(player.xp_to_next_level);
    player.level += 1;
    player.xp_to_next_level = ctx.config.xp_threshold(player.level);
    let level = player.level;

    info!("Player reached level {} ({:?})", level, choice);
    state.mode = GameMode::Playing;
    ctx.emit(GameEvent::LeveledUp { choice, level });
    Ok(())
}

/// Buys one shop item. Nothing is charged when the purchase is refused.
///
/// Items are sold whole: an arrow bundle that would overflow the quiver is
/// refused rather than sold short.
pub fn purchase(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    item: ShopItem,
) -> GravewalkResult<()> {
    if state.mode != GameMode::Shopping {
        return Err(Rejection::NotShopping.into());
    }

    let player = &mut state.player;
    let (count, cap, amount) = match item {
        ShopItem::Potion => (&mut player.potions, player.max_potions, 1),
        ShopItem::Antidote => (&mut player.antidotes, player.max_antidotes, 1),
        ShopItem::ArrowBundle => (&mut player.arrows, player.max_arrows, ARROW_BUNDLE),
        ShopItem::Bomb => (&mut player.bombs, player.max_bombs, 1),
    };
    if *count + amount > cap {
        return Err(Rejection::AtCapacity.into());
    }
    let cost = item.price();
    if player.gold < cost {
        return Err(Rejection::NotEnoughGold.into());
    }

    *count += amount;
    player.gold -= cost;
    ctx.emit(GameEvent::Purchased { item, cost });
    Ok(())
}

/// The character that starts a new run after a death.
///
/// Gold is halved and XP is lost; level, health and attack, class, corruption
/// and augments carry over. Consumables return to the class defaults.
pub fn carry_over(dead: &Player, config: &EngineConfig) -> Player {
    let mut player = Player::new(dead.class, dead.position);
    player.level = dead.level;
    player.max_hp = dead.max_hp;
    player.hp = dead.max_hp;
    player.attack = dead.attack;
    player.max_arrows = dead.max_arrows;
    player.max_bombs = dead.max_bombs;
    player.max_potions = config.potion_cap;
    player.max_antidotes = config.antidote_cap;
    player.gold = dead.gold / 2;
    player.xp = 0;
    player.xp_to_next_level = config.xp_threshold(dead.level);
    player.corruption = dead.corruption;
    player.augments = dead.augments.clone();
    player
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::augments::Augment;
    use crate::game::{PlayerClass, Position};
    use crate::generation::LevelLayout;
    use crate::{GravewalkError, Map};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state() -> GameState {
        let map = Map::from_ascii(&["####", "#..#", "####"]).unwrap();
        let layout = LevelLayout::empty(map, Position::new(1, 1), Position::new(2, 1));
        GameState::from_layout(layout, Player::new(PlayerClass::Warrior, Position::origin()), 1)
    }

    #[test]
    fn test_xp_formula() {
        assert_eq!(xp_for_defeat(EnemyKind::Rat, 1), 3);
        assert_eq!(xp_for_defeat(EnemyKind::Skeleton, 5), 12);
        assert_eq!(xp_for_defeat(EnemyKind::Orc, 0), 14);
    }

    #[test]
    fn test_overflow_prompts_once_per_grant() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = state();
        let prompts = |ctx: &TurnContext<'_>| {
            ctx.events
                .iter()
                .filter(|e| matches!(e, GameEvent::LevelUpReady))
                .count()
        };

        // Enough for level 1 -> 2 (20) and 2 -> 3 (56)
        grant_xp(&mut state, &mut ctx, 80);
        grant_xp(&mut state, &mut ctx, 5);
        assert_eq!(state.mode, GameMode::LevelUp);
        assert_eq!(prompts(&ctx), 1);

        choose_level_up(&mut state, &mut ctx, LevelUpChoice::Might).unwrap();
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 65);
        assert_eq!(state.player.xp_to_next_level, 56);
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(prompts(&ctx), 1);

        let err = choose_level_up(&mut state, &mut ctx, LevelUpChoice::Might).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::NoLevelUpPending)));

        // The carried XP is picked up by the next grant
        grant_xp(&mut state, &mut ctx, 1);
        assert_eq!(state.mode, GameMode::LevelUp);
        assert_eq!(prompts(&ctx), 2);

        choose_level_up(&mut state, &mut ctx, LevelUpChoice::Vitality).unwrap();
        assert_eq!(state.player.level, 3);
        assert_eq!(state.player.xp, 10);
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.player.max_hp, 60);
        assert_eq!(state.player.attack, 11);
    }

    #[test]
    fn test_purchase_rules() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = state();

        let err = purchase(&mut state, &mut ctx, ShopItem::Bomb).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::NotShopping)));

        state.mode = GameMode::Shopping;
        state.player.gold = 20;
        purchase(&mut state, &mut ctx, ShopItem::ArrowBundle).unwrap();
        assert_eq!(state.player.arrows, 8);
        assert_eq!(state.player.gold, 10);

        let err = purchase(&mut state, &mut ctx, ShopItem::Potion).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::NotEnoughGold)));
        assert_eq!(state.player.gold, 10);
    }

    #[test]
    fn test_full_counter_is_not_charged() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = state();
        state.mode = GameMode::Shopping;
        state.player.gold = 100;
        state.player.potions = state.player.max_potions;

        let err = purchase(&mut state, &mut ctx, ShopItem::Potion).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::AtCapacity)));
        assert_eq!(state.player.gold, 100);
    }

    #[test]
    fn test_bundle_that_overflows_the_quiver_is_refused() {
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = state();
        state.mode = GameMode::Shopping;
        state.player.gold = 50;
        state.player.arrows = state.player.max_arrows - 2;

        let err = purchase(&mut state, &mut ctx, ShopItem::ArrowBundle).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::AtCapacity)));
        assert_eq!(state.player.gold, 50);
        assert_eq!(state.player.arrows, state.player.max_arrows - 2);

        state.player.arrows = state.player.max_arrows - 5;
        purchase(&mut state, &mut ctx, ShopItem::ArrowBundle).unwrap();
        assert_eq!(state.player.arrows, state.player.max_arrows);
        assert_eq!(state.player.gold, 40);
    }

    #[test]
    fn test_carry_over_keeps_permanent_progress() {
        let config = EngineConfig::default();
        let mut dead = Player::new(PlayerClass::Ranger, Position::new(4, 4));
        dead.hp = 0;
        dead.level = 4;
        dead.max_hp = 70;
        dead.attack = 12;
        dead.gold = 31;
        dead.xp = 50;
        dead.corruption = 40;
        dead.arrows = 0;
        dead.is_poisoned = true;
        dead.augments.insert(Augment::Marksman);

        let next = carry_over(&dead, &config);

        assert_eq!(next.level, 4);
        assert_eq!(next.hp, 70);
        assert_eq!(next.attack, 12);
        assert_eq!(next.gold, 15);
        assert_eq!(next.xp, 0);
        assert_eq!(next.xp_to_next_level, 160);
        assert_eq!(next.corruption, 40);
        assert!(next.has_augment(Augment::Marksman));
        assert_eq!(next.arrows, PlayerClass::Ranger.profile().arrows);
        assert!(!next.is_poisoned);
        assert_eq!(next.class, PlayerClass::Ranger);
    }
}
