//! End-to-end turn scenarios driven through the public engine API.

mod common;

use common::{corridor, layout, start};
use gravewalk::{
    DamageKind, Direction, Enemy, EnemyKind, GameEvent, GameMode, GravewalkError, Item, ItemKind,
    PlayerClass, PlayerIntent, Position, Rejection,
};

fn east() -> PlayerIntent {
    PlayerIntent::Move(Direction::East)
}

#[test]
fn test_arrow_into_wall_spends_one_arrow() {
    let shaft = layout(
        &["#####", "#.#.#", "#.#.#", "#.#.#", "#...#", "#####"],
        Position::new(1, 4),
        Position::new(3, 1),
    );
    let (mut engine, mut state) = start(shaft, PlayerClass::Ranger);
    state.player.last_direction = Some(Direction::North);
    let arrows = state.player.arrows;

    let fired = engine.resolve(&state, PlayerIntent::Fire).unwrap();
    assert_eq!(fired.state.player.arrows, arrows - 1);

    let mut current = fired.state;
    let mut steps = 0;
    let mut events = Vec::new();
    loop {
        let outcome = engine.advance_projectile(&current).unwrap();
        steps += 1;
        events.extend(outcome.events);
        current = outcome.state;
        if outcome.turn_consumed {
            break;
        }
    }

    // Three floor tiles, then the wall
    assert_eq!(steps, 4);
    assert!(current.projectile.is_none());
    assert_eq!(current.turn_number, 1);
    assert_eq!(current.statistics.damage_dealt, 0);
    assert!(events.contains(&GameEvent::ArrowDestroyed {
        position: Position::new(1, 1)
    }));
}

#[test]
fn test_gold_on_level_three_pays_eight_once() {
    let mut level = corridor();
    level.items.push(Item {
        kind: ItemKind::Gold,
        position: Position::new(2, 1),
    });
    let (mut engine, mut state) = start(level, PlayerClass::Warrior);
    state.dungeon_level = 3;

    let there = engine.resolve(&state, east()).unwrap().state;
    assert_eq!(there.player.gold, 8);

    let back = engine
        .resolve(&there, PlayerIntent::Move(Direction::West))
        .unwrap()
        .state;
    let again = engine.resolve(&back, east()).unwrap().state;
    assert_eq!(again.player.gold, 8);
    assert_eq!(again.statistics.items_collected, 1);
}

#[test]
fn test_bomb_detonates_on_sixth_turn() {
    let (mut engine, state) = start(corridor(), PlayerClass::Warrior);
    let mut current = engine
        .resolve(&state, PlayerIntent::PlaceBomb)
        .unwrap()
        .state;
    assert_eq!(current.bombs.len(), 1);
    assert_eq!(current.turn_number, 0);

    for turn in 1..=5 {
        current = engine.resolve(&current, east()).unwrap().state;
        assert_eq!(current.bombs[0].fuse, 6 - turn);
    }

    let outcome = engine.resolve(&current, east()).unwrap();
    assert!(outcome.state.bombs.is_empty());
    assert_eq!(outcome.state.active_blasts.len(), 1);
    let detonations = outcome
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::BombDetonated { .. }))
        .count();
    assert_eq!(detonations, 1);
    // Out of reach at (7,1)
    assert_eq!(outcome.state.player.hp, outcome.state.player.max_hp);
}

#[test]
fn test_poison_kills_exactly_once() {
    let (mut engine, mut state) = start(corridor(), PlayerClass::Warrior);
    state.player.is_poisoned = true;
    state.player.hp = 5;
    state.player.poison_steps = engine.config().poison_interval - 1;

    let outcome = engine.resolve(&state, east()).unwrap();
    assert_eq!(outcome.state.player.hp, 0);
    assert_eq!(outcome.state.mode, GameMode::GameOver);
    assert_eq!(outcome.state.statistics.deaths, 1);
    let deaths = outcome
        .events
        .iter()
        .filter(|e| **e == GameEvent::PlayerDied)
        .count();
    assert_eq!(deaths, 1);
    assert_eq!(outcome.state.damage_numbers[0].kind, DamageKind::Poison);

    let err = engine.resolve(&outcome.state, east()).unwrap_err();
    assert!(matches!(err, GravewalkError::Rejected(Rejection::GameOver)));
}

#[test]
fn test_melee_kill_grants_experience() {
    let mut level = corridor();
    level.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(2, 1)));
    let (mut engine, state) = start(level, PlayerClass::Warrior);

    let mut current = state;
    for _ in 0..4 {
        if current.enemies.iter().all(|e| !e.is_alive()) {
            break;
        }
        current = engine.resolve(&current, east()).unwrap().state;
    }

    assert_eq!(current.statistics.enemies_defeated, 1);
    assert_eq!(current.player.xp, 3);
}

#[test]
fn test_rejected_intent_leaves_state_alone() {
    let (mut engine, state) = start(corridor(), PlayerClass::Sapper);
    let snapshot = state.clone();

    for intent in [
        PlayerIntent::Move(Direction::North),
        PlayerIntent::Fire,
        PlayerIntent::UsePotion,
        PlayerIntent::Restart,
    ] {
        assert!(engine.resolve(&state, intent).is_err());
    }
    assert_eq!(state, snapshot);
}
