//! # Enemy AI
//!
//! Greedy axis-aligned chase. Every enemy on the player's screen decides
//! against the same snapshot of positions, so the order enemies are stored in
//! never changes the outcome of a turn.

use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{EntityId, GameEvent, GameState, Map, Position};
use std::collections::{HashMap, HashSet};

/// What one enemy does this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyAction {
    Hold,
    MoveTo(Position),
    Attack,
}

/// Picks an enemy's action.
///
/// The enemy steps along the axis with the larger distance to the player;
/// ties go to the horizontal axis. Stepping onto the player is an attack.
/// Walls and tiles occupied in `occupied` make it hold.
pub fn decide(
    enemy: Position,
    player: Position,
    map: &Map,
    occupied: &HashSet<Position>,
) -> EnemyAction {
    let delta = player - enemy;
    if delta.x == 0 && delta.y == 0 {
        return EnemyAction::Hold;
    }

    let step = if delta.x.abs() >= delta.y.abs() {
        Position::new(delta.x.signum(), 0)
    } else {
        Position::new(0, delta.y.signum())
    };
    let destination = enemy + step;

    if destination == player {
        EnemyAction::Attack
    } else if !map.is_walkable(destination) || occupied.contains(&destination) {
        EnemyAction::Hold
    } else {
        EnemyAction::MoveTo(destination)
    }
}

/// Plans the turn for every active enemy.
///
/// Two enemies heading for the same tile both hold.
pub fn plan_enemy_turn(
    state: &GameState,
    skip: &HashSet<EntityId>,
) -> Vec<(EntityId, EnemyAction)> {
    let occupied: HashSet<Position> = state
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.position)
        .collect();

    let mut plans: Vec<(EntityId, EnemyAction)> = state
        .enemies_on_screen(state.camera)
        .into_iter()
        .filter(|id| !skip.contains(id))
        .filter_map(|id| {
            let enemy = state.enemy(id)?;
            let action = decide(enemy.position, state.player.position, &state.map, &occupied);
            Some((id, action))
        })
        .collect();

    let mut claims: HashMap<Position, usize> = HashMap::new();
    for (_, action) in &plans {
        if let EnemyAction::MoveTo(destination) = action {
            *claims.entry(*destination).or_insert(0) += 1;
        }
    }
    for (_, action) in &mut plans {
        if let EnemyAction::MoveTo(destination) = *action {
            if claims.get(&destination).copied().unwrap_or(0) > 1 {
                *action = EnemyAction::Hold;
            }
        }
    }
    plans
}

/// Runs the enemy half of a turn. Stops as soon as the player dies.
pub fn run_enemy_turn(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    let plans = plan_enemy_turn(state, &ctx.retaliated);

    for (id, action) in plans {
        if !state.player.is_alive() {
            break;
        }
        match action {
            EnemyAction::Hold => {}
            EnemyAction::Attack => combat::enemy_strike(state, ctx, id),
            EnemyAction::MoveTo(to) => {
                if let Some(enemy) = state.enemy_mut(id) {
                    let from = enemy.position;
                    enemy.position = to;
                    ctx.emit(GameEvent::EnemyMoved { enemy: id, from, to });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::{Enemy, EnemyKind, Player, PlayerClass};
    use crate::generation::LevelLayout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hall() -> GameState {
        let map = Map::from_ascii(&[
            "#######", //
            "#.....#",
            "#.....#",
            "#.....#",
            "#######",
        ])
        .unwrap();
        let layout = LevelLayout::empty(map, Position::new(3, 2), Position::new(1, 1));
        GameState::from_layout(layout, Player::new(PlayerClass::Warrior, Position::origin()), 1)
    }

    #[test]
    fn test_larger_axis_first() {
        let state = hall();
        let none = HashSet::new();
        assert_eq!(
            decide(Position::new(1, 1), Position::new(4, 2), &state.map, &none),
            EnemyAction::MoveTo(Position::new(2, 1))
        );
        assert_eq!(
            decide(Position::new(3, 1), Position::new(3, 3), &state.map, &none),
            EnemyAction::MoveTo(Position::new(3, 2))
        );
        // Ties go horizontal
        assert_eq!(
            decide(Position::new(1, 1), Position::new(2, 2), &state.map, &none),
            EnemyAction::MoveTo(Position::new(2, 1))
        );
    }

    #[test]
    fn test_adjacent_enemy_attacks() {
        let state = hall();
        assert_eq!(
            decide(Position::new(2, 2), Position::new(3, 2), &state.map, &HashSet::new()),
            EnemyAction::Attack
        );
    }

    #[test]
    fn test_blocked_enemy_holds() {
        let state = hall();
        let occupied = HashSet::from([Position::new(2, 1)]);
        assert_eq!(
            decide(Position::new(1, 1), Position::new(5, 1), &state.map, &occupied),
            EnemyAction::Hold
        );
    }

    #[test]
    fn test_contested_tile_is_left_empty() {
        let mut state = hall();
        state.player.position = Position::new(3, 3);
        // One closes in vertically, the other horizontally, both onto (2, 2)
        state.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(2, 1)));
        state.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(1, 2)));
        let plans = plan_enemy_turn(&state, &HashSet::new());
        assert!(plans.iter().all(|(_, action)| *action == EnemyAction::Hold));
    }

    #[test]
    fn test_order_independent() {
        let mut forward = hall();
        forward.player.position = Position::new(5, 1);
        forward.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(1, 1)));
        forward.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(2, 1)));
        let mut backward = forward.clone();
        backward.enemies.reverse();

        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = TurnContext::new(&config, &mut rng);
        run_enemy_turn(&mut forward, &mut ctx);
        run_enemy_turn(&mut backward, &mut ctx);

        let mut a: Vec<_> = forward.enemies.iter().map(|e| e.position).collect();
        let mut b: Vec<_> = backward.enemies.iter().map(|e| e.position).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        // The rear rat is blocked by the snapshot position of the front one
        assert!(a.contains(&Position::new(1, 1)));
        assert!(a.contains(&Position::new(3, 1)));
    }

    #[test]
    fn test_retaliating_enemy_skips_its_turn() {
        let mut state = hall();
        let rat = Enemy::new(EnemyKind::Rat, Position::new(2, 2));
        let id = rat.id;
        state.enemies.push(rat);

        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = TurnContext::new(&config, &mut rng);
        ctx.retaliated.insert(id);
        run_enemy_turn(&mut state, &mut ctx);

        assert_eq!(state.player.hp, 40);
    }

    #[test]
    fn test_offscreen_enemies_wait() {
        let map = Map::from_ascii(&["........"]).unwrap().with_screen_size(4, 1);
        let layout = LevelLayout::empty(map, Position::new(1, 0), Position::new(0, 0));
        let mut state =
            GameState::from_layout(layout, Player::new(PlayerClass::Warrior, Position::origin()), 1);
        state.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(6, 0)));

        assert!(plan_enemy_turn(&state, &HashSet::new()).is_empty());
    }
}
