//! # Movement
//!
//! Resolves a directional intent into a move, a melee attack or a bump.

use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{Direction, GameEvent, GameState};
use crate::{GravewalkResult, Rejection};

/// What a directional intent turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The player now stands on the target tile
    Moved { screen_changed: bool },
    /// An enemy stood on the target tile and was attacked instead
    Attacked,
}

/// Moves the player one tile, or attacks whatever living enemy is there.
///
/// Walls and the world's edge refuse the step without consuming a turn.
/// Stepping onto a tile of another screen moves the camera to that screen.
pub fn resolve_step(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    direction: Direction,
) -> GravewalkResult<StepResult> {
    let from = state.player.position;
    let target = from.step(direction);

    if !state.map.in_bounds(target) {
        return Err(Rejection::OutOfWorld.into());
    }
    if !state.map.is_walkable(target) {
        return Err(Rejection::Bump.into());
    }

    if let Some(enemy) = state.enemy_at(target) {
        let id = enemy.id;
        combat::melee_attack(state, ctx, id);
        return Ok(StepResult::Attacked);
    }

    state.player.position = target;
    state.player.last_direction = Some(direction);
    ctx.emit(GameEvent::PlayerMoved { from, to: target });

    let screen = state.map.screen_of(target);
    let screen_changed = screen != state.camera;
    if screen_changed {
        state.camera = screen;
        ctx.emit(GameEvent::ScreenChanged { screen });
    }

    Ok(StepResult::Moved { screen_changed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::{Enemy, EnemyKind, Player, PlayerClass, Position, ScreenCoord};
    use crate::generation::LevelLayout;
    use crate::{GravewalkError, Map};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corridor() -> GameState {
        // Two 3-wide screens side by side
        let map = Map::from_ascii(&["......", "#....#"])
            .unwrap()
            .with_screen_size(3, 2);
        let layout = LevelLayout::empty(map, Position::new(1, 0), Position::new(4, 1));
        GameState::from_layout(layout, Player::new(PlayerClass::Warrior, Position::origin()), 1)
    }

    #[test]
    fn test_move_records_direction() {
        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = corridor();

        let result = resolve_step(&mut state, &mut ctx, Direction::West).unwrap();

        assert_eq!(result, StepResult::Moved { screen_changed: false });
        assert_eq!(state.player.position, Position::new(0, 0));
        assert_eq!(state.player.last_direction, Some(Direction::West));
    }

    #[test]
    fn test_wall_bumps() {
        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = corridor();
        state.player.position = Position::new(1, 1);

        let err = resolve_step(&mut state, &mut ctx, Direction::West).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::Bump)));
    }

    #[test]
    fn test_world_edge_is_refused() {
        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = corridor();

        let err = resolve_step(&mut state, &mut ctx, Direction::North).unwrap_err();
        assert!(matches!(err, GravewalkError::Rejected(Rejection::OutOfWorld)));
    }

    #[test]
    fn test_crossing_screens_moves_camera() {
        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = corridor();
        state.player.position = Position::new(2, 0);

        let result = resolve_step(&mut state, &mut ctx, Direction::East).unwrap();

        assert_eq!(result, StepResult::Moved { screen_changed: true });
        assert_eq!(state.camera, ScreenCoord::new(1, 0));
        assert!(ctx.events.contains(&GameEvent::ScreenChanged {
            screen: ScreenCoord::new(1, 0)
        }));
    }

    #[test]
    fn test_enemy_on_target_is_attacked_not_entered() {
        let config = EngineConfig::deterministic();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TurnContext::new(&config, &mut rng);
        let mut state = corridor();
        state.enemies.push(Enemy::new(EnemyKind::Orc, Position::new(2, 0)));

        let result = resolve_step(&mut state, &mut ctx, Direction::East).unwrap();

        assert_eq!(result, StepResult::Attacked);
        assert_eq!(state.player.position, Position::new(1, 0));
        assert_eq!(state.player.last_direction, None);
    }
}
