//! # Bombs
//!
//! Placement, fuse countdown and detonation.
//!
//! Blasts spread in a plus shape from the bomb's tile. Each arm stops at the
//! first wall, which is not part of the blast.

use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{
    new_entity_id, Blast, Bomb, DamageSource, Direction, GameEvent, GameState, Map, Position,
};
use crate::{GravewalkResult, Rejection};
use log::debug;
use std::collections::BTreeSet;

/// Arms a bomb on the player's tile. Does not consume a turn.
pub fn place_bomb(state: &mut GameState, ctx: &mut TurnContext<'_>) -> GravewalkResult<()> {
    if state.player.bombs == 0 {
        return Err(Rejection::NoBombs.into());
    }
    let position = state.player.position;
    if state.bomb_at(position).is_some() {
        return Err(Rejection::BombAlreadyHere.into());
    }

    state.player.bombs -= 1;
    let bomb = Bomb::new(position, ctx.config.bomb_fuse);
    ctx.emit(GameEvent::BombPlaced {
        bomb: bomb.id,
        position,
    });
    state.bombs.push(bomb);
    Ok(())
}

/// Tiles hit by a blast centred on `center`.
///
/// # Examples
///
/// ```
/// use gravewalk::game::bombs::blast_area;
/// use gravewalk::{Map, Position};
///
/// let map = Map::from_ascii(&["#####", "#...#", "#####"]).unwrap();
/// let tiles = blast_area(&map, Position::new(1, 1), 2);
/// assert_eq!(tiles.len(), 3);
/// ```
pub fn blast_area(map: &Map, center: Position, range: u32) -> BTreeSet<Position> {
    let mut tiles = BTreeSet::new();
    tiles.insert(center);
    for direction in Direction::all() {
        let mut pos = center;
        for _ in 0..range {
            pos = pos.step(direction);
            if !map.is_walkable(pos) {
                break;
            }
            tiles.insert(pos);
        }
    }
    tiles
}

/// Counts every fuse down by one and detonates the bombs that reach zero.
pub fn tick_fuses(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    if state.bombs.is_empty() {
        return;
    }
    for bomb in &mut state.bombs {
        bomb.fuse = bomb.fuse.saturating_sub(1);
    }
    let (ready, armed): (Vec<Bomb>, Vec<Bomb>) =
        state.bombs.drain(..).partition(|bomb| bomb.fuse == 0);
    state.bombs = armed;

    for bomb in ready {
        detonate(state, ctx, bomb);
    }
}

/// Damages everything inside the blast once and records the blast tiles.
fn detonate(state: &mut GameState, ctx: &mut TurnContext<'_>, bomb: Bomb) {
    let tiles = blast_area(&state.map, bomb.position, ctx.config.bomb_range);
    let damage = ctx.config.bomb_base_damage + state.player.bomb_bonus();
    debug!(
        "Bomb at {:?} detonates over {} tiles for {}",
        bomb.position,
        tiles.len(),
        damage
    );

    // Collected up front so enemies spawned by the blast are not hit by it
    let targets: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| e.is_alive() && tiles.contains(&e.position))
        .map(|e| e.id)
        .collect();

    let blast = Blast {
        id: new_entity_id(),
        tiles: tiles.clone(),
    };
    ctx.emit(GameEvent::BombDetonated {
        bomb: bomb.id,
        blast: blast.id,
        tiles: tiles.clone(),
    });
    state.active_blasts.push(blast);

    for id in targets {
        combat::damage_enemy(state, ctx, id, damage);
    }
    if tiles.contains(&state.player.position) {
        combat::damage_player(state, ctx, damage, DamageSource::Bomb);
    }
}
