//! # Combat
//!
//! Damage primitives shared by every resolver, melee exchanges, enemy strikes
//! and enemy defeat.
//!
//! All hit point changes go through [`damage_player`] and [`damage_enemy`] so
//! that clamping, presentation side effects and the one-shot death transition
//! live in one place.

use crate::game::augments::Augment;
use crate::game::progression;
use crate::game::turn::TurnContext;
use crate::game::{
    DamageKind, DamageNumber, DamageSource, Enemy, EnemyKind, EntityId, GameEvent, GameMode,
    GameState, MessageImportance, Position,
};
use log::info;
use rand::Rng;

/// Applies damage to the player and returns the hit points actually lost.
///
/// Hit points never drop below zero. Reaching zero enters the game-over mode
/// exactly once; a player already at zero takes no further damage.
pub fn damage_player(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    amount: u32,
    source: DamageSource,
) -> u32 {
    if !state.player.is_alive() || amount == 0 {
        return 0;
    }

    let dealt = amount.min(state.player.hp);
    state.player.hp -= dealt;
    state.player_hit_flash = true;
    let kind = match source {
        DamageSource::Poison => DamageKind::Poison,
        _ => DamageKind::Harm,
    };
    state
        .damage_numbers
        .push(DamageNumber::new(state.player.position, dealt, kind));
    ctx.emit(GameEvent::PlayerDamaged {
        damage: dealt,
        source,
    });

    if state.player.hp == 0 {
        enter_game_over(state, ctx);
    }
    dealt
}

fn enter_game_over(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    if state.mode == GameMode::GameOver {
        return;
    }
    info!(
        "Player died on dungeon level {} at {:?}",
        state.dungeon_level, state.player.position
    );
    state.mode = GameMode::GameOver;
    state.projectile = None;
    ctx.emit(GameEvent::PlayerDied);
    ctx.emit(GameEvent::Message {
        text: "You have fallen. Press Enter to rise again.".to_string(),
        importance: MessageImportance::Critical,
    });
}

/// Applies damage to a living enemy. Returns true if the hit defeated it.
pub fn damage_enemy(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    id: EntityId,
    amount: u32,
) -> bool {
    let Some(enemy) = state.enemy_mut(id) else {
        return false;
    };
    if !enemy.is_alive() {
        return false;
    }

    enemy.hp = enemy.hp.saturating_sub(amount);
    enemy.just_hit = true;
    let position = enemy.position;
    let defeated = !enemy.is_alive();

    state
        .damage_numbers
        .push(DamageNumber::new(position, amount, DamageKind::Harm));
    ctx.emit(GameEvent::EnemyDamaged {
        enemy: id,
        damage: amount,
    });

    if defeated {
        defeat_enemy(state, ctx, id);
    }
    defeated
}

/// Grants XP, runs on-death behaviour and removes the enemy.
pub fn defeat_enemy(state: &mut GameState, ctx: &mut TurnContext<'_>, id: EntityId) {
    let Some(index) = state.enemies.iter().position(|e| e.id == id) else {
        return;
    };
    let enemy = state.enemies.remove(index);
    let xp = progression::xp_for_defeat(enemy.kind, state.dungeon_level);
    ctx.emit(GameEvent::EnemyDefeated {
        enemy: id,
        kind: enemy.kind,
        xp,
    });

    if enemy.kind.stats().splits_on_death {
        split(state, ctx, enemy.position);
    }
    progression::grant_xp(state, ctx, xp);
}

/// Spawns two slimelings: one where the slime fell, one on a free neighbour.
fn split(state: &mut GameState, ctx: &mut TurnContext<'_>, origin: Position) {
    let mut candidates = vec![origin];
    candidates.extend(origin.cardinal_adjacent_positions());

    let mut spawned = 0;
    for pos in candidates {
        if spawned == 2 {
            break;
        }
        let free = state.map.is_walkable(pos)
            && pos != state.player.position
            && state.enemy_at(pos).is_none();
        if !free {
            continue;
        }
        let child = Enemy::new(EnemyKind::Slimeling, pos);
        ctx.emit(GameEvent::EnemySpawned {
            enemy: child.id,
            kind: child.kind,
            position: pos,
        });
        state.enemies.push(child);
        spawned += 1;
    }
}

/// One enemy hits the player, possibly poisoning them.
pub fn enemy_strike(state: &mut GameState, ctx: &mut TurnContext<'_>, id: EntityId) {
    let Some(kind) = state.enemy(id).filter(|e| e.is_alive()).map(|e| e.kind) else {
        return;
    };
    let stats = kind.stats();

    let variance = ctx.config.enemy_variance;
    let mut damage = stats.attack + ctx.roll(variance);
    if ctx.config.corruption_scaling && ctx.config.corruption_divisor > 0 {
        damage += state.player.corruption / ctx.config.corruption_divisor;
    }
    if state.player.has_augment(Augment::Ironhide) {
        damage = damage.saturating_sub(1).max(1);
    }
    damage_player(state, ctx, damage, DamageSource::Enemy(kind));

    if stats.can_poison && state.player.is_alive() && !state.player.is_poisoned {
        let chance = ctx.config.poison_chance.clamp(0.0, 1.0);
        if ctx.rng.gen_bool(chance) {
            state.player.is_poisoned = true;
            state.player.poison_steps = 0;
            ctx.emit(GameEvent::PlayerPoisoned);
        }
    }
}

/// The player attacks an adjacent enemy; a survivor strikes back.
pub fn melee_attack(state: &mut GameState, ctx: &mut TurnContext<'_>, id: EntityId) {
    let variance = ctx.config.melee_variance;
    let damage = state.player.attack + state.player.melee_bonus() + ctx.roll(variance);
    let defeated = damage_enemy(state, ctx, id, damage);
    if !defeated {
        ctx.retaliated.insert(id);
        enemy_strike(state, ctx, id);
    }
}
