//! # Status Effects and Consumables
//!
//! Poison ticks and the two drinkable consumables.

use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{DamageKind, DamageNumber, DamageSource, GameEvent, GameState};
use crate::{GravewalkResult, Rejection};

/// Advances the poison counter; every `poison_interval` poisoned turns the
/// player takes poison damage and the counter restarts.
pub fn tick_poison(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    if !state.player.is_poisoned || !state.player.is_alive() {
        return;
    }
    state.player.poison_steps += 1;
    if state.player.poison_steps >= ctx.config.poison_interval.max(1) {
        state.player.poison_steps = 0;
        let damage = ctx.config.poison_damage;
        combat::damage_player(state, ctx, damage, DamageSource::Poison);
    }
}

/// Drinks a healing potion. Refused at full health.
pub fn use_potion(state: &mut GameState, ctx: &mut TurnContext<'_>) -> GravewalkResult<()> {
    if state.player.potions == 0 {
        return Err(Rejection::NoPotions.into());
    }
    if state.player.hp >= state.player.max_hp {
        return Err(Rejection::FullHealth.into());
    }

    state.player.potions -= 1;
    let healed = state.player.heal(ctx.config.potion_heal);
    state
        .damage_numbers
        .push(DamageNumber::new(state.player.position, healed, DamageKind::Heal));
    ctx.emit(GameEvent::PlayerHealed { amount: healed });
    Ok(())
}

/// Cures poison at once and resets the tick counter.
pub fn use_antidote(state: &mut GameState, ctx: &mut TurnContext<'_>) -> GravewalkResult<()> {
    if state.player.antidotes == 0 {
        return Err(Rejection::NoAntidotes.into());
    }
    if !state.player.is_poisoned {
        return Err(Rejection::NotPoisoned.into());
    }

    state.player.antidotes -= 1;
    state.player.is_poisoned = false;
    state.player.poison_steps = 0;
    ctx.emit(GameEvent::PoisonCured);
    Ok(())
}
