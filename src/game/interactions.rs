//! # Arrival Interactions
//!
//! What happens when the player walks onto a tile. The wizard wins over the
//! exit, which wins over an altar; items and hazards apply whenever neither
//! the wizard nor the exit did.

use crate::game::augments::{apply_altar_effect, roll_altar_effect};
use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{
    DamageKind, DamageNumber, DamageSource, GameEvent, GameMode, GameState, Hazard, Item, ItemKind,
    MessageImportance, Position,
};
use log::info;

/// How an arrival affects the rest of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    Continue,
    /// The shop is open; enemies do not act this step
    OpenedShop,
    /// The player stands on the exit; the next level must be entered
    ExitedLevel,
}

/// Resolves the tile the player just moved onto.
pub fn resolve_arrival(state: &mut GameState, ctx: &mut TurnContext<'_>) -> Arrival {
    let pos = state.player.position;

    if state.wizard_at(pos).is_some() {
        state.mode = GameMode::Shopping;
        ctx.emit(GameEvent::ShopOpened);
        return Arrival::OpenedShop;
    }
    if pos == state.exit {
        let new_level = state.dungeon_level + 1;
        info!("Player leaves dungeon level {}", state.dungeon_level);
        ctx.emit(GameEvent::LevelExited { new_level });
        return Arrival::ExitedLevel;
    }
    if state.altar_at(pos).is_some() {
        invoke_altar(state, ctx, pos);
    }
    if let Some(item) = state.item_at(pos).copied() {
        pick_up_item(state, ctx, item);
    }
    if let Some(hazard) = state.hazard_at(pos).copied() {
        trigger_hazard(state, ctx, hazard);
    }
    Arrival::Continue
}

/// Collects an item once. Returns false if the item stays on the floor
/// because its counter is full.
pub fn pick_up_item(state: &mut GameState, ctx: &mut TurnContext<'_>, item: Item) -> bool {
    if state.picked_up.contains(&item.position) {
        return false;
    }

    let player = &mut state.player;
    let amount = match item.kind {
        ItemKind::HealthPotion if player.hp < player.max_hp => {
            let healed = player.heal(ctx.config.potion_heal);
            state
                .damage_numbers
                .push(DamageNumber::new(item.position, healed, DamageKind::Heal));
            ctx.emit(GameEvent::PlayerHealed { amount: healed });
            healed
        }
        ItemKind::HealthPotion => add_capped(&mut player.potions, player.max_potions, 1),
        ItemKind::Gold => {
            let gold = 5 + state.dungeon_level;
            player.gold += gold;
            gold
        }
        ItemKind::Arrows => add_capped(&mut player.arrows, player.max_arrows, 3),
        ItemKind::Bombs => add_capped(&mut player.bombs, player.max_bombs, 1),
        ItemKind::Antidote => add_capped(&mut player.antidotes, player.max_antidotes, 1),
    };
    if amount == 0 {
        return false;
    }

    state.picked_up.insert(item.position);
    ctx.emit(GameEvent::ItemPickedUp {
        kind: item.kind,
        position: item.position,
        amount,
    });
    true
}

fn add_capped(count: &mut u32, cap: u32, amount: u32) -> u32 {
    let before = *count;
    *count = (*count + amount).min(cap).max(before);
    *count - before
}

/// Hazards stay where they are and hurt on every arrival.
pub fn trigger_hazard(state: &mut GameState, ctx: &mut TurnContext<'_>, hazard: Hazard) {
    ctx.emit(GameEvent::HazardTriggered {
        kind: hazard.kind,
        position: hazard.position,
    });
    let damage = hazard
        .kind
        .damage(state.dungeon_level)
        .unwrap_or(state.player.hp);
    combat::damage_player(state, ctx, damage, DamageSource::Hazard(hazard.kind));
}

/// Rolls and applies an altar boon, then spends the altar.
pub fn invoke_altar(state: &mut GameState, ctx: &mut TurnContext<'_>, pos: Position) {
    let (effect, corruption) = roll_altar_effect(&state.player, &mut *ctx.rng);
    apply_altar_effect(&mut state.player, effect, corruption);
    state.spent_altars.insert(pos);

    info!(
        "Altar grants {:?} for {} corruption (now {})",
        effect, corruption, state.player.corruption
    );
    ctx.emit(GameEvent::AltarInvoked { effect, corruption });
    ctx.emit(GameEvent::Message {
        text: format!(
            "The altar grants {}. Corruption +{}.",
            effect.describe(),
            corruption
        ),
        importance: MessageImportance::Warning,
    });
}
