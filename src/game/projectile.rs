//! # Ranged Attacks
//!
//! Firing spends an arrow and launches the single projectile that may be in
//! flight. The projectile then advances one tile per call to
//! [`advance_projectile`] until it meets a wall or an enemy.

use crate::game::augments::Augment;
use crate::game::combat;
use crate::game::turn::TurnContext;
use crate::game::{GameEvent, GameState, Projectile};
use crate::{GravewalkResult, Rejection};

/// Result of moving the projectile one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStep {
    /// The arrow is still travelling
    InFlight,
    /// The arrow is gone; the firing turn is complete
    Resolved,
}

/// Spends an arrow and launches it along the last-moved direction.
pub fn fire_arrow(state: &mut GameState, ctx: &mut TurnContext<'_>) -> GravewalkResult<()> {
    if state.projectile.is_some() {
        return Err(Rejection::ArrowInFlight.into());
    }
    if state.player.arrows == 0 {
        return Err(Rejection::NoArrows.into());
    }
    let Some(direction) = state.player.last_direction else {
        return Err(Rejection::NoAim.into());
    };

    state.player.arrows -= 1;
    state.projectile = Some(Projectile::new(state.player.position, direction));
    ctx.emit(GameEvent::ArrowFired { direction });
    Ok(())
}

/// Damage of one arrow hit before the random bonus.
pub fn arrow_damage(state: &GameState, factor: f64) -> u32 {
    let base = state.player.attack + state.player.arrow_bonus();
    (f64::from(base) * factor).floor() as u32
}

/// Moves the arrow one tile and resolves whatever it meets.
pub fn advance_projectile(state: &mut GameState, ctx: &mut TurnContext<'_>) -> FlightStep {
    let Some(mut arrow) = state.projectile.take() else {
        return FlightStep::Resolved;
    };
    let next = arrow.position.step(arrow.direction);

    if !state.map.is_walkable(next) {
        ctx.emit(GameEvent::ArrowDestroyed {
            position: arrow.position,
        });
        return FlightStep::Resolved;
    }

    let target = state
        .enemy_at(next)
        .map(|enemy| enemy.id)
        .filter(|id| !arrow.struck.contains(id));

    if let Some(id) = target {
        let damage = arrow_damage(state, ctx.config.arrow_damage_factor)
            + ctx.roll(ctx.config.arrow_variance);
        combat::damage_enemy(state, ctx, id, damage);

        if !state.player.has_augment(Augment::Piercing) {
            ctx.emit(GameEvent::ArrowDestroyed { position: next });
            return FlightStep::Resolved;
        }
        arrow.struck.push(id);
    }

    arrow.position = next;
    state.projectile = Some(arrow);
    FlightStep::InFlight
}
