//! # Encounter Placement
//!
//! Fills a carved level with the wizard, an optional altar, enemies, items,
//! hazards and scenery. Every placement gets its own floor tile and nothing
//! is ever put on the entrance.

use crate::game::{
    Altar, Doodad, DoodadKind, Enemy, EnemyKind, Hazard, HazardKind, Item, ItemKind, Position,
    Wizard,
};
use crate::generation::{GenerationConfig, LevelLayout, Room};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Weighted item table: (kind, weight).
const ITEM_TABLE: [(ItemKind, u32); 5] = [
    (ItemKind::Gold, 8),
    (ItemKind::HealthPotion, 4),
    (ItemKind::Arrows, 4),
    (ItemKind::Bombs, 2),
    (ItemKind::Antidote, 2),
];

const DOODADS: [DoodadKind; 4] = [
    DoodadKind::Bones,
    DoodadKind::Torch,
    DoodadKind::Moss,
    DoodadKind::Rubble,
];

/// Number of things to place for a per-screen density.
fn count_for(density: f64, screens: u32) -> usize {
    (density * f64::from(screens)).round().max(0.0) as usize
}

fn roll_item(rng: &mut StdRng) -> ItemKind {
    let total: u32 = ITEM_TABLE.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (kind, weight) in ITEM_TABLE {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    ItemKind::Gold
}

fn roll_hazard(level: u32, rng: &mut StdRng) -> HazardKind {
    // Pits only appear from the second level on
    let pit_weight = if level >= 2 { 1 } else { 0 };
    match rng.gen_range(0..4 + pit_weight) {
        0 | 1 => HazardKind::Spikes,
        2 | 3 => HazardKind::Fire,
        _ => HazardKind::Pit,
    }
}

/// Places every entity of a level on distinct free floor tiles.
///
/// Hazards never land on corridors, so the passages between rooms stay safe.
/// Enemies keep off the entrance screen.
pub fn populate(
    layout: &mut LevelLayout,
    rooms: &[Room],
    corridors: &HashSet<Position>,
    config: &GenerationConfig,
    rng: &mut StdRng,
) {
    let entrance_screen = layout.map.screen_of(layout.entrance);
    let mut free: Vec<Position> = rooms
        .iter()
        .flat_map(|room| room.floor_positions())
        .filter(|pos| layout.map.is_walkable(*pos))
        .filter(|pos| *pos != layout.entrance && *pos != layout.exit)
        .collect();
    free.shuffle(rng);
    let mut taken: HashSet<Position> = HashSet::new();

    let mut claim = |predicate: &dyn Fn(Position) -> bool| -> Option<Position> {
        let index = free
            .iter()
            .position(|pos| !taken.contains(pos) && predicate(*pos))?;
        let pos = free.swap_remove(index);
        taken.insert(pos);
        Some(pos)
    };

    let screens = config.screen_count();
    let anywhere = |_: Position| true;

    if let Some(position) = claim(&anywhere) {
        layout.wizards.push(Wizard { position });
    }
    if rng.gen_bool(config.altar_chance.clamp(0.0, 1.0)) {
        if let Some(position) = claim(&anywhere) {
            layout.altars.push(Altar { position });
        }
    }

    let kinds = EnemyKind::spawnable_at(config.level);
    let depth_bonus = f64::from(config.level.saturating_sub(1)) * 0.25;
    let away_from_entrance = |pos: Position| layout.map.screen_of(pos) != entrance_screen;
    for _ in 0..count_for(config.enemy_density + depth_bonus, screens) {
        let Some(position) = claim(&away_from_entrance) else {
            break;
        };
        let kind = kinds.choose(rng).copied().unwrap_or(EnemyKind::Rat);
        layout.enemies.push(Enemy::new(kind, position));
    }

    for _ in 0..count_for(config.item_density, screens) {
        let Some(position) = claim(&anywhere) else {
            break;
        };
        let kind = roll_item(rng);
        layout.items.push(Item { kind, position });
    }

    let off_corridor = |pos: Position| !corridors.contains(&pos);
    for _ in 0..count_for(config.hazard_density, screens) {
        let Some(position) = claim(&off_corridor) else {
            break;
        };
        let kind = roll_hazard(config.level, rng);
        layout.hazards.push(Hazard { kind, position });
    }

    for _ in 0..count_for(config.doodad_density, screens) {
        let Some(position) = claim(&anywhere) else {
            break;
        };
        let kind = DOODADS[rng.gen_range(0..DOODADS.len())];
        layout.doodads.push(Doodad { kind, position });
    }
}
