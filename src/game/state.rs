//! # Game State Module
//!
//! The aggregate root of a run and the events produced while resolving turns.
//!
//! [`GameState`] owns every piece of authoritative data: map, player, enemies,
//! decorations, bombs, the picked-up set, the camera and the current modal
//! mode. It also carries a little presentation state (blasts, damage numbers,
//! hit flashes) that never feeds back into turn resolution.

use crate::game::augments::AltarEffect;
use crate::game::progression::{LevelUpChoice, ShopItem};
use crate::game::{
    Altar, Blast, Bomb, ColorTheme, DamageNumber, Direction, Doodad, Enemy, EnemyKind, EntityId,
    Hazard, HazardKind, Item, ItemKind, Map, Player, Position, Projectile, ScreenCoord, Wizard,
};
use crate::generation::LevelLayout;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Which kind of input the game currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Normal exploration and combat
    Playing,
    /// Waiting for the player to pick a level-up reward
    LevelUp,
    /// The wizard's shop is open
    Shopping,
    Paused,
    /// Looking at one enemy's description
    Inspecting { enemy: EntityId },
    /// The player has died; only a restart is accepted
    GameOver,
}

impl GameMode {
    /// Modal modes suppress movement and attacks until dismissed.
    pub fn is_modal(self) -> bool {
        !matches!(self, GameMode::Playing)
    }
}

/// Importance levels for messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageImportance {
    Info,
    Warning,
    Critical,
}

/// What hurt the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Enemy(EnemyKind),
    Bomb,
    Poison,
    Hazard(HazardKind),
}

/// Everything observable that happened while resolving one intent.
///
/// Events drive sounds, messages and statistics; the state change itself is
/// already in the returned [`GameState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerMoved { from: Position, to: Position },
    ScreenChanged { screen: ScreenCoord },
    EnemyDamaged { enemy: EntityId, damage: u32 },
    EnemyDefeated { enemy: EntityId, kind: EnemyKind, xp: u32 },
    EnemySpawned { enemy: EntityId, kind: EnemyKind, position: Position },
    EnemyMoved { enemy: EntityId, from: Position, to: Position },
    PlayerDamaged { damage: u32, source: DamageSource },
    PlayerHealed { amount: u32 },
    PlayerPoisoned,
    PoisonCured,
    PlayerDied,
    ArrowFired { direction: Direction },
    ArrowDestroyed { position: Position },
    BombPlaced { bomb: EntityId, position: Position },
    BombDetonated { bomb: EntityId, blast: EntityId, tiles: BTreeSet<Position> },
    ItemPickedUp { kind: ItemKind, position: Position, amount: u32 },
    HazardTriggered { kind: HazardKind, position: Position },
    AltarInvoked { effect: AltarEffect, corruption: u32 },
    ShopOpened,
    Purchased { item: ShopItem, cost: u32 },
    LevelExited { new_level: u32 },
    LevelUpReady,
    LeveledUp { choice: LevelUpChoice, level: u32 },
    RunRestarted,
    Message { text: String, importance: MessageImportance },
}

impl GameEvent {
    pub fn message(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Info,
        }
    }
}

/// Run totals shown on the game-over screen. Survives level changes and
/// restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub enemies_defeated: u32,
    /// Collected items, gold included
    pub items_collected: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub deaths: u32,
    pub max_depth_reached: u32,
    /// Successful moves; bumps and attacks do not count
    pub steps_taken: u64,
}

impl GameStatistics {
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::PlayerMoved { .. } => self.steps_taken += 1,
            GameEvent::EnemyDamaged { damage, .. } => self.damage_dealt += u64::from(damage),
            GameEvent::PlayerDamaged { damage, .. } => self.damage_taken += u64::from(damage),
            GameEvent::EnemyDefeated { .. } => self.enemies_defeated += 1,
            GameEvent::ItemPickedUp { .. } => self.items_collected += 1,
            GameEvent::PlayerDied => self.deaths += 1,
            GameEvent::LevelExited { new_level } => {
                self.max_depth_reached = self.max_depth_reached.max(new_level)
            }
            _ => {}
        }
    }
}

/// Central game state: the single mutable aggregate of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub map: Map,
    pub player: Player,
    /// Living enemies; defeated ones are removed
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub hazards: Vec<Hazard>,
    pub doodads: Vec<Doodad>,
    pub wizards: Vec<Wizard>,
    pub altars: Vec<Altar>,
    pub entrance: Position,
    pub exit: Position,
    pub bombs: Vec<Bomb>,
    pub projectile: Option<Projectile>,
    /// Presentation: detonations of the last resolved step
    pub active_blasts: Vec<Blast>,
    /// Presentation: floating damage numbers
    pub damage_numbers: Vec<DamageNumber>,
    /// Presentation: the player was hurt this step
    pub player_hit_flash: bool,
    /// Item positions already collected on this level
    pub picked_up: HashSet<Position>,
    /// Altar positions already used on this level
    pub spent_altars: HashSet<Position>,
    pub dungeon_level: u32,
    pub camera: ScreenCoord,
    pub theme: ColorTheme,
    pub mode: GameMode,
    pub turn_number: u64,
    pub statistics: GameStatistics,
}

impl GameState {
    /// Creates the state for a freshly generated level with the player on its
    /// entrance.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravewalk::{GameState, LevelLayout, Map, Player, PlayerClass, Position};
    ///
    /// let map = Map::from_ascii(&["#####", "#...#", "#####"]).unwrap();
    /// let layout = LevelLayout::empty(map, Position::new(1, 1), Position::new(3, 1));
    /// let player = Player::new(PlayerClass::Warrior, Position::origin());
    /// let state = GameState::from_layout(layout, player, 1);
    /// assert_eq!(state.player.position, Position::new(1, 1));
    /// assert_eq!(state.turn_number, 0);
    /// ```
    pub fn from_layout(layout: LevelLayout, mut player: Player, dungeon_level: u32) -> Self {
        player.position = layout.entrance;
        let camera = layout.map.screen_of(layout.entrance);
        Self {
            map: layout.map,
            player,
            enemies: layout.enemies,
            items: layout.items,
            hazards: layout.hazards,
            doodads: layout.doodads,
            wizards: layout.wizards,
            altars: layout.altars,
            entrance: layout.entrance,
            exit: layout.exit,
            bombs: Vec::new(),
            projectile: None,
            active_blasts: Vec::new(),
            damage_numbers: Vec::new(),
            player_hit_flash: false,
            picked_up: HashSet::new(),
            spent_altars: HashSet::new(),
            dungeon_level,
            camera,
            theme: layout.theme,
            mode: GameMode::Playing,
            turn_number: 0,
            statistics: GameStatistics {
                max_depth_reached: dungeon_level,
                ..GameStatistics::default()
            },
        }
    }

    /// Replaces the level while keeping the player and the run's statistics.
    pub fn enter_level(&mut self, layout: LevelLayout, dungeon_level: u32) {
        let player = self.player.clone();
        let statistics = self.statistics.clone();
        let turn_number = self.turn_number;
        *self = Self::from_layout(layout, player, dungeon_level);
        self.statistics = statistics;
        self.statistics.max_depth_reached = self.statistics.max_depth_reached.max(dungeon_level);
        self.turn_number = turn_number;
    }

    pub fn is_game_over(&self) -> bool {
        self.mode == GameMode::GameOver
    }

    /// Living enemy standing on a position.
    pub fn enemy_at(&self, pos: Position) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.is_alive() && e.position == pos)
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    /// Item still lying at a position: it exists there and was never picked up.
    pub fn item_at(&self, pos: Position) -> Option<&Item> {
        if self.picked_up.contains(&pos) {
            return None;
        }
        self.items.iter().find(|item| item.position == pos)
    }

    pub fn hazard_at(&self, pos: Position) -> Option<&Hazard> {
        self.hazards.iter().find(|h| h.position == pos)
    }

    pub fn wizard_at(&self, pos: Position) -> Option<&Wizard> {
        self.wizards.iter().find(|w| w.position == pos)
    }

    /// Unused altar at a position.
    pub fn altar_at(&self, pos: Position) -> Option<&Altar> {
        if self.spent_altars.contains(&pos) {
            return None;
        }
        self.altars.iter().find(|a| a.position == pos)
    }

    pub fn bomb_at(&self, pos: Position) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.position == pos)
    }

    /// Ids of living enemies on a screen, in list order.
    pub fn enemies_on_screen(&self, screen: ScreenCoord) -> Vec<EntityId> {
        self.enemies
            .iter()
            .filter(|e| e.is_alive() && self.map.screen_contains(screen, e.position))
            .map(|e| e.id)
            .collect()
    }

    /// Clears the one-step presentation flags before a new resolution cycle.
    pub fn clear_transient(&mut self) {
        for enemy in &mut self.enemies {
            enemy.just_hit = false;
        }
        self.player_hit_flash = false;
        self.active_blasts.clear();
    }

    pub fn clear_enemy_flash(&mut self, id: EntityId) {
        if let Some(enemy) = self.enemy_mut(id) {
            enemy.just_hit = false;
        }
    }

    pub fn expire_damage_number(&mut self, id: EntityId) {
        self.damage_numbers.retain(|n| n.id != id);
    }

    pub fn clear_blast(&mut self, id: EntityId) {
        self.active_blasts.retain(|b| b.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PlayerClass;

    fn state() -> GameState {
        let map = Map::from_ascii(&["######", "#....#", "#....#", "######"]).unwrap();
        let mut layout = LevelLayout::empty(map, Position::new(1, 1), Position::new(4, 2));
        layout.items.push(Item {
            kind: ItemKind::Gold,
            position: Position::new(2, 1),
        });
        layout.altars.push(Altar {
            position: Position::new(3, 2),
        });
        GameState::from_layout(layout, Player::new(PlayerClass::Warrior, Position::origin()), 1)
    }

    #[test]
    fn test_new_state_starts_on_entrance() {
        let state = state();
        assert_eq!(state.turn_number, 0);
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.player.position, Position::new(1, 1));
        assert_eq!(state.camera, ScreenCoord::new(0, 0));
    }

    #[test]
    fn test_item_presence_is_derived_from_picked_up_set() {
        let mut state = state();
        let pos = Position::new(2, 1);
        assert!(state.item_at(pos).is_some());
        state.picked_up.insert(pos);
        assert!(state.item_at(pos).is_none());
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_spent_altars_disappear() {
        let mut state = state();
        let pos = Position::new(3, 2);
        assert!(state.altar_at(pos).is_some());
        state.spent_altars.insert(pos);
        assert!(state.altar_at(pos).is_none());
    }

    #[test]
    fn test_dead_enemies_are_not_found() {
        let mut state = state();
        let mut enemy = Enemy::new(EnemyKind::Rat, Position::new(3, 1));
        enemy.hp = 0;
        state.enemies.push(enemy);
        assert!(state.enemy_at(Position::new(3, 1)).is_none());
        assert!(state.enemies_on_screen(state.camera).is_empty());
    }

    #[test]
    fn test_clear_transient() {
        let mut state = state();
        let mut enemy = Enemy::new(EnemyKind::Rat, Position::new(3, 1));
        enemy.just_hit = true;
        state.enemies.push(enemy);
        state.player_hit_flash = true;
        state.active_blasts.push(Blast {
            id: crate::game::new_entity_id(),
            tiles: BTreeSet::new(),
        });
        state.clear_transient();
        assert!(!state.enemies[0].just_hit);
        assert!(!state.player_hit_flash);
        assert!(state.active_blasts.is_empty());
    }

    #[test]
    fn test_enter_level_keeps_player_and_stats() {
        let mut state = state();
        state.player.gold = 42;
        state.picked_up.insert(Position::new(2, 1));
        state.statistics.enemies_defeated = 3;
        let map = Map::from_ascii(&["####", "#..#", "####"]).unwrap();
        state.enter_level(LevelLayout::empty(map, Position::new(2, 1), Position::new(1, 1)), 2);
        assert_eq!(state.player.gold, 42);
        assert_eq!(state.player.position, Position::new(2, 1));
        assert!(state.picked_up.is_empty());
        assert_eq!(state.dungeon_level, 2);
        assert_eq!(state.statistics.enemies_defeated, 3);
        assert_eq!(state.statistics.max_depth_reached, 2);
    }

    #[test]
    fn test_statistics_tally_a_fight() {
        let mut stats = GameStatistics::default();
        let rat = crate::game::new_entity_id();
        let fight = [
            GameEvent::PlayerMoved {
                from: Position::new(1, 1),
                to: Position::new(2, 1),
            },
            GameEvent::EnemyDamaged { enemy: rat, damage: 2 },
            GameEvent::PlayerDamaged {
                damage: 1,
                source: DamageSource::Enemy(EnemyKind::Rat),
            },
            GameEvent::EnemyDamaged { enemy: rat, damage: 2 },
            GameEvent::EnemyDefeated {
                enemy: rat,
                kind: EnemyKind::Rat,
                xp: 3,
            },
        ];
        for event in &fight {
            stats.update_from_event(event);
        }
        assert_eq!(stats.steps_taken, 1);
        assert_eq!(stats.damage_dealt, 4);
        assert_eq!(stats.damage_taken, 1);
        assert_eq!(stats.enemies_defeated, 1);
        assert_eq!(stats.deaths, 0);
    }

    #[test]
    fn test_state_survives_json() {
        let mut state = state();
        state.picked_up.insert(Position::new(2, 1));
        let json = serde_json::to_string(&state).unwrap();
        let loaded: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.player, state.player);
        assert!(loaded.item_at(Position::new(2, 1)).is_none());
    }
}
