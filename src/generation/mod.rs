//! # Generation Module
//!
//! Procedural dungeon levels for the turn engine.
//!
//! A level is a grid of screens, one room per screen, joined by corridors and
//! populated with enemies, items, hazards and the wizard. The engine only
//! depends on the [`Generator`] trait and the [`LevelLayout`] it produces.

pub mod dungeon;
pub mod encounters;

pub use dungeon::*;
pub use encounters::*;

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::game::{
    Altar, ColorTheme, Doodad, Enemy, Hazard, HazardKind, Item, Map, Position, ScreenCoord, Wizard,
};
use crate::{GravewalkError, GravewalkResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Knobs for level generation. Densities are per screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible runs
    pub seed: u64,
    /// Dungeon level being generated, starting at 1
    pub level: u32,
    /// Screen width in tiles
    pub screen_width: u32,
    /// Screen height in tiles
    pub screen_height: u32,
    /// World width in screens
    pub screens_x: u32,
    /// World height in screens
    pub screens_y: u32,
    /// Smallest room interior along either axis
    pub min_room_size: u32,
    /// Enemies per screen on level 1
    pub enemy_density: f64,
    /// Items per screen
    pub item_density: f64,
    /// Hazards per screen
    pub hazard_density: f64,
    /// Decorations per screen
    pub doodad_density: f64,
    /// Probability that a level has an altar (0.0 to 1.0)
    pub altar_chance: f64,
    /// Perlin value above which a room tile becomes a pillar
    pub pillar_threshold: f64,
    /// Layouts to try before giving up
    pub max_attempts: u32,
}

impl GenerationConfig {
    /// A 3x3 screen world on dungeon level 1.
    ///
    /// ```
    /// use gravewalk::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.level, 1);
    /// assert_eq!(config.world_width(), 60);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            level: 1,
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            screens_x: 3,
            screens_y: 3,
            min_room_size: 4,
            enemy_density: 1.5,
            item_density: 1.2,
            hazard_density: 0.6,
            doodad_density: 2.0,
            altar_chance: 0.5,
            pillar_threshold: 0.45,
            max_attempts: 20,
        }
    }

    /// A 2x2 world that always rolls an altar.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            screens_x: 2,
            screens_y: 2,
            enemy_density: 1.0,
            item_density: 1.0,
            hazard_density: 0.5,
            doodad_density: 1.0,
            altar_chance: 1.0,
            ..Self::new(seed)
        }
    }

    /// The same configuration targeting another dungeon level.
    pub fn for_level(&self, level: u32) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    pub fn world_width(&self) -> u32 {
        self.screen_width * self.screens_x
    }

    pub fn world_height(&self) -> u32 {
        self.screen_height * self.screens_y
    }

    pub fn screen_count(&self) -> u32 {
        self.screens_x * self.screens_y
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room inside one screen, walls included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Screen the room belongs to
    pub screen: ScreenCoord,
    /// World position of the corner wall tile
    pub top_left: Position,
    pub width: u32,
    pub height: u32,
}

impl Room {
    pub fn new(screen: ScreenCoord, top_left: Position, width: u32, height: u32) -> Self {
        Self {
            screen,
            top_left,
            width,
            height,
        }
    }

    /// Middle tile, rounded towards the top-left. Corridors aim here.
    pub fn center(&self) -> Position {
        let (w, h) = (self.width as i32, self.height as i32);
        self.top_left + Position::new(w / 2, h / 2)
    }

    /// True for any tile of the room, walls included.
    ///
    /// ```
    /// use gravewalk::generation::Room;
    /// use gravewalk::{Position, ScreenCoord};
    ///
    /// let room = Room::new(ScreenCoord::new(1, 0), Position::new(22, 3), 6, 5);
    /// assert!(room.contains(Position::new(22, 3)));
    /// assert!(!room.contains(Position::new(28, 3)));
    /// ```
    pub fn contains(&self, pos: Position) -> bool {
        let offset = pos - self.top_left;
        (0..self.width as i32).contains(&offset.x) && (0..self.height as i32).contains(&offset.y)
    }

    /// Interior tiles in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        let Position { x: left, y: top } = self.top_left;
        let (right, bottom) = (left + self.width as i32 - 1, top + self.height as i32 - 1);
        (top + 1..bottom)
            .flat_map(|y| (left + 1..right).map(move |x| Position::new(x, y)))
            .collect()
    }
}

/// A generated level: the map plus every placement on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub map: Map,
    /// Where the player starts
    pub entrance: Position,
    /// Stepping here descends
    pub exit: Position,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub hazards: Vec<Hazard>,
    pub doodads: Vec<Doodad>,
    pub wizards: Vec<Wizard>,
    pub altars: Vec<Altar>,
    pub theme: ColorTheme,
}

impl LevelLayout {
    /// A layout with no placements. Used for hand-built levels.
    pub fn empty(map: Map, entrance: Position, exit: Position) -> Self {
        Self {
            map,
            entrance,
            exit,
            enemies: Vec::new(),
            items: Vec::new(),
            hazards: Vec::new(),
            doodads: Vec::new(),
            wizards: Vec::new(),
            altars: Vec::new(),
            theme: ColorTheme::Crypt,
        }
    }

    /// Positions taken by anything the player interacts with.
    pub fn occupied_positions(&self) -> HashSet<Position> {
        let mut occupied: HashSet<Position> = HashSet::new();
        occupied.extend(self.enemies.iter().map(|e| e.position));
        occupied.extend(self.items.iter().map(|i| i.position));
        occupied.extend(self.hazards.iter().map(|h| h.position));
        occupied.extend(self.wizards.iter().map(|w| w.position));
        occupied.extend(self.altars.iter().map(|a| a.position));
        occupied
    }
}

/// Produces one `T` per call from a seeded rng. The engine rejects any
/// result that `validate` refuses.
pub trait Generator<T> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> GravewalkResult<T>;

    fn validate(&self, content: &T, config: &GenerationConfig) -> GravewalkResult<()>;

    /// Short name used in log lines.
    fn generator_type(&self) -> &'static str;
}

/// Serves one hand-built layout for every level, themed by depth.
///
/// Used for scripted scenarios and tests.
#[derive(Debug, Clone)]
pub struct FixedLayoutGenerator {
    layout: LevelLayout,
}

impl FixedLayoutGenerator {
    pub fn new(layout: LevelLayout) -> Self {
        Self { layout }
    }
}

impl Generator<LevelLayout> for FixedLayoutGenerator {
    fn generate(&self, config: &GenerationConfig, _rng: &mut StdRng) -> GravewalkResult<LevelLayout> {
        let mut layout = self.layout.clone();
        layout.theme = ColorTheme::for_level(config.level);
        Ok(layout)
    }

    fn validate(&self, layout: &LevelLayout, _config: &GenerationConfig) -> GravewalkResult<()> {
        if layout.map.is_walkable(layout.entrance) {
            Ok(())
        } else {
            Err(GravewalkError::GenerationFailed(
                "Entrance must be floor".to_string(),
            ))
        }
    }

    fn generator_type(&self) -> &'static str {
        "FixedLayoutGenerator"
    }
}

/// Path and layout checks shared by generators and tests.
pub mod utils {
    use super::*;
    use pathfinding::prelude::bfs;

    /// Shortest walkable path between two tiles that avoids pits.
    pub fn safe_path(
        map: &Map,
        pits: &HashSet<Position>,
        from: Position,
        to: Position,
    ) -> Option<Vec<Position>> {
        bfs(
            &from,
            |pos| {
                pos.cardinal_adjacent_positions()
                    .into_iter()
                    .filter(|next| map.is_walkable(*next) && !pits.contains(next))
                    .collect::<Vec<_>>()
            },
            |pos| *pos == to,
        )
    }

    /// Checks the guarantees the engine relies on.
    pub fn validate_layout(layout: &LevelLayout) -> GravewalkResult<()> {
        if layout.map.floor_positions().is_empty() {
            return Err(GravewalkError::GenerationFailed(
                "Level has no floor tiles".to_string(),
            ));
        }
        if !layout.map.is_walkable(layout.entrance) || !layout.map.is_walkable(layout.exit) {
            return Err(GravewalkError::GenerationFailed(
                "Entrance and exit must be floor".to_string(),
            ));
        }
        if layout.occupied_positions().contains(&layout.entrance) {
            return Err(GravewalkError::GenerationFailed(
                "Something was placed on the entrance".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if !layout.enemies.iter().all(|e| seen.insert(e.position)) {
            return Err(GravewalkError::GenerationFailed(
                "Two enemies share a tile".to_string(),
            ));
        }
        let all_on_floor = layout
            .occupied_positions()
            .iter()
            .all(|pos| layout.map.is_walkable(*pos));
        if !all_on_floor {
            return Err(GravewalkError::GenerationFailed(
                "An entity was placed on a wall".to_string(),
            ));
        }

        let pits: HashSet<Position> = layout
            .hazards
            .iter()
            .filter(|h| h.kind == HazardKind::Pit)
            .map(|h| h.position)
            .collect();
        if safe_path(&layout.map, &pits, layout.entrance, layout.exit).is_none() {
            return Err(GravewalkError::GenerationFailed(
                "Exit is not reachable from the entrance".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::EnemyKind;

    fn room_map() -> Map {
        Map::from_ascii(&["#######", "#.....#", "#.###.#", "#.....#", "#######"]).unwrap()
    }

    #[test]
    fn test_config_defaults_to_three_by_three() {
        let config = GenerationConfig::new(77);
        assert_eq!(config.seed, 77);
        assert_eq!(config.screen_width, 20);
        assert_eq!(config.screen_height, 12);
        assert_eq!(config.screen_count(), 9);
        assert_eq!(config.for_level(4).level, 4);
        assert_eq!(config.for_level(4).seed, 77);
    }

    #[test]
    fn test_room_interior_excludes_walls() {
        let room = Room::new(ScreenCoord::new(0, 0), Position::new(5, 5), 6, 4);
        assert_eq!(room.center(), Position::new(8, 7));
        assert_eq!(room.floor_positions().len(), 8);
        assert!(room.contains(Position::new(10, 8)));
        assert!(!room.contains(Position::new(11, 8)));
    }

    #[test]
    fn test_safe_path_avoids_pits() {
        let map = room_map();
        let from = Position::new(1, 1);
        let to = Position::new(5, 3);
        assert!(utils::safe_path(&map, &HashSet::new(), from, to).is_some());

        let pits = HashSet::from([Position::new(1, 2), Position::new(5, 2)]);
        assert!(utils::safe_path(&map, &pits, from, to).is_none());
    }

    #[test]
    fn test_validation_rejects_blocked_entrance() {
        let mut layout = LevelLayout::empty(room_map(), Position::new(1, 1), Position::new(5, 3));
        assert!(utils::validate_layout(&layout).is_ok());

        layout.enemies.push(Enemy::new(EnemyKind::Rat, Position::new(1, 1)));
        assert!(utils::validate_layout(&layout).is_err());
    }

    #[test]
    fn test_validation_rejects_unreachable_exit() {
        let map = Map::from_ascii(&["#####", "#.#.#", "#####"]).unwrap();
        let layout = LevelLayout::empty(map, Position::new(1, 1), Position::new(3, 1));
        assert!(utils::validate_layout(&layout).is_err());
    }
}
