//! # World Representation
//!
//! The tile grid of one dungeon level and its division into screens.

use crate::game::Position;
use crate::{GravewalkError, GravewalkResult};
use serde::{Deserialize, Serialize};

/// Kinds of map tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Floor,
    Wall,
}

impl TileType {
    /// Character used for ASCII maps.
    pub fn to_char(self) -> char {
        match self {
            TileType::Floor => '.',
            TileType::Wall => '#',
        }
    }
}

/// Coordinate of a screen within the world, in whole screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenCoord {
    pub x: i32,
    pub y: i32,
}

impl ScreenCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A fixed-size rectangular grid of tiles, immutable once generated.
///
/// The world is split into equally sized screens; the camera always shows
/// exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
    /// Width of one screen in tiles
    pub screen_width: u32,
    /// Height of one screen in tiles
    pub screen_height: u32,
    /// Tiles indexed as `tiles[y][x]`
    pub tiles: Vec<Vec<TileType>>,
}

impl Map {
    /// Creates a map filled with walls.
    pub fn new(width: u32, height: u32, screen_width: u32, screen_height: u32) -> Self {
        Self {
            width,
            height,
            screen_width: screen_width.max(1),
            screen_height: screen_height.max(1),
            tiles: vec![vec![TileType::Wall; width as usize]; height as usize],
        }
    }

    /// Builds a single-screen map from rows of text: `#` is a wall, anything
    /// else is floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravewalk::{Map, Position, TileType};
    ///
    /// let map = Map::from_ascii(&["###", "#.#", "###"]).unwrap();
    /// assert_eq!(map.get_tile(Position::new(1, 1)), Some(TileType::Floor));
    /// assert!(!map.is_walkable(Position::new(0, 0)));
    /// ```
    pub fn from_ascii(rows: &[&str]) -> GravewalkResult<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(GravewalkError::InvalidState("Empty map".to_string()));
        }

        let mut tiles = Vec::with_capacity(rows.len());
        for row in rows {
            if row.chars().count() as u32 != width {
                return Err(GravewalkError::InvalidState(
                    "Map rows have different lengths".to_string(),
                ));
            }
            tiles.push(
                row.chars()
                    .map(|c| if c == '#' { TileType::Wall } else { TileType::Floor })
                    .collect(),
            );
        }

        Ok(Self {
            width,
            height,
            screen_width: width,
            screen_height: height,
            tiles,
        })
    }

    /// Splits the map into screens of the given size.
    pub fn with_screen_size(mut self, screen_width: u32, screen_height: u32) -> Self {
        self.screen_width = screen_width.max(1);
        self.screen_height = screen_height.max(1);
        self
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Gets the tile at a position; `None` outside the map.
    pub fn get_tile(&self, pos: Position) -> Option<TileType> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Sets the tile at a position. Only used while generating.
    pub fn set_tile(&mut self, pos: Position, tile: TileType) -> GravewalkResult<()> {
        if !self.in_bounds(pos) {
            return Err(GravewalkError::InvalidState(format!(
                "Position {:?} is outside the map",
                pos
            )));
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Only floor tiles can be entered; anything off the map is impassable.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get_tile(pos) == Some(TileType::Floor)
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.get_tile(pos) == Some(TileType::Wall)
    }

    /// Number of screens horizontally.
    pub fn screens_x(&self) -> i32 {
        self.width.div_ceil(self.screen_width) as i32
    }

    /// Number of screens vertically.
    pub fn screens_y(&self) -> i32 {
        self.height.div_ceil(self.screen_height) as i32
    }

    /// The screen containing a position.
    pub fn screen_of(&self, pos: Position) -> ScreenCoord {
        ScreenCoord::new(
            pos.x.div_euclid(self.screen_width as i32),
            pos.y.div_euclid(self.screen_height as i32),
        )
    }

    pub fn screen_in_world(&self, screen: ScreenCoord) -> bool {
        screen.x >= 0 && screen.y >= 0 && screen.x < self.screens_x() && screen.y < self.screens_y()
    }

    /// Top-left tile of a screen.
    pub fn screen_origin(&self, screen: ScreenCoord) -> Position {
        Position::new(
            screen.x * self.screen_width as i32,
            screen.y * self.screen_height as i32,
        )
    }

    pub fn screen_contains(&self, screen: ScreenCoord, pos: Position) -> bool {
        self.in_bounds(pos) && self.screen_of(pos) == screen
    }

    /// All floor positions, row by row.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut floors = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if *tile == TileType::Floor {
                    floors.push(Position::new(x as i32, y as i32));
                }
            }
        }
        floors
    }
}

/// Colour palette of a dungeon level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTheme {
    Crypt,
    Moss,
    Ember,
    Frost,
}

/// RGB colours used by the renderer for a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub floor: [u8; 3],
    pub wall: [u8; 3],
    pub accent: [u8; 3],
}

impl ColorTheme {
    /// Themes cycle as the player descends.
    pub fn for_level(level: u32) -> Self {
        match level.saturating_sub(1) % 4 {
            0 => ColorTheme::Crypt,
            1 => ColorTheme::Moss,
            2 => ColorTheme::Ember,
            _ => ColorTheme::Frost,
        }
    }

    pub fn palette(self) -> ThemePalette {
        match self {
            ColorTheme::Crypt => ThemePalette {
                floor: [38, 36, 44],
                wall: [92, 88, 104],
                accent: [200, 190, 230],
            },
            ColorTheme::Moss => ThemePalette {
                floor: [30, 42, 32],
                wall: [70, 104, 66],
                accent: [170, 230, 150],
            },
            ColorTheme::Ember => ThemePalette {
                floor: [46, 30, 26],
                wall: [120, 62, 44],
                accent: [255, 170, 90],
            },
            ColorTheme::Frost => ThemePalette {
                floor: [28, 36, 48],
                wall: [84, 112, 140],
                accent: [180, 220, 255],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two_screens() -> Map {
        Map::new(8, 6, 4, 3)
    }

    #[test]
    fn test_new_map_is_all_walls() {
        let map = two_by_two_screens();
        assert!(map.floor_positions().is_empty());
        assert!(map.is_wall(Position::new(0, 0)));
    }

    #[test]
    fn test_out_of_bounds_is_impassable() {
        let map = Map::from_ascii(&["..", ".."]).unwrap();
        assert!(map.is_walkable(Position::new(1, 1)));
        assert!(!map.is_walkable(Position::new(2, 1)));
        assert!(!map.is_walkable(Position::new(-1, 0)));
        assert_eq!(map.get_tile(Position::new(0, 5)), None);
    }

    #[test]
    fn test_ragged_ascii_rejected() {
        assert!(Map::from_ascii(&["...", ".."]).is_err());
        assert!(Map::from_ascii(&[]).is_err());
    }

    #[test]
    fn test_screen_geometry() {
        let map = two_by_two_screens();
        assert_eq!(map.screens_x(), 2);
        assert_eq!(map.screens_y(), 2);
        assert_eq!(map.screen_of(Position::new(3, 2)), ScreenCoord::new(0, 0));
        assert_eq!(map.screen_of(Position::new(4, 2)), ScreenCoord::new(1, 0));
        assert_eq!(map.screen_of(Position::new(4, 3)), ScreenCoord::new(1, 1));
        assert_eq!(map.screen_origin(ScreenCoord::new(1, 1)), Position::new(4, 3));
        assert!(map.screen_in_world(ScreenCoord::new(1, 1)));
        assert!(!map.screen_in_world(ScreenCoord::new(2, 0)));
    }

    #[test]
    fn test_set_tile() {
        let mut map = two_by_two_screens();
        map.set_tile(Position::new(1, 1), TileType::Floor).unwrap();
        assert!(map.is_walkable(Position::new(1, 1)));
        assert!(map.set_tile(Position::new(99, 1), TileType::Floor).is_err());
    }

    #[test]
    fn test_theme_cycle() {
        assert_eq!(ColorTheme::for_level(1), ColorTheme::Crypt);
        assert_eq!(ColorTheme::for_level(4), ColorTheme::Frost);
        assert_eq!(ColorTheme::for_level(5), ColorTheme::Crypt);
    }
}
