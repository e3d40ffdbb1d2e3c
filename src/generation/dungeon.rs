//! # Dungeon Generation
//!
//! Screen-grid dungeon layouts.
//!
//! Every screen gets one room. Rooms are joined to their east and south
//! neighbours with L-shaped corridors, Perlin noise scatters pillars through
//! room interiors, and the whole layout is retried until the exit can be
//! reached from the entrance without crossing a pit.

use crate::game::{ColorTheme, Map, Position, ScreenCoord, TileType};
use crate::generation::encounters::populate;
use crate::generation::{utils, GenerationConfig, Generator, LevelLayout, Room};
use crate::{GravewalkError, GravewalkResult};
use log::{debug, warn};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashSet;

/// Scale applied to tile coordinates before sampling noise
const NOISE_SCALE: f64 = 0.35;

/// Primary dungeon generator: one room per screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenRoomGenerator;

/// A map with its rooms and the tiles corridors were carved through.
struct Carving {
    map: Map,
    rooms: Vec<Room>,
    corridors: HashSet<Position>,
}

impl ScreenRoomGenerator {
    pub fn new() -> Self {
        Self
    }

    fn carve(&self, config: &GenerationConfig, rng: &mut StdRng) -> GravewalkResult<Carving> {
        if config.screen_count() == 0 {
            return Err(GravewalkError::GenerationFailed(
                "The world has no screens".to_string(),
            ));
        }
        let mut map = Map::new(
            config.world_width(),
            config.world_height(),
            config.screen_width,
            config.screen_height,
        );

        let mut rooms = Vec::with_capacity(config.screen_count() as usize);
        for sy in 0..config.screens_y as i32 {
            for sx in 0..config.screens_x as i32 {
                let room = self.room_for_screen(ScreenCoord::new(sx, sy), config, rng)?;
                for pos in room.floor_positions() {
                    map.set_tile(pos, TileType::Floor)?;
                }
                rooms.push(room);
            }
        }

        let mut corridors = HashSet::new();
        let columns = config.screens_x as usize;
        for (index, room) in rooms.iter().enumerate() {
            let east = (index % columns + 1 < columns).then(|| rooms[index + 1]);
            let south = rooms.get(index + columns).copied();
            for neighbour in [east, south].into_iter().flatten() {
                carve_l_corridor(&mut map, &mut corridors, room.center(), neighbour.center(), rng)?;
            }
        }

        Ok(Carving {
            map,
            rooms,
            corridors,
        })
    }

    /// Picks a random room that fits inside one screen.
    fn room_for_screen(
        &self,
        screen: ScreenCoord,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GravewalkResult<Room> {
        let min = config.min_room_size + 2;
        if config.screen_width < min || config.screen_height < min {
            return Err(GravewalkError::GenerationFailed(format!(
                "Screens of {}x{} cannot hold a room",
                config.screen_width, config.screen_height
            )));
        }

        let width = rng.gen_range(min..=config.screen_width);
        let height = rng.gen_range(min..=config.screen_height);
        let offset_x = rng.gen_range(0..=config.screen_width - width) as i32;
        let offset_y = rng.gen_range(0..=config.screen_height - height) as i32;
        let origin = Position::new(
            screen.x * config.screen_width as i32,
            screen.y * config.screen_height as i32,
        );

        Ok(Room::new(
            screen,
            Position::new(origin.x + offset_x, origin.y + offset_y),
            width,
            height,
        ))
    }

    /// Turns noisy interior tiles into pillars. Corridors and room centres
    /// stay open.
    fn raise_pillars(
        &self,
        carving: &mut Carving,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GravewalkResult<()> {
        let perlin = Perlin::new(rng.gen());
        let centers: HashSet<Position> = carving.rooms.iter().map(|r| r.center()).collect();

        let mut pillars = Vec::new();
        for room in &carving.rooms {
            let floors: HashSet<Position> = room.floor_positions().into_iter().collect();
            for &pos in &floors {
                if carving.corridors.contains(&pos) || centers.contains(&pos) {
                    continue;
                }
                let interior = pos
                    .cardinal_adjacent_positions()
                    .iter()
                    .all(|next| floors.contains(next));
                if !interior {
                    continue;
                }
                let value = perlin.get([
                    f64::from(pos.x) * NOISE_SCALE,
                    f64::from(pos.y) * NOISE_SCALE,
                ]);
                if value > config.pillar_threshold {
                    pillars.push(pos);
                }
            }
        }

        for pos in pillars {
            carving.map.set_tile(pos, TileType::Wall)?;
        }
        Ok(())
    }

    fn try_generate(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> GravewalkResult<LevelLayout> {
        let mut carving = self.carve(config, rng)?;
        self.raise_pillars(&mut carving, config, rng)?;

        let entrance_room = carving.rooms[rng.gen_range(0..carving.rooms.len())];
        let farthest = carving
            .rooms
            .iter()
            .map(|room| screen_distance(room.screen, entrance_room.screen))
            .max()
            .unwrap_or(0);
        let candidates: Vec<Room> = carving
            .rooms
            .iter()
            .copied()
            .filter(|room| screen_distance(room.screen, entrance_room.screen) == farthest)
            .collect();
        let exit_room = candidates[rng.gen_range(0..candidates.len())];

        let entrance = entrance_room.center();
        let exit = if exit_room.center() == entrance {
            // Single-screen worlds put the exit at the far corner of the room
            let floors = entrance_room.floor_positions();
            floors
                .iter()
                .copied()
                .filter(|pos| *pos != entrance && carving.map.is_walkable(*pos))
                .max_by_key(|pos| pos.manhattan_distance(entrance))
                .ok_or_else(|| {
                    GravewalkError::GenerationFailed("Room too small for an exit".to_string())
                })?
        } else {
            exit_room.center()
        };

        let mut layout = LevelLayout::empty(carving.map, entrance, exit);
        layout.theme = ColorTheme::for_level(config.level);
        populate(&mut layout, &carving.rooms, &carving.corridors, config, rng);
        Ok(layout)
    }
}

fn screen_distance(a: ScreenCoord, b: ScreenCoord) -> u32 {
    ((a.x - b.x).abs() + (a.y - b.y).abs()) as u32
}

/// Carves an L-shaped corridor between two points, turning at a random corner.
fn carve_l_corridor(
    map: &mut Map,
    corridors: &mut HashSet<Position>,
    start: Position,
    end: Position,
    rng: &mut StdRng,
) -> GravewalkResult<()> {
    let corner = if rng.gen_bool(0.5) {
        Position::new(end.x, start.y)
    } else {
        Position::new(start.x, end.y)
    };

    for (from, to) in [(start, corner), (corner, end)] {
        let min_x = from.x.min(to.x);
        let max_x = from.x.max(to.x);
        let min_y = from.y.min(to.y);
        let max_y = from.y.max(to.y);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pos = Position::new(x, y);
                map.set_tile(pos, TileType::Floor)?;
                corridors.insert(pos);
            }
        }
    }
    Ok(())
}

impl Generator<LevelLayout> for ScreenRoomGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> GravewalkResult<LevelLayout> {
        let attempts = config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let layout = self.try_generate(config, rng)?;
            match utils::validate_layout(&layout) {
                Ok(()) => {
                    debug!(
                        "Level {} generated on attempt {} with {} enemies",
                        config.level,
                        attempt,
                        layout.enemies.len()
                    );
                    return Ok(layout);
                }
                Err(err) => debug!("Discarding layout attempt {}: {}", attempt, err),
            }
        }

        warn!(
            "No valid layout for level {} after {} attempts",
            config.level, attempts
        );
        Err(GravewalkError::GenerationFailed(format!(
            "No valid layout after {} attempts",
            attempts
        )))
    }

    fn validate(&self, layout: &LevelLayout, _config: &GenerationConfig) -> GravewalkResult<()> {
        utils::validate_layout(layout)
    }

    fn generator_type(&self) -> &'static str {
        "ScreenRoomGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generated_level_is_valid() {
        let generator = ScreenRoomGenerator::new();
        let config = GenerationConfig::for_testing(12345);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let layout = generator.generate(&config, &mut rng).unwrap();

        assert!(generator.validate(&layout, &config).is_ok());
        assert_eq!(layout.map.width, config.world_width());
        assert_eq!(layout.map.height, config.world_height());
        assert_eq!(layout.map.screens_x(), 2);
        assert_eq!(layout.wizards.len(), 1);
    }

    #[test]
    fn test_same_seed_same_map() {
        let generator = ScreenRoomGenerator::new();
        let config = GenerationConfig::for_testing(99);

        let a = generator
            .generate(&config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = generator
            .generate(&config, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(a.map, b.map);
        assert_eq!(a.entrance, b.entrance);
        assert_eq!(a.exit, b.exit);
    }

    #[test]
    fn test_l_corridor_carving() {
        let mut map = Map::new(20, 20, 20, 20);
        let mut corridors = HashSet::new();
        let mut rng = StdRng::seed_from_u64(3);
        let start = Position::new(5, 5);
        let end = Position::new(15, 15);

        carve_l_corridor(&mut map, &mut corridors, start, end, &mut rng).unwrap();

        assert!(map.is_walkable(start));
        assert!(map.is_walkable(end));
        assert_eq!(corridors.len(), 21);
    }

    #[test]
    fn test_tiny_screens_fail_cleanly() {
        let generator = ScreenRoomGenerator::new();
        let config = GenerationConfig {
            screen_width: 3,
            ..GenerationConfig::for_testing(1)
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generator.generate(&config, &mut rng).is_err());
    }

    #[test]
    fn test_theme_follows_level() {
        let generator = ScreenRoomGenerator::new();
        let config = GenerationConfig::for_testing(5).for_level(3);
        let mut rng = StdRng::seed_from_u64(5);
        let layout = generator.generate(&config, &mut rng).unwrap();
        assert_eq!(layout.theme, ColorTheme::Ember);
    }
}
