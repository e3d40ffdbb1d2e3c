//! # Display Management
//!
//! Draws the current screen of the dungeon, the side panel, the message area
//! and the modal windows with macroquad.
//!
//! Only one screen of the world is visible at a time: the one the camera
//! points at. Tiles are plain rectangles tinted by the level's colour theme and
//! everything standing on them is a text glyph.

use crate::game::{
    DamageKind, DoodadKind, EnemyKind, GameMode, GameState, HazardKind, ItemKind,
    MessageImportance, Position, TileType,
};
use crate::game::progression::{LevelUpChoice, ShopItem};
use crate::services::DescriptionStatus;
use crate::session::GameSession;
use macroquad::prelude::*;

/// Width of the side panel in pixels
const PANEL_WIDTH: f32 = 260.0;
/// Height of the message area in pixels
const MESSAGE_AREA_HEIGHT: f32 = 90.0;
const MESSAGE_LINES: usize = 4;

/// Where the map is drawn and how large a tile is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub tile_size: f32,
}

impl MapViewport {
    /// Fits `columns` x `rows` tiles into the given pixel area.
    pub fn fit(width: f32, height: f32, columns: u32, rows: u32) -> Self {
        let tile_size = (width / columns.max(1) as f32)
            .min(height / rows.max(1) as f32)
            .floor()
            .max(1.0);
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            tile_size,
        }
    }

    /// Screen-local tile under a pixel, if inside `columns` x `rows`.
    pub fn tile_at(&self, pixel: Vec2, columns: u32, rows: u32) -> Option<(i32, i32)> {
        let x = ((pixel.x - self.origin_x) / self.tile_size).floor();
        let y = ((pixel.y - self.origin_y) / self.tile_size).floor();
        if x < 0.0 || y < 0.0 || x >= columns as f32 || y >= rows as f32 {
            return None;
        }
        Some((x as i32, y as i32))
    }
}

/// Macroquad display manager for the game.
pub struct MacroquadDisplay {
    viewport: MapViewport,
}

impl Default for MacroquadDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroquadDisplay {
    pub fn new() -> Self {
        Self {
            viewport: MapViewport::fit(1.0, 1.0, 1, 1),
        }
    }

    /// The world tile under a pixel on the visible screen.
    pub fn world_tile_at(&self, pixel: Vec2, state: &GameState) -> Option<Position> {
        let (x, y) = self
            .viewport
            .tile_at(pixel, state.map.screen_width, state.map.screen_height)?;
        let origin = state.map.screen_origin(state.camera);
        Some(Position::new(origin.x + x, origin.y + y))
    }

    /// Renders one complete frame.
    pub fn render(&mut self, session: &GameSession) {
        let state = session.state();
        self.viewport = MapViewport::fit(
            screen_width() - PANEL_WIDTH,
            screen_height() - MESSAGE_AREA_HEIGHT,
            state.map.screen_width,
            state.map.screen_height,
        );

        clear_background(BLACK);
        self.render_map(state);
        self.render_panel(session);
        self.render_messages(session);
        self.render_modal(session);
    }

    fn tile_origin(&self, state: &GameState, pos: Position) -> Option<(f32, f32)> {
        if !state.map.screen_contains(state.camera, pos) {
            return None;
        }
        let origin = state.map.screen_origin(state.camera);
        Some((
            self.viewport.origin_x + (pos.x - origin.x) as f32 * self.viewport.tile_size,
            self.viewport.origin_y + (pos.y - origin.y) as f32 * self.viewport.tile_size,
        ))
    }

    fn draw_glyph(&self, state: &GameState, pos: Position, glyph: &str, color: Color) {
        let Some((x, y)) = self.tile_origin(state, pos) else {
            return;
        };
        let size = self.viewport.tile_size;
        let font_size = (size * 0.9) as u16;
        let dims = measure_text(glyph, None, font_size, 1.0);
        draw_text(
            glyph,
            x + (size - dims.width) / 2.0,
            y + (size + dims.offset_y) / 2.0,
            f32::from(font_size),
            color,
        );
    }

    fn render_map(&self, state: &GameState) {
        let palette = state.theme.palette();
        let floor = rgb(palette.floor);
        let wall = rgb(palette.wall);
        let accent = rgb(palette.accent);
        let size = self.viewport.tile_size;
        let origin = state.map.screen_origin(state.camera);

        for row in 0..state.map.screen_height as i32 {
            for column in 0..state.map.screen_width as i32 {
                let pos = Position::new(origin.x + column, origin.y + row);
                let Some((x, y)) = self.tile_origin(state, pos) else {
                    continue;
                };
                let color = match state.map.get_tile(pos) {
                    Some(TileType::Floor) => floor,
                    Some(TileType::Wall) => wall,
                    None => BLACK,
                };
                draw_rectangle(x, y, size - 1.0, size - 1.0, color);
            }
        }

        for blast in &state.active_blasts {
            for &pos in &blast.tiles {
                if let Some((x, y)) = self.tile_origin(state, pos) {
                    draw_rectangle(x, y, size, size, Color::new(1.0, 0.55, 0.1, 0.6));
                }
            }
        }

        for doodad in &state.doodads {
            self.draw_glyph(state, doodad.position, doodad_glyph(doodad.kind), dim(accent));
        }
        self.draw_glyph(state, state.exit, ">", accent);
        for hazard in &state.hazards {
            let (glyph, color) = hazard_glyph(hazard.kind);
            self.draw_glyph(state, hazard.position, glyph, color);
        }
        for item in &state.items {
            if state.picked_up.contains(&item.position) {
                continue;
            }
            let (glyph, color) = item_glyph(item.kind);
            self.draw_glyph(state, item.position, glyph, color);
        }
        for altar in &state.altars {
            let color = if state.spent_altars.contains(&altar.position) {
                GRAY
            } else {
                VIOLET
            };
            self.draw_glyph(state, altar.position, "_", color);
        }
        for wizard in &state.wizards {
            self.draw_glyph(state, wizard.position, "W", SKYBLUE);
        }
        for bomb in &state.bombs {
            self.draw_glyph(state, bomb.position, &bomb.fuse.to_string(), ORANGE);
        }

        for enemy in state.enemies.iter().filter(|e| e.is_alive()) {
            let color = if enemy.just_hit {
                WHITE
            } else {
                enemy_color(enemy.kind)
            };
            self.draw_glyph(state, enemy.position, enemy_glyph(enemy.kind), color);
        }

        let player_color = if state.player_hit_flash {
            RED
        } else if state.player.is_poisoned {
            GREEN
        } else {
            YELLOW
        };
        self.draw_glyph(state, state.player.position, "@", player_color);

        if let Some(arrow) = &state.projectile {
            let glyph = match arrow.direction {
                crate::game::Direction::North | crate::game::Direction::South => "|",
                _ => "-",
            };
            self.draw_glyph(state, arrow.position, glyph, WHITE);
        }

        for number in &state.damage_numbers {
            if let Some((x, y)) = self.tile_origin(state, number.position) {
                let (text, color) = match number.kind {
                    DamageKind::Harm => (format!("-{}", number.amount), RED),
                    DamageKind::Poison => (format!("-{}", number.amount), GREEN),
                    DamageKind::Heal => (format!("+{}", number.amount), LIME),
                };
                draw_text(&text, x, y, size * 0.6, color);
            }
        }
    }

    fn render_panel(&self, session: &GameSession) {
        let state = session.state();
        let player = &state.player;
        let panel_x = screen_width() - PANEL_WIDTH + 12.0;
        let mut line_y = 24.0;
        let line_height = 20.0;

        draw_text("GRAVEWALK", panel_x, line_y, 26.0, WHITE);
        line_y += line_height * 1.5;

        let hp_color = if player.hp * 4 <= player.max_hp {
            RED
        } else {
            WHITE
        };
        let lines: Vec<(String, Color)> = vec![
            (format!("{} lv {}", player.class.name(), player.level), YELLOW),
            (format!("HP {}/{}", player.hp, player.max_hp), hp_color),
            (
                format!("XP {}/{}", player.xp, player.xp_to_next_level),
                WHITE,
            ),
            (format!("Attack {}", player.attack), WHITE),
            (
                format!("Arrows {}/{}", player.arrows, player.max_arrows),
                WHITE,
            ),
            (format!("Bombs {}/{}", player.bombs, player.max_bombs), WHITE),
            (
                format!("Potions {}/{}", player.potions, player.max_potions),
                WHITE,
            ),
            (
                format!("Antidotes {}/{}", player.antidotes, player.max_antidotes),
                WHITE,
            ),
            (format!("Gold {}", player.gold), GOLD),
            (format!("Corruption {}", player.corruption), VIOLET),
        ];
        for (text, color) in lines {
            draw_text(&text, panel_x, line_y, 18.0, color);
            line_y += line_height;
        }

        if player.is_poisoned {
            draw_text("POISONED", panel_x, line_y, 18.0, GREEN);
            line_y += line_height;
        }
        for augment in &player.augments {
            draw_text(augment.name(), panel_x, line_y, 16.0, PINK);
            line_y += line_height;
        }

        line_y += line_height / 2.0;
        draw_text(
            &format!("Depth {}  Turn {}", state.dungeon_level, state.turn_number),
            panel_x,
            line_y,
            18.0,
            SKYBLUE,
        );
        line_y += line_height;
        draw_text(
            &format!("Slain {}", state.statistics.enemies_defeated),
            panel_x,
            line_y,
            16.0,
            LIGHTGRAY,
        );
        line_y += line_height * 1.5;

        let settings = session.settings();
        draw_text(
            &format!(
                "Music {:.0}%  Fx {:.0}%",
                settings.music_volume * 100.0,
                settings.sfx_volume * 100.0
            ),
            panel_x,
            line_y,
            16.0,
            GRAY,
        );
        line_y += line_height * 1.5;

        let controls = [
            "WASD/Arrows: move",
            "Space/F: fire  B: bomb",
            "Q: potion  E: antidote",
            "P: pause  Esc: close",
            "Click: inspect",
            "-/=: music  [/]: effects",
        ];
        for control in controls {
            draw_text(control, panel_x, line_y, 15.0, GRAY);
            line_y += line_height * 0.85;
        }
    }

    fn render_messages(&self, session: &GameSession) {
        let top = screen_height() - MESSAGE_AREA_HEIGHT;
        draw_rectangle(
            0.0,
            top,
            screen_width(),
            MESSAGE_AREA_HEIGHT,
            Color::new(0.0, 0.0, 0.0, 0.85),
        );

        for (i, entry) in session.recent_messages(MESSAGE_LINES).enumerate() {
            let color = match entry.importance {
                MessageImportance::Info => WHITE,
                MessageImportance::Warning => ORANGE,
                MessageImportance::Critical => RED,
            };
            draw_text(&entry.text, 10.0, top + 20.0 + i as f32 * 18.0, 17.0, color);
        }
    }

    fn render_modal(&self, session: &GameSession) {
        let state = session.state();
        let lines: Vec<String> = match state.mode {
            GameMode::Playing => return,
            GameMode::Paused => vec!["PAUSED".to_string(), "P or Esc to resume".to_string()],
            GameMode::LevelUp => {
                let mut lines = vec![format!("LEVEL {} REACHED", state.player.level + 1)];
                lines.extend(
                    LevelUpChoice::all()
                        .iter()
                        .enumerate()
                        .map(|(i, choice)| format!("{}: {}", i + 1, choice.describe())),
                );
                lines
            }
            GameMode::Shopping => {
                let mut lines = vec![
                    "THE WIZARD'S WARES".to_string(),
                    format!("You have {} gold", state.player.gold),
                ];
                lines.extend(ShopItem::all().iter().enumerate().map(|(i, item)| {
                    format!("{}: {} ({} gold)", i + 1, item.name(), item.price())
                }));
                lines.push("Esc to leave".to_string());
                lines
            }
            GameMode::Inspecting { enemy } => {
                let Some(target) = state.enemy(enemy) else {
                    return;
                };
                let stats = target.kind.stats();
                let mut lines = vec![
                    target.kind.name().to_uppercase(),
                    format!(
                        "HP {}/{}  Attack {}  XP {}",
                        target.hp, stats.hp, stats.attack, stats.xp
                    ),
                ];
                match session.description(enemy) {
                    DescriptionStatus::Ready(text) => lines.extend(wrap_text(text, 44)),
                    DescriptionStatus::Loading => lines.push("...".to_string()),
                    DescriptionStatus::Idle => {}
                }
                lines.push("Esc to close".to_string());
                lines
            }
            GameMode::GameOver => vec![
                "YOU HAVE FALLEN".to_string(),
                format!(
                    "Depth {}  Slain {}  Deaths {}",
                    state.statistics.max_depth_reached,
                    state.statistics.enemies_defeated,
                    state.statistics.deaths
                ),
                "Press Enter to rise again".to_string(),
            ],
        };

        let width = 460.0;
        let height = 40.0 + lines.len() as f32 * 24.0;
        let x = (screen_width() - PANEL_WIDTH - width) / 2.0;
        let y = (screen_height() - MESSAGE_AREA_HEIGHT - height) / 2.0;
        draw_rectangle(x, y, width, height, Color::new(0.05, 0.05, 0.08, 0.92));
        draw_rectangle_lines(x, y, width, height, 2.0, rgb(state.theme.palette().accent));
        for (i, line) in lines.iter().enumerate() {
            let (size, color) = if i == 0 { (24.0, YELLOW) } else { (18.0, WHITE) };
            draw_text(line, x + 20.0, y + 32.0 + i as f32 * 24.0, size, color);
        }
    }
}

fn rgb(color: [u8; 3]) -> Color {
    Color::from_rgba(color[0], color[1], color[2], 255)
}

fn dim(color: Color) -> Color {
    Color::new(color.r * 0.5, color.g * 0.5, color.b * 0.5, color.a)
}

fn enemy_glyph(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Rat => "r",
        EnemyKind::Bat => "v",
        EnemyKind::Spider => "s",
        EnemyKind::Skeleton => "K",
        EnemyKind::Slime => "O",
        EnemyKind::Slimeling => "o",
        EnemyKind::Orc => "G",
    }
}

fn enemy_color(kind: EnemyKind) -> Color {
    match kind {
        EnemyKind::Rat => BROWN,
        EnemyKind::Bat => LIGHTGRAY,
        EnemyKind::Spider => DARKPURPLE,
        EnemyKind::Skeleton => BEIGE,
        EnemyKind::Slime | EnemyKind::Slimeling => LIME,
        EnemyKind::Orc => DARKGREEN,
    }
}

fn item_glyph(kind: ItemKind) -> (&'static str, Color) {
    match kind {
        ItemKind::HealthPotion => ("!", RED),
        ItemKind::Gold => ("$", GOLD),
        ItemKind::Arrows => ("/", BEIGE),
        ItemKind::Bombs => ("*", ORANGE),
        ItemKind::Antidote => ("+", GREEN),
    }
}

fn hazard_glyph(kind: HazardKind) -> (&'static str, Color) {
    match kind {
        HazardKind::Pit => ("O", DARKGRAY),
        HazardKind::Spikes => ("^", LIGHTGRAY),
        HazardKind::Fire => ("~", ORANGE),
    }
}

fn doodad_glyph(kind: DoodadKind) -> &'static str {
    match kind {
        DoodadKind::Bones => ",",
        DoodadKind::Torch => "i",
        DoodadKind::Moss => "\"",
        DoodadKind::Rubble => ":",
    }
}

/// Greedy word wrap to at most `width` characters per line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
