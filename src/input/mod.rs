//! # Input Module
//!
//! Maps keyboard and mouse events to [`PlayerInput`]s. Each input maps to at
//! most one engine intent; the session decides which one from the current
//! mode.

use crate::game::{Direction, Position};
use macroquad::prelude::*;

/// Discrete inputs the session understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerInput {
    Move(Direction),
    Fire,
    PlaceBomb,
    UsePotion,
    UseAntidote,
    Pause,
    /// Escape: close whatever window is open
    Close,
    /// Numbered choice (zero-based) in the level-up or shop window
    Choice(usize),
    /// Clicked tile, inspected if an enemy stands there
    Inspect(Position),
    Restart,
    MusicVolume { louder: bool },
    SfxVolume { louder: bool },
}

/// Keys polled every frame, in priority order.
const BOUND_KEYS: [KeyCode; 24] = [
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::W,
    KeyCode::S,
    KeyCode::A,
    KeyCode::D,
    KeyCode::Space,
    KeyCode::F,
    KeyCode::B,
    KeyCode::Q,
    KeyCode::E,
    KeyCode::P,
    KeyCode::Escape,
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Enter,
    KeyCode::Minus,
    KeyCode::Equal,
    KeyCode::LeftBracket,
    KeyCode::RightBracket,
];

/// The input bound to a key, if any.
///
/// # Examples
///
/// ```
/// use gravewalk::input::binding;
/// use gravewalk::{Direction, PlayerInput};
/// use macroquad::prelude::KeyCode;
///
/// assert_eq!(binding(KeyCode::W), Some(PlayerInput::Move(Direction::North)));
/// assert_eq!(binding(KeyCode::Key3), Some(PlayerInput::Choice(2)));
/// assert_eq!(binding(KeyCode::Z), None);
/// ```
pub fn binding(key: KeyCode) -> Option<PlayerInput> {
    let input = match key {
        KeyCode::Up | KeyCode::W => PlayerInput::Move(Direction::North),
        KeyCode::Down | KeyCode::S => PlayerInput::Move(Direction::South),
        KeyCode::Left | KeyCode::A => PlayerInput::Move(Direction::West),
        KeyCode::Right | KeyCode::D => PlayerInput::Move(Direction::East),
        KeyCode::Space | KeyCode::F => PlayerInput::Fire,
        KeyCode::B => PlayerInput::PlaceBomb,
        KeyCode::Q => PlayerInput::UsePotion,
        KeyCode::E => PlayerInput::UseAntidote,
        KeyCode::P => PlayerInput::Pause,
        KeyCode::Escape => PlayerInput::Close,
        KeyCode::Key1 => PlayerInput::Choice(0),
        KeyCode::Key2 => PlayerInput::Choice(1),
        KeyCode::Key3 => PlayerInput::Choice(2),
        KeyCode::Key4 => PlayerInput::Choice(3),
        KeyCode::Enter => PlayerInput::Restart,
        KeyCode::Minus => PlayerInput::MusicVolume { louder: false },
        KeyCode::Equal => PlayerInput::MusicVolume { louder: true },
        KeyCode::LeftBracket => PlayerInput::SfxVolume { louder: false },
        KeyCode::RightBracket => PlayerInput::SfxVolume { louder: true },
        _ => return None,
    };
    Some(input)
}

/// Reads macroquad's input state once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// The first bound key pressed this frame, else a left click on a tile.
    ///
    /// `pick_tile` converts a pixel position into the world tile under it.
    pub fn poll(&self, pick_tile: impl Fn(Vec2) -> Option<Position>) -> Option<PlayerInput> {
        if let Some(input) = BOUND_KEYS
            .iter()
            .copied()
            .filter(|key| is_key_pressed(*key))
            .find_map(binding)
        {
            return Some(input);
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            return pick_tile(vec2(x, y)).map(PlayerInput::Inspect);
        }

        None
    }
}
