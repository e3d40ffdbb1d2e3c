//! # Scene Management System
//!
//! The macroquad frame loop. A run starts on the class selection scene and
//! then hands every frame to the [`GameSession`]: poll input, advance the
//! clock, render.

use crate::{
    GameMode, GameSession, GravewalkResult, InputHandler, MacroquadDisplay, PlayerClass,
    PlayerInput,
};
use log::{debug, info};
use macroquad::prelude::*;
use std::time::Duration;

/// Shows the class selection screen until a class is picked.
pub async fn choose_class() -> PlayerClass {
    let choices = PlayerClass::all();
    loop {
        let picked = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3]
            .iter()
            .position(|key| is_key_pressed(*key))
            .map(|index| choices[index]);
        if let Some(class) = picked {
            info!("Class selected: {}", class.name());
            return class;
        }

        clear_background(BLACK);
        let x = screen_width() / 2.0 - 180.0;
        let mut y = screen_height() / 3.0;
        draw_text("GRAVEWALK", x, y, 48.0, WHITE);
        y += 50.0;
        draw_text("Choose your calling", x, y, 24.0, GRAY);
        y += 40.0;
        for (i, class) in choices.iter().enumerate() {
            let profile = class.profile();
            let line = format!(
                "{}: {}  (HP {}, attack {}, arrows {}, bombs {})",
                i + 1,
                class.name(),
                profile.max_hp,
                profile.attack,
                profile.arrows,
                profile.bombs
            );
            draw_text(&line, x, y, 20.0, YELLOW);
            y += 30.0;
        }

        next_frame().await;
    }
}

/// Drives one session frame by frame.
pub struct SceneManager {
    session: GameSession,
    display: MacroquadDisplay,
    input_handler: InputHandler,
}

impl SceneManager {
    pub fn new(session: GameSession, input_handler: InputHandler) -> Self {
        Self {
            session,
            display: MacroquadDisplay::new(),
            input_handler,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Runs the frame loop until the player quits from the game over screen.
    pub async fn run(&mut self) -> GravewalkResult<()> {
        loop {
            if self.update()? {
                break;
            }
            self.display.render(&self.session);
            next_frame().await;
        }
        info!(
            "Run ended after {} turns",
            self.session.state().statistics.steps_taken
        );
        Ok(())
    }

    /// Processes one frame. Returns true when the player asked to quit.
    fn update(&mut self) -> GravewalkResult<bool> {
        let display = &self.display;
        let state = self.session.state();
        let input = self
            .input_handler
            .poll(|pixel| display.world_tile_at(pixel, state));

        if let Some(input) = input {
            if input == PlayerInput::Close && self.session.state().mode == GameMode::GameOver {
                return Ok(true);
            }
            let outcome = self.session.handle_input(input)?;
            debug!("{:?} -> {:?}", input, outcome);
        }

        self.session
            .update(Duration::from_secs_f32(get_frame_time()))?;
        Ok(false)
    }
}
