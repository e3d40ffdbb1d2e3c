//! # Turn Engine
//!
//! The orchestrator: takes a snapshot of the game state and one player intent,
//! runs the resolvers in a fixed order and returns the next state together
//! with everything that happened.
//!
//! A turn-consuming intent resolves as:
//!
//! 1. the primary action (move, melee or bump),
//! 2. arrival interactions on a committed move,
//! 3. bomb fuses, then poison,
//! 4. level transition if the player survived on the exit,
//! 5. otherwise the enemy turn, unless the player died or the shop opened.
//!
//! Rejected intents return an error and leave the caller's state untouched.

use crate::config::EngineConfig;
use crate::game::interactions::{self, Arrival};
use crate::game::movement::{self, StepResult};
use crate::game::progression::{self, LevelUpChoice, ShopItem};
use crate::game::projectile::{self, FlightStep};
use crate::game::{
    ai, bombs, status, Direction, EntityId, GameEvent, GameMode, GameState, Player, PlayerClass,
};
use crate::generation::{GenerationConfig, Generator, LevelLayout, ScreenRoomGenerator};
use crate::{GravewalkError, GravewalkResult, Rejection};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything the player can ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerIntent {
    Move(Direction),
    Fire,
    PlaceBomb,
    UsePotion,
    UseAntidote,
    TogglePause,
    CloseModal,
    ChooseLevelUp(LevelUpChoice),
    Purchase(ShopItem),
    Inspect(EntityId),
    Restart,
}

/// The result of one resolved intent.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    /// Whether fuses, poison and enemies advanced
    pub turn_consumed: bool,
}

/// Shared, per-resolution context handed to every resolver.
pub struct TurnContext<'a> {
    pub config: &'a EngineConfig,
    pub rng: &'a mut StdRng,
    pub events: Vec<GameEvent>,
    /// Enemies that already struck back in melee this turn
    pub retaliated: HashSet<EntityId>,
}

impl<'a> TurnContext<'a> {
    pub fn new(config: &'a EngineConfig, rng: &'a mut StdRng) -> Self {
        Self {
            config,
            rng,
            events: Vec::new(),
            retaliated: HashSet::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Uniform bonus in `0..=max`.
    pub fn roll(&mut self, max: u32) -> u32 {
        if max == 0 {
            0
        } else {
            self.rng.gen_range(0..=max)
        }
    }
}

enum Transition {
    Descend(u32),
    Restart,
}

struct Resolution {
    consumed: bool,
    transition: Option<Transition>,
}

impl Resolution {
    fn free() -> Self {
        Self {
            consumed: false,
            transition: None,
        }
    }

    fn consumed() -> Self {
        Self {
            consumed: true,
            transition: None,
        }
    }
}

/// Drives a run: owns the rules, the level generator and the run's RNG.
pub struct TurnEngine {
    config: EngineConfig,
    generation: GenerationConfig,
    generator: Box<dyn Generator<LevelLayout>>,
    rng: StdRng,
}

impl TurnEngine {
    /// Creates an engine with the default screen-room generator. The RNG is
    /// seeded from the generation seed.
    pub fn new(config: EngineConfig, generation: GenerationConfig) -> Self {
        Self::with_generator(config, generation, Box::new(ScreenRoomGenerator::new()))
    }

    pub fn with_generator(
        config: EngineConfig,
        generation: GenerationConfig,
        generator: Box<dyn Generator<LevelLayout>>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(generation.seed);
        Self {
            config,
            generation,
            generator,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Generates dungeon level 1 and places a fresh character of `class` on
    /// its entrance.
    pub fn new_run(&mut self, class: PlayerClass) -> GravewalkResult<GameState> {
        let layout = self.generate_level(1)?;
        let mut player = Player::new(class, layout.entrance);
        player.max_potions = self.config.potion_cap;
        player.max_antidotes = self.config.antidote_cap;
        player.xp_to_next_level = self.config.xp_threshold(1);
        info!("New {} run (seed {})", class.name(), self.generation.seed);
        Ok(GameState::from_layout(layout, player, 1))
    }

    /// Resolves one intent against `state`.
    pub fn resolve(
        &mut self,
        state: &GameState,
        intent: PlayerIntent,
    ) -> GravewalkResult<TurnOutcome> {
        let mut next = state.clone();
        let mut ctx = TurnContext::new(&self.config, &mut self.rng);
        let resolution = dispatch(&mut next, &mut ctx, intent)?;
        let mut events = ctx.events;

        match resolution.transition {
            Some(Transition::Descend(level)) => {
                let layout = self.generate_level(level)?;
                next.enter_level(layout, level);
                events.push(GameEvent::message(format!(
                    "You descend to dungeon level {}.",
                    level
                )));
            }
            Some(Transition::Restart) => {
                let layout = self.generate_level(1)?;
                let player = progression::carry_over(&next.player, &self.config);
                let statistics = next.statistics.clone();
                let turn_number = next.turn_number;
                next = GameState::from_layout(layout, player, 1);
                next.statistics = statistics;
                next.turn_number = turn_number;
                events.push(GameEvent::RunRestarted);
                info!("Run restarted at character level {}", next.player.level);
            }
            None => {}
        }

        Ok(self.finish(next, events, resolution.consumed, intent))
    }

    /// Moves the arrow in flight one tile. When it resolves, the firing turn
    /// is consumed and fuses, poison and enemies advance once.
    pub fn advance_projectile(&mut self, state: &GameState) -> GravewalkResult<TurnOutcome> {
        if state.projectile.is_none() {
            return Err(GravewalkError::InvalidState(
                "No arrow is in flight".to_string(),
            ));
        }

        let mut next = state.clone();
        let mut ctx = TurnContext::new(&self.config, &mut self.rng);
        let consumed = match projectile::advance_projectile(&mut next, &mut ctx) {
            FlightStep::InFlight => false,
            FlightStep::Resolved => {
                finish_turn(&mut next, &mut ctx, false);
                true
            }
        };
        let events = ctx.events;

        Ok(self.finish(next, events, consumed, PlayerIntent::Fire))
    }

    fn finish(
        &self,
        mut state: GameState,
        events: Vec<GameEvent>,
        turn_consumed: bool,
        intent: PlayerIntent,
    ) -> TurnOutcome {
        if turn_consumed {
            state.turn_number += 1;
        }
        for event in &events {
            state.statistics.update_from_event(event);
        }
        debug!(
            "Resolved {:?}: turn {} consumed={} events={}",
            intent,
            state.turn_number,
            turn_consumed,
            events.len()
        );
        TurnOutcome {
            state,
            events,
            turn_consumed,
        }
    }

    fn generate_level(&mut self, level: u32) -> GravewalkResult<LevelLayout> {
        let config = self.generation.for_level(level);
        let layout = self.generator.generate(&config, &mut self.rng)?;
        self.generator.validate(&layout, &config)?;
        info!(
            "Generated dungeon level {} with {}",
            level,
            self.generator.generator_type()
        );
        Ok(layout)
    }
}

fn ensure_playing(state: &GameState) -> GravewalkResult<()> {
    if state.mode.is_modal() {
        return Err(Rejection::ModalOpen.into());
    }
    if state.projectile.is_some() {
        return Err(Rejection::ArrowInFlight.into());
    }
    Ok(())
}

fn dispatch(
    state: &mut GameState,
    ctx: &mut TurnContext<'_>,
    intent: PlayerIntent,
) -> GravewalkResult<Resolution> {
    if state.is_game_over() {
        return match intent {
            PlayerIntent::Restart => Ok(Resolution {
                consumed: false,
                transition: Some(Transition::Restart),
            }),
            _ => Err(Rejection::GameOver.into()),
        };
    }

    match intent {
        PlayerIntent::Move(direction) => {
            ensure_playing(state)?;
            state.clear_transient();
            let step = movement::resolve_step(state, ctx, direction)?;

            let mut shop_opened = false;
            if let StepResult::Moved { .. } = step {
                match interactions::resolve_arrival(state, ctx) {
                    Arrival::ExitedLevel => {
                        tick_environment(state, ctx);
                        if !state.player.is_alive() {
                            return Ok(Resolution::consumed());
                        }
                        return Ok(Resolution {
                            consumed: true,
                            transition: Some(Transition::Descend(state.dungeon_level + 1)),
                        });
                    }
                    Arrival::OpenedShop => shop_opened = true,
                    Arrival::Continue => {}
                }
            }
            finish_turn(state, ctx, shop_opened);
            Ok(Resolution::consumed())
        }
        PlayerIntent::Fire => {
            ensure_playing(state)?;
            state.clear_transient();
            projectile::fire_arrow(state, ctx)?;
            Ok(Resolution::free())
        }
        PlayerIntent::PlaceBomb => {
            ensure_playing(state)?;
            bombs::place_bomb(state, ctx)?;
            Ok(Resolution::free())
        }
        PlayerIntent::UsePotion => {
            ensure_playing(state)?;
            status::use_potion(state, ctx)?;
            Ok(Resolution::free())
        }
        PlayerIntent::UseAntidote => {
            ensure_playing(state)?;
            status::use_antidote(state, ctx)?;
            Ok(Resolution::free())
        }
        PlayerIntent::TogglePause => {
            state.mode = match state.mode {
                GameMode::Playing if state.projectile.is_some() => {
                    return Err(Rejection::ArrowInFlight.into())
                }
                GameMode::Playing => GameMode::Paused,
                GameMode::Paused => GameMode::Playing,
                _ => return Err(Rejection::ModalOpen.into()),
            };
            Ok(Resolution::free())
        }
        PlayerIntent::CloseModal => {
            match state.mode {
                GameMode::Paused | GameMode::Shopping | GameMode::Inspecting { .. } => {
                    state.mode = GameMode::Playing;
                }
                GameMode::LevelUp => return Err(Rejection::ModalOpen.into()),
                GameMode::Playing | GameMode::GameOver => {}
            }
            Ok(Resolution::free())
        }
        PlayerIntent::ChooseLevelUp(choice) => {
            progression::choose_level_up(state, ctx, choice)?;
            Ok(Resolution::free())
        }
        PlayerIntent::Purchase(item) => {
            progression::purchase(state, ctx, item)?;
            Ok(Resolution::free())
        }
        PlayerIntent::Inspect(enemy) => {
            if !matches!(state.mode, GameMode::Playing | GameMode::Inspecting { .. }) {
                return Err(Rejection::ModalOpen.into());
            }
            let visible = state.enemies_on_screen(state.camera).contains(&enemy);
            if !visible {
                return Err(Rejection::NoSuchEnemy.into());
            }
            state.mode = GameMode::Inspecting { enemy };
            Ok(Resolution::free())
        }
        PlayerIntent::Restart => Err(Rejection::NotDead.into()),
    }
}

fn tick_environment(state: &mut GameState, ctx: &mut TurnContext<'_>) {
    bombs::tick_fuses(state, ctx);
    status::tick_poison(state, ctx);
}

/// The time-based half of a turn: fuses, poison, then enemies.
fn finish_turn(state: &mut GameState, ctx: &mut TurnContext<'_>, shop_opened: bool) {
    tick_environment(state, ctx);
    if !state.player.is_alive() || shop_opened {
        return;
    }
    ai::run_enemy_turn(state, ctx);
}
