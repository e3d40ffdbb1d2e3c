//! Shared helpers for integration tests.

#![allow(dead_code)]

use gravewalk::generation::{FixedLayoutGenerator, GenerationConfig, LevelLayout};
use gravewalk::services::{DescriptionTracker, LocalLore, SilentAudio};
use gravewalk::{EngineConfig, GameSession, GameState, Map, PlayerClass, Position, TurnEngine};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Builds a single-screen layout from ASCII rows.
pub fn layout(rows: &[&str], entrance: Position, exit: Position) -> LevelLayout {
    let map = Map::from_ascii(rows).unwrap();
    LevelLayout::empty(map, entrance, exit)
}

/// A long east-west corridor with the entrance at the west end.
pub fn corridor() -> LevelLayout {
    layout(
        &["############", "#..........#", "############"],
        Position::new(1, 1),
        Position::new(10, 1),
    )
}

/// An engine without random rolls that serves `layout` on every level.
pub fn engine(layout: LevelLayout) -> TurnEngine {
    TurnEngine::with_generator(
        EngineConfig::deterministic(),
        GenerationConfig::for_testing(3),
        Box::new(FixedLayoutGenerator::new(layout)),
    )
}

pub fn start(layout: LevelLayout, class: PlayerClass) -> (TurnEngine, GameState) {
    let mut engine = engine(layout);
    let state = engine.new_run(class).unwrap();
    (engine, state)
}

/// A silent session over `layout`; the runtime must outlive it.
pub fn session(layout: LevelLayout, class: PlayerClass, runtime: &Runtime) -> GameSession {
    let tracker = DescriptionTracker::new(Arc::new(LocalLore::new()), runtime.handle().clone());
    GameSession::new(engine(layout), class, Box::new(SilentAudio), tracker).unwrap()
}
