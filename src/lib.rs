//! # Gravewalk
//!
//! The turn-based simulation core of a grid-based roguelite.
//!
//! ## Architecture Overview
//!
//! Everything revolves around one authoritative aggregate, [`GameState`], and a
//! deterministic state-transition function, [`TurnEngine::resolve`]:
//!
//! - **World Model**: map, player, enemies, decorations, bombs ([`game`])
//! - **Effect Resolvers**: movement/melee, arrows, bombs, poison, arrival
//!   interactions, each a small function over the aggregate
//! - **Turn Orchestrator**: sequences the resolvers for one player intent and
//!   drives the enemy turn ([`game::turn`])
//! - **Enemy AI**: greedy axis-aligned chase against a pre-turn snapshot
//! - **Progression**: XP, level-up choices, shop, death and restart
//!
//! Dungeon generation, audio, persisted settings and enemy descriptions are
//! collaborators consumed through narrow traits ([`generation`], [`services`]).
//! The [`session`] module is a headless controller (input lock, scheduler,
//! modal handling) that the macroquad front end in [`scenes`] drives.

pub mod config;
pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod scenes;
pub mod services;
pub mod session;

pub use config::EngineConfig;
pub use game::{
    Altar, Augment, Bomb, ColorTheme, DamageKind, DamageNumber, DamageSource, Direction, Doodad,
    DoodadKind, Enemy, EnemyKind, EntityId, GameEvent, GameMode, GameState, GameStatistics,
    Hazard, HazardKind, Item, ItemKind, LevelUpChoice, Map, MessageImportance, Player,
    PlayerClass, PlayerIntent, Position, Projectile, ScreenCoord, ShopItem, TileType, TurnEngine,
    TurnOutcome, Wizard,
};
pub use generation::{
    FixedLayoutGenerator, GenerationConfig, Generator, LevelLayout, ScreenRoomGenerator,
};
pub use input::{InputHandler, PlayerInput};
pub use rendering::MacroquadDisplay;
pub use session::GameSession;

/// Reasons a player action is refused.
///
/// A refused action never mutates the game state. Apart from [`Rejection::Bump`],
/// which is only heard, each of these is shown to the player as a message.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("You bump into the wall")]
    Bump,
    #[error("There is nothing beyond the edge of the world")]
    OutOfWorld,
    #[error("Wait for the current action to finish")]
    InputLocked,
    #[error("Close the open window first")]
    ModalOpen,
    #[error("You are dead")]
    GameOver,
    #[error("You have no arrows")]
    NoArrows,
    #[error("Move first to choose a direction to shoot")]
    NoAim,
    #[error("An arrow is already in flight")]
    ArrowInFlight,
    #[error("You have no bombs")]
    NoBombs,
    #[error("A bomb is already armed here")]
    BombAlreadyHere,
    #[error("You have no potions")]
    NoPotions,
    #[error("You are already at full health")]
    FullHealth,
    #[error("You have no antidotes")]
    NoAntidotes,
    #[error("You are not poisoned")]
    NotPoisoned,
    #[error("You cannot afford that")]
    NotEnoughGold,
    #[error("You cannot carry any more of that")]
    AtCapacity,
    #[error("There is no shop here")]
    NotShopping,
    #[error("There is no level-up to choose")]
    NoLevelUpPending,
    #[error("There is nothing there to inspect")]
    NoSuchEnemy,
    #[error("The run is still going")]
    NotDead,
}

/// Core error type for the Gravewalk engine.
#[derive(thiserror::Error, Debug)]
pub enum GravewalkError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// The player's action was refused
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The enemy description service failed
    #[error("Description unavailable: {0}")]
    Description(String),
}

/// Result type used throughout the Gravewalk codebase.
pub type GravewalkResult<T> = Result<T, GravewalkError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
