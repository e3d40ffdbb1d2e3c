//! # Rendering Module
//!
//! Macroquad drawing of the visible screen, the side panel and modal windows.
//! Rendering only reads the session; it never mutates game state.

pub mod display;

pub use display::{wrap_text, MacroquadDisplay, MapViewport};
