//! # Services Module
//!
//! Collaborators the session consumes through narrow interfaces: sound
//! playback, persisted volume settings and asynchronous enemy descriptions.
//! None of them can fail a turn.

pub mod audio;
pub mod descriptions;
pub mod settings;

pub use audio::{MacroquadAudio, SilentAudio, SoundEvent, SoundService};
pub use descriptions::{
    DescriptionFuture, DescriptionStatus, DescriptionTracker, LocalLore, LoreService,
    FALLBACK_DESCRIPTION,
};
pub use settings::{Settings, SettingsStore, VOLUME_STEP};
