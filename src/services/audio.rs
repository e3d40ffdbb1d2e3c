//! # Sound Service
//!
//! Fire-and-forget sound effects and background music behind the
//! [`SoundService`] trait. The game never learns whether a sound played.

use crate::game::GameEvent;
use crate::services::Settings;
use log::{debug, warn};
use macroquad::audio::{
    load_sound_from_bytes, play_sound, set_sound_volume, PlaySoundParams, Sound,
};
use std::collections::HashMap;

/// Named sound cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    Step,
    Bump,
    Hit,
    EnemyDefeated,
    PlayerHurt,
    PlayerDied,
    ArrowShot,
    BombPlaced,
    BombExploded,
    Pickup,
    Heal,
    Poisoned,
    Altar,
    ShopBell,
    Purchase,
    Descend,
    LevelUp,
}

impl SoundEvent {
    pub fn all() -> [SoundEvent; 17] {
        [
            SoundEvent::Step,
            SoundEvent::Bump,
            SoundEvent::Hit,
            SoundEvent::EnemyDefeated,
            SoundEvent::PlayerHurt,
            SoundEvent::PlayerDied,
            SoundEvent::ArrowShot,
            SoundEvent::BombPlaced,
            SoundEvent::BombExploded,
            SoundEvent::Pickup,
            SoundEvent::Heal,
            SoundEvent::Poisoned,
            SoundEvent::Altar,
            SoundEvent::ShopBell,
            SoundEvent::Purchase,
            SoundEvent::Descend,
            SoundEvent::LevelUp,
        ]
    }

    /// The cue for a game event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<SoundEvent> {
        let sound = match event {
            GameEvent::PlayerMoved { .. } => SoundEvent::Step,
            GameEvent::EnemyDamaged { .. } => SoundEvent::Hit,
            GameEvent::EnemyDefeated { .. } => SoundEvent::EnemyDefeated,
            GameEvent::PlayerDamaged { .. } => SoundEvent::PlayerHurt,
            GameEvent::PlayerDied => SoundEvent::PlayerDied,
            GameEvent::ArrowFired { .. } => SoundEvent::ArrowShot,
            GameEvent::BombPlaced { .. } => SoundEvent::BombPlaced,
            GameEvent::BombDetonated { .. } => SoundEvent::BombExploded,
            GameEvent::ItemPickedUp { .. } => SoundEvent::Pickup,
            GameEvent::PlayerHealed { .. } | GameEvent::PoisonCured => SoundEvent::Heal,
            GameEvent::PlayerPoisoned => SoundEvent::Poisoned,
            GameEvent::AltarInvoked { .. } => SoundEvent::Altar,
            GameEvent::ShopOpened => SoundEvent::ShopBell,
            GameEvent::Purchased { .. } => SoundEvent::Purchase,
            GameEvent::LevelExited { .. } => SoundEvent::Descend,
            GameEvent::LevelUpReady | GameEvent::LeveledUp { .. } => SoundEvent::LevelUp,
            _ => return None,
        };
        Some(sound)
    }

    /// Tone used by the synthesized cue: (frequency in Hz, length in ms).
    fn tone(self) -> (f32, u32) {
        match self {
            SoundEvent::Step => (220.0, 30),
            SoundEvent::Bump => (90.0, 60),
            SoundEvent::Hit => (330.0, 70),
            SoundEvent::EnemyDefeated => (523.0, 140),
            SoundEvent::PlayerHurt => (150.0, 110),
            SoundEvent::PlayerDied => (70.0, 600),
            SoundEvent::ArrowShot => (880.0, 50),
            SoundEvent::BombPlaced => (260.0, 60),
            SoundEvent::BombExploded => (55.0, 350),
            SoundEvent::Pickup => (660.0, 80),
            SoundEvent::Heal => (587.0, 160),
            SoundEvent::Poisoned => (180.0, 200),
            SoundEvent::Altar => (392.0, 400),
            SoundEvent::ShopBell => (988.0, 180),
            SoundEvent::Purchase => (784.0, 90),
            SoundEvent::Descend => (196.0, 300),
            SoundEvent::LevelUp => (1046.0, 250),
        }
    }
}

/// Sound playback consumed by the session.
///
/// Implementations swallow their own failures.
pub trait SoundService {
    fn play(&mut self, sound: SoundEvent);

    fn set_music_volume(&mut self, volume: f32);

    fn set_sfx_volume(&mut self, volume: f32);
}

/// Plays nothing. Used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct SilentAudio;

impl SoundService for SilentAudio {
    fn play(&mut self, _sound: SoundEvent) {}

    fn set_music_volume(&mut self, _volume: f32) {}

    fn set_sfx_volume(&mut self, _volume: f32) {}
}

const SAMPLE_RATE: u32 = 22_050;

/// Audio through macroquad with synthesized square-wave cues and a looping
/// drone for music.
pub struct MacroquadAudio {
    cues: HashMap<SoundEvent, Sound>,
    music: Option<Sound>,
    sfx_volume: f32,
}

impl MacroquadAudio {
    /// Builds every cue and starts the music. Cues that fail to load stay
    /// silent.
    pub async fn load(settings: &Settings) -> Self {
        let mut cues = HashMap::new();
        for sound in SoundEvent::all() {
            let (frequency, millis) = sound.tone();
            match load_sound_from_bytes(&square_wave_wav(frequency, millis, 0.25)).await {
                Ok(loaded) => {
                    cues.insert(sound, loaded);
                }
                Err(err) => warn!("Could not load sound {:?}: {:?}", sound, err),
            }
        }

        let music = match load_sound_from_bytes(&square_wave_wav(55.0, 2_000, 0.08)).await {
            Ok(music) => {
                play_sound(
                    &music,
                    PlaySoundParams {
                        looped: true,
                        volume: settings.music_volume,
                    },
                );
                Some(music)
            }
            Err(err) => {
                warn!("Could not load music: {:?}", err);
                None
            }
        };
        debug!("Loaded {} sound cues", cues.len());

        Self {
            cues,
            music,
            sfx_volume: settings.sfx_volume,
        }
    }
}

impl SoundService for MacroquadAudio {
    fn play(&mut self, sound: SoundEvent) {
        if self.sfx_volume <= 0.0 {
            return;
        }
        if let Some(cue) = self.cues.get(&sound) {
            play_sound(
                cue,
                PlaySoundParams {
                    looped: false,
                    volume: self.sfx_volume,
                },
            );
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        if let Some(music) = &self.music {
            set_sound_volume(music, volume);
        }
    }

    fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume;
        // Preview the new level
        self.play(SoundEvent::Pickup);
    }
}

/// Encodes a mono 16-bit PCM WAV file holding a square wave.
pub fn square_wave_wav(frequency: f32, millis: u32, amplitude: f32) -> Vec<u8> {
    let samples = SAMPLE_RATE * millis / 1000;
    let data_len = samples * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    let period = (SAMPLE_RATE as f32 / frequency.max(1.0)).max(2.0);
    let peak = (f32::from(i16::MAX) * amplitude.clamp(0.0, 1.0)) as i16;
    for i in 0..samples {
        let phase = (i as f32 % period) / period;
        // Linear fade-out avoids a click at the end
        let fade = 1.0 - i as f32 / samples.max(1) as f32;
        let level = (f32::from(peak) * fade) as i16;
        let sample = if phase < 0.5 { level } else { -level };
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EnemyKind, Position};

    #[test]
    fn test_wav_header() {
        let wav = square_wave_wav(440.0, 100, 0.5);
        let samples = SAMPLE_RATE * 100 / 1000;
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples as usize * 2);
        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_len, samples * 2);
    }

    #[test]
    fn test_event_cues() {
        let moved = GameEvent::PlayerMoved {
            from: Position::new(1, 1),
            to: Position::new(2, 1),
        };
        assert_eq!(SoundEvent::for_event(&moved), Some(SoundEvent::Step));

        let defeated = GameEvent::EnemyDefeated {
            enemy: crate::game::new_entity_id(),
            kind: EnemyKind::Rat,
            xp: 3,
        };
        assert_eq!(
            SoundEvent::for_event(&defeated),
            Some(SoundEvent::EnemyDefeated)
        );
        assert_eq!(SoundEvent::for_event(&GameEvent::message("hello")), None);
    }
}
