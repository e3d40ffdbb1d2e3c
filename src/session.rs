//! # Game Session
//!
//! The headless controller between the front end and the turn engine.
//!
//! A session owns the authoritative [`GameState`] and everything around it
//! that is not turn logic: the input lock, the presentation scheduler, the
//! message log, sound, persisted volumes and the enemy description lookup.
//! The front end feeds it [`PlayerInput`]s and frame times; it never touches
//! the state directly.

use crate::game::scheduler::{ScheduledAction, Scheduler};
use crate::game::{
    DamageSource, EntityId, GameEvent, GameMode, GameState, LevelUpChoice, MessageImportance,
    PlayerClass, PlayerIntent, ShopItem, TurnEngine, TurnOutcome,
};
use crate::input::PlayerInput;
use crate::services::{
    DescriptionStatus, DescriptionTracker, Settings, SettingsStore, SoundEvent, SoundService,
    VOLUME_STEP,
};
use crate::{GravewalkError, GravewalkResult, Rejection};
use log::{debug, error, warn};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Messages kept in the log
pub const MAX_MESSAGES: usize = 100;

/// One line of the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub importance: MessageImportance,
    /// Turn number when the message was written
    pub turn: u64,
}

/// What became of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Nothing is bound to this input in the current mode
    Ignored,
    Resolved { turn_consumed: bool },
    Rejected(Rejection),
    /// Volume changed; the game state is untouched
    SettingsChanged,
}

/// A running game.
pub struct GameSession {
    engine: TurnEngine,
    state: GameState,
    scheduler: Scheduler,
    clock: Duration,
    input_locked: bool,
    messages: VecDeque<LogEntry>,
    sound: Box<dyn SoundService>,
    settings: Settings,
    settings_store: Option<SettingsStore>,
    descriptions: DescriptionTracker,
}

impl GameSession {
    /// Starts a new run of `class`.
    pub fn new(
        mut engine: TurnEngine,
        class: PlayerClass,
        sound: Box<dyn SoundService>,
        descriptions: DescriptionTracker,
    ) -> GravewalkResult<Self> {
        let state = engine.new_run(class)?;
        let mut session = Self {
            engine,
            state,
            scheduler: Scheduler::new(),
            clock: Duration::ZERO,
            input_locked: false,
            messages: VecDeque::new(),
            sound,
            settings: Settings::default(),
            settings_store: None,
            descriptions,
        };
        session.log(
            format!(
                "You enter the crypt as a {}. Find the stairs down.",
                class.name()
            ),
            MessageImportance::Info,
        );
        Ok(session)
    }

    /// Applies loaded volumes and saves later changes to `store`.
    pub fn with_settings(mut self, store: SettingsStore, settings: Settings) -> Self {
        self.sound.set_music_volume(settings.music_volume);
        self.sound.set_sfx_volume(settings.sfx_volume);
        self.settings = settings;
        self.settings_store = Some(store);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn messages(&self) -> impl Iterator<Item = &LogEntry> {
        self.messages.iter()
    }

    /// The newest `count` messages, oldest first.
    pub fn recent_messages(&self, count: usize) -> impl Iterator<Item = &LogEntry> {
        self.messages
            .iter()
            .skip(self.messages.len().saturating_sub(count))
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn description(&self, enemy: EntityId) -> DescriptionStatus<'_> {
        self.descriptions.status(enemy)
    }

    /// Handles one input. Rejections are logged (or heard, for a bump) and
    /// returned; only engine failures such as a broken generator are errors.
    pub fn handle_input(&mut self, input: PlayerInput) -> GravewalkResult<InputOutcome> {
        match input {
            PlayerInput::MusicVolume { louder } => {
                self.adjust_volume(true, louder);
                return Ok(InputOutcome::SettingsChanged);
            }
            PlayerInput::SfxVolume { louder } => {
                self.adjust_volume(false, louder);
                return Ok(InputOutcome::SettingsChanged);
            }
            _ => {}
        }

        let Some(intent) = self.intent_for(input) else {
            return Ok(InputOutcome::Ignored);
        };
        if self.input_locked {
            self.reject(Rejection::InputLocked);
            return Ok(InputOutcome::Rejected(Rejection::InputLocked));
        }

        match self.engine.resolve(&self.state, intent) {
            Ok(outcome) => {
                let turn_consumed = outcome.turn_consumed;
                self.apply(outcome);
                Ok(InputOutcome::Resolved { turn_consumed })
            }
            Err(GravewalkError::Rejected(rejection)) => {
                debug!("Rejected {:?}: {}", intent, rejection);
                self.reject(rejection);
                Ok(InputOutcome::Rejected(rejection))
            }
            Err(err) => {
                error!("Could not resolve {:?}: {}", intent, err);
                Err(err)
            }
        }
    }

    /// Advances the session clock and runs every due scheduled action.
    pub fn update(&mut self, dt: Duration) -> GravewalkResult<()> {
        self.clock += dt;
        for action in self.scheduler.poll(self.clock) {
            match action {
                ScheduledAction::ClearEnemyFlash(id) => self.state.clear_enemy_flash(id),
                ScheduledAction::ClearPlayerFlash => self.state.player_hit_flash = false,
                ScheduledAction::ExpireDamageNumber(id) => self.state.expire_damage_number(id),
                ScheduledAction::ClearBlast(id) => self.state.clear_blast(id),
                ScheduledAction::AdvanceProjectile => self.step_projectile()?,
                ScheduledAction::ReleaseInput => self.input_locked = false,
            }
        }
        self.descriptions.poll();
        Ok(())
    }

    /// Picks the engine intent for an input in the current mode.
    fn intent_for(&self, input: PlayerInput) -> Option<PlayerIntent> {
        let intent = match input {
            PlayerInput::Move(direction) => PlayerIntent::Move(direction),
            PlayerInput::Fire => PlayerIntent::Fire,
            PlayerInput::PlaceBomb => PlayerIntent::PlaceBomb,
            PlayerInput::UsePotion => PlayerIntent::UsePotion,
            PlayerInput::UseAntidote => PlayerIntent::UseAntidote,
            PlayerInput::Pause => PlayerIntent::TogglePause,
            PlayerInput::Close => PlayerIntent::CloseModal,
            PlayerInput::Choice(index) => match self.state.mode {
                GameMode::LevelUp => {
                    PlayerIntent::ChooseLevelUp(*LevelUpChoice::all().get(index)?)
                }
                GameMode::Shopping => PlayerIntent::Purchase(*ShopItem::all().get(index)?),
                _ => return None,
            },
            PlayerInput::Inspect(position) => {
                let enemy = self.state.enemy_at(position)?;
                PlayerIntent::Inspect(enemy.id)
            }
            PlayerInput::Restart if self.state.is_game_over() => PlayerIntent::Restart,
            PlayerInput::Restart => return None,
            PlayerInput::MusicVolume { .. } | PlayerInput::SfxVolume { .. } => return None,
        };
        Some(intent)
    }

    fn step_projectile(&mut self) -> GravewalkResult<()> {
        if self.state.projectile.is_none() {
            self.release_unless_transition();
            return Ok(());
        }

        let outcome = self.engine.advance_projectile(&self.state)?;
        self.apply(outcome);
        if self.state.projectile.is_some() {
            self.schedule_in(
                self.engine.config().arrow_step_ms,
                ScheduledAction::AdvanceProjectile,
            );
        } else {
            self.release_unless_transition();
        }
        Ok(())
    }

    fn release_unless_transition(&mut self) {
        if !self.scheduler.has_pending(ScheduledAction::ReleaseInput) {
            self.input_locked = false;
        }
    }

    fn apply(&mut self, outcome: TurnOutcome) {
        let TurnOutcome { state, events, .. } = outcome;
        let previous_mode = self.state.mode;
        let known_numbers: HashSet<EntityId> =
            self.state.damage_numbers.iter().map(|n| n.id).collect();
        self.state = state;

        for event in &events {
            self.present(event);
        }

        let fresh: Vec<EntityId> = self
            .state
            .damage_numbers
            .iter()
            .map(|n| n.id)
            .filter(|id| !known_numbers.contains(id))
            .collect();
        for id in fresh {
            self.schedule_in(
                self.engine.config().damage_number_ms,
                ScheduledAction::ExpireDamageNumber(id),
            );
        }

        self.sync_inspection(previous_mode);
    }

    /// Sound, message and scheduled clean-up for one event.
    fn present(&mut self, event: &GameEvent) {
        if let Some(sound) = SoundEvent::for_event(event) {
            self.sound.play(sound);
        }
        if let Some((text, importance)) = narrate(event) {
            self.log(text, importance);
        }

        let config = self.engine.config();
        let (hit_flash, blast, arrow_step, transition) = (
            config.hit_flash_ms,
            config.blast_ms,
            config.arrow_step_ms,
            config.screen_transition_ms,
        );
        match event {
            GameEvent::EnemyDamaged { enemy, .. } => {
                self.schedule_in(hit_flash, ScheduledAction::ClearEnemyFlash(*enemy));
            }
            GameEvent::PlayerDamaged { .. } => {
                self.schedule_in(hit_flash, ScheduledAction::ClearPlayerFlash);
            }
            GameEvent::BombDetonated { blast: id, .. } => {
                self.schedule_in(blast, ScheduledAction::ClearBlast(*id));
            }
            GameEvent::ArrowFired { .. } => {
                self.input_locked = true;
                self.schedule_in(arrow_step, ScheduledAction::AdvanceProjectile);
            }
            GameEvent::ScreenChanged { .. } | GameEvent::LevelExited { .. } => {
                self.scheduler
                    .cancel_where(|action| *action == ScheduledAction::ReleaseInput);
                self.input_locked = true;
                self.schedule_in(transition, ScheduledAction::ReleaseInput);
            }
            GameEvent::PlayerDied => {
                self.scheduler
                    .cancel_where(|action| *action == ScheduledAction::AdvanceProjectile);
            }
            _ => {}
        }
    }

    /// Starts or stops the description lookup as the inspection window opens
    /// and closes.
    fn sync_inspection(&mut self, previous_mode: GameMode) {
        match self.state.mode {
            GameMode::Inspecting { enemy } if previous_mode != self.state.mode => {
                if let Some(target) = self.state.enemy(enemy) {
                    self.descriptions
                        .request(enemy, target.kind, self.state.dungeon_level);
                }
            }
            GameMode::Inspecting { .. } => {}
            _ if matches!(previous_mode, GameMode::Inspecting { .. }) => {
                self.descriptions.cancel();
            }
            _ => {}
        }
    }

    fn reject(&mut self, rejection: Rejection) {
        if rejection == Rejection::Bump {
            self.sound.play(SoundEvent::Bump);
        } else {
            self.log(rejection.to_string(), MessageImportance::Info);
        }
    }

    fn adjust_volume(&mut self, music: bool, louder: bool) {
        let delta = if louder { VOLUME_STEP } else { -VOLUME_STEP };
        let (label, volume) = if music {
            let volume = self.settings.adjust_music(delta);
            self.sound.set_music_volume(volume);
            ("Music", volume)
        } else {
            let volume = self.settings.adjust_sfx(delta);
            self.sound.set_sfx_volume(volume);
            ("Effects", volume)
        };
        self.log(
            format!("{} volume {}%", label, (volume * 100.0).round() as u32),
            MessageImportance::Info,
        );

        if let Some(store) = &self.settings_store {
            if let Err(err) = store.save(&self.settings) {
                warn!("Could not save settings: {}", err);
            }
        }
    }

    fn schedule_in(&mut self, millis: u64, action: ScheduledAction) {
        self.scheduler
            .schedule(self.clock + Duration::from_millis(millis), action);
    }

    fn log(&mut self, text: String, importance: MessageImportance) {
        self.messages.push_back(LogEntry {
            text,
            importance,
            turn: self.state.turn_number,
        });
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }
}

/// The message line for an event, if it deserves one.
fn narrate(event: &GameEvent) -> Option<(String, MessageImportance)> {
    use MessageImportance::{Info, Warning};

    let line = match event {
        GameEvent::Message { text, importance } => (text.clone(), *importance),
        GameEvent::EnemyDefeated { kind, xp, .. } => {
            (format!("The {} dies. (+{} xp)", kind.name(), xp), Info)
        }
        GameEvent::EnemySpawned { kind, .. } => (format!("A {} wriggles free!", kind.name()), Info),
        GameEvent::PlayerDamaged { damage, source } => {
            let text = match source {
                DamageSource::Enemy(kind) => format!("The {} hits you for {}.", kind.name(), damage),
                DamageSource::Bomb => format!("You are caught in the blast for {}.", damage),
                DamageSource::Poison => format!("Poison burns you for {}.", damage),
                DamageSource::Hazard(crate::game::HazardKind::Pit) => {
                    "You fall into the pit.".to_string()
                }
                DamageSource::Hazard(kind) => format!("The {} hurt you for {}.", kind.name(), damage),
            };
            (text, Warning)
        }
        GameEvent::PlayerPoisoned => ("You are poisoned!".to_string(), Warning),
        GameEvent::PoisonCured => ("The poison fades.".to_string(), Info),
        GameEvent::PlayerHealed { amount } => (format!("You recover {} health.", amount), Info),
        GameEvent::ItemPickedUp { kind, amount, .. } => {
            (format!("You pick up {} {}.", amount, kind.name()), Info)
        }
        GameEvent::ArrowFired { direction } => (format!("You loose an arrow {}.", direction.name()), Info),
        GameEvent::BombPlaced { .. } => ("You light a bomb.".to_string(), Info),
        GameEvent::ShopOpened => (
            "The wizard's shop is open. 1-4 to buy, Esc to leave.".to_string(),
            Info,
        ),
        GameEvent::Purchased { item, cost } => {
            (format!("Bought {} for {} gold.", item.name(), cost), Info)
        }
        GameEvent::LevelUpReady => (
            format!(
                "Level up! 1: {}  2: {}",
                LevelUpChoice::Vitality.describe(),
                LevelUpChoice::Might.describe()
            ),
            Warning,
        ),
        GameEvent::LeveledUp { choice, level } => {
            (format!("You reach level {}: {}.", level, choice.describe()), Info)
        }
        GameEvent::RunRestarted => (
            "You rise again. Your strength endures, half your gold does not.".to_string(),
            Info,
        ),
        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::{Direction, Enemy, EnemyKind, Position, Wizard};
    use crate::generation::{FixedLayoutGenerator, GenerationConfig, LevelLayout};
    use crate::services::LocalLore;
    use crate::Map;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<SoundEvent>>>);

    impl SoundService for Recorder {
        fn play(&mut self, sound: SoundEvent) {
            self.0.borrow_mut().push(sound);
        }

        fn set_music_volume(&mut self, _volume: f32) {}

        fn set_sfx_volume(&mut self, _volume: f32) {}
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Two screens of 5x3 side by side, joined through (4,1)-(5,1).
    fn two_screens() -> LevelLayout {
        let map = Map::from_ascii(&["##########", "#........#", "##########"])
            .unwrap()
            .with_screen_size(5, 3);
        LevelLayout::empty(map, Position::new(1, 1), Position::new(8, 1))
    }

    fn session(layout: LevelLayout, runtime: &Runtime) -> (GameSession, Recorder) {
        let engine = TurnEngine::with_generator(
            EngineConfig::deterministic(),
            GenerationConfig::for_testing(5),
            Box::new(FixedLayoutGenerator::new(layout)),
        );
        let recorder = Recorder::default();
        let tracker = DescriptionTracker::new(Arc::new(LocalLore::new()), runtime.handle().clone());
        let session = GameSession::new(
            engine,
            PlayerClass::Ranger,
            Box::new(recorder.clone()),
            tracker,
        )
        .unwrap();
        (session, recorder)
    }

    #[test]
    fn test_bump_is_only_heard() {
        let runtime = Runtime::new().unwrap();
        let (mut session, recorder) = session(two_screens(), &runtime);
        let logged = session.messages().count();

        let outcome = session
            .handle_input(PlayerInput::Move(Direction::North))
            .unwrap();

        assert_eq!(outcome, InputOutcome::Rejected(Rejection::Bump));
        assert_eq!(session.messages().count(), logged);
        assert_eq!(recorder.0.borrow().as_slice(), &[SoundEvent::Bump]);
    }

    #[test]
    fn test_rejection_is_logged() {
        let runtime = Runtime::new().unwrap();
        let (mut session, _) = session(two_screens(), &runtime);

        let outcome = session.handle_input(PlayerInput::Fire).unwrap();

        assert_eq!(outcome, InputOutcome::Rejected(Rejection::NoAim));
        let last = session.messages().last().unwrap();
        assert_eq!(last.text, Rejection::NoAim.to_string());
    }

    #[test]
    fn test_screen_transition_locks_input() {
        let runtime = Runtime::new().unwrap();
        let (mut session, _) = session(two_screens(), &runtime);
        for _ in 0..3 {
            session
                .handle_input(PlayerInput::Move(Direction::East))
                .unwrap();
        }
        assert!(!session.is_input_locked());

        session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();
        assert_eq!(session.state().player.position, Position::new(5, 1));
        assert!(session.is_input_locked());

        let outcome = session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();
        assert_eq!(outcome, InputOutcome::Rejected(Rejection::InputLocked));

        session.update(ms(250)).unwrap();
        assert!(!session.is_input_locked());
        let outcome = session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();
        assert_eq!(outcome, InputOutcome::Resolved { turn_consumed: true });
    }

    #[test]
    fn test_arrow_flies_on_the_clock() {
        let runtime = Runtime::new().unwrap();
        let mut layout = two_screens();
        layout.map = layout.map.with_screen_size(10, 3);
        layout
            .enemies
            .push(Enemy::new(EnemyKind::Orc, Position::new(6, 1)));
        let (mut session, _) = session(layout, &runtime);
        session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();

        session.handle_input(PlayerInput::Fire).unwrap();
        assert!(session.is_input_locked());
        assert!(session.state().projectile.is_some());
        assert_eq!(session.state().turn_number, 1);

        for _ in 0..10 {
            session.update(ms(60)).unwrap();
        }

        assert!(session.state().projectile.is_none());
        assert!(!session.is_input_locked());
        assert_eq!(session.state().turn_number, 2);
        // Ranger: floor((5 + 3) * 0.8) = 6
        assert_eq!(session.state().enemies[0].hp, 14);
    }

    #[test]
    fn test_presentation_expires() {
        let runtime = Runtime::new().unwrap();
        let mut layout = two_screens();
        layout
            .enemies
            .push(Enemy::new(EnemyKind::Orc, Position::new(2, 1)));
        let (mut session, _) = session(layout, &runtime);

        session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();
        assert!(session.state().enemies[0].just_hit);
        assert!(session.state().player_hit_flash);
        assert!(!session.state().damage_numbers.is_empty());

        session.update(ms(200)).unwrap();
        assert!(!session.state().enemies[0].just_hit);
        assert!(!session.state().player_hit_flash);
        assert!(!session.state().damage_numbers.is_empty());

        session.update(ms(500)).unwrap();
        assert!(session.state().damage_numbers.is_empty());
    }

    #[test]
    fn test_choice_maps_to_mode() {
        let runtime = Runtime::new().unwrap();
        let mut layout = two_screens();
        layout.wizards.push(Wizard {
            position: Position::new(2, 1),
        });
        let (mut session, _) = session(layout, &runtime);

        assert_eq!(
            session.handle_input(PlayerInput::Choice(0)).unwrap(),
            InputOutcome::Ignored
        );
        assert_eq!(
            session.handle_input(PlayerInput::Restart).unwrap(),
            InputOutcome::Ignored
        );

        session
            .handle_input(PlayerInput::Move(Direction::East))
            .unwrap();
        assert_eq!(session.state().mode, GameMode::Shopping);

        // A fresh character has no gold
        assert_eq!(
            session.handle_input(PlayerInput::Choice(0)).unwrap(),
            InputOutcome::Rejected(Rejection::NotEnoughGold)
        );
        assert_eq!(
            session.handle_input(PlayerInput::Choice(7)).unwrap(),
            InputOutcome::Ignored
        );
    }

    #[test]
    fn test_inspection_fetches_description() {
        let runtime = Runtime::new().unwrap();
        let mut layout = two_screens();
        let rat = Enemy::new(EnemyKind::Rat, Position::new(3, 1));
        let id = rat.id;
        layout.enemies.push(rat);
        let (mut session, _) = session(layout, &runtime);

        session
            .handle_input(PlayerInput::Inspect(Position::new(3, 1)))
            .unwrap();
        assert_eq!(session.state().mode, GameMode::Inspecting { enemy: id });

        let mut ready = false;
        for _ in 0..200 {
            session.update(ms(5)).unwrap();
            if matches!(session.description(id), DescriptionStatus::Ready(_)) {
                ready = true;
                break;
            }
            std::thread::sleep(ms(2));
        }
        assert!(ready);

        session.handle_input(PlayerInput::Close).unwrap();
        assert_eq!(session.state().mode, GameMode::Playing);
        assert_eq!(session.description(id), DescriptionStatus::Idle);
    }

    #[test]
    fn test_volume_keys_persist() {
        let runtime = Runtime::new().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let (session, _) = session(two_screens(), &runtime);
        let mut session = session.with_settings(store.clone(), Settings::default());

        let outcome = session
            .handle_input(PlayerInput::MusicVolume { louder: false })
            .unwrap();

        assert_eq!(outcome, InputOutcome::SettingsChanged);
        assert_eq!(session.settings().music_volume, 0.5);
        assert_eq!(store.load().music_volume, 0.5);
        assert_eq!(store.load().sfx_volume, 0.8);
    }

    #[test]
    fn test_message_log_is_capped() {
        let runtime = Runtime::new().unwrap();
        let (mut session, _) = session(two_screens(), &runtime);
        for _ in 0..(MAX_MESSAGES + 20) {
            session.handle_input(PlayerInput::UsePotion).unwrap();
        }
        assert_eq!(session.messages().count(), MAX_MESSAGES);
        assert_eq!(session.recent_messages(3).count(), 3);
    }
}
