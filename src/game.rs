//! Game session
//!
//! Owns the screen flow and everything that outlives a single run: tuning,
//! settings, the save document, the leaderboard and the persistence sink.
//! The active `RunState` is created on start and discarded on restart.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::PIXELS_PER_METRE;
use crate::error::SimError;
use crate::garage::{self, Stat};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::persistence::{PersistenceSink, SaveData};
use crate::settings::Settings;
use crate::sim::{
    Command, GameEvent, GamePhase, MissionCatalog, MissionKind, MissionSelection, RunConfig,
    RunState, TickInput, tick, transition,
};
use crate::tuning::{Difficulty, Tuning};

/// Commands accepted on the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    VolumeUp,
    VolumeDown,
    ToggleNight,
    ToggleRain,
}

/// Commands accepted on the garage screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GarageCommand {
    Select(String),
    Unlock(String),
    Upgrade(String, Stat),
}

/// Mission state as shown on the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionStatus {
    pub name: String,
    pub kind: MissionKind,
    pub progress: f32,
    pub target: u32,
    pub completed: bool,
    /// Seconds left on the completion banner
    pub popup_remaining: f32,
}

/// Read-only view polled by the presentation layer each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub score: f64,
    pub best_score: f64,
    pub coins_collected: u32,
    /// Lifetime currency
    pub wallet: u64,
    pub combo: u32,
    pub slow_remaining: f32,
    pub ghost_remaining: f32,
    pub magnet_remaining: f32,
    pub missions: Vec<MissionStatus>,
    pub dead: bool,
    pub elapsed: f32,
    pub speed: f32,
    pub lane: usize,
    pub road_scroll: f32,
}

pub struct Game {
    phase: GamePhase,
    tuning: Tuning,
    settings: Settings,
    save: SaveData,
    highscores: HighScores,
    best_score: f64,
    catalog: MissionCatalog,
    mission_selection: MissionSelection,
    sink: Box<dyn PersistenceSink>,
    settings_path: Option<PathBuf>,
    difficulty: Difficulty,
    run: Option<RunState>,
    seed: u64,
    runs_started: u64,
    events: Vec<GameEvent>,
}

impl Game {
    /// Create a session. The save is loaded from `sink`; a failing sink
    /// leaves the session on a fresh profile.
    pub fn new(tuning: Tuning, mut sink: Box<dyn PersistenceSink>, seed: u64) -> Self {
        let save = match sink.load() {
            Ok(save) => save,
            Err(e) => {
                log::warn!("Could not load save, using a fresh profile: {}", e);
                SaveData::default()
            }
        };
        Self {
            phase: GamePhase::Menu,
            tuning,
            settings: Settings::default(),
            save,
            highscores: HighScores::new(),
            best_score: 0.0,
            catalog: MissionCatalog::default(),
            mission_selection: MissionSelection::default(),
            sink,
            settings_path: None,
            difficulty: Difficulty::default(),
            run: None,
            seed,
            runs_started: 0,
            events: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Write settings to `path` whenever the settings screen is closed
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    /// Direct access to the live run (scripted scenarios, tooling)
    pub fn run_mut(&mut self) -> Option<&mut RunState> {
        self.run.as_mut()
    }

    pub fn save(&self) -> &SaveData {
        &self.save
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn highscores(&self) -> &HighScores {
        &self.highscores
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn catalog(&self) -> &MissionCatalog {
        &self.catalog
    }

    pub fn mission_selection(&self) -> &MissionSelection {
        &self.mission_selection
    }

    /// Apply a flow command. Rejected commands leave the session untouched.
    pub fn apply(&mut self, command: Command) -> Result<GamePhase, SimError> {
        let next = transition(self.phase, command).ok_or(SimError::InvalidTransition {
            phase: self.phase,
            command,
        })?;

        match command {
            Command::Start(difficulty) => {
                let run = self.build_run(difficulty)?;
                self.difficulty = difficulty;
                self.run = Some(run);
                self.events.clear();
            }
            Command::Crash => {
                if let Some(run) = self.run.as_mut() {
                    run.dead = true;
                }
                self.finish_run();
            }
            Command::Finish => self.finish_run(),
            Command::CloseSettings => self.store_settings(),
            Command::Restart => self.record_final_score(),
            _ => {}
        }

        log::debug!("{:?} -> {:?} ({:?})", self.phase, next, command);
        self.phase = next;
        Ok(next)
    }

    /// Start a run by difficulty name
    pub fn start_named(&mut self, difficulty: &str) -> Result<GamePhase, SimError> {
        let difficulty: Difficulty = difficulty.parse()?;
        self.apply(Command::Start(difficulty))
    }

    fn build_run(&mut self, difficulty: Difficulty) -> Result<RunState, SimError> {
        let missions = self.mission_selection.build(&self.catalog, difficulty)?;
        self.runs_started += 1;
        let seed = self
            .seed
            .wrapping_add(self.runs_started.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let config = RunConfig {
            seed,
            difficulty,
            tuning: self.tuning.clone(),
            missions,
            modifiers: garage::selected_modifiers(&self.save),
            vehicle: self.save.selected_vehicle.clone(),
            wallet: self.save.coins,
            slippery: self.settings.rain,
        };
        Ok(RunState::new(config))
    }

    /// Advance the active run. Only does anything in PLAY.
    pub fn update(&mut self, dt: f32, input: &TickInput) {
        if !self.phase.is_simulating() {
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };

        tick(run, input, dt);
        let events = run.drain_events();
        let wallet = run.wallet;
        let dead = run.dead;

        let picked_up = events
            .iter()
            .any(|e| matches!(e, GameEvent::CoinCollected { .. }));
        self.events.extend(events);

        if picked_up {
            self.save.coins = wallet;
            self.checkpoint();
        }
        if dead && self.apply(Command::Crash).is_err() {
            log::warn!("Crash could not end the run in phase {:?}", self.phase);
        }
    }

    /// Stats, achievements and a save at the end of a run
    fn finish_run(&mut self) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        self.save.coins = run.wallet;
        let metres = f64::from(run.distance / PIXELS_PER_METRE);
        self.save.record_run(
            run.coins_collected,
            run.missions_completed() as u32,
            metres,
            run.score,
        );
        self.save.evaluate_achievements();
        log::info!(
            "Run over: score {:.0}, {} coins, {:.1}s, best combo {}",
            run.score,
            run.coins_collected,
            run.elapsed,
            run.max_combo
        );
        self.checkpoint();
    }

    fn record_final_score(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        self.best_score = self.best_score.max(run.score);
        let rank = self.highscores.add(HighScoreEntry {
            score: run.score.max(0.0) as u64,
            coins: run.coins_collected,
            seconds: run.elapsed,
            difficulty: run.difficulty,
        });
        if let Some(rank) = rank {
            log::info!("New high score #{}: {:.0}", rank, run.score);
        }
    }

    fn store_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save(path) {
            log::warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Push the save to the sink. Failures are logged, never propagated.
    fn checkpoint(&mut self) {
        if let Err(e) = self.sink.store(&self.save) {
            log::warn!("Save failed, continuing in memory: {}", e);
        }
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> HudSnapshot {
        let mut hud = HudSnapshot {
            phase: self.phase,
            score: 0.0,
            best_score: self.best_score,
            coins_collected: 0,
            wallet: self.save.coins,
            combo: 0,
            slow_remaining: 0.0,
            ghost_remaining: 0.0,
            magnet_remaining: 0.0,
            missions: Vec::new(),
            dead: false,
            elapsed: 0.0,
            speed: 0.0,
            lane: 0,
            road_scroll: 0.0,
        };
        if let Some(run) = &self.run {
            hud.score = run.score;
            hud.coins_collected = run.coins_collected;
            hud.wallet = run.wallet;
            hud.combo = run.combo;
            hud.slow_remaining = run.effects.slow_remaining;
            hud.ghost_remaining = run.effects.ghost_remaining;
            hud.magnet_remaining = run.effects.magnet_remaining;
            hud.missions = run
                .missions
                .iter()
                .map(|m| MissionStatus {
                    name: m.name.clone(),
                    kind: m.kind,
                    progress: m.progress,
                    target: m.target,
                    completed: m.completed,
                    popup_remaining: m.popup_remaining,
                })
                .collect();
            hud.dead = run.dead;
            hud.elapsed = run.elapsed;
            hud.speed = run.speed;
            hud.lane = run.player.lane;
            hud.road_scroll = run.road_scroll;
        }
        hud
    }

    fn require_screen(
        &self,
        on_screen: bool,
        screen: &'static str,
        action: &'static str,
    ) -> Result<(), SimError> {
        if on_screen {
            Ok(())
        } else {
            Err(SimError::WrongScreen {
                phase: self.phase,
                screen,
                action,
            })
        }
    }

    pub fn settings_command(&mut self, command: SettingsCommand) -> Result<(), SimError> {
        let on_screen = matches!(self.phase, GamePhase::Settings(_));
        self.require_screen(on_screen, "settings", "Settings change")?;
        match command {
            SettingsCommand::VolumeUp => self.settings.volume_up(),
            SettingsCommand::VolumeDown => self.settings.volume_down(),
            SettingsCommand::ToggleNight => self.settings.toggle_night(),
            SettingsCommand::ToggleRain => self.settings.toggle_rain(),
        }
        Ok(())
    }

    /// Garage actions. Purchases are saved immediately and, when the garage
    /// was opened from a paused run, reflected in that run's wallet.
    pub fn garage_command(&mut self, command: GarageCommand) -> Result<(), SimError> {
        let on_screen = matches!(self.phase, GamePhase::Garage(_));
        self.require_screen(on_screen, "garage", "Garage action")?;
        match &command {
            GarageCommand::Select(name) => garage::select(&mut self.save, name)?,
            GarageCommand::Unlock(name) => garage::unlock(&mut self.save, name)?,
            GarageCommand::Upgrade(name, stat) => {
                garage::upgrade(&mut self.save, name, *stat)?;
            }
        }
        if let Some(run) = self.run.as_mut() {
            run.wallet = self.save.coins;
        }
        self.checkpoint();
        Ok(())
    }

    /// Choose the missions for the next run. Invalid selections are
    /// rejected and the previous selection is kept.
    pub fn select_missions(&mut self, selection: MissionSelection) -> Result<(), SimError> {
        let on_screen = self.phase == GamePhase::Missions;
        self.require_screen(on_screen, "missions", "Mission selection")?;
        selection.build(&self.catalog, self.difficulty)?;
        log::info!("Mission selection: {:?}", selection);
        self.mission_selection = selection;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemorySink;
    use crate::sim::{Obstacle, Origin, VehicleCategory};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every stored save so tests can inspect checkpoints
    #[derive(Default, Clone)]
    struct SpySink {
        stored: Rc<RefCell<Vec<SaveData>>>,
        fail: bool,
    }

    impl PersistenceSink for SpySink {
        fn load(&mut self) -> Result<SaveData, SimError> {
            Ok(SaveData::default())
        }

        fn store(&mut self, data: &SaveData) -> Result<(), SimError> {
            if self.fail {
                return Err(SimError::Persistence("disk full".into()));
            }
            self.stored.borrow_mut().push(data.clone());
            Ok(())
        }
    }

    fn game() -> Game {
        Game::new(Tuning::default(), Box::new(MemorySink::default()), 7)
    }

    fn crash_now(game: &mut Game) {
        let run = game.run_mut().unwrap();
        run.spawner.enabled = false;
        let id = run.next_entity_id();
        let mut car = Obstacle::spawn(id, run.player.lane, VehicleCategory::Car, &run.grid);
        car.pos.y = run.player.pos.y;
        run.obstacles.push(car);
        game.update(1.0 / 60.0, &TickInput::default());
    }

    #[test]
    fn test_start_builds_fresh_run() {
        let mut g = game();
        assert!(g.run().is_none());
        assert_eq!(g.start_named("hard"), Ok(GamePhase::Play));
        let run = g.run().unwrap();
        assert_eq!(run.difficulty, Difficulty::Hard);
        assert_eq!(run.speed, 300.0);
        assert_eq!(run.missions.len(), 3);
    }

    #[test]
    fn test_unknown_difficulty_rejected() {
        let mut g = game();
        assert_eq!(
            g.start_named("nightmare"),
            Err(SimError::UnknownDifficulty("nightmare".into()))
        );
        assert_eq!(g.phase(), GamePhase::Menu);
        assert!(g.run().is_none());
    }

    #[test]
    fn test_invalid_command_keeps_phase() {
        let mut g = game();
        assert!(matches!(
            g.apply(Command::Resume),
            Err(SimError::InvalidTransition { .. })
        ));
        assert_eq!(g.phase(), GamePhase::Menu);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut g = game();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        g.update(0.1, &TickInput::default());
        let elapsed = g.run().unwrap().elapsed;
        g.apply(Command::Pause).unwrap();
        g.update(0.1, &TickInput::default());
        assert_eq!(g.run().unwrap().elapsed, elapsed);
        g.apply(Command::Resume).unwrap();
        g.update(0.1, &TickInput::default());
        assert!(g.run().unwrap().elapsed > elapsed);
    }

    #[test]
    fn test_crash_goes_to_game_over_and_saves() {
        let sink = SpySink::default();
        let stored = sink.stored.clone();
        let mut g = Game::new(Tuning::default(), Box::new(sink), 1);
        g.apply(Command::Start(Difficulty::Easy)).unwrap();
        crash_now(&mut g);

        assert_eq!(g.phase(), GamePhase::GameOver);
        assert!(g.snapshot().dead);
        assert_eq!(g.save().stats.missions_played, 1);
        assert_eq!(stored.borrow().len(), 1);
        assert!(
            g.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Crash { .. }))
        );
    }

    #[test]
    fn test_finish_ends_run_without_crash() {
        let sink = SpySink::default();
        let stored = sink.stored.clone();
        let mut g = Game::new(Tuning::default(), Box::new(sink), 2);
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        g.run_mut().unwrap().spawner.enabled = false;
        for _ in 0..30 {
            g.update(1.0 / 60.0, &TickInput::default());
        }
        assert_eq!(g.apply(Command::Finish), Ok(GamePhase::GameOver));

        let hud = g.snapshot();
        assert!(!hud.dead);
        assert!(hud.score > 0.0);
        assert_eq!(g.save().stats.missions_played, 1);
        assert_eq!(stored.borrow().len(), 1);
        assert!(
            !g.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Crash { .. }))
        );
        g.apply(Command::Restart).unwrap();
        assert_eq!(g.best_score(), hud.score);
    }

    #[test]
    fn test_restart_carries_best_score() {
        let mut g = game();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        for _ in 0..30 {
            g.update(1.0 / 60.0, &TickInput::default());
        }
        crash_now(&mut g);
        let score = g.snapshot().score;
        assert!(score > 0.0);
        g.apply(Command::Restart).unwrap();
        assert_eq!(g.phase(), GamePhase::Menu);
        assert!(g.run().is_none());
        assert_eq!(g.best_score(), score);
        assert_eq!(g.highscores().entries.len(), 1);
    }

    #[test]
    fn test_coin_pickup_checkpoints_wallet() {
        let sink = SpySink::default();
        let stored = sink.stored.clone();
        let mut g = Game::new(Tuning::default(), Box::new(sink), 3);
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        {
            let run = g.run_mut().unwrap();
            run.spawner.enabled = false;
            let id = run.next_entity_id();
            let mut coin = crate::sim::Coin::spawn(id, run.player.lane, &run.grid);
            coin.pos = run.player.pos;
            run.coins.push(coin);
        }
        g.update(1.0 / 60.0, &TickInput::default());
        assert_eq!(g.save().coins, 1);
        assert_eq!(stored.borrow().last().map(|s| s.coins), Some(1));
    }

    #[test]
    fn test_sink_failure_does_not_stall() {
        let sink = SpySink {
            fail: true,
            ..Default::default()
        };
        let mut g = Game::new(Tuning::default(), Box::new(sink), 3);
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        crash_now(&mut g);
        assert_eq!(g.phase(), GamePhase::GameOver);
        assert_eq!(g.save().stats.missions_played, 1);
    }

    #[test]
    fn test_settings_only_on_settings_screen() {
        let mut g = game();
        assert!(matches!(
            g.settings_command(SettingsCommand::ToggleRain),
            Err(SimError::WrongScreen { .. })
        ));
        g.apply(Command::OpenSettings).unwrap();
        g.settings_command(SettingsCommand::ToggleRain).unwrap();
        g.settings_command(SettingsCommand::VolumeUp).unwrap();
        assert!(g.settings().rain);
        assert!((g.settings().volume - 0.30).abs() < 1e-6);
        g.apply(Command::CloseSettings).unwrap();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        assert!(g.run().unwrap().slippery);
    }

    #[test]
    fn test_closing_settings_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "traffic_rush_game_settings_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let mut g = game().with_settings_path(&path);
        g.apply(Command::OpenSettings).unwrap();
        g.settings_command(SettingsCommand::ToggleNight).unwrap();
        g.settings_command(SettingsCommand::VolumeDown).unwrap();
        assert!(!path.exists());
        g.apply(Command::CloseSettings).unwrap();

        let reloaded = Settings::load(&path);
        assert_eq!(&reloaded, g.settings());
        assert!(reloaded.night_mode);
        assert!((reloaded.volume - 0.20).abs() < 1e-6);

        // A new session picks the preferences back up
        let g = game().with_settings(reloaded).with_settings_path(&path);
        assert!(g.settings().night_mode);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_garage_from_pause_updates_run_wallet() {
        let mut g = game();
        g.save.coins = 150;
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        assert_eq!(g.run().unwrap().wallet, 150);
        g.apply(Command::Pause).unwrap();
        g.apply(Command::OpenGarage).unwrap();
        assert_eq!(g.phase(), GamePhase::Garage(Origin::Pause));
        g.garage_command(GarageCommand::Unlock("van".into())).unwrap();
        assert_eq!(g.run().unwrap().wallet, 50);
        assert!(g.garage_command(GarageCommand::Unlock("sport".into())).is_err());
        assert_eq!(g.save().coins, 50);
        g.apply(Command::CloseGarage).unwrap();
        assert_eq!(g.phase(), GamePhase::Pause);
    }

    #[test]
    fn test_selected_vehicle_feeds_modifiers() {
        let mut g = game();
        g.save.coins = 10_000;
        g.apply(Command::OpenGarage).unwrap();
        g.garage_command(GarageCommand::Upgrade("compact".into(), Stat::Duration))
            .unwrap();
        g.apply(Command::CloseGarage).unwrap();
        g.apply(Command::Start(Difficulty::Easy)).unwrap();
        let run = g.run().unwrap();
        assert!((run.modifiers.effect_duration_scale - 1.1).abs() < 1e-6);
        assert_eq!(run.player.vehicle, "compact");
    }

    #[test]
    fn test_mission_selection() {
        let mut g = game();
        g.apply(Command::OpenMissions).unwrap();
        assert_eq!(
            g.select_missions(MissionSelection::Custom(vec![1, 12])),
            Err(SimError::MissionIndexOutOfRange { index: 12, len: 6 })
        );
        assert_eq!(g.mission_selection(), &MissionSelection::QuickPlay);
        g.select_missions(MissionSelection::Custom(vec![5, 0])).unwrap();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        let names: Vec<&str> = g.run().unwrap().missions.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Combo x8", "Endurance 60"]);
    }

    #[test]
    fn test_endless_run_has_no_missions() {
        let mut g = game();
        g.apply(Command::OpenMissions).unwrap();
        g.select_missions(MissionSelection::Endless).unwrap();
        g.apply(Command::Start(Difficulty::Hard)).unwrap();
        assert!(g.snapshot().missions.is_empty());
    }

    #[test]
    fn test_runs_get_distinct_seeds() {
        let mut g = game();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        let first = g.run().unwrap().seed;
        crash_now(&mut g);
        g.apply(Command::Restart).unwrap();
        g.apply(Command::Start(Difficulty::Normal)).unwrap();
        assert_ne!(g.run().unwrap().seed, first);
    }
}
