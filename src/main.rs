//! Traffic Rush headless driver
//!
//! Plays sessions on autopilot for smoke runs and balance checks.
//!
//! Environment:
//! - `TRAFFIC_RUSH_TUNING`: JSON tuning file (defaults when unset or invalid)
//! - `TRAFFIC_RUSH_SAVE`: JSON save file (in-memory when unset)
//! - `TRAFFIC_RUSH_SETTINGS`: JSON settings file (rain makes the road slippery),
//!   rewritten when the settings screen closes
//! - `TRAFFIC_RUSH_DIFFICULTY`: easy, normal or hard
//! - `TRAFFIC_RUSH_SEED`: session seed
//! - `TRAFFIC_RUSH_RUNS`: number of runs to play
//! - `TRAFFIC_RUSH_SECONDS`: time limit per run; a run that survives it is
//!   finished without a crash
//! - `RUST_LOG`: log filter

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use traffic_rush::consts::{MAX_FRAME_DT, REFERENCE_HZ};
use traffic_rush::persistence::{JsonFileSink, MemorySink, PersistenceSink};
use traffic_rush::sim::{Command, GamePhase, TickInput};
use traffic_rush::{Difficulty, Game, Settings, Tuning};

/// Driver options read from the environment
struct DriverConfig {
    tuning: Tuning,
    save_path: Option<String>,
    settings: Settings,
    settings_path: Option<String>,
    difficulty: Difficulty,
    seed: u64,
    runs: u32,
    seconds: f32,
}

impl DriverConfig {
    fn load_or_default() -> Self {
        let mut config = Self {
            tuning: Tuning::default(),
            save_path: None,
            settings: Settings::default(),
            settings_path: None,
            difficulty: Difficulty::Normal,
            seed: 0x5EED,
            runs: 3,
            seconds: 120.0,
        };

        if let Ok(path) = std::env::var("TRAFFIC_RUSH_TUNING") {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
            {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    config.tuning = tuning;
                }
                Err(e) => log::warn!("Invalid tuning file '{}' ({}), using defaults", path, e),
            }
        }

        if let Ok(path) = std::env::var("TRAFFIC_RUSH_SAVE") {
            config.save_path = Some(path);
        }

        if let Ok(path) = std::env::var("TRAFFIC_RUSH_SETTINGS") {
            config.settings = Settings::load(Path::new(&path));
            config.settings_path = Some(path);
        }

        if let Ok(name) = std::env::var("TRAFFIC_RUSH_DIFFICULTY") {
            match name.parse() {
                Ok(d) => config.difficulty = d,
                Err(e) => log::warn!("{}, using {}", e, config.difficulty),
            }
        }

        if let Ok(seed) = std::env::var("TRAFFIC_RUSH_SEED") {
            match seed.parse::<u64>() {
                Ok(parsed) => config.seed = parsed,
                Err(_) => log::warn!("Invalid TRAFFIC_RUSH_SEED '{}', using default", seed),
            }
        }

        if let Ok(runs) = std::env::var("TRAFFIC_RUSH_RUNS") {
            match runs.parse::<u32>() {
                Ok(parsed) if parsed > 0 => config.runs = parsed,
                _ => log::warn!("TRAFFIC_RUSH_RUNS must be > 0, using default"),
            }
        }

        if let Ok(secs) = std::env::var("TRAFFIC_RUSH_SECONDS") {
            match secs.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.seconds = parsed,
                _ => log::warn!("TRAFFIC_RUSH_SECONDS must be > 0, using default"),
            }
        }

        config
    }
}

fn main() {
    env_logger::init();
    log::info!("Traffic Rush (headless) starting...");

    let config = DriverConfig::load_or_default();
    let sink: Box<dyn PersistenceSink> = match &config.save_path {
        Some(path) => Box::new(JsonFileSink::new(Path::new(path))),
        None => Box::new(MemorySink::default()),
    };
    let mut game =
        Game::new(config.tuning.clone(), sink, config.seed).with_settings(config.settings.clone());
    if let Some(path) = &config.settings_path {
        game = game.with_settings_path(path);
    }
    // Frame-time jitter source, separate from the simulation RNG
    let mut clock = Pcg32::seed_from_u64(config.seed ^ 0xF00D);

    for run in 0..config.runs {
        if let Err(e) = game.apply(Command::Start(config.difficulty)) {
            log::warn!("Could not start run {}: {}", run + 1, e);
            break;
        }

        let mut played = 0.0;
        while game.phase() == GamePhase::Play && played < config.seconds {
            let jitter = clock.random_range(0.8f32..1.6);
            let dt = (jitter / REFERENCE_HZ).min(MAX_FRAME_DT);
            let input = game
                .run()
                .map(TickInput::autopilot)
                .unwrap_or_default();
            game.update(dt, &input);
            played += dt;
        }
        if game.phase() == GamePhase::Play {
            log::info!("Run {} reached the time limit", run + 1);
            if let Err(e) = game.apply(Command::Finish) {
                log::warn!("Could not end run: {}", e);
            }
        }

        let hud = game.snapshot();
        let completed = hud.missions.iter().filter(|m| m.completed).count();
        log::info!(
            "Run {}: score {:.0}, coins {}, {:.1}s, missions {}/{}",
            run + 1,
            hud.score,
            hud.coins_collected,
            hud.elapsed,
            completed,
            hud.missions.len()
        );
        game.drain_events();
        if let Err(e) = game.apply(Command::Restart) {
            log::warn!("Could not restart: {}", e);
            break;
        }
    }

    let summary = serde_json::json!({
        "best_score": game.best_score(),
        "wallet": game.save().coins,
        "level": game.save().level,
        "achievements": game.save().achievements,
        "highscores": game.highscores(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not render summary: {}", e),
    }
}
