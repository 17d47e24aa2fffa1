//! Run state and core simulation types
//!
//! One `RunState` per run. It exclusively owns the player and every entity
//! collection; a new run replaces it wholesale.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{StatusEffects, VehicleModifiers};
use super::entity::{Coin, Obstacle, Player, PowerUpKind, PowerUpToken, VehicleCategory};
use super::mission::{Mission, default_missions};
use super::spawn::SpawnDirector;
use crate::LaneGrid;
use crate::tuning::{Difficulty, DifficultyProfile, Tuning};

/// Events emitted by a tick for renderers, audio and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Crash { lane: usize, category: VehicleCategory },
    CoinCollected { total: u32 },
    PowerUpCollected { kind: PowerUpKind },
    NearMiss { combo: u32 },
    MissionCompleted { index: usize, reward: u32 },
}

/// Everything needed to start a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub tuning: Tuning,
    pub missions: Vec<Mission>,
    pub modifiers: VehicleModifiers,
    pub vehicle: String,
    /// Lifetime currency carried into the run
    pub wallet: u64,
    /// Wet road: lane changes may overshoot
    pub slippery: bool,
}

impl RunConfig {
    /// Default tuning, quick-play missions, baseline vehicle
    pub fn quick(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            seed,
            difficulty,
            tuning: Tuning::default(),
            missions: default_missions(difficulty),
            modifiers: VehicleModifiers::default(),
            vehicle: "compact".to_string(),
            wallet: 0,
            slippery: false,
        }
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub difficulty: Difficulty,
    pub profile: DifficultyProfile,
    pub tuning: Tuning,
    pub modifiers: VehicleModifiers,
    pub grid: LaneGrid,
    pub slippery: bool,

    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub coins: Vec<Coin>,
    pub tokens: Vec<PowerUpToken>,

    pub spawner: SpawnDirector,
    pub effects: StatusEffects,
    pub missions: Vec<Mission>,

    /// Seconds of active play
    pub elapsed: f32,
    /// Scroll speed (px/s), ramps up over the run
    pub speed: f32,
    /// Road travelled (px, unslowed)
    pub distance: f32,
    pub score: f64,
    pub coins_collected: u32,
    /// Lifetime currency including this run's pickups
    pub wallet: u64,
    pub combo: u32,
    /// Best combo reached this run
    pub max_combo: u32,
    pub dead: bool,
    /// Lane dash offset for the renderer
    pub road_scroll: f32,

    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl RunState {
    pub fn new(config: RunConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let profile = *config.tuning.profile(config.difficulty);
        let spawner = SpawnDirector::new(&mut rng, &profile, &config.tuning);
        let grid = LaneGrid::default();
        log::info!(
            "Run start: {} (seed {}), {} missions",
            config.difficulty,
            config.seed,
            config.missions.len()
        );

        Self {
            seed: config.seed,
            rng,
            difficulty: config.difficulty,
            profile,
            tuning: config.tuning,
            modifiers: config.modifiers,
            grid,
            slippery: config.slippery,
            player: Player::new(&grid, config.vehicle),
            obstacles: Vec::new(),
            coins: Vec::new(),
            tokens: Vec::new(),
            spawner,
            effects: StatusEffects::default(),
            missions: config.missions,
            elapsed: 0.0,
            speed: profile.start_speed,
            distance: 0.0,
            score: 0.0,
            coins_collected: 0,
            wallet: config.wallet,
            combo: 0,
            max_combo: 0,
            dead: false,
            road_scroll: 0.0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn missions_completed(&self) -> usize {
        self.missions.iter().filter(|m| m.completed).count()
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_defaults() {
        let state = RunState::new(RunConfig::quick(Difficulty::Easy, 1));
        assert_eq!(state.speed, 220.0);
        assert_eq!(state.missions.len(), 3);
        assert!(state.obstacles.is_empty());
        assert!(!state.dead);
        assert!(state.spawner.obstacle_timer >= 0.9 && state.spawner.obstacle_timer <= 1.4);
        assert!(state.spawner.powerup_timer >= 6.0);
    }

    #[test]
    fn test_same_seed_same_timers() {
        let a = RunState::new(RunConfig::quick(Difficulty::Normal, 77));
        let b = RunState::new(RunConfig::quick(Difficulty::Normal, 77));
        assert_eq!(a.spawner.obstacle_timer, b.spawner.obstacle_timer);
        assert_eq!(a.spawner.coin_timer, b.spawner.coin_timer);
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = RunState::new(RunConfig::quick(Difficulty::Normal, 1));
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }
}
