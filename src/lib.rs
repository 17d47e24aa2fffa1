//! Traffic Rush - A lane-based top-down traffic dodging arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, collisions, missions)
//! - `tuning`: Data-driven game balance
//! - `game`: Session controller (screens, run lifecycle, persistence checkpoints)
//! - `garage`: Vehicle unlocks and upgrades
//! - `persistence`: Save data and storage sinks

pub mod error;
pub mod game;
pub mod garage;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use game::{Game, HudSnapshot};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::{Difficulty, DifficultyProfile, Tuning};

/// Game configuration constants
pub mod consts {
    /// Reference frame rate the tuned per-tick probabilities were balanced at
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Largest frame delta the native driver feeds the simulation
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions
    pub const WIDTH: f32 = 480.0;
    pub const HEIGHT: f32 = 720.0;

    /// Lane grid
    pub const LANE_COUNT: usize = 6;
    pub const ROAD_MARGIN: f32 = 80.0;

    /// Player car
    pub const PLAYER_WIDTH: f32 = 45.0;
    pub const PLAYER_HEIGHT: f32 = 70.0;
    /// Player center line (fixed)
    pub const PLAYER_Y: f32 = HEIGHT - 120.0;

    /// Baseline traffic car size (other categories are sized relative to it)
    pub const ENEMY_WIDTH: f32 = 56.0;
    pub const ENEMY_HEIGHT: f32 = 98.0;

    pub const COIN_SIZE: f32 = 5.0;
    pub const POWERUP_SIZE: f32 = 10.0;

    /// Entities are culled once their top edge is this far below the screen
    pub const OFFSCREEN_MARGIN: f32 = 40.0;

    /// Road pixels per metre of distance travelled
    pub const PIXELS_PER_METRE: f32 = 10.0;

    /// Lane dash pattern (drives the road scroll cycle)
    pub const DASH_HEIGHT: f32 = 40.0;
    pub const DASH_GAP: f32 = 30.0;
}

/// Fixed horizontal lane centers, computed once from the road width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneGrid {
    centers: [f32; consts::LANE_COUNT],
}

impl LaneGrid {
    pub fn new(width: f32, margin: f32) -> Self {
        let road_w = width - 2.0 * margin;
        let halves = (2 * consts::LANE_COUNT) as f32;
        let mut centers = [0.0; consts::LANE_COUNT];
        for (i, c) in centers.iter_mut().enumerate() {
            // Multiply before dividing so whole-pixel centers stay exact
            *c = (margin + road_w * (2 * i + 1) as f32 / halves).floor();
        }
        Self { centers }
    }

    /// Center x of a lane. Out-of-range lanes clamp to the grid edge.
    #[inline]
    pub fn center(&self, lane: usize) -> f32 {
        self.centers[lane.min(consts::LANE_COUNT - 1)]
    }

    /// Clamp a signed lane index into the grid
    #[inline]
    pub fn clamp(lane: i32) -> usize {
        lane.clamp(0, consts::LANE_COUNT as i32 - 1) as usize
    }

    pub fn centers(&self) -> &[f32] {
        &self.centers
    }
}

impl Default for LaneGrid {
    fn default() -> Self {
        Self::new(consts::WIDTH, consts::ROAD_MARGIN)
    }
}
