//! Data-driven game balance
//!
//! Every tuned number the simulation uses lives here so balance passes can
//! be done from a JSON file without recompiling. Defaults are the shipped
//! values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Difficulty presets selectable from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(SimError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Speed and traffic density for one difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Scroll speed at run start (px/s)
    pub start_speed: f32,
    /// Scroll speed gained per minute of play
    pub speed_ramp: f32,
    /// Obstacle spawn interval range (seconds, before the elapsed-time ramp)
    pub spawn_interval: (f32, f32),
}

impl DifficultyProfile {
    /// Speed gained this tick
    #[inline]
    pub fn ramp_step(&self, dt: f32) -> f32 {
        (self.speed_ramp / 60.0) * dt
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub easy: DifficultyProfile,
    pub normal: DifficultyProfile,
    pub hard: DifficultyProfile,

    // === Spawning ===
    /// Minimum free road above the newest obstacle in a lane before another may spawn
    pub safe_spawn_gap: f32,
    /// (count, weight) table for how many obstacles spawn per wave
    pub spawn_count_weights: Vec<(u32, u32)>,
    /// Seconds of play over which the obstacle interval shrinks
    pub spawn_ramp_seconds: f32,
    /// Floor for the obstacle interval scale factor
    pub spawn_floor_factor: f32,
    pub coin_interval: (f32, f32),
    pub powerup_interval: (f32, f32),

    // === Status effects ===
    pub slow_factor: f32,
    pub slow_duration: f32,
    pub ghost_duration: f32,
    pub magnet_duration: f32,
    pub magnet_radius: f32,
    /// Magnet pull speed (px/s)
    pub magnet_pull: f32,

    // === Scoring ===
    /// Distance score = speed * dt / divisor
    pub distance_score_divisor: f32,
    pub coin_base_score: f32,
    pub coin_combo_score: f32,
    pub near_miss_window: f32,
    pub near_miss_base_score: f32,
    pub near_miss_combo_score: f32,
    /// Chance per reference-rate tick that the combo drops by one
    pub combo_decay_chance: f64,

    // === Misc ===
    pub mission_popup_secs: f32,
    /// Chance a lane change overshoots on a wet road
    pub slippery_chance: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            easy: DifficultyProfile {
                start_speed: 220.0,
                speed_ramp: 22.0,
                spawn_interval: (0.9, 1.4),
            },
            normal: DifficultyProfile {
                start_speed: 260.0,
                speed_ramp: 28.0,
                spawn_interval: (0.7, 1.2),
            },
            hard: DifficultyProfile {
                start_speed: 300.0,
                speed_ramp: 34.0,
                spawn_interval: (0.55, 1.0),
            },

            safe_spawn_gap: 140.0,
            spawn_count_weights: vec![(1, 1), (2, 2), (3, 1)],
            spawn_ramp_seconds: 120.0,
            spawn_floor_factor: 0.55,
            coin_interval: (1.2, 2.2),
            powerup_interval: (6.0, 10.0),

            slow_factor: 0.55,
            slow_duration: 4.0,
            ghost_duration: 3.0,
            magnet_duration: 6.0,
            magnet_radius: 160.0,
            magnet_pull: 240.0,

            distance_score_divisor: 10.0,
            coin_base_score: 50.0,
            coin_combo_score: 5.0,
            near_miss_window: 26.0,
            near_miss_base_score: 20.0,
            near_miss_combo_score: 10.0,
            combo_decay_chance: 0.01,

            mission_popup_secs: 2.0,
            slippery_chance: 0.18,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| SimError::InvalidTuning(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Normal => &self.normal,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Look up a profile by its menu name
    pub fn profile_by_name(&self, name: &str) -> Result<&DifficultyProfile, SimError> {
        let difficulty: Difficulty = name.parse()?;
        Ok(self.profile(difficulty))
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        for d in Difficulty::ALL {
            let p = self.profile(d);
            if p.start_speed <= 0.0 || p.speed_ramp < 0.0 {
                return Err(SimError::InvalidTuning(format!("{d}: speeds must be positive")));
            }
            check_interval(&format!("{d} spawn_interval"), p.spawn_interval)?;
        }
        check_interval("coin_interval", self.coin_interval)?;
        check_interval("powerup_interval", self.powerup_interval)?;

        if self.spawn_count_weights.iter().map(|&(_, w)| w).sum::<u32>() == 0 {
            return Err(SimError::InvalidTuning("spawn_count_weights has no weight".into()));
        }
        if self.safe_spawn_gap < 0.0 || self.spawn_ramp_seconds <= 0.0 {
            return Err(SimError::InvalidTuning("spawn gap/ramp out of range".into()));
        }
        if !(0.0..=1.0).contains(&self.spawn_floor_factor) || self.spawn_floor_factor == 0.0 {
            return Err(SimError::InvalidTuning("spawn_floor_factor must be in (0, 1]".into()));
        }
        if self.slow_factor <= 0.0 || self.distance_score_divisor <= 0.0 {
            return Err(SimError::InvalidTuning("factors must be positive".into()));
        }
        for (name, p) in [
            ("combo_decay_chance", self.combo_decay_chance),
            ("slippery_chance", self.slippery_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidTuning(format!("{name} must be in [0, 1]")));
            }
        }
        Ok(())
    }
}

fn check_interval(name: &str, (lo, hi): (f32, f32)) -> Result<(), SimError> {
    if lo <= 0.0 || hi < lo {
        return Err(SimError::InvalidTuning(format!("{name}: bad range ({lo}, {hi})")));
    }
    Ok(())
}
