//! Spawn director
//!
//! Three independent countdowns decide when traffic, coins and power-up
//! tokens enter the road. Traffic placement enforces the safe-gap rule: a
//! lane only receives a new vehicle once every vehicle already in it has
//! cleared `safe_spawn_gap` of road below the spawn point.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::entity::{Coin, Obstacle, PowerUpKind, PowerUpToken, VehicleCategory};
use super::state::RunState;
use crate::consts::{ENEMY_HEIGHT, LANE_COUNT};
use crate::tuning::{DifficultyProfile, Tuning};

/// Per-category spawn countdowns (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnDirector {
    pub obstacle_timer: f32,
    pub coin_timer: f32,
    pub powerup_timer: f32,
    /// Spawning can be switched off for scripted scenarios
    pub enabled: bool,
}

impl SpawnDirector {
    /// Seed all three timers from their intervals
    pub fn new<R: Rng + ?Sized>(rng: &mut R, profile: &DifficultyProfile, tuning: &Tuning) -> Self {
        Self {
            obstacle_timer: uniform(rng, profile.spawn_interval),
            coin_timer: uniform(rng, tuning.coin_interval),
            powerup_timer: uniform(rng, tuning.powerup_interval),
            enabled: true,
        }
    }
}

/// Pick an index with probability proportional to its weight.
///
/// Returns `None` when the table carries no weight.
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[u32]) -> Option<usize> {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if roll < w {
            return Some(i);
        }
        roll -= w;
    }
    None
}

/// Whether a new vehicle may enter `lane` without crowding the one ahead.
///
/// Checks the vehicle nearest the spawn point. Checking only the one
/// farthest down the lane would let a second spawn land right behind a fresh
/// one while an older vehicle is still far ahead.
pub fn can_spawn_lane(obstacles: &[Obstacle], lane: usize, safe_gap: f32) -> bool {
    obstacles
        .iter()
        .filter(|o| o.lane == lane)
        .map(|o| o.pos.y)
        .min_by(f32::total_cmp)
        .is_none_or(|nearest_y| nearest_y - ENEMY_HEIGHT > safe_gap)
}

/// Obstacle interval scale: shrinks linearly with play time down to a floor
pub fn interval_scale(elapsed: f32, tuning: &Tuning) -> f32 {
    (1.0 - elapsed / tuning.spawn_ramp_seconds).max(tuning.spawn_floor_factor)
}

#[inline]
fn uniform<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Run the spawn countdowns for one tick
pub fn spawn_step(state: &mut RunState, dt: f32) {
    if !state.spawner.enabled {
        return;
    }

    state.spawner.obstacle_timer -= dt;
    if state.spawner.obstacle_timer <= 0.0 {
        spawn_traffic(state);
        let base = uniform(&mut state.rng, state.profile.spawn_interval);
        state.spawner.obstacle_timer = base * interval_scale(state.elapsed, &state.tuning);
    }

    state.spawner.coin_timer -= dt;
    if state.spawner.coin_timer <= 0.0 {
        let lane = state.rng.random_range(0..LANE_COUNT);
        let id = state.next_entity_id();
        state.coins.push(Coin::spawn(id, lane, &state.grid));
        state.spawner.coin_timer = uniform(&mut state.rng, state.tuning.coin_interval);
    }

    state.spawner.powerup_timer -= dt;
    if state.spawner.powerup_timer <= 0.0 {
        let lane = state.rng.random_range(0..LANE_COUNT);
        let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
        let id = state.next_entity_id();
        state.tokens.push(PowerUpToken::spawn(id, kind, lane, &state.grid));
        log::debug!("Power-up {:?} spawned in lane {}", kind, lane);
        state.spawner.powerup_timer = uniform(&mut state.rng, state.tuning.powerup_interval);
    }
}

/// Spawn a wave of 1-3 vehicles into distinct lanes that pass the gap check.
/// Blocked lanes are skipped, so a fully blocked road spawns nothing.
fn spawn_traffic(state: &mut RunState) {
    let counts: Vec<u32> = state.tuning.spawn_count_weights.iter().map(|&(_, w)| w).collect();
    let wanted = weighted_index(&mut state.rng, &counts)
        .map(|i| state.tuning.spawn_count_weights[i].0)
        .unwrap_or(1) as usize;

    let mut lanes: [usize; LANE_COUNT] = std::array::from_fn(|i| i);
    lanes.shuffle(&mut state.rng);

    let mut spawned = 0;
    for lane in lanes {
        if spawned >= wanted {
            break;
        }
        if !can_spawn_lane(&state.obstacles, lane, state.tuning.safe_spawn_gap) {
            continue;
        }
        let category = weighted_index(&mut state.rng, &VehicleCategory::weights())
            .map(|i| VehicleCategory::ALL[i])
            .unwrap_or(VehicleCategory::Car);
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::spawn(id, lane, category, &state.grid));
        spawned += 1;
    }

    if spawned < wanted {
        log::debug!("Traffic wave: spawned {} of {} (lanes blocked)", spawned, wanted);
    }
}
