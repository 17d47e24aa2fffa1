//! Crash, pickup and near-miss evaluation
//!
//! Runs after motion each tick, against the player's current box.

use rand::Rng;

use super::entity::PowerUpKind;
use super::motion::RoadEntity;
use super::state::{GameEvent, RunState};
use crate::consts::REFERENCE_HZ;

/// Index of the first vehicle overlapping the player, ignoring ghost mode
pub fn first_overlap(state: &RunState) -> Option<usize> {
    let player = state.player.bounds();
    state
        .obstacles
        .iter()
        .position(|o| RoadEntity::bounds(o).intersects(&player))
}

/// End the run if the player hit traffic. Ghost mode makes the player
/// immune. Returns true when the run ended this tick.
pub fn resolve_crash(state: &mut RunState) -> bool {
    if state.effects.is_active(PowerUpKind::Ghost) {
        return false;
    }
    let Some(idx) = first_overlap(state) else {
        return false;
    };
    let hit = &state.obstacles[idx];
    state.dead = true;
    state.events.push(GameEvent::Crash {
        lane: hit.lane,
        category: hit.category,
    });
    log::info!(
        "Crash into {:?} in lane {} after {:.1}s, score {:.0}",
        hit.category,
        hit.lane,
        state.elapsed,
        state.score
    );
    true
}

/// Collect every coin touching the player
pub fn collect_coins(state: &mut RunState) {
    let player = state.player.bounds();
    for coin in state.coins.iter_mut().filter(|c| !c.collected) {
        if !coin.bounds().intersects(&player) {
            continue;
        }
        coin.collected = true;
        state.coins_collected += 1;
        state.wallet += 1;
        state.score += f64::from(
            state.tuning.coin_base_score + state.tuning.coin_combo_score * state.combo as f32,
        );
        state.events.push(GameEvent::CoinCollected {
            total: state.coins_collected,
        });
    }
}

/// Collect every power-up token touching the player. Each pickup resets
/// the timer of its kind.
pub fn collect_powerups(state: &mut RunState) {
    let player = state.player.bounds();
    for token in state.tokens.iter_mut().filter(|t| !t.collected) {
        if !token.bounds().intersects(&player) {
            continue;
        }
        token.collected = true;
        let base = match token.kind {
            PowerUpKind::Slow => state.tuning.slow_duration,
            PowerUpKind::Ghost => state.tuning.ghost_duration,
            PowerUpKind::Magnet => state.tuning.magnet_duration,
        };
        state
            .effects
            .activate(token.kind, base * state.modifiers.effect_duration_scale);
        state.events.push(GameEvent::PowerUpCollected { kind: token.kind });
    }
}

/// Reward vehicles in the player's lane whose front edge is within the
/// near-miss window above the player's front edge. Each vehicle pays out
/// at most once.
pub fn detect_near_misses(state: &mut RunState) {
    let player = state.player.bounds();
    let window = state.tuning.near_miss_window;
    for obstacle in state.obstacles.iter_mut() {
        if obstacle.near_miss_counted || obstacle.lane != state.player.lane {
            continue;
        }
        let gap = player.top() - obstacle.bounds().bottom();
        if gap > 0.0 && gap < window {
            obstacle.near_miss_counted = true;
            state.combo += 1;
            state.max_combo = state.max_combo.max(state.combo);
            state.score += f64::from(
                state.tuning.near_miss_base_score
                    + state.tuning.near_miss_combo_score * state.combo as f32,
            );
            state.events.push(GameEvent::NearMiss { combo: state.combo });
        }
    }
}

/// Random streak loss. The tuned chance is per tick at the reference rate;
/// it is rescaled so the decay rate per second does not depend on `dt`.
pub fn decay_combo(state: &mut RunState, dt: f32) {
    if dt.is_nan() || dt <= 0.0 || state.combo == 0 {
        return;
    }
    let p = decay_probability(state.tuning.combo_decay_chance, dt);
    if state.rng.random_bool(p) {
        state.combo -= 1;
    }
}

/// Chance of at least one decay event over `dt` seconds
pub fn decay_probability(per_tick: f64, dt: f32) -> f64 {
    let ticks = f64::from(dt) * f64::from(REFERENCE_HZ);
    (1.0 - (1.0 - per_tick).powf(ticks)).clamp(0.0, 1.0)
}
