//! Variable timestep simulation tick
//!
//! Advances a run by `dt` seconds. Ordering within a tick is fixed:
//! lane change, clock and speed, spawn, motion, cull, crash, pickups,
//! near-miss, combo decay, missions, road scroll.

use super::collision::{collect_coins, collect_powerups, decay_combo, detect_near_misses, resolve_crash};
use super::entity::PowerUpKind;
use super::mission::MissionView;
use super::motion::{MagnetPull, MotionContext, advance_all, cull};
use super::spawn::spawn_step;
use super::state::{GameEvent, RunState};
use crate::consts::{DASH_GAP, DASH_HEIGHT, LANE_COUNT};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Lane change request: -1 left, +1 right, 0 stay
    pub lane_shift: i32,
}

impl TickInput {
    pub fn left() -> Self {
        Self { lane_shift: -1 }
    }

    pub fn right() -> Self {
        Self { lane_shift: 1 }
    }

    /// Demo driver: steer toward the reachable lane with the most clear
    /// road ahead, staying put on ties.
    pub fn autopilot(state: &RunState) -> Self {
        let lane = state.player.lane;
        let mut best = (lane, lane_clearance(state, lane));
        for candidate in [lane.checked_sub(1), Some(lane + 1)].into_iter().flatten() {
            if candidate >= LANE_COUNT {
                continue;
            }
            let clearance = lane_clearance(state, candidate);
            if clearance > best.1 {
                best = (candidate, clearance);
            }
        }
        Self {
            lane_shift: best.0 as i32 - lane as i32,
        }
    }
}

/// Road between the player's front edge and the closest vehicle that has
/// not yet passed and would overlap the player driving in `lane`. Wide
/// vehicles reach into neighbouring lanes. Negative when a vehicle is
/// alongside.
fn lane_clearance(state: &RunState, lane: usize) -> f32 {
    let mut player = state.player.bounds();
    player.center.x = state.grid.center(lane);
    state
        .obstacles
        .iter()
        .map(|o| o.bounds())
        .filter(|b| b.left() < player.right() && b.right() > player.left())
        .filter(|b| b.top() < player.bottom())
        .map(|b| player.top() - b.bottom())
        .fold(f32::INFINITY, f32::min)
}

/// Advance the run by `dt` seconds. A dead run, or a negative or
/// non-finite `dt`, leaves the state untouched.
pub fn tick(state: &mut RunState, input: &TickInput, dt: f32) {
    if state.dead || !dt.is_finite() || dt < 0.0 {
        return;
    }

    // Steering
    let slip = if state.slippery {
        state.tuning.slippery_chance
    } else {
        0.0
    };
    state
        .player
        .move_lane(input.lane_shift, &state.grid, &mut state.rng, slip);

    // Clock and speed
    state.elapsed += dt;
    state.speed += state.profile.ramp_step(dt);
    state.effects.tick(dt);
    state.distance += state.speed * dt;
    state.score += f64::from(state.speed * dt / state.tuning.distance_score_divisor);

    spawn_step(state, dt);

    // Motion
    let factor = state.effects.motion_factor(state.tuning.slow_factor);
    let magnet = state.effects.is_active(PowerUpKind::Magnet).then(|| MagnetPull {
        target: state.player.pos,
        radius: state.tuning.magnet_radius * state.modifiers.magnet_radius_scale,
        rate: state.tuning.magnet_pull,
    });
    let ctx = MotionContext {
        dt,
        speed: state.speed,
        factor,
        magnet,
    };
    advance_all(&mut state.obstacles, &ctx);
    advance_all(&mut state.coins, &ctx);
    advance_all(&mut state.tokens, &ctx);

    cull(&mut state.obstacles);
    cull(&mut state.coins);
    cull(&mut state.tokens);

    if resolve_crash(state) {
        return;
    }
    collect_coins(state);
    collect_powerups(state);
    detect_near_misses(state);
    decay_combo(state, dt);

    update_missions(state, dt);

    state.road_scroll = (state.road_scroll + ctx.scroll()).rem_euclid(DASH_HEIGHT + DASH_GAP);
}

fn update_missions(state: &mut RunState, dt: f32) {
    let view = MissionView {
        dt,
        coins_collected: state.coins_collected,
        combo: state.max_combo,
    };
    let popup = state.tuning.mission_popup_secs;
    for (index, mission) in state.missions.iter_mut().enumerate() {
        mission.tick_popup(dt);
        if let Some(reward) = mission.update(&view, popup) {
            state.score += f64::from(reward);
            state.events.push(GameEvent::MissionCompleted { index, reward });
            log::info!("Mission complete: {} (+{})", mission.name, reward);
        }
    }
}
