//! Timed status effects granted by power-up tokens

use serde::{Deserialize, Serialize};

use super::entity::PowerUpKind;

/// Stat modifiers derived from the selected vehicle's upgrade levels.
/// `Default` is the baseline (no upgrades).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleModifiers {
    /// Multiplier on every power-up duration
    pub effect_duration_scale: f32,
    /// Multiplier on the magnet pickup radius
    pub magnet_radius_scale: f32,
}

impl Default for VehicleModifiers {
    fn default() -> Self {
        Self {
            effect_duration_scale: 1.0,
            magnet_radius_scale: 1.0,
        }
    }
}

/// Countdown timers (seconds) for the three power-ups. A timer above zero
/// means the effect is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub slow_remaining: f32,
    pub ghost_remaining: f32,
    pub magnet_remaining: f32,
}

impl StatusEffects {
    /// Count every timer down by `dt`, flooring at zero
    pub fn tick(&mut self, dt: f32) {
        self.slow_remaining = (self.slow_remaining - dt).max(0.0);
        self.ghost_remaining = (self.ghost_remaining - dt).max(0.0);
        self.magnet_remaining = (self.magnet_remaining - dt).max(0.0);
    }

    /// Start (or restart) an effect. Picking up a kind that is already
    /// running resets its timer to `duration`; time does not stack.
    pub fn activate(&mut self, kind: PowerUpKind, duration: f32) {
        *self.timer_mut(kind) = duration;
    }

    pub fn remaining(&self, kind: PowerUpKind) -> f32 {
        match kind {
            PowerUpKind::Slow => self.slow_remaining,
            PowerUpKind::Ghost => self.ghost_remaining,
            PowerUpKind::Magnet => self.magnet_remaining,
        }
    }

    #[inline]
    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining(kind) > 0.0
    }

    /// Motion multiplier for this tick
    #[inline]
    pub fn motion_factor(&self, slow_factor: f32) -> f32 {
        if self.is_active(PowerUpKind::Slow) {
            slow_factor
        } else {
            1.0
        }
    }

    fn timer_mut(&mut self, kind: PowerUpKind) -> &mut f32 {
        match kind {
            PowerUpKind::Slow => &mut self.slow_remaining,
            PowerUpKind::Ghost => &mut self.ghost_remaining,
            PowerUpKind::Magnet => &mut self.magnet_remaining,
        }
    }
}
