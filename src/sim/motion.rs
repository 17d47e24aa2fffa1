//! Per-tick motion and culling of road entities

use glam::Vec2;

use super::aabb::Aabb;
use super::entity::{Coin, Obstacle, PowerUpToken};
use crate::consts::{HEIGHT, OFFSCREEN_MARGIN};

/// Magnet pull parameters for this tick
#[derive(Debug, Clone, Copy)]
pub struct MagnetPull {
    /// Player center coins are pulled toward
    pub target: Vec2,
    pub radius: f32,
    /// Pull speed (px/s)
    pub rate: f32,
}

/// Everything an entity needs to advance one tick
#[derive(Debug, Clone, Copy)]
pub struct MotionContext {
    pub dt: f32,
    /// Current scroll speed (px/s)
    pub speed: f32,
    /// Slow-motion multiplier (1.0 when the effect is off)
    pub factor: f32,
    /// Set while the magnet effect is active
    pub magnet: Option<MagnetPull>,
}

impl MotionContext {
    /// Base downward displacement for this tick
    #[inline]
    pub fn scroll(&self) -> f32 {
        self.speed * self.factor * self.dt
    }
}

/// Common interface of everything that scrolls down the road
pub trait RoadEntity {
    fn bounds(&self) -> Aabb;

    fn advance(&mut self, ctx: &MotionContext);

    /// Past the bottom of the screen by the cull margin
    fn is_off_screen(&self) -> bool {
        self.bounds().top() > HEIGHT + OFFSCREEN_MARGIN
    }

    /// Consumed by the player and waiting to be removed
    fn is_spent(&self) -> bool {
        false
    }
}

impl RoadEntity for Obstacle {
    fn bounds(&self) -> Aabb {
        Obstacle::bounds(self)
    }

    fn advance(&mut self, ctx: &MotionContext) {
        self.pos.y += ctx.scroll() * self.speed_mult();
    }
}

impl RoadEntity for Coin {
    fn bounds(&self) -> Aabb {
        Coin::bounds(self)
    }

    fn advance(&mut self, ctx: &MotionContext) {
        if let Some(magnet) = ctx.magnet {
            self.pos = apply_magnet(self.pos, magnet.target, ctx.dt, magnet.radius, magnet.rate);
        }
        self.pos.y += ctx.scroll();
    }

    fn is_spent(&self) -> bool {
        self.collected
    }
}

impl RoadEntity for PowerUpToken {
    fn bounds(&self) -> Aabb {
        PowerUpToken::bounds(self)
    }

    fn advance(&mut self, ctx: &MotionContext) {
        self.pos.y += ctx.scroll();
    }

    fn is_spent(&self) -> bool {
        self.collected
    }
}

/// Drag `pos` toward `target` by `rate * dt` if it is within `radius`.
///
/// The step never overshoots the target. Points closer than one unit are
/// left alone so the direction stays well defined.
pub fn apply_magnet(pos: Vec2, target: Vec2, dt: f32, radius: f32, rate: f32) -> Vec2 {
    let delta = target - pos;
    let dist = delta.length();
    if dist >= radius || dist <= 1.0 {
        return pos;
    }
    let step = (rate * dt).min(dist);
    pos + delta / dist * step
}

/// Advance every entity in a collection
pub fn advance_all<E: RoadEntity>(entities: &mut [E], ctx: &MotionContext) {
    for e in entities.iter_mut() {
        e.advance(ctx);
    }
}

/// Drop entities that left the screen or were consumed
pub fn cull<E: RoadEntity>(entities: &mut Vec<E>) {
    entities.retain(|e| !e.is_off_screen() && !e.is_spent());
}
