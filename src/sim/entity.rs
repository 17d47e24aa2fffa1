//! Road entities: the player car, traffic, coins and power-up tokens
//!
//! Plain data plus bounding boxes. Motion lives in `motion`, spawning in
//! `spawn`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::LaneGrid;
use crate::consts::*;

/// The player's car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub lane: usize,
    pub pos: Vec2,
    pub size: Vec2,
    /// Garage vehicle id (visual only inside the simulation)
    pub vehicle: String,
    /// Lane changes that actually moved the car this run
    pub lane_changes: u32,
}

impl Player {
    pub fn new(grid: &LaneGrid, vehicle: impl Into<String>) -> Self {
        let lane = LANE_COUNT / 2;
        Self {
            lane,
            pos: Vec2::new(grid.center(lane), PLAYER_Y),
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            vehicle: vehicle.into(),
            lane_changes: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    /// Shift lanes by `delta`, clamped to the road.
    ///
    /// On a slippery road an interior target overshoots by one lane with
    /// probability `slip_chance`. The RNG is only drawn from when the road is
    /// slippery.
    pub fn move_lane<R: Rng + ?Sized>(
        &mut self,
        delta: i32,
        grid: &LaneGrid,
        rng: &mut R,
        slip_chance: f64,
    ) {
        if delta == 0 {
            return;
        }
        let mut target = LaneGrid::clamp(self.lane as i32 + delta);
        let interior = target > 0 && target < LANE_COUNT - 1;
        if slip_chance > 0.0 && interior && rng.random_bool(slip_chance) {
            let skid = if rng.random_bool(0.5) { 1 } else { -1 };
            target = LaneGrid::clamp(target as i32 + skid);
        }
        if target != self.lane {
            self.lane_changes += 1;
        }
        self.lane = target;
        self.pos.x = grid.center(target);
    }
}

/// Traffic vehicle categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    Car,
    Van,
    Truck,
    Motorcycle,
}

/// Size, relative speed and spawn weight of a traffic category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySpec {
    pub size: Vec2,
    pub speed_mult: f32,
    pub weight: u32,
}

impl VehicleCategory {
    /// Spawn table order (weighted selection indexes into this)
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::Car,
        VehicleCategory::Van,
        VehicleCategory::Truck,
        VehicleCategory::Motorcycle,
    ];

    pub fn spec(&self) -> CategorySpec {
        match self {
            VehicleCategory::Car => CategorySpec {
                size: Vec2::new(ENEMY_WIDTH, ENEMY_HEIGHT),
                speed_mult: 1.0,
                weight: 55,
            },
            VehicleCategory::Van => CategorySpec {
                size: Vec2::new(ENEMY_WIDTH + 8.0, ENEMY_HEIGHT + 10.0),
                speed_mult: 0.95,
                weight: 22,
            },
            VehicleCategory::Truck => CategorySpec {
                size: Vec2::new(ENEMY_WIDTH + 14.0, ENEMY_HEIGHT + 10.0),
                speed_mult: 0.85,
                weight: 14,
            },
            VehicleCategory::Motorcycle => CategorySpec {
                size: Vec2::new(ENEMY_WIDTH - 18.0, ENEMY_HEIGHT - 30.0),
                speed_mult: 1.18,
                weight: 9,
            },
        }
    }

    pub fn weights() -> [u32; 4] {
        Self::ALL.map(|c| c.spec().weight)
    }
}

/// A traffic vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: usize,
    pub pos: Vec2,
    pub category: VehicleCategory,
    /// Set once the near-miss bonus was paid for this vehicle; never cleared
    pub near_miss_counted: bool,
}

impl Obstacle {
    /// New vehicle whose center sits one body length above the screen
    pub fn spawn(id: u32, lane: usize, category: VehicleCategory, grid: &LaneGrid) -> Self {
        let size = category.spec().size;
        Self {
            id,
            lane,
            pos: Vec2::new(grid.center(lane), -size.y),
            category,
            near_miss_counted: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.category.spec().size)
    }

    #[inline]
    pub fn speed_mult(&self) -> f32 {
        self.category.spec().speed_mult
    }
}

/// A coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub lane: usize,
    pub pos: Vec2,
    pub collected: bool,
}

impl Coin {
    pub fn spawn(id: u32, lane: usize, grid: &LaneGrid) -> Self {
        Self {
            id,
            lane,
            pos: Vec2::new(grid.center(lane), -COIN_SIZE),
            collected: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(COIN_SIZE))
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Everything on the road moves at reduced speed
    Slow,
    /// Traffic passes through the player
    Ghost,
    /// Nearby coins drift toward the player
    Magnet,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Slow, PowerUpKind::Ghost, PowerUpKind::Magnet];
}

/// A power-up token on the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpToken {
    pub id: u32,
    pub kind: PowerUpKind,
    pub lane: usize,
    pub pos: Vec2,
    /// Picked up this tick; removed on the next cull
    pub collected: bool,
}

impl PowerUpToken {
    pub fn spawn(id: u32, kind: PowerUpKind, lane: usize, grid: &LaneGrid) -> Self {
        Self {
            id,
            kind,
            lane,
            pos: Vec2::new(grid.center(lane), -POWERUP_SIZE),
            collected: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(POWERUP_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_player_starts_centered() {
        let grid = LaneGrid::default();
        let player = Player::new(&grid, "compact");
        assert_eq!(player.lane, 3);
        assert_eq!(player.pos, Vec2::new(grid.center(3), PLAYER_Y));
        assert_eq!(player.bounds().top(), PLAYER_Y - PLAYER_HEIGHT / 2.0);
    }

    #[test]
    fn test_move_lane_clamps_at_edges() {
        let grid = LaneGrid::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut player = Player::new(&grid, "compact");
        for _ in 0..10 {
            player.move_lane(-1, &grid, &mut rng, 0.0);
        }
        assert_eq!(player.lane, 0);
        assert_eq!(player.pos.x, grid.center(0));
        // 3 real moves, the rest were blocked by the road edge
        assert_eq!(player.lane_changes, 3);
    }

    #[test]
    fn test_slippery_road_overshoots_sometimes() {
        let grid = LaneGrid::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut skids = 0;
        for _ in 0..500 {
            let mut player = Player::new(&grid, "compact");
            player.move_lane(1, &grid, &mut rng, 0.18);
            assert!((3..=5).contains(&player.lane));
            if player.lane != 4 {
                skids += 1;
            }
        }
        assert!(skids > 30 && skids < 150, "skids = {skids}");
    }

    #[test]
    fn test_obstacle_spawns_above_screen() {
        let grid = LaneGrid::default();
        let truck = Obstacle::spawn(1, 2, VehicleCategory::Truck, &grid);
        assert_eq!(truck.pos.y, -108.0);
        assert!(truck.bounds().bottom() < 0.0);
        assert!(!truck.near_miss_counted);
    }

    #[test]
    fn test_category_table() {
        assert_eq!(VehicleCategory::weights(), [55, 22, 14, 9]);
        for c in VehicleCategory::ALL {
            assert!(c.spec().speed_mult > 0.0);
        }
    }
}
