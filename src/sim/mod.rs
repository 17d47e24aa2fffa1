//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, owned by the run
//! - Rates are per second and scaled by `dt`
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod flow;
pub mod mission;
pub mod motion;
pub mod spawn;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use effects::{StatusEffects, VehicleModifiers};
pub use entity::{Coin, Obstacle, Player, PowerUpKind, PowerUpToken, VehicleCategory};
pub use flow::{Command, GamePhase, Origin, transition};
pub use mission::{Mission, MissionCatalog, MissionDef, MissionKind, MissionSelection};
pub use motion::RoadEntity;
pub use spawn::{SpawnDirector, can_spawn_lane, weighted_index};
pub use state::{GameEvent, RunConfig, RunState};
pub use tick::{TickInput, tick};
