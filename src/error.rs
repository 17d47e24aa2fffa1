//! Error type shared by the session, garage, tuning and persistence layers
//!
//! The simulation tick itself is infallible. Errors only arise from
//! configuration lookups and player commands, and every error leaves the
//! state it was raised against untouched.

use crate::sim::{Command, GamePhase};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("Mission index {index} out of range (catalog has {len})")]
    MissionIndexOutOfRange { index: usize, len: usize },
    #[error("Command {command:?} not allowed in phase {phase:?}")]
    InvalidTransition { phase: GamePhase, command: Command },
    #[error("{action} is only available on the {screen} screen (current phase {phase:?})")]
    WrongScreen {
        phase: GamePhase,
        screen: &'static str,
        action: &'static str,
    },
    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),
    #[error("Vehicle is locked: {0}")]
    VehicleLocked(String),
    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientCurrency { needed: u64, available: u64 },
    #[error("Upgrade already at max level: {0}")]
    MaxLevel(String),
    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}
