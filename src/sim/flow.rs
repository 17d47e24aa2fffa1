//! Screen flow state machine
//!
//! Transitions are a pure function of (phase, command) so the flow can be
//! tested without any input devices.

use serde::{Deserialize, Serialize};

use crate::tuning::Difficulty;

/// Screen an overlay was opened from, and returns to when closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Menu,
    Pause,
}

/// Current top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Menu,
    /// Simulation running
    Play,
    Pause,
    Settings(Origin),
    /// Mission selection
    Missions,
    Garage(Origin),
    GameOver,
}

impl GamePhase {
    /// Only PLAY advances the simulation
    #[inline]
    pub fn is_simulating(&self) -> bool {
        matches!(self, GamePhase::Play)
    }
}

/// Abstract input commands driving the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start(Difficulty),
    Pause,
    Resume,
    OpenSettings,
    CloseSettings,
    OpenMissions,
    CloseMissions,
    OpenGarage,
    CloseGarage,
    /// Raised by the simulation when the player hits traffic
    Crash,
    /// End the run without a crash (time limit, quit to results)
    Finish,
    Restart,
}

/// Next phase for `command`, or `None` when the command does not apply
pub fn transition(phase: GamePhase, command: Command) -> Option<GamePhase> {
    use GamePhase as P;

    let next = match (phase, command) {
        (P::Menu | P::Missions, Command::Start(_)) => P::Play,
        (P::Play, Command::Pause) => P::Pause,
        (P::Pause, Command::Resume) => P::Play,
        (P::Play, Command::Crash | Command::Finish) => P::GameOver,
        (P::GameOver, Command::Restart) => P::Menu,

        (P::Menu, Command::OpenSettings) => P::Settings(Origin::Menu),
        (P::Pause, Command::OpenSettings) => P::Settings(Origin::Pause),
        (P::Settings(origin), Command::CloseSettings) => origin.into(),

        (P::Menu, Command::OpenGarage) => P::Garage(Origin::Menu),
        (P::Pause, Command::OpenGarage) => P::Garage(Origin::Pause),
        (P::Garage(origin), Command::CloseGarage) => origin.into(),

        (P::Menu, Command::OpenMissions) => P::Missions,
        (P::Missions, Command::CloseMissions) => P::Menu,

        _ => return None,
    };
    Some(next)
}

impl From<Origin> for GamePhase {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Menu => GamePhase::Menu,
            Origin::Pause => GamePhase::Pause,
        }
    }
}
