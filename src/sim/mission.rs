//! Run missions: objectives evaluated against live run state
//!
//! A mission observes the run read-only and only writes back once, when it
//! completes and pays its reward into the score.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::tuning::Difficulty;

/// What a mission measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    /// Seconds survived this run
    Survive,
    /// Coins collected this run
    Coins,
    /// Best near-miss combo reached this run
    Combo,
}

/// Catalog entry for a mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDef {
    pub name: String,
    pub kind: MissionKind,
    pub target: u32,
    pub reward: u32,
    pub description: String,
}

impl MissionDef {
    fn new(name: &str, kind: MissionKind, target: u32, reward: u32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target,
            reward,
            description: description.to_string(),
        }
    }
}

/// Live run values a mission can observe
#[derive(Debug, Clone, Copy)]
pub struct MissionView {
    pub dt: f32,
    pub coins_collected: u32,
    pub combo: u32,
}

/// An active mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub name: String,
    pub kind: MissionKind,
    pub target: u32,
    pub reward: u32,
    pub progress: f32,
    pub completed: bool,
    /// Seconds left on the "mission complete" banner
    pub popup_remaining: f32,
}

impl Mission {
    pub fn new(kind: MissionKind, target: u32, reward: u32) -> Self {
        let mut mission = Self {
            name: String::new(),
            kind,
            target,
            reward,
            progress: 0.0,
            completed: false,
            popup_remaining: 0.0,
        };
        mission.name = mission.label();
        mission
    }

    pub fn from_def(def: &MissionDef) -> Self {
        Self {
            name: def.name.clone(),
            ..Self::new(def.kind, def.target, def.reward)
        }
    }

    /// HUD label
    pub fn label(&self) -> String {
        match self.kind {
            MissionKind::Survive => format!("Survive {}s", self.target),
            MissionKind::Coins => format!("Collect {} coins", self.target),
            MissionKind::Combo => format!("Near-miss combo x{}", self.target),
        }
    }

    /// Advance progress. Returns the reward when the mission completes on
    /// this call; completed missions never progress or pay again.
    pub fn update(&mut self, view: &MissionView, popup_secs: f32) -> Option<u32> {
        if self.completed {
            return None;
        }
        match self.kind {
            MissionKind::Survive => self.progress += view.dt,
            MissionKind::Coins => self.progress = self.progress.max(view.coins_collected as f32),
            MissionKind::Combo => self.progress = self.progress.max(view.combo as f32),
        }
        if self.progress >= self.target as f32 {
            self.completed = true;
            self.popup_remaining = popup_secs;
            return Some(self.reward);
        }
        None
    }

    /// Count the completion banner down
    pub fn tick_popup(&mut self, dt: f32) {
        if self.popup_remaining > 0.0 {
            self.popup_remaining = (self.popup_remaining - dt).max(0.0);
        }
    }
}

/// Default quick-play trio for a difficulty
pub fn default_missions(difficulty: Difficulty) -> Vec<Mission> {
    let table: [(MissionKind, u32, u32); 3] = match difficulty {
        Difficulty::Easy => [
            (MissionKind::Survive, 30, 200),
            (MissionKind::Coins, 10, 150),
            (MissionKind::Combo, 3, 150),
        ],
        Difficulty::Normal => [
            (MissionKind::Survive, 45, 300),
            (MissionKind::Coins, 15, 250),
            (MissionKind::Combo, 4, 250),
        ],
        Difficulty::Hard => [
            (MissionKind::Survive, 60, 400),
            (MissionKind::Coins, 20, 300),
            (MissionKind::Combo, 6, 350),
        ],
    };
    table
        .into_iter()
        .map(|(kind, target, reward)| Mission::new(kind, target, reward))
        .collect()
}

/// Ordered list of selectable missions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionCatalog {
    pub defs: Vec<MissionDef>,
}

impl Default for MissionCatalog {
    fn default() -> Self {
        use MissionKind::*;
        Self {
            defs: vec![
                MissionDef::new("Endurance 60", Survive, 60, 400, "Survive for 60 seconds."),
                MissionDef::new("Coin Collector 20", Coins, 20, 300, "Collect 20 coins in one run."),
                MissionDef::new("Combo x6", Combo, 6, 350, "Reach a near-miss combo of x6."),
                MissionDef::new("Endurance 90", Survive, 90, 650, "Survive for 90 seconds."),
                MissionDef::new("Coin Collector 35", Coins, 35, 520, "Collect 35 coins in one run."),
                MissionDef::new("Combo x8", Combo, 8, 600, "Hit a near-miss combo of x8."),
            ],
        }
    }
}

impl MissionCatalog {
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Catalog indices offered as a preset for a difficulty
    pub fn preset_indices(&self, difficulty: Difficulty) -> Vec<usize> {
        let n = self.defs.len();
        let range = match difficulty {
            Difficulty::Easy => 0..3.min(n),
            Difficulty::Normal => 0..4.min(n),
            Difficulty::Hard => n.saturating_sub(3)..n,
        };
        range.collect()
    }

    /// Instantiate missions for the given catalog indices.
    /// Any out-of-range index rejects the whole selection.
    pub fn instantiate(&self, indices: &[usize]) -> Result<Vec<Mission>, SimError> {
        indices
            .iter()
            .map(|&index| {
                self.defs
                    .get(index)
                    .map(Mission::from_def)
                    .ok_or(SimError::MissionIndexOutOfRange {
                        index,
                        len: self.defs.len(),
                    })
            })
            .collect()
    }
}

/// Which missions the next run starts with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MissionSelection {
    /// The difficulty's default trio
    #[default]
    QuickPlay,
    /// The catalog preset for the run's difficulty
    Preset,
    /// Explicit catalog indices (validated when chosen)
    Custom(Vec<usize>),
    /// No missions
    Endless,
}

impl MissionSelection {
    pub fn build(
        &self,
        catalog: &MissionCatalog,
        difficulty: Difficulty,
    ) -> Result<Vec<Mission>, SimError> {
        match self {
            MissionSelection::QuickPlay => Ok(default_missions(difficulty)),
            MissionSelection::Preset => catalog.instantiate(&catalog.preset_indices(difficulty)),
            MissionSelection::Custom(indices) => catalog.instantiate(indices),
            MissionSelection::Endless => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(dt: f32, coins: u32, combo: u32) -> MissionView {
        MissionView {
            dt,
            coins_collected: coins,
            combo,
        }
    }

    #[test]
    fn test_survive_accumulates_time() {
        let mut m = Mission::new(MissionKind::Survive, 2, 100);
        assert_eq!(m.update(&view(1.0, 0, 0), 2.0), None);
        assert_eq!(m.update(&view(1.0, 0, 0), 2.0), Some(100));
        assert!(m.completed);
        assert_eq!(m.popup_remaining, 2.0);
        // Completed missions freeze
        assert_eq!(m.update(&view(1.0, 0, 0), 2.0), None);
        assert_eq!(m.progress, 2.0);
    }

    #[test]
    fn test_combo_tracks_best_not_current() {
        let mut m = Mission::new(MissionKind::Combo, 5, 50);
        m.update(&view(0.1, 0, 3), 2.0);
        m.update(&view(0.1, 0, 1), 2.0);
        assert_eq!(m.progress, 3.0);
        assert!(!m.completed);
    }

    #[test]
    fn test_coins_mirror_count() {
        let mut m = Mission::new(MissionKind::Coins, 5, 250);
        assert_eq!(m.update(&view(0.1, 4, 0), 2.0), None);
        assert_eq!(m.progress, 4.0);
        assert_eq!(m.update(&view(0.1, 5, 0), 2.0), Some(250));
    }

    #[test]
    fn test_popup_counts_down() {
        let mut m = Mission::new(MissionKind::Coins, 1, 10);
        m.update(&view(0.0, 1, 0), 2.0);
        m.tick_popup(0.5);
        assert_eq!(m.popup_remaining, 1.5);
        m.tick_popup(5.0);
        assert_eq!(m.popup_remaining, 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Mission::new(MissionKind::Survive, 45, 0).label(), "Survive 45s");
        assert_eq!(Mission::new(MissionKind::Coins, 15, 0).name, "Collect 15 coins");
        assert_eq!(Mission::new(MissionKind::Combo, 4, 0).label(), "Near-miss combo x4");
    }

    #[test]
    fn test_catalog_presets() {
        let catalog = MissionCatalog::default();
        assert_eq!(catalog.preset_indices(Difficulty::Easy), vec![0, 1, 2]);
        assert_eq!(catalog.preset_indices(Difficulty::Normal), vec![0, 1, 2, 3]);
        assert_eq!(catalog.preset_indices(Difficulty::Hard), vec![3, 4, 5]);
        let hard = MissionSelection::Preset.build(&catalog, Difficulty::Hard).unwrap();
        assert_eq!(hard[0].name, "Endurance 90");
        assert_eq!(hard[2].target, 8);
    }

    #[test]
    fn test_out_of_range_selection_rejected() {
        let catalog = MissionCatalog::default();
        assert_eq!(
            catalog.instantiate(&[0, 9]),
            Err(SimError::MissionIndexOutOfRange { index: 9, len: 6 })
        );
    }

    #[test]
    fn test_endless_has_no_missions() {
        let catalog = MissionCatalog::default();
        assert!(MissionSelection::Endless.build(&catalog, Difficulty::Easy).unwrap().is_empty());
        assert_eq!(MissionSelection::QuickPlay.build(&catalog, Difficulty::Hard).unwrap().len(), 3);
    }
}
