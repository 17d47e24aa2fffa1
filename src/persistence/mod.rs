//! Save data and persistence sinks
//!
//! Features:
//! - Serde JSON save document with defaults for a fresh profile
//! - `PersistenceSink` trait so the session never touches storage directly
//! - Atomic file writes (tmp → save)
//! - Missing save loads defaults, corrupt save is reported

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Upgrade state for one garage vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub unlocked: bool,
    pub acceleration: u32,
    pub speed: u32,
    pub magnet: u32,
    pub duration: u32,
}

impl VehicleRecord {
    /// Unlocked with every stat at the baseline level
    pub fn starter() -> Self {
        Self {
            unlocked: true,
            acceleration: 1,
            speed: 1,
            magnet: 1,
            duration: 1,
        }
    }
}

/// Lifetime counters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub total_coins: u64,
    /// Runs finished
    pub missions_played: u32,
    pub missions_completed: u32,
    /// Metres driven across all runs
    pub distance_total: f64,
}

/// Achievement ids
pub const ACHIEVEMENT_COINS_100: &str = "coins_100";
pub const ACHIEVEMENT_MISSIONS_10: &str = "missions_10";
pub const ACHIEVEMENT_DISTANCE_5000: &str = "distance_5000";

/// Durable player progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// Spendable currency
    pub coins: u64,
    pub xp: u64,
    pub level: u32,
    pub selected_vehicle: String,
    pub vehicles: BTreeMap<String, VehicleRecord>,
    pub achievements: BTreeMap<String, bool>,
    pub stats: LifetimeStats,
}

impl Default for SaveData {
    fn default() -> Self {
        let vehicles = BTreeMap::from([
            ("compact".to_string(), VehicleRecord::starter()),
            ("sport".to_string(), VehicleRecord::default()),
            ("van".to_string(), VehicleRecord::default()),
        ]);
        let achievements = [
            ACHIEVEMENT_COINS_100,
            ACHIEVEMENT_MISSIONS_10,
            ACHIEVEMENT_DISTANCE_5000,
        ]
        .into_iter()
        .map(|id| (id.to_string(), false))
        .collect();

        Self {
            coins: 0,
            xp: 0,
            level: 1,
            selected_vehicle: "compact".to_string(),
            vehicles,
            achievements,
            stats: LifetimeStats::default(),
        }
    }
}

/// XP needed per level
pub const XP_PER_LEVEL: u64 = 1000;

impl SaveData {
    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Persistence(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(|e| SimError::Persistence(e.to_string()))
    }

    /// Fold a finished run into the lifetime record.
    ///
    /// Currency is not touched here; it is already synced from the run's
    /// wallet at every pickup.
    pub fn record_run(&mut self, coins: u32, missions_completed: u32, metres: f64, score: f64) {
        self.stats.total_coins += u64::from(coins);
        self.stats.missions_played += 1;
        self.stats.missions_completed += missions_completed;
        self.stats.distance_total += metres;
        self.xp += (score.max(0.0) / 10.0) as u64;
        self.level = 1 + (self.xp / XP_PER_LEVEL) as u32;
    }

    /// Unlock every achievement whose threshold is met. Returns the ids
    /// unlocked by this call.
    pub fn evaluate_achievements(&mut self) -> Vec<&'static str> {
        let checks = [
            (ACHIEVEMENT_COINS_100, self.stats.total_coins >= 100),
            (ACHIEVEMENT_MISSIONS_10, self.stats.missions_completed >= 10),
            (ACHIEVEMENT_DISTANCE_5000, self.stats.distance_total >= 5000.0),
        ];
        let mut unlocked = Vec::new();
        for (id, met) in checks {
            let entry = self.achievements.entry(id.to_string()).or_insert(false);
            if met && !*entry {
                *entry = true;
                unlocked.push(id);
                log::info!("Achievement unlocked: {}", id);
            }
        }
        unlocked
    }
}

/// Durable storage for `SaveData`
pub trait PersistenceSink {
    fn load(&mut self) -> Result<SaveData, SimError>;
    fn store(&mut self, data: &SaveData) -> Result<(), SimError>;
}

/// Keeps the last stored save in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub saved: Option<SaveData>,
    /// Number of successful stores
    pub writes: usize,
    /// Make every store fail (collaborator failure testing)
    pub fail_writes: bool,
}

impl PersistenceSink for MemorySink {
    fn load(&mut self) -> Result<SaveData, SimError> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn store(&mut self, data: &SaveData) -> Result<(), SimError> {
        if self.fail_writes {
            return Err(SimError::Persistence("memory sink refused write".into()));
        }
        self.saved = Some(data.clone());
        self.writes += 1;
        Ok(())
    }
}

/// Pretty JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl PersistenceSink for JsonFileSink {
    fn load(&mut self) -> Result<SaveData, SimError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => {
                let data = SaveData::from_json(&json)?;
                log::info!("Loaded save from {}", self.path.display());
                Ok(data)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No save at {}, starting fresh", self.path.display());
                Ok(SaveData::default())
            }
            Err(e) => Err(SimError::Persistence(e.to_string())),
        }
    }

    fn store(&mut self, data: &SaveData) -> Result<(), SimError> {
        let json = data.to_json()?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| SimError::Persistence(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| SimError::Persistence(e.to_string()))?;
        log::debug!("Saved progress to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_save(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("traffic_rush_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_fresh_profile() {
        let save = SaveData::default();
        assert_eq!(save.level, 1);
        assert_eq!(save.selected_vehicle, "compact");
        assert!(save.vehicles["compact"].unlocked);
        assert!(!save.vehicles["van"].unlocked);
        assert_eq!(save.vehicles["sport"].magnet, 0);
        assert_eq!(save.achievements.len(), 3);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let save = SaveData::from_json(r#"{"coins": 42}"#).unwrap();
        assert_eq!(save.coins, 42);
        assert_eq!(save.vehicles.len(), 3);
    }

    #[test]
    fn test_achievements_unlock_once() {
        let mut save = SaveData::default();
        save.record_run(120, 3, 800.0, 2500.0);
        assert_eq!(save.evaluate_achievements(), vec![ACHIEVEMENT_COINS_100]);
        assert!(save.evaluate_achievements().is_empty());
        assert_eq!(save.xp, 250);
        assert_eq!(save.stats.missions_played, 1);
    }

    #[test]
    fn test_level_follows_xp() {
        let mut save = SaveData::default();
        save.record_run(0, 0, 0.0, 25_000.0);
        assert_eq!(save.level, 3);
    }

    #[test]
    fn test_memory_sink_failure() {
        let mut sink = MemorySink {
            fail_writes: true,
            ..Default::default()
        };
        assert!(sink.store(&SaveData::default()).is_err());
        assert_eq!(sink.load().unwrap(), SaveData::default());
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn test_memory_sink_keeps_last_store() {
        let mut sink = MemorySink::default();
        let mut save = SaveData::default();
        sink.store(&save).unwrap();
        save.coins = 12;
        sink.store(&save).unwrap();
        assert_eq!(sink.writes, 2);
        assert_eq!(sink.load().unwrap().coins, 12);
    }

    #[test]
    fn test_json_sink_missing_file_loads_defaults() {
        let path = temp_save("missing");
        let _ = fs::remove_file(&path);
        let mut sink = JsonFileSink::new(&path);
        assert_eq!(sink.load().unwrap(), SaveData::default());
    }

    #[test]
    fn test_json_sink_stores_and_reloads() {
        let path = temp_save("roundtrip");
        let mut sink = JsonFileSink::new(&path);
        assert_eq!(sink.path(), path.as_path());
        let mut save = SaveData::default();
        save.coins = 315;
        save.selected_vehicle = "van".into();
        sink.store(&save).unwrap();
        assert!(sink.path().exists());
        assert!(!sink.tmp_path().exists());
        assert_eq!(JsonFileSink::new(&path).load().unwrap(), save);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_sink_reports_corruption() {
        let path = temp_save("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let mut sink = JsonFileSink::new(&path);
        assert!(matches!(sink.load(), Err(SimError::Persistence(_))));
        let _ = fs::remove_file(&path);
    }
}
