//! JSON snapshot of a pool: the seed for [`super::InMemoryStorage`] and the
//! file format the CLI works on.

use super::AuditEntry;
use crate::error::StorageError;
use crate::models::{
    Bet, ChampionshipPick, ChampionshipResult, Driver, Event, OfficialResult, Participant,
    ParticipantId, Roster, Season,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissCount {
    pub participant: ParticipantId,
    pub season: Season,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonSnapshot {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub bets: Vec<Bet>,
    /// Validated on load: malformed position maps are rejected
    #[serde(default)]
    pub results: Vec<OfficialResult>,
    #[serde(default)]
    pub picks: Vec<ChampionshipPick>,
    #[serde(default)]
    pub championship_results: Vec<ChampionshipResult>,
    #[serde(default)]
    pub miss_counts: Vec<MissCount>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

impl SeasonSnapshot {
    pub fn from_json(content: &str) -> Result<Self, StorageError> {
        serde_json::from_str(content).map_err(|e| StorageError::Format(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Format(e.to_string()))
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.drivers.iter().cloned())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let snapshot = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            events = snapshot.events.len(),
            bets = snapshot.bets.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Write to a temp file next to `path`, then rename over it
    pub fn save_to_path(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let data = self.to_json()?;
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
            file.write_all(data.as_bytes()).map_err(|e| io_error(&temp_path, e))?;
            file.sync_all().map_err(|e| io_error(&temp_path, e))?;
        }
        fs::rename(&temp_path, path).map_err(|e| io_error(path, e))?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Saved snapshot");
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io { path: path.display().to_string(), reason: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, Storage};

    const SNAPSHOT: &str = r#"{
        "drivers": [
            {"id": "VER", "name": "Verstappen", "team": "Red Bull"},
            {"id": "HAM", "name": "Hamilton", "team": "Ferrari", "active": false}
        ],
        "participants": [{"id": 1, "name": "Ana"}],
        "events": [
            {"id": 1, "season": 2025, "name": "Australia", "date": "2025-03-16",
             "start_time": "01:00", "format": "Normal"}
        ],
        "results": [
            {"event": 1, "positions": {
                "1": "VER", "2": "HAM", "3": "C", "4": "D", "5": "E",
                "6": "F", "7": "G", "8": "H", "9": "I", "10": "J", "11": "VER"}}
        ]
    }"#;

    #[test]
    fn test_snapshot_defaults_and_roster() {
        let snapshot = SeasonSnapshot::from_json(SNAPSHOT).unwrap();
        assert!(snapshot.bets.is_empty());
        assert!(snapshot.participants[0].active);

        let roster = snapshot.roster();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.active_team(&"VER".into()), Some("Red Bull"));
        assert_eq!(roster.active_team(&"HAM".into()), None);
    }

    #[test]
    fn test_malformed_result_rejected() {
        let broken = SNAPSHOT.replace(r#""10": "J""#, r#""10": "VER""#);
        let err = SeasonSnapshot::from_json(&broken).unwrap_err();
        assert!(matches!(err, StorageError::Format(_)));
    }

    #[test]
    fn test_save_and_reload_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        let storage = InMemoryStorage::from_snapshot(SeasonSnapshot::from_json(SNAPSHOT).unwrap());
        storage.increment_miss_count(ParticipantId(1), 2025).unwrap();
        storage.snapshot().save_to_path(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let reloaded = SeasonSnapshot::load_from_path(&path).unwrap();
        assert_eq!(reloaded.miss_counts.len(), 1);
        assert_eq!(reloaded.results.len(), 1);
        assert_eq!(reloaded.events[0].name, "Australia");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SeasonSnapshot::load_from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
