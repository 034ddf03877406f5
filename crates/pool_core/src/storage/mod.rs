//! # Storage collaborator
//!
//! The engine never embeds storage logic: it reads and writes through the
//! [`Storage`] trait. [`InMemoryStorage`] is the reference implementation,
//! seeded from a [`SeasonSnapshot`] (JSON) for the CLI and tests.
//!
//! ## Usage
//! ```rust
//! use pool_core::storage::{InMemoryStorage, Storage};
//! use pool_core::models::Participant;
//!
//! let storage = InMemoryStorage::new();
//! storage.upsert_participant(Participant::new(1, "Ana")).unwrap();
//! assert_eq!(storage.load_participants().unwrap().len(), 1);
//! ```

mod memory;
mod snapshot;

pub use memory::InMemoryStorage;
pub use snapshot::{MissCount, SeasonSnapshot};

use crate::error::StorageError;
use crate::models::{
    Bet, ChampionshipPick, ChampionshipResult, Driver, Event, EventId, OfficialResult, Participant,
    ParticipantId, Season,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What an audit line refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum AuditSubject {
    Event(EventId),
    Championship(Season),
}

/// One line of the bet log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub participant: ParticipantId,
    pub subject: AuditSubject,
    /// Event name (suffixed with `*` for automatic bets) or championship label
    pub label: String,
    pub summary: String,
    pub automatic: u32,
    pub at: DateTime<Utc>,
}

pub trait Storage: Send + Sync {
    fn load_bet(
        &self,
        participant: ParticipantId,
        event: EventId,
    ) -> Result<Option<Bet>, StorageError>;

    /// Insert or replace the single current bet for (participant, event)
    fn upsert_bet(&self, bet: Bet) -> Result<(), StorageError>;

    /// Every current bet placed on an event of `season`
    fn load_bets(&self, season: Season) -> Result<Vec<Bet>, StorageError>;

    fn load_official_result(&self, event: EventId) -> Result<Option<OfficialResult>, StorageError>;
    fn insert_official_result(&self, result: OfficialResult) -> Result<(), StorageError>;
    fn load_results(&self, season: Season) -> Result<HashMap<EventId, OfficialResult>, StorageError>;

    fn load_event(&self, event: EventId) -> Result<Option<Event>, StorageError>;
    fn load_events(&self, season: Season) -> Result<Vec<Event>, StorageError>;
    fn upsert_event(&self, event: Event) -> Result<(), StorageError>;

    fn load_drivers(&self) -> Result<Vec<Driver>, StorageError>;

    fn load_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StorageError>;
    fn load_participants(&self) -> Result<Vec<Participant>, StorageError>;
    fn upsert_participant(&self, participant: Participant) -> Result<(), StorageError>;

    fn load_championship_pick(
        &self,
        participant: ParticipantId,
        season: Season,
    ) -> Result<Option<ChampionshipPick>, StorageError>;
    fn upsert_championship_pick(&self, pick: ChampionshipPick) -> Result<(), StorageError>;
    fn load_championship_picks(&self, season: Season) -> Result<Vec<ChampionshipPick>, StorageError>;

    fn load_championship_result(
        &self,
        season: Season,
    ) -> Result<Option<ChampionshipResult>, StorageError>;
    fn upsert_championship_result(&self, result: ChampionshipResult) -> Result<(), StorageError>;

    /// Bump the season-wide miss counter and return the new value
    fn increment_miss_count(
        &self,
        participant: ParticipantId,
        season: Season,
    ) -> Result<u32, StorageError>;
    fn load_miss_count(&self, participant: ParticipantId, season: Season)
        -> Result<u32, StorageError>;

    fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError>;
    fn load_audit(&self) -> Result<Vec<AuditEntry>, StorageError>;
}
