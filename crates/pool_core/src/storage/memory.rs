use super::{AuditEntry, SeasonSnapshot, Storage};
use super::snapshot::MissCount;
use crate::error::StorageError;
use crate::models::{
    Bet, ChampionshipPick, ChampionshipResult, Driver, DriverId, Event, EventId, OfficialResult,
    Participant, ParticipantId, Season,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    drivers: BTreeMap<DriverId, Driver>,
    participants: BTreeMap<ParticipantId, Participant>,
    events: BTreeMap<EventId, Event>,
    bets: BTreeMap<(ParticipantId, EventId), Bet>,
    results: BTreeMap<EventId, OfficialResult>,
    picks: BTreeMap<(ParticipantId, Season), ChampionshipPick>,
    championship_results: BTreeMap<Season, ChampionshipResult>,
    miss_counts: BTreeMap<(ParticipantId, Season), u32>,
    audit: Vec<AuditEntry>,
}

impl State {
    fn season_of(&self, event: EventId) -> Option<Season> {
        self.events.get(&event).map(|e| e.season)
    }
}

/// Thread-safe in-memory storage (single `RwLock` over all tables)
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: RwLock<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: SeasonSnapshot) -> Self {
        let state = State {
            drivers: snapshot.drivers.into_iter().map(|d| (d.id.clone(), d)).collect(),
            participants: snapshot.participants.into_iter().map(|p| (p.id, p)).collect(),
            events: snapshot.events.into_iter().map(|e| (e.id, e)).collect(),
            bets: snapshot.bets.into_iter().map(|b| (b.key(), b)).collect(),
            results: snapshot.results.into_iter().map(|r| (r.event(), r)).collect(),
            picks: snapshot.picks.into_iter().map(|p| ((p.participant, p.season), p)).collect(),
            championship_results: snapshot
                .championship_results
                .into_iter()
                .map(|r| (r.season, r))
                .collect(),
            miss_counts: snapshot
                .miss_counts
                .into_iter()
                .map(|m| ((m.participant, m.season), m.count))
                .collect(),
            audit: snapshot.audit,
        };
        Self { state: RwLock::new(state) }
    }

    /// Export everything currently stored
    pub fn snapshot(&self) -> SeasonSnapshot {
        let state = self.read();
        SeasonSnapshot {
            drivers: state.drivers.values().cloned().collect(),
            participants: state.participants.values().cloned().collect(),
            events: state.events.values().cloned().collect(),
            bets: state.bets.values().cloned().collect(),
            results: state.results.values().cloned().collect(),
            picks: state.picks.values().cloned().collect(),
            championship_results: state.championship_results.values().cloned().collect(),
            miss_counts: state
                .miss_counts
                .iter()
                .map(|(&(participant, season), &count)| MissCount { participant, season, count })
                .collect(),
            audit: state.audit.clone(),
        }
    }

    pub fn upsert_driver(&self, driver: Driver) {
        self.write().drivers.insert(driver.id.clone(), driver);
    }

    // A writer that panicked mid-update leaves whole-row inserts behind, so
    // the data is still consistent and poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for InMemoryStorage {
    fn load_bet(
        &self,
        participant: ParticipantId,
        event: EventId,
    ) -> Result<Option<Bet>, StorageError> {
        Ok(self.read().bets.get(&(participant, event)).cloned())
    }

    fn upsert_bet(&self, bet: Bet) -> Result<(), StorageError> {
        self.write().bets.insert(bet.key(), bet);
        Ok(())
    }

    fn load_bets(&self, season: Season) -> Result<Vec<Bet>, StorageError> {
        let state = self.read();
        Ok(state
            .bets
            .values()
            .filter(|bet| state.season_of(bet.event) == Some(season))
            .cloned()
            .collect())
    }

    fn load_official_result(&self, event: EventId) -> Result<Option<OfficialResult>, StorageError> {
        Ok(self.read().results.get(&event).cloned())
    }

    fn insert_official_result(&self, result: OfficialResult) -> Result<(), StorageError> {
        let mut state = self.write();
        if state.results.contains_key(&result.event()) {
            return Err(StorageError::Backend(format!(
                "result for {} already stored",
                result.event()
            )));
        }
        state.results.insert(result.event(), result);
        Ok(())
    }

    fn load_results(&self, season: Season) -> Result<HashMap<EventId, OfficialResult>, StorageError> {
        let state = self.read();
        Ok(state
            .results
            .iter()
            .filter(|(event, _)| state.season_of(**event) == Some(season))
            .map(|(event, result)| (*event, result.clone()))
            .collect())
    }

    fn load_event(&self, event: EventId) -> Result<Option<Event>, StorageError> {
        Ok(self.read().events.get(&event).cloned())
    }

    fn load_events(&self, season: Season) -> Result<Vec<Event>, StorageError> {
        Ok(self.read().events.values().filter(|e| e.season == season).cloned().collect())
    }

    fn upsert_event(&self, event: Event) -> Result<(), StorageError> {
        self.write().events.insert(event.id, event);
        Ok(())
    }

    fn load_drivers(&self) -> Result<Vec<Driver>, StorageError> {
        Ok(self.read().drivers.values().cloned().collect())
    }

    fn load_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StorageError> {
        Ok(self.read().participants.get(&id).cloned())
    }

    fn load_participants(&self) -> Result<Vec<Participant>, StorageError> {
        Ok(self.read().participants.values().cloned().collect())
    }

    fn upsert_participant(&self, participant: Participant) -> Result<(), StorageError> {
        self.write().participants.insert(participant.id, participant);
        Ok(())
    }

    fn load_championship_pick(
        &self,
        participant: ParticipantId,
        season: Season,
    ) -> Result<Option<ChampionshipPick>, StorageError> {
        Ok(self.read().picks.get(&(participant, season)).cloned())
    }

    fn upsert_championship_pick(&self, pick: ChampionshipPick) -> Result<(), StorageError> {
        self.write().picks.insert((pick.participant, pick.season), pick);
        Ok(())
    }

    fn load_championship_picks(&self, season: Season) -> Result<Vec<ChampionshipPick>, StorageError> {
        Ok(self.read().picks.values().filter(|p| p.season == season).cloned().collect())
    }

    fn load_championship_result(
        &self,
        season: Season,
    ) -> Result<Option<ChampionshipResult>, StorageError> {
        Ok(self.read().championship_results.get(&season).cloned())
    }

    fn upsert_championship_result(&self, result: ChampionshipResult) -> Result<(), StorageError> {
        self.write().championship_results.insert(result.season, result);
        Ok(())
    }

    fn increment_miss_count(
        &self,
        participant: ParticipantId,
        season: Season,
    ) -> Result<u32, StorageError> {
        let mut state = self.write();
        let count = state.miss_counts.entry((participant, season)).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn load_miss_count(
        &self,
        participant: ParticipantId,
        season: Season,
    ) -> Result<u32, StorageError> {
        Ok(self.read().miss_counts.get(&(participant, season)).copied().unwrap_or(0))
    }

    fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError> {
        self.write().audit.push(entry);
        Ok(())
    }

    fn load_audit(&self) -> Result<Vec<AuditEntry>, StorageError> {
        Ok(self.read().audit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetEntry, EventFormat, EventStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn event(id: u32, season: Season) -> Event {
        Event {
            id: EventId(id),
            season,
            name: format!("GP {id}"),
            date: NaiveDate::from_ymd_opt(season, 3, 1).unwrap(),
            start_time: None,
            status: EventStatus::Active,
            format: EventFormat::Normal,
        }
    }

    fn bet(event: u32, tokens: u32) -> Bet {
        Bet::new(
            ParticipantId(1),
            EventId(event),
            vec![BetEntry::new("A", tokens), BetEntry::new("B", 15 - tokens)],
            "C",
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_upsert_replaces_current_bet() {
        let storage = InMemoryStorage::new();
        storage.upsert_event(event(1, 2025)).unwrap();
        storage.upsert_bet(bet(1, 10)).unwrap();
        storage.upsert_bet(bet(1, 12)).unwrap();

        let bets = storage.load_bets(2025).unwrap();
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].entries[0].tokens, 12);
    }

    #[test]
    fn test_bets_filtered_by_event_season() {
        let storage = InMemoryStorage::new();
        storage.upsert_event(event(1, 2024)).unwrap();
        storage.upsert_event(event(2, 2025)).unwrap();
        storage.upsert_bet(bet(1, 10)).unwrap();
        storage.upsert_bet(bet(2, 10)).unwrap();

        let bets = storage.load_bets(2025).unwrap();
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].event, EventId(2));
    }

    #[test]
    fn test_results_are_insert_only() {
        let storage = InMemoryStorage::new();
        let order = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
        let result = OfficialResult::from_order(EventId(1), &order, "K").unwrap();
        storage.insert_official_result(result.clone()).unwrap();
        assert!(storage.insert_official_result(result).is_err());
    }

    #[test]
    fn test_miss_counter_per_season() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.increment_miss_count(ParticipantId(1), 2025).unwrap(), 1);
        assert_eq!(storage.increment_miss_count(ParticipantId(1), 2025).unwrap(), 2);
        assert_eq!(storage.load_miss_count(ParticipantId(1), 2024).unwrap(), 0);
    }
}
