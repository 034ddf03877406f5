//! # Pool engine
//!
//! Facade that wires rules, deadlines, validation, carry-over and scoring to
//! the [`Storage`] and [`Clock`] collaborators.
//!
//! Writes for one (participant, event) key are serialized through a keyed
//! lock table, so a manual submission and a carry-over for the same key can
//! never interleave their load-validate-upsert sequences. Reads take no
//! engine lock.
//!
//! ## Usage
//! ```rust
//! use pool_core::deadline::SystemClock;
//! use pool_core::engine::PoolEngine;
//! use pool_core::rules::RulesCatalog;
//! use pool_core::storage::InMemoryStorage;
//!
//! let engine = PoolEngine::new(InMemoryStorage::new(), SystemClock, RulesCatalog::default());
//! assert!(engine.season_standings(2025).unwrap().is_empty());
//! ```

use crate::carry_over::{CarryOver, CarryOverResolver, CarryOverSource};
use crate::deadline::{Clock, DeadlineClock};
use crate::error::{BetError, EngineError, Result};
use crate::models::{
    Bet, ChampionshipPick, ChampionshipResult, DriverId, EventId, OfficialResult, Participant,
    ParticipantId, Roster, Season, Standing, ValidBet,
};
use crate::rules::RulesCatalog;
use crate::season::{score_season, SeasonInputs};
use crate::standings::late_entry_allowance;
use crate::storage::{AuditEntry, AuditSubject, Storage};
use crate::validator::BetValidator;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Bet(ParticipantId, EventId),
    Championship(ParticipantId, Season),
}

/// One mutex per key, created on first use and dropped once unused
#[derive(Debug, Default)]
struct LockTable {
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockTable {
    fn table(&self) -> MutexGuard<'_, HashMap<LockKey, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, key: LockKey) -> Arc<Mutex<()>> {
        Arc::clone(self.table().entry(key).or_default())
    }

    /// Handles are only cloned under the table lock, so a count of one
    /// means no caller is holding or waiting on the key
    fn release(&self, key: LockKey) {
        let mut locks = self.table();
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
    }

    /// Run `f` while holding the key, then prune the entry
    fn with_key<T>(&self, key: LockKey, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.handle(key);
        let out = {
            let _guard = hold(&lock);
            f()
        };
        drop(lock);
        self.release(key);
        out
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table().len()
    }
}

fn hold(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PoolEngine<S: Storage, C: Clock> {
    storage: S,
    clock: C,
    catalog: RulesCatalog,
    deadlines: DeadlineClock,
    locks: LockTable,
}

impl<S: Storage, C: Clock> PoolEngine<S, C> {
    pub fn new(storage: S, clock: C, catalog: RulesCatalog) -> Self {
        let deadlines = DeadlineClock::new(catalog.clock());
        Self { storage, clock, catalog, deadlines, locks: LockTable::default() }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn catalog(&self) -> &RulesCatalog {
        &self.catalog
    }

    pub fn deadlines(&self) -> &DeadlineClock {
        &self.deadlines
    }

    pub fn roster(&self) -> Result<Roster> {
        Ok(Roster::new(self.storage.load_drivers()?))
    }

    /// Validate and store a manual bet, replacing any current bet for the
    /// same (participant, event)
    pub fn submit_bet(&self, bet: Bet) -> Result<ValidBet> {
        let key = LockKey::Bet(bet.participant, bet.event);
        self.locks.with_key(key, || self.store_bet(bet))
    }

    fn store_bet(&self, bet: Bet) -> Result<ValidBet> {
        let participant = self.active_participant(bet.participant)?;
        let event = self.storage.load_event(bet.event)?.ok_or(EngineError::UnknownEvent(bet.event))?;
        let roster = self.roster()?;
        let rules = self.catalog.resolve(event.season, event.format);
        let cutoff = self.deadlines.cutoff(&event);
        let now = self.clock.now();

        let bet = Bet { submitted_at: now, automatic: 0, ..bet };
        let valid = match BetValidator::new(rules, &roster).validate(bet, &event, &cutoff, now) {
            Ok(valid) => valid,
            Err(err) => {
                tracing::info!(
                    participant = %participant.id,
                    event = %event.id,
                    code = err.code(),
                    "Bet rejected: {err}"
                );
                return Err(err.into());
            }
        };

        self.storage.upsert_bet(Bet::clone(&valid))?;
        self.storage.append_audit(AuditEntry {
            participant: participant.id,
            subject: AuditSubject::Event(event.id),
            label: event.name.clone(),
            summary: valid.summary(),
            automatic: 0,
            at: now,
        })?;
        tracing::info!(participant = %participant.id, event = %event.id, "Bet accepted");
        Ok(valid)
    }

    /// Store or replace a season-opening pick while the window is open
    pub fn submit_championship_pick(&self, pick: ChampionshipPick) -> Result<()> {
        let key = LockKey::Championship(pick.participant, pick.season);
        self.locks.with_key(key, || self.store_championship_pick(pick))
    }

    fn store_championship_pick(&self, pick: ChampionshipPick) -> Result<()> {
        let participant = self.active_participant(pick.participant)?;
        let events = self.storage.load_events(pick.season)?;
        let now = self.clock.now();

        if let Some(window) = self.deadlines.championship_window(&events) {
            if now > window.closes_at.with_timezone(&Utc) {
                return Err(BetError::ChampionshipClosed {
                    season: pick.season,
                    cutoff: window.closes_at,
                }
                .into());
            }
        }
        if pick.champion == pick.runner_up {
            return Err(BetError::SameChampionAndRunnerUp.into());
        }
        let roster = self.roster()?;
        for driver in [&pick.champion, &pick.runner_up] {
            if roster.active_team(driver).is_none() {
                return Err(BetError::UnknownDriver { driver: driver.clone() }.into());
            }
        }

        let pick = ChampionshipPick { submitted_at: now, ..pick };
        let (season, summary) = (pick.season, pick.summary());
        self.storage.upsert_championship_pick(pick)?;
        self.storage.append_audit(AuditEntry {
            participant: participant.id,
            subject: AuditSubject::Championship(season),
            label: format!("Championship {season}"),
            summary,
            automatic: 0,
            at: now,
        })?;
        tracing::info!(participant = %participant.id, season, "Championship pick accepted");
        Ok(())
    }

    /// Fill a missed event with an automatic bet (copy or opener fallback)
    pub fn resolve_missed(&self, participant: ParticipantId, event: EventId) -> Result<CarryOver> {
        let key = LockKey::Bet(participant, event);
        self.locks.with_key(key, || self.store_carry_over(participant, event))
    }

    fn store_carry_over(&self, participant: ParticipantId, event: EventId) -> Result<CarryOver> {
        self.storage
            .load_participant(participant)?
            .ok_or(EngineError::UnknownParticipant(participant))?;
        let target = self.storage.load_event(event)?.ok_or(EngineError::UnknownEvent(event))?;
        let season_events = self.storage.load_events(target.season)?;
        let season_bets = self.storage.load_bets(target.season)?;
        let result = self.storage.load_official_result(event)?;
        let roster = self.roster()?;
        let rules = self.catalog.resolve(target.season, target.format);
        let now = self.clock.now();

        let resolver = CarryOverResolver::new(&season_events, &self.deadlines);
        let carry = match resolver.resolve(
            participant,
            event,
            &season_bets,
            result.as_ref(),
            &roster,
            rules,
            now,
        ) {
            Ok(carry) => carry,
            Err(err) => {
                tracing::warn!(
                    participant = %participant,
                    event = %event,
                    code = err.code(),
                    "Carry-over failed: {err}"
                );
                return Err(err.into());
            }
        };

        self.storage.upsert_bet(carry.bet.clone())?;
        let misses = self.storage.increment_miss_count(participant, target.season)?;
        self.storage.append_audit(AuditEntry {
            participant,
            subject: AuditSubject::Event(event),
            label: format!("{}*", target.name),
            summary: carry.bet.summary(),
            automatic: carry.bet.automatic,
            at: now,
        })?;

        match carry.source {
            CarryOverSource::Copied(from) => tracing::info!(
                participant = %participant,
                event = %event,
                from = %from,
                automatic = carry.bet.automatic,
                misses,
                "Carried over missed bet"
            ),
            CarryOverSource::Fallback => tracing::info!(
                participant = %participant,
                event = %event,
                misses,
                "Built fallback bet for season opener"
            ),
        }
        Ok(carry)
    }

    /// Post the official result of an event; posted results are final
    pub fn post_result(&self, result: OfficialResult) -> Result<()> {
        let event = result.event();
        self.storage.load_event(event)?.ok_or(EngineError::UnknownEvent(event))?;
        if self.storage.load_official_result(event)?.is_some() {
            return Err(EngineError::ResultAlreadyPosted(event));
        }
        let roster = self.roster()?;
        if let Some(driver) = result.drivers().find(|d| !roster.is_known(d)) {
            return Err(EngineError::InconsistentResult { event, driver: DriverId::clone(driver) });
        }

        self.storage.insert_official_result(result)?;
        tracing::info!(event = %event, "Official result posted");
        Ok(())
    }

    /// Set or replace the final championship outcome of a season
    pub fn set_championship_result(&self, result: ChampionshipResult) -> Result<()> {
        let roster = self.roster()?;
        if let Some(driver) =
            [&result.champion, &result.runner_up].into_iter().find(|d| !roster.is_known(d))
        {
            return Err(BetError::UnknownDriver { driver: driver.clone() }.into());
        }
        tracing::info!(season = result.season, champion = %result.champion, "Championship result set");
        self.storage.upsert_championship_result(result)?;
        Ok(())
    }

    /// Admit a participant mid-season with a share of the lowest total
    ///
    /// Before the first event starts the participant joins as a regular
    /// entrant with no allowance. Existing ids are never overwritten.
    pub fn register_late_entry(&self, participant: Participant, season: Season) -> Result<Participant> {
        if self.storage.load_participant(participant.id)?.is_some() {
            return Err(EngineError::ParticipantExists(participant.id));
        }
        let events = self.storage.load_events(season)?;
        let now = self.clock.now();
        let started = self
            .deadlines
            .championship_window(&events)
            .is_some_and(|window| now > window.first_start.with_timezone(&Utc));

        if !started {
            let participant =
                Participant { starting_points: 0, late_entry: false, active: true, ..participant };
            self.storage.upsert_participant(participant.clone())?;
            tracing::info!(participant = %participant.id, season, "Participant registered before season start");
            return Ok(participant);
        }

        let standings = self.season_standings(season)?;
        let rules = self.catalog.championship_rules(season);
        let participant = Participant {
            starting_points: late_entry_allowance(&standings, rules),
            late_entry: true,
            active: true,
            ..participant
        };
        self.storage.upsert_participant(participant.clone())?;
        tracing::info!(
            participant = %participant.id,
            season,
            starting_points = participant.starting_points,
            "Late entry registered"
        );
        Ok(participant)
    }

    /// Ranked table for a season, computed from committed data
    pub fn season_standings(&self, season: Season) -> Result<Vec<Standing>> {
        let events = self.storage.load_events(season)?;
        let participants = self.storage.load_participants()?;
        let bets = self.storage.load_bets(season)?;
        let results = self.storage.load_results(season)?;
        let picks = self.storage.load_championship_picks(season)?;
        let championship = self.storage.load_championship_result(season)?;
        let roster = self.roster()?;

        let standings = score_season(
            &SeasonInputs {
                season,
                events: &events,
                participants: &participants,
                bets: &bets,
                results: &results,
                roster: &roster,
                picks: &picks,
                championship: championship.as_ref(),
            },
            &self.catalog,
        );
        tracing::debug!(season, rows = standings.len(), "Standings computed");
        Ok(standings)
    }

    pub fn miss_count(&self, participant: ParticipantId, season: Season) -> Result<u32> {
        Ok(self.storage.load_miss_count(participant, season)?)
    }

    pub fn audit_log(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.storage.load_audit()?)
    }

    fn active_participant(&self, id: ParticipantId) -> Result<Participant> {
        let participant =
            self.storage.load_participant(id)?.ok_or(EngineError::UnknownParticipant(id))?;
        if !participant.active {
            return Err(BetError::InactiveParticipant { participant: id }.into());
        }
        Ok(participant)
    }
}
