//! Automatic bets for participants who missed a deadline
//!
//! A missed event repeats the participant's most recent earlier bet. When
//! there is nothing to repeat (the season opener), a minimal fallback bet is
//! built from the official result instead: every token on a driver who did
//! not score and an 11th-place guess that is known to be wrong.

use crate::deadline::DeadlineClock;
use crate::error::CarryOverError;
use crate::models::event::chronological;
use crate::models::{Bet, BetEntry, Event, EventId, OfficialResult, ParticipantId, Roster};
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryOverSource {
    /// Copied from the bet of this earlier event
    Copied(EventId),
    /// Built from the official result of the season opener
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryOver {
    pub bet: Bet,
    pub source: CarryOverSource,
}

pub struct CarryOverResolver<'a> {
    season_events: &'a [Event],
    ordered: Vec<&'a Event>,
    clock: &'a DeadlineClock,
}

impl<'a> CarryOverResolver<'a> {
    pub fn new(season_events: &'a [Event], clock: &'a DeadlineClock) -> Self {
        Self { season_events, ordered: chronological(season_events), clock }
    }

    /// Whether `event` is the first active event of the season
    pub fn is_first_event(&self, event: EventId) -> bool {
        self.ordered.first().is_some_and(|e| e.id == event)
    }

    /// Copy the most recent earlier bet of `participant` into `event`
    pub fn resolve_missed(
        &self,
        participant: ParticipantId,
        event: EventId,
        season_bets: &[Bet],
        now: DateTime<Utc>,
    ) -> Result<Bet, CarryOverError> {
        let target = self.check_missed(participant, event, season_bets, now)?;

        let prior = self
            .ordered
            .iter()
            .take_while(|e| e.id != target.id)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|e| season_bets.iter().find(|b| b.participant == participant && b.event == e.id))
            .ok_or(CarryOverError::NoPriorBet { participant, event })?;

        Ok(Bet {
            participant,
            event,
            entries: prior.entries.clone(),
            eleventh: prior.eleventh.clone(),
            submitted_at: now,
            automatic: self.automatic_count(participant, season_bets) + 1,
        })
    }

    /// Minimal bet for a participant who missed the season opener
    pub fn fallback_bet(
        &self,
        participant: ParticipantId,
        event: EventId,
        season_bets: &[Bet],
        result: Option<&OfficialResult>,
        roster: &Roster,
        rules: &RuleSet,
        now: DateTime<Utc>,
    ) -> Result<Bet, CarryOverError> {
        let target = self.check_missed(participant, event, season_bets, now)?;
        if !self.is_first_event(target.id) {
            return Err(CarryOverError::AdminResolutionRequired { participant, event });
        }
        let result = result.ok_or(CarryOverError::ResultPending { event })?;

        let scored: HashSet<_> = result.scored_drivers(rules.scored_range()).collect();
        let driver = roster
            .active()
            .find(|d| !scored.contains(&d.id))
            .ok_or(CarryOverError::NoEligibleDriver { event })?;
        let eleventh = roster
            .active()
            .find(|d| d.id != driver.id && &d.id != result.eleventh())
            .ok_or(CarryOverError::NoEligibleDriver { event })?;

        Ok(Bet {
            participant,
            event,
            entries: vec![BetEntry { driver: driver.id.clone(), tokens: rules.token_budget }],
            eleventh: eleventh.id.clone(),
            submitted_at: now,
            automatic: 1,
        })
    }

    /// Carry over when possible; fall back only on the season opener and
    /// escalate every other missing-history case
    pub fn resolve(
        &self,
        participant: ParticipantId,
        event: EventId,
        season_bets: &[Bet],
        result: Option<&OfficialResult>,
        roster: &Roster,
        rules: &RuleSet,
        now: DateTime<Utc>,
    ) -> Result<CarryOver, CarryOverError> {
        match self.resolve_missed(participant, event, season_bets, now) {
            Ok(bet) => {
                let from = self.source_event(participant, event, season_bets);
                Ok(CarryOver { bet, source: CarryOverSource::Copied(from.unwrap_or(event)) })
            }
            Err(CarryOverError::NoPriorBet { .. }) if self.is_first_event(event) => {
                let bet =
                    self.fallback_bet(participant, event, season_bets, result, roster, rules, now)?;
                Ok(CarryOver { bet, source: CarryOverSource::Fallback })
            }
            Err(CarryOverError::NoPriorBet { .. }) => {
                Err(CarryOverError::AdminResolutionRequired { participant, event })
            }
            Err(err) => Err(err),
        }
    }

    /// Automatic bets the participant already has this season
    pub fn automatic_count(&self, participant: ParticipantId, season_bets: &[Bet]) -> u32 {
        let season: HashSet<EventId> = self.season_events.iter().map(|e| e.id).collect();
        season_bets
            .iter()
            .filter(|b| b.participant == participant && b.automatic >= 1 && season.contains(&b.event))
            .count() as u32
    }

    fn source_event(
        &self,
        participant: ParticipantId,
        event: EventId,
        season_bets: &[Bet],
    ) -> Option<EventId> {
        self.ordered
            .iter()
            .take_while(|e| e.id != event)
            .filter(|e| season_bets.iter().any(|b| b.participant == participant && b.event == e.id))
            .last()
            .map(|e| e.id)
    }

    fn check_missed(
        &self,
        participant: ParticipantId,
        event: EventId,
        season_bets: &[Bet],
        now: DateTime<Utc>,
    ) -> Result<&'a Event, CarryOverError> {
        let target = self
            .season_events
            .iter()
            .find(|e| e.id == event)
            .ok_or(CarryOverError::UnknownEvent { event })?;
        if !target.is_active() {
            return Err(CarryOverError::EventInactive { event });
        }
        if season_bets.iter().any(|b| b.participant == participant && b.event == event) {
            return Err(CarryOverError::AlreadyHasBet { participant, event });
        }
        let cutoff = self.clock.cutoff(target);
        if now <= cutoff.utc() {
            return Err(CarryOverError::WindowOpen { event, cutoff: cutoff.at });
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Driver, EventFormat, EventStatus};
    use crate::scoring::score_bet;
    use chrono::{NaiveDate, TimeZone};

    fn events() -> Vec<Event> {
        // Deliberately out of order; resolution must sort by date
        [(3, 30), (1, 16), (2, 23)]
            .iter()
            .map(|(id, day)| Event {
                id: EventId(*id),
                season: 2025,
                name: format!("GP {id}"),
                date: NaiveDate::from_ymd_opt(2025, 3, *day).unwrap(),
                start_time: Some("10:00".to_string()),
                status: EventStatus::Active,
                format: EventFormat::Normal,
            })
            .collect()
    }

    fn after_season() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()
    }

    fn manual(participant: u32, event: u32, lead: &str) -> Bet {
        Bet::new(
            ParticipantId(participant),
            EventId(event),
            vec![BetEntry::new(lead, 13), BetEntry::new("B", 1), BetEntry::new("C", 1)],
            "D",
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    fn roster() -> Roster {
        Roster::new(
            ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M"]
                .iter()
                .map(|d| Driver::new(d, &format!("Team {d}"))),
        )
    }

    #[test]
    fn test_copies_most_recent_prior_bet() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let bets = vec![manual(1, 1, "A"), manual(1, 2, "E")];

        let bet = resolver.resolve_missed(ParticipantId(1), EventId(3), &bets, after_season()).unwrap();
        assert_eq!(bet.entries, bets[1].entries);
        assert_eq!(bet.eleventh, bets[1].eleventh);
        assert_eq!(bet.event, EventId(3));
        assert_eq!(bet.automatic, 1);
    }

    #[test]
    fn test_skips_events_without_a_bet() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let bets = vec![manual(1, 1, "A")];

        let outcome = resolver
            .resolve(ParticipantId(1), EventId(3), &bets, None, &roster(), &RuleSet::normal(), after_season())
            .unwrap();
        assert_eq!(outcome.source, CarryOverSource::Copied(EventId(1)));
        assert_eq!(outcome.bet.entries, bets[0].entries);
    }

    #[test]
    fn test_automatic_counter_spans_the_season() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let mut bets = vec![manual(1, 1, "A")];

        let second = resolver.resolve_missed(ParticipantId(1), EventId(2), &bets, after_season()).unwrap();
        assert_eq!(second.automatic, 1);
        bets.push(second);

        let third = resolver.resolve_missed(ParticipantId(1), EventId(3), &bets, after_season()).unwrap();
        assert_eq!(third.automatic, 2);
    }

    #[test]
    fn test_window_still_open() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let early = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();

        let err = resolver.resolve_missed(ParticipantId(1), EventId(3), &[manual(1, 1, "A")], early);
        assert_eq!(err.unwrap_err().code(), "ERR_WINDOW_OPEN");
    }

    #[test]
    fn test_existing_bet_is_not_replaced() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let bets = vec![manual(1, 1, "A"), manual(1, 2, "E")];

        let err = resolver.resolve_missed(ParticipantId(1), EventId(2), &bets, after_season()).unwrap_err();
        assert_eq!(err, CarryOverError::AlreadyHasBet { participant: ParticipantId(1), event: EventId(2) });
    }

    #[test]
    fn test_fallback_on_season_opener() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let result = OfficialResult::from_order(
            EventId(1),
            &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"],
            "K",
        )
        .unwrap();

        let outcome = resolver
            .resolve(ParticipantId(2), EventId(1), &[], Some(&result), &roster(), &RuleSet::normal(), after_season())
            .unwrap();
        assert_eq!(outcome.source, CarryOverSource::Fallback);
        assert_eq!(outcome.bet.entries, vec![BetEntry::new("K", 15)]);
        // "K" finished 11th, so the guess skips it and the bet driver
        assert_eq!(outcome.bet.eleventh.as_str(), "A");
        assert_eq!(outcome.bet.automatic, 1);

        let score = score_bet(&outcome.bet, &result, &RuleSet::normal()).unwrap();
        assert_eq!(score.total, 0);
    }

    #[test]
    fn test_fallback_needs_result() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);

        let err = resolver
            .resolve(ParticipantId(2), EventId(1), &[], None, &roster(), &RuleSet::normal(), after_season())
            .unwrap_err();
        assert_eq!(err, CarryOverError::ResultPending { event: EventId(1) });
    }

    #[test]
    fn test_missing_history_after_opener_escalates() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);

        let err = resolver
            .resolve(ParticipantId(2), EventId(2), &[], None, &roster(), &RuleSet::normal(), after_season())
            .unwrap_err();
        assert_eq!(err.code(), "ERR_ADMIN_RESOLUTION_REQUIRED");
    }

    #[test]
    fn test_carried_bet_scores_like_the_source_bet() {
        let events = events();
        let clock = DeadlineClock::default();
        let resolver = CarryOverResolver::new(&events, &clock);
        let original = manual(1, 1, "A");
        let carried = resolver
            .resolve_missed(ParticipantId(1), EventId(2), std::slice::from_ref(&original), after_season())
            .unwrap();

        let next = OfficialResult::from_order(
            EventId(2),
            &["C", "A", "E", "F", "B", "G", "H", "I", "J", "K"],
            "D",
        )
        .unwrap();
        let as_if_placed = Bet { event: EventId(2), ..original };
        let rules = RuleSet::normal();

        assert_eq!(
            score_bet(&carried, &next, &rules).unwrap().total,
            score_bet(&as_if_placed, &next, &rules).unwrap().total
        );
    }
}
