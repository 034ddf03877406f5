//! Bet validation
//!
//! Pure checks of a proposed bet against the event's rule set and cutoff.
//! The first failing check is reported; nothing is written here.

use crate::deadline::Cutoff;
use crate::error::BetError;
use crate::models::{Bet, DriverId, Event, Roster, ValidBet};
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub struct BetValidator<'a> {
    rules: &'a RuleSet,
    roster: &'a Roster,
}

impl<'a> BetValidator<'a> {
    pub fn new(rules: &'a RuleSet, roster: &'a Roster) -> Self {
        Self { rules, roster }
    }

    /// Check order: event open, deadline, token sum, duplicate driver,
    /// duplicate team, driver count, entry count, 11th-place conflict.
    pub fn validate(
        &self,
        bet: Bet,
        event: &Event,
        cutoff: &Cutoff,
        now: DateTime<Utc>,
    ) -> Result<ValidBet, BetError> {
        if !event.is_active() {
            return Err(BetError::EventInactive { event: event.id });
        }

        if now > cutoff.utc() {
            return Err(BetError::DeadlinePassed { cutoff: cutoff.at, submitted: now });
        }

        let budget = self.rules.token_budget;
        let found = bet.total_tokens();
        if found != u64::from(budget) || bet.entries.iter().any(|e| e.tokens > budget) {
            return Err(BetError::TokenSumMismatch { expected: budget, found });
        }

        let mut drivers: HashSet<&DriverId> = HashSet::new();
        for entry in &bet.entries {
            if !drivers.insert(&entry.driver) {
                return Err(BetError::DuplicateDriver { driver: entry.driver.clone() });
            }
        }

        let mut teams: HashSet<&str> = HashSet::new();
        for entry in bet.token_bearing() {
            let team = self
                .roster
                .active_team(&entry.driver)
                .ok_or_else(|| BetError::UnknownDriver { driver: entry.driver.clone() })?;
            if !teams.insert(team) {
                return Err(BetError::DuplicateTeam { team: team.to_string() });
            }
        }

        let bearing = bet.token_bearing().count();
        if bearing < self.rules.min_distinct_drivers {
            return Err(BetError::TooFewDrivers {
                required: self.rules.min_distinct_drivers,
                found: bearing,
            });
        }

        if bet.entries.len() > self.rules.max_entries {
            return Err(BetError::TooManyEntries {
                max: self.rules.max_entries,
                found: bet.entries.len(),
            });
        }

        if bet.token_bearing().any(|e| e.driver == bet.eleventh) {
            return Err(BetError::EleventhConflict { driver: bet.eleventh.clone() });
        }
        if self.roster.active_team(&bet.eleventh).is_none() {
            return Err(BetError::UnknownDriver { driver: bet.eleventh.clone() });
        }

        Ok(ValidBet::new_unchecked(bet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineClock;
    use crate::models::{BetEntry, Driver, EventFormat, EventId, EventStatus, ParticipantId};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn roster() -> Roster {
        Roster::new(vec![
            Driver::new("Max Verstappen", "Red Bull"),
            Driver::new("Yuki Tsunoda", "Red Bull"),
            Driver::new("Lando Norris", "McLaren"),
            Driver::new("Oscar Piastri", "McLaren"),
            Driver::new("Charles Leclerc", "Ferrari"),
            Driver::new("George Russell", "Mercedes"),
            Driver::new("Alex Albon", "Williams"),
            Driver::new("Pierre Gasly", "Alpine"),
            Driver::new("Jack Doohan", "Alpine").retired(),
        ])
    }

    fn event() -> Event {
        Event {
            id: EventId(1),
            season: 2025,
            name: "Australia".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
            start_time: Some("01:00".to_string()),
            status: EventStatus::Active,
            format: EventFormat::Normal,
        }
    }

    fn before_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn bet(entries: &[(&str, u32)], eleventh: &str) -> Bet {
        Bet::new(
            ParticipantId(1),
            EventId(1),
            entries.iter().map(|(d, t)| BetEntry::new(*d, *t)).collect(),
            eleventh,
            before_start(),
        )
    }

    fn check(bet: Bet, now: DateTime<Utc>) -> Result<ValidBet, BetError> {
        let rules = RuleSet::normal();
        let roster = roster();
        let event = event();
        let cutoff = DeadlineClock::default().cutoff(&event);
        BetValidator::new(&rules, &roster).validate(bet, &event, &cutoff, now)
    }

    #[test]
    fn test_valid_thirteen_one_one() {
        let b = bet(
            &[("Max Verstappen", 13), ("Lando Norris", 1), ("Charles Leclerc", 1)],
            "Alex Albon",
        );
        let valid = check(b, before_start()).unwrap();
        assert_eq!(valid.total_tokens(), 15);
    }

    #[test]
    fn test_deadline_checked_first() {
        let b = bet(&[("Max Verstappen", 16)], "Max Verstappen");
        let late = Utc.with_ymd_and_hms(2025, 3, 16, 4, 0, 1).unwrap();
        let err = check(b, late).unwrap_err();
        assert_eq!(err.code(), "ERR_DEADLINE_PASSED");
        assert_eq!(err.kind(), crate::error::ErrorKind::Deadline);
    }

    #[test]
    fn test_exact_cutoff_accepted() {
        let b = bet(
            &[("Max Verstappen", 5), ("Lando Norris", 5), ("Charles Leclerc", 5)],
            "Alex Albon",
        );
        let start = Utc.with_ymd_and_hms(2025, 3, 16, 4, 0, 0).unwrap();
        assert!(check(b, start).is_ok());
    }

    #[test]
    fn test_token_sum_mismatch() {
        let b = bet(&[("Max Verstappen", 10), ("Lando Norris", 6)], "Alex Albon");
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::TokenSumMismatch { expected: 15, found: 16 }
        );
    }

    #[test]
    fn test_oversized_entry_cannot_wrap_the_sum() {
        // Adds up to 15 modulo 2^32
        let b = bet(
            &[("Max Verstappen", u32::MAX - 1), ("Lando Norris", 16), ("Charles Leclerc", 1)],
            "Alex Albon",
        );
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::TokenSumMismatch { expected: 15, found: u64::from(u32::MAX) + 16 }
        );
    }

    #[test]
    fn test_entry_above_budget_rejected() {
        let b = bet(&[("Max Verstappen", 16)], "Alex Albon");
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::TokenSumMismatch { expected: 15, found: 16 }
        );
    }

    #[test]
    fn test_same_team_rejected() {
        let b = bet(&[("Max Verstappen", 8), ("Yuki Tsunoda", 7)], "Alex Albon");
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::DuplicateTeam { team: "Red Bull".to_string() }
        );
    }

    #[test]
    fn test_duplicate_driver() {
        let b = bet(
            &[("Max Verstappen", 7), ("Max Verstappen", 7), ("Lando Norris", 1)],
            "Alex Albon",
        );
        assert_eq!(check(b, before_start()).unwrap_err().code(), "ERR_DUPLICATE_DRIVER");
    }

    #[test]
    fn test_too_few_drivers() {
        let b = bet(&[("Max Verstappen", 14), ("Lando Norris", 1), ("Pierre Gasly", 0)], "Alex Albon");
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::TooFewDrivers { required: 3, found: 2 }
        );
    }

    #[test]
    fn test_too_many_entries() {
        let b = bet(
            &[
                ("Max Verstappen", 3),
                ("Lando Norris", 3),
                ("Charles Leclerc", 3),
                ("George Russell", 3),
                ("Alex Albon", 3),
                ("Pierre Gasly", 0),
            ],
            "Oscar Piastri",
        );
        assert_eq!(
            check(b, before_start()).unwrap_err(),
            BetError::TooManyEntries { max: 5, found: 6 }
        );
    }

    #[test]
    fn test_eleventh_conflict() {
        let b = bet(
            &[("Max Verstappen", 13), ("Lando Norris", 1), ("Charles Leclerc", 1)],
            "Lando Norris",
        );
        assert_eq!(check(b, before_start()).unwrap_err().code(), "ERR_ELEVENTH_CONFLICT");
    }

    #[test]
    fn test_eleventh_may_name_zero_token_driver() {
        let b = bet(
            &[
                ("Max Verstappen", 13),
                ("Lando Norris", 1),
                ("Charles Leclerc", 1),
                ("Alex Albon", 0),
            ],
            "Alex Albon",
        );
        assert!(check(b, before_start()).is_ok());
    }

    #[test]
    fn test_retired_driver_is_data_inconsistency() {
        let b = bet(
            &[("Max Verstappen", 13), ("Jack Doohan", 1), ("Charles Leclerc", 1)],
            "Alex Albon",
        );
        let err = check(b, before_start()).unwrap_err();
        assert_eq!(err, BetError::UnknownDriver { driver: "Jack Doohan".into() });
        assert_eq!(err.kind(), crate::error::ErrorKind::DataInconsistency);
    }

    #[test]
    fn test_inactive_event() {
        let rules = RuleSet::normal();
        let roster = roster();
        let mut ev = event();
        ev.status = EventStatus::Inactive;
        let cutoff = DeadlineClock::default().cutoff(&ev);
        let b = bet(
            &[("Max Verstappen", 13), ("Lando Norris", 1), ("Charles Leclerc", 1)],
            "Alex Albon",
        );
        let err = BetValidator::new(&rules, &roster)
            .validate(b, &ev, &cutoff, before_start() - Duration::days(1))
            .unwrap_err();
        assert_eq!(err.code(), "ERR_EVENT_INACTIVE");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const DRIVERS: [&str; 5] =
            ["Max Verstappen", "Lando Norris", "Charles Leclerc", "George Russell", "Alex Albon"];

        proptest! {
            /// Property: acceptance and the reported reason do not depend on entry order
            #[test]
            fn prop_validation_order_invariant(
                (tokens, shuffled) in prop::collection::vec(
                    prop_oneof![4 => 0u32..=15, 1 => any::<u32>()],
                    1..=5,
                )
                    .prop_flat_map(|v| {
                        let indexed: Vec<(usize, u32)> = v.into_iter().enumerate().collect();
                        (Just(indexed.clone()), Just(indexed).prop_shuffle())
                    })
            ) {
                let make = |entries: &[(usize, u32)]| {
                    let pairs: Vec<(&str, u32)> =
                        entries.iter().map(|(i, t)| (DRIVERS[*i], *t)).collect();
                    bet(&pairs, "Pierre Gasly")
                };
                let a = check(make(&tokens), before_start());
                let b = check(make(&shuffled), before_start());
                prop_assert_eq!(a.is_ok(), b.is_ok());
                prop_assert_eq!(a.err().map(|e| e.code()), b.err().map(|e| e.code()));

                let sum: u64 = tokens.iter().map(|(_, t)| u64::from(*t)).sum();
                if sum != 15 {
                    prop_assert_eq!(
                        check(make(&shuffled), before_start()).unwrap_err(),
                        BetError::TokenSumMismatch { expected: 15, found: sum }
                    );
                }
            }

            /// Property: one entry above the budget is rejected whatever the others hold
            #[test]
            fn prop_entry_above_budget_always_rejected(
                big in 16u32..,
                rest in prop::collection::vec(any::<u32>(), 0..=4),
            ) {
                let mut pairs = vec![(DRIVERS[0], big)];
                pairs.extend(rest.iter().enumerate().map(|(i, t)| (DRIVERS[i + 1], *t)));
                let err = check(bet(&pairs, "Pierre Gasly"), before_start()).unwrap_err();
                prop_assert_eq!(err.code(), "ERR_TOKEN_SUM_MISMATCH");
            }
        }
    }
}
