use super::ids::{DriverId, EventId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetEntry {
    pub driver: DriverId,
    pub tokens: u32,
}

impl BetEntry {
    pub fn new(driver: impl Into<String>, tokens: u32) -> Self {
        Self { driver: DriverId::new(driver), tokens }
    }
}

/// The current bet of one participant for one event
///
/// At most one bet exists per (participant, event); a resubmission replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub participant: ParticipantId,
    pub event: EventId,
    pub entries: Vec<BetEntry>,
    /// Guess for the driver finishing 11th
    pub eleventh: DriverId,
    pub submitted_at: DateTime<Utc>,
    /// 0 = placed by the participant; n >= 1 = n-th automatic bet of the season
    #[serde(default)]
    pub automatic: u32,
}

impl Bet {
    pub fn new(
        participant: ParticipantId,
        event: EventId,
        entries: Vec<BetEntry>,
        eleventh: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            participant,
            event,
            entries,
            eleventh: DriverId::new(eleventh),
            submitted_at,
            automatic: 0,
        }
    }

    pub fn with_automatic(mut self, automatic: u32) -> Self {
        self.automatic = automatic;
        self
    }

    /// Entries that actually carry tokens; zero-token rows are ignored by every rule
    pub fn token_bearing(&self) -> impl Iterator<Item = &BetEntry> {
        self.entries.iter().filter(|e| e.tokens > 0)
    }

    /// Widened so oversized entries cannot wrap the sum
    pub fn total_tokens(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.tokens)).sum()
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic > 0
    }

    pub fn key(&self) -> (ParticipantId, EventId) {
        (self.participant, self.event)
    }

    /// One-line description used by the audit trail
    pub fn summary(&self) -> String {
        let picks: Vec<String> =
            self.token_bearing().map(|e| format!("{}:{}", e.driver, e.tokens)).collect();
        format!("[{}] 11th: {}", picks.join(", "), self.eleventh)
    }
}

/// A bet that passed validation; only the validator constructs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidBet(Bet);

impl ValidBet {
    pub(crate) fn new_unchecked(bet: Bet) -> Self {
        Self(bet)
    }

    pub fn into_inner(self) -> Bet {
        self.0
    }
}

impl Deref for ValidBet {
    type Target = Bet;

    fn deref(&self) -> &Bet {
        &self.0
    }
}
