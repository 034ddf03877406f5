//! Betting deadlines
//!
//! Event dates and start times are entered in the championship's reference
//! zone. Per-event bets close exactly at the start; championship picks close
//! one grace period after the season's first start.

use crate::models::Event;
use crate::rules::ClockConfig;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::Serialize;

/// Supplies "now"; injected so deadline checks stay deterministic in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Absolute cutoff of one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cutoff {
    pub at: DateTime<FixedOffset>,
    /// Start time was missing or unreadable and start-of-day was used
    pub fallback: bool,
}

impl Cutoff {
    pub fn utc(&self) -> DateTime<Utc> {
        self.at.with_timezone(&Utc)
    }
}

/// Window for the season-opening championship picks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChampionshipWindow {
    pub first_start: DateTime<FixedOffset>,
    pub closes_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct DeadlineClock {
    offset: FixedOffset,
    championship_grace: Duration,
}

impl Default for DeadlineClock {
    fn default() -> Self {
        Self::new(&ClockConfig::default())
    }
}

impl DeadlineClock {
    pub fn new(config: &ClockConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).unwrap_or(Utc.fix());
        Self { offset, championship_grace: Duration::seconds(config.championship_grace_seconds) }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Cutoff instant of an event; never fails
    pub fn cutoff(&self, event: &Event) -> Cutoff {
        let parsed = event.start_time.as_deref().and_then(parse_start_time);
        let fallback = parsed.is_none();
        if fallback {
            tracing::debug!(
                event = %event.id,
                start_time = ?event.start_time,
                "Start time unreadable, using start of day"
            );
        }
        let time = parsed.unwrap_or(NaiveTime::MIN);
        Cutoff { at: self.localize(event.date.and_time(time)), fallback }
    }

    /// Per-event bets have no grace beyond the exact cutoff
    pub fn is_open(&self, event: &Event, now: DateTime<Utc>) -> bool {
        now <= self.cutoff(event).utc()
    }

    /// Earliest start among active events, preferring real start times.
    /// A start at exactly midnight counts as a placeholder, like a missing one.
    pub fn championship_window(&self, events: &[Event]) -> Option<ChampionshipWindow> {
        let cutoffs: Vec<Cutoff> =
            events.iter().filter(|e| e.is_active()).map(|e| self.cutoff(e)).collect();

        let exact = cutoffs
            .iter()
            .filter(|c| !c.fallback && c.at.time() != NaiveTime::MIN)
            .map(|c| c.at)
            .min();
        let first_start = exact.or_else(|| cutoffs.iter().map(|c| c.at).min())?;

        Some(ChampionshipWindow { first_start, closes_at: first_start + self.championship_grace })
    }

    /// Open while `now` is within the first start plus grace; a season with
    /// no active events has no deadline yet
    pub fn championship_open(&self, events: &[Event], now: DateTime<Utc>) -> bool {
        match self.championship_window(events) {
            Some(window) => now <= window.closes_at.with_timezone(&Utc),
            None => true,
        }
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    fn localize(&self, local: NaiveDateTime) -> DateTime<FixedOffset> {
        let utc = local - Duration::seconds(self.offset.local_minus_utc() as i64);
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }
}

/// Parse free-form start times: "10:00", "9:30", "14:00:00", "9h30", "Largada 16h00"
///
/// The leftmost time-shaped token decides; an out-of-range token ("25:00")
/// makes the whole text unreadable.
pub fn parse_start_time(raw: &str) -> Option<NaiveTime> {
    let normalized = raw.trim().to_lowercase().replace('h', ":");
    let bytes = normalized.as_bytes();
    let (hour, minute, second) = (0..bytes.len()).find_map(|start| match_time_at(bytes, start))?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn match_time_at(bytes: &[u8], start: usize) -> Option<(u32, u32, u32)> {
    // Two-digit hour preferred over one-digit
    for hour_len in [2, 1] {
        let Some(hour) = read_digits(bytes, start, hour_len) else {
            continue;
        };
        let mut pos = start + hour_len;
        if bytes.get(pos) != Some(&b':') {
            continue;
        }
        pos += 1;
        let Some(minute) = read_digits(bytes, pos, 2) else {
            continue;
        };
        pos += 2;
        let second = match (bytes.get(pos), read_digits(bytes, pos + 1, 2)) {
            (Some(b':'), Some(s)) => s,
            _ => 0,
        };
        return Some((hour, minute, second));
    }
    None
}

fn read_digits(bytes: &[u8], start: usize, len: usize) -> Option<u32> {
    let slice = bytes.get(start..start + len)?;
    if !slice.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(slice.iter().fold(0, |acc, b| acc * 10 + (b - b'0') as u32))
}
