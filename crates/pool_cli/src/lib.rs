//! Pool CLI Library
//!
//! Snapshot loading, engine wiring and plain-text rendering behind the
//! `pool` binary.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pool_core::deadline::{Clock, DeadlineClock, FixedClock, SystemClock};
use pool_core::models::event::chronological;
use pool_core::models::{Event, Standing};
use pool_core::{InMemoryStorage, PoolEngine, RulesCatalog, SeasonSnapshot};
use std::fmt;
use std::path::Path;

/// Wall clock, or a fixed instant passed with `--now`
#[derive(Debug, Clone, Copy)]
pub enum CliClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl CliClock {
    pub fn new(now: Option<DateTime<Utc>>) -> Self {
        match now {
            Some(instant) => CliClock::Fixed(FixedClock(instant)),
            None => CliClock::System(SystemClock),
        }
    }
}

impl Clock for CliClock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            CliClock::System(clock) => clock.now(),
            CliClock::Fixed(clock) => clock.now(),
        }
    }
}

pub type CliEngine = PoolEngine<InMemoryStorage, CliClock>;

/// RFC 3339 instant, e.g. `2025-03-16T12:59:00-03:00`
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|instant| instant.with_timezone(&Utc))
}

pub fn load_catalog(rules: Option<&Path>) -> Result<RulesCatalog> {
    match rules {
        Some(path) => RulesCatalog::from_path(path)
            .with_context(|| format!("Failed to load rules: {}", path.display())),
        None => RulesCatalog::bundled().context("Bundled rules are invalid"),
    }
}

pub fn open_engine(
    snapshot: &Path,
    catalog: RulesCatalog,
    now: Option<DateTime<Utc>>,
) -> Result<CliEngine> {
    let snapshot = SeasonSnapshot::load_from_path(snapshot)
        .with_context(|| format!("Failed to read snapshot: {}", snapshot.display()))?;
    Ok(PoolEngine::new(InMemoryStorage::from_snapshot(snapshot), CliClock::new(now), catalog))
}

/// Write the engine's storage back over the snapshot file
pub fn save_engine(engine: &CliEngine, path: &Path) -> Result<()> {
    engine
        .storage()
        .snapshot()
        .save_to_path(path)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))
}

/// Season table, one column per active event; `-` marks pending points
pub struct StandingsTable<'a> {
    pub standings: &'a [Standing],
    pub events: &'a [Event],
}

impl fmt::Display for StandingsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = chronological(self.events);

        write!(f, "{:>3}  {:<16} {:>6} {:>6}", "Pos", "Participant", "Total", "Champ")?;
        for event in &columns {
            write!(f, " {:>6}", event.id.to_string())?;
        }
        writeln!(f)?;

        for row in self.standings {
            write!(
                f,
                "{:>3}  {:<16} {:>6} {:>6}",
                row.position, row.name, row.total_points, row.championship_points
            )?;
            for points in &row.per_event_points {
                let cell = points.map_or_else(|| "-".to_string(), |p| p.to_string());
                write!(f, " {:>6}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Cutoff of every active event plus the championship pick window
pub struct DeadlineListing<'a> {
    pub events: &'a [Event],
    pub clock: &'a DeadlineClock,
}

impl fmt::Display for DeadlineListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in chronological(self.events) {
            let cutoff = self.clock.cutoff(event);
            let note = if cutoff.fallback { "  (start time unreadable, start of day)" } else { "" };
            writeln!(f, "{:<4} {}  {}{}", event.id.to_string(), cutoff.at, event.name, note)?;
        }
        match self.clock.championship_window(self.events) {
            Some(window) => writeln!(f, "Championship picks close at {}", window.closes_at),
            None => writeln!(f, "Championship picks open (no active events)"),
        }
    }
}

pub fn render_standings(standings: &[Standing], events: &[Event]) -> String {
    StandingsTable { standings, events }.to_string()
}

pub fn render_deadlines(events: &[Event], clock: &DeadlineClock) -> String {
    DeadlineListing { events, clock }.to_string()
}
