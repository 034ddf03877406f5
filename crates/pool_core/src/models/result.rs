//! Official finishing order of an event
//!
//! Results arrive as a loose position → driver map (the admin form and the
//! legacy `posicoes` column both use string keys). They are validated once,
//! here, and carried as a typed map afterwards.

use super::ids::{DriverId, EventId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Position whose driver is the target of the bonus guess
pub const ELEVENTH_POSITION: u8 = 11;

/// Positions 1..=10 are the classified finishers
const CLASSIFIED_POSITIONS: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    #[error("Result is missing position {0}")]
    MissingPosition(u8),

    #[error("Invalid position key '{0}' (expected 1..=11)")]
    InvalidPosition(String),

    #[error("Position {0} has no driver")]
    EmptyDriver(u8),

    #[error("Driver {driver} appears at positions {first} and {second}")]
    DuplicateDriver { driver: DriverId, first: u8, second: u8 },
}

impl ResultError {
    pub fn code(&self) -> &'static str {
        match self {
            ResultError::MissingPosition(_) => "ERR_RESULT_MISSING_POSITION",
            ResultError::InvalidPosition(_) => "ERR_RESULT_INVALID_POSITION",
            ResultError::EmptyDriver(_) => "ERR_RESULT_EMPTY_DRIVER",
            ResultError::DuplicateDriver { .. } => "ERR_RESULT_DUPLICATE_DRIVER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOfficialResult", into = "RawOfficialResult")]
pub struct OfficialResult {
    event: EventId,
    positions: BTreeMap<u8, DriverId>,
}

/// Wire form: `{ "event": 3, "positions": { "1": "Lando Norris", ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawOfficialResult {
    event: EventId,
    positions: BTreeMap<String, String>,
}

impl TryFrom<RawOfficialResult> for OfficialResult {
    type Error = ResultError;

    fn try_from(raw: RawOfficialResult) -> Result<Self, Self::Error> {
        let mut positions = BTreeMap::new();
        for (key, driver) in raw.positions {
            let pos: u8 = key
                .trim()
                .parse()
                .ok()
                .filter(|p| (1..=ELEVENTH_POSITION).contains(p))
                .ok_or_else(|| ResultError::InvalidPosition(key.clone()))?;
            positions.insert(pos, DriverId::new(driver.trim()));
        }
        OfficialResult::new(raw.event, positions)
    }
}

impl From<OfficialResult> for RawOfficialResult {
    fn from(result: OfficialResult) -> Self {
        Self {
            event: result.event,
            positions: result
                .positions
                .into_iter()
                .map(|(pos, driver)| (pos.to_string(), driver.0))
                .collect(),
        }
    }
}

impl OfficialResult {
    /// Build a result from a complete position map (1..=11)
    pub fn new(event: EventId, positions: BTreeMap<u8, DriverId>) -> Result<Self, ResultError> {
        if let Some(pos) = positions.keys().find(|p| !(1..=ELEVENTH_POSITION).contains(*p)) {
            return Err(ResultError::InvalidPosition(pos.to_string()));
        }

        let mut seen: BTreeMap<&DriverId, u8> = BTreeMap::new();
        for pos in 1..=ELEVENTH_POSITION {
            let driver = positions.get(&pos).ok_or(ResultError::MissingPosition(pos))?;
            if driver.as_str().is_empty() {
                return Err(ResultError::EmptyDriver(pos));
            }
            // The 11th place is an independent fact and may repeat a classified driver
            if pos > CLASSIFIED_POSITIONS {
                continue;
            }
            if let Some(first) = seen.insert(driver, pos) {
                return Err(ResultError::DuplicateDriver {
                    driver: driver.clone(),
                    first,
                    second: pos,
                });
            }
        }

        Ok(Self { event, positions })
    }

    /// Convenience constructor from the top-10 order plus the 11th-place driver
    pub fn from_order(event: EventId, top10: &[&str], eleventh: &str) -> Result<Self, ResultError> {
        let mut positions: BTreeMap<u8, DriverId> = top10
            .iter()
            .enumerate()
            .map(|(i, name)| ((i + 1) as u8, DriverId::new(*name)))
            .collect();
        positions.insert(ELEVENTH_POSITION, DriverId::new(eleventh));
        Self::new(event, positions)
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    pub fn driver_at(&self, position: u8) -> Option<&DriverId> {
        self.positions.get(&position)
    }

    /// Finishing position among the classified places (1..=10)
    pub fn position_of(&self, driver: &DriverId) -> Option<u8> {
        self.positions
            .iter()
            .find(|(pos, d)| **pos <= CLASSIFIED_POSITIONS && *d == driver)
            .map(|(pos, _)| *pos)
    }

    pub fn eleventh(&self) -> &DriverId {
        // Presence is guaranteed by `new`
        &self.positions[&ELEVENTH_POSITION]
    }

    /// Drivers finishing within the first `range` positions
    pub fn scored_drivers(&self, range: usize) -> impl Iterator<Item = &DriverId> {
        self.positions.iter().filter(move |(pos, _)| (**pos as usize) <= range).map(|(_, d)| d)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &DriverId> {
        self.positions.values()
    }
}
