//! Error taxonomy of the rules engine
//!
//! Every error carries a stable `code()` for presentation layers and an
//! [`ErrorKind`] so callers can tell "time is up" from "bad bet".

use crate::models::{DriverId, EventId, ParticipantId, ResultError, Season};
use crate::rules::ConfigError;
use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bet or pick breaks a business rule
    Validation,
    /// Submission arrived after the cutoff
    Deadline,
    /// Missed bet could not be carried over
    CarryOver,
    /// Data references drivers/events the engine cannot reconcile
    DataInconsistency,
    Storage,
    Config,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BetError {
    #[error("Event {event} is not open for betting")]
    EventInactive { event: EventId },

    #[error("Deadline passed at {cutoff} (submitted {submitted})")]
    DeadlinePassed { cutoff: DateTime<FixedOffset>, submitted: DateTime<Utc> },

    #[error("Tokens must add up to {expected}, found {found}")]
    TokenSumMismatch { expected: u32, found: u64 },

    #[error("Driver {driver} appears more than once")]
    DuplicateDriver { driver: DriverId },

    #[error("Driver {driver} is not in the active roster")]
    UnknownDriver { driver: DriverId },

    #[error("Two drivers from {team} in the same bet")]
    DuplicateTeam { team: String },

    #[error("At least {required} drivers from different teams are required, found {found}")]
    TooFewDrivers { required: usize, found: usize },

    #[error("At most {max} entries are allowed, found {found}")]
    TooManyEntries { max: usize, found: usize },

    #[error("11th-place guess {driver} is also one of the bet drivers")]
    EleventhConflict { driver: DriverId },

    #[error("Championship picks for {season} closed at {cutoff}")]
    ChampionshipClosed { season: Season, cutoff: DateTime<FixedOffset> },

    #[error("Runner-up pick must differ from the champion pick")]
    SameChampionAndRunnerUp,

    #[error("Participant {participant} is inactive")]
    InactiveParticipant { participant: ParticipantId },
}

impl BetError {
    pub fn code(&self) -> &'static str {
        match self {
            BetError::EventInactive { .. } => "ERR_EVENT_INACTIVE",
            BetError::DeadlinePassed { .. } => "ERR_DEADLINE_PASSED",
            BetError::TokenSumMismatch { .. } => "ERR_TOKEN_SUM_MISMATCH",
            BetError::DuplicateDriver { .. } => "ERR_DUPLICATE_DRIVER",
            BetError::UnknownDriver { .. } => "ERR_UNKNOWN_DRIVER",
            BetError::DuplicateTeam { .. } => "ERR_DUPLICATE_TEAM",
            BetError::TooFewDrivers { .. } => "ERR_TOO_FEW_DRIVERS",
            BetError::TooManyEntries { .. } => "ERR_TOO_MANY_ENTRIES",
            BetError::EleventhConflict { .. } => "ERR_ELEVENTH_CONFLICT",
            BetError::ChampionshipClosed { .. } => "ERR_CHAMPIONSHIP_CLOSED",
            BetError::SameChampionAndRunnerUp => "ERR_SAME_CHAMPION_AND_RUNNER_UP",
            BetError::InactiveParticipant { .. } => "ERR_INACTIVE_PARTICIPANT",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BetError::DeadlinePassed { .. } | BetError::ChampionshipClosed { .. } => {
                ErrorKind::Deadline
            }
            BetError::UnknownDriver { .. } => ErrorKind::DataInconsistency,
            _ => ErrorKind::Validation,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Bet for {bet_event} scored against result of {result_event}")]
    EventMismatch { bet_event: EventId, result_event: EventId },

    #[error("Driver {driver} is not in the roster")]
    UnknownDriver { driver: DriverId },
}

impl ScoringError {
    pub fn code(&self) -> &'static str {
        match self {
            ScoringError::EventMismatch { .. } => "ERR_EVENT_MISMATCH",
            ScoringError::UnknownDriver { .. } => "ERR_UNKNOWN_DRIVER",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarryOverError {
    #[error("Event {event} is not part of the season")]
    UnknownEvent { event: EventId },

    #[error("Event {event} is inactive")]
    EventInactive { event: EventId },

    #[error("Participant {participant} already has a bet for {event}")]
    AlreadyHasBet { participant: ParticipantId, event: EventId },

    #[error("Betting window for {event} is still open until {cutoff}")]
    WindowOpen { event: EventId, cutoff: DateTime<FixedOffset> },

    #[error("Participant {participant} has no prior bet to copy for {event}")]
    NoPriorBet { participant: ParticipantId, event: EventId },

    #[error("Missed bet of {participant} for {event} needs manual resolution")]
    AdminResolutionRequired { participant: ParticipantId, event: EventId },

    #[error("Official result for {event} is required to build a fallback bet")]
    ResultPending { event: EventId },

    #[error("No eligible driver for a fallback bet on {event}")]
    NoEligibleDriver { event: EventId },
}

impl CarryOverError {
    pub fn code(&self) -> &'static str {
        match self {
            CarryOverError::UnknownEvent { .. } => "ERR_UNKNOWN_EVENT",
            CarryOverError::EventInactive { .. } => "ERR_EVENT_INACTIVE",
            CarryOverError::AlreadyHasBet { .. } => "ERR_ALREADY_HAS_BET",
            CarryOverError::WindowOpen { .. } => "ERR_WINDOW_OPEN",
            CarryOverError::NoPriorBet { .. } => "ERR_NO_PRIOR_BET",
            CarryOverError::AdminResolutionRequired { .. } => "ERR_ADMIN_RESOLUTION_REQUIRED",
            CarryOverError::ResultPending { .. } => "ERR_RESULT_PENDING",
            CarryOverError::NoEligibleDriver { .. } => "ERR_NO_ELIGIBLE_DRIVER",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed snapshot: {0}")]
    Format(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Bet(#[from] BetError),

    #[error(transparent)]
    CarryOver(#[from] CarryOverError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Malformed official result: {0}")]
    Result(#[from] ResultError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown event {0}")]
    UnknownEvent(EventId),

    #[error("Unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Participant {0} is already registered")]
    ParticipantExists(ParticipantId),

    #[error("Result for {0} was already posted")]
    ResultAlreadyPosted(EventId),

    #[error("Result for {event} references unknown driver {driver}")]
    InconsistentResult { event: EventId, driver: DriverId },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Bet(e) => e.code(),
            EngineError::CarryOver(e) => e.code(),
            EngineError::Scoring(e) => e.code(),
            EngineError::Result(e) => e.code(),
            EngineError::Config(e) => e.code(),
            EngineError::Storage(_) => "ERR_STORAGE",
            EngineError::UnknownEvent(_) => "ERR_UNKNOWN_EVENT",
            EngineError::UnknownParticipant(_) => "ERR_UNKNOWN_PARTICIPANT",
            EngineError::ParticipantExists(_) => "ERR_PARTICIPANT_EXISTS",
            EngineError::ResultAlreadyPosted(_) => "ERR_RESULT_ALREADY_POSTED",
            EngineError::InconsistentResult { .. } => "ERR_UNKNOWN_DRIVER",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Bet(e) => e.kind(),
            EngineError::CarryOver(_) => ErrorKind::CarryOver,
            EngineError::Scoring(_)
            | EngineError::Result(_)
            | EngineError::InconsistentResult { .. } => ErrorKind::DataInconsistency,
            EngineError::Config(_) => ErrorKind::Config,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::UnknownEvent(_)
            | EngineError::UnknownParticipant(_)
            | EngineError::ParticipantExists(_)
            | EngineError::ResultAlreadyPosted(_) => ErrorKind::Validation,
        }
    }

    /// Whether the submitter can fix the problem and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::Bet(e) => e.kind() != ErrorKind::DataInconsistency,
            EngineError::CarryOver(CarryOverError::AdminResolutionRequired { .. }) => false,
            EngineError::CarryOver(_) => true,
            EngineError::Storage(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
