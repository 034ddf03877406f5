//! # pool_core - Betting & Scoring Rules Engine
//!
//! Rules engine for a season-long racing prediction pool: participants spread
//! a token budget over drivers for each event, guess the 11th-place finisher
//! and pick the season's champions.
//!
//! ## Features
//! - Season/format-scoped rule sets loaded from YAML (`rules`)
//! - Timezone-aware betting deadlines (`deadline`)
//! - Bet validation with precise, coded rejections (`validator`)
//! - Per-event and championship scoring with pending results kept explicit (`scoring`)
//! - Automatic carry-over bets with penalty escalation (`carry_over`)
//! - Tie-broken season standings, scored in parallel (`standings`, `season`)
//! - An engine facade serializing writes per (participant, event) (`engine`)

// Engine operations take the full set of collaborators explicitly
#![allow(clippy::too_many_arguments)]

pub mod carry_over;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod models;
pub mod rules;
pub mod scoring;
pub mod season;
pub mod standings;
pub mod storage;
pub mod validator;

pub use carry_over::{CarryOver, CarryOverResolver, CarryOverSource};
pub use deadline::{Clock, Cutoff, DeadlineClock, FixedClock, SystemClock};
pub use engine::PoolEngine;
pub use error::{
    BetError, CarryOverError, EngineError, ErrorKind, Result, ScoringError, StorageError,
};
pub use rules::{PoolConfig, RuleSet, RulesCatalog};
pub use scoring::{score_bet, score_bet_checked, score_championship, BetScore, EventScore};
pub use standings::{late_entry_allowance, rank, StandingInput};
pub use storage::{AuditEntry, InMemoryStorage, SeasonSnapshot, Storage};
pub use validator::BetValidator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
