//! Domain data for the prediction pool
//!
//! Drivers, events, bets, official results and championship picks, plus the
//! derived standing rows handed to presentation layers.

pub mod bet;
pub mod championship;
pub mod driver;
pub mod event;
pub mod ids;
pub mod participant;
pub mod result;
pub mod standing;

pub use bet::{Bet, BetEntry, ValidBet};
pub use championship::{ChampionshipPick, ChampionshipResult};
pub use driver::{Driver, Roster};
pub use event::{Event, EventFormat, EventStatus};
pub use ids::{DriverId, EventId, ParticipantId, Season};
pub use participant::Participant;
pub use result::{OfficialResult, ResultError, ELEVENTH_POSITION};
pub use standing::{Standing, TieBreakCriteria};
