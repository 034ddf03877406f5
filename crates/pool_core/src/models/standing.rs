use super::ids::ParticipantId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Secondary comparisons used when totals tie, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TieBreakCriteria {
    /// Bets placed by the participant before the deadline
    pub on_time_bets: u32,
    pub eleventh_hits: u32,
    pub champion_hit: bool,
    pub constructor_hit: bool,
    pub runner_up_hit: bool,
}

/// One row of the season table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Standing {
    /// 1-based rank after tie-breaks
    pub position: u32,
    pub participant: ParticipantId,
    pub name: String,
    pub total_points: i64,
    /// One slot per season event in date order; `None` = pending/unscored
    pub per_event_points: Vec<Option<i64>>,
    pub championship_points: i64,
    pub starting_points: i64,
    pub tie_break: TieBreakCriteria,
}
