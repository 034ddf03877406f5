use super::ids::{DriverId, ParticipantId, Season};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Season-opening prediction: champion, runner-up and constructors' champion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionshipPick {
    pub participant: ParticipantId,
    pub season: Season,
    pub champion: DriverId,
    pub runner_up: DriverId,
    pub constructor: String,
    pub submitted_at: DateTime<Utc>,
}

impl ChampionshipPick {
    pub fn summary(&self) -> String {
        format!(
            "champion: {}, runner-up: {}, constructor: {}",
            self.champion, self.runner_up, self.constructor
        )
    }
}

/// Final championship outcome, set (and replaceable) by an administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionshipResult {
    pub season: Season,
    pub champion: DriverId,
    pub runner_up: DriverId,
    pub constructor: String,
}
