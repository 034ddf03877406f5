use super::ids::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Allowance granted on late entry, added to the season total
    #[serde(default)]
    pub starting_points: i64,
    /// Joined after the season started; championship picks do not score
    #[serde(default)]
    pub late_entry: bool,
}

fn default_active() -> bool {
    true
}

impl Participant {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.to_string(),
            active: true,
            starting_points: 0,
            late_entry: false,
        }
    }
}
