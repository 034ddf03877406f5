use super::ids::{EventId, Season};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventFormat {
    #[default]
    Normal,
    Sprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    Active,
    Inactive,
}

/// One race weekend session that participants bet on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub season: Season,
    pub name: String,
    pub date: NaiveDate,
    /// Local start time as entered by admins ("10:00", "9h30", ...)
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub format: EventFormat,
}

impl Event {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }
}

/// Active events of a season in chronological order (ties by id)
pub fn chronological(events: &[Event]) -> Vec<&Event> {
    let mut ordered: Vec<&Event> = events.iter().filter(|e| e.is_active()).collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    ordered
}
