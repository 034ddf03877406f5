use super::ids::DriverId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    /// Constructor the driver races for; drives the team-diversity rule
    pub team: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Driver {
    pub fn new(name: &str, team: &str) -> Self {
        Self { id: DriverId::new(name), name: name.to_string(), team: team.to_string(), active: true }
    }

    pub fn retired(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Driver lookup keyed by id, ordered so "first driver" is deterministic
#[derive(Debug, Clone, Default)]
pub struct Roster {
    drivers: BTreeMap<DriverId, Driver>,
}

impl Roster {
    pub fn new(drivers: impl IntoIterator<Item = Driver>) -> Self {
        Self { drivers: drivers.into_iter().map(|d| (d.id.clone(), d)).collect() }
    }

    pub fn get(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.get(id)
    }

    pub fn is_known(&self, id: &DriverId) -> bool {
        self.drivers.contains_key(id)
    }

    /// Team of an active driver; retired or unknown drivers yield `None`
    pub fn active_team(&self, id: &DriverId) -> Option<&str> {
        self.drivers.get(id).filter(|d| d.active).map(|d| d.team.as_str())
    }

    pub fn active(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values().filter(|d| d.active)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retired_driver_has_no_active_team() {
        let roster = Roster::new(vec![
            Driver::new("Max Verstappen", "Red Bull"),
            Driver::new("Jack Doohan", "Alpine").retired(),
        ]);

        assert_eq!(roster.active_team(&"Max Verstappen".into()), Some("Red Bull"));
        assert_eq!(roster.active_team(&"Jack Doohan".into()), None);
        assert!(roster.is_known(&"Jack Doohan".into()));
        assert_eq!(roster.active().count(), 1);
    }
}
