//! Pool configuration (YAML)

use super::rule_set::RuleSet;
use crate::models::Season;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unsupported rules version: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Invalid rules for {scope}: {reason}")]
    Invalid { scope: String, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "ERR_CONFIG_IO",
            ConfigError::Parse(_) => "ERR_CONFIG_PARSE",
            ConfigError::VersionMismatch { .. } => "ERR_CONFIG_VERSION",
            ConfigError::Invalid { .. } => "ERR_CONFIG_INVALID",
        }
    }
}

/// Deadline parameters shared by the whole championship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Offset of the championship reference zone from UTC
    pub utc_offset_minutes: i32,
    /// Extra time after the first start for championship picks
    pub championship_grace_seconds: i64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: -180, championship_grace_seconds: 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatRules {
    pub normal: RuleSet,
    pub sprint: RuleSet,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self { normal: RuleSet::normal(), sprint: RuleSet::sprint() }
    }
}

/// Partial rule set; unset fields inherit from the defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOverride {
    pub position_points: Option<Vec<i64>>,
    pub bonus_eleventh: Option<i64>,
    pub token_budget: Option<u32>,
    pub min_distinct_drivers: Option<usize>,
    pub max_entries: Option<usize>,
    pub champion_bonus: Option<i64>,
    pub vice_bonus: Option<i64>,
    pub team_bonus: Option<i64>,
    pub penalty_factor_from_second_miss: Option<f64>,
    pub penalty_threshold: Option<u32>,
    pub late_entry_factor: Option<f64>,
}

impl RuleOverride {
    pub fn apply(&self, base: &RuleSet) -> RuleSet {
        let mut rules = base.clone();
        if let Some(points) = &self.position_points {
            rules.position_points = points.clone();
        }
        if let Some(v) = self.bonus_eleventh {
            rules.bonus_eleventh = v;
        }
        if let Some(v) = self.token_budget {
            rules.token_budget = v;
        }
        if let Some(v) = self.min_distinct_drivers {
            rules.min_distinct_drivers = v;
        }
        if let Some(v) = self.max_entries {
            rules.max_entries = v;
        }
        if let Some(v) = self.champion_bonus {
            rules.champion_bonus = v;
        }
        if let Some(v) = self.vice_bonus {
            rules.vice_bonus = v;
        }
        if let Some(v) = self.team_bonus {
            rules.team_bonus = v;
        }
        if let Some(v) = self.penalty_factor_from_second_miss {
            rules.penalty_factor_from_second_miss = v;
        }
        if let Some(v) = self.penalty_threshold {
            rules.penalty_threshold = v;
        }
        if let Some(v) = self.late_entry_factor {
            rules.late_entry_factor = v;
        }
        rules
    }
}

/// Season-scoped overrides; `common` is applied before the per-format block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonRules {
    pub common: RuleOverride,
    pub normal: RuleOverride,
    pub sprint: RuleOverride,
}

impl SeasonRules {
    pub fn resolve(&self, defaults: &FormatRules) -> FormatRules {
        FormatRules {
            normal: self.normal.apply(&self.common.apply(&defaults.normal)),
            sprint: self.sprint.apply(&self.common.apply(&defaults.sprint)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub defaults: FormatRules,
    #[serde(default)]
    pub seasons: BTreeMap<Season, SeasonRules>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            clock: ClockConfig::default(),
            defaults: FormatRules::default(),
            seasons: BTreeMap::new(),
        }
    }
}

impl PoolConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        if !(-12 * 60..=14 * 60).contains(&self.clock.utc_offset_minutes) {
            return Err(ConfigError::Invalid {
                scope: "clock".to_string(),
                reason: format!("utc offset {} min out of range", self.clock.utc_offset_minutes),
            });
        }
        if self.clock.championship_grace_seconds < 0 {
            return Err(ConfigError::Invalid {
                scope: "clock".to_string(),
                reason: "championship grace must not be negative".to_string(),
            });
        }

        validate_format_rules("defaults", &self.defaults)?;
        for (season, overrides) in &self.seasons {
            validate_format_rules(&format!("season {season}"), &overrides.resolve(&self.defaults))?;
        }
        Ok(())
    }
}

fn validate_format_rules(scope: &str, rules: &FormatRules) -> Result<(), ConfigError> {
    validate_rule_set(&format!("{scope}/normal"), &rules.normal)?;
    validate_rule_set(&format!("{scope}/sprint"), &rules.sprint)
}

fn validate_rule_set(scope: &str, rules: &RuleSet) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        scope: scope.to_string(),
        reason: reason.to_string(),
    };

    if rules.position_points.is_empty() || rules.position_points.len() > 10 {
        return Err(invalid("point table must have 1..=10 entries"));
    }
    if rules.position_points.iter().any(|p| *p < 0) {
        return Err(invalid("point table must not contain negative values"));
    }
    if rules.token_budget == 0 {
        return Err(invalid("token budget must be positive"));
    }
    if rules.min_distinct_drivers == 0 {
        return Err(invalid("at least one driver must be required"));
    }
    if rules.max_entries < rules.min_distinct_drivers {
        return Err(invalid("max entries is below the minimum driver count"));
    }
    if !(0.0..=1.0).contains(&rules.penalty_factor_from_second_miss) {
        return Err(invalid("penalty factor must be within [0, 1]"));
    }
    if !(0.0..=1.0).contains(&rules.late_entry_factor) {
        return Err(invalid("late entry factor must be within [0, 1]"));
    }
    Ok(())
}
