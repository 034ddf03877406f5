use super::config::{ClockConfig, ConfigError, FormatRules, PoolConfig};
use super::rule_set::RuleSet;
use crate::models::{EventFormat, Season};
use std::collections::BTreeMap;
use std::path::Path;
use std::{env, fs};

/// Bundled rule configuration (compile-time embedded)
pub const BUNDLED_RULES_YAML: &str = include_str!("../../../../data/rules/default_rules.yaml");

/// Env var pointing at a rules YAML file; unset or empty means defaults
pub const RULES_PATH_ENV: &str = "POOL_RULES_PATH";

/// Resolves the rule set for (season, format). Lookups never fail: seasons
/// without overrides get the defaults.
#[derive(Debug, Clone)]
pub struct RulesCatalog {
    clock: ClockConfig,
    defaults: FormatRules,
    seasons: BTreeMap<Season, FormatRules>,
}

impl Default for RulesCatalog {
    fn default() -> Self {
        Self::from_config(PoolConfig::default())
    }
}

impl RulesCatalog {
    pub fn from_config(config: PoolConfig) -> Self {
        let seasons = config
            .seasons
            .iter()
            .map(|(season, overrides)| (*season, overrides.resolve(&config.defaults)))
            .collect();
        Self { clock: config.clock, defaults: config.defaults, seasons }
    }

    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_RULES_YAML)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        PoolConfig::from_yaml(content).map(Self::from_config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let catalog = Self::from_yaml(&content)?;
        tracing::info!(path = %path.display(), seasons = catalog.seasons.len(), "Loaded rules");
        Ok(catalog)
    }

    /// Load from `POOL_RULES_PATH` when set, else the compiled defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(RULES_PATH_ENV) else {
            return Ok(Self::default());
        };
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }
        Self::from_path(Path::new(path))
    }

    pub fn resolve(&self, season: Season, format: EventFormat) -> &RuleSet {
        let rules = self.seasons.get(&season).unwrap_or(&self.defaults);
        match format {
            EventFormat::Normal => &rules.normal,
            EventFormat::Sprint => &rules.sprint,
        }
    }

    /// Championship bonuses follow the season's Normal rule set
    pub fn championship_rules(&self, season: Season) -> &RuleSet {
        self.resolve(season, EventFormat::Normal)
    }

    pub fn clock(&self) -> &ClockConfig {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_matches_compiled_defaults() {
        let bundled = RulesCatalog::bundled().unwrap();
        let compiled = RulesCatalog::default();

        for format in [EventFormat::Normal, EventFormat::Sprint] {
            assert_eq!(bundled.resolve(2025, format), compiled.resolve(2025, format));
        }
        assert_eq!(bundled.clock(), compiled.clock());
    }

    #[test]
    fn test_season_override_only_affects_that_season() {
        let yaml = r#"
version: 1
seasons:
  2026:
    sprint:
      bonus_eleventh: 12
"#;
        let catalog = RulesCatalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.resolve(2026, EventFormat::Sprint).bonus_eleventh, 12);
        assert_eq!(catalog.resolve(2026, EventFormat::Normal).bonus_eleventh, 25);
        assert_eq!(catalog.resolve(2025, EventFormat::Sprint).bonus_eleventh, 25);
    }

    #[test]
    fn test_default_tables() {
        let catalog = RulesCatalog::default();
        let normal = catalog.resolve(2025, EventFormat::Normal);
        let sprint = catalog.resolve(2025, EventFormat::Sprint);

        assert_eq!(normal.position_points, vec![25, 18, 15, 12, 10, 8, 6, 4, 2, 1]);
        assert_eq!(sprint.position_points, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(normal.token_budget, 15);
        assert_eq!(normal.min_distinct_drivers, 3);
        assert_eq!(
            (normal.champion_bonus, normal.vice_bonus, normal.team_bonus),
            (150, 100, 80)
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "version: 1\nclock:\n  utc_offset_minutes: 0\n  championship_grace_seconds: 0")
            .unwrap();

        let catalog = RulesCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.clock().utc_offset_minutes, 0);

        let missing = RulesCatalog::from_path(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert_eq!(missing.code(), "ERR_CONFIG_IO");
    }
}
