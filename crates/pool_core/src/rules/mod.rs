//! # Rules Catalog
//!
//! Scoring parameters per (season, event format).
//!
//! ## Usage
//! ```rust
//! use pool_core::models::EventFormat;
//! use pool_core::rules::RulesCatalog;
//!
//! let catalog = RulesCatalog::default();
//! let sprint = catalog.resolve(2025, EventFormat::Sprint);
//! assert_eq!(sprint.scored_range(), 8);
//! ```

mod catalog;
mod config;
mod rule_set;

pub use catalog::{RulesCatalog, BUNDLED_RULES_YAML, RULES_PATH_ENV};
pub use config::{ClockConfig, ConfigError, FormatRules, PoolConfig, RuleOverride, SeasonRules};
pub use rule_set::RuleSet;
