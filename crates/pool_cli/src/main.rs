//! Pool CLI
//!
//! Administrative front end over a JSON season snapshot: standings, bet
//! validation, result posting, carry-over resolution, deadlines and the
//! standings JSON schema.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pool_cli::{
    load_catalog, open_engine, parse_instant, render_deadlines, render_standings, save_engine,
};
use pool_core::models::{Bet, EventId, OfficialResult, ParticipantId, Season, Standing};
use pool_core::storage::Storage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "pool")]
#[command(about = "Racing prediction pool administration", long_about = None)]
struct Cli {
    /// Rules YAML (defaults to the bundled rules)
    #[arg(long, global = true, env = "POOL_RULES_PATH")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the season standings
    Standings {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        season: Season,

        /// Emit JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Validate (and optionally store) a bet read from a JSON file
    Validate {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        bet: PathBuf,

        /// Evaluate the deadline at this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,

        /// Save the accepted bet back into the snapshot
        #[arg(long, default_value = "false")]
        write: bool,
    },

    /// Post an official result read from a JSON file
    PostResult {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        result: PathBuf,
    },

    /// Fill a missed event with an automatic bet
    Resolve {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        participant: u32,

        #[arg(long)]
        event: u32,

        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,

        #[arg(long, default_value = "false")]
        write: bool,
    },

    /// List betting cutoffs for a season
    Deadlines {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        season: Season,
    },

    /// Print the JSON schema of a standings row
    Schema,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let catalog = load_catalog(cli.rules.as_deref())?;
    tracing::debug!(rules = ?cli.rules, "Rules catalog ready");

    match cli.command {
        Commands::Standings { snapshot, season, json } => {
            let engine = open_engine(&snapshot, catalog, None)?;
            let standings = engine.season_standings(season)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&standings)?);
            } else {
                let events = engine.storage().load_events(season)?;
                print!("{}", render_standings(&standings, &events));
            }
        }

        Commands::Validate { snapshot, bet, now, write } => {
            let engine = open_engine(&snapshot, catalog, now)?;
            let bet: Bet = read_json(&bet)?;
            match engine.submit_bet(bet) {
                Ok(valid) => println!("✅ Bet accepted: {}", valid.summary()),
                Err(err) => anyhow::bail!("❌ Bet rejected [{}]: {}", err.code(), err),
            }
            if write {
                save_engine(&engine, &snapshot)?;
            }
        }

        Commands::PostResult { snapshot, result } => {
            let engine = open_engine(&snapshot, catalog, None)?;
            let result: OfficialResult = read_json(&result)?;
            let event = result.event();
            engine
                .post_result(result)
                .with_context(|| format!("Failed to post result for {event}"))?;
            save_engine(&engine, &snapshot)?;
            println!("✅ Result for {} posted", event);
        }

        Commands::Resolve { snapshot, participant, event, now, write } => {
            let engine = open_engine(&snapshot, catalog, now)?;
            let carry = engine.resolve_missed(ParticipantId(participant), EventId(event))?;
            println!("✅ Automatic bet ({:?}): {}", carry.source, carry.bet.summary());
            println!("   automatic = {}", carry.bet.automatic);
            if write {
                save_engine(&engine, &snapshot)?;
            }
        }

        Commands::Deadlines { snapshot, season } => {
            let engine = open_engine(&snapshot, catalog, None)?;
            let events = engine.storage().load_events(season)?;
            print!("{}", render_deadlines(&events, engine.deadlines()));
        }

        Commands::Schema => {
            let schema = schemars::schema_for!(Standing);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
