//! Whole-season scoring
//!
//! Each event column is scored independently (in parallel) from immutable
//! inputs, then the columns are merged per participant and handed to the
//! ranker.

use crate::models::event::chronological;
use crate::models::{
    Bet, ChampionshipPick, ChampionshipResult, Event, EventId, OfficialResult, Participant,
    ParticipantId, Roster, Season, Standing,
};
use crate::rules::RulesCatalog;
use crate::scoring::{score_bet_checked, score_championship, ChampionshipScore, EventScore};
use crate::standings::{rank, StandingInput};
use rayon::prelude::*;
use std::collections::HashMap;

/// Read-only view of everything committed for one season
#[derive(Debug, Clone, Copy)]
pub struct SeasonInputs<'a> {
    pub season: Season,
    pub events: &'a [Event],
    pub participants: &'a [Participant],
    pub bets: &'a [Bet],
    pub results: &'a HashMap<EventId, OfficialResult>,
    pub roster: &'a Roster,
    pub picks: &'a [ChampionshipPick],
    pub championship: Option<&'a ChampionshipResult>,
}

type Column<'a> = HashMap<ParticipantId, (&'a Bet, EventScore)>;

/// Active events of the season in standings column order
pub fn season_columns<'a>(inputs: &SeasonInputs<'a>) -> Vec<&'a Event> {
    chronological(inputs.events).into_iter().filter(|e| e.season == inputs.season).collect()
}

fn score_column<'a>(event: &Event, inputs: &SeasonInputs<'a>, catalog: &RulesCatalog) -> Column<'a> {
    let rules = catalog.resolve(event.season, event.format);
    let result = inputs.results.get(&event.id);
    inputs
        .bets
        .iter()
        .filter(|bet| bet.event == event.id)
        .map(|bet| (bet.participant, (bet, score_bet_checked(bet, result, inputs.roster, rules))))
        .collect()
}

fn championship_score(
    participant: &Participant,
    inputs: &SeasonInputs<'_>,
    catalog: &RulesCatalog,
) -> ChampionshipScore {
    if participant.late_entry {
        return ChampionshipScore::default();
    }
    let Some(result) = inputs.championship else {
        return ChampionshipScore::default();
    };
    inputs
        .picks
        .iter()
        .find(|p| p.participant == participant.id && p.season == inputs.season)
        .map(|pick| score_championship(pick, result, catalog.championship_rules(inputs.season)))
        .unwrap_or_default()
}

/// Score every bet of the season and rank the active participants
pub fn score_season(inputs: &SeasonInputs<'_>, catalog: &RulesCatalog) -> Vec<Standing> {
    let events = season_columns(inputs);
    let columns: Vec<Column<'_>> =
        events.par_iter().map(|event| score_column(event, inputs, catalog)).collect();

    let rows = inputs
        .participants
        .iter()
        .filter(|p| p.active)
        .map(|participant| {
            let slots: Vec<Option<(&Bet, EventScore)>> =
                columns.iter().map(|column| column.get(&participant.id).cloned()).collect();
            StandingInput::from_event_slots(
                participant.id,
                &participant.name,
                &slots,
                championship_score(participant, inputs, catalog),
                participant.starting_points,
            )
        })
        .collect();

    rank(rows)
}
