//! Scoring engine
//!
//! Points for one bet are `Σ tokens × table[position]` over the scored range,
//! plus the 11th-place bonus, decayed for repeated automatic bets. Results
//! that cannot be trusted leave the bet pending instead of scoring zero.

use crate::error::ScoringError;
use crate::models::{Bet, ChampionshipPick, ChampionshipResult, OfficialResult, Roster};
use crate::rules::RuleSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BetScore {
    pub position_points: i64,
    pub eleventh_bonus: i64,
    /// Before the automatic-bet decay
    pub raw_total: i64,
    pub penalized: bool,
    pub total: i64,
}

impl BetScore {
    pub fn eleventh_hit(&self) -> bool {
        self.eleventh_bonus > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReason {
    AwaitingResult,
    DataInconsistency(ScoringError),
}

/// Outcome of scoring one bet; pending is never folded into zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScore {
    Scored(BetScore),
    Pending(PendingReason),
}

impl EventScore {
    pub fn points(&self) -> Option<i64> {
        match self {
            EventScore::Scored(score) => Some(score.total),
            EventScore::Pending(_) => None,
        }
    }

    pub fn eleventh_hit(&self) -> bool {
        matches!(self, EventScore::Scored(score) if score.eleventh_hit())
    }
}

/// Score a bet against the official result of its event
pub fn score_bet(
    bet: &Bet,
    result: &OfficialResult,
    rules: &RuleSet,
) -> Result<BetScore, ScoringError> {
    if bet.event != result.event() {
        return Err(ScoringError::EventMismatch { bet_event: bet.event, result_event: result.event() });
    }

    let range = rules.scored_range();
    let position_points: i64 = bet
        .token_bearing()
        .filter_map(|entry| {
            let pos = result.position_of(&entry.driver)?;
            ((pos as usize) <= range).then(|| entry.tokens as i64 * rules.points_for(pos))
        })
        .sum();

    let eleventh_bonus = if &bet.eleventh == result.eleventh() { rules.bonus_eleventh } else { 0 };

    let raw_total = position_points + eleventh_bonus;
    let (total, penalized) = rules.apply_penalty(raw_total, bet.automatic);

    Ok(BetScore { position_points, eleventh_bonus, raw_total, penalized, total })
}

/// Score with roster reconciliation; anything unreconciled stays pending
pub fn score_bet_checked(
    bet: &Bet,
    result: Option<&OfficialResult>,
    roster: &Roster,
    rules: &RuleSet,
) -> EventScore {
    let Some(result) = result else {
        return EventScore::Pending(PendingReason::AwaitingResult);
    };

    let unknown = result
        .drivers()
        .chain(bet.token_bearing().map(|e| &e.driver))
        .chain(std::iter::once(&bet.eleventh))
        .find(|driver| !roster.is_known(driver));
    if let Some(driver) = unknown {
        return EventScore::Pending(PendingReason::DataInconsistency(
            ScoringError::UnknownDriver { driver: driver.clone() },
        ));
    }

    match score_bet(bet, result, rules) {
        Ok(score) => EventScore::Scored(score),
        Err(err) => EventScore::Pending(PendingReason::DataInconsistency(err)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChampionshipScore {
    pub champion_hit: bool,
    pub runner_up_hit: bool,
    pub constructor_hit: bool,
    pub points: i64,
}

/// The three bonuses are independent and additive
pub fn score_championship(
    pick: &ChampionshipPick,
    result: &ChampionshipResult,
    rules: &RuleSet,
) -> ChampionshipScore {
    let champion_hit = pick.champion == result.champion;
    let runner_up_hit = pick.runner_up == result.runner_up;
    let constructor_hit = pick.constructor.trim() == result.constructor.trim();

    let points = [
        (champion_hit, rules.champion_bonus),
        (runner_up_hit, rules.vice_bonus),
        (constructor_hit, rules.team_bonus),
    ]
    .iter()
    .filter(|(hit, _)| *hit)
    .map(|(_, bonus)| bonus)
    .sum();

    ChampionshipScore { champion_hit, runner_up_hit, constructor_hit, points }
}
