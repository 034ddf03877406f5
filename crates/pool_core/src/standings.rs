//! Season standings
//!
//! Totals are the sum of scored events (pending slots excluded) plus the
//! championship bonus and any late-entry allowance. Equal totals fall back
//! to, in order: more on-time bets, more correct 11th-place guesses, correct
//! champion, correct constructor, correct runner-up, then participant id.

use crate::models::{Bet, ParticipantId, Standing, TieBreakCriteria};
use crate::rules::RuleSet;
use crate::scoring::{ChampionshipScore, EventScore};
use std::cmp::Ordering;

/// Everything the ranker needs to know about one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingInput {
    pub participant: ParticipantId,
    pub name: String,
    pub per_event_points: Vec<Option<i64>>,
    pub on_time_bets: u32,
    pub eleventh_hits: u32,
    pub championship: ChampionshipScore,
    pub starting_points: i64,
}

impl StandingInput {
    /// Build from one slot per event: the participant's bet and its score,
    /// or `None` when no bet exists for that event
    pub fn from_event_slots(
        participant: ParticipantId,
        name: &str,
        slots: &[Option<(&Bet, EventScore)>],
        championship: ChampionshipScore,
        starting_points: i64,
    ) -> Self {
        let per_event_points =
            slots.iter().map(|slot| slot.as_ref().and_then(|(_, score)| score.points())).collect();
        let on_time_bets =
            slots.iter().flatten().filter(|(bet, _)| !bet.is_automatic()).count() as u32;
        let eleventh_hits =
            slots.iter().flatten().filter(|(_, score)| score.eleventh_hit()).count() as u32;

        Self {
            participant,
            name: name.to_string(),
            per_event_points,
            on_time_bets,
            eleventh_hits,
            championship,
            starting_points,
        }
    }

    pub fn event_points(&self) -> i64 {
        self.per_event_points.iter().flatten().sum()
    }

    pub fn total(&self) -> i64 {
        self.starting_points + self.event_points() + self.championship.points
    }

    fn criteria(&self) -> TieBreakCriteria {
        TieBreakCriteria {
            on_time_bets: self.on_time_bets,
            eleventh_hits: self.eleventh_hits,
            champion_hit: self.championship.champion_hit,
            constructor_hit: self.championship.constructor_hit,
            runner_up_hit: self.championship.runner_up_hit,
        }
    }
}

/// Total order used for the season table (best first)
pub fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    let (ta, tb) = (&a.tie_break, &b.tie_break);
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| tb.on_time_bets.cmp(&ta.on_time_bets))
        .then_with(|| tb.eleventh_hits.cmp(&ta.eleventh_hits))
        .then_with(|| tb.champion_hit.cmp(&ta.champion_hit))
        .then_with(|| tb.constructor_hit.cmp(&ta.constructor_hit))
        .then_with(|| tb.runner_up_hit.cmp(&ta.runner_up_hit))
        .then_with(|| a.participant.cmp(&b.participant))
}

pub fn rank(inputs: Vec<StandingInput>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = inputs
        .into_iter()
        .map(|input| Standing {
            position: 0,
            participant: input.participant,
            total_points: input.total(),
            tie_break: input.criteria(),
            championship_points: input.championship.points,
            starting_points: input.starting_points,
            name: input.name,
            per_event_points: input.per_event_points,
        })
        .collect();

    standings.sort_by(compare_standings);
    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.position = idx as u32 + 1;
    }
    standings
}

/// Starting points for a participant joining mid-season: a share of the
/// lowest current total
pub fn late_entry_allowance(standings: &[Standing], rules: &RuleSet) -> i64 {
    standings
        .iter()
        .map(|s| s.total_points)
        .min()
        .map(|lowest| rules.late_entry_points(lowest))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: u32, points: &[Option<i64>]) -> StandingInput {
        StandingInput {
            participant: ParticipantId(id),
            name: format!("P{id}"),
            per_event_points: points.to_vec(),
            on_time_bets: 0,
            eleventh_hits: 0,
            championship: ChampionshipScore::default(),
            starting_points: 0,
        }
    }

    fn order(standings: &[Standing]) -> Vec<u32> {
        standings.iter().map(|s| s.participant.0).collect()
    }

    #[test]
    fn test_pending_slots_excluded_from_total() {
        let standings = rank(vec![input(1, &[Some(100), None, Some(20)])]);
        assert_eq!(standings[0].total_points, 120);
        assert_eq!(standings[0].per_event_points, vec![Some(100), None, Some(20)]);
        assert_eq!(standings[0].position, 1);
    }

    #[test]
    fn test_total_includes_championship_and_allowance() {
        let mut row = input(1, &[Some(10)]);
        row.championship = ChampionshipScore { champion_hit: true, points: 150, ..Default::default() };
        row.starting_points = 40;
        let standings = rank(vec![row]);
        assert_eq!(standings[0].total_points, 200);
        assert_eq!(standings[0].championship_points, 150);
    }

    #[test]
    fn test_on_time_bets_break_ties_regardless_of_later_criteria() {
        let mut a = input(1, &[Some(50)]);
        let mut b = input(2, &[Some(50)]);
        a.on_time_bets = 3;
        a.eleventh_hits = 0;
        b.on_time_bets = 2;
        b.eleventh_hits = 5;
        assert_eq!(order(&rank(vec![b.clone(), a.clone()])), vec![1, 2]);

        // Swapping who has more on-time bets swaps the order
        a.on_time_bets = 2;
        b.on_time_bets = 3;
        assert_eq!(order(&rank(vec![a, b])), vec![2, 1]);
    }

    #[test]
    fn test_full_tie_break_chain() {
        let mut rows: Vec<StandingInput> = (1..=6).map(|id| input(id, &[Some(10)])).collect();
        for row in rows.iter_mut() {
            row.on_time_bets = 1;
        }
        rows[5].eleventh_hits = 1; // P6 best by 11th hits
        rows[4].championship.champion_hit = true; // P5 next
        rows[3].championship.constructor_hit = true; // P4
        rows[2].championship.runner_up_hit = true; // P3
        // P1 and P2 tie on everything: id decides

        let standings = rank(rows);
        assert_eq!(order(&standings), vec![6, 5, 4, 3, 1, 2]);
        assert_eq!(standings.iter().map(|s| s.position).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_points_outrank_tie_breaks() {
        let mut a = input(1, &[Some(10)]);
        a.on_time_bets = 10;
        let b = input(2, &[Some(11)]);
        assert_eq!(order(&rank(vec![a, b])), vec![2, 1]);
    }

    #[test]
    fn test_late_entry_allowance() {
        let rules = RuleSet::normal();
        let standings = rank(vec![input(1, &[Some(500)]), input(2, &[Some(251)])]);
        assert_eq!(late_entry_allowance(&standings, &rules), 200);
        assert_eq!(late_entry_allowance(&[], &rules), 0);
    }
}
