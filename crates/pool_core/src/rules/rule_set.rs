use serde::{Deserialize, Serialize};

/// Basis-point scale used for the fractional rule factors
const BASIS_POINTS: i64 = 10_000;

/// Scoring parameters for one event format in one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Points per finishing position, index 0 = winner
    pub position_points: Vec<i64>,
    /// Award for guessing the 11th-place finisher
    pub bonus_eleventh: i64,
    pub token_budget: u32,
    pub min_distinct_drivers: usize,
    pub max_entries: usize,
    pub champion_bonus: i64,
    pub vice_bonus: i64,
    pub team_bonus: i64,
    /// Multiplier applied to automatic bets from `penalty_threshold` on
    pub penalty_factor_from_second_miss: f64,
    pub penalty_threshold: u32,
    /// Share of the lowest total granted to a participant joining mid-season
    pub late_entry_factor: f64,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::normal()
    }
}

impl RuleSet {
    /// Grand prix table (top 10 score)
    pub fn normal() -> Self {
        Self {
            position_points: vec![25, 18, 15, 12, 10, 8, 6, 4, 2, 1],
            bonus_eleventh: 25,
            token_budget: 15,
            min_distinct_drivers: 3,
            max_entries: 5,
            champion_bonus: 150,
            vice_bonus: 100,
            team_bonus: 80,
            penalty_factor_from_second_miss: 0.75,
            penalty_threshold: 2,
            late_entry_factor: 0.8,
        }
    }

    /// Sprint table (top 8 score)
    pub fn sprint() -> Self {
        Self { position_points: vec![8, 7, 6, 5, 4, 3, 2, 1], ..Self::normal() }
    }

    /// Number of finishing positions that earn points
    pub fn scored_range(&self) -> usize {
        self.position_points.len()
    }

    /// Points for a 1-based finishing position; 0 outside the scored range
    pub fn points_for(&self, position: u8) -> i64 {
        (position as usize)
            .checked_sub(1)
            .and_then(|idx| self.position_points.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Apply the no-show decay to an event total.
    ///
    /// The first automatic bet keeps full value; from `penalty_threshold` on
    /// the total is scaled and truncated toward zero. Returns the points and
    /// whether the decay was applied.
    pub fn apply_penalty(&self, total: i64, automatic: u32) -> (i64, bool) {
        if automatic < self.penalty_threshold {
            return (total, false);
        }
        (scale_truncated(total, self.penalty_factor_from_second_miss), true)
    }

    pub fn late_entry_points(&self, lowest_total: i64) -> i64 {
        scale_truncated(lowest_total, self.late_entry_factor)
    }
}

fn scale_truncated(value: i64, factor: f64) -> i64 {
    let bp = (factor * BASIS_POINTS as f64).round() as i64;
    // i64 division truncates toward zero
    value * bp / BASIS_POINTS
}
