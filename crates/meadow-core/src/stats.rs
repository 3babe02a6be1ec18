//! Per-game feature counters and the cross-game statistics archive.

use crate::session::FinalResult;
use serde::{Deserialize, Serialize};

/// Running totals of completed features in one playthrough
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounters {
    pub roads: u32,
    /// Tiles across all completed roads
    pub road_length: u32,
    pub forests: u32,
    /// Tiles across all completed forests
    pub forest_length: u32,
    pub deep_forests: u32,
    /// Distinct towns, castles, and forts on completed roads
    pub towns: u32,
    pub churches: u32,
}

/// Statistics accumulated over every finished game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayStats {
    pub games_played: u32,
    pub perfect_games: u32,
    pub best_score: u64,
    /// 0 until a game has been recorded
    pub best_rank: u32,
    pub total_score: u64,
    pub totals: FeatureCounters,
}

impl PlayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished game into the archive
    pub fn record(&mut self, result: &FinalResult) {
        self.games_played += 1;
        if result.perfect {
            self.perfect_games += 1;
        }
        self.best_score = self.best_score.max(result.total_score);
        self.best_rank = self.best_rank.max(result.rank);
        self.total_score += result.total_score;

        let c = &result.counters;
        let t = &mut self.totals;
        t.roads += c.roads;
        t.road_length += c.road_length;
        t.forests += c.forests;
        t.forest_length += c.forest_length;
        t.deep_forests += c.deep_forests;
        t.towns += c.towns;
        t.churches += c.churches;
    }

    fn average(&self, sum: f64) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            sum / self.games_played as f64
        }
    }

    pub fn average_score(&self) -> f64 {
        self.average(self.total_score as f64)
    }

    pub fn average_roads(&self) -> f64 {
        self.average(self.totals.roads as f64)
    }

    pub fn average_forests(&self) -> f64 {
        self.average(self.totals.forests as f64)
    }

    pub fn average_deep_forests(&self) -> f64 {
        self.average(self.totals.deep_forests as f64)
    }

    pub fn average_towns(&self) -> f64 {
        self.average(self.totals.towns as f64)
    }

    pub fn average_churches(&self) -> f64 {
        self.average(self.totals.churches as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreBreakdown;
    use crate::session::FinishReason;

    fn result(total_score: u64, rank: u32, perfect: bool, roads: u32) -> FinalResult {
        FinalResult {
            breakdown: ScoreBreakdown::default(),
            total_score,
            rank,
            perfect,
            reason: FinishReason::TimeUp,
            counters: FeatureCounters {
                roads,
                churches: 1,
                ..FeatureCounters::default()
            },
        }
    }

    #[test]
    fn test_empty_archive_averages_to_zero() {
        let stats = PlayStats::new();
        assert_eq!(stats.average_score(), 0.0);
        assert_eq!(stats.best_rank, 0);
    }

    #[test]
    fn test_record_accumulates() {
        let mut stats = PlayStats::new();
        stats.record(&result(1200, 2, false, 3));
        stats.record(&result(800, 1, true, 1));

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.perfect_games, 1);
        assert_eq!(stats.best_score, 1200);
        assert_eq!(stats.best_rank, 2);
        assert_eq!(stats.average_score(), 1000.0);
        assert_eq!(stats.average_roads(), 2.0);
        assert_eq!(stats.average_churches(), 1.0);
    }
}
