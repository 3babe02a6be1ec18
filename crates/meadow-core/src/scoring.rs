//! Scoring and ranking.
//!
//! Pure functions over the features completed during a playthrough. All
//! tuning comes from [`ScoringConfig`].

use crate::catalog::Catalog;
use crate::completion::Completions;
use crate::config::ScoringConfig;
use crate::coord::Coord;
use crate::grid::Grid;
use crate::stats::FeatureCounters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every feature completed so far in one playthrough
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionHistory {
    pub roads: Vec<Vec<Coord>>,
    pub forests: Vec<Vec<Coord>>,
    /// Deep forest tiles per entry of `forests`
    pub deep_forest_counts: Vec<u32>,
    pub churches: Vec<Coord>,
}

impl CompletionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the completions of one placement
    pub fn record(&mut self, completions: &Completions) {
        for road in &completions.roads {
            self.roads.push(road.coords.iter().copied().collect());
        }
        for forest in &completions.forests {
            self.forests.push(forest.coords.iter().copied().collect());
            self.deep_forest_counts.push(forest.deep_forest_count);
        }
        for church in &completions.churches {
            self.churches.extend(church.coords.iter().copied());
        }
    }

    /// Distinct cells on completed roads that carry a town, castle, or fort
    pub fn town_coords(&self, catalog: &Catalog, grid: &Grid) -> BTreeSet<Coord> {
        self.roads
            .iter()
            .flatten()
            .filter(|coord| {
                grid.tile_at(coord)
                    .and_then(|placed| catalog.get(placed.tile))
                    .is_some_and(|def| def.is_settlement())
            })
            .copied()
            .collect()
    }

    pub fn counters(&self, catalog: &Catalog, grid: &Grid) -> FeatureCounters {
        FeatureCounters {
            roads: self.roads.len() as u32,
            road_length: self.roads.iter().map(Vec::len).sum::<usize>() as u32,
            forests: self.forests.len() as u32,
            forest_length: self.forests.iter().map(Vec::len).sum::<usize>() as u32,
            deep_forests: self.deep_forest_counts.iter().sum(),
            towns: self.town_coords(catalog, grid).len() as u32,
            churches: self.churches.len() as u32,
        }
    }
}

/// Score split by source
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub road: f64,
    pub forest: f64,
    pub town: f64,
    pub church: f64,
    /// 1.0 unless the game was perfect
    pub multiplier: f64,
    /// Sum of the parts times the multiplier, rounded down
    pub total: u64,
}

fn feature_value(size: f64, config: &ScoringConfig, weight: f64) -> f64 {
    size.powf(config.exponent) * config.length_coefficient * weight
}

/// Score of completed roads given their sizes
pub fn road_score(sizes: impl IntoIterator<Item = usize>, config: &ScoringConfig) -> f64 {
    sizes
        .into_iter()
        .map(|size| feature_value(size as f64, config, config.road_weight))
        .sum()
}

/// Score of completed forests given `(size, deep_forest_count)` pairs
pub fn forest_score(
    forests: impl IntoIterator<Item = (usize, u32)>,
    config: &ScoringConfig,
) -> f64 {
    forests
        .into_iter()
        .map(|(size, deep)| {
            let effective = size as f64 + deep as f64 * config.deep_forest_bonus;
            feature_value(effective, config, config.forest_weight)
        })
        .sum()
}

/// Full score of a playthrough
pub fn score(
    history: &CompletionHistory,
    towns: usize,
    perfect: bool,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let road = road_score(history.roads.iter().map(Vec::len), config);
    let forest = forest_score(
        history
            .forests
            .iter()
            .map(Vec::len)
            .zip(history.deep_forest_counts.iter().copied()),
        config,
    );
    let town = towns as f64 * config.town_weight;
    let church = history.churches.len() as f64 * config.church_weight;
    let multiplier = if perfect { config.perfect_bonus } else { 1.0 };

    let total = ((road + forest + town + church) * multiplier).max(0.0).floor() as u64;

    ScoreBreakdown {
        road,
        forest,
        town,
        church,
        multiplier,
        total,
    }
}

/// Rank bucket for a finished game's total: always at least 1.
///
/// Rank 0 is left for callers to mean "not played yet".
pub fn rank(total: u64, config: &ScoringConfig) -> u32 {
    // The cast saturates, so huge buckets clamp at u32::MAX
    ((total as f64 / config.rank_divisor).floor() as u32).saturating_add(1)
}
