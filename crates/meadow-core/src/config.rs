//! Session and scoring configuration.
//!
//! Both structs deserialize from partial JSON: any missing field falls back
//! to the reference tuning in `Default`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Parameters of the scoring formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Power applied to each completed feature's size
    pub exponent: f64,
    pub length_coefficient: f64,
    pub road_weight: f64,
    pub forest_weight: f64,
    /// Extra size each deep forest tile adds to its forest
    pub deep_forest_bonus: f64,
    /// Points per distinct town, castle, or fort on completed roads
    pub town_weight: f64,
    /// Points per completed church
    pub church_weight: f64,
    /// Multiplier applied to the total when every tile was placed
    pub perfect_bonus: f64,
    /// Points per rank step
    pub rank_divisor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exponent: 1.5,
            length_coefficient: 10.0,
            road_weight: 1.0,
            forest_weight: 1.0,
            deep_forest_bonus: 1.0,
            town_weight: 30.0,
            church_weight: 100.0,
            perfect_bonus: 1.5,
            rank_divisor: 1000.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("exponent", self.exponent),
            ("length_coefficient", self.length_coefficient),
            ("road_weight", self.road_weight),
            ("forest_weight", self.forest_weight),
            ("deep_forest_bonus", self.deep_forest_bonus),
            ("town_weight", self.town_weight),
            ("church_weight", self.church_weight),
            ("perfect_bonus", self.perfect_bonus),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a non-negative number")));
            }
        }
        if !self.rank_divisor.is_finite() || self.rank_divisor <= 0.0 {
            return Err(ConfigError::Invalid("rank_divisor must be positive".into()));
        }
        Ok(())
    }
}

/// Everything needed to set up one playthrough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown length in seconds
    pub play_time: f64,
    /// Seconds added when the time extension has been purchased
    pub time_extension: f64,
    /// Truncate the shuffled deck to this many tiles
    pub force_tile_count: Option<usize>,
    /// Shuffle the deck at session start; when false the catalog order is kept
    pub shuffle: bool,
    /// Seed for the deck shuffle (random when absent)
    pub seed: Option<u64>,
    pub scoring: ScoringConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            play_time: 300.0,
            time_extension: 60.0,
            force_tile_count: None,
            shuffle: true,
            seed: None,
            scoring: ScoringConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.play_time.is_finite() || self.play_time < 0.0 {
            return Err(ConfigError::Invalid("play_time must be a non-negative number".into()));
        }
        if !self.time_extension.is_finite() || self.time_extension < 0.0 {
            return Err(ConfigError::Invalid(
                "time_extension must be a non-negative number".into(),
            ));
        }
        self.scoring.validate()
    }

    /// Starting clock for a session
    pub fn initial_time(&self, purchased_extension: bool) -> f64 {
        if purchased_extension {
            self.play_time + self.time_extension
        } else {
            self.play_time
        }
    }
}
