//! Persisted session record.
//!
//! This is the logical schema a host saves between runs. The physical
//! encoding is left to a [`RecordStore`] implementation.

use crate::catalog::Catalog;
use crate::coord::{Coord, Rotation};
use crate::stats::PlayStats;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Reasons a persisted record cannot be turned back into a session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RecordError {
    #[error("Unknown tile index {0}")]
    UnknownTile(usize),

    #[error("Invalid rotation {0}")]
    InvalidRotation(u8),

    #[error("Cell {0} appears more than once")]
    DuplicateCoord(Coord),

    #[error("Cell {0} cannot be connected to the origin")]
    CoordOutOfRange(Coord),

    #[error("Start tile missing from the origin")]
    MissingStartTile,

    #[error("Completed feature references empty cell {0}")]
    UnplacedCoord(Coord),

    #[error("{forests} completed forests but {counts} deep forest counts")]
    DeepForestMismatch { forests: usize, counts: usize },

    #[error("Invalid play time")]
    InvalidPlayTime,
}

/// One placed tile in a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTileRecord {
    pub x: i32,
    pub y: i32,
    pub tile: usize,
    pub rotation: u8,
}

impl PlacedTileRecord {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Everything needed to resume a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub hand_tile: Option<usize>,
    pub hand_rotation: u8,
    /// Remaining deck in draw order
    pub waiting_tiles: Vec<usize>,
    /// Grid contents in placement order
    pub placed_tiles: Vec<PlacedTileRecord>,
    /// Seconds of play elapsed
    pub play_time: f64,
    pub completed_forests: Vec<Vec<Coord>>,
    pub deep_forest_counts: Vec<u32>,
    pub completed_paths: Vec<Vec<Coord>>,
    pub completed_churches: Vec<Coord>,
    #[serde(default)]
    pub rotation_count: u32,
    #[serde(default)]
    pub move_count: u32,
}

impl SessionRecord {
    /// Parse a record from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check the record is consistent with `catalog` and with itself
    pub fn validate(&self, catalog: &Catalog) -> Result<(), RecordError> {
        let known = |tile: usize| {
            if tile < catalog.len() {
                Ok(())
            } else {
                Err(RecordError::UnknownTile(tile))
            }
        };

        if let Some(hand) = self.hand_tile {
            known(hand)?;
        }
        Rotation::new(self.hand_rotation).ok_or(RecordError::InvalidRotation(self.hand_rotation))?;
        for &tile in &self.waiting_tiles {
            known(tile)?;
        }

        // Tiles form one connected patch around the origin, so no cell can
        // sit farther out on either axis than there are tiles
        let reach = self.placed_tiles.len();
        let mut placed = HashSet::new();
        for entry in &self.placed_tiles {
            known(entry.tile)?;
            Rotation::new(entry.rotation).ok_or(RecordError::InvalidRotation(entry.rotation))?;
            if entry.x.unsigned_abs() as usize > reach || entry.y.unsigned_abs() as usize > reach {
                return Err(RecordError::CoordOutOfRange(entry.coord()));
            }
            if !placed.insert(entry.coord()) {
                return Err(RecordError::DuplicateCoord(entry.coord()));
            }
        }

        let start_ok = self.placed_tiles.first().is_some_and(|first| {
            first.coord() == Coord::ORIGIN
                && catalog.get(first.tile).is_some_and(|def| def.is_start())
        });
        if !start_ok {
            return Err(RecordError::MissingStartTile);
        }

        if self.completed_forests.len() != self.deep_forest_counts.len() {
            return Err(RecordError::DeepForestMismatch {
                forests: self.completed_forests.len(),
                counts: self.deep_forest_counts.len(),
            });
        }

        let completed = self
            .completed_forests
            .iter()
            .chain(self.completed_paths.iter())
            .flatten()
            .chain(self.completed_churches.iter());
        for coord in completed {
            if !placed.contains(coord) {
                return Err(RecordError::UnplacedCoord(*coord));
            }
        }

        if !self.play_time.is_finite() || self.play_time < 0.0 {
            return Err(RecordError::InvalidPlayTime);
        }

        Ok(())
    }
}

/// Host-side persistence for session records and play statistics
pub trait RecordStore {
    type Error: std::error::Error;

    /// Load the record in `slot`, or `None` if nothing was saved there
    fn load_record(&self, slot: &str) -> Result<Option<SessionRecord>, Self::Error>;

    fn save_record(&mut self, slot: &str, record: &SessionRecord) -> Result<(), Self::Error>;

    /// Forget the record in `slot`
    fn clear_record(&mut self, slot: &str) -> Result<(), Self::Error>;

    fn load_stats(&self) -> Result<PlayStats, Self::Error>;

    fn save_stats(&mut self, stats: &PlayStats) -> Result<(), Self::Error>;
}
