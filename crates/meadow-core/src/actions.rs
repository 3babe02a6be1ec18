//! Commands a host can issue to a session, and the events a session emits.
//!
//! Every mutating session call returns the events it produced, in order, so
//! the host can drive rendering, audio, and persistence from them.

use crate::completion::FeatureCompletion;
use crate::coord::{Coord, Rotation};
use crate::session::{FinishReason, HandTile};
use crate::stats::FeatureCounters;
use serde::{Deserialize, Serialize};

/// Everything a host can ask a session to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionCommand {
    /// Start the clock
    BeginPlay,
    /// Advance the clock by this many seconds
    Tick(f64),
    /// Turn the hand tile a quarter turn clockwise
    RotateHandTile,
    /// Hover the hand tile over a cell
    MoveHandTile(Coord),
    /// Put the hand tile down on a cell
    PlaceHandTile(Coord),
    /// Quit mid-game
    Abort,
}

/// Events that occur as a result of commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    /// The clock started running
    PlayStarted {
        remaining_time: f64,
        hand: Option<HandTile>,
    },

    /// A new tile was offered to the player
    HandDrawn {
        tile: usize,
        rotation: Rotation,
        deck_remaining: usize,
    },

    /// The hand tile was rotated
    HandRotated { rotation: Rotation },

    /// The hand tile was moved over a cell
    HandMoved { coord: Coord, legal: bool },

    /// A tile was put down on the grid
    TilePlaced {
        tile: usize,
        coord: Coord,
        rotation: Rotation,
    },

    /// A road, forest, or church was completed
    FeatureCompleted { feature: FeatureCompletion },

    /// The running score changed
    ScoreUpdated {
        total_score: u64,
        counters: FeatureCounters,
    },

    /// The game ended naturally
    PlayFinished {
        total_score: u64,
        rank: u32,
        perfect: bool,
        reason: FinishReason,
    },

    /// The player quit mid-game
    PlayAborted,
}
