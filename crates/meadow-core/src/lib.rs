//! Meadow - a tile-laying puzzle engine
//!
//! This crate provides the core game logic for Meadow, including:
//! - Square grid coordinates and tile rotations
//! - The tile catalog with edge terrains and attributes
//! - Placement validation against neighboring edges
//! - Detection of completed roads, forests, and churches
//! - The timed session state machine, scoring, and ranking
//!
//! # Architecture
//!
//! The engine is platform-agnostic and synchronous. A host drives a
//! [`GameSession`] with commands and a periodic clock tick, and reacts to the
//! [`SessionEvent`]s each call returns. It can be compiled to:
//! - Native Rust for tools, bots, and tests
//! - WebAssembly for a browser shell (`wasm` feature)
//!
//! # Modules
//!
//! - [`coord`]: Grid coordinates, directions, and rotations
//! - [`catalog`]: Tile definitions and the standard deck
//! - [`grid`]: Placed tiles keyed by coordinate
//! - [`placement`]: Edge-matching legality
//! - [`completion`]: Completed feature analysis
//! - [`scoring`]: Score and rank
//! - [`session`]: Game session state machine
//! - [`record`]: Persisted session schema and store trait

pub mod actions;
pub mod bot;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod coord;
pub mod grid;
pub mod placement;
pub mod record;
pub mod scoring;
pub mod session;
pub mod stats;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{SessionCommand, SessionEvent};
pub use bot::{Bot, BotDifficulty};
pub use catalog::{Catalog, CatalogError, Edge, EdgeBundle, Terrain, TileAttributes, TileDefinition};
pub use completion::{analyze, Completions, FeatureCompletion, FeatureKind};
pub use config::{ConfigError, ScoringConfig, SessionConfig};
pub use coord::{Coord, Direction, Rotation};
pub use grid::{Grid, GridError, PlacedTile};
pub use placement::{can_place, legal_placements, legal_rotations, tile_has_any_legal_placement, Placement};
pub use record::{PlacedTileRecord, RecordError, RecordStore, SessionRecord};
pub use scoring::{rank, score, CompletionHistory, ScoreBreakdown};
pub use session::{
    create_session, FinalResult, FinishReason, GameSession, HandTile, SessionError, SessionPhase,
    SessionSnapshot,
};
pub use stats::{FeatureCounters, PlayStats};
