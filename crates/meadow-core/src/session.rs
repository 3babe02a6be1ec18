//! Game session state machine.
//!
//! A session owns one playthrough: the catalog, the grid, the remaining deck,
//! the tile in the player's hand, the countdown clock, and every feature
//! completed so far. It moves through `NotStarted -> Playing -> Finished`,
//! or `Playing -> Aborted` when the player quits.

use crate::actions::{SessionCommand, SessionEvent};
use crate::catalog::{Catalog, CatalogError};
use crate::completion::analyze;
use crate::config::{ConfigError, SessionConfig};
use crate::coord::{Coord, Rotation};
use crate::grid::{Grid, GridError};
use crate::placement::{can_place, legal_placements, tile_has_any_legal_placement, Placement};
use crate::record::{PlacedTileRecord, RecordError, SessionRecord};
use crate::scoring::{rank, score, CompletionHistory, ScoreBreakdown};
use crate::stats::FeatureCounters;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Set up, waiting for `begin_play`
    NotStarted,
    /// Clock running, accepting moves
    Playing,
    /// Ended naturally; a final result is available
    Finished,
    /// Quit mid-game; no result
    Aborted,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// The clock ran out
    TimeUp,
    /// Every deck tile was placed
    DeckExhausted,
    /// Tiles remain but none fits anywhere
    DeckJammed,
}

/// The tile currently offered to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandTile {
    pub tile: usize,
    pub rotation: Rotation,
}

/// Outcome of a finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub breakdown: ScoreBreakdown,
    pub total_score: u64,
    pub rank: u32,
    /// Every deck tile was placed
    pub perfect: bool,
    pub reason: FinishReason,
    pub counters: FeatureCounters,
}

/// Read-only view of a session for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub hand: Option<HandTile>,
    pub cursor: Option<Coord>,
    pub deck_remaining: usize,
    pub placed_tiles: usize,
    pub remaining_time: f64,
    pub rate: f64,
    pub running_score: u64,
    pub counters: FeatureCounters,
    pub rotation_count: u32,
    pub move_count: u32,
    pub result: Option<FinalResult>,
}

/// Errors that can occur when driving a session
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SessionError {
    #[error("Play has not started")]
    NotStarted,

    #[error("Play has already started")]
    AlreadyStarted,

    #[error("Session is not in play")]
    NotPlaying,

    #[error("No tile in hand")]
    NoHandTile,

    #[error("Tile {tile} with rotation {} does not fit at {coord}", .rotation.quarter_turns())]
    IllegalPlacement {
        coord: Coord,
        tile: usize,
        rotation: Rotation,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Set up a new playthrough: shuffle the deck, place the start tile at the
/// origin, and draw the first hand tile.
pub fn create_session(
    config: SessionConfig,
    catalog: Catalog,
    purchased_extension: bool,
) -> Result<GameSession, SessionError> {
    GameSession::new(config, catalog, purchased_extension)
}

/// One playthrough
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    catalog: Catalog,
    grid: Grid,
    /// Remaining tiles in draw order
    deck: Vec<usize>,
    hand: Option<HandTile>,
    /// Cell the hand tile was last moved over
    cursor: Option<Coord>,
    phase: SessionPhase,
    initial_time: f64,
    remaining_time: f64,
    history: CompletionHistory,
    counters: FeatureCounters,
    running_score: u64,
    rotation_count: u32,
    move_count: u32,
    result: Option<FinalResult>,
}

impl GameSession {
    /// Create a fresh session
    pub fn new(
        config: SessionConfig,
        catalog: Catalog,
        purchased_extension: bool,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let start = catalog.start_tile()?;

        let mut deck = catalog.deck_indices()?;
        if config.shuffle {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            deck.shuffle(&mut rng);
        }
        if let Some(count) = config.force_tile_count {
            deck.truncate(count);
        }

        let mut grid = Grid::new();
        grid.place(start, Coord::ORIGIN, Rotation::NONE)?;

        let initial_time = config.initial_time(purchased_extension);
        let mut session = Self {
            config,
            catalog,
            grid,
            deck,
            hand: None,
            cursor: None,
            phase: SessionPhase::NotStarted,
            initial_time,
            remaining_time: initial_time,
            history: CompletionHistory::new(),
            counters: FeatureCounters::default(),
            running_score: 0,
            rotation_count: 0,
            move_count: 0,
            result: None,
        };
        session.hand = session.draw_hand();

        info!(
            deck = session.deck.len() + usize::from(session.hand.is_some()),
            play_time = initial_time,
            "session created"
        );
        Ok(session)
    }

    /// Rebuild a session from a persisted record.
    ///
    /// Counters and the running score are recomputed from the completed
    /// feature lists. The session starts `NotStarted`; call `begin_play` to resume.
    pub fn from_record(
        config: SessionConfig,
        catalog: Catalog,
        record: &SessionRecord,
        purchased_extension: bool,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        catalog.start_tile()?;
        record.validate(&catalog)?;

        let mut grid = Grid::new();
        for entry in &record.placed_tiles {
            let rotation =
                Rotation::new(entry.rotation).ok_or(RecordError::InvalidRotation(entry.rotation))?;
            grid.place(entry.tile, entry.coord(), rotation)?;
        }

        let history = CompletionHistory {
            roads: record.completed_paths.clone(),
            forests: record.completed_forests.clone(),
            deep_forest_counts: record.deep_forest_counts.clone(),
            churches: record.completed_churches.clone(),
        };

        let hand_rotation = Rotation::new(record.hand_rotation)
            .ok_or(RecordError::InvalidRotation(record.hand_rotation))?;
        let initial_time = config.initial_time(purchased_extension);

        let mut session = Self {
            config,
            catalog,
            grid,
            deck: record.waiting_tiles.clone(),
            hand: record.hand_tile.map(|tile| HandTile {
                tile,
                rotation: hand_rotation,
            }),
            cursor: None,
            phase: SessionPhase::NotStarted,
            initial_time,
            remaining_time: (initial_time - record.play_time).max(0.0),
            history,
            counters: FeatureCounters::default(),
            running_score: 0,
            rotation_count: record.rotation_count,
            move_count: record.move_count,
            result: None,
        };
        session.refresh_score();
        if session.hand.is_none() {
            session.hand = session.draw_hand();
        }

        info!(
            placed = session.grid.len(),
            deck = session.deck.len(),
            play_time = record.play_time,
            "session restored from record"
        );
        Ok(session)
    }

    /// Snapshot the state needed to resume later
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            hand_tile: self.hand.map(|h| h.tile),
            hand_rotation: self.hand.map_or(0, |h| h.rotation.quarter_turns()),
            waiting_tiles: self.deck.clone(),
            placed_tiles: self
                .grid
                .iter()
                .map(|placed| PlacedTileRecord {
                    x: placed.coord.x,
                    y: placed.coord.y,
                    tile: placed.tile,
                    rotation: placed.rotation.quarter_turns(),
                })
                .collect(),
            play_time: self.elapsed_time(),
            completed_forests: self.history.forests.clone(),
            deep_forest_counts: self.history.deep_forest_counts.clone(),
            completed_paths: self.history.roads.clone(),
            completed_churches: self.history.churches.clone(),
            rotation_count: self.rotation_count,
            move_count: self.move_count,
        }
    }

    // ==================== Queries ====================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    /// Final result, once the game has finished
    pub fn result(&self) -> Option<&FinalResult> {
        self.result.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn hand(&self) -> Option<HandTile> {
        self.hand
    }

    /// Remaining tiles in draw order (not counting the hand tile)
    pub fn deck(&self) -> &[usize] {
        &self.deck
    }

    pub fn history(&self) -> &CompletionHistory {
        &self.history
    }

    pub fn counters(&self) -> FeatureCounters {
        self.counters
    }

    /// Score so far, without the perfect-game multiplier
    pub fn running_score(&self) -> u64 {
        self.running_score
    }

    pub fn rotation_count(&self) -> u32 {
        self.rotation_count
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn remaining_time(&self) -> f64 {
        self.remaining_time
    }

    pub fn elapsed_time(&self) -> f64 {
        (self.initial_time - self.remaining_time).max(0.0)
    }

    /// Fraction of the clock used, in `[0, 1]`
    pub fn rate(&self) -> f64 {
        if self.initial_time <= 0.0 {
            return 1.0;
        }
        (self.elapsed_time() / self.initial_time).clamp(0.0, 1.0)
    }

    pub fn open_coordinates(&self) -> BTreeSet<Coord> {
        self.grid.open_coordinates()
    }

    /// A legal placement for the hand tile, if one exists
    pub fn hint(&self) -> Option<Placement> {
        let hand = self.hand?;
        let open = self.grid.open_coordinates();
        let placements = legal_placements(&self.catalog, &self.grid, hand.tile, &open);
        placements
            .iter()
            .find(|p| p.rotation == hand.rotation)
            .or_else(|| placements.first())
            .copied()
    }

    /// Whether the hand tile at its current rotation fits on `coord`.
    /// Only open cells, next to an existing tile, are considered.
    pub fn can_place_hand_tile(&self, coord: Coord) -> bool {
        self.hand.is_some_and(|hand| self.fits(hand, coord))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            hand: self.hand,
            cursor: self.cursor,
            deck_remaining: self.deck.len(),
            placed_tiles: self.grid.len(),
            remaining_time: self.remaining_time,
            rate: self.rate(),
            running_score: self.running_score,
            counters: self.counters,
            rotation_count: self.rotation_count,
            move_count: self.move_count,
            result: self.result.clone(),
        }
    }

    // ==================== Commands ====================

    /// Apply a host command
    pub fn apply(&mut self, command: SessionCommand) -> Result<Vec<SessionEvent>, SessionError> {
        match command {
            SessionCommand::BeginPlay => self.begin_play(),
            SessionCommand::Tick(delta) => Ok(self.tick(delta)),
            SessionCommand::RotateHandTile => self.rotate_hand_tile(),
            SessionCommand::MoveHandTile(coord) => self.move_hand_tile(coord),
            SessionCommand::PlaceHandTile(coord) => self.place_hand_tile(coord),
            SessionCommand::Abort => self.abort(),
        }
    }

    /// Start the clock
    pub fn begin_play(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.phase = SessionPhase::Playing;
        info!(remaining_time = self.remaining_time, "play started");

        let mut events = vec![SessionEvent::PlayStarted {
            remaining_time: self.remaining_time,
            hand: self.hand,
        }];

        if self.remaining_time <= 0.0 {
            events.push(self.finish(FinishReason::TimeUp));
        } else if self.hand.is_none() {
            events.push(self.finish(self.exhaustion_reason()));
        }

        Ok(events)
    }

    /// Advance the clock. Ticks outside of play are ignored.
    pub fn tick(&mut self, delta: f64) -> Vec<SessionEvent> {
        if self.phase != SessionPhase::Playing || !delta.is_finite() || delta <= 0.0 {
            return Vec::new();
        }

        self.remaining_time -= delta;
        if self.remaining_time <= 0.0 {
            self.remaining_time = 0.0;
            return vec![self.finish(FinishReason::TimeUp)];
        }
        Vec::new()
    }

    /// Turn the hand tile a quarter turn clockwise
    pub fn rotate_hand_tile(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        self.require_playing()?;
        let hand = self.hand.as_mut().ok_or(SessionError::NoHandTile)?;
        hand.rotation = hand.rotation.clockwise();
        self.rotation_count += 1;
        Ok(vec![SessionEvent::HandRotated {
            rotation: hand.rotation,
        }])
    }

    /// Hover the hand tile over `coord`, reporting whether it would fit there
    pub fn move_hand_tile(&mut self, coord: Coord) -> Result<Vec<SessionEvent>, SessionError> {
        self.require_playing()?;
        if self.hand.is_none() {
            return Err(SessionError::NoHandTile);
        }
        self.cursor = Some(coord);
        self.move_count += 1;
        Ok(vec![SessionEvent::HandMoved {
            coord,
            legal: self.can_place_hand_tile(coord),
        }])
    }

    /// Put the hand tile down on `coord`.
    ///
    /// The placement is validated first; an illegal placement leaves the
    /// session untouched. Afterwards completed features are scored and the
    /// next placeable tile is drawn, or the game finishes.
    pub fn place_hand_tile(&mut self, coord: Coord) -> Result<Vec<SessionEvent>, SessionError> {
        self.require_playing()?;
        let hand = self.hand.ok_or(SessionError::NoHandTile)?;

        if !self.fits(hand, coord) {
            return Err(SessionError::IllegalPlacement {
                coord,
                tile: hand.tile,
                rotation: hand.rotation,
            });
        }

        self.grid.place(hand.tile, coord, hand.rotation)?;
        self.hand = None;
        self.cursor = None;
        debug!(tile = hand.tile, %coord, rotation = hand.rotation.quarter_turns(), "tile placed");

        let mut events = vec![SessionEvent::TilePlaced {
            tile: hand.tile,
            coord,
            rotation: hand.rotation,
        }];

        let completions = analyze(&self.catalog, &self.grid, coord);
        if !completions.is_empty() {
            self.history.record(&completions);
            for feature in completions.iter() {
                debug!(kind = ?feature.kind, size = feature.size(), "feature completed");
                events.push(SessionEvent::FeatureCompleted {
                    feature: feature.clone(),
                });
            }
            self.refresh_score();
            events.push(SessionEvent::ScoreUpdated {
                total_score: self.running_score,
                counters: self.counters,
            });
        }

        match self.draw_hand() {
            Some(next) => {
                self.hand = Some(next);
                events.push(SessionEvent::HandDrawn {
                    tile: next.tile,
                    rotation: next.rotation,
                    deck_remaining: self.deck.len(),
                });
            }
            None => events.push(self.finish(self.exhaustion_reason())),
        }

        Ok(events)
    }

    /// Quit mid-game without scoring
    pub fn abort(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        self.require_playing()?;
        self.phase = SessionPhase::Aborted;
        info!(placed = self.grid.len(), "play aborted");
        Ok(vec![SessionEvent::PlayAborted])
    }

    // ==================== Helper Methods ====================

    fn require_playing(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Playing => Ok(()),
            SessionPhase::NotStarted => Err(SessionError::NotStarted),
            SessionPhase::Finished | SessionPhase::Aborted => Err(SessionError::NotPlaying),
        }
    }

    fn fits(&self, hand: HandTile, coord: Coord) -> bool {
        !self.grid.neighbors(&coord).is_empty()
            && can_place(&self.catalog, &self.grid, hand.tile, hand.rotation, coord)
    }

    /// Take the first deck tile, in deck order, that fits somewhere.
    /// Skipped tiles keep their place in the deck.
    fn draw_hand(&mut self) -> Option<HandTile> {
        let open = self.grid.open_coordinates();
        let position = self
            .deck
            .iter()
            .position(|&tile| tile_has_any_legal_placement(&self.catalog, &self.grid, tile, &open))?;
        let tile = self.deck.remove(position);
        debug!(tile, skipped = position, deck = self.deck.len(), "hand tile drawn");
        Some(HandTile {
            tile,
            rotation: Rotation::NONE,
        })
    }

    fn exhaustion_reason(&self) -> FinishReason {
        if self.deck.is_empty() {
            FinishReason::DeckExhausted
        } else {
            FinishReason::DeckJammed
        }
    }

    fn refresh_score(&mut self) {
        self.counters = self.history.counters(&self.catalog, &self.grid);
        self.running_score = score(
            &self.history,
            self.counters.towns as usize,
            false,
            &self.config.scoring,
        )
        .total;
    }

    fn finish(&mut self, reason: FinishReason) -> SessionEvent {
        let perfect = self.deck.is_empty() && self.hand.is_none();
        let breakdown = score(
            &self.history,
            self.counters.towns as usize,
            perfect,
            &self.config.scoring,
        );
        let rank = rank(breakdown.total, &self.config.scoring);

        self.phase = SessionPhase::Finished;
        self.result = Some(FinalResult {
            breakdown,
            total_score: breakdown.total,
            rank,
            perfect,
            reason,
            counters: self.counters,
        });
        info!(total_score = breakdown.total, rank, perfect, ?reason, "play finished");

        SessionEvent::PlayFinished {
            total_score: breakdown.total,
            rank,
            perfect,
            reason,
        }
    }
}
