//! Automated players.
//!
//! Bots drive a [`GameSession`] through its public commands, the same way a
//! host would. They are used for demo play, hints, and soak tests.
//!
//! - Easy: a random legal placement
//! - Medium: the placement that scores the most immediately, earliest first

use crate::actions::SessionEvent;
use crate::completion::analyze;
use crate::placement::{legal_placements, Placement};
use crate::scoring::{score, CompletionHistory};
use crate::session::{GameSession, SessionError};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
}

/// A bot that can decide where the hand tile goes
pub struct Bot {
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a placement for the current hand tile
    pub fn choose_placement(&mut self, session: &GameSession) -> Option<Placement> {
        let hand = session.hand()?;
        let open = session.open_coordinates();
        let placements = legal_placements(session.catalog(), session.grid(), hand.tile, &open);
        if placements.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => placements.choose(&mut self.rng).copied(),
            BotDifficulty::Medium => self.choose_medium(session, hand.tile, &placements),
        }
    }

    /// Best immediate gain; the earliest placement wins ties
    fn choose_medium(
        &self,
        session: &GameSession,
        tile: usize,
        placements: &[Placement],
    ) -> Option<Placement> {
        let mut best: Option<(Placement, f64)> = None;
        for &placement in placements {
            let gain = immediate_gain(session, tile, placement);
            if best.map_or(true, |(_, top)| gain > top) {
                best = Some((placement, gain));
            }
        }
        best.map(|(placement, _)| placement)
    }

    /// Rotate, hover, and place the hand tile, returning every event produced
    pub fn play_turn(&mut self, session: &mut GameSession) -> Result<Vec<SessionEvent>, SessionError> {
        let placement = self
            .choose_placement(session)
            .ok_or(SessionError::NoHandTile)?;
        debug!(coord = %placement.coord, rotation = placement.rotation.quarter_turns(), "bot placing");

        let mut events = Vec::new();
        while session.hand().map(|h| h.rotation) != Some(placement.rotation) {
            events.extend(session.rotate_hand_tile()?);
        }
        events.extend(session.move_hand_tile(placement.coord)?);
        events.extend(session.place_hand_tile(placement.coord)?);
        Ok(events)
    }
}

/// Score the features `placement` would complete, ignoring everything already scored
fn immediate_gain(session: &GameSession, tile: usize, placement: Placement) -> f64 {
    let mut grid = session.grid().clone();
    if grid.place(tile, placement.coord, placement.rotation).is_err() {
        return 0.0;
    }
    let completions = analyze(session.catalog(), &grid, placement.coord);
    if completions.is_empty() {
        return 0.0;
    }

    let mut history = CompletionHistory::new();
    history.record(&completions);
    let towns = history.town_coords(session.catalog(), &grid).len();
    let breakdown = score(&history, towns, false, &session.config().scoring);
    breakdown.road + breakdown.forest + breakdown.town + breakdown.church
}
