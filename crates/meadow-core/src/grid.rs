//! Sparse grid of placed tiles.
//!
//! The grid only grows: tiles are inserted one at a time and never removed.
//! A new grid replaces the old one when a new game starts.

use crate::coord::{Coord, Direction, Rotation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors raised by grid mutation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GridError {
    #[error("Cell {0} is already occupied")]
    Occupied(Coord),
}

/// A tile that has been put down on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub coord: Coord,
    /// Index into the session's catalog
    pub tile: usize,
    pub rotation: Rotation,
}

/// Mapping from coordinate to placed tile, remembering insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    tiles: HashMap<Coord, PlacedTile>,
    order: Vec<Coord>,
}

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a tile down.
    ///
    /// Only uniqueness is checked here; edge matching is the caller's job
    /// (see [`crate::placement::can_place`]).
    pub fn place(&mut self, tile: usize, coord: Coord, rotation: Rotation) -> Result<(), GridError> {
        if self.tiles.contains_key(&coord) {
            return Err(GridError::Occupied(coord));
        }
        self.tiles.insert(
            coord,
            PlacedTile {
                coord,
                tile,
                rotation,
            },
        );
        self.order.push(coord);
        Ok(())
    }

    pub fn tile_at(&self, coord: &Coord) -> Option<&PlacedTile> {
        self.tiles.get(coord)
    }

    pub fn occupied(&self, coord: &Coord) -> bool {
        self.tiles.contains_key(coord)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Empty cells orthogonally adjacent to at least one placed tile
    pub fn open_coordinates(&self) -> BTreeSet<Coord> {
        self.order
            .iter()
            .flat_map(|coord| coord.neighbors())
            .filter(|neighbor| !self.occupied(neighbor))
            .collect()
    }

    /// Occupied coordinates in the order they were placed
    pub fn all_coordinates(&self) -> &[Coord] {
        &self.order
    }

    /// Placed tiles in the order they were placed
    pub fn iter(&self) -> impl Iterator<Item = &PlacedTile> {
        self.order.iter().filter_map(|coord| self.tiles.get(coord))
    }

    /// Placed tiles orthogonally adjacent to `coord`, with the side they sit on
    pub fn neighbors(&self, coord: &Coord) -> Vec<(Direction, &PlacedTile)> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.tile_at(&coord.neighbor(dir)).map(|t| (dir, t)))
            .collect()
    }

    /// How many of the eight surrounding cells hold a tile
    pub fn surrounding_occupied(&self, coord: &Coord) -> usize {
        coord
            .surrounding()
            .iter()
            .filter(|cell| self.occupied(cell))
            .count()
    }

    /// Smallest and largest corners of the occupied area
    pub fn bounds(&self) -> Option<(Coord, Coord)> {
        let first = self.order.first()?;
        let (mut min, mut max) = (*first, *first);
        for coord in &self.order {
            min.x = min.x.min(coord.x);
            min.y = min.y.min(coord.y);
            max.x = max.x.max(coord.x);
            max.y = max.y.max(coord.y);
        }
        Some((min, max))
    }
}
