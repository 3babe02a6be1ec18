//! Square grid coordinate system.
//!
//! This module provides the foundational coordinate types for the tile grid:
//! - `Coord`: Identifies a single grid cell
//! - `Direction`: One of the four sides of a tile, in clockwise order
//! - `Rotation`: A clockwise quarter-turn count applied to a tile
//!
//! The grid is unbounded in every direction. North is +y, East is +x.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a square tile, listed clockwise starting from North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Top side (+y)
    North,
    /// Right side (+x)
    East,
    /// Bottom side (-y)
    South,
    /// Left side (-x)
    West,
}

impl Direction {
    /// All directions in clockwise order starting from North
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Index of this side in a 4-edge array
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The side facing this one across a shared border
    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Unit offset `(dx, dy)` of the neighbor on this side
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

/// Clockwise rotation of a tile in 90° steps (always `0..=3`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    /// Base orientation
    pub const NONE: Rotation = Rotation(0);

    /// All four rotations
    pub const ALL: [Rotation; 4] = [Rotation(0), Rotation(1), Rotation(2), Rotation(3)];

    /// Create a rotation, returning `None` when `quarter_turns` is not in `0..=3`
    pub const fn new(quarter_turns: u8) -> Option<Self> {
        if quarter_turns < 4 {
            Some(Self(quarter_turns))
        } else {
            None
        }
    }

    /// Number of clockwise quarter turns
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    /// The next rotation clockwise, wrapping from 3 back to 0
    pub const fn clockwise(self) -> Self {
        Self((self.0 + 1) % 4)
    }
}

impl TryFrom<u8> for Rotation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rotation::new(value).ok_or(value)
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> Self {
        rotation.0
    }
}

/// Integer grid position of a cell.
///
/// Ordering is by `x` then `y`, which gives deterministic iteration when
/// coordinates are collected into ordered sets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    /// Column (increases going east)
    pub x: i32,
    /// Row (increases going north)
    pub y: i32,
}

impl Coord {
    /// The grid origin, where the start tile is placed
    pub const ORIGIN: Coord = Coord::new(0, 0);

    /// Create a new coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Get the neighbor in a specific direction
    pub const fn neighbor(&self, direction: Direction) -> Coord {
        let (dx, dy) = direction.offset();
        Coord::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbors in clockwise order starting from North
    pub fn neighbors(&self) -> [Coord; 4] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// The eight surrounding cells (orthogonal and diagonal), clockwise from North
    pub fn surrounding(&self) -> [Coord; 8] {
        [
            Coord::new(self.x, self.y + 1),
            Coord::new(self.x + 1, self.y + 1),
            Coord::new(self.x + 1, self.y),
            Coord::new(self.x + 1, self.y - 1),
            Coord::new(self.x, self.y - 1),
            Coord::new(self.x - 1, self.y - 1),
            Coord::new(self.x - 1, self.y),
            Coord::new(self.x - 1, self.y + 1),
        ]
    }

    /// Manhattan distance to another cell
    pub fn distance_to(&self, other: &Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_neighbors_are_unique_and_adjacent() {
        let center = Coord::new(3, -2);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 4);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_surrounding_has_eight_cells() {
        let center = Coord::ORIGIN;
        let around = center.surrounding();

        let unique: HashSet<_> = around.iter().collect();
        assert_eq!(unique.len(), 8);
        assert!(!unique.contains(&center));
        for cell in &around {
            assert!(cell.x.abs() <= 1 && cell.y.abs() <= 1);
        }
    }

    #[test]
    fn test_opposite_round_trip() {
        for dir in Direction::ALL {
            assert_ne!(dir, dir.opposite());
            assert_eq!(dir, dir.opposite().opposite());

            // Walking there and back lands on the start
            let start = Coord::new(5, 7);
            assert_eq!(start.neighbor(dir).neighbor(dir.opposite()), start);
        }
    }

    #[test]
    fn test_rotation_wraps_clockwise() {
        let mut rotation = Rotation::NONE;
        for expected in [1, 2, 3, 0] {
            rotation = rotation.clockwise();
            assert_eq!(rotation.quarter_turns(), expected);
        }
        assert_eq!(Rotation::new(4), None);
    }

    #[test]
    fn test_rotation_serde_rejects_out_of_range() {
        let ok: Rotation = serde_json::from_str("2").unwrap();
        assert_eq!(ok.quarter_turns(), 2);
        assert!(serde_json::from_str::<Rotation>("7").is_err());
    }
}
