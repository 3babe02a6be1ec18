//! Tile catalog: the immutable set of tile definitions a session draws from.
//!
//! This module contains:
//! - Terrain types carried by tile edges
//! - Edge descriptors (terrain plus dead-end flag)
//! - Special tile attributes (start, church, castle, ...)
//! - Tile definitions with their rotated views
//! - The reference deck used by the standard game

use crate::coord::{Direction, Rotation};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use thiserror::Error;

/// Errors raised when building or querying a catalog
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CatalogError {
    #[error("Tile index {index} out of range (catalog has {len} tiles)")]
    OutOfRange { index: usize, len: usize },

    #[error("Catalog has no start tile")]
    NoStartTile,

    #[error("Invalid catalog definition: {0}")]
    InvalidDefinition(String),
}

/// Terrain carried by one side of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Terrain {
    Road = 0,
    Grass = 1,
    Forest = 2,
    Water = 3,
}

impl Terrain {
    /// All terrain types
    pub const ALL: [Terrain; 4] = [Terrain::Road, Terrain::Grass, Terrain::Forest, Terrain::Water];

    fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }
}

/// One side of a tile.
///
/// A dead-end edge is a feature boundary: the road or forest entering through
/// this side stops inside the tile instead of continuing to its other sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub terrain: Terrain,
    #[serde(default)]
    pub dead_end: bool,
}

impl Edge {
    /// An edge whose feature continues through the tile
    pub const fn open(terrain: Terrain) -> Self {
        Self {
            terrain,
            dead_end: false,
        }
    }

    /// An edge whose feature ends inside the tile
    pub const fn dead_end(terrain: Terrain) -> Self {
        Self {
            terrain,
            dead_end: true,
        }
    }
}

/// Bitset of special tile properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileAttributes(u8);

impl TileAttributes {
    pub const NONE: TileAttributes = TileAttributes(0);
    /// Placed at the origin when a session starts
    pub const START: TileAttributes = TileAttributes(1 << 0);
    /// Completes once all eight surrounding cells are filled
    pub const CHURCH: TileAttributes = TileAttributes(1 << 1);
    pub const CASTLE: TileAttributes = TileAttributes(1 << 2);
    /// Adds a bonus to the completed forest it belongs to
    pub const DEEP_FOREST: TileAttributes = TileAttributes(1 << 3);
    pub const TOWN: TileAttributes = TileAttributes(1 << 4);
    pub const FORT: TileAttributes = TileAttributes(1 << 5);

    /// Raw bit pattern
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set
    pub const fn contains(self, other: TileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set
    pub const fn intersects(self, other: TileAttributes) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: TileAttributes) -> Self {
        Self(self.0 | other.0)
    }

    /// Attributes that earn the town bonus on a completed road
    pub const fn settlement() -> Self {
        Self::TOWN.union(Self::CASTLE).union(Self::FORT)
    }
}

impl BitOr for TileAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Four edges packed into one `u64`, 16 bits per side.
///
/// Each slot holds the terrain in its low byte and the dead-end flag in bit 8.
/// Slot 0 (the low 16 bits) is North, then East, South, West.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeBundle(u64);

impl EdgeBundle {
    const DEAD_END_BIT: u16 = 1 << 8;

    pub fn pack(edges: &[Edge; 4]) -> Self {
        let mut value = 0u64;
        for (slot, edge) in edges.iter().enumerate() {
            let mut bits = edge.terrain as u16;
            if edge.dead_end {
                bits |= Self::DEAD_END_BIT;
            }
            value |= (bits as u64) << (16 * slot);
        }
        Self(value)
    }

    /// Unpack into edges, or `None` if a slot holds an unknown terrain
    pub fn unpack(self) -> Option<[Edge; 4]> {
        let mut edges = [Edge::open(Terrain::Grass); 4];
        for (slot, edge) in edges.iter_mut().enumerate() {
            let bits = (self.0 >> (16 * slot)) as u16;
            *edge = Edge {
                terrain: Terrain::from_byte((bits & 0xff) as u8)?,
                dead_end: bits & Self::DEAD_END_BIT != 0,
            };
        }
        Some(edges)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A tile in the catalog: base-orientation edges and special attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefinition {
    #[serde(default)]
    pub attributes: TileAttributes,
    /// Edges in base orientation, indexed by `Direction`
    pub edges: [Edge; 4],
}

impl TileDefinition {
    pub const fn new(attributes: TileAttributes, edges: [Edge; 4]) -> Self {
        Self { attributes, edges }
    }

    /// Edges after rotating the tile clockwise.
    ///
    /// `rotated_edges(r)[i] == edges[(i - r) mod 4]`
    pub fn rotated_edges(&self, rotation: Rotation) -> [Edge; 4] {
        let r = rotation.quarter_turns() as usize;
        std::array::from_fn(|i| self.edges[(i + 4 - r) % 4])
    }

    /// Edge on one side after rotation
    pub fn edge(&self, rotation: Rotation, direction: Direction) -> Edge {
        self.rotated_edges(rotation)[direction.index()]
    }

    pub fn has(&self, attribute: TileAttributes) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn is_start(&self) -> bool {
        self.has(TileAttributes::START)
    }

    pub fn is_church(&self) -> bool {
        self.has(TileAttributes::CHURCH)
    }

    pub fn is_deep_forest(&self) -> bool {
        self.has(TileAttributes::DEEP_FOREST)
    }

    /// Carries a town, castle, or fort
    pub fn is_settlement(&self) -> bool {
        self.attributes.intersects(TileAttributes::settlement())
    }

    /// Whether any side carries this terrain
    pub fn carries(&self, terrain: Terrain) -> bool {
        self.edges.iter().any(|e| e.terrain == terrain)
    }
}

/// The fixed, ordered list of tile definitions for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    tiles: Vec<TileDefinition>,
}

impl Catalog {
    /// Build a catalog, failing if no tile is flagged as a start tile
    pub fn new(tiles: Vec<TileDefinition>) -> Result<Self, CatalogError> {
        if !tiles.iter().any(TileDefinition::is_start) {
            return Err(CatalogError::NoStartTile);
        }
        Ok(Self { tiles })
    }

    /// Parse a catalog from a JSON array of tile definitions
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let tiles: Vec<TileDefinition> = serde_json::from_str(json)
            .map_err(|e| CatalogError::InvalidDefinition(e.to_string()))?;
        Self::new(tiles)
    }

    /// The reference deck: one start tile plus 43 playable tiles
    pub fn standard() -> Self {
        Self {
            tiles: standard_tiles(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Look up a definition without failing
    pub fn get(&self, index: usize) -> Option<&TileDefinition> {
        self.tiles.get(index)
    }

    pub fn definition_at(&self, index: usize) -> Result<&TileDefinition, CatalogError> {
        self.tiles.get(index).ok_or(CatalogError::OutOfRange {
            index,
            len: self.tiles.len(),
        })
    }

    pub fn rotated_edges(&self, index: usize, rotation: Rotation) -> Result<[Edge; 4], CatalogError> {
        Ok(self.definition_at(index)?.rotated_edges(rotation))
    }

    /// Rotated edges in packed form
    pub fn rotated_edge_bundle(
        &self,
        index: usize,
        rotation: Rotation,
    ) -> Result<EdgeBundle, CatalogError> {
        Ok(EdgeBundle::pack(&self.rotated_edges(index, rotation)?))
    }

    /// Index of the first tile flagged as a start tile
    pub fn start_tile(&self) -> Result<usize, CatalogError> {
        self.tiles
            .iter()
            .position(TileDefinition::is_start)
            .ok_or(CatalogError::NoStartTile)
    }

    /// Indices of every tile that goes into the deck (everything except the start tile)
    pub fn deck_indices(&self) -> Result<Vec<usize>, CatalogError> {
        let start = self.start_tile()?;
        Ok((0..self.tiles.len()).filter(|&i| i != start).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

use Terrain::{Forest, Grass, Road, Water};

const fn o(t: Terrain) -> Edge {
    Edge::open(t)
}

const fn d(t: Terrain) -> Edge {
    Edge::dead_end(t)
}

fn tile(attributes: TileAttributes, n: Edge, e: Edge, s: Edge, w: Edge) -> TileDefinition {
    TileDefinition::new(attributes, [n, e, s, w])
}

fn repeat(count: usize, def: TileDefinition) -> impl Iterator<Item = TileDefinition> {
    std::iter::repeat(def).take(count)
}

fn standard_tiles() -> Vec<TileDefinition> {
    const NONE: TileAttributes = TileAttributes::NONE;
    const TOWN: TileAttributes = TileAttributes::TOWN;
    const CASTLE: TileAttributes = TileAttributes::CASTLE;
    const FORT: TileAttributes = TileAttributes::FORT;
    const CHURCH: TileAttributes = TileAttributes::CHURCH;
    const DEEP: TileAttributes = TileAttributes::DEEP_FOREST;

    let mut tiles = Vec::with_capacity(44);

    // Start: open meadow
    tiles.push(tile(TileAttributes::START, o(Grass), o(Grass), o(Grass), o(Grass)));

    // Roads
    tiles.extend(repeat(4, tile(NONE, o(Road), o(Grass), o(Road), o(Grass))));
    tiles.extend(repeat(4, tile(NONE, o(Road), o(Road), o(Grass), o(Grass))));
    tiles.extend(repeat(2, tile(TOWN, d(Road), d(Road), o(Grass), d(Road))));
    tiles.extend(repeat(2, tile(TOWN, d(Road), d(Road), d(Road), d(Road))));
    tiles.extend(repeat(2, tile(CASTLE, d(Road), o(Grass), o(Grass), o(Grass))));
    tiles.push(tile(FORT, d(Road), o(Grass), o(Grass), o(Grass)));
    tiles.push(tile(FORT, d(Road), o(Grass), d(Road), o(Grass)));

    // Forests
    tiles.extend(repeat(4, tile(NONE, o(Forest), o(Grass), o(Forest), o(Grass))));
    tiles.extend(repeat(4, tile(NONE, o(Forest), o(Forest), o(Grass), o(Grass))));
    tiles.extend(repeat(2, tile(NONE, d(Forest), o(Grass), o(Grass), o(Grass))));
    tiles.extend(repeat(2, tile(DEEP, o(Forest), o(Grass), o(Forest), o(Grass))));
    tiles.extend(repeat(2, tile(DEEP, d(Forest), o(Grass), o(Grass), o(Grass))));
    tiles.push(tile(NONE, o(Forest), o(Forest), o(Grass), o(Forest)));

    // Mixed road and forest
    tiles.extend(repeat(2, tile(NONE, o(Road), d(Forest), o(Road), o(Grass))));
    tiles.extend(repeat(2, tile(NONE, o(Road), o(Road), o(Forest), o(Forest))));

    // Churches
    tiles.extend(repeat(3, tile(CHURCH, o(Grass), o(Grass), o(Grass), o(Grass))));
    tiles.push(tile(CHURCH, o(Grass), o(Grass), d(Road), o(Grass)));

    // Water and open ground
    tiles.extend(repeat(2, tile(NONE, o(Grass), o(Water), o(Grass), o(Water))));
    tiles.push(tile(NONE, o(Water), o(Grass), o(Grass), o(Grass)));
    tiles.push(tile(NONE, o(Grass), o(Grass), o(Grass), o(Grass)));

    tiles
}
