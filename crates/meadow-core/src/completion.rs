//! Feature completion analysis.
//!
//! After every placement this module decides which terrain features touching
//! the new tile became fully enclosed:
//! - Roads and forests are traced edge by edge across the grid. A feature is
//!   complete when every branch ends at a dead-end edge of a real tile.
//! - Churches are complete once all eight surrounding cells hold a tile.
//!
//! A tile may host several disjoint features of the same terrain (a town at a
//! crossroads ends four separate roads), so traversal works on *segments*:
//! each dead-end edge is its own segment, and all non-dead-end edges of one
//! terrain on a tile form a single through segment.

use crate::catalog::{Catalog, Edge, Terrain, TileAttributes};
use crate::coord::{Coord, Direction};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Kind of feature that can be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Road,
    Forest,
    Church,
}

impl FeatureKind {
    /// Edge terrain traced for linear features
    pub fn terrain(self) -> Option<Terrain> {
        match self {
            FeatureKind::Road => Some(Terrain::Road),
            FeatureKind::Forest => Some(Terrain::Forest),
            FeatureKind::Church => None,
        }
    }
}

/// One completed feature instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCompletion {
    pub kind: FeatureKind,
    /// Cells making up the feature
    pub coords: BTreeSet<Coord>,
    /// Member tiles flagged as deep forest (forests only)
    pub deep_forest_count: u32,
}

impl FeatureCompletion {
    pub fn size(&self) -> usize {
        self.coords.len()
    }
}

/// Everything completed by a single placement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completions {
    pub roads: Vec<FeatureCompletion>,
    pub forests: Vec<FeatureCompletion>,
    pub churches: Vec<FeatureCompletion>,
}

impl Completions {
    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.forests.is_empty() && self.churches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roads.len() + self.forests.len() + self.churches.len()
    }

    /// Roads, then forests, then churches
    pub fn iter(&self) -> impl Iterator<Item = &FeatureCompletion> {
        self.roads
            .iter()
            .chain(self.forests.iter())
            .chain(self.churches.iter())
    }
}

/// Part of a tile a feature can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Segment {
    /// The feature enters through this side and stops inside the tile
    End(Direction),
    /// All non-dead-end sides of the traced terrain, joined inside the tile
    Through,
}

type Node = (Coord, Segment);

fn edges_at(catalog: &Catalog, grid: &Grid, coord: &Coord) -> Option<[Edge; 4]> {
    let placed = grid.tile_at(coord)?;
    Some(catalog.get(placed.tile)?.rotated_edges(placed.rotation))
}

fn through_sides(edges: &[Edge; 4], terrain: Terrain) -> impl Iterator<Item = Direction> + '_ {
    Direction::ALL
        .into_iter()
        .filter(move |dir| {
            let edge = edges[dir.index()];
            edge.terrain == terrain && !edge.dead_end
        })
}

/// Walk a feature outward from one segment.
///
/// Returns every segment reached when all branches close, or `None` as soon
/// as a branch runs into an empty cell.
fn trace(
    catalog: &Catalog,
    grid: &Grid,
    terrain: Terrain,
    start: Coord,
    start_edges: &[Edge; 4],
    segment: Segment,
) -> Option<HashSet<Node>> {
    let mut visited: HashSet<Node> = HashSet::from([(start, segment)]);
    let mut frontier: Vec<(Coord, Direction)> = match segment {
        Segment::End(side) => vec![(start, side)],
        Segment::Through => through_sides(start_edges, terrain)
            .map(|side| (start, side))
            .collect(),
    };

    while let Some((from, side)) = frontier.pop() {
        let next = from.neighbor(side);
        let edges = edges_at(catalog, grid, &next)?;
        let arrival = side.opposite();
        let facing = edges[arrival.index()];

        // Only reachable on a grid that skipped placement checks
        if facing.terrain != terrain {
            return None;
        }

        if facing.dead_end {
            visited.insert((next, Segment::End(arrival)));
            continue;
        }

        if visited.insert((next, Segment::Through)) {
            frontier.extend(
                through_sides(&edges, terrain)
                    .filter(|&out| out != arrival)
                    .map(|out| (next, out)),
            );
        }
    }

    Some(visited)
}

fn count_deep_forest(catalog: &Catalog, grid: &Grid, coords: &BTreeSet<Coord>) -> u32 {
    coords
        .iter()
        .filter_map(|coord| grid.tile_at(coord))
        .filter_map(|placed| catalog.get(placed.tile))
        .filter(|def| def.has(TileAttributes::DEEP_FOREST))
        .count() as u32
}

/// Completed road or forest features that touch the tile at `coord`.
///
/// Each dead-end side of the tile is a separate search origin, and the tile's
/// through segment (if any) is one more. An origin already covered by an
/// earlier successful trace is skipped, so a feature is never reported twice.
pub fn completed_features(
    catalog: &Catalog,
    grid: &Grid,
    coord: Coord,
    kind: FeatureKind,
) -> Vec<FeatureCompletion> {
    let Some(terrain) = kind.terrain() else {
        return Vec::new();
    };
    let Some(edges) = edges_at(catalog, grid, &coord) else {
        return Vec::new();
    };

    let mut origins: Vec<Segment> = Direction::ALL
        .into_iter()
        .filter(|dir| {
            let edge = edges[dir.index()];
            edge.terrain == terrain && edge.dead_end
        })
        .map(Segment::End)
        .collect();
    if through_sides(&edges, terrain).next().is_some() {
        origins.push(Segment::Through);
    }

    let mut covered: HashSet<Node> = HashSet::new();
    let mut completed = Vec::new();

    for origin in origins {
        if covered.contains(&(coord, origin)) {
            continue;
        }
        let Some(visited) = trace(catalog, grid, terrain, coord, &edges, origin) else {
            continue;
        };

        let coords: BTreeSet<Coord> = visited.iter().map(|(c, _)| *c).collect();
        let deep_forest_count = match kind {
            FeatureKind::Forest => count_deep_forest(catalog, grid, &coords),
            _ => 0,
        };
        covered.extend(visited);
        completed.push(FeatureCompletion {
            kind,
            coords,
            deep_forest_count,
        });
    }

    completed
}

/// Churches among `coord` and its eight surrounding cells that are now fully surrounded
pub fn completed_churches(catalog: &Catalog, grid: &Grid, coord: Coord) -> Vec<FeatureCompletion> {
    std::iter::once(coord)
        .chain(coord.surrounding())
        .filter(|cell| {
            grid.tile_at(cell)
                .and_then(|placed| catalog.get(placed.tile))
                .is_some_and(|def| def.is_church())
        })
        .filter(|cell| grid.surrounding_occupied(cell) == 8)
        .map(|cell| FeatureCompletion {
            kind: FeatureKind::Church,
            coords: BTreeSet::from([cell]),
            deep_forest_count: 0,
        })
        .collect()
}

/// Run every completion check for a tile just placed at `coord`
pub fn analyze(catalog: &Catalog, grid: &Grid, coord: Coord) -> Completions {
    Completions {
        roads: completed_features(catalog, grid, coord, FeatureKind::Road),
        forests: completed_features(catalog, grid, coord, FeatureKind::Forest),
        churches: completed_churches(catalog, grid, coord),
    }
}
