//! Placement legality.
//!
//! A tile may go on an empty cell when, on every side that touches a placed
//! neighbor, its rotated edge carries the same terrain as the neighbor's
//! facing edge. Dead-end flags play no part here.

use crate::catalog::Catalog;
use crate::coord::{Coord, Rotation};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A cell and rotation a tile could be put down with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub coord: Coord,
    pub rotation: Rotation,
}

/// Check whether `tile` at `rotation` may be placed on `coord`.
///
/// Occupied cells and tiles outside the catalog are never legal. A cell with
/// no neighbors at all imposes no constraint.
pub fn can_place(
    catalog: &Catalog,
    grid: &Grid,
    tile: usize,
    rotation: Rotation,
    coord: Coord,
) -> bool {
    if grid.occupied(&coord) {
        return false;
    }
    let Some(def) = catalog.get(tile) else {
        return false;
    };
    let edges = def.rotated_edges(rotation);

    grid.neighbors(&coord).into_iter().all(|(dir, neighbor)| {
        let Some(neighbor_def) = catalog.get(neighbor.tile) else {
            return false;
        };
        let facing = neighbor_def.edge(neighbor.rotation, dir.opposite());
        facing.terrain == edges[dir.index()].terrain
    })
}

/// Rotations of `tile` that are legal on `coord`
pub fn legal_rotations(catalog: &Catalog, grid: &Grid, tile: usize, coord: Coord) -> Vec<Rotation> {
    Rotation::ALL
        .into_iter()
        .filter(|&rotation| can_place(catalog, grid, tile, rotation, coord))
        .collect()
}

/// Every legal placement of `tile` among `open`, ordered by cell then rotation
pub fn legal_placements(
    catalog: &Catalog,
    grid: &Grid,
    tile: usize,
    open: &BTreeSet<Coord>,
) -> Vec<Placement> {
    open.iter()
        .flat_map(|&coord| {
            legal_rotations(catalog, grid, tile, coord)
                .into_iter()
                .map(move |rotation| Placement { coord, rotation })
        })
        .collect()
}

/// True if some open cell accepts `tile` at some rotation
pub fn tile_has_any_legal_placement(
    catalog: &Catalog,
    grid: &Grid,
    tile: usize,
    open: &BTreeSet<Coord>,
) -> bool {
    open.iter().any(|&coord| {
        Rotation::ALL
            .into_iter()
            .any(|rotation| can_place(catalog, grid, tile, rotation, coord))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Edge, Terrain, TileAttributes, TileDefinition};
    use crate::coord::Direction;

    const START: usize = 0;
    const ROAD_NS: usize = 1;
    const FOREST_N: usize = 2;
    const MEADOW: usize = 3;
    const ROAD_END: usize = 4;

    fn catalog() -> Catalog {
        use Terrain::*;
        let g = Edge::open(Grass);
        Catalog::new(vec![
            TileDefinition::new(TileAttributes::START, [g, g, Edge::open(Road), g]),
            TileDefinition::new(TileAttributes::NONE, [Edge::open(Road), g, Edge::open(Road), g]),
            TileDefinition::new(TileAttributes::NONE, [Edge::dead_end(Forest), g, g, g]),
            TileDefinition::new(TileAttributes::NONE, [g, g, g, g]),
            TileDefinition::new(TileAttributes::NONE, [Edge::dead_end(Road), g, g, g]),
        ])
        .unwrap()
    }

    fn grid() -> Grid {
        let mut grid = Grid::new();
        grid.place(START, Coord::ORIGIN, Rotation::NONE).unwrap();
        grid
    }

    #[test]
    fn test_empty_grid_accepts_anything() {
        let catalog = catalog();
        let grid = Grid::new();
        for rotation in Rotation::ALL {
            assert!(can_place(&catalog, &grid, FOREST_N, rotation, Coord::new(9, 9)));
        }
    }

    #[test]
    fn test_matching_road_is_legal() {
        let catalog = catalog();
        let grid = grid();
        // Start tile exposes road on its south side
        let below = Coord::new(0, -1);
        assert!(can_place(&catalog, &grid, ROAD_NS, Rotation::NONE, below));
        assert!(!can_place(&catalog, &grid, ROAD_NS, Rotation::NONE.clockwise(), below));
        assert!(!can_place(&catalog, &grid, MEADOW, Rotation::NONE, below));
    }

    #[test]
    fn test_occupied_cell_is_illegal() {
        let catalog = catalog();
        let grid = grid();
        assert!(!can_place(&catalog, &grid, MEADOW, Rotation::NONE, Coord::ORIGIN));
    }

    #[test]
    fn test_unknown_tile_is_illegal() {
        let catalog = catalog();
        let grid = grid();
        assert!(!can_place(&catalog, &grid, 99, Rotation::NONE, Coord::new(1, 0)));
    }

    #[test]
    fn test_dead_end_does_not_affect_legality() {
        let catalog = catalog();
        let grid = grid();
        let below = Coord::new(0, -1);
        // A dead-end road meets the start tile's open road: terrain matches
        assert!(can_place(&catalog, &grid, ROAD_END, Rotation::NONE, below));
        // A dead-end forest against the same open road does not
        assert!(!can_place(&catalog, &grid, FOREST_N, Rotation::NONE, below));
    }

    #[test]
    fn test_placement_symmetry() {
        let catalog = catalog();
        let grid = grid();
        let open = grid.open_coordinates();

        for tile in [ROAD_NS, FOREST_N, MEADOW] {
            for placement in legal_placements(&catalog, &grid, tile, &open) {
                let ours = catalog.get(tile).unwrap().rotated_edges(placement.rotation);
                for (dir, neighbor) in grid.neighbors(&placement.coord) {
                    let theirs = catalog
                        .get(neighbor.tile)
                        .unwrap()
                        .rotated_edges(neighbor.rotation);
                    // Same border seen from either tile
                    assert_eq!(
                        ours[dir.index()].terrain,
                        theirs[dir.opposite().index()].terrain
                    );
                    let back: Direction = dir.opposite();
                    assert_eq!(
                        theirs[back.index()].terrain,
                        ours[back.opposite().index()].terrain
                    );
                }
            }
        }
    }

    #[test]
    fn test_any_legal_placement() {
        let catalog = catalog();
        let grid = grid();
        let open = grid.open_coordinates();
        assert!(tile_has_any_legal_placement(&catalog, &grid, ROAD_NS, &open));
        assert!(tile_has_any_legal_placement(&catalog, &grid, MEADOW, &open));

        // Only the cell below the start accepts a road, in two orientations
        let placements = legal_placements(&catalog, &grid, ROAD_NS, &open);
        assert!(placements.iter().all(|p| p.coord != Coord::new(0, -1) || {
            p.rotation.quarter_turns() % 2 == 0
        }));
        assert_eq!(
            legal_rotations(&catalog, &grid, ROAD_NS, Coord::new(0, -1)).len(),
            2
        );
    }

    #[test]
    fn test_no_legal_placement_when_surrounded() {
        let catalog = catalog();
        let mut grid = Grid::new();
        // The only open cell demands road on its west side
        grid.place(ROAD_NS, Coord::new(0, 1), Rotation::NONE.clockwise()).unwrap();
        let open: BTreeSet<Coord> = [Coord::new(1, 1)].into_iter().collect();
        assert!(!tile_has_any_legal_placement(&catalog, &grid, FOREST_N, &open));
        assert!(tile_has_any_legal_placement(&catalog, &grid, ROAD_NS, &open));
    }
}
