//! Grid ↔ world coordinate mapping for the terrain tile.
//!
//! The tile is a `(segments + 1)²` vertex grid centred on the world origin.
//! Vertex `(i, j)` sits at `x = (i - segments/2) * world_scale`,
//! `z = (j - segments/2) * world_scale`. Terrain generation goes one way and
//! the player tracker goes back; both go through [`GridMapping`].

use serde::{Deserialize, Serialize};

/// Tolerance, in grid units, applied before flooring a world position.
/// Absorbs the rounding of `i * scale` so an exact vertex position never
/// lands in the previous cell.
const GRID_EPSILON: f64 = 1e-4;

/// Discrete vertex coordinate: `i` along world X, `j` along world Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub i: usize,
    pub j: usize,
}

impl GridIndex {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

impl std::fmt::Display for GridIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.i, self.j)
    }
}

/// Linear mapping between vertex indices and world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMapping {
    /// Cells per side; the grid has `segments + 1` vertices per side
    pub segments: usize,
    /// World units between neighbouring vertices
    pub world_scale: f64,
}

impl GridMapping {
    pub fn new(segments: usize, world_scale: f64) -> Self {
        Self { segments, world_scale }
    }

    /// Vertices per side
    pub fn width(&self) -> usize {
        self.segments + 1
    }

    /// Distance from the origin to the tile edge
    pub fn half_extent(&self) -> f64 {
        self.segments as f64 * self.world_scale / 2.0
    }

    /// World (x, z) of a vertex
    pub fn grid_to_world(&self, index: GridIndex) -> (f64, f64) {
        let half = self.segments as f64 / 2.0;
        (
            (index.i as f64 - half) * self.world_scale,
            (index.j as f64 - half) * self.world_scale,
        )
    }

    /// Vertex cell containing a world position, or `None` outside the tile.
    ///
    /// `grid = floor((world + half_extent) / world_scale)` per axis, bounds
    /// checked against `[0, segments]`.
    pub fn world_to_grid(&self, x: f64, z: f64) -> Option<GridIndex> {
        let i = self.axis_to_grid(x)?;
        let j = self.axis_to_grid(z)?;
        Some(GridIndex { i, j })
    }

    /// Unbounded cell coordinates of a world position.
    ///
    /// Same floor and tolerance as [`Self::world_to_grid`], but positions off
    /// the tile give cells below 0 or above `segments`. Non-finite input maps
    /// to cell 0.
    pub fn world_to_cell(&self, x: f64, z: f64) -> (i64, i64) {
        let cell = |c: f64| {
            let cell = self.axis_cell(c);
            if cell.is_finite() { cell as i64 } else { 0 }
        };
        (cell(x), cell(z))
    }

    /// Canonical flat index (`j * width + i`), shared with [`crate::tilemap::Tilemap`].
    pub fn flat_index(&self, index: GridIndex) -> usize {
        index.j * self.width() + index.i
    }

    fn axis_to_grid(&self, coord: f64) -> Option<usize> {
        if !coord.is_finite() {
            return None;
        }
        let cell = self.axis_cell(coord);
        if cell < 0.0 || cell > self.segments as f64 {
            return None;
        }
        Some(cell as usize)
    }

    fn axis_cell(&self, coord: f64) -> f64 {
        ((coord + self.half_extent()) / self.world_scale + GRID_EPSILON).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_every_vertex() {
        for &(segments, scale) in &[(4usize, 1.5f64), (128, 1.5), (5, 0.1), (9, 2.0), (1, 3.3)] {
            let mapping = GridMapping::new(segments, scale);
            for j in 0..=segments {
                for i in 0..=segments {
                    let index = GridIndex::new(i, j);
                    let (x, z) = mapping.grid_to_world(index);
                    assert_eq!(mapping.world_to_grid(x, z), Some(index), "segments={} scale={}", segments, scale);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_from_f32_positions() {
        // Player positions arrive as f32; the tolerance must absorb that too.
        let mapping = GridMapping::new(128, 1.5);
        for j in (0..=128).step_by(7) {
            for i in (0..=128).step_by(5) {
                let index = GridIndex::new(i, j);
                let (x, z) = mapping.grid_to_world(index);
                let (xf, zf) = (x as f32, z as f32);
                assert_eq!(mapping.world_to_grid(xf as f64, zf as f64), Some(index));
            }
        }
    }

    #[test]
    fn test_no_transposition() {
        let mapping = GridMapping::new(4, 1.5);
        let (x, z) = mapping.grid_to_world(GridIndex::new(1, 3));
        assert_eq!((x, z), (-1.5, 1.5));
        assert_eq!(mapping.world_to_grid(-1.5, 1.5), Some(GridIndex::new(1, 3)));
        assert_eq!(mapping.flat_index(GridIndex::new(1, 3)), 3 * 5 + 1);
    }

    #[test]
    fn test_interior_points_floor_to_lower_vertex() {
        let mapping = GridMapping::new(4, 1.5);
        // Origin is vertex (2, 2); just short of the next vertex still maps there.
        assert_eq!(mapping.world_to_grid(0.0, 0.0), Some(GridIndex::new(2, 2)));
        assert_eq!(mapping.world_to_grid(1.4, 1.4), Some(GridIndex::new(2, 2)));
        assert_eq!(mapping.world_to_grid(-0.1, 0.1), Some(GridIndex::new(1, 2)));
    }

    #[test]
    fn test_world_to_cell_matches_grid_on_tile() {
        let mapping = GridMapping::new(128, 1.5);
        for j in (0..=128).step_by(9) {
            for i in (0..=128).step_by(4) {
                let (x, z) = mapping.grid_to_world(GridIndex::new(i, j));
                // f32 vertex positions, as the player reports them
                let (x, z) = (x as f32 as f64, z as f32 as f64);
                assert_eq!(mapping.world_to_cell(x, z), (i as i64, j as i64));
                assert_eq!(mapping.world_to_grid(x, z), Some(GridIndex::new(i, j)));
            }
        }
    }

    #[test]
    fn test_world_to_cell_off_tile() {
        let mapping = GridMapping::new(4, 1.5);
        assert_eq!(mapping.world_to_cell(-3.1, 0.0), (-1, 2));
        assert_eq!(mapping.world_to_cell(4.5, -6.0), (5, -1));
        assert_eq!(mapping.world_to_cell(f64::NAN, f64::INFINITY), (0, 0));
    }

    #[test]
    fn test_out_of_range() {
        let mapping = GridMapping::new(4, 1.5);
        assert_eq!(mapping.half_extent(), 3.0);
        assert!(mapping.world_to_grid(-3.1, 0.0).is_none());
        assert!(mapping.world_to_grid(0.0, 4.6).is_none());
        assert!(mapping.world_to_grid(f64::NAN, 0.0).is_none());
        // Far edge is the last vertex row, and the cell beyond it is outside.
        assert_eq!(mapping.world_to_grid(3.0, 3.0), Some(GridIndex::new(4, 4)));
        assert_eq!(mapping.world_to_grid(4.4, 0.0), Some(GridIndex::new(4, 2)));
        assert!(mapping.world_to_grid(4.5, 0.0).is_none());
    }
}
