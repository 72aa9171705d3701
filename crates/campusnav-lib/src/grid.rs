//! Persisted walkability grid and the geographic/grid coordinate
//! transform.
//!
//! The grid is stored in memory as a flat row-major byte buffer indexed by
//! `row * cols + col`. Row zero sits at `lat_max` (the northern edge) and
//! column zero at `lng_min`, so converting a latitude to a row counts down
//! from the top of the extent. The persisted JSON shape is
//! `{rows, cols, lat_min, lat_max, lng_min, lng_max, grid}` with `grid` as
//! nested arrays of 0/1 values; the flat buffer is an in-memory layout
//! choice only.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{GeoBounds, GeoPoint};

/// Cell value for traversable ground.
pub const WALKABLE: u8 = 0;
/// Cell value for an impassable obstacle.
pub const OBSTACLE: u8 = 1;

/// Immutable occupancy grid with its geographic extent.
///
/// Created once by the rasterizer, then shared read-only across
/// concurrent searches; query-time code works on its own padded copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridConfigRepr", into = "GridConfigRepr")]
pub struct GridConfig {
    rows: usize,
    cols: usize,
    bounds: GeoBounds,
    cells: Vec<u8>,
}

impl GridConfig {
    /// Create a grid with every cell set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGeometry`] when either dimension is zero.
    pub fn filled(rows: usize, cols: usize, bounds: GeoBounds, fill: u8) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::MalformedGeometry {
                detail: "grid must have at least one row and one column".to_string(),
            });
        }
        Ok(Self {
            rows,
            cols,
            bounds,
            cells: vec![fill; rows * cols],
        })
    }

    /// Build a grid from nested rows of 0/1 values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGeometry`] when rows are empty or ragged.
    pub fn from_rows(rows: Vec<Vec<u8>>, bounds: GeoBounds) -> Result<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if row_count == 0 || col_count == 0 {
            return Err(Error::MalformedGeometry {
                detail: "grid must have at least one row and one column".to_string(),
            });
        }
        let mut cells = Vec::with_capacity(row_count * col_count);
        for row in &rows {
            if row.len() != col_count {
                return Err(Error::MalformedGeometry {
                    detail: format!(
                        "ragged grid: expected {} columns, found {}",
                        col_count,
                        row.len()
                    ),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: row_count,
            cols: col_count,
            bounds,
            cells,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    #[must_use]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    #[inline]
    #[must_use]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> u8 {
        self.cells[self.index(row, col)]
    }

    #[inline]
    #[must_use]
    pub fn is_obstacle(&self, row: usize, col: usize) -> bool {
        self.value(row, col) == OBSTACLE
    }

    #[inline]
    #[must_use]
    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Latitude span covered by one cell.
    #[must_use]
    pub fn cell_lat_size(&self) -> f64 {
        (self.bounds.lat_max - self.bounds.lat_min) / self.rows as f64
    }

    /// Longitude span covered by one cell.
    #[must_use]
    pub fn cell_lng_size(&self) -> f64 {
        (self.bounds.lng_max - self.bounds.lng_min) / self.cols as f64
    }

    /// Map a geographic point to grid indices by flooring.
    ///
    /// Out-of-range indices are returned as-is so callers can distinguish
    /// "outside the grid" from a clamped edge cell; clamping is a caller
    /// policy.
    #[must_use]
    pub fn geo_to_cell(&self, point: &GeoPoint) -> (i64, i64) {
        let row = ((self.bounds.lat_max - point.lat) / self.cell_lat_size()).floor() as i64;
        let col = ((point.lng - self.bounds.lng_min) / self.cell_lng_size()).floor() as i64;
        (row, col)
    }

    /// Geographic center of a cell.
    #[must_use]
    pub fn cell_to_geo(&self, row: usize, col: usize) -> GeoPoint {
        self.cell_center(row as f64, col as f64)
    }

    /// Geographic position of a fractional grid coordinate, offset to the
    /// cell-center convention. Used for smoothed (continuous) paths.
    #[must_use]
    pub fn cell_center(&self, row: f64, col: f64) -> GeoPoint {
        GeoPoint::new(
            self.bounds.lat_max - (row + 0.5) * self.cell_lat_size(),
            self.bounds.lng_min + (col + 0.5) * self.cell_lng_size(),
        )
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == WALKABLE).count()
    }

    /// Number of obstacle cells.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == OBSTACLE).count()
    }

    /// Load a grid configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors, or [`Error::MalformedGeometry`] for an
    /// inconsistent artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: GridConfig = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            rows = config.rows,
            cols = config.cols,
            "loaded grid configuration"
        );
        Ok(config)
    }

    /// Write the grid configuration as JSON.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        debug!(rows = self.rows, cols = self.cols, path = %path.display(), "saved grid configuration");
        Ok(())
    }
}

/// Wire representation matching the persisted artifact layout.
#[derive(Debug, Serialize, Deserialize)]
struct GridConfigRepr {
    rows: usize,
    cols: usize,
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
    grid: Vec<Vec<u8>>,
}

impl TryFrom<GridConfigRepr> for GridConfig {
    type Error = Error;

    fn try_from(repr: GridConfigRepr) -> Result<Self> {
        let bounds = GeoBounds {
            lat_min: repr.lat_min,
            lat_max: repr.lat_max,
            lng_min: repr.lng_min,
            lng_max: repr.lng_max,
        };
        let config = GridConfig::from_rows(repr.grid, bounds)?;
        if config.rows != repr.rows || config.cols != repr.cols {
            return Err(Error::MalformedGeometry {
                detail: format!(
                    "grid dimensions {}x{} disagree with declared {}x{}",
                    config.rows, config.cols, repr.rows, repr.cols
                ),
            });
        }
        Ok(config)
    }
}

impl From<GridConfig> for GridConfigRepr {
    fn from(config: GridConfig) -> Self {
        let grid = config
            .cells
            .chunks(config.cols)
            .map(<[u8]>::to_vec)
            .collect();
        Self {
            rows: config.rows,
            cols: config.cols,
            lat_min: config.bounds.lat_min,
            lat_max: config.bounds.lat_max,
            lng_min: config.bounds.lng_min,
            lng_max: config.bounds.lng_max,
            grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bounds() -> GeoBounds {
        GeoBounds {
            lat_min: 47.0,
            lat_max: 47.001,
            lng_min: -117.001,
            lng_max: -117.0,
        }
    }

    #[test]
    fn transform_round_trips_for_all_cells() {
        let config = GridConfig::filled(20, 25, test_bounds(), WALKABLE).unwrap();
        for row in 0..config.rows() {
            for col in 0..config.cols() {
                let center = config.cell_to_geo(row, col);
                let (r, c) = config.geo_to_cell(&center);
                assert_eq!((r, c), (row as i64, col as i64));
            }
        }
    }

    #[test]
    fn out_of_extent_points_are_not_clamped() {
        let config = GridConfig::filled(10, 10, test_bounds(), WALKABLE).unwrap();
        let north_of_extent = GeoPoint::new(47.01, -117.0005);
        let (row, _) = config.geo_to_cell(&north_of_extent);
        assert!(row < 0);
        assert!(!config.in_bounds(row, 0));
    }

    #[test]
    fn json_round_trip_preserves_cells() {
        let mut config = GridConfig::filled(3, 4, test_bounds(), WALKABLE).unwrap();
        let idx = config.index(1, 2);
        config.cells_mut()[idx] = OBSTACLE;

        let json = serde_json::to_string(&config).unwrap();
        let restored: GridConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
        assert!(restored.is_obstacle(1, 2));
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let result = GridConfig::from_rows(vec![vec![0, 0], vec![0]], test_bounds());
        assert!(result.is_err());
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(GridConfig::filled(0, 10, test_bounds(), WALKABLE).is_err());
        assert!(GridConfig::filled(10, 0, test_bounds(), WALKABLE).is_err());
        assert!(GridConfig::from_rows(Vec::new(), test_bounds()).is_err());
    }
}
