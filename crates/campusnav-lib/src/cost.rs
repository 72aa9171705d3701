//! Grid cost model: obstacle padding and endpoint resolution.
//!
//! The search never runs on the stored binary grid directly. Each request
//! builds its own working [`CostGrid`] with graduated obstacle padding, so
//! that paths shy away from walls without copying the shared
//! [`GridConfig`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::GeoPoint;
use crate::grid::{GridConfig, OBSTACLE, WALKABLE};

/// Cost value for an impassable cell. Exactly this value always means
/// obstacle; padding never hardens a free cell all the way to it.
pub const OBSTACLE_COST: f32 = 1.0;
/// Preferred-corridor cost for cells carved as hallway.
pub const HALLWAY_COST: f32 = 0.1;

/// Per-request working cost field derived from the shared binary grid.
#[derive(Debug, Clone)]
pub struct CostGrid {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
    corridor: Vec<bool>,
}

impl CostGrid {
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    #[inline]
    #[must_use]
    pub fn is_obstacle(&self, row: usize, col: usize) -> bool {
        self.value(row, col) >= OBSTACLE_COST
    }

    /// Traversal cost multiplier applied to edges entering this cell.
    ///
    /// Corridor cells are always cheap regardless of wall proximity; any
    /// other cell pays its graduated padding cost on top of geometric
    /// distance, which is why the Euclidean heuristic is not strictly
    /// admissible near walls.
    #[inline]
    #[must_use]
    pub fn multiplier(&self, row: usize, col: usize) -> f64 {
        let idx = row * self.cols + col;
        if self.corridor[idx] {
            return f64::from(HALLWAY_COST);
        }
        1.0 + f64::from(self.values[idx])
    }
}

/// Build the working cost field by dilating obstacle influence outward.
///
/// Every cell within Chebyshev distance `radius` of an obstacle receives
/// `(radius - distance + 1) / (radius + 1)`, keeping the maximum where
/// ridges overlap. Obstacles stay at exactly [`OBSTACLE_COST`] and are
/// never softened. A non-positive radius returns the binary field
/// unchanged. Cells in `hallway_mask` keep the corridor preference
/// regardless of wall proximity.
#[must_use]
pub fn apply_padding(config: &GridConfig, radius: i64, hallway_mask: Option<&[bool]>) -> CostGrid {
    let rows = config.rows();
    let cols = config.cols();
    let mut values: Vec<f32> = config
        .cells()
        .iter()
        .map(|&cell| if cell == OBSTACLE { OBSTACLE_COST } else { 0.0 })
        .collect();

    if radius > 0 {
        for row in 0..rows {
            for col in 0..cols {
                if config.value(row, col) != OBSTACLE {
                    continue;
                }
                for dr in -radius..=radius {
                    for dc in -radius..=radius {
                        let (r, c) = (row as i64 + dr, col as i64 + dc);
                        if !config.in_bounds(r, c) {
                            continue;
                        }
                        let (r, c) = (r as usize, c as usize);
                        if config.value(r, c) == OBSTACLE {
                            continue;
                        }
                        let distance = dr.abs().max(dc.abs());
                        let cost = (radius - distance + 1) as f32 / (radius + 1) as f32;
                        let idx = r * cols + c;
                        if cost > values[idx] {
                            values[idx] = cost;
                        }
                    }
                }
            }
        }
    }

    let corridor = match hallway_mask {
        Some(mask) => mask
            .iter()
            .zip(config.cells())
            .map(|(&carved, &cell)| carved && cell == WALKABLE)
            .collect(),
        None => vec![false; rows * cols],
    };

    CostGrid {
        rows,
        cols,
        values,
        corridor,
    }
}

/// How an endpoint was adjusted during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCell {
    pub row: usize,
    pub col: usize,
    /// Requested point fell outside the grid and was clamped in.
    pub clamped: bool,
    /// Requested cell was an obstacle and the endpoint moved to the
    /// nearest walkable cell.
    pub moved: bool,
}

/// Resolve a requested geographic endpoint to a walkable grid cell.
///
/// Out-of-range indices are clamped independently per axis; an obstacle
/// cell triggers an expanding ring search over square perimeters until a
/// walkable cell appears.
///
/// # Errors
///
/// Returns [`Error::ResolutionFailure`] when no walkable cell exists
/// within the search bounds.
pub fn resolve_endpoint(config: &GridConfig, point: &GeoPoint) -> Result<ResolvedCell> {
    let (raw_row, raw_col) = config.geo_to_cell(point);
    let clamped = !config.in_bounds(raw_row, raw_col);
    let row = raw_row.clamp(0, config.rows() as i64 - 1) as usize;
    let col = raw_col.clamp(0, config.cols() as i64 - 1) as usize;

    if !config.is_obstacle(row, col) {
        return Ok(ResolvedCell {
            row,
            col,
            clamped,
            moved: false,
        });
    }

    let (row, col) = find_nearest_walkable(config, row, col).ok_or(Error::ResolutionFailure {
        row,
        col,
    })?;
    debug!(row, col, "moved endpoint off obstacle cell");
    Ok(ResolvedCell {
        row,
        col,
        clamped,
        moved: true,
    })
}

/// Expanding square-ring search for the nearest walkable cell. Only the
/// perimeter of each ring is visited, so the scan is linear in the ring
/// circumference rather than its area.
#[must_use]
pub fn find_nearest_walkable(
    config: &GridConfig,
    row: usize,
    col: usize,
) -> Option<(usize, usize)> {
    let limit = config.rows().max(config.cols()) as i64;
    for radius in 1..limit {
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dr.abs() != radius && dc.abs() != radius {
                    continue;
                }
                let (r, c) = (row as i64 + dr, col as i64 + dc);
                if config.in_bounds(r, c) && !config.is_obstacle(r as usize, c as usize) {
                    return Some((r as usize, c as usize));
                }
            }
        }
    }
    None
}
