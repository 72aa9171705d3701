//! Request-level route planning: geographic endpoints in, geographic
//! path out.
//!
//! This is the seam the CLI (and any future service front-end) talks to.
//! Each call builds its own working cost field from the shared
//! [`GridConfig`], so concurrent requests never contend.

use serde::Serialize;
use tracing::info;

use crate::cost::{apply_padding, resolve_endpoint, ResolvedCell};
use crate::error::Result;
use crate::geometry::GeoPoint;
use crate::grid::GridConfig;
use crate::path::{find_path, Cell};
use crate::smooth::{smooth_path, SmoothOptions};

/// Obstacle padding radius applied when a request does not choose one.
pub const DEFAULT_PADDING: u32 = 2;

/// A single routing request between two geographic points.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    /// Obstacle padding radius in cells; `None` means [`DEFAULT_PADDING`].
    pub padding: Option<u32>,
    /// Smooth the raw cell path into a continuous curve.
    pub smooth: bool,
}

impl RouteRequest {
    #[must_use]
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self {
            start,
            end,
            padding: None,
            smooth: true,
        }
    }
}

/// Which requested endpoint an adjustment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Start,
    End,
}

/// How a requested endpoint differed from the cell actually searched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// The requested point sat on an obstacle and was moved to the
    /// nearest walkable cell. Takes precedence when the point was also
    /// outside the extent.
    MovedToWalkable,
    /// The requested point fell outside the grid extent and was clamped
    /// to the edge.
    ClampedToBounds,
}

/// Report of one endpoint adjustment, with the location actually used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub endpoint: Endpoint,
    pub kind: AdjustmentKind,
    pub location: GeoPoint,
}

/// Planned route. An empty `path` means no route exists between the
/// resolved endpoints; that is a valid outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    /// Raw search result as grid cells, before smoothing.
    pub cells: Vec<Cell>,
    /// Geographic waypoints from start to end.
    pub path: Vec<GeoPoint>,
    /// Endpoint adjustments made during resolution.
    pub adjustments: Vec<Adjustment>,
    /// Whether `path` came from the spline rather than cell centers.
    pub smoothed: bool,
}

impl RoutePlan {
    /// Whether a route between the endpoints was found.
    #[must_use]
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Plan a route over a loaded grid.
///
/// # Errors
///
/// Returns [`crate::Error::ResolutionFailure`] when an endpoint cannot be
/// resolved to any walkable cell. An unreachable goal is not an error;
/// see [`RoutePlan::found`].
pub fn plan_route(config: &GridConfig, request: &RouteRequest) -> Result<RoutePlan> {
    plan_route_on(config, None, request)
}

/// [`plan_route`] with a freshly rasterized hallway mask, letting the
/// search and the smoother prefer carved corridor cells.
pub fn plan_route_on(
    config: &GridConfig,
    hallway_mask: Option<&[bool]>,
    request: &RouteRequest,
) -> Result<RoutePlan> {
    let start = resolve_endpoint(config, &request.start)?;
    let end = resolve_endpoint(config, &request.end)?;

    let mut adjustments = Vec::new();
    record_adjustment(&mut adjustments, config, Endpoint::Start, start);
    record_adjustment(&mut adjustments, config, Endpoint::End, end);

    let radius = i64::from(request.padding.unwrap_or(DEFAULT_PADDING));
    let cost = apply_padding(config, radius, hallway_mask);
    let cells = find_path(&cost, (start.row, start.col), (end.row, end.col));

    if cells.is_empty() {
        info!(
            start = ?(start.row, start.col),
            end = ?(end.row, end.col),
            "no route between resolved endpoints"
        );
        return Ok(RoutePlan {
            cells,
            path: Vec::new(),
            adjustments,
            smoothed: false,
        });
    }

    let (path, smoothed) = if request.smooth {
        let smoothed = smooth_path(config, hallway_mask, &cells, &SmoothOptions::default());
        let path = smoothed
            .points
            .iter()
            .map(|&(row, col)| config.cell_center(row, col))
            .collect();
        (path, smoothed.smoothed)
    } else {
        let path = cells
            .iter()
            .map(|&(row, col)| config.cell_to_geo(row, col))
            .collect();
        (path, false)
    };

    info!(
        cells = cells.len(),
        smoothed,
        adjustments = adjustments.len(),
        "planned route"
    );
    Ok(RoutePlan {
        cells,
        path,
        adjustments,
        smoothed,
    })
}

fn record_adjustment(
    adjustments: &mut Vec<Adjustment>,
    config: &GridConfig,
    endpoint: Endpoint,
    resolved: ResolvedCell,
) {
    let kind = if resolved.moved {
        AdjustmentKind::MovedToWalkable
    } else if resolved.clamped {
        AdjustmentKind::ClampedToBounds
    } else {
        return;
    };
    adjustments.push(Adjustment {
        endpoint,
        kind,
        location: config.cell_to_geo(resolved.row, resolved.col),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoBounds;
    use crate::grid::{OBSTACLE, WALKABLE};

    fn bounds() -> GeoBounds {
        GeoBounds {
            lat_min: 0.0,
            lat_max: 1.0,
            lng_min: 0.0,
            lng_max: 1.0,
        }
    }

    fn open_grid(size: usize) -> GridConfig {
        GridConfig::from_rows(vec![vec![WALKABLE; size]; size], bounds()).unwrap()
    }

    #[test]
    fn plans_route_between_cell_centers() {
        let config = open_grid(10);
        let mut request =
            RouteRequest::new(config.cell_to_geo(0, 0), config.cell_to_geo(9, 9));
        request.smooth = false;
        let plan = plan_route(&config, &request).unwrap();
        assert!(plan.found());
        assert!(plan.adjustments.is_empty());
        assert!(!plan.smoothed);
        assert_eq!(plan.cells.first(), Some(&(0, 0)));
        assert_eq!(plan.cells.last(), Some(&(9, 9)));
        assert_eq!(plan.path.len(), plan.cells.len());
    }

    #[test]
    fn unreachable_goal_is_an_empty_plan() {
        let mut rows = vec![vec![WALKABLE; 5]; 5];
        for row in &mut rows {
            row[2] = OBSTACLE;
        }
        let config = GridConfig::from_rows(rows, bounds()).unwrap();
        let request = RouteRequest::new(config.cell_to_geo(2, 0), config.cell_to_geo(2, 4));
        let plan = plan_route(&config, &request).unwrap();
        assert!(!plan.found());
        assert!(plan.path.is_empty());
    }

    #[test]
    fn out_of_extent_endpoint_reports_clamp() {
        let config = open_grid(5);
        let outside = GeoPoint::new(2.0, -1.0);
        let mut request = RouteRequest::new(outside, config.cell_to_geo(4, 4));
        request.smooth = false;
        let plan = plan_route(&config, &request).unwrap();
        assert!(plan.found());
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.adjustments[0].endpoint, Endpoint::Start);
        assert_eq!(plan.adjustments[0].kind, AdjustmentKind::ClampedToBounds);
    }

    #[test]
    fn obstacle_endpoint_reports_move_over_clamp() {
        // The requested point is both outside the extent and, after
        // clamping, on an obstacle; the move is what gets reported.
        let mut rows = vec![vec![WALKABLE; 5]; 5];
        rows[0][0] = OBSTACLE;
        let config = GridConfig::from_rows(rows, bounds()).unwrap();
        // North-west of the extent clamps to cell (0, 0).
        let outside = GeoPoint::new(2.0, -1.0);
        let mut request = RouteRequest::new(outside, config.cell_to_geo(4, 4));
        request.smooth = false;
        let plan = plan_route(&config, &request).unwrap();
        assert!(plan.found());
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.adjustments[0].kind, AdjustmentKind::MovedToWalkable);
    }

    #[test]
    fn padding_steers_the_route_away_from_walls() {
        // A wide gap and a narrow slot; with padding the route pays less
        // through the wide gap even though the slot is shorter.
        let mut rows = vec![vec![WALKABLE; 9]; 9];
        for c in 0..4 {
            rows[4][c] = OBSTACLE;
        }
        for c in 5..9 {
            rows[4][c] = OBSTACLE;
        }
        let config = GridConfig::from_rows(rows, bounds()).unwrap();
        let mut request = RouteRequest::new(config.cell_to_geo(0, 4), config.cell_to_geo(8, 4));
        request.smooth = false;
        request.padding = Some(1);
        let plan = plan_route(&config, &request).unwrap();
        assert!(plan.found());
        // The slot at (4, 4) is the only crossing, padded or not.
        assert!(plan.cells.contains(&(4, 4)));
    }

    #[test]
    fn smoothed_plan_keeps_geographic_endpoints() {
        let config = open_grid(12);
        let request = RouteRequest::new(config.cell_to_geo(0, 0), config.cell_to_geo(11, 7));
        let plan = plan_route(&config, &request).unwrap();
        assert!(plan.found());
        let first = plan.path.first().unwrap();
        let last = plan.path.last().unwrap();
        let start = config.cell_to_geo(0, 0);
        let end = config.cell_to_geo(11, 7);
        assert!((first.lat - start.lat).abs() < 1e-9);
        assert!((first.lng - start.lng).abs() < 1e-9);
        assert!((last.lat - end.lat).abs() < 1e-9);
        assert!((last.lng - end.lng).abs() < 1e-9);
    }
}
