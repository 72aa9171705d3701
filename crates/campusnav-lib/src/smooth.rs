//! Path smoothing: waypoint reduction, spline fitting, and safety
//! validation.
//!
//! Smoothing is strictly cosmetic. Every stage validates against the raw
//! (unpadded) occupancy grid, and any failure falls back to the reduced
//! polyline so a smoothed result can never reintroduce a collision.

use tracing::debug;

use crate::grid::GridConfig;
use crate::path::Cell;

/// Continuous grid-space coordinate `(row, col)`.
pub type GridPoint = (f64, f64);

/// Smoothing parameters.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of points sampled along the fitted curve.
    pub samples: usize,
    /// Half-width of the rescue neighbourhood for samples that land on an
    /// obstacle (2 gives the 5x5 window).
    pub rescue_radius: i64,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            samples: 100,
            rescue_radius: 2,
        }
    }
}

/// Outcome of the smoothing pipeline.
#[derive(Debug, Clone)]
pub struct SmoothedPath {
    /// Continuous grid-space points from start to goal.
    pub points: Vec<GridPoint>,
    /// Whether the spline survived validation; `false` means the reduced
    /// polyline was returned unsmoothed.
    pub smoothed: bool,
}

/// Unobstructed straight line between two cells, sampled at unit steps
/// against the raw occupancy grid.
#[must_use]
pub fn line_of_sight(config: &GridConfig, a: Cell, b: Cell) -> bool {
    line_of_sight_continuous(config, (a.0 as f64, a.1 as f64), (b.0 as f64, b.1 as f64))
}

fn line_of_sight_continuous(config: &GridConfig, a: GridPoint, b: GridPoint) -> bool {
    let dr = b.0 - a.0;
    let dc = b.1 - a.1;
    let steps = dr.abs().max(dc.abs()).ceil() as usize;
    for k in 0..=steps {
        let t = if steps == 0 { 0.0 } else { k as f64 / steps as f64 };
        let row = (a.0 + dr * t).round() as i64;
        let col = (a.1 + dc * t).round() as i64;
        if !config.in_bounds(row, col) || config.is_obstacle(row as usize, col as usize) {
            return false;
        }
    }
    true
}

/// Greedy line-of-sight simplification: from each kept waypoint, jump to
/// the farthest later point still visible in a straight line. Idempotent,
/// and preserves the raw path's obstacle-avoidance guarantee.
#[must_use]
pub fn reduce_waypoints(config: &GridConfig, path: &[Cell]) -> Vec<Cell> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut reduced = vec![path[0]];
    let mut i = 0;
    while i < path.len() - 1 {
        let mut next = i + 1;
        for j in ((i + 1)..path.len()).rev() {
            if line_of_sight(config, path[i], path[j]) {
                next = j;
                break;
            }
        }
        reduced.push(path[next]);
        i = next;
    }
    reduced
}

/// Smooth a raw cell path into a continuous curve.
///
/// Reduces waypoints, fits a clamped cubic B-spline through them, samples
/// it, then validates every sample against the raw grid: obstacle hits are
/// substituted from the surrounding rescue window (corridor cells
/// preferred), and if any post-substitution segment loses line of sight
/// the spline is discarded in favour of the reduced polyline.
#[must_use]
pub fn smooth_path(
    config: &GridConfig,
    hallway_mask: Option<&[bool]>,
    path: &[Cell],
    options: &SmoothOptions,
) -> SmoothedPath {
    let reduced = reduce_waypoints(config, path);
    let reduced_points: Vec<GridPoint> =
        reduced.iter().map(|&(r, c)| (r as f64, c as f64)).collect();

    // A cubic spline needs at least four waypoints.
    if reduced.len() < 4 || options.samples < 2 {
        return SmoothedPath {
            points: reduced_points,
            smoothed: false,
        };
    }

    let mut samples = sample_spline(&reduced_points, options.samples);

    for point in &mut samples {
        let row = point.0.round() as i64;
        let col = point.1.round() as i64;
        if config.in_bounds(row, col) && !config.is_obstacle(row as usize, col as usize) {
            continue;
        }
        match rescue_sample(config, hallway_mask, *point, options.rescue_radius) {
            Some(substitute) => *point = substitute,
            None => {
                debug!("spline sample unrecoverable, falling back to reduced polyline");
                return SmoothedPath {
                    points: reduced_points,
                    smoothed: false,
                };
            }
        }
    }

    for pair in samples.windows(2) {
        if !line_of_sight_continuous(config, pair[0], pair[1]) {
            debug!("smoothed segment lost line of sight, falling back to reduced polyline");
            return SmoothedPath {
                points: reduced_points,
                smoothed: false,
            };
        }
    }

    SmoothedPath {
        points: samples,
        smoothed: true,
    }
}

/// Sample a clamped uniform cubic B-spline through the waypoints. The
/// first and last waypoints are tripled so the curve passes through both
/// endpoints exactly.
fn sample_spline(waypoints: &[GridPoint], samples: usize) -> Vec<GridPoint> {
    let mut control = Vec::with_capacity(waypoints.len() + 4);
    control.push(waypoints[0]);
    control.push(waypoints[0]);
    control.extend_from_slice(waypoints);
    control.push(waypoints[waypoints.len() - 1]);
    control.push(waypoints[waypoints.len() - 1]);

    let segments = control.len() - 3;
    let mut points = Vec::with_capacity(samples);
    for s in 0..samples {
        let u = s as f64 / (samples - 1) as f64 * segments as f64;
        let seg = (u.floor() as usize).min(segments - 1);
        let t = u - seg as f64;
        points.push(spline_basis(&control[seg..seg + 4], t));
    }
    points
}

fn spline_basis(window: &[GridPoint], t: f64) -> GridPoint {
    let t2 = t * t;
    let t3 = t2 * t;
    let b0 = (1.0 - t).powi(3) / 6.0;
    let b1 = (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0;
    let b2 = (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0;
    let b3 = t3 / 6.0;
    (
        b0 * window[0].0 + b1 * window[1].0 + b2 * window[2].0 + b3 * window[3].0,
        b0 * window[0].1 + b1 * window[1].1 + b2 * window[2].1 + b3 * window[3].1,
    )
}

/// Find the nearest walkable cell in the rescue window around a stray
/// spline sample, preferring corridor cells.
fn rescue_sample(
    config: &GridConfig,
    hallway_mask: Option<&[bool]>,
    point: GridPoint,
    radius: i64,
) -> Option<GridPoint> {
    let row = point.0.round() as i64;
    let col = point.1.round() as i64;

    let mut best: Option<(GridPoint, f64)> = None;
    let mut best_corridor: Option<(GridPoint, f64)> = None;
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let (r, c) = (row + dr, col + dc);
            if !config.in_bounds(r, c) || config.is_obstacle(r as usize, c as usize) {
                continue;
            }
            let candidate = (r as f64, c as f64);
            let dist = (candidate.0 - point.0).powi(2) + (candidate.1 - point.1).powi(2);
            let idx = config.index(r as usize, c as usize);
            let is_corridor = hallway_mask.is_some_and(|mask| mask[idx]);
            if is_corridor && best_corridor.is_none_or(|(_, d)| dist < d) {
                best_corridor = Some((candidate, dist));
            }
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((candidate, dist));
            }
        }
    }

    best_corridor.or(best).map(|(candidate, _)| candidate)
}
