//! Map-to-grid rasterizer.
//!
//! Converts the campus vector map into a binary occupancy grid in six
//! ordered phases: bounds initialization, obstacle stamping, hallway
//! carving, entrance connection, dead-end repair, and a single bounded
//! validation pass. The output is the persisted [`GridConfig`] plus an
//! in-memory corridor mask used by the cost model and path smoother.
//!
//! Naive rasterization leaves two classes of artifacts that the later
//! phases exist to fix: hallways whose carved corridor stops short of any
//! open space (dead ends), and entrances that sit inside a footprint with
//! no carved connection to the outside. Dead ends are repaired on a
//! best-effort basis; an unrepairable endpoint degrades path quality but
//! never aborts the build.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::features::CampusMap;
use crate::geometry::{GeoBounds, GeoPoint, Polyline};
use crate::grid::{GridConfig, OBSTACLE, WALKABLE};

/// Probe limit for directional dead-end extension, in cells.
const PROBE_MAX_CELLS: usize = 25;
/// How far past an obstacle boundary a directional fix is pushed, in cells.
const BOUNDARY_PUSH_CELLS: f64 = 4.0;
/// Primary search radius for snapping a dead end to a nearby feature.
const SNAP_RADIUS_METERS: f64 = 4.0;
/// Widened snap radius used when the primary search finds nothing.
const SNAP_FALLBACK_METERS: f64 = 6.0;
/// Half-width of the last-resort cell neighbourhood search.
const CELL_SEARCH_RADIUS: i64 = 10;
/// Rough meters per degree of latitude, good enough at campus scale.
const METERS_PER_DEGREE: f64 = 111_320.0;
/// Tolerance for treating an entrance as sitting on a footprint boundary.
const EDGE_EPSILON: f64 = 1e-9;

/// Tunable parameters for the build.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Cell edge length in degrees (~2 m by default).
    pub cell_size: f64,
    /// Outward dilation applied to building footprints, in cells.
    pub building_padding: f64,
    /// Corridor stamp radius around hallway samples, in cells.
    pub hallway_radius: i64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            cell_size: 0.00002,
            building_padding: 1.0,
            hallway_radius: 1,
        }
    }
}

/// Build-time counters, kept for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct RasterDiagnostics {
    /// Stamped cell count per obstacle polygon, in input order.
    pub building_cells: Vec<(Option<String>, usize)>,
    pub carved_hallways: usize,
    pub skipped_hallways: usize,
    pub dead_ends_found: usize,
    pub dead_ends_repaired: usize,
    pub dead_ends_unresolved: usize,
}

/// Finished build artifact: the grid, the corridor mask, and diagnostics.
#[derive(Debug, Clone)]
pub struct RasterizedMap {
    pub config: GridConfig,
    /// Cells carved as hallway or entrance corridor, row-major. Not
    /// persisted; corridors are a build/query-time cost preference only.
    pub hallway_mask: Vec<bool>,
    pub diagnostics: RasterDiagnostics,
}

/// Rasterize the campus map into an occupancy grid.
///
/// # Errors
///
/// Returns [`Error::MalformedGeometry`] when the bounds polygon has no
/// usable extent. Unrepairable dead ends are logged warnings, not errors.
pub fn rasterize(map: &CampusMap, options: &RasterOptions) -> Result<RasterizedMap> {
    let mut canvas = Canvas::initialize(map, options)?;
    let mut diagnostics = RasterDiagnostics::default();

    stamp_obstacles(&mut canvas, map, options, &mut diagnostics);
    let mut carved = carve_hallways(&mut canvas, map, options, &mut diagnostics);
    carve_entrances(&mut canvas, map, options);
    repair_dead_ends(&mut canvas, map, &mut carved, options, &mut diagnostics, true);
    // Bounded validation pass: snap and neighbourhood search only, so the
    // build terminates after one more sweep.
    repair_dead_ends(&mut canvas, map, &mut carved, options, &mut diagnostics, false);

    info!(
        rows = canvas.config.rows(),
        cols = canvas.config.cols(),
        walkable = canvas.config.walkable_count(),
        obstacles = canvas.config.obstacle_count(),
        dead_ends_found = diagnostics.dead_ends_found,
        dead_ends_repaired = diagnostics.dead_ends_repaired,
        "rasterization complete"
    );

    Ok(RasterizedMap {
        config: canvas.config,
        hallway_mask: canvas.hallway,
        diagnostics,
    })
}

/// Mutable grid state threaded through the build phases.
struct Canvas {
    config: GridConfig,
    hallway: Vec<bool>,
    cell_size: f64,
}

impl Canvas {
    fn initialize(map: &CampusMap, options: &RasterOptions) -> Result<Self> {
        let extent = map.bounds.bounds();
        let lat_span = extent.lat_max - extent.lat_min;
        let lng_span = extent.lng_max - extent.lng_min;
        if lat_span <= 0.0 || lng_span <= 0.0 || options.cell_size <= 0.0 {
            return Err(Error::MalformedGeometry {
                detail: "bounds polygon has no usable extent".to_string(),
            });
        }

        let rows = (lat_span / options.cell_size).ceil() as usize;
        let cols = (lng_span / options.cell_size).ceil() as usize;
        // Anchor the extent at the south-west corner and extend to whole
        // cells so every cell spans exactly `cell_size` degrees.
        let bounds = GeoBounds {
            lat_min: extent.lat_min,
            lat_max: extent.lat_min + rows as f64 * options.cell_size,
            lng_min: extent.lng_min,
            lng_max: extent.lng_min + cols as f64 * options.cell_size,
        };

        let mut config = GridConfig::filled(rows, cols, bounds, OBSTACLE)?;
        for row in 0..rows {
            for col in 0..cols {
                let center = config.cell_to_geo(row, col);
                if map.bounds.contains(&center) {
                    let idx = config.index(row, col);
                    config.cells_mut()[idx] = WALKABLE;
                }
            }
        }

        debug!(rows, cols, "initialized grid from bounds polygon");
        Ok(Self {
            hallway: vec![false; rows * cols],
            config,
            cell_size: options.cell_size,
        })
    }

    fn set(&mut self, row: i64, col: i64, value: u8, corridor: bool) {
        if self.config.in_bounds(row, col) {
            let idx = self.config.index(row as usize, col as usize);
            self.config.cells_mut()[idx] = value;
            if corridor && value == WALKABLE {
                self.hallway[idx] = true;
            }
        }
    }

    /// Stamp a square of `radius` cells around the cell containing `point`.
    fn stamp(&mut self, point: &GeoPoint, radius: i64, value: u8, corridor: bool) {
        let (row, col) = self.config.geo_to_cell(point);
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                self.set(row + dr, col + dc, value, corridor);
            }
        }
    }

    /// Carve a straight corridor between two geographic points.
    fn carve_segment(&mut self, a: &GeoPoint, b: &GeoPoint, radius: i64) {
        let segment = Polyline::new(vec![*a, *b]);
        match segment {
            Ok(segment) => {
                for sample in segment.sample(self.cell_size) {
                    self.stamp(&sample, radius, WALKABLE, true);
                }
            }
            // Zero-length connector: the two points share a cell.
            Err(_) => self.stamp(a, radius, WALKABLE, true),
        }
    }

    fn walkable_neighbours(&self, row: i64, col: i64) -> usize {
        let mut count = 0;
        for dr in -1..=1_i64 {
            for dc in -1..=1_i64 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (r, c) = (row + dr, col + dc);
                if self.config.in_bounds(r, c)
                    && self.config.value(r as usize, c as usize) == WALKABLE
                {
                    count += 1;
                }
            }
        }
        count
    }

    fn point_has_open_neighbours(&self, point: &GeoPoint) -> bool {
        let (row, col) = self.config.geo_to_cell(point);
        self.config.in_bounds(row, col) && self.walkable_neighbours(row, col) >= 2
    }
}

fn stamp_obstacles(
    canvas: &mut Canvas,
    map: &CampusMap,
    options: &RasterOptions,
    diagnostics: &mut RasterDiagnostics,
) {
    let pad = options.building_padding * options.cell_size;
    for building in &map.buildings {
        let mut stamped = 0;
        let bbox = building.footprint.bounds();
        let north_west = GeoPoint::new(bbox.lat_max + pad, bbox.lng_min - pad);
        let south_east = GeoPoint::new(bbox.lat_min - pad, bbox.lng_max + pad);
        let (row_start, col_start) = canvas.config.geo_to_cell(&north_west);
        let (row_end, col_end) = canvas.config.geo_to_cell(&south_east);

        let row_start = row_start.max(0) as usize;
        let col_start = col_start.max(0) as usize;
        let row_end = (row_end.max(0) as usize + 1).min(canvas.config.rows());
        let col_end = (col_end.max(0) as usize + 1).min(canvas.config.cols());

        for row in row_start..row_end {
            for col in col_start..col_end {
                let center = canvas.config.cell_to_geo(row, col);
                if building.footprint.contains_dilated(&center, pad) {
                    let idx = canvas.config.index(row, col);
                    canvas.config.cells_mut()[idx] = OBSTACLE;
                    stamped += 1;
                }
            }
        }

        debug!(
            name = building.name.as_deref().unwrap_or("<unnamed>"),
            cells = stamped,
            "stamped obstacle polygon"
        );
        diagnostics
            .building_cells
            .push((building.name.clone(), stamped));
    }

    info!(
        obstacle_cells = canvas.config.obstacle_count(),
        "obstacle stamping complete"
    );
}

fn carve_hallways(
    canvas: &mut Canvas,
    map: &CampusMap,
    options: &RasterOptions,
    diagnostics: &mut RasterDiagnostics,
) -> Vec<Polyline> {
    let mut carved = Vec::new();
    for hallway in &map.hallways {
        // Hallways that never touch a building are not indoor corridors
        // and are left out of the grid entirely.
        let touches_building = map
            .buildings
            .iter()
            .any(|b| hallway.intersects_polygon(&b.footprint));
        if !touches_building {
            debug!("skipping hallway outside all buildings");
            diagnostics.skipped_hallways += 1;
            continue;
        }

        for sample in hallway.sample(options.cell_size) {
            canvas.stamp(&sample, options.hallway_radius, WALKABLE, true);
        }
        carved.push(hallway.clone());
    }

    diagnostics.carved_hallways = carved.len();
    info!(
        carved = diagnostics.carved_hallways,
        skipped = diagnostics.skipped_hallways,
        "hallway carving complete"
    );
    carved
}

fn carve_entrances(canvas: &mut Canvas, map: &CampusMap, options: &RasterOptions) {
    for entrance in &map.entrances {
        let Some(owner) = map.buildings.iter().find(|b| {
            b.footprint.contains(entrance)
                || b.footprint.distance_to_boundary(entrance) < EDGE_EPSILON
        }) else {
            debug!(lat = entrance.lat, lng = entrance.lng, "entrance has no owning building");
            continue;
        };

        // Nearest hallway that serves the owning building; ties resolve to
        // the first hallway in input order.
        let mut nearest: Option<(&Polyline, f64)> = None;
        for hallway in &map.hallways {
            if !hallway.intersects_polygon(&owner.footprint) {
                continue;
            }
            let dist = hallway.distance_to_point(entrance);
            if nearest.is_none_or(|(_, best)| dist < best) {
                nearest = Some((hallway, dist));
            }
        }
        if let Some((hallway, _)) = nearest {
            let target = hallway.nearest_point(entrance);
            canvas.carve_segment(entrance, &target, options.hallway_radius);
        }

        // Entrances recorded inside the footprint punch a corridor through
        // to the exterior wall.
        if owner.footprint.contains(entrance) {
            let exterior = owner.footprint.nearest_boundary_point(entrance);
            canvas.carve_segment(entrance, &exterior, options.hallway_radius);
        }

        canvas.stamp(entrance, 0, WALKABLE, true);
    }
}

/// Which end of a hallway a repair applies to.
#[derive(Clone, Copy)]
enum End {
    Head,
    Tail,
}

fn repair_dead_ends(
    canvas: &mut Canvas,
    map: &CampusMap,
    carved: &mut [Polyline],
    options: &RasterOptions,
    diagnostics: &mut RasterDiagnostics,
    allow_directional: bool,
) {
    for i in 0..carved.len() {
        for end in [End::Head, End::Tail] {
            let (endpoint, inner) = match end {
                End::Head => (carved[i].first(), carved[i].points()[1]),
                End::Tail => {
                    let points = carved[i].points();
                    (carved[i].last(), points[points.len() - 2])
                }
            };

            let (row, col) = canvas.config.geo_to_cell(&endpoint);
            if !canvas.config.in_bounds(row, col) {
                // Endpoints abutting or beyond the bounds edge are fine.
                continue;
            }
            if canvas.walkable_neighbours(row, col) >= 2 {
                continue;
            }

            diagnostics.dead_ends_found += 1;
            let fix = resolve_dead_end(
                canvas,
                map,
                carved,
                i,
                &endpoint,
                &inner,
                allow_directional,
            );

            match fix {
                Some(point) => {
                    canvas.carve_segment(&endpoint, &point, options.hallway_radius);
                    match end {
                        End::Head => carved[i].push_front(point),
                        End::Tail => carved[i].push_back(point),
                    }
                    diagnostics.dead_ends_repaired += 1;
                    debug!(
                        hallway = i,
                        lat = point.lat,
                        lng = point.lng,
                        "repaired dead-end hallway endpoint"
                    );
                }
                None => {
                    diagnostics.dead_ends_unresolved += 1;
                    warn!(
                        hallway = i,
                        row, col, "unresolved dead-end hallway endpoint"
                    );
                }
            }
        }
    }
}

fn resolve_dead_end(
    canvas: &Canvas,
    map: &CampusMap,
    carved: &[Polyline],
    hallway_index: usize,
    endpoint: &GeoPoint,
    inner: &GeoPoint,
    allow_directional: bool,
) -> Option<GeoPoint> {
    if allow_directional {
        if let Some(direction) = unit_direction(inner, endpoint) {
            let perpendicular = (-direction.1, direction.0);
            let opposite = (direction.1, -direction.0);
            for dir in [direction, perpendicular, opposite] {
                if let Some(point) = directional_extension(canvas, map, endpoint, dir) {
                    return Some(point);
                }
            }
        }
    }

    let primary = SNAP_RADIUS_METERS / METERS_PER_DEGREE;
    if let Some(point) = snap_to_feature(canvas, map, carved, hallway_index, endpoint, primary) {
        return Some(point);
    }
    warn!(
        radius_m = SNAP_FALLBACK_METERS,
        "widening dead-end snap radius"
    );
    let fallback = SNAP_FALLBACK_METERS / METERS_PER_DEGREE;
    if let Some(point) = snap_to_feature(canvas, map, carved, hallway_index, endpoint, fallback) {
        return Some(point);
    }

    nearby_open_cell(canvas, endpoint)
}

/// Walk outward from the endpoint along `dir`; when the probe reaches an
/// obstacle polygon, snap to its boundary, push a few cells further in,
/// and accept the spot if it opens onto walkable space.
fn directional_extension(
    canvas: &Canvas,
    map: &CampusMap,
    endpoint: &GeoPoint,
    dir: (f64, f64),
) -> Option<GeoPoint> {
    let step = canvas.cell_size;
    for k in 1..=PROBE_MAX_CELLS {
        let probe = GeoPoint::new(
            endpoint.lat + dir.0 * k as f64 * step,
            endpoint.lng + dir.1 * k as f64 * step,
        );
        for building in &map.buildings {
            if building.footprint.contains_dilated(&probe, step) {
                let snapped = building.footprint.nearest_boundary_point(&probe);
                let fixed = GeoPoint::new(
                    snapped.lat + dir.0 * BOUNDARY_PUSH_CELLS * step,
                    snapped.lng + dir.1 * BOUNDARY_PUSH_CELLS * step,
                );
                if canvas.point_has_open_neighbours(&fixed) {
                    return Some(fixed);
                }
                return None;
            }
        }
    }
    None
}

/// Look for a point on another hallway or a building edge within `radius`
/// degrees whose cell already opens onto walkable space. The geometrically
/// closest candidate wins.
fn snap_to_feature(
    canvas: &Canvas,
    map: &CampusMap,
    carved: &[Polyline],
    hallway_index: usize,
    endpoint: &GeoPoint,
    radius: f64,
) -> Option<GeoPoint> {
    let mut best: Option<(GeoPoint, f64)> = None;
    let mut consider = |candidate: GeoPoint| {
        let dist = endpoint.distance_to(&candidate);
        if dist > radius || !canvas.point_has_open_neighbours(&candidate) {
            return;
        }
        if best.is_none_or(|(_, current)| dist < current) {
            best = Some((candidate, dist));
        }
    };

    for (j, other) in carved.iter().enumerate() {
        if j == hallway_index {
            continue;
        }
        for sample in other.sample(canvas.cell_size) {
            consider(sample);
        }
    }
    for building in &map.buildings {
        consider(building.footprint.nearest_boundary_point(endpoint));
    }

    best.map(|(point, _)| point)
}

/// Last resort: the nearest walkable cell within a bounded neighbourhood
/// that already has at least two walkable neighbours.
fn nearby_open_cell(canvas: &Canvas, endpoint: &GeoPoint) -> Option<GeoPoint> {
    let (row, col) = canvas.config.geo_to_cell(endpoint);
    let mut best: Option<((usize, usize), i64)> = None;
    for dr in -CELL_SEARCH_RADIUS..=CELL_SEARCH_RADIUS {
        for dc in -CELL_SEARCH_RADIUS..=CELL_SEARCH_RADIUS {
            let (r, c) = (row + dr, col + dc);
            if !canvas.config.in_bounds(r, c) {
                continue;
            }
            if canvas.config.value(r as usize, c as usize) != WALKABLE {
                continue;
            }
            if canvas.walkable_neighbours(r, c) < 2 {
                continue;
            }
            let dist_sq = dr * dr + dc * dc;
            if best.is_none_or(|(_, current)| dist_sq < current) {
                best = Some(((r as usize, c as usize), dist_sq));
            }
        }
    }
    best.map(|((r, c), _)| canvas.config.cell_to_geo(r, c))
}

fn unit_direction(from: &GeoPoint, to: &GeoPoint) -> Option<(f64, f64)> {
    let dlat = to.lat - from.lat;
    let dlng = to.lng - from.lng;
    let len = (dlat * dlat + dlng * dlng).sqrt();
    if len < 1e-15 {
        return None;
    }
    Some((dlat / len, dlng / len))
}
