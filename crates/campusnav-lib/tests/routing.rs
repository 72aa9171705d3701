mod common;

use campusnav_lib::{plan_route, plan_route_on, GeoPoint, RouteRequest};

#[test]
fn routes_from_the_quad_into_the_science_hall_corridor() {
    let rasterized = common::fixture_raster();
    let config = &rasterized.config;

    // Open ground in the south-west corner of the campus to a point on
    // the corridor inside Science Hall.
    let start = GeoPoint::new(47.0001, -117.0009);
    let end = GeoPoint::new(47.0007, -117.0006);
    let mut request = RouteRequest::new(start, end);
    request.smooth = false;

    let plan = plan_route_on(config, Some(&rasterized.hallway_mask), &request).unwrap();
    assert!(plan.found());
    assert!(plan.adjustments.is_empty());
    for (row, col) in &plan.cells {
        assert!(!config.is_obstacle(*row, *col));
    }
    // Consecutive cells stay 8-connected.
    for pair in plan.cells.windows(2) {
        let dr = (pair[0].0 as i64 - pair[1].0 as i64).abs();
        let dc = (pair[0].1 as i64 - pair[1].1 as i64).abs();
        assert!(dr <= 1 && dc <= 1);
    }
}

#[test]
fn smoothed_route_stays_on_walkable_cells() {
    let rasterized = common::fixture_raster();
    let config = &rasterized.config;

    let start = GeoPoint::new(47.0001, -117.0009);
    let end = GeoPoint::new(47.0007, -117.0006);
    let request = RouteRequest::new(start, end);

    let plan = plan_route_on(config, Some(&rasterized.hallway_mask), &request).unwrap();
    assert!(plan.found());
    for point in &plan.path {
        let (row, col) = config.geo_to_cell(point);
        assert!(config.in_bounds(row, col));
        assert!(!config.is_obstacle(row as usize, col as usize));
    }
}

#[test]
fn request_outside_the_extent_is_clamped_and_still_routed() {
    let rasterized = common::fixture_raster();
    let config = &rasterized.config;

    // Far north-west of the campus.
    let start = GeoPoint::new(47.002, -117.002);
    let end = GeoPoint::new(47.0001, -117.0009);
    let mut request = RouteRequest::new(start, end);
    request.smooth = false;

    let plan = plan_route(config, &request).unwrap();
    assert!(plan.found());
    assert_eq!(plan.adjustments.len(), 1);
}

#[test]
fn request_on_a_building_moves_to_the_nearest_walkable_cell() {
    let rasterized = common::fixture_raster();
    let config = &rasterized.config;

    // Inside the Library, which has no carved corridor.
    let start = GeoPoint::new(47.0003, -117.00035);
    let end = GeoPoint::new(47.0001, -117.0009);
    let mut request = RouteRequest::new(start, end);
    request.smooth = false;

    let plan = plan_route(config, &request).unwrap();
    assert!(plan.found());
    assert_eq!(plan.adjustments.len(), 1);
    let adjusted = plan.cells.first().unwrap();
    assert!(!config.is_obstacle(adjusted.0, adjusted.1));
}
