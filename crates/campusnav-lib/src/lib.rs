//! Campus navigation library entry points.
//!
//! This crate turns a campus feature map into a persisted walkability
//! grid and answers routing requests over it: rasterization, obstacle
//! padding, A* search, and path smoothing. Higher-level consumers (CLI,
//! services) should only depend on the functions exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod cost;
pub mod error;
pub mod features;
pub mod geometry;
pub mod grid;
pub mod path;
pub mod raster;
pub mod routing;
pub mod smooth;

pub use cost::{apply_padding, resolve_endpoint, CostGrid, ResolvedCell};
pub use error::{Error, Result};
pub use features::{Building, CampusMap};
pub use geometry::{GeoBounds, GeoPoint, Polygon, Polyline};
pub use grid::{GridConfig, OBSTACLE, WALKABLE};
pub use path::{find_path, Cell};
pub use raster::{rasterize, RasterDiagnostics, RasterOptions, RasterizedMap};
pub use routing::{plan_route, plan_route_on, RoutePlan, RouteRequest};
pub use smooth::{reduce_waypoints, smooth_path, SmoothedPath, SmoothOptions};
