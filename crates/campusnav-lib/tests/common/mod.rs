#![allow(dead_code)]

use std::path::PathBuf;

use campusnav_lib::{rasterize, CampusMap, RasterOptions, RasterizedMap};

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/minimal_campus.geojson")
}

pub fn fixture_map() -> CampusMap {
    CampusMap::from_path(&fixture_path()).expect("fixture loads")
}

pub fn fixture_raster() -> RasterizedMap {
    rasterize(&fixture_map(), &RasterOptions::default()).expect("fixture rasterizes")
}
