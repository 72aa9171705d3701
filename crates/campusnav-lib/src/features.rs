//! Map-source boundary: a GeoJSON-style feature collection parsed into
//! typed campus geometry.
//!
//! The collection carries polygons (one named "Bounds", the rest building
//! footprints), line strings (hallway centerlines) and points (entrances),
//! all in geographic coordinates with GeoJSON's `[lng, lat]` ordering.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geometry::{GeoPoint, Polygon, Polyline};

/// Building footprint with its optional display name.
#[derive(Debug, Clone)]
pub struct Building {
    pub name: Option<String>,
    pub footprint: Polygon,
}

/// Typed campus geometry extracted from the map source.
#[derive(Debug, Clone)]
pub struct CampusMap {
    pub bounds: Polygon,
    pub buildings: Vec<Building>,
    pub hallways: Vec<Polyline>,
    pub entrances: Vec<GeoPoint>,
}

impl CampusMap {
    /// Parse a feature collection from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBounds`] / [`Error::MultipleBounds`] when
    /// the bounds polygon invariant is violated, and
    /// [`Error::MalformedGeometry`] for unusable rings or chains.
    pub fn from_json(json: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(json)?;
        Self::from_collection(collection)
    }

    /// Read and parse a feature collection from disk.
    ///
    /// # Errors
    ///
    /// As [`CampusMap::from_json`], plus IO errors.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn from_collection(collection: FeatureCollection) -> Result<Self> {
        let mut bounds_rings: Vec<Polygon> = Vec::new();
        let mut buildings = Vec::new();
        let mut hallways = Vec::new();
        let mut entrances = Vec::new();

        for feature in collection.features {
            match feature.geometry {
                Geometry::Polygon { coordinates } => {
                    let mut rings = coordinates.into_iter();
                    let ring = rings.next().ok_or_else(|| Error::MalformedGeometry {
                        detail: "polygon feature has no rings".to_string(),
                    })?;
                    // Only the exterior ring is rasterized; a courtyard
                    // hole would fill in as solid obstacle.
                    if rings.len() > 0 {
                        warn!(
                            name = feature.properties.name.as_deref().unwrap_or("<unnamed>"),
                            dropped = rings.len(),
                            "ignoring interior polygon rings"
                        );
                    }
                    let polygon = Polygon::new(ring.into_iter().map(coord_to_point).collect())?;
                    if feature.properties.name.as_deref() == Some("Bounds") {
                        bounds_rings.push(polygon);
                    } else {
                        buildings.push(Building {
                            name: feature.properties.name,
                            footprint: polygon,
                        });
                    }
                }
                Geometry::LineString { coordinates } => {
                    hallways.push(Polyline::new(
                        coordinates.into_iter().map(coord_to_point).collect(),
                    )?);
                }
                Geometry::Point { coordinates } => {
                    entrances.push(coord_to_point(coordinates));
                }
            }
        }

        let bounds = match bounds_rings.len() {
            0 => return Err(Error::MissingBounds),
            1 => bounds_rings.remove(0),
            count => return Err(Error::MultipleBounds { count }),
        };

        info!(
            buildings = buildings.len(),
            hallways = hallways.len(),
            entrances = entrances.len(),
            "loaded campus map"
        );

        Ok(Self {
            bounds,
            buildings,
            hallways,
            entrances,
        })
    }
}

fn coord_to_point(coord: [f64; 2]) -> GeoPoint {
    GeoPoint::new(coord[1], coord[0])
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    LineString { coordinates: Vec<[f64; 2]> },
    Point { coordinates: [f64; 2] },
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Bounds"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Library"},
                "geometry": {"type": "Polygon", "coordinates": [[[0.2,0.2],[0.2,0.4],[0.4,0.4],[0.4,0.2],[0.2,0.2]]]}
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[0.1,0.3],[0.5,0.3]]}
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [0.2, 0.3]}
            }
        ]
    }"#;

    #[test]
    fn parses_each_feature_kind() {
        let map = CampusMap::from_json(MAP).unwrap();
        assert_eq!(map.buildings.len(), 1);
        assert_eq!(map.buildings[0].name.as_deref(), Some("Library"));
        assert_eq!(map.hallways.len(), 1);
        assert_eq!(map.entrances.len(), 1);
        // GeoJSON order is [lng, lat].
        assert!((map.entrances[0].lat - 0.3).abs() < 1e-12);
        assert!((map.entrances[0].lng - 0.2).abs() < 1e-12);
    }

    #[test]
    fn interior_rings_are_dropped() {
        // The courtyard hole is ignored: only the exterior ring survives,
        // so the footprint stays solid.
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "Bounds"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Cloister"},
                    "geometry": {"type": "Polygon", "coordinates": [
                        [[0.2,0.2],[0.2,0.8],[0.8,0.8],[0.8,0.2],[0.2,0.2]],
                        [[0.4,0.4],[0.4,0.6],[0.6,0.6],[0.6,0.4],[0.4,0.4]]
                    ]}
                }
            ]
        }"#;
        let map = CampusMap::from_json(json).unwrap();
        assert_eq!(map.buildings.len(), 1);
        let courtyard = GeoPoint::new(0.5, 0.5);
        assert!(map.buildings[0].footprint.contains(&courtyard));
    }

    #[test]
    fn missing_bounds_is_fatal() {
        let json = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            CampusMap::from_json(json),
            Err(Error::MissingBounds)
        ));
    }

    #[test]
    fn duplicate_bounds_is_fatal() {
        let bounds = r#"{
            "type": "Feature",
            "properties": {"name": "Bounds"},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}
        }"#;
        let json = format!(
            r#"{{"type": "FeatureCollection", "features": [{bounds}, {bounds}]}}"#
        );
        assert!(matches!(
            CampusMap::from_json(&json),
            Err(Error::MultipleBounds { count: 2 })
        ));
    }
}
