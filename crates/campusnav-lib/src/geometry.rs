//! Planar geometry primitives over geographic coordinates.
//!
//! All computations happen in raw degree space (longitude as x, latitude
//! as y), matching the source map data. The grid spacing is small enough
//! (roughly two metres) that latitude/longitude anisotropy does not affect
//! containment or nearest-point queries at campus scale.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Straight-line distance in degree space.
    #[must_use]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }
}

/// Axis-aligned geographic extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

/// Closed polygon ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<GeoPoint>,
}

impl Polygon {
    /// Build a polygon from its exterior ring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGeometry`] when the ring has fewer than
    /// three vertices.
    pub fn new(ring: Vec<GeoPoint>) -> Result<Self> {
        if ring.len() < 3 {
            return Err(Error::MalformedGeometry {
                detail: format!("polygon ring has {} vertices, need at least 3", ring.len()),
            });
        }
        Ok(Self { ring })
    }

    #[must_use]
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Axis-aligned bounds of the ring.
    #[must_use]
    pub fn bounds(&self) -> GeoBounds {
        let mut bounds = GeoBounds {
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
            lng_min: f64::INFINITY,
            lng_max: f64::NEG_INFINITY,
        };
        for p in &self.ring {
            bounds.lat_min = bounds.lat_min.min(p.lat);
            bounds.lat_max = bounds.lat_max.max(p.lat);
            bounds.lng_min = bounds.lng_min.min(p.lng);
            bounds.lng_max = bounds.lng_max.max(p.lng);
        }
        bounds
    }

    /// Absolute polygon area in square degrees (shoelace formula).
    #[must_use]
    pub fn area(&self) -> f64 {
        let n = self.ring.len();
        let mut sum = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            sum += self.ring[i].lng * self.ring[j].lat - self.ring[j].lng * self.ring[i].lat;
        }
        (sum * 0.5).abs()
    }

    /// Point-in-polygon test by ray casting.
    #[must_use]
    pub fn contains(&self, p: &GeoPoint) -> bool {
        let n = self.ring.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[j];
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let intersect_lng = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
                if p.lng < intersect_lng {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Nearest point on the polygon boundary.
    #[must_use]
    pub fn nearest_boundary_point(&self, p: &GeoPoint) -> GeoPoint {
        let n = self.ring.len();
        let mut best = self.ring[0];
        let mut best_dist = f64::INFINITY;
        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[(i + 1) % n];
            let candidate = nearest_point_on_segment(p, &a, &b);
            let dist = p.distance_to(&candidate);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }

    /// Minimum distance from a point to the polygon boundary.
    #[must_use]
    pub fn distance_to_boundary(&self, p: &GeoPoint) -> f64 {
        p.distance_to(&self.nearest_boundary_point(p))
    }

    /// Membership test against the polygon dilated outward by `pad`
    /// degrees. Equivalent to rasterizing the buffered footprint without
    /// constructing the offset ring.
    #[must_use]
    pub fn contains_dilated(&self, p: &GeoPoint, pad: f64) -> bool {
        if self.contains(p) {
            return true;
        }
        pad > 0.0 && self.distance_to_boundary(p) <= pad
    }
}

/// Open polyline (hallway centerline).
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    /// Build a polyline from an ordered vertex chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGeometry`] when the chain has fewer than
    /// two vertices.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::MalformedGeometry {
                detail: format!("polyline has {} vertices, need at least 2", points.len()),
            });
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[must_use]
    pub fn first(&self) -> GeoPoint {
        self.points[0]
    }

    #[must_use]
    pub fn last(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// Append a vertex at the tail.
    pub fn push_back(&mut self, p: GeoPoint) {
        self.points.push(p);
    }

    /// Insert a vertex at the head.
    pub fn push_front(&mut self, p: GeoPoint) {
        self.points.insert(0, p);
    }

    /// Total arc length in degree space.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// Point at arc-length `distance` from the start, clamped to the ends.
    #[must_use]
    pub fn point_at(&self, distance: f64) -> GeoPoint {
        if distance <= 0.0 {
            return self.first();
        }
        let mut remaining = distance;
        for w in self.points.windows(2) {
            let seg = w[0].distance_to(&w[1]);
            if remaining <= seg && seg > 0.0 {
                let t = remaining / seg;
                return GeoPoint::new(
                    w[0].lat + t * (w[1].lat - w[0].lat),
                    w[0].lng + t * (w[1].lng - w[0].lng),
                );
            }
            remaining -= seg;
        }
        self.last()
    }

    /// Sample points along the polyline at a fixed arc-length step.
    /// Always includes both endpoints.
    #[must_use]
    pub fn sample(&self, step: f64) -> Vec<GeoPoint> {
        let length = self.length();
        if length == 0.0 || step <= 0.0 {
            return vec![self.first()];
        }
        let count = (length / step).floor() as usize + 1;
        let mut samples = Vec::with_capacity(count + 1);
        for i in 0..count {
            samples.push(self.point_at(i as f64 * step));
        }
        samples.push(self.last());
        samples
    }

    /// Nearest point on the polyline to `p`.
    #[must_use]
    pub fn nearest_point(&self, p: &GeoPoint) -> GeoPoint {
        let mut best = self.points[0];
        let mut best_dist = f64::INFINITY;
        for w in self.points.windows(2) {
            let candidate = nearest_point_on_segment(p, &w[0], &w[1]);
            let dist = p.distance_to(&candidate);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }

    /// Minimum distance from `p` to the polyline.
    #[must_use]
    pub fn distance_to_point(&self, p: &GeoPoint) -> f64 {
        p.distance_to(&self.nearest_point(p))
    }

    /// Whether the polyline touches the polygon: a vertex falls inside the
    /// ring, or any polyline segment crosses a ring edge.
    #[must_use]
    pub fn intersects_polygon(&self, polygon: &Polygon) -> bool {
        if self.points.iter().any(|p| polygon.contains(p)) {
            return true;
        }
        let ring = polygon.ring();
        let n = ring.len();
        for w in self.points.windows(2) {
            for i in 0..n {
                if segments_intersect(&w[0], &w[1], &ring[i], &ring[(i + 1) % n]) {
                    return true;
                }
            }
        }
        false
    }
}

/// Nearest point on segment `ab` to point `p` (projection clamped to the
/// segment).
#[must_use]
pub fn nearest_point_on_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-20 {
        return *a;
    }
    let t = ((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    GeoPoint::new(a.lat + t * dy, a.lng + t * dx)
}

/// Proper or touching intersection test for segments `ab` and `cd`.
#[must_use]
pub fn segments_intersect(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint, d: &GeoPoint) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

fn cross(o: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> f64 {
    (a.lng - o.lng) * (b.lat - o.lat) - (b.lng - o.lng) * (a.lat - o.lat)
}

fn on_segment(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> bool {
    p.lng >= a.lng.min(b.lng)
        && p.lng <= a.lng.max(b.lng)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn contains_inside_and_outside() {
        let square = unit_square();
        assert!(square.contains(&GeoPoint::new(0.5, 0.5)));
        assert!(!square.contains(&GeoPoint::new(1.5, 0.5)));
        assert!(!square.contains(&GeoPoint::new(-0.1, -0.1)));
    }

    #[test]
    fn area_unit_square() {
        assert!((unit_square().area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dilated_containment_extends_beyond_boundary() {
        let square = unit_square();
        let just_outside = GeoPoint::new(0.5, 1.05);
        assert!(!square.contains(&just_outside));
        assert!(square.contains_dilated(&just_outside, 0.1));
        assert!(!square.contains_dilated(&just_outside, 0.01));
    }

    #[test]
    fn nearest_boundary_point_projects_onto_edge() {
        let square = unit_square();
        let p = GeoPoint::new(0.5, 2.0);
        let nearest = square.nearest_boundary_point(&p);
        assert!((nearest.lat - 0.5).abs() < 1e-12);
        assert!((nearest.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn polyline_sampling_includes_endpoints() {
        let line = Polyline::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]).unwrap();
        let samples = line.sample(0.3);
        assert_eq!(samples[0], line.first());
        assert_eq!(*samples.last().unwrap(), line.last());
        assert!(samples.len() >= 4);
    }

    #[test]
    fn polyline_polygon_intersection() {
        let square = unit_square();
        let crossing =
            Polyline::new(vec![GeoPoint::new(0.5, -1.0), GeoPoint::new(0.5, 2.0)]).unwrap();
        let outside =
            Polyline::new(vec![GeoPoint::new(2.0, 0.0), GeoPoint::new(2.0, 1.0)]).unwrap();
        assert!(crossing.intersects_polygon(&square));
        assert!(!outside.intersects_polygon(&square));
    }

    #[test]
    fn degenerate_rings_are_rejected() {
        let result = Polygon::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]);
        assert!(result.is_err());
    }
}
