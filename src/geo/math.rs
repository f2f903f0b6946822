//! Distance and centroid primitives.
//!
//! Statute miles are the canonical distance unit for the whole crate.

use crate::core::model::GeoPoint;
use crate::core::DispatchError;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Miles spanned by one degree of latitude.
const MILES_PER_DEGREE: f64 = EARTH_RADIUS_MILES * std::f64::consts::PI / 180.0;

/// Great-circle (haversine) distance between two points in statute miles.
pub fn distance_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let s1 = (dlat / 2.0).sin();
    let s2 = (dlon / 2.0).sin();
    let h = (s1 * s1 + lat1.cos() * lat2.cos() * s2 * s2).min(1.0);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Arithmetic mean of latitudes and of longitudes.
///
/// A planar approximation, fine at metro-area scale. Not meaningful for point
/// sets straddling the antimeridian.
pub fn centroid(points: &[GeoPoint]) -> Result<GeoPoint, DispatchError> {
    if points.is_empty() {
        return Err(DispatchError::EmptyInput("centroid of zero points"));
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Ok(GeoPoint {
        lat: lat_sum / n,
        lon: lon_sum / n,
    })
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Smallest box containing every point.
    pub fn from_points(points: &[GeoPoint]) -> Result<Self, DispatchError> {
        let first = points
            .first()
            .ok_or(DispatchError::EmptyInput("bounding box of zero points"))?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Ok(points.iter().skip(1).fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.lat),
            max_lat: b.max_lat.max(p.lat),
            min_lon: b.min_lon.min(p.lon),
            max_lon: b.max_lon.max(p.lon),
        }))
    }

    /// A box guaranteed to contain every point within `radius_miles` of
    /// `center`. Conservative: it may also contain points slightly farther.
    pub fn around(center: GeoPoint, radius_miles: f64) -> Self {
        // 1% slack absorbs the gap between the haversine and the box edges.
        let dlat = radius_miles / MILES_PER_DEGREE * 1.01;
        let min_lat = (center.lat - dlat).max(-90.0);
        let max_lat = (center.lat + dlat).min(90.0);
        let widest = min_lat.abs().max(max_lat.abs()).to_radians().cos();
        let dlon = if widest <= 1e-6 {
            180.0
        } else {
            radius_miles / (MILES_PER_DEGREE * widest) * 1.01
        };
        if dlon >= 180.0 {
            return Self {
                min_lat,
                max_lat,
                min_lon: -180.0,
                max_lon: 180.0,
            };
        }
        Self {
            min_lat,
            max_lat,
            min_lon: center.lon - dlon,
            max_lon: center.lon + dlon,
        }
    }

    /// Whether the point lies inside the box (edges inclusive).
    ///
    /// Longitudes past ±180 are compared after wrapping.
    pub fn contains(&self, point: GeoPoint) -> bool {
        if point.lat < self.min_lat || point.lat > self.max_lat {
            return false;
        }
        [point.lon, point.lon - 360.0, point.lon + 360.0]
            .iter()
            .any(|lon| *lon >= self.min_lon && *lon <= self.max_lon)
    }

    /// Diagonal span in miles, a rough measure of geographic spread.
    pub fn diagonal_miles(&self) -> f64 {
        distance_miles(
            GeoPoint {
                lat: self.min_lat,
                lon: self.min_lon,
            },
            GeoPoint {
                lat: self.max_lat,
                lon: self.max_lon,
            },
        )
    }
}
