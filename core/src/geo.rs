//! Great-circle geometry for raw GPS coordinates.
//!
//! All distances are haversine distances in meters. Inputs are raw
//! latitude/longitude degrees, so planar Euclidean distance is never
//! appropriate here, even at the ~10 m scale the clusterer works at.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated GPS coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// True when both components are finite and inside the valid
    /// latitude/longitude ranges.
    pub fn is_valid(lat: f64, lon: f64) -> bool {
        lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
    }

    /// Haversine distance to another point, in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// Arithmetic mean of a non-empty set of points. Adequate at the
/// tens-of-meters scale clusters live at; not meridian-safe for
/// antipodal spreads, which cannot occur within a radius-bounded
/// cluster.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
    Some(GeoPoint { lat, lon })
}
