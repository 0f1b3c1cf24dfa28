//! Geodesic distance on the WGS-84 ellipsoid

use crate::types::Coordinate;
use ::geo::{GeodesicDistance, Point};

/// Distance in kilometers between two coordinates along the WGS-84 geodesic.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let a = Point::new(from.longitude, from.latitude);
    let b = Point::new(to.longitude, to.latitude);
    a.geodesic_distance(&b) / 1000.0
}
