//! Service region bounds, checked where user input enters the system

use crate::error::{NearbyError, Result};
use crate::types::Coordinate;

/// Latitude/longitude bounding box of the area the collection covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceRegion {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for ServiceRegion {
    /// New York City and its surroundings.
    fn default() -> Self {
        Self {
            lat_min: 40.50,
            lat_max: 41.20,
            lon_min: -74.26,
            lon_max: -73.20,
        }
    }
}

impl ServiceRegion {
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        (self.lat_min..=self.lat_max).contains(&coordinate.latitude)
            && (self.lon_min..=self.lon_max).contains(&coordinate.longitude)
    }

    /// Accept `(latitude, longitude)` only when it lies inside the region.
    pub fn validate(&self, latitude: f64, longitude: f64) -> Result<Coordinate> {
        let coordinate = Coordinate::new(latitude, longitude);
        if latitude.is_finite() && longitude.is_finite() && self.contains(coordinate) {
            Ok(coordinate)
        } else {
            Err(NearbyError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }
}
