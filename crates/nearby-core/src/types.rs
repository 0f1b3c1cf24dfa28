use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Name reported for restaurants whose document has no name.
pub const UNNAMED_RESTAURANT: &str = "Unnamed";

/// Number of results a query returns.
pub const TOP_K: usize = 3;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Round both axes to `decimals` fractional digits.
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            latitude: round_to(self.latitude, decimals),
            longitude: round_to(self.longitude, decimals),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Round `value` to `decimals` fractional digits, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A normalized cuisine filter. The empty filter matches every restaurant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CuisineFilter(String);

impl CuisineFilter {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_cuisine(Some(raw.as_ref())))
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The filter as a nullable column value: `None` when no filter applies.
    pub fn as_option(&self) -> Option<&str> {
        if self.is_any() {
            None
        } else {
            Some(&self.0)
        }
    }

    /// Exact, case-insensitive match against a document's cuisine.
    pub fn matches(&self, cuisine: Option<&str>) -> bool {
        self.is_any() || self.0 == normalize_cuisine(cuisine)
    }
}

impl fmt::Display for CuisineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "any")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Absent cuisines normalize to the empty string, others are trimmed and lowercased.
pub fn normalize_cuisine(cuisine: Option<&str>) -> String {
    cuisine.map(|c| c.trim().to_lowercase()).unwrap_or_default()
}

/// GeoJSON-style point. `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub coord: Option<GeoPoint>,
}

/// A restaurant document as read from the collection. Fields other than these are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl RestaurantRecord {
    /// Build a record located at `coordinate`.
    pub fn at(name: impl Into<String>, cuisine: Option<&str>, coordinate: Coordinate) -> Self {
        Self {
            restaurant_id: None,
            name: Some(name.into()),
            cuisine: cuisine.map(str::to_string),
            address: Some(Address {
                coord: Some(GeoPoint {
                    kind: Some("Point".to_string()),
                    coordinates: vec![coordinate.longitude, coordinate.latitude],
                }),
            }),
        }
    }

    /// The restaurant's position, if the document carries a usable one.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinates = &self.address.as_ref()?.coord.as_ref()?.coordinates;
        let (longitude, latitude) = match coordinates.as_slice() {
            [lon, lat, ..] => (*lon, *lat),
            _ => return None,
        };
        if !longitude.is_finite() || !latitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Coordinate::new(latitude, longitude))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_RESTAURANT)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One ranked restaurant in a query answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub name: String,
    pub distance_km: f64,
    pub cuisine: Option<String>,
}

impl RankedResult {
    pub fn new(name: impl Into<String>, distance_km: f64, cuisine: Option<String>) -> Self {
        Self {
            name: name.into(),
            distance_km,
            cuisine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuisine_filter_normalizes() {
        let filter = CuisineFilter::new("  Italian ");
        assert_eq!(filter.as_str(), "italian");
        assert!(filter.matches(Some("ITALIAN")));
        assert!(filter.matches(Some(" italian")));
        assert!(!filter.matches(Some("Italian/Pizza")));
        assert!(!filter.matches(None));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = CuisineFilter::new("   ");
        assert!(filter.is_any());
        assert_eq!(filter.as_option(), None);
        assert!(filter.matches(None));
        assert!(filter.matches(Some("Thai")));
    }

    #[test]
    fn test_coordinate_extraction() {
        let record = RestaurantRecord::at("Joe's", Some("Pizza"), Coordinate::new(40.7, -73.9));
        assert_eq!(record.coordinate(), Some(Coordinate::new(40.7, -73.9)));

        let missing = RestaurantRecord {
            name: Some("Nowhere".into()),
            ..Default::default()
        };
        assert_eq!(missing.coordinate(), None);

        let short = RestaurantRecord {
            address: Some(Address {
                coord: Some(GeoPoint {
                    kind: None,
                    coordinates: vec![-73.9],
                }),
            }),
            ..Default::default()
        };
        assert_eq!(short.coordinate(), None);
    }

    #[test]
    fn test_record_from_document() {
        let json = r#"{
            "restaurant_id": 30075445,
            "name": "Morris Park Bake Shop",
            "cuisine": "Bakery",
            "borough": "Bronx",
            "address": {"building": "1007", "coord": {"type": "Point", "coordinates": [-73.856077, 40.848447]}},
            "grades": []
        }"#;
        let record: RestaurantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.restaurant_id.as_deref(), Some("30075445"));
        assert_eq!(record.display_name(), "Morris Park Bake Shop");
        assert_eq!(
            record.coordinate(),
            Some(Coordinate::new(40.848447, -73.856077))
        );
    }

    #[test]
    fn test_unnamed_record() {
        let record = RestaurantRecord::default();
        assert_eq!(record.display_name(), UNNAMED_RESTAURANT);
    }

    #[test]
    fn test_rounding() {
        let c = Coordinate::new(40.75891234, -73.98514999).rounded(6);
        assert_eq!(c, Coordinate::new(40.758912, -73.98515));
    }
}
