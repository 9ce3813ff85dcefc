//! Location model
//!
//! Locations are value objects: their identity is the coordinate pair, not the
//! row that happens to store them. Two requests for the same coordinates
//! resolve to the same `Location` (same id) no matter how many times they are
//! submitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Namespace for the deterministic location ids.
const LOCATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b9e_5d0a_4c7e_9a43_1e2f_8b7d_0c55);

/// Scale used to normalize degrees into integer micro-degrees.
const MICRO_DEGREES: f64 = 1_000_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Integer key of a coordinate, normalized to micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey {
    pub lat_micro: i64,
    pub lon_micro: i64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey {
            lat_micro: (self.latitude * MICRO_DEGREES).round() as i64,
            lon_micro: (self.longitude * MICRO_DEGREES).round() as i64,
        }
    }

    /// The coordinate rounded to the precision used for identity.
    pub fn normalized(&self) -> Self {
        let key = self.key();
        Self {
            latitude: key.lat_micro as f64 / MICRO_DEGREES,
            longitude: key.lon_micro as f64 / MICRO_DEGREES,
        }
    }

    /// Directions providers expect `lon,lat` order.
    pub fn to_lon_lat(&self) -> String {
        format!("{:.6},{:.6}", self.longitude, self.latitude)
    }
}

impl CoordinateKey {
    /// Deterministic location id for this key.
    pub fn location_id(&self) -> Uuid {
        let name = format!("{}:{}", self.lat_micro, self.lon_micro);
        Uuid::new_v5(&LOCATION_NAMESPACE, name.as_bytes())
    }
}

/// A stored location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Location {
    /// Build the canonical location for a coordinate. The id only depends on
    /// the normalized coordinate.
    pub fn new(coordinate: Coordinate, street_name: Option<String>) -> Self {
        let normalized = coordinate.normalized();
        Self {
            id: coordinate.key().location_id(),
            latitude: normalized.latitude,
            longitude: normalized.longitude,
            street_name: street_name.filter(|name| !name.trim().is_empty()),
            created_at: Utc::now(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn key(&self) -> CoordinateKey {
        self.coordinate().key()
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Location {}

/// Location as supplied by API callers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default, alias = "name")]
    pub street_name: Option<String>,
}

impl LocationInput {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
