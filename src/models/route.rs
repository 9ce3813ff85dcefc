//! Route model
//!
//! Routes come back from the directions provider and are cached on the trip as
//! an opaque JSON payload. The shapes here follow the Directions API response
//! (`routes[].legs[]`) so the cached payload can be handed back to clients
//! unchanged.

use serde::{Deserialize, Serialize};

/// One segment of a route between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Distance in meters.
    pub distance: f64,
    /// Duration in seconds.
    pub duration: f64,
    #[serde(default)]
    pub summary: String,
}

/// A complete route alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
    pub distance: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    pub legs: Vec<RouteLeg>,
}

/// Routing result returned by a `DirectionsGateway`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    pub routes: Vec<RouteOption>,
}

impl RouteResponse {
    /// The first (preferred) route, if any.
    pub fn primary(&self) -> Option<&RouteOption> {
        self.routes.first()
    }

    pub fn legs(&self) -> &[RouteLeg] {
        self.primary().map(|route| route.legs.as_slice()).unwrap_or(&[])
    }
}

/// How much geometry the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    Full,
    Simplified,
    False,
}

impl Overview {
    pub fn as_str(&self) -> &'static str {
        match self {
            Overview::Full => "full",
            Overview::Simplified => "simplified",
            Overview::False => "false",
        }
    }
}

/// Encoding of the route geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    GeoJson,
    Polyline,
    Polyline6,
}

impl GeometryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryFormat::GeoJson => "geojson",
            GeometryFormat::Polyline => "polyline",
            GeometryFormat::Polyline6 => "polyline6",
        }
    }
}

/// Options of a routing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    pub overview: Overview,
    pub geometries: GeometryFormat,
    pub steps: bool,
}

impl RouteOptions {
    /// Full geometry, used for the route that gets cached on a trip.
    pub fn full() -> Self {
        Self {
            overview: Overview::Full,
            geometries: GeometryFormat::GeoJson,
            steps: false,
        }
    }

    /// Distances and durations only.
    pub fn distance_only() -> Self {
        Self {
            overview: Overview::False,
            geometries: GeometryFormat::Polyline,
            steps: false,
        }
    }
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self::full()
    }
}
