//! Trip DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    LocationInput, LogSheet, Stop, StopStatus, StopType, Trip, TripAggregate, WaypointRole,
};

/// One point of a new trip, in traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointInput {
    #[serde(flatten)]
    pub location: LocationInput,
    #[serde(default)]
    pub role: Option<WaypointRole>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTripRequest {
    /// First element is the origin. The provider takes 25 coordinates and one
    /// is kept for the fuel stop.
    #[serde(alias = "locations")]
    #[validate(length(
        min = 3,
        max = 24,
        message = "origin, pickup and dropoff are required, at most 24 waypoints"
    ))]
    pub waypoints: Vec<WaypointInput>,

    #[validate(range(min = 0.0, max = 70.0))]
    pub current_cycle_hours: f64,

    /// Fuel location whose position in the route is chosen by the planner.
    #[serde(default)]
    pub fuel_stop: Option<LocationInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRouteRequest {
    #[serde(default, alias = "locations")]
    pub fuel_stop: Option<LocationInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStopStatusRequest {
    pub stop_id: Option<Uuid>,
    pub status: Option<StopStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStopRequest {
    pub location: LocationInput,
    pub stop_type: StopType,
    pub arrival_time: Option<DateTime<Utc>>,
    #[validate(range(max = 10080))]
    pub duration_minutes: Option<u32>,
    #[validate(range(min = 0.0))]
    pub cycle_hours_at_stop: Option<f64>,
    #[validate(range(min = 0.0))]
    pub distance_from_last_stop: Option<f64>,
    pub leg_summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteStopQuery {
    pub stop_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLocationRequest {
    pub location: Option<LocationInput>,
}

/// Figures derived from a trip's itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub stop_count: usize,
    pub rest_stop_count: usize,
    pub total_distance_miles: f64,
    pub final_cycle_hours: f64,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub cycle_limit_exceeded: bool,
}

impl PlanSummary {
    pub fn from_stops(trip: &Trip, stops: &[Stop], max_cycle_hours: f64) -> Self {
        let last = stops.iter().max_by_key(|stop| stop.sequence);
        let final_cycle_hours = last
            .map(|stop| {
                stop.cycle_hours_at_stop + f64::from(stop.duration_minutes) / 60.0
            })
            .unwrap_or(trip.current_cycle_hours);

        Self {
            stop_count: stops.len(),
            rest_stop_count: stops
                .iter()
                .filter(|stop| stop.stop_type == StopType::Rest)
                .count(),
            total_distance_miles: stops.iter().map(|stop| stop.distance_from_last_stop).sum(),
            final_cycle_hours,
            estimated_completion: last.map(Stop::departure_time),
            cycle_limit_exceeded: final_cycle_hours >= max_cycle_hours,
        }
    }
}

/// Result of creating or planning a trip.
#[derive(Debug, Clone, Serialize)]
pub struct TripPlanResponse {
    pub trip: Trip,
    pub route: Option<serde_json::Value>,
    pub stops: Vec<Stop>,
    pub summary: PlanSummary,
}

impl TripPlanResponse {
    pub fn new(aggregate: TripAggregate, max_cycle_hours: f64) -> Self {
        let summary = PlanSummary::from_stops(&aggregate.trip, &aggregate.stops, max_cycle_hours);
        Self {
            route: aggregate.trip.route.clone(),
            trip: aggregate.trip,
            stops: aggregate.stops,
            summary,
        }
    }
}

/// A trip with everything attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct TripStateResponse {
    pub trip: Trip,
    pub stops: Vec<Stop>,
    pub log_sheets: Vec<LogSheet>,
}

impl From<TripAggregate> for TripStateResponse {
    fn from(aggregate: TripAggregate) -> Self {
        Self {
            trip: aggregate.trip,
            stops: aggregate.stops,
            log_sheets: aggregate.log_sheets,
        }
    }
}
