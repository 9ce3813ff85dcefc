//! Trip model
//!
//! This module contains the trip, its waypoint list and the aggregate used as
//! the unit of persistence (trip + stops + log sheets).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::location::{Coordinate, Location};
use super::log_sheet::LogSheet;
use super::stop::{Stop, StopType};

/// Lifecycle state of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled trips accept no further changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planned" => Ok(TripStatus::Planned),
            "in_progress" => Ok(TripStatus::InProgress),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown trip status '{}'", other)),
        }
    }
}

/// Semantic tag of a route point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointRole {
    Current,
    Pickup,
    Dropoff,
    Fuel,
    Waypoint,
}

impl WaypointRole {
    /// Stop type emitted when the itinerary arrives at a point with this role.
    pub fn arriving_stop_type(&self) -> StopType {
        match self {
            WaypointRole::Pickup => StopType::Pickup,
            WaypointRole::Dropoff => StopType::Dropoff,
            WaypointRole::Fuel => StopType::Fuel,
            WaypointRole::Current | WaypointRole::Waypoint => StopType::Waypoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: Location,
    pub role: WaypointRole,
}

impl Waypoint {
    pub fn new(location: Location, role: WaypointRole) -> Self {
        Self { location, role }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub current_location: Location,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    /// Ordered input list; element 0 is the origin.
    pub waypoints: Vec<Waypoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_stop: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_stop_index: Option<usize>,
    pub current_cycle_hours: f64,
    pub status: TripStatus,
    /// Cached routing result. Never overwritten once set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Waypoints in routing order, with the loose fuel stop placed at its
    /// chosen index.
    pub fn route_waypoints(&self) -> Vec<Waypoint> {
        let mut waypoints = self.waypoints.clone();
        if let (Some(fuel_stop), Some(index)) = (&self.fuel_stop, self.fuel_stop_index) {
            let index = index.clamp(1, waypoints.len());
            waypoints.insert(index, Waypoint::new(fuel_stop.clone(), WaypointRole::Fuel));
        }
        waypoints
    }

    pub fn base_coordinates(&self) -> Vec<Coordinate> {
        self.waypoints
            .iter()
            .map(|waypoint| waypoint.location.coordinate())
            .collect()
    }

    pub fn has_cached_route(&self) -> bool {
        self.route.is_some()
    }
}

/// A trip together with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripAggregate {
    pub trip: Trip,
    pub stops: Vec<Stop>,
    pub log_sheets: Vec<LogSheet>,
}

impl TripAggregate {
    pub fn new(trip: Trip) -> Self {
        Self {
            trip,
            stops: Vec::new(),
            log_sheets: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.trip.id
    }

    /// Unowned trips and unscoped callers see everything.
    pub fn is_visible_to(&self, owner_id: Option<Uuid>) -> bool {
        match (owner_id, self.trip.owner_id) {
            (Some(owner), Some(trip_owner)) => owner == trip_owner,
            _ => true,
        }
    }

    /// Restore storage order: stops by sequence, sheets by start time.
    pub fn sort(&mut self) {
        self.stops.sort_by_key(|stop| stop.sequence);
        self.log_sheets.sort_by_key(|sheet| sheet.start_time);
    }

    pub fn stop(&self, stop_id: Uuid) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.id == stop_id)
    }

    pub fn stop_mut(&mut self, stop_id: Uuid) -> Option<&mut Stop> {
        self.stops.iter_mut().find(|stop| stop.id == stop_id)
    }

    pub fn stop_by_sequence(&self, sequence: u32) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.sequence == sequence)
    }

    pub fn next_sequence(&self) -> u32 {
        self.stops.iter().map(|stop| stop.sequence).max().unwrap_or(0) + 1
    }

    pub fn active_log_sheet_mut(&mut self) -> Option<&mut LogSheet> {
        self.log_sheets.iter_mut().find(|sheet| sheet.is_active())
    }

    /// Reassign sequences `1..=N` keeping relative order.
    pub fn renumber_stops(&mut self, now: DateTime<Utc>) {
        self.stops.sort_by_key(|stop| stop.sequence);
        for (index, stop) in self.stops.iter_mut().enumerate() {
            let sequence = index as u32 + 1;
            if stop.sequence != sequence {
                stop.sequence = sequence;
                stop.updated_at = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(lat: f64, lon: f64) -> Location {
        Location::new(Coordinate::new(lat, lon), None)
    }

    fn trip() -> Trip {
        let origin = location(1.0, 1.0);
        let pickup = location(2.0, 2.0);
        let dropoff = location(3.0, 3.0);
        let now = Utc::now();
        Trip {
            id: Uuid::new_v4(),
            owner_id: None,
            current_location: origin.clone(),
            pickup_location: pickup.clone(),
            dropoff_location: dropoff.clone(),
            waypoints: vec![
                Waypoint::new(origin, WaypointRole::Current),
                Waypoint::new(pickup, WaypointRole::Pickup),
                Waypoint::new(dropoff, WaypointRole::Dropoff),
            ],
            fuel_stop: None,
            fuel_stop_index: None,
            current_cycle_hours: 0.0,
            status: TripStatus::Planned,
            route: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_route_waypoints_without_fuel_stop() {
        let trip = trip();
        assert_eq!(trip.route_waypoints(), trip.waypoints);
    }

    #[test]
    fn test_route_waypoints_inserts_fuel_stop_at_index() {
        let mut trip = trip();
        trip.fuel_stop = Some(location(2.5, 2.5));
        trip.fuel_stop_index = Some(2);

        let roles: Vec<WaypointRole> = trip.route_waypoints().iter().map(|w| w.role).collect();

        assert_eq!(
            roles,
            vec![
                WaypointRole::Current,
                WaypointRole::Pickup,
                WaypointRole::Fuel,
                WaypointRole::Dropoff
            ]
        );
    }

    #[test]
    fn test_arriving_stop_types() {
        assert_eq!(WaypointRole::Pickup.arriving_stop_type(), StopType::Pickup);
        assert_eq!(WaypointRole::Fuel.arriving_stop_type(), StopType::Fuel);
        assert_eq!(WaypointRole::Waypoint.arriving_stop_type(), StopType::Waypoint);
    }

    #[test]
    fn test_next_sequence_defaults_to_one() {
        let aggregate = TripAggregate::new(trip());
        assert_eq!(aggregate.next_sequence(), 1);
    }

    #[test]
    fn test_visibility_by_owner() {
        let owner = Uuid::new_v4();
        let mut owned = trip();
        owned.owner_id = Some(owner);
        let owned = TripAggregate::new(owned);

        assert!(owned.is_visible_to(None));
        assert!(owned.is_visible_to(Some(owner)));
        assert!(!owned.is_visible_to(Some(Uuid::new_v4())));
        assert!(TripAggregate::new(trip()).is_visible_to(Some(owner)));
    }
}
