//! Stop model
//!
//! A stop is one entry of a trip itinerary. Its `sequence` defines itinerary
//! order and always forms the run `1..=N` within a trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::location::Location;

/// Kind of stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    Pickup,
    Dropoff,
    Fuel,
    Rest,
    Waypoint,
}

impl StopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopType::Pickup => "pickup",
            StopType::Dropoff => "dropoff",
            StopType::Fuel => "fuel",
            StopType::Rest => "rest",
            StopType::Waypoint => "waypoint",
        }
    }

    /// Only rest stops can be removed from an itinerary.
    pub fn is_deletable(&self) -> bool {
        matches!(self, StopType::Rest)
    }
}

impl fmt::Display for StopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pickup" => Ok(StopType::Pickup),
            "dropoff" => Ok(StopType::Dropoff),
            "fuel" => Ok(StopType::Fuel),
            "rest" => Ok(StopType::Rest),
            "waypoint" => Ok(StopType::Waypoint),
            other => Err(format!("unknown stop type '{}'", other)),
        }
    }
}

/// Progress of a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl StopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopStatus::Pending => "pending",
            StopStatus::InProgress => "in_progress",
            StopStatus::Completed => "completed",
            StopStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(StopStatus::Pending),
            "in_progress" => Ok(StopStatus::InProgress),
            "completed" => Ok(StopStatus::Completed),
            "skipped" => Ok(StopStatus::Skipped),
            other => Err(format!("unknown stop status '{}'", other)),
        }
    }
}

/// Stop of a trip itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub location: Location,
    pub sequence: u32,
    pub stop_type: StopType,
    pub status: StopStatus,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub cycle_hours_at_stop: f64,
    /// Miles driven since the previous stop.
    pub distance_from_last_stop: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stop {
    pub fn departure_time(&self) -> DateTime<Utc> {
        self.arrival_time + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_type_round_trips_through_str() {
        for stop_type in [
            StopType::Pickup,
            StopType::Dropoff,
            StopType::Fuel,
            StopType::Rest,
            StopType::Waypoint,
        ] {
            assert_eq!(stop_type.as_str().parse::<StopType>(), Ok(stop_type));
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("done".parse::<StopStatus>().is_err());
        assert_eq!("in_progress".parse::<StopStatus>(), Ok(StopStatus::InProgress));
    }

    #[test]
    fn test_only_rest_is_deletable() {
        assert!(StopType::Rest.is_deletable());
        assert!(!StopType::Pickup.is_deletable());
        assert!(!StopType::Dropoff.is_deletable());
        assert!(!StopType::Fuel.is_deletable());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&StopStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
