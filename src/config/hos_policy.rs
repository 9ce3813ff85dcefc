//! Hours-of-Service policy
//!
//! Regulatory limits and planning constants used by the itinerary planner and
//! the fuel-position optimizer. Every value can be overridden through `HOS_*`
//! and `FUEL_*` environment variables.

use std::fmt;
use std::str::FromStr;

use super::environment::{env_parse, env_string, ConfigError};
use crate::models::StopType;

/// When the planner checks whether a rest break is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestCheckMode {
    /// One check after the last leg, against accumulated cycle hours.
    #[default]
    EndOfItinerary,
    /// A check after every stop, against driving hours since the last rest.
    PerLeg,
}

impl RestCheckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestCheckMode::EndOfItinerary => "end_of_itinerary",
            RestCheckMode::PerLeg => "per_leg",
        }
    }
}

impl fmt::Display for RestCheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestCheckMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "end_of_itinerary" => Ok(RestCheckMode::EndOfItinerary),
            "per_leg" => Ok(RestCheckMode::PerLeg),
            other => Err(format!(
                "expected 'end_of_itinerary' or 'per_leg', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HosPolicy {
    pub max_driving_hours: f64,
    pub required_rest_hours: f64,
    pub max_cycle_hours: f64,
    pub pickup_duration_minutes: u32,
    pub dropoff_duration_minutes: u32,
    pub fuel_duration_minutes: u32,
    pub meters_per_mile: f64,
    pub fuel_tank_gallons: f64,
    pub miles_per_gallon: f64,
    /// Fraction of the tank kept in reserve.
    pub fuel_safety_margin: f64,
    pub rest_check: RestCheckMode,
}

impl Default for HosPolicy {
    fn default() -> Self {
        Self {
            max_driving_hours: 11.0,
            required_rest_hours: 10.0,
            max_cycle_hours: 70.0,
            pickup_duration_minutes: 60,
            dropoff_duration_minutes: 60,
            fuel_duration_minutes: 30,
            meters_per_mile: 1609.34,
            fuel_tank_gallons: 100.0,
            miles_per_gallon: 6.0,
            fuel_safety_margin: 0.2,
            rest_check: RestCheckMode::EndOfItinerary,
        }
    }
}

impl HosPolicy {
    /// Defaults overridden by any `HOS_*` / `FUEL_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let policy = Self {
            max_driving_hours: env_parse("HOS_MAX_DRIVING_HOURS")?
                .unwrap_or(defaults.max_driving_hours),
            required_rest_hours: env_parse("HOS_REQUIRED_REST_HOURS")?
                .unwrap_or(defaults.required_rest_hours),
            max_cycle_hours: env_parse("HOS_MAX_CYCLE_HOURS")?.unwrap_or(defaults.max_cycle_hours),
            pickup_duration_minutes: env_parse("HOS_PICKUP_MINUTES")?
                .unwrap_or(defaults.pickup_duration_minutes),
            dropoff_duration_minutes: env_parse("HOS_DROPOFF_MINUTES")?
                .unwrap_or(defaults.dropoff_duration_minutes),
            fuel_duration_minutes: env_parse("HOS_FUEL_MINUTES")?
                .unwrap_or(defaults.fuel_duration_minutes),
            meters_per_mile: defaults.meters_per_mile,
            fuel_tank_gallons: env_parse("FUEL_TANK_GALLONS")?
                .unwrap_or(defaults.fuel_tank_gallons),
            miles_per_gallon: env_parse("FUEL_MILES_PER_GALLON")?
                .unwrap_or(defaults.miles_per_gallon),
            fuel_safety_margin: env_parse("FUEL_SAFETY_MARGIN")?
                .unwrap_or(defaults.fuel_safety_margin),
            rest_check: match env_string("HOS_REST_CHECK") {
                Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                    name: "HOS_REST_CHECK",
                    value,
                    reason,
                })?,
                None => defaults.rest_check,
            },
        };

        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("HOS_MAX_DRIVING_HOURS", self.max_driving_hours),
            ("HOS_REQUIRED_REST_HOURS", self.required_rest_hours),
            ("HOS_MAX_CYCLE_HOURS", self.max_cycle_hours),
            ("FUEL_TANK_GALLONS", self.fuel_tank_gallons),
            ("FUEL_MILES_PER_GALLON", self.miles_per_gallon),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    name,
                    value: value.to_string(),
                    reason: "must be a positive number".to_string(),
                });
            }
        }

        if !(0.0..1.0).contains(&self.fuel_safety_margin) {
            return Err(ConfigError::InvalidValue {
                name: "FUEL_SAFETY_MARGIN",
                value: self.fuel_safety_margin.to_string(),
                reason: "must be in [0, 1)".to_string(),
            });
        }

        Ok(())
    }

    /// Dwell time at a stop of the given type.
    pub fn stop_duration_minutes(&self, stop_type: StopType) -> u32 {
        match stop_type {
            StopType::Pickup => self.pickup_duration_minutes,
            StopType::Dropoff => self.dropoff_duration_minutes,
            StopType::Fuel => self.fuel_duration_minutes,
            StopType::Rest => self.rest_duration_minutes(),
            StopType::Waypoint => 0,
        }
    }

    pub fn rest_duration_minutes(&self) -> u32 {
        (self.required_rest_hours * 60.0).round() as u32
    }

    /// Ideal distance between refuelling points: half the usable range.
    pub fn optimal_fuel_distance_miles(&self) -> f64 {
        self.fuel_tank_gallons * self.miles_per_gallon * (1.0 - self.fuel_safety_margin) / 2.0
    }

    pub fn meters_to_miles(&self, meters: f64) -> f64 {
        meters / self.meters_per_mile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regulatory_defaults() {
        let policy = HosPolicy::default();
        assert_eq!(policy.max_driving_hours, 11.0);
        assert_eq!(policy.rest_duration_minutes(), 600);
        assert_eq!(policy.max_cycle_hours, 70.0);
        assert_eq!(policy.rest_check, RestCheckMode::EndOfItinerary);
    }

    #[test]
    fn test_optimal_fuel_distance_is_240_miles() {
        let policy = HosPolicy::default();
        assert!((policy.optimal_fuel_distance_miles() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_durations() {
        let policy = HosPolicy::default();
        assert_eq!(policy.stop_duration_minutes(StopType::Pickup), 60);
        assert_eq!(policy.stop_duration_minutes(StopType::Dropoff), 60);
        assert_eq!(policy.stop_duration_minutes(StopType::Fuel), 30);
        assert_eq!(policy.stop_duration_minutes(StopType::Waypoint), 0);
        assert_eq!(policy.stop_duration_minutes(StopType::Rest), 600);
    }

    #[test]
    fn test_meters_to_miles() {
        let policy = HosPolicy::default();
        assert!((policy.meters_to_miles(1609.34) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rest_check_mode_parsing() {
        assert_eq!("per_leg".parse::<RestCheckMode>(), Ok(RestCheckMode::PerLeg));
        assert_eq!(
            "END_OF_ITINERARY".parse::<RestCheckMode>(),
            Ok(RestCheckMode::EndOfItinerary)
        );
        assert!("sometimes".parse::<RestCheckMode>().is_err());
    }

    #[test]
    fn test_validate_rejects_full_safety_margin() {
        let policy = HosPolicy {
            fuel_safety_margin: 1.0,
            ..HosPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
