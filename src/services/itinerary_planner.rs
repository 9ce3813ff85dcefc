//! Itinerary planner
//!
//! Walks the legs of a route together with the roles of the waypoints they
//! connect, advancing a [`DutyClock`] and emitting one stop per arrival plus
//! the rest breaks the Hours-of-Service policy requires.
//!
//! The planner is pure: it never talks to the routing provider or to storage.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{HosPolicy, RestCheckMode};
use crate::models::{Location, RouteLeg, Stop, StopStatus, StopType, Waypoint};
use crate::services::duty_clock::{ClockOverflow, DutyClock};

/// Inconsistent planning input, usually a route that does not match its
/// waypoints.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("route has {legs} legs for {waypoints} waypoints")]
    LegCountMismatch { waypoints: usize, legs: usize },

    #[error(transparent)]
    ClockOverflow(#[from] ClockOverflow),
}

/// A stop as laid out by the planner, before it belongs to a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    pub location: Location,
    pub sequence: u32,
    pub stop_type: StopType,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub cycle_hours_at_stop: f64,
    pub distance_from_last_stop: f64,
    pub leg_summary: Option<String>,
}

impl PlannedStop {
    pub fn into_stop(self, trip_id: Uuid, now: DateTime<Utc>) -> Stop {
        Stop {
            id: Uuid::new_v4(),
            trip_id,
            location: self.location,
            sequence: self.sequence,
            stop_type: self.stop_type,
            status: StopStatus::Pending,
            arrival_time: self.arrival_time,
            duration_minutes: self.duration_minutes,
            cycle_hours_at_stop: self.cycle_hours_at_stop,
            distance_from_last_stop: self.distance_from_last_stop,
            leg_summary: self.leg_summary,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub stops: Vec<PlannedStop>,
    pub total_distance_miles: f64,
    pub total_driving_hours: f64,
    pub final_cycle_hours: f64,
    /// Clock once the last stop (or rest) is over.
    pub completed_at: DateTime<Utc>,
    /// Final cycle hours reached the cycle limit. Reported, never enforced.
    pub cycle_limit_exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct ItineraryPlanner {
    policy: HosPolicy,
}

impl ItineraryPlanner {
    pub fn new(policy: HosPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &HosPolicy {
        &self.policy
    }

    /// Lay out the stops for `legs`, where leg `i` runs from `waypoints[i]` to
    /// `waypoints[i + 1]`.
    pub fn plan(
        &self,
        waypoints: &[Waypoint],
        legs: &[RouteLeg],
        starting_cycle_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<Itinerary, PlanningError> {
        if waypoints.len() < 2 {
            return Err(PlanningError::TooFewWaypoints(waypoints.len()));
        }
        if legs.len() != waypoints.len() - 1 {
            return Err(PlanningError::LegCountMismatch {
                waypoints: waypoints.len(),
                legs: legs.len(),
            });
        }

        let mut clock = DutyClock::new(starting_cycle_hours, now);
        let mut stops: Vec<PlannedStop> = Vec::with_capacity(legs.len() + 1);
        let mut total_distance_miles = 0.0;
        let mut total_driving_hours = 0.0;

        for (leg, arriving) in legs.iter().zip(&waypoints[1..]) {
            let stop_type = arriving.role.arriving_stop_type();
            let duration_minutes = self.policy.stop_duration_minutes(stop_type);
            let distance_miles = self.policy.meters_to_miles(leg.distance.max(0.0));

            clock.advance_driving(leg.duration)?;
            total_distance_miles += distance_miles;
            total_driving_hours += leg.duration.max(0.0) / 3600.0;

            stops.push(PlannedStop {
                location: arriving.location.clone(),
                sequence: stops.len() as u32 + 1,
                stop_type,
                arrival_time: clock.clock(),
                duration_minutes,
                cycle_hours_at_stop: clock.cycle_hours(),
                distance_from_last_stop: distance_miles,
                leg_summary: Some(leg.summary.trim().to_string()).filter(|s| !s.is_empty()),
            });

            clock.advance_stationary(duration_minutes)?;

            if self.policy.rest_check == RestCheckMode::PerLeg
                && clock.driving_hours_since_rest() >= self.policy.max_driving_hours
            {
                self.insert_rest(&mut stops, &mut clock, &arriving.location)?;
            }
        }

        if self.policy.rest_check == RestCheckMode::EndOfItinerary
            && clock.exceeds(self.policy.max_driving_hours)
        {
            let last_location = waypoints[waypoints.len() - 1].location.clone();
            self.insert_rest(&mut stops, &mut clock, &last_location)?;
        }

        let final_cycle_hours = clock.cycle_hours();
        let cycle_limit_exceeded = final_cycle_hours >= self.policy.max_cycle_hours;
        if cycle_limit_exceeded {
            log::warn!(
                "⚠️ Itinerary reaches {:.2} cycle hours (limit {:.0})",
                final_cycle_hours,
                self.policy.max_cycle_hours
            );
        }

        Ok(Itinerary {
            stops,
            total_distance_miles,
            total_driving_hours,
            final_cycle_hours,
            completed_at: clock.clock(),
            cycle_limit_exceeded,
        })
    }

    fn insert_rest(
        &self,
        stops: &mut Vec<PlannedStop>,
        clock: &mut DutyClock,
        at: &Location,
    ) -> Result<(), ClockOverflow> {
        stops.push(PlannedStop {
            location: at.clone(),
            sequence: stops.len() as u32 + 1,
            stop_type: StopType::Rest,
            arrival_time: clock.clock(),
            duration_minutes: self.policy.rest_duration_minutes(),
            cycle_hours_at_stop: clock.cycle_hours(),
            distance_from_last_stop: 0.0,
            leg_summary: None,
        });
        clock.take_rest(self.policy.required_rest_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, WaypointRole};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap()
    }

    fn waypoint(lat: f64, role: WaypointRole) -> Waypoint {
        Waypoint::new(Location::new(Coordinate::new(lat, -100.0), None), role)
    }

    fn basic_waypoints() -> Vec<Waypoint> {
        vec![
            waypoint(30.0, WaypointRole::Current),
            waypoint(31.0, WaypointRole::Pickup),
            waypoint(32.0, WaypointRole::Dropoff),
        ]
    }

    fn leg(hours: f64, miles: f64) -> RouteLeg {
        RouteLeg {
            distance: miles * 1609.34,
            duration: hours * 3600.0,
            summary: "I-10".to_string(),
        }
    }

    fn planner() -> ItineraryPlanner {
        ItineraryPlanner::new(HosPolicy::default())
    }

    #[test]
    fn test_short_trip_has_pickup_and_dropoff() {
        let itinerary = planner()
            .plan(&basic_waypoints(), &[leg(2.0, 120.0), leg(3.0, 180.0)], 0.0, now())
            .unwrap();

        let types: Vec<StopType> = itinerary.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(types, vec![StopType::Pickup, StopType::Dropoff]);

        let pickup = &itinerary.stops[0];
        assert_eq!(pickup.arrival_time, now() + Duration::hours(2));
        assert_eq!(pickup.duration_minutes, 60);
        assert!((pickup.cycle_hours_at_stop - 2.0).abs() < 1e-9);
        assert!((pickup.distance_from_last_stop - 120.0).abs() < 1e-9);

        let dropoff = &itinerary.stops[1];
        assert_eq!(dropoff.arrival_time, now() + Duration::hours(6));
        assert!((dropoff.cycle_hours_at_stop - 6.0).abs() < 1e-9);
        assert!((itinerary.final_cycle_hours - 7.0).abs() < 1e-9);
        assert!(!itinerary.cycle_limit_exceeded);
    }

    #[test]
    fn test_sequences_are_contiguous() {
        let waypoints = vec![
            waypoint(30.0, WaypointRole::Current),
            waypoint(30.5, WaypointRole::Waypoint),
            waypoint(31.0, WaypointRole::Pickup),
            waypoint(31.5, WaypointRole::Fuel),
            waypoint(32.0, WaypointRole::Dropoff),
        ];
        let legs = vec![leg(4.0, 1.0), leg(4.0, 1.0), leg(4.0, 1.0), leg(4.0, 1.0)];

        let itinerary = planner().plan(&waypoints, &legs, 0.0, now()).unwrap();

        let sequences: Vec<u32> = itinerary.stops.iter().map(|s| s.sequence).collect();
        let expected: Vec<u32> = (1..=itinerary.stops.len() as u32).collect();
        assert_eq!(sequences, expected);
    }

    #[test]
    fn test_cycle_hours_never_decrease() {
        let legs = vec![leg(6.0, 360.0), leg(7.0, 420.0)];
        let itinerary = planner().plan(&basic_waypoints(), &legs, 20.0, now()).unwrap();

        let hours: Vec<f64> = itinerary.stops.iter().map(|s| s.cycle_hours_at_stop).collect();
        assert!(hours.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(hours[0] >= 20.0);
    }

    #[test]
    fn test_rest_appended_once_past_driving_limit() {
        let legs = vec![leg(6.0, 360.0), leg(6.0, 360.0)];
        let itinerary = planner().plan(&basic_waypoints(), &legs, 0.0, now()).unwrap();

        let rests: Vec<&PlannedStop> = itinerary
            .stops
            .iter()
            .filter(|s| s.stop_type == StopType::Rest)
            .collect();
        assert_eq!(rests.len(), 1);

        let rest = rests[0];
        assert_eq!(rest.sequence, 3);
        assert_eq!(rest.duration_minutes, 600);
        assert_eq!(rest.location, basic_waypoints()[2].location);
        assert!((rest.cycle_hours_at_stop - 14.0).abs() < 1e-9);
        assert!((itinerary.final_cycle_hours - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_rest_below_driving_limit() {
        let itinerary = planner()
            .plan(&basic_waypoints(), &[leg(3.0, 1.0), leg(3.0, 1.0)], 0.0, now())
            .unwrap();
        assert!(itinerary.stops.iter().all(|s| s.stop_type != StopType::Rest));
    }

    #[test]
    fn test_starting_cycle_hours_count_toward_rest() {
        let itinerary = planner()
            .plan(&basic_waypoints(), &[leg(1.0, 1.0), leg(1.0, 1.0)], 9.5, now())
            .unwrap();
        assert_eq!(itinerary.stops.last().map(|s| s.stop_type), Some(StopType::Rest));
    }

    #[test]
    fn test_per_leg_rest_inserted_where_limit_is_reached() {
        let policy = HosPolicy {
            rest_check: RestCheckMode::PerLeg,
            ..HosPolicy::default()
        };
        let waypoints = vec![
            waypoint(30.0, WaypointRole::Current),
            waypoint(31.0, WaypointRole::Pickup),
            waypoint(32.0, WaypointRole::Waypoint),
            waypoint(33.0, WaypointRole::Dropoff),
        ];
        let legs = vec![leg(5.0, 1.0), leg(6.0, 1.0), leg(2.0, 1.0)];

        let itinerary = ItineraryPlanner::new(policy).plan(&waypoints, &legs, 0.0, now()).unwrap();

        let types: Vec<StopType> = itinerary.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(
            types,
            vec![
                StopType::Pickup,
                StopType::Waypoint,
                StopType::Rest,
                StopType::Dropoff
            ]
        );
        assert_eq!(itinerary.stops[2].location, waypoints[2].location);
        assert_eq!(itinerary.stops[3].sequence, 4);
    }

    #[test]
    fn test_cycle_limit_is_reported_not_enforced() {
        let itinerary = planner()
            .plan(&basic_waypoints(), &[leg(2.0, 1.0), leg(2.0, 1.0)], 68.0, now())
            .unwrap();
        assert!(itinerary.cycle_limit_exceeded);
        assert!(!itinerary.stops.is_empty());
    }

    #[test]
    fn test_leg_count_mismatch() {
        let err = planner()
            .plan(&basic_waypoints(), &[leg(1.0, 1.0)], 0.0, now())
            .unwrap_err();
        assert_eq!(err, PlanningError::LegCountMismatch { waypoints: 3, legs: 1 });
    }

    #[test]
    fn test_absurd_leg_duration_is_a_planning_error() {
        let mut legs = vec![leg(2.0, 1.0), leg(2.0, 1.0)];
        legs[1].duration = 1e18;

        let err = planner()
            .plan(&basic_waypoints(), &legs, 0.0, now())
            .unwrap_err();
        assert!(matches!(err, PlanningError::ClockOverflow(_)));
    }

    #[test]
    fn test_too_few_waypoints() {
        let err = planner()
            .plan(&basic_waypoints()[..1], &[], 0.0, now())
            .unwrap_err();
        assert_eq!(err, PlanningError::TooFewWaypoints(1));
    }
}
