//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use hos_trip_planner::clients::{DirectionsGateway, GatewayError};
use hos_trip_planner::config::{EnvironmentConfig, HosPolicy};
use hos_trip_planner::models::{Coordinate, RouteLeg, RouteOption, RouteOptions, RouteResponse};
use hos_trip_planner::repositories::{InMemoryTripRepository, TripRepository};
use hos_trip_planner::services::{LogSheetService, TripLocks, TripService};
use hos_trip_planner::AppState;

pub const METERS_PER_MILE: f64 = 1609.34;

/// Routes at a fixed speed; each leg is 100 miles per degree of
/// `|dlat| + |dlon|`. Counts calls and can be switched to fail.
pub struct StubGateway {
    pub mph: f64,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubGateway {
    pub fn new(mph: f64) -> Arc<Self> {
        Arc::new(Self {
            mph,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn leg_miles(from: Coordinate, to: Coordinate) -> f64 {
        100.0 * ((to.latitude - from.latitude).abs() + (to.longitude - from.longitude).abs())
    }
}

#[async_trait]
impl DirectionsGateway for StubGateway {
    async fn get_route(
        &self,
        coordinates: &[Coordinate],
        _options: RouteOptions,
    ) -> Result<RouteResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Http {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        if coordinates.len() < 2 {
            return Err(GatewayError::TooFewCoordinates(coordinates.len()));
        }

        let legs: Vec<RouteLeg> = coordinates
            .windows(2)
            .map(|pair| {
                let miles = Self::leg_miles(pair[0], pair[1]);
                RouteLeg {
                    distance: miles * METERS_PER_MILE,
                    duration: miles / self.mph * 3600.0,
                    summary: "I-40".to_string(),
                }
            })
            .collect();

        Ok(RouteResponse {
            code: "Ok".to_string(),
            routes: vec![RouteOption {
                distance: legs.iter().map(|leg| leg.distance).sum(),
                duration: legs.iter().map(|leg| leg.duration).sum(),
                geometry: None,
                legs,
            }],
        })
    }
}

pub struct Harness {
    pub repository: Arc<InMemoryTripRepository>,
    pub gateway: Arc<StubGateway>,
    pub trips: TripService,
    pub log_sheets: LogSheetService,
}

pub fn harness(mph: f64) -> Harness {
    harness_with_policy(mph, HosPolicy::default())
}

pub fn harness_with_policy(mph: f64, policy: HosPolicy) -> Harness {
    let repository = Arc::new(InMemoryTripRepository::new());
    let gateway = StubGateway::new(mph);
    let locks = TripLocks::new();
    let trips = TripService::new(repository.clone(), gateway.clone(), policy, locks.clone());
    let log_sheets = LogSheetService::new(repository.clone(), locks);
    Harness {
        repository,
        gateway,
        trips,
        log_sheets,
    }
}

pub fn app_state(mph: f64) -> (AppState, Arc<StubGateway>) {
    let repository: Arc<dyn TripRepository> = Arc::new(InMemoryTripRepository::new());
    let gateway = StubGateway::new(mph);
    let state = AppState::new(
        EnvironmentConfig::default(),
        HosPolicy::default(),
        repository,
        gateway.clone(),
    );
    (state, gateway)
}

/// Origin, pickup and dropoff along a meridian.
pub fn trip_body(latitudes: [f64; 3], cycle_hours: f64) -> Value {
    json!({
        "waypoints": [
            { "latitude": latitudes[0], "longitude": -97.0, "name": "Yard" },
            { "latitude": latitudes[1], "longitude": -97.0, "role": "pickup" },
            { "latitude": latitudes[2], "longitude": -97.0, "role": "dropoff" }
        ],
        "current_cycle_hours": cycle_hours
    })
}
