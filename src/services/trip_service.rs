//! Trip service
//!
//! Entry point for every trip operation. Each mutation takes the trip's lock,
//! loads the aggregate, applies the change in memory and saves the result in
//! one write. Nothing is persisted when any step fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::clients::DirectionsGateway;
use crate::config::HosPolicy;
use crate::dto::trip_dto::{
    CreateStopRequest, CreateTripRequest, PlanRouteRequest, TripPlanResponse, TripStateResponse,
    UpdateLocationRequest, UpdateStopStatusRequest,
};
use crate::models::{
    Coordinate, Location, LocationInput, RouteOptions, Trip, TripAggregate, TripStatus, Waypoint,
    WaypointRole,
};
use crate::repositories::TripRepository;
use crate::services::fuel_optimizer::FuelPositionOptimizer;
use crate::services::itinerary_planner::ItineraryPlanner;
use crate::services::trip_lifecycle::{self, NewStop};
use crate::services::trip_locks::TripLocks;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{field_error, resolve_waypoint_roles, validate_location};

pub struct TripService {
    repository: Arc<dyn TripRepository>,
    gateway: Arc<dyn DirectionsGateway>,
    planner: ItineraryPlanner,
    fuel_optimizer: FuelPositionOptimizer,
    locks: TripLocks,
}

impl TripService {
    pub fn new(
        repository: Arc<dyn TripRepository>,
        gateway: Arc<dyn DirectionsGateway>,
        policy: HosPolicy,
        locks: TripLocks,
    ) -> Self {
        Self {
            fuel_optimizer: FuelPositionOptimizer::new(gateway.clone(), policy.clone()),
            planner: ItineraryPlanner::new(policy),
            repository,
            gateway,
            locks,
        }
    }

    pub fn policy(&self) -> &HosPolicy {
        self.planner.policy()
    }

    /// Trips of another owner are reported as missing.
    async fn load(&self, trip_id: Uuid, owner_id: Option<Uuid>) -> AppResult<TripAggregate> {
        self.repository
            .find_trip(trip_id)
            .await?
            .filter(|aggregate| aggregate.is_visible_to(owner_id))
            .ok_or_else(|| not_found_error("Trip", trip_id))
    }

    async fn resolve_location(&self, input: &LocationInput) -> AppResult<Location> {
        input.validate()?;
        self.repository
            .get_or_create_location(input.coordinate(), input.street_name.clone())
            .await
    }

    /// Load, apply `change`, save. The trip stays locked throughout.
    async fn mutate<F>(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        change: F,
    ) -> AppResult<TripAggregate>
    where
        F: FnOnce(&mut TripAggregate, DateTime<Utc>) -> AppResult<()>,
    {
        let _guard = self.locks.acquire(trip_id).await;
        let mut aggregate = self.load(trip_id, owner_id).await?;
        change(&mut aggregate, Utc::now())?;
        self.repository.save(&aggregate).await?;
        Ok(aggregate)
    }

    /// Route the trip and replace its stops with a fresh itinerary.
    async fn plan(&self, aggregate: &mut TripAggregate, now: DateTime<Utc>) -> AppResult<()> {
        let trip_id = aggregate.id();
        let trip = &mut aggregate.trip;

        trip.fuel_stop_index = None;
        if let Some(fuel_stop) = &trip.fuel_stop {
            let placement = self
                .fuel_optimizer
                .choose_position(&trip.base_coordinates(), fuel_stop.coordinate())
                .await;
            trip.fuel_stop_index = placement.map(|p| p.index);
        }

        let waypoints = trip.route_waypoints();
        let coordinates: Vec<Coordinate> = waypoints
            .iter()
            .map(|waypoint| waypoint.location.coordinate())
            .collect();

        let route = self
            .gateway
            .get_route(&coordinates, RouteOptions::full())
            .await?;
        let itinerary =
            self.planner
                .plan(&waypoints, route.legs(), trip.current_cycle_hours, now)?;
        let payload = serde_json::to_value(&route)
            .map_err(|e| AppError::Internal(format!("could not encode route: {}", e)))?;

        trip.route = Some(payload);
        trip.status = TripStatus::Planned;
        trip.updated_at = now;

        log::info!(
            "🚚 Trip {} planned: {} stops, {:.1} mi, {:.2} cycle hours at completion",
            trip_id,
            itinerary.stops.len(),
            itinerary.total_distance_miles,
            itinerary.final_cycle_hours
        );

        aggregate.stops = itinerary
            .stops
            .into_iter()
            .map(|stop| stop.into_stop(trip_id, now))
            .collect();
        Ok(())
    }

    fn plan_response(&self, aggregate: TripAggregate) -> TripPlanResponse {
        TripPlanResponse::new(aggregate, self.policy().max_cycle_hours)
    }

    pub async fn create_trip(
        &self,
        owner_id: Option<Uuid>,
        request: CreateTripRequest,
    ) -> AppResult<TripPlanResponse> {
        request.validate()?;
        let roles = resolve_waypoint_roles(&request.waypoints)
            .map_err(|e| field_error("waypoints", e))?;
        validate_location(request.fuel_stop.as_ref())?;

        let mut waypoints = Vec::with_capacity(request.waypoints.len());
        for (input, role) in request.waypoints.iter().zip(roles) {
            let location = self.resolve_location(&input.location).await?;
            waypoints.push(Waypoint::new(location, role));
        }
        let fuel_stop = match &request.fuel_stop {
            Some(input) => Some(self.resolve_location(input).await?),
            None => None,
        };

        let location_with = |role: WaypointRole| {
            waypoints
                .iter()
                .find(|waypoint| waypoint.role == role)
                .map(|waypoint| waypoint.location.clone())
                .ok_or_else(|| validation_error(format!("a {:?} waypoint is required", role)))
        };
        let current_location = waypoints[0].location.clone();
        let pickup_location = location_with(WaypointRole::Pickup)?;
        let dropoff_location = location_with(WaypointRole::Dropoff)?;

        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4(),
            owner_id,
            current_location,
            pickup_location,
            dropoff_location,
            waypoints,
            fuel_stop,
            fuel_stop_index: None,
            current_cycle_hours: request.current_cycle_hours,
            status: TripStatus::Planned,
            route: None,
            created_at: now,
            updated_at: now,
        };

        let mut aggregate = TripAggregate::new(trip);
        let _guard = self.locks.acquire(aggregate.id()).await;
        self.plan(&mut aggregate, now).await?;
        self.repository.save(&aggregate).await?;

        log::info!("✅ Trip {} created", aggregate.id());
        Ok(self.plan_response(aggregate))
    }

    /// Plan a trip. A trip that already has a route is returned as is.
    pub async fn plan_route(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        request: PlanRouteRequest,
    ) -> AppResult<TripPlanResponse> {
        let _guard = self.locks.acquire(trip_id).await;
        let mut aggregate = self.load(trip_id, owner_id).await?;

        if aggregate.trip.has_cached_route() {
            log::info!("📦 Trip {} already routed, returning cached plan", trip_id);
            return Ok(self.plan_response(aggregate));
        }

        if aggregate.trip.status != TripStatus::Planned {
            return Err(AppError::InvalidTransition(format!(
                "only planned trips can be routed, trip is {}",
                aggregate.trip.status
            )));
        }

        if let Some(input) = &request.fuel_stop {
            aggregate.trip.fuel_stop = Some(self.resolve_location(input).await?);
        }

        self.plan(&mut aggregate, Utc::now()).await?;
        self.repository.save(&aggregate).await?;
        Ok(self.plan_response(aggregate))
    }

    /// Drop the cached route and its stops so the trip can be planned again.
    pub async fn clear_route(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        let aggregate = self
            .mutate(trip_id, owner_id, |aggregate, now| {
                if aggregate.trip.status != TripStatus::Planned {
                    return Err(AppError::InvalidTransition(format!(
                        "only planned trips can be re-routed, trip is {}",
                        aggregate.trip.status
                    )));
                }
                aggregate.trip.route = None;
                aggregate.trip.fuel_stop_index = None;
                aggregate.trip.updated_at = now;
                aggregate.stops.clear();
                Ok(())
            })
            .await?;

        log::info!("🧹 Route of trip {} cleared", trip_id);
        Ok(aggregate.into())
    }

    pub async fn start_trip(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        let aggregate = self
            .mutate(trip_id, owner_id, trip_lifecycle::start)
            .await?;
        log::info!("🚚 Trip {} started", trip_id);
        Ok(aggregate.into())
    }

    pub async fn complete_trip(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        let aggregate = self
            .mutate(trip_id, owner_id, trip_lifecycle::complete)
            .await?;
        log::info!("🏁 Trip {} completed", trip_id);
        Ok(aggregate.into())
    }

    pub async fn cancel_trip(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        let aggregate = self
            .mutate(trip_id, owner_id, trip_lifecycle::cancel)
            .await?;
        log::info!("🛑 Trip {} cancelled", trip_id);
        Ok(aggregate.into())
    }

    pub async fn update_stop_status(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        request: UpdateStopStatusRequest,
    ) -> AppResult<TripStateResponse> {
        let stop_id = request
            .stop_id
            .ok_or_else(|| validation_error("stop_id is required"))?;
        let status = request
            .status
            .ok_or_else(|| validation_error("status is required"))?;

        let aggregate = self
            .mutate(trip_id, owner_id, |aggregate, now| {
                trip_lifecycle::update_stop_status(aggregate, stop_id, status, now)
            })
            .await?;

        log::info!("📍 Stop {} of trip {} is now {}", stop_id, trip_id, status);
        Ok(aggregate.into())
    }

    pub async fn create_stop(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        request: CreateStopRequest,
    ) -> AppResult<TripStateResponse> {
        request.validate()?;
        let location = self.resolve_location(&request.location).await?;
        let default_duration = self.policy().stop_duration_minutes(request.stop_type);

        let aggregate = self
            .mutate(trip_id, owner_id, |aggregate, now| {
                let last = aggregate.stops.iter().max_by_key(|stop| stop.sequence);
                let new_stop = NewStop {
                    location,
                    stop_type: request.stop_type,
                    arrival_time: request
                        .arrival_time
                        .or_else(|| last.map(|stop| stop.departure_time()))
                        .unwrap_or(now),
                    duration_minutes: request.duration_minutes.unwrap_or(default_duration),
                    cycle_hours_at_stop: request
                        .cycle_hours_at_stop
                        .or_else(|| last.map(|stop| stop.cycle_hours_at_stop))
                        .unwrap_or(aggregate.trip.current_cycle_hours),
                    distance_from_last_stop: request.distance_from_last_stop.unwrap_or(0.0),
                    leg_summary: request.leg_summary,
                };
                trip_lifecycle::create_stop(aggregate, new_stop, now).map(|_| ())
            })
            .await?;

        log::info!("➕ Stop added to trip {}", trip_id);
        Ok(aggregate.into())
    }

    pub async fn delete_stop(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        stop_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        let stop_id = stop_id.ok_or_else(|| validation_error("stop_id is required"))?;

        let aggregate = self
            .mutate(trip_id, owner_id, |aggregate, now| {
                trip_lifecycle::delete_stop(aggregate, stop_id, now).map(|_| ())
            })
            .await?;

        log::info!("🗑️ Rest stop {} removed from trip {}", stop_id, trip_id);
        Ok(aggregate.into())
    }

    pub async fn update_current_location(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        request: UpdateLocationRequest,
    ) -> AppResult<TripStateResponse> {
        let input = request
            .location
            .ok_or_else(|| validation_error("location is required"))?;
        let location = self.resolve_location(&input).await?;

        let aggregate = self
            .mutate(trip_id, owner_id, |aggregate, now| {
                trip_lifecycle::update_current_location(aggregate, location, now)
            })
            .await?;
        Ok(aggregate.into())
    }

    pub async fn get_trip(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<TripStateResponse> {
        Ok(self.load(trip_id, owner_id).await?.into())
    }

    pub async fn list_trips(&self, owner_id: Option<Uuid>) -> AppResult<Vec<TripStateResponse>> {
        let trips = self.repository.list_trips(owner_id).await?;
        Ok(trips.into_iter().map(TripStateResponse::from).collect())
    }

    pub async fn delete_trip(&self, trip_id: Uuid, owner_id: Option<Uuid>) -> AppResult<()> {
        let _guard = self.locks.acquire(trip_id).await;
        self.load(trip_id, owner_id).await?;
        if !self.repository.delete_trip(trip_id).await? {
            return Err(not_found_error("Trip", trip_id));
        }
        log::info!("🗑️ Trip {} deleted", trip_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::GatewayError;
    use crate::dto::trip_dto::WaypointInput;
    use crate::models::{RouteLeg, RouteOption, RouteResponse, StopType};
    use crate::repositories::InMemoryTripRepository;
    use async_trait::async_trait;

    /// Every leg is 120 miles, two hours unless told otherwise.
    struct FixedLegGateway {
        leg_seconds: f64,
    }

    #[async_trait]
    impl DirectionsGateway for FixedLegGateway {
        async fn get_route(
            &self,
            coordinates: &[Coordinate],
            _options: RouteOptions,
        ) -> Result<RouteResponse, GatewayError> {
            let legs: Vec<RouteLeg> = (1..coordinates.len())
                .map(|_| RouteLeg {
                    distance: 120.0 * 1609.34,
                    duration: self.leg_seconds,
                    summary: "US-287".to_string(),
                })
                .collect();
            Ok(RouteResponse {
                code: "Ok".to_string(),
                routes: vec![RouteOption {
                    distance: legs.iter().map(|l| l.distance).sum(),
                    duration: legs.iter().map(|l| l.duration).sum(),
                    geometry: None,
                    legs,
                }],
            })
        }
    }

    fn service_with(leg_seconds: f64, repository: Arc<InMemoryTripRepository>) -> TripService {
        TripService::new(
            repository,
            Arc::new(FixedLegGateway { leg_seconds }),
            HosPolicy::default(),
            TripLocks::new(),
        )
    }

    fn service() -> TripService {
        service_with(7200.0, Arc::new(InMemoryTripRepository::new()))
    }

    fn point(lat: f64, role: Option<WaypointRole>) -> WaypointInput {
        WaypointInput {
            location: LocationInput {
                latitude: lat,
                longitude: -100.0,
                street_name: None,
            },
            role,
        }
    }

    fn request() -> CreateTripRequest {
        CreateTripRequest {
            waypoints: vec![
                point(30.0, None),
                point(31.0, Some(WaypointRole::Pickup)),
                point(32.0, Some(WaypointRole::Dropoff)),
            ],
            current_cycle_hours: 0.0,
            fuel_stop: None,
        }
    }

    #[tokio::test]
    async fn test_create_trip_plans_immediately() {
        let response = service().create_trip(None, request()).await.unwrap();

        assert_eq!(response.trip.status, TripStatus::Planned);
        assert!(response.route.is_some());
        let types: Vec<StopType> = response.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(types, vec![StopType::Pickup, StopType::Dropoff]);
        assert!((response.summary.total_distance_miles - 240.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_create_trip_places_fuel_stop() {
        let mut request = request();
        request.fuel_stop = Some(LocationInput {
            latitude: 31.5,
            longitude: -100.0,
            street_name: Some("Truck stop".to_string()),
        });

        let response = service().create_trip(None, request).await.unwrap();

        // Candidates: index 1 at 120 mi, index 2 at 240 mi.
        assert_eq!(response.trip.fuel_stop_index, Some(2));
        let types: Vec<StopType> = response.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(types, vec![StopType::Pickup, StopType::Fuel, StopType::Dropoff]);
    }

    #[tokio::test]
    async fn test_invalid_roles_are_rejected_before_routing() {
        let mut request = request();
        request.waypoints[2].role = Some(WaypointRole::Pickup);

        let err = service().create_trip(None, request).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_absurd_leg_duration_is_upstream_failure() {
        let repository = Arc::new(InMemoryTripRepository::new());
        let service = service_with(1e18, repository.clone());

        let err = service.create_trip(None, request()).await.unwrap_err();

        assert!(matches!(err, AppError::UpstreamRouting(_)));
        assert!(repository.list_trips(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_stop_id_is_validation_error() {
        let service = service();
        let created = service.create_trip(None, request()).await.unwrap();

        let err = service
            .update_stop_status(
                created.trip.id,
                None,
                UpdateStopStatusRequest {
                    stop_id: None,
                    status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_other_owner_cannot_see_trip() {
        let service = service();
        let owner = Uuid::new_v4();
        let created = service.create_trip(Some(owner), request()).await.unwrap();

        assert!(service.get_trip(created.trip.id, Some(owner)).await.is_ok());
        let err = service
            .get_trip(created.trip.id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_other_owner_cannot_change_trip() {
        let service = service();
        let owner = Uuid::new_v4();
        let stranger = Some(Uuid::new_v4());
        let created = service.create_trip(Some(owner), request()).await.unwrap();
        let trip_id = created.trip.id;

        assert!(matches!(
            service.start_trip(trip_id, stranger).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.clear_route(trip_id, stranger).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.cancel_trip(trip_id, stranger).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let stored = service.get_trip(trip_id, Some(owner)).await.unwrap();
        assert_eq!(stored.trip.status, TripStatus::Planned);
        assert!(stored.trip.route.is_some());

        let started = service.start_trip(trip_id, Some(owner)).await.unwrap();
        assert_eq!(started.trip.status, TripStatus::InProgress);
    }
}
