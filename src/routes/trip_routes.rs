use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::trip_dto::{
    CreateStopRequest, CreateTripRequest, DeleteStopQuery, PlanRouteRequest, TripPlanResponse,
    TripStateResponse, UpdateLocationRequest, UpdateStopStatusRequest,
};
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError, AppResult};

pub const OWNER_HEADER: &str = "x-user-id";

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip).delete(delete_trip))
        .route("/:id/plan_route", post(plan_route))
        .route("/:id/route", delete(clear_route))
        .route("/:id/start_trip", post(start_trip))
        .route("/:id/update_stop_status", post(update_stop_status))
        .route("/:id/create_stop", post(create_stop))
        .route("/:id/delete_stop", delete(delete_stop))
        .route("/:id/complete", post(complete_trip))
        .route("/:id/cancel", post(cancel_trip))
        .route("/:id/update_location", post(update_location))
}

/// Owner taken from the `X-User-Id` header, if any.
pub(crate) fn owner_id(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    match headers.get(OWNER_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Some)
            .ok_or_else(|| validation_error("X-User-Id must be a UUID")),
    }
}

async fn create_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TripPlanResponse>), AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    let response = state.trips.create_trip(owner, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_trips(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TripStateResponse>>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.list_trips(owner).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.get_trip(id, owner).await?))
}

async fn delete_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    state.trips.delete_trip(id, owner).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Trip deleted"
    })))
}

/// The body is optional; an empty one plans without a fuel stop change.
async fn plan_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<TripPlanResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PlanRouteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| validation_error(format!("invalid request body: {}", e)))?
    };
    Ok(Json(state.trips.plan_route(id, owner, request).await?))
}

async fn clear_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.clear_route(id, owner).await?))
}

async fn start_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.start_trip(id, owner).await?))
}

async fn complete_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.complete_trip(id, owner).await?))
}

async fn cancel_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.trips.cancel_trip(id, owner).await?))
}

async fn update_stop_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStopStatusRequest>, JsonRejection>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    Ok(Json(state.trips.update_stop_status(id, owner, request).await?))
}

async fn create_stop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateStopRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TripStateResponse>), AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    let response = state.trips.create_stop(id, owner, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_stop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    query: Result<Query<DeleteStopQuery>, QueryRejection>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let Query(query) = query?;
    Ok(Json(state.trips.delete_stop(id, owner, query.stop_id).await?))
}

async fn update_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Json<TripStateResponse>, AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    Ok(Json(state.trips.update_current_location(id, owner, request).await?))
}
