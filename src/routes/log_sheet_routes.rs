use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::trip_routes::owner_id;
use crate::dto::log_sheet_dto::{CreateLogSheetRequest, UpdateLogSheetRequest};
use crate::models::LogSheet;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Mounted under `/api/trips`, next to the trip routes.
pub fn create_log_sheet_router() -> Router<AppState> {
    Router::new()
        .route("/:id/log-sheets", get(list_log_sheets).post(create_log_sheet))
        .route(
            "/:id/log-sheets/:log_id",
            get(get_log_sheet)
                .patch(update_log_sheet)
                .delete(delete_log_sheet),
        )
}

async fn list_log_sheets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<LogSheet>>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.log_sheets.list(trip_id, owner).await?))
}

async fn create_log_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(trip_id): Path<Uuid>,
    payload: Result<Json<CreateLogSheetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogSheet>), AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    let sheet = state.log_sheets.create(trip_id, owner, request).await?;
    Ok((StatusCode::CREATED, Json(sheet)))
}

async fn get_log_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((trip_id, log_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LogSheet>, AppError> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.log_sheets.get(trip_id, owner, log_id).await?))
}

async fn update_log_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((trip_id, log_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateLogSheetRequest>, JsonRejection>,
) -> Result<Json<LogSheet>, AppError> {
    let owner = owner_id(&headers)?;
    let Json(request) = payload?;
    Ok(Json(state.log_sheets.update(trip_id, owner, log_id, request).await?))
}

async fn delete_log_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((trip_id, log_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    state.log_sheets.delete(trip_id, owner, log_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Log sheet deleted"
    })))
}
