//! HTTP routes
//!
//! Builds the full application router: health check, trip and log sheet
//! endpoints, wrapped in tracing, timeout and CORS layers.

pub mod log_sheet_routes;
pub mod trip_routes;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::cors_for;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(cors_for(&state.config.cors_origins));

    Router::new()
        .route("/health", get(health))
        .nest(
            "/api/trips",
            trip_routes::create_trip_router().merge(log_sheet_routes::create_log_sheet_router()),
        )
        .layer(middleware)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
