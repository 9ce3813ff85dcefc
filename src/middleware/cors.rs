//! CORS middleware

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Any origin. Used when no origins are configured.
pub fn cors_middleware() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Restrict cross-origin requests to `origins`.
pub fn cors_middleware_with_origins(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("⚠️ Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-user-id"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Pick the layer for the configured origins; `*` or an empty list allows any.
pub fn cors_for(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        cors_middleware()
    } else {
        cors_middleware_with_origins(origins)
    }
}
