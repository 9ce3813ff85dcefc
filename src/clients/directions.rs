//! Directions gateway
//!
//! [`DirectionsGateway`] is the seam between trip planning and the routing
//! provider. [`MapboxDirectionsClient`] implements it against the Mapbox
//! Directions v5 API:
//!
//! `GET {base_url}/directions/v5/{profile}/{lon,lat;lon,lat;...}`
//!
//! Every request is bounded by the client timeout. Provider failures are
//! classified into [`GatewayError`] variants so callers can report them as
//! upstream failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Coordinate, RouteOption, RouteOptions, RouteResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";
pub const DEFAULT_PROFILE: &str = "mapbox/driving";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("hos-trip-planner/", env!("CARGO_PKG_VERSION"));

/// Routing provider failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("at least two coordinates are required, got {0}")]
    TooFewCoordinates(usize),

    #[error("directions request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("directions provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error reaching directions provider: {0}")]
    Network(String),

    #[error("could not parse directions response: {0}")]
    Parse(String),

    #[error("directions provider error {code}: {message}")]
    Service { code: String, message: String },

    #[error("no route found between the requested coordinates")]
    NoRoute,
}

/// Anything that can route an ordered list of coordinates.
#[async_trait]
pub trait DirectionsGateway: Send + Sync {
    /// Route through `coordinates` in order. The response carries one leg per
    /// consecutive pair.
    async fn get_route(
        &self,
        coordinates: &[Coordinate],
        options: RouteOptions,
    ) -> Result<RouteResponse, GatewayError>;
}

/// Settings of the Mapbox client.
#[derive(Clone)]
pub struct DirectionsConfig {
    pub access_token: String,
    pub base_url: String,
    pub profile: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for DirectionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionsConfig")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DirectionsConfig {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Mapbox Directions response as it comes off the wire.
#[derive(Debug, Deserialize)]
struct MapboxDirectionsResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteOption>,
}

/// Mapbox Directions v5 client.
#[derive(Debug, Clone)]
pub struct MapboxDirectionsClient {
    client: Client,
    config: DirectionsConfig,
}

impl MapboxDirectionsClient {
    pub fn new(config: DirectionsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DirectionsConfig {
        &self.config
    }

    /// Request URL without the query string.
    fn build_url(&self, coordinates: &[Coordinate]) -> String {
        let coords = coordinates
            .iter()
            .map(Coordinate::to_lon_lat)
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/directions/v5/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile.trim_matches('/'),
            coords
        )
    }

    fn query_params(&self, options: RouteOptions) -> [(&'static str, String); 4] {
        [
            ("access_token", self.config.access_token.clone()),
            ("overview", options.overview.as_str().to_string()),
            ("geometries", options.geometries.as_str().to_string()),
            ("steps", options.steps.to_string()),
        ]
    }

    fn convert_reqwest_error(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            return GatewayError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return GatewayError::Http {
                status: status.as_u16(),
                message: error.without_url().to_string(),
            };
        }

        GatewayError::Network(error.without_url().to_string())
    }

    fn convert_response(
        &self,
        response: MapboxDirectionsResponse,
    ) -> Result<RouteResponse, GatewayError> {
        match response.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => return Err(GatewayError::NoRoute),
            _ => {
                return Err(GatewayError::Service {
                    code: response.code,
                    message: response.message.unwrap_or_default(),
                })
            }
        }

        if response.routes.is_empty() {
            return Err(GatewayError::NoRoute);
        }

        Ok(RouteResponse {
            code: response.code,
            routes: response.routes,
        })
    }

    /// Error bodies from Mapbox carry a `message` worth surfacing.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        }
    }
}

#[async_trait]
impl DirectionsGateway for MapboxDirectionsClient {
    async fn get_route(
        &self,
        coordinates: &[Coordinate],
        options: RouteOptions,
    ) -> Result<RouteResponse, GatewayError> {
        if coordinates.len() < 2 {
            return Err(GatewayError::TooFewCoordinates(coordinates.len()));
        }

        let url = self.build_url(coordinates);
        log::debug!("🧭 Directions request: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(options))
            .send()
            .await
            .map_err(|e| self.convert_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            log::warn!("⚠️ Directions provider returned {}: {}", status, message);
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: MapboxDirectionsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.convert_reqwest_error(e)
            } else {
                GatewayError::Parse(e.without_url().to_string())
            }
        })?;

        self.convert_response(body)
    }
}
