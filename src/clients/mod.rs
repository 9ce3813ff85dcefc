//! Clients for external APIs
//!
//! This module contains the HTTP clients used to reach third-party services.

pub mod directions;

pub use directions::{
    DirectionsConfig, DirectionsGateway, GatewayError, MapboxDirectionsClient,
};
