//! HOS trip planner
//!
//! Plans truck trips under Hours-of-Service rules: routes the waypoints
//! through a directions provider, lays out pickup, dropoff, fuel and rest
//! stops, and tracks the trip through its lifecycle with log sheets.

pub mod clients;
pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
