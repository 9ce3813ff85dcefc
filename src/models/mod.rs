//! Domain models
//!
//! Trips, stops, log sheets, locations and the routes they are planned from.

pub mod location;
pub mod log_sheet;
pub mod route;
pub mod stop;
pub mod trip;

pub use location::{Coordinate, CoordinateKey, Location, LocationInput};
pub use log_sheet::{LogSheet, LogSheetStatus};
pub use route::{RouteLeg, RouteOption, RouteOptions, RouteResponse};
pub use stop::{Stop, StopStatus, StopType};
pub use trip::{Trip, TripAggregate, TripStatus, Waypoint, WaypointRole};
