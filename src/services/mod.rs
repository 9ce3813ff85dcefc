//! Services module
//!
//! Planning logic and the services that run trip operations against the
//! repository and the directions gateway.

pub mod duty_clock;
pub mod fuel_optimizer;
pub mod itinerary_planner;
pub mod log_sheet_service;
pub mod trip_lifecycle;
pub mod trip_locks;
pub mod trip_service;

pub use duty_clock::DutyClock;
pub use fuel_optimizer::{FuelPlacement, FuelPositionOptimizer};
pub use itinerary_planner::{Itinerary, ItineraryPlanner, PlannedStop, PlanningError};
pub use log_sheet_service::LogSheetService;
pub use trip_locks::TripLocks;
pub use trip_service::TripService;
