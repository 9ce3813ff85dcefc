//! Log sheet DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::{LocationInput, LogSheetStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLogSheetRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_location: LocationInput,
    pub end_location: Option<LocationInput>,
    #[validate(range(min = 0.0, max = 70.0))]
    pub start_cycle_hours: f64,
    #[validate(range(min = 0.0))]
    pub end_cycle_hours: Option<f64>,
    /// Defaults to `completed` when an end time is given, `active` otherwise.
    pub status: Option<LogSheetStatus>,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLogSheetRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_location: Option<LocationInput>,
    pub end_location: Option<LocationInput>,
    #[validate(range(min = 0.0, max = 70.0))]
    pub start_cycle_hours: Option<f64>,
    #[validate(range(min = 0.0))]
    pub end_cycle_hours: Option<f64>,
    pub status: Option<LogSheetStatus>,
}
