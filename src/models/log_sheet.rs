//! Log sheet model
//!
//! A log sheet records one stretch of duty between two stops. Sheets that share
//! a status must never cover the same instant on a trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSheetStatus {
    Active,
    Completed,
}

impl LogSheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSheetStatus::Active => "active",
            LogSheetStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for LogSheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogSheetStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(LogSheetStatus::Active),
            "completed" => Ok(LogSheetStatus::Completed),
            other => Err(format!("unknown log sheet status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSheet {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_location: Location,
    pub end_location: Option<Location>,
    pub start_cycle_hours: f64,
    pub end_cycle_hours: Option<f64>,
    pub status: LogSheetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LogSheet {
    /// Open a new active sheet.
    pub fn open(
        trip_id: Uuid,
        start_time: DateTime<Utc>,
        start_location: Location,
        start_cycle_hours: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            start_time,
            end_time: None,
            start_location,
            end_location: None,
            start_cycle_hours,
            end_cycle_hours: None,
            status: LogSheetStatus::Active,
            created_at: start_time,
            updated_at: start_time,
        }
    }

    /// Close the sheet at `end_time`.
    pub fn close(&mut self, end_time: DateTime<Utc>, end_location: Location, end_cycle_hours: f64) {
        self.end_time = Some(end_time);
        self.end_location = Some(end_location);
        self.end_cycle_hours = Some(end_cycle_hours);
        self.status = LogSheetStatus::Completed;
        self.updated_at = end_time;
    }

    pub fn is_active(&self) -> bool {
        self.status == LogSheetStatus::Active
    }

    /// Half-open interval overlap; an open end extends indefinitely.
    pub fn overlaps(&self, other: &LogSheet) -> bool {
        intervals_overlap(self.start_time, self.end_time, other.start_time, other.end_time)
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` share at least one instant.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: Option<DateTime<Utc>>,
    b_start: DateTime<Utc>,
    b_end: Option<DateTime<Utc>>,
) -> bool {
    let a_before_b_ends = b_end.map_or(true, |end| a_start < end);
    let b_before_a_ends = a_end.map_or(true, |end| b_start < end);
    a_before_b_ends && b_before_a_ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(8), Some(at(10)), at(10), Some(at(12))));
        assert!(!intervals_overlap(at(10), Some(at(12)), at(8), Some(at(10))));
    }

    #[test]
    fn test_nested_interval_overlaps() {
        assert!(intervals_overlap(at(8), Some(at(12)), at(9), Some(at(10))));
    }

    #[test]
    fn test_open_interval_overlaps_everything_after_start() {
        assert!(intervals_overlap(at(8), None, at(20), Some(at(21))));
        assert!(!intervals_overlap(at(8), None, at(6), Some(at(8))));
        assert!(intervals_overlap(at(8), None, at(9), None));
    }

    #[test]
    fn test_close_marks_sheet_completed() {
        let location = Location::new(crate::models::location::Coordinate::new(1.0, 1.0), None);
        let mut sheet = LogSheet::open(Uuid::new_v4(), at(8), location.clone(), 12.0);
        assert!(sheet.is_active());

        sheet.close(at(11), location, 15.0);

        assert_eq!(sheet.status, LogSheetStatus::Completed);
        assert_eq!(sheet.end_time, Some(at(11)));
        assert_eq!(sheet.end_cycle_hours, Some(15.0));
    }
}
