//! Trip lifecycle
//!
//! Status transitions of a trip and its stops, and the log-sheet bookkeeping
//! that follows them. Every function works on an in-memory [`TripAggregate`];
//! callers persist the aggregate only when the function succeeds.
//!
//! ```text
//! planned ──start──▶ in_progress ──last stop / complete──▶ completed
//!    │                    │
//!    └──────cancel────────┴──▶ cancelled
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Location, LogSheet, Stop, StopStatus, StopType, TripAggregate, TripStatus,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Fields of a manually added stop.
#[derive(Debug, Clone)]
pub struct NewStop {
    pub location: Location,
    pub stop_type: StopType,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub cycle_hours_at_stop: f64,
    pub distance_from_last_stop: f64,
    pub leg_summary: Option<String>,
}

fn ensure_not_terminal(aggregate: &TripAggregate, action: &str) -> AppResult<()> {
    let status = aggregate.trip.status;
    if status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "cannot {} a {} trip",
            action, status
        )));
    }
    Ok(())
}

/// Close the active sheet, if any, at `at`.
fn close_active_sheet(aggregate: &mut TripAggregate, now: DateTime<Utc>, at: Location) {
    let cycle_hours = aggregate.trip.current_cycle_hours;
    if let Some(sheet) = aggregate.active_log_sheet_mut() {
        sheet.close(now, at, cycle_hours);
    }
}

fn open_sheet(aggregate: &mut TripAggregate, now: DateTime<Utc>, at: Location) {
    let sheet = LogSheet::open(aggregate.id(), now, at, aggregate.trip.current_cycle_hours);
    aggregate.log_sheets.push(sheet);
}

/// planned → in_progress. The first stop becomes in progress and a log sheet
/// is opened at the trip's current location.
pub fn start(aggregate: &mut TripAggregate, now: DateTime<Utc>) -> AppResult<()> {
    if aggregate.trip.status != TripStatus::Planned {
        return Err(AppError::InvalidTransition(format!(
            "only planned trips can be started, trip is {}",
            aggregate.trip.status
        )));
    }

    aggregate.sort();
    if let Some(first) = aggregate.stops.first_mut() {
        if first.status == StopStatus::Pending {
            first.status = StopStatus::InProgress;
            first.updated_at = now;
        }
    }

    let origin = aggregate.trip.current_location.clone();
    close_active_sheet(aggregate, now, origin.clone());
    open_sheet(aggregate, now, origin);

    aggregate.trip.status = TripStatus::InProgress;
    aggregate.trip.updated_at = now;
    Ok(())
}

/// Set a stop's status. Completing a stop of an in-progress trip rolls the log
/// sheet over to the next stop; completing the last outstanding stop completes
/// the trip.
pub fn update_stop_status(
    aggregate: &mut TripAggregate,
    stop_id: Uuid,
    status: StopStatus,
    now: DateTime<Utc>,
) -> AppResult<()> {
    ensure_not_terminal(aggregate, "update stops of")?;

    let stop = aggregate
        .stop_mut(stop_id)
        .ok_or_else(|| not_found_error("Stop", stop_id))?;
    let previous = stop.status;
    stop.status = status;
    stop.updated_at = now;
    let sequence = stop.sequence;
    let location = stop.location.clone();

    // Sheets only roll while driving, and only on the first completion.
    if status == StopStatus::Completed
        && previous != StopStatus::Completed
        && aggregate.trip.status == TripStatus::InProgress
    {
        close_active_sheet(aggregate, now, location.clone());
        if aggregate.stop_by_sequence(sequence + 1).is_some() {
            open_sheet(aggregate, now, location);
        }
    }

    if !aggregate.stops.is_empty()
        && aggregate
            .stops
            .iter()
            .all(|stop| stop.status == StopStatus::Completed)
    {
        aggregate.trip.status = TripStatus::Completed;
        log::info!("🏁 All stops completed, trip {} completed", aggregate.id());
    }

    aggregate.trip.updated_at = now;
    Ok(())
}

/// Mark the trip completed, closing out every pending stop.
pub fn complete(aggregate: &mut TripAggregate, now: DateTime<Utc>) -> AppResult<()> {
    if aggregate.trip.status == TripStatus::Cancelled {
        return Err(AppError::InvalidTransition(
            "cannot complete a cancelled trip".to_string(),
        ));
    }

    for stop in aggregate
        .stops
        .iter_mut()
        .filter(|stop| stop.status == StopStatus::Pending)
    {
        stop.status = StopStatus::Completed;
        stop.updated_at = now;
    }

    let at = aggregate.trip.current_location.clone();
    close_active_sheet(aggregate, now, at);
    aggregate.trip.status = TripStatus::Completed;
    aggregate.trip.updated_at = now;
    Ok(())
}

pub fn cancel(aggregate: &mut TripAggregate, now: DateTime<Utc>) -> AppResult<()> {
    match aggregate.trip.status {
        TripStatus::Planned | TripStatus::InProgress => {
            let at = aggregate.trip.current_location.clone();
            close_active_sheet(aggregate, now, at);
            aggregate.trip.status = TripStatus::Cancelled;
            aggregate.trip.updated_at = now;
            Ok(())
        }
        other => Err(AppError::InvalidTransition(format!(
            "cannot cancel a {} trip",
            other
        ))),
    }
}

/// Remove a rest stop and renumber the rest.
pub fn delete_stop(aggregate: &mut TripAggregate, stop_id: Uuid, now: DateTime<Utc>) -> AppResult<Stop> {
    let position = aggregate
        .stops
        .iter()
        .position(|stop| stop.id == stop_id)
        .ok_or_else(|| not_found_error("Stop", stop_id))?;

    let stop_type = aggregate.stops[position].stop_type;
    if !stop_type.is_deletable() {
        return Err(AppError::InvariantViolation(format!(
            "only rest stops can be deleted, stop {} is a {} stop",
            stop_id, stop_type
        )));
    }

    let removed = aggregate.stops.remove(position);
    aggregate.renumber_stops(now);
    aggregate.trip.updated_at = now;
    Ok(removed)
}

/// Append a stop after the current last one.
pub fn create_stop(aggregate: &mut TripAggregate, new_stop: NewStop, now: DateTime<Utc>) -> AppResult<Stop> {
    ensure_not_terminal(aggregate, "add stops to")?;

    let stop = Stop {
        id: Uuid::new_v4(),
        trip_id: aggregate.id(),
        location: new_stop.location,
        sequence: aggregate.next_sequence(),
        stop_type: new_stop.stop_type,
        status: StopStatus::Pending,
        arrival_time: new_stop.arrival_time,
        duration_minutes: new_stop.duration_minutes,
        cycle_hours_at_stop: new_stop.cycle_hours_at_stop,
        distance_from_last_stop: new_stop.distance_from_last_stop,
        leg_summary: new_stop.leg_summary,
        created_at: now,
        updated_at: now,
    };

    aggregate.stops.push(stop.clone());
    aggregate.trip.updated_at = now;
    Ok(stop)
}

/// Move the trip's origin. The cached route is left untouched.
pub fn update_current_location(
    aggregate: &mut TripAggregate,
    location: Location,
    now: DateTime<Utc>,
) -> AppResult<()> {
    ensure_not_terminal(aggregate, "relocate")?;

    let trip = &mut aggregate.trip;
    if let Some(origin) = trip.waypoints.first_mut() {
        origin.location = location.clone();
    }
    trip.current_location = location;
    trip.updated_at = now;
    Ok(())
}
