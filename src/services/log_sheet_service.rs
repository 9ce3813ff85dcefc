//! Log sheet service
//!
//! CRUD over a trip's log sheets. Sheets of the same status may not overlap in
//! time; a rejected change leaves the stored trip untouched.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::log_sheet_dto::{CreateLogSheetRequest, UpdateLogSheetRequest};
use crate::models::{Location, LocationInput, LogSheet, LogSheetStatus, TripAggregate};
use crate::repositories::TripRepository;
use crate::services::trip_locks::TripLocks;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::{field_error, validate_interval, validate_location};

pub struct LogSheetService {
    repository: Arc<dyn TripRepository>,
    locks: TripLocks,
}

impl LogSheetService {
    pub fn new(repository: Arc<dyn TripRepository>, locks: TripLocks) -> Self {
        Self { repository, locks }
    }

    async fn load(&self, trip_id: Uuid, owner_id: Option<Uuid>) -> AppResult<TripAggregate> {
        self.repository
            .find_trip(trip_id)
            .await?
            .filter(|aggregate| aggregate.is_visible_to(owner_id))
            .ok_or_else(|| not_found_error("Trip", trip_id))
    }

    async fn resolve_location(&self, input: &LocationInput) -> AppResult<Location> {
        input.validate()?;
        self.repository
            .get_or_create_location(input.coordinate(), input.street_name.clone())
            .await
    }

    pub async fn list(&self, trip_id: Uuid, owner_id: Option<Uuid>) -> AppResult<Vec<LogSheet>> {
        Ok(self.load(trip_id, owner_id).await?.log_sheets)
    }

    pub async fn get(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        log_id: Uuid,
    ) -> AppResult<LogSheet> {
        self.load(trip_id, owner_id)
            .await?
            .log_sheets
            .into_iter()
            .find(|sheet| sheet.id == log_id)
            .ok_or_else(|| not_found_error("Log sheet", log_id))
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        request: CreateLogSheetRequest,
    ) -> AppResult<LogSheet> {
        request.validate()?;
        validate_location(request.end_location.as_ref())?;
        validate_interval(request.start_time, request.end_time)
            .map_err(|e| field_error("end_time", e))?;

        let _guard = self.locks.acquire(trip_id).await;
        let mut aggregate = self.load(trip_id, owner_id).await?;

        let start_location = self.resolve_location(&request.start_location).await?;
        let end_location = match &request.end_location {
            Some(input) => Some(self.resolve_location(input).await?),
            None => None,
        };

        let now = Utc::now();
        let status = request.status.unwrap_or(if request.end_time.is_some() {
            LogSheetStatus::Completed
        } else {
            LogSheetStatus::Active
        });
        let sheet = LogSheet {
            id: Uuid::new_v4(),
            trip_id,
            start_time: request.start_time,
            end_time: request.end_time,
            start_location,
            end_location,
            start_cycle_hours: request.start_cycle_hours,
            end_cycle_hours: request.end_cycle_hours,
            status,
            created_at: now,
            updated_at: now,
        };

        ensure_no_overlap(&aggregate, &sheet)?;
        aggregate.log_sheets.push(sheet.clone());
        aggregate.sort();
        self.repository.save(&aggregate).await?;

        log::info!("📝 Log sheet {} added to trip {}", sheet.id, trip_id);
        Ok(sheet)
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        log_id: Uuid,
        request: UpdateLogSheetRequest,
    ) -> AppResult<LogSheet> {
        request.validate()?;

        let _guard = self.locks.acquire(trip_id).await;
        let mut aggregate = self.load(trip_id, owner_id).await?;
        let mut sheet = aggregate
            .log_sheets
            .iter()
            .find(|sheet| sheet.id == log_id)
            .cloned()
            .ok_or_else(|| not_found_error("Log sheet", log_id))?;

        if let Some(start_time) = request.start_time {
            sheet.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            sheet.end_time = Some(end_time);
        }
        if let Some(input) = &request.start_location {
            sheet.start_location = self.resolve_location(input).await?;
        }
        if let Some(input) = &request.end_location {
            sheet.end_location = Some(self.resolve_location(input).await?);
        }
        if let Some(hours) = request.start_cycle_hours {
            sheet.start_cycle_hours = hours;
        }
        if let Some(hours) = request.end_cycle_hours {
            sheet.end_cycle_hours = Some(hours);
        }
        if let Some(status) = request.status {
            sheet.status = status;
        }
        sheet.updated_at = Utc::now();

        validate_interval(sheet.start_time, sheet.end_time)
            .map_err(|e| field_error("end_time", e))?;
        ensure_no_overlap(&aggregate, &sheet)?;

        if let Some(slot) = aggregate.log_sheets.iter_mut().find(|s| s.id == log_id) {
            *slot = sheet.clone();
        }
        aggregate.sort();
        self.repository.save(&aggregate).await?;

        log::info!("📝 Log sheet {} of trip {} updated", log_id, trip_id);
        Ok(sheet)
    }

    pub async fn delete(
        &self,
        trip_id: Uuid,
        owner_id: Option<Uuid>,
        log_id: Uuid,
    ) -> AppResult<()> {
        let _guard = self.locks.acquire(trip_id).await;
        let mut aggregate = self.load(trip_id, owner_id).await?;

        let before = aggregate.log_sheets.len();
        aggregate.log_sheets.retain(|sheet| sheet.id != log_id);
        if aggregate.log_sheets.len() == before {
            return Err(not_found_error("Log sheet", log_id));
        }
        self.repository.save(&aggregate).await?;

        log::info!("🗑️ Log sheet {} removed from trip {}", log_id, trip_id);
        Ok(())
    }
}

/// Reject `candidate` when it overlaps another sheet of the same status.
fn ensure_no_overlap(aggregate: &TripAggregate, candidate: &LogSheet) -> AppResult<()> {
    let conflict = aggregate.log_sheets.iter().find(|other| {
        other.id != candidate.id && other.status == candidate.status && other.overlaps(candidate)
    });

    match conflict {
        Some(other) => {
            log::warn!(
                "⚠️ Log sheet for trip {} overlaps {} sheet {}",
                aggregate.id(),
                other.status,
                other.id
            );
            let mut error = ValidationError::new("overlap");
            error.message = Some(Cow::Owned(format!(
                "log sheet overlaps {} log sheet {}",
                other.status, other.id
            )));
            error.add_param("conflicting_id".into(), &other.id.to_string());
            Err(field_error("start_time", error))
        }
        None => Ok(()),
    }
}
