//! PostgreSQL trip store
//!
//! Trips, stops and log sheets live in their own tables; locations are shared
//! rows keyed by their normalized coordinate. Aggregates are loaded with one
//! query per table and saved inside a single transaction.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::queries;
use super::TripRepository;
use crate::models::{
    Coordinate, Location, LogSheet, Stop, Trip, TripAggregate, Waypoint, WaypointRole,
};
use crate::utils::errors::{AppError, AppResult};

/// Waypoint as stored in `trips.waypoints`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredWaypoint {
    location_id: Uuid,
    role: WaypointRole,
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    latitude: f64,
    longitude: f64,
    street_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            street_name: row.street_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    current_location_id: Uuid,
    pickup_location_id: Uuid,
    dropoff_location_id: Uuid,
    waypoints: Json<Vec<StoredWaypoint>>,
    fuel_stop_location_id: Option<Uuid>,
    fuel_stop_index: Option<i32>,
    current_cycle_hours: f64,
    status: String,
    route: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct StopRow {
    id: Uuid,
    trip_id: Uuid,
    location_id: Uuid,
    sequence: i32,
    stop_type: String,
    status: String,
    arrival_time: DateTime<Utc>,
    duration_minutes: i32,
    cycle_hours_at_stop: f64,
    distance_from_last_stop: f64,
    leg_summary: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LogSheetRow {
    id: Uuid,
    trip_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    start_location_id: Uuid,
    end_location_id: Option<Uuid>,
    start_cycle_hours: f64,
    end_cycle_hours: Option<f64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_column<T>(column: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e| AppError::Internal(format!("corrupt {} column: {}", column, e)))
}

fn to_i32(column: &str, value: usize) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Internal(format!("{} out of range: {}", column, value)))
}

/// Locations referenced by rows, resolved by id.
struct LocationIndex(HashMap<Uuid, Location>);

impl LocationIndex {
    fn get(&self, id: Uuid) -> AppResult<Location> {
        self.0
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("dangling location reference {}", id)))
    }
}

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables when they are missing.
    pub async fn migrate(&self) -> AppResult<()> {
        self.pool.execute(queries::SCHEMA).await?;
        log::info!("✅ Database schema ready");
        Ok(())
    }

    async fn load_aggregates(&self, trip_rows: Vec<TripRow>) -> AppResult<Vec<TripAggregate>> {
        if trip_rows.is_empty() {
            return Ok(Vec::new());
        }

        let trip_ids: Vec<Uuid> = trip_rows.iter().map(|row| row.id).collect();

        let stop_rows = sqlx::query_as::<_, StopRow>(queries::SELECT_STOPS_FOR_TRIPS)
            .bind(&trip_ids)
            .fetch_all(&self.pool)
            .await?;

        let sheet_rows = sqlx::query_as::<_, LogSheetRow>(queries::SELECT_LOG_SHEETS_FOR_TRIPS)
            .bind(&trip_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut location_ids: Vec<Uuid> = Vec::new();
        for row in &trip_rows {
            location_ids.extend([
                row.current_location_id,
                row.pickup_location_id,
                row.dropoff_location_id,
            ]);
            location_ids.extend(row.fuel_stop_location_id);
            location_ids.extend(row.waypoints.0.iter().map(|w| w.location_id));
        }
        location_ids.extend(stop_rows.iter().map(|row| row.location_id));
        for row in &sheet_rows {
            location_ids.push(row.start_location_id);
            location_ids.extend(row.end_location_id);
        }
        location_ids.sort_unstable();
        location_ids.dedup();

        let locations = LocationIndex(
            sqlx::query_as::<_, LocationRow>(queries::SELECT_LOCATIONS_BY_IDS)
                .bind(&location_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|row| (row.id, Location::from(row)))
                .collect(),
        );

        let mut stops_by_trip: HashMap<Uuid, Vec<Stop>> = HashMap::new();
        for row in stop_rows {
            let stop = Stop {
                id: row.id,
                trip_id: row.trip_id,
                location: locations.get(row.location_id)?,
                sequence: row.sequence.max(0) as u32,
                stop_type: parse_column("stop_type", &row.stop_type)?,
                status: parse_column("stop status", &row.status)?,
                arrival_time: row.arrival_time,
                duration_minutes: row.duration_minutes.max(0) as u32,
                cycle_hours_at_stop: row.cycle_hours_at_stop,
                distance_from_last_stop: row.distance_from_last_stop,
                leg_summary: row.leg_summary,
                created_at: row.created_at,
                updated_at: row.updated_at,
            };
            stops_by_trip.entry(stop.trip_id).or_default().push(stop);
        }

        let mut sheets_by_trip: HashMap<Uuid, Vec<LogSheet>> = HashMap::new();
        for row in sheet_rows {
            let sheet = LogSheet {
                id: row.id,
                trip_id: row.trip_id,
                start_time: row.start_time,
                end_time: row.end_time,
                start_location: locations.get(row.start_location_id)?,
                end_location: row.end_location_id.map(|id| locations.get(id)).transpose()?,
                start_cycle_hours: row.start_cycle_hours,
                end_cycle_hours: row.end_cycle_hours,
                status: parse_column("log sheet status", &row.status)?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            };
            sheets_by_trip.entry(sheet.trip_id).or_default().push(sheet);
        }

        trip_rows
            .into_iter()
            .map(|row| -> AppResult<TripAggregate> {
                let waypoints = row
                    .waypoints
                    .0
                    .iter()
                    .map(|w| -> AppResult<Waypoint> {
                        Ok(Waypoint::new(locations.get(w.location_id)?, w.role))
                    })
                    .collect::<AppResult<Vec<_>>>()?;

                let trip = Trip {
                    id: row.id,
                    owner_id: row.owner_id,
                    current_location: locations.get(row.current_location_id)?,
                    pickup_location: locations.get(row.pickup_location_id)?,
                    dropoff_location: locations.get(row.dropoff_location_id)?,
                    waypoints,
                    fuel_stop: row
                        .fuel_stop_location_id
                        .map(|id| locations.get(id))
                        .transpose()?,
                    fuel_stop_index: row.fuel_stop_index.map(|index| index.max(0) as usize),
                    current_cycle_hours: row.current_cycle_hours,
                    status: parse_column("trip status", &row.status)?,
                    route: row.route,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                };

                let mut aggregate = TripAggregate {
                    stops: stops_by_trip.remove(&trip.id).unwrap_or_default(),
                    log_sheets: sheets_by_trip.remove(&trip.id).unwrap_or_default(),
                    trip,
                };
                aggregate.sort();
                Ok(aggregate)
            })
            .collect()
    }

    async fn insert_location(
        tx: &mut Transaction<'_, Postgres>,
        location: &Location,
    ) -> AppResult<()> {
        let key = location.key();
        sqlx::query(queries::UPSERT_LOCATION)
            .bind(location.id)
            .bind(key.lat_micro)
            .bind(key.lon_micro)
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(&location.street_name)
            .bind(location.created_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    fn referenced_locations(aggregate: &TripAggregate) -> Vec<&Location> {
        let trip = &aggregate.trip;
        let mut referenced = vec![
            &trip.current_location,
            &trip.pickup_location,
            &trip.dropoff_location,
        ];
        referenced.extend(trip.fuel_stop.as_ref());
        referenced.extend(trip.waypoints.iter().map(|w| &w.location));
        referenced.extend(aggregate.stops.iter().map(|s| &s.location));
        for sheet in &aggregate.log_sheets {
            referenced.push(&sheet.start_location);
            referenced.extend(sheet.end_location.as_ref());
        }
        referenced.sort_by_key(|location| location.id);
        referenced.dedup_by_key(|location| location.id);
        referenced
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn find_trip(&self, trip_id: Uuid) -> AppResult<Option<TripAggregate>> {
        let row = sqlx::query_as::<_, TripRow>(queries::SELECT_TRIP)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.load_aggregates(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_trips(&self, owner_id: Option<Uuid>) -> AppResult<Vec<TripAggregate>> {
        let rows = sqlx::query_as::<_, TripRow>(queries::SELECT_TRIPS)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        self.load_aggregates(rows).await
    }

    async fn save(&self, aggregate: &TripAggregate) -> AppResult<()> {
        let trip = &aggregate.trip;
        let mut tx = self.pool.begin().await?;

        for location in Self::referenced_locations(aggregate) {
            Self::insert_location(&mut tx, location).await?;
        }

        let waypoints: Vec<StoredWaypoint> = trip
            .waypoints
            .iter()
            .map(|w| StoredWaypoint {
                location_id: w.location.id,
                role: w.role,
            })
            .collect();
        let fuel_stop_index = trip
            .fuel_stop_index
            .map(|index| to_i32("fuel_stop_index", index))
            .transpose()?;

        sqlx::query(queries::UPSERT_TRIP)
            .bind(trip.id)
            .bind(trip.owner_id)
            .bind(trip.current_location.id)
            .bind(trip.pickup_location.id)
            .bind(trip.dropoff_location.id)
            .bind(Json(waypoints))
            .bind(trip.fuel_stop.as_ref().map(|location| location.id))
            .bind(fuel_stop_index)
            .bind(trip.current_cycle_hours)
            .bind(trip.status.as_str())
            .bind(&trip.route)
            .bind(trip.created_at)
            .bind(trip.updated_at)
            .execute(&mut *tx)
            .await?;

        let stop_ids: Vec<Uuid> = aggregate.stops.iter().map(|s| s.id).collect();
        sqlx::query(queries::DELETE_STALE_STOPS)
            .bind(trip.id)
            .bind(&stop_ids)
            .execute(&mut *tx)
            .await?;

        for stop in &aggregate.stops {
            sqlx::query(queries::UPSERT_STOP)
                .bind(stop.id)
                .bind(trip.id)
                .bind(stop.location.id)
                .bind(to_i32("sequence", stop.sequence as usize)?)
                .bind(stop.stop_type.as_str())
                .bind(stop.status.as_str())
                .bind(stop.arrival_time)
                .bind(to_i32("duration_minutes", stop.duration_minutes as usize)?)
                .bind(stop.cycle_hours_at_stop)
                .bind(stop.distance_from_last_stop)
                .bind(&stop.leg_summary)
                .bind(stop.created_at)
                .bind(stop.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        let sheet_ids: Vec<Uuid> = aggregate.log_sheets.iter().map(|s| s.id).collect();
        sqlx::query(queries::DELETE_STALE_LOG_SHEETS)
            .bind(trip.id)
            .bind(&sheet_ids)
            .execute(&mut *tx)
            .await?;

        for sheet in &aggregate.log_sheets {
            sqlx::query(queries::UPSERT_LOG_SHEET)
                .bind(sheet.id)
                .bind(trip.id)
                .bind(sheet.start_time)
                .bind(sheet.end_time)
                .bind(sheet.start_location.id)
                .bind(sheet.end_location.as_ref().map(|location| location.id))
                .bind(sheet.start_cycle_hours)
                .bind(sheet.end_cycle_hours)
                .bind(sheet.status.as_str())
                .bind(sheet.created_at)
                .bind(sheet.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_trip(&self, trip_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(queries::DELETE_TRIP)
            .bind(trip_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_location(
        &self,
        coordinate: Coordinate,
        street_name: Option<String>,
    ) -> AppResult<Location> {
        let candidate = Location::new(coordinate, street_name);
        let key = candidate.key();

        sqlx::query(queries::UPSERT_LOCATION)
            .bind(candidate.id)
            .bind(key.lat_micro)
            .bind(key.lon_micro)
            .bind(candidate.latitude)
            .bind(candidate.longitude)
            .bind(&candidate.street_name)
            .bind(candidate.created_at)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query_as::<_, LocationRow>(queries::SELECT_LOCATION_BY_KEY)
            .bind(key.lat_micro)
            .bind(key.lon_micro)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }
}
