//! SQL used by the PostgreSQL trip store.

pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

pub const UPSERT_LOCATION: &str = r#"
INSERT INTO locations (id, lat_micro, lon_micro, latitude, longitude, street_name, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (lat_micro, lon_micro) DO NOTHING;
"#;

pub const SELECT_LOCATION_BY_KEY: &str = r#"
SELECT id, latitude, longitude, street_name, created_at
FROM locations
WHERE lat_micro = $1 AND lon_micro = $2;
"#;

pub const SELECT_LOCATIONS_BY_IDS: &str = r#"
SELECT id, latitude, longitude, street_name, created_at
FROM locations
WHERE id = ANY($1);
"#;

pub const SELECT_TRIP: &str = r#"
SELECT id, owner_id, current_location_id, pickup_location_id, dropoff_location_id, waypoints,
       fuel_stop_location_id, fuel_stop_index, current_cycle_hours, status, route,
       created_at, updated_at
FROM trips
WHERE id = $1;
"#;

pub const SELECT_TRIPS: &str = r#"
SELECT id, owner_id, current_location_id, pickup_location_id, dropoff_location_id, waypoints,
       fuel_stop_location_id, fuel_stop_index, current_cycle_hours, status, route,
       created_at, updated_at
FROM trips
WHERE $1::uuid IS NULL OR owner_id = $1
ORDER BY created_at DESC;
"#;

pub const UPSERT_TRIP: &str = r#"
INSERT INTO trips (
    id, owner_id, current_location_id, pickup_location_id, dropoff_location_id, waypoints,
    fuel_stop_location_id, fuel_stop_index, current_cycle_hours, status, route,
    created_at, updated_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
ON CONFLICT (id) DO UPDATE
SET owner_id = $2,
    current_location_id = $3,
    pickup_location_id = $4,
    dropoff_location_id = $5,
    waypoints = $6,
    fuel_stop_location_id = $7,
    fuel_stop_index = $8,
    current_cycle_hours = $9,
    status = $10,
    route = $11,
    updated_at = $13;
"#;

pub const DELETE_TRIP: &str = r#"
DELETE FROM trips WHERE id = $1;
"#;

pub const SELECT_STOPS_FOR_TRIPS: &str = r#"
SELECT id, trip_id, location_id, sequence, stop_type, status, arrival_time, duration_minutes,
       cycle_hours_at_stop, distance_from_last_stop, leg_summary, created_at, updated_at
FROM stops
WHERE trip_id = ANY($1)
ORDER BY trip_id, sequence;
"#;

pub const DELETE_STALE_STOPS: &str = r#"
DELETE FROM stops WHERE trip_id = $1 AND NOT (id = ANY($2));
"#;

pub const UPSERT_STOP: &str = r#"
INSERT INTO stops (
    id, trip_id, location_id, sequence, stop_type, status, arrival_time, duration_minutes,
    cycle_hours_at_stop, distance_from_last_stop, leg_summary, created_at, updated_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
ON CONFLICT (id) DO UPDATE
SET location_id = $3,
    sequence = $4,
    stop_type = $5,
    status = $6,
    arrival_time = $7,
    duration_minutes = $8,
    cycle_hours_at_stop = $9,
    distance_from_last_stop = $10,
    leg_summary = $11,
    updated_at = $13;
"#;

pub const SELECT_LOG_SHEETS_FOR_TRIPS: &str = r#"
SELECT id, trip_id, start_time, end_time, start_location_id, end_location_id,
       start_cycle_hours, end_cycle_hours, status, created_at, updated_at
FROM log_sheets
WHERE trip_id = ANY($1)
ORDER BY trip_id, start_time;
"#;

pub const DELETE_STALE_LOG_SHEETS: &str = r#"
DELETE FROM log_sheets WHERE trip_id = $1 AND NOT (id = ANY($2));
"#;

pub const UPSERT_LOG_SHEET: &str = r#"
INSERT INTO log_sheets (
    id, trip_id, start_time, end_time, start_location_id, end_location_id,
    start_cycle_hours, end_cycle_hours, status, created_at, updated_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (id) DO UPDATE
SET start_time = $3,
    end_time = $4,
    start_location_id = $5,
    end_location_id = $6,
    start_cycle_hours = $7,
    end_cycle_hours = $8,
    status = $9,
    updated_at = $11;
"#;
