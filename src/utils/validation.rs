//! Validation helpers
//!
//! Checks that go beyond what the `validator` derive expresses: waypoint
//! roles, log-sheet intervals and nested location inputs.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::trip_dto::WaypointInput;
use crate::models::{LocationInput, WaypointRole};
use crate::utils::errors::AppError;

fn error_with_message(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

/// Wrap a single field error into the error type handlers return.
pub fn field_error(field: &'static str, error: ValidationError) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::InvalidInput(errors)
}

/// Resolve the role of every waypoint. The first entry is the origin; later
/// entries without a role are plain waypoints. Exactly one pickup and one
/// dropoff must be present.
pub fn resolve_waypoint_roles(
    waypoints: &[WaypointInput],
) -> Result<Vec<WaypointRole>, ValidationError> {
    if waypoints.len() < 3 {
        let mut error = error_with_message(
            "waypoint_count",
            "origin, pickup and dropoff are required".to_string(),
        );
        error.add_param("actual".into(), &waypoints.len());
        return Err(error);
    }

    let mut roles = Vec::with_capacity(waypoints.len());
    for (index, waypoint) in waypoints.iter().enumerate() {
        let role = match (index, waypoint.role) {
            (0, None | Some(WaypointRole::Current)) => WaypointRole::Current,
            (0, Some(other)) => {
                return Err(error_with_message(
                    "origin_role",
                    format!("the first waypoint is the origin and cannot be a {:?} point", other)
                        .to_lowercase(),
                ))
            }
            (_, Some(WaypointRole::Current)) => {
                let mut error = error_with_message(
                    "current_role",
                    "only the first waypoint can be the current location".to_string(),
                );
                error.add_param("index".into(), &index);
                return Err(error);
            }
            (_, role) => role.unwrap_or(WaypointRole::Waypoint),
        };
        roles.push(role);
    }

    for (required, name) in [(WaypointRole::Pickup, "pickup"), (WaypointRole::Dropoff, "dropoff")] {
        let count = roles.iter().filter(|role| **role == required).count();
        if count != 1 {
            let mut error = error_with_message(
                "role_count",
                format!("exactly one {} waypoint is required, got {}", name, count),
            );
            error.add_param("role".into(), &name);
            error.add_param("actual".into(), &count);
            return Err(error);
        }
    }

    Ok(roles)
}

/// `start_time` must come strictly before `end_time`.
pub fn validate_interval(
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match end_time {
        Some(end) if end <= start_time => {
            let mut error =
                error_with_message("interval", "start_time must precede end_time".to_string());
            error.add_param("start_time".into(), &start_time.to_rfc3339());
            error.add_param("end_time".into(), &end.to_rfc3339());
            Err(error)
        }
        _ => Ok(()),
    }
}

/// Validate an optional nested location.
pub fn validate_location(location: Option<&LocationInput>) -> Result<(), AppError> {
    if let Some(location) = location {
        location.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input(role: Option<WaypointRole>) -> WaypointInput {
        WaypointInput {
            location: LocationInput {
                latitude: 10.0,
                longitude: 10.0,
                street_name: None,
            },
            role,
        }
    }

    #[test]
    fn test_roles_are_resolved_with_defaults() {
        let roles = resolve_waypoint_roles(&[
            input(None),
            input(None),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Dropoff)),
        ])
        .unwrap();

        assert_eq!(
            roles,
            vec![
                WaypointRole::Current,
                WaypointRole::Waypoint,
                WaypointRole::Pickup,
                WaypointRole::Dropoff
            ]
        );
    }

    #[test]
    fn test_origin_cannot_be_pickup() {
        let err = resolve_waypoint_roles(&[
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Dropoff)),
        ])
        .unwrap_err();
        assert_eq!(err.code, "origin_role");
    }

    #[test]
    fn test_missing_dropoff_is_rejected() {
        let err = resolve_waypoint_roles(&[
            input(None),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Fuel)),
        ])
        .unwrap_err();
        assert_eq!(err.code, "role_count");
    }

    #[test]
    fn test_duplicate_pickup_is_rejected() {
        let err = resolve_waypoint_roles(&[
            input(None),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Dropoff)),
        ])
        .unwrap_err();
        assert_eq!(err.code, "role_count");
    }

    #[test]
    fn test_current_only_at_origin() {
        let err = resolve_waypoint_roles(&[
            input(None),
            input(Some(WaypointRole::Current)),
            input(Some(WaypointRole::Pickup)),
            input(Some(WaypointRole::Dropoff)),
        ])
        .unwrap_err();
        assert_eq!(err.code, "current_role");
    }

    #[test]
    fn test_interval_requires_start_before_end() {
        let start = Utc::now();
        assert!(validate_interval(start, Some(start + Duration::hours(1))).is_ok());
        assert!(validate_interval(start, Some(start)).is_err());
        assert!(validate_interval(start, None).is_ok());
    }

    #[test]
    fn test_out_of_range_location_is_invalid() {
        let location = LocationInput {
            latitude: 95.0,
            longitude: 0.0,
            street_name: None,
        };
        assert!(matches!(
            validate_location(Some(&location)),
            Err(AppError::InvalidInput(_))
        ));
    }
}
