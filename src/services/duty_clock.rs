//! Duty clock
//!
//! Tracks a driver's accumulated cycle hours, the wall clock and the driving
//! time since the last rest while an itinerary is being laid out.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// The wall clock would leave the representable date range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("duty clock cannot advance {seconds} seconds past {from}")]
pub struct ClockOverflow {
    pub from: DateTime<Utc>,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DutyClock {
    cycle_hours: f64,
    clock: DateTime<Utc>,
    driving_hours_since_rest: f64,
}

impl DutyClock {
    pub fn new(cycle_hours: f64, clock: DateTime<Utc>) -> Self {
        Self {
            cycle_hours,
            clock,
            driving_hours_since_rest: 0.0,
        }
    }

    pub fn cycle_hours(&self) -> f64 {
        self.cycle_hours
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    pub fn driving_hours_since_rest(&self) -> f64 {
        self.driving_hours_since_rest
    }

    /// Drive for `duration_seconds`. Negative or non-finite input counts as zero.
    /// On overflow the clock is left unchanged.
    pub fn advance_driving(&mut self, duration_seconds: f64) -> Result<(), ClockOverflow> {
        let seconds = sanitize(duration_seconds);
        self.clock = self.shifted(seconds)?;
        self.cycle_hours += seconds / 3600.0;
        self.driving_hours_since_rest += seconds / 3600.0;
        Ok(())
    }

    /// On duty, not driving.
    pub fn advance_stationary(&mut self, duration_minutes: u32) -> Result<(), ClockOverflow> {
        self.clock = self.shifted(f64::from(duration_minutes) * 60.0)?;
        self.cycle_hours += f64::from(duration_minutes) / 60.0;
        Ok(())
    }

    /// Take a rest break of `hours`, clearing the driving counter.
    pub fn take_rest(&mut self, hours: f64) -> Result<(), ClockOverflow> {
        let minutes = (sanitize(hours) * 60.0).round() as u32;
        self.advance_stationary(minutes)?;
        self.driving_hours_since_rest = 0.0;
        Ok(())
    }

    fn shifted(&self, seconds: f64) -> Result<DateTime<Utc>, ClockOverflow> {
        let overflow = || ClockOverflow {
            from: self.clock,
            seconds,
        };
        let millis = (seconds * 1000.0).round();
        if millis >= i64::MAX as f64 {
            return Err(overflow());
        }
        self.clock
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or_else(overflow)
    }

    pub fn exceeds(&self, threshold_hours: f64) -> bool {
        self.cycle_hours >= threshold_hours
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_driving_advances_clock_and_hours() {
        let mut clock = DutyClock::new(10.0, start());
        clock.advance_driving(5400.0).unwrap();

        assert_eq!(clock.clock(), start() + Duration::minutes(90));
        assert!((clock.cycle_hours() - 11.5).abs() < 1e-9);
        assert!((clock.driving_hours_since_rest() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_stationary_time_is_not_driving() {
        let mut clock = DutyClock::new(0.0, start());
        clock.advance_stationary(60).unwrap();

        assert_eq!(clock.clock(), start() + Duration::hours(1));
        assert!((clock.cycle_hours() - 1.0).abs() < 1e-9);
        assert_eq!(clock.driving_hours_since_rest(), 0.0);
    }

    #[test]
    fn test_rest_resets_driving_counter() {
        let mut clock = DutyClock::new(0.0, start());
        clock.advance_driving(11.0 * 3600.0).unwrap();
        clock.take_rest(10.0).unwrap();

        assert_eq!(clock.driving_hours_since_rest(), 0.0);
        assert_eq!(clock.clock(), start() + Duration::hours(21));
        assert!((clock.cycle_hours() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_exceeds_is_inclusive() {
        let clock = DutyClock::new(11.0, start());
        assert!(clock.exceeds(11.0));
        assert!(!clock.exceeds(11.5));
    }

    #[test]
    fn test_negative_duration_is_ignored() {
        let mut clock = DutyClock::new(3.0, start());
        clock.advance_driving(-120.0).unwrap();
        clock.advance_driving(f64::NAN).unwrap();

        assert_eq!(clock.clock(), start());
        assert_eq!(clock.cycle_hours(), 3.0);
    }

    #[test]
    fn test_enormous_duration_is_an_error_not_a_panic() {
        let mut clock = DutyClock::new(3.0, start());

        let err = clock.advance_driving(1e18).unwrap_err();
        assert_eq!(err.from, start());
        assert!(clock.advance_driving(f64::MAX).is_err());

        assert_eq!(clock.clock(), start());
        assert_eq!(clock.cycle_hours(), 3.0);
        assert_eq!(clock.driving_hours_since_rest(), 0.0);
    }
}
