//! Core data types for the geolocation layer

use crate::core::constants::{ANY_ACCURACY_M, HIGH_ACCURACY_M};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reported location sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude above sea level (meters), if the provider reports one
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius (meters)
    pub horizontal_accuracy: f64,
    /// Vertical accuracy (meters)
    pub vertical_accuracy: f64,
    /// Speed over ground (m/s)
    pub speed: Option<f64>,
    /// Course in degrees
    pub direction: Option<f64>,
    /// Time at which the fix was determined
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy: 0.0,
            vertical_accuracy: 0.0,
            speed: None,
            direction: None,
            timestamp,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_accuracy = horizontal;
        self.vertical_accuracy = vertical;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_direction(mut self, direction: f64) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Age of the fix relative to `now` in milliseconds, clamped at zero
    pub fn age_ms_at(&self, now: DateTime<Utc>) -> u64 {
        let age = now.signed_duration_since(self.timestamp).num_milliseconds();
        age.max(0) as u64
    }

    /// A fix is fresh while `timestamp + maximum_age` is still in the future
    pub fn is_fresh_at(&self, maximum_age_ms: u64, now: DateTime<Utc>) -> bool {
        let maximum_age = chrono::Duration::milliseconds(maximum_age_ms.min(i64::MAX as u64) as i64);
        match self.timestamp.checked_add_signed(maximum_age) {
            Some(expiry) => expiry > now,
            None => true,
        }
    }
}

/// Coarse/fine hint passed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredAccuracy {
    /// Fine provider (GPS), ~3 m
    High,
    /// Coarse provider (network), ~300 m
    Any,
}

impl DesiredAccuracy {
    pub fn from_meters(meters: f64) -> Self {
        if meters <= HIGH_ACCURACY_M {
            DesiredAccuracy::High
        } else {
            DesiredAccuracy::Any
        }
    }

    pub fn meters(&self) -> f64 {
        match self {
            DesiredAccuracy::High => HIGH_ACCURACY_M,
            DesiredAccuracy::Any => ANY_ACCURACY_M,
        }
    }
}

impl Default for DesiredAccuracy {
    fn default() -> Self {
        DesiredAccuracy::High
    }
}

/// Subscription handle returned by `watch_location`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchId(u32);

impl WatchId {
    pub(crate) fn new(id: u32) -> Self {
        WatchId(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Location permission state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl Authorization {
    pub fn is_granted(&self) -> bool {
        matches!(self, Authorization::AuthorizedWhenInUse | Authorization::AuthorizedAlways)
    }

    /// Whether this state satisfies a request for "always" or "when in use" access
    pub fn satisfies(&self, always: bool) -> bool {
        match self {
            Authorization::AuthorizedAlways => true,
            Authorization::AuthorizedWhenInUse => !always,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fix_at(timestamp: DateTime<Utc>) -> LocationFix {
        LocationFix::new(42.6977, 23.3219, timestamp)
    }

    #[test]
    fn test_freshness_boundary_is_stale() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let fix = fix_at(now - Duration::milliseconds(5000));

        assert!(!fix.is_fresh_at(5000, now));
        assert!(fix.is_fresh_at(5001, now));
    }

    #[test]
    fn test_freshness_examples() {
        let now = Utc::now();
        assert!(fix_at(now - Duration::milliseconds(3000)).is_fresh_at(5000, now));
        assert!(!fix_at(now - Duration::milliseconds(8000)).is_fresh_at(5000, now));
    }

    #[test]
    fn test_future_fix_has_zero_age() {
        let now = Utc::now();
        let fix = fix_at(now + Duration::seconds(2));
        assert_eq!(fix.age_ms_at(now), 0);
        assert!(fix.is_fresh_at(0, now));
    }

    #[test]
    fn test_accuracy_from_meters() {
        assert_eq!(DesiredAccuracy::from_meters(1.0), DesiredAccuracy::High);
        assert_eq!(DesiredAccuracy::from_meters(3.0), DesiredAccuracy::High);
        assert_eq!(DesiredAccuracy::from_meters(100.0), DesiredAccuracy::Any);
        assert_eq!(DesiredAccuracy::Any.meters(), 300.0);
    }

    #[test]
    fn test_authorization_satisfies() {
        assert!(Authorization::AuthorizedAlways.satisfies(true));
        assert!(Authorization::AuthorizedAlways.satisfies(false));
        assert!(Authorization::AuthorizedWhenInUse.satisfies(false));
        assert!(!Authorization::AuthorizedWhenInUse.satisfies(true));
        assert!(!Authorization::Denied.satisfies(false));
        assert!(!Authorization::NotDetermined.is_granted());
    }

    #[test]
    fn test_fix_serialization() {
        let fix = fix_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .with_altitude(550.0)
            .with_speed(1.5)
            .with_direction(270.0);
        let json = serde_json::to_string(&fix).unwrap();
        assert!(json.contains(r#""direction":270.0"#));
        let back: LocationFix = serde_json::from_str(&json).unwrap();
        assert_eq!(fix, back);
        assert_eq!(back.direction, Some(270.0));
    }
}
