//! Plugin defaults and geodetic constants

/// Default bound for a live `get_current_location` wait (5 minutes)
pub const DEFAULT_GET_LOCATION_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Default minimum distance between updates (meters)
pub const MIN_RANGE_UPDATE_M: f64 = 0.1;

/// Default minimum time between updates (1 minute)
pub const MIN_TIME_UPDATE_MS: u64 = 60 * 1000;

/// Accuracy radius below which the fine provider is requested (meters)
pub const HIGH_ACCURACY_M: f64 = 3.0;

/// Accuracy radius reported for the coarse provider (meters)
pub const ANY_ACCURACY_M: f64 = 300.0;

/// Semi-major axis (WGS84, meters)
pub const EARTH_RADIUS_WGS84: f64 = 6378137.0;

/// Flattening (WGS84)
pub const EARTH_FLATTENING_WGS84: f64 = 1.0 / 298.257223563;

/// Mean earth radius used by the spherical fallback (meters)
pub const EARTH_MEAN_RADIUS_M: f64 = 6371008.8;
