//! Common API types and data structures

use crate::core::DesiredAccuracy;
use crate::provider::interface::SubscriptionOptions;
use crate::provider::ProviderError;
use crate::utils::config::GeolocationConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for API operations
pub type GeoResult<T> = Result<T, GeoError>;

/// Ways a location request can fail
///
/// All kinds are terminal; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// `timeout_ms == 0` and the provider has no cached fix
    #[error("there is no last known location")]
    NoCachedLocation,
    /// The fix is older than the requested `maximum_age_ms`
    #[error("location is {age_ms} ms old, maximum age is {maximum_age_ms} ms")]
    StaleLocation { age_ms: u64, maximum_age_ms: u64 },
    /// Location services are off or access was not granted
    #[error("location service is not enabled or using it is not granted")]
    ServiceDisabled,
    /// No fix arrived before the timeout
    #[error("timeout while searching for location after {timeout_ms} ms")]
    AcquisitionTimeout { timeout_ms: u64 },
    /// Platform failure, message passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Every subscription handle of this instance has been handed out
    #[error("no subscription handles left")]
    HandlesExhausted,
    /// Request options that no provider could honour
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

/// Options for one `get_current_location` or `watch_location` call
///
/// Every field is optional; unset fields fall back to [`GeolocationConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    /// Fine or coarse provider
    pub desired_accuracy: Option<DesiredAccuracy>,
    /// Distance filter between updates (meters)
    pub update_distance_m: Option<f64>,
    /// Interval between updates (milliseconds)
    pub update_time_ms: Option<u64>,
    /// Minimum interval between updates (milliseconds)
    pub minimum_update_time_ms: Option<u64>,
    /// Oldest acceptable fix (milliseconds); `None` accepts any age
    pub maximum_age_ms: Option<u64>,
    /// How long to wait for a live fix; `Some(0)` serves the cached fix only
    pub timeout_ms: Option<u64>,
}

impl AcquisitionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accuracy(mut self, accuracy: DesiredAccuracy) -> Self {
        self.desired_accuracy = Some(accuracy);
        self
    }

    pub fn with_update_distance(mut self, meters: f64) -> Self {
        self.update_distance_m = Some(meters);
        self
    }

    pub fn with_update_time(mut self, update_time_ms: u64) -> Self {
        self.update_time_ms = Some(update_time_ms);
        self
    }

    pub fn with_minimum_update_time(mut self, minimum_update_time_ms: u64) -> Self {
        self.minimum_update_time_ms = Some(minimum_update_time_ms);
        self
    }

    pub fn with_maximum_age(mut self, maximum_age_ms: u64) -> Self {
        self.maximum_age_ms = Some(maximum_age_ms);
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Only the last known fix may be returned
    pub fn is_cached_only(&self) -> bool {
        self.timeout_ms == Some(0)
    }

    /// Timeout for the live path
    pub fn effective_timeout_ms(&self, config: &GeolocationConfig) -> u64 {
        self.timeout_ms.unwrap_or(config.default_timeout_ms)
    }

    pub fn validate(&self) -> GeoResult<()> {
        if let Some(distance) = self.update_distance_m {
            if !distance.is_finite() || distance < 0.0 {
                return Err(GeoError::InvalidRequest {
                    reason: format!("update_distance_m must be a non-negative number, got {}", distance),
                });
            }
        }
        Ok(())
    }

    /// Resolve the provider hints against configured defaults
    pub fn subscription_options(&self, config: &GeolocationConfig) -> SubscriptionOptions {
        let minimum_update_time_ms = self.minimum_update_time_ms.unwrap_or(config.minimum_update_time_ms);
        SubscriptionOptions {
            accuracy: self.desired_accuracy.unwrap_or(config.default_accuracy),
            update_distance_m: self.update_distance_m.unwrap_or(config.update_distance_m),
            update_time_ms: self.update_time_ms.unwrap_or(config.update_time_ms),
            minimum_update_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_uses_config() {
        let config = GeolocationConfig::default();
        let request = AcquisitionRequest::new();

        assert!(!request.is_cached_only());
        assert_eq!(request.effective_timeout_ms(&config), 5 * 60 * 1000);

        let options = request.subscription_options(&config);
        assert_eq!(options.accuracy, DesiredAccuracy::High);
        assert_eq!(options.update_distance_m, 0.1);
        assert_eq!(options.minimum_update_time_ms, 60_000);
        assert_eq!(options.update_time_ms, 60_000);
    }

    #[test]
    fn test_request_overrides() {
        let config = GeolocationConfig::default();
        let request = AcquisitionRequest::new()
            .with_accuracy(DesiredAccuracy::Any)
            .with_update_distance(25.0)
            .with_update_time(500)
            .with_minimum_update_time(100)
            .with_timeout(0);

        assert!(request.is_cached_only());
        let options = request.subscription_options(&config);
        assert_eq!(options.accuracy, DesiredAccuracy::Any);
        assert_eq!(options.update_distance_m, 25.0);
        assert_eq!(options.update_time_ms, 500);
        assert_eq!(options.minimum_update_time_ms, 100);
        assert_eq!(options.interval_ms(), 100);
    }

    #[test]
    fn test_negative_distance_is_rejected() {
        let request = AcquisitionRequest::new().with_update_distance(-1.0);
        assert!(matches!(request.validate(), Err(GeoError::InvalidRequest { .. })));
        assert!(AcquisitionRequest::new().with_update_distance(f64::NAN).validate().is_err());
        assert!(AcquisitionRequest::new().validate().is_ok());
    }

    #[test]
    fn test_provider_error_message_passes_through() {
        let error: GeoError = ProviderError::platform("Provider gps is disabled").into();
        assert_eq!(error.to_string(), "Provider gps is disabled");
    }

    #[test]
    fn test_request_from_json() {
        let request: AcquisitionRequest =
            serde_json::from_str(r#"{"desired_accuracy":"any","maximum_age_ms":5000,"timeout_ms":0}"#).unwrap();
        assert_eq!(request.desired_accuracy, Some(DesiredAccuracy::Any));
        assert_eq!(request.maximum_age_ms, Some(5000));
        assert!(request.is_cached_only());
    }
}
