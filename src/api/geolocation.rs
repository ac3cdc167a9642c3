//! Uniform geolocation API over a platform provider
//!
//! `Geolocation` is cheap to clone; clones share the provider, the
//! configuration and the watch registry. When the last clone is dropped every
//! remaining watch is deregistered.

use crate::algorithms::distance;
use crate::api::current::AcquisitionPolicy;
use crate::api::types::{AcquisitionRequest, GeoError, GeoResult};
use crate::api::watch::{ErrorCallback, FixCallback, WatchRegistry};
use crate::core::{DesiredAccuracy, LocationFix, WatchId};
use crate::provider::LocationProvider;
use crate::utils::config::{ConfigError, GeolocationConfig};
use std::sync::Arc;

struct Shared {
    provider: Arc<dyn LocationProvider>,
    config: GeolocationConfig,
    watches: WatchRegistry,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.watches.clear_all(self.provider.as_ref());
    }
}

/// Entry point of the crate
#[derive(Clone)]
pub struct Geolocation {
    shared: Arc<Shared>,
}

impl Geolocation {
    /// Create the API with default configuration
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::build(provider, GeolocationConfig::default())
    }

    /// Create the API with a validated configuration
    pub fn with_config(provider: Arc<dyn LocationProvider>, config: GeolocationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(provider, config))
    }

    fn build(provider: Arc<dyn LocationProvider>, config: GeolocationConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                config,
                watches: WatchRegistry::new(),
            }),
        }
    }

    fn policy(&self) -> AcquisitionPolicy<'_> {
        AcquisitionPolicy::new(self.shared.provider.as_ref(), &self.shared.watches, &self.shared.config)
    }

    /// Resolve the current location
    ///
    /// `timeout_ms == Some(0)` serves the provider's cached fix only;
    /// otherwise a live fix is awaited for at most the timeout.
    pub async fn get_current_location(&self, request: &AcquisitionRequest) -> GeoResult<LocationFix> {
        self.policy().get_current_location(request).await
    }

    /// Start continuous updates; every fix goes to `on_fix`
    ///
    /// Failures to start the watch are returned and also reported to
    /// `on_error`. Invalid request options are only returned.
    pub async fn watch_location<F, E>(&self, on_fix: F, on_error: E, request: &AcquisitionRequest) -> GeoResult<WatchId>
    where
        F: Fn(LocationFix) + Send + Sync + 'static,
        E: Fn(GeoError) + Send + Sync + 'static,
    {
        request.validate()?;
        if let Err(error) = self.policy().ensure_enabled().await {
            on_error(error.clone());
            return Err(error);
        }

        let on_fix: FixCallback = Arc::new(on_fix);
        let on_error: ErrorCallback = Arc::new(on_error);
        let options = request.subscription_options(&self.shared.config);

        self.shared
            .watches
            .watch(self.shared.provider.as_ref(), &options, on_fix, on_error)
    }

    /// Stop a watch; unknown ids are ignored
    pub fn clear_watch(&self, id: WatchId) {
        self.shared.watches.clear(self.shared.provider.as_ref(), id);
    }

    /// Stop every watch started through this instance
    pub fn clear_all_watches(&self) {
        self.shared.watches.clear_all(self.shared.provider.as_ref());
    }

    pub fn active_watches(&self) -> usize {
        self.shared.watches.len()
    }

    /// Ask for location access; `always` requests background access
    pub async fn enable_location_request(&self, always: bool) -> GeoResult<()> {
        self.policy().enable_location_request(always).await
    }

    /// Whether location services are enabled and access is granted
    ///
    /// Without an accuracy tier any usable provider counts.
    pub async fn is_enabled(&self, accuracy: Option<DesiredAccuracy>) -> bool {
        match accuracy {
            Some(accuracy) => self.shared.provider.is_enabled_for(accuracy).await,
            None => self.shared.provider.is_enabled().await,
        }
    }

    /// Distance between two fixes in meters
    pub fn distance(&self, from: &LocationFix, to: &LocationFix) -> f64 {
        distance(from, to)
    }

    pub fn config(&self) -> &GeolocationConfig {
        &self.shared.config
    }

    pub fn provider_name(&self) -> &str {
        self.shared.provider.name()
    }
}
