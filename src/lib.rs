//! Cross-platform geolocation
//!
//! A uniform API (`get_current_location`, `watch_location`, `clear_watch`,
//! `enable_location_request`, `is_enabled`, `distance`) over a platform
//! location provider. Platform bindings implement [`LocationProvider`];
//! this crate owns option normalization, the cached-versus-live acquisition
//! policy with its timeout race, and the watch registry.

pub mod core;
pub mod algorithms;
pub mod provider;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Authorization, DesiredAccuracy, LocationFix, WatchId};
pub use algorithms::distance;
pub use provider::{
    FixSink, LocationProvider, MockProvider, ProviderError, ProviderEvent, ProviderFuture, ProviderResult,
    ReplayProvider,
};
pub use provider::interface::SubscriptionOptions;
pub use utils::{ConfigError, GeolocationConfig};
pub use api::{AcquisitionRequest, GeoError, GeoResult, Geolocation};
