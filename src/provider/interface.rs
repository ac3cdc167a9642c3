//! Location provider trait and subscription options

use crate::core::{Authorization, DesiredAccuracy, LocationFix, WatchId};
use crate::core::{MIN_RANGE_UPDATE_M, MIN_TIME_UPDATE_MS};
use crate::provider::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by the asynchronous provider queries
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback the provider invokes for every event of a subscription
pub type FixSink = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

/// Event delivered through a subscription
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// A new location sample
    Fix(LocationFix),
    /// The platform reported a failure for this subscription
    Error(ProviderError),
}

/// Contract a platform location binding fulfils
///
/// `subscribe` may call the sink from any thread, at any time until
/// `unsubscribe` returns, and possibly once more after that.
pub trait LocationProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Best-effort cached fix lookup
    fn last_known_fix(&self) -> ProviderFuture<'_, ProviderResult<Option<LocationFix>>>;

    /// Whether location services are enabled and access is granted
    fn is_enabled(&self) -> ProviderFuture<'_, bool>;

    /// Whether a provider of the given accuracy tier is usable
    ///
    /// Bindings without separate fine and coarse providers keep the default,
    /// which answers with the loosest check.
    fn is_enabled_for(&self, accuracy: DesiredAccuracy) -> ProviderFuture<'_, bool> {
        let _ = accuracy;
        self.is_enabled()
    }

    /// Prompt the user for location access
    fn request_authorization(&self, always: bool) -> ProviderFuture<'_, ProviderResult<Authorization>>;

    /// Begin delivering events for `id` to `sink`
    fn subscribe(&self, id: WatchId, options: &SubscriptionOptions, sink: FixSink) -> ProviderResult<()>;

    /// Stop delivering events for `id`; unknown ids are ignored
    fn unsubscribe(&self, id: WatchId);
}

/// Provider-facing subscription parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOptions {
    /// Fine or coarse provider
    pub accuracy: DesiredAccuracy,
    /// Distance filter (meters)
    pub update_distance_m: f64,
    /// Interval between updates (milliseconds)
    pub update_time_ms: u64,
    /// Minimum interval between updates (milliseconds)
    pub minimum_update_time_ms: u64,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            accuracy: DesiredAccuracy::High,
            update_distance_m: MIN_RANGE_UPDATE_M,
            update_time_ms: MIN_TIME_UPDATE_MS,
            minimum_update_time_ms: MIN_TIME_UPDATE_MS,
        }
    }
}

impl SubscriptionOptions {
    /// Effective delivery interval, the tighter of the two update bounds
    pub fn interval_ms(&self) -> u64 {
        self.update_time_ms.min(self.minimum_update_time_ms)
    }
}
