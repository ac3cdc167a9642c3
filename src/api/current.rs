//! Current-location acquisition policy
//!
//! Decides between serving the provider's cached fix and racing a live
//! subscription against a timeout. Each call is a single-shot state machine:
//! exactly one outcome is produced, and the subscription it registers is
//! deregistered exactly once on every exit path.

use crate::api::types::{AcquisitionRequest, GeoError, GeoResult};
use crate::api::watch::WatchRegistry;
use crate::core::{LocationFix, WatchId};
use crate::provider::{FixSink, LocationProvider, ProviderEvent};
use crate::utils::config::GeolocationConfig;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Accept or reject a fix against an optional maximum age
pub fn check_freshness(fix: LocationFix, maximum_age_ms: Option<u64>) -> GeoResult<LocationFix> {
    let maximum_age_ms = match maximum_age_ms {
        Some(maximum_age_ms) => maximum_age_ms,
        None => return Ok(fix),
    };

    let now = Utc::now();
    if fix.is_fresh_at(maximum_age_ms, now) {
        Ok(fix)
    } else {
        let age_ms = fix.age_ms_at(now);
        warn!("rejecting fix {} ms old (maximum age {} ms)", age_ms, maximum_age_ms);
        Err(GeoError::StaleLocation { age_ms, maximum_age_ms })
    }
}

/// Deregisters its subscription when cancelled or dropped, whichever is first
struct ActiveSubscription<'a> {
    provider: &'a dyn LocationProvider,
    id: WatchId,
    cancelled: bool,
}

impl<'a> ActiveSubscription<'a> {
    fn new(provider: &'a dyn LocationProvider, id: WatchId) -> Self {
        Self { provider, id, cancelled: false }
    }

    fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.provider.unsubscribe(self.id);
            debug!("unsubscribed {}", self.id);
        }
    }
}

impl Drop for ActiveSubscription<'_> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// First-event-wins guard shared between the provider sink and the waiter
#[derive(Clone)]
struct SettleGuard {
    sender: Arc<Mutex<Option<oneshot::Sender<ProviderEvent>>>>,
}

impl SettleGuard {
    fn new() -> (Self, oneshot::Receiver<ProviderEvent>) {
        let (sender, receiver) = oneshot::channel();
        let guard = Self {
            sender: Arc::new(Mutex::new(Some(sender))),
        };
        (guard, receiver)
    }

    /// Takes the sender; only the first caller gets it
    fn take(&self) -> Option<oneshot::Sender<ProviderEvent>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Deliver `event` if the request has not settled yet
    fn settle(&self, event: ProviderEvent) -> bool {
        match self.take() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }
}

/// Acquisition policy over one provider
pub struct AcquisitionPolicy<'a> {
    provider: &'a dyn LocationProvider,
    ids: &'a WatchRegistry,
    config: &'a GeolocationConfig,
}

impl<'a> AcquisitionPolicy<'a> {
    pub fn new(provider: &'a dyn LocationProvider, ids: &'a WatchRegistry, config: &'a GeolocationConfig) -> Self {
        Self { provider, ids, config }
    }

    /// Resolve one fix for `request`
    pub async fn get_current_location(&self, request: &AcquisitionRequest) -> GeoResult<LocationFix> {
        request.validate()?;

        if request.is_cached_only() {
            self.cached_fix(request).await
        } else {
            self.ensure_enabled().await?;
            self.live_fix(request).await
        }
    }

    async fn cached_fix(&self, request: &AcquisitionRequest) -> GeoResult<LocationFix> {
        match self.provider.last_known_fix().await? {
            Some(fix) => check_freshness(fix, request.maximum_age_ms),
            None => Err(GeoError::NoCachedLocation),
        }
    }

    async fn live_fix(&self, request: &AcquisitionRequest) -> GeoResult<LocationFix> {
        let timeout_ms = request.effective_timeout_ms(self.config);
        let options = request.subscription_options(self.config);
        let id = self.ids.allocate()?;

        let (guard, receiver) = SettleGuard::new();
        let sink_guard = guard.clone();
        let sink: FixSink = Arc::new(move |event| {
            if !sink_guard.settle(event) {
                debug!("ignoring event for settled request {}", id);
            }
        });

        let mut subscription = ActiveSubscription::new(self.provider, id);
        debug!("subscribing {} on '{}' with timeout {} ms", id, self.provider.name(), timeout_ms);
        if let Err(error) = self.provider.subscribe(id, &options, sink) {
            warn!("subscription {} failed: {}", id, error);
            return Err(GeoError::Provider(error));
        }

        // `guard` keeps the sender alive, so only an event or the timer ends the wait
        let event = tokio::time::timeout(Duration::from_millis(timeout_ms), receiver)
            .await
            .ok()
            .and_then(Result::ok);

        drop(guard.take());
        subscription.cancel();

        match event {
            Some(ProviderEvent::Fix(fix)) => check_freshness(fix, request.maximum_age_ms),
            Some(ProviderEvent::Error(error)) => Err(GeoError::Provider(error)),
            None => {
                warn!("no location within {} ms for {}", timeout_ms, id);
                Err(GeoError::AcquisitionTimeout { timeout_ms })
            }
        }
    }

    /// Location gate of the live path
    pub async fn ensure_enabled(&self) -> GeoResult<()> {
        if self.provider.is_enabled().await {
            return Ok(());
        }
        if !self.config.prompt_for_authorization {
            return Err(GeoError::ServiceDisabled);
        }
        self.request_access(false).await
    }

    /// Ask for access unless location is already usable
    pub async fn enable_location_request(&self, always: bool) -> GeoResult<()> {
        if self.provider.is_enabled().await {
            return Ok(());
        }
        self.request_access(always).await
    }

    async fn request_access(&self, always: bool) -> GeoResult<()> {
        let status = self.provider.request_authorization(always).await?;
        info!("authorization outcome on '{}': {:?}", self.provider.name(), status);

        if status.satisfies(always) && self.provider.is_enabled().await {
            Ok(())
        } else {
            Err(GeoError::ServiceDisabled)
        }
    }
}
