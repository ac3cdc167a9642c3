//! Watch registry for continuous location updates
//!
//! The registry owns the handle counter and the set of live watches. Handles
//! come from one strictly increasing counter shared with the single-shot
//! subscriptions of `get_current_location`, so an id is never reused.

use crate::api::types::{GeoError, GeoResult};
use crate::core::{LocationFix, WatchId};
use crate::provider::interface::SubscriptionOptions;
use crate::provider::{FixSink, LocationProvider, ProviderEvent};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback for every fix delivered to a watch
pub type FixCallback = Arc<dyn Fn(LocationFix) + Send + Sync>;

/// Callback for asynchronous failures of a watch
pub type ErrorCallback = Arc<dyn Fn(GeoError) + Send + Sync>;

/// Owned mapping of live watches
pub struct WatchRegistry {
    /// Last handle handed out
    counter: AtomicU32,
    /// Live watches and the flag their sink checks before forwarding
    watches: Mutex<HashMap<WatchId, Arc<AtomicBool>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
            watches: Mutex::new(HashMap::new()),
        }
    }

    fn watches(&self) -> MutexGuard<'_, HashMap<WatchId, Arc<AtomicBool>>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next subscription handle
    ///
    /// The counter never wraps; once `u32::MAX` has been handed out every
    /// further call fails with `HandlesExhausted`.
    pub fn allocate(&self) -> GeoResult<WatchId> {
        self.counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| WatchId::new(last + 1))
            .map_err(|_| GeoError::HandlesExhausted)
    }

    /// Register a watch and subscribe it with the provider
    ///
    /// On a registration error the watch is removed again, `on_error` is
    /// invoked and the error is returned. Running out of handles is reported
    /// the same way.
    pub fn watch(
        &self,
        provider: &dyn LocationProvider,
        options: &SubscriptionOptions,
        on_fix: FixCallback,
        on_error: ErrorCallback,
    ) -> GeoResult<WatchId> {
        let id = match self.allocate() {
            Ok(id) => id,
            Err(error) => {
                on_error(error.clone());
                return Err(error);
            }
        };
        let active = Arc::new(AtomicBool::new(true));
        self.watches().insert(id, active.clone());

        let forward_error = on_error.clone();
        let sink: FixSink = Arc::new(move |event| {
            if !active.load(Ordering::SeqCst) {
                debug!("dropping event for cleared {}", id);
                return;
            }
            match event {
                ProviderEvent::Fix(fix) => on_fix(fix),
                ProviderEvent::Error(error) => forward_error(GeoError::Provider(error)),
            }
        });

        if let Err(error) = provider.subscribe(id, options, sink) {
            self.clear(provider, id);
            let error = GeoError::Provider(error);
            on_error(error.clone());
            return Err(error);
        }

        info!("{} started on provider '{}'", id, provider.name());
        Ok(id)
    }

    /// Deregister a watch; unknown or already cleared ids are ignored
    pub fn clear(&self, provider: &dyn LocationProvider, id: WatchId) {
        let removed = self.watches().remove(&id);
        if let Some(active) = removed {
            active.store(false, Ordering::SeqCst);
            provider.unsubscribe(id);
            info!("{} cleared", id);
        }
    }

    /// Deregister every live watch
    pub fn clear_all(&self, provider: &dyn LocationProvider) {
        let drained: Vec<(WatchId, Arc<AtomicBool>)> = self.watches().drain().collect();
        for (id, active) in drained {
            active.store(false, Ordering::SeqCst);
            provider.unsubscribe(id);
        }
    }

    pub fn is_active(&self, id: WatchId) -> bool {
        self.watches().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.watches().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
