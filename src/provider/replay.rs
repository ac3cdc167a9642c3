//! Provider that replays a recorded track
//!
//! Each subscription gets its own tokio task walking the track at the
//! subscription's update interval. Fixes are restamped with the delivery time
//! so staleness checks behave as they would against a live receiver.

use crate::core::{Authorization, LocationFix, WatchId};
use crate::provider::interface::SubscriptionOptions;
use crate::provider::{
    FixSink, LocationProvider, ProviderError, ProviderEvent, ProviderFuture, ProviderResult,
};
use crate::utils::config::ConfigError;
use chrono::Utc;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Replays a fixed sequence of fixes
pub struct ReplayProvider {
    name: String,
    track: Arc<Vec<LocationFix>>,
    repeat: bool,
    enabled: AtomicBool,
    last_delivered: Arc<Mutex<Option<LocationFix>>>,
    tasks: Mutex<HashMap<WatchId, JoinHandle<()>>>,
}

impl ReplayProvider {
    pub fn new(name: impl Into<String>, track: Vec<LocationFix>) -> Self {
        Self {
            name: name.into(),
            track: Arc::new(track),
            repeat: false,
            enabled: AtomicBool::new(true),
            last_delivered: Arc::new(Mutex::new(None)),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Load a JSON array of fixes
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read track file '{}': {}", path_str, e),
        })?;

        let track: Vec<LocationFix> = serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse track file '{}': {}", path_str, e),
        })?;

        Ok(Self::new(path_str, track))
    }

    /// Start over from the first fix once the track is exhausted
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn track_len(&self) -> usize {
        self.track.len()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<WatchId, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationProvider for ReplayProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_known_fix(&self) -> ProviderFuture<'_, ProviderResult<Option<LocationFix>>> {
        Box::pin(async move {
            let last = self.last_delivered.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(last.clone())
        })
    }

    fn is_enabled(&self) -> ProviderFuture<'_, bool> {
        Box::pin(async move { self.enabled.load(Ordering::SeqCst) && !self.track.is_empty() })
    }

    fn request_authorization(&self, _always: bool) -> ProviderFuture<'_, ProviderResult<Authorization>> {
        // nothing to prompt for on a recorded track
        Box::pin(async move {
            self.enabled.store(true, Ordering::SeqCst);
            Ok(Authorization::AuthorizedAlways)
        })
    }

    fn subscribe(&self, id: WatchId, options: &SubscriptionOptions, sink: FixSink) -> ProviderResult<()> {
        if self.track.is_empty() {
            return Err(ProviderError::Unavailable { provider: self.name.clone() });
        }

        let runtime = Handle::try_current()
            .map_err(|e| ProviderError::platform(format!("no async runtime to replay on: {}", e)))?;

        let track = self.track.clone();
        let last_delivered = self.last_delivered.clone();
        let interval = Duration::from_millis(options.interval_ms().max(1));
        let repeat = self.repeat;

        debug!("{}: replaying {} fixes every {:?} for {}", self.name, track.len(), interval, id);

        let task = runtime.spawn(async move {
            loop {
                for recorded in track.iter() {
                    let mut fix = recorded.clone();
                    fix.timestamp = Utc::now();
                    *last_delivered.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix.clone());
                    sink(ProviderEvent::Fix(fix));
                    tokio::time::sleep(interval).await;
                }
                if !repeat {
                    break;
                }
            }
        });

        if let Some(previous) = self.tasks().insert(id, task) {
            previous.abort();
        }
        Ok(())
    }

    fn unsubscribe(&self, id: WatchId) {
        if let Some(task) = self.tasks().remove(&id) {
            debug!("{}: stopped replay for {}", self.name, id);
            task.abort();
        }
    }
}

impl Drop for ReplayProvider {
    fn drop(&mut self) {
        for (_, task) in self.tasks().drain() {
            task.abort();
        }
    }
}
