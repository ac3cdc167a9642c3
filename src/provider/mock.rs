//! Scriptable provider for tests and development

use crate::core::{Authorization, DesiredAccuracy, LocationFix, WatchId};
use crate::provider::{
    FixSink, LocationProvider, ProviderError, ProviderEvent, ProviderFuture, ProviderResult,
};
use crate::provider::interface::SubscriptionOptions;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct MockState {
    enabled: bool,
    fine_available: bool,
    authorization_response: ProviderResult<Authorization>,
    enable_when_granted: bool,
    last_known: Option<LocationFix>,
    last_known_error: Option<ProviderError>,
    subscribe_error: Option<(ProviderError, bool)>,
    fix_on_subscribe: Option<LocationFix>,
    active: HashMap<WatchId, FixSink>,
    retired: HashMap<WatchId, FixSink>,
    subscribed_options: Vec<SubscriptionOptions>,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
    authorization_requests: usize,
    last_known_queries: usize,
}

/// In-memory provider whose behaviour is scripted by the test
///
/// Sinks of removed subscriptions are retained so a test can simulate a
/// platform that delivers one more event after deregistration.
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    /// Create an enabled mock provider with no cached fix
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                enabled: true,
                fine_available: true,
                authorization_response: Ok(Authorization::AuthorizedWhenInUse),
                enable_when_granted: true,
                last_known: None,
                last_known_error: None,
                subscribe_error: None,
                fix_on_subscribe: None,
                active: HashMap::new(),
                retired: HashMap::new(),
                subscribed_options: Vec::new(),
                subscribe_calls: 0,
                unsubscribe_calls: 0,
                authorization_requests: 0,
                last_known_queries: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }

    /// With `false` only the coarse provider answers as enabled
    pub fn set_fine_available(&self, available: bool) {
        self.state().fine_available = available;
    }

    /// Outcome of the next authorization prompts
    pub fn set_authorization_response(&self, response: ProviderResult<Authorization>) {
        self.state().authorization_response = response;
    }

    /// Whether a granted authorization also turns the service on
    pub fn enable_when_granted(&self, enable: bool) {
        self.state().enable_when_granted = enable;
    }

    pub fn set_last_known(&self, fix: Option<LocationFix>) {
        self.state().last_known = fix;
    }

    pub fn fail_last_known(&self, error: ProviderError) {
        self.state().last_known_error = Some(error);
    }

    /// Make the next `subscribe` fail; with `partial` the listener is
    /// registered before the error is raised
    pub fn fail_next_subscribe(&self, error: ProviderError, partial: bool) {
        self.state().subscribe_error = Some((error, partial));
    }

    /// Deliver `fix` synchronously from inside every `subscribe`
    pub fn deliver_on_subscribe(&self, fix: Option<LocationFix>) {
        self.state().fix_on_subscribe = fix;
    }

    /// Deliver an event to every active subscription, returns how many received it
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let sinks: Vec<FixSink> = self.state().active.values().cloned().collect();
        for sink in &sinks {
            sink(event.clone());
        }
        sinks.len()
    }

    pub fn emit_fix(&self, fix: LocationFix) -> usize {
        self.emit(ProviderEvent::Fix(fix))
    }

    /// Deliver an event to one active subscription
    pub fn emit_to(&self, id: WatchId, event: ProviderEvent) -> bool {
        let sink = self.state().active.get(&id).cloned();
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    /// Deliver an event through a sink that was already unsubscribed
    pub fn emit_late(&self, id: WatchId, event: ProviderEvent) -> bool {
        let sink = self.state().retired.get(&id).cloned();
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    pub fn active_subscriptions(&self) -> Vec<WatchId> {
        let mut ids: Vec<WatchId> = self.state().active.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state().subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.state().unsubscribe_calls
    }

    pub fn authorization_requests(&self) -> usize {
        self.state().authorization_requests
    }

    pub fn last_known_queries(&self) -> usize {
        self.state().last_known_queries
    }

    /// Options passed to the most recent `subscribe`
    pub fn last_options(&self) -> Option<SubscriptionOptions> {
        self.state().subscribed_options.last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn last_known_fix(&self) -> ProviderFuture<'_, ProviderResult<Option<LocationFix>>> {
        Box::pin(async move {
            let mut state = self.state();
            state.last_known_queries += 1;
            if let Some(error) = state.last_known_error.clone() {
                return Err(error);
            }
            Ok(state.last_known.clone())
        })
    }

    fn is_enabled(&self) -> ProviderFuture<'_, bool> {
        Box::pin(async move { self.state().enabled })
    }

    fn is_enabled_for(&self, accuracy: DesiredAccuracy) -> ProviderFuture<'_, bool> {
        Box::pin(async move {
            let state = self.state();
            match accuracy {
                DesiredAccuracy::High => state.enabled && state.fine_available,
                DesiredAccuracy::Any => state.enabled,
            }
        })
    }

    fn request_authorization(&self, _always: bool) -> ProviderFuture<'_, ProviderResult<Authorization>> {
        Box::pin(async move {
            let mut state = self.state();
            state.authorization_requests += 1;
            let response = state.authorization_response.clone();
            if let Ok(status) = &response {
                if status.is_granted() && state.enable_when_granted {
                    state.enabled = true;
                }
            }
            response
        })
    }

    fn subscribe(&self, id: WatchId, options: &SubscriptionOptions, sink: FixSink) -> ProviderResult<()> {
        let immediate = {
            let mut state = self.state();
            state.subscribe_calls += 1;
            state.subscribed_options.push(options.clone());

            if let Some((error, partial)) = state.subscribe_error.take() {
                if partial {
                    state.active.insert(id, sink);
                }
                return Err(error);
            }

            state.active.insert(id, sink.clone());
            state.fix_on_subscribe.clone()
        };

        if let Some(fix) = immediate {
            sink(ProviderEvent::Fix(fix));
        }
        Ok(())
    }

    fn unsubscribe(&self, id: WatchId) {
        let mut state = self.state();
        state.unsubscribe_calls += 1;
        if let Some(sink) = state.active.remove(&id) {
            state.retired.insert(id, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn counting_sink() -> (FixSink, Arc<Mutex<Vec<ProviderEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink: FixSink = Arc::new(move |event| seen_clone.lock().unwrap().push(event));
        (sink, seen)
    }

    #[test]
    fn test_mock_provider_creation() {
        let provider = MockProvider::new();
        assert_eq!(provider.name(), "mock");
        assert!(provider.active_subscriptions().is_empty());
        assert_eq!(provider.subscribe_calls(), 0);
    }

    #[test]
    fn test_subscribe_and_emit() {
        let provider = MockProvider::new();
        let (sink, seen) = counting_sink();
        let id = WatchId::new(1);

        provider.subscribe(id, &SubscriptionOptions::default(), sink).unwrap();
        assert_eq!(provider.emit_fix(LocationFix::new(1.0, 2.0, Utc::now())), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);

        provider.unsubscribe(id);
        assert_eq!(provider.emit_fix(LocationFix::new(1.0, 2.0, Utc::now())), 0);
        assert!(provider.emit_late(id, ProviderEvent::Error(ProviderError::PermissionDenied)));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_partial_registration_failure() {
        let provider = MockProvider::new();
        let (sink, _) = counting_sink();
        provider.fail_next_subscribe(ProviderError::platform("boom"), true);

        let result = provider.subscribe(WatchId::new(7), &SubscriptionOptions::default(), sink);
        assert_eq!(result, Err(ProviderError::platform("boom")));
        assert_eq!(provider.active_subscriptions(), vec![WatchId::new(7)]);

        provider.unsubscribe(WatchId::new(7));
        assert!(provider.active_subscriptions().is_empty());
    }

    #[test]
    fn test_emit_to_targets_one_subscription() {
        let provider = MockProvider::new();
        let (first_sink, first_seen) = counting_sink();
        let (second_sink, second_seen) = counting_sink();
        provider.subscribe(WatchId::new(1), &SubscriptionOptions::default(), first_sink).unwrap();
        provider.subscribe(WatchId::new(2), &SubscriptionOptions::default(), second_sink).unwrap();

        assert!(provider.emit_to(WatchId::new(2), ProviderEvent::Fix(LocationFix::new(3.0, 4.0, Utc::now()))));
        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);

        provider.unsubscribe(WatchId::new(2));
        assert!(!provider.emit_to(WatchId::new(2), ProviderEvent::Error(ProviderError::PermissionDenied)));
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enabled_per_accuracy_tier() {
        let provider = MockProvider::new();
        provider.set_fine_available(false);

        assert!(provider.is_enabled().await);
        assert!(provider.is_enabled_for(DesiredAccuracy::Any).await);
        assert!(!provider.is_enabled_for(DesiredAccuracy::High).await);

        provider.set_enabled(false);
        assert!(!provider.is_enabled_for(DesiredAccuracy::Any).await);
    }

    #[test]
    fn test_unsubscribe_unknown_is_ignored() {
        let provider = MockProvider::new();
        provider.unsubscribe(WatchId::new(99));
        assert_eq!(provider.unsubscribe_calls(), 1);
        assert!(!provider.emit_late(WatchId::new(99), ProviderEvent::Error(ProviderError::PermissionDenied)));
    }
}
