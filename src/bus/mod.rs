// Notification bus - synchronous publish/subscribe for entity events
//
// Delivery works on a snapshot of the subscriber list taken when `publish`
// is called. The subscriber lock is released before any listener runs, so
// listeners may subscribe or unsubscribe during delivery; such changes apply
// from the next publish on.

pub mod listener;

pub use listener::{Listener, NamedListener};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::events::{EntityEvent, EventKind};

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    listener: Arc<dyn Listener>,
    kinds: HashSet<EventKind>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn listener_name(&self) -> &str {
        self.listener.name()
    }

    pub fn receives(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("listener", &self.listener.name())
            .field("kinds", &self.kinds)
            .finish()
    }
}

/// A listener error collected during `publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerFailure {
    pub subscription: SubscriptionId,
    pub listener: String,
    pub event_kind: EventKind,
    pub detail: String,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Listener '{}' ({}) failed on {:?}: {}",
            self.listener, self.subscription, self.event_kind, self.detail
        )
    }
}

#[derive(Default)]
pub struct NotificationBus {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscriptions", &*self.lock())
            .finish()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kinds`.
    ///
    /// A listener is identified by its `Arc` allocation. Subscribing an
    /// already registered listener adds the new kinds to its existing
    /// subscription and returns the existing handle; registration order is
    /// kept.
    pub fn subscribe(
        &self,
        listener: Arc<dyn Listener>,
        kinds: impl IntoIterator<Item = EventKind>,
    ) -> SubscriptionId {
        let mut subscriptions = self.lock();

        if let Some(existing) = subscriptions
            .iter_mut()
            .find(|subscription| Arc::ptr_eq(&subscription.listener, &listener))
        {
            existing.kinds.extend(kinds);
            debug!(
                subscription = %existing.id,
                listener = existing.listener.name(),
                "Listener already subscribed, merged event kinds"
            );
            return existing.id;
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let subscription = Subscription {
            id,
            listener,
            kinds: kinds.into_iter().collect(),
        };
        debug!(
            subscription = %id,
            listener = subscription.listener.name(),
            kinds = ?subscription.kinds,
            "Listener subscribed"
        );
        subscriptions.push(subscription);
        id
    }

    /// Subscribe to every event kind
    pub fn subscribe_all(&self, listener: Arc<dyn Listener>) -> SubscriptionId {
        self.subscribe(listener, EventKind::ALL)
    }

    /// Remove a subscription. Returns false for unknown handles.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        let removed = subscriptions.len() != before;
        if removed {
            debug!(subscription = %id, "Listener unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every listener subscribed to its kind right now, in
    /// subscription order. All listeners run; their failures are returned.
    pub fn publish(&self, event: &EntityEvent) -> Vec<ListenerFailure> {
        let snapshot: Vec<(SubscriptionId, Arc<dyn Listener>)> = self
            .lock()
            .iter()
            .filter(|subscription| subscription.receives(event.kind()))
            .map(|subscription| (subscription.id, Arc::clone(&subscription.listener)))
            .collect();

        let mut failures = Vec::new();
        for (subscription, listener) in snapshot {
            if let Err(err) = listener.on_event(event) {
                warn!(
                    subscription = %subscription,
                    listener = listener.name(),
                    entity_id = %event.entity_id(),
                    version = event.version(),
                    error = %err,
                    "Listener failed to handle event"
                );
                failures.push(ListenerFailure {
                    subscription,
                    listener: listener.name().to_string(),
                    event_kind: event.kind(),
                    detail: format!("{:#}", err),
                });
            }
        }
        failures
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.lock().iter().any(|subscription| subscription.id == id)
    }

    /// Current subscriptions in delivery order
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.lock().clone()
    }

    // Listeners never run under this lock, so a poisoned guard still holds a
    // consistent list.
    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
