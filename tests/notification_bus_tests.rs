//! Notification bus delivery semantics
//!
//! Subscribers are served from a snapshot taken at publish time: changes made
//! by listeners during delivery only take effect from the next publish.

use docflow::{
    EntityEvent, EntityId, EventKind, HistoryDirection, Listener, NotificationBus, SubscriptionId,
};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

fn event(version: u64) -> EntityEvent {
    EntityEvent::mutated(EntityId::new("doc"), version, "edit", HistoryDirection::Execute)
}

/// Listener that records deliveries and can run a hook on the bus
struct Probe {
    name: String,
    log: Log,
    hook: Box<dyn Fn(&EntityEvent) + Send + Sync>,
}

impl Probe {
    fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            hook: Box::new(|_| {}),
        }
    }

    fn with_hook(mut self, hook: impl Fn(&EntityEvent) + Send + Sync + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }
}

impl Listener for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &EntityEvent) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}@{}", self.name, event.version()));
        (self.hook)(event);
        Ok(())
    }
}

#[test]
fn test_registration_order_is_delivery_order() {
    let bus = NotificationBus::new();
    let log: Log = Arc::default();

    for name in ["a", "b", "c", "d"] {
        bus.subscribe(Arc::new(Probe::new(name, &log)), [EventKind::Mutated]);
    }
    bus.publish(&event(1));

    assert_eq!(*log.lock().unwrap(), vec!["a@1", "b@1", "c@1", "d@1"]);
}

#[test]
fn test_listener_removed_mid_delivery_still_gets_in_flight_event() {
    let bus = Arc::new(NotificationBus::new());
    let log: Log = Arc::default();
    let victim: Arc<Mutex<Option<SubscriptionId>>> = Arc::default();

    let bus_in_hook = bus.clone();
    let victim_in_hook = victim.clone();
    bus.subscribe(
        Arc::new(Probe::new("remover", &log).with_hook(move |_| {
            if let Some(id) = victim_in_hook.lock().unwrap().take() {
                bus_in_hook.unsubscribe(id);
            }
        })),
        [EventKind::Mutated],
    );
    let id = bus.subscribe(Arc::new(Probe::new("victim", &log)), [EventKind::Mutated]);
    *victim.lock().unwrap() = Some(id);

    bus.publish(&event(1));
    bus.publish(&event(2));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["remover@1", "victim@1", "remover@2"]
    );
}

#[test]
fn test_listener_added_mid_delivery_waits_for_next_publish() {
    let bus = Arc::new(NotificationBus::new());
    let log: Log = Arc::default();
    let added = Arc::new(Mutex::new(false));

    let bus_in_hook = bus.clone();
    let log_in_hook = log.clone();
    let added_in_hook = added.clone();
    bus.subscribe(
        Arc::new(Probe::new("adder", &log).with_hook(move |_| {
            let mut added = added_in_hook.lock().unwrap();
            if !*added {
                *added = true;
                bus_in_hook.subscribe(
                    Arc::new(Probe::new("late", &log_in_hook)),
                    [EventKind::Mutated],
                );
            }
        })),
        [EventKind::Mutated],
    );

    bus.publish(&event(1));
    bus.publish(&event(2));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["adder@1", "adder@2", "late@2"]
    );
}

#[test]
fn test_every_failure_is_reported() {
    let bus = NotificationBus::new();
    let log: Log = Arc::default();

    let failing = |name: &'static str| -> Arc<dyn Listener> {
        Arc::new(docflow::NamedListener::new(name, move |_: &EntityEvent| {
            anyhow::bail!("{} failed", name)
        }))
    };

    let first = bus.subscribe(failing("first"), EventKind::ALL);
    bus.subscribe(Arc::new(Probe::new("healthy", &log)), EventKind::ALL);
    let third = bus.subscribe(failing("third"), EventKind::ALL);

    let failures = bus.publish(&event(5));

    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].subscription, first);
    assert_eq!(failures[0].detail, "first failed");
    assert_eq!(failures[1].subscription, third);
    assert_eq!(failures[1].event_kind, EventKind::Mutated);
    assert_eq!(*log.lock().unwrap(), vec!["healthy@5"]);
}

#[test]
fn test_publish_with_no_subscribers() {
    let bus = NotificationBus::new();
    assert!(bus.publish(&event(1)).is_empty());
    assert_eq!(bus.subscriber_count(), 0);
}
