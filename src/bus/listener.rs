// Listener interface for the notification bus

use anyhow::Result;

use crate::events::EntityEvent;

/// Receives entity events from a [`NotificationBus`](super::NotificationBus).
///
/// Returning an error does not stop delivery to other listeners; the bus
/// reports it back to the publisher as a `ListenerFailure`.
pub trait Listener: Send + Sync {
    /// Name used when reporting failures
    fn name(&self) -> &str {
        "anonymous"
    }

    fn on_event(&self, event: &EntityEvent) -> Result<()>;
}

impl<F> Listener for F
where
    F: Fn(&EntityEvent) -> Result<()> + Send + Sync,
{
    fn on_event(&self, event: &EntityEvent) -> Result<()> {
        self(event)
    }
}

/// Closure listener with a reportable name
pub struct NamedListener<F> {
    name: String,
    handler: F,
}

impl<F> NamedListener<F>
where
    F: Fn(&EntityEvent) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Listener for NamedListener<F>
where
    F: Fn(&EntityEvent) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &EntityEvent) -> Result<()> {
        (self.handler)(event)
    }
}
