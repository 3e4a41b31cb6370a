//! Listener registry for realtime events.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use wiredesk_shared::RealtimeEvent;

pub type EventHandler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, EventHandler)>,
}

/// Ordered list of handlers. Registration order is dispatch order.
#[derive(Clone, Default)]
pub(crate) struct HandlerRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl HandlerRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn add(&self, handler: EventHandler) -> Subscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, handler));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Run every handler once. A panicking handler is logged and skipped.
    /// Returns how many handlers completed normally.
    pub(crate) fn dispatch(&self, event: &RealtimeEvent) -> usize {
        // Snapshot so handlers may (un)register without deadlocking.
        let handlers: Vec<EventHandler> = self
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        let mut completed = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => completed += 1,
                Err(_) => {
                    crate::log_error!("Realtime handler panicked on `{}` event", event.kind())
                }
            }
        }
        completed
    }
}

/// Returned by `RealtimeChannel::on_message`. Dropping it keeps the handler
/// registered; call [`Subscription::unsubscribe`] to detach.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Detach the handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = registry.handlers.len();
        registry.handlers.retain(|(id, _)| *id != self.id);
        registry.handlers.len() != before
    }
}
