//! In-process notification channel.
//!
//! The store announces data changes and the router announces route changes
//! through an [`EventBus`]. Listeners registered at emission time each
//! receive the notification once; there is no buffering or replay.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Event name for store mutations.
pub const DATA_CHANGED: &str = "dataChanged";

/// Event name for completed route dispatches.
pub const ROUTE_CHANGED: &str = "routeChanged";

/// A single broadcast notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Event name (`dataChanged`, `routeChanged`)
    pub event: &'static str,
    /// What happened (`create`, `update`, route name, ...)
    pub action: String,
    /// Event-specific data
    pub payload: serde_json::Value,
    /// Emission time
    pub timestamp: DateTime<Utc>,
}

type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Fan-out broadcaster for one named event.
#[derive(Clone)]
pub struct EventBus {
    event: &'static str,
    listeners: Arc<Mutex<Listeners>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event", &self.event)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    /// Create a bus for `event`.
    pub fn new(event: &'static str) -> Self {
        Self { event, listeners: Arc::new(Mutex::new(Listeners::default())) }
    }

    /// Event name carried by this bus.
    pub fn event(&self) -> &'static str {
        self.event
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription { id, listeners: Arc::downgrade(&self.listeners) }
    }

    /// Broadcast to every current listener.
    pub fn emit(&self, action: impl Into<String>, payload: serde_json::Value) {
        let notification = Notification {
            event: self.event,
            action: action.into(),
            payload,
            timestamp: Utc::now(),
        };

        // Call outside the lock so listeners may subscribe or unsubscribe.
        let snapshot: Vec<Listener> =
            self.listeners.lock().entries.iter().map(|(_, l)| Arc::clone(l)).collect();

        tracing::debug!(
            event = self.event,
            action = %notification.action,
            listeners = snapshot.len(),
            "Emitting notification"
        );

        for listener in snapshot {
            listener(&notification);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(id, _)| *id != self.id);
        listeners.entries.len() != before
    }
}
