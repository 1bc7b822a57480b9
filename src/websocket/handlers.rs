//! Handler registry for event-stream subscriptions.
//!
//! Maps event names to ordered handler lists. Multiple handlers per event are
//! permitted and run in registration order; a panicking handler is isolated
//! and logged without affecting the handlers after it or the stream itself.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with the `data` payload of a matching event.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

/// Opaque handle identifying a registered handler, returned by
/// [`AdxEventStream::on`](crate::websocket::AdxEventStream::on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Event-name → ordered handler list mapping.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<(HandlerId, EventHandler)>>,
    next_id: u64,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name. Handlers fire in the order they
    /// were added.
    pub fn add(&mut self, event: impl Into<String>, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(event.into())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a handler by id. Removing an unknown id is a no-op.
    pub fn remove(&mut self, event: &str, id: HandlerId) {
        if let Some(list) = self.handlers.get_mut(event) {
            list.retain(|(handler_id, _)| *handler_id != id);
            if list.is_empty() {
                self.handlers.remove(event);
            }
        }
    }

    /// Number of handlers registered for an event.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    /// Clone the handler list for an event, so dispatch can run without
    /// holding the registry lock.
    pub fn snapshot(&self, event: &str) -> Vec<(HandlerId, EventHandler)> {
        self.handlers.get(event).cloned().unwrap_or_default()
    }
}

/// Invoke a handler snapshot in order, isolating panics per handler.
pub fn dispatch(event: &str, data: &Value, handlers: &[(HandlerId, EventHandler)]) {
    for (id, handler) in handlers {
        if catch_unwind(AssertUnwindSafe(|| handler(data))).is_err() {
            tracing::error!(event, handler = ?id, "event handler panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_handlers_fire_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        for label in ["first", "second", "third"] {
            let order = order.clone();
            registry.add(
                "bid_won",
                Arc::new(move |_| order.lock().unwrap().push(label)),
            );
        }

        dispatch("bid_won", &json!({}), &registry.snapshot("bid_won"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_the_rest() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.add("bid_won", Arc::new(|_| panic!("handler bug")));
        {
            let seen = seen.clone();
            registry.add(
                "bid_won",
                Arc::new(move |data: &Value| {
                    seen.lock().unwrap().push(data["price"].clone());
                }),
            );
        }

        dispatch("bid_won", &json!({"price": 1.25}), &registry.snapshot("bid_won"));
        assert_eq!(*seen.lock().unwrap(), vec![json!(1.25)]);
    }

    #[test]
    fn test_remove_handler() {
        let mut registry = HandlerRegistry::new();
        let id = registry.add("impression", Arc::new(|_| {}));
        assert_eq!(registry.handler_count("impression"), 1);

        registry.remove("impression", id);
        assert_eq!(registry.handler_count("impression"), 0);
    }

    #[test]
    fn test_remove_unknown_handler_is_noop() {
        let mut registry = HandlerRegistry::new();
        let id = registry.add("impression", Arc::new(|_| {}));
        registry.remove("bid_won", id);
        registry.remove("impression", HandlerId(999));
        assert_eq!(registry.handler_count("impression"), 1);
    }

    #[test]
    fn test_snapshot_of_unknown_event_is_empty() {
        let registry = HandlerRegistry::new();
        assert!(registry.snapshot("nope").is_empty());
    }
}
