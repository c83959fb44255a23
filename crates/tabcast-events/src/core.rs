use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Registration {
    id: u64,
    handler: EventHandler,
}

#[derive(Default)]
struct Registry {
    handlers: HashMap<String, Vec<Registration>>,
}

/// Synchronous in-process publish/subscribe.
///
/// An `EventCore` is owned by some host object (a session, a UI surface)
/// and torn down with it via [`EventCore::clear`]. Clones share the same
/// listener registry, so producers and consumers can hold their own copy.
///
/// Dispatch is depth-first and fully synchronous: [`EventCore::emit`] does
/// not return until every handler registered at the time of the call has
/// run. A panicking handler is caught and reported; it never stops later
/// handlers and never reaches the emitter.
#[derive(Clone, Default)]
pub struct EventCore {
    registry: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl EventCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`. Handlers fire in registration order.
    ///
    /// The returned subscription removes exactly this registration; dropping
    /// it without calling [`EventSubscription::unsubscribe`] leaks the
    /// registration until `off`/`clear`.
    pub fn on<F>(&self, event: &str, handler: F) -> EventSubscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut registry = self.registry.lock();
        registry
            .handlers
            .entry(event.to_string())
            .or_default()
            .push(Registration {
                id,
                handler: Arc::new(handler),
            });

        EventSubscription {
            registry: Arc::clone(&self.registry),
            event: event.to_string(),
            id,
        }
    }

    /// Synchronously invokes every handler currently registered for `event`.
    ///
    /// Handlers run against a snapshot taken at call time and outside the
    /// registry lock, so they may re-enter (`on`, `off`, `emit`) freely.
    /// No registered handlers is a no-op.
    pub fn emit(&self, event: &str, payload: &Value) {
        let snapshot: Vec<EventHandler> = {
            let registry = self.registry.lock();
            match registry.handlers.get(event) {
                Some(registrations) => registrations
                    .iter()
                    .map(|r| Arc::clone(&r.handler))
                    .collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                tracing::warn!(event, "event handler panicked during dispatch");
            }
        }
    }

    /// Removes all handlers for `event`. No-op when none are registered.
    pub fn off(&self, event: &str) {
        self.registry.lock().handlers.remove(event);
    }

    /// Removes all handlers for all events on this instance.
    pub fn clear(&self) {
        self.registry.lock().handlers.clear();
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.registry
            .lock()
            .handlers
            .get(event)
            .map_or(0, Vec::len)
    }
}

/// Disposer for a single [`EventCore::on`] registration.
pub struct EventSubscription {
    registry: Arc<Mutex<Registry>>,
    event: String,
    id: u64,
}

impl EventSubscription {
    /// Removes this registration. Other handlers for the same event are
    /// untouched; if the registration is already gone this is a no-op.
    pub fn unsubscribe(self) {
        let mut registry = self.registry.lock();
        if let Some(registrations) = registry.handlers.get_mut(&self.event) {
            registrations.retain(|r| r.id != self.id);
            if registrations.is_empty() {
                registry.handlers.remove(&self.event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> EventHandler) {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let make = move |tag: &str| -> EventHandler {
            let log = Arc::clone(&log_clone);
            let tag = tag.to_string();
            Arc::new(move |_: &Value| log.lock().push(tag.clone()))
        };
        (log, make)
    }

    #[test]
    fn test_emit_invokes_handlers_in_registration_order() {
        let core = EventCore::new();
        let (log, make) = recorder();

        let h1 = make("first");
        let h2 = make("second");
        let h3 = make("third");
        let _s1 = core.on("update", move |v| h1(v));
        let _s2 = core.on("update", move |v| h2(v));
        let _s3 = core.on("update", move |v| h3(v));

        core.emit("update", &json!({"n": 1}));

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_passes_payload() {
        let core = EventCore::new();
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let _sub = core.on("data", move |payload| {
            *seen_clone.lock() = Some(payload.clone());
        });

        core.emit("data", &json!({"answer": 42}));

        assert_eq!(seen.lock().take(), Some(json!({"answer": 42})));
    }

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let core = EventCore::new();
        core.emit("nobody-home", &Value::Null);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_dispatch() {
        let core = EventCore::new();
        let (log, make) = recorder();

        let before = make("before");
        let after = make("after");
        let _s1 = core.on("boom", move |v| before(v));
        let _s2 = core.on("boom", |_| panic!("handler failure"));
        let _s3 = core.on("boom", move |v| after(v));

        core.emit("boom", &Value::Null);

        assert_eq!(*log.lock(), vec!["before", "after"]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_handler() {
        let core = EventCore::new();
        let (log, make) = recorder();

        let keep = make("keep");
        let drop_me = make("drop");
        let _s1 = core.on("tick", move |v| keep(v));
        let s2 = core.on("tick", move |v| drop_me(v));

        core.emit("tick", &Value::Null);
        s2.unsubscribe();
        core.emit("tick", &Value::Null);

        assert_eq!(*log.lock(), vec!["keep", "drop", "keep"]);
    }

    #[test]
    fn test_duplicate_registration_unsubscribes_one_at_a_time() {
        let core = EventCore::new();
        let count = Arc::new(Mutex::new(0usize));

        let c1 = Arc::clone(&count);
        let c2 = Arc::clone(&count);
        let s1 = core.on("dup", move |_| *c1.lock() += 1);
        let _s2 = core.on("dup", move |_| *c2.lock() += 1);

        assert_eq!(core.handler_count("dup"), 2);
        s1.unsubscribe();
        assert_eq!(core.handler_count("dup"), 1);

        core.emit("dup", &Value::Null);
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_off_removes_all_handlers_for_event() {
        let core = EventCore::new();
        let (log, make) = recorder();

        let a = make("a");
        let b = make("b");
        let other = make("other");
        let _s1 = core.on("gone", move |v| a(v));
        let _s2 = core.on("gone", move |v| b(v));
        let _s3 = core.on("stays", move |v| other(v));

        core.off("gone");
        core.emit("gone", &Value::Null);
        core.emit("stays", &Value::Null);

        assert_eq!(*log.lock(), vec!["other"]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let core = EventCore::new();
        let (log, make) = recorder();

        let a = make("a");
        let b = make("b");
        let _s1 = core.on("one", move |v| a(v));
        let _s2 = core.on("two", move |v| b(v));

        core.clear();
        core.emit("one", &Value::Null);
        core.emit("two", &Value::Null);

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_handler_may_reenter_during_dispatch() {
        let core = EventCore::new();
        let inner = core.clone();
        let fired = Arc::new(Mutex::new(false));
        let fired_clone = Arc::clone(&fired);

        let _sub = core.on("outer", move |_| {
            // Registration during dispatch must not deadlock; the new
            // handler only sees later emits (snapshot semantics).
            let fired = Arc::clone(&fired_clone);
            let _leaked = inner.on("outer", move |_| *fired.lock() = true);
        });

        core.emit("outer", &Value::Null);
        assert!(!*fired.lock());

        core.emit("outer", &Value::Null);
        assert!(*fired.lock());
    }
}
