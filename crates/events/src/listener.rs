//! Per-listener table of event handlers.
//!
//! A [`Listener`] binds event-type names to a single handler each and
//! dispatches [`handle_event`](Listener::handle_event) to the matching one.
//! Registering a handler for a type that already has one replaces it.
//! Dispatching a type with no handler is a silent no-op.
//!
//! Listeners are owned by application code, usually as `Arc<Listener>`.
//! An [`Emitter`](crate::Emitter) only ever holds a weak reference, so a
//! listener stops receiving events as soon as its last `Arc` is dropped.
//!
//! ## Object-style handlers
//!
//! A handler is any `Fn(&Payload) -> anyhow::Result<()>`, so receiver state
//! is captured by the closure:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use toolbox_events::{Listener, Payload};
//!
//! struct Counter {
//!     seen: Mutex<u32>,
//! }
//!
//! impl Counter {
//!     fn on_tick(&self, _data: &Payload) -> anyhow::Result<()> {
//!         *self.seen.lock().unwrap() += 1;
//!         Ok(())
//!     }
//! }
//!
//! let counter = Arc::new(Counter { seen: Mutex::new(0) });
//! let listener = Listener::named("counter");
//!
//! let receiver = Arc::clone(&counter);
//! listener.set_handler("tick", move |data| receiver.on_tick(data));
//!
//! listener.handle_event("tick", &Payload::new()).unwrap();
//! listener.handle_event("tock", &Payload::new()).unwrap(); // no handler: no-op
//! assert_eq!(*counter.seen.lock().unwrap(), 1);
//! ```

use core::fmt;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::error::{EventError, EventResult};
use crate::payload::Payload;

/// Handler callback stored per event type.
pub type HandlerFn = dyn Fn(&Payload) -> anyhow::Result<()> + Send + Sync;

const ANONYMOUS: &str = "<anonymous>";

/// Event-type → handler table with synchronous dispatch.
#[derive(Default)]
pub struct Listener {
    name: Option<String>,
    handlers: RwLock<BTreeMap<String, Arc<HandlerFn>>>,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener with a name used in logs and failure reports.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            handlers: RwLock::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name or `<anonymous>`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Register `handler` for `event_type`, replacing any previous one.
    pub fn set_handler<F>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&Payload) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        let replaced = self
            .write()
            .insert(event_type.clone(), Arc::new(handler))
            .is_some();

        debug!(
            listener = self.label(),
            event_type = event_type.as_str(),
            replaced,
            "handler registered"
        );
    }

    /// Returns `true` if a handler was registered for `event_type`.
    pub fn remove_handler(&self, event_type: &str) -> bool {
        self.write().remove(event_type).is_some()
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.read().contains_key(event_type)
    }

    /// Event types with a registered handler, in ascending order.
    pub fn event_types(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn handler_count(&self) -> usize {
        self.read().len()
    }

    /// Dispatch `event_type` to its handler, if any.
    ///
    /// The handler runs on the caller's thread with the table unlocked, so it
    /// may register or remove handlers on this same listener.
    pub fn handle_event(&self, event_type: &str, payload: &Payload) -> EventResult<()> {
        let Some(handler) = self.read().get(event_type).cloned() else {
            trace!(listener = self.label(), event_type, "no handler");
            return Ok(());
        };

        trace!(listener = self.label(), event_type, "dispatching");
        handler(payload).map_err(|source| EventError::Handler {
            event_type: event_type.to_string(),
            listener: self.label().to_string(),
            source,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<HandlerFn>>> {
        // Handlers never run under the lock; poisoning cannot leave the map
        // half-updated.
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<HandlerFn>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.label())
            .field("event_types", &self.event_types())
            .finish()
    }
}
