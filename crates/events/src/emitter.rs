//! Fan-out of named events to weakly-held listeners.
//!
//! An [`Emitter`] keeps an ordered list of *non-owning* references to
//! [`Listener`]s. It never extends a listener's lifetime: once the last
//! `Arc<Listener>` is dropped, the emitter notices on its next walk of the
//! list and prunes the entry.
//!
//! ## Rules
//! - **No duplicates**: adding a listener that is already present is a no-op.
//! - **Registration order**: listeners are dispatched in the order they were
//!   added; removed or pruned entries close the gap.
//! - **Lazy pruning**: expired entries are dropped by `add_listener`,
//!   `remove_listener`, `emit`, `listener_count` and `prune`.
//! - **Snapshot emission**: `emit` dispatches to the listeners present when it
//!   started. A listener added by a handler mid-emission waits for the next
//!   `emit`; a listener removed by a handler mid-emission is skipped if its
//!   turn has not come yet.
//! - **No lock across callbacks**: handlers may add, remove or emit on the
//!   same emitter.
//!
//! ## Failure policy
//! See [`DispatchMode`]. Fail-fast (default) returns the first
//! [`EventError::Handler`] and leaves later listeners unvisited. Isolated
//! dispatch catches errors and panics per listener and returns
//! [`EventError::Dispatch`] after visiting everyone.
//!
//! ## Example
//! ```
//! use std::sync::{Arc, Mutex};
//! use toolbox_events::{Emitter, Listener, Payload};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let listener = Arc::new(Listener::new());
//! let sink = Arc::clone(&seen);
//! listener.set_handler("Ping", move |data| {
//!     sink.lock().unwrap().push(*data.get_as::<i32>("n")? * 2);
//!     Ok(())
//! });
//!
//! let emitter = Emitter::new();
//! assert!(emitter.add_listener(&listener));
//! assert!(!emitter.add_listener(&listener)); // duplicate
//!
//! emitter.emit("Ping", &Payload::new().with("n", 21_i32)).unwrap();
//! assert_eq!(*seen.lock().unwrap(), [42]);
//!
//! drop(listener);
//! emitter.emit_empty("Ping").unwrap();
//! assert_eq!(emitter.listener_count(), 0);
//! ```

use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, error, trace, warn};

use crate::config::{DispatchMode, EmitterConfig};
use crate::error::{EventError, EventResult, HandlerFailure};
use crate::listener::Listener;
use crate::payload::Payload;

/// One registered listener: a weak handle tagged with a unique slot id.
struct Slot {
    id: u64,
    listener: Weak<Listener>,
}

impl Slot {
    #[inline]
    fn is_expired(&self) -> bool {
        self.listener.strong_count() == 0
    }

    #[inline]
    fn refers_to(&self, listener: &Arc<Listener>) -> bool {
        core::ptr::eq(self.listener.as_ptr(), Arc::as_ptr(listener))
    }
}

/// Broadcaster holding weak references to listeners.
pub struct Emitter {
    slots: Mutex<Vec<Slot>>,
    next_id: AtomicU64,
    config: EmitterConfig,
}

impl Emitter {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Register `listener` without taking ownership of it.
    ///
    /// Returns `false` if it is already registered (nothing changes).
    /// Expired entries met during the scan are pruned.
    pub fn add_listener(&self, listener: &Arc<Listener>) -> bool {
        let mut slots = self.lock();
        let mut pruned = 0;
        let mut i = 0;

        while i < slots.len() {
            if slots[i].is_expired() {
                slots.remove(i);
                pruned += 1;
                continue;
            }
            if slots[i].refers_to(listener) {
                debug!(listener = listener.label(), pruned, "listener already registered");
                return false;
            }
            i += 1;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        slots.push(Slot {
            id,
            listener: Arc::downgrade(listener),
        });

        debug!(
            listener = listener.label(),
            slot = id,
            pruned,
            listeners = slots.len(),
            "listener added"
        );
        true
    }

    /// Unregister `listener`. Returns `false` if it was not registered.
    ///
    /// Expired entries met during the scan are pruned.
    pub fn remove_listener(&self, listener: &Arc<Listener>) -> bool {
        let mut slots = self.lock();
        let mut pruned = 0;
        let mut i = 0;

        while i < slots.len() {
            if slots[i].is_expired() {
                slots.remove(i);
                pruned += 1;
                continue;
            }
            if slots[i].refers_to(listener) {
                let slot = slots.remove(i);
                debug!(listener = listener.label(), slot = slot.id, pruned, "listener removed");
                return true;
            }
            i += 1;
        }

        trace!(listener = listener.label(), pruned, "listener not registered");
        false
    }

    /// Broadcast `event_type` with `payload` to every live listener, in order.
    pub fn emit(&self, event_type: &str, payload: &Payload) -> EventResult<()> {
        let snapshot: Vec<(u64, Weak<Listener>)> = {
            let mut slots = self.slots.lock().map_err(|_| EventError::Poisoned)?;
            let pruned = prune_expired(&mut slots);
            if pruned > 0 {
                debug!(event_type, pruned, "pruned expired listeners");
            }
            slots
                .iter()
                .map(|slot| (slot.id, Weak::clone(&slot.listener)))
                .collect()
        };

        trace!(event_type, listeners = snapshot.len(), "emitting");

        let mut failures: Vec<HandlerFailure> = Vec::new();
        for (id, weak) in snapshot {
            let resolved = match self.resolve(id, &weak) {
                Ok(resolved) => resolved,
                Err(err) => {
                    for failure in &failures {
                        error!(
                            event_type,
                            listener = failure.listener(),
                            error = %failure.error(),
                            "handler failure dropped: emission aborted"
                        );
                    }
                    return Err(err);
                }
            };
            let Some(listener) = resolved else {
                continue;
            };

            match self.config.dispatch {
                DispatchMode::FailFast => listener.handle_event(event_type, payload)?,
                DispatchMode::Isolated => {
                    if let Err(failure) = dispatch_isolated(&listener, event_type, payload) {
                        warn!(
                            event_type,
                            listener = failure.listener(),
                            error = %failure.error(),
                            "handler failed"
                        );
                        failures.push(failure);
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventError::Dispatch {
                event_type: event_type.to_string(),
                failures,
            })
        }
    }

    /// [`emit`](Self::emit) with an empty payload.
    pub fn emit_empty(&self, event_type: &str) -> EventResult<()> {
        self.emit(event_type, &Payload::new())
    }

    /// Number of live listeners (prunes expired entries first).
    pub fn listener_count(&self) -> usize {
        let mut slots = self.lock();
        prune_expired(&mut slots);
        slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn prune(&self) -> usize {
        let pruned = prune_expired(&mut self.lock());
        if pruned > 0 {
            debug!(pruned, "pruned expired listeners");
        }
        pruned
    }

    /// Unregister every listener.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Resolve a snapshot entry against the live list.
    ///
    /// `None` if the slot was removed since the snapshot or its listener has
    /// expired (the expired slot is pruned). A returned `Arc` is used for one
    /// dispatch and dropped right after.
    fn resolve(&self, id: u64, weak: &Weak<Listener>) -> EventResult<Option<Arc<Listener>>> {
        let mut slots = self.slots.lock().map_err(|_| EventError::Poisoned)?;

        // Slots are appended with increasing ids and removals keep order.
        let Ok(pos) = slots.binary_search_by_key(&id, |slot| slot.id) else {
            trace!(slot = id, "listener removed during emission");
            return Ok(None);
        };

        match weak.upgrade() {
            Some(listener) => Ok(Some(listener)),
            None => {
                slots.remove(pos);
                debug!(slot = id, "pruned listener expired during emission");
                Ok(None)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        // The list is never locked while a handler runs.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("slots", &self.lock().len())
            .field("config", &self.config)
            .finish()
    }
}

fn prune_expired(slots: &mut Vec<Slot>) -> usize {
    let before = slots.len();
    slots.retain(|slot| !slot.is_expired());
    before - slots.len()
}

/// Run one handler, turning errors and panics into a [`HandlerFailure`].
fn dispatch_isolated(
    listener: &Listener,
    event_type: &str,
    payload: &Payload,
) -> Result<(), HandlerFailure> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        listener.handle_event(event_type, payload)
    }));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(EventError::Handler { source, .. })) => {
            Err(HandlerFailure::new(listener.label(), source))
        }
        Ok(Err(other)) => Err(HandlerFailure::new(listener.label(), other.into())),
        Err(panic_err) => Err(HandlerFailure::new(
            listener.label(),
            anyhow::anyhow!("handler panicked: {}", panic_message(&*panic_err)),
        )),
    }
}

fn panic_message(panic_err: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
