//! Two listeners, one emitter, two events.
//!
//! `Event1` goes to a plain listener whose handler is a free function;
//! `Event2` goes to an object that keeps its own state.
//!
//! ```text
//! TOOLBOX_LOG_FORMAT=pretty TOOLBOX_EVENT_DISPATCH=isolated cargo run -p toolbox-demo
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use toolbox_events::{Emitter, EmitterConfig, Listener, Payload};

fn log_pairs(handler: &str, event_type: &str, data: &Payload) {
    tracing::info!(handler, event_type, "handling event");
    for (key, value) in data {
        tracing::info!(handler, key = key.as_str(), value = ?value, "pair");
    }
}

fn event_handler_func(data: &Payload) -> anyhow::Result<()> {
    log_pairs("event_handler_func", "Event1", data);
    Ok(())
}

/// Object-style listener: the handler is a method on shared state.
#[derive(Default)]
struct EventHandlerObject {
    handled: AtomicUsize,
}

impl EventHandlerObject {
    fn listener(self: &Arc<Self>) -> Arc<Listener> {
        let listener = Arc::new(Listener::named("event_handler_object"));
        let this = Arc::clone(self);
        listener.set_handler("Event2", move |data| this.handler_func(data));
        listener
    }

    fn handler_func(&self, data: &Payload) -> anyhow::Result<()> {
        self.handled.fetch_add(1, Ordering::Relaxed);
        log_pairs("EventHandlerObject::handler_func", "Event2", data);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    toolbox_observability::init();

    let config = EmitterConfig::from_env()?;
    tracing::info!(dispatch = config.dispatch.as_str(), "emitter configured");

    let listener = Arc::new(Listener::named("event_handler_func"));
    listener.set_handler("Event1", event_handler_func);

    let object = Arc::new(EventHandlerObject::default());
    let object_listener = object.listener();

    let source = Emitter::with_config(config);
    source.add_listener(&listener);
    source.add_listener(&object_listener);

    let event1_data = Payload::new()
        .with("Thing 1", 5_i32)
        .with("Thing 2", 5.9876_f64)
        .with("Thing 3", "info string");

    let event2_data = Payload::new()
        .with("Thing 1", 1_i32)
        .with("Thing 2", 1.432_f64)
        .with("Thing 3", "info string");

    source.emit("Event1", &event1_data)?;
    source.emit("Event2", &event2_data)?;

    tracing::info!(
        listeners = source.listener_count(),
        object_handled = object.handled.load(Ordering::Relaxed),
        "done"
    );
    Ok(())
}
