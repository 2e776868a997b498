//! In-process publish/subscribe events.
//!
//! - [`Payload`]: string-keyed bag of type-erased values carried by an event.
//! - [`Listener`]: per-object table mapping event types to handlers.
//! - [`Emitter`]: broadcasts events to listeners it holds only weakly.
//!
//! Dispatch is synchronous on the emitting thread.
//!
//! ```
//! use std::sync::Arc;
//! use toolbox_events::{Emitter, Listener, Payload};
//!
//! let listener = Arc::new(Listener::named("logger"));
//! listener.set_handler("Event1", |data| {
//!     for (key, value) in data {
//!         tracing::info!(key = key.as_str(), value = ?value, "received");
//!     }
//!     Ok(())
//! });
//!
//! let emitter = Emitter::new();
//! emitter.add_listener(&listener);
//!
//! let data = Payload::new()
//!     .with("Thing 1", 5_i32)
//!     .with("Thing 2", 5.9876_f64)
//!     .with("Thing 3", "info string");
//! emitter.emit("Event1", &data).unwrap();
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod listener;
pub mod payload;

pub use config::{DISPATCH_ENV, DispatchMode, EmitterConfig};
pub use emitter::Emitter;
pub use error::{EventError, EventResult, HandlerFailure};
pub use listener::{HandlerFn, Listener};
pub use payload::Payload;

pub use toolbox_core::{Value, ValueError};
