//! Event error model.

use core::fmt;

use thiserror::Error;
use toolbox_core::ValueError;

/// Result type used across the event crate.
pub type EventResult<T> = Result<T, EventError>;

/// A single handler failure captured during an isolated emission.
#[derive(Debug)]
pub struct HandlerFailure {
    listener: String,
    error: anyhow::Error,
}

impl HandlerFailure {
    pub fn new(listener: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            listener: listener.into(),
            error,
        }
    }

    /// Label of the listener whose handler failed.
    pub fn listener(&self) -> &str {
        &self.listener
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.listener, self.error)
    }
}

/// Errors surfaced by payload access, dispatch and configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    /// Read-only payload access by a key that is not present.
    #[error("missing key: {0}")]
    KeyNotFound(String),

    /// A payload value was read as the wrong concrete type.
    #[error(transparent)]
    TypeMismatch(#[from] ValueError),

    /// A payload could not be built from the given input.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Emitter configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A handler failed while handling an event (fail-fast dispatch).
    #[error("handler for `{event_type}` on {listener} failed: {source}")]
    Handler {
        event_type: String,
        listener: String,
        #[source]
        source: anyhow::Error,
    },

    /// One or more handlers failed during an isolated emission.
    #[error("{} handler(s) failed while dispatching `{event_type}`", .failures.len())]
    Dispatch {
        event_type: String,
        failures: Vec<HandlerFailure>,
    },

    /// The listener set lock was poisoned.
    #[error("listener set lock poisoned")]
    Poisoned,
}

impl EventError {
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::KeyNotFound(_) => "payload_key_not_found",
            EventError::TypeMismatch(_) => "payload_type_mismatch",
            EventError::InvalidPayload(_) => "payload_invalid",
            EventError::InvalidConfig(_) => "config_invalid",
            EventError::Handler { .. } => "handler_failed",
            EventError::Dispatch { .. } => "dispatch_failed",
            EventError::Poisoned => "listener_set_poisoned",
        }
    }
}
