//! Process-wide logging setup.

/// Initialize tracing with the format taken from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filter, output format).
pub mod tracing;

pub use self::tracing::{LOG_FORMAT_ENV, LogFormat};
